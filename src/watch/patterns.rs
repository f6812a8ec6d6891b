// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{Result, WatchflowError};

/// Compiled watch / exclude globs for one binding.
///
/// Patterns are relative to the project root; [`WatchProfile::matches`]
/// expects a root-relative path with `/` separators, e.g. `"sass/main.scss"`.
#[derive(Clone)]
pub struct WatchProfile {
    watch: Vec<String>,
    exclude: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("watch", &self.watch)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    pub fn new(watch: &[String], exclude: &[String]) -> Result<Self> {
        if watch.is_empty() {
            return Err(WatchflowError::Pattern(
                "a watch binding needs at least one glob".to_string(),
            ));
        }

        let watch_set = build_globset(watch)?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude)?)
        };

        Ok(Self {
            watch: watch.to_vec(),
            exclude: exclude.to_vec(),
            watch_set,
            exclude_set,
        })
    }

    pub fn watch_patterns(&self) -> &[String] {
        &self.watch
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        match &self.exclude_set {
            Some(exclude) => !exclude.is_match(rel_path),
            None => true,
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        // "./sass/*.scss" and "sass/*.scss" mean the same thing to users.
        let normalized = pat.strip_prefix("./").unwrap_or(pat.as_str());
        // `*` stays within one path component; only `**` recurses.
        let glob = GlobBuilder::new(normalized)
            .literal_separator(true)
            .build()
            .map_err(|e| WatchflowError::Pattern(format!("{pat}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| WatchflowError::Pattern(e.to_string()))
}

/// `path` relative to `root` with forward slashes.
///
/// Event paths from the OS watcher may not share the literal prefix of
/// `root` (symlinked temp dirs on macOS, for example), so on a miss both
/// sides are canonicalized and compared again.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let to_str = |rel: &Path| rel.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_str(rel));
    }

    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    path.strip_prefix(&root).ok().map(to_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_watch_and_honours_exclude() {
        let profile = WatchProfile::new(
            &strings(&["**/*.js"]),
            &strings(&["node_modules/**"]),
        )
        .unwrap();

        assert!(profile.matches("routes/index.js"));
        assert!(profile.matches("app.js"));
        assert!(!profile.matches("node_modules/lib/x.js"));
        assert!(!profile.matches("views/index.ejs"));
    }

    #[test]
    fn single_star_matches_one_directory_level() {
        let profile = WatchProfile::new(&strings(&["views/*.ejs"]), &[]).unwrap();
        assert!(profile.matches("views/index.ejs"));
        assert!(!profile.matches("views/partials/header.ejs"));

        let deep = WatchProfile::new(&strings(&["views/**/*.ejs"]), &[]).unwrap();
        assert!(deep.matches("views/index.ejs"));
        assert!(deep.matches("views/partials/header.ejs"));
    }

    #[test]
    fn leading_dot_slash_is_ignored() {
        let profile = WatchProfile::new(&strings(&["./sass/**/*.scss"]), &[]).unwrap();
        assert!(profile.matches("sass/main.scss"));
    }

    #[test]
    fn empty_watch_list_is_rejected() {
        assert!(matches!(
            WatchProfile::new(&[], &[]),
            Err(WatchflowError::Pattern(_))
        ));
    }

    #[test]
    fn relative_path_strips_root() {
        let rel = relative_path(Path::new("/proj"), Path::new("/proj/sass/a.scss"));
        assert_eq!(rel.as_deref(), Some("sass/a.scss"));
        assert_eq!(relative_path(Path::new("/proj"), Path::new("/elsewhere/a")), None);
    }
}
