// src/action/copy.rs

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, info};

use super::{Action, ActionContext, ActionError, ActionFuture, Artifacts};
use crate::errors::{Result, WatchflowError};

/// One `from` pattern, split into its literal base directory and a matcher.
///
/// `routes/**/*.js` has base `routes`; a match `routes/api/a.js` is written
/// to `<to>/api/a.js`.
#[derive(Debug, Clone)]
struct SourcePattern {
    raw: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

/// Copies every file matching `from` (relative to the project root) into the
/// `to` directory.
#[derive(Debug, Clone)]
pub struct CopyAction {
    sources: Vec<SourcePattern>,
    to: PathBuf,
}

impl CopyAction {
    pub fn new(from: &[String], to: impl Into<PathBuf>) -> Result<Self> {
        let mut sources = Vec::with_capacity(from.len());
        for pat in from {
            let normalized = pat.strip_prefix("./").unwrap_or(pat.as_str());
            // `*` stays within one path component; only `**` recurses.
            let glob = GlobBuilder::new(normalized)
                .literal_separator(true)
                .build()
                .map_err(|e| WatchflowError::Pattern(format!("{pat}: {e}")))?;
            sources.push(SourcePattern {
                raw: pat.clone(),
                base: literal_base(normalized),
                matcher: glob.compile_matcher(),
            });
        }
        Ok(Self {
            sources,
            to: to.into(),
        })
    }

    fn copy_all(&self, root: &Path) -> std::io::Result<Vec<PathBuf>> {
        let dest_root = root.join(&self.to);
        let mut written = Vec::new();

        for source in &self.sources {
            let base = root.join(&source.base);
            if !base.is_dir() {
                debug!(pattern = %source.raw, base = ?base, "copy source base missing; nothing to copy");
                continue;
            }

            for file in walk_files(&base, &dest_root)? {
                let Ok(rel_to_root) = file.strip_prefix(root) else {
                    continue;
                };
                let rel_str = rel_to_root.to_string_lossy().replace('\\', "/");
                if !source.matcher.is_match(&rel_str) {
                    continue;
                }

                let Ok(rel_to_base) = file.strip_prefix(&base) else {
                    continue;
                };
                let target = dest_root.join(rel_to_base);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&file, &target)?;
                written.push(target);
            }
        }

        Ok(written)
    }
}

impl Action for CopyAction {
    fn describe(&self) -> String {
        let from: Vec<&str> = self.sources.iter().map(|s| s.raw.as_str()).collect();
        format!("copy: {:?} -> {}", from, self.to.display())
    }

    fn execute<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move {
            let this = self.clone();
            let root = ctx.root().to_path_buf();

            let written = tokio::task::spawn_blocking(move || this.copy_all(&root))
                .await
                .map_err(|e| ActionError::with_cause("copy worker failed", e))?
                .map_err(|e| ActionError::with_cause("copying files", e))?;

            info!(task = %ctx.task(), files = written.len(), "copied files");
            Ok(Artifacts::from_paths(written))
        })
    }
}

/// Leading path components of `pattern` that contain no glob syntax.
fn literal_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in pattern.split('/') {
        if component.is_empty() || component == "." {
            continue;
        }
        if component.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(component);
    }
    // A pattern without any glob syntax names a single file; its parent is
    // the base.
    if base.as_os_str().len() == pattern.trim_start_matches("./").len() {
        base.pop();
    }
    base
}

/// Files below `dir`, never descending into `skip`.
///
/// `skip` is the copy destination: when it sits under a source base, earlier
/// output must not be picked up as input again.
fn walk_files(dir: &Path, skip: &Path) -> std::io::Result<Vec<PathBuf>> {
    let skip_canonical = skip.canonicalize().ok();
    let is_skipped = |path: &Path| {
        path == skip
            || skip_canonical
                .as_deref()
                .is_some_and(|canon| path.canonicalize().ok().as_deref() == Some(canon))
    };

    let mut files = Vec::new();
    if is_skipped(dir) {
        return Ok(files);
    }
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                if is_skipped(&path) {
                    continue;
                }
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn literal_base_stops_at_first_glob_component() {
        assert_eq!(literal_base("routes/*.js"), PathBuf::from("routes"));
        assert_eq!(literal_base("./src/**/a/*.rs"), PathBuf::from("src"));
        assert_eq!(literal_base("*.js"), PathBuf::new());
        assert_eq!(literal_base("views/index.ejs"), PathBuf::from("views"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = CopyAction::new(&["src/[".to_string()], "out").unwrap_err();
        assert!(matches!(err, WatchflowError::Pattern(_)));
    }

    #[tokio::test]
    async fn copies_matching_files_below_base() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("routes/api")).unwrap();
        fs::write(root.join("routes/index.js"), "index").unwrap();
        fs::write(root.join("routes/api/users.js"), "users").unwrap();
        fs::write(root.join("routes/readme.md"), "skip").unwrap();

        let action = CopyAction::new(&["routes/**/*.js".to_string()], "copies").unwrap();
        let ctx = ActionContext::new("copy", root, CancellationToken::new());
        let artifacts = action.execute(&ctx).await.unwrap();

        assert_eq!(artifacts.paths.len(), 2);
        assert_eq!(fs::read_to_string(root.join("copies/index.js")).unwrap(), "index");
        assert_eq!(fs::read_to_string(root.join("copies/api/users.js")).unwrap(), "users");
        assert!(!root.join("copies/readme.md").exists());
    }

    #[tokio::test]
    async fn single_star_does_not_cross_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("routes/api")).unwrap();
        fs::write(root.join("routes/index.js"), "index").unwrap();
        fs::write(root.join("routes/api/users.js"), "users").unwrap();

        let action = CopyAction::new(&["routes/*.js".to_string()], "copies").unwrap();
        let ctx = ActionContext::new("copy", root, CancellationToken::new());
        let artifacts = action.execute(&ctx).await.unwrap();

        assert_eq!(artifacts.paths, vec![root.join("copies/index.js")]);
        assert!(!root.join("copies/api").exists());
    }

    #[tokio::test]
    async fn repeated_runs_do_not_copy_their_own_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("app.js"), "app").unwrap();

        for to in ["copies", "./copies"] {
            let action = CopyAction::new(&["**/*.js".to_string()], to).unwrap();
            let ctx = ActionContext::new("copy", root, CancellationToken::new());

            for _ in 0..3 {
                let artifacts = action.execute(&ctx).await.unwrap();
                assert_eq!(artifacts.paths.len(), 1, "destination {to}");
            }
        }
        assert!(root.join("copies/app.js").exists());
        assert!(!root.join("copies/copies").exists());
    }
}
