// src/watch/machine.rs

//! Pure per-binding debounce state machine.
//!
//! The machine never sleeps or spawns anything: it is fed change events,
//! timer expirations and run completions together with the current instant,
//! and answers with a [`BindingCommand`] for the async shell
//! ([`crate::watch::actor`]) to carry out. That keeps the timing logic
//! testable without a runtime.
//!
//! ```text
//!            change                 change
//!   Idle ───────────► Triggered ───────────► Debouncing ◄─┐ change
//!    ▲                    │ window elapsed        │      ──┘
//!    │                    ▼                       │ window elapsed
//!    └──── finished ── Running ◄──────────────────┘
//!                       │  ▲ change while running: remember one re-run
//!                       └──┘
//! ```

use std::time::Duration;

use tokio::time::Instant;

/// Observable state of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    /// First change seen; waiting for the window to elapse.
    Triggered,
    /// More changes arrived inside the window; it was reset.
    Debouncing,
    Running,
}

/// What the shell should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingCommand {
    /// (Re)arm the debounce timer for this deadline.
    ArmTimer(Instant),
    /// Start a run of the bound task now.
    StartRun,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Triggered { deadline: Instant },
    Debouncing { deadline: Instant },
    /// `rerun` holds the time of the latest change seen while running.
    Running { rerun: Option<Instant> },
}

#[derive(Debug, Clone)]
pub struct BindingMachine {
    window: Duration,
    phase: Phase,
}

impl BindingMachine {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            phase: Phase::Idle,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn state(&self) -> BindingState {
        match self.phase {
            Phase::Idle => BindingState::Idle,
            Phase::Triggered { .. } => BindingState::Triggered,
            Phase::Debouncing { .. } => BindingState::Debouncing,
            Phase::Running { .. } => BindingState::Running,
        }
    }

    /// Whether a change arrived during the current run.
    pub fn rerun_pending(&self) -> bool {
        matches!(self.phase, Phase::Running { rerun: Some(_) })
    }

    /// A watched file changed.
    pub fn on_change(&mut self, now: Instant) -> Option<BindingCommand> {
        match self.phase {
            Phase::Idle => {
                let deadline = now + self.window;
                self.phase = Phase::Triggered { deadline };
                Some(BindingCommand::ArmTimer(deadline))
            }
            Phase::Triggered { .. } | Phase::Debouncing { .. } => {
                let deadline = now + self.window;
                self.phase = Phase::Debouncing { deadline };
                Some(BindingCommand::ArmTimer(deadline))
            }
            Phase::Running { .. } => {
                // Coalesce: however many changes arrive, one re-run.
                self.phase = Phase::Running { rerun: Some(now) };
                None
            }
        }
    }

    /// The armed timer fired.
    ///
    /// A timer armed for an older deadline may fire after the window was
    /// reset; in that case the current deadline is re-armed.
    pub fn on_timer(&mut self, now: Instant) -> Option<BindingCommand> {
        match self.phase {
            Phase::Triggered { deadline } | Phase::Debouncing { deadline } => {
                if now >= deadline {
                    self.phase = Phase::Running { rerun: None };
                    Some(BindingCommand::StartRun)
                } else {
                    Some(BindingCommand::ArmTimer(deadline))
                }
            }
            Phase::Idle | Phase::Running { .. } => None,
        }
    }

    /// The run started by the last `StartRun` finished.
    pub fn on_run_finished(&mut self, now: Instant) -> Option<BindingCommand> {
        match self.phase {
            Phase::Running { rerun: Some(last_change) } => {
                let deadline = last_change + self.window;
                if now >= deadline {
                    self.phase = Phase::Running { rerun: None };
                    Some(BindingCommand::StartRun)
                } else {
                    self.phase = Phase::Triggered { deadline };
                    Some(BindingCommand::ArmTimer(deadline))
                }
            }
            Phase::Running { rerun: None } => {
                self.phase = Phase::Idle;
                None
            }
            _ => None,
        }
    }

    /// Forget any pending work; used on shutdown.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_change_arms_timer_for_one_window() {
        let t0 = Instant::now();
        let mut m = BindingMachine::new(WINDOW);

        assert_eq!(m.on_change(t0), Some(BindingCommand::ArmTimer(t0 + WINDOW)));
        assert_eq!(m.state(), BindingState::Triggered);
    }

    #[test]
    fn rapid_changes_reset_the_window_and_run_once() {
        let t0 = Instant::now();
        let mut m = BindingMachine::new(WINDOW);

        m.on_change(t0);
        m.on_change(t0 + ms(50));
        let last = m.on_change(t0 + ms(100));
        assert_eq!(last, Some(BindingCommand::ArmTimer(t0 + ms(200))));
        assert_eq!(m.state(), BindingState::Debouncing);

        // Stale timer from the first change.
        assert_eq!(m.on_timer(t0 + ms(100)), Some(BindingCommand::ArmTimer(t0 + ms(200))));
        assert_eq!(m.on_timer(t0 + ms(200)), Some(BindingCommand::StartRun));
        assert_eq!(m.state(), BindingState::Running);

        // A second timer expiry while running does nothing.
        assert_eq!(m.on_timer(t0 + ms(201)), None);

        assert_eq!(m.on_run_finished(t0 + ms(300)), None);
        assert_eq!(m.state(), BindingState::Idle);
    }

    #[test]
    fn changes_while_running_coalesce_into_one_rerun() {
        let t0 = Instant::now();
        let mut m = BindingMachine::new(WINDOW);

        m.on_change(t0);
        m.on_timer(t0 + WINDOW);
        assert_eq!(m.state(), BindingState::Running);

        assert_eq!(m.on_change(t0 + ms(110)), None);
        assert_eq!(m.on_change(t0 + ms(120)), None);
        assert!(m.rerun_pending());

        // Finished long after the last change: re-run right away.
        assert_eq!(m.on_run_finished(t0 + ms(500)), Some(BindingCommand::StartRun));
        assert_eq!(m.state(), BindingState::Running);
        assert!(!m.rerun_pending());

        assert_eq!(m.on_run_finished(t0 + ms(600)), None);
        assert_eq!(m.state(), BindingState::Idle);
    }

    #[test]
    fn rerun_waits_out_the_window_after_the_last_change() {
        let t0 = Instant::now();
        let mut m = BindingMachine::new(WINDOW);

        m.on_change(t0);
        m.on_timer(t0 + WINDOW);
        m.on_change(t0 + ms(150));

        assert_eq!(
            m.on_run_finished(t0 + ms(160)),
            Some(BindingCommand::ArmTimer(t0 + ms(250)))
        );
        assert_eq!(m.state(), BindingState::Triggered);
        assert_eq!(m.on_timer(t0 + ms(250)), Some(BindingCommand::StartRun));
    }
}
