// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Lifecycle of a step within one build.
///
/// ```text
/// Pending -> Ready -> Running -> Completed
///                             -> Failed
///                             -> Cancelled
/// Pending | Ready -> Skipped
/// ```
///
/// `Skipped` and `Cancelled` only occur after another step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepState {
    /// Waiting on at least one producer
    Pending,
    /// All producers done, waiting for a worker
    Ready,
    Running,
    Completed,
    Failed,
    /// Never dispatched because the build stopped
    Skipped,
    /// Aborted while running
    Cancelled,
}

impl StepState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepState::Completed | StepState::Failed | StepState::Skipped | StepState::Cancelled
        )
    }

    pub fn can_transition_to(self, next: StepState) -> bool {
        use StepState::*;
        matches!(
            (self, next),
            (Pending, Ready)
                | (Ready, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Pending, Skipped)
                | (Ready, Skipped)
        )
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepState::Pending => "pending",
            StepState::Ready => "ready",
            StepState::Running => "running",
            StepState::Completed => "completed",
            StepState::Failed => "failed",
            StepState::Skipped => "skipped",
            StepState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(StepState::Pending.can_transition_to(StepState::Ready));
        assert!(StepState::Ready.can_transition_to(StepState::Running));
        assert!(StepState::Running.can_transition_to(StepState::Completed));
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        for state in [
            StepState::Completed,
            StepState::Failed,
            StepState::Skipped,
            StepState::Cancelled,
        ] {
            assert!(state.is_terminal());
            assert!(!state.can_transition_to(StepState::Running));
            assert!(!state.can_transition_to(StepState::Ready));
        }
    }

    #[test]
    fn test_no_retry_from_failed() {
        assert!(!StepState::Failed.can_transition_to(StepState::Ready));
        assert!(!StepState::Pending.can_transition_to(StepState::Running));
    }
}
