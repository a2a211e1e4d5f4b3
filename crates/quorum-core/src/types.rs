use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ActionStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of an [`crate::action::Action`].
///
/// `Rejected` and `Granted` are terminal; `Pending` is the only state that
/// can transition, and only to `Granted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Rejected,
    Pending,
    Granted,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Rejected => "rejected",
            ActionStatus::Pending => "pending",
            ActionStatus::Granted => "granted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ActionStatus::Rejected | ActionStatus::Granted)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExecutionOutput
// ---------------------------------------------------------------------------

/// Captured result of running a gated command.
///
/// A non-zero exit is recorded as `exit_ok = false` but is data, not an
/// error of the workflow itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub exit_ok: bool,
    /// Combined stdout and stderr text.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
