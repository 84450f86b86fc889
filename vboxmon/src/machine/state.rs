//! Machine lifecycle state as reported by the hypervisor.
//!
//! Decoded from the `VMState` attribute of the machine-readable info dump.
//! Decoding never fails: values outside the known vocabulary become
//! [`LifecycleState::Other`] carrying the raw string.

use crate::runtime::constants::states;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a virtual machine.
///
/// State machine as driven by the lifecycle commands:
/// ```text
/// PoweredOff/Saved/Aborted --start--> Running
/// Running --pause--> Paused --resume--> Running
/// Running --save--> Saving --> Saved
/// Running --shutdown/kill--> PoweredOff
/// Saved --start--> Restoring --> Running
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Guest is executing.
    Running,

    /// Machine is off (`poweroff`).
    #[serde(rename = "poweroff")]
    PoweredOff,

    /// Execution suspended, memory kept in RAM.
    Paused,

    /// State is being written to disk (transient).
    Saving,

    /// State saved to disk, machine not running.
    Saved,

    /// Saved state is being loaded (transient).
    Restoring,

    /// Machine terminated abnormally.
    Aborted,

    /// Any other raw value, case-folded. Empty if `VMState` was missing.
    Other(String),
}

impl LifecycleState {
    /// Decode a raw `VMState` value, case-insensitively.
    pub fn from_raw(raw: &str) -> Self {
        let folded = raw.trim().to_lowercase();
        match folded.as_str() {
            states::RUNNING => LifecycleState::Running,
            states::POWER_OFF => LifecycleState::PoweredOff,
            states::PAUSED => LifecycleState::Paused,
            states::SAVING => LifecycleState::Saving,
            states::SAVED => LifecycleState::Saved,
            states::RESTORING => LifecycleState::Restoring,
            states::ABORTED => LifecycleState::Aborted,
            _ => LifecycleState::Other(folded),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }

    /// Check if this state is on its way to another one.
    pub fn is_transient(&self) -> bool {
        matches!(self, LifecycleState::Saving | LifecycleState::Restoring)
    }

    /// Hypervisor vocabulary for this state. `other` for unknown values.
    pub fn as_str(&self) -> &str {
        match self {
            LifecycleState::Running => states::RUNNING,
            LifecycleState::PoweredOff => states::POWER_OFF,
            LifecycleState::Paused => states::PAUSED,
            LifecycleState::Saving => states::SAVING,
            LifecycleState::Saved => states::SAVED,
            LifecycleState::Restoring => states::RESTORING,
            LifecycleState::Aborted => states::ABORTED,
            LifecycleState::Other(_) => "other",
        }
    }

    /// Short status marker for terminal output.
    pub fn indicator(&self) -> &'static str {
        match self {
            LifecycleState::Running => "●",
            LifecycleState::PoweredOff => "○",
            LifecycleState::Paused
            | LifecycleState::Saving
            | LifecycleState::Saved
            | LifecycleState::Restoring
            | LifecycleState::Aborted
            | LifecycleState::Other(_) => "!",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Other(raw) if !raw.is_empty() => write!(f, "other ({})", raw),
            state => write!(f, "{}", state.as_str()),
        }
    }
}
