//! Machine lifecycle commands
//!
//! Issues start/shutdown/kill/pause/save/resume and performs an advisory
//! confirmation: wait a fixed settle delay, reload the info snapshot and
//! compare the observed state with the expected one. A mismatch is an
//! outcome, never an error, and is never retried.

use std::time::Duration;

use vboxmon_shared::errors::VboxResult;

use super::{LifecycleState, VirtualMachine};
use crate::runtime::constants::{args, commands, control, defaults};

/// A lifecycle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    /// Boot the machine headless.
    Start,
    /// ACPI power button (graceful).
    Shutdown,
    /// Hard power off.
    Kill,
    Pause,
    /// Save state to disk and stop.
    Save,
    /// Resume a paused machine.
    Resume,
}

impl LifecycleAction {
    pub const ALL: [LifecycleAction; 6] = [
        LifecycleAction::Start,
        LifecycleAction::Shutdown,
        LifecycleAction::Kill,
        LifecycleAction::Pause,
        LifecycleAction::Save,
        LifecycleAction::Resume,
    ];

    /// State the machine should be in once the command took effect.
    pub fn expected_state(&self) -> LifecycleState {
        match self {
            LifecycleAction::Start | LifecycleAction::Resume => LifecycleState::Running,
            LifecycleAction::Shutdown | LifecycleAction::Kill => LifecycleState::PoweredOff,
            LifecycleAction::Pause => LifecycleState::Paused,
            LifecycleAction::Save => LifecycleState::Saved,
        }
    }

    /// Hypervisor arguments for this command against `machine_id`.
    pub fn command_args(&self, machine_id: &str) -> Vec<String> {
        let args: Vec<&str> = match self {
            LifecycleAction::Start => {
                vec![commands::START_VM, machine_id, args::TYPE, args::HEADLESS]
            }
            LifecycleAction::Shutdown => {
                vec![commands::CONTROL_VM, machine_id, control::ACPI_POWER_BUTTON]
            }
            LifecycleAction::Kill => vec![commands::CONTROL_VM, machine_id, control::POWER_OFF],
            LifecycleAction::Pause => vec![commands::CONTROL_VM, machine_id, control::PAUSE],
            LifecycleAction::Save => vec![commands::CONTROL_VM, machine_id, control::SAVE_STATE],
            LifecycleAction::Resume => vec![commands::CONTROL_VM, machine_id, control::RESUME],
        };
        args.into_iter().map(str::to_string).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Shutdown => "shutdown",
            LifecycleAction::Kill => "kill",
            LifecycleAction::Pause => "pause",
            LifecycleAction::Save => "save",
            LifecycleAction::Resume => "resume",
        }
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one lifecycle command and its advisory confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleOutcome {
    pub machine_id: String,
    pub action: LifecycleAction,
    pub expected: LifecycleState,
    /// State read back after the settle delay.
    pub observed: LifecycleState,
    /// Exit code of the command itself.
    pub exit_code: Option<i32>,
    /// Stderr of the command, trimmed.
    pub stderr: String,
}

impl LifecycleOutcome {
    /// Whether the machine reached exactly the expected state.
    pub fn reached(&self) -> bool {
        self.observed == self.expected
    }

    /// Whether the hypervisor accepted the command.
    pub fn command_accepted(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Issues lifecycle commands on the caller's task.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    settle_delay: Duration,
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new(defaults::SETTLE_DELAY)
    }
}

impl LifecycleController {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub async fn start(&self, machine: &VirtualMachine) -> VboxResult<LifecycleOutcome> {
        self.apply(machine, LifecycleAction::Start).await
    }

    pub async fn shutdown(&self, machine: &VirtualMachine) -> VboxResult<LifecycleOutcome> {
        self.apply(machine, LifecycleAction::Shutdown).await
    }

    pub async fn kill(&self, machine: &VirtualMachine) -> VboxResult<LifecycleOutcome> {
        self.apply(machine, LifecycleAction::Kill).await
    }

    pub async fn pause(&self, machine: &VirtualMachine) -> VboxResult<LifecycleOutcome> {
        self.apply(machine, LifecycleAction::Pause).await
    }

    pub async fn save(&self, machine: &VirtualMachine) -> VboxResult<LifecycleOutcome> {
        self.apply(machine, LifecycleAction::Save).await
    }

    pub async fn resume(&self, machine: &VirtualMachine) -> VboxResult<LifecycleOutcome> {
        self.apply(machine, LifecycleAction::Resume).await
    }

    /// Issue `action` once, wait the settle delay, reload and compare.
    ///
    /// # Errors
    ///
    /// Only if the command cannot be spawned or the reload fails. A
    /// rejected command or an unexpected state is reported in the outcome.
    pub async fn apply(
        &self,
        machine: &VirtualMachine,
        action: LifecycleAction,
    ) -> VboxResult<LifecycleOutcome> {
        tracing::info!(
            machine_id = %machine.id(),
            name = %machine.name(),
            %action,
            "Issuing lifecycle command"
        );

        let output = machine
            .manage()
            .run_owned(action.command_args(machine.id()))
            .await?;

        if !output.success() {
            tracing::warn!(
                machine_id = %machine.id(),
                %action,
                exit = %output.describe_exit(),
                stderr = %output.stderr_text(),
                "Hypervisor rejected lifecycle command"
            );
        }

        tokio::time::sleep(self.settle_delay).await;

        let observed = machine.reload().await?.state();
        let outcome = LifecycleOutcome {
            machine_id: machine.id().to_string(),
            action,
            expected: action.expected_state(),
            observed,
            exit_code: output.exit_code,
            stderr: output.stderr_text(),
        };

        if !outcome.reached() {
            tracing::warn!(
                machine_id = %machine.id(),
                %action,
                expected = %outcome.expected,
                observed = %outcome.observed,
                transient = outcome.observed.is_transient(),
                "Machine did not reach expected state"
            );
        }

        Ok(outcome)
    }
}
