//! Hypervisor command facade.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use vboxmon_shared::errors::{VboxError, VboxResult};

use super::listing::parse_listing;
use crate::machine::VirtualMachine;
use crate::runtime::constants::{args, commands, metrics};
use crate::util::{CommandRunner, ProcessOutcome, ProcessOutput, ProcessRunner};

/// Facade over the `VBoxManage` command line.
///
/// Knows the argument shapes of every hypervisor command and routes them
/// through a [`ProcessRunner`]. Cheaply cloneable; all clones share the
/// same runner.
#[derive(Clone)]
pub struct VBoxManage {
    runner: Arc<dyn ProcessRunner>,
}

impl fmt::Debug for VBoxManage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VBoxManage").finish_non_exhaustive()
    }
}

impl VBoxManage {
    /// Create a facade over an arbitrary runner.
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Create a facade spawning the given executable.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(CommandRunner::new(executable)))
    }

    /// Run a command to completion, no timeout.
    pub async fn run(&self, args: &[&str]) -> VboxResult<ProcessOutput> {
        self.run_owned(to_owned_args(args)).await
    }

    pub(crate) async fn run_owned(&self, args: Vec<String>) -> VboxResult<ProcessOutput> {
        self.runner.execute(&args, None).await?.into_output()
    }

    /// Run a command bounded by `timeout`.
    pub async fn run_with_timeout(
        &self,
        args: &[&str],
        timeout: Duration,
    ) -> VboxResult<ProcessOutcome> {
        self.runner
            .execute(&to_owned_args(args), Some(timeout))
            .await
    }

    /// List every machine known to the hypervisor.
    ///
    /// A fresh list on every call, nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`VboxError::Discovery`] if the listing exits nonzero or
    /// cannot be run at all. Nothing else works without it.
    pub async fn list_machines(&self) -> VboxResult<Vec<VirtualMachine>> {
        let output = self
            .run(&[commands::LIST, args::VMS])
            .await
            .map_err(|e| VboxError::Discovery(e.to_string()))?;

        if !output.success() {
            return Err(VboxError::Discovery(format!(
                "list vms failed with {}: {}",
                output.describe_exit(),
                output.stderr_text()
            )));
        }

        Ok(parse_listing(&output.stdout_text())
            .into_iter()
            .map(|listed| VirtualMachine::new(self.clone(), listed.id, listed.name))
            .collect())
    }

    /// Machines whose freshly loaded state is running.
    ///
    /// Machines whose info cannot be loaded are skipped.
    pub async fn running_machines(&self) -> VboxResult<Vec<VirtualMachine>> {
        let mut running = Vec::new();
        for machine in self.list_machines().await? {
            match machine.reload().await {
                Ok(info) if info.state().is_running() => running.push(machine),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(machine_id = %machine.id(), error = %e, "Skipping machine without info");
                }
            }
        }
        Ok(running)
    }

    /// Turn on metrics collection on the hypervisor. Idempotent.
    pub async fn metrics_enable(&self) -> VboxResult<ProcessOutput> {
        self.run(&[commands::METRICS, metrics::ENABLE]).await
    }

    /// Configure the sampling period and sample count for `selectors`.
    pub async fn metrics_setup(
        &self,
        period: Duration,
        samples: u32,
        selectors: &[&str],
    ) -> VboxResult<ProcessOutput> {
        let mut args = vec![
            commands::METRICS.to_string(),
            metrics::SETUP.to_string(),
            metrics::PERIOD.to_string(),
            format_period(period),
            metrics::SAMPLES.to_string(),
            samples.to_string(),
        ];
        args.extend(selectors.iter().map(|s| s.to_string()));
        self.run_owned(args).await
    }

    /// Trigger one metrics collection pass bounded by `timeout`.
    ///
    /// # Returns
    /// * `Ok(true)` - Collection finished in time
    /// * `Ok(false)` - Collection timed out (stale values this round)
    pub async fn metrics_collect(&self, timeout: Duration) -> VboxResult<bool> {
        let outcome = self
            .run_with_timeout(&[commands::METRICS, metrics::COLLECT], timeout)
            .await?;
        Ok(!outcome.is_timed_out())
    }

    /// Raw output of `metrics query <id> <name>`.
    pub async fn metrics_query(&self, machine_id: &str, name: &str) -> VboxResult<ProcessOutput> {
        self.run(&[commands::METRICS, metrics::QUERY, machine_id, name])
            .await
    }
}

fn to_owned_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Sampling period in seconds as the hypervisor expects it (`0.2`, `1`).
pub(crate) fn format_period(period: Duration) -> String {
    format!("{}", period.as_secs_f64())
}
