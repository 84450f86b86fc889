//! Background metrics polling.
//!
//! One tokio task runs [`PollingDaemon::run`] for the lifetime of the
//! monitor. Each tick:
//!
//! ```text
//! metrics enable ─► metrics collect (bounded) ─► list vms ─► ensure entries
//!   ─► per machine: metrics setup, then query every counter and append
//!   ─► sleep interval
//! ```
//!
//! Only a failed discovery ends the loop. Every other failure is logged and
//! contained to the command or counter it happened in.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vboxmon_shared::errors::{VboxError, VboxResult};

use super::{MetricKind, MetricQuery, MetricStore};
use crate::management::VBoxManage;
use crate::runtime::constants::defaults;

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Machines returned by discovery.
    pub machines_seen: usize,
    /// Machines that got a fresh store entry this tick.
    pub machines_added: usize,
    /// Counter values appended to the store.
    pub samples_appended: usize,
    /// Counter queries that failed and left their series untouched.
    pub counter_failures: usize,
    /// Whether `metrics collect` hit its timeout.
    pub collect_timed_out: bool,
}

/// Polls every counter of every machine into a [`MetricStore`].
#[derive(Debug, Clone)]
pub struct PollingDaemon {
    manage: VBoxManage,
    store: Arc<MetricStore>,
    query: MetricQuery,
    interval: Duration,
    collect_timeout: Duration,
}

impl PollingDaemon {
    /// Daemon ticking at the store's interval.
    pub fn new(manage: VBoxManage, store: Arc<MetricStore>) -> Self {
        let interval = store.interval();
        Self {
            query: MetricQuery::new(manage.clone()),
            manage,
            store,
            interval,
            collect_timeout: defaults::COLLECT_TIMEOUT,
        }
    }

    pub fn with_collect_timeout(mut self, timeout: Duration) -> Self {
        self.collect_timeout = timeout;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    /// Run one polling pass.
    ///
    /// # Errors
    ///
    /// Only [`VboxError::Discovery`]. Everything else is counted in the
    /// report and logged.
    pub async fn tick(&self) -> VboxResult<TickReport> {
        let mut report = TickReport::default();

        match self.manage.metrics_enable().await {
            Ok(output) if !output.success() => {
                tracing::warn!(exit = %output.describe_exit(), stderr = %output.stderr_text(), "metrics enable failed");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "metrics enable failed"),
        }

        match self.manage.metrics_collect(self.collect_timeout).await {
            Ok(true) => {}
            Ok(false) => {
                report.collect_timed_out = true;
                tracing::debug!(timeout = ?self.collect_timeout, "metrics collect timed out");
            }
            Err(e) => tracing::warn!(error = %e, "metrics collect failed"),
        }

        let machines = self.manage.list_machines().await?;
        report.machines_seen = machines.len();

        for machine in &machines {
            if self.store.ensure_machine(machine.id()) {
                report.machines_added += 1;
                tracing::info!(
                    machine_id = %machine.id(),
                    name = %machine.name(),
                    "Tracking new machine"
                );
            }
        }

        for machine in &machines {
            self.setup_sampling(machine.id()).await;

            for kind in MetricKind::ALL {
                match self.poll_counter(machine.id(), kind).await {
                    Ok(()) => report.samples_appended += 1,
                    Err(e) => {
                        report.counter_failures += 1;
                        tracing::warn!(
                            machine_id = %machine.id(),
                            counter = kind.raw_name(),
                            error = %e,
                            "Counter query failed"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            machines = report.machines_seen,
            added = report.machines_added,
            appended = report.samples_appended,
            failures = report.counter_failures,
            "Polling tick complete"
        );
        Ok(report)
    }

    async fn setup_sampling(&self, machine_id: &str) {
        let result = self
            .manage
            .metrics_setup(self.interval, defaults::SETUP_SAMPLES, &[machine_id])
            .await;
        match result {
            Ok(output) if !output.success() => {
                tracing::warn!(
                    machine_id,
                    exit = %output.describe_exit(),
                    stderr = %output.stderr_text(),
                    "metrics setup failed"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(machine_id, error = %e, "metrics setup failed"),
        }
    }

    async fn poll_counter(&self, machine_id: &str, kind: MetricKind) -> VboxResult<()> {
        let value = self.query.query(machine_id, kind).await?;
        self.store.append(machine_id, kind, value)
    }

    /// Tick until `cancel` fires or discovery fails.
    ///
    /// Cancellation is checked before every tick and raced against the
    /// sleep, so a stop request never waits longer than one tick.
    pub async fn run(self, cancel: CancellationToken) -> VboxResult<()> {
        tracing::info!(interval = ?self.interval, "Metrics daemon started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.tick().await.inspect_err(|e| {
                tracing::error!(error = %e, "Machine discovery failed, stopping metrics daemon");
            })?;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Metrics daemon stopped");
        Ok(())
    }

    /// Run on a dedicated tokio task.
    pub fn spawn(self) -> DaemonHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel.clone()));
        DaemonHandle { cancel, task }
    }
}

/// Running daemon task.
#[derive(Debug)]
pub struct DaemonHandle {
    cancel: CancellationToken,
    task: JoinHandle<VboxResult<()>>,
}

impl DaemonHandle {
    /// Whether the task has exited (stopped or failed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Token that stops the daemon when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the daemon and wait for it to exit.
    ///
    /// Returns the daemon's final result: `Ok(())` after a clean stop, the
    /// discovery error if it had already died.
    pub async fn stop(self) -> VboxResult<()> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| VboxError::Internal(format!("metrics daemon task failed: {}", e)))?
    }
}
