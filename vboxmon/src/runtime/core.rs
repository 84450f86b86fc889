//! Monitor runtime: entry point bundling the hypervisor facade, metric
//! history, credentials and the polling daemon.

use std::sync::Arc;

use parking_lot::Mutex;
use vboxmon_shared::errors::{VboxError, VboxResult};

use crate::credentials::CredentialStore;
use crate::machine::{LifecycleController, VirtualMachine};
use crate::management::VBoxManage;
use crate::metrics::{DaemonHandle, MachineHistory, MetricSeries, MetricStore, PollingDaemon, SeriesKey};
use crate::runtime::options::MonitorOptions;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Entry point for monitoring and controlling the local hypervisor's
/// machines.
///
/// **Cloning**: cheaply cloneable via `Arc`; all clones share the same
/// store and daemon.
#[derive(Clone)]
pub struct VmMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    options: MonitorOptions,
    manage: VBoxManage,
    store: Arc<MetricStore>,
    credentials: CredentialStore,
    lifecycle: LifecycleController,
    /// Running daemon, if started
    daemon: Mutex<Option<DaemonHandle>>,
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        if let Some(handle) = self.daemon.get_mut().as_ref() {
            tracing::debug!("Monitor dropped, cancelling metrics daemon");
            handle.cancellation_token().cancel();
        }
    }
}

impl std::fmt::Debug for VmMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmMonitor")
            .field("options", &self.inner.options)
            .field("machines", &self.inner.store.machine_ids().len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RUNTIME IMPLEMENTATION
// ============================================================================

impl VmMonitor {
    /// Create a monitor driving the executable named in `options`.
    ///
    /// Credentials come from `options.credentials_path` if set, otherwise
    /// from the default search locations.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Options are invalid ([`VboxError::Config`])
    /// - The credential document cannot be read ([`VboxError::Credentials`])
    /// - Initial machine discovery fails ([`VboxError::Discovery`])
    pub async fn new(options: MonitorOptions) -> VboxResult<Self> {
        options.validate()?;

        let credentials = match &options.credentials_path {
            Some(path) => CredentialStore::from_file(path)?,
            None => CredentialStore::discover()?,
        };
        let manage = VBoxManage::with_executable(options.executable.clone());

        Self::with_parts(options, manage, credentials).await
    }

    /// Create a monitor from prepared parts.
    ///
    /// Performs the initial discovery and seeds a store entry for every
    /// machine found.
    pub async fn with_parts(
        options: MonitorOptions,
        manage: VBoxManage,
        credentials: CredentialStore,
    ) -> VboxResult<Self> {
        options.validate()?;

        let store = Arc::new(MetricStore::new(options.history_len, options.interval));
        let machines = manage.list_machines().await?;
        for machine in &machines {
            store.ensure_machine(machine.id());
        }

        tracing::info!(
            executable = %options.executable.display(),
            machines = machines.len(),
            "Monitor initialized"
        );

        Ok(Self {
            inner: Arc::new(MonitorInner {
                lifecycle: LifecycleController::new(options.settle_delay),
                options,
                manage,
                store,
                credentials,
                daemon: Mutex::new(None),
            }),
        })
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.inner.options
    }

    pub fn manage(&self) -> &VBoxManage {
        &self.inner.manage
    }

    pub fn store(&self) -> &Arc<MetricStore> {
        &self.inner.store
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.inner.lifecycle
    }

    /// Spawn the polling daemon.
    ///
    /// Returns false if it is already running.
    pub fn start_daemon(&self) -> bool {
        let mut daemon = self.inner.daemon.lock();
        if daemon.is_some() {
            return false;
        }

        let polling = PollingDaemon::new(self.inner.manage.clone(), self.inner.store.clone())
            .with_collect_timeout(self.inner.options.collect_timeout);
        *daemon = Some(polling.spawn());
        true
    }

    /// Whether a daemon was started and has not been stopped.
    pub fn daemon_running(&self) -> bool {
        self.inner
            .daemon
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the polling daemon and wait for it.
    ///
    /// Returns the daemon's final result, `Ok(())` if none was running.
    pub async fn stop_daemon(&self) -> VboxResult<()> {
        let handle = self.inner.daemon.lock().take();
        match handle {
            Some(handle) => handle.stop().await,
            None => Ok(()),
        }
    }

    /// Fresh machine list from the hypervisor.
    pub async fn list_machines(&self) -> VboxResult<Vec<VirtualMachine>> {
        self.inner.manage.list_machines().await
    }

    /// Find a machine by id, then by name.
    ///
    /// # Errors
    ///
    /// [`VboxError::NotFound`] if no machine matches.
    pub async fn machine(&self, id_or_name: &str) -> VboxResult<VirtualMachine> {
        let machines = self.list_machines().await?;
        if let Some(machine) = machines.iter().find(|m| m.id() == id_or_name) {
            return Ok(machine.clone());
        }
        machines
            .into_iter()
            .find(|m| m.name() == id_or_name)
            .ok_or_else(|| VboxError::NotFound(id_or_name.to_string()))
    }

    /// Copy of one series of one machine.
    pub fn metric_history(&self, machine_id: &str, key: impl Into<SeriesKey>) -> Option<MetricSeries> {
        self.inner.store.read(machine_id, key)
    }

    /// Copy of every series of one machine.
    pub fn machine_history(&self, machine_id: &str) -> Option<MachineHistory> {
        self.inner.store.history(machine_id)
    }
}
