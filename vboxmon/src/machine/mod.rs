//! Virtual machine entity, its info snapshot and lifecycle control.

mod info;
mod lifecycle;
mod state;

pub use info::MachineInfo;
pub use lifecycle::{LifecycleAction, LifecycleController, LifecycleOutcome};
pub use state::LifecycleState;

use std::sync::Arc;

use parking_lot::RwLock;
use vboxmon_shared::errors::{VboxError, VboxResult};

use crate::credentials::UserInfo;
use crate::management::VBoxManage;
use crate::metrics::{MetricKind, MetricQuery};
use crate::runtime::constants::{args, commands, guest};
use crate::util::ProcessOutput;

/// A machine known to the hypervisor.
///
/// Identity (`id`, `name`) is fixed at discovery. The info snapshot is
/// loaded on first access and replaced wholesale on every reload; clones
/// share the same snapshot.
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    manage: VBoxManage,
    id: String,
    name: String,
    info: Arc<RwLock<Option<Arc<MachineInfo>>>>,
}

impl VirtualMachine {
    pub(crate) fn new(manage: VBoxManage, id: String, name: String) -> Self {
        Self {
            manage,
            id,
            name,
            info: Arc::new(RwLock::new(None)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hypervisor facade this machine was discovered through.
    pub fn manage(&self) -> &VBoxManage {
        &self.manage
    }

    /// Current snapshot, loading it on first access.
    pub async fn info(&self) -> VboxResult<Arc<MachineInfo>> {
        if let Some(info) = self.cached_info() {
            return Ok(info);
        }
        self.reload().await
    }

    /// Snapshot loaded so far, without touching the hypervisor.
    pub fn cached_info(&self) -> Option<Arc<MachineInfo>> {
        self.info.read().clone()
    }

    /// Re-read the machine-readable info dump.
    ///
    /// # Errors
    ///
    /// Returns [`VboxError::Reload`] if the dump cannot be run or exits
    /// nonzero. The previous snapshot stays in place.
    pub async fn reload(&self) -> VboxResult<Arc<MachineInfo>> {
        let output = self
            .manage
            .run(&[commands::SHOW_VM_INFO, &self.id, args::MACHINE_READABLE])
            .await
            .map_err(|e| VboxError::Reload {
                machine_id: self.id.clone(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            return Err(VboxError::Reload {
                machine_id: self.id.clone(),
                reason: format!("{}: {}", output.describe_exit(), output.stderr_text()),
            });
        }

        let info = Arc::new(MachineInfo::parse(&output.stdout_text()));
        *self.info.write() = Some(info.clone());

        tracing::trace!(machine_id = %self.id, state = %info.state(), "Reloaded machine info");
        Ok(info)
    }

    /// Lifecycle state of the current snapshot.
    pub async fn state(&self) -> VboxResult<LifecycleState> {
        Ok(self.info().await?.state())
    }

    /// Query one counter for this machine. `NaN` when no data.
    pub async fn query_metric(&self, kind: MetricKind) -> VboxResult<f64> {
        MetricQuery::new(self.manage.clone()).query(&self.id, kind).await
    }

    /// Run an executable inside the guest as `user`.
    ///
    /// Returns the raw output; a nonzero exit is not an error here.
    pub async fn guest_run(
        &self,
        user: &UserInfo,
        executable: &str,
        arguments: &[&str],
    ) -> VboxResult<ProcessOutput> {
        let mut args = vec![
            commands::GUEST_CONTROL.to_string(),
            self.id.clone(),
            guest::RUN.to_string(),
            guest::USERNAME.to_string(),
            user.username.clone(),
            guest::PASSWORD.to_string(),
            user.password.clone(),
            guest::EXE.to_string(),
            executable.to_string(),
            guest::END_OF_OPTIONS.to_string(),
        ];
        args.extend(arguments.iter().map(|s| s.to_string()));

        tracing::info!(
            machine_id = %self.id,
            username = %user.username,
            executable,
            "Running guest command"
        );
        self.manage.run_owned(args).await
    }
}
