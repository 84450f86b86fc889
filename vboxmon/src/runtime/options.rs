//! Configuration for vboxmon.

use crate::runtime::constants::{defaults, envs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use vboxmon_shared::errors::{VboxError, VboxResult};

/// Options for a [`VmMonitor`](crate::VmMonitor).
///
/// Every field has a default, so partial documents deserialize cleanly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitorOptions {
    /// Hypervisor executable.
    ///
    /// Default: `$VBOXMON_VBOXMANAGE`, else `/usr/bin/vboxmanage`
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Delay between daemon ticks, also the hypervisor sampling period.
    ///
    /// Default: 200ms
    #[serde(default = "default_interval")]
    pub interval: Duration,

    /// Samples kept per counter and machine.
    ///
    /// Default: 120
    #[serde(default = "default_history_len")]
    pub history_len: usize,

    /// Upper bound for one `metrics collect` pass.
    ///
    /// Default: 1s
    #[serde(default = "default_collect_timeout")]
    pub collect_timeout: Duration,

    /// Pause after a lifecycle command before the state is re-read.
    ///
    /// Default: 1s
    #[serde(default = "default_settle_delay")]
    pub settle_delay: Duration,

    /// Explicit credential document.
    ///
    /// If None, `./users.json` then `<config dir>/vboxmon/users.json` are searched.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

fn default_executable() -> PathBuf {
    std::env::var_os(envs::VBOXMANAGE)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(defaults::EXECUTABLE))
}

fn default_interval() -> Duration {
    defaults::INTERVAL
}

fn default_history_len() -> usize {
    defaults::HISTORY_LEN
}

fn default_collect_timeout() -> Duration {
    defaults::COLLECT_TIMEOUT
}

fn default_settle_delay() -> Duration {
    defaults::SETTLE_DELAY
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            interval: default_interval(),
            history_len: default_history_len(),
            collect_timeout: default_collect_timeout(),
            settle_delay: default_settle_delay(),
            credentials_path: None,
        }
    }
}

impl MonitorOptions {
    /// Reject option combinations the daemon cannot run with.
    pub fn validate(&self) -> VboxResult<()> {
        if self.history_len == 0 {
            return Err(VboxError::Config(
                "history_len must be at least 1".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(VboxError::Config("interval must be non-zero".to_string()));
        }
        if self.executable.as_os_str().is_empty() {
            return Err(VboxError::Config("executable path is empty".to_string()));
        }
        Ok(())
    }
}
