//! Constants for the vboxmon runtime
//!
//! Centralized location for defaults, environment variable names and paths.

// Re-export the protocol vocabulary from vboxmon-shared
pub use vboxmon_shared::constants::{
    args, commands, control, guest, info_keys, metrics, states,
};

pub mod envs {
    /// Overrides the hypervisor executable path.
    pub const VBOXMANAGE: &str = "VBOXMON_VBOXMANAGE";
}

/// Polling and lifecycle defaults
pub mod defaults {
    use std::time::Duration;

    /// Hypervisor executable used when no override is given
    pub const EXECUTABLE: &str = "/usr/bin/vboxmanage";

    /// Delay between daemon ticks (and the hypervisor sampling period)
    pub const INTERVAL: Duration = Duration::from_millis(200);

    /// Samples kept per counter and machine
    pub const HISTORY_LEN: usize = 120;

    /// Upper bound for one `metrics collect` pass
    pub const COLLECT_TIMEOUT: Duration = Duration::from_secs(1);

    /// Pause after a lifecycle command before re-reading the machine state
    pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

    /// Samples requested from `metrics setup`
    pub const SETUP_SAMPLES: u32 = 1;

    /// `os_type()` fallback when the info dump has no `ostype`
    pub const UNKNOWN_OS: &str = "<unknown>";
}

/// Credential document naming
pub mod filenames {
    use std::path::{Path, PathBuf};

    /// Credential document file name
    pub const USERS_FILE: &str = "users.json";

    /// Application directory under the user config dir
    pub const CONFIG_DIR: &str = "vboxmon";

    pub fn users_file(dir: &Path) -> PathBuf {
        dir.join(USERS_FILE)
    }
}
