//! Hypervisor protocol vocabulary
//!
//! Subcommand names, attribute keys and raw state strings understood by
//! `VBoxManage`. Anything that builds or parses hypervisor text uses these.

/// Top-level subcommands
pub mod commands {
    pub const LIST: &str = "list";
    pub const SHOW_VM_INFO: &str = "showvminfo";
    pub const METRICS: &str = "metrics";
    pub const START_VM: &str = "startvm";
    pub const CONTROL_VM: &str = "controlvm";
    pub const GUEST_CONTROL: &str = "guestcontrol";
}

/// Arguments following `list`, `showvminfo` and `startvm`
pub mod args {
    pub const VMS: &str = "vms";
    pub const MACHINE_READABLE: &str = "--machinereadable";
    pub const TYPE: &str = "--type";
    pub const HEADLESS: &str = "headless";
}

/// `metrics` subcommand actions and flags
pub mod metrics {
    pub const ENABLE: &str = "enable";
    pub const SETUP: &str = "setup";
    pub const COLLECT: &str = "collect";
    pub const QUERY: &str = "query";
    pub const PERIOD: &str = "--period";
    pub const SAMPLES: &str = "--samples";
}

/// `controlvm` actions
pub mod control {
    pub const ACPI_POWER_BUTTON: &str = "acpipowerbutton";
    pub const POWER_OFF: &str = "poweroff";
    pub const PAUSE: &str = "pause";
    pub const SAVE_STATE: &str = "savestate";
    pub const RESUME: &str = "resume";
}

/// `guestcontrol <id> run` flags
pub mod guest {
    pub const RUN: &str = "run";
    pub const USERNAME: &str = "--username";
    pub const PASSWORD: &str = "--password";
    pub const EXE: &str = "--exe";
    pub const END_OF_OPTIONS: &str = "--";
}

/// Keys of the machine-readable info dump
pub mod info_keys {
    pub const VM_STATE: &str = "VMState";
    pub const OS_TYPE: &str = "ostype";
}

/// Raw `VMState` values (compared after case folding)
pub mod states {
    pub const RUNNING: &str = "running";
    pub const POWER_OFF: &str = "poweroff";
    pub const PAUSED: &str = "paused";
    pub const SAVING: &str = "saving";
    pub const SAVED: &str = "saved";
    pub const RESTORING: &str = "restoring";
    pub const ABORTED: &str = "aborted";
}
