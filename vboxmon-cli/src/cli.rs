use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use vboxmon::{MonitorOptions, VmMonitor};

use crate::commands;

/// vboxmon - watch and control VirtualBox machines
#[derive(Parser, Debug)]
#[command(name = "vboxmon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Path to the VBoxManage executable
    #[arg(long, global = true, env = "VBOXMON_VBOXMANAGE")]
    pub vboxmanage: Option<PathBuf>,

    /// Polling interval in milliseconds
    #[arg(long, global = true, env = "VBOXMON_INTERVAL_MS", default_value_t = 200)]
    pub interval_ms: u64,

    /// Samples kept per counter
    #[arg(long, global = true, env = "VBOXMON_HISTORY", default_value_t = 120)]
    pub history: usize,

    /// Upper bound on `metrics collect`, in milliseconds
    #[arg(long, global = true, env = "VBOXMON_COLLECT_TIMEOUT_MS", default_value_t = 1000)]
    pub collect_timeout_ms: u64,

    /// Delay before re-reading state after a lifecycle command, in milliseconds
    #[arg(long, global = true, env = "VBOXMON_SETTLE_MS", default_value_t = 1000)]
    pub settle_ms: u64,

    /// Guest credential document (default: ./users.json, then the user config dir)
    #[arg(long, global = true, env = "VBOXMON_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

impl GlobalFlags {
    pub fn options(&self) -> MonitorOptions {
        let mut options = MonitorOptions {
            interval: Duration::from_millis(self.interval_ms),
            history_len: self.history,
            collect_timeout: Duration::from_millis(self.collect_timeout_ms),
            settle_delay: Duration::from_millis(self.settle_ms),
            credentials_path: self.credentials.clone(),
            ..Default::default()
        };
        if let Some(path) = &self.vboxmanage {
            options.executable = path.clone();
        }
        options
    }

    pub async fn create_monitor(&self) -> anyhow::Result<VmMonitor> {
        Ok(VmMonitor::new(self.options()).await?)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List machines with their state
    List(commands::list::ListArgs),

    /// Show the machine-readable attributes of a machine
    Info(commands::info::InfoArgs),

    /// Start one or more machines headless
    Start(commands::start::StartArgs),

    /// Shut down one or more machines
    Stop(commands::stop::StopArgs),

    /// Pause one or more machines
    Pause(commands::pause::PauseArgs),

    /// Save the state of one or more machines
    Save(commands::save::SaveArgs),

    /// Resume one or more paused machines
    Resume(commands::resume::ResumeArgs),

    /// Poll metrics and print the latest values
    Watch(commands::watch::WatchArgs),
}
