//! vboxmon - metrics polling and lifecycle control for VirtualBox machines
//!
//! Drives the `VBoxManage` command line to discover machines, keep a
//! rolling history of their performance counters and start/stop them.
//!
//! # Example
//!
//! ```rust,no_run
//! use vboxmon::{MetricKind, MonitorOptions, VmMonitor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let monitor = VmMonitor::new(MonitorOptions::default()).await?;
//! monitor.start_daemon();
//!
//! for machine in monitor.list_machines().await? {
//!     let cpu = monitor.store().latest(machine.id(), MetricKind::CpuLoadUser);
//!     println!("{}: {:?}", machine.name(), cpu);
//! }
//!
//! monitor.stop_daemon().await?;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod machine;
pub mod management;
pub mod metrics;
pub mod runtime;
pub mod util;

pub use credentials::{CredentialStore, UserInfo};
pub use machine::{
    LifecycleAction, LifecycleController, LifecycleOutcome, LifecycleState, MachineInfo,
    VirtualMachine,
};
pub use management::VBoxManage;
pub use metrics::{
    DaemonHandle, MachineHistory, MetricKind, MetricQuery, MetricSeries, MetricStore,
    PollingDaemon, SeriesKey, TickReport,
};
pub use runtime::{MonitorOptions, VmMonitor};
pub use util::{CommandRunner, ProcessOutcome, ProcessOutput, ProcessRunner};
pub use vboxmon_shared::errors::{VboxError, VboxResult};
