pub mod constants;
pub mod options;

mod core;
pub use self::core::VmMonitor;
pub use options::MonitorOptions;
