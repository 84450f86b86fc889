//! Performance counter polling and history.
//!
//! - [`MetricQuery`]: one counter of one machine, parsed with its unit
//! - [`MetricStore`]: fixed-length rolling series per machine and counter
//! - [`PollingDaemon`]: background task feeding the store

mod daemon;
mod kind;
mod query;
mod series;
mod store;
pub mod units;

pub use daemon::{DaemonHandle, PollingDaemon, TickReport};
pub use kind::{MetricKind, Unit};
pub use query::{MetricQuery, extract_value};
pub use series::MetricSeries;
pub use store::{MachineHistory, MetricStore, SeriesKey};
