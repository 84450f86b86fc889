//! Tracked performance counters.

use serde::{Deserialize, Serialize};

/// Unit grammar a counter's value is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// `12.5%`
    Percent,
    /// `2048 kB`, `1 GB`, or a plain number of bytes
    Bytes,
}

/// A counter polled for every machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    CpuLoadUser,
    CpuLoadKernel,
    RamUsageTotal,
    RamUsageFree,
    DiskUsageUsed,
    RamUsageCache,
}

impl MetricKind {
    /// Every counter, in query order.
    pub const ALL: [MetricKind; 6] = [
        MetricKind::CpuLoadUser,
        MetricKind::CpuLoadKernel,
        MetricKind::RamUsageTotal,
        MetricKind::RamUsageFree,
        MetricKind::DiskUsageUsed,
        MetricKind::RamUsageCache,
    ];

    /// Counter name as the hypervisor knows it.
    pub fn raw_name(&self) -> &'static str {
        match self {
            MetricKind::CpuLoadUser => "Guest/CPU/Load/User",
            MetricKind::CpuLoadKernel => "Guest/CPU/Load/Kernel",
            MetricKind::RamUsageTotal => "Guest/RAM/Usage/Total",
            MetricKind::RamUsageFree => "Guest/RAM/Usage/Free",
            MetricKind::DiskUsageUsed => "Disk/Usage/Used",
            MetricKind::RamUsageCache => "Guest/RAM/Usage/Cache",
        }
    }

    pub fn from_raw_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.raw_name() == name)
    }

    pub fn unit(&self) -> Unit {
        match self {
            MetricKind::CpuLoadUser | MetricKind::CpuLoadKernel => Unit::Percent,
            MetricKind::RamUsageTotal
            | MetricKind::RamUsageFree
            | MetricKind::DiskUsageUsed
            | MetricKind::RamUsageCache => Unit::Bytes,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw_name())
    }
}
