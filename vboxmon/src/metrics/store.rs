//! Rolling metric history shared between the daemon and readers.
//!
//! Two lock levels: an outer `RwLock` over the machine map (write-locked
//! only when a machine is first seen) and one `RwLock` per machine entry
//! (write-locked for each append). Readers clone series under the entry's
//! read lock and never observe a half-applied append.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use vboxmon_shared::errors::{VboxError, VboxResult};

use super::{MetricKind, MetricSeries};

/// Addresses one series of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKey {
    Metric(MetricKind),
    /// Synthetic time axis, seconds relative to now.
    RelativeTime,
}

impl From<MetricKind> for SeriesKey {
    fn from(kind: MetricKind) -> Self {
        SeriesKey::Metric(kind)
    }
}

#[derive(Debug)]
struct MachineEntry {
    series: BTreeMap<MetricKind, MetricSeries>,
    relative_time: MetricSeries,
}

impl MachineEntry {
    fn new(len: usize, interval: Duration) -> Self {
        Self {
            series: MetricKind::ALL
                .into_iter()
                .map(|kind| (kind, MetricSeries::filled_nan(len)))
                .collect(),
            relative_time: MetricSeries::relative_time(len, interval),
        }
    }

    fn get(&self, key: SeriesKey) -> Option<&MetricSeries> {
        match key {
            SeriesKey::Metric(kind) => self.series.get(&kind),
            SeriesKey::RelativeTime => Some(&self.relative_time),
        }
    }
}

/// Consistent copy of every series of one machine.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineHistory {
    pub machine_id: String,
    pub series: BTreeMap<MetricKind, MetricSeries>,
    pub relative_time: MetricSeries,
}

impl MachineHistory {
    pub fn get(&self, kind: MetricKind) -> Option<&MetricSeries> {
        self.series.get(&kind)
    }

    /// Element-wise `total - free`. NaN propagates.
    pub fn ram_used_bytes(&self) -> Vec<f64> {
        match (
            self.series.get(&MetricKind::RamUsageTotal),
            self.series.get(&MetricKind::RamUsageFree),
        ) {
            (Some(total), Some(free)) => total.iter().zip(free.iter()).map(|(t, f)| t - f).collect(),
            _ => Vec::new(),
        }
    }
}

/// Per-machine rolling history of every tracked counter.
#[derive(Debug)]
pub struct MetricStore {
    history_len: usize,
    interval: Duration,
    machines: RwLock<HashMap<String, Arc<RwLock<MachineEntry>>>>,
}

impl MetricStore {
    /// Empty store. Every series created later holds `history_len` samples
    /// and the time axis spans `history_len × interval`.
    pub fn new(history_len: usize, interval: Duration) -> Self {
        Self {
            history_len,
            interval,
            machines: RwLock::new(HashMap::new()),
        }
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Create a NaN-seeded entry for `machine_id` if there is none.
    ///
    /// Returns true if the entry was created.
    pub fn ensure_machine(&self, machine_id: &str) -> bool {
        if self.machines.read().contains_key(machine_id) {
            return false;
        }

        let mut machines = self.machines.write();
        if machines.contains_key(machine_id) {
            return false;
        }
        machines.insert(
            machine_id.to_string(),
            Arc::new(RwLock::new(MachineEntry::new(self.history_len, self.interval))),
        );
        true
    }

    /// Push `value` as the newest sample of `kind` and evict the oldest.
    ///
    /// # Errors
    ///
    /// [`VboxError::NotFound`] if the machine has no entry.
    pub fn append(&self, machine_id: &str, kind: MetricKind, value: f64) -> VboxResult<()> {
        let entry = self.entry(machine_id)?;
        let mut entry = entry.write();
        if let Some(series) = entry.series.get_mut(&kind) {
            series.push(value);
        }
        Ok(())
    }

    /// Copy of one series.
    pub fn read(&self, machine_id: &str, key: impl Into<SeriesKey>) -> Option<MetricSeries> {
        let entry = self.entry(machine_id).ok()?;
        let entry = entry.read();
        entry.get(key.into()).cloned()
    }

    /// Copy of every series of one machine, taken under a single lock.
    pub fn history(&self, machine_id: &str) -> Option<MachineHistory> {
        let entry = self.entry(machine_id).ok()?;
        let entry = entry.read();
        Some(MachineHistory {
            machine_id: machine_id.to_string(),
            series: entry.series.clone(),
            relative_time: entry.relative_time.clone(),
        })
    }

    /// Newest sample of one counter.
    pub fn latest(&self, machine_id: &str, kind: MetricKind) -> Option<f64> {
        let entry = self.entry(machine_id).ok()?;
        let entry = entry.read();
        entry.series.get(&kind).and_then(MetricSeries::latest)
    }

    /// Known machine ids, sorted.
    pub fn machine_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.machines.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn entry(&self, machine_id: &str) -> VboxResult<Arc<RwLock<MachineEntry>>> {
        self.machines
            .read()
            .get(machine_id)
            .cloned()
            .ok_or_else(|| VboxError::NotFound(machine_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store() -> MetricStore {
        MetricStore::new(4, Duration::from_millis(200))
    }

    #[test]
    fn test_ensure_machine_seeds_nan() {
        let store = store();
        assert!(store.ensure_machine("a"));
        assert!(!store.ensure_machine("a"));

        for kind in MetricKind::ALL {
            let series = store.read("a", kind).unwrap();
            assert_eq!(series.len(), 4);
            assert!(series.iter().all(f64::is_nan));
        }
        let axis = store.read("a", SeriesKey::RelativeTime).unwrap();
        assert_eq!(axis.len(), 4);
        assert_eq!(axis.latest(), Some(0.0));
    }

    #[test]
    fn test_ensure_machine_leaves_existing_entry() {
        let store = store();
        store.ensure_machine("a");
        store.append("a", MetricKind::CpuLoadUser, 5.0).unwrap();
        store.ensure_machine("a");
        store.ensure_machine("b");

        assert_eq!(store.latest("a", MetricKind::CpuLoadUser), Some(5.0));
        assert!(store.latest("b", MetricKind::CpuLoadUser).unwrap().is_nan());
    }

    #[test]
    fn test_append_unknown_machine() {
        let store = store();
        let result = store.append("ghost", MetricKind::CpuLoadUser, 1.0);
        assert!(matches!(result, Err(VboxError::NotFound(id)) if id == "ghost"));
    }

    #[test]
    fn test_read_unknown_machine() {
        let store = store();
        assert!(store.read("ghost", MetricKind::CpuLoadUser).is_none());
        assert!(store.history("ghost").is_none());
    }

    #[test]
    fn test_machine_ids_sorted() {
        let store = store();
        store.ensure_machine("b");
        store.ensure_machine("a");
        assert_eq!(store.machine_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_ram_used_bytes() {
        let store = MetricStore::new(2, Duration::from_secs(1));
        store.ensure_machine("a");
        store.append("a", MetricKind::RamUsageTotal, 100.0).unwrap();
        store.append("a", MetricKind::RamUsageFree, 40.0).unwrap();

        let used = store.history("a").unwrap().ram_used_bytes();
        assert_eq!(used.len(), 2);
        assert!(used[0].is_nan());
        assert_eq!(used[1], 60.0);
    }

    #[test]
    fn test_reads_never_see_partial_append() {
        let store = Arc::new(store());
        store.ensure_machine("a");

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..50_000 {
                    let kind = MetricKind::ALL[i % MetricKind::ALL.len()];
                    store.append("a", kind, i as f64).unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let series = store.read("a", MetricKind::CpuLoadUser).unwrap();
            assert_eq!(series.len(), store.history_len());

            let history = store.history("a").unwrap();
            for kind in MetricKind::ALL {
                assert_eq!(history.get(kind).unwrap().len(), store.history_len());
            }
        }
        writer.join().unwrap();

        assert_eq!(
            store.latest("a", MetricKind::ALL[(50_000 - 1) % MetricKind::ALL.len()]),
            Some(49_999.0)
        );
    }

    proptest! {
        #[test]
        fn prop_series_length_is_constant(
            len in 1usize..32,
            appends in proptest::collection::vec((0usize..6, -1e9f64..1e9), 0..200),
        ) {
            let store = MetricStore::new(len, Duration::from_millis(100));
            store.ensure_machine("m");

            for (index, value) in &appends {
                store.append("m", MetricKind::ALL[*index], *value).unwrap();
            }

            let history = store.history("m").unwrap();
            prop_assert_eq!(history.relative_time.len(), len);
            for kind in MetricKind::ALL {
                prop_assert_eq!(history.get(kind).unwrap().len(), len);
            }

            if let Some((index, value)) = appends.last() {
                prop_assert_eq!(store.latest("m", MetricKind::ALL[*index]), Some(*value));
            }
        }
    }
}
