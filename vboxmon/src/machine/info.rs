//! Machine-readable info snapshot.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::LifecycleState;
use crate::runtime::constants::{defaults, info_keys};

/// Attribute snapshot parsed from `showvminfo <id> --machinereadable`.
///
/// Immutable once built. A reload builds a new snapshot and swaps it in
/// whole, so readers never see a mix of old and new attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineInfo {
    /// Attributes in dump order. A repeated key keeps its first position
    /// and its last value.
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
    /// When this snapshot was loaded (UTC).
    pub loaded_at: DateTime<Utc>,
}

impl MachineInfo {
    /// Parse the line-oriented `key="value"` dump.
    ///
    /// Lines are split on the first `=` only; surrounding quotes are
    /// stripped from key and value. Lines without `=` are skipped.
    pub fn parse(text: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim_matches('"');
            let value = value.trim_matches('"');

            match index.get(key).copied() {
                Some(pos) => entries[pos].1 = value.to_string(),
                None => {
                    index.insert(key.to_string(), entries.len());
                    entries.push((key.to_string(), value.to_string()));
                }
            }
        }

        Self {
            entries,
            index,
            loaded_at: Utc::now(),
        }
    }

    /// Look up one attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.entries[pos].1.as_str())
    }

    /// All attributes in dump order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lifecycle state derived from `VMState`.
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_raw(self.get(info_keys::VM_STATE).unwrap_or_default())
    }

    /// Guest OS type, `<unknown>` when the dump has none.
    pub fn os_type(&self) -> &str {
        self.get(info_keys::OS_TYPE).unwrap_or(defaults::UNKNOWN_OS)
    }
}
