//! Single counter queries.

use vboxmon_shared::errors::VboxResult;

use super::{MetricKind, units};
use crate::management::VBoxManage;

/// Value text following the first occurrence of `name` in `stdout`.
///
/// Takes the rest of the line that contains `name`, removes the name and
/// trims. `None` when the name is absent or nothing follows it.
pub fn extract_value<'a>(stdout: &'a str, name: &str) -> Option<&'a str> {
    let start = stdout.find(name)?;
    let rest = &stdout[start + name.len()..];
    let line = rest.lines().next().unwrap_or_default().trim();
    (!line.is_empty()).then_some(line)
}

/// Queries counters through the hypervisor facade.
#[derive(Debug, Clone)]
pub struct MetricQuery {
    manage: VBoxManage,
}

impl MetricQuery {
    pub fn new(manage: VBoxManage) -> Self {
        Self { manage }
    }

    /// Current value of `kind` on `machine_id`.
    ///
    /// # Returns
    /// * `Ok(value)` - Parsed with the counter's unit grammar
    /// * `Ok(NaN)` - The hypervisor has no value for this counter yet
    /// * `Err(VboxError::MetricParse)` - Value present but malformed
    /// * `Err(VboxError::Process)` - Query could not be run
    pub async fn query(&self, machine_id: &str, kind: MetricKind) -> VboxResult<f64> {
        let output = self.manage.metrics_query(machine_id, kind.raw_name()).await?;
        if !output.success() {
            tracing::debug!(
                machine_id,
                counter = kind.raw_name(),
                exit = %output.describe_exit(),
                "Metric query exited nonzero"
            );
        }

        match extract_value(&output.stdout_text(), kind.raw_name()) {
            Some(text) => units::parse_value(text, kind.unit()),
            None => Ok(f64::NAN),
        }
    }
}
