//! Fixed-capacity sample series.

use std::collections::VecDeque;
use std::time::Duration;

/// Rolling window of samples, oldest first.
///
/// The length never changes after construction: every push evicts the
/// oldest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    samples: VecDeque<f64>,
}

impl MetricSeries {
    /// Series of `len` NaN samples.
    pub fn filled_nan(len: usize) -> Self {
        Self {
            samples: std::iter::repeat_n(f64::NAN, len).collect(),
        }
    }

    /// Offsets in seconds, evenly spaced from `-(len × interval)` to `0`
    /// inclusive. A single-sample axis is `[-interval]`.
    pub fn relative_time(len: usize, interval: Duration) -> Self {
        let step = interval.as_secs_f64();
        let start = -(len as f64) * step;

        let samples = match len {
            0 => VecDeque::new(),
            1 => VecDeque::from([-step]),
            _ => {
                let gap = -start / (len - 1) as f64;
                (0..len)
                    .map(|i| if i == len - 1 { 0.0 } else { start + gap * i as f64 })
                    .collect()
            }
        };
        Self { samples }
    }

    /// Append `value` as the newest sample and evict the oldest.
    pub fn push(&mut self, value: f64) {
        if self.samples.is_empty() {
            return;
        }
        self.samples.pop_front();
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut series = MetricSeries::filled_nan(3);
        series.push(1.0);
        series.push(2.0);
        series.push(3.0);
        series.push(4.0);
        assert_eq!(series.to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(series.latest(), Some(4.0));
    }

    #[test]
    fn test_filled_nan() {
        let series = MetricSeries::filled_nan(5);
        assert_eq!(series.len(), 5);
        assert!(series.iter().all(f64::is_nan));
    }

    #[test]
    fn test_relative_time_endpoints() {
        let axis = MetricSeries::relative_time(120, Duration::from_millis(200));
        let values = axis.to_vec();
        assert_eq!(values.len(), 120);
        assert!((values[0] + 24.0).abs() < 1e-9);
        assert_eq!(values[119], 0.0);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_relative_time_single_sample() {
        let axis = MetricSeries::relative_time(1, Duration::from_millis(200));
        assert_eq!(axis.to_vec(), vec![-0.2]);
    }

    #[test]
    fn test_relative_time_two_samples() {
        let axis = MetricSeries::relative_time(2, Duration::from_secs(1));
        assert_eq!(axis.to_vec(), vec![-2.0, 0.0]);
    }
}
