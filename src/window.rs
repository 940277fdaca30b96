use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;

/// One reading and the moment it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Local>, value: f64) -> Self {
        Self { timestamp, value }
    }

    pub fn now(value: f64) -> Self {
        Self::new(Local::now(), value)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("Window capacity must be at least 1")]
    ZeroCapacity,
    #[error("Sample at {rejected} is older than latest sample at {latest}")]
    OutOfOrder {
        latest: DateTime<Local>,
        rejected: DateTime<Local>,
    },
}

/// Fixed-capacity FIFO of the most recent samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        })
    }

    /// Append a sample, evicting the oldest one if the window is full.
    ///
    /// A sample older than the latest one (wall clock stepped back) is
    /// rejected and the window is left as it was.
    pub fn push(&mut self, sample: Sample) -> Result<(), WindowError> {
        if let Some(latest) = self.samples.back() {
            if sample.timestamp < latest.timestamp {
                return Err(WindowError::OutOfOrder {
                    latest: latest.timestamp,
                    rejected: sample.timestamp,
                });
            }
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        Ok(())
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.value).sum();
        Some(sum / self.samples.len() as f64)
    }

    pub fn latest(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    /// Smallest and largest value currently held.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.samples.iter().map(|s| s.value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Copy of the current contents in push order.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn samples(values: &[f64]) -> Vec<Sample> {
        let start = Local::now();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(start + Duration::milliseconds(i as i64 * 100), *v))
            .collect()
    }

    fn values(window: &SampleWindow) -> Vec<f64> {
        window.snapshot().iter().map(|s| s.value).collect()
    }

    #[test]
    fn test_zero_capacity() {
        assert_eq!(SampleWindow::new(0).unwrap_err(), WindowError::ZeroCapacity);
    }

    #[test]
    fn test_keeps_last_capacity_samples() {
        let all = samples(&(0..20).map(f64::from).collect::<Vec<_>>());
        for capacity in [1, 3, 7, 20, 25] {
            let mut window = SampleWindow::new(capacity).unwrap();
            for (i, s) in all.iter().enumerate() {
                window.push(*s).unwrap();
                assert!(window.len() <= capacity);
                assert_eq!(window.len(), (i + 1).min(capacity));
            }
            let start = all.len().saturating_sub(capacity);
            assert_eq!(window.snapshot(), all[start..].to_vec());
        }
    }

    #[test]
    fn test_mean_after_eviction() {
        let all = samples(&[1.0, 2.0, 3.0, 4.0]);
        let mut window = SampleWindow::new(3).unwrap();
        for s in &all[..3] {
            window.push(*s).unwrap();
        }
        assert_eq!(window.mean(), Some(2.0));
        window.push(all[3]).unwrap();
        assert_eq!(window.mean(), Some(3.0));
        assert_eq!(values(&window), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_latest_single() {
        let mut window = SampleWindow::new(5).unwrap();
        assert_eq!(window.latest(), None);
        assert_eq!(window.mean(), None);
        let s = Sample::now(0.42);
        window.push(s).unwrap();
        assert_eq!(window.latest(), Some(s));
    }

    #[test]
    fn test_capacity_one_mean_is_latest() {
        let mut window = SampleWindow::new(1).unwrap();
        for s in samples(&[3.5, -1.25, 8.0, 0.0]) {
            window.push(s).unwrap();
            assert_eq!(window.len(), 1);
            assert_eq!(window.mean(), Some(s.value));
            assert_eq!(window.latest().map(|l| l.value), window.mean());
        }
    }

    #[test]
    fn test_out_of_order_rejected() {
        let all = samples(&[1.0, 2.0]);
        let mut window = SampleWindow::new(4).unwrap();
        window.push(all[1]).unwrap();
        assert!(matches!(
            window.push(all[0]),
            Err(WindowError::OutOfOrder { .. })
        ));
        assert_eq!(window.snapshot(), vec![all[1]]);

        // Equal timestamps keep the order non-decreasing.
        window.push(Sample::new(all[1].timestamp, 5.0)).unwrap();
        assert_eq!(values(&window), vec![2.0, 5.0]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let all = samples(&[1.0, 2.0, 3.0]);
        let mut window = SampleWindow::new(2).unwrap();
        window.push(all[0]).unwrap();
        let snap = window.snapshot();
        window.push(all[1]).unwrap();
        window.push(all[2]).unwrap();
        assert_eq!(snap, vec![all[0]]);
        assert_eq!(window.min_max(), Some((2.0, 3.0)));
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 2);
    }
}
