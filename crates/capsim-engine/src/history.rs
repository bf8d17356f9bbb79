//! Fixed-size utilization history ring.
//!
//! Holds the last `len` per-tick utilization ratios, zero-filled at
//! creation. Scale-up looks at the two most recent entries; scale-down
//! needs the whole window.

/// Ticks of utilization remembered by the simulator.
pub const DEFAULT_HISTORY_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationHistory {
    data: Vec<f64>,
    /// Write index; also the oldest entry.
    cursor: usize,
}

impl UtilizationHistory {
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0.0; len.max(1)],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Record a utilization, discarding the oldest.
    pub fn push(&mut self, utilization: f64) {
        self.data[self.cursor] = utilization;
        self.cursor = (self.cursor + 1) % self.data.len();
    }

    /// The k-th most recent entry (k = 1 is the latest).
    pub fn kth_most_recent(&self, k: usize) -> Option<f64> {
        let len = self.data.len();
        if k == 0 || k > len {
            return None;
        }
        Some(self.data[(self.cursor + len - k) % len])
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let len = self.data.len();
        (0..len).map(move |i| self.data[(self.cursor + i) % len])
    }

    /// True when the `k` most recent entries are all strictly above
    /// `threshold` and strictly positive.
    pub fn recent_all_above(&self, k: usize, threshold: f64) -> bool {
        k > 0
            && (1..=k).all(|i| {
                self.kth_most_recent(i)
                    .is_some_and(|u| u > 0.0 && u > threshold)
            })
    }

    /// True when every entry in the window is strictly below `threshold`.
    pub fn all_below(&self, threshold: f64) -> bool {
        self.data.iter().all(|u| *u < threshold)
    }
}

impl Default for UtilizationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}
