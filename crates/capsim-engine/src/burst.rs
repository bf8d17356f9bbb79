//! Burst credit pool: a sliding window of banked unused capacity.
//!
//! ```text
//!   slots  = [70, 80, 0, 20, 60]
//!   cursor = 0   (oldest slot, next to be overwritten)
//!
//!   add(x)      slots[cursor] = x; cursor += 1      (old credit ages out)
//!   consume(n)  drain slots from cursor onward      (oldest first)
//! ```
//!
//! Every credit ages out exactly `len` ticks after it was banked.

use capsim_core::{CapsimError, CapsimResult};

/// Default window, in ticks, for which unused capacity stays spendable.
pub const DEFAULT_BURST_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct BurstPool {
    slots: Vec<f64>,
    cursor: usize,
}

impl BurstPool {
    /// Create an empty pool with `window` slots. A zero window is treated
    /// as one slot.
    pub fn new(window: usize) -> Self {
        Self {
            slots: vec![0.0; window.max(1)],
            cursor: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.slots.len()
    }

    /// Slots in storage order.
    pub fn slots(&self) -> &[f64] {
        &self.slots
    }

    /// Bank `amount` in the oldest slot, discarding whatever it held.
    pub fn add(&mut self, amount: f64) {
        self.slots[self.cursor] = amount.max(0.0);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Spend `amount` of credit, oldest slots first.
    ///
    /// Fails without touching any slot when the pool holds less than
    /// `amount`.
    pub fn consume(&mut self, amount: f64) -> CapsimResult<()> {
        let available = self.sum();
        if amount > available {
            return Err(CapsimError::InsufficientBurst {
                requested: amount,
                available,
            });
        }

        let len = self.slots.len();
        let mut remaining = amount.max(0.0);
        for i in 0..len {
            if remaining <= 0.0 {
                break;
            }
            let slot = &mut self.slots[(self.cursor + i) % len];
            if remaining >= *slot {
                remaining -= *slot;
                *slot = 0.0;
            } else {
                // Clamp so subtraction noise never leaves a negative slot.
                *slot = (*slot - remaining).max(0.0);
                remaining = 0.0;
            }
        }
        Ok(())
    }

    /// Total banked credit.
    pub fn sum(&self) -> f64 {
        self.slots.iter().sum()
    }
}

impl Default for BurstPool {
    fn default() -> Self {
        Self::new(DEFAULT_BURST_WINDOW)
    }
}
