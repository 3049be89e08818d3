//! Windowed moving-average smoothing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Moving-average smoother for a noisy integer sensor channel.
///
/// The window is pre-filled with an initial value so the output is defined
/// from the very first cycle rather than converging from zero.
#[derive(Clone, Debug, Default)]
pub struct MeanFilter {
    window: VecDeque<i32>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MeanFilter {
    /// Create a filter with the window pre-filled with `initial_value`.
    ///
    /// A `window_len` of zero is treated as one.
    pub fn new(window_len: usize, initial_value: i32) -> Self {
        let window_len = window_len.max(1);
        let mut window = VecDeque::with_capacity(window_len);
        for _ in 0..window_len {
            window.push_back(initial_value);
        }
        MeanFilter { window }
    }

    /// Push one raw reading and return the smoothed value.
    pub fn filtered(&mut self, raw: i32) -> i32 {
        if self.window.is_empty() {
            // Unconfigured filter, pass the reading through
            return raw;
        }

        self.window.pop_front();
        self.window.push_back(raw);

        let sum: i64 = self.window.iter().map(|&v| v as i64).sum();
        (sum / self.window.len() as i64) as i32
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
