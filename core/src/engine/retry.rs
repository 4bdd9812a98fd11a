// Copyright (c) 2022-2023 The MobileCoin Foundation

/// Bounded count of wrong-code attempts
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RetryCounter {
    count: u8,
    max: u8,
}

impl RetryCounter {
    /// Create a counter allowing `max` attempts (minimum 1)
    pub const fn new(max: u8) -> Self {
        let max = if max == 0 { 1 } else { max };
        Self { count: 0, max }
    }

    /// Record a failed attempt, returns true once the limit is reached
    pub fn increment(&mut self) -> bool {
        if self.count < self.max {
            self.count += 1;
        }
        self.is_exhausted()
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn remaining(&self) -> u8 {
        self.max - self.count
    }

    pub fn is_exhausted(&self) -> bool {
        self.count >= self.max
    }
}
