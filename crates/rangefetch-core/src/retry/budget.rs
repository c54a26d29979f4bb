/// Global retry counter for one transfer. Never reset between windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max: u32,
    used: u32,
}

impl RetryBudget {
    pub fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    pub fn exhausted(&self) -> bool {
        self.used >= self.max
    }

    /// Spend one retry. Saturates at `max`.
    pub fn consume(&mut self) {
        if self.used < self.max {
            self.used += 1;
        }
    }
}
