/// Rate limits error logging while a fetch keeps failing: the first `burst` failures of a
/// streak are reported, then one in every `every`.
#[derive(Debug, Clone)]
pub struct RetryLog {
    burst: u32,
    every: u32,
    failures: u32,
}

impl RetryLog {
    pub fn new(burst: u32, every: u32) -> Self {
        Self {
            burst,
            every: every.max(1),
            failures: 0,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Counts a failure and says whether it should be logged.
    pub fn record_failure(&mut self) -> bool {
        self.failures = self.failures.saturating_add(1);
        self.failures <= self.burst || (self.failures - self.burst) % self.every == 0
    }

    /// Ends a streak, returning its length if there was one.
    pub fn record_success(&mut self) -> Option<u32> {
        let streak = std::mem::take(&mut self.failures);
        (streak > 0).then_some(streak)
    }
}
