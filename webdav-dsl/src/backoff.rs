use std::time::Duration;

use rand::Rng;

/// Exponential polling delay used while waiting on server-side state.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: bool,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter: bool) -> Self {
        Self { base, max, jitter }
    }

    /// 100ms doubling up to 2s, each delay drawn from the upper half.
    pub fn polling() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(2), true)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let mut rng = rand::thread_rng();
        self.delay_with_rng(attempt, &mut rng)
    }

    pub fn delay_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base_ms = u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        let exp = base_ms.saturating_mul(1u64 << attempt.min(16)).min(max_ms);
        if self.jitter && exp > 0 {
            Duration::from_millis(rng.gen_range(exp / 2..=exp))
        } else {
            Duration::from_millis(exp)
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::polling()
    }
}
