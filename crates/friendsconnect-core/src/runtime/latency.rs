use std::time::Duration;

use super::random::RandomSource;

/// Artificial delay standing in for a network round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulatedLatency {
    base: Duration,
    /// Upper bound of the random extra delay added to `base`
    jitter: Duration,
}

impl SimulatedLatency {
    pub const NONE: Self = Self {
        base: Duration::ZERO,
        jitter: Duration::ZERO,
    };

    pub fn fixed(base: Duration) -> Self {
        Self {
            base,
            jitter: Duration::ZERO,
        }
    }

    pub fn jittered(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn is_zero(&self) -> bool {
        self.base.is_zero() && self.jitter.is_zero()
    }

    /// Draw one delay. Fixed latencies never consume randomness.
    pub fn sample(&self, rng: &mut dyn RandomSource) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        self.base + self.jitter.mul_f64(rng.next_f64())
    }
}

/// Sleep for `delay`, skipping the timer entirely when it is zero.
pub async fn simulate(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
