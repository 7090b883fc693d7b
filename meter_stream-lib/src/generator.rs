use std::time::Duration;
use rand::{Rng, SeedableRng, rngs::StdRng};
use crate::message::Reading;

/// Meter ids are drawn from `0..METER_ID_BOUND`.
pub const METER_ID_BOUND: u32 = 64_352;
/// Event counts are drawn from `0..COUNT_BOUND`.
pub const COUNT_BOUND: u32 = 21;
/// Reading durations are whole seconds in `0..DURATION_BOUND_SECS`.
pub const DURATION_BOUND_SECS: u64 = 15;

/// Shortest pause between two ticks.
pub const PAUSE_FLOOR: Duration = Duration::from_millis(250);
/// Random extra pause on top of the floor, `0..PAUSE_JITTER_MS`.
pub const PAUSE_JITTER_MS: u64 = 2_250;

/// Synthetic reading source. Owns its random source, so every session gets
/// its own and nothing is shared across tasks.
#[derive(Debug)]
pub struct Generator<R = StdRng> {
    rng: R,
}

impl Generator<StdRng> {
    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible sequence, for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Generator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draws one reading; every field is independent of previous calls.
    pub fn reading(&mut self) -> Reading {
        Reading {
            meter_id: self.rng.gen_range(0..METER_ID_BOUND),
            count:    self.rng.gen_range(0..COUNT_BOUND),
            duration: Duration::from_secs(self.rng.gen_range(0..DURATION_BOUND_SECS)),
        }
    }

    /// Pause before the next tick, in `[250ms, 2500ms)`.
    pub fn pause(&mut self) -> Duration {
        PAUSE_FLOOR + Duration::from_millis(self.rng.gen_range(0..PAUSE_JITTER_MS))
    }
}
