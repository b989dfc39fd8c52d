//! Process-wide throttle for dynamic light propagation.
//!
//! One [`CadenceGate`] is shared by every tracked source. Each accepted
//! check consumes the single token; the token refills after the quality
//! mode's interval. This bounds the total propagation rate but gives no
//! per-source fairness: under `Slow`, one source per 500 ms gets through.
//!
//! The gate is owned by the frame driver and only touched from the thread
//! that runs the tick and frame callbacks. Its boxed clock carries no `Send`
//! bound, so the gate cannot leave that thread.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use lumen_config::QualityMode;

/// Monotonic millisecond time source.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin; never decreases.
    fn now_millis(&self) -> u64;
}

/// [`Clock`] backed by [`Instant`], with its origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock for simulations and tests.
///
/// Clones share the same time, so a host can keep one handle and give
/// another to the gate.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Clock starting at `start` milliseconds.
    pub fn starting_at(start: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Moves time forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get().saturating_add(millis));
    }

    /// Jumps to an absolute time. Earlier values are ignored.
    pub fn set(&self, millis: u64) {
        if millis > self.now.get() {
            self.now.set(millis);
        }
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }
}

/// Global update gate consulted before every propagation.
pub struct CadenceGate {
    quality: QualityMode,
    last_update: Option<u64>,
    clock: Box<dyn Clock>,
}

impl CadenceGate {
    /// Gate using the given quality mode and clock.
    pub fn new(quality: QualityMode, clock: Box<dyn Clock>) -> Self {
        Self {
            quality,
            last_update: None,
            clock,
        }
    }

    /// Gate driven by a [`MonotonicClock`].
    pub fn with_monotonic_clock(quality: QualityMode) -> Self {
        Self::new(quality, Box::new(MonotonicClock::new()))
    }

    /// Current quality mode.
    pub fn quality(&self) -> QualityMode {
        self.quality
    }

    /// Switches the quality mode. The last accepted timestamp is kept.
    pub fn set_quality(&mut self, quality: QualityMode) {
        self.quality = quality;
    }

    /// Timestamp of the last accepted update, if any.
    pub fn last_update(&self) -> Option<u64> {
        self.last_update
    }

    /// Returns `true` and records the current time when an update may run now.
    pub fn should_update(&mut self) -> bool {
        if !self.quality.is_enabled() {
            return false;
        }

        let now = self.clock.now_millis();
        if let (Some(interval), Some(last)) = (self.quality.min_interval(), self.last_update)
            && now < last.saturating_add(interval.as_millis() as u64)
        {
            return false;
        }

        self.last_update = Some(now);
        true
    }
}

impl std::fmt::Debug for CadenceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CadenceGate")
            .field("quality", &self.quality)
            .field("last_update", &self.last_update)
            .finish_non_exhaustive()
    }
}
