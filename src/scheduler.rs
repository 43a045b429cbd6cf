//! Tick scheduling: two independent cadence channels polled once per frame.
//!
//! Timestamps are plain milliseconds supplied by the caller, so the simulation
//! never reads the wall clock itself. [`Clock`] abstracts where frame times
//! come from: [`SystemClock`] for real time, [`VirtualClock`] for headless
//! runs and tests.

use std::time::Instant;

/// A fixed-interval gate. Fires when strictly more than `interval_ms` has
/// elapsed since it last fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    interval_ms: u64,
    last_fired_ms: u64,
}

impl Channel {
    pub fn new(interval_ms: u64, now_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fired_ms: now_ms,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_fired_ms(&self) -> u64 {
        self.last_fired_ms
    }

    /// Returns true and records `now_ms` if the interval has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_fired_ms) > self.interval_ms {
            self.last_fired_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Restart the interval at `now_ms` without firing.
    pub fn rewind(&mut self, now_ms: u64) {
        self.last_fired_ms = now_ms;
    }
}

/// Gravity and physics channels of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub gravity: Channel,
    pub physics: Channel,
}

impl Cadence {
    pub fn new(gravity_interval_ms: u64, physics_interval_ms: u64, now_ms: u64) -> Self {
        Self {
            gravity: Channel::new(gravity_interval_ms, now_ms),
            physics: Channel::new(physics_interval_ms, now_ms),
        }
    }

    pub fn rewind(&mut self, now_ms: u64) {
        self.gravity.rewind(now_ms);
        self.physics.rewind(now_ms);
    }
}

/// Source of frame timestamps in milliseconds.
pub trait Clock {
    fn now_ms(&mut self) -> u64;
}

/// Wall clock, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&mut self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Deterministic clock that advances by a fixed frame length on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualClock {
    now_ms: u64,
    frame_ms: u64,
}

impl VirtualClock {
    pub fn new(frame_ms: u64) -> Self {
        Self { now_ms: 0, frame_ms }
    }

    /// Roughly 60 Hz.
    pub fn sixty_hz() -> Self {
        Self::new(16)
    }

    pub fn current_ms(&self) -> u64 {
        self.now_ms
    }
}

impl Clock for VirtualClock {
    fn now_ms(&mut self) -> u64 {
        self.now_ms += self.frame_ms;
        self.now_ms
    }
}
