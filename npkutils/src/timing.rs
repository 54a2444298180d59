//! Cancelable deadline primitives.
//!
//! NextPeek runs on fixed ticks and poll loops rather than callback timers.
//! A [`DelayGate`] is the replacement for a one-shot `setTimeout`: it is
//! armed with a deadline, can be canceled while pending, and fires exactly
//! once when a caller-supplied `now` passes the deadline. Taking `now` as a
//! parameter keeps every consumer deterministic under test.

use std::time::{Duration, Instant};

/// One-shot cancelable deadline.
///
/// Lifecycle: `arm` sets a deadline (re-arming replaces it), `cancel`
/// disarms, `fire` returns true at most once per arm, when the deadline has
/// passed.
#[derive(Debug, Default, Clone)]
pub struct DelayGate {
    deadline: Option<Instant>,
}

impl DelayGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the gate to fire `delay` after `now`.
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True while a deadline is set, elapsed or not.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True while armed and the deadline has not passed yet.
    pub fn is_pending(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(d) if now < d)
    }

    /// The armed deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the deadline if it has elapsed. Returns true exactly once
    /// per arm.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Minimum spacing between repetitions of an action.
#[derive(Debug, Default, Clone)]
pub struct Cooldown {
    until: Option<Instant>,
}

impl Cooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the cooldown period at `now`.
    pub fn start(&mut self, now: Instant, period: Duration) {
        self.until = Some(now + period);
    }

    /// True while the period has not elapsed.
    pub fn active(&self, now: Instant) -> bool {
        matches!(self.until, Some(u) if now < u)
    }
}

/// Trailing-edge debounce on top of [`DelayGate`].
///
/// Each `poke` re-arms the gate; `fire` returns true once the pokes have
/// been quiet for the configured delay. Used to bound the snapshot push
/// frequency when several host events land in a tight window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    gate: DelayGate,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: DelayGate::new(),
        }
    }

    /// Register a trigger; restarts the quiet window.
    pub fn poke(&mut self, now: Instant) {
        self.gate.arm(now, self.delay);
    }

    /// True once, when the quiet window has elapsed since the last poke.
    pub fn fire(&mut self, now: Instant) -> bool {
        self.gate.fire(now)
    }

    pub fn is_armed(&self) -> bool {
        self.gate.is_armed()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.gate.deadline()
    }

    pub fn cancel(&mut self) {
        self.gate.cancel();
    }
}
