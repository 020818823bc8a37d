//! Clocks the lip-sync scheduler reads.

use std::cell::Cell;

/// A monotonic source of seconds. Only differences between readings are
/// meaningful.
pub trait AudioClock {
    fn now(&self) -> f64;
}

/// The system's high-resolution timer.
pub struct SystemClock;

impl AudioClock for SystemClock {
    fn now(&self) -> f64 {
        time::precise_time_s()
    }
}

/// A clock that only moves when told to. Used for simulated playback and
/// in tests.
#[derive(Default)]
pub struct ManualClock {
    t: Cell<f64>,
}

impl ManualClock {
    pub fn new(t: f64) -> ManualClock {
        ManualClock { t: Cell::new(t) }
    }

    pub fn set(&self, t: f64) {
        self.t.set(t);
    }

    pub fn advance(&self, dt: f64) {
        self.t.set(self.t.get() + dt);
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> f64 {
        self.t.get()
    }
}

#[test]
fn test_manual_clock() {
    let clock = ManualClock::new(1.0);
    clock.advance(0.5);
    assert_eq!(clock.now(), 1.5);
    clock.set(0.25);
    assert_eq!(clock.now(), 0.25);
}

#[test]
fn test_system_clock_does_not_go_backwards() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
