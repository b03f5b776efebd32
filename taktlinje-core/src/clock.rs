//! # Simulation Clock
//!
//! Monotonic simulated time. Only the event pop path advances it; the greedy
//! resolution pass operates at a fixed instant and never touches the clock.

/// Simulated time in abstract units, never moving backwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimClock {
    now: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self { now: 0.0 }
    }

    /// Current simulated time.
    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance to `to` and return the elapsed interval. A target earlier than
    /// the current time leaves the clock unchanged and returns 0.0.
    pub fn advance_to(&mut self, to: f64) -> f64 {
        if to < self.now {
            return 0.0;
        }
        let dt = to - self.now;
        self.now = to;
        dt
    }

    /// Rewind to zero. Only valid between runs.
    pub fn reset(&mut self) {
        self.now = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.now(), 0.0);
    }

    #[test]
    fn advance_accumulates() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance_to(5.0), 5.0);
        assert_eq!(clock.advance_to(7.5), 2.5);
        assert_eq!(clock.now(), 7.5);
    }

    #[test]
    fn never_moves_backwards() {
        let mut clock = SimClock::new();
        clock.advance_to(10.0);
        assert_eq!(clock.advance_to(3.0), 0.0);
        assert_eq!(clock.now(), 10.0);
    }
}
