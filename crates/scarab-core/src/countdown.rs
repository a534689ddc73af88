//! The scarcity countdown state machine (time condition only).
//!
//! Pure state: the runtime drives one `tick` per second and forwards the
//! resulting display changes to the view. Reaching zero is terminal and
//! forces the continue affordance open via the controller.

use serde::{Deserialize, Serialize};

/// Seconds on the clock when the offer countdown starts.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 30;

/// At or below this many remaining seconds the display turns urgent.
pub const URGENT_THRESHOLD_SECS: u32 = 10;

/// At or below this many remaining seconds the display turns critical.
pub const CRITICAL_THRESHOLD_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownState {
    Idle,
    Running,
    Expired,
}

/// Visual weight of the remaining-time display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Urgent,
    Critical,
}

/// The outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining: u32,
    pub expired: bool,
}

impl CountdownTick {
    pub fn urgency(&self) -> Urgency {
        if self.remaining <= CRITICAL_THRESHOLD_SECS {
            Urgency::Critical
        } else if self.remaining <= URGENT_THRESHOLD_SECS {
            Urgency::Urgent
        } else {
            Urgency::Normal
        }
    }

    /// The `MM:SS` text for this tick.
    pub fn display(&self) -> String {
        format_mm_ss(self.remaining)
    }
}

/// `Idle -> Running -> Expired`, one decrement per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    initial: u32,
    remaining: u32,
    state: CountdownState,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            initial: seconds,
            remaining: seconds,
            state: CountdownState::Idle,
        }
    }

    /// Starts the countdown. Returns false if it already left `Idle`.
    pub fn start(&mut self) -> bool {
        if self.state != CountdownState::Idle {
            return false;
        }
        self.state = CountdownState::Running;
        true
    }

    /// Decrements the clock by one second.
    ///
    /// Returns `None` unless the countdown is running. The tick that
    /// reaches zero reports `expired` and moves the machine to its
    /// terminal state; later calls return `None`.
    pub fn tick(&mut self) -> Option<CountdownTick> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        let expired = self.remaining == 0;
        if expired {
            self.state = CountdownState::Expired;
        }
        Some(CountdownTick {
            remaining: self.remaining,
            expired,
        })
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds the visitor watched the countdown before the current moment.
    pub fn elapsed(&self) -> u32 {
        self.initial - self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn is_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }
}

/// Formats a second count as zero-padded `MM:SS` (125 -> "02:05").
pub fn format_mm_ss(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mm_ss() {
        assert_eq!(format_mm_ss(125), "02:05");
        assert_eq!(format_mm_ss(30), "00:30");
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(600), "10:00");
    }

    #[test]
    fn test_tick_requires_start() {
        let mut countdown = Countdown::new(30);
        assert_eq!(countdown.state(), CountdownState::Idle);
        assert!(countdown.tick().is_none());
        assert!(countdown.start());
        assert!(!countdown.start());
        assert!(countdown.tick().is_some());
    }

    #[test]
    fn test_thirty_ticks_reach_expiry() {
        let mut countdown = Countdown::new(30);
        countdown.start();
        for expected in (1..30).rev() {
            let tick = countdown.tick().expect("still running");
            assert_eq!(tick.remaining, expected);
            assert!(!tick.expired);
        }
        let last = countdown.tick().expect("final tick");
        assert_eq!(last.remaining, 0);
        assert!(last.expired);
        assert_eq!(countdown.state(), CountdownState::Expired);
        assert_eq!(countdown.elapsed(), 30);
        assert!(countdown.tick().is_none(), "expired state is terminal");
    }

    #[test]
    fn test_urgency_tiers() {
        let mut countdown = Countdown::new(12);
        countdown.start();
        assert_eq!(countdown.tick().unwrap().urgency(), Urgency::Normal); // 11
        assert_eq!(countdown.tick().unwrap().urgency(), Urgency::Urgent); // 10
        for _ in 0..4 {
            countdown.tick(); // 9, 8, 7, 6
        }
        assert_eq!(countdown.tick().unwrap().urgency(), Urgency::Critical); // 5
    }
}
