//! The two 60 Hz countdown registers and the bookkeeping that drives them.
//!
//! Nothing here knows about wall-clock time directly: the host measures
//! elapsed time and feeds it to a [`TimerDriver`], which decides how many
//! ticks are due. That keeps instruction rate and timer rate independent.
use std::time::Duration;

/// the rate at which both timers count down
pub const CHIP8_TIMER_HZ: u32 = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    /// count both timers down once; zero is the floor
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// the tone plays for as long as the sound timer is non-zero
    pub fn tone(&self) -> bool {
        self.sound > 0
    }
}

/// edge reported to the audio collaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    On,
    Off,
}

/// Turns the level of the sound timer into on/off edges.
#[derive(Debug, Default)]
pub struct ToneTracker {
    on: bool,
}

impl ToneTracker {
    pub fn update(&mut self, timers: &Timers) -> Option<Tone> {
        match (self.on, timers.tone()) {
            (false, true) => {
                self.on = true;
                Some(Tone::On)
            }
            (true, false) => {
                self.on = false;
                Some(Tone::Off)
            }
            _ => None,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

/// Accumulates elapsed wall-clock time and releases one tick per period.
#[derive(Debug)]
pub struct TimerDriver {
    period: Duration,
    accumulated: Duration,
}

impl TimerDriver {
    pub fn new(hz: u32) -> Self {
        TimerDriver {
            period: Duration::from_secs(1) / hz.max(1),
            accumulated: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// add `elapsed` and tick `timers` once for every whole period that has
    /// passed, however many instructions ran in between; returns the number
    /// of ticks applied
    pub fn advance(&mut self, elapsed: Duration, timers: &mut Timers) -> u32 {
        self.accumulated += elapsed;
        let mut ticks = 0;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            timers.tick();
            ticks += 1;
        }
        ticks
    }
}

impl Default for TimerDriver {
    fn default() -> Self {
        Self::new(CHIP8_TIMER_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_floors_at_zero() {
        let mut t = Timers { delay: 1, sound: 0 };
        t.tick();
        assert_eq!(t, Timers { delay: 0, sound: 0 });
        t.tick();
        assert_eq!(t, Timers { delay: 0, sound: 0 });
    }

    #[test]
    fn test_driver_ticks_once_per_period() {
        let mut d = TimerDriver::default();
        let mut t = Timers { delay: 10, sound: 10 };
        // less than a 60th of a second
        assert_eq!(d.advance(Duration::from_millis(10), &mut t), 0);
        assert_eq!(t.delay, 10);
        // now over the line
        assert_eq!(d.advance(Duration::from_millis(10), &mut t), 1);
        assert_eq!(t.delay, 9);
        // a long stall catches up
        assert_eq!(d.advance(Duration::from_millis(100), &mut t), 6);
        assert_eq!(t, Timers { delay: 3, sound: 3 });
    }

    #[test]
    fn test_tone_edges() {
        let mut tracker = ToneTracker::default();
        let mut t = Timers::default();
        assert_eq!(tracker.update(&t), None);
        t.sound = 2;
        assert_eq!(tracker.update(&t), Some(Tone::On));
        t.tick();
        assert_eq!(tracker.update(&t), None);
        t.tick();
        assert_eq!(tracker.update(&t), Some(Tone::Off));
        assert!(!tracker.is_on());
    }
}
