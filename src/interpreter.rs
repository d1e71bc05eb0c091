//! # interpreter
//!
//! The host loop. It owns a [`Machine`] and borrows the three collaborators
//! (display, input, sound), and each cycle it:
//!
//!  1. drains input events into the keypad (or stops on quit)
//!  2. steps the machine by exactly one instruction
//!  3. ticks the timers for however much wall-clock time has passed, and
//!     turns the tone on or off on sound-timer edges
//!  4. redraws if the framebuffer changed
//!  5. sleeps off the rest of the cycle
//!
//! A key wait (FX0A) parks the loop in [`Chip8Interpreter::wait_for_key`],
//! which keeps the timers, screen and quit handling alive until a key
//! goes down.
use crate::config::Config;
use crate::cpu::Step;
use crate::display::Display;
use crate::error::RunError;
use crate::input::{Input, InputEvent};
use crate::machine::Machine;
use crate::sound::Sound;
use crate::timer::{TimerDriver, ToneTracker};
use std::time::{Duration, Instant};

/// how a key wait ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyWait {
    Pressed(u8),
    /// the host asked to quit, or there was nothing to wait for
    Cancelled,
}

/// why the loop stopped, when it stopped cleanly
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    Quit,
    CycleLimit,
}

pub struct Chip8Interpreter<'a> {
    machine: Machine,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    cycle: Duration,
    timer: TimerDriver,
    tone: ToneTracker,
    sound_ok: bool,
    last_tick: Instant,
}

impl<'a> Chip8Interpreter<'a> {
    /// `machine` should already have a program loaded
    pub fn new(
        machine: Machine,
        config: &Config,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Chip8Interpreter<'a> {
        Chip8Interpreter {
            machine,
            display,
            input,
            sound,
            cycle: Duration::from_secs(1) / config.instructions_per_second.max(1),
            timer: TimerDriver::new(config.timer_hz),
            tone: ToneTracker::default(),
            sound_ok: true,
            last_tick: Instant::now(),
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// run until the host quits, a fault occurs, or `limit` instructions
    /// have executed
    pub fn main_loop(&mut self, limit: Option<u64>) -> Result<Exit, RunError> {
        log::info!("starting at {:#05x}, one instruction every {:?}", self.machine.pc, self.cycle);
        self.last_tick = Instant::now();
        let exit = self.run(limit);
        // don't leave the speaker on whatever happened
        if self.tone.is_on() && self.sound_ok {
            if let Err(e) = self.sound.stop() {
                log::warn!("couldn't silence the tone on the way out: {}", e);
            }
        }
        match &exit {
            Ok(how) => log::info!("stopped: {:?}", how),
            Err(e) => log::error!("stopped: {} in {:?}", e, self.machine),
        }
        exit
    }

    fn run(&mut self, limit: Option<u64>) -> Result<Exit, RunError> {
        self.machine.take_draw_flag();
        self.display.draw(&self.machine.framebuffer)?;
        let mut cycles: u64 = 0;
        loop {
            if limit.map_or(false, |l| cycles >= l) {
                return Ok(Exit::CycleLimit);
            }
            let started = Instant::now();

            if self.handle_input()? {
                return Ok(Exit::Quit);
            }
            if self.machine.step()? == Step::AwaitingKey {
                if let KeyWait::Cancelled = self.wait_for_key()? {
                    return Ok(Exit::Quit);
                }
            }
            cycles += 1;

            self.service_timers();
            self.refresh()?;

            if let Some(rest) = self.cycle.checked_sub(started.elapsed()) {
                spin_sleep::sleep(rest);
            }
        }
    }

    /// block until the pending key wait is answered by a key-down, or the
    /// host quits; timers and the screen keep running meanwhile
    pub fn wait_for_key(&mut self) -> Result<KeyWait, RunError> {
        let x = match self.machine.awaiting_key() {
            Some(x) => x,
            None => return Ok(KeyWait::Cancelled),
        };
        log::debug!("waiting for a key into V{:X}", x);
        loop {
            if self.handle_input()? {
                self.machine.cancel_key_wait();
                return Ok(KeyWait::Cancelled);
            }
            if self.machine.awaiting_key().is_none() {
                return Ok(KeyWait::Pressed(self.machine.v[x]));
            }
            self.service_timers();
            self.refresh()?;
            spin_sleep::sleep(self.timer.period());
        }
    }

    /// feed pending input into the keypad; true if the host wants to stop
    fn handle_input(&mut self) -> Result<bool, RunError> {
        for event in self.input.poll_events()? {
            match event {
                InputEvent::KeyDown(k) => self.machine.key_down(k),
                InputEvent::KeyUp(k) => self.machine.key_up(k),
                InputEvent::Quit => return Ok(true),
            }
        }
        Ok(false)
    }

    fn service_timers(&mut self) {
        let now = Instant::now();
        self.timer
            .advance(now.duration_since(self.last_tick), &mut self.machine.timers);
        self.last_tick = now;

        if let Some(edge) = self.tone.update(&self.machine.timers) {
            if self.sound_ok {
                if let Err(e) = self.sound.tone(edge) {
                    log::warn!("sound unavailable, carrying on muted: {}", e);
                    self.sound_ok = false;
                }
            }
        }
    }

    fn refresh(&mut self) -> Result<(), RunError> {
        if self.machine.take_draw_flag() {
            self.display.draw(&self.machine.framebuffer)?;
        }
        Ok(())
    }
}
