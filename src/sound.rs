use crate::timer::Tone;
use beep::beep;
use std::error::Error;

/// something that can play the machine's single tone
///
/// The interpreter only calls this on edges of the sound timer: `beep` when
/// it goes non-zero, `stop` when it reaches zero (or the run ends with the
/// tone still on). Calls never repeat an edge, so implementations needn't
/// guard against a double `beep`.
pub trait Sound {
    /// start the tone
    fn beep(&mut self) -> Result<(), Box<dyn Error>>;
    /// stop the tone
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;

    /// dispatch a tone edge
    fn tone(&mut self, tone: Tone) -> Result<(), Box<dyn Error>> {
        match tone {
            Tone::On => self.beep(),
            Tone::Off => self.stop(),
        }
    }
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// PC speaker beep; needs access to the console
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimpleBeep {
    fn drop(&mut self) {
        if self.is_beeping {
            let _ = beep(0);
        }
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        beep(SIMPLEBEEP_PITCH)?;
        self.is_beeping = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        beep(0)?;
        self.is_beeping = false;
        Ok(())
    }
}

/// silence; also records the edges it was given, for tests
#[derive(Default)]
pub struct Mute {
    pub edges: Vec<Tone>,
}

impl Mute {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        self.edges.push(Tone::On);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        self.edges.push(Tone::Off);
        Ok(())
    }
}
