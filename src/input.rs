use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

/// map of keyboard characters to the keys of the hex keypad, using the
/// left-hand side of a qwerty keyboard:
///
/// ```text
/// 1 2 3 C      1 2 3 4
/// 4 5 6 D      q w e r
/// 7 8 9 E      a s d f
/// A 0 B F      z x c v
/// ```
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// A fixed, two-way mapping between physical keys and the 16 keypad keys.
/// Built once at startup and never changed.
#[derive(Clone, Debug)]
pub struct KeyMap {
    to_keypad: HashMap<char, u8>,
    to_physical: [char; 16],
}

impl KeyMap {
    /// build from (physical, keypad) pairs; every keypad key and every
    /// physical key must appear exactly once
    pub fn new(pairs: &[(char, u8); 16]) -> Option<Self> {
        let mut seen = [false; 16];
        for &(_, k) in pairs {
            match seen.get_mut(k as usize) {
                Some(s) if !*s => *s = true,
                _ => return None,
            }
        }
        let map = Self::build(pairs);
        if map.to_keypad.len() != 16 {
            return None;
        }
        Some(map)
    }

    pub fn conventional() -> Self {
        Self::build(&CHIP8_CONVENTIONAL_KEYMAP)
    }

    fn build(pairs: &[(char, u8); 16]) -> Self {
        let mut to_physical = ['\0'; 16];
        for &(c, k) in pairs {
            to_physical[(k & 0x0f) as usize] = c;
        }
        KeyMap {
            to_keypad: pairs.iter().copied().collect(),
            to_physical,
        }
    }

    pub fn keypad(&self, physical: char) -> Option<u8> {
        self.to_keypad.get(&physical.to_ascii_lowercase()).copied()
    }

    pub fn physical(&self, keypad: u8) -> char {
        self.to_physical[(keypad & 0x0f) as usize]
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::conventional()
    }
}

/// something that happened on the keypad, or the host asking to stop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(u8),
    KeyUp(u8),
    Quit,
}

/// reads keypresses
pub trait Input {
    /// everything that has happened since the last call, oldest first;
    /// never blocks
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error>;
}

/// Terminals only report presses (and autorepeat), never releases, so a key
/// is let go once no repeat has arrived for this long.
const KEY_HOLD: Duration = Duration::from_millis(150);

/// simple implementation of Input, reading key events from the terminal
pub struct StdinInput {
    keymap: KeyMap,
    held: [Option<Instant>; 16],
}

impl StdinInput {
    pub fn new(keymap: KeyMap) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap,
            held: [None; 16],
        })
    }

    fn translate(&mut self, code: KeyCode, modifiers: KeyModifiers, out: &mut Vec<InputEvent>) {
        match code {
            KeyCode::Esc => out.push(InputEvent::Quit),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                out.push(InputEvent::Quit)
            }
            KeyCode::Char(c) => match self.keymap.keypad(c) {
                Some(k) => {
                    if self.held[k as usize].replace(Instant::now()).is_none() {
                        out.push(InputEvent::KeyDown(k));
                    }
                }
                None => log::warn!("can't map {:?} to a keypad key", c),
            },
            other => log::debug!("ignoring key {:?}", other),
        }
    }

    fn release_stale(&mut self, now: Instant, out: &mut Vec<InputEvent>) {
        for (k, held) in self.held.iter_mut().enumerate() {
            if matches!(held, Some(since) if now.duration_since(*since) >= KEY_HOLD) {
                *held = None;
                out.push(InputEvent::KeyUp(k as u8));
            }
        }
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => self.translate(evt.code, evt.modifiers, &mut events),
                Event::Resize(..) => {}
                other => log::debug!("ignoring event {:?}", other),
            }
        }
        self.release_stale(Instant::now(), &mut events);
        Ok(events)
    }
}

/// dummy Input implementation for testing; hands out one scripted batch of
/// events per poll, then nothing
pub struct DummyInput {
    batches: VecDeque<Vec<InputEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<InputEvent>>) -> Self {
        DummyInput {
            batches: batches.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(Vec::new())
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_map_is_bijective() {
        let map = KeyMap::conventional();
        for k in 0..16u8 {
            assert_eq!(map.keypad(map.physical(k)), Some(k));
        }
        assert_eq!(map.keypad('Q'), Some(0x4));
        assert_eq!(map.keypad('p'), None);
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let mut pairs = CHIP8_CONVENTIONAL_KEYMAP;
        assert!(KeyMap::new(&pairs).is_some());
        pairs[1] = ('1', 0x00);
        assert!(KeyMap::new(&pairs).is_none());
        let mut pairs = CHIP8_CONVENTIONAL_KEYMAP;
        pairs[1] = ('x', 0x01);
        assert!(KeyMap::new(&pairs).is_none());
    }

    #[test]
    fn test_dummy_input_batches() -> Result<(), io::Error> {
        let mut input = DummyInput::new(vec![
            vec![InputEvent::KeyDown(1), InputEvent::KeyUp(1)],
            vec![InputEvent::Quit],
        ]);
        assert_eq!(input.poll_events()?.len(), 2);
        assert_eq!(input.poll_events()?, vec![InputEvent::Quit]);
        assert!(input.poll_events()?.is_empty());
        Ok(())
    }
}
