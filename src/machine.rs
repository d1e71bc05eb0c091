//! Machine state: everything a running program can observe or change.
//!
//! The state has no behaviour of its own beyond mutations that keep its
//! invariants (stack depth, key indices, draw bookkeeping). Instruction
//! semantics live in [`crate::cpu`].
use crate::config::Quirks;
use crate::error::{Fault, LoadError};
use crate::instruction::Opcode;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_PROGRAM_ADDR};
use crate::timer::Timers;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// number of stack slots; slot 0 is never written, so 15 calls may nest
pub const STACK_SLOTS: usize = 16;
pub const MAX_STACK_DEPTH: u8 = (STACK_SLOTS - 1) as u8;

/// number of keys on the hex keypad
pub const KEY_COUNT: usize = 16;

/// register 0xF doubles as carry/borrow/collision output
pub const VF: usize = 0xf;

/// 64x32 monochrome pixels, one byte (0 or 1) per pixel, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [u8; DISPLAY_WIDTH * DISPLAY_HEIGHT],
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: [0; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// pixel at (x, y); coordinates wrap
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[Self::offset(x, y)]
    }

    /// XOR a lit sprite bit onto (x, y), wrapping; true if a lit pixel went dark
    pub fn flip(&mut self, x: usize, y: usize) -> bool {
        let px = &mut self.pixels[Self::offset(x, y)];
        *px ^= 1;
        *px == 0
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
        self.pixels.chunks_exact(DISPLAY_WIDTH)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }

    fn offset(x: usize, y: usize) -> usize {
        DISPLAY_WIDTH * (y % DISPLAY_HEIGHT) + x % DISPLAY_WIDTH
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&p| if p != 0 { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// The complete CHIP-8 machine state.
pub struct Machine {
    pub memory: Chip8MemoryMap,
    /// V0-VF
    pub v: [u8; 16],
    /// address register
    pub i: u16,
    pub pc: u16,
    pub timers: Timers,
    pub framebuffer: Framebuffer,
    pub quirks: Quirks,
    sp: u8,
    stack: [u16; STACK_SLOTS],
    keys: [bool; KEY_COUNT],
    awaiting_key: Option<usize>,
    draw_flag: bool,
    pub(crate) rng: StdRng,
}

impl Machine {
    pub fn new(quirks: Quirks) -> Self {
        Self::with_rng(quirks, StdRng::from_entropy())
    }

    /// a machine whose random opcode is reproducible
    pub fn with_seed(quirks: Quirks, seed: u64) -> Self {
        Self::with_rng(quirks, StdRng::seed_from_u64(seed))
    }

    fn with_rng(quirks: Quirks, rng: StdRng) -> Self {
        Machine {
            memory: Chip8MemoryMap::new(),
            v: [0; 16],
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
            timers: Timers::default(),
            framebuffer: Framebuffer::new(),
            quirks,
            sp: 0,
            stack: [0; STACK_SLOTS],
            keys: [false; KEY_COUNT],
            awaiting_key: None,
            draw_flag: false,
            rng,
        }
    }

    /// install a program image at 0x200 and reset the volatile state
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, LoadError> {
        let len = self.memory.load_program(reader)?;
        self.reset();
        log::debug!("loaded {} byte program at {:#05x}", len, CHIP8_PROGRAM_ADDR);
        Ok(len)
    }

    /// back to power-on, keeping memory contents
    pub fn reset(&mut self) {
        self.v = [0; 16];
        self.i = 0;
        self.pc = CHIP8_PROGRAM_ADDR;
        self.sp = 0;
        self.stack = [0; STACK_SLOTS];
        self.timers = Timers::default();
        self.framebuffer.clear();
        self.keys = [false; KEY_COUNT];
        self.awaiting_key = None;
        self.draw_flag = true;
    }

    /// the instruction word at the program counter
    pub fn fetch(&self) -> Result<Opcode, Fault> {
        Ok(Opcode::new(self.memory.get_word(self.pc)?))
    }

    // stack, pre-increment on push; `at` is the calling instruction's
    // address, reported in the fault

    pub fn push(&mut self, addr: u16, at: u16) -> Result<(), Fault> {
        if self.sp >= MAX_STACK_DEPTH {
            return Err(Fault::StackOverflow { pc: at });
        }
        self.sp += 1;
        self.stack[self.sp as usize] = addr;
        Ok(())
    }

    pub fn pop(&mut self, at: u16) -> Result<u16, Fault> {
        if self.sp == 0 {
            return Err(Fault::StackUnderflow { pc: at });
        }
        let addr = self.stack[self.sp as usize];
        self.sp -= 1;
        Ok(addr)
    }

    pub fn stack_depth(&self) -> u8 {
        self.sp
    }

    // keypad

    /// a key went down; also answers a pending key wait
    pub fn key_down(&mut self, key: u8) {
        let k = key_index(key);
        self.keys[k] = true;
        if let Some(x) = self.awaiting_key.take() {
            log::debug!("key {:X} resumes wait into V{:X}", k, x);
            self.v[x] = k as u8;
        }
    }

    pub fn key_up(&mut self, key: u8) {
        self.keys[key_index(key)] = false;
    }

    pub fn is_key_pressed(&self, key: u8) -> bool {
        self.keys[key_index(key)]
    }

    pub(crate) fn consume_key(&mut self, key: u8) {
        self.keys[key_index(key)] = false;
    }

    /// suspend until the next key-down, which lands in `Vx`
    pub(crate) fn await_key(&mut self, x: usize) {
        self.awaiting_key = Some(x);
    }

    /// the register a pending key wait will fill, if any
    pub fn awaiting_key(&self) -> Option<usize> {
        self.awaiting_key
    }

    /// give up on a pending key wait (host shutdown)
    pub fn cancel_key_wait(&mut self) {
        self.awaiting_key = None;
    }

    // display bookkeeping

    pub(crate) fn mark_dirty(&mut self) {
        self.draw_flag = true;
    }

    /// true once after any change to the framebuffer
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::take(&mut self.draw_flag)
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(Quirks::default())
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("pc", &format_args!("{:#05x}", self.pc))
            .field("i", &format_args!("{:#05x}", self.i))
            .field("v", &format_args!("{:02X?}", self.v))
            .field("sp", &self.sp)
            .field("stack", &format_args!("{:03X?}", &self.stack[1..=self.sp as usize]))
            .field("timers", &self.timers)
            .field("awaiting_key", &self.awaiting_key)
            .finish()
    }
}

/// register values address the keypad through their low nibble
fn key_index(key: u8) -> usize {
    (key & 0x0f) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let m = Machine::default();
        assert_eq!(m.pc, 0x200);
        assert_eq!(m.stack_depth(), 0);
        assert_eq!(m.v, [0; 16]);
        assert_eq!(m.framebuffer.lit(), 0);
        assert_eq!(m.memory.as_slice()[..80], crate::memory::CHIP8_FONT);
    }

    #[test]
    fn test_framebuffer_wraps() {
        let mut fb = Framebuffer::new();
        assert!(!fb.flip(64 + 3, 32 + 1));
        assert_eq!(fb.get(3, 1), 1);
        assert_eq!(fb.as_slice()[64 + 3], 1);
        // flipping a lit pixel turns it off and reports it
        assert!(fb.flip(3, 1));
        assert_eq!(fb.lit(), 0);
    }

    #[test]
    fn test_stack_depth_limit() -> Result<(), Fault> {
        let mut m = Machine::default();
        for n in 0..15 {
            m.push(0x200 + n, 0x200)?;
        }
        assert_eq!(m.stack_depth(), 15);
        assert_eq!(m.push(0x300, 0x2a0), Err(Fault::StackOverflow { pc: 0x2a0 }));
        assert_eq!(m.pop(0x200)?, 0x20e);
        Ok(())
    }

    #[test]
    fn test_pop_empty_stack() {
        let mut m = Machine::default();
        assert_eq!(m.pop(0x204), Err(Fault::StackUnderflow { pc: 0x204 }));
        assert_eq!(m.stack_depth(), 0);
    }

    #[test]
    fn test_key_down_resolves_wait() {
        let mut m = Machine::default();
        m.await_key(5);
        assert_eq!(m.awaiting_key(), Some(5));
        m.key_down(0xb);
        assert_eq!(m.awaiting_key(), None);
        assert_eq!(m.v[5], 0xb);
        assert!(m.is_key_pressed(0xb));
        m.key_up(0xb);
        assert!(!m.is_key_pressed(0xb));
    }

    #[test]
    fn test_load_resets_volatile_state() -> Result<(), Box<dyn std::error::Error>> {
        let mut m = Machine::default();
        m.pc = 0x400;
        m.timers.sound = 9;
        m.push(0x300, 0x200)?;
        m.key_down(1);
        m.framebuffer.flip(0, 0);
        m.await_key(2);
        m.load_program(&mut &[0x00u8, 0xe0][..])?;
        assert_eq!(m.pc, 0x200);
        assert_eq!(m.stack_depth(), 0);
        assert_eq!(m.timers, Timers::default());
        assert!(!m.is_key_pressed(1));
        assert_eq!(m.framebuffer.lit(), 0);
        assert_eq!(m.awaiting_key(), None);
        assert_eq!(m.fetch()?.raw, 0x00e0);
        Ok(())
    }
}
