//! The fetch-decode-execute step.
//!
//! Each call to [`Machine::step`] runs exactly one instruction and hands
//! control back; pacing, timers and drawing belong to the host loop.
use crate::error::Fault;
use crate::instruction::Instruction;
use crate::machine::{Machine, VF};
use crate::memory::{MemoryMap, CHIP8_FONT_ADDR, CHIP8_FONT_GLYPH_BYTES};
use rand::Rng;

/// What the host should do after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// keep going
    Continue,
    /// nothing more can happen until a key goes down
    AwaitingKey,
}

impl Machine {
    /// fetch, decode and execute the instruction at the program counter
    ///
    /// While a key wait is pending this does nothing and reports
    /// [`Step::AwaitingKey`]; the program counter already points past the
    /// wait, so delivering a key with [`Machine::key_down`] resumes there.
    pub fn step(&mut self) -> Result<Step, Fault> {
        if self.awaiting_key().is_some() {
            return Ok(Step::AwaitingKey);
        }
        let op = self.fetch()?;
        let instruction = Instruction::decode(op);
        log::trace!("{:#05x}: {:04x}  {}", self.pc, op.raw, instruction);
        self.execute(instruction)
    }

    /// apply one decoded instruction, as if it had been fetched at `pc`;
    /// on a fault `pc` is left pointing at the instruction
    pub fn execute(&mut self, instruction: Instruction) -> Result<Step, Fault> {
        let at = self.pc;
        let result = self.apply(instruction, at);
        if result.is_err() {
            self.pc = at;
        }
        result
    }

    fn apply(&mut self, instruction: Instruction, at: u16) -> Result<Step, Fault> {
        use Instruction::*;

        // provisional advance; jumps, calls, returns and skips override it
        self.pc = at.wrapping_add(2);

        match instruction {
            Cls => {
                self.framebuffer.clear();
                self.mark_dirty();
            }
            Ret => {
                self.pc = self.pop(at)?;
            }
            Jp(addr) => {
                self.pc = addr;
            }
            Call(addr) => {
                self.push(self.pc, at)?;
                self.pc = addr;
            }
            SeImm(x, kk) => self.skip_if(self.v[x] == kk),
            SneImm(x, kk) => self.skip_if(self.v[x] != kk),
            SeReg(x, y) => self.skip_if(self.v[x] == self.v[y]),
            SneReg(x, y) => self.skip_if(self.v[x] != self.v[y]),
            LdImm(x, kk) => {
                self.v[x] = kk;
            }
            AddImm(x, kk) => {
                // no carry for the immediate form
                self.v[x] = self.v[x].wrapping_add(kk);
            }
            LdReg(x, y) => {
                self.v[x] = self.v[y];
            }
            Or(x, y) => {
                self.v[x] |= self.v[y];
            }
            And(x, y) => {
                self.v[x] &= self.v[y];
            }
            Xor(x, y) => {
                self.v[x] ^= self.v[y];
            }
            // the flag is written after the result, so VF as a destination
            // ends up holding the flag
            AddReg(x, y) => {
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = sum;
                self.v[VF] = carry as u8;
            }
            Sub(x, y) => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[x] = vx.wrapping_sub(vy);
                self.v[VF] = (vx >= vy) as u8;
            }
            Subn(x, y) => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[x] = vy.wrapping_sub(vx);
                self.v[VF] = (vy >= vx) as u8;
            }
            Shr(x, _) => {
                let vx = self.v[x];
                self.v[x] = vx >> 1;
                self.v[VF] = vx & 0x01;
            }
            Shl(x, _) => {
                let vx = self.v[x];
                self.v[x] = vx << 1;
                self.v[VF] = vx >> 7;
            }
            LdI(addr) => {
                self.i = addr;
            }
            JpV0(addr) => {
                self.pc = addr + self.v[0] as u16;
            }
            Rnd(x, kk) => {
                self.v[x] = self.rng.gen::<u8>() & kk;
            }
            Drw(x, y, n) => self.draw(self.v[x] as usize, self.v[y] as usize, n)?,
            Skp(x) => {
                let key = self.v[x];
                let pressed = self.is_key_pressed(key);
                self.skip_if(pressed);
                if pressed && self.quirks.key_skip_consumes {
                    self.consume_key(key);
                }
            }
            Sknp(x) => {
                let key = self.v[x];
                let pressed = self.is_key_pressed(key);
                self.skip_if(!pressed);
                if pressed && self.quirks.key_skip_consumes {
                    self.consume_key(key);
                }
            }
            LdFromDelay(x) => {
                self.v[x] = self.timers.delay;
            }
            LdKey(x) => {
                self.await_key(x);
                return Ok(Step::AwaitingKey);
            }
            LdDelay(x) => {
                self.timers.delay = self.v[x];
            }
            LdSound(x) => {
                self.timers.sound = self.v[x];
            }
            AddI(x) => {
                self.i = self.i.wrapping_add(self.v[x] as u16);
            }
            LdFont(x) => {
                let digit = (self.v[x] & 0x0f) as u16;
                self.i = CHIP8_FONT_ADDR + digit * CHIP8_FONT_GLYPH_BYTES;
            }
            Bcd(x) => {
                let digits = double_dabble(self.v[x]);
                self.memory.write(&digits, self.i)?;
            }
            StoreRegs(x) => {
                // V0 through Vx inclusive
                self.memory.write(&self.v[..=x], self.i)?;
            }
            LoadRegs(x) => {
                let bytes = self.memory.get_ro_slice(self.i, x + 1)?;
                self.v[..=x].copy_from_slice(bytes);
            }
            Unknown(raw) => {
                log::warn!(
                    "unknown instruction {:04x} at {:#05x}, skipping",
                    raw,
                    at
                );
            }
        }
        Ok(Step::Continue)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// XOR an 8 x `height` sprite from memory at I onto the screen at
    /// (`x`, `y`), wrapping at the edges. VF reports whether any lit pixel
    /// was turned off anywhere in the sprite.
    fn draw(&mut self, x: usize, y: usize, height: u8) -> Result<(), Fault> {
        let sprite = self.memory.get_ro_slice(self.i, height as usize)?;
        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            for col in 0..8 {
                if bits & (0x80 >> col) != 0 {
                    collision |= self.framebuffer.flip(x + col, y + row);
                }
            }
        }
        self.v[VF] = collision as u8;
        self.mark_dirty();
        Ok(())
    }
}

/// split a byte into hundreds, tens and ones without dividing
///
/// The value sits in the low byte of a scratch word with three BCD nibbles
/// above it. Before each of the 8 shifts, any nibble over 4 gets 3 added so
/// that it carries into the next decimal digit on the shift.
fn double_dabble(value: u8) -> [u8; 3] {
    let mut scratch = value as u32;
    for _ in 0..8 {
        for shift in [8, 12, 16] {
            if (scratch >> shift) & 0xf > 4 {
                scratch += 3 << shift;
            }
        }
        scratch <<= 1;
    }
    [
        ((scratch >> 16) & 0xf) as u8,
        ((scratch >> 12) & 0xf) as u8,
        ((scratch >> 8) & 0xf) as u8,
    ]
}
