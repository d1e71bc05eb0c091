use crate::error::{Fault, LoadError};
use std::io::{self, Read};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents memory map, ROM, RAM etc.
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), Fault> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// get a two-byte, big-endian word (instruction fetch)
    fn get_word(&self, addr: u16) -> Result<u16, Fault> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    fn get_byte(&self, addr: u16) -> Result<u8, Fault> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault>;
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// largest program image that fits between 0x200 and the top of RAM
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// where the hex glyphs live; each glyph is `CHIP8_FONT_GLYPH_BYTES` long
pub const CHIP8_FONT_ADDR: u16 = 0x000;
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

/// Defines the CHIP-8 standard memory map (4K configuration):
///   0x0000-0x004f  hex font
///   0x0050-0x01ff  interpreter (unused)
///   0x0200-0x0fff  program
///
/// The stack, registers and display live outside addressable memory.
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub program_addr: u16,
}

fn bounds(addr: u16, len: usize) -> Result<std::ops::Range<usize>, Fault> {
    let a = addr as usize;
    match a.checked_add(len) {
        Some(end) if end <= CHIP8_RAM_SIZE_BYTES => Ok(a..end),
        _ => Err(Fault::AddressOutOfRange { addr: a, len }),
    }
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault> {
        let range = bounds(addr, len)?;
        Ok(&mut self.bytes[range])
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault> {
        let range = bounds(addr, len)?;
        Ok(&self.bytes[range])
    }
}

impl Chip8MemoryMap {
    /// zeroed RAM with the font baked in below 0x200
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
            program_addr: CHIP8_PROGRAM_ADDR,
        };
        mm.install_font();
        mm
    }

    fn install_font(&mut self) {
        let start = CHIP8_FONT_ADDR as usize;
        self.bytes[start..start + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
    }

    /// load a CHIP-8 program at 0x200, returning its length
    ///
    /// Everything from 0x200 up is zeroed first, so a shorter image never
    /// inherits the tail of a previous one.
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, LoadError> {
        let mut buf = Vec::with_capacity(CHIP8_MAX_PROGRAM_BYTES);
        // read one byte past the limit so oversized images are detectable
        // without slurping arbitrarily large files
        let len = (&mut *reader)
            .take(CHIP8_MAX_PROGRAM_BYTES as u64 + 1)
            .read_to_end(&mut buf)?;
        if len > CHIP8_MAX_PROGRAM_BYTES {
            let rest = io::copy(reader, &mut io::sink())? as usize;
            return Err(LoadError::TooLarge {
                size: len + rest,
                max: CHIP8_MAX_PROGRAM_BYTES,
            });
        }

        let start = self.program_addr as usize;
        self.bytes[start..].fill(0);
        self.bytes[start..start + len].copy_from_slice(&buf);
        self.install_font();
        Ok(len)
    }

    /// the whole of RAM, for debugging and tests
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

pub const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8MemoryMap::new();
        // NB. memory is zeroed from 0x200 because before that we bake in the font
        assert_eq!(m.bytes[0x200..], [0; 0xe00]);
    }

    #[test]
    fn test_font_at_zero() -> Result<(), Fault> {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.get_ro_slice(0, 80)?, &CHIP8_FONT[..]);
        // glyph for 'A'
        assert_eq!(m.get_ro_slice(0xa * 5, 5)?, &[0xF0, 0x90, 0xF0, 0x90, 0x90]);
        Ok(())
    }

    #[test]
    fn test_write_slice_ok() -> Result<(), Fault> {
        let mut dst = Chip8MemoryMap::new();
        let src: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7];
        dst.write(src, 0x308)?;
        assert_eq!(
            dst.bytes[0x300..0x310],
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]
        );
        Ok(())
    }

    #[test]
    fn test_read_word() -> Result<(), Fault> {
        let mut m = Chip8MemoryMap::new();
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0x200)?;
        assert_eq!(m.get_word(0x204)?, 0x0405);
        Ok(())
    }

    #[test]
    fn test_read_past_end_faults() {
        let m = Chip8MemoryMap::new();
        assert_eq!(
            m.get_word(0xfff),
            Err(Fault::AddressOutOfRange { addr: 0xfff, len: 2 })
        );
        assert!(m.get_ro_slice(0xffe, 2).is_ok());
    }

    #[test]
    fn test_write_too_much_faults() {
        let mut dst = Chip8MemoryMap::new();
        assert!(dst.write(&[0; 8], 4089).is_err());
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Box<dyn std::error::Error>> {
        let mut dst = Chip8MemoryMap::new();
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(dst.load_program(&mut prog)?, 2);
        assert_eq!(dst.get_ro_slice(0x200, 2)?, &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_load_max_size() -> Result<(), Box<dyn std::error::Error>> {
        let mut dst = Chip8MemoryMap::new();
        let image = vec![0xaa; CHIP8_MAX_PROGRAM_BYTES];
        dst.load_program(&mut image.as_slice())?;
        assert_eq!(dst.get_byte(0xfff)?, 0xaa);
        Ok(())
    }

    #[test]
    fn test_program_load_rejects_oversized() {
        let mut dst = Chip8MemoryMap::new();
        let image = vec![0xaa; CHIP8_MAX_PROGRAM_BYTES + 10];
        match dst.load_program(&mut image.as_slice()) {
            Err(LoadError::TooLarge { size, max }) => {
                assert_eq!(size, CHIP8_MAX_PROGRAM_BYTES + 10);
                assert_eq!(max, 3584);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
        // nothing was written
        assert_eq!(dst.bytes[0x200..], [0; 0xe00]);
    }

    #[test]
    fn test_reload_clears_previous_image() -> Result<(), Box<dyn std::error::Error>> {
        let mut dst = Chip8MemoryMap::new();
        dst.load_program(&mut &[0x12u8, 0x34, 0x56, 0x78][..])?;
        dst.load_program(&mut &[0x00u8, 0xe0][..])?;
        assert_eq!(dst.get_ro_slice(0x200, 4)?, &[0x00, 0xe0, 0x00, 0x00]);
        Ok(())
    }
}
