//! Instruction decoding.
//!
//! Every 16-bit word decodes to *something*: the operand fields are always
//! available through [`Opcode`], and [`Instruction::decode`] falls back to
//! [`Instruction::Unknown`] for patterns the machine doesn't implement.
use std::fmt;

/// The raw operand fields of an instruction word, extracted by masking.
///
/// ```text
///  15  12 11   8 7    4 3    0
/// +------+------+------+------+
/// |class |  x   |  y   |  n   |
/// +------+------+------+------+
///        |<-------- nnn ----->|
///               |<--- kk ---->|
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode {
    pub raw: u16,
    /// operation class, the top nibble
    pub class: u8,
    /// 12-bit address
    pub nnn: u16,
    /// terminal nibble; the sprite height for draws
    pub n: u8,
    pub x: usize,
    pub y: usize,
    /// 8-bit immediate
    pub kk: u8,
}

impl Opcode {
    pub fn new(raw: u16) -> Self {
        Opcode {
            raw,
            class: (raw >> 12) as u8,
            nnn: raw & 0x0fff,
            n: (raw & 0x000f) as u8,
            x: ((raw & 0x0f00) >> 8) as usize,
            y: ((raw & 0x00f0) >> 4) as usize,
            kk: (raw & 0x00ff) as u8,
        }
    }

    /// combine two consecutive program bytes, big-endian
    pub fn from_bytes(hi: u8, lo: u8) -> Self {
        Self::new(u16::from_be_bytes([hi, lo]))
    }
}

/// One of the distinct instruction forms, with its operands.
///
/// Register operands are indices `0x0..=0xF`; `Vx` in the mnemonics below.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1NNN
    Jp(u16),
    /// 2NNN
    Call(u16),
    /// 3XKK
    SeImm(usize, u8),
    /// 4XKK
    SneImm(usize, u8),
    /// 5XY0
    SeReg(usize, usize),
    /// 6XKK
    LdImm(usize, u8),
    /// 7XKK, no flag
    AddImm(usize, u8),
    /// 8XY0
    LdReg(usize, usize),
    /// 8XY1
    Or(usize, usize),
    /// 8XY2
    And(usize, usize),
    /// 8XY3
    Xor(usize, usize),
    /// 8XY4, VF = carry
    AddReg(usize, usize),
    /// 8XY5, Vx = Vx - Vy, VF = no borrow
    Sub(usize, usize),
    /// 8XY6, VF = bit shifted out
    Shr(usize, usize),
    /// 8XY7, Vx = Vy - Vx, VF = no borrow
    Subn(usize, usize),
    /// 8XYE, VF = bit shifted out
    Shl(usize, usize),
    /// 9XY0
    SneReg(usize, usize),
    /// ANNN
    LdI(u16),
    /// BNNN
    JpV0(u16),
    /// CXKK
    Rnd(usize, u8),
    /// DXYN
    Drw(usize, usize, u8),
    /// EX9E
    Skp(usize),
    /// EXA1
    Sknp(usize),
    /// FX07
    LdFromDelay(usize),
    /// FX0A
    LdKey(usize),
    /// FX15
    LdDelay(usize),
    /// FX18
    LdSound(usize),
    /// FX1E
    AddI(usize),
    /// FX29
    LdFont(usize),
    /// FX33
    Bcd(usize),
    /// FX55
    StoreRegs(usize),
    /// FX65
    LoadRegs(usize),
    /// anything else, including 0NNN machine-code calls
    Unknown(u16),
}

impl Instruction {
    pub fn decode(op: Opcode) -> Self {
        use Instruction::*;
        let Opcode { raw, nnn, n, x, y, kk, .. } = op;
        match op.class {
            0x0 => match raw {
                0x00e0 => Cls,
                0x00ee => Ret,
                _ => Unknown(raw),
            },
            0x1 => Jp(nnn),
            0x2 => Call(nnn),
            0x3 => SeImm(x, kk),
            0x4 => SneImm(x, kk),
            0x5 if n == 0 => SeReg(x, y),
            0x6 => LdImm(x, kk),
            0x7 => AddImm(x, kk),
            0x8 => match n {
                0x0 => LdReg(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => Sub(x, y),
                0x6 => Shr(x, y),
                0x7 => Subn(x, y),
                0xe => Shl(x, y),
                _ => Unknown(raw),
            },
            0x9 if n == 0 => SneReg(x, y),
            0xa => LdI(nnn),
            0xb => JpV0(nnn),
            0xc => Rnd(x, kk),
            0xd => Drw(x, y, n),
            0xe => match kk {
                0x9e => Skp(x),
                0xa1 => Sknp(x),
                _ => Unknown(raw),
            },
            0xf => match kk {
                0x07 => LdFromDelay(x),
                0x0a => LdKey(x),
                0x15 => LdDelay(x),
                0x18 => LdSound(x),
                0x1e => AddI(x),
                0x29 => LdFont(x),
                0x33 => Bcd(x),
                0x55 => StoreRegs(x),
                0x65 => LoadRegs(x),
                _ => Unknown(raw),
            },
            _ => Unknown(raw),
        }
    }
}

impl From<u16> for Instruction {
    fn from(raw: u16) -> Self {
        Instruction::decode(Opcode::new(raw))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(a) => write!(f, "JP {:#05x}", a),
            Call(a) => write!(f, "CALL {:#05x}", a),
            SeImm(x, k) => write!(f, "SE V{:X}, {:#04x}", x, k),
            SneImm(x, k) => write!(f, "SNE V{:X}, {:#04x}", x, k),
            SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LdImm(x, k) => write!(f, "LD V{:X}, {:#04x}", x, k),
            AddImm(x, k) => write!(f, "ADD V{:X}, {:#04x}", x, k),
            LdReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI(a) => write!(f, "LD I, {:#05x}", a),
            JpV0(a) => write!(f, "JP V0, {:#05x}", a),
            Rnd(x, k) => write!(f, "RND V{:X}, {:#04x}", x, k),
            Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp(x) => write!(f, "SKP V{:X}", x),
            Sknp(x) => write!(f, "SKNP V{:X}", x),
            LdFromDelay(x) => write!(f, "LD V{:X}, DT", x),
            LdKey(x) => write!(f, "LD V{:X}, K", x),
            LdDelay(x) => write!(f, "LD DT, V{:X}", x),
            LdSound(x) => write!(f, "LD ST, V{:X}", x),
            AddI(x) => write!(f, "ADD I, V{:X}", x),
            LdFont(x) => write!(f, "LD F, V{:X}", x),
            Bcd(x) => write!(f, "LD B, V{:X}", x),
            StoreRegs(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegs(x) => write!(f, "LD V{:X}, [I]", x),
            Unknown(raw) => write!(f, "DW {:#06x}", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_extraction() {
        let op = Opcode::new(0xd5a7);
        assert_eq!(op.class, 0xd);
        assert_eq!(op.x, 0x5);
        assert_eq!(op.y, 0xa);
        assert_eq!(op.n, 0x7);
        assert_eq!(op.kk, 0xa7);
        assert_eq!(op.nnn, 0x5a7);
    }

    #[test]
    fn test_from_bytes_is_big_endian() {
        assert_eq!(Opcode::from_bytes(0x12, 0x34).raw, 0x1234);
    }

    #[test]
    fn test_decode_classes() {
        assert_eq!(Instruction::from(0x00e0), Instruction::Cls);
        assert_eq!(Instruction::from(0x00ee), Instruction::Ret);
        assert_eq!(Instruction::from(0x1abc), Instruction::Jp(0xabc));
        assert_eq!(Instruction::from(0x2abc), Instruction::Call(0xabc));
        assert_eq!(Instruction::from(0x3122), Instruction::SeImm(1, 0x22));
        assert_eq!(Instruction::from(0x8ab4), Instruction::AddReg(0xa, 0xb));
        assert_eq!(Instruction::from(0x8abe), Instruction::Shl(0xa, 0xb));
        assert_eq!(Instruction::from(0xd12f), Instruction::Drw(1, 2, 0xf));
        assert_eq!(Instruction::from(0xe39e), Instruction::Skp(3));
        assert_eq!(Instruction::from(0xf433), Instruction::Bcd(4));
        assert_eq!(Instruction::from(0xff65), Instruction::LoadRegs(0xf));
    }

    #[test]
    fn test_unrecognised_subcodes_decode_as_unknown() {
        for raw in [0x0000, 0x0123, 0x5121, 0x8128, 0x912f, 0xe100, 0xf0ff] {
            assert_eq!(Instruction::from(raw), Instruction::Unknown(raw));
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::from(0x00e0).to_string(), "CLS");
        assert_eq!(Instruction::from(0x2208).to_string(), "CALL 0x208");
        assert_eq!(Instruction::from(0x6a0f).to_string(), "LD VA, 0x0f");
        assert_eq!(Instruction::from(0xd125).to_string(), "DRW V1, V2, 5");
        assert_eq!(Instruction::from(0xf355).to_string(), "LD [I], V3");
        assert_eq!(Instruction::from(0x0000).to_string(), "DW 0x0000");
    }
}
