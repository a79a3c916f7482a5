//! # instruction
//!
//! Opcodes are decoded into a tagged variant before execution. Field names
//! follow the usual CHIP-8 shorthand:
//!
//!  x    bits 8-11   register
//!  y    bits 4-7    register
//!  n    bits 0-3    nibble (sprite height, ALU op)
//!  kk   bits 0-7    byte
//!  nnn  bits 0-11   address
//!
//! Families 0, 8, E and F are dispatched again on their low nibble/byte;
//! anything that doesn't match decodes to `Unknown` and runs as a no-op.

use std::fmt;

/// The 8xy_ arithmetic/logic family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Copy,
    Or,
    And,
    Xor,
    Add,
    Sub,
    ShiftRight,
    SubReverse,
    ShiftLeft,
}

impl AluOp {
    fn from_nibble(n: u8) -> Option<AluOp> {
        match n {
            0x0 => Some(AluOp::Copy),
            0x1 => Some(AluOp::Or),
            0x2 => Some(AluOp::And),
            0x3 => Some(AluOp::Xor),
            0x4 => Some(AluOp::Add),
            0x5 => Some(AluOp::Sub),
            0x6 => Some(AluOp::ShiftRight),
            0x7 => Some(AluOp::SubReverse),
            0xe => Some(AluOp::ShiftLeft),
            _ => None,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Copy => "LD",
            AluOp::Or => "OR",
            AluOp::And => "AND",
            AluOp::Xor => "XOR",
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::ShiftRight => "SHR",
            AluOp::SubReverse => "SUBN",
            AluOp::ShiftLeft => "SHL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SkipEqByte { x: u8, kk: u8 },
    /// 4xkk
    SkipNeByte { x: u8, kk: u8 },
    /// 5xy_
    SkipEqReg { x: u8, y: u8 },
    /// 6xkk
    LoadByte { x: u8, kk: u8 },
    /// 7xkk
    AddByte { x: u8, kk: u8 },
    /// 8xy_
    Alu { op: AluOp, x: u8, y: u8 },
    /// 9xy_
    SkipNeReg { x: u8, y: u8 },
    /// Annn
    LoadIndex(u16),
    /// Bnnn
    JumpOffset(u16),
    /// Cxkk
    Random { x: u8, kk: u8 },
    /// Dxyn
    Draw { x: u8, y: u8, n: u8 },
    /// Ex9E
    SkipKeyHeld { x: u8 },
    /// ExA1
    SkipKeyNotHeld { x: u8 },
    /// Fx07
    LoadDelay { x: u8 },
    /// Fx0A
    WaitKey { x: u8 },
    /// Fx15
    SetDelay { x: u8 },
    /// Fx18
    SetSound { x: u8 },
    /// Fx1E
    AddIndex { x: u8 },
    /// Fx29
    LoadGlyph { x: u8 },
    /// Fx33
    StoreBcd { x: u8 },
    /// Fx55
    StoreRegs { x: u8 },
    /// Fx65
    LoadRegs { x: u8 },
    /// anything else; executes as a no-op
    Unknown(u16),
}

impl Instruction {
    pub fn decode(opcode: u16) -> Instruction {
        let x = ((opcode & 0x0f00) >> 8) as u8;
        let y = ((opcode & 0x00f0) >> 4) as u8;
        let n = (opcode & 0x000f) as u8;
        let kk = (opcode & 0x00ff) as u8;
        let nnn = opcode & 0x0fff;

        match opcode >> 12 {
            0x0 => match opcode {
                0x00e0 => Instruction::Clear,
                0x00ee => Instruction::Return,
                _ => Instruction::Unknown(opcode),
            },
            0x1 => Instruction::Jump(nnn),
            0x2 => Instruction::Call(nnn),
            0x3 => Instruction::SkipEqByte { x, kk },
            0x4 => Instruction::SkipNeByte { x, kk },
            0x5 => Instruction::SkipEqReg { x, y },
            0x6 => Instruction::LoadByte { x, kk },
            0x7 => Instruction::AddByte { x, kk },
            0x8 => match AluOp::from_nibble(n) {
                Some(op) => Instruction::Alu { op, x, y },
                None => Instruction::Unknown(opcode),
            },
            0x9 => Instruction::SkipNeReg { x, y },
            0xa => Instruction::LoadIndex(nnn),
            0xb => Instruction::JumpOffset(nnn),
            0xc => Instruction::Random { x, kk },
            0xd => Instruction::Draw { x, y, n },
            0xe => match kk {
                0x9e => Instruction::SkipKeyHeld { x },
                0xa1 => Instruction::SkipKeyNotHeld { x },
                _ => Instruction::Unknown(opcode),
            },
            _ => match kk {
                0x07 => Instruction::LoadDelay { x },
                0x0a => Instruction::WaitKey { x },
                0x15 => Instruction::SetDelay { x },
                0x18 => Instruction::SetSound { x },
                0x1e => Instruction::AddIndex { x },
                0x29 => Instruction::LoadGlyph { x },
                0x33 => Instruction::StoreBcd { x },
                0x55 => Instruction::StoreRegs { x },
                0x65 => Instruction::LoadRegs { x },
                _ => Instruction::Unknown(opcode),
            },
        }
    }
}

/// disassembly, in Cowgod's mnemonics
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Clear => write!(f, "CLS"),
            Instruction::Return => write!(f, "RET"),
            Instruction::Jump(nnn) => write!(f, "JP 0x{:03X}", nnn),
            Instruction::Call(nnn) => write!(f, "CALL 0x{:03X}", nnn),
            Instruction::SkipEqByte { x, kk } => write!(f, "SE V{:X}, 0x{:02X}", x, kk),
            Instruction::SkipNeByte { x, kk } => write!(f, "SNE V{:X}, 0x{:02X}", x, kk),
            Instruction::SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Instruction::LoadByte { x, kk } => write!(f, "LD V{:X}, 0x{:02X}", x, kk),
            Instruction::AddByte { x, kk } => write!(f, "ADD V{:X}, 0x{:02X}", x, kk),
            Instruction::Alu { op, x, y } => match op {
                AluOp::ShiftRight | AluOp::ShiftLeft => write!(f, "{} V{:X}", op.mnemonic(), x),
                _ => write!(f, "{} V{:X}, V{:X}", op.mnemonic(), x, y),
            },
            Instruction::SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Instruction::LoadIndex(nnn) => write!(f, "LD I, 0x{:03X}", nnn),
            Instruction::JumpOffset(nnn) => write!(f, "JP V0, 0x{:03X}", nnn),
            Instruction::Random { x, kk } => write!(f, "RND V{:X}, 0x{:02X}", x, kk),
            Instruction::Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Instruction::SkipKeyHeld { x } => write!(f, "SKP V{:X}", x),
            Instruction::SkipKeyNotHeld { x } => write!(f, "SKNP V{:X}", x),
            Instruction::LoadDelay { x } => write!(f, "LD V{:X}, DT", x),
            Instruction::WaitKey { x } => write!(f, "LD V{:X}, K", x),
            Instruction::SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            Instruction::SetSound { x } => write!(f, "LD ST, V{:X}", x),
            Instruction::AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            Instruction::LoadGlyph { x } => write!(f, "LD F, V{:X}", x),
            Instruction::StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            Instruction::StoreRegs { x } => write!(f, "LD [I], V{:X}", x),
            Instruction::LoadRegs { x } => write!(f, "LD V{:X}, [I]", x),
            Instruction::Unknown(opcode) => write!(f, "DW 0x{:04X}", opcode),
        }
    }
}
