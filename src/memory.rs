use crate::error::RomLoadError;
use log::{debug, warn};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the addressable memory of the machine
pub trait MemoryMap {
    /// read a single byte
    fn read_byte(&self, addr: u16) -> u8;

    /// write a single byte
    fn write_byte(&mut self, addr: u16, value: u8);

    /// get a big-endian two-byte word (opcodes)
    fn get_word(&self, addr: u16) -> u16 {
        ((self.read_byte(addr) as u16) << 8) | (self.read_byte(addr.wrapping_add(1)) as u16)
    }

    /// write a chunk of bytes into "RAM", one byte at a time
    fn write(&mut self, data: &[u8], addr: u16) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(addr.wrapping_add(offset as u16), *byte);
        }
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// largest program image that fits between the program address and the top of RAM
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// where the hex digit glyphs live
pub const CHIP8_GLYPH_ADDR: u16 = 0x000;

/// bytes per glyph
pub const CHIP8_GLYPH_HEIGHT: u16 = 5;

const ADDR_MASK: u16 = 0x0fff;

/// Defines the CHIP-8 memory map:
///   0x0000-0x004f  hex digit glyphs
///   0x0050-0x01ff  reserved (interpreter)
///   0x0200-0x0fff  program
///
/// Addresses are masked to 12 bits so anything past 0xfff wraps to the bottom
/// of memory. Program writes below 0x200 are dropped.
pub struct Chip8Memory {
    bytes: Box<[u8; CHIP8_RAM_SIZE_BYTES]>,
}

impl MemoryMap for Chip8Memory {
    fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[(addr & ADDR_MASK) as usize]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        let a = addr & ADDR_MASK;
        if a < CHIP8_PROGRAM_ADDR {
            warn!("dropping write of 0x{:02x} to protected address 0x{:03x}", value, a);
            return;
        }
        self.bytes[a as usize] = value;
    }
}

impl Chip8Memory {
    /// zeroed memory with the glyph table baked in
    pub fn new() -> Self {
        let mut bytes = Box::new([0u8; CHIP8_RAM_SIZE_BYTES]);
        let start = CHIP8_GLYPH_ADDR as usize;
        bytes[start..start + CHIP8_GLYPHS.len()].copy_from_slice(&CHIP8_GLYPHS);
        Chip8Memory { bytes }
    }

    /// load a CHIP-8 program at 0x200; memory is untouched if it doesn't fit
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), RomLoadError> {
        if program.len() > CHIP8_MAX_PROGRAM_BYTES {
            return Err(RomLoadError::TooLarge {
                size: program.len(),
                max: CHIP8_MAX_PROGRAM_BYTES,
            });
        }
        let start = CHIP8_PROGRAM_ADDR as usize;
        self.bytes[start..start + program.len()].copy_from_slice(program);
        debug!("loaded {} program bytes at 0x{:03x}", program.len(), start);
        Ok(())
    }

    #[cfg(test)]
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }

    /// address of the glyph for a hex digit; only the low nibble is used
    pub fn glyph_addr(digit: u8) -> u16 {
        CHIP8_GLYPH_ADDR + (digit & 0x0f) as u16 * CHIP8_GLYPH_HEIGHT
    }
}

impl Default for Chip8Memory {
    fn default() -> Self {
        Self::new()
    }
}

pub const CHIP8_GLYPHS: [u8; 80] = [
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
