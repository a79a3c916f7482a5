use crate::memory::CHIP8_PROGRAM_ADDR;

/// index of the carry/borrow/collision flag register
pub const VF: usize = 0xf;

/// The register file: V0..VF, the index register and the program counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            v: [0; 16],
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
        }
    }

    /// overwrite VF with a boolean flag
    pub fn set_flag(&mut self, flag: bool) {
        self.v[VF] = flag as u8;
    }

    /// move past the next instruction
    pub fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let r = Registers::new();
        assert_eq!(r.pc, 0x200);
        assert_eq!(r.i, 0);
        assert_eq!(r.v, [0; 16]);
    }

    #[test]
    fn test_set_flag() {
        let mut r = Registers::new();
        r.v[VF] = 0x7f;
        r.set_flag(true);
        assert_eq!(r.v[VF], 1);
        r.set_flag(false);
        assert_eq!(r.v[VF], 0);
    }
}
