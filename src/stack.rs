use log::warn;

pub const CHIP8_STACK_DEPTH: usize = 16;

/// Fixed-depth return address stack. The pointer wraps modulo the depth on
/// overflow and underflow, so a runaway program overwrites its oldest
/// frames rather than stopping the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    slots: [u16; CHIP8_STACK_DEPTH],
    sp: u8,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            slots: [0; CHIP8_STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn push(&mut self, addr: u16) {
        if self.sp as usize >= CHIP8_STACK_DEPTH {
            warn!("call stack overflow pushing 0x{:03x}; wrapping", addr);
            self.sp = 0;
        }
        self.slots[self.sp as usize] = addr;
        self.sp += 1;
    }

    pub fn pop(&mut self) -> u16 {
        if self.sp == 0 {
            warn!("call stack underflow; wrapping");
            self.sp = CHIP8_STACK_DEPTH as u8;
        }
        self.sp -= 1;
        self.slots[self.sp as usize]
    }

    /// stack pointer: number of live frames
    pub fn sp(&self) -> u8 {
        self.sp
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}
