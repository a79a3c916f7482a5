pub const CHIP8_KEY_COUNT: usize = 16;

/// Level-triggered latch for the hex keypad: a key reads as held from the
/// moment it is set until it is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    held: [bool; CHIP8_KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            held: [false; CHIP8_KEY_COUNT],
        }
    }

    /// out-of-range keys are ignored
    pub fn set_key(&mut self, index: usize, held: bool) {
        if let Some(key) = self.held.get_mut(index) {
            *key = held;
        }
    }

    /// only the low nibble selects a key
    pub fn is_held(&self, key: u8) -> bool {
        self.held[(key & 0x0f) as usize]
    }

    /// lowest-numbered held key, if any
    pub fn first_held(&self) -> Option<u8> {
        self.held.iter().position(|k| *k).map(|k| k as u8)
    }
}
