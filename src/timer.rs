/// 8-bit countdown timer. Only `tick()` ever lowers the value and it
/// bottoms out at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    value: u8,
}

impl Timer {
    pub fn new() -> Self {
        Timer { value: 0 }
    }

    pub fn get(&self) -> u8 {
        self.value
    }

    pub fn set(&mut self, value: u8) {
        self.value = value;
    }

    pub fn tick(&mut self) {
        self.value = self.value.saturating_sub(1);
    }

    pub fn is_running(&self) -> bool {
        self.value > 0
    }
}
