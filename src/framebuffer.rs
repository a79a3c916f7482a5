pub const CHIP8_DISPLAY_WIDTH: usize = 64;
pub const CHIP8_DISPLAY_HEIGHT: usize = 32;

/// packed size: one bit per pixel
pub const CHIP8_DISPLAY_BYTES: usize = CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT / 8;

/// 64x32 monochrome framebuffer. Each row is one u64 with column 0 in the
/// most significant bit, so a row packs straight into 8 big-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    rows: [u64; CHIP8_DISPLAY_HEIGHT],
    dirty: bool,
}

fn column_mask(x: usize) -> u64 {
    1u64 << (CHIP8_DISPLAY_WIDTH - 1 - x)
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            rows: [0; CHIP8_DISPLAY_HEIGHT],
            dirty: false,
        }
    }

    /// blank every pixel
    pub fn clear(&mut self) {
        self.rows = [0; CHIP8_DISPLAY_HEIGHT];
        self.dirty = true;
    }

    /// XOR a sprite onto the screen with its top-left corner at (x, y).
    /// The start position wraps; the sprite itself is clipped at the right
    /// and bottom edges. Returns true if any set pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x0 = x as usize % CHIP8_DISPLAY_WIDTH;
        let y0 = y as usize % CHIP8_DISPLAY_HEIGHT;
        let mut collision = false;

        for (row, bits) in sprite.iter().enumerate() {
            let py = y0 + row;
            if py >= CHIP8_DISPLAY_HEIGHT {
                break;
            }
            for col in 0..8 {
                let px = x0 + col;
                if px >= CHIP8_DISPLAY_WIDTH {
                    break;
                }
                if bits & (0x80 >> col) != 0 {
                    let mask = column_mask(px);
                    if self.rows[py] & mask != 0 {
                        collision = true;
                    }
                    self.rows[py] ^= mask;
                }
            }
        }
        self.dirty = true;
        collision
    }

    /// off-screen coordinates read as unset
    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        if x >= CHIP8_DISPLAY_WIDTH || y >= CHIP8_DISPLAY_HEIGHT {
            return false;
        }
        self.rows[y] & column_mask(x) != 0
    }

    /// has the screen changed since the renderer last looked?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// row-major, MSB-first packed image as expected by `display::Display`
    pub fn to_bytes(&self) -> [u8; CHIP8_DISPLAY_BYTES] {
        let mut out = [0u8; CHIP8_DISPLAY_BYTES];
        for (chunk, row) in out.chunks_exact_mut(8).zip(self.rows.iter()) {
            chunk.copy_from_slice(&row.to_be_bytes());
        }
        out
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}
