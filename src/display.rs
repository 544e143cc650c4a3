use crate::memory::{Memory, MemoryError};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

const BACKGROUND: u32 = 0x000000;
const FOREGROUND: u32 = 0x007FFF;

/// 64x32 monochrome pixel grid, addressed `[y][x]`.
pub struct FrameBuffer {
    bit_buffer: [[bool; WIDTH]; HEIGHT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bit_buffer: [[false; WIDTH]; HEIGHT],
        }
    }

    pub fn clear_buffer(&mut self) {
        self.bit_buffer = [[false; WIDTH]; HEIGHT];
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        y < HEIGHT && x < WIDTH && self.bit_buffer[y][x]
    }

    /// Draws `rows` sprite bytes read from `addr` onwards with their top-left corner at (x, y).
    ///
    /// Sprite bits replace the pixels under them. A collision is reported when a set pixel
    /// is written with a set bit. Rows stop at the bottom edge. Columns past the right edge
    /// are dropped because the grid is a fixed 64x32 array with no room beyond column 63.
    /// Neither axis wraps around.
    pub fn paint(
        &mut self,
        mem: &Memory,
        x: u8,
        y: u8,
        addr: usize,
        rows: u8,
    ) -> Result<bool, MemoryError> {
        let (x, y) = (x as usize, y as usize);
        let mut collision = false;
        for i in 0..(rows & 0xF) as usize {
            let ny = y + i;
            if ny >= HEIGHT {
                break;
            }
            let row = mem.get(addr.checked_add(i).ok_or(MemoryError::OutOfBounds(addr))?)?;
            for j in 0..8 {
                let nx = x + j;
                if nx >= WIDTH {
                    break;
                }
                let bit = (row >> (7 - j)) & 1 == 1;
                let previous = self.bit_buffer[ny][nx];
                self.bit_buffer[ny][nx] = bit;
                if previous && bit {
                    collision = true;
                }
            }
        }
        Ok(collision)
    }

    /// Row-major RGB snapshot for the presentation surface, one `u32` per pixel.
    pub fn render(&self) -> Vec<u32> {
        self.bit_buffer
            .iter()
            .flatten()
            .map(|&on| if on { FOREGROUND } else { BACKGROUND })
            .collect()
    }
}
