use std::time::Duration;

use anyhow::{Context, Result};
use chipvm::display::{FrameBuffer, HEIGHT, WIDTH};
use minifb::{Key, Scale, Window, WindowOptions};

/// Host window the frame buffer is pushed to. Never read back by the machine.
pub struct Screen {
    window: Window,
}

impl Screen {
    pub fn new() -> Result<Self> {
        let mut window = Window::new(
            "Chip-8 Emulator",
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale: Scale::X16,
                ..WindowOptions::default()
            },
        )
        .context("failed to create window")?;
        // Limit to max ~60 fps update rate
        window.limit_update_rate(Some(Duration::from_micros(16600)));
        Ok(Self { window })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    pub fn present(&mut self, fb: &FrameBuffer) -> Result<()> {
        self.window
            .update_with_buffer(&fb.render(), WIDTH, HEIGHT)
            .context("failed to update window")
    }
}
