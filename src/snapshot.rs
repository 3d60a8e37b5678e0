//! Copy of the last game frame, drawn dimmed behind the pause menu.

use crate::canvas::FRAME_BYTES;

#[derive(Debug)]
pub struct PauseSnapshot {
    pixels: Box<[u8]>,
}

impl PauseSnapshot {
    /// Allocate a zeroed snapshot of `len` bytes. Returns `None` if the
    /// allocator refuses, so startup can fail cleanly on low-memory devices.
    pub fn try_new(len: usize) -> Option<Self> {
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len).ok()?;
        pixels.resize(len, 0);
        Some(Self {
            pixels: pixels.into_boxed_slice(),
        })
    }

    pub fn for_screen() -> Option<Self> {
        Self::try_new(FRAME_BYTES)
    }

    /// Copy `frame` in. A shorter source leaves the tail untouched.
    pub fn capture(&mut self, frame: &[u8]) {
        let n = frame.len().min(self.pixels.len());
        self.pixels[..n].copy_from_slice(&frame[..n]);
    }

    pub fn bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
