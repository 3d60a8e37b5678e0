//! Seam to the NES emulation library.
//!
//! The shell never looks inside the core: it loads a ROM, steps frames,
//! forwards the joypad and pulls out audio. Save states are opaque files
//! written and read by the core itself.

use std::path::Path;

use thiserror::Error;

use crate::input::NesPad;
use crate::palette::{PaletteKind, PALETTE_SIZE};

pub mod test_pattern;

pub use test_pattern::TestPatternCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemKind {
    /// Pick NTSC or PAL from the ROM.
    #[default]
    Detect,
    Ntsc,
    Pal,
}

/// Why a ROM could not be loaded. Every variant is fatal at startup; they
/// differ only in what gets logged.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error loading rom: {0}")]
    Generic(String),
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u16),
    #[error("BIOS file required")]
    MissingBios,
    #[error("unsupported ROM")]
    UnsupportedRom,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(u32),
    #[error("no ROM loaded")]
    NoRom,
    #[error("save state I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("save state encoding: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("save state rejected: {0}")]
    BadState(String),
}

pub trait EmulatorCore: Sized {
    fn init(system: SystemKind, sample_rate: u32) -> Result<Self, CoreError>;
    fn load_rom(&mut self, path: &Path) -> Result<(), LoadError>;
    fn set_input(&mut self, pad: NesPad);
    /// Emulate one frame. With a target buffer the frame is rendered into
    /// it through the installed palette; without one only the CPU and APU
    /// advance.
    fn step(&mut self, frame: Option<&mut [u8]>);
    fn reset(&mut self, hard: bool);
    fn save_state(&mut self, path: &Path) -> Result<(), CoreError>;
    fn load_state(&mut self, path: &Path) -> Result<(), CoreError>;
    fn set_sprite_limit(&mut self, enabled: bool);
    /// Palette in native RGB565.
    fn native_palette(&self, kind: PaletteKind) -> Vec<u16>;
    fn set_palette(&mut self, palette: &[u16; PALETTE_SIZE]);
    /// Samples produced by the last step.
    fn audio_samples(&self) -> &[i16];
    fn shutdown(&mut self);
}
