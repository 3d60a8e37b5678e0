//! Stand-in core for host runs and tests.
//!
//! It classifies iNES/FDS images the way the real library reports load
//! failures, then draws scrolling color bars with a cursor steered by the
//! joypad and emits a tone while a button is held. Its save state is the
//! handful of counters that drive the picture, so a reload is observable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::{CoreError, EmulatorCore, LoadError, SystemKind};
use crate::canvas::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::input::NesPad;
use crate::palette::{rgb565, PaletteKind, PALETTE_SIZE};

const INES_MAGIC: &[u8; 4] = b"NES\x1a";
const FDS_MAGIC: &[u8; 4] = b"FDS\x1a";
const INES_HEADER_LEN: usize = 16;
const SUPPORTED_MAPPERS: [u16; 6] = [0, 1, 2, 3, 4, 7];

const STATE_VERSION: u32 = 1;
const BAR_WIDTH: usize = 30;
const BAR_COLORS: [u8; 8] = [0x30, 0x28, 0x2C, 0x2A, 0x24, 0x26, 0x21, 0x0F];
const CURSOR_COLOR: u8 = 0x20;
const CURSOR_SIZE: i32 = 16;
const TONE_AMPLITUDE: i16 = 2_000;

/// 2C02 palette, RGB888.
#[rustfmt::skip]
const NES_RGB: [(u8, u8, u8); 64] = [
    (84, 84, 84), (0, 30, 116), (8, 16, 144), (48, 0, 136), (68, 0, 100), (92, 0, 48), (84, 4, 0), (60, 24, 0),
    (32, 42, 0), (8, 58, 0), (0, 64, 0), (0, 60, 0), (0, 50, 60), (0, 0, 0), (0, 0, 0), (0, 0, 0),
    (152, 150, 152), (8, 76, 196), (48, 50, 236), (92, 30, 228), (136, 20, 176), (160, 20, 100), (152, 34, 32), (120, 60, 0),
    (84, 90, 0), (40, 114, 0), (8, 124, 0), (0, 118, 40), (0, 102, 120), (0, 0, 0), (0, 0, 0), (0, 0, 0),
    (236, 238, 236), (76, 154, 236), (120, 124, 236), (176, 98, 236), (228, 84, 236), (236, 88, 180), (236, 106, 100), (212, 136, 32),
    (160, 170, 0), (116, 196, 0), (76, 208, 32), (56, 204, 108), (56, 180, 204), (60, 60, 60), (0, 0, 0), (0, 0, 0),
    (236, 238, 236), (168, 204, 236), (188, 188, 236), (212, 178, 236), (236, 174, 236), (236, 174, 212), (236, 180, 176), (228, 196, 144),
    (204, 210, 120), (180, 222, 120), (168, 226, 144), (152, 226, 180), (160, 214, 228), (160, 162, 160), (0, 0, 0), (0, 0, 0),
];

#[derive(Debug, Clone)]
struct RomInfo {
    mapper: u16,
    checksum: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PatternState {
    version: u32,
    rom_checksum: u32,
    frame: u64,
    phase: u32,
    cursor: (i32, i32),
}

pub struct TestPatternCore {
    system: SystemKind,
    sample_rate: u32,
    rom: Option<RomInfo>,
    pad: NesPad,
    frame: u64,
    phase: u32,
    cursor: (i32, i32),
    sprite_limit: bool,
    palette: [u16; PALETTE_SIZE],
    audio: Vec<i16>,
    running: bool,
}

impl TestPatternCore {
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn cursor(&self) -> (i32, i32) {
        self.cursor
    }

    pub fn mapper(&self) -> Option<u16> {
        self.rom.as_ref().map(|r| r.mapper)
    }

    pub fn sprite_limit(&self) -> bool {
        self.sprite_limit
    }

    pub fn palette(&self) -> &[u16; PALETTE_SIZE] {
        &self.palette
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn frames_per_second(&self) -> u32 {
        match self.system {
            SystemKind::Pal => 50,
            SystemKind::Detect | SystemKind::Ntsc => 60,
        }
    }

    fn centered_cursor() -> (i32, i32) {
        (
            (SCREEN_WIDTH as i32 - CURSOR_SIZE) / 2,
            (SCREEN_HEIGHT as i32 - CURSOR_SIZE) / 2,
        )
    }

    fn move_cursor(&mut self) {
        let (mut x, mut y) = self.cursor;
        if self.pad.contains(NesPad::LEFT) {
            x -= 2;
        }
        if self.pad.contains(NesPad::RIGHT) {
            x += 2;
        }
        if self.pad.contains(NesPad::UP) {
            y -= 2;
        }
        if self.pad.contains(NesPad::DOWN) {
            y += 2;
        }
        self.cursor = (
            x.clamp(0, SCREEN_WIDTH as i32 - CURSOR_SIZE),
            y.clamp(0, SCREEN_HEIGHT as i32 - CURSOR_SIZE),
        );
    }

    fn generate_audio(&mut self) {
        let count = (self.sample_rate / self.frames_per_second()) as usize;
        self.audio.clear();
        self.audio.reserve(count);
        let buttons = self.pad & (NesPad::A | NesPad::B | NesPad::START | NesPad::SELECT);
        if buttons.is_empty() {
            self.audio.resize(count, 0);
            return;
        }
        let freq = 220 * (1 + buttons.bits().count_ones());
        let half_period = (self.sample_rate / (2 * freq)).max(1);
        for _ in 0..count {
            let high = (self.phase / half_period) % 2 == 0;
            self.audio.push(if high { TONE_AMPLITUDE } else { -TONE_AMPLITUDE });
            self.phase = self.phase.wrapping_add(1);
        }
    }

    fn render(&self, frame: &mut [u8]) {
        let (cx, cy) = self.cursor;
        let scroll = self.frame as usize;
        for (i, px) in frame.chunks_exact_mut(2).enumerate() {
            let (x, y) = (i % SCREEN_WIDTH, i / SCREEN_WIDTH);
            let in_cursor = (x as i32) >= cx
                && (x as i32) < cx + CURSOR_SIZE
                && (y as i32) >= cy
                && (y as i32) < cy + CURSOR_SIZE;
            let index = if in_cursor {
                CURSOR_COLOR
            } else {
                BAR_COLORS[((x + scroll) / BAR_WIDTH) % BAR_COLORS.len()]
            };
            px.copy_from_slice(&self.palette[usize::from(index)].to_le_bytes());
        }
    }
}

fn classify_rom(data: &[u8]) -> Result<RomInfo, LoadError> {
    if data.len() >= 4 && &data[..4] == FDS_MAGIC {
        return Err(LoadError::MissingBios);
    }
    if data.len() < INES_HEADER_LEN || &data[..4] != INES_MAGIC {
        return Err(LoadError::UnsupportedRom);
    }
    let mut mapper = u16::from(data[6] >> 4) | u16::from(data[7] & 0xF0);
    // NES 2.0 headers carry four more mapper bits.
    if data[7] & 0x0C == 0x08 {
        mapper |= u16::from(data[8] & 0x0F) << 8;
    }
    if !SUPPORTED_MAPPERS.contains(&mapper) {
        return Err(LoadError::UnsupportedMapper(mapper));
    }
    let checksum = data
        .iter()
        .fold(0u32, |acc, &byte| acc.wrapping_mul(31).wrapping_add(u32::from(byte)));
    Ok(RomInfo { mapper, checksum })
}

fn adjust_rgb(kind: PaletteKind, (r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
    match kind {
        PaletteKind::Smooth => (r, g, b),
        PaletteKind::Classic => {
            let contrast = |c: u8| ((i32::from(c) - 128) * 5 / 4 + 128).clamp(0, 255) as u8;
            (contrast(r), contrast(g), contrast(b))
        }
        PaletteKind::Composite => (r.saturating_add(12), g, b.saturating_sub(12)),
        PaletteKind::Grayscale => {
            let y = ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000) as u8;
            (y, y, y)
        }
    }
}

impl EmulatorCore for TestPatternCore {
    fn init(system: SystemKind, sample_rate: u32) -> Result<Self, CoreError> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            system,
            sample_rate,
            rom: None,
            pad: NesPad::empty(),
            frame: 0,
            phase: 0,
            cursor: Self::centered_cursor(),
            sprite_limit: false,
            palette: [0; PALETTE_SIZE],
            audio: Vec::new(),
            running: true,
        })
    }

    fn load_rom(&mut self, path: &Path) -> Result<(), LoadError> {
        let data = fs::read(path)
            .map_err(|e| LoadError::Generic(format!("{}: {}", path.display(), e)))?;
        let info = classify_rom(&data)?;
        log::debug!("mapper {} checksum {:08x}", info.mapper, info.checksum);
        self.rom = Some(info);
        self.reset(true);
        Ok(())
    }

    fn set_input(&mut self, pad: NesPad) {
        self.pad = pad;
    }

    fn step(&mut self, frame: Option<&mut [u8]>) {
        if !self.running || self.rom.is_none() {
            self.audio.clear();
            return;
        }
        self.frame += 1;
        self.move_cursor();
        self.generate_audio();
        if let Some(frame) = frame {
            self.render(frame);
        }
    }

    fn reset(&mut self, _hard: bool) {
        self.frame = 0;
        self.phase = 0;
        self.pad = NesPad::empty();
        self.cursor = Self::centered_cursor();
        self.audio.clear();
    }

    fn save_state(&mut self, path: &Path) -> Result<(), CoreError> {
        let rom = self.rom.as_ref().ok_or(CoreError::NoRom)?;
        let state = PatternState {
            version: STATE_VERSION,
            rom_checksum: rom.checksum,
            frame: self.frame,
            phase: self.phase,
            cursor: self.cursor,
        };
        let data = bincode::serialize(&state)?;
        fs::write(path, data)?;
        Ok(())
    }

    fn load_state(&mut self, path: &Path) -> Result<(), CoreError> {
        let checksum = self.rom.as_ref().ok_or(CoreError::NoRom)?.checksum;
        let data = fs::read(path)?;
        let state: PatternState = bincode::deserialize(&data)?;
        if state.version > STATE_VERSION {
            return Err(CoreError::BadState(format!(
                "version {} is not supported (current: {})",
                state.version, STATE_VERSION
            )));
        }
        if state.rom_checksum != checksum {
            return Err(CoreError::BadState("state is from a different ROM".to_string()));
        }
        self.frame = state.frame;
        self.phase = state.phase;
        self.cursor = state.cursor;
        Ok(())
    }

    fn set_sprite_limit(&mut self, enabled: bool) {
        self.sprite_limit = enabled;
    }

    fn native_palette(&self, kind: PaletteKind) -> Vec<u16> {
        (0..PALETTE_SIZE)
            .map(|i| {
                let (r, g, b) = adjust_rgb(kind, NES_RGB[i % NES_RGB.len()]);
                rgb565(r, g, b)
            })
            .collect()
    }

    fn set_palette(&mut self, palette: &[u16; PALETTE_SIZE]) {
        self.palette = *palette;
    }

    fn audio_samples(&self) -> &[i16] {
        &self.audio
    }

    fn shutdown(&mut self) {
        self.running = false;
        self.rom = None;
        self.audio.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::FRAME_BYTES;

    fn ines(mapper: u8) -> Vec<u8> {
        let mut rom = vec![0u8; INES_HEADER_LEN + 16 * 1024];
        rom[..4].copy_from_slice(INES_MAGIC);
        rom[4] = 1;
        rom[6] = (mapper & 0x0F) << 4;
        rom[7] = mapper & 0xF0;
        rom
    }

    fn loaded() -> (tempfile::TempDir, TestPatternCore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.nes");
        fs::write(&path, ines(1)).unwrap();
        let mut core = TestPatternCore::init(SystemKind::Detect, 44_100).unwrap();
        core.load_rom(&path).unwrap();
        (dir, core)
    }

    #[test]
    fn rom_classes_are_reported() {
        assert_eq!(classify_rom(&ines(4)).unwrap().mapper, 4);
        assert!(matches!(
            classify_rom(&ines(5)),
            Err(LoadError::UnsupportedMapper(5))
        ));
        assert!(matches!(classify_rom(b"FDS\x1a...."), Err(LoadError::MissingBios)));
        assert!(matches!(classify_rom(b"garbage"), Err(LoadError::UnsupportedRom)));
    }

    #[test]
    fn missing_file_is_a_generic_failure() {
        let mut core = TestPatternCore::init(SystemKind::Detect, 44_100).unwrap();
        let err = core.load_rom(Path::new("/nonexistent/game.nes")).unwrap_err();
        assert!(matches!(err, LoadError::Generic(_)));
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        assert!(matches!(
            TestPatternCore::init(SystemKind::Ntsc, 0),
            Err(CoreError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn step_produces_one_frame_of_audio() {
        let (_dir, mut core) = loaded();
        core.step(None);
        assert_eq!(core.audio_samples().len(), 735);
        assert!(core.audio_samples().iter().all(|&s| s == 0));
        core.set_input(NesPad::A);
        core.step(None);
        assert!(core.audio_samples().iter().any(|&s| s != 0));
        assert_eq!(core.frame_count(), 2);
    }

    #[test]
    fn rendering_goes_through_the_installed_palette() {
        let (_dir, mut core) = loaded();
        let mut palette = [0u16; PALETTE_SIZE];
        palette[usize::from(BAR_COLORS[0])] = 0xBEEF;
        core.set_palette(&palette);
        let mut frame = vec![0u8; FRAME_BYTES];
        core.step(Some(&mut frame));
        // Frame 1 scrolls the first bar by one pixel; column 0 is still bar 0.
        assert_eq!(&frame[..2], &0xBEEFu16.to_le_bytes());
    }

    #[test]
    fn state_restores_counters_and_rejects_foreign_roms() {
        let (dir, mut core) = loaded();
        core.set_input(NesPad::RIGHT);
        for _ in 0..5 {
            core.step(None);
        }
        let state = dir.path().join("game.nesstate");
        core.save_state(&state).unwrap();
        let saved_cursor = core.cursor();

        core.reset(true);
        assert_eq!(core.frame_count(), 0);
        core.load_state(&state).unwrap();
        assert_eq!(core.frame_count(), 5);
        assert_eq!(core.cursor(), saved_cursor);

        let other = dir.path().join("other.nes");
        fs::write(&other, ines(0)).unwrap();
        core.load_rom(&other).unwrap();
        assert!(matches!(core.load_state(&state), Err(CoreError::BadState(_))));
    }

    #[test]
    fn truncated_state_fails_to_decode() {
        let (dir, mut core) = loaded();
        let state = dir.path().join("bad");
        fs::write(&state, [1u8, 0, 0]).unwrap();
        assert!(matches!(core.load_state(&state), Err(CoreError::Encoding(_))));
    }

    #[test]
    fn grayscale_palette_has_equal_channels() {
        let (_dir, core) = loaded();
        let gray = core.native_palette(PaletteKind::Grayscale);
        assert_eq!(gray.len(), PALETTE_SIZE);
        for &c in &gray {
            let (r, g, b) = (c >> 11, (c >> 5) & 0x3F, c & 0x1F);
            assert_eq!(r, b);
            assert_eq!(g >> 1, r);
        }
    }
}
