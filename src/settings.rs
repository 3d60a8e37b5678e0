use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::menu::EntryKind;
use crate::palette::PaletteKind;

const LEVEL_MAX: u8 = 9;
pub const STATE_SLOT_MAX: u8 = 9;

/// User-adjustable options shown in the options submenu.
///
/// Volume and brightness are stored as levels 0..=9 and shown as
/// `level * 10 + 10` percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub volume: u8,
    pub brightness: u8,
    pub palette: PaletteKind,
    pub state_slot: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 6,
            brightness: LEVEL_MAX,
            palette: PaletteKind::Smooth,
            state_slot: 0,
        }
    }
}

impl Settings {
    /// Out-of-range levels read as the maximum.
    pub fn volume_percent(&self) -> u8 {
        level_percent(self.volume)
    }

    pub fn brightness_percent(&self) -> u8 {
        level_percent(self.brightness)
    }

    /// Audio sink gain in `0.0..=1.0`.
    pub fn volume_gain(&self) -> f32 {
        f32::from(self.volume_percent()) / 100.0
    }

    /// Apply one step of an options-row adjustment. Returns whether anything
    /// changed. Levels saturate, palettes wrap.
    pub fn adjust(&mut self, kind: EntryKind, delta: i32) -> bool {
        let before = *self;
        match kind {
            EntryKind::Volume => self.volume = step_level(self.volume, delta, LEVEL_MAX),
            EntryKind::Brightness => {
                self.brightness = step_level(self.brightness, delta, LEVEL_MAX)
            }
            EntryKind::Palette => self.palette = self.palette.cycle(delta),
            EntryKind::StateSlot => {
                self.state_slot = step_level(self.state_slot, delta, STATE_SLOT_MAX)
            }
            EntryKind::Scaling | EntryKind::Action(_) => {}
        }
        *self != before
    }

    /// Right-aligned value shown next to an option label.
    pub fn readout(&self, kind: EntryKind) -> Option<String> {
        match kind {
            EntryKind::Volume => Some(format!("{}%", self.volume_percent())),
            EntryKind::Brightness => Some(format!("{}%", self.brightness_percent())),
            EntryKind::Palette => Some(self.palette.name().to_string()),
            EntryKind::StateSlot => Some(self.state_slot.to_string()),
            EntryKind::Scaling | EntryKind::Action(_) => None,
        }
    }

    /// Clamp values read from disk back into range.
    fn sanitized(mut self) -> Self {
        self.volume = self.volume.min(LEVEL_MAX);
        self.brightness = self.brightness.min(LEVEL_MAX);
        self.state_slot = self.state_slot.min(STATE_SLOT_MAX);
        self
    }

    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let data = fs::read(path)
            .map_err(|e| format!("Failed to read settings {}: {}", path.display(), e))?;
        let settings: Settings = bincode::deserialize(&data)
            .map_err(|e| format!("Failed to decode settings {}: {}", path.display(), e))?;
        Ok(settings.sanitized())
    }

    /// Settings from `path`, or the defaults if the file is missing or bad.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let data =
            bincode::serialize(self).map_err(|e| format!("Failed to encode settings: {}", e))?;
        let mut file = File::create(path)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        file.write_all(&data)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        Ok(())
    }
}

fn level_percent(level: u8) -> u8 {
    level.min(LEVEL_MAX) * 10 + 10
}

fn step_level(value: u8, delta: i32, max: u8) -> u8 {
    (i32::from(value) + delta).clamp(0, i32::from(max)) as u8
}
