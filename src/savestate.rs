use std::path::PathBuf;

use crate::emu::EmulatorCore;

/// Maps a ROM to its save-state files and drives the core's save/load.
///
/// States live next to the ROMs: `<root>/<system>/<rom>state`, with the
/// slot number appended for slots other than 0.
#[derive(Debug, Clone)]
pub struct SaveStateBridge {
    root: PathBuf,
    system: String,
}

impl SaveStateBridge {
    pub fn new(root: impl Into<PathBuf>, system: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            system: system.into(),
        }
    }

    pub fn state_path(&self, rom: &str, slot: u8) -> PathBuf {
        let name = if slot == 0 {
            format!("{rom}state")
        } else {
            format!("{rom}state{slot}")
        };
        self.root.join(&self.system).join(name)
    }

    pub fn save<C: EmulatorCore>(&self, core: &mut C, rom: &str, slot: u8) -> bool {
        let path = self.state_path(rom, slot);
        if let Some(dir) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                log::warn!("Cannot create {}: {}", dir.display(), e);
                return false;
            }
        }
        match core.save_state(&path) {
            Ok(()) => {
                log::info!("State saved to {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("Saving state to {} failed: {}", path.display(), e);
                false
            }
        }
    }

    /// Load a state. On any failure the core is hard-reset so the game never
    /// continues from a half-applied state.
    pub fn load<C: EmulatorCore>(&self, core: &mut C, rom: &str, slot: u8) -> bool {
        let path = self.state_path(rom, slot);
        match core.load_state(&path) {
            Ok(()) => {
                log::info!("State loaded from {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("Loading state from {} failed: {}; resetting", path.display(), e);
                core.reset(true);
                false
            }
        }
    }
}
