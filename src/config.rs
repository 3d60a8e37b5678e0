use std::path::PathBuf;
use std::sync::OnceLock;

pub const DEFAULT_ROM_ROOT: &str = "/sdcard/roms";
pub const DEFAULT_SYSTEM: &str = "NES";
pub const DEFAULT_EXTENSION: &str = ".nes";
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_REFRESH_HZ: u32 = 60;
// Subtracted from every sleep to absorb wake-up jitter.
pub const DEFAULT_JITTER_MARGIN_US: i64 = 360;

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|&v| v >= 0)
        .unwrap_or(default)
}

pub fn quiet() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    *ON.get_or_init(|| env_flag("QUIET", false))
}

pub fn headless() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    *ON.get_or_init(|| env_flag("HEADLESS", false))
}

/// Runtime configuration of the shell.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellConfig {
    pub rom_root: PathBuf,
    pub system: String,
    pub extension: String,
    pub sample_rate: u32,
    pub refresh_hz: u32,
    pub jitter_margin_us: i64,
    pub limit_sprites: bool,
    /// Stop after this many loop iterations, paused ones included.
    pub max_frames: Option<u64>,
    /// ROM to pick without showing the browser.
    pub preselect: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            rom_root: PathBuf::from(DEFAULT_ROM_ROOT),
            system: DEFAULT_SYSTEM.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            refresh_hz: DEFAULT_REFRESH_HZ,
            jitter_margin_us: DEFAULT_JITTER_MARGIN_US,
            limit_sprites: true,
            max_frames: None,
            preselect: None,
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let rom_root = std::env::var("ROM_ROOT")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.rom_root);
        let max_frames = std::env::var("HEADLESS_FRAMES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());
        Self {
            rom_root,
            sample_rate: env_u32("NES_SAMPLE_RATE", defaults.sample_rate),
            refresh_hz: env_u32("REFRESH_HZ", defaults.refresh_hz),
            jitter_margin_us: env_i64("JITTER_MARGIN_US", defaults.jitter_margin_us),
            limit_sprites: env_flag("LIMIT_SPRITES", defaults.limit_sprites),
            max_frames,
            ..defaults
        }
    }

    /// `<rom-root>/<system>`, where ROMs and their save states live.
    pub fn system_dir(&self) -> PathBuf {
        self.rom_root.join(&self.system)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.system_dir().join("settings.bin")
    }
}
