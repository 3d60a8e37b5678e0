//! Narrow view of the handheld SDK used by the shell.
//!
//! The firmware build binds these traits to the vendor calls; the host
//! builds use [`headless::HeadlessDevice`] or, with the `sdl` feature, the
//! SDL2 window in [`sdl`].

use std::path::{Path, PathBuf};

use crate::input::Buttons;

pub mod headless;
#[cfg(feature = "sdl")]
pub mod sdl;

/// Monotonic clock and blocking delays.
pub trait Clock {
    fn now_us(&self) -> i64;
    fn delay_us(&mut self, us: i64);
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(i64::from(ms) * 1000);
    }
}

/// Immediate-mode drawing on the visible screen.
pub trait Display {
    fn clear(&mut self, color: u16);
    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u16);
    fn blit_blended(&mut self, src: &[u8], x: i32, y: i32, w: i32, h: i32, alpha: u8);
    fn draw_text(&mut self, text: &str, x: i32, y: i32, fg: u16, bg: u16);
    fn text_width(&self, text: &str) -> i32;
    fn refresh(&mut self);
    /// Panel brightness, 10..=100 percent.
    fn set_brightness(&mut self, percent: u8);
}

/// Double-buffered frame presentation.
pub trait FrameRenderer {
    fn start_renderer(&mut self);
    fn pause_renderer(&mut self);
    fn resume_renderer(&mut self);
    /// Present the back buffer. Ignored while paused.
    fn push_frame(&mut self);
    /// Off-screen buffer the core renders the next frame into.
    fn back_buffer(&mut self) -> &mut [u8];
}

pub trait InputSource {
    fn poll(&mut self);
    fn held(&self) -> Buttons;
    /// Buttons that went down since the previous poll.
    fn pressed(&self) -> Buttons;
}

pub trait AudioStream {
    fn start_listen(&mut self);
    fn stop_listen(&mut self);
    fn push_samples(&mut self, samples: &[i16]);
    fn set_volume(&mut self, gain: f32);
}

pub trait RomBrowser {
    /// Let the user pick a file under `root` ending in `extension`. Returns
    /// the file name relative to `root`.
    fn browse(&mut self, root: &Path, extension: &str) -> Option<String>;
}

/// Everything the shell needs from the device.
pub trait Device: Clock + Display + FrameRenderer + InputSource + AudioStream + RomBrowser {}

impl<T> Device for T where
    T: Clock + Display + FrameRenderer + InputSource + AudioStream + RomBrowser
{
}

fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

fn list_roms(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut roms: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()
        .into_iter()
        .flat_map(|it| it.flatten())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, extension))
        .collect();
    roms.sort();
    roms
}

/// Host-side stand-in for the SDK file browser.
///
/// With a `preferred` name, match it exactly, then by case-insensitive stem
/// or file name; without one, take the first ROM in name order.
pub fn pick_rom(root: &Path, extension: &str, preferred: Option<&str>) -> Option<String> {
    let roms = list_roms(root, extension);
    let file_name = |p: &PathBuf| p.file_name().and_then(|s| s.to_str()).map(str::to_string);

    let Some(query) = preferred.map(str::trim).filter(|q| !q.is_empty()) else {
        return roms.first().and_then(file_name);
    };

    if root.join(query).is_file() {
        return Some(query.to_string());
    }

    let query = query.to_lowercase();
    let mut matches: Vec<&PathBuf> = roms
        .iter()
        .filter(|p| {
            let stem = p
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_lowercase();
            let name = file_name(*p).map(|s| s.to_lowercase());
            stem == query || name.as_deref() == Some(query.as_str())
        })
        .collect();

    match matches.len() {
        1 => file_name(matches.remove(0)),
        0 => {
            log::warn!("ROM '{}' not found under {}", query, root.display());
            None
        }
        _ => {
            let list = matches
                .iter()
                .map(|p| format!("- {}", p.display()))
                .collect::<Vec<_>>()
                .join("\n");
            log::warn!("Multiple ROMs matched '{}':\n{}", query, list);
            None
        }
    }
}
