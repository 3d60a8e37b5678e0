//! NES application shell for a 240x240 handheld: frame pacing, pause menu,
//! save states and the startup/teardown sequence around an emulation core.

pub mod app;
pub mod canvas;
pub mod config;
pub mod device;
pub mod emu;
pub mod input;
pub mod menu;
pub mod overlay;
pub mod pacer;
pub mod palette;
pub mod savestate;
pub mod settings;
pub mod shutdown;
pub mod snapshot;
pub mod stats;

pub use app::{App, StartupError};
