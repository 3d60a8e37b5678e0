//! Lifecycle controller: startup sequence, the paced main loop and the
//! pause menu actions.

use thiserror::Error;

use crate::canvas::{color, FRAME_BYTES};
use crate::config::ShellConfig;
use crate::device::Device;
use crate::emu::{CoreError, EmulatorCore, LoadError, SystemKind};
use crate::input::{menu_input, nes_pad, Buttons};
use crate::menu::{EntryKind, Menu, MenuCommand, MenuInput};
use crate::overlay::draw_pause_overlay;
use crate::pacer::{FramePacer, PaceDecision};
use crate::palette::{build_palette, PaletteKind};
use crate::savestate::SaveStateBridge;
use crate::settings::Settings;
use crate::shutdown;
use crate::snapshot::PauseSnapshot;
use crate::stats::FrameStats;

#[cfg(test)]
mod tests;

/// Settle time around the pause snapshot so the panel finishes scanning out
/// the last pushed frame.
const PAUSE_SETTLE_MS: u32 = 16;
/// The menu redraws at roughly the panel rate instead of spinning.
const MENU_FRAME_MS: u32 = 16;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("browser closed without selecting a ROM")]
    NoRomSelected,
    #[error("cannot allocate {0} bytes for the pause buffer")]
    OutOfMemory(usize),
    #[error("error initialising NES emulator: {0}")]
    CoreInit(#[from] CoreError),
    #[error("{source} ({rom})")]
    RomLoad { rom: String, source: LoadError },
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::NoRomSelected => 2,
            StartupError::OutOfMemory(_) => 3,
            StartupError::CoreInit(_) => 4,
            StartupError::RomLoad { .. } => 5,
        }
    }
}

pub struct App<D: Device, C: EmulatorCore> {
    device: D,
    core: C,
    config: ShellConfig,
    rom: String,
    menu: Menu,
    pacer: FramePacer,
    stats: FrameStats,
    snapshot: PauseSnapshot,
    settings: Settings,
    settings_dirty: bool,
    saves: SaveStateBridge,
    running: bool,
    loop_count: u64,
    iterations: u64,
}

impl<D: Device, C: EmulatorCore> App<D, C> {
    /// Pick a ROM, bring the core up and prime it. Every failure is logged
    /// and ends startup.
    pub fn start(device: D, config: ShellConfig) -> Result<Self, StartupError> {
        Self::start_inner(device, config).inspect_err(|e| log::error!("{}", e))
    }

    fn start_inner(mut device: D, config: ShellConfig) -> Result<Self, StartupError> {
        let rom_dir = config.system_dir();
        let rom = device
            .browse(&rom_dir, &config.extension)
            .ok_or(StartupError::NoRomSelected)?;
        log::info!("Launching {}", rom);

        let snapshot =
            PauseSnapshot::for_screen().ok_or(StartupError::OutOfMemory(FRAME_BYTES))?;

        let mut core = C::init(SystemKind::Detect, config.sample_rate)?;
        core.load_rom(&rom_dir.join(&rom))
            .map_err(|source| StartupError::RomLoad {
                rom: rom.clone(),
                source,
            })?;

        log::info!("Starting double buffer renderer");
        device.start_renderer();

        core.set_sprite_limit(config.limit_sprites);
        let settings = Settings::load_or_default(&config.settings_path());
        install_palette(&mut core, settings.palette);

        device.start_listen();
        device.set_volume(settings.volume_gain());
        device.set_brightness(settings.brightness_percent());

        // The core needs two frames before a state restore is reliable.
        core.step(None);
        core.step(None);
        log::info!("NES emulator initialisation done");

        let now = device.now_us();
        Ok(Self {
            pacer: FramePacer::new(config.refresh_hz, config.jitter_margin_us),
            stats: FrameStats::new(now),
            saves: SaveStateBridge::new(&config.rom_root, &config.system),
            device,
            core,
            config,
            rom,
            menu: Menu::new(),
            snapshot,
            settings,
            settings_dirty: false,
            running: true,
            loop_count: 0,
            iterations: 0,
        })
    }

    pub fn run(&mut self) {
        self.device.clear(color::BLACK);
        self.device.refresh();
        while self.tick() {}
        log::info!(
            "Stopped after {} loops ({:.2} fps since last resume, frame time {}..{} us)",
            self.loop_count,
            self.stats.fps(),
            self.stats.min_us(),
            self.stats.max_us()
        );
    }

    /// One loop iteration. Returns false once the app should exit.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if shutdown::should_quit() {
            log::info!("Quit requested by host");
            self.quit();
            return false;
        }

        let now = self.device.now_us();
        self.device.poll();

        if self.menu.is_running() {
            self.run_step(now);
        } else {
            self.menu_step();
        }

        // Menu iterations count too, so a paused headless run still ends.
        self.iterations += 1;
        if let Some(max) = self.config.max_frames {
            if self.running && self.iterations >= max {
                log::info!("Iteration limit {} reached", max);
                self.running = false;
            }
        }
        self.running
    }

    fn run_step(&mut self, now: i64) {
        let fps = self.stats.fps();
        self.core.set_input(nes_pad(self.device.held()));

        if self.device.pressed().contains(Buttons::BOTTOM) {
            let command = self.menu.handle(MenuInput::Pause);
            self.apply(command);
            return;
        }

        if self.pacer.begin_step() {
            self.core.step(Some(self.device.back_buffer()));
            self.device.push_frame();
        } else {
            self.core.step(None);
        }
        self.device.push_samples(self.core.audio_samples());
        self.loop_count += 1;

        let elapsed = self.device.now_us() - now;
        let decision = self.pacer.finish_step(elapsed);
        log::trace!(
            "loop {}, fps: {:.2}, elapsed: {}, pace: {:?}, render next: {}",
            self.loop_count,
            fps,
            elapsed,
            decision,
            self.pacer.will_render()
        );
        if let PaceDecision::Sleep(us) = decision {
            self.device.delay_us(us);
        }
        self.stats.tick(now);
    }

    fn menu_step(&mut self) {
        draw_pause_overlay(
            &mut self.device,
            self.snapshot.bytes(),
            &self.menu,
            &self.settings,
        );
        if let Some(input) = menu_input(self.device.pressed()) {
            let command = self.menu.handle(input);
            self.apply(command);
        }
        if !self.menu.is_running() {
            self.device.delay_ms(MENU_FRAME_MS);
        }
    }

    fn apply(&mut self, command: MenuCommand) {
        match command {
            MenuCommand::None => {}
            MenuCommand::Pause => self.enter_pause(),
            MenuCommand::Resume => self.resume(),
            MenuCommand::SaveAndContinue => {
                self.saves
                    .save(&mut self.core, &self.rom, self.settings.state_slot);
                self.resume();
            }
            MenuCommand::LoadGame => {
                self.saves
                    .load(&mut self.core, &self.rom, self.settings.state_slot);
                self.resume();
            }
            MenuCommand::Restart => {
                self.core.reset(true);
                self.resume();
            }
            MenuCommand::Quit => self.quit(),
            MenuCommand::CloseOptions => self.persist_settings(),
            MenuCommand::Adjust { kind, delta } => self.adjust(kind, delta),
        }
    }

    fn enter_pause(&mut self) {
        self.device.delay_ms(PAUSE_SETTLE_MS);
        self.snapshot.capture(self.device.back_buffer());
        self.device.pause_renderer();
        self.device.delay_ms(PAUSE_SETTLE_MS);
        log::debug!("Paused after {} loops", self.loop_count);
    }

    /// Back to Running. Statistics and the pacing deficit restart from now
    /// so the time spent in the menu is not caught up on.
    fn resume(&mut self) {
        self.stats.reset(self.device.now_us());
        self.pacer.reset();
        self.device.resume_renderer();
    }

    fn quit(&mut self) {
        self.core.shutdown();
        self.running = false;
        log::info!("Exiting emulator");
    }

    fn adjust(&mut self, kind: EntryKind, delta: i32) {
        if !self.settings.adjust(kind, delta) {
            return;
        }
        self.settings_dirty = true;
        match kind {
            EntryKind::Volume => self.device.set_volume(self.settings.volume_gain()),
            EntryKind::Brightness => self
                .device
                .set_brightness(self.settings.brightness_percent()),
            EntryKind::Palette => install_palette(&mut self.core, self.settings.palette),
            EntryKind::StateSlot | EntryKind::Scaling | EntryKind::Action(_) => {}
        }
    }

    fn persist_settings(&mut self) {
        if !self.settings_dirty {
            return;
        }
        match self.settings.save_to_file(&self.config.settings_path()) {
            Ok(()) => self.settings_dirty = false,
            Err(e) => log::warn!("{}", e),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn snapshot(&self) -> &PauseSnapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rom(&self) -> &str {
        &self.rom
    }

    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    /// Loop iterations in either state, including paused ones.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl<D: Device, C: EmulatorCore> Drop for App<D, C> {
    fn drop(&mut self) {
        self.device.stop_listen();
    }
}

/// Byte-swap the core's palette for the big-endian panel and install it.
fn install_palette<C: EmulatorCore>(core: &mut C, kind: PaletteKind) {
    let palette = build_palette(&core.native_palette(kind));
    core.set_palette(&palette);
}
