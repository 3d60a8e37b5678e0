use std::fs;
use std::path::Path;

use super::*;
use crate::device::headless::HeadlessDevice;
use crate::device::InputSource;
use crate::emu::TestPatternCore;
use crate::menu::MenuState;

type TestApp = App<HeadlessDevice, TestPatternCore>;

fn ines(mapper: u8) -> Vec<u8> {
    let mut rom = vec![0u8; 16 + 16 * 1024];
    rom[..4].copy_from_slice(b"NES\x1a");
    rom[4] = 1;
    rom[6] = (mapper & 0x0F) << 4;
    rom[7] = mapper & 0xF0;
    rom
}

fn rom_tree(rom: &[u8]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("NES")).unwrap();
    fs::write(dir.path().join("NES/game.nes"), rom).unwrap();
    dir
}

fn config(root: &Path) -> ShellConfig {
    ShellConfig {
        rom_root: root.to_path_buf(),
        ..ShellConfig::default()
    }
}

fn start_with(device: HeadlessDevice) -> (tempfile::TempDir, TestApp) {
    let dir = rom_tree(&ines(0));
    let app = TestApp::start(device, config(dir.path())).unwrap();
    (dir, app)
}

fn start() -> (tempfile::TempDir, TestApp) {
    start_with(HeadlessDevice::new().with_poll_cost(1_000))
}

/// Hold `buttons` for one tick, then release them for one tick.
fn press(app: &mut TestApp, buttons: Buttons) {
    app.device_mut().set_held(buttons);
    app.tick();
    app.device_mut().set_held(Buttons::empty());
    app.tick();
}

fn pause(app: &mut TestApp) {
    press(app, Buttons::BOTTOM);
    assert_eq!(app.menu().state(), MenuState::PauseMenu { options: false });
}

fn select(app: &mut TestApp, index: usize) {
    while app.menu().selection() != index {
        press(app, Buttons::DPAD_DOWN);
    }
}

#[test]
fn no_rom_in_the_tree_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("NES")).unwrap();
    let err = TestApp::start(HeadlessDevice::new(), config(dir.path()))
        .err()
        .unwrap();
    assert!(matches!(err, StartupError::NoRomSelected));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn unsupported_mapper_fails_startup() {
    let dir = rom_tree(&ines(5));
    let err = TestApp::start(HeadlessDevice::new(), config(dir.path()))
        .err()
        .unwrap();
    match err {
        StartupError::RomLoad { rom, source } => {
            assert_eq!(rom, "game.nes");
            assert!(matches!(source, LoadError::UnsupportedMapper(5)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn disk_image_needs_a_bios() {
    let dir = rom_tree(b"FDS\x1a\x01");
    let err = TestApp::start(HeadlessDevice::new(), config(dir.path()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        StartupError::RomLoad {
            source: LoadError::MissingBios,
            ..
        }
    ));
}

#[test]
fn zero_sample_rate_fails_core_init() {
    let dir = rom_tree(&ines(0));
    let cfg = ShellConfig {
        sample_rate: 0,
        ..config(dir.path())
    };
    let err = TestApp::start(HeadlessDevice::new(), cfg).err().unwrap();
    assert!(matches!(
        err,
        StartupError::CoreInit(CoreError::InvalidSampleRate(0))
    ));
}

#[test]
fn startup_primes_core_and_device() {
    let (_dir, app) = start();
    assert_eq!(app.rom(), "game.nes");
    assert_eq!(app.core().frame_count(), 2);
    assert!(app.core().sprite_limit());
    assert!(app.core().palette().iter().any(|&c| c != 0));
    assert!(app.device().renderer_started());
    assert!(app.device().is_listening());
    assert_eq!(app.device().volume(), 0.7);
    assert_eq!(app.device().brightness(), 100);
    assert!(app.menu().is_running());
}

#[test]
fn running_ticks_render_and_feed_audio() {
    let (_dir, mut app) = start();
    for _ in 0..3 {
        assert!(app.tick());
    }
    assert_eq!(app.core().frame_count(), 5);
    assert_eq!(app.device().frames_presented(), 3);
    assert_eq!(app.device().samples_pushed(), 3 * 735);
    assert_eq!(app.loop_count(), 3);
    // 16 666 us per step minus 1 000 us of work and the 360 us margin.
    assert_eq!(app.device().slept_us(), 3 * 15_306);
    assert_eq!(app.stats().frames(), 3);
}

#[test]
fn overrunning_steps_stop_rendering() {
    let (_dir, mut app) = start_with(HeadlessDevice::new().with_poll_cost(20_000));
    for _ in 0..3 {
        app.tick();
    }
    assert_eq!(app.core().frame_count(), 5);
    assert_eq!(app.device().frames_presented(), 1);
    assert_eq!(app.device().slept_us(), 0);
    assert_eq!(app.pacer().deficit_us(), -3 * 3_334);
}

#[test]
fn pause_captures_the_back_buffer() {
    let (_dir, mut app) = start();
    app.tick();
    app.tick();
    let frames = app.core().frame_count();
    let slept = app.device().slept_us();

    app.device_mut().set_held(Buttons::BOTTOM);
    app.tick();

    assert_eq!(app.core().frame_count(), frames);
    assert_eq!(app.snapshot().bytes(), app.device().back_bytes());
    assert!(app.snapshot().bytes().iter().any(|&b| b != 0));
    assert!(app.device().renderer_paused());
    assert_eq!(app.device().slept_us() - slept, 32_000);
}

#[test]
fn menu_ticks_draw_the_overlay() {
    let (_dir, mut app) = start();
    app.tick();
    pause(&mut app);
    let refreshes = app.device().refreshes();
    app.tick();
    assert_eq!(app.device().refreshes(), refreshes + 1);
    assert_eq!(app.device().frames_presented(), 1);
}

#[test]
fn pausing_twice_resumes_without_touching_the_game() {
    let (dir, mut app) = start();
    app.tick();
    let frames = app.core().frame_count();

    pause(&mut app);
    app.device_mut().set_held(Buttons::BOTTOM);
    app.tick();

    assert!(app.menu().is_running());
    assert!(!app.device().renderer_paused());
    assert_eq!(app.core().frame_count(), frames);
    assert!(!dir.path().join("NES/game.nesstate").exists());
}

#[test]
fn resume_resets_stats_and_deficit() {
    let (_dir, mut app) = start_with(HeadlessDevice::new().with_poll_cost(20_000));
    app.tick();
    app.tick();
    assert!(app.stats().frames() > 0);
    assert!(app.pacer().deficit_us() < 0);

    pause(&mut app);
    app.device_mut().set_held(Buttons::B);
    app.tick();

    assert!(app.menu().is_running());
    assert_eq!(app.stats().frames(), 0);
    assert_eq!(app.pacer().deficit_us(), 0);
}

#[test]
fn save_and_continue_writes_the_state() {
    let (dir, mut app) = start();
    app.tick();
    pause(&mut app);
    app.device_mut().set_held(Buttons::A);
    app.tick();

    assert!(app.menu().is_running());
    assert!(!app.device().renderer_paused());
    assert!(dir.path().join("NES/game.nesstate").is_file());
}

#[test]
fn load_restores_a_saved_game() {
    let (_dir, mut app) = start();
    app.tick();
    pause(&mut app);
    press(&mut app, Buttons::A);
    // The release tick above already ran one step past the save.
    let saved = app.core().frame_count() - 1;
    for _ in 0..5 {
        app.tick();
    }

    pause(&mut app);
    select(&mut app, 1);
    app.device_mut().set_held(Buttons::A);
    app.tick();
    assert!(app.menu().is_running());
    assert_eq!(app.core().frame_count(), saved);
}

#[test]
fn load_without_a_save_resets_the_game() {
    let (_dir, mut app) = start();
    for _ in 0..3 {
        app.tick();
    }
    pause(&mut app);
    select(&mut app, 1);
    app.device_mut().set_held(Buttons::A);
    app.tick();
    assert!(app.menu().is_running());
    assert_eq!(app.core().frame_count(), 0);
}

#[test]
fn corrupt_save_resets_the_game() {
    let (dir, mut app) = start();
    fs::write(dir.path().join("NES/game.nesstate"), [1u8, 0, 0]).unwrap();
    for _ in 0..3 {
        app.tick();
    }
    pause(&mut app);
    select(&mut app, 1);
    app.device_mut().set_held(Buttons::A);
    app.tick();
    assert!(app.menu().is_running());
    assert_eq!(app.core().frame_count(), 0);
}

#[test]
fn restart_resets_the_game() {
    let (_dir, mut app) = start();
    for _ in 0..3 {
        app.tick();
    }
    pause(&mut app);
    select(&mut app, 2);
    app.device_mut().set_held(Buttons::A);
    app.tick();
    assert!(app.menu().is_running());
    assert_eq!(app.core().frame_count(), 0);
}

#[test]
fn options_cancel_returns_to_the_pause_menu() {
    let (_dir, mut app) = start();
    pause(&mut app);
    select(&mut app, 3);
    press(&mut app, Buttons::A);
    assert!(app.menu().in_options());

    press(&mut app, Buttons::B);
    assert_eq!(app.menu().state(), MenuState::PauseMenu { options: false });
    assert!(app.device().renderer_paused());
}

#[test]
fn option_changes_apply_and_persist() {
    let (dir, mut app) = start();
    pause(&mut app);
    select(&mut app, 3);
    press(&mut app, Buttons::A);
    select(&mut app, 0);
    press(&mut app, Buttons::DPAD_LEFT);
    assert_eq!(app.settings().volume_percent(), 60);
    assert_eq!(app.device().volume(), 0.6);

    select(&mut app, 1);
    press(&mut app, Buttons::DPAD_LEFT);
    assert_eq!(app.device().brightness(), 90);

    let before = *app.core().palette();
    select(&mut app, 2);
    press(&mut app, Buttons::DPAD_RIGHT);
    assert_ne!(*app.core().palette(), before);

    press(&mut app, Buttons::B);
    let saved = Settings::load_from_file(&dir.path().join("NES/settings.bin")).unwrap();
    assert_eq!(saved, *app.settings());
}

#[test]
fn saved_settings_are_applied_at_startup() {
    let dir = rom_tree(&ines(0));
    let settings = Settings {
        volume: 2,
        brightness: 4,
        ..Settings::default()
    };
    settings
        .save_to_file(&dir.path().join("NES/settings.bin"))
        .unwrap();
    let app = TestApp::start(HeadlessDevice::new(), config(dir.path())).unwrap();
    assert_eq!(*app.settings(), settings);
    assert_eq!(app.device().volume(), 0.3);
    assert_eq!(app.device().brightness(), 50);
}

#[test]
fn quit_shuts_the_core_down() {
    let (_dir, mut app) = start();
    pause(&mut app);
    select(&mut app, 4);
    app.device_mut().set_held(Buttons::A);
    assert!(!app.tick());
    assert!(!app.is_running());
    assert!(!app.core().is_running());
    assert!(!app.tick());
}

#[test]
fn frame_limit_ends_the_run() {
    let dir = rom_tree(&ines(0));
    let cfg = ShellConfig {
        max_frames: Some(4),
        ..config(dir.path())
    };
    let mut app = TestApp::start(HeadlessDevice::new(), cfg).unwrap();
    app.run();
    assert_eq!(app.loop_count(), 4);
    assert_eq!(app.device().frames_presented(), 4);
}

#[test]
fn paused_run_still_honours_the_iteration_limit() {
    let script = crate::input::ScriptedInput::parse("1:BOTTOM").unwrap();
    let dir = rom_tree(&ines(0));
    let cfg = ShellConfig {
        max_frames: Some(4),
        ..config(dir.path())
    };
    let mut app = TestApp::start(HeadlessDevice::new().with_script(script), cfg).unwrap();
    app.run();
    assert!(!app.is_running());
    assert!(!app.menu().is_running());
    assert_eq!(app.loop_count(), 1);
    assert_eq!(app.iterations(), 4);
    assert_eq!(app.device().polls(), 4);
}

#[test]
fn menu_ticks_wait_a_panel_frame() {
    let (_dir, mut app) = start();
    app.tick();
    pause(&mut app);
    let slept = app.device().slept_us();
    app.tick();
    app.tick();
    assert_eq!(app.device().slept_us() - slept, 2 * 16_000);
}

#[test]
fn scripted_pause_and_quit() {
    let script = crate::input::ScriptedInput::parse("2:BOTTOM;4:UP;6:A").unwrap();
    let dir = rom_tree(&ines(0));
    let mut app =
        TestApp::start(HeadlessDevice::new().with_script(script), config(dir.path())).unwrap();
    app.run();
    assert!(!app.core().is_running());
    assert_eq!(app.loop_count(), 2);
    assert_eq!(app.device().polls(), 7);
}

#[test]
fn held_buttons_reach_the_core_pad() {
    let (_dir, mut app) = start();
    let start_cursor = app.core().cursor();
    app.device_mut().set_held(Buttons::DPAD_RIGHT | Buttons::MODE);
    app.tick();
    assert_eq!(app.core().cursor().0, start_cursor.0 + 2);
    assert!(app.device().held().contains(Buttons::MODE));
}
