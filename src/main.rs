use handheld_nes::config::{self, ShellConfig};
use handheld_nes::device::headless::HeadlessDevice;
use handheld_nes::emu::TestPatternCore;
use handheld_nes::input::ScriptedInput;
use handheld_nes::{shutdown, App};
use std::env;
use std::path::PathBuf;
use std::process;

// Loop iterations a headless run gets when no limit is given.
const DEFAULT_HEADLESS_FRAMES: u64 = 600;

struct CliArgs {
    headless: bool,
    frames: Option<u64>,
    script: Option<ScriptedInput>,
    rom_root: Option<PathBuf>,
    rom: Option<String>,
}

fn usage(program: &str) {
    eprintln!(
        "Usage: {} [--headless] [--frames N] [--input-events S] [--rom-root DIR] [rom]",
        program
    );
    eprintln!("ROMs are looked up under <rom-root>/NES (default {}).", config::DEFAULT_ROM_ROOT);
}

fn value_of(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) => v.clone(),
        None => {
            eprintln!("{} requires a value", flag);
            process::exit(2);
        }
    }
}

fn parse_args(args: &[String]) -> CliArgs {
    let mut cli = CliArgs {
        headless: config::headless(),
        frames: None,
        script: None,
        rom_root: None,
        rom: None,
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                usage(&args[0]);
                process::exit(0);
            }
            "--headless" => {
                cli.headless = true;
                i += 1;
            }
            "--frames" => {
                let v = value_of(args, i, "--frames");
                match v.parse::<u64>() {
                    Ok(n) => cli.frames = Some(n),
                    Err(_) => {
                        eprintln!("--frames: '{}' is not a number", v);
                        process::exit(2);
                    }
                }
                i += 2;
            }
            "--input-events" => {
                let v = value_of(args, i, "--input-events");
                match ScriptedInput::parse(&v) {
                    Ok(script) => cli.script = Some(script),
                    Err(e) => {
                        eprintln!("--input-events: {}", e);
                        process::exit(2);
                    }
                }
                i += 2;
            }
            "--rom-root" => {
                cli.rom_root = Some(PathBuf::from(value_of(args, i, "--rom-root")));
                i += 2;
            }
            s if s.starts_with('-') => {
                eprintln!("Unknown option: {}", s);
                process::exit(2);
            }
            s => {
                cli.rom = Some(s.to_string());
                i += 1;
            }
        }
    }
    cli
}

fn init_logging() {
    let default = if config::quiet() { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

fn run_headless(cli: CliArgs, mut cfg: ShellConfig) {
    if cfg.max_frames.is_none() {
        // Never cut a script short.
        let script_end = cli.script.as_ref().map_or(0, |s| s.last_poll() + 1);
        cfg.max_frames = Some(DEFAULT_HEADLESS_FRAMES.max(script_end));
    }
    let mut device = HeadlessDevice::new();
    if let Some(script) = cli.script {
        device = device.with_script(script);
    }
    if let Some(rom) = cfg.preselect.clone() {
        device = device.with_preselect(rom);
    }
    match App::<_, TestPatternCore>::start(device, cfg) {
        Ok(mut app) => {
            app.run();
            let stats = app.stats();
            log::info!(
                "Headless run done: {} iterations, {} loops, {} frames presented, avg {:.0} us",
                app.iterations(),
                app.loop_count(),
                app.device().frames_presented(),
                stats.average_us()
            );
        }
        Err(e) => shutdown::set_exit_code(e.exit_code()),
    }
}

#[cfg(feature = "sdl")]
fn run_windowed(_cli: CliArgs, cfg: ShellConfig) {
    use handheld_nes::device::sdl::SdlDevice;

    let device = match SdlDevice::new(cfg.sample_rate, cfg.preselect.clone()) {
        Ok(d) => d,
        Err(e) => {
            log::error!("Failed to initialise SDL: {}", e);
            shutdown::set_exit_code(1);
            return;
        }
    };
    match App::<_, TestPatternCore>::start(device, cfg) {
        Ok(mut app) => app.run(),
        Err(e) => shutdown::set_exit_code(e.exit_code()),
    }
}

#[cfg(not(feature = "sdl"))]
fn run_windowed(cli: CliArgs, cfg: ShellConfig) {
    log::warn!("Built without the `sdl` feature; running headless");
    run_headless(cli, cfg);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut cli = parse_args(&args);
    init_logging();
    shutdown::install();

    let mut cfg = ShellConfig::from_env();
    if let Some(root) = cli.rom_root.clone() {
        cfg.rom_root = root;
    }
    if cli.frames.is_some() {
        cfg.max_frames = cli.frames;
    }
    cfg.preselect = cli.rom.take();
    log::info!("Starting NES shell (roms under {})", cfg.system_dir().display());

    if cli.headless {
        run_headless(cli, cfg);
    } else {
        run_windowed(cli, cfg);
    }

    let code = shutdown::exit_code();
    if code != 0 {
        process::exit(code);
    }
}
