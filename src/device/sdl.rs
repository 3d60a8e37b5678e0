// Desktop device: SDL2 window at 2x, keyboard as the handheld buttons and an
// SDL audio queue. Drawing goes through the same software canvas as the
// headless device; the window only ever shows the finished surface.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use sdl2::audio::{AudioQueue, AudioSpecDesired};
use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{TextureCreator, WindowCanvas};
use sdl2::video::WindowContext;
use sdl2::{EventPump, Sdl};

use super::{pick_rom, AudioStream, Clock, Display, FrameRenderer, InputSource, RomBrowser};
use crate::canvas::{Canvas, FRAME_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::input::Buttons;
use crate::shutdown;

const WINDOW_SCALE: u32 = 2;
// Keep at most this much audio queued so latency stays bounded.
const MAX_QUEUED_MS: u32 = 100;

fn scancode_to_button(code: Scancode) -> Option<Buttons> {
    match code {
        Scancode::Up => Some(Buttons::DPAD_UP),
        Scancode::Down => Some(Buttons::DPAD_DOWN),
        Scancode::Left => Some(Buttons::DPAD_LEFT),
        Scancode::Right => Some(Buttons::DPAD_RIGHT),
        Scancode::Z => Some(Buttons::A),
        Scancode::X => Some(Buttons::B),
        Scancode::Return => Some(Buttons::MODE),
        Scancode::RShift => Some(Buttons::POWER),
        Scancode::Escape | Scancode::Backspace => Some(Buttons::BOTTOM),
        _ => None,
    }
}

/// Big-endian panel pixels to native-endian RGB565 for the texture.
fn panel_to_texture(src: &[u8], out: &mut [u8]) {
    for (s, d) in src.chunks_exact(2).zip(out.chunks_exact_mut(2)) {
        let px = u16::from_be_bytes([s[0], s[1]]);
        d.copy_from_slice(&px.to_ne_bytes());
    }
}

pub struct SdlDevice {
    _sdl: Sdl,
    window: WindowCanvas,
    creator: TextureCreator<WindowContext>,
    events: EventPump,
    audio: AudioQueue<i16>,
    sample_rate: u32,

    screen: Canvas,
    back: Vec<u8>,
    staging: Vec<u8>,
    renderer_started: bool,
    renderer_paused: bool,
    brightness: u8,

    epoch: Instant,
    held: Buttons,
    previous: Buttons,
    volume: f32,
    mix: Vec<i16>,

    preselect: Option<String>,
}

impl SdlDevice {
    pub fn new(sample_rate: u32, preselect: Option<String>) -> Result<Self, String> {
        let sdl = sdl2::init()?;
        let video = sdl.video()?;
        let audio = sdl.audio()?;

        let window = video
            .window(
                "handheld-nes",
                SCREEN_WIDTH as u32 * WINDOW_SCALE,
                SCREEN_HEIGHT as u32 * WINDOW_SCALE,
            )
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;
        let mut window = window.into_canvas().build().map_err(|e| e.to_string())?;
        window
            .set_logical_size(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32)
            .map_err(|e| e.to_string())?;
        let creator = window.texture_creator();

        let spec = AudioSpecDesired {
            freq: Some(sample_rate as i32),
            channels: Some(1),
            samples: Some(1024),
        };
        let queue = audio.open_queue::<i16, _>(None, &spec)?;
        let events = sdl.event_pump()?;

        Ok(Self {
            _sdl: sdl,
            window,
            creator,
            events,
            audio: queue,
            sample_rate,
            screen: Canvas::new(),
            back: vec![0; FRAME_BYTES],
            staging: vec![0; FRAME_BYTES],
            renderer_started: false,
            renderer_paused: false,
            brightness: 100,
            epoch: Instant::now(),
            held: Buttons::empty(),
            previous: Buttons::empty(),
            volume: 1.0,
            mix: Vec::new(),
            preselect,
        })
    }

    fn present(&mut self) {
        let mut shown = self.screen.clone();
        shown.dim(self.brightness);
        panel_to_texture(shown.bytes(), &mut self.staging);

        let mut texture = match self.creator.create_texture_streaming(
            PixelFormatEnum::RGB565,
            SCREEN_WIDTH as u32,
            SCREEN_HEIGHT as u32,
        ) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("create texture: {}", e);
                return;
            }
        };
        if let Err(e) = texture.update(None, &self.staging, SCREEN_WIDTH * 2) {
            log::warn!("texture update: {}", e);
            return;
        }
        self.window.clear();
        if let Err(e) = self.window.copy(&texture, None, None) {
            log::warn!("texture copy: {}", e);
        }
        self.window.present();
    }
}

impl Clock for SdlDevice {
    fn now_us(&self) -> i64 {
        self.epoch.elapsed().as_micros() as i64
    }

    fn delay_us(&mut self, us: i64) {
        if us > 0 {
            thread::sleep(Duration::from_micros(us as u64));
        }
    }
}

impl Display for SdlDevice {
    fn clear(&mut self, color: u16) {
        self.screen.clear(color);
    }

    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u16) {
        self.screen.fill_rect(x1, y1, x2, y2, color);
    }

    fn blit_blended(&mut self, src: &[u8], x: i32, y: i32, w: i32, h: i32, alpha: u8) {
        self.screen.blit_blended(src, x, y, w, h, alpha);
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, fg: u16, bg: u16) {
        self.screen.draw_text(text, x, y, fg, bg);
    }

    fn text_width(&self, text: &str) -> i32 {
        self.screen.text_width(text)
    }

    fn refresh(&mut self) {
        self.present();
    }

    fn set_brightness(&mut self, percent: u8) {
        self.brightness = percent.clamp(10, 100);
    }
}

impl FrameRenderer for SdlDevice {
    fn start_renderer(&mut self) {
        self.renderer_started = true;
        self.renderer_paused = false;
    }

    fn pause_renderer(&mut self) {
        self.renderer_paused = true;
    }

    fn resume_renderer(&mut self) {
        self.renderer_paused = false;
    }

    fn push_frame(&mut self) {
        if !self.renderer_started || self.renderer_paused {
            return;
        }
        self.screen.bytes_mut().copy_from_slice(&self.back);
        self.present();
    }

    fn back_buffer(&mut self) -> &mut [u8] {
        &mut self.back
    }
}

impl InputSource for SdlDevice {
    fn poll(&mut self) {
        for event in self.events.poll_iter() {
            if let Event::Quit { .. } = event {
                shutdown::request_quit();
            }
        }
        self.previous = self.held;
        self.held = self
            .events
            .keyboard_state()
            .pressed_scancodes()
            .filter_map(scancode_to_button)
            .fold(Buttons::empty(), |acc, b| acc | b);
    }

    fn held(&self) -> Buttons {
        self.held
    }

    fn pressed(&self) -> Buttons {
        self.held & !self.previous
    }
}

impl AudioStream for SdlDevice {
    fn start_listen(&mut self) {
        self.audio.resume();
    }

    fn stop_listen(&mut self) {
        self.audio.pause();
        self.audio.clear();
    }

    fn push_samples(&mut self, samples: &[i16]) {
        let max_bytes = self.sample_rate * 2 * MAX_QUEUED_MS / 1000;
        if self.audio.size() > max_bytes {
            return;
        }
        self.mix.clear();
        self.mix
            .extend(samples.iter().map(|&s| (f32::from(s) * self.volume) as i16));
        if let Err(e) = self.audio.queue_audio(&self.mix) {
            log::warn!("audio queue: {}", e);
        }
    }

    fn set_volume(&mut self, gain: f32) {
        self.volume = gain.clamp(0.0, 1.0);
    }
}

impl RomBrowser for SdlDevice {
    fn browse(&mut self, root: &Path, extension: &str) -> Option<String> {
        pick_rom(root, extension, self.preselect.as_deref())
    }
}
