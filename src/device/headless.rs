// Windowless device: software canvas, virtual clock, scripted or
// programmatic input. Used by `--headless` runs and the tests.

use std::path::Path;

use super::{pick_rom, AudioStream, Clock, Display, FrameRenderer, InputSource, RomBrowser};
use crate::canvas::{Canvas, FRAME_BYTES};
use crate::input::{Buttons, ScriptedInput};

pub struct HeadlessDevice {
    screen: Canvas,
    back: Vec<u8>,
    renderer_started: bool,
    renderer_paused: bool,
    frames_presented: u64,
    refreshes: u64,
    brightness: u8,

    clock_us: i64,
    /// Virtual time charged to every input poll, standing in for the work
    /// done by one loop iteration.
    poll_cost_us: i64,
    slept_us: i64,

    script: Option<ScriptedInput>,
    manual: Buttons,
    polls: u64,
    held: Buttons,
    previous: Buttons,

    listening: bool,
    volume: f32,
    samples_pushed: usize,

    preselect: Option<String>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            screen: Canvas::new(),
            back: vec![0; FRAME_BYTES],
            renderer_started: false,
            renderer_paused: false,
            frames_presented: 0,
            refreshes: 0,
            brightness: 100,
            clock_us: 0,
            poll_cost_us: 0,
            slept_us: 0,
            script: None,
            manual: Buttons::empty(),
            polls: 0,
            held: Buttons::empty(),
            previous: Buttons::empty(),
            listening: false,
            volume: 1.0,
            samples_pushed: 0,
            preselect: None,
        }
    }

    pub fn with_script(mut self, script: ScriptedInput) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_poll_cost(mut self, us: i64) -> Self {
        self.poll_cost_us = us.max(0);
        self
    }

    /// ROM the browser picks instead of the first one found.
    pub fn with_preselect(mut self, name: impl Into<String>) -> Self {
        self.preselect = Some(name.into());
        self
    }

    /// Buttons held from the next poll on, on top of any script.
    pub fn set_held(&mut self, buttons: Buttons) {
        self.manual = buttons;
    }

    pub fn advance(&mut self, us: i64) {
        self.clock_us += us.max(0);
    }

    pub fn screen(&self) -> &Canvas {
        &self.screen
    }

    pub fn back_bytes(&self) -> &[u8] {
        &self.back
    }

    pub fn renderer_started(&self) -> bool {
        self.renderer_started
    }

    pub fn renderer_paused(&self) -> bool {
        self.renderer_paused
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn slept_us(&self) -> i64 {
        self.slept_us
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn samples_pushed(&self) -> usize {
        self.samples_pushed
    }
}

impl Clock for HeadlessDevice {
    fn now_us(&self) -> i64 {
        self.clock_us
    }

    fn delay_us(&mut self, us: i64) {
        let us = us.max(0);
        self.clock_us += us;
        self.slept_us += us;
    }
}

impl Display for HeadlessDevice {
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
        self.refreshes += 1;
    }

    fn set_brightness(&mut self, percent: u8) {
        self.brightness = percent.clamp(10, 100);
    }
}

impl FrameRenderer for HeadlessDevice {
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
        self.frames_presented += 1;
    }

    fn back_buffer(&mut self) -> &mut [u8] {
        &mut self.back
    }
}

impl InputSource for HeadlessDevice {
    fn poll(&mut self) {
        let scripted = self
            .script
            .as_ref()
            .map(|s| s.held_at(self.polls))
            .unwrap_or_default();
        self.previous = self.held;
        self.held = scripted | self.manual;
        self.polls += 1;
        self.clock_us += self.poll_cost_us;
    }

    fn held(&self) -> Buttons {
        self.held
    }

    fn pressed(&self) -> Buttons {
        self.held & !self.previous
    }
}

impl AudioStream for HeadlessDevice {
    fn start_listen(&mut self) {
        self.listening = true;
    }

    fn stop_listen(&mut self) {
        self.listening = false;
    }

    fn push_samples(&mut self, samples: &[i16]) {
        if self.listening {
            self.samples_pushed += samples.len();
        }
    }

    fn set_volume(&mut self, gain: f32) {
        self.volume = gain.clamp(0.0, 1.0);
    }
}

impl RomBrowser for HeadlessDevice {
    fn browse(&mut self, root: &Path, extension: &str) -> Option<String> {
        pick_rom(root, extension, self.preselect.as_deref())
    }
}
