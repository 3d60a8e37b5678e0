//! Fixed-timestep frame pacing.
//!
//! Each emulated step is given `target_us` of wall-clock time. Time left over
//! is slept away (minus a jitter margin); an overrun is carried forward as a
//! negative deficit and the next render is dropped so the emulation can catch
//! up without drifting.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceDecision {
    /// Sleep this many microseconds before the next step.
    Sleep(i64),
    /// Behind schedule: the next step runs without rendering.
    Skip { deficit: i64 },
    /// Inside the jitter margin, go straight on.
    OnTime,
}

#[derive(Debug, Clone)]
pub struct FramePacer {
    target_us: i64,
    margin_us: i64,
    accumulated_us: i64,
    render_next: bool,
}

impl FramePacer {
    pub fn new(refresh_hz: u32, margin_us: i64) -> Self {
        Self {
            target_us: 1_000_000 / i64::from(refresh_hz.max(1)),
            margin_us,
            accumulated_us: 0,
            render_next: true,
        }
    }

    pub fn target_us(&self) -> i64 {
        self.target_us
    }

    pub fn deficit_us(&self) -> i64 {
        self.accumulated_us
    }

    pub fn will_render(&self) -> bool {
        self.render_next
    }

    /// Whether the step about to run should render. A skipped render only
    /// ever drops a single step; the one after renders again unless
    /// `finish_step` decides otherwise.
    pub fn begin_step(&mut self) -> bool {
        let render = self.render_next;
        self.render_next = true;
        render
    }

    pub fn finish_step(&mut self, elapsed_us: i64) -> PaceDecision {
        let sleep_us = self.target_us - elapsed_us + self.accumulated_us;
        if sleep_us > self.margin_us {
            self.accumulated_us = 0;
            PaceDecision::Sleep(sleep_us - self.margin_us)
        } else if sleep_us < 0 {
            self.render_next = false;
            self.accumulated_us = sleep_us;
            PaceDecision::Skip { deficit: sleep_us }
        } else {
            PaceDecision::OnTime
        }
    }

    /// Forget any carried deficit, e.g. after the pause menu so the
    /// emulation does not sprint to make up for the time spent paused.
    pub fn reset(&mut self) {
        self.accumulated_us = 0;
    }
}
