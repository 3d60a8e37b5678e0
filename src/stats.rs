// Rolling frame-time statistics, reported in the per-frame trace line.

const FRAME_TIME_MIN_SENTINEL: u64 = 1_000_000;

#[derive(Debug, Clone)]
pub struct FrameStats {
    num_frames: u32,
    frame_time_us: u64,
    frame_time_total_us: u64,
    frame_time_min_us: u64,
    frame_time_max_us: u64,
    last_tick_us: i64,
}

impl FrameStats {
    pub fn new(now_us: i64) -> Self {
        Self {
            num_frames: 0,
            frame_time_us: 0,
            frame_time_total_us: 0,
            frame_time_min_us: FRAME_TIME_MIN_SENTINEL,
            frame_time_max_us: 0,
            last_tick_us: now_us,
        }
    }

    /// Record the time since the previous tick as one frame.
    pub fn tick(&mut self, now_us: i64) {
        let frame_time = now_us.saturating_sub(self.last_tick_us).max(0) as u64;
        self.record(frame_time);
        self.last_tick_us = now_us;
    }

    fn record(&mut self, frame_time_us: u64) {
        self.num_frames = self.num_frames.saturating_add(1);
        self.frame_time_us = frame_time_us;
        self.frame_time_total_us = self.frame_time_total_us.saturating_add(frame_time_us);
        if frame_time_us < self.frame_time_min_us {
            self.frame_time_min_us = frame_time_us;
        }
        if frame_time_us > self.frame_time_max_us {
            self.frame_time_max_us = frame_time_us;
        }
    }

    pub fn reset(&mut self, now_us: i64) {
        self.num_frames = 0;
        self.frame_time_us = 0;
        self.frame_time_total_us = 0;
        self.frame_time_min_us = FRAME_TIME_MIN_SENTINEL;
        self.frame_time_max_us = 0;
        self.last_tick_us = now_us;
    }

    pub fn fps(&self) -> f32 {
        if self.frame_time_total_us == 0 {
            return 0.0;
        }
        self.num_frames as f32 / (self.frame_time_total_us as f32 / 1e6)
    }

    pub fn average_us(&self) -> f32 {
        if self.num_frames == 0 {
            return 0.0;
        }
        self.frame_time_total_us as f32 / self.num_frames as f32
    }

    pub fn frames(&self) -> u32 {
        self.num_frames
    }

    pub fn last_frame_us(&self) -> u64 {
        self.frame_time_us
    }

    pub fn total_us(&self) -> u64 {
        self.frame_time_total_us
    }

    pub fn min_us(&self) -> u64 {
        self.frame_time_min_us
    }

    pub fn max_us(&self) -> u64 {
        self.frame_time_max_us
    }
}
