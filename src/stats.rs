//! Frame timing statistics and the per-tick telemetry event.

use embassy_time::Duration;

/// Frames between FPS / CPU recomputation
pub const STATS_WINDOW_FRAMES: u32 = 120;

/// Rolling render statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub frames_rendered: u32,
    /// Ticks whose render time exceeded the frame budget
    pub frame_drops: u32,
    pub avg_frame_time_us: u32,
    pub max_frame_time_us: u32,
    pub min_frame_time_us: u32,
    pub current_fps: u16,
    pub cpu_percent: u8,
    /// Commands dropped while being applied (unknown ids, bad values)
    pub commands_rejected: u32,
}

impl Default for RenderStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderStats {
    pub const fn new() -> Self {
        Self {
            frames_rendered: 0,
            frame_drops: 0,
            avg_frame_time_us: 0,
            max_frame_time_us: 0,
            min_frame_time_us: u32::MAX,
            current_fps: 0,
            cpu_percent: 0,
            commands_rejected: 0,
        }
    }

    /// Account one rendered frame that took `frame_time` against `budget`
    ///
    /// Over-budget frames are counted as drops but never treated as fatal.
    #[allow(clippy::cast_possible_truncation)]
    pub fn record(&mut self, frame_time: Duration, budget: Duration) {
        let time_us = u32::try_from(frame_time.as_micros()).unwrap_or(u32::MAX);
        let budget_us = u32::try_from(budget.as_micros()).unwrap_or(u32::MAX).max(1);

        self.frames_rendered = self.frames_rendered.wrapping_add(1);
        if time_us > budget_us {
            self.frame_drops = self.frame_drops.saturating_add(1);
        }

        self.avg_frame_time_us = if self.frames_rendered == 1 {
            time_us
        } else {
            ((u64::from(self.avg_frame_time_us) * 9 + u64::from(time_us)) / 10) as u32
        };
        self.max_frame_time_us = self.max_frame_time_us.max(time_us);
        self.min_frame_time_us = self.min_frame_time_us.min(time_us);

        if self.frames_rendered.is_multiple_of(STATS_WINDOW_FRAMES) {
            self.refresh_rates(budget_us);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn refresh_rates(&mut self, budget_us: u32) {
        if self.avg_frame_time_us == 0 {
            return;
        }
        self.current_fps = (1_000_000 / self.avg_frame_time_us).min(u32::from(u16::MAX)) as u16;
        self.cpu_percent = (u64::from(self.avg_frame_time_us) * 100 / u64::from(budget_us)).min(100) as u8;
    }
}

/// Published once per tick after the buffer has been handed to the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRendered {
    pub frame_number: u32,
    pub fps: u16,
    pub cpu_percent: u8,
    pub frames_rendered: u32,
    pub frame_time_us: u32,
    pub effect: Option<u8>,
}
