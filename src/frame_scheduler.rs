//! Frame scheduling and timing utilities.
//!
//! Provides portable frame pacing without async/await or platform-specific timers.
//! The caller is responsible for sleeping/waiting between frames.

use embassy_time::{Duration, Instant};

use crate::effect::Effect;
use crate::render_actor::RenderActor;
use crate::stats::FrameRendered;
use crate::{Clock, OutputDriver};

/// Default target frame rate (120 FPS).
pub const DEFAULT_FPS: u64 = 120;

/// Default frame duration based on target FPS.
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / DEFAULT_FPS);

/// Frames of lag tolerated before the schedule is reset to now.
pub const MAX_DRIFT_FRAMES: u32 = 2;

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (may be zero if behind schedule).
    pub sleep_duration: Duration,
    /// Telemetry of the frame just rendered.
    pub frame: FrameRendered,
}

/// Portable frame scheduler that paces a [`RenderActor`].
///
/// This scheduler:
/// - Tracks frame timing with drift correction
/// - Ticks the actor, which renders and writes to its output driver
/// - Returns timing info so the caller can sleep appropriately
///
/// # Usage
///
/// ```ignore
/// let mut scheduler = FrameScheduler::new(actor);
///
/// loop {
///     let result = scheduler.tick();
///
///     // Platform-specific sleep
///     Timer::after(result.sleep_duration).await;
/// }
/// ```
pub struct FrameScheduler<
    'a,
    E: Effect,
    O: OutputDriver,
    C: Clock,
    const LEDS: usize,
    const N: usize,
    const Q: usize,
> {
    actor: RenderActor<'a, E, O, C, LEDS, N, Q>,
    next_frame: Option<Instant>,
    frame_duration: Duration,
}

impl<'a, E, O, C, const LEDS: usize, const N: usize, const Q: usize>
    FrameScheduler<'a, E, O, C, LEDS, N, Q>
where
    E: Effect,
    O: OutputDriver,
    C: Clock,
{
    /// Create a scheduler using the actor's configured frame duration.
    pub fn new(actor: RenderActor<'a, E, O, C, LEDS, N, Q>) -> Self {
        let frame_duration = actor.config().frame_duration;
        Self::with_frame_duration(actor, frame_duration)
    }

    /// Create a new frame scheduler with custom frame duration.
    pub fn with_frame_duration(
        actor: RenderActor<'a, E, O, C, LEDS, N, Q>,
        frame_duration: Duration,
    ) -> Self {
        Self {
            actor,
            next_frame: None,
            frame_duration,
        }
    }

    /// Process one frame and return timing information.
    ///
    /// If the schedule has fallen more than [`MAX_DRIFT_FRAMES`] behind,
    /// the backlog is dropped instead of rendered in a catch-up burst.
    pub fn tick(&mut self) -> FrameResult {
        let now = self.actor.now();
        let max_drift = self.frame_duration * MAX_DRIFT_FRAMES;
        let deadline = match self.next_frame {
            Some(deadline) if now <= deadline + max_drift => deadline,
            _ => now,
        };

        let frame = self.actor.tick();

        let next_deadline = deadline + self.frame_duration;
        self.next_frame = Some(next_deadline);

        let after = self.actor.now();
        let sleep_duration = next_deadline
            .checked_duration_since(after)
            .unwrap_or(Duration::from_ticks(0));

        FrameResult {
            next_deadline,
            sleep_duration,
            frame,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Get a reference to the actor.
    pub fn actor(&self) -> &RenderActor<'a, E, O, C, LEDS, N, Q> {
        &self.actor
    }

    /// Get a mutable reference to the actor.
    pub fn actor_mut(&mut self) -> &mut RenderActor<'a, E, O, C, LEDS, N, Q> {
        &mut self.actor
    }

    /// Give the actor back, dropping the schedule.
    pub fn into_actor(self) -> RenderActor<'a, E, O, C, LEDS, N, Q> {
        self.actor
    }
}
