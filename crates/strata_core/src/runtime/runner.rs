//! # Frame Runner
//!
//! Drives a [`World`] one frame at a time with optional frame-rate pacing.
//!
//! Each frame:
//! 1. flushes the world's deferred commands
//! 2. dispatches the world's queued events
//! 3. runs every enabled system with the previous frame's duration as `dt`
//! 4. sleeps until the frame budget from [`FrameConfig`] is spent

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{FrameConfig, Pacing};
use crate::ecs::World;

/// Requests that a running [`Runner`] stop after the current frame.
///
/// Clone it into a system or command to end the loop from inside a frame.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the runner to stop after the current frame.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Checks whether a stop was requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }
}

/// Frame loop driver.
///
/// # Example
///
/// ```rust,ignore
/// let mut runner = Runner::new(config.frame.clone());
/// let frames = runner.run_while(&mut world, |world| world.entity_count() > 0);
/// ```
pub struct Runner {
    config: FrameConfig,
    stop: StopHandle,
    running: bool,
    /// Duration of the previous frame, in seconds.
    dt: f64,
    frame_count: u64,
}

impl Runner {
    /// Creates a runner. The first frame runs with `dt == 0.0`.
    #[must_use]
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            stop: StopHandle::default(),
            running: false,
            dt: 0.0,
            frame_count: 0,
        }
    }

    /// The pacing configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// The pacing configuration, for changes between frames.
    #[inline]
    pub fn config_mut(&mut self) -> &mut FrameConfig {
        &mut self.config
    }

    /// Switches pacing. Takes effect from the next frame.
    pub fn set_pacing(&mut self, pacing: Pacing) {
        tracing::debug!(?pacing, "frame pacing changed");
        self.config.pacing = pacing;
    }

    /// Duration of the previous frame, in seconds.
    #[inline]
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Frames completed since creation.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// True while [`run_while`](Self::run_while) is looping.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Handle that stops the loop from elsewhere.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Asks the loop to stop after the current frame.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Runs one frame and returns its measured duration in seconds.
    pub fn step(&mut self, world: &mut World) -> f64 {
        let frame_start = Instant::now();

        world.flush_commands();
        world.flush_events();
        world.update_systems(self.dt);
        self.regulate(frame_start);

        self.dt = frame_start.elapsed().as_secs_f64();
        self.frame_count += 1;
        tracing::trace!(frame = self.frame_count, dt = self.dt, "frame complete");
        self.dt
    }

    /// Runs frames while `keep_going` returns true and no stop was requested.
    ///
    /// `keep_going` is checked before every frame. Returns the number of
    /// frames run by this call.
    pub fn run_while<F>(&mut self, world: &mut World, mut keep_going: F) -> u64
    where
        F: FnMut(&World) -> bool,
    {
        self.stop.reset();
        self.running = true;
        let start_frame = self.frame_count;

        while !self.stop.is_stop_requested() && keep_going(world) {
            self.step(world);
        }

        self.running = false;
        self.frame_count - start_frame
    }

    /// Runs exactly `frames` frames unless stopped earlier.
    pub fn run_frames(&mut self, world: &mut World, frames: u64) -> u64 {
        let mut remaining = frames;
        self.run_while(world, |_| {
            let go = remaining > 0;
            remaining = remaining.saturating_sub(1);
            go
        })
    }

    fn regulate(&self, frame_start: Instant) {
        let budget = self.config.frame_budget();
        if budget.is_zero() {
            return;
        }
        let elapsed = frame_start.elapsed();
        match budget.checked_sub(elapsed) {
            Some(remaining) if remaining > Duration::ZERO => std::thread::sleep(remaining),
            Some(_) => {}
            None => {
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "frame overran its budget"
                );
            }
        }
    }
}
