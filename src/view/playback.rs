//! Fixed-rate video playback with drop-frame backpressure.

use std::time::Duration;

use crate::foundation::core::Fps;

/// Outcome of one playback tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Not playing.
    Idle,
    /// The previous frame is still loading; this tick is dropped.
    Skipped,
    /// Advance to the next frame.
    Advance,
}

/// Play/pause state and the tick interval of a view.
#[derive(Clone, Debug, PartialEq)]
pub struct Playback {
    playing: bool,
    interval: Duration,
    skipped: u64,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            playing: false,
            interval: Duration::from_millis(33),
            skipped: 0,
        }
    }
}

impl Playback {
    /// Stopped playback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking at `fps`.
    pub fn play(&mut self, fps: Fps) {
        self.interval = fps.frame_interval();
        self.playing = true;
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "playback started");
    }

    /// Stop ticking.
    pub fn pause(&mut self) {
        if self.playing {
            tracing::debug!(skipped = self.skipped, "playback paused");
        }
        self.playing = false;
    }

    /// Whether ticks advance frames.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Time between two ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks dropped because a frame was still loading.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped
    }

    /// Evaluate one interval tick. A tick arriving while the previous frame loads is dropped
    /// rather than queued.
    pub fn tick(&mut self, loading: bool) -> Tick {
        if !self.playing {
            return Tick::Idle;
        }
        if loading {
            self.skipped += 1;
            return Tick::Skipped;
        }
        Tick::Advance
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/playback.rs"]
mod tests;
