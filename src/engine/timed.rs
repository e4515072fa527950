// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clock-driven engine.
//!
//! Produces no audio. Each `start` spawns a timer thread that waits for
//! the clip length and then fires the completion handler, unless the
//! playback is stopped or restarted first. Useful for headless hosts and
//! for exercising loop timing without an output device.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::{CompletionNotifier, EngineError, MediaEngine};
use crate::sound::SoundSource;

/// Length assumed for sources without a duration hint
pub const DEFAULT_CLIP_DURATION: Duration = Duration::from_millis(1000);

/// Timer-thread engine
pub struct TimedEngine {
    /// Used when a source carries no duration
    default_duration: Duration,
    /// Bound source and its completion handler
    bound: Option<(SoundSource, CompletionNotifier)>,
    /// Cancels the running timer when dropped
    playback: Option<Sender<()>>,
}

impl TimedEngine {
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_CLIP_DURATION)
    }

    /// Create with a custom fallback clip length
    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            default_duration,
            bound: None,
            playback: None,
        }
    }

    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    /// Whether a timer is running
    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    fn cancel(&mut self) {
        // Dropping the sender disconnects the timer thread
        self.playback = None;
    }
}

impl Default for TimedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for TimedEngine {
    fn load(
        &mut self,
        source: &SoundSource,
        notifier: CompletionNotifier,
    ) -> Result<(), EngineError> {
        self.cancel();
        if source.locator.trim().is_empty() {
            self.bound = None;
            return Err(EngineError::LoadFailed {
                locator: source.locator.clone(),
                reason: "empty locator".to_string(),
            });
        }
        self.bound = Some((source.clone(), notifier));
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.cancel();
        let (source, notifier) = self.bound.as_ref().ok_or(EngineError::NotLoaded)?;

        let duration = source.duration.unwrap_or(self.default_duration);
        let notifier = notifier.clone();
        let locator = source.locator.clone();
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("soundmux-timer".to_string())
            .spawn(move || match cancel_rx.recv_timeout(duration) {
                Err(RecvTimeoutError::Timeout) => {
                    debug!(source = %locator, binding = notifier.binding(), "clip ended");
                    notifier.notify();
                }
                _ => {
                    debug!(source = %locator, "clip cancelled");
                }
            })
            .map_err(|e| EngineError::StartFailed(format!("Failed to spawn timer: {}", e)))?;

        self.playback = Some(cancel_tx);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.cancel();
        Ok(())
    }
}

impl Drop for TimedEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}
