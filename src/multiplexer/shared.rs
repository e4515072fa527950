// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Thread-safe multiplexer handle.
//!
//! Wraps a `PlaybackMultiplexer` in a single mutex so client calls and
//! engine completions are applied one at a time. A pump thread owns the
//! completion queue and applies each signal under the lock as soon as
//! it arrives, so looping needs no help from the caller.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::PlaybackMultiplexer;
use crate::engine::{Completion, MediaEngine};
use crate::error::{PlaybackError, PlaybackResult};
use crate::sound::{LoopCount, PlaybackState, Sound, SoundId};

/// Shared, lock-guarded multiplexer
pub struct SharedMultiplexer<E: MediaEngine + 'static> {
    inner: Arc<Mutex<PlaybackMultiplexer<E>>>,
}

impl<E: MediaEngine + 'static> Clone for SharedMultiplexer<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: MediaEngine + 'static> SharedMultiplexer<E> {
    /// Wrap a multiplexer and start its completion pump
    pub fn new(mut multiplexer: PlaybackMultiplexer<E>) -> std::io::Result<Self> {
        let completions = multiplexer.take_completions();
        let inner = Arc::new(Mutex::new(multiplexer));

        if let Some(rx) = completions {
            let weak = Arc::downgrade(&inner);
            thread::Builder::new()
                .name("soundmux-pump".to_string())
                .spawn(move || pump_completions(weak, rx))?;
        }

        Ok(Self { inner })
    }

    /// Create a multiplexer over `engine` and share it
    pub fn with_engine(engine: E) -> std::io::Result<Self> {
        Self::new(PlaybackMultiplexer::new(engine))
    }

    fn lock(&self) -> PlaybackResult<MutexGuard<'_, PlaybackMultiplexer<E>>> {
        self.inner.lock().map_err(|_| PlaybackError::LockPoisoned)
    }

    /// Run `f` with exclusive access to the multiplexer
    pub fn with<R>(&self, f: impl FnOnce(&mut PlaybackMultiplexer<E>) -> R) -> PlaybackResult<R> {
        let mut mux = self.lock()?;
        Ok(f(&mut *mux))
    }

    pub fn add(&self, sound: &Sound) -> PlaybackResult<bool> {
        Ok(self.lock()?.add(sound))
    }

    pub fn remove(&self, id: SoundId) -> PlaybackResult<bool> {
        Ok(self.lock()?.remove(id))
    }

    pub fn play(&self, id: SoundId, loops: LoopCount) -> PlaybackResult<()> {
        self.lock()?.play(id, loops)
    }

    pub fn play_raw(&self, id: SoundId, loops: i64) -> PlaybackResult<()> {
        self.lock()?.play_raw(id, loops)
    }

    pub fn stop(&self, id: SoundId) -> PlaybackResult<()> {
        self.lock()?.stop(id)
    }

    pub fn is_finished(&self, id: SoundId) -> PlaybackResult<bool> {
        self.lock()?.is_finished(id)
    }

    pub fn state(&self, id: SoundId) -> PlaybackResult<PlaybackState> {
        self.lock()?.state(id)
    }

    pub fn active(&self) -> PlaybackResult<Option<SoundId>> {
        Ok(self.lock()?.active())
    }
}

/// How often the pump checks whether the multiplexer is still alive
const PUMP_POLL: Duration = Duration::from_millis(100);

/// Apply completions until the multiplexer is dropped.
///
/// Engines may hold a notifier past the multiplexer's lifetime, so the
/// queue closing is not enough; the pump also exits once no strong
/// reference remains.
fn pump_completions<E: MediaEngine>(
    weak: Weak<Mutex<PlaybackMultiplexer<E>>>,
    rx: Receiver<Completion>,
) {
    loop {
        let completion = match rx.recv_timeout(PUMP_POLL) {
            Ok(completion) => completion,
            Err(RecvTimeoutError::Timeout) if weak.strong_count() > 0 => continue,
            Err(_) => break,
        };
        let Some(inner) = weak.upgrade() else {
            break;
        };
        let Ok(mut mux) = inner.lock() else {
            warn!("multiplexer lock poisoned, stopping completion pump");
            break;
        };
        // Restart failures are logged by on_completion
        let _ = mux.on_completion(completion);
    }
    debug!("completion pump exiting");
}
