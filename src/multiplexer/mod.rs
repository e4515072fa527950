// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Single-slot playback multiplexer.
//!
//! Many registered sounds share one media engine. At most one of them,
//! the active sound, is bound to the engine at any time; playing another
//! sound preempts it. Looping is done here by restarting the engine each
//! time it reports that the clip ended.
//!
//! The multiplexer is single-threaded: completion signals are queued by
//! the engine and applied when the owner calls [`PlaybackMultiplexer::pump`]
//! (or [`PlaybackMultiplexer::on_completion`] directly). Hosts that need
//! to share it across threads use [`SharedMultiplexer`].

pub mod shared;

pub use shared::SharedMultiplexer;

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info, warn};

use crate::engine::{Completion, CompletionNotifier, EngineError, MediaEngine};
use crate::error::{PlaybackError, PlaybackResult};
use crate::sound::{LoopCount, PlaybackState, Sound, SoundId, SoundSource};

/// Registry entry for one sound
#[derive(Debug, Clone)]
struct SoundEntry {
    source: SoundSource,
    state: PlaybackState,
}

/// The sound currently bound to the engine
#[derive(Debug, Clone, Copy)]
struct ActiveSlot {
    sound: SoundId,
    /// Plays left, including the one in progress
    remaining: LoopCount,
    /// Binding number handed to the engine with `load`
    binding: u64,
}

/// Playback multiplexer over one media engine
pub struct PlaybackMultiplexer<E: MediaEngine> {
    /// Underlying engine
    engine: E,
    /// Registered sounds
    sounds: HashMap<SoundId, SoundEntry>,
    /// Sound bound to the engine, if any
    active: Option<ActiveSlot>,
    /// Last binding number issued
    bindings: u64,
    /// Cloned into every notifier
    completion_tx: Sender<Completion>,
    /// Taken by `SharedMultiplexer` when it starts its pump thread
    completion_rx: Option<Receiver<Completion>>,
}

impl<E: MediaEngine> PlaybackMultiplexer<E> {
    /// Create a multiplexer that owns `engine`
    pub fn new(engine: E) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            engine,
            sounds: HashMap::new(),
            active: None,
            bindings: 0,
            completion_tx,
            completion_rx: Some(completion_rx),
        }
    }

    /// Register a sound.
    ///
    /// Returns false, and changes nothing, if it is already registered.
    pub fn add(&mut self, sound: &Sound) -> bool {
        if self.sounds.contains_key(&sound.id()) {
            return false;
        }
        self.sounds.insert(
            sound.id(),
            SoundEntry {
                source: sound.source().clone(),
                state: PlaybackState::Idle,
            },
        );
        debug!(sound = %sound.id(), source = %sound.source().locator, "registered");
        true
    }

    /// Unregister a sound, stopping it first if it is active.
    ///
    /// Unknown sounds are ignored. Returns whether anything was removed.
    pub fn remove(&mut self, id: SoundId) -> bool {
        if !self.sounds.contains_key(&id) {
            return false;
        }
        if self.is_active(id) {
            if let Err(e) = self.release_slot() {
                warn!(sound = %id, error = %e, "engine stop failed while removing");
            }
        }
        self.sounds.remove(&id);
        debug!(sound = %id, "removed");
        true
    }

    /// Play a sound `loops` times.
    ///
    /// Preempts whatever is active, including the same sound, which then
    /// restarts with the new count. `LoopCount::Finite(0)` marks the sound
    /// finished without touching the engine.
    pub fn play(&mut self, id: SoundId, loops: LoopCount) -> PlaybackResult<()> {
        let source = self.entry(id)?.source.clone();

        if let Some(slot) = self.active {
            if slot.sound != id {
                info!(sound = %slot.sound, by = %id, "preempted");
            }
            // The new binding replaces the old one even if stop failed
            if let Err(e) = self.release_slot() {
                warn!(sound = %slot.sound, error = %e, "engine stop failed while preempting");
            }
        }

        if loops == LoopCount::Finite(0) {
            self.set_state(id, PlaybackState::Finished);
            debug!(sound = %id, "zero loops requested, finished");
            return Ok(());
        }

        self.bindings += 1;
        let binding = self.bindings;
        let notifier = CompletionNotifier::new(binding, self.completion_tx.clone());

        // Rolled back by abandon_slot if the engine fails
        self.set_state(id, PlaybackState::Playing);
        self.active = Some(ActiveSlot {
            sound: id,
            remaining: loops,
            binding,
        });

        let started = self
            .engine
            .load(&source, notifier)
            .and_then(|_| self.engine.start());
        if let Err(e) = started {
            warn!(sound = %id, error = %e, "failed to start playback");
            self.abandon_slot();
            return Err(e.into());
        }

        info!(sound = %id, loops = %loops, binding, "playing");
        Ok(())
    }

    /// Play with an integer loop count, `-1` meaning infinite
    pub fn play_raw(&mut self, id: SoundId, loops: i64) -> PlaybackResult<()> {
        self.entry(id)?;
        let loops = LoopCount::from_raw(loops)?;
        self.play(id, loops)
    }

    /// Stop a sound if it is the active one.
    ///
    /// A registered sound that is not active is left untouched.
    pub fn stop(&mut self, id: SoundId) -> PlaybackResult<()> {
        self.entry(id)?;
        if !self.is_active(id) {
            return Ok(());
        }
        info!(sound = %id, "stopped");
        self.release_slot().map_err(PlaybackError::from)
    }

    /// Whether the sound completed its loop count without interruption
    pub fn is_finished(&self, id: SoundId) -> PlaybackResult<bool> {
        Ok(self.entry(id)?.state == PlaybackState::Finished)
    }

    /// Stored state of a sound
    pub fn state(&self, id: SoundId) -> PlaybackResult<PlaybackState> {
        Ok(self.entry(id)?.state)
    }

    /// Sound currently bound to the engine
    pub fn active(&self) -> Option<SoundId> {
        self.active.map(|slot| slot.sound)
    }

    /// Plays left for the active sound, including the current one
    pub fn remaining_loops(&self, id: SoundId) -> Option<LoopCount> {
        self.active
            .filter(|slot| slot.sound == id)
            .map(|slot| slot.remaining)
    }

    pub fn contains(&self, id: SoundId) -> bool {
        self.sounds.contains_key(&id)
    }

    /// Number of registered sounds
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Registered source of a sound
    pub fn source(&self, id: SoundId) -> Option<&SoundSource> {
        self.sounds.get(&id).map(|entry| &entry.source)
    }

    /// Registered sound ids, in no particular order
    pub fn sound_ids(&self) -> impl Iterator<Item = SoundId> + '_ {
        self.sounds.keys().copied()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Apply one completion signal.
    ///
    /// Signals from a binding that is no longer active are ignored. An
    /// error means the restart failed; the sound is then idle.
    pub fn on_completion(&mut self, completion: Completion) -> PlaybackResult<()> {
        let Some(mut slot) = self.active.filter(|slot| slot.binding == completion.binding) else {
            debug!(binding = completion.binding, "stale completion ignored");
            return Ok(());
        };

        match slot.remaining {
            LoopCount::Infinite => {}
            LoopCount::Finite(n) if n <= 1 => {
                self.active = None;
                self.set_state(slot.sound, PlaybackState::Finished);
                info!(sound = %slot.sound, "finished");
                return Ok(());
            }
            LoopCount::Finite(n) => slot.remaining = LoopCount::Finite(n - 1),
        }

        self.active = Some(slot);
        debug!(sound = %slot.sound, remaining = %slot.remaining, "restarting");
        if let Err(e) = self.engine.start() {
            warn!(sound = %slot.sound, error = %e, "failed to restart playback");
            self.abandon_slot();
            return Err(e.into());
        }
        Ok(())
    }

    /// Apply every queued completion signal.
    ///
    /// Returns how many signals were processed. Restart failures are
    /// logged; the affected sound is left idle.
    pub fn pump(&mut self) -> usize {
        let Some(rx) = self.completion_rx.take() else {
            return 0;
        };
        let mut processed = 0;
        while let Ok(completion) = rx.try_recv() {
            processed += 1;
            // Logged by on_completion
            let _ = self.on_completion(completion);
        }
        self.completion_rx = Some(rx);
        processed
    }

    /// Hand the completion queue to an external pump
    pub(crate) fn take_completions(&mut self) -> Option<Receiver<Completion>> {
        self.completion_rx.take()
    }

    fn entry(&self, id: SoundId) -> PlaybackResult<&SoundEntry> {
        self.sounds
            .get(&id)
            .ok_or(PlaybackError::UnregisteredSound(id))
    }

    fn is_active(&self, id: SoundId) -> bool {
        self.active.is_some_and(|slot| slot.sound == id)
    }

    fn set_state(&mut self, id: SoundId, state: PlaybackState) {
        if let Some(entry) = self.sounds.get_mut(&id) {
            entry.state = state;
        }
    }

    /// Stop the engine and idle the active sound.
    ///
    /// The slot is released even when the engine fails to stop.
    fn release_slot(&mut self) -> Result<(), EngineError> {
        if self.active.is_none() {
            return Ok(());
        }
        let result = self.engine.stop();
        self.abandon_slot();
        result
    }

    /// Idle the active sound without calling the engine
    fn abandon_slot(&mut self) {
        if let Some(slot) = self.active.take() {
            self.set_state(slot.sound, PlaybackState::Idle);
        }
    }
}
