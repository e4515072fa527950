// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Media engine abstraction layer.
//!
//! The multiplexer drives exactly one engine through the `MediaEngine`
//! trait, so any backend that can load a source, start and stop it, and
//! report when playback ends can be plugged in. Engines have no notion
//! of looping; the multiplexer restarts playback on completion.

pub mod mock;
pub mod timed;

use std::sync::mpsc::Sender;

use thiserror::Error;

use crate::sound::SoundSource;

pub use mock::{EngineCall, MockEngine, MockEngineHandle};
pub use timed::TimedEngine;

/// Engine error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Source could not be loaded
    #[error("Failed to load '{locator}': {reason}")]
    LoadFailed { locator: String, reason: String },
    /// Playback could not be started
    #[error("Failed to start playback: {0}")]
    StartFailed(String),
    /// Playback could not be stopped
    #[error("Failed to stop playback: {0}")]
    StopFailed(String),
    /// Start requested with nothing loaded
    #[error("No source loaded")]
    NotLoaded,
}

/// Completion signal for one engine binding.
///
/// `binding` identifies which `load` call the signal belongs to, so
/// signals that arrive after the binding was replaced can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub binding: u64,
}

/// Handler given to the engine at bind time.
///
/// Cheap to clone and safe to fire from any thread.
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    binding: u64,
    sender: Sender<Completion>,
}

impl CompletionNotifier {
    pub(crate) fn new(binding: u64, sender: Sender<Completion>) -> Self {
        Self { binding, sender }
    }

    /// Binding this notifier belongs to
    pub fn binding(&self) -> u64 {
        self.binding
    }

    /// Signal that playback of the bound source ended.
    ///
    /// Returns false if the multiplexer is gone.
    pub fn notify(&self) -> bool {
        self.sender
            .send(Completion {
                binding: self.binding,
            })
            .is_ok()
    }
}

/// Trait for media playback engines.
pub trait MediaEngine: Send {
    /// Bind the engine to a source, replacing any previous binding.
    ///
    /// The engine must fire `notifier` each time playback of this source
    /// ends on its own. It must not fire it after `stop`.
    fn load(&mut self, source: &SoundSource, notifier: CompletionNotifier)
        -> Result<(), EngineError>;

    /// Start (or restart from the beginning) the loaded source
    fn start(&mut self) -> Result<(), EngineError>;

    /// Halt playback
    fn stop(&mut self) -> Result<(), EngineError>;
}

impl<E: MediaEngine + ?Sized> MediaEngine for Box<E> {
    fn load(
        &mut self,
        source: &SoundSource,
        notifier: CompletionNotifier,
    ) -> Result<(), EngineError> {
        (**self).load(source, notifier)
    }

    fn start(&mut self) -> Result<(), EngineError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        (**self).stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_notifier_sends_binding() {
        let (tx, rx) = mpsc::channel();
        let notifier = CompletionNotifier::new(7, tx);
        assert!(notifier.clone().notify());
        assert_eq!(rx.try_recv().unwrap(), Completion { binding: 7 });
    }

    #[test]
    fn test_notifier_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        let notifier = CompletionNotifier::new(1, tx);
        drop(rx);
        assert!(!notifier.notify());
    }

    #[test]
    fn test_boxed_engine() {
        let (engine, handle) = MockEngine::new();
        let mut boxed: Box<dyn MediaEngine> = Box::new(engine);
        let (tx, _rx) = mpsc::channel();
        boxed
            .load(&SoundSource::new("a.ogg"), CompletionNotifier::new(1, tx))
            .unwrap();
        boxed.start().unwrap();
        assert_eq!(handle.start_count(), 1);
    }
}
