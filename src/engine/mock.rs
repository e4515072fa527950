// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scriptable engine for tests and dry runs.
//!
//! Records every call, lets the caller end playback by hand and can be
//! armed to fail the next load, start or stop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{CompletionNotifier, EngineError, MediaEngine};
use crate::sound::SoundSource;

/// A call received by the mock engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `load` with the source locator
    Load(String),
    Start,
    Stop,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<EngineCall>,
    notifier: Option<CompletionNotifier>,
    locator: Option<String>,
    playing: bool,
    fail_load: Option<String>,
    fail_start: Option<String>,
    fail_stop: Option<String>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock media engine
#[derive(Debug)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

/// Observer and remote control for a `MockEngine`
#[derive(Debug, Clone)]
pub struct MockEngineHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    /// Create an engine and the handle that drives it
    pub fn new() -> (Self, MockEngineHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockEngineHandle { state },
        )
    }
}

impl MediaEngine for MockEngine {
    fn load(
        &mut self,
        source: &SoundSource,
        notifier: CompletionNotifier,
    ) -> Result<(), EngineError> {
        let mut state = lock(&self.state);
        state.calls.push(EngineCall::Load(source.locator.clone()));
        state.playing = false;
        if let Some(reason) = state.fail_load.take() {
            state.notifier = None;
            state.locator = None;
            return Err(EngineError::LoadFailed {
                locator: source.locator.clone(),
                reason,
            });
        }
        state.notifier = Some(notifier);
        state.locator = Some(source.locator.clone());
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        let mut state = lock(&self.state);
        state.calls.push(EngineCall::Start);
        if let Some(reason) = state.fail_start.take() {
            return Err(EngineError::StartFailed(reason));
        }
        if state.notifier.is_none() {
            return Err(EngineError::NotLoaded);
        }
        state.playing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        let mut state = lock(&self.state);
        state.calls.push(EngineCall::Stop);
        state.playing = false;
        if let Some(reason) = state.fail_stop.take() {
            return Err(EngineError::StopFailed(reason));
        }
        Ok(())
    }
}

impl MockEngineHandle {
    /// End playback of the current source as if it ran out.
    ///
    /// Returns false when nothing is playing.
    pub fn complete(&self) -> bool {
        let mut state = lock(&self.state);
        if !state.playing {
            return false;
        }
        state.playing = false;
        state
            .notifier
            .as_ref()
            .map(|notifier| notifier.notify())
            .unwrap_or(false)
    }

    /// Fire the completion handler of the current binding regardless of
    /// whether the engine thinks it is playing
    pub fn notify_raw(&self) -> bool {
        let state = lock(&self.state);
        state
            .notifier
            .as_ref()
            .map(|notifier| notifier.notify())
            .unwrap_or(false)
    }

    /// Snapshot of all calls so far
    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.state).calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    pub fn load_count(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::Load(_)))
    }

    pub fn start_count(&self) -> usize {
        self.count(|call| *call == EngineCall::Start)
    }

    pub fn stop_count(&self) -> usize {
        self.count(|call| *call == EngineCall::Stop)
    }

    fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.state).calls.iter().filter(|call| pred(call)).count()
    }

    /// Whether the engine is currently playing
    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    /// Locator of the bound source
    pub fn loaded(&self) -> Option<String> {
        lock(&self.state).locator.clone()
    }

    /// Binding number of the current notifier
    pub fn binding(&self) -> Option<u64> {
        lock(&self.state).notifier.as_ref().map(|n| n.binding())
    }

    /// Make the next `load` fail
    pub fn fail_next_load(&self, reason: impl Into<String>) {
        lock(&self.state).fail_load = Some(reason.into());
    }

    /// Make the next `start` fail
    pub fn fail_next_start(&self, reason: impl Into<String>) {
        lock(&self.state).fail_start = Some(reason.into());
    }

    /// Make the next `stop` fail
    pub fn fail_next_stop(&self, reason: impl Into<String>) {
        lock(&self.state).fail_stop = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Completion;
    use std::sync::mpsc;

    #[test]
    fn test_mock_records_calls() {
        let (mut engine, handle) = MockEngine::new();
        let (tx, _rx) = mpsc::channel();

        engine
            .load(&SoundSource::new("a.ogg"), CompletionNotifier::new(1, tx))
            .unwrap();
        engine.start().unwrap();
        engine.stop().unwrap();

        assert_eq!(
            handle.calls(),
            vec![
                EngineCall::Load("a.ogg".to_string()),
                EngineCall::Start,
                EngineCall::Stop
            ]
        );
        assert_eq!(handle.loaded(), Some("a.ogg".to_string()));
    }

    #[test]
    fn test_complete_fires_notifier_once() {
        let (mut engine, handle) = MockEngine::new();
        let (tx, rx) = mpsc::channel();

        engine
            .load(&SoundSource::new("a.ogg"), CompletionNotifier::new(3, tx))
            .unwrap();
        assert!(!handle.complete());

        engine.start().unwrap();
        assert!(handle.is_playing());
        assert!(handle.complete());
        assert!(!handle.complete());
        assert_eq!(rx.try_recv().unwrap(), Completion { binding: 3 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_start_without_load() {
        let (mut engine, _handle) = MockEngine::new();
        assert_eq!(engine.start(), Err(EngineError::NotLoaded));
    }

    #[test]
    fn test_armed_failures_are_one_shot() {
        let (mut engine, handle) = MockEngine::new();
        let (tx, _rx) = mpsc::channel();
        let source = SoundSource::new("a.ogg");

        handle.fail_next_load("missing");
        let err = engine
            .load(&source, CompletionNotifier::new(1, tx.clone()))
            .unwrap_err();
        assert!(matches!(err, EngineError::LoadFailed { .. }));
        assert_eq!(handle.loaded(), None);

        engine.load(&source, CompletionNotifier::new(2, tx)).unwrap();
        handle.fail_next_start("busy");
        assert!(engine.start().is_err());
        assert!(engine.start().is_ok());

        handle.fail_next_stop("stuck");
        assert!(engine.stop().is_err());
        assert!(!handle.is_playing());
    }
}
