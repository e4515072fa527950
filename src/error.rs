// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the playback multiplexer.

use thiserror::Error;

use crate::engine::EngineError;
use crate::sound::SoundId;

/// Playback error types
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Sound was never added, or has already been removed
    #[error("Sound {0} is not registered")]
    UnregisteredSound(SoundId),

    /// Loop count is negative and not the infinite sentinel
    #[error("Invalid loop count: {0} (expected >= 0 or -1 for infinite)")]
    InvalidLoopCount(i64),

    /// The media engine rejected a load, start or stop request
    #[error("Playback engine error: {0}")]
    Engine(#[from] EngineError),

    /// Shared multiplexer lock was poisoned by a panicking holder
    #[error("Failed to acquire multiplexer lock")]
    LockPoisoned,
}

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;
