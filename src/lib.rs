// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! soundmux - many named sounds over one media engine.
//!
//! This crate provides:
//! - `PlaybackMultiplexer`, a registry of sounds sharing a single
//!   engine binding, with preemption and loop counting
//! - The `MediaEngine` trait and two engines (mock and timer-driven)
//! - YAML sound banks with hot reload
//! - File extension to MIME type lookup

pub mod config;
pub mod engine;
pub mod error;
pub mod mime;
pub mod multiplexer;
pub mod sound;

pub use config::{BankHandles, SoundBank};
pub use engine::{Completion, CompletionNotifier, EngineError, MediaEngine};
pub use error::{PlaybackError, PlaybackResult};
pub use mime::extension_to_type;
pub use multiplexer::{PlaybackMultiplexer, SharedMultiplexer};
pub use sound::{LoopCount, PlaybackState, Sound, SoundId, SoundSource, INFINITE_LOOPS};
