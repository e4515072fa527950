// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sound handles, sources and per-sound playback state.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{PlaybackError, PlaybackResult};
use crate::mime;

/// Raw loop count meaning "repeat until stopped"
pub const INFINITE_LOOPS: i64 = -1;

static NEXT_SOUND_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque sound identity, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(u64);

impl SoundId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        SoundId(NEXT_SOUND_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the engine should load for a sound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundSource {
    /// Resource locator (file path or URL)
    pub locator: String,
    /// Clip length, if known
    pub duration: Option<Duration>,
}

impl SoundSource {
    /// Create a source with unknown duration
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            duration: None,
        }
    }

    /// Set the clip length hint
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Extension of the locator, without the dot
    pub fn extension(&self) -> Option<&str> {
        let path = self.locator.split(['?', '#']).next().unwrap_or_default();
        Path::new(path).extension().and_then(|ext| ext.to_str())
    }

    /// MIME type advertised for this source
    pub fn mime_type(&self) -> &'static str {
        self.extension()
            .map(mime::extension_to_type)
            .unwrap_or(mime::DEFAULT_MIME_TYPE)
    }
}

/// Client-side handle to a playable sound.
///
/// Clones share the identity, so adding a clone to a multiplexer that
/// already knows the original is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    id: SoundId,
    source: SoundSource,
}

impl Sound {
    /// Create a sound with a new identity
    pub fn new(source: SoundSource) -> Self {
        Self {
            id: SoundId::next(),
            source,
        }
    }

    /// Shorthand for a sound with just a locator
    pub fn from_locator(locator: impl Into<String>) -> Self {
        Self::new(SoundSource::new(locator))
    }

    pub fn id(&self) -> SoundId {
        self.id
    }

    pub fn source(&self) -> &SoundSource {
        &self.source
    }
}

impl From<&Sound> for SoundId {
    fn from(sound: &Sound) -> Self {
        sound.id
    }
}

/// Playback state of a registered sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Registered, never played, or interrupted
    #[default]
    Idle,
    /// Bound to the engine
    Playing,
    /// Completed its requested loop count
    Finished,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Number of times a sound should play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    /// Play this many times in total; zero finishes without playing
    Finite(u32),
    /// Repeat until stopped or preempted
    Infinite,
}

impl LoopCount {
    /// Parse an integer loop count, where `INFINITE_LOOPS` means infinite
    pub fn from_raw(loops: i64) -> PlaybackResult<Self> {
        match loops {
            INFINITE_LOOPS => Ok(LoopCount::Infinite),
            n if n < 0 => Err(PlaybackError::InvalidLoopCount(n)),
            n => u32::try_from(n)
                .map(LoopCount::Finite)
                .map_err(|_| PlaybackError::InvalidLoopCount(n)),
        }
    }

    /// Integer form, the inverse of `from_raw`
    pub fn as_raw(&self) -> i64 {
        match self {
            LoopCount::Finite(n) => *n as i64,
            LoopCount::Infinite => INFINITE_LOOPS,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, LoopCount::Infinite)
    }
}

impl Default for LoopCount {
    fn default() -> Self {
        LoopCount::Finite(1)
    }
}

impl fmt::Display for LoopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopCount::Finite(n) => write!(f, "{}", n),
            LoopCount::Infinite => f.write_str("infinite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_ids_are_unique() {
        let a = Sound::from_locator("a.ogg");
        let b = Sound::from_locator("a.ogg");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_loop_count_from_raw() {
        assert_eq!(LoopCount::from_raw(0).unwrap(), LoopCount::Finite(0));
        assert_eq!(LoopCount::from_raw(3).unwrap(), LoopCount::Finite(3));
        assert_eq!(LoopCount::from_raw(INFINITE_LOOPS).unwrap(), LoopCount::Infinite);
        assert!(matches!(
            LoopCount::from_raw(-2),
            Err(PlaybackError::InvalidLoopCount(-2))
        ));
        assert!(LoopCount::from_raw(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_loop_count_as_raw() {
        assert_eq!(LoopCount::Infinite.as_raw(), -1);
        assert_eq!(LoopCount::Finite(4).as_raw(), 4);
        assert_eq!(LoopCount::default(), LoopCount::Finite(1));
    }

    #[test]
    fn test_source_mime_type() {
        assert_eq!(SoundSource::new("sounds/click.ogg").mime_type(), "audio/ogg");
        assert_eq!(
            SoundSource::new("http://host/theme.mp3?v=2").mime_type(),
            "audio/mp3"
        );
        assert_eq!(SoundSource::new("beep.wav").mime_type(), "application/octet-stream");
        assert_eq!(SoundSource::new("noext").extension(), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
        assert_eq!(PlaybackState::Finished.to_string(), "finished");
        assert_eq!(LoopCount::Infinite.to_string(), "infinite");
    }
}
