// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sound bank configuration.
//!
//! A sound bank is a YAML file naming the sounds an application uses,
//! where to load them from, and how many times each plays by default.
//! Registering a bank with a multiplexer yields name-to-handle lookups.

pub mod watcher;

pub use watcher::{validate_bank, BankEvent, BankWatcher};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::MediaEngine;
use crate::multiplexer::PlaybackMultiplexer;
use crate::sound::{LoopCount, Sound, SoundId, SoundSource};

/// Root of a sound bank file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoundBank {
    /// Bank-level settings
    #[serde(default)]
    pub bank: BankConfig,
    /// Sound definitions
    #[serde(default)]
    pub sounds: Vec<SoundConfig>,
}

impl SoundBank {
    /// Load a sound bank from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read sound bank: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a sound bank from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse sound bank YAML")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize sound bank to YAML")
    }

    /// Save the bank to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write sound bank: {:?}", path.as_ref()))
    }

    /// Check names and loop counts
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for sound in &self.sounds {
            if sound.name.trim().is_empty() {
                bail!("Sound with source '{}' has an empty name", sound.source);
            }
            if !seen.insert(sound.name.as_str()) {
                bail!("Duplicate sound name '{}'", sound.name);
            }
            if sound.source.trim().is_empty() {
                bail!("Sound '{}' has an empty source", sound.name);
            }
            LoopCount::from_raw(sound.loops)
                .with_context(|| format!("Sound '{}' has an invalid loop count", sound.name))?;
        }
        Ok(())
    }

    /// Look up a sound definition by name
    pub fn sound(&self, name: &str) -> Option<&SoundConfig> {
        self.sounds.iter().find(|s| s.name == name)
    }

    /// Build the source for a sound, applying the bank default duration
    pub fn source_for(&self, sound: &SoundConfig) -> SoundSource {
        let mut source = SoundSource::new(sound.source.clone());
        if let Some(ms) = sound.duration_ms.or(self.bank.default_duration_ms) {
            source = source.with_duration(Duration::from_millis(ms));
        }
        source
    }

    /// Validate the bank and register every sound with `multiplexer`
    pub fn register<E: MediaEngine>(
        &self,
        multiplexer: &mut PlaybackMultiplexer<E>,
    ) -> Result<BankHandles> {
        self.validate()?;
        let mut handles = BankHandles::default();
        for config in &self.sounds {
            let sound = Sound::new(self.source_for(config));
            multiplexer.add(&sound);
            let loops = LoopCount::from_raw(config.loops)?;
            handles.entries.insert(config.name.clone(), (sound, loops));
        }
        Ok(handles)
    }

    /// Apply this bank over sounds registered from an earlier version.
    ///
    /// Sounds are matched by name. An entry whose source is unchanged
    /// keeps its id, along with any playback in progress. Entries whose
    /// source changed are replaced, and names missing from this bank are
    /// removed; the multiplexer stops either one if it was playing. An
    /// invalid bank changes nothing.
    pub fn reload<E: MediaEngine>(
        &self,
        multiplexer: &mut PlaybackMultiplexer<E>,
        previous: &BankHandles,
    ) -> Result<BankHandles> {
        self.validate()?;
        let mut handles = BankHandles::default();
        for config in &self.sounds {
            let source = self.source_for(config);
            let loops = LoopCount::from_raw(config.loops)?;
            let sound = match previous.sound(&config.name) {
                Some(sound) if sound.source() == &source && multiplexer.contains(sound.id()) => {
                    sound.clone()
                }
                Some(stale) => {
                    multiplexer.remove(stale.id());
                    debug!(name = %config.name, "source changed, replacing sound");
                    Sound::new(source)
                }
                None => Sound::new(source),
            };
            multiplexer.add(&sound);
            handles.entries.insert(config.name.clone(), (sound, loops));
        }
        for (name, (sound, _)) in &previous.entries {
            if self.sound(name).is_none() {
                multiplexer.remove(sound.id());
                debug!(name = %name, "dropped from bank");
            }
        }
        info!(bank = %self.bank.name, sounds = handles.len(), "sound bank reloaded");
        Ok(handles)
    }
}

/// Bank-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankConfig {
    /// Bank name
    #[serde(default = "default_bank_name")]
    pub name: String,
    /// Clip length used when a sound gives none
    #[serde(default)]
    pub default_duration_ms: Option<u64>,
}

fn default_bank_name() -> String {
    "Untitled".to_string()
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            name: default_bank_name(),
            default_duration_ms: None,
        }
    }
}

/// A single sound definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoundConfig {
    /// Name used to refer to the sound
    pub name: String,
    /// Locator passed to the engine
    pub source: String,
    /// Clip length in milliseconds, if known
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Default loop count (-1 = infinite)
    #[serde(default = "default_loops")]
    pub loops: i64,
}

fn default_loops() -> i64 {
    1
}

/// Handles produced by registering a bank
#[derive(Debug, Clone, Default)]
pub struct BankHandles {
    entries: HashMap<String, (Sound, LoopCount)>,
}

impl BankHandles {
    /// Sound registered under `name`
    pub fn sound(&self, name: &str) -> Option<&Sound> {
        self.entries.get(name).map(|(sound, _)| sound)
    }

    /// Id of the sound registered under `name`
    pub fn get(&self, name: &str) -> Option<SoundId> {
        self.sound(name).map(Sound::id)
    }

    /// Configured loop count of `name`
    pub fn default_loops(&self, name: &str) -> Option<LoopCount> {
        self.entries.get(name).map(|(_, loops)| *loops)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every sound in these handles from `multiplexer`.
    ///
    /// Returns how many were still registered.
    pub fn unregister<E: MediaEngine>(&self, multiplexer: &mut PlaybackMultiplexer<E>) -> usize {
        self.entries
            .values()
            .filter(|(sound, _)| multiplexer.remove(sound.id()))
            .count()
    }

    /// Play `name` with its configured loop count
    pub fn play<E: MediaEngine>(
        &self,
        multiplexer: &mut PlaybackMultiplexer<E>,
        name: &str,
    ) -> Result<SoundId> {
        let Some((sound, loops)) = self.entries.get(name) else {
            bail!("Unknown sound '{}'", name);
        };
        multiplexer.play(sound.id(), *loops)?;
        Ok(sound.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::sound::PlaybackState;

    const BANK: &str = r#"
bank:
  name: "UI sounds"
  default_duration_ms: 800

sounds:
  - name: click
    source: sounds/click.ogg
    duration_ms: 120

  - name: ambience
    source: sounds/wind.mp3
    loops: -1

  - name: chime
    source: sounds/chime.oga
    loops: 3
"#;

    #[test]
    fn test_parse_bank() {
        let bank = SoundBank::from_yaml(BANK).unwrap();
        assert_eq!(bank.bank.name, "UI sounds");
        assert_eq!(bank.sounds.len(), 3);
        assert_eq!(bank.sounds[0].loops, 1);
        assert_eq!(bank.sounds[1].loops, -1);
        assert_eq!(bank.sound("chime").unwrap().source, "sounds/chime.oga");
        assert!(bank.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let bank = SoundBank::from_yaml("sounds: []").unwrap();
        assert_eq!(bank.bank.name, "Untitled");
        assert_eq!(bank.bank.default_duration_ms, None);
        assert!(bank.sounds.is_empty());
    }

    #[test]
    fn test_source_durations() {
        let bank = SoundBank::from_yaml(BANK).unwrap();
        let click = bank.source_for(bank.sound("click").unwrap());
        let wind = bank.source_for(bank.sound("ambience").unwrap());
        assert_eq!(click.duration, Some(Duration::from_millis(120)));
        assert_eq!(wind.duration, Some(Duration::from_millis(800)));
        assert_eq!(wind.mime_type(), "audio/mp3");
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let yaml = r#"
sounds:
  - name: a
    source: a.ogg
  - name: a
    source: b.ogg
"#;
        let bank = SoundBank::from_yaml(yaml).unwrap();
        let err = bank.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_validate_rejects_bad_loops() {
        let yaml = r#"
sounds:
  - name: a
    source: a.ogg
    loops: -4
"#;
        let bank = SoundBank::from_yaml(yaml).unwrap();
        assert!(bank.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_source() {
        let yaml = r#"
sounds:
  - name: a
    source: ""
"#;
        let bank = SoundBank::from_yaml(yaml).unwrap();
        assert!(bank.validate().is_err());
    }

    #[test]
    fn test_register_and_play() {
        let bank = SoundBank::from_yaml(BANK).unwrap();
        let (engine, handle) = MockEngine::new();
        let mut mux = PlaybackMultiplexer::new(engine);

        let handles = bank.register(&mut mux).unwrap();
        assert_eq!(handles.len(), 3);
        assert_eq!(mux.len(), 3);
        assert_eq!(handles.names(), vec!["ambience", "chime", "click"]);
        assert_eq!(handles.default_loops("ambience"), Some(LoopCount::Infinite));

        let id = handles.play(&mut mux, "chime").unwrap();
        assert_eq!(mux.state(id).unwrap(), PlaybackState::Playing);
        assert_eq!(mux.remaining_loops(id), Some(LoopCount::Finite(3)));
        assert_eq!(handle.loaded(), Some("sounds/chime.oga".to_string()));

        assert!(handles.play(&mut mux, "missing").is_err());
    }

    #[test]
    fn test_round_trip() {
        let original = SoundBank::from_yaml(BANK).unwrap();
        let yaml = original.to_yaml().unwrap();
        let parsed = SoundBank::from_yaml(&yaml).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_reload_keeps_unchanged_sounds() {
        let bank = SoundBank::from_yaml(BANK).unwrap();
        let (engine, handle) = MockEngine::new();
        let mut mux = PlaybackMultiplexer::new(engine);
        let handles = bank.register(&mut mux).unwrap();
        let chime = handles.play(&mut mux, "chime").unwrap();

        let reloaded = bank.reload(&mut mux, &handles).unwrap();

        assert_eq!(mux.len(), 3);
        assert_eq!(reloaded.get("chime"), Some(chime));
        assert_eq!(reloaded.get("click"), handles.get("click"));
        assert_eq!(mux.state(chime).unwrap(), PlaybackState::Playing);
        assert_eq!(mux.active(), Some(chime));
        assert_eq!(handle.stop_count(), 0);
    }

    #[test]
    fn test_reload_replaces_changed_and_drops_missing() {
        let bank = SoundBank::from_yaml(BANK).unwrap();
        let (engine, handle) = MockEngine::new();
        let mut mux = PlaybackMultiplexer::new(engine);
        let handles = bank.register(&mut mux).unwrap();
        let old_chime = handles.play(&mut mux, "chime").unwrap();

        let edited = SoundBank::from_yaml(
            r#"
bank:
  default_duration_ms: 800
sounds:
  - name: click
    source: sounds/click.ogg
    duration_ms: 120
    loops: 2
  - name: chime
    source: sounds/bell.oga
"#,
        )
        .unwrap();
        let reloaded = edited.reload(&mut mux, &handles).unwrap();

        assert_eq!(mux.len(), 2);
        assert_eq!(reloaded.get("click"), handles.get("click"));
        assert_eq!(reloaded.default_loops("click"), Some(LoopCount::Finite(2)));
        assert_ne!(reloaded.get("chime"), Some(old_chime));
        assert!(!mux.contains(old_chime));
        assert!(handles.get("ambience").is_some_and(|id| !mux.contains(id)));
        assert_eq!(reloaded.get("ambience"), None);
        assert_eq!(mux.active(), None);
        assert_eq!(handle.stop_count(), 1);

        reloaded.play(&mut mux, "chime").unwrap();
        assert_eq!(handle.loaded(), Some("sounds/bell.oga".to_string()));
    }

    #[test]
    fn test_reload_invalid_bank_changes_nothing() {
        let bank = SoundBank::from_yaml(BANK).unwrap();
        let (engine, _handle) = MockEngine::new();
        let mut mux = PlaybackMultiplexer::new(engine);
        let handles = bank.register(&mut mux).unwrap();

        let broken = SoundBank::from_yaml("sounds:\n  - name: click\n    source: \"\"\n").unwrap();
        assert!(broken.reload(&mut mux, &handles).is_err());
        assert_eq!(mux.len(), 3);
        assert!(handles.names().iter().all(|n| mux.contains(handles.get(n).unwrap())));
    }

    #[test]
    fn test_unregister() {
        let bank = SoundBank::from_yaml(BANK).unwrap();
        let (engine, handle) = MockEngine::new();
        let mut mux = PlaybackMultiplexer::new(engine);
        let handles = bank.register(&mut mux).unwrap();
        handles.play(&mut mux, "ambience").unwrap();

        assert_eq!(handles.unregister(&mut mux), 3);
        assert!(mux.is_empty());
        assert_eq!(mux.active(), None);
        assert_eq!(handle.stop_count(), 1);
        assert_eq!(handles.unregister(&mut mux), 0);
    }
}
