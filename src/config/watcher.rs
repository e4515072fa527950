// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for hot-reloading sound banks.
//!
//! Watches a bank file (or a directory of banks) and emits `BankEvent`s
//! when files change. Hosts pass a reloaded bank to `SoundBank::reload`
//! to update registered sounds without restarting playback.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::SoundBank;

/// Events emitted by the bank watcher
#[derive(Debug, Clone)]
pub enum BankEvent {
    /// A bank file changed and parsed and validated cleanly
    Reloaded(PathBuf, Box<SoundBank>),
    /// A bank file changed but could not be loaded
    Error(String),
    /// A file was created in the watch directory
    FileCreated(PathBuf),
    /// A file was deleted from the watch directory
    FileDeleted(PathBuf),
}

/// Sound bank watcher with debouncing and validation
pub struct BankWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<BankEvent>,
    watched_path: PathBuf,
}

fn is_bank_file(path: &Path, watched: &Path) -> bool {
    match path.extension() {
        Some(ext) => ext == "yaml" || ext == "yml",
        None => path == watched,
    }
}

fn reload(path: PathBuf) -> BankEvent {
    match validate_bank(&path) {
        Ok(bank) => {
            debug!(path = ?path, sounds = bank.sounds.len(), "sound bank reloaded");
            BankEvent::Reloaded(path, Box::new(bank))
        }
        Err(e) => {
            warn!(path = ?path, error = %e, "sound bank reload failed");
            BankEvent::Error(format!("Failed to load {:?}: {:#}", path, e))
        }
    }
}

impl BankWatcher {
    /// Create a new watcher for the specified path
    ///
    /// # Arguments
    /// * `path` - Bank file or directory to watch
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 500)
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(500));

        let (event_tx, event_rx): (Sender<BankEvent>, Receiver<BankEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        let mode = if watched_path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&watched_path, mode)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", watched_path, e))?;

        let debounced_path = watched_path.clone();
        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;
            let mut pending_paths: Vec<PathBuf> = Vec::new();

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(event) => match event.kind {
                        EventKind::Create(_) => {
                            for path in event.paths {
                                let _ = event_tx.send(BankEvent::FileCreated(path));
                            }
                        }
                        EventKind::Remove(_) => {
                            for path in event.paths {
                                let _ = event_tx.send(BankEvent::FileDeleted(path));
                            }
                        }
                        EventKind::Modify(_) => {
                            for path in event.paths {
                                if !pending_paths.contains(&path) {
                                    pending_paths.push(path);
                                }
                            }
                            last_event_time = Some(Instant::now());
                        }
                        _ => {}
                    },
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let settled = last_event_time
                            .is_some_and(|last| last.elapsed() >= debounce_duration);
                        if settled {
                            for path in pending_paths.drain(..) {
                                if is_bank_file(&path, &debounced_path) {
                                    let _ = event_tx.send(reload(path));
                                }
                            }
                            last_event_time = None;
                        }
                    }
                    // Watcher was dropped
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next bank event (non-blocking)
    pub fn try_recv(&self) -> Option<BankEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending bank events
    pub fn recv_all(&self) -> Vec<BankEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Block until the next bank event is received
    pub fn recv(&self) -> Option<BankEvent> {
        self.event_receiver.recv().ok()
    }

    /// Wait up to `timeout` for the next bank event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<BankEvent> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

/// Load and validate a bank without registering it
pub fn validate_bank<P: AsRef<Path>>(path: P) -> Result<SoundBank> {
    let bank = SoundBank::load(path)?;
    bank.validate()?;
    Ok(bank)
}
