// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use anyhow::{anyhow, bail, Context, Result};
use soundmux::config::{validate_bank, BankEvent, BankWatcher};
use soundmux::engine::{MockEngine, TimedEngine};
use soundmux::{
    extension_to_type, LoopCount, MediaEngine, PlaybackMultiplexer, PlaybackState, SoundBank,
    SoundId,
};
use std::env;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Give up on a play request after this long
const PLAY_TIMEOUT: Duration = Duration::from_secs(300);

fn print_usage() {
    println!("SOUNDMUX - Single-slot sound playback multiplexer");
    println!();
    println!("Usage: soundmux [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --bank <FILE> --list               List sounds in a bank");
    println!("  --bank <FILE> --play <NAME> [N]    Play a sound N times (-1 = forever)");
    println!("  --bank <FILE> --watch [--play <NAME>]  Apply bank edits while running");
    println!("  --dry-run                          Complete clips instantly (with --play)");
    println!("  --validate <FILE>                  Check a bank file");
    println!("  --mime <EXT>                       Print the MIME type for an extension");
    println!("  --verbose                          Debug logging");
    println!("  --help                             Show this help message");
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("soundmux=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("soundmux=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Value following `flag`, if the flag is present
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn list_bank(path: &str) -> Result<()> {
    let bank = SoundBank::load(path)?;
    bank.validate()?;
    println!("Bank: {} ({} sounds)", bank.bank.name, bank.sounds.len());
    for sound in &bank.sounds {
        let source = bank.source_for(sound);
        let loops = LoopCount::from_raw(sound.loops)?;
        println!(
            "  {:<16} {:<32} {:<24} loops: {}",
            sound.name,
            source.locator,
            source.mime_type(),
            loops
        );
    }
    Ok(())
}

/// Drive completions until the sound leaves the Playing state.
///
/// Infinite loops run until the process is interrupted.
fn wait_for<E: MediaEngine>(
    mux: &mut PlaybackMultiplexer<E>,
    id: SoundId,
    mut tick: impl FnMut(),
) -> Result<PlaybackState> {
    let bounded = mux.remaining_loops(id).is_some_and(|l| !l.is_infinite());
    let start = Instant::now();
    let mut last_remaining = mux.remaining_loops(id);
    loop {
        tick();
        mux.pump();

        let state = mux.state(id)?;
        if state != PlaybackState::Playing {
            return Ok(state);
        }
        let remaining = mux.remaining_loops(id);
        if remaining != last_remaining {
            if let Some(loops) = remaining {
                println!("  loop done, {} left", loops);
            }
            last_remaining = remaining;
        }
        if bounded && start.elapsed() > PLAY_TIMEOUT {
            bail!("Timed out after {:?}", PLAY_TIMEOUT);
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn play_from_bank(path: &str, name: &str, loops: Option<&str>, dry_run: bool) -> Result<()> {
    let bank = SoundBank::load(path)?;
    let config = bank
        .sound(name)
        .ok_or_else(|| anyhow!("Sound '{}' not found in {}", name, path))?;
    let loops = match loops {
        Some(raw) => {
            let raw: i64 = raw
                .parse()
                .with_context(|| format!("Invalid loop count: {}", raw))?;
            LoopCount::from_raw(raw)?
        }
        None => LoopCount::from_raw(config.loops)?,
    };
    if dry_run && loops.is_infinite() {
        bail!("--dry-run cannot play '{}' forever; pass a loop count", name);
    }
    let source = bank.source_for(config);

    println!(
        "Playing '{}' ({}, {}) {} time(s)...",
        name,
        source.locator,
        source.mime_type(),
        loops
    );

    let final_state = if dry_run {
        let (engine, handle) = MockEngine::new();
        run(engine, &bank, name, loops, move || {
            handle.complete();
        })?
    } else {
        run(timed_engine(&bank), &bank, name, loops, || {})?
    };

    println!("Done: {}", final_state);
    Ok(())
}

fn timed_engine(bank: &SoundBank) -> TimedEngine {
    match bank.bank.default_duration_ms {
        Some(ms) => TimedEngine::with_default_duration(Duration::from_millis(ms)),
        None => TimedEngine::new(),
    }
}

/// Keep a bank registered and apply edits to it until interrupted
fn watch_bank(path: &str, play: Option<&str>) -> Result<()> {
    let bank = validate_bank(path)?;
    let mut mux = PlaybackMultiplexer::new(timed_engine(&bank));
    let mut handles = bank.register(&mut mux)?;
    if let Some(name) = play {
        handles.play(&mut mux, name)?;
        println!("Playing '{}'", name);
    }

    let watcher = BankWatcher::new(path, None)?;
    println!(
        "Watching {} ({} sounds), press Ctrl-C to quit",
        watcher.watched_path().display(),
        handles.len()
    );

    loop {
        match watcher.recv_timeout(Duration::from_millis(100)) {
            Some(BankEvent::Reloaded(_, bank)) => match bank.reload(&mut mux, &handles) {
                Ok(reloaded) => {
                    handles = reloaded;
                    println!("Reloaded: {}", handles.names().join(", "));
                }
                Err(e) => eprintln!("Reload rejected: {:#}", e),
            },
            Some(BankEvent::Error(message)) => eprintln!("{}", message),
            Some(_) | None => {}
        }
        mux.pump();
    }
}

fn run<E: MediaEngine>(
    engine: E,
    bank: &SoundBank,
    name: &str,
    loops: LoopCount,
    tick: impl FnMut(),
) -> Result<PlaybackState> {
    let mut mux = PlaybackMultiplexer::new(engine);
    let handles = bank.register(&mut mux)?;
    let id = handles
        .get(name)
        .ok_or_else(|| anyhow!("Sound '{}' was not registered", name))?;
    mux.play(id, loops)?;
    wait_for(&mut mux, id, tick)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("SOUNDMUX - Single-slot sound playback multiplexer");
        println!("Run with --help for usage information");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help") {
        print_usage();
        return Ok(());
    }

    init_logging(args.iter().any(|a| a == "--verbose"));
    let dry_run = args.iter().any(|a| a == "--dry-run");

    if let Some(ext) = flag_value(&args, "--mime") {
        println!("{}", extension_to_type(ext.trim_start_matches('.')));
        return Ok(());
    }

    if let Some(path) = flag_value(&args, "--validate") {
        let bank = validate_bank(path)?;
        println!("OK: '{}' with {} sounds", bank.bank.name, bank.sounds.len());
        return Ok(());
    }

    let Some(bank_path) = flag_value(&args, "--bank") else {
        eprintln!("Error: unknown option '{}'", args[1]);
        print_usage();
        std::process::exit(1);
    };

    if args.iter().any(|a| a == "--list") {
        return list_bank(bank_path);
    }

    if args.iter().any(|a| a == "--watch") {
        return watch_bank(bank_path, flag_value(&args, "--play"));
    }

    if let Some(name) = flag_value(&args, "--play") {
        let loops = args
            .iter()
            .position(|a| a == "--play")
            .and_then(|i| args.get(i + 2))
            .map(String::as_str)
            .filter(|v| !v.starts_with("--"));
        return play_from_bank(bank_path, name, loops, dry_run);
    }

    eprintln!("Error: --bank requires --list or --play <NAME>");
    std::process::exit(1);
}
