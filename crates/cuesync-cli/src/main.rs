//! cuesync CLI
//!
//! Headless front end for the caption core: parse and validate caption
//! files, resolve the caption at a timestamp, and simulate playback of a
//! bilingual caption pair on a wall-clock media clock.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::time::{sleep_until, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use cuesync_core::core::captions::{
    has_min_dialogue_lines, parse_source, FileSource, SubtitleFormat, TextSource, Timeline,
};
use cuesync_core::core::playback::{resolve_active_cue, MediaClock, PlaybackClock};
use cuesync_core::core::settings::{default_settings_dir, AppSettings, SettingsManager};
use cuesync_core::core::upload::{build_language_table, SubtitleUpload};
use cuesync_core::core::{Language, TimeSec};
use cuesync_core::PlaybackSynchronizer;

/// How often the play loop checks scheduled events and end of media
const CONTROL_POLL: Duration = Duration::from_millis(20);

/// Longest accepted `--resume-after`
const MAX_PAUSE_SECS: f64 = 86_400.0;

/// cuesync main parser
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a caption file and print its cues
    Parse {
        file: PathBuf,
        /// Cue cap (defaults to the configured value)
        #[arg(long)]
        max_cues: Option<usize>,
        /// Print cues as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a file is an accepted caption file with enough dialogue
    Validate {
        file: PathBuf,
        /// MIME type to check alongside the extension
        #[arg(long)]
        mime: Option<String>,
    },

    /// Print the caption shown at a given time
    Resolve {
        file: PathBuf,
        /// Playback position in seconds
        #[arg(long)]
        at: TimeSec,
    },

    /// Simulate playback of a Spanish/English caption pair
    Play(PlayArgs),

    /// Inspect or reset persisted settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Debug)]
struct PlayArgs {
    /// Spanish caption file
    #[arg(long)]
    es: PathBuf,
    /// English caption file
    #[arg(long)]
    en: PathBuf,
    /// Starting language (defaults to the configured or locale language)
    #[arg(long)]
    language: Option<Language>,
    /// Media length in seconds (defaults to the last cue end)
    #[arg(long)]
    duration: Option<TimeSec>,
    /// Switch language at a media time, e.g. `3.5=en`
    #[arg(long = "switch", value_parser = parse_switch)]
    switches: Vec<(TimeSec, Language)>,
    /// Pause at this media time
    #[arg(long)]
    pause_at: Option<TimeSec>,
    /// Seconds to stay paused
    #[arg(long, default_value = "1.0", value_parser = parse_pause_length)]
    resume_after: Duration,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the settings file location
    Path,
    /// Print the effective settings as JSON
    Show,
    /// Delete the settings file
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    let manager = settings_manager(cli.config.as_deref())?;
    let settings = manager.load();

    match cli.command {
        Commands::Parse {
            file,
            max_cues,
            json,
        } => run_parse(&file, max_cues.unwrap_or(settings.captions.max_cues), json),
        Commands::Validate { file, mime } => run_validate(&file, mime.as_deref(), &settings),
        Commands::Resolve { file, at } => run_resolve(&file, at, &settings),
        Commands::Play(args) => run_play(args, &settings).await,
        Commands::Config { command } => run_config(command, &manager),
    }
}

// =============================================================================
// Setup
// =============================================================================

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the stderr logger and, with `log_dir`, a daily rolling file
/// logger. The returned guard must live until exit to flush the file.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "cuesync.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(guard)
}

fn settings_manager(config: Option<&Path>) -> Result<SettingsManager> {
    if let Some(path) = config {
        return Ok(SettingsManager::from_file(path.to_path_buf()));
    }
    let dir = default_settings_dir().context("no platform config directory; pass --config")?;
    Ok(SettingsManager::new(dir))
}

/// User locale from the usual environment variables
fn user_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
}

/// Reads `SECONDS=LANG`
fn parse_switch(value: &str) -> Result<(TimeSec, Language), String> {
    let (at, language) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SECONDS=LANG, got '{}'", value))?;
    let at: TimeSec = at
        .trim()
        .parse()
        .map_err(|_| format!("invalid time '{}'", at))?;
    if !at.is_finite() || at < 0.0 {
        return Err(format!("time out of range: {}", at));
    }
    Ok((at, language.parse()?))
}

/// Reads `--resume-after` seconds into a bounded duration
fn parse_pause_length(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid seconds '{}'", value))?;
    if !secs.is_finite() || !(0.0..=MAX_PAUSE_SECS).contains(&secs) {
        return Err(format!(
            "pause length must be between 0 and {} seconds, got {}",
            MAX_PAUSE_SECS, value
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

// =============================================================================
// Commands
// =============================================================================

fn load_timeline(file: &Path, max_cues: usize) -> Result<Timeline> {
    let source = FileSource::new(file);
    let cues = parse_source(&source, max_cues)
        .with_context(|| format!("parsing {}", file.display()))?;
    Ok(Timeline::new(cues))
}

fn run_parse(file: &Path, max_cues: usize, json: bool) -> Result<()> {
    let timeline = load_timeline(file, max_cues)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    for cue in &timeline {
        println!(
            "{:>3}  {:>9.3} --> {:<9.3}  {}",
            cue.id(),
            cue.start_time(),
            cue.end_time(),
            cue.text()
        );
    }
    eprintln!("{} cue(s)", timeline.len());
    Ok(())
}

fn run_validate(file: &Path, mime: Option<&str>, settings: &AppSettings) -> Result<()> {
    let source = FileSource::new(file);
    let format = SubtitleFormat::detect(source.name(), mime)?;
    let text = source
        .read_text()
        .with_context(|| format!("reading {}", file.display()))?;
    let found = has_min_dialogue_lines(
        source.name(),
        &text,
        format,
        settings.captions.min_dialogue_lines,
    )?;

    println!(
        "{}: ok ({:?}, {} dialogue lines)",
        file.display(),
        format,
        found
    );
    Ok(())
}

fn run_resolve(file: &Path, at: TimeSec, settings: &AppSettings) -> Result<()> {
    let timeline = load_timeline(file, settings.captions.max_cues)?;
    match resolve_active_cue(timeline.cues(), at) {
        Some(cue) => println!("{}", cue.text()),
        None => println!("(no caption)"),
    }
    Ok(())
}

fn run_config(command: ConfigCommands, manager: &SettingsManager) -> Result<()> {
    match command {
        ConfigCommands::Path => println!("{}", manager.settings_path().display()),
        ConfigCommands::Show => {
            let settings = manager.try_load()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommands::Reset => {
            manager.reset()?;
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}

enum PlayEvent {
    Switch(Language),
    Pause,
}

fn schedule(args: &PlayArgs) -> Vec<(TimeSec, PlayEvent)> {
    let mut events: Vec<(TimeSec, PlayEvent)> = args
        .switches
        .iter()
        .map(|&(at, language)| (at, PlayEvent::Switch(language)))
        .collect();
    if let Some(at) = args.pause_at {
        events.push((at, PlayEvent::Pause));
    }
    events.sort_by(|a, b| a.0.total_cmp(&b.0));
    events
}

fn print_caption(time: TimeSec, language: Language, caption: Option<&str>) {
    match caption {
        Some(text) => println!("[{:>8.3}s] {}: {}", time, language, text),
        None => println!("[{:>8.3}s] {}: (no caption)", time, language),
    }
}

async fn run_play(args: PlayArgs, settings: &AppSettings) -> Result<()> {
    let uploads = vec![
        SubtitleUpload::new(Language::Es, FileSource::new(&args.es)),
        SubtitleUpload::new(Language::En, FileSource::new(&args.en)),
    ];
    let table = build_language_table(&uploads, &settings.captions)
        .context("loading caption files")?;

    let language = args.language.unwrap_or_else(|| {
        settings
            .playback
            .initial_language(user_locale().as_deref())
    });
    let duration = args.duration.unwrap_or_else(|| {
        Language::ALL
            .iter()
            .map(|&l| table.timeline(l).end_time())
            .fold(0.0, f64::max)
    });
    if !duration.is_finite() || duration < 0.0 {
        bail!("invalid media duration: {}", duration);
    }

    let clock = Arc::new(MediaClock::new().with_duration(duration));
    let mut sync = PlaybackSynchronizer::new(clock.clone(), language)
        .with_sample_interval(settings.playback.sample_interval());
    sync.load_media(table);

    let mut captions = sync.subscribe();
    let mut events = schedule(&args).into_iter().peekable();
    let mut poll = tokio::time::interval(CONTROL_POLL);
    let mut resume_at: Option<Instant> = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!("Playing {:.3}s of media, captions in {}", duration, language);
    clock.play();
    sync.play()?;

    loop {
        tokio::select! {
            changed = captions.changed() => {
                if changed.is_err() {
                    break;
                }
                let caption = captions.borrow_and_update().clone();
                print_caption(clock.current_time(), sync.language(), caption.as_deref());
            }
            _ = poll.tick() => {
                let now = clock.current_time();
                while let Some((at, event)) = events.next_if(|(at, _)| *at <= now) {
                    match event {
                        PlayEvent::Switch(language) => {
                            if sync.set_language(language) {
                                println!("[{:>8.3}s] switched to {}", at, language);
                            }
                        }
                        PlayEvent::Pause => {
                            clock.pause();
                            sync.pause();
                            resume_at = Some(Instant::now() + args.resume_after);
                            println!(
                                "[{:>8.3}s] paused for {:.3}s",
                                clock.current_time(),
                                args.resume_after.as_secs_f64()
                            );
                        }
                    }
                }

                if clock.is_finished() {
                    sync.end();
                    println!("[{:>8.3}s] ended", duration);
                    break;
                }
            }
            _ = sleep_until(resume_at.unwrap_or_else(Instant::now)), if resume_at.is_some() => {
                resume_at = None;
                clock.play();
                sync.play()?;
                println!("[{:>8.3}s] resumed", clock.current_time());
            }
            _ = &mut ctrl_c => {
                sync.teardown();
                println!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}
