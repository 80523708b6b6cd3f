mod shared;
mod tui;
mod audio_api;
mod audio;
mod config;
mod error;
mod middle;
mod sequencer;

use std::time::Instant;
use anyhow::Context;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio::bounce;
use audio_api::AudioContext;
use config::LaunchConfig;
use middle::Middle;
use sequencer::events::TraceObserver;
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = LaunchConfig::from_env()?;

    if let Some(out) = &config.bounce {
        init_logging_stderr();
        let (tx, rx) = audio_api::command_channel();
        let mut middle = Middle::new(tx);
        apply_config(&mut middle, &config, &mut bounce::Offline)?;
        let samples = bounce::render(
            &middle.state,
            &rx,
            middle.scheduler().tempo(),
            config.cycles,
            bounce::BOUNCE_SAMPLE_RATE,
        );
        return bounce::export(out, &samples, bounce::BOUNCE_SAMPLE_RATE);
    }

    init_logging_file(&config)?;
    let mut audio = audio::start_audio();
    let mut middle = Middle::new(audio.sender());
    middle.add_observer(Box::new(TraceObserver));
    if let Err(e) = apply_config(&mut middle, &config, &mut audio) {
        // the status line already says what went wrong
        tracing::warn!("launch options partly applied: {e:#}");
    }

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = std::time::Duration::from_millis(16); // ~60fps
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &tui_state);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                middle.stop();
                drop(term);
                drop(audio);
                return Ok(());
            }
            middle.handle_input(event, &mut audio, Instant::now());
        }

        // the scheduler only advances here
        middle.tick(Instant::now());
    }
}

// A melody link goes first, explicit options then override what it set. A bad
// link leaves the defaults in place and the other options still apply; its
// error comes back once they have.
fn apply_config(middle: &mut Middle, config: &LaunchConfig, ctx: &mut dyn AudioContext) -> anyhow::Result<()> {
    let now = Instant::now();
    let loaded = match &config.melody {
        Some(link) => middle.load_share(link, ctx, now).context("could not load melody"),
        None => Ok(()),
    };
    if let Some(scale) = config.scale {
        middle.set_scale(scale);
    }
    if let Some(tempo) = config.tempo {
        middle.set_tempo(tempo, ctx, now);
    }
    if let Some(base) = &config.share_base {
        middle.set_share_base(base.as_str());
    }
    if let Some(name) = &config.instrument {
        // unknown names keep the current voice; the warning is already logged
        let _ = middle.set_instrument_named(name);
    }
    loaded
}

// the terminal belongs to the tui, so logs go to a file
fn init_logging_file(config: &LaunchConfig) -> anyhow::Result<()> {
    let path = config.log_path();
    let file = std::fs::File::create(&path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
