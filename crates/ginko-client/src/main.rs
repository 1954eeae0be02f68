// Terminal front-end for playing 5x5 shogi against a USI engine

mod input;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use ginko_client::{Client, ClientConfig};
use ginko_core::types::Color;

use input::spawn_stdin_reader;
use render::TerminalObserver;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ./ginko.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Engine binary; overrides [engine].path
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Extra argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Directory searched for engine/target/{debug,release}/engine
    #[arg(long)]
    root: Option<PathBuf>,

    /// Color you play: b or w
    #[arg(long, value_parser = parse_color)]
    human: Option<Color>,

    /// Let the engine play both sides
    #[arg(long)]
    auto: bool,

    /// Search depth sent with `go`
    #[arg(long)]
    depth: Option<u32>,

    /// Randomness sent with `go`
    #[arg(long)]
    randomness: Option<u32>,

    /// Pause before each engine move in auto-play mode (milliseconds)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Print notifications as JSON lines
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn parse_color(s: &str) -> Result<Color, String> {
    Color::from_sfen(s).ok_or_else(|| format!("expected `b` or `w`, got {s:?}"))
}

fn main() {
    let args = Args::parse();

    use std::io::Write;
    let log_level = if args.debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    );
    builder
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
        })
        .write_style(env_logger::WriteStyle::Never)
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run(args) {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = ClientConfig::load_or_default(args.config.as_deref())?;
    if let Some(engine) = args.engine {
        config.engine.path = Some(engine);
    }
    if !args.engine_args.is_empty() {
        config.engine.args = args.engine_args;
    }

    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let engine = config.engine_config(&root);

    let mut settings = config.play_settings();
    if let Some(color) = args.human {
        settings.human_color = color;
    }
    if args.auto {
        settings.auto_play = true;
    }
    if let Some(depth) = args.depth {
        settings.set_depth(depth);
    }
    if let Some(randomness) = args.randomness {
        settings.set_randomness(randomness);
    }
    if let Some(ms) = args.delay_ms {
        settings.set_turn_delay(Duration::from_millis(ms));
    }

    log::info!("engine: {}", engine.path.display());
    let (client, handle) = Client::new(engine, settings, TerminalObserver::new(args.json));

    let ctrlc_handle = handle.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        ctrlc_handle.shutdown();
    }) {
        log::warn!("failed to install Ctrl-C handler: {e}");
    }
    // 読み取りスレッドは stdin を待ち続けるので join しない
    let _reader = spawn_stdin_reader(handle);

    client.run().context("engine session failed")?;
    Ok(())
}
