//! blocktui — classic falling-block puzzle game in the terminal.

mod app;
mod driver;
mod engine;
mod grid;
mod input;
mod piece;
mod render;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Gravity period.
const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Board and timing options for one game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub columns: usize,
    /// Pixels per grid cell handed to the renderer.
    pub block_size: u32,
    pub tick_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            columns: 10,
            block_size: render::BLOCK_SIZE,
            tick_interval: TICK_INTERVAL,
        }
    }
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            rows: usize::from(args.rows),
            columns: usize::from(args.columns),
            ..Self::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_else(|e| {
        warn!("theme not loaded ({e}), using defaults");
        theme::Theme::default()
    });
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let config = GameConfig::from(&args);
    info!("starting {}x{} board, seed {:?}", config.columns, config.rows, args.seed);

    let mut app = App::new(config, theme, rng);
    app.run()?;
    Ok(())
}

/// Log to a file when asked; the terminal belongs to the game. Filter via RUST_LOG.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blocktui",
    version,
    about = "Falling-block puzzle in the terminal. Fill a row edge to edge to clear it.",
    long_about = "blocktui is a terminal falling-block puzzle.\n\n\
        Pieces fall one row every half second. Complete a row to clear it for 100 points.\n\n\
        CONTROLS:\n  Left/Right  Move    Up   Rotate    Down  Move down    Q / Esc  Quit"
)]
pub struct Args {
    /// Playfield height in rows (grid cells).
    #[arg(long, default_value_t = 20, value_name = "ROWS",
          value_parser = clap::value_parser!(u16).range(4..=200))]
    pub rows: u16,

    /// Playfield width in columns (grid cells).
    #[arg(long, default_value_t = 10, value_name = "COLS",
          value_parser = clap::value_parser!(u16).range(4..=100))]
    pub columns: u16,

    /// Path to theme file (btop-style theme[key]="value"). Built-in colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Seed for the piece sequence; random when omitted.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}
