// Entry point for the Wyrmsweeper terminal game
// Sets up logging and configuration, then hands over to the UI loop

use std::error::Error;
use std::fs::{self, File};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Module declarations
mod ws_board;  // Reveal/flag/chord logic and win/loss state
mod ws_field;  // Mine field generation
mod ws_game;   // Difficulty presets and configuration
mod ws_screen; // Screen flow, custom form and camera
mod ws_theme;  // Visual themes
mod ws_ui;     // Terminal rendering and event handling

use ws_game::{load_or_create_config, log_path};
use ws_ui::run as run_ui;

/// Log to a file when WYRMSWEEPER_LOG is set (e.g. `WYRMSWEEPER_LOG=debug`).
/// The terminal belongs to the UI, so nothing is ever written to stdout.
fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_env("WYRMSWEEPER_LOG") else {
        return;
    };
    let Some(path) = log_path() else {
        return;
    };
    // No subscriber exists yet and the UI has not taken the screen, so report on stderr
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("logging disabled: cannot create {}: {}", parent.display(), e);
            return;
        }
    }
    match File::create(&path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(e) => eprintln!("logging disabled: cannot create {}: {}", path.display(), e),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "starting wyrmsweeper");

    // Load or create user configuration (difficulty, theme, preferences)
    let mut cfg = load_or_create_config();

    // Launch the main UI loop
    run_ui(&mut cfg)
}
