// Difficulty presets and user configuration
// Settings are persisted as TOML in the per-user config directory

use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::ws_board::Board;
use crate::ws_field::{self, FieldError};

/// Difficulty presets and custom settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,                        // 9x9, 10 mines
    Intermediate,                // 16x16, 40 mines
    Hard,                        // 30x16, 99 mines
    Custom(usize, usize, usize), // width, height, mines
}

impl Serialize for Difficulty {
    /// Stored by name; custom dimensions live in their own config fields
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Difficulty, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Difficulty::PRESETS
            .iter()
            .copied()
            .chain(std::iter::once(Difficulty::Custom(0, 0, 0)))
            .find(|d| d.name() == s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown difficulty '{}'", s)))
    }
}

impl Difficulty {
    pub const PRESETS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Intermediate, Difficulty::Hard];

    /// (width, height, mine count)
    pub fn params(&self) -> (usize, usize, usize) {
        match self {
            Difficulty::Easy => (9, 9, 10),
            Difficulty::Intermediate => (16, 16, 40),
            Difficulty::Hard => (30, 16, 99),
            Difficulty::Custom(w, h, n) => (*w, *h, *n),
        }
    }

    /// Stable identifier used in the config file and as the board title
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Hard => "Hard",
            Difficulty::Custom(_, _, _) => "Custom",
        }
    }

    /// Check the parameters without generating anything
    pub fn validate(&self) -> Result<(), FieldError> {
        let (w, h, n) = self.params();
        ws_field::validate(w, h, n)
    }

    /// Start a fresh board for this difficulty
    pub fn new_board(&self) -> Result<Board, FieldError> {
        let (w, h, n) = self.params();
        Board::new(w, h, n)
    }
}

/// User configuration, persisted to disk as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Last difficulty played
    pub difficulty: Difficulty,

    // Custom difficulty parameters (prefill for the custom form)
    pub custom_width: usize,
    pub custom_height: usize,
    pub custom_mines: usize,

    pub theme: String,      // Theme name ("classic" or "ascii")
    pub auto_chord: bool,   // Left click on an open number chords
    pub show_cursor: bool,  // Highlight the keyboard cursor tile
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: Difficulty::Easy,
            custom_width: 24,
            custom_height: 20,
            custom_mines: 90,
            theme: "classic".to_string(),
            auto_chord: true,
            show_cursor: true,
        }
    }
}

impl Config {
    /// Remember a difficulty; custom fields follow a custom choice
    pub fn set_difficulty(&mut self, d: Difficulty) {
        if let Difficulty::Custom(w, h, n) = d {
            self.custom_width = w;
            self.custom_height = h;
            self.custom_mines = n;
        }
        self.difficulty = d;
    }

    /// Parse a config file body, rebuilding custom parameters from their fields
    pub fn from_toml(s: &str) -> Result<Config, toml::de::Error> {
        let mut cfg = toml::from_str::<Config>(s)?;
        if matches!(cfg.difficulty, Difficulty::Custom(_, _, _)) {
            cfg.difficulty = Difficulty::Custom(cfg.custom_width, cfg.custom_height, cfg.custom_mines);
        }
        Ok(cfg)
    }
}

fn project_dir() -> Option<PathBuf> {
    // ProjectDirs::from("com", "wyrmsweeper", exe_name) -> config_dir
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem().and_then(|s| s.to_str())?.to_string();
    match ProjectDirs::from("com", "wyrmsweeper", &name) {
        Some(proj) => Some(proj.config_dir().to_path_buf()),
        None => env::current_dir().ok(),
    }
}

/// Platform config file, e.g. ~/.config/wyrmsweeper/wyrmsweeper.toml on Linux
pub fn config_path() -> Option<PathBuf> {
    let mut path = project_dir()?;
    path.push("wyrmsweeper.toml");
    Some(path)
}

/// Log file written next to the config file
pub fn log_path() -> Option<PathBuf> {
    let mut path = project_dir()?;
    path.push("wyrmsweeper.log");
    Some(path)
}

/// Load the config from disk, writing defaults when missing or unreadable
pub fn load_or_create_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(s) => match Config::from_toml(&s) {
                Ok(cfg) => {
                    info!(path = %path.display(), "loaded config");
                    return cfg;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "invalid config, using defaults"),
            },
            Err(e) => warn!(path = %path.display(), error = %e, "cannot read config"),
        }
    }
    let cfg = Config::default();
    save_config(&cfg);
    cfg
}

/// Save the config to disk; failures are logged and otherwise ignored
pub fn save_config(cfg: &Config) {
    let Some(path) = config_path() else {
        return;
    };
    if let Err(e) = write_config(&path, cfg) {
        warn!(path = %path.display(), error = %e, "cannot save config");
    }
}

fn write_config(path: &Path, cfg: &Config) -> Result<(), Box<dyn Error>> {
    let s = toml::to_string(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, s)?;
    Ok(())
}
