use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use toml_edit::{DocumentMut, Item, Table};

use crate::synth::SynthOptions;
use crate::util::paths::{config_path, default_tape_path};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Keys accepted by [`save_setting`].
pub const SETTING_KEYS: &[&str] = &["synth.indent", "synth.line_width", "tape.path"];

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Layout of synthesized tests
    pub synth: SynthOptions,
    /// Tape recorded by default and read when `--tape` is omitted
    pub tape_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            synth: SynthOptions::default(),
            tape_path: default_tape_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlSynthConfig {
    pub indent: Option<usize>,
    pub line_width: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlTapeConfig {
    pub path: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Synthesized test layout
    pub synth: Option<TomlSynthConfig>,
    /// Tape location
    pub tape: Option<TomlTapeConfig>,
}

impl Config {
    /// Loads `~/.statelens/config.toml`, writing the example config there on
    /// first run. Unreadable or invalid files fall back to defaults.
    pub fn load() -> Self {
        let config_file = config_path();
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }
        Self::load_from(&config_file)
    }

    /// Loads the config at `path`, merging it over the defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "No config file; using defaults");
                return Self::default();
            }
        };

        match toml::from_str::<TomlConfig>(&contents) {
            Ok(toml_config) => Self::default().merged(toml_config),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Invalid config file; using defaults");
                Self::default()
            }
        }
    }

    /// Applies every value set in `toml_config` over `self`.
    pub fn merged(mut self, toml_config: TomlConfig) -> Self {
        if let Some(synth) = toml_config.synth {
            if let Some(indent) = synth.indent {
                self.synth.indent = indent;
            }
            if let Some(line_width) = synth.line_width {
                self.synth.line_width = line_width;
            }
        }

        if let Some(path) = toml_config.tape.and_then(|tape| tape.path) {
            self.tape_path = path;
        }

        self
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                tracing::warn!(error = %err, "Failed to create config directory");
                return;
            }
        }

        if let Err(err) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %err, "Failed to write default config");
        }
    }
}

/// Sets `key` (e.g. `synth.indent`) to `value` in the config file at `path`,
/// preserving all other content.
pub fn save_setting(path: &Path, key: &str, value: &str) -> std::io::Result<()> {
    let invalid = |msg: String| std::io::Error::new(std::io::ErrorKind::InvalidInput, msg);

    let (section, field) = key
        .split_once('.')
        .filter(|_| SETTING_KEYS.contains(&key))
        .ok_or_else(|| invalid(format!("unknown setting '{key}'")))?;

    let item = match field {
        "indent" | "line_width" => {
            let number: i64 = value
                .parse()
                .map_err(|_| invalid(format!("'{key}' expects a number, got '{value}'")))?;
            if number < 0 {
                return Err(invalid(format!("'{key}' must not be negative")));
            }
            toml_edit::value(number)
        }
        _ => toml_edit::value(value),
    };

    let contents = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = contents
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    if !doc.contains_key(section) {
        doc[section] = Item::Table(Table::new());
    }
    doc[section][field] = item;

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, doc.to_string())
}
