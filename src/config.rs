//! Configuration file support for i3-spawn-wait.
//!
//! Loads settings from ~/.config/i3-spawn-wait/config.toml if it exists,
//! otherwise uses defaults. Command-line flags override anything set here.

use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub x11: X11Config,
    pub poll: PollConfig,
}

/// X11 integration switches
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct X11Config {
    /// Query mapping state and run the sync barrier after every event
    pub enabled: bool,
    /// Additionally wait for mapped windows to take input focus
    pub focus: bool,
    /// How "does this window have focus" is asked
    pub focus_strategy: FocusStrategy,
    /// Require sync replies to echo our token
    pub strict_sync: bool,
}

/// The two equivalent ways of querying focus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusStrategy {
    /// Compare against _NET_ACTIVE_WINDOW on the root (EWMH)
    #[default]
    ActiveWindow,
    /// Compare against the core-protocol input focus
    InputFocus,
}

/// Focus busy-poll tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Sleep between focus checks, in microseconds
    pub interval_us: u64,
    /// Give up after this many checks; 0 polls forever
    pub max_checks: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_us: 10,
            max_checks: 0,
        }
    }
}

impl Config {
    /// Load config from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("i3-spawn-wait")
            .join("config.toml")
    }

    /// Load config from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::debug!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }
}
