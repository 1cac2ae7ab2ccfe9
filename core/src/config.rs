//! Configuration management (~/.config/Lockstep/config.toml)
//!
//! Handles loading, saving, and providing defaults for lockstep settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::sync::{SkipCarry, WaitStrategy};

/// Errors produced while loading, saving, or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Sample rate of zero
    #[error("sample rate must be positive")]
    ZeroSampleRate,

    /// Tick rate of zero
    #[error("tick rate must be positive")]
    ZeroTickRate,

    /// Fewer than one sample per tick
    #[error("tick rate {tick_rate} Hz exceeds sample rate {sample_rate} Hz")]
    TickRateTooHigh { sample_rate: u32, tick_rate: u32 },

    /// Config file could not be read or written
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`Config`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration.
///
/// Serialized to/from TOML format for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Clock and gate settings
    #[serde(default)]
    pub sync: SyncConfig,
    /// Output and test signal settings
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Clock and gate configuration.
///
/// `sample_rate / tick_rate` is the number of samples that correspond to
/// exactly one simulation tick. It is computed once when a processor is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Audio sample rate in Hz (default: 48000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Simulation tick rate in Hz (default: 60)
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// How a held audio thread waits for the simulation (default: spin)
    #[serde(default)]
    pub wait: WaitStrategy,
    /// What happens to the triggering block's samples on a catch-up skip (default: drop)
    #[serde(default)]
    pub skip_carry: SkipCarry,
    /// Install the processor bypassed; lockstep is enabled later (default: false)
    #[serde(default)]
    pub start_bypassed: bool,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Channels produced by the simulation (default: 2)
    #[serde(default = "default_source_channels")]
    pub source_channels: u16,
    /// Fixed device buffer size in frames; device default when unset
    #[serde(default)]
    pub buffer_frames: Option<u32>,
    /// Test tone frequency in Hz (default: 440)
    #[serde(default = "default_tone_hz")]
    pub tone_hz: f32,
    /// Test tone volume (default: 0.2, range: 0.0-1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Ring buffer capacity between simulation and audio, in ticks (default: 8)
    #[serde(default = "default_ring_ticks")]
    pub ring_ticks: u32,
}

fn default_sample_rate() -> u32 {
    48_000
}
fn default_tick_rate() -> u32 {
    60
}
fn default_source_channels() -> u16 {
    2
}
fn default_tone_hz() -> f32 {
    440.0
}
fn default_volume() -> f32 {
    0.2
}
fn default_ring_ticks() -> u32 {
    8
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            tick_rate: default_tick_rate(),
            wait: WaitStrategy::default(),
            skip_carry: SkipCarry::default(),
            start_bypassed: false,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            source_channels: default_source_channels(),
            buffer_frames: None,
            tone_hz: default_tone_hz(),
            volume: default_volume(),
            ring_ticks: default_ring_ticks(),
        }
    }
}

impl SyncConfig {
    /// Check that the rates describe at least one sample per tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.tick_rate > self.sample_rate {
            return Err(ConfigError::TickRateTooHigh {
                sample_rate: self.sample_rate,
                tick_rate: self.tick_rate,
            });
        }
        Ok(())
    }

    /// Ideal number of samples per tick, rounded down.
    ///
    /// A rate pair that does not divide evenly loses the remainder every tick;
    /// a warning reports how many samples per second that amounts to.
    pub fn target_samples_per_tick(&self) -> Result<u64, ConfigError> {
        self.validate()?;
        let target = u64::from(self.sample_rate / self.tick_rate);
        let remainder = self.sample_rate % self.tick_rate;
        if remainder != 0 {
            warn!(
                "{} Hz / {} Hz is not a whole number of samples per tick; \
                 using {} (drifts {} samples/s)",
                self.sample_rate, self.tick_rate, target, remainder
            );
        }
        Ok(target)
    }

    /// Same settings at a different sample rate (e.g. the device's real rate).
    pub fn with_sample_rate(&self, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..self.clone()
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Lockstep\config`
/// On macOS: `~/Library/Application Support/io.lockstep.Lockstep`
/// On Linux: `~/.config/Lockstep`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.lockstep", "", "Lockstep")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Reads `config.toml` from the platform's configuration directory.
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_dir()
        .map(|dir| load_or_default(&dir.join("config.toml")))
        .unwrap_or_default()
}

/// Loads `path`, falling back to defaults.
///
/// A missing file is silent; any other failure is logged.
fn load_or_default(path: &Path) -> Config {
    match load_from(path) {
        Ok(config) => config,
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Config::default()
        }
        Err(e) => {
            warn!("Ignoring {}: {}; using defaults", path.display(), e);
            Config::default()
        }
    }
}

/// Loads the configuration from an explicit file.
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Saves the configuration to the platform's configuration directory.
///
/// Creates the directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(&dir).map_err(|source| ConfigError::Io {
            path: dir.clone(),
            source,
        })?;
        save_to(config, &dir.join("config.toml"))?;
    }
    Ok(())
}

/// Saves the configuration to an explicit file.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================================
    // Default value tests
    // =============================================================

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.sync.sample_rate, 48_000);
        assert_eq!(config.sync.tick_rate, 60);
        assert_eq!(config.sync.wait, WaitStrategy::Spin);
        assert_eq!(config.sync.skip_carry, SkipCarry::Drop);
        assert!(!config.sync.start_bypassed);
        assert_eq!(config.audio.source_channels, 2);
        assert!(config.audio.buffer_frames.is_none());
        assert!((config.audio.volume - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_default_target_is_800() {
        assert_eq!(SyncConfig::default().target_samples_per_tick().unwrap(), 800);
    }

    // =============================================================
    // Validation tests
    // =============================================================

    #[test]
    fn test_zero_rates_rejected() {
        let config = SyncConfig {
            sample_rate: 0,
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSampleRate)));

        let config = SyncConfig {
            tick_rate: 0,
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTickRate)));
    }

    #[test]
    fn test_tick_rate_above_sample_rate_rejected() {
        let config = SyncConfig {
            sample_rate: 30,
            tick_rate: 60,
            ..SyncConfig::default()
        };
        assert!(matches!(
            config.target_samples_per_tick(),
            Err(ConfigError::TickRateTooHigh { .. })
        ));
    }

    #[test]
    fn test_non_divisible_target_rounds_down() {
        let config = SyncConfig {
            sample_rate: 48_000,
            tick_rate: 144,
            ..SyncConfig::default()
        };
        assert_eq!(config.target_samples_per_tick().unwrap(), 333);
    }

    #[test]
    fn test_with_sample_rate_keeps_other_fields() {
        let config = SyncConfig {
            wait: WaitStrategy::Condvar,
            ..SyncConfig::default()
        };
        let moved = config.with_sample_rate(44_100);
        assert_eq!(moved.sample_rate, 44_100);
        assert_eq!(moved.wait, WaitStrategy::Condvar);
        assert_eq!(moved.target_samples_per_tick().unwrap(), 735);
    }

    // =============================================================
    // TOML serialization tests
    // =============================================================

    #[test]
    fn test_config_partial_toml_uses_defaults() {
        let toml_str = r#"
            [sync]
            tick_rate = 50
            wait = "condvar"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sync.sample_rate, 48_000);
        assert_eq!(config.sync.tick_rate, 50);
        assert_eq!(config.sync.wait, WaitStrategy::Condvar);
        assert_eq!(config.audio, AudioConfig::default());
    }

    #[test]
    fn test_config_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_to_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.sync.skip_carry = SkipCarry::Carry;
        config.audio.buffer_frames = Some(256);

        save_to(&config, &path).unwrap();
        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_from(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_from_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[sync]\ntick_rate = \"sixty\"\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_or_default_falls_back_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\ntick_rate = \"sixty\"\n").unwrap();
        assert_eq!(load_or_default(&path), Config::default());
    }

    #[test]
    fn test_load_or_default_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_or_default(&dir.path().join("config.toml")),
            Config::default()
        );
    }

    #[test]
    fn test_load_or_default_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\ntick_rate = 50\n").unwrap();
        assert_eq!(load_or_default(&path).sync.tick_rate, 50);
    }
}
