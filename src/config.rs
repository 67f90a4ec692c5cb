//! Link configuration.
//!
//! Loaded from `~/.config/scopelink/config.toml` (or `--config`), then
//! overridden by command-line flags.
//!
//! ```toml
//! port = "/dev/ttyACM0"
//! baud_rate = 9600
//! pacing_ms = 2000
//!
//! # rad/min per speed step
//! [calibration]
//! ra = 0.000136
//!
//! [[sequence]]
//! axis = "DEC"
//! speed = -255
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mount::Calibration;
use crate::protocol::{speed, Axis, Command};
use crate::session::{SessionOptions, DEFAULT_PACING, READY_PHRASE};
use crate::transport::{is_supported_baud_rate, BAUD_RATES};

pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// One step of a configured sequence. Speeds are clamped when the sequence
/// is built, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SequenceStep {
    pub axis: Axis,
    pub speed: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub port: String,
    pub baud_rate: u32,
    pub ready_phrase: String,
    pub pacing_ms: u64,
    /// Give up waiting for the ready banner after this long. Unset waits forever.
    pub ready_timeout_ms: Option<u64>,
    /// Give up waiting for a reply after this long. Unset waits forever.
    pub reply_timeout_ms: Option<u64>,
    pub calibration: Calibration,
    pub sequence: Vec<SequenceStep>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            ready_phrase: READY_PHRASE.to_string(),
            pacing_ms: DEFAULT_PACING.as_millis() as u64,
            ready_timeout_ms: None,
            reply_timeout_ms: None,
            calibration: Calibration::default(),
            sequence: Vec::new(),
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scopelink").join("config.toml"))
    }

    /// Parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "Loading config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            anyhow::bail!("Serial port must not be empty");
        }
        if !is_supported_baud_rate(self.baud_rate) {
            anyhow::bail!(
                "Unsupported baud rate {} (expected one of {:?})",
                self.baud_rate,
                BAUD_RATES
            );
        }
        if self.ready_phrase.is_empty() {
            anyhow::bail!("Ready phrase must not be empty");
        }
        for axis in Axis::ALL {
            if let Some(cal) = self.calibration.get(axis) {
                if !cal.is_finite() {
                    anyhow::bail!("{axis} calibration must be a finite number, got {cal}");
                }
            }
        }
        Ok(())
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            ready_phrase: self.ready_phrase.clone(),
            ready_timeout: self.ready_timeout_ms.map(Duration::from_millis),
            reply_timeout: self.reply_timeout_ms.map(Duration::from_millis),
            ..Default::default()
        }
    }

    /// Configured sequence as commands, clamping out-of-range speeds.
    pub fn commands(&self) -> Vec<Command> {
        self.sequence
            .iter()
            .map(|step| Command::from_clamped(step.axis, speed::clamp(step.speed)))
            .collect()
    }
}

/// Steps loaded from a standalone sequence file (`[[sequence]]` tables only).
pub fn load_sequence(path: &Path) -> Result<Vec<Command>> {
    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct SequenceFile {
        sequence: Vec<SequenceStep>,
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sequence {}", path.display()))?;
    let file: SequenceFile = toml::from_str(&text)
        .with_context(|| format!("Failed to parse sequence {}", path.display()))?;

    Ok(file
        .sequence
        .into_iter()
        .map(|step| Command::from_clamped(step.axis, speed::clamp(step.speed)))
        .collect())
}

/// Sequence used when none is configured: drive both axes full reverse,
/// then stop them.
pub fn bench_sequence() -> Vec<Command> {
    [
        (Axis::Declination, -255),
        (Axis::RightAscension, -255),
        (Axis::RightAscension, 0),
        (Axis::Declination, 0),
    ]
    .into_iter()
    .map(|(axis, speed)| Command::from_clamped(axis, speed::clamp(speed)))
    .collect()
}
