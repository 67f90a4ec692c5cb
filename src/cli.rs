//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::protocol::Axis;

#[derive(Parser, Debug)]
#[command(name = "scopelink")]
#[command(about = "Drive a two-axis telescope mount over its serial link", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: ~/.config/scopelink/config.toml)
    #[arg(short, long, global = true, env = "SCOPELINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Serial port the actuator is attached to
    #[arg(short, long, global = true, env = "SCOPELINK_PORT")]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long, global = true)]
    pub baud: Option<u32>,

    /// Give up on a missing reply after this many milliseconds
    #[arg(long, global = true)]
    pub reply_timeout_ms: Option<u64>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set the speed of one axis (-255..=255, out-of-range values are clamped)
    Set {
        axis: Axis,
        #[arg(allow_negative_numbers = true)]
        speed: i64,
    },

    /// Stop one axis, or both when none is given
    Stop { axis: Option<Axis> },

    /// Run a paced command sequence
    Run {
        /// TOML file with [[sequence]] steps (default: the config's sequence)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Delay between commands in milliseconds
        #[arg(long)]
        pacing_ms: Option<u64>,
    },

    /// Interactive control panel reading commands from stdin
    Console,
}

impl Cli {
    /// Log filter derived from `-v`.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
