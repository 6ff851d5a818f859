//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::state::TimerDefaults;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "focus-timer")]
#[command(about = "A Pomodoro-style focus timer server with persisted work sessions")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// SQLite database file
    #[arg(short, long, default_value = "focus-timer.db")]
    pub database: PathBuf,

    /// Work interval length in minutes for new accounts
    #[arg(long, default_value = "25", value_parser = clap::value_parser!(u32).range(1..))]
    pub default_interval: u32,

    /// Break length in seconds
    #[arg(short, long, default_value = "300", value_parser = clap::value_parser!(u32).range(1..))]
    pub break_seconds: u32,

    /// Tick period in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_millis: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn timer_defaults(&self) -> TimerDefaults {
        TimerDefaults {
            interval_minutes: self.default_interval,
            break_seconds: self.break_seconds,
            tick_period: Duration::from_millis(self.tick_millis),
        }
    }
}
