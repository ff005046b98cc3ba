//! Tail session configuration
//!
//! [`TailConfig`] is resolved once at startup and read-only afterwards. The
//! lookback window is turned into an absolute start instant at resolution
//! time so every fetch in the session agrees on it.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static DURATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[smhd]$").expect("valid duration regex"));

/// How events are written to standard output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Formatted, coloured lines with the interactive filter when tailing
    Pretty,
    /// One JSON object per event, no overlay
    Json,
}

/// Fully resolved tail configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailConfig {
    /// Log group to read
    pub log_group_name: String,
    /// CloudWatch filter pattern forwarded to every query
    pub filter_pattern: Option<String>,
    /// Pause between polls in continuous mode
    pub poll_interval: Duration,
    /// Lookback window as given
    pub lookback: Duration,
    /// Absolute start of the initial fetch (Unix milliseconds)
    pub start_time_ms: i64,
    /// Keep polling after the initial fetch
    pub follow: bool,
    /// Region override for the AWS default chain
    pub region: Option<String>,
    /// Shared config profile override for the AWS default chain
    pub profile: Option<String>,
    pub output: OutputMode,
    /// Emit ANSI styling
    pub color: bool,
}

impl TailConfig {
    /// Whether this session can take keystrokes for the live filter, given
    /// whether stdin and stdout are attached to a terminal.
    pub fn wants_interactive_filter(&self, stdin_is_tty: bool, stdout_is_tty: bool) -> bool {
        self.follow && self.output == OutputMode::Pretty && stdin_is_tty && stdout_is_tty
    }
}

/// Parse a lookback or interval of the form `<number><s|m|h|d>`.
pub fn parse_duration(value: &str) -> Result<Duration> {
    if !DURATION_PATTERN.is_match(value) {
        bail!(
            "invalid duration '{}': expected <number><s|m|h|d>, e.g. 30s, 5m, 2h, 1d",
            value
        );
    }

    let (amount, unit) = value.split_at(value.len() - 1);
    let amount: u64 = amount
        .parse()
        .map_err(|_| anyhow!("invalid duration '{}': number is too large", value))?;

    let unit_secs = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => unreachable!("rejected by DURATION_PATTERN"),
    };

    amount
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow!("invalid duration '{}': number is too large", value))
}

/// Parse a poll interval. Zero is rejected, it would poll back to back.
pub fn parse_poll_interval(value: &str) -> Result<Duration> {
    let interval = parse_duration(value).map_err(|err| anyhow!("invalid poll interval: {}", err))?;
    if interval.is_zero() {
        bail!("invalid poll interval '{}': must be at least 1s", value);
    }
    Ok(interval)
}

/// Parse a lookback window, with the lookback named in the error
pub fn parse_lookback(value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|err| anyhow!("invalid lookback: {}", err))
}

/// Absolute start instant `lookback` before `now_ms`
pub fn start_time_ms(now_ms: i64, lookback: Duration) -> i64 {
    let lookback_ms = i64::try_from(lookback.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_sub(lookback_ms)
}
