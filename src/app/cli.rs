//! Command line surface
//!
//! Flags are parsed by clap and then resolved into a [`TailConfig`]. Duration
//! flags are validated during resolution rather than by clap so a bad
//! lookback is reported as a configuration error with exit status 1.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;

use super::config::{parse_lookback, parse_poll_interval, start_time_ms, OutputMode, TailConfig};
use super::data_plane::cloudwatch_logs::resolve_log_group_name;

/// Tail CloudWatch Logs with a live, keystroke-driven filter
#[derive(Debug, Parser)]
#[command(name = "cwtail")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CWTAIL_GIT_COMMIT"), ")"))]
#[command(about = "Tail CloudWatch Logs with a live, keystroke-driven filter")]
pub struct Cli {
    /// Log group name, Lambda function name, or log group / function ARN
    #[arg(value_name = "LOG_SOURCE")]
    pub source: String,

    /// CloudWatch Logs filter pattern applied by the service
    #[arg(short, long, value_name = "PATTERN")]
    pub filter: Option<String>,

    /// How far back the initial fetch reaches: <number><s|m|h|d>
    #[arg(short, long, value_name = "LOOKBACK", default_value = "5m")]
    pub since: String,

    /// Keep polling for new events after the initial fetch
    #[arg(short, long)]
    pub tail: bool,

    /// Pause between polls when tailing: <number><s|m|h|d>
    #[arg(short, long, value_name = "INTERVAL", default_value = "2s")]
    pub interval: String,

    /// AWS region
    #[arg(short, long)]
    pub region: Option<String>,

    /// AWS shared config profile
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Print each event as a JSON object, one per line
    #[arg(long)]
    pub json: bool,

    /// Disable ANSI colours
    #[arg(long)]
    pub no_color: bool,

    /// Debug-level diagnostics in the log file
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve flags into a configuration, anchoring the lookback at `now`
    pub fn into_config(self, now: DateTime<Utc>) -> Result<TailConfig> {
        let lookback = parse_lookback(&self.since)?;
        let poll_interval = parse_poll_interval(&self.interval)?;

        Ok(TailConfig {
            log_group_name: resolve_log_group_name(&self.source),
            filter_pattern: self.filter.filter(|p| !p.trim().is_empty()),
            poll_interval,
            lookback,
            start_time_ms: start_time_ms(now.timestamp_millis(), lookback),
            follow: self.tail,
            region: self.region,
            profile: self.profile,
            output: if self.json {
                OutputMode::Json
            } else {
                OutputMode::Pretty
            },
            color: !self.no_color,
        })
    }
}
