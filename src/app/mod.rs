//! Core application modules for cwtail.
//!
//! # Module Organization
//!
//! ## AWS Integration
//! - [`data_plane`] - CloudWatch Logs queries behind the [`data_plane::LogSource`] trait
//!
//! ## Session
//! - [`config`] - Resolved, immutable session configuration
//! - [`cli`] - Command line flags and their resolution into [`config::TailConfig`]
//! - [`tail`] - Catch-up fetch, cursor-advancing poll loop, formatter and live filter
//!
//! # Architecture
//!
//! - [`cli`] produces a [`config::TailConfig`]
//! - [`run_tail`] builds a CloudWatch Logs client for the configured region/profile
//! - [`tail::run`] drives the session against that client

pub mod cli;
pub mod config;
pub mod data_plane;
pub mod tail;

use anyhow::Result;
use std::sync::Arc;

use config::TailConfig;
use data_plane::CloudWatchLogsClient;
use tail::SessionEnd;

/// Connect to CloudWatch Logs and run a tail session
pub async fn run_tail(config: TailConfig) -> Result<SessionEnd> {
    let client = CloudWatchLogsClient::connect(config.region.as_deref(), config.profile.as_deref()).await;
    tail::run(&config, Arc::new(client)).await
}
