//! CloudWatch Logs Integration Module
//!
//! Provides the paginated `FilterLogEvents` access the tail session is built on.
//!
//! ## Features
//!
//! - Single-page and drain-all-pages queries behind the [`LogSource`] trait
//! - Time range and pattern-based filtering
//! - Log group resolution from function names and ARNs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cwtail::app::data_plane::cloudwatch_logs::{CloudWatchLogsClient, LogSource, QueryOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = CloudWatchLogsClient::connect(Some("us-east-1"), None).await;
//!
//! let events = client
//!     .fetch_all(
//!         "/aws/lambda/my-function",
//!         QueryOptions::new().with_start_time(1_700_000_000_000),
//!     )
//!     .await?;
//!
//! for event in events {
//!     println!("{}: {}", event.timestamp, event.message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod client;
pub mod resource_mapping;
pub mod types;

// Re-export commonly used types
pub use client::{CloudWatchLogsClient, LogSource};
pub use resource_mapping::{lambda_log_group, resolve_log_group_name};
pub use types::{LogEvent, LogQueryResult, QueryOptions};
