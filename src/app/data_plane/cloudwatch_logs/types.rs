//! CloudWatch Logs Data Types
//!
//! Data structures for log queries and the events they return.

#![warn(clippy::all, rust_2018_idioms)]

use serde::{Deserialize, Serialize};

/// Query options for a single `FilterLogEvents` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Start time, inclusive (Unix timestamp in milliseconds)
    pub start_time: Option<i64>,
    /// Filter pattern (CloudWatch Logs filter syntax)
    pub filter_pattern: Option<String>,
    /// Continuation token from the previous page of the same query
    pub next_token: Option<String>,
}

impl QueryOptions {
    /// Create QueryOptions with no start, pattern or token
    pub fn new() -> Self {
        Self::default()
    }

    /// Set start time
    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Set filter pattern. Blank patterns are dropped, the service rejects them.
    pub fn with_filter_pattern(mut self, pattern: Option<&str>) -> Self {
        self.filter_pattern = pattern
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        self
    }

    /// Continue a paginated query
    pub fn with_next_token(mut self, token: Option<String>) -> Self {
        self.next_token = token;
        self
    }
}

/// One page of a log query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQueryResult {
    /// Log events in the order the service returned them
    pub events: Vec<LogEvent>,
    /// Token for the next page; `None` once the query is exhausted
    pub next_token: Option<String>,
}

impl LogQueryResult {
    pub fn new(events: Vec<LogEvent>, next_token: Option<String>) -> Self {
        Self { events, next_token }
    }

    /// A final page with no events
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the service has another page for this query
    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}

/// A single log event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Event timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Log message content
    pub message: String,
    /// Time when the event was ingested (Unix milliseconds)
    pub ingestion_time: i64,
    /// Name of the log stream this event belongs to
    pub log_stream_name: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(timestamp: i64, message: impl Into<String>, log_stream_name: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
            ingestion_time: timestamp,
            log_stream_name: log_stream_name.into(),
        }
    }

    /// Create log event with ingestion time
    pub fn with_ingestion_time(
        timestamp: i64,
        message: impl Into<String>,
        ingestion_time: i64,
        log_stream_name: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            message: message.into(),
            ingestion_time,
            log_stream_name: log_stream_name.into(),
        }
    }
}
