//! CloudWatch Logs Client Wrapper
//!
//! [`LogSource`] is the one seam the tail session depends on: fetch a page of
//! events matching an optional pattern from a start instant, or drain every
//! page of such a query. [`CloudWatchLogsClient`] implements it over
//! `FilterLogEvents`.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;
use aws_types::region::Region;
use tracing::{debug, info};

use super::types::{LogEvent, LogQueryResult, QueryOptions};

/// A paginated source of log events
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch one page of events for `log_group_name`.
    ///
    /// Events come back in the order the source returned them, which is not
    /// necessarily sorted by timestamp.
    async fn fetch_page(&self, log_group_name: &str, options: &QueryOptions) -> Result<LogQueryResult>;

    /// Fetch every page of a query, following continuation tokens until the
    /// source stops returning one. Any page failure aborts the whole fetch.
    async fn fetch_all(&self, log_group_name: &str, options: QueryOptions) -> Result<Vec<LogEvent>> {
        let mut options = options;
        let mut events = Vec::new();
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(log_group_name, &options).await?;
            pages += 1;

            let has_more = page.has_more();
            events.extend(page.events);
            if !has_more {
                break;
            }
            options = options.with_next_token(page.next_token);
        }

        debug!(
            "Drained {} page(s), {} event(s) from {}",
            pages,
            events.len(),
            log_group_name
        );
        Ok(events)
    }
}

/// CloudWatch Logs client wrapper
#[derive(Clone)]
pub struct CloudWatchLogsClient {
    client: cloudwatchlogs::Client,
}

impl CloudWatchLogsClient {
    /// Build a client from the default AWS credential chain.
    ///
    /// `region` and `profile` override what the environment and shared config
    /// files would otherwise select.
    pub async fn connect(region: Option<&str>, profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }

        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        let aws_config = loader.load().await;

        info!(
            "CloudWatch Logs client ready (region: {}, profile: {})",
            aws_config
                .region()
                .map(|r| r.as_ref())
                .unwrap_or("<unset>"),
            profile.unwrap_or("<default>")
        );

        Self::from_client(cloudwatchlogs::Client::new(&aws_config))
    }

    /// Wrap an already configured SDK client
    pub fn from_client(client: cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogSource for CloudWatchLogsClient {
    async fn fetch_page(&self, log_group_name: &str, options: &QueryOptions) -> Result<LogQueryResult> {
        // Build the request
        let mut request = self
            .client
            .filter_log_events()
            .log_group_name(log_group_name);

        if let Some(start_time) = options.start_time {
            request = request.start_time(start_time);
        }

        if let Some(filter_pattern) = &options.filter_pattern {
            request = request.filter_pattern(filter_pattern);
        }

        if let Some(token) = &options.next_token {
            request = request.next_token(token);
        }

        let response = request.send().await.with_context(|| {
            format!(
                "Failed to query log events from log group: {}",
                log_group_name
            )
        })?;

        let events = response
            .events
            .unwrap_or_default()
            .into_iter()
            .map(|event| {
                LogEvent::with_ingestion_time(
                    event.timestamp.unwrap_or(0),
                    event.message.unwrap_or_default(),
                    event.ingestion_time.unwrap_or(0),
                    event.log_stream_name.unwrap_or_default(),
                )
            })
            .collect();

        Ok(LogQueryResult::new(events, response.next_token))
    }
}
