//! Bounded and streaming fetches
//!
//! The initial fetch drains every page of the lookback window. The streaming
//! poller then takes one page per interval starting at the cursor, moving the
//! cursor before the batch is handed on so a slow consumer can never cause
//! the same window to be fetched twice.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::cursor::Cursor;
use crate::app::data_plane::cloudwatch_logs::{LogEvent, LogSource, QueryOptions};

/// A non-empty batch of events, or the error that ended polling
pub type Batch = Result<Vec<LogEvent>>;

/// Fetch every event at or after `start_time_ms`, across all pages
pub async fn fetch_backlog(
    source: &dyn LogSource,
    log_group_name: &str,
    filter_pattern: Option<&str>,
    start_time_ms: i64,
) -> Result<Vec<LogEvent>> {
    let options = QueryOptions::new()
        .with_start_time(start_time_ms)
        .with_filter_pattern(filter_pattern);

    let events = source.fetch_all(log_group_name, options).await?;

    info!(
        "Initial fetch returned {} event(s) from {} since {}",
        events.len(),
        log_group_name,
        start_time_ms
    );
    Ok(events)
}

/// Cursor-advancing poll loop over a [`LogSource`]
pub struct LogPoller {
    source: Arc<dyn LogSource>,
    log_group_name: String,
    filter_pattern: Option<String>,
    cursor: Cursor,
    interval: Duration,
}

impl LogPoller {
    pub fn new(
        source: Arc<dyn LogSource>,
        log_group_name: impl Into<String>,
        filter_pattern: Option<String>,
        cursor: Cursor,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            log_group_name: log_group_name.into(),
            filter_pattern,
            cursor,
            interval,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Fetch the first page at the cursor and move the cursor past it.
    ///
    /// Continuation tokens are not followed here; the next poll resumes from
    /// the advanced cursor instead.
    pub async fn poll_once(&mut self) -> Result<Vec<LogEvent>> {
        let options = QueryOptions::new()
            .with_start_time(self.cursor.position())
            .with_filter_pattern(self.filter_pattern.as_deref());

        let page = self.source.fetch_page(&self.log_group_name, &options).await?;

        if self.cursor.advance(&page.events) {
            debug!(
                "Cursor for {} advanced to {} ({} event(s))",
                self.log_group_name,
                self.cursor.position(),
                page.events.len()
            );
        }

        Ok(page.events)
    }

    /// Poll forever, sending each non-empty batch to `batches`.
    ///
    /// Stops when the receiver is dropped, or after forwarding the first
    /// fetch error.
    pub async fn run(mut self, batches: mpsc::Sender<Batch>) {
        loop {
            match self.poll_once().await {
                Ok(events) if events.is_empty() => {}
                Ok(events) => {
                    if batches.send(Ok(events)).await.is_err() {
                        debug!("Batch receiver closed, stopping poller");
                        return;
                    }
                }
                Err(err) => {
                    error!("Polling {} failed: {:#}", self.log_group_name, err);
                    let _ = batches.send(Err(err)).await;
                    return;
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::data_plane::cloudwatch_logs::LogQueryResult;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records each query's start time
    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<LogQueryResult>>>,
        starts: Mutex<Vec<Option<i64>>>,
    }

    impl ScriptedSource {
        fn with(responses: Vec<Result<LogQueryResult>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                starts: Mutex::default(),
            })
        }

        fn starts(&self) -> Vec<Option<i64>> {
            self.starts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LogSource for ScriptedSource {
        async fn fetch_page(&self, _log_group_name: &str, options: &QueryOptions) -> Result<LogQueryResult> {
            self.starts.lock().unwrap().push(options.start_time);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(LogQueryResult::empty()))
        }
    }

    fn page(timestamps: &[i64], token: Option<&str>) -> Result<LogQueryResult> {
        Ok(LogQueryResult::new(
            timestamps
                .iter()
                .map(|ts| LogEvent::new(*ts, format!("line {}", ts), "stream"))
                .collect(),
            token.map(str::to_string),
        ))
    }

    #[tokio::test]
    async fn test_backlog_drains_all_pages_from_start() {
        let source = ScriptedSource::with(vec![page(&[5, 6], Some("next")), page(&[7], None)]);

        let events = fetch_backlog(source.as_ref(), "/g", Some("ERROR"), 1)
            .await
            .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(source.starts(), vec![Some(1), Some(1)]);
    }

    #[tokio::test]
    async fn test_poll_once_ignores_continuation_token() {
        let source = ScriptedSource::with(vec![page(&[100, 250, 180], Some("more")), page(&[300], None)]);
        let mut poller = LogPoller::new(source.clone(), "/g", None, Cursor::new(0), Duration::from_secs(1));

        let events = poller.poll_once().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(poller.cursor().position(), 251);

        // Next poll restarts at the cursor rather than following "more"
        poller.poll_once().await.unwrap();
        assert_eq!(source.starts(), vec![Some(0), Some(251)]);
        assert_eq!(poller.cursor().position(), 301);
    }

    #[tokio::test]
    async fn test_empty_poll_keeps_cursor() {
        let source = ScriptedSource::with(vec![page(&[], None), page(&[], None)]);
        let mut poller = LogPoller::new(source.clone(), "/g", None, Cursor::new(77), Duration::from_secs(1));

        assert!(poller.poll_once().await.unwrap().is_empty());
        assert!(poller.poll_once().await.unwrap().is_empty());
        assert_eq!(source.starts(), vec![Some(77), Some(77)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_skips_empty_batches_and_sleeps_between_polls() {
        let source = ScriptedSource::with(vec![page(&[10], None), page(&[], None), page(&[20, 15], None)]);
        let poller = LogPoller::new(source.clone(), "/g", None, Cursor::new(0), Duration::from_secs(5));
        let (tx, mut rx) = mpsc::channel(4);

        let started = tokio::time::Instant::now();
        let handle = tokio::spawn(poller.run(tx));

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        // The empty poll in between produces nothing downstream
        let second = rx.recv().await.unwrap().unwrap();
        let timestamps: Vec<i64> = second.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![20, 15]);
        assert!(started.elapsed() >= Duration::from_secs(10));

        assert_eq!(source.starts()[..3], [Some(0), Some(11), Some(11)]);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_forwards_error_and_stops() {
        let source = ScriptedSource::with(vec![page(&[1], None), Err(anyhow!("ExpiredTokenException"))]);
        let poller = LogPoller::new(source, "/g", None, Cursor::new(0), Duration::from_secs(1));
        let (tx, mut rx) = mpsc::channel(4);

        tokio::spawn(poller.run(tx));

        assert!(rx.recv().await.unwrap().is_ok());
        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("ExpiredToken"));
        // Sender dropped after the error
        assert!(rx.recv().await.is_none());
    }
}
