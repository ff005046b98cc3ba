//! Tail session
//!
//! One logical thread of control:
//!
//! 1. Catch up: drain every page of the lookback window and render it.
//! 2. Follow (tail mode only): a poller task on the same current-thread
//!    runtime fetches one page per interval from the cursor and hands
//!    non-empty batches over a channel. The session loop selects between
//!    batches, keystrokes and the interrupt signal, handling each to
//!    completion before the next, so the filter state it owns is never read
//!    and written at the same time.
//!
//! Any fetch error ends the session with that error. An interrupt ends it
//! successfully after the terminal is restored.

#![warn(clippy::all, rust_2018_idioms)]

pub mod cursor;
pub mod filter;
pub mod format;
pub mod poller;
pub mod render;
pub mod terminal;

pub use cursor::Cursor;
pub use filter::{FilterState, KeyOutcome};
pub use format::{format_line, FormattedLine, LogLevel};
pub use poller::{fetch_backlog, Batch, LogPoller};
pub use render::Renderer;
pub use terminal::TerminalSession;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::config::TailConfig;
use crate::app::data_plane::cloudwatch_logs::LogSource;

/// Batches the poller may run ahead of rendering
const BATCH_QUEUE_DEPTH: usize = 16;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// All requested output was written
    Completed,
    /// The user interrupted
    Interrupted,
}

/// Run a session against standard output and, when following on a terminal,
/// standard input.
pub async fn run(config: &TailConfig, source: Arc<dyn LogSource>) -> Result<SessionEnd> {
    let stdout_is_tty = io::stdout().is_terminal();
    let interactive = config.wants_interactive_filter(io::stdin().is_terminal(), stdout_is_tty);

    let mut renderer = Renderer::new(io::stdout(), config.output, config.color && stdout_is_tty);
    let filter = FilterState::new();

    info!(
        "Tailing {} from {} (follow: {}, interactive: {})",
        config.log_group_name, config.start_time_ms, config.follow, interactive
    );

    // Listen from the start so an interrupt during catch-up also ends cleanly
    let interrupt = interrupt_signal();
    tokio::pin!(interrupt);

    let Some(cursor) = catch_up_until(
        config,
        source.as_ref(),
        &mut renderer,
        &filter,
        interrupt.as_mut(),
    )
    .await?
    else {
        renderer.finish()?;
        return Ok(SessionEnd::Interrupted);
    };

    if !config.follow {
        renderer.finish()?;
        return Ok(SessionEnd::Completed);
    }

    if interactive {
        let _session = TerminalSession::start().context("Failed to switch terminal to raw mode")?;
        renderer.set_raw(true);
        follow(
            config,
            source,
            cursor,
            &mut renderer,
            filter,
            EventStream::new(),
            interrupt,
        )
        .await
    } else {
        follow(
            config,
            source,
            cursor,
            &mut renderer,
            filter,
            futures::stream::pending(),
            interrupt,
        )
        .await
    }
}

/// Fetch and render the lookback window. Returns the cursor positioned past
/// everything rendered.
pub async fn catch_up<W: Write>(
    config: &TailConfig,
    source: &dyn LogSource,
    renderer: &mut Renderer<W>,
    filter: &FilterState,
) -> Result<Cursor> {
    let backlog = fetch_backlog(
        source,
        &config.log_group_name,
        config.filter_pattern.as_deref(),
        config.start_time_ms,
    )
    .await?;

    let mut cursor = Cursor::new(config.start_time_ms);
    cursor.advance(&backlog);

    for event in &backlog {
        renderer.render_event(event, filter)?;
    }

    Ok(cursor)
}

/// [`catch_up`], abandoned if `interrupt` resolves first. Returns `None` when
/// interrupted.
pub async fn catch_up_until<W, S>(
    config: &TailConfig,
    source: &dyn LogSource,
    renderer: &mut Renderer<W>,
    filter: &FilterState,
    interrupt: Pin<&mut S>,
) -> Result<Option<Cursor>>
where
    W: Write,
    S: Future<Output = ()>,
{
    tokio::select! {
        biased;

        _ = interrupt => {
            info!("Interrupt received during initial fetch, stopping");
            Ok(None)
        }

        cursor = catch_up(config, source, renderer, filter) => cursor.map(Some),
    }
}

/// Poll from `cursor` until interrupted or a fetch fails
pub async fn follow<W, K, S>(
    config: &TailConfig,
    source: Arc<dyn LogSource>,
    cursor: Cursor,
    renderer: &mut Renderer<W>,
    filter: FilterState,
    keys: K,
    shutdown: S,
) -> Result<SessionEnd>
where
    W: Write,
    K: Stream<Item = io::Result<Event>> + Unpin,
    S: Future<Output = ()>,
{
    let (tx, rx) = mpsc::channel(BATCH_QUEUE_DEPTH);
    let poller = LogPoller::new(
        source,
        config.log_group_name.clone(),
        config.filter_pattern.clone(),
        cursor,
        config.poll_interval,
    );
    let poll_task = tokio::spawn(poller.run(tx));

    let outcome = drive(rx, keys, renderer, filter, shutdown).await;
    poll_task.abort();

    renderer.finish()?;
    outcome
}

/// The session loop: render batches, apply keystrokes, stop on interrupt.
///
/// Shutdown is checked first and keystrokes before batches, so a filter
/// edit that is already pending applies to the next batch rendered.
pub async fn drive<W, K, S>(
    mut batches: mpsc::Receiver<Batch>,
    mut keys: K,
    renderer: &mut Renderer<W>,
    mut filter: FilterState,
    shutdown: S,
) -> Result<SessionEnd>
where
    W: Write,
    K: Stream<Item = io::Result<Event>> + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut keys_open = true;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Interrupt received, stopping");
                return Ok(SessionEnd::Interrupted);
            }

            key = keys.next(), if keys_open => match key {
                Some(Ok(Event::Key(key))) => match filter.handle_key(key) {
                    KeyOutcome::Changed => {
                        debug!("Filter is now {:?} (active: {})", filter.pattern(), filter.is_active());
                        renderer.refresh_status(&filter)?;
                    }
                    KeyOutcome::Ignored => {}
                    KeyOutcome::Interrupt => {
                        info!("Ctrl+C pressed, stopping");
                        return Ok(SessionEnd::Interrupted);
                    }
                },
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("Failed to read terminal input"),
                None => keys_open = false,
            },

            batch = batches.recv() => match batch {
                Some(Ok(events)) => {
                    for event in &events {
                        renderer.render_event(event, &filter)?;
                    }
                }
                Some(Err(err)) => return Err(err),
                None => return Ok(SessionEnd::Completed),
            },
        }
    }
}

/// Resolves on SIGINT / Ctrl+C outside raw mode
async fn interrupt_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for interrupt signal: {}", err);
        std::future::pending::<()>().await;
    }
}
