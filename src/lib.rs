//! cwtail - CloudWatch Logs tail with a live filter
//!
//! cwtail polls a CloudWatch Logs log group for new events and renders them to
//! the terminal. While tailing, typed characters build a filter pattern: lines
//! that do not contain it are dimmed in place, and a status line under the
//! scrolling output shows the pattern and how many lines matched.
//!
//! # Core Features
//!
//! - **Catch-up fetch**: Every page of the lookback window (`--since 2h`)
//! - **Cursor-advancing poll**: One page per interval, never re-delivering an event
//! - **Compact lines**: Local time, request correlation token, level tag, trimmed body
//! - **Live filter**: Type to dim non-matching lines, Backspace to edit, Esc to clear
//!
//! # Architecture Overview
//!
//! - **Configuration** ([`app::cli`], [`app::config`]): flags resolved once into an immutable config
//! - **Data plane** ([`app::data_plane`]): `FilterLogEvents` paging behind a trait
//! - **Session** ([`app::tail`]): poller, formatter, filter state and renderer
//!
//! The session runs on a current-thread tokio runtime. The poller is a task on
//! that thread and keystrokes arrive as a stream, so the filter needs no lock.

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
