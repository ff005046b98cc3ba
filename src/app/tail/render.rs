//! Output rendering
//!
//! Log lines scroll; the filter status line does not. Every emitted event goes
//! through the same four steps: erase the status line, decide dim or normal
//! against the filter as it is right now, print the line, redraw the status
//! line if the filter is active.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use crossterm::cursor::MoveToColumn;
use crossterm::style::Stylize;
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};
use std::io::Write;

use super::filter::{dim_line, FilterState};
use super::format::format_line;
use crate::app::config::OutputMode;
use crate::app::data_plane::cloudwatch_logs::LogEvent;

/// Writes events and the filter status line to `out`
pub struct Renderer<W: Write> {
    out: W,
    mode: OutputMode,
    color: bool,
    /// Raw mode needs explicit carriage returns
    raw: bool,
    /// Fixed column count; when unset, raw mode asks the terminal
    width: Option<usize>,
    status_visible: bool,
    matched: usize,
    seen: usize,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, mode: OutputMode, color: bool) -> Self {
        Self {
            out,
            mode,
            color,
            raw: false,
            width: None,
            status_visible: false,
            matched: 0,
            seen: 0,
        }
    }

    pub fn set_raw(&mut self, raw: bool) {
        self.raw = raw;
    }

    pub fn set_width(&mut self, width: Option<usize>) {
        self.width = width;
    }

    /// Lines matching the current filter, and all lines, since it last changed
    pub fn counts(&self) -> (usize, usize) {
        (self.matched, self.seen)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print one event under the current filter
    pub fn render_event(&mut self, event: &LogEvent, filter: &FilterState) -> Result<()> {
        self.erase_status()?;

        match self.mode {
            OutputMode::Json => {
                let json = serde_json::to_string(event).context("Failed to serialize log event")?;
                self.write_line(&json)?;
            }
            OutputMode::Pretty => {
                let formatted = format_line(event.timestamp, &event.message, self.color);
                let dimmed = filter.should_dim(&event.message);

                self.seen += 1;
                if !dimmed {
                    self.matched += 1;
                }

                if dimmed {
                    self.write_line(&dim_line(&formatted, self.color))?;
                } else {
                    self.write_line(&formatted)?;
                }
            }
        }

        self.draw_status(filter)?;
        self.out.flush().context("Failed to flush output")
    }

    /// Redraw the status line after the filter changed
    pub fn refresh_status(&mut self, filter: &FilterState) -> Result<()> {
        self.matched = 0;
        self.seen = 0;
        self.erase_status()?;
        self.draw_status(filter)?;
        self.out.flush().context("Failed to flush output")
    }

    /// Leave the cursor on a clean line
    pub fn finish(&mut self) -> Result<()> {
        self.erase_status()?;
        self.out.flush().context("Failed to flush output")
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let eol = if self.raw { "\r\n" } else { "\n" };
        write!(self.out, "{}{}", line, eol).context("Failed to write log line")
    }

    fn erase_status(&mut self) -> Result<()> {
        if self.status_visible {
            queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))
                .context("Failed to erase status line")?;
            self.status_visible = false;
        }
        Ok(())
    }

    fn draw_status(&mut self, filter: &FilterState) -> Result<()> {
        if !filter.is_active() {
            return Ok(());
        }

        let status = format!(
            " filter: {}  ({}/{}) ",
            filter.pattern(),
            self.matched,
            self.seen
        );
        let status = match self.status_width() {
            Some(width) => clip_status(&status, width),
            None => status,
        };
        let written = if self.color {
            write!(self.out, "{}", status.as_str().black().on_yellow())
        } else {
            write!(self.out, "{}", status)
        };
        written.context("Failed to draw status line")?;

        self.status_visible = true;
        Ok(())
    }

    fn status_width(&self) -> Option<usize> {
        self.width.or_else(|| {
            if self.raw {
                terminal::size().ok().map(|(cols, _)| usize::from(cols))
            } else {
                None
            }
        })
    }
}

/// Keep the status on one row. The last column is left free so the terminal
/// never wraps, and a long pattern keeps its newest characters.
fn clip_status(status: &str, width: usize) -> String {
    let limit = width.saturating_sub(1);
    let len = status.chars().count();
    if len <= limit {
        return status.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let tail: String = status.chars().skip(len - limit + 1).collect();
    format!("…{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tail::filter::strip_ansi;

    fn output(renderer: Renderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn filter_for(pattern: &str) -> FilterState {
        let mut filter = FilterState::new();
        pattern.chars().for_each(|c| filter.push(c));
        filter
    }

    #[test]
    fn test_plain_lines_without_filter() {
        let mut renderer = Renderer::new(Vec::new(), OutputMode::Pretty, false);
        let filter = FilterState::new();

        renderer
            .render_event(&LogEvent::new(0, "INFO hello", "s"), &filter)
            .unwrap();
        renderer
            .render_event(&LogEvent::new(0, "INFO world", "s"), &filter)
            .unwrap();

        let out = output(renderer);
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("hello\n"));
        assert!(!out.contains("filter:"));
    }

    #[test]
    fn test_status_line_erased_before_each_line_and_redrawn() {
        let mut renderer = Renderer::new(Vec::new(), OutputMode::Pretty, false);
        let filter = filter_for("timeout");

        renderer.refresh_status(&filter).unwrap();
        renderer
            .render_event(&LogEvent::new(0, "Connection timeout", "s"), &filter)
            .unwrap();
        renderer
            .render_event(&LogEvent::new(0, "OK", "s"), &filter)
            .unwrap();

        let out = output(renderer);
        // Clear(CurrentLine) precedes each line once the status is showing
        assert_eq!(out.matches("\x1b[2K").count(), 2);
        assert!(out.ends_with(" filter: timeout  (1/2) "));
    }

    #[test]
    fn test_dimmed_line_loses_highlight_colors() {
        let mut renderer = Renderer::new(Vec::new(), OutputMode::Pretty, true);
        let filter = filter_for("timeout");

        renderer
            .render_event(&LogEvent::new(0, "ERROR upload failed 3 times", "s"), &filter)
            .unwrap();
        renderer.finish().unwrap();

        let out = output(renderer);
        let line = out.lines().next().unwrap();
        let plain = strip_ansi(line).to_string();
        assert!(plain.contains("upload failed 3 times"));
        // One uniform style around the whole line, not per-token colours
        assert!(!line.contains(&"failed".red().bold().to_string()));
    }

    #[test]
    fn test_raw_mode_uses_crlf() {
        let mut renderer = Renderer::new(Vec::new(), OutputMode::Pretty, false);
        renderer.set_raw(true);
        renderer
            .render_event(&LogEvent::new(0, "x", "s"), &FilterState::new())
            .unwrap();
        assert!(output(renderer).ends_with("\r\n"));
    }

    #[test]
    fn test_json_mode_writes_event_objects() {
        let mut renderer = Renderer::new(Vec::new(), OutputMode::Json, false);
        renderer
            .render_event(&LogEvent::new(7, "hello", "stream-a"), &FilterState::new())
            .unwrap();

        let out = output(renderer);
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["timestamp"], 7);
        assert_eq!(value["log_stream_name"], "stream-a");
    }

    #[test]
    fn test_long_status_is_clipped_to_one_row() {
        let mut renderer = Renderer::new(Vec::new(), OutputMode::Pretty, false);
        renderer.set_width(Some(20));
        let filter = filter_for(&"x".repeat(50));

        renderer.refresh_status(&filter).unwrap();

        let out = output(renderer);
        assert_eq!(out.chars().count(), 19);
        assert!(out.starts_with('…'));
        assert!(out.ends_with("x  (0/0) "));
    }

    #[test]
    fn test_short_status_is_not_clipped() {
        assert_eq!(clip_status(" filter: a  (0/0) ", 80), " filter: a  (0/0) ");
        assert_eq!(clip_status(" filter: a ", 1), "");
    }

    #[test]
    fn test_refresh_resets_counts() {
        let mut renderer = Renderer::new(Vec::new(), OutputMode::Pretty, false);
        let filter = filter_for("a");
        renderer
            .render_event(&LogEvent::new(0, "a", "s"), &filter)
            .unwrap();
        assert_eq!(renderer.counts(), (1, 1));

        renderer.refresh_status(&filter).unwrap();
        assert_eq!(renderer.counts(), (0, 0));
    }
}
