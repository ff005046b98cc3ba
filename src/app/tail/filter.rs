//! Interactive filter state
//!
//! A live text pattern edited by keystrokes. Lines whose raw message does not
//! contain the pattern (case-insensitively) are dimmed rather than hidden.

#![warn(clippy::all, rust_2018_idioms)]

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Stylize;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid ansi regex"));

/// What a keystroke did to the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Pattern or activity changed; the status line needs a redraw
    Changed,
    /// Nothing to do
    Ignored,
    /// User asked to quit
    Interrupt,
}

/// Live filter pattern and its activity flag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pattern: String,
    active: bool,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push(&mut self, c: char) {
        self.pattern.push(c);
        self.active = true;
    }

    /// Remove the last character. Returns false if there was nothing to remove.
    pub fn pop(&mut self) -> bool {
        let removed = self.pattern.pop().is_some();
        if self.pattern.is_empty() {
            self.active = false;
        }
        removed
    }

    /// Clear the pattern. Returns false if the filter was already clear.
    pub fn clear(&mut self) -> bool {
        let changed = self.active || !self.pattern.is_empty();
        self.pattern.clear();
        self.active = false;
        changed
    }

    /// Apply one key event
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Ignored;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            // Raw mode swallows SIGINT, so Ctrl+C arrives as a key
            KeyCode::Char('c') if ctrl => KeyOutcome::Interrupt,
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.push(c);
                KeyOutcome::Changed
            }
            KeyCode::Backspace | KeyCode::Delete => {
                if self.pop() {
                    KeyOutcome::Changed
                } else {
                    KeyOutcome::Ignored
                }
            }
            KeyCode::Esc => {
                if self.clear() {
                    KeyOutcome::Changed
                } else {
                    KeyOutcome::Ignored
                }
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Whether `message` contains the pattern, ignoring case
    pub fn matches(&self, message: &str) -> bool {
        message
            .to_lowercase()
            .contains(&self.pattern.to_lowercase())
    }

    /// A line is dimmed iff the filter is active with a non-empty pattern the
    /// raw message does not contain
    pub fn should_dim(&self, message: &str) -> bool {
        self.active && !self.pattern.is_empty() && !self.matches(message)
    }
}

/// Remove ANSI escape sequences
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(line, "")
}

/// Restyle an already formatted line uniformly muted
pub fn dim_line(formatted: &str, color: bool) -> String {
    let plain = strip_ansi(formatted);
    if color {
        let text: &str = &plain;
        text.dark_grey().to_string()
    } else {
        plain.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(filter: &mut FilterState, text: &str) {
        for c in text.chars() {
            assert_eq!(filter.handle_key(key(KeyCode::Char(c))), KeyOutcome::Changed);
        }
    }

    #[test]
    fn test_starts_empty_and_inactive() {
        let filter = FilterState::new();
        assert_eq!(filter.pattern(), "");
        assert!(!filter.is_active());
    }

    #[test]
    fn test_typing_activates() {
        let mut filter = FilterState::new();
        type_str(&mut filter, "Time");
        assert_eq!(filter.pattern(), "Time");
        assert!(filter.is_active());
    }

    #[test]
    fn test_backspace_to_empty_deactivates() {
        let mut filter = FilterState::new();
        type_str(&mut filter, "ab");

        assert_eq!(filter.handle_key(key(KeyCode::Backspace)), KeyOutcome::Changed);
        assert!(filter.is_active());
        assert_eq!(filter.handle_key(key(KeyCode::Delete)), KeyOutcome::Changed);
        assert_eq!(filter.pattern(), "");
        assert!(!filter.is_active());
    }

    #[test]
    fn test_backspace_on_empty_is_noop() {
        let mut filter = FilterState::new();
        assert_eq!(filter.handle_key(key(KeyCode::Backspace)), KeyOutcome::Ignored);
        assert_eq!(filter, FilterState::new());
    }

    #[test]
    fn test_escape_clears() {
        let mut filter = FilterState::new();
        type_str(&mut filter, "timeout");
        assert_eq!(filter.handle_key(key(KeyCode::Esc)), KeyOutcome::Changed);
        assert_eq!(filter, FilterState::new());
        assert_eq!(filter.handle_key(key(KeyCode::Esc)), KeyOutcome::Ignored);
    }

    #[test]
    fn test_ctrl_c_interrupts_without_editing() {
        let mut filter = FilterState::new();
        type_str(&mut filter, "x");
        let outcome = filter.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(outcome, KeyOutcome::Interrupt);
        assert_eq!(filter.pattern(), "x");
    }

    #[test]
    fn test_other_keys_and_releases_ignored() {
        let mut filter = FilterState::new();
        assert_eq!(filter.handle_key(key(KeyCode::Up)), KeyOutcome::Ignored);
        assert_eq!(
            filter.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL)),
            KeyOutcome::Ignored
        );

        let mut release = key(KeyCode::Char('a'));
        release.kind = KeyEventKind::Release;
        assert_eq!(filter.handle_key(release), KeyOutcome::Ignored);
        assert!(!filter.is_active());
    }

    #[test]
    fn test_shifted_characters_are_typed() {
        let mut filter = FilterState::new();
        let outcome = filter.handle_key(KeyEvent::new(KeyCode::Char('E'), KeyModifiers::SHIFT));
        assert_eq!(outcome, KeyOutcome::Changed);
        assert_eq!(filter.pattern(), "E");
    }

    #[test]
    fn test_dim_decision() {
        let mut filter = FilterState::new();
        type_str(&mut filter, "timeout");

        assert!(!filter.should_dim("Connection timeout after 30s"));
        assert!(!filter.should_dim("CONNECTION TIMEOUT"));
        assert!(filter.should_dim("OK"));
    }

    #[test]
    fn test_inactive_filter_never_dims() {
        let filter = FilterState::new();
        assert!(!filter.should_dim("anything"));
    }

    #[test]
    fn test_dim_line_drops_prior_styling() {
        let styled = format!("{} {}", "red".red().bold(), "42".yellow());
        assert_eq!(dim_line(&styled, false), "red 42");
        assert_eq!(strip_ansi(&dim_line(&styled, true)), "red 42");
    }
}
