//! Line formatter
//!
//! Turns `(timestamp, raw message)` into one display line:
//!
//! ```text
//! 14:03:07.412  c0ffee  ERROR   Task timed out after 30.00 seconds
//! ```
//!
//! Every step is a pure function of the message. Marker scanning and
//! boilerplate stripping are ordered tables evaluated top to bottom so the
//! priority order can be read (and tested) in one place.

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{Local, TimeZone};
use crossterm::style::{Color, Stylize};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt::{Display, Write};
use std::ops::Range;

/// Width of the correlation token column
pub const TOKEN_WIDTH: usize = 6;

/// Shown when a message carries no request id or UUID
pub const TOKEN_PLACEHOLDER: &str = "······";

/// Width of the level column
const LEVEL_WIDTH: usize = 6;

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Colours a correlation token can be drawn in
const TOKEN_PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::DarkCyan,
];

static REQUEST_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"RequestId:\s*([0-9A-Za-z-]+)").expect("valid request id regex"));

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b")
        .expect("valid uuid regex")
});

/// Escape sequences and control bytes that would act on the terminal
static CONTROL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\p{Cc}").expect("valid control character regex")
});

/// Boilerplate removed from the body, applied in order. Level markers go
/// first so a lifecycle marker takes its request id with it, then request ids
/// go before bare UUIDs so the `RequestId:` label is removed with its value.
static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\s*\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2})?".to_string(),
        level_marker_pattern(),
        r"RequestId:\s*[0-9A-Za-z-]*".to_string(),
        r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b".to_string(),
        r"Version:\s*\$LATEST".to_string(),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid boilerplate regex"))
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Words mentioning a failure, or numbers with an optional unit
static HIGHLIGHTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<problem>\b\w*(?:fail|err)\w*\b)|(?P<number>\b\d+(?:\.\d+)?(?:ms|s|mb|kb|gb|b)?\b)",
    )
    .expect("valid highlight regex")
});

/// Level tag assigned from the first marker found in a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Start,
    End,
    Report,
    Init,
    None,
}

/// Marker substrings in priority order; first match wins
const LEVEL_MARKERS: [(&str, LogLevel); 8] = [
    ("ERROR", LogLevel::Error),
    ("WARN", LogLevel::Warn),
    ("INFO", LogLevel::Info),
    ("DEBUG", LogLevel::Debug),
    ("START RequestId:", LogLevel::Start),
    ("END RequestId:", LogLevel::End),
    ("REPORT RequestId:", LogLevel::Report),
    ("INIT_START", LogLevel::Init),
];

/// One alternation stripping exactly what [`LEVEL_MARKERS`] classifies on.
/// Lifecycle markers only match with their `RequestId:` label, so a bare
/// "START" in ordinary text is kept.
fn level_marker_pattern() -> String {
    LEVEL_MARKERS
        .iter()
        .map(|(marker, _)| {
            if marker.ends_with("RequestId:") {
                format!(r"\b{}\s*[0-9A-Za-z-]*", regex::escape(marker))
            } else {
                format!(r"\[?\b{}\b\]?", regex::escape(marker))
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

impl LogLevel {
    /// Classify a raw message
    pub fn classify(message: &str) -> Self {
        LEVEL_MARKERS
            .iter()
            .find(|(marker, _)| message.contains(marker))
            .map(|(_, level)| *level)
            .unwrap_or(LogLevel::None)
    }

    /// Short tag text; blank for unclassified lines
    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Start => "START",
            LogLevel::End => "END",
            LogLevel::Report => "REPORT",
            LogLevel::Init => "INIT",
            LogLevel::None => "",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            LogLevel::Error => Color::Red,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Info => Color::Green,
            LogLevel::Debug => Color::Blue,
            LogLevel::Start | LogLevel::End => Color::DarkGrey,
            LogLevel::Report => Color::Magenta,
            LogLevel::Init => Color::DarkCyan,
            LogLevel::None => Color::Reset,
        }
    }
}

/// Kind of emphasis applied to part of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// A word containing "fail" or "err"
    Problem,
    /// A number, optionally followed by a unit
    Number,
}

/// Byte range of `body` to emphasise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub range: Range<usize>,
    pub kind: Highlight,
}

/// Short id used to group lines belonging to one request
pub fn correlation_token(message: &str) -> String {
    let id = REQUEST_ID
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
        .or_else(|| UUID.find(message).map(|m| m.as_str()));

    match id {
        Some(id) => id.chars().take(TOKEN_WIDTH).collect(),
        None => TOKEN_PLACEHOLDER.to_string(),
    }
}

/// Palette colour for a token: sum of its character codes modulo the palette
pub fn token_color(token: &str) -> Color {
    let sum: u64 = token.chars().map(|c| u64::from(u32::from(c))).sum();
    TOKEN_PALETTE[(sum % TOKEN_PALETTE.len() as u64) as usize]
}

/// Remove control sequences, timestamps, ids and level markers, then collapse
/// whitespace
pub fn strip_boilerplate(message: &str) -> String {
    let mut body = CONTROL.replace_all(message, " ").into_owned();
    for pattern in BOILERPLATE.iter() {
        body = pattern.replace_all(&body, " ").into_owned();
    }
    WHITESPACE.replace_all(&body, " ").trim().to_string()
}

/// Ranges of `body` to emphasise, in order and non-overlapping
pub fn highlight_spans(body: &str) -> Vec<HighlightSpan> {
    HIGHLIGHTS
        .captures_iter(body)
        .filter_map(|caps: Captures<'_>| {
            if let Some(m) = caps.name("problem") {
                Some(HighlightSpan {
                    range: m.range(),
                    kind: Highlight::Problem,
                })
            } else {
                caps.name("number").map(|m| HighlightSpan {
                    range: m.range(),
                    kind: Highlight::Number,
                })
            }
        })
        .collect()
}

/// A formatted line before styling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub time: String,
    pub token: String,
    pub level: LogLevel,
    pub body: String,
    pub highlights: Vec<HighlightSpan>,
}

impl FormattedLine {
    /// Format with timestamps shown in the local time zone
    pub fn new(timestamp: i64, message: &str) -> Self {
        Self::with_timezone(timestamp, message, &Local)
    }

    /// Format with timestamps shown in `tz`
    pub fn with_timezone<Tz>(timestamp: i64, message: &str, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let time = tz
            .timestamp_millis_opt(timestamp)
            .single()
            .map(|dt| dt.format(TIME_FORMAT).to_string())
            .unwrap_or_else(|| "--:--:--.---".to_string());

        let body = strip_boilerplate(message);
        let highlights = highlight_spans(&body);

        Self {
            time,
            token: correlation_token(message),
            level: LogLevel::classify(message),
            body,
            highlights,
        }
    }

    /// Compose the display string, with ANSI styling when `color` is set
    pub fn render(&self, color: bool) -> String {
        // Padding stays outside the styled text so trimming works the same
        // with and without colour
        let tag = self.level.tag();
        let token_pad = " ".repeat(TOKEN_WIDTH.saturating_sub(self.token.chars().count()));
        let tag_pad = " ".repeat(LEVEL_WIDTH.saturating_sub(tag.len()));

        if !color {
            return format!(
                "{}  {}{}  {}{}  {}",
                self.time, self.token, token_pad, tag, tag_pad, self.body
            )
            .trim_end()
            .to_string();
        }

        let styled_tag = if tag.is_empty() {
            String::new()
        } else {
            tag.with(self.level.color()).bold().to_string()
        };

        let mut line = String::with_capacity(self.body.len() + 64);
        let _ = write!(
            line,
            "{}  {}{}  {}{}  ",
            self.time.as_str().dark_grey(),
            self.token.as_str().with(token_color(&self.token)),
            token_pad,
            styled_tag,
            tag_pad,
        );
        self.write_body(&mut line);
        line.trim_end().to_string()
    }

    fn write_body(&self, line: &mut String) {
        let mut last = 0;
        for span in &self.highlights {
            line.push_str(&self.body[last..span.range.start]);
            let text = &self.body[span.range.clone()];
            let _ = match span.kind {
                Highlight::Problem => write!(line, "{}", text.red().bold()),
                Highlight::Number => write!(line, "{}", text.yellow()),
            };
            last = span.range.end;
        }
        line.push_str(&self.body[last..]);
    }
}

/// Format one event for display using the local time zone
pub fn format_line(timestamp: i64, message: &str, color: bool) -> String {
    FormattedLine::new(timestamp, message).render(color)
}
