//! Fetch cursor
//!
//! The instant boundary between events already delivered and events not yet
//! fetched. Queries start at the cursor (inclusive), and after a batch the
//! cursor moves to one millisecond past the newest event in it.

#![warn(clippy::all, rust_2018_idioms)]

use crate::app::data_plane::cloudwatch_logs::LogEvent;

/// Monotone fetch position in Unix milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    position_ms: i64,
}

impl Cursor {
    pub fn new(start_ms: i64) -> Self {
        Self {
            position_ms: start_ms,
        }
    }

    /// Start instant for the next query
    pub fn position(&self) -> i64 {
        self.position_ms
    }

    /// Move past every event in `batch`.
    ///
    /// Returns true if the cursor moved. Empty batches, and batches whose
    /// newest event is older than the cursor, leave it where it is.
    pub fn advance(&mut self, batch: &[LogEvent]) -> bool {
        let Some(newest) = batch.iter().map(|event| event.timestamp).max() else {
            return false;
        };

        let next = newest.saturating_add(1);
        if next > self.position_ms {
            self.position_ms = next;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(timestamps: &[i64]) -> Vec<LogEvent> {
        timestamps
            .iter()
            .map(|ts| LogEvent::new(*ts, "m", "s"))
            .collect()
    }

    #[test]
    fn test_advances_past_newest_regardless_of_order() {
        let mut cursor = Cursor::new(0);
        assert!(cursor.advance(&batch(&[100, 250, 180])));
        assert_eq!(cursor.position(), 251);

        let mut cursor = Cursor::new(0);
        cursor.advance(&batch(&[250, 180, 100]));
        assert_eq!(cursor.position(), 251);
    }

    #[test]
    fn test_empty_batch_keeps_position() {
        let mut cursor = Cursor::new(42);
        assert!(!cursor.advance(&[]));
        assert_eq!(cursor.position(), 42);
    }

    #[test]
    fn test_never_moves_backwards() {
        let mut cursor = Cursor::new(1_000);
        assert!(!cursor.advance(&batch(&[10, 20])));
        assert_eq!(cursor.position(), 1_000);

        // Newest event exactly one before the cursor lands on it
        assert!(!cursor.advance(&batch(&[999])));
        assert_eq!(cursor.position(), 1_000);
    }

    #[test]
    fn test_saturates_at_max_timestamp() {
        let mut cursor = Cursor::new(0);
        cursor.advance(&batch(&[i64::MAX]));
        assert_eq!(cursor.position(), i64::MAX);
    }
}
