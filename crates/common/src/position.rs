//! Positions and progress snapshots.
//!
//! A [`Position`] marks a location inside a source's record space. Sources
//! only understand some variants; the split protocol dispatches on the tag
//! and rejects what it does not know.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Zero-based index of a record in an ordered sequence.
    RecordIndex(u64),
    /// Byte offset into a file or stream.
    ByteOffset(u64),
    /// Key in a key-ordered store.
    Key(String),
    /// Opaque position in shuffled data.
    ShufflePosition(String),
    /// Past the last record of any range.
    End,
}

impl Position {
    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Position::RecordIndex(_) => "record_index",
            Position::ByteOffset(_) => "byte_offset",
            Position::Key(_) => "key",
            Position::ShufflePosition(_) => "shuffle_position",
            Position::End => "end",
        }
    }

    pub fn record_index(&self) -> Option<u64> {
        match self {
            Position::RecordIndex(index) => Some(*index),
            _ => None,
        }
    }

    pub fn byte_offset(&self) -> Option<u64> {
        match self {
            Position::ByteOffset(offset) => Some(*offset),
            _ => None,
        }
    }
}

/// Positions of different kinds are unordered, except `End` which follows everything.
impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use Position::*;
        match (self, other) {
            (End, End) => Some(Ordering::Equal),
            (End, _) => Some(Ordering::Greater),
            (_, End) => Some(Ordering::Less),
            (RecordIndex(a), RecordIndex(b)) => a.partial_cmp(b),
            (ByteOffset(a), ByteOffset(b)) => a.partial_cmp(b),
            (Key(a), Key(b)) => a.partial_cmp(b),
            (ShufflePosition(a), ShufflePosition(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::RecordIndex(index) => write!(f, "record_index={index}"),
            Position::ByteOffset(offset) => write!(f, "byte_offset={offset}"),
            Position::Key(key) => write!(f, "key={key}"),
            Position::ShufflePosition(pos) => write!(f, "shuffle_position={pos}"),
            Position::End => f.write_str("end"),
        }
    }
}

/// Snapshot of how far an iterator has advanced.
///
/// Also used as the carrier of a proposed stop position in dynamic split
/// requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<Duration>,
}

impl Progress {
    pub fn at(position: Position) -> Self {
        Self { position: Some(position), ..Self::default() }
    }

    pub fn with_percent_complete(mut self, percent_complete: f32) -> Self {
        self.percent_complete = Some(percent_complete);
        self
    }

    pub fn with_remaining_time(mut self, remaining_time: Duration) -> Self {
        self.remaining_time = Some(remaining_time);
        self
    }
}

impl From<Position> for Progress {
    fn from(position: Position) -> Self {
        Progress::at(position)
    }
}
