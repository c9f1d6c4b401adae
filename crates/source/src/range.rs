//! Offset ranges and the dynamic split protocol.
//!
//! A [`RangeTracker`] owns the live `[index, stop)` window of one iterator.
//! Reads and splits both go through the same mutex, so a split is always
//! judged against the cursor as it is at that instant and can never land
//! behind a record that has already been handed out.

use floe_common::{Error, Position, Progress, Result, SplitRejection};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Resolves optional caller-supplied bounds against a sequence of `len` items.
///
/// A missing start is 0 and a missing end is `len`. Present bounds are
/// clamped to `len`; a negative start or an end before the resolved start is
/// rejected.
pub fn resolve_bounds(len: u64, start: Option<i64>, end: Option<i64>) -> Result<(u64, u64)> {
    let start = match start {
        None => 0,
        Some(start) if start < 0 => {
            return Err(Error::invalid_argument(format!(
                "start index should be >= 0, got {start}"
            )))
        }
        Some(start) => (start as u64).min(len),
    };
    let end = match end {
        None => len,
        Some(end) if end < 0 || (end as u64) < start => {
            return Err(Error::invalid_argument(format!(
                "end index should be >= start index {start}, got {end}"
            )))
        }
        Some(end) => (end as u64).min(len),
    };
    Ok((start, end))
}

/// Which position variant a tracker's offsets are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetKind {
    RecordIndex,
    ByteOffset,
}

impl OffsetKind {
    pub fn position(self, offset: u64) -> Position {
        match self {
            OffsetKind::RecordIndex => Position::RecordIndex(offset),
            OffsetKind::ByteOffset => Position::ByteOffset(offset),
        }
    }

    pub fn offset_of(self, position: &Position) -> Option<u64> {
        match self {
            OffsetKind::RecordIndex => position.record_index(),
            OffsetKind::ByteOffset => position.byte_offset(),
        }
    }
}

/// A point-in-time view of a tracker's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Offset of the next unread record.
    pub index: u64,
    /// Exclusive stop offset. Only ever lowered.
    pub stop: u64,
}

#[derive(Debug)]
pub struct RangeTracker {
    kind: OffsetKind,
    cursor: Mutex<Cursor>,
}

impl RangeTracker {
    pub fn new(kind: OffsetKind, start: u64, stop: u64) -> Self {
        Self { kind, cursor: Mutex::new(Cursor { index: start, stop }) }
    }

    pub fn snapshot(&self) -> Cursor {
        *self.lock()
    }

    pub fn has_next(&self) -> bool {
        let cursor = self.lock();
        cursor.index < cursor.stop
    }

    /// Current cursor as a progress snapshot.
    pub fn progress(&self) -> Progress {
        Progress::at(self.kind.position(self.lock().index))
    }

    /// Reads the record at the cursor, if any remain.
    ///
    /// `read` gets the current offset and returns the value together with the
    /// offset of the following record. The cursor moves only when `read`
    /// succeeds, and the whole step holds the lock so a concurrent split
    /// observes either the old or the new cursor, never something in between.
    pub fn claim_next<R, E>(
        &self,
        read: impl FnOnce(u64) -> std::result::Result<(R, u64), E>,
    ) -> std::result::Result<Option<R>, E> {
        let mut cursor = self.lock();
        if cursor.index >= cursor.stop {
            return Ok(None);
        }
        let (value, next) = read(cursor.index)?;
        debug_assert!(next > cursor.index, "cursor must move forward");
        cursor.index = next;
        Ok(Some(value))
    }

    /// Lowers the stop offset to `proposed` if `index < proposed < stop`.
    pub fn try_split_at(&self, proposed: u64) -> std::result::Result<u64, SplitRejection> {
        let mut cursor = self.lock();
        if proposed <= cursor.index {
            return Err(SplitRejection::NotAfterCurrent { proposed, current: cursor.index });
        }
        if proposed >= cursor.stop {
            return Err(SplitRejection::NotBeforeStop { proposed, stop: cursor.stop });
        }
        cursor.stop = proposed;
        Ok(proposed)
    }

    /// Applies a proposed stop position expressed as progress.
    ///
    /// Proposals without a position, or with a position of another kind, are
    /// rejected without touching the range.
    pub fn try_split(&self, proposed: &Progress) -> std::result::Result<Position, SplitRejection> {
        let Some(position) = proposed.position.as_ref() else {
            warn!("A stop position without a position is not supported");
            return Err(SplitRejection::MissingPosition);
        };
        let Some(offset) = self.kind.offset_of(position) else {
            warn!(
                kind = position.kind(),
                "A stop position other than {:?} is not supported by this source", self.kind
            );
            return Err(SplitRejection::unsupported(position));
        };
        match self.try_split_at(offset) {
            Ok(stop) => {
                debug!(stop, "Accepted dynamic split");
                Ok(self.kind.position(stop))
            }
            Err(rejection) => {
                debug!(%rejection, "Rejected dynamic split");
                Err(rejection)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cursor> {
        // The cursor is only written after a read succeeds, so a panic inside
        // `read` leaves it consistent.
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
