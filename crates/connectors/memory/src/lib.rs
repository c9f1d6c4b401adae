//! In-memory bounded source.
//!
//! Serves a precomputed, shared sequence of encoded records. Positions are
//! record indices and the iterator accepts dynamic splits on them.

use floe_common::{Error, Position, Progress, Result, SplitRejection};
use floe_source::{
    resolve_bounds, Codec, ElementObserver, Observers, OffsetKind, RangeTracker, Source,
    SourceIterator,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A source that yields a set of precomputed elements.
pub struct InMemorySource<T, C> {
    records: Arc<[Vec<u8>]>,
    start_index: u64,
    end_index: u64,
    codec: Arc<C>,
    observers: Observers,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> InMemorySource<T, C>
where
    C: Codec<T>,
{
    /// Builds a source over `records[start_index..end_index]`.
    ///
    /// Missing bounds default to the whole sequence and present ones are
    /// clamped to its length. A negative start, or an end before the start,
    /// is an [`Error::InvalidArgument`].
    pub fn new(
        records: impl Into<Arc<[Vec<u8>]>>,
        start_index: Option<i64>,
        end_index: Option<i64>,
        codec: C,
    ) -> Result<Self> {
        let records = records.into();
        let (start_index, end_index) =
            resolve_bounds(records.len() as u64, start_index, end_index)?;
        Ok(Self {
            records,
            start_index,
            end_index,
            codec: Arc::new(codec),
            observers: Observers::default(),
            _marker: PhantomData,
        })
    }

    /// Builds a source from records carried as byte-per-char strings, the
    /// form work items use to embed binary records in JSON.
    pub fn from_encoded_strings<S: AsRef<str>>(
        encoded: &[S],
        start_index: Option<i64>,
        end_index: Option<i64>,
        codec: C,
    ) -> Result<Self> {
        let records = encoded
            .iter()
            .enumerate()
            .map(|(i, s)| byte_string_to_bytes(s.as_ref(), i))
            .collect::<Result<Vec<_>>>()?;
        Self::new(records, start_index, end_index, codec)
    }

    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    pub fn end_index(&self) -> u64 {
        self.end_index
    }

    pub fn len(&self) -> u64 {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    /// Opens an iterator. Unlike [`Source::open`] this cannot fail.
    pub fn iter(&self) -> InMemorySourceIterator<T, C> {
        InMemorySourceIterator {
            records: Arc::clone(&self.records),
            codec: Arc::clone(&self.codec),
            observers: self.observers.clone(),
            tracker: RangeTracker::new(OffsetKind::RecordIndex, self.start_index, self.end_index),
            _marker: PhantomData,
        }
    }
}

fn byte_string_to_bytes(encoded: &str, record: usize) -> Result<Vec<u8>> {
    encoded
        .chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| {
                Error::invalid_argument(format!(
                    "record {record} holds {c:?}, which is not a byte-per-char encoded value"
                ))
            })
        })
        .collect()
}

impl<T, C> Source for InMemorySource<T, C>
where
    C: Codec<T>,
{
    type Item = T;
    type Iter = InMemorySourceIterator<T, C>;

    fn open(&self) -> Result<Self::Iter> {
        Ok(self.iter())
    }

    fn with_observer(mut self, observer: Arc<dyn ElementObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl<T, C> fmt::Debug for InMemorySource<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySource")
            .field("records", &self.records.len())
            .field("start_index", &self.start_index)
            .field("end_index", &self.end_index)
            .field("observers", &self.observers)
            .finish()
    }
}

/// Iterator over an [`InMemorySource`] range.
pub struct InMemorySourceIterator<T, C> {
    records: Arc<[Vec<u8>]>,
    codec: Arc<C>,
    observers: Observers,
    tracker: RangeTracker,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> InMemorySourceIterator<T, C> {
    /// Current exclusive stop index.
    pub fn end_position(&self) -> u64 {
        self.tracker.snapshot().stop
    }
}

impl<T, C> SourceIterator for InMemorySourceIterator<T, C>
where
    C: Codec<T>,
{
    type Item = T;

    fn has_next(&self) -> bool {
        self.tracker.has_next()
    }

    fn try_next(&self) -> Result<Option<T>> {
        let read = self.tracker.claim_next(|index| {
            let encoded = &self.records[index as usize];
            let element = self.codec.decode(encoded).map_err(|e| Error::decode(index, e))?;
            Ok::<_, Error>(((element, encoded.len() as u64), index + 1))
        })?;
        Ok(read.map(|(element, byte_len)| {
            self.observers.notify_element_read(byte_len);
            element
        }))
    }

    fn progress(&self) -> Progress {
        self.tracker.progress()
    }

    fn try_update_stop_position(
        &self,
        proposed: &Progress,
    ) -> std::result::Result<Position, SplitRejection> {
        self.tracker.try_split(proposed)
    }
}

impl<T, C> fmt::Debug for InMemorySourceIterator<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySourceIterator").field("tracker", &self.tracker).finish()
    }
}
