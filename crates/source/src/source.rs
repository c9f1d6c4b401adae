use crate::observer::ElementObserver;
use floe_common::{Error, Position, Progress, Result, SplitRejection};
use std::iter::FusedIterator;
use std::sync::Arc;

/// An immutable description of a bounded range of records.
pub trait Source: Send + Sync {
    type Item;
    type Iter: SourceIterator<Item = Self::Item>;

    /// Opens a fresh iterator over the whole range. Opening has no effect on
    /// the source and may be repeated; each iterator is independent.
    fn open(&self) -> Result<Self::Iter>;

    /// Registers an observer notified by every iterator opened afterwards.
    fn with_observer(self, observer: Arc<dyn ElementObserver>) -> Self
    where
        Self: Sized;
}

/// A stateful cursor over a [`Source`].
///
/// A single consumer drives `has_next`/`next`. `progress` and the stop
/// position updates may be called concurrently from a control path, which
/// is why every method takes `&self`.
pub trait SourceIterator: Send + Sync {
    type Item;

    fn has_next(&self) -> bool;

    /// Reads the next element, or `None` once the range is exhausted.
    ///
    /// The bound check and the advance are a single step, so a split that
    /// races with this call cannot turn into an error.
    fn try_next(&self) -> Result<Option<Self::Item>>;

    fn next(&self) -> Result<Self::Item> {
        self.try_next()?.ok_or(Error::NoSuchElement)
    }

    fn progress(&self) -> Progress;

    /// Proposes a new stop position and reports why it was refused.
    fn try_update_stop_position(
        &self,
        _proposed: &Progress,
    ) -> std::result::Result<Position, SplitRejection> {
        Err(SplitRejection::NotSplittable)
    }

    /// Proposes a new stop position. Returns the accepted position, or `None`
    /// when the split is not possible right now.
    fn update_stop_position(&self, proposed: &Progress) -> Option<Position> {
        self.try_update_stop_position(proposed).ok()
    }

    fn elements(&self) -> Elements<'_, Self>
    where
        Self: Sized,
    {
        Elements { iter: self, done: false }
    }
}

/// Borrowing [`Iterator`] over a [`SourceIterator`]. Stops after the first error.
#[derive(Debug)]
pub struct Elements<'a, I: ?Sized> {
    iter: &'a I,
    done: bool,
}

impl<I> Iterator for Elements<'_, I>
where
    I: SourceIterator + ?Sized,
{
    type Item = Result<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.iter.try_next() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<I> FusedIterator for Elements<'_, I> where I: SourceIterator + ?Sized {}
