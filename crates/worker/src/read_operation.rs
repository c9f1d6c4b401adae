//! Drives one source iterator to completion.
//!
//! The read loop runs on its own thread; `progress` and
//! `request_dynamic_split` are the control path and may be called at any
//! time from elsewhere.

use crate::error::Result;
use floe_common::{Position, Progress};
use floe_source::{ReadCounters, Source, SourceIterator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

pub struct ReadOperation<I> {
    iterator: I,
    counters: Arc<ReadCounters>,
    stop_position: Mutex<Option<Position>>,
    finished: AtomicBool,
}

impl<I> ReadOperation<I>
where
    I: SourceIterator,
{
    /// Registers fresh counters on `source` and opens the iterator to drive.
    pub fn open<S>(source: S) -> Result<Self>
    where
        S: Source<Iter = I>,
    {
        let counters = Arc::new(ReadCounters::new());
        let iterator = source.with_observer(counters.clone()).open()?;
        Ok(Self::new(iterator, counters))
    }

    fn new(iterator: I, counters: Arc<ReadCounters>) -> Self {
        Self {
            iterator,
            counters,
            stop_position: Mutex::new(None),
            finished: AtomicBool::new(false),
        }
    }

    /// Hands every remaining element to `sink`. Returns how many were
    /// delivered; the first source or sink error ends the read.
    pub fn run(&self, mut sink: impl FnMut(I::Item) -> Result<()>) -> Result<u64> {
        let mut delivered = 0;
        let result = loop {
            match self.iterator.try_next() {
                Ok(Some(element)) => {
                    if let Err(err) = sink(element) {
                        break Err(err);
                    }
                    delivered += 1;
                }
                Ok(None) => break Ok(delivered),
                Err(err) => break Err(err.into()),
            }
        };
        self.finished.store(true, Ordering::Release);
        result
    }

    pub fn progress(&self) -> Progress {
        self.iterator.progress()
    }

    /// Asks the iterator to stop at `proposed`. Returns the accepted stop
    /// position, or `None` if the split was refused or the read is over.
    pub fn request_dynamic_split(&self, proposed: &Progress) -> Option<Position> {
        if self.is_finished() {
            debug!("Ignoring split request for a finished read");
            return None;
        }
        // Held across the split so the recorded stop matches the iterator's
        // when control-path callers race.
        let mut stop_position = self.stop_position.lock().unwrap_or_else(PoisonError::into_inner);
        match self.iterator.try_update_stop_position(proposed) {
            Ok(position) => {
                info!(%position, "Dynamic split accepted");
                *stop_position = Some(position.clone());
                Some(position)
            }
            Err(rejection) => {
                debug!(%rejection, "Dynamic split rejected");
                None
            }
        }
    }

    /// Most recently accepted stop position.
    pub fn stop_position(&self) -> Option<Position> {
        self.stop_position.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn counters(&self) -> &ReadCounters {
        &self.counters
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use floe_common::SplitRejection;
    use floe_connector_memory::InMemorySource;
    use floe_source::{OffsetKind, RangeTracker, Utf8Codec};
    use std::thread;
    use std::time::Duration;

    fn operation(words: &[&str]) -> Arc<ReadOperation<impl SourceIterator<Item = String>>> {
        let records: Vec<Vec<u8>> = words.iter().map(|w| w.as_bytes().to_vec()).collect();
        let source = InMemorySource::new(records, None, None, Utf8Codec).unwrap();
        Arc::new(ReadOperation::open(source).unwrap())
    }

    /// Record-indexed iterator whose accepted splits take `delay` to return.
    struct SlowSplits {
        tracker: RangeTracker,
        delay: Duration,
    }

    impl SourceIterator for SlowSplits {
        type Item = u64;

        fn has_next(&self) -> bool {
            self.tracker.has_next()
        }

        fn try_next(&self) -> floe_common::Result<Option<u64>> {
            self.tracker.claim_next(|i| Ok::<_, floe_common::Error>((i, i + 1)))
        }

        fn progress(&self) -> Progress {
            self.tracker.progress()
        }

        fn try_update_stop_position(
            &self,
            proposed: &Progress,
        ) -> std::result::Result<Position, SplitRejection> {
            let accepted = self.tracker.try_split(proposed);
            if accepted.is_ok() {
                thread::sleep(self.delay);
            }
            accepted
        }
    }

    #[test]
    fn test_run_delivers_everything() {
        let op = operation(&["a", "bb", "ccc"]);
        let mut seen = Vec::new();
        let delivered = op
            .run(|e| {
                seen.push(e);
                Ok(())
            })
            .unwrap();
        assert_eq!(delivered, 3);
        assert_eq!(seen, vec!["a", "bb", "ccc"]);
        assert_eq!(op.counters().bytes(), 6);
        assert!(op.is_finished());
        assert_eq!(op.progress(), Progress::at(Position::RecordIndex(3)));
    }

    #[test]
    fn test_split_from_sink_shortens_the_read() {
        let op = operation(&["a", "b", "c", "d", "e", "f"]);
        let control = Arc::clone(&op);
        let mut seen = Vec::new();
        op.run(|e| {
            if e == "b" {
                assert_eq!(
                    control.request_dynamic_split(&Progress::at(Position::RecordIndex(4))),
                    Some(Position::RecordIndex(4))
                );
            }
            seen.push(e);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
        assert_eq!(op.stop_position(), Some(Position::RecordIndex(4)));
    }

    #[test]
    fn test_sink_error_ends_read() {
        let op = operation(&["a", "b", "c"]);
        let err = op.run(|_| Err(WorkerError::Internal("downstream closed".into()))).unwrap_err();
        assert!(matches!(err, WorkerError::Internal(_)));
        assert!(op.is_finished());
        assert_eq!(op.counters().elements(), 1);
    }

    #[test]
    fn test_finished_read_refuses_splits() {
        let op = operation(&["a", "b", "c"]);
        op.run(|_| Ok(())).unwrap();
        assert_eq!(op.request_dynamic_split(&Progress::at(Position::RecordIndex(2))), None);
        assert_eq!(op.stop_position(), None);
    }

    #[test]
    fn test_rejected_split_is_not_recorded() {
        let op = operation(&["a", "b", "c"]);
        assert_eq!(op.request_dynamic_split(&Progress::at(Position::ByteOffset(1))), None);
        assert_eq!(op.request_dynamic_split(&Progress::at(Position::RecordIndex(0))), None);
        assert_eq!(op.stop_position(), None);
    }

    #[test]
    fn test_racing_splits_record_the_latest_stop() {
        let op = Arc::new(ReadOperation::new(
            SlowSplits {
                tracker: RangeTracker::new(OffsetKind::RecordIndex, 0, 10),
                delay: Duration::from_millis(200),
            },
            Arc::new(ReadCounters::new()),
        ));

        let first = {
            let op = Arc::clone(&op);
            thread::spawn(move || op.request_dynamic_split(&Progress::at(Position::RecordIndex(7))))
        };
        thread::sleep(Duration::from_millis(50));
        let second = op.request_dynamic_split(&Progress::at(Position::RecordIndex(5)));

        assert_eq!(first.join().unwrap(), Some(Position::RecordIndex(7)));
        assert_eq!(second, Some(Position::RecordIndex(5)));
        assert_eq!(op.stop_position(), Some(Position::RecordIndex(5)));
        assert_eq!(op.run(|_| Ok(())).unwrap(), 5);
    }

    #[test]
    fn test_open_counts_what_the_source_reads() {
        let op = operation(&["ab", "c"]);
        op.run(|_| Ok(())).unwrap();
        assert_eq!(op.counters().elements(), 2);
        assert_eq!(op.counters().bytes(), 3);
    }
}
