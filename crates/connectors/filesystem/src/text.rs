//! Newline-delimited text over a byte range of a file.
//!
//! A line belongs to the range that contains its first byte, so adjacent
//! ranges `[a, b)` and `[b, c)` read every line exactly once. Positions are
//! byte offsets of line starts.

use crate::Result;
use floe_common::{Error, Position, Progress, SplitRejection};
use floe_source::{
    resolve_bounds, Codec, ElementObserver, Observers, OffsetKind, RangeTracker, Source,
    SourceIterator,
};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

pub struct TextLineSource<T, C> {
    path: PathBuf,
    start_offset: u64,
    end_offset: u64,
    codec: Arc<C>,
    observers: Observers,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> TextLineSource<T, C>
where
    C: Codec<T>,
{
    /// Describes the lines of `path` starting in `[start_offset, end_offset)`.
    ///
    /// Offsets are clamped to the file length; an end before the start is
    /// rejected.
    pub fn new(
        path: impl Into<PathBuf>,
        start_offset: Option<u64>,
        end_offset: Option<u64>,
        codec: C,
    ) -> Result<Self> {
        let path = path.into();
        let len = std::fs::metadata(&path)?.len();
        let as_signed = |offset: u64| i64::try_from(offset).unwrap_or(i64::MAX);
        let (start_offset, end_offset) =
            resolve_bounds(len, start_offset.map(as_signed), end_offset.map(as_signed))?;
        Ok(Self {
            path,
            start_offset,
            end_offset,
            codec: Arc::new(codec),
            observers: Observers::default(),
            _marker: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }
}

impl<T, C> Source for TextLineSource<T, C>
where
    C: Codec<T>,
{
    type Item = T;
    type Iter = TextLineIterator<T, C>;

    fn open(&self) -> Result<Self::Iter> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut first_line = self.start_offset;
        if first_line > 0 {
            // Skip the tail of the line owned by the previous range.
            reader.seek(SeekFrom::Start(first_line - 1))?;
            let skipped = reader.read_until(b'\n', &mut Vec::new())?;
            first_line = first_line - 1 + skipped as u64;
            debug!(
                path = %self.path.display(),
                start_offset = self.start_offset,
                first_line,
                "Skipped partial line at range start"
            );
        }
        Ok(TextLineIterator {
            reader: Mutex::new(LineReader::new(reader, first_line)),
            tracker: RangeTracker::new(OffsetKind::ByteOffset, first_line, self.end_offset),
            codec: Arc::clone(&self.codec),
            observers: self.observers.clone(),
            _marker: PhantomData,
        })
    }

    fn with_observer(mut self, observer: Arc<dyn ElementObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl<T, C> fmt::Debug for TextLineSource<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextLineSource")
            .field("path", &self.path)
            .field("start_offset", &self.start_offset)
            .field("end_offset", &self.end_offset)
            .finish()
    }
}

struct LineReader<R> {
    reader: R,
    /// Offset the underlying reader is positioned at, or `None` after a
    /// failed read left it somewhere unknown.
    offset: Option<u64>,
}

impl<R: BufRead + Seek> LineReader<R> {
    fn new(reader: R, offset: u64) -> Self {
        Self { reader, offset: Some(offset) }
    }

    /// Reads the line starting at `offset`, returning it without its
    /// terminator together with the number of bytes consumed.
    fn read_line_at(&mut self, offset: u64) -> io::Result<(Vec<u8>, u64)> {
        if self.offset != Some(offset) {
            self.reader.seek(SeekFrom::Start(offset))?;
        }
        // Cleared until the read completes, so an error forces a seek next time.
        self.offset = None;
        let mut line = Vec::new();
        let consumed = self.reader.read_until(b'\n', &mut line)? as u64;
        self.offset = Some(offset + consumed);
        if consumed == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file ended at offset {offset}, inside the assigned range"),
            ));
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok((line, consumed))
    }
}

pub struct TextLineIterator<T, C> {
    reader: Mutex<LineReader<BufReader<File>>>,
    tracker: RangeTracker,
    codec: Arc<C>,
    observers: Observers,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> TextLineIterator<T, C> {
    /// Current exclusive stop offset.
    pub fn end_position(&self) -> u64 {
        self.tracker.snapshot().stop
    }
}

impl<T, C> SourceIterator for TextLineIterator<T, C>
where
    C: Codec<T>,
{
    type Item = T;

    fn has_next(&self) -> bool {
        self.tracker.has_next()
    }

    fn try_next(&self) -> Result<Option<T>> {
        // Lock order: reader, then tracker. Splits only take the tracker.
        let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        let read = self.tracker.claim_next(|offset| {
            let (line, consumed) = reader.read_line_at(offset)?;
            let element = self.codec.decode(&line).map_err(|e| Error::decode(offset, e))?;
            Ok::<_, Error>(((element, line.len() as u64), offset + consumed))
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

impl<T, C> fmt::Debug for TextLineIterator<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextLineIterator").field("tracker", &self.tracker).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floe_source::{ReadCounters, Utf8Codec};
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    /// In-memory bytes whose reads fail once when they reach `fail_at`.
    struct FlakyBytes {
        inner: io::Cursor<Vec<u8>>,
        fail_at: Option<u64>,
    }

    impl Read for FlakyBytes {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(fail_at) = self.fail_at else {
                return self.inner.read(buf);
            };
            let position = self.inner.position();
            if position >= fail_at {
                self.fail_at = None;
                return Err(io::Error::new(io::ErrorKind::Other, "device hiccup"));
            }
            let room = buf.len().min((fail_at - position) as usize);
            self.inner.read(&mut buf[..room])
        }
    }

    impl Seek for FlakyBytes {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    fn text_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn read_range(path: &Path, start: Option<u64>, end: Option<u64>) -> Vec<String> {
        let source = TextLineSource::new(path, start, end, Utf8Codec).unwrap();
        let iter = source.open().unwrap();
        iter.elements().collect::<Result<_>>().unwrap()
    }

    #[test]
    fn test_reads_all_lines() {
        let file = text_file("a\nbb\nccc\n");
        assert_eq!(read_range(file.path(), None, None), vec!["a", "bb", "ccc"]);
    }

    #[test]
    fn test_last_line_without_newline_and_crlf() {
        let file = text_file("one\r\ntwo\nthree");
        assert_eq!(read_range(file.path(), None, None), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_ranges_partition_lines() {
        let contents = "a\nbb\nccc\n\ndddd\ne";
        let file = text_file(contents);
        let len = contents.len() as u64;
        let all = read_range(file.path(), None, None);
        for split in 0..=len {
            let mut lines = read_range(file.path(), Some(0), Some(split));
            lines.extend(read_range(file.path(), Some(split), None));
            assert_eq!(lines, all, "split at {split}");
        }
    }

    #[test]
    fn test_end_is_clamped_to_file_length() {
        let file = text_file("x\ny\n");
        let source = TextLineSource::new(file.path(), None, Some(1000), Utf8Codec).unwrap();
        assert_eq!(source.end_offset(), 4);
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let file = text_file("x\ny\n");
        let err = TextLineSource::new(file.path(), Some(3), Some(1), Utf8Codec).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = TextLineSource::new("non_existent_file.txt", None, None, Utf8Codec).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn test_split_on_byte_offsets() {
        let file = text_file("a\nbb\nccc\n");
        let source = TextLineSource::new(file.path(), None, None, Utf8Codec).unwrap();
        let iter = source.open().unwrap();
        assert_eq!(iter.next().unwrap(), "a");
        assert_eq!(iter.progress(), Progress::at(Position::ByteOffset(2)));

        assert_eq!(
            iter.try_update_stop_position(&Progress::at(Position::RecordIndex(3))),
            Err(SplitRejection::UnsupportedPosition("record_index"))
        );
        assert_eq!(iter.update_stop_position(&Progress::at(Position::ByteOffset(2))), None);
        assert_eq!(iter.update_stop_position(&Progress::at(Position::ByteOffset(9))), None);
        assert_eq!(
            iter.update_stop_position(&Progress::at(Position::ByteOffset(3))),
            Some(Position::ByteOffset(3))
        );

        // "bb" starts before the new stop; "ccc" belongs to the relinquished tail.
        assert_eq!(iter.next().unwrap(), "bb");
        assert!(!iter.has_next());
        assert_eq!(read_range(file.path(), Some(3), None), vec!["ccc"]);
    }

    #[test]
    fn test_decode_failure_rereads_same_line() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"ok\n\xff\nlast\n").unwrap();
        file.flush().unwrap();
        let counters = Arc::new(ReadCounters::new());
        let source = TextLineSource::new(file.path(), None, None, Utf8Codec)
            .unwrap()
            .with_observer(counters.clone());
        let iter = source.open().unwrap();

        assert_eq!(iter.next().unwrap(), "ok");
        assert!(matches!(iter.next(), Err(Error::Decode { position: 3, .. })));
        assert!(matches!(iter.next(), Err(Error::Decode { position: 3, .. })));
        assert_eq!(iter.progress(), Progress::at(Position::ByteOffset(3)));
        assert_eq!(counters.elements(), 1);
        assert_eq!(counters.bytes(), 2);
    }

    #[test]
    fn test_read_error_mid_line_rereads_from_line_start() {
        let bytes = FlakyBytes {
            inner: io::Cursor::new(b"first\nsecond\n".to_vec()),
            fail_at: Some(9),
        };
        let mut reader = LineReader::new(BufReader::new(bytes), 0);

        assert_eq!(reader.read_line_at(0).unwrap(), (b"first".to_vec(), 6));
        // Fails after "sec" has already been pulled out of the reader.
        assert!(reader.read_line_at(6).is_err());
        assert_eq!(reader.read_line_at(6).unwrap(), (b"second".to_vec(), 7));
    }
}
