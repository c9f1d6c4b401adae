//! Source crate
//!
//! The reader contract every Floe bounded source implements, plus the pieces
//! sources share: codecs, read observers and the range tracker that carries
//! the dynamic split protocol.

pub mod codec;
pub mod observer;
pub mod range;
pub mod source;

pub use codec::{BincodeCodec, BytesCodec, Codec, CodecError, JsonCodec, Utf8Codec};
pub use observer::{ElementObserver, Observers, ReadCounters};
pub use range::{resolve_bounds, Cursor, OffsetKind, RangeTracker};
pub use source::{Elements, Source, SourceIterator};
