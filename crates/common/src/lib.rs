//! Common crate
//!
//! Shared error handling, positions and progress types for Floe.
//!
//! # Example
//! ```rust
//! use floe_common::{Position, Progress};
//! let progress = Progress::at(Position::RecordIndex(3));
//! assert_eq!(progress.position, Some(Position::RecordIndex(3)));
//! ```

pub mod error;
pub mod position;
pub mod split;

pub use error::{BoxError, Error, Result};
pub use position::{Position, Progress};
pub use split::SplitRejection;
