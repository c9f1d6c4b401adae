use crate::position::Position;
use thiserror::Error;

/// Why a proposed stop position was not applied.
///
/// A rejection is a normal outcome of the split protocol; the caller simply
/// keeps the current range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitRejection {
    #[error("proposed stop carries no position")]
    MissingPosition,
    #[error("stop position of kind `{0}` is not supported by this source")]
    UnsupportedPosition(&'static str),
    #[error("proposed stop {proposed} is not after the current position {current}")]
    NotAfterCurrent { proposed: u64, current: u64 },
    #[error("proposed stop {proposed} does not shrink the current stop {stop}")]
    NotBeforeStop { proposed: u64, stop: u64 },
    #[error("source does not support dynamic splitting")]
    NotSplittable,
}

impl SplitRejection {
    pub fn unsupported(position: &Position) -> Self {
        SplitRejection::UnsupportedPosition(position.kind())
    }
}
