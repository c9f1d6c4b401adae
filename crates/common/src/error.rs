use thiserror::Error;

/// Boxed error produced by a codec; kept opaque to the read path.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for Floe sources.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("No such element: the source iterator is exhausted")]
    NoSuchElement,
    #[error("Failed to decode record at position {position}: {source}")]
    Decode {
        position: u64,
        #[source]
        source: BoxError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn decode(position: u64, source: impl Into<BoxError>) -> Self {
        Error::Decode { position, source: source.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_keeps_source() {
        let err = Error::decode(7, "bad varint");
        assert_eq!(err.to_string(), "Failed to decode record at position 7: bad varint");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = Error::invalid_argument("start index should be >= 0");
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(err.to_string(), "Invalid argument: start index should be >= 0");
    }
}
