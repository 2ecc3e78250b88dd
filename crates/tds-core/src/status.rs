use thiserror::Error;

/// Fatal causes of a failed decode.
///
/// Every variant aborts the whole decode; no partial scene is returned. The
/// only recoverable condition, an unrecognised chunk tag, never surfaces here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    #[error("Truncated stream: {0}")]
    TruncatedStream(String),
    #[error("Unresolved material reference: '{0}'")]
    UnresolvedMaterialReference(String),
    #[error("Face {face} is already assigned to a material group (while assigning '{material}')")]
    DuplicateMaterialAssignment { face: u32, material: String },
    #[error("Missing prerequisite chunk: {0}")]
    MissingPrerequisiteChunk(String),
    #[error("String exceeds {max_len} bytes without a terminator")]
    StringTooLong { max_len: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Duplicate chunk: {0}")]
    DuplicateChunk(String),
    #[error("{what} index {index} out of range (count {count})")]
    IndexOutOfRange {
        what: &'static str,
        index: u32,
        count: usize,
    },
    #[error("IO error: {0}")]
    Io(String),
}

pub type Status = Result<(), DecodeError>;

pub type DecodeResult<T> = Result<T, DecodeError>;

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Io(err.to_string())
    }
}

/// Failure reported by a [`ByteStream`](crate::byte_stream::ByteStream).
///
/// The stream also latches its bad flag whenever one of these is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    #[error("short read")]
    ShortRead,
    #[error("write failed")]
    WriteFailed,
    #[error("invalid seek")]
    InvalidSeek,
    #[error("string exceeds {0} bytes without a terminator")]
    StringTooLong(usize),
    #[error("invalid text token")]
    InvalidText,
    #[error("operation not supported by this backend")]
    Unsupported,
    #[error("stream is in the bad state")]
    Bad,
}

pub type StreamResult<T> = Result<T, StreamError>;

impl From<StreamError> for DecodeError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::StringTooLong(max_len) => DecodeError::StringTooLong { max_len },
            other => DecodeError::TruncatedStream(other.to_string()),
        }
    }
}
