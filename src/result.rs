use crate::concurrency::TransactionId;

use std::{
    error::Error as StdError,
    fmt::{self, Display},
    io,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    MalformedData(String),
    TypeMismatch(String),
    AmbiguousName(String),
    NotFound(String),
    InvalidRid(String),
    PageFull,
    BufferFull,
    TxAlreadyRunning(TransactionId),
    TxAborted(TransactionId),
}

impl From<io::Error> for Error {
    fn from(ioe: io::Error) -> Self {
        Error::Io(ioe)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        use self::Error::*;

        match *self {
            Io(ref e) => write!(f, "IO error: {}", e),
            MalformedData(ref e) => write!(f, "Malformed data: {}", e),
            TypeMismatch(ref e) => write!(f, "Type mismatch: {}", e),
            AmbiguousName(ref e) => write!(f, "Ambiguous name: {}", e),
            NotFound(ref e) => write!(f, "Not found: {}", e),
            InvalidRid(ref e) => write!(f, "Invalid rid: {}", e),
            PageFull => write!(f, "Page has no free slot."),
            BufferFull => write!(f, "Buffer pool is full of dirty pages."),
            TxAlreadyRunning(tx) => write!(f, "Transaction {} is already running.", tx),
            TxAborted(tx) => write!(f, "Transaction {} aborted by validation.", tx),
        }
    }
}
