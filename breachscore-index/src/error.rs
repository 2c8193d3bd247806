/// Backend failures from either storage implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lmdb error: {0}")]
    Lmdb(#[from] heed3::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed digest text {text:?}: expected 40 hex characters")]
    MalformedDigest { text: String },

    #[error("invalid occurrence count {count}: must be positive and fit the record count field")]
    InvalidCount { count: u64 },

    #[error("corrupt record: {reason}")]
    CorruptRecord { reason: &'static str },

    #[error("malformed corpus line {line}: {reason}")]
    MalformedCorpusLine { line: u64, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StoreUnavailable(StoreError::Io(e))
    }
}

impl From<heed3::Error> for Error {
    fn from(e: heed3::Error) -> Self {
        Error::StoreUnavailable(StoreError::Lmdb(e))
    }
}
