#![forbid(unsafe_code)]

use rusqlite::ErrorCode;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    UnknownId { id: i64 },
    UnknownName { name: String },
    EmptyChain,
    NameTaken { name: String },
    NextTaken { next: String, holder: String },
    NotAdjacent { prev: String, next: String },
    TailOccupied { prev: String, successor: String },
    CorruptChain(&'static str),
    Busy,
}

impl StoreError {
    /// Stable machine-readable code; the transport layer maps these onto its
    /// own status vocabulary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UnknownId { .. } | Self::UnknownName { .. } | Self::EmptyChain => "NOT_FOUND",
            Self::NameTaken { .. }
            | Self::NextTaken { .. }
            | Self::NotAdjacent { .. }
            | Self::TailOccupied { .. } => "CONFLICT",
            Self::CorruptChain(_) => "INTERNAL",
            Self::Busy => "TRANSIENT",
        }
    }

    /// Transient failures abort the whole transaction, so the caller may
    /// safely retry the operation from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownId { id } => write!(f, "no entry with id {id}"),
            Self::UnknownName { name } => write!(f, "no entry named {name}"),
            Self::EmptyChain => write!(f, "the chain is empty"),
            Self::NameTaken { name } => write!(f, "name already taken: {name}"),
            Self::NextTaken { next, holder } => {
                write!(f, "{holder} already refers to {next} as next")
            }
            Self::NotAdjacent { prev, next } => {
                write!(f, "{prev} is not currently followed by {next}")
            }
            Self::TailOccupied { prev, successor } => {
                write!(f, "{prev} is not the tail, it refers to {successor}")
            }
            Self::CorruptChain(message) => write!(f, "chain invariant violated: {message}"),
            Self::Busy => write!(f, "storage busy, retry the operation"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &value {
            if matches!(
                code.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) {
                return Self::Busy;
            }
        }
        Self::Sql(value)
    }
}
