use thiserror::Error;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("Malformed ship {name:?}: {reason}")]
    MalformedShip { name: String, reason: String },
    #[error("Malformed progress snapshot: {detail}")]
    MalformedProgress { detail: String },
    #[error("Duplicate ship name in catalog: {name}")]
    DuplicateShip { name: String },
    #[error("Ship not found in catalog: {name}")]
    UnknownShip { name: String },
    #[error("Stage index {index} out of range for {ship} ({stage_count} stages)")]
    StageOutOfRange {
        ship: String,
        index: usize,
        stage_count: usize,
    },
    #[error("Sub-type {sub_type:?} listed in both {first} and {second}")]
    DuplicateSubType {
        sub_type: String,
        first: String,
        second: String,
    },
    #[error("Category id {id:?} is reserved")]
    ReservedCategory { id: String },
    #[cfg(feature = "json")]
    #[error("Error serializing or deserializing json: {err}")]
    SerdeJson {
        #[from]
        err: serde_json::Error,
    },
    #[error("Failed to persist progress snapshot: {detail}")]
    Persist { detail: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { kind }
    }
}

#[cfg(feature = "json")]
impl std::convert::From<serde_json::Error> for Error {
    fn from(x: serde_json::Error) -> Error {
        Error { kind: x.into() }
    }
}

pub type IResult<T> = Result<T, Error>;
