use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{0}")]
    BadParams(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("{0}")]
    EmptyImport(String),
    #[error("{0}")]
    NoSelection(String),
    #[error("{0}")]
    ConfirmRequired(String),
    #[error("{0}")]
    Io(String),
    #[error("database error: {0}")]
    Db(String),
}

impl RosterError {
    /// Stable code carried in the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadParams(_) => "bad_params",
            Self::NotFound(_) => "not_found",
            Self::InvalidSnapshot(_) => "invalid_snapshot",
            Self::EmptyImport(_) => "empty_import",
            Self::NoSelection(_) => "no_selection",
            Self::ConfirmRequired(_) => "confirm_required",
            Self::Io(_) => "io_failed",
            Self::Db(_) => "db_failed",
        }
    }
}

impl From<rusqlite::Error> for RosterError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Db(e.to_string())
    }
}

pub type RosterResult<T> = Result<T, RosterError>;
