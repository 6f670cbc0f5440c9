use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An identifier or CRN did not resolve to any record.
    #[error("{entity} was not found with: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },
    /// The caller broke an operation's contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The entity store failed or returned inconsistent data.
    #[error("entity store unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl Error {
    pub fn not_found(entity: &'static str, identifier: impl ToString) -> Self {
        Error::NotFound {
            entity,
            identifier: identifier.to_string(),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::UpstreamUnavailable(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::UpstreamUnavailable(err.to_string())
    }
}
