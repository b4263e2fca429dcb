pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Confirmation code hashing error: {0}")]
    CodeHashError(#[from] argon2::password_hash::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),

    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl Error {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Error::RecordNotFound(what.into())
    }

    /// Maps unique constraint violation to [`Error::Conflict`]
    pub(crate) fn on_unique_violation(e: sqlx::Error, msg: impl Into<String>) -> Self {
        let unique = e
            .as_database_error()
            .map(|db_err| db_err.is_unique_violation())
            .unwrap_or(false);
        if unique {
            Error::Conflict(msg.into())
        } else {
            Error::DatabaseError(e)
        }
    }
}
