use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Lookup of an account that does not exist
    ///
    /// Recoverable locally; the presentation layer renders it as
    /// "user not registered".
    #[error("account not found: {0}")]
    NotFound(String),

    /// Attempted creation of an account whose identity already exists
    ///
    /// A caller-side logic error (lookup should have run first); surfaced
    /// rather than silently swallowed.
    #[error("account already exists: {0}")]
    DuplicateAccount(String),

    /// The connection pool could not hand out a connection
    ///
    /// The only condition warranting a retry; never rendered as
    /// "user not found".
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] r2d2::Error),

    /// Database-related errors
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
