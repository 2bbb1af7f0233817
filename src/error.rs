//! Error types for the rating engine
//!
//! Library functions return the crate-wide `anyhow`-backed [`Result`]; the
//! variants below describe the failures a caller may want to match on.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid score record: {reason}")]
    InvalidScore { reason: String },

    #[error("Configuration error: {message}")]
    InvalidConfiguration { message: String },

    #[error("Persistence failed: {message}")]
    Persistence { message: String },

    #[error("Match {match_id} exceeded the processing timeout of {seconds}s")]
    ProcessingTimeout { match_id: String, seconds: u64 },

    #[error("Internal engine error: {message}")]
    Internal { message: String },
}
