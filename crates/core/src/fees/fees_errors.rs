use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeeError {
    /// Raised when a calculation is attempted without a defined NAV at a
    /// period boundary.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Raised on invalid fee-record state transitions, e.g. paying a
    /// record twice.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Fee record not found: {0}")]
    NotFound(String),
}
