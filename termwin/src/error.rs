// ABOUTME: Error type shared by buffers, window handles and sessions.
// ABOUTME: Routine native draw failures are booleans, not errors; see the variants below.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Argument rejected before any native state was touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid buffer length {0}")]
    InvalidLength(i64),

    /// Operation attempted on a closed window handle.
    #[error("attempt to use closed window")]
    ClosedResource,

    /// The engine refused an operation that has no boolean outcome.
    #[error("{0} failed")]
    OperationFailed(&'static str),

    #[error("failed to create window")]
    ResourceExhausted,

    #[error("failed to initialize terminal engine")]
    InitializationFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
