/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the relay core
/// can handle failures consistently (expected-and-swallowed vs surfaced).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// The referenced message no longer exists on the platform. Expected on
    /// follow-up fetches and cascading deletes; callers swallow it.
    #[error("message not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
