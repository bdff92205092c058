//! Error taxonomy for the harness.

/// Errors surfaced by the bundle runner and its collaborators.
///
/// `trySplit` declining to split is not an error anywhere in this crate
/// family; those paths return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fatal at construction: the transform descriptor cannot be executed.
    #[error("invalid transform configuration: {0}")]
    Configuration(String),

    /// A capability was used outside the context that provides it.
    #[error("{0}")]
    Usage(String),

    /// A user callback failed. The original error is carried exactly once.
    #[error("user code failed: {0}")]
    UserCode(#[source] anyhow::Error),

    /// An encoded payload could not be read or written.
    #[error("codec error: {0}")]
    Codec(String),

    /// A state, timer, or data service call failed; passed through unchanged.
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Error::Codec(msg.into())
    }

    /// Wrap an error escaping a user callback.
    ///
    /// An error that is already a `UserCode` passes through untouched, so
    /// nested dispatch never double-wraps.
    pub fn user(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(wrapped @ Error::UserCode(_)) => wrapped,
            Ok(other) => Error::UserCode(anyhow::Error::new(other)),
            Err(err) => Error::UserCode(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_wrapped_once() {
        let inner = anyhow::anyhow!("boom");
        let wrapped = Error::user(inner);
        let rewrapped = Error::user(anyhow::Error::new(wrapped));
        match rewrapped {
            Error::UserCode(source) => {
                // Still the original failure, not a UserCode-of-UserCode.
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("expected UserCode, got {other:?}"),
        }
    }

    #[test]
    fn test_usage_error_from_callback_becomes_user_code() {
        let usage = Error::usage("no keyed context");
        match Error::user(anyhow::Error::new(usage)) {
            Error::UserCode(source) => assert!(source.to_string().contains("no keyed context")),
            other => panic!("expected UserCode, got {other:?}"),
        }
    }
}
