//! Error handling primitives shared across the core.
//!
//! Every error carries a stable numeric code so that the CLI exit status and
//! structured log lines stay comparable across releases.

use std::path::PathBuf;

/// Stable error codes surfaced as process exit codes and log fields.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Input or run configuration failed validation.
    InvalidInput = 1,
    /// The result sink or another file could not be opened or written.
    Io = 2,
    /// The example stream failed while producing an instance.
    Stream = 3,
    /// A registry lookup did not match any known component.
    UnknownComponent = 4,
    /// Configuration file could not be parsed.
    Config = 5,
}

/// Canonical error type for the core.
#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    /// Input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem failure tied to a concrete path.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stream fault while fetching an example.
    #[error("stream error: {0}")]
    Stream(String),

    /// No component registered under the requested name.
    #[error("unknown {kind} '{name}'")]
    UnknownComponent { kind: &'static str, name: String },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    /// Validation helper.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// IO helper keeping the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stream fault helper.
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Registry miss helper.
    pub fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownComponent {
            kind,
            name: name.into(),
        }
    }

    /// Stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EvalError::InvalidInput(_) => ErrorCode::InvalidInput,
            EvalError::Io { .. } => ErrorCode::Io,
            EvalError::Stream(_) => ErrorCode::Stream,
            EvalError::UnknownComponent { .. } => ErrorCode::UnknownComponent,
            EvalError::Config(_) => ErrorCode::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Ok as u32, 0);
        assert_eq!(ErrorCode::InvalidInput as u32, 1);
        assert_eq!(ErrorCode::Io as u32, 2);
        assert_eq!(ErrorCode::Stream as u32, 3);
        assert_eq!(ErrorCode::UnknownComponent as u32, 4);
        assert_eq!(ErrorCode::Config as u32, 5);
    }

    #[test]
    fn errors_map_to_codes() {
        let err = EvalError::io(
            "/nope",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.code(), ErrorCode::Io);
        assert!(err.to_string().contains("/nope"));
        assert_eq!(
            EvalError::unknown("learner", "oza").code(),
            ErrorCode::UnknownComponent
        );
        assert_eq!(EvalError::stream("eof").code(), ErrorCode::Stream);
    }
}
