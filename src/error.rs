/// Error taxonomy shared by every remote operation.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Non-success response from the remote API.
    #[error("{message} (HTTP {status})")]
    Transport { status: u16, message: String },

    /// A write or delete carried a content hash that no longer matches the
    /// remote entry. Re-read and re-attempt.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The remote returned a payload without inline base64 content
    /// (oversized files, submodules).
    #[error("unsupported content encoding for {path}: {}", .encoding.as_deref().unwrap_or("none"))]
    UnsupportedEncoding {
        path: String,
        encoding: Option<String>,
    },

    #[error("{path} is a directory")]
    IsDirectory { path: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("content of {path} is not valid UTF-8")]
    InvalidText { path: String },

    /// The request never produced an HTTP status.
    #[error("request failed: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    /// A local archive could not be read.
    #[error("archive error: {0}")]
    Archive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub const CONFLICT_STATUS: u16 = 409;
pub const NOT_FOUND_STATUS: u16 = 404;

impl Error {
    /// Build the error for a non-success status, splitting out conflicts.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == CONFLICT_STATUS {
            Error::Conflict { message }
        } else {
            Error::Transport { status, message }
        }
    }

    /// HTTP status carried by this error, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => Some(*status),
            Error::Conflict { .. } => Some(CONFLICT_STATUS),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(NOT_FOUND_STATUS)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_split_by_status() {
        let err = Error::from_status(409, "does not match abc");
        assert!(err.is_conflict());
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "conflict: does not match abc");
    }

    #[test]
    fn not_found_keeps_remote_message() {
        let err = Error::from_status(404, "Not Found");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "Not Found (HTTP 404)");
    }

    #[test]
    fn local_errors_have_no_status() {
        assert_eq!(Error::Network("timed out".into()).status(), None);
        assert!(!Error::InvalidPath(String::new()).is_not_found());
        assert_eq!(Error::Archive("bad header".into()).status(), None);
    }

    #[test]
    fn unsupported_encoding_names_encoding() {
        let err = Error::UnsupportedEncoding {
            path: "big.bin".into(),
            encoding: Some("none".into()),
        };
        assert_eq!(
            err.to_string(),
            "unsupported content encoding for big.bin: none"
        );
    }
}
