//! Error types for the file serving pipeline

use thiserror::Error;

use crate::http::response::{Response, StatusCode};

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ServeError>;

/// Why a request could not be answered with a file or listing.
///
/// `PathRejected` and `NotFound` produce byte-identical 404 responses so a
/// client cannot tell a hidden path from a missing or unreadable one.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("path contains a hidden segment")]
    PathRejected,

    #[error("resource not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("listing render failed: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::PathRejected | ServeError::NotFound => StatusCode::NotFound,
            ServeError::MethodNotAllowed => StatusCode::MethodNotAllowed,
            ServeError::Render(_) | ServeError::Io(_) => StatusCode::InternalServerError,
        }
    }

    pub fn into_response(self) -> Response {
        match self.status() {
            StatusCode::NotFound => Response::not_found(),
            StatusCode::MethodNotAllowed => Response::method_not_allowed(),
            _ => Response::internal_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_faults_become_internal_errors() {
        let render = ServeError::from(std::fmt::Error).into_response();
        assert_eq!(render.status, StatusCode::InternalServerError);

        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "short read");
        let response = ServeError::from(io).into_response();
        assert_eq!(response.status, StatusCode::InternalServerError);
    }

    #[test]
    fn rejected_and_missing_paths_look_the_same() {
        let rejected = ServeError::PathRejected.into_response();
        let missing = ServeError::NotFound.into_response();

        assert_eq!(rejected.status, StatusCode::NotFound);
        assert_eq!(rejected.headers, missing.headers);
    }
}
