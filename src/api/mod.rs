//! Axum HTTP handlers. Library errors are mapped to status codes here;
//! user-visible messaging is the orchestrating layer's job, never the
//! retrieval core's.

pub mod ask;
pub mod documents;
pub mod questions;

use axum::http::StatusCode;

use crate::error::Error;

/// Map the error taxonomy onto HTTP statuses: missing documents are the
/// caller's mistake, provider failures are upstream problems, timeouts
/// get their own signal.
pub(crate) fn error_response(e: Error) -> (StatusCode, String) {
    let status = match &e {
        Error::Load(_) => StatusCode::NOT_FOUND,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Embedding(_) | Error::Synthesis(_) | Error::Initialization(_) => {
            StatusCode::BAD_GATEWAY
        }
        Error::CorruptIndex(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_504() {
        let (status, _) = error_response(Error::Timeout("embed".into()));
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_load_maps_to_404() {
        let (status, _) = error_response(Error::Load("missing".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_provider_failure_maps_to_502() {
        let (status, _) = error_response(Error::Synthesis("500 from provider".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
