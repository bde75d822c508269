//! HTTP mapping for crate errors.
//!
//! Record-level conditions reach the client with their message; storage and
//! I/O faults are logged and replaced by a generic body.

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

use crate::error::Error;

const INTERNAL_MESSAGE: &str = "Internal server error";

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.is_invalid_input() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status)
            .content_type(ContentType::plaintext())
            .body(body)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::MessageBody;

    use super::*;

    fn body_of(err: &Error) -> String {
        let bytes = err.error_response().into_body().try_into_bytes().unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_not_found_is_404() {
        let err = Error::staff_not_found("id 9");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(&err), "staff not found: id 9");
    }

    #[test]
    fn test_invalid_input_is_400() {
        let err = Error::invalid_input("staff_id", "must be a number");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(body_of(&err).contains("staff_id"));

        let err = Error::UnknownOutcome("Escaped".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_faults_are_redacted() {
        let err = Error::DatabaseQuery(rusqlite::Error::InvalidQuery);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(&err), INTERNAL_MESSAGE);

        let err = Error::internal("lock poisoned at storage.rs:42");
        assert_eq!(body_of(&err), INTERNAL_MESSAGE);
    }
}
