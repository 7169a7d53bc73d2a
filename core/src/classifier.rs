//! Classification of transport failures into [`NetworkFailure`].
//!
//! Both functions are pure: the same input always yields the same failure.

use serde::Deserialize;

use crate::error::{NetworkFailure, TransportError};
use crate::http::HttpResponse;

/// Used when neither the body nor the status line says anything.
pub const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

/// Map a transport failure to exactly one [`NetworkFailure`].
pub fn classify(error: &TransportError) -> NetworkFailure {
    match error {
        TransportError::HostUnresolved | TransportError::ConnectionRefused => {
            NetworkFailure::NoConnectivity
        }
        TransportError::Timeout => NetworkFailure::RequestTimeout,
        TransportError::Tls(_) => NetworkFailure::Unknown,
        TransportError::Status { status, reason, body } => classify_status(*status, reason, body.as_deref()),
        TransportError::Io(_) => NetworkFailure::RequestTimeout,
        TransportError::Other(_) => NetworkFailure::Unknown,
    }
}

fn classify_status(status: u16, reason: &str, body: Option<&str>) -> NetworkFailure {
    match status {
        403 => NetworkFailure::AccessDenied,
        408 => NetworkFailure::RequestTimeout,
        413 => NetworkFailure::PayloadTooLarge,
        500 | 503 => NetworkFailure::ServerError(Some(extract_message(body, reason))),
        _ => NetworkFailure::Unknown,
    }
}

/// Message to show for an unsuccessful response: the body's `"message"`
/// field, else the status line, else [`UNKNOWN_SERVER_ERROR`].
pub fn server_error_message(response: &HttpResponse) -> String {
    extract_message(Some(&response.body), &response.reason)
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn extract_message(body: Option<&str>, reason: &str) -> String {
    let from_body = body
        .and_then(|raw| serde_json::from_str::<ErrorBody>(raw).ok())
        .and_then(|parsed| parsed.message);
    match from_body {
        Some(message) => message,
        None if !reason.trim().is_empty() => reason.to_string(),
        None => UNKNOWN_SERVER_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn status(status: u16, reason: &str, body: Option<&str>) -> TransportError {
        TransportError::Status {
            status,
            reason: reason.to_string(),
            body: body.map(str::to_string),
        }
    }

    #[rstest]
    #[case(TransportError::HostUnresolved, NetworkFailure::NoConnectivity)]
    #[case(TransportError::ConnectionRefused, NetworkFailure::NoConnectivity)]
    #[case(TransportError::Timeout, NetworkFailure::RequestTimeout)]
    #[case(TransportError::Tls("bad certificate".into()), NetworkFailure::Unknown)]
    #[case(TransportError::Io("broken pipe".into()), NetworkFailure::RequestTimeout)]
    #[case(TransportError::Other("redirect loop".into()), NetworkFailure::Unknown)]
    #[case(status(403, "Forbidden", None), NetworkFailure::AccessDenied)]
    #[case(status(408, "Request Timeout", None), NetworkFailure::RequestTimeout)]
    #[case(status(413, "Payload Too Large", None), NetworkFailure::PayloadTooLarge)]
    #[case(status(404, "Not Found", None), NetworkFailure::Unknown)]
    #[case(status(429, "Too Many Requests", None), NetworkFailure::Unknown)]
    fn classifies_by_priority(#[case] input: TransportError, #[case] expected: NetworkFailure) {
        assert_eq!(classify(&input), expected);
    }

    #[test]
    fn server_status_takes_message_from_body() {
        let err = status(500, "Internal Server Error", Some(r#"{"message":"Server error, resource not available"}"#));
        assert_eq!(
            classify(&err),
            NetworkFailure::server_error("Server error, resource not available")
        );
    }

    #[test]
    fn server_status_falls_back_to_reason_line() {
        let err = status(503, "Service Unavailable", Some("<html>down</html>"));
        assert_eq!(classify(&err), NetworkFailure::server_error("Service Unavailable"));

        let err = status(500, "Internal Server Error", Some(r#"{"error":"nope"}"#));
        assert_eq!(classify(&err), NetworkFailure::server_error("Internal Server Error"));
    }

    #[test]
    fn server_status_without_anything_uses_generic_text() {
        let err = status(500, "", None);
        assert_eq!(classify(&err), NetworkFailure::server_error(UNKNOWN_SERVER_ERROR));
    }

    #[test]
    fn classification_is_stable_across_calls() {
        let inputs = [
            TransportError::Timeout,
            status(500, "Internal Server Error", Some(r#"{"message":"boom"}"#)),
            TransportError::Io("reset".into()),
        ];
        for input in &inputs {
            assert_eq!(classify(input), classify(input));
        }
    }

    #[test]
    fn server_error_message_reads_response() {
        let response = HttpResponse {
            status: 500,
            reason: "Internal Server Error".to_string(),
            headers: Vec::new(),
            body: r#"{"message":"resource not available"}"#.to_string(),
        };
        assert_eq!(server_error_message(&response), "resource not available");

        let response = HttpResponse {
            body: String::new(),
            ..response
        };
        assert_eq!(server_error_message(&response), "Internal Server Error");
    }
}
