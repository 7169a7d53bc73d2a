//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds `HttpRequest` values and parses `HttpResponse` values; executing
//! the round-trip is the job of a [`Transport`](crate::transport::Transport),
//! either the bundled `reqwest` one or a host-provided implementation.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross thread
//! and FFI boundaries without lifetime concerns.

/// An HTTP GET request described as plain data.
///
/// Built by `PokedexClient::build_*` methods. Every endpoint of the catalog
/// API is a read, so there is no method field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
///
/// `reason` is the status line text (e.g. "Internal Server Error"); it is
/// the fallback message for server errors whose body carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// A 2xx response whose body is empty or whitespace carries no payload.
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn success_covers_2xx_only() {
        assert!(response(200, "").is_success());
        assert!(response(204, "").is_success());
        assert!(!response(199, "").is_success());
        assert!(!response(301, "").is_success());
        assert!(!response(500, "").is_success());
    }

    #[test]
    fn whitespace_body_counts_as_absent() {
        assert!(!response(200, "").has_body());
        assert!(!response(200, " \n\t").has_body());
        assert!(response(200, "{}").has_body());
    }
}
