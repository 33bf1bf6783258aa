//! Structured error carrier shared by design-time validation and decode-time
//! failures. Errors accumulate through [`merge_errors`] so independent
//! failures surface as one coherent message instead of only the first.

use std::collections::BTreeMap;

/// A structured error: class code, HTTP status, occurrence detail and
/// contextual metadata.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{status} {code}: {detail}")]
pub struct Error {
    pub code: String,
    pub status: u16,
    pub detail: String,
    pub meta: BTreeMap<String, String>,
}

impl Error {
    /// Add a key/value pair to the error metadata.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// An error-generating class: a code plus the HTTP status of responses that
/// carry it. Clients guarantee uniqueness of codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClass {
    pub code: &'static str,
    pub status: u16,
}

impl ErrorClass {
    pub const fn new(code: &'static str, status: u16) -> Self {
        ErrorClass { code, status }
    }

    /// Build an error of this class with the given occurrence detail.
    pub fn error(&self, detail: impl Into<String>) -> Error {
        Error {
            code: self.code.to_string(),
            status: self.status,
            detail: detail.into(),
            meta: BTreeMap::new(),
        }
    }
}

/// Generic bad request.
pub const BAD_REQUEST: ErrorClass = ErrorClass::new("bad_request", 400);
/// Structural inconsistency in a design, reported before any generation.
pub const INVALID_DESIGN: ErrorClass = ErrorClass::new("invalid_design", 400);
/// Wire response with a status code no response descriptor covers.
pub const INVALID_RESPONSE: ErrorClass = ErrorClass::new("invalid_response", 400);
/// Malformed payload for the expected body shape, or unconvertible header text.
pub const DECODING_ERROR: ErrorClass = ErrorClass::new("decoding_error", 400);
/// Decoded value violates the result type's own validation rules, or an
/// unknown view discriminator was received.
pub const VALIDATION_ERROR: ErrorClass = ErrorClass::new("validation_error", 400);
/// A required header is absent from the wire response.
pub const MISSING_HEADER: ErrorClass = ErrorClass::new("missing_header", 400);
/// Uncaught failures.
pub const INTERNAL_ERROR: ErrorClass = ErrorClass::new("internal_error", 500);

/// Merge two optional errors. A missing side adopts the other. Otherwise:
/// any 500 makes the result a 500 `internal_error` (an already-internal left
/// side keeps its code); disagreeing code/status degrade to a 400
/// `bad_request`; details join with `"; "`; metadata merges with the right
/// side overwriting on key collision.
pub fn merge_errors(a: Option<Error>, b: Option<Error>) -> Option<Error> {
    let mut a = match a {
        Some(a) => a,
        None => return b,
    };
    let b = match b {
        Some(b) => b,
        None => return Some(a),
    };
    if a.status == 500 {
        // keep a's code
    } else if b.status == 500 {
        a.status = 500;
        a.code = INTERNAL_ERROR.code.to_string();
    } else if a.status != b.status || a.code != b.code {
        a.status = BAD_REQUEST.status;
        a.code = BAD_REQUEST.code.to_string();
    }
    a.detail = format!("{}; {}", a.detail, b.detail);
    a.meta.extend(b.meta);
    Some(a)
}
