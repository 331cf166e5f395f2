//! match-wire: Matchmaking Wire Codec
//!
//! The protocol is deliberately tiny. Requests carry a `match://` marker
//! followed by `&`-joined `key=value` pairs; responses open with
//! `result://error=<code>` followed by further `&key=value` pairs. Error
//! codes are stable integers shared with deployed game clients.

use std::collections::HashMap;
use std::fmt::Display;

use thiserror::Error;

/// Marker prefixing every request body.
pub const REQUEST_MARKER: &str = "match://";

/// Marker prefixing every response body.
pub const RESPONSE_MARKER: &str = "result://";

/// Stable protocol error codes.
pub mod codes {
    pub const SUCCESS: u32 = 0;
    pub const QUERY_FAILED: u32 = 1;
    pub const OWNER_EXISTS: u32 = 2;
    pub const SESSION_EXISTS: u32 = 3;
    pub const INVALID_SESSION: u32 = 4;
    pub const INVALID_PASSWORD: u32 = 5;
    pub const NO_RESULTS: u32 = 6;
}

/// Wire decoding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WireError {
    #[error("Request body does not start with {}", REQUEST_MARKER)]
    MissingMarker,
}

/// Decode a request body into its key/value fields.
///
/// Pairs with an empty key or value are dropped; a duplicated key keeps the
/// last value. Keys are unordered.
pub fn decode_request(body: &str) -> Result<HashMap<String, String>, WireError> {
    let payload = body
        .strip_prefix(REQUEST_MARKER)
        .ok_or(WireError::MissingMarker)?;

    let mut fields = HashMap::new();
    for pair in payload.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if key.is_empty() || value.is_empty() {
            continue;
        }
        fields.insert(key.to_string(), value.to_string());
    }

    Ok(fields)
}

/// Builds a response body, keeping pairs in emission order.
pub struct ResponseWriter {
    buf: String,
}

impl ResponseWriter {
    /// Start a success response.
    pub fn success() -> Self {
        Self::with_code(codes::SUCCESS)
    }

    /// Start an error response with the given code.
    pub fn error(code: u32) -> Self {
        Self::with_code(code)
    }

    fn with_code(code: u32) -> Self {
        Self {
            buf: format!("{}error={}", RESPONSE_MARKER, code),
        }
    }

    /// Append a key/value pair.
    pub fn push(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.buf.push('&');
        self.buf.push_str(key);
        self.buf.push('=');
        self.buf.push_str(&value.to_string());
        self
    }

    /// Finish and return the response body.
    pub fn finish(self) -> String {
        self.buf
    }
}
