//! Opaque connection cursors
//!
//! A cursor is `base64("<tag>:<key>")`, the Relay global id layout. The tag
//! names the collection an edge belongs to and the key identifies the record
//! inside it.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

/// Upper bound on the length of an incoming cursor, checked before decoding.
pub const MAX_CURSOR_LEN: usize = 1024;

/// Cursor decode failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is empty")]
    Empty,

    #[error("cursor exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("cursor is not valid base64 text: {0}")]
    Malformed(String),

    #[error("cursor has no tag separator")]
    MissingSeparator,

    #[error("cursor belongs to `{found}`, expected `{expected}`")]
    TagMismatch { expected: String, found: String },

    #[error("cursor key `{0}` is not a valid record key")]
    InvalidKey(String),

    #[error("cursor references record `{0}` which does not exist")]
    UnknownRecord(String),
}

/// Decoded cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub tag: String,
    pub key: String,
}

impl Cursor {
    pub fn new(tag: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            key: key.into(),
        }
    }

    pub fn encode(&self) -> String {
        CursorCodec::encode(&self.tag, &self.key)
    }
}

/// Cursor encoding/decoding
pub struct CursorCodec;

impl CursorCodec {
    /// Encode a (tag, key) pair
    pub fn encode(tag: &str, key: &str) -> String {
        BASE64.encode(format!("{tag}:{key}").as_bytes())
    }

    /// Decode a cursor without checking its tag.
    ///
    /// Input is cleansed first; see [`cleanse`].
    pub fn decode(cursor: &str) -> Result<Cursor, CursorError> {
        let cursor = cleanse(cursor);
        if cursor.is_empty() {
            return Err(CursorError::Empty);
        }
        if cursor.len() > MAX_CURSOR_LEN {
            return Err(CursorError::TooLong {
                len: cursor.len(),
                max: MAX_CURSOR_LEN,
            });
        }

        let bytes = BASE64
            .decode(cursor.as_bytes())
            .map_err(|e| CursorError::Malformed(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| CursorError::Malformed(e.to_string()))?;

        // Keys may contain ':' themselves, so split on the first one only.
        let (tag, key) = text
            .split_once(':')
            .ok_or(CursorError::MissingSeparator)?;

        if !is_valid_key(key) {
            return Err(CursorError::InvalidKey(key.to_string()));
        }

        Ok(Cursor::new(tag, key))
    }

    /// Decode a cursor that must belong to `expected_tag`, returning its key.
    pub fn decode_for(expected_tag: &str, cursor: &str) -> Result<String, CursorError> {
        let decoded = Self::decode(cursor)?;
        if decoded.tag != expected_tag {
            return Err(CursorError::TagMismatch {
                expected: expected_tag.to_string(),
                found: decoded.tag,
            });
        }
        Ok(decoded.key)
    }
}

/// Trim surrounding whitespace and drop control characters.
pub fn cleanse(input: &str) -> String {
    input.trim().chars().filter(|c| !c.is_control()).collect()
}

/// Document-store key alphabet.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(
                    c,
                    '_' | '-' | ':' | '.' | '@' | '(' | ')' | '+' | ',' | '=' | ';' | '$' | '!'
                        | '*' | '\'' | '%'
                )
        })
}
