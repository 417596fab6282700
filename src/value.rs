// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::Bytes;
use thiserror::Error as ThisError;

/// Hard cap on bulk string payloads. Real Redis allows 512 MB; this server
/// caps at 1 MiB.
pub const MAX_BULK: usize = 1024 * 1024;

/// Error code attached to replies when no more specific code applies.
pub const DEFAULT_ERROR_CODE: &str = "ERR";

#[derive(Debug, ThisError, PartialEq)]
pub enum ValueError {
    #[error("Cannot allocate a bulk string of length {0} because it exceeds max allowed size of 1MB")]
    BulkTooLarge(usize),
}

/// A single RESP value. Requests arrive as `Array`s of these; replies are
/// built from the other variants and rendered back to the client as text.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Simple(String),
    Error { code: String, message: String },
    Integer(i64),
    /// Binary-safe payload, or the explicit null bulk string.
    Bulk(Option<Bytes>),
    Array(Vec<Value>),
}

impl Value {
    /// Creates a bulk string, rejecting payloads over [`MAX_BULK`].
    pub fn bulk(data: impl Into<Bytes>) -> Result<Value, ValueError> {
        let data = data.into();
        if data.len() > MAX_BULK {
            return Err(ValueError::BulkTooLarge(data.len()));
        }
        Ok(Value::Bulk(Some(data)))
    }

    /// The null bulk string, rendered as `(nil)`.
    pub fn null() -> Value {
        Value::Bulk(None)
    }

    pub fn ok() -> Value {
        Value::Simple("OK".to_string())
    }

    /// An error reply carrying the default `ERR` code.
    pub fn error(message: impl Into<String>) -> Value {
        Value::Error {
            code: DEFAULT_ERROR_CODE.to_string(),
            message: message.into(),
        }
    }

    /// Human-readable rendering used for server-to-client replies. One reply
    /// is this text followed by a line feed.
    pub fn render(&self) -> String {
        match self {
            Value::Simple(s) => s.clone(),
            Value::Error { code, message } => format!("{code}{{{message}}}"),
            Value::Integer(n) => n.to_string(),
            Value::Bulk(None) => "(nil)".to_string(),
            Value::Bulk(Some(data)) => String::from_utf8_lossy(data).into_owned(),
            Value::Array(items) => {
                let items: Vec<String> = items.iter().map(Value::render).collect();
                format!("[{}]", items.join(","))
            }
        }
    }

    /// Serializes the value in RESP wire format. Requests are framed this
    /// way by the bundled client; replies use [`Value::render`] instead.
    pub fn to_resp(&self) -> Vec<u8> {
        match self {
            Value::Simple(s) => format!("+{s}\r\n").into_bytes(),
            Value::Error { code, message } => format!("-{code} {message}\r\n").into_bytes(),
            Value::Integer(n) => format!(":{n}\r\n").into_bytes(),
            Value::Bulk(None) => b"$-1\r\n".to_vec(),
            Value::Bulk(Some(data)) => {
                let mut bytes = format!("${}\r\n", data.len()).into_bytes();
                bytes.extend_from_slice(data);
                bytes.extend_from_slice(b"\r\n");
                bytes
            }
            Value::Array(items) => {
                let mut bytes = format!("*{}\r\n", items.len()).into_bytes();
                for item in items {
                    bytes.extend(item.to_resp());
                }
                bytes
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
