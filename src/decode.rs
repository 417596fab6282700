//! Fault-tolerant RESP request decoder.
//!
//! [`parse_request`] turns one chunk of client bytes into the sequence of
//! command arrays it contains. Any parsing fault is surfaced as a structured
//! [`DecodeError`] next to the commands decoded before the fault, so a
//! pipeline is never lost wholesale to one bad frame.

use bytes::Bytes;
use thiserror::Error as ThisError;

use crate::value::{Value, DEFAULT_ERROR_CODE, MAX_BULK};

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const SIMPLE_STRING_TAG: u8 = b'+';
const ERROR_TAG: u8 = b'-';
const INTEGER_TAG: u8 = b':';
const BULK_STRING_TAG: u8 = b'$';
const ARRAY_TAG: u8 = b'*';

/// Error code for framing-level faults: empty input and tag mismatches.
pub const INVALID_BYTE_SEQ_CODE: &str = "IVBYSEQ";

#[derive(Debug, ThisError, PartialEq)]
pub enum DecodeError {
    #[error("Cannot parse empty byte stream")]
    EmptyStream,
    #[error("Expected start byte to be '{expected}', instead got '{found}'")]
    TagMismatch { expected: char, found: char },
    #[error("Invalid integer sequence supplied: {0}")]
    InvalidInteger(String),
    #[error("Bulk string length exceeds maximum allowed size of 1MB")]
    BulkTooLarge,
    #[error("Bulk string length must be greater than -1")]
    NegativeBulkLength,
    #[error("Bulk string length {actual} does not match expected length of {declared}")]
    BulkLengthMismatch { declared: i64, actual: usize },
    #[error("Cannot allocate Array with size {0}, size has to be >= 0")]
    NegativeArrayLength(i64),
    #[error("RESP Array index {index} exceeds specified capacity of {capacity}")]
    ArrayOverflow { index: usize, capacity: i64 },
    #[error("Unknown start byte '{0}'")]
    UnknownTag(char),
}

impl DecodeError {
    /// The error code carried by the reply for this fault.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::EmptyStream | DecodeError::TagMismatch { .. } => INVALID_BYTE_SEQ_CODE,
            _ => DEFAULT_ERROR_CODE,
        }
    }

    pub fn to_reply(&self) -> Value {
        Value::Error {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Outcome of decoding one chunk of client bytes. Commands decoded before a
/// fault are preserved alongside the fault itself.
#[derive(Debug, PartialEq)]
pub struct Decoded {
    pub commands: Vec<Value>,
    pub consumed: usize,
    pub error: Option<DecodeError>,
}

type Parsed<T> = Result<(T, usize), DecodeError>;

/// Decodes every pipelined command array in `bytes`. Faults stop the scan
/// and are reported in [`Decoded::error`]; earlier commands still execute.
pub fn parse_request(bytes: &[u8]) -> Decoded {
    let mut commands = Vec::new();
    let mut consumed = 0;
    let mut rest = bytes;

    while !rest.is_empty() {
        // Bound each command's parse at the next array start byte so one
        // command's parser cannot run into the bytes of the next pipelined
        // command.
        let bound = next_array_start(rest);
        match parse_array(&rest[..bound]) {
            Ok((command, read)) if read > 0 => {
                commands.push(command);
                rest = &rest[read..];
                consumed += read;
            }
            Ok(_) => break,
            Err(error) => {
                return Decoded {
                    commands,
                    consumed,
                    error: Some(error),
                }
            }
        }
    }

    Decoded {
        commands,
        consumed,
        error: None,
    }
}

/// Index of the next `*` after the first byte, or the slice length.
fn next_array_start(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .skip(1)
        .position(|&b| b == ARRAY_TAG)
        .map(|at| at + 1)
        .unwrap_or(bytes.len())
}

fn expect_tag(bytes: &[u8], tag: u8) -> Result<(), DecodeError> {
    match bytes.first() {
        None => Err(DecodeError::EmptyStream),
        Some(&found) if found != tag => Err(DecodeError::TagMismatch {
            expected: tag as char,
            found: found as char,
        }),
        Some(_) => Ok(()),
    }
}

/// Reads bytes up to and including the line feed, stripping every carriage
/// return. Returns the line body and the number of bytes consumed. A missing
/// `\r` is tolerated; `\n` alone delimits the line.
fn read_line(bytes: &[u8], skip_first: bool) -> (Vec<u8>, usize) {
    let mut body = Vec::new();
    let mut consumed = 0;
    let start = if skip_first && !bytes.is_empty() {
        consumed = 1;
        1
    } else {
        0
    };
    for &byte in &bytes[start..] {
        consumed += 1;
        if byte == LF {
            break;
        }
        if byte != CR {
            body.push(byte);
        }
    }
    (body, consumed)
}

fn parse_simple_string(bytes: &[u8]) -> Parsed<Value> {
    expect_tag(bytes, SIMPLE_STRING_TAG)?;
    let (body, consumed) = read_line(bytes, true);
    let value = Value::Simple(String::from_utf8_lossy(&body).into_owned());
    Ok((value, consumed))
}

/// Errors split into a code and a message at the first space; without a
/// space the whole body is the code.
fn parse_error(bytes: &[u8]) -> Parsed<Value> {
    expect_tag(bytes, ERROR_TAG)?;
    let (body, consumed) = read_line(bytes, true);
    let body = String::from_utf8_lossy(&body).into_owned();
    let (code, message) = match body.find(' ') {
        Some(at) => (body[..at].to_string(), body[at + 1..].to_string()),
        None => (body, String::new()),
    };
    Ok((Value::Error { code, message }, consumed))
}

fn parse_integer(bytes: &[u8]) -> Parsed<Value> {
    let (n, consumed) = parse_length(bytes, INTEGER_TAG)?;
    Ok((Value::Integer(n), consumed))
}

/// Parses the signed decimal line shared by integers, bulk string headers
/// and array headers.
fn parse_length(bytes: &[u8], tag: u8) -> Parsed<i64> {
    expect_tag(bytes, tag)?;
    let (body, consumed) = read_line(bytes, true);
    let literal = String::from_utf8_lossy(&body).into_owned();
    let n = literal
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidInteger(literal))?;
    Ok((n, consumed))
}

fn parse_bulk_string(bytes: &[u8]) -> Parsed<Value> {
    let (declared, consumed) = parse_length(bytes, BULK_STRING_TAG)?;
    if declared > MAX_BULK as i64 {
        return Err(DecodeError::BulkTooLarge);
    }
    if declared < -1 {
        return Err(DecodeError::NegativeBulkLength);
    }
    if declared == -1 {
        return Ok((Value::Bulk(None), consumed));
    }
    if declared == 0 {
        // The empty bulk string is header-only on this wire: no payload line
        // follows, so no trailing CRLF is consumed.
        return Ok((Value::Bulk(Some(Bytes::new())), consumed));
    }

    let (body, body_consumed) = read_line(&bytes[consumed..], false);
    if body.len() != declared as usize {
        return Err(DecodeError::BulkLengthMismatch {
            declared,
            actual: body.len(),
        });
    }
    Ok((Value::Bulk(Some(Bytes::from(body))), consumed + body_consumed))
}

fn parse_array(bytes: &[u8]) -> Parsed<Value> {
    let (declared, mut consumed) = parse_length(bytes, ARRAY_TAG)?;
    if declared < 0 {
        return Err(DecodeError::NegativeArrayLength(declared));
    }

    let mut items = Vec::with_capacity(declared as usize);
    while consumed < bytes.len() {
        if items.len() as i64 >= declared {
            return Err(DecodeError::ArrayOverflow {
                index: items.len() + 1,
                capacity: declared,
            });
        }
        let (item, read) = parse_element(&bytes[consumed..])?;
        items.push(item);
        consumed += read;
    }
    if (items.len() as i64) < declared {
        // Input ran out at an element boundary before the declared count.
        return Err(DecodeError::EmptyStream);
    }

    Ok((Value::Array(items), consumed))
}

fn parse_element(bytes: &[u8]) -> Parsed<Value> {
    match bytes.first() {
        None => Err(DecodeError::EmptyStream),
        Some(&SIMPLE_STRING_TAG) => parse_simple_string(bytes),
        Some(&INTEGER_TAG) => parse_integer(bytes),
        Some(&BULK_STRING_TAG) => parse_bulk_string(bytes),
        Some(&ERROR_TAG) => parse_error(bytes),
        Some(&other) => Err(DecodeError::UnknownTag(other as char)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_string_frame() {
        let (value, consumed) = parse_simple_string(b"+ab\r\n").unwrap();
        assert_eq!(value, Value::Simple("ab".to_string()));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn parse_simple_string_empty_body() {
        let (value, consumed) = parse_simple_string(b"+\r\n").unwrap();
        assert_eq!(value, Value::Simple(String::new()));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn parse_simple_string_bare_line_feed() {
        let (value, consumed) = parse_simple_string(b"+ok\n").unwrap();
        assert_eq!(value, Value::Simple("ok".to_string()));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn parse_error_frame_splits_code_and_message() {
        let (value, consumed) = parse_error(b"-WRONGTYPE foobar\r\n").unwrap();
        assert_eq!(
            value,
            Value::Error {
                code: "WRONGTYPE".to_string(),
                message: "foobar".to_string(),
            }
        );
        assert_eq!(consumed, 19);
    }

    #[test]
    fn parse_error_frame_without_whitespace_is_all_code() {
        let (value, _) = parse_error(b"-WRONGTYPE\r\n").unwrap();
        assert_eq!(
            value,
            Value::Error {
                code: "WRONGTYPE".to_string(),
                message: String::new(),
            }
        );
    }

    #[test]
    fn parse_error_frame_message_keeps_later_spaces() {
        let (value, _) = parse_error(b"-ERR unknown command 'FOO'\r\n").unwrap();
        assert_eq!(
            value,
            Value::Error {
                code: "ERR".to_string(),
                message: "unknown command 'FOO'".to_string(),
            }
        );
    }

    #[test]
    fn parse_integer_frame() {
        let (value, consumed) = parse_integer(b":42\r\n").unwrap();
        assert_eq!(value, Value::Integer(42));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn parse_integer_frame_negative() {
        let (value, _) = parse_integer(b":-1000\r\n").unwrap();
        assert_eq!(value, Value::Integer(-1000));
    }

    #[test]
    fn parse_integer_frame_malformed() {
        let err = parse_integer(b":abc\r\n").unwrap_err();
        assert_eq!(err, DecodeError::InvalidInteger("abc".to_string()));
        assert_eq!(err.code(), "ERR");
    }

    #[test]
    fn parse_bulk_string_frame() {
        let (value, consumed) = parse_bulk_string(b"$2\r\nab\r\n").unwrap();
        assert_eq!(value, Value::bulk("ab").unwrap());
        assert_eq!(consumed, 8);
    }

    #[test]
    fn parse_bulk_string_null() {
        let (value, consumed) = parse_bulk_string(b"$-1\r\n").unwrap();
        assert_eq!(value, Value::Bulk(None));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn parse_bulk_string_empty_consumes_header_only() {
        let (value, consumed) = parse_bulk_string(b"$0\r\n").unwrap();
        assert_eq!(value, Value::Bulk(Some(Bytes::new())));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn parse_bulk_string_length_mismatch() {
        let err = parse_bulk_string(b"$2\r\na\r\n").unwrap_err();
        assert_eq!(
            err,
            DecodeError::BulkLengthMismatch {
                declared: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn parse_bulk_string_over_cap() {
        let header = format!("${}\r\n", MAX_BULK + 1);
        let err = parse_bulk_string(header.as_bytes()).unwrap_err();
        assert_eq!(err, DecodeError::BulkTooLarge);
    }

    #[test]
    fn parse_bulk_string_negative_length() {
        let err = parse_bulk_string(b"$-2\r\n").unwrap_err();
        assert_eq!(err, DecodeError::NegativeBulkLength);
    }

    #[test]
    fn parse_array_of_mixed_elements() {
        let (value, consumed) = parse_array(b"*2\r\n:42\r\n+ab\r\n").unwrap();
        assert_eq!(
            value,
            Value::Array(vec![Value::Integer(42), Value::Simple("ab".to_string())])
        );
        assert_eq!(consumed, 14);
    }

    #[test]
    fn parse_array_empty() {
        let (value, consumed) = parse_array(b"*0\r\n").unwrap();
        assert_eq!(value, Value::Array(vec![]));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn parse_array_with_empty_bulk_string() {
        let (value, _) = parse_array(b"*2\r\n$0\r\n$1\r\na\r\n").unwrap();
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Bulk(Some(Bytes::new())),
                Value::bulk("a").unwrap()
            ])
        );
    }

    #[test]
    fn parse_array_overflow() {
        let err = parse_array(b"*1\r\n+a\r\n+b\r\n").unwrap_err();
        assert_eq!(
            err,
            DecodeError::ArrayOverflow {
                index: 2,
                capacity: 1
            }
        );
    }

    #[test]
    fn parse_array_truncated_input() {
        let err = parse_array(b"*2\r\n+a\r\n").unwrap_err();
        assert_eq!(err, DecodeError::EmptyStream);
        assert_eq!(err.code(), "IVBYSEQ");
    }

    #[test]
    fn parse_array_negative_size() {
        let err = parse_array(b"*-3\r\n").unwrap_err();
        assert_eq!(err, DecodeError::NegativeArrayLength(-3));
    }

    #[test]
    fn parse_array_unknown_tag_inside() {
        let err = parse_array(b"*1\r\n?a\r\n").unwrap_err();
        assert_eq!(err, DecodeError::UnknownTag('?'));
        assert_eq!(err.code(), "ERR");
    }

    #[test]
    fn parse_request_single_command() {
        let decoded = parse_request(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\n2\r\n");
        assert_eq!(decoded.error, None);
        assert_eq!(decoded.consumed, 27);
        assert_eq!(
            decoded.commands,
            vec![Value::Array(vec![
                Value::bulk("SET").unwrap(),
                Value::bulk("k").unwrap(),
                Value::bulk("2").unwrap(),
            ])]
        );
    }

    #[test]
    fn parse_request_pipelined_commands() {
        let bytes = b"*3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n\
                      *3\r\n$3\r\nSET\r\n$1\r\nb\r\n$1\r\n2\r\n\
                      *2\r\n$3\r\nDEL\r\n$1\r\na\r\n";
        let decoded = parse_request(bytes);
        assert_eq!(decoded.error, None);
        assert_eq!(decoded.commands.len(), 3);
        assert_eq!(decoded.consumed, bytes.len());
    }

    #[test]
    fn parse_request_empty_input() {
        let decoded = parse_request(b"");
        assert!(decoded.commands.is_empty());
        assert_eq!(decoded.consumed, 0);
        assert_eq!(decoded.error, None);
    }

    #[test]
    fn parse_request_non_array_top_level() {
        let decoded = parse_request(b"+OK\r\n");
        assert!(decoded.commands.is_empty());
        assert_eq!(
            decoded.error,
            Some(DecodeError::TagMismatch {
                expected: '*',
                found: '+'
            })
        );
    }

    #[test]
    fn parse_request_keeps_partial_progress_on_fault() {
        let bytes = b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n*2\r\n$3\r\nGET\r\n$5\r\nab\r\n";
        let decoded = parse_request(bytes);
        assert_eq!(decoded.commands.len(), 1);
        assert_eq!(decoded.consumed, 20);
        assert_eq!(
            decoded.error,
            Some(DecodeError::BulkLengthMismatch {
                declared: 5,
                actual: 2
            })
        );
    }

    #[test]
    fn parse_request_accepts_simple_strings_and_integers_as_arguments() {
        let decoded = parse_request(b"*3\r\n+SET\r\n+k\r\n:2\r\n");
        assert_eq!(decoded.error, None);
        assert_eq!(
            decoded.commands,
            vec![Value::Array(vec![
                Value::Simple("SET".to_string()),
                Value::Simple("k".to_string()),
                Value::Integer(2),
            ])]
        );
    }

    #[test]
    fn wire_roundtrip_recovers_request_array() {
        let request = Value::Array(vec![
            Value::Simple("SET".to_string()),
            Value::bulk("key").unwrap(),
            Value::Integer(7),
        ]);
        let decoded = parse_request(&request.to_resp());
        assert_eq!(decoded.error, None);
        assert_eq!(decoded.commands, vec![request]);
    }
}
