use bytes::{Buf, BytesMut};

/// Maximum bulk string payload accepted from the wire: 512 MB.
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
/// Maximum multibulk element count accepted from the wire.
const MAX_ARRAY_LEN: i64 = 1024 * 1024;

/// A RESP2 value.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// +OK\r\n
    SimpleString(String),
    /// -ERR message\r\n
    Error(String),
    /// :1000\r\n
    Integer(i64),
    /// $6\r\nfoobar\r\n  or  $-1\r\n (null)
    BulkString(Option<Vec<u8>>),
    /// *2\r\n...  or  *-1\r\n (null)
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Vec<u8>>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    pub fn null_bulk_string() -> Self {
        RespValue::BulkString(None)
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    /// Serialize this value to RESP bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.push(b'-');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.push(b':');
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::BulkString(None) => {
                buf.extend_from_slice(b"$-1\r\n");
            }
            RespValue::BulkString(Some(data)) => {
                buf.push(b'$');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Array(None) => {
                buf.extend_from_slice(b"*-1\r\n");
            }
            RespValue::Array(Some(items)) => {
                buf.push(b'*');
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                for item in items {
                    item.write_to(buf);
                }
            }
        }
    }

    /// Raw bytes of a string-like value, for command parsing.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RespValue::BulkString(Some(data)) => Some(data),
            RespValue::SimpleString(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Convert to a UTF-8 string, if possible.
    pub fn to_string_lossy(&self) -> Option<String> {
        self.as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RespError {
    #[error("invalid RESP type byte '{}'", *.0 as char)]
    InvalidByte(u8),

    #[error("{0}")]
    Protocol(String),
}

/// Streaming RESP2 parser.
///
/// Call [`RespParser::parse`] repeatedly as data arrives: `Ok(Some(value))`
/// when a complete frame was consumed from the buffer, `Ok(None)` when more
/// bytes are needed (the buffer is left untouched in that case).
pub struct RespParser;

impl RespParser {
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        if buf.is_empty() {
            return Ok(None);
        }
        match buf[0] {
            b'+' | b'-' | b':' | b'$' | b'*' => Self::parse_value(buf),
            // Anything else is an inline command line.
            _ => Self::parse_inline(buf),
        }
    }

    fn parse_value(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        if buf.is_empty() {
            return Ok(None);
        }
        match buf[0] {
            b'+' => Ok(Self::take_line(buf).map(RespValue::SimpleString)),
            b'-' => Ok(Self::take_line(buf).map(RespValue::Error)),
            b':' => match Self::take_line(buf) {
                Some(line) => {
                    let n = line
                        .parse()
                        .map_err(|_| RespError::Protocol(format!("invalid integer: {line}")))?;
                    Ok(Some(RespValue::Integer(n)))
                }
                None => Ok(None),
            },
            b'$' => Self::parse_bulk_string(buf),
            b'*' => Self::parse_array(buf),
            other => Err(RespError::InvalidByte(other)),
        }
    }

    /// Consume a `<type byte><payload>\r\n` header line, returning the payload.
    fn take_line(buf: &mut BytesMut) -> Option<String> {
        let end = find_crlf(buf, 1)?;
        let line = String::from_utf8_lossy(&buf[1..end]).into_owned();
        buf.advance(end + 2);
        Some(line)
    }

    /// Parse the length header of a bulk string or array without consuming it.
    /// Returns `(header_end, len)`.
    fn peek_len(buf: &BytesMut, what: &str) -> Result<Option<(usize, i64)>, RespError> {
        let Some(end) = find_crlf(buf, 1) else {
            return Ok(None);
        };
        let s = std::str::from_utf8(&buf[1..end])
            .map_err(|_| RespError::Protocol(format!("invalid {what} length")))?;
        let len: i64 = s
            .parse()
            .map_err(|_| RespError::Protocol(format!("invalid {what} length")))?;
        Ok(Some((end, len)))
    }

    fn parse_bulk_string(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let Some((header_end, len)) = Self::peek_len(buf, "bulk")? else {
            return Ok(None);
        };
        if len == -1 {
            buf.advance(header_end + 2);
            return Ok(Some(RespValue::BulkString(None)));
        }
        if len < -1 || len > MAX_BULK_LEN {
            return Err(RespError::Protocol("invalid bulk length".into()));
        }

        let len = len as usize;
        let total = header_end + 2 + len + 2;
        if buf.len() < total {
            return Ok(None);
        }
        if &buf[header_end + 2 + len..total] != b"\r\n" {
            return Err(RespError::Protocol(
                "missing CRLF after bulk string".into(),
            ));
        }

        let data = buf[header_end + 2..header_end + 2 + len].to_vec();
        buf.advance(total);
        Ok(Some(RespValue::BulkString(Some(data))))
    }

    fn parse_array(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let Some((header_end, len)) = Self::peek_len(buf, "multibulk")? else {
            return Ok(None);
        };
        if len < 0 {
            buf.advance(header_end + 2);
            return Ok(Some(RespValue::Array(None)));
        }
        if len > MAX_ARRAY_LEN {
            return Err(RespError::Protocol("invalid multibulk length".into()));
        }

        // Elements may be incomplete; keep a copy so we can rewind.
        let saved = buf.clone();
        buf.advance(header_end + 2);

        let mut items = Vec::with_capacity(len as usize);
        for _ in 0..len {
            match Self::parse_value(buf) {
                Ok(Some(value)) => items.push(value),
                Ok(None) => {
                    *buf = saved;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Some(RespValue::Array(Some(items))))
    }

    /// Parse an inline command (whitespace-separated tokens ended by \r\n)
    /// into an array of bulk strings.
    fn parse_inline(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let Some(end) = find_crlf(buf, 0) else {
            if buf.len() > 64 * 1024 {
                return Err(RespError::Protocol("too big inline request".into()));
            }
            return Ok(None);
        };

        let line = String::from_utf8_lossy(&buf[..end]).into_owned();
        buf.advance(end + 2);

        let items: Vec<RespValue> = line
            .split_whitespace()
            .map(|token| RespValue::bulk_string(token.as_bytes()))
            .collect();
        // An empty line parses as an empty array the caller silently skips.
        Ok(Some(RespValue::Array(Some(items))))
    }
}

fn find_crlf(buf: &[u8], start: usize) -> Option<usize> {
    buf[start..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|pos| start + pos)
}
