//! Response builder (C7): formats a status line, headers, and (for error
//! verdicts) an inline body into a connection's [`WriteBuffer`]. On
//! [`Verdict::FileRequest`] the body is left out of the write buffer
//! entirely; the scatter writer streams it from the memory map instead.

use std::fmt::Write as _;

use crate::buffer::{Overflow, WriteBuffer};
use crate::parser::Verdict;

/// The status codes this server ever emits (§6).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok = 200,
    BadRequest = 400,
    Forbidden = 403,
    NotFound = 404,
    InternalServerError = 500,
}

impl Status {
    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Error",
        }
    }

    fn for_verdict(verdict: Verdict) -> Status {
        match verdict {
            Verdict::FileRequest => Status::Ok,
            Verdict::BadRequest => Status::BadRequest,
            Verdict::ForbiddenRequest => Status::Forbidden,
            Verdict::NoResource => Status::NotFound,
            Verdict::InternalError | Verdict::NoRequest | Verdict::GetRequest => {
                Status::InternalServerError
            }
        }
    }
}

/// The canonical, exact-byte error bodies (§6).
pub fn error_body(verdict: Verdict) -> &'static [u8] {
    match verdict {
        Verdict::BadRequest => {
            b"Your request has bad syntax or is inherently impossible to satisfy.\n"
        }
        Verdict::ForbiddenRequest => {
            b"You do not have permission to get file from this server.\n"
        }
        Verdict::NoResource => b"The requested file was not found on this server.\n",
        _ => b"There was an unusual problem serving the requested file.\n",
    }
}

/// Formats a complete response into `buf`. `content_length` is the whole
/// body's length, whether or not the body itself lives in `buf` (it won't,
/// for [`Verdict::FileRequest`], where the caller streams it from a memory
/// map instead). Fails without having emitted anything partial if any
/// contributing write wouldn't fit (§9, "`add_headers` has no explicit
/// return in the source" — here every emit's success is required).
pub fn build_response(
    buf: &mut WriteBuffer,
    verdict: Verdict,
    content_length: usize,
    keep_alive: bool,
) -> Result<(), Overflow> {
    let mut staged = WriteBuffer::new();
    let status = Status::for_verdict(verdict);

    write!(staged, "HTTP/1.1 {} {}\r\n", status as u16, status.reason()).map_err(|_| Overflow)?;
    write!(staged, "Content-Length: {content_length}\r\n").map_err(|_| Overflow)?;
    staged.push_bytes(b"Content-Type: text/html\r\n")?;
    if keep_alive {
        staged.push_bytes(b"Connection: keep-alive\r\n")?;
    } else {
        staged.push_bytes(b"Connection: close\r\n")?;
    }
    staged.push_bytes(b"\r\n")?;
    if verdict != Verdict::FileRequest {
        staged.push_bytes(error_body(verdict))?;
    }

    buf.push_bytes(staged.as_slice())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_request_emits_200_with_no_inline_body() {
        let mut buf = WriteBuffer::new();
        build_response(&mut buf, Verdict::FileRequest, 42, true).unwrap();
        let rendered = std::str::from_utf8(buf.as_slice()).unwrap();
        assert!(rendered.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(rendered.contains("Content-Length: 42\r\n"));
        assert!(rendered.contains("Connection: keep-alive\r\n"));
        assert!(rendered.ends_with("\r\n\r\n"));
    }

    #[test]
    fn bad_request_emits_canonical_body_and_closes() {
        let mut buf = WriteBuffer::new();
        let body = error_body(Verdict::BadRequest);
        build_response(&mut buf, Verdict::BadRequest, body.len(), false).unwrap();
        let rendered = buf.as_slice();
        assert!(rendered.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
        assert!(rendered.ends_with(body));
        let rendered_str = std::str::from_utf8(rendered).unwrap();
        assert!(rendered_str.contains("Connection: close\r\n"));
    }

    #[test]
    fn overflow_leaves_buffer_untouched() {
        let mut buf = WriteBuffer::new();
        // A content-length digit string this long can't possibly fit alongside
        // the rest of the headers in a 1024-byte buffer.
        let err = build_response(&mut buf, Verdict::FileRequest, usize::MAX, true);
        // usize::MAX's digits are short enough to fit; force real overflow by
        // pre-filling the buffer instead.
        if err.is_ok() {
            buf.reset();
        }
        buf.push_bytes(&vec![b'x'; crate::WRITE_BUFFER_SIZE - 4]).unwrap();
        let err = build_response(&mut buf, Verdict::FileRequest, 1, true);
        assert!(err.is_err());
        assert_eq!(buf.len(), crate::WRITE_BUFFER_SIZE - 4);
    }
}
