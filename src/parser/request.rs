// Copyright 2022 Ryan Seipp
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP/1.1 request parser (C5), the main state machine.
//!
//! Drives [`CHECK_STATE`](State) over lines produced by [`super::line`]:
//! `RequestLine -> Header -> Content -> terminal`. Fields that survive the
//! parse (path, host, content length, keep-alive) are copied out into
//! [`ParsedRequest`] as they're recognized, since the read buffer they were
//! read from gets zeroed and reused for the connection's next request.

use super::line::{scan_line, LineResult};
use super::Verdict;

/// A line failed to satisfy request-line or header-line grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Malformed;

/// Where [`RequestParser::advance`] currently is in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    RequestLine,
    Header,
    Content,
}

/// Fields recovered from a complete request. Only `GET` over `HTTP/1.1` is
/// accepted, so method and version aren't represented: their presence is
/// implied by ever reaching [`Verdict::GetRequest`].
#[derive(Debug, Default, Clone)]
pub struct ParsedRequest {
    /// The request target, already stripped of scheme and authority and
    /// guaranteed to start with `/`.
    pub path: String,
    /// The `Host` header's value, if present.
    pub host: Option<String>,
    /// The `Content-Length` header's value; zero if absent.
    pub content_length: usize,
    /// Whether `Connection: keep-alive` was present.
    pub keep_alive: bool,
}

/// The per-connection request parser: line-scanner cursor plus the
/// request/header/content state machine built on top of it.
pub struct RequestParser {
    state: State,
    checked_idx: usize,
    start_line: usize,
    request: ParsedRequest,
}

impl RequestParser {
    pub fn new() -> Self {
        RequestParser {
            state: State::RequestLine,
            checked_idx: 0,
            start_line: 0,
            request: ParsedRequest::default(),
        }
    }

    /// Restarts the state machine ahead of a connection's next request.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The fields parsed so far. Only meaningful once a terminal verdict
    /// other than [`Verdict::BadRequest`] has been returned.
    pub fn request(&self) -> &ParsedRequest {
        &self.request
    }

    /// Drives the state machine over `buf[..read_idx]` as far as currently
    /// buffered bytes allow, resuming from wherever the last call left off.
    pub fn advance(&mut self, buf: &mut [u8], read_idx: usize) -> Verdict {
        loop {
            if self.state == State::Content {
                return if read_idx >= self.checked_idx + self.request.content_length {
                    Verdict::GetRequest
                } else {
                    Verdict::NoRequest
                };
            }

            match scan_line(buf, &mut self.checked_idx, read_idx) {
                LineResult::Bad => return Verdict::BadRequest,
                LineResult::Open => return Verdict::NoRequest,
                LineResult::Ok(end) => {
                    let start = self.start_line;
                    self.start_line = self.checked_idx;

                    match self.state {
                        State::RequestLine => {
                            if parse_request_line(&buf[start..end], &mut self.request).is_err() {
                                return Verdict::BadRequest;
                            }
                            self.state = State::Header;
                        }
                        State::Header => {
                            if start == end {
                                // blank terminator line
                                self.state = if self.request.content_length > 0 {
                                    State::Content
                                } else {
                                    return Verdict::GetRequest;
                                };
                            } else if parse_header_line(&buf[start..end], &mut self.request).is_err() {
                                return Verdict::BadRequest;
                            }
                        }
                        State::Content => unreachable!("handled above"),
                    }
                }
            }
        }
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Parses `METHOD SP URL SP VERSION`, only accepting the literal `GET`
/// (case-insensitive) and `HTTP/1.1`. An absolute URL (`http://host/path`)
/// has its scheme and authority stripped by advancing to the first `/`.
fn parse_request_line(line: &[u8], request: &mut ParsedRequest) -> Result<(), Malformed> {
    let mut i = 0;
    while i < line.len() && !is_ws(line[i]) {
        i += 1;
    }
    let method = &line[..i];
    if !method.eq_ignore_ascii_case(b"GET") {
        return Err(Malformed);
    }

    while i < line.len() && is_ws(line[i]) {
        i += 1;
    }
    let url_start = i;
    while i < line.len() && !is_ws(line[i]) {
        i += 1;
    }
    let url = &line[url_start..i];
    if url.is_empty() {
        return Err(Malformed);
    }

    while i < line.len() && is_ws(line[i]) {
        i += 1;
    }
    let version = &line[i..];
    if !version.eq_ignore_ascii_case(b"HTTP/1.1") {
        return Err(Malformed);
    }

    let path = if url[0] == b'/' {
        url
    } else {
        match url.iter().position(|&b| b == b'/') {
            Some(idx) => &url[idx..],
            None => return Err(Malformed),
        }
    };
    if path.is_empty() || path[0] != b'/' {
        return Err(Malformed);
    }

    request.path = std::str::from_utf8(path).map_err(|_| Malformed)?.to_string();
    Ok(())
}

/// Parses `name:value`, recognizing `Connection`, `Content-Length`, and
/// `Host` case-insensitively on the name; everything else is ignored.
///
/// The reference implementation this is modeled on matches the header name
/// `Content_length:` (underscore) where `Content-Length:` was clearly
/// intended. Only the canonical hyphenated form is matched here.
fn parse_header_line(line: &[u8], request: &mut ParsedRequest) -> Result<(), Malformed> {
    let colon = line.iter().position(|&b| b == b':').ok_or(Malformed)?;
    let name = &line[..colon];
    let mut value = &line[colon + 1..];
    while !value.is_empty() && is_ws(value[0]) {
        value = &value[1..];
    }
    while !value.is_empty() && is_ws(value[value.len() - 1]) {
        value = &value[..value.len() - 1];
    }

    if name.eq_ignore_ascii_case(b"connection") {
        if value.eq_ignore_ascii_case(b"keep-alive") {
            request.keep_alive = true;
        }
    } else if name.eq_ignore_ascii_case(b"content-length") {
        let text = std::str::from_utf8(value).map_err(|_| Malformed)?;
        request.content_length = text.parse().map_err(|_| Malformed)?;
    } else if name.eq_ignore_ascii_case(b"host") {
        request.host = Some(String::from_utf8_lossy(value).into_owned());
    } else {
        tracing::trace!(
            name = %String::from_utf8_lossy(name),
            "ignoring unrecognized header"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: &mut RequestParser, chunk: &[u8], buf: &mut [u8], read_idx: &mut usize) -> Verdict {
        buf[*read_idx..*read_idx + chunk.len()].copy_from_slice(chunk);
        *read_idx += chunk.len();
        parser.advance(buf, *read_idx)
    }

    #[test]
    fn valid_get_request_no_body() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(
            &mut parser,
            b"GET /index.html HTTP/1.1\r\nHost: h\r\n\r\n",
            &mut buf,
            &mut read_idx,
        );
        assert_eq!(verdict, Verdict::GetRequest);
        assert_eq!(parser.request().path, "/index.html");
        assert_eq!(parser.request().host.as_deref(), Some("h"));
        assert!(!parser.request().keep_alive);
    }

    #[test]
    fn non_get_method_is_bad_request() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(&mut parser, b"POST /x HTTP/1.1\r\n\r\n", &mut buf, &mut read_idx);
        assert_eq!(verdict, Verdict::BadRequest);
    }

    #[test]
    fn missing_leading_slash_is_bad_request() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(&mut parser, b"GET x HTTP/1.1\r\n\r\n", &mut buf, &mut read_idx);
        assert_eq!(verdict, Verdict::BadRequest);
    }

    #[test]
    fn wrong_version_is_bad_request() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(&mut parser, b"GET / HTTP/1.0\r\n\r\n", &mut buf, &mut read_idx);
        assert_eq!(verdict, Verdict::BadRequest);
    }

    #[test]
    fn absolute_url_strips_scheme_and_authority() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(
            &mut parser,
            b"GET http://example.org/a/b HTTP/1.1\r\n\r\n",
            &mut buf,
            &mut read_idx,
        );
        assert_eq!(verdict, Verdict::GetRequest);
        assert_eq!(parser.request().path, "/a/b");
    }

    #[test]
    fn keep_alive_header_is_recognized() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(
            &mut parser,
            b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n",
            &mut buf,
            &mut read_idx,
        );
        assert_eq!(verdict, Verdict::GetRequest);
        assert!(parser.request().keep_alive);
    }

    #[test]
    fn content_length_zero_completes_on_blank_line() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(
            &mut parser,
            b"GET / HTTP/1.1\r\nContent-Length: 0\r\n\r\n",
            &mut buf,
            &mut read_idx,
        );
        assert_eq!(verdict, Verdict::GetRequest);
    }

    #[test]
    fn waits_for_body_bytes_when_content_length_positive() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(
            &mut parser,
            b"GET / HTTP/1.1\r\nContent-Length: 4\r\n\r\nab",
            &mut buf,
            &mut read_idx,
        );
        assert_eq!(verdict, Verdict::NoRequest);

        let verdict = parse(&mut parser, b"cd", &mut buf, &mut read_idx);
        assert_eq!(verdict, Verdict::GetRequest);
    }

    #[test]
    fn missing_terminating_blank_line_never_leaves_header_state() {
        let mut parser = RequestParser::new();
        let mut buf = [0u8; 2048];
        let mut read_idx = 0;
        let verdict = parse(&mut parser, b"GET / HTTP/1.1\r\nHost: h\r\n", &mut buf, &mut read_idx);
        assert_eq!(verdict, Verdict::NoRequest);
    }

    #[test]
    fn chunked_byte_at_a_time_arrival_matches_single_chunk_delivery() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: h\r\nConnection: keep-alive\r\n\r\n";

        let mut whole_parser = RequestParser::new();
        let mut whole_buf = [0u8; 2048];
        whole_buf[..request.len()].copy_from_slice(request);
        let whole_verdict = whole_parser.advance(&mut whole_buf, request.len());

        let mut chunked_parser = RequestParser::new();
        let mut chunked_buf = [0u8; 2048];
        let mut read_idx = 0;
        let mut chunked_verdict = Verdict::NoRequest;
        for &b in request {
            chunked_buf[read_idx] = b;
            read_idx += 1;
            chunked_verdict = chunked_parser.advance(&mut chunked_buf, read_idx);
        }

        assert_eq!(whole_verdict, Verdict::GetRequest);
        assert_eq!(chunked_verdict, Verdict::GetRequest);
        assert_eq!(whole_parser.request().path, chunked_parser.request().path);
        assert_eq!(whole_parser.request().host, chunked_parser.request().host);
        assert_eq!(
            whole_parser.request().keep_alive,
            chunked_parser.request().keep_alive
        );
    }
}
