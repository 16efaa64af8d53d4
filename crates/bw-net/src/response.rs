//! Incremental HTTP/1.1 response parsing.
//!
//! Both parsers are byte-driven state machines, so a response can be fed in
//! whatever pieces the socket hands out.

use crate::content;
use crate::http::Header;
use crate::http::HttpResponse;
use crate::http::HttpStatusCode;
use crate::http::HttpVersion;
use crate::http::find_header;
use crate::http::header_has_token;
use bw_core::EngineError;
use bw_core::EngineResult;

const MAX_HEAD_BYTES: usize = 128 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    StatusLine,
    StatusLineEnd,
    HeaderName,
    HeaderSpace,
    HeaderValue,
    HeaderLineEnd,
    HeaderBlockEnd,
    Body,
}

/// How the body length is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    None,
    Chunked,
    ContentLength(usize),
    UntilClose,
}

#[derive(Debug)]
enum BodyReader {
    Pending,
    Empty,
    Chunked(ChunkedBodyParser),
    Sized { remaining: usize, data: Vec<u8> },
    UntilClose(Vec<u8>),
}

impl BodyReader {
    fn feed(&mut self, bytes: &[u8]) -> EngineResult<()> {
        match self {
            Self::Pending | Self::Empty => {}
            Self::Chunked(parser) => {
                let used = parser.feed(bytes)?;
                if used < bytes.len() {
                    log::debug!("ignoring {} bytes after last chunk", bytes.len() - used);
                }
            }
            Self::Sized { remaining, data } => {
                let take = (*remaining).min(bytes.len());
                data.extend_from_slice(&bytes[..take]);
                *remaining -= take;
            }
            Self::UntilClose(data) => data.extend_from_slice(bytes),
        }
        Ok(())
    }

    fn is_complete(&self) -> bool {
        match self {
            Self::Pending | Self::UntilClose(_) => false,
            Self::Empty => true,
            Self::Chunked(parser) => parser.is_finished(),
            Self::Sized { remaining, .. } => *remaining == 0,
        }
    }
}

/// Parses a status line, headers and a framed body.
#[derive(Debug)]
pub struct ResponseParser {
    state: ResponseState,
    expects_body: bool,
    head_bytes: usize,
    status_line: Vec<u8>,
    header_name: Vec<u8>,
    header_value: Vec<u8>,
    headers: Vec<Header>,
    status: Option<(HttpVersion, HttpStatusCode, String)>,
    body: BodyReader,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ResponseState::StatusLine,
            expects_body: true,
            head_bytes: 0,
            status_line: Vec::new(),
            header_name: Vec::new(),
            header_value: Vec::new(),
            headers: Vec::new(),
            status: None,
            body: BodyReader::Pending,
        }
    }

    /// Parser for the answer to a `HEAD` request, which has no body whatever
    /// the headers say.
    pub fn without_body() -> Self {
        Self {
            expects_body: false,
            ..Self::new()
        }
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Known once the head has been parsed.
    pub fn framing(&self) -> Option<BodyFraming> {
        match &self.body {
            BodyReader::Pending => None,
            BodyReader::Empty => Some(BodyFraming::None),
            BodyReader::Chunked(_) => Some(BodyFraming::Chunked),
            BodyReader::Sized { remaining, data } => {
                Some(BodyFraming::ContentLength(remaining + data.len()))
            }
            BodyReader::UntilClose(_) => Some(BodyFraming::UntilClose),
        }
    }

    /// True once the body is complete without needing the connection to
    /// close.
    pub fn is_finished(&self) -> bool {
        self.state == ResponseState::Body && self.body.is_complete()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> EngineResult<()> {
        let mut idx = 0_usize;
        while idx < bytes.len() && self.state != ResponseState::Body {
            self.step(bytes[idx])?;
            idx += 1;
        }

        if idx < bytes.len() {
            self.body.feed(&bytes[idx..])?;
        }
        Ok(())
    }

    /// Completes the response; call when the parser reports finished or the
    /// peer closed the connection.
    pub fn finish(self) -> EngineResult<HttpResponse> {
        let complete_head = self.state == ResponseState::Body;
        let Some((version, status, reason)) = self.status.filter(|_| complete_head) else {
            return Err(EngineError::new(
                "net.http.unexpected_eof",
                format!("connection closed in {:?}", self.state),
            ));
        };

        let body = match self.body {
            BodyReader::Pending | BodyReader::Empty => Vec::new(),
            BodyReader::Chunked(parser) => {
                if !parser.is_finished() {
                    return Err(EngineError::new(
                        "net.http.unexpected_eof",
                        format!("connection closed in chunk state {:?}", parser.state()),
                    ));
                }
                parser.into_body()
            }
            BodyReader::Sized { remaining, data } => {
                if remaining > 0 {
                    return Err(EngineError::new(
                        "net.http.unexpected_eof",
                        format!("connection closed {remaining} bytes short of Content-Length"),
                    ));
                }
                data
            }
            BodyReader::UntilClose(data) => data,
        };

        let body = content::decode_body(&self.headers, body)?;
        Ok(HttpResponse {
            version,
            status,
            reason,
            headers: self.headers,
            body,
        })
    }

    fn step(&mut self, byte: u8) -> EngineResult<()> {
        self.head_bytes += 1;
        if self.head_bytes > MAX_HEAD_BYTES {
            return Err(EngineError::new(
                "net.http.head_too_large",
                format!("response head exceeds {MAX_HEAD_BYTES} bytes"),
            ));
        }

        self.state = match (self.state, byte) {
            (ResponseState::StatusLine, b'\r') => ResponseState::StatusLineEnd,
            (ResponseState::StatusLine, _) => {
                self.status_line.push(byte);
                ResponseState::StatusLine
            }
            (ResponseState::StatusLineEnd, b'\n') => {
                self.status = Some(parse_status_line(&self.status_line)?);
                ResponseState::HeaderName
            }
            (ResponseState::HeaderName, b':') => ResponseState::HeaderSpace,
            (ResponseState::HeaderName, b'\r') if self.header_name.is_empty() => {
                ResponseState::HeaderBlockEnd
            }
            (ResponseState::HeaderName, b'\r' | b'\n') => {
                return Err(self.malformed("header line without `:`"));
            }
            (ResponseState::HeaderName, _) => {
                self.header_name.push(byte);
                ResponseState::HeaderName
            }
            (ResponseState::HeaderSpace, b' ' | b'\t') => ResponseState::HeaderSpace,
            (ResponseState::HeaderSpace | ResponseState::HeaderValue, b'\r') => {
                self.store_header()?;
                ResponseState::HeaderLineEnd
            }
            (ResponseState::HeaderSpace | ResponseState::HeaderValue, _) => {
                self.header_value.push(byte);
                ResponseState::HeaderValue
            }
            (ResponseState::HeaderLineEnd, b'\n') => ResponseState::HeaderName,
            (ResponseState::HeaderBlockEnd, b'\n') => {
                self.body = self.select_body()?;
                ResponseState::Body
            }
            (ResponseState::StatusLineEnd | ResponseState::HeaderLineEnd | ResponseState::HeaderBlockEnd, _) => {
                return Err(self.malformed("expected LF after CR"));
            }
            (ResponseState::Body, _) => ResponseState::Body,
        };
        Ok(())
    }

    fn malformed(&self, detail: &str) -> EngineError {
        EngineError::new(
            "net.http.head_invalid",
            format!("{detail} in {:?} at byte {}", self.state, self.head_bytes),
        )
    }

    fn store_header(&mut self) -> EngineResult<()> {
        let name = String::from_utf8_lossy(&self.header_name).trim().to_owned();
        let value = String::from_utf8_lossy(&self.header_value).trim().to_owned();
        self.header_name.clear();
        self.header_value.clear();
        self.headers.push(Header::new(&name, &value)?);
        Ok(())
    }

    fn select_body(&self) -> EngineResult<BodyReader> {
        let forbids_body = self
            .status
            .as_ref()
            .is_some_and(|(_, status, _)| status.forbids_body());
        if !self.expects_body || forbids_body {
            return Ok(BodyReader::Empty);
        }

        if let Some(coding) = find_header(&self.headers, "transfer-encoding") {
            if header_has_token(&self.headers, "transfer-encoding", "chunked") {
                return Ok(BodyReader::Chunked(ChunkedBodyParser::new()));
            }
            return Err(EngineError::new(
                "net.http.transfer_encoding_unsupported",
                format!("unsupported transfer encoding `{coding}`"),
            ));
        }

        match content_length(&self.headers)? {
            Some(0) => Ok(BodyReader::Empty),
            Some(len) => Ok(BodyReader::Sized {
                remaining: len,
                data: Vec::with_capacity(len.min(MAX_HEAD_BYTES)),
            }),
            None => Ok(BodyReader::UntilClose(Vec::new())),
        }
    }
}

fn parse_status_line(raw: &[u8]) -> EngineResult<(HttpVersion, HttpStatusCode, String)> {
    let line = String::from_utf8_lossy(raw);
    let mut parts = line.splitn(3, ' ');
    let version = HttpVersion::parse(parts.next().unwrap_or_default())?;
    let code_text = parts.next().unwrap_or_default();
    let code = code_text.parse::<u16>().map_err(|error| {
        EngineError::new(
            "net.http.status_line_invalid",
            format!("invalid status code in `{line}`: {error}"),
        )
    })?;
    let reason = parts.next().unwrap_or_default().trim().to_owned();
    Ok((version, HttpStatusCode::new(code)?, reason))
}

fn content_length(headers: &[Header]) -> EngineResult<Option<usize>> {
    let mut found: Option<usize> = None;
    for header in headers
        .iter()
        .filter(|header| header.name.eq_ignore_ascii_case("content-length"))
    {
        let parsed = header.value.trim().parse::<usize>().map_err(|error| {
            EngineError::new(
                "net.http.content_length_invalid",
                format!("invalid Content-Length `{}`: {error}", header.value),
            )
        })?;
        if found.is_some_and(|existing| existing != parsed) {
            return Err(EngineError::new(
                "net.http.content_length_conflict",
                "conflicting Content-Length headers",
            ));
        }
        found = Some(parsed);
    }
    Ok(found)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Length,
    Extension,
    LengthLineEnd,
    Data,
    DataCr,
    DataLf,
    TrailerStart,
    Trailer,
    TrailerLineEnd,
    TrailerBlockEnd,
    Finished,
}

/// Decodes `Transfer-Encoding: chunked` bodies.
#[derive(Debug)]
pub struct ChunkedBodyParser {
    state: ChunkState,
    size: usize,
    digits: usize,
    remaining: usize,
    body: Vec<u8>,
}

impl Default for ChunkedBodyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedBodyParser {
    pub fn new() -> Self {
        Self {
            state: ChunkState::Length,
            size: 0,
            digits: 0,
            remaining: 0,
            body: Vec::new(),
        }
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ChunkState::Finished
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Returns how many bytes were consumed; input after the terminating
    /// chunk is left alone.
    pub fn feed(&mut self, bytes: &[u8]) -> EngineResult<usize> {
        let mut idx = 0_usize;
        while idx < bytes.len() && !self.is_finished() {
            if self.state == ChunkState::Data {
                let take = self.remaining.min(bytes.len() - idx);
                self.body.extend_from_slice(&bytes[idx..idx + take]);
                self.remaining -= take;
                idx += take;
                if self.remaining == 0 {
                    self.state = ChunkState::DataCr;
                }
                continue;
            }

            self.receive(bytes[idx])?;
            idx += 1;
        }
        Ok(idx)
    }

    pub fn receive(&mut self, byte: u8) -> EngineResult<()> {
        self.state = match (self.state, byte) {
            (ChunkState::Length, b'\r') if self.digits > 0 => ChunkState::LengthLineEnd,
            (ChunkState::Length, b';') if self.digits > 0 => ChunkState::Extension,
            (ChunkState::Length, _) => {
                let digit = char::from(byte).to_digit(16).ok_or_else(|| {
                    EngineError::new(
                        "net.http.chunk_size_invalid",
                        format!("unexpected byte 0x{byte:02x} in chunk size"),
                    )
                })?;
                self.size = self
                    .size
                    .checked_mul(16)
                    .and_then(|size| size.checked_add(digit as usize))
                    .ok_or_else(|| {
                        EngineError::new("net.http.chunk_size_invalid", "chunk size overflows")
                    })?;
                self.digits += 1;
                ChunkState::Length
            }
            (ChunkState::Extension, b'\r') => ChunkState::LengthLineEnd,
            (ChunkState::Extension, _) => ChunkState::Extension,
            (ChunkState::LengthLineEnd, b'\n') => {
                let size = std::mem::take(&mut self.size);
                self.digits = 0;
                if size == 0 {
                    ChunkState::TrailerStart
                } else {
                    log::trace!("reading chunk of {size} bytes");
                    self.remaining = size;
                    ChunkState::Data
                }
            }
            (ChunkState::Data, _) => {
                self.body.push(byte);
                self.remaining -= 1;
                if self.remaining == 0 {
                    ChunkState::DataCr
                } else {
                    ChunkState::Data
                }
            }
            (ChunkState::DataCr, b'\r') => ChunkState::DataLf,
            (ChunkState::DataLf, b'\n') => ChunkState::Length,
            (ChunkState::DataCr | ChunkState::DataLf, _) => {
                return Err(EngineError::new(
                    "net.http.chunk_terminator_invalid",
                    "chunk data is not followed by CRLF",
                ));
            }
            (ChunkState::TrailerStart, b'\r') => ChunkState::TrailerBlockEnd,
            (ChunkState::TrailerStart | ChunkState::Trailer, b'\r') => ChunkState::TrailerLineEnd,
            (ChunkState::TrailerStart | ChunkState::Trailer, _) => ChunkState::Trailer,
            (ChunkState::TrailerLineEnd, b'\n') => ChunkState::TrailerStart,
            (ChunkState::TrailerBlockEnd, b'\n') => ChunkState::Finished,
            (ChunkState::LengthLineEnd | ChunkState::TrailerLineEnd | ChunkState::TrailerBlockEnd, _) => {
                return Err(EngineError::new(
                    "net.http.chunk_line_invalid",
                    format!("expected LF, got 0x{byte:02x}"),
                ));
            }
            (ChunkState::Finished, _) => ChunkState::Finished,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::BodyFraming;
    use super::ChunkState;
    use super::ChunkedBodyParser;
    use super::ResponseParser;
    use super::ResponseState;

    fn parse_all(pieces: &[&[u8]]) -> ResponseParser {
        let mut parser = ResponseParser::new();
        for piece in pieces {
            if let Err(error) = parser.feed(piece) {
                panic!("{error}");
            }
        }
        parser
    }

    #[test]
    fn chunked_body_is_reassembled() {
        let mut parser = ChunkedBodyParser::new();
        let used = parser.feed(b"4\r\nWiki\r\n5;ext=1\r\npedia\r\n0\r\n\r\nextra");
        assert_eq!(used, Ok(30));
        assert!(parser.is_finished());
        assert_eq!(parser.body(), b"Wikipedia");
    }

    #[test]
    fn chunked_body_survives_byte_at_a_time_feeding() {
        let mut parser = ChunkedBodyParser::new();
        for byte in b"1A\r\nabcdefghijklmnopqrstuvwxyz\r\n0\r\nX-Trailer: 1\r\n\r\n" {
            if let Err(error) = parser.receive(*byte) {
                panic!("{error}");
            }
        }
        assert_eq!(parser.state(), ChunkState::Finished);
        assert_eq!(parser.into_body(), b"abcdefghijklmnopqrstuvwxyz".to_vec());
    }

    #[test]
    fn bad_chunk_size_is_reported() {
        let mut parser = ChunkedBodyParser::new();
        let Err(error) = parser.feed(b"Z\r\nx\r\n0\r\n\r\n") else {
            panic!("invalid size should fail");
        };
        assert_eq!(error.code, "net.http.chunk_size_invalid");
    }

    #[test]
    fn missing_chunk_terminator_is_reported() {
        let mut parser = ChunkedBodyParser::new();
        let Err(error) = parser.feed(b"2\r\nabX") else {
            panic!("missing CRLF should fail");
        };
        assert_eq!(error.code, "net.http.chunk_terminator_invalid");
    }

    #[test]
    fn parses_chunked_response_split_anywhere() {
        let parser = parse_all(&[
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTrans",
            b"fer-Encoding: chunked\r\n\r\n5\r\n<div>\r",
            b"\n6\r\n</div>\r\n0\r\n\r\n",
        ]);
        assert!(parser.is_finished());
        assert_eq!(parser.framing(), Some(BodyFraming::Chunked));

        let response = match parser.finish() {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(response.reason, "OK");
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.body, b"<div></div>".to_vec());
    }

    #[test]
    fn content_length_bounds_the_body() {
        let parser = parse_all(&[b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nokEXTRA"]);
        assert!(parser.is_finished());
        assert_eq!(parser.framing(), Some(BodyFraming::ContentLength(2)));
        assert!(parser.finish().is_ok_and(|response| response.body == b"ok"));
    }

    #[test]
    fn body_without_length_reads_until_close() {
        let parser = parse_all(&[b"HTTP/1.0 200 OK\r\n\r\nhello", b" world"]);
        assert!(!parser.is_finished());
        assert_eq!(parser.state(), ResponseState::Body);
        assert!(parser.finish().is_ok_and(|response| response.body == b"hello world"));
    }

    #[test]
    fn head_responses_have_no_body() {
        let mut parser = ResponseParser::without_body();
        assert!(parser.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n").is_ok());
        assert!(parser.is_finished());
        assert!(parser.finish().is_ok_and(|response| response.body.is_empty()));
    }

    #[test]
    fn truncated_responses_are_errors() {
        let parser = parse_all(&[b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nab"]);
        let Err(error) = parser.finish() else {
            panic!("short body should fail");
        };
        assert_eq!(error.code, "net.http.unexpected_eof");

        let parser = parse_all(&[b"HTTP/1.1 200 OK\r\nConte"]);
        let Err(error) = parser.finish() else {
            panic!("half a header block should fail");
        };
        assert_eq!(error.code, "net.http.unexpected_eof");
    }

    #[test]
    fn head_cut_after_status_line_is_an_error() {
        for input in [
            &b"HTTP/1.1 200 OK\r\n"[..],
            &b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n"[..],
            &b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r"[..],
        ] {
            let parser = parse_all(&[input]);
            let Err(error) = parser.finish() else {
                panic!("{:?} should fail", String::from_utf8_lossy(input));
            };
            assert_eq!(error.code, "net.http.unexpected_eof");
        }
    }

    #[test]
    fn malformed_heads_are_rejected() {
        let mut parser = ResponseParser::new();
        assert!(parser.feed(b"HTTP/1.1 200 OK\r\nNoColon\r\n").is_err());

        let mut parser = ResponseParser::new();
        let Err(error) = parser.feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: gzip\r\n\r\n") else {
            panic!("gzip transfer coding should be rejected");
        };
        assert_eq!(error.code, "net.http.transfer_encoding_unsupported");

        let mut parser = ResponseParser::new();
        assert!(parser.feed(b"SPDY/3 200 OK\r\n").is_err());
    }
}
