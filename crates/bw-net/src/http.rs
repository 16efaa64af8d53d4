//! HTTP/1.1 request and response messages.

use crate::charset;
use crate::url::BrowserUrl;
use bw_core::EngineError;
use bw_core::EngineResult;
use url::form_urlencoded;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    fn allows_body(self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
}

impl HttpVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        }
    }

    pub fn parse(text: &str) -> EngineResult<Self> {
        match text {
            "HTTP/1.0" => Ok(Self::Http10),
            "HTTP/1.1" => Ok(Self::Http11),
            other => Err(EngineError::new(
                "net.http.version_unsupported",
                format!("unsupported response version `{other}`"),
            )),
        }
    }
}

/// Header with a wire-safe name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: &str, value: &str) -> EngineResult<Self> {
        if name.is_empty() || !name.bytes().all(is_token_byte) {
            return Err(EngineError::new(
                "net.http.header_name_invalid",
                format!("invalid header name `{name}`"),
            ));
        }

        if value.bytes().any(|byte| matches!(byte, b'\r' | b'\n' | 0)) {
            return Err(EngineError::new(
                "net.http.header_value_invalid",
                format!("invalid characters in header `{name}`"),
            ));
        }

        Ok(Self {
            name: name.to_owned(),
            value: value.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: BrowserUrl,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn builder(method: HttpMethod, url: BrowserUrl) -> HttpRequestBuilder {
        HttpRequestBuilder {
            method,
            url,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn request_target(&self) -> String {
        self.url.path_and_query()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Request line, headers, blank line and body as sent on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut encoded = format!(
            "{} {} {}\r\n",
            self.method.as_str(),
            self.request_target(),
            HttpVersion::Http11.as_str()
        )
        .into_bytes();

        for header in &self.headers {
            encoded.extend_from_slice(header.name.as_bytes());
            encoded.extend_from_slice(b": ");
            encoded.extend_from_slice(header.value.as_bytes());
            encoded.extend_from_slice(b"\r\n");
        }
        encoded.extend_from_slice(b"\r\n");
        encoded.extend_from_slice(&self.body);
        encoded
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestBuilder {
    method: HttpMethod,
    url: BrowserUrl,
    headers: Vec<Header>,
    body: Vec<u8>,
}

impl HttpRequestBuilder {
    pub fn header(mut self, name: &str, value: &str) -> EngineResult<Self> {
        self.headers.push(Header::new(name, value)?);
        Ok(self)
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Encodes `fields` as `key=value&...` with percent escaping.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            serializer.append_pair(key, value);
        }
        self.body = serializer.finish().into_bytes();
        self
    }

    /// Serializes `value` as the body and labels it `application/json`
    /// unless a content type was already set.
    pub fn json(mut self, value: &serde_json::Value) -> EngineResult<Self> {
        self.body = serde_json::to_vec(value).map_err(|error| {
            EngineError::new("net.http.json_encode_failed", format!("encoding body: {error}"))
        })?;
        if find_header(&self.headers, "content-type").is_none() {
            self.headers
                .push(Header::new("Content-Type", JSON_CONTENT_TYPE)?);
        }
        Ok(self)
    }

    /// Fills in `Host`, and for methods that carry a body, `Content-Type`
    /// (form encoding unless set) and `Content-Length`.
    pub fn build(mut self) -> EngineResult<HttpRequest> {
        if !self.method.allows_body() && !self.body.is_empty() {
            return Err(EngineError::new(
                "net.http.body_disallowed",
                format!("{} requests must not include a body", self.method.as_str()),
            ));
        }

        for name in ["host", "content-length"] {
            let count = self
                .headers
                .iter()
                .filter(|header| header.name.eq_ignore_ascii_case(name))
                .count();
            if count > 1 {
                return Err(EngineError::new(
                    "net.http.duplicate_header",
                    format!("header `{name}` must appear at most once"),
                ));
            }
        }

        if find_header(&self.headers, "host").is_none() {
            let host = self.url.authority();
            self.headers.push(Header::new("Host", &host)?);
        }

        if self.method.allows_body() {
            if find_header(&self.headers, "content-type").is_none() {
                self.headers
                    .push(Header::new("Content-Type", FORM_CONTENT_TYPE)?);
            }
            if find_header(&self.headers, "content-length").is_none() {
                let len = self.body.len().to_string();
                self.headers.push(Header::new("Content-Length", &len)?);
            }
        }

        Ok(HttpRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HttpStatusCode(u16);

impl HttpStatusCode {
    pub fn new(code: u16) -> EngineResult<Self> {
        if (100..=599).contains(&code) {
            return Ok(Self(code));
        }

        Err(EngineError::new(
            "net.http.status_invalid",
            format!("status code must be 100-599, got `{code}`"),
        ))
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    pub fn is_success(self) -> bool {
        (200..=299).contains(&self.0)
    }

    /// 1xx, 204 and 304 responses never carry a body.
    pub fn forbids_body(self) -> bool {
        (100..200).contains(&self.0) || self.0 == 204 || self.0 == 304
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub version: HttpVersion,
    pub status: HttpStatusCode,
    pub reason: String,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Decoded body text. The charset comes from a `<meta>` declaration in
    /// HTML bodies, then from `Content-Type`; UTF-8 otherwise.
    pub fn text(&self) -> String {
        charset::decode_text(&self.body, self.header("content-type").unwrap_or_default())
    }
}

pub(crate) fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str())
}

/// True when a comma-separated `name` header lists `token`.
pub(crate) fn header_has_token(headers: &[Header], name: &str, token: &str) -> bool {
    headers.iter().any(|header| {
        header.name.eq_ignore_ascii_case(name)
            && header
                .value
                .split(',')
                .any(|part| part.trim().eq_ignore_ascii_case(token))
    })
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

#[cfg(test)]
mod tests {
    use super::HttpMethod;
    use super::HttpRequest;
    use super::HttpStatusCode;
    use crate::url::BrowserUrl;

    fn url(input: &str) -> BrowserUrl {
        match BrowserUrl::parse(input) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }

    #[test]
    fn get_gets_host_only() {
        let request = match HttpRequest::builder(HttpMethod::Get, url("http://example.com/a")).build() {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(request.header("Host"), Some("example.com"));
        assert_eq!(request.header("Content-Length"), None);
        assert_eq!(
            request.to_bytes(),
            b"GET /a HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn form_body_is_url_encoded() {
        let request = HttpRequest::builder(HttpMethod::Post, url("http://127.0.0.1:8001/"))
            .header("X-Hello", "world")
            .map(|builder| builder.form(&[("name", "hello world"), ("q", "a&b")]))
            .and_then(|builder| builder.build());
        let request = match request {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        assert_eq!(request.body, b"name=hello+world&q=a%26b".to_vec());
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.header("content-length"), Some("24"));
        assert_eq!(request.header("host"), Some("127.0.0.1:8001"));
    }

    #[test]
    fn json_body_sets_content_type() {
        let body = serde_json::json!({ "name": "hello" });
        let request = HttpRequest::builder(HttpMethod::Post, url("http://example.com/api"))
            .json(&body)
            .and_then(|builder| builder.build());
        let request = match request {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };

        assert_eq!(request.body, br#"{"name":"hello"}"#.to_vec());
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("content-length"), Some("16"));
    }

    #[test]
    fn json_keeps_explicit_content_type() {
        let request = HttpRequest::builder(HttpMethod::Put, url("http://example.com/"))
            .header("Content-Type", "application/vnd.api+json")
            .and_then(|builder| builder.json(&serde_json::json!([1, 2])))
            .and_then(|builder| builder.build());
        let request = match request {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(request.header("content-type"), Some("application/vnd.api+json"));
        assert_eq!(request.body, b"[1,2]".to_vec());
    }

    #[test]
    fn get_request_cannot_have_body() {
        let request = HttpRequest::builder(HttpMethod::Get, url("http://example.com/"))
            .body(vec![1, 2, 3])
            .build();
        assert!(request.is_err());
    }

    #[test]
    fn rejects_header_injection() {
        let builder = HttpRequest::builder(HttpMethod::Get, url("http://example.com/"));
        assert!(builder.clone().header("X-Bad", "a\r\nb").is_err());
        assert!(builder.header("Bad Name", "a").is_err());
    }

    #[test]
    fn status_code_range_is_enforced() {
        assert!(HttpStatusCode::new(200).is_ok());
        assert!(HttpStatusCode::new(99).is_err());
        assert!(HttpStatusCode::new(600).is_err());
        assert!(HttpStatusCode::new(204).is_ok_and(|code| code.forbids_body()));
    }
}
