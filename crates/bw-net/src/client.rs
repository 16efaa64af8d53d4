//! Blocking HTTP/1.1 client, one connection per request.

use crate::http::HttpMethod;
use crate::http::HttpRequest;
use crate::http::HttpRequestBuilder;
use crate::http::HttpResponse;
use crate::response::ResponseParser;
use crate::url::BrowserUrl;
use bw_core::EngineError;
use bw_core::EngineResult;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("boxwood/", env!("CARGO_PKG_VERSION"));
const DEFAULT_ACCEPT: &str = "text/html,*/*;q=0.8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get(&self, url: &str) -> EngineResult<HttpResponse> {
        let request = self.request(HttpMethod::Get, url)?.build()?;
        self.send(&request)
    }

    /// POSTs `fields` as an urlencoded form.
    pub fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> EngineResult<HttpResponse> {
        let request = self
            .request(HttpMethod::Post, url)?
            .form(fields)
            .build()?;
        self.send(&request)
    }

    /// POSTs `body` as `application/json`.
    pub fn post_json(&self, url: &str, body: &serde_json::Value) -> EngineResult<HttpResponse> {
        let request = self.request(HttpMethod::Post, url)?.json(body)?.build()?;
        self.send(&request)
    }

    /// Builder preloaded with the client's default headers.
    pub fn request(
        &self,
        method: HttpMethod,
        url: &str,
    ) -> EngineResult<HttpRequestBuilder> {
        let url = BrowserUrl::parse(url)?;
        HttpRequest::builder(method, url)
            .header("User-Agent", &self.config.user_agent)?
            .header("Accept", DEFAULT_ACCEPT)?
            .header("Accept-Encoding", "gzip, deflate, br")?
            .header("Connection", "close")
    }

    /// Sends `request` on a fresh connection and reads until the response is
    /// complete or the server closes.
    pub fn send(&self, request: &HttpRequest) -> EngineResult<HttpResponse> {
        let mut stream = self.connect(&request.url)?;
        log::debug!(
            "{} {} ({} body bytes)",
            request.method.as_str(),
            request.url.as_str(),
            request.body.len()
        );

        stream
            .write_all(&request.to_bytes())
            .and_then(|()| stream.flush())
            .map_err(|error| {
                EngineError::new("net.http.write_failed", format!("sending request: {error}"))
            })?;

        let parser = if request.method == HttpMethod::Head {
            ResponseParser::without_body()
        } else {
            ResponseParser::new()
        };

        let response = read_response(&mut stream, parser)?;
        log::debug!(
            "{} {} -> {} ({} bytes)",
            request.method.as_str(),
            request.url.as_str(),
            response.status.as_u16(),
            response.body.len()
        );
        Ok(response)
    }

    fn connect(&self, url: &BrowserUrl) -> EngineResult<TcpStream> {
        let addresses: Vec<SocketAddr> = (url.host(), url.port())
            .to_socket_addrs()
            .map_err(|error| {
                EngineError::new(
                    "net.dns.resolve_failed",
                    format!("resolving `{}`: {error}", url.host()),
                )
            })?
            .collect();

        let mut last_error = None;
        for address in &addresses {
            match TcpStream::connect_timeout(address, self.config.connect_timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.config.read_timeout))
                        .and_then(|()| stream.set_write_timeout(Some(self.config.read_timeout)))
                        .map_err(|error| {
                            EngineError::new(
                                "net.transport.timeout_failed",
                                format!("configuring `{address}`: {error}"),
                            )
                        })?;
                    return Ok(stream);
                }
                Err(error) => {
                    log::debug!("connect to {address} failed: {error}");
                    last_error = Some(EngineError::new(
                        "net.transport.connect_failed",
                        format!("connecting to `{address}`: {error}"),
                    ));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            EngineError::new(
                "net.transport.no_addresses",
                format!("`{}` resolved to no addresses", url.host()),
            )
        }))
    }
}

/// Feeds `reader` into `parser` until the response is complete or the peer
/// closes. Interrupted reads are retried.
fn read_response(reader: &mut impl Read, mut parser: ResponseParser) -> EngineResult<HttpResponse> {
    let mut buffer = [0_u8; 4096];

    while !parser.is_finished() {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => {
                return Err(EngineError::new(
                    "net.http.read_failed",
                    format!("reading response: {error}"),
                ));
            }
        };
        parser.feed(&buffer[..read])?;
    }

    parser.finish()
}
