//! Fetchable page addresses.

use bw_core::EngineError;
use bw_core::EngineResult;
use url::Url;

const HTTP_PORT: u16 = 80;

/// Absolute `http://` URL with the fragment removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserUrl {
    parsed: Url,
    host: String,
    port: u16,
}

impl BrowserUrl {
    pub fn parse(input: &str) -> EngineResult<Self> {
        let mut parsed = Url::parse(input).map_err(|error| {
            EngineError::new("net.url.invalid", format!("`{input}`: {error}"))
        })?;

        match parsed.scheme() {
            "http" => {}
            "https" => {
                return Err(EngineError::new(
                    "net.url.tls_unsupported",
                    format!("`{input}` needs TLS, only plain http is fetched"),
                ));
            }
            other => {
                return Err(EngineError::new(
                    "net.url.scheme_unsupported",
                    format!("unsupported scheme `{other}`"),
                ));
            }
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(EngineError::new(
                "net.url.credentials_disallowed",
                "URL userinfo is not allowed",
            ));
        }

        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| EngineError::new("net.url.host_missing", "URL must include a host"))?
            .to_ascii_lowercase();
        let port = parsed.port_or_known_default().unwrap_or(HTTP_PORT);

        parsed.set_fragment(None);

        Ok(Self { parsed, host, port })
    }

    pub fn as_str(&self) -> &str {
        self.parsed.as_str()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Value for the `Host` header.
    pub fn authority(&self) -> String {
        if self.port == HTTP_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn path_and_query(&self) -> String {
        let path = match self.parsed.path() {
            "" => "/",
            path => path,
        };

        match self.parsed.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_owned(),
        }
    }
}
