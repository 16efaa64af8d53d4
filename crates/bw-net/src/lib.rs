//! Plain-HTTP fetching: URL parsing, HTTP/1.1 messages, and a blocking client.

pub mod charset;
pub mod client;
pub mod content;
pub mod http;
pub mod response;
pub mod url;

pub use crate::client::ClientConfig;
pub use crate::client::HttpClient;
pub use crate::http::Header;
pub use crate::http::HttpMethod;
pub use crate::http::HttpRequest;
pub use crate::http::HttpRequestBuilder;
pub use crate::http::HttpResponse;
pub use crate::http::HttpStatusCode;
pub use crate::http::HttpVersion;
pub use crate::response::BodyFraming;
pub use crate::response::ChunkedBodyParser;
pub use crate::response::ResponseParser;
pub use crate::response::ResponseState;
pub use crate::url::BrowserUrl;
