use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::core::ByteRange;
use crate::data::Headers;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status and headers of a metadata-only request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub headers: Headers,
}

/// Status, headers and streaming body of a GET request.
pub struct FetchResponse<E> {
    pub status: u16,
    pub headers: Headers,
    pub body: BoxStream<'static, Result<Bytes, E>>,
}

impl<E> FetchResponse<E> {
    /// `206 Partial Content`: the server honoured the requested range.
    pub fn is_partial(&self) -> bool {
        self.status == 206
    }

    /// Range announced by `Content-Range`, if present and well formed.
    pub fn content_range(&self) -> Option<ByteRange> {
        self.headers
            .first("content-range")
            .and_then(ByteRange::from_content_range)
    }
}

impl<E> fmt::Debug for FetchResponse<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &"{ ... }")
            .finish()
    }
}

/// Asynchronous HTTP transport used by the probe and the chunk workers.
///
/// Implementations own TLS, redirects and connection reuse. Non-success
/// statuses are returned in the response, not as errors; the engine decides
/// what they mean.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - In-memory fakes for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures (DNS, refused connection, timeout, broken body).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a metadata-only request (HEAD) and return status and headers.
    fn probe(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<ProbeResponse, Self::Error>> + Send;

    /// Issue a GET, optionally restricted to `range`, and stream the body.
    fn fetch(
        &self,
        url: &str,
        range: Option<ByteRange>,
    ) -> impl Future<Output = Result<FetchResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use reqwest::header::{HeaderMap, RANGE};

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self, reqwest::Error> {
            let client = reqwest::Client::builder()
                .user_agent(concat!("splitfetch/", env!("CARGO_PKG_VERSION")))
                .build()?;
            Ok(Self { client })
        }

        /// Wrap an already configured client (proxies, timeouts, TLS roots).
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    /// Servers send raw UTF-8 in `Content-Disposition`; keep it instead of dropping it.
    pub(super) fn convert_headers(map: &HeaderMap) -> Headers {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn probe(&self, url: &str) -> Result<ProbeResponse, Self::Error> {
            let response = self.client.head(url).send().await?;

            Ok(ProbeResponse {
                status: response.status().as_u16(),
                headers: convert_headers(response.headers()),
            })
        }

        async fn fetch(
            &self,
            url: &str,
            range: Option<ByteRange>,
        ) -> Result<FetchResponse<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);
            if let Some(value) = range.and_then(|r| r.header_value()) {
                request = request.header(RANGE, value);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = convert_headers(response.headers());

            Ok(FetchResponse {
                status,
                headers,
                body: Box::pin(response.bytes_stream()),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn response(headers: &[(&str, &str)]) -> FetchResponse<std::io::Error> {
        FetchResponse {
            status: 206,
            headers: headers.iter().copied().collect(),
            body: Box::pin(stream::empty()),
        }
    }

    #[test]
    fn content_range_is_read_from_headers() {
        let resp = response(&[("Content-Range", "bytes 10-19/100")]);
        assert!(resp.is_partial());
        assert_eq!(resp.content_range(), Some(ByteRange::new(10, 20)));
        assert_eq!(response(&[]).content_range(), None);
    }

    #[cfg(feature = "reqwest")]
    #[test]
    fn non_ascii_header_values_survive_conversion() {
        use reqwest::header::{CONTENT_DISPOSITION, HeaderMap, HeaderValue};

        let mut map = HeaderMap::new();
        let raw = "attachment; filename=\"résumé.pdf\"";
        map.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_bytes(raw.as_bytes()).unwrap(),
        );

        let headers = reqwest_impl::convert_headers(&map);
        assert_eq!(headers.first("content-disposition"), Some(raw));
        assert_eq!(
            crate::core::resolve_filename(&headers, "http://x/dl").file_name(),
            "résumé.pdf"
        );
    }
}
