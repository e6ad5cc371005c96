//! The badge renderer target.
//!
//! Parsed once at startup and shared read-only by every request.

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Uri};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme {0:?}, expected http or https")]
    Scheme(String),

    #[error("missing host")]
    MissingHost,

    #[error("{0}")]
    Invalid(#[from] axum::http::Error),
}

/// Scheme, host and path of the renderer's static badge endpoint.
#[derive(Debug, Clone)]
pub struct Upstream {
    scheme: Scheme,
    authority: Authority,
    path: String,
    host: HeaderValue,
}

impl Upstream {
    pub fn parse(raw: &str) -> Result<Self, UpstreamError> {
        let url = Url::parse(raw)?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(UpstreamError::Scheme(other.to_string())),
        };

        let host = url.host_str().ok_or(UpstreamError::MissingHost)?;
        // `port()` is None for the scheme's default port.
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let authority = Authority::try_from(host.as_str()).map_err(axum::http::Error::from)?;
        let header = HeaderValue::try_from(host.as_str()).map_err(axum::http::Error::from)?;

        Ok(Self {
            scheme,
            authority,
            path: url.path().to_string(),
            host: header,
        })
    }

    /// Host (and non-default port) as a header value.
    pub fn host(&self) -> &HeaderValue {
        &self.host
    }

    /// Build the outbound URI, replacing any inbound path and query.
    pub fn uri(&self, query: Option<&str>) -> Result<Uri, UpstreamError> {
        let path_and_query = match query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.clone(),
        };
        let path_and_query =
            PathAndQuery::try_from(path_and_query).map_err(axum::http::Error::from)?;

        Ok(Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?)
    }
}
