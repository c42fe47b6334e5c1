//! Fetch Capability
//!
//! Filters whose data function returns a URL resolve it through a
//! [`Fetcher`]. A fetcher turns a URL into a JSON document and must reject
//! on transport errors, on unsuccessful statuses and on bodies that are not
//! JSON.
//!
//! Any `Fn(String) -> BoxFuture<Result<Value, FetchError>>` closure is a
//! fetcher. With the `http` feature enabled, [`HttpFetcher`] performs plain
//! `GET` requests and is used when a filter set configures no fetcher.

use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use serde_json::Value;

use crate::error::FetchError;

/// Resolves a URL into a JSON document.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: String) -> BoxFuture<'static, Result<Value, FetchError>>;
}

impl<F> Fetcher for F
where
    F: Fn(String) -> BoxFuture<'static, Result<Value, FetchError>> + Send + Sync,
{
    fn fetch(&self, url: String) -> BoxFuture<'static, Result<Value, FetchError>> {
        self(url)
    }
}

/// Fetcher that rejects every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFetcher;

impl Fetcher for NoFetcher {
    fn fetch(&self, _url: String) -> BoxFuture<'static, Result<Value, FetchError>> {
        Box::pin(future::ready(Err(FetchError::Unavailable)))
    }
}

/// The fetcher used when none is configured.
pub fn default_fetcher() -> Arc<dyn Fetcher> {
    #[cfg(feature = "http")]
    {
        Arc::new(HttpFetcher::new())
    }
    #[cfg(not(feature = "http"))]
    {
        Arc::new(NoFetcher)
    }
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use futures_util::future::BoxFuture;
    use serde_json::Value;
    use tracing::debug;

    use super::Fetcher;
    use crate::error::FetchError;

    /// `GET` requests over HTTP.
    #[derive(Debug, Clone, Default)]
    pub struct HttpFetcher {
        client: reqwest::Client,
    }

    impl HttpFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Use a preconfigured client (headers, timeouts, proxies).
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Fetcher for HttpFetcher {
        fn fetch(&self, url: String) -> BoxFuture<'static, Result<Value, FetchError>> {
            let client = self.client.clone();
            Box::pin(async move {
                debug!(%url, "fetching filter data");
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| FetchError::Transport(e.to_string()))?;

                let status = response.status();
                if status.is_client_error() || status.is_server_error() {
                    return Err(FetchError::Status(status.as_u16()));
                }

                let body = response
                    .text()
                    .await
                    .map_err(|e| FetchError::Transport(e.to_string()))?;
                serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
            })
        }
    }
}
