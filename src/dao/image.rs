//! Image warming: fetch an image once so later renders hit a warm cache.

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Failures while warming an image. They never affect gameplay.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The HTTP client could not be built.
    #[error("failed to build image client")]
    ClientBuilder {
        /// Underlying builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// The request did not complete.
    #[error("failed to fetch image `{url}`")]
    Fetch {
        /// Image that was requested.
        url: String,
        /// Underlying transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("unexpected status {status} for image `{url}`")]
    Status {
        /// Image that was requested.
        url: String,
        /// Status returned by the server.
        status: StatusCode,
    },
}

/// Abstraction over whatever resolves image references ahead of display.
pub trait ImageWarmer: Send + Sync {
    /// Fetch `url` once so later renders find it cached.
    fn warm(&self, url: String) -> BoxFuture<'static, Result<(), ImageError>>;
}

/// Warms images by downloading them over HTTP and discarding the body.
#[derive(Clone)]
pub struct HttpImageWarmer {
    client: Client,
}

impl HttpImageWarmer {
    /// Build a warmer backed by a fresh HTTP client.
    pub fn new() -> Result<Self, ImageError> {
        let client = Client::builder()
            .build()
            .map_err(|source| ImageError::ClientBuilder { source })?;
        Ok(Self { client })
    }
}

impl ImageWarmer for HttpImageWarmer {
    fn warm(&self, url: String) -> BoxFuture<'static, Result<(), ImageError>> {
        let client = self.client.clone();
        Box::pin(async move {
            // Inline images need no network round-trip.
            if url.starts_with("data:") {
                return Ok(());
            }
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|source| ImageError::Fetch {
                    url: url.clone(),
                    source,
                })?;
            if !response.status().is_success() {
                return Err(ImageError::Status {
                    url,
                    status: response.status(),
                });
            }
            response
                .bytes()
                .await
                .map(|_| ())
                .map_err(|source| ImageError::Fetch { url, source })
        })
    }
}
