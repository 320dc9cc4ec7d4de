//! Server-to-server forwarding.
//!
//! Relays either a stored file or a live request body to
//! `{target}/post?filename={name}` on another filerelay-compatible server.
//! Each relay is a single hop: no retries and no total timeout.

use std::time::Duration;

use futures::stream::TryStream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Response, StatusCode};
use tokio_util::io::ReaderStream;
use url::Url;

use crate::config::ForwardConfig;
use crate::file::FileStorage;
use crate::{RelayError, Result};

const OCTET_STREAM: &str = "application/octet-stream";

/// Outbound HTTP relay shared by all requests.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client,
}

impl Forwarder {
    /// Create a forwarder from configuration.
    pub fn new(config: &ForwardConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if config.connect_timeout_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        }

        let client = builder
            .build()
            .map_err(|e| RelayError::Forward(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Build the upload URL on the target server for `filename`.
    ///
    /// Any query or fragment on `target` is dropped; the filename is
    /// query-encoded.
    pub fn target_url(target: &str, filename: &str) -> Result<Url> {
        let mut url = Url::parse(target)
            .map_err(|e| RelayError::Validation(format!("invalid target URL {target}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::Validation(format!(
                "unsupported target scheme: {}",
                url.scheme()
            )));
        }

        url.path_segments_mut()
            .map_err(|_| RelayError::Validation(format!("invalid target URL {target}")))?
            .pop_if_empty()
            .push("post");
        url.set_fragment(None);
        url.set_query(None);
        url.query_pairs_mut().append_pair("filename", filename);

        Ok(url)
    }

    /// Stream a stored file to `url` and hand back the target's response.
    ///
    /// The file is piped straight from disk into the outbound body.
    pub async fn forward_stored(
        &self,
        storage: &FileStorage,
        filename: &str,
        url: &Url,
    ) -> Result<Response> {
        let file = storage.load(filename).await?;
        let size = file.metadata().await?.len();

        tracing::debug!(filename = %filename, url = %url, bytes = size, "Forwarding stored file");

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(CONTENT_LENGTH, size)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        tracing::info!(
            filename = %filename,
            url = %url,
            status = response.status().as_u16(),
            "Data successfully forwarded"
        );

        Ok(response)
    }

    /// Pipe a live byte stream to `url`, returning only the target's status.
    ///
    /// The target's response body is dropped unread.
    pub async fn forward_stream<S>(&self, stream: S, url: &Url) -> Result<StatusCode>
    where
        S: TryStream + Send + 'static,
        S::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
        bytes::Bytes: From<S::Ok>,
    {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(Body::wrap_stream(stream))
            .send()
            .await?;

        let status = response.status();
        tracing::info!(url = %url, status = status.as_u16(), "Data successfully forwarded");

        Ok(status)
    }
}
