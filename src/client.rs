//! HTTP client for the `/process` exchange
//!
//! One POST per call, no retries. The underlying [`reqwest::Client`] is
//! built once per process and shared by every [`ProcessClient`].

use std::sync::OnceLock;
use std::time::Duration;

use url::Url;

use crate::codec::decode_audio;
use crate::config::{ServerConfig, parse_base_url};
use crate::protocol::{ImageRequest, ImageResponse, PROCESS_PATH};
use crate::{Error, Result};

/// Process-wide HTTP client
static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Return the shared HTTP client, building it on first use
#[must_use]
pub fn shared_http_client() -> reqwest::Client {
    HTTP_CLIENT.get_or_init(reqwest::Client::new).clone()
}

/// Uploads encoded images and returns decoded audio
#[derive(Debug, Clone)]
pub struct ProcessClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl ProcessClient {
    /// Create a client for the configured server
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL cannot be built
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let endpoint = config
            .base_url
            .join(PROCESS_PATH)
            .map_err(|e| Error::Config(format!("invalid endpoint URL: {e}")))?;

        tracing::debug!(endpoint = %endpoint, timeout = ?config.timeout, "process client ready");

        Ok(Self {
            http: shared_http_client(),
            endpoint,
            timeout: config.timeout,
        })
    }

    /// Create a client from a bare base URL with no timeout override
    ///
    /// # Errors
    ///
    /// Returns error if the URL is malformed
    pub fn from_base_url(base_url: &str) -> Result<Self> {
        Self::new(&ServerConfig {
            base_url: parse_base_url(base_url)?,
            timeout: None,
        })
    }

    /// Full URL of the processing endpoint
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Upload one Base64 JPEG and return the decoded audio reply
    ///
    /// The image is forwarded verbatim; no validation happens client-side.
    /// Returns `Ok(None)` when the server answers 2xx with no body.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if no response was received
    /// - [`Error::Server`] on a non-2xx status, carrying the body text
    /// - [`Error::Decode`] if the body or its `audio` field cannot be decoded
    pub async fn submit_image(&self, image_base64: String) -> Result<Option<Vec<u8>>> {
        let image_len = image_base64.len();
        let request = ImageRequest::new(image_base64);

        let mut builder = self.http.post(self.endpoint.clone()).json(&request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(endpoint = %self.endpoint, image_len, "uploading image");

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    let reason = describe(&e);
                    tracing::warn!(
                        status = status.as_u16(),
                        error = %reason,
                        "failed to read error body"
                    );
                    format!("<unreadable body: {reason}>")
                }
            };
            return Err(Error::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(describe(&e)))?;

        let Some(reply) = parse_reply(&body)? else {
            tracing::warn!(status = status.as_u16(), "server returned no audio body");
            return Ok(None);
        };

        let audio = decode_audio(&reply.audio)?;
        tracing::debug!(audio_bytes = audio.len(), "received audio reply");

        Ok(Some(audio))
    }
}

/// Parse a success body; empty bodies and JSON `null` mean "no reply"
fn parse_reply(body: &[u8]) -> Result<Option<ImageResponse>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice::<Option<ImageResponse>>(body)
        .map_err(|e| Error::Decode(format!("malformed response body: {e}")))
}

/// Flatten a reqwest error and its source chain into one line
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_resolves_under_base_path() {
        let client = ProcessClient::from_base_url("http://localhost:9000/v1").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:9000/v1/process");
    }

    #[test]
    fn endpoint_for_default_server() {
        let client = ProcessClient::from_base_url(crate::config::DEFAULT_BASE_URL).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://server-upnmifaofa-ew.a.run.app/process"
        );
    }

    #[test]
    fn empty_and_null_bodies_are_no_reply() {
        assert!(parse_reply(b"").unwrap().is_none());
        assert!(parse_reply(b"  \n").unwrap().is_none());
        assert!(parse_reply(b"null").unwrap().is_none());
    }

    #[test]
    fn malformed_body_is_decode_error() {
        assert!(matches!(parse_reply(b"<html>"), Err(Error::Decode(_))));
        assert!(matches!(parse_reply(br#"{"text":"hi"}"#), Err(Error::Decode(_))));
    }

    #[test]
    fn valid_body_parses() {
        let reply = parse_reply(br#"{"audio":"SGVsbG8="}"#).unwrap().unwrap();
        assert_eq!(reply.audio, "SGVsbG8=");
    }
}
