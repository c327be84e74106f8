//! Shared HTTP plumbing for the Firestore and Identity Toolkit clients.

use futures::StreamExt;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum response body accepted from either collaborator (5MB).
pub const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum BaseUrlError {
    #[error("Invalid base URL: {0}")]
    Invalid(#[from] url::ParseError),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    Insecure,
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    TooLarge(usize),
}

/// Redirect policy: at most 3 hops, loops rejected, chain logged.
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Build the HTTP client shared by both remote collaborators.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(redirect_policy())
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
        .build()
}

/// Parse a collaborator base URL and enforce HTTPS.
///
/// Plain HTTP is allowed only for `localhost` and `127.0.0.1`, which is
/// where emulators and test servers live. Bearer tokens and API keys are
/// attached to every request, so anything else is refused.
pub fn secure_base_url(base: &str) -> Result<Url, BaseUrlError> {
    let url = Url::parse(base)?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if matches!(url.host_str(), Some("localhost" | "127.0.0.1")) => {
            tracing::warn!(base_url = %base, "Using non-HTTPS base URL (localhost only)");
            Ok(url)
        }
        _ => {
            tracing::error!(base_url = %base, "Rejecting non-HTTPS base URL");
            Err(BaseUrlError::Insecure)
        }
    }
}

/// Read a response body, refusing anything over `limit` bytes.
pub async fn read_limited(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, BodyError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(BodyError::TooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(BodyError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
