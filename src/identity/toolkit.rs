use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::{Credentials, IdentityError, IdentityProvider, Session};
use crate::config::Config;
use crate::util::http::{read_limited, secure_base_url, MAX_BODY_SIZE};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Email/password sign-in over the Identity Toolkit REST API.
///
/// Sign-out is local: the id token is simply dropped.
pub struct IdentityToolkitClient {
    client: reqwest::Client,
    base: Url,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl IdentityToolkitClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        Ok(Self {
            client,
            base: secure_base_url(base_url)?,
            api_key,
            timeout,
        })
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Result<Self, IdentityError> {
        Self::new(
            client,
            &config.identity_base_url,
            config.api_key.clone().map(SecretString::from),
            config.request_timeout(),
        )
    }

    fn endpoint(&self, method: &str) -> Result<Url, IdentityError> {
        let key = self.api_key.as_ref().ok_or(IdentityError::NotConfigured)?;
        let mut url = self
            .base
            .join(&format!("v1/accounts:{}", method))
            .map_err(|e| IdentityError::Decode(format!("endpoint: {}", e)))?;
        url.query_pairs_mut().append_pair("key", key.expose_secret());
        Ok(url)
    }

    async fn post(&self, method: &str, body: serde_json::Value) -> Result<Vec<u8>, IdentityError> {
        let response = self
            .client
            .post(self.endpoint(method)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Timeout
                } else {
                    IdentityError::Network(e)
                }
            })?;

        let status = response.status();
        let bytes = read_limited(response, MAX_BODY_SIZE).await?;

        if status.is_success() {
            return Ok(bytes);
        }

        // Credential failures come back as 400 with a machine-readable code.
        match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            Ok(envelope) if status.is_client_error() => {
                Err(IdentityError::Rejected(envelope.error.message))
            }
            _ => Err(IdentityError::HttpStatus(status.as_u16())),
        }
    }

    /// Best-effort avatar lookup. Failure leaves the session without one.
    async fn avatar_url(&self, id_token: &SecretString) -> Option<String> {
        let body = json!({ "idToken": id_token.expose_secret() });
        let bytes = match self.post("lookup", body).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Account lookup failed, continuing without avatar");
                return None;
            }
        };

        match serde_json::from_slice::<LookupResponse>(&bytes) {
            Ok(lookup) => lookup.users.into_iter().next().and_then(|u| u.photo_url),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed account lookup response");
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitClient {
    async fn sign_in(&self, credentials: Credentials) -> Result<Session, IdentityError> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
            "returnSecureToken": true,
        });

        tracing::debug!(timeout_secs = self.timeout.as_secs(), "Identity Toolkit signInWithPassword");
        let bytes = self.post("signInWithPassword", body).await?;
        let signed_in: SignInResponse =
            serde_json::from_slice(&bytes).map_err(|e| IdentityError::Decode(e.to_string()))?;

        let token = SecretString::from(signed_in.id_token);
        let avatar = self.avatar_url(&token).await;

        let mut session = Session::new(signed_in.local_id, token);
        session.email = signed_in.email.or(Some(credentials.email));
        session.display_avatar_url = avatar;
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), IdentityError> {
        tracing::debug!(user_id = %session.user_id, "Dropping local session");
        Ok(())
    }
}
