use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use super::{DocumentStore, FieldFilter, FilterValue, FormulaRecord, StoreError};
use crate::config::Config;
use crate::util::http::{read_limited, secure_base_url, MAX_BODY_SIZE};

// ============================================================================
// Wire Types
// ============================================================================

/// One element of a `runQuery` response stream. Elements without a
/// `document` carry only read metadata (an empty result is one of those).
#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, TypedValue>,
    update_time: Option<DateTime<Utc>>,
}

/// Firestore's tagged value. Only the variants this client reads are
/// declared; anything else deserializes as all-`None`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedValue {
    string_value: Option<String>,
    boolean_value: Option<bool>,
}

impl Document {
    fn string_field(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(|v| v.string_value.clone())
    }

    fn into_record(self) -> FormulaRecord {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        FormulaRecord {
            name: self.string_field("name"),
            concentration: self.string_field("concentration"),
            public: self
                .fields
                .get("public")
                .and_then(|v| v.boolean_value)
                .unwrap_or(false),
            uid: self.string_field("uid").unwrap_or_default(),
            updated: self.update_time,
            id,
        }
    }
}

fn encode_value(value: &FilterValue) -> serde_json::Value {
    match value {
        FilterValue::Bool(b) => json!({ "booleanValue": b }),
        FilterValue::String(s) => json!({ "stringValue": s }),
    }
}

fn structured_query(collection: &str, filter: &FieldFilter) -> serde_json::Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": filter.field },
                    "op": "EQUAL",
                    "value": encode_value(&filter.value),
                }
            }
        }
    })
}

// ============================================================================
// Client
// ============================================================================

/// Firestore REST reader (`documents:runQuery`).
pub struct FirestoreClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl FirestoreClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        project_id: &str,
        database: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base = secure_base_url(base_url)?;
        let endpoint = base
            .join(&format!(
                "v1/projects/{}/databases/{}/documents:runQuery",
                project_id, database
            ))
            .map_err(|e| StoreError::Decode(format!("endpoint: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            timeout,
        })
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Result<Self, StoreError> {
        Self::new(
            client,
            &config.firestore_base_url,
            &config.project_id,
            &config.database,
            config.api_key.clone().map(SecretString::from),
            config.request_timeout(),
        )
    }

    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key.expose_secret());
        }
        url
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn query(
        &self,
        collection: &str,
        filter: &FieldFilter,
        auth: Option<&SecretString>,
    ) -> Result<Vec<FormulaRecord>, StoreError> {
        let mut request = self
            .client
            .post(self.request_url())
            .json(&structured_query(collection, filter));

        if let Some(token) = auth {
            request = request.bearer_auth(token.expose_secret());
        }

        tracing::debug!(collection = %collection, filter = %filter, authed = auth.is_some(), "Firestore runQuery");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout.as_secs())
            } else {
                StoreError::Network(e)
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(StoreError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(StoreError::HttpStatus(status.as_u16()));
        }

        let body = read_limited(response, MAX_BODY_SIZE).await?;
        let items: Vec<RunQueryItem> =
            serde_json::from_slice(&body).map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(Document::into_record)
            .collect())
    }
}
