//! Firestore REST API client.
//!
//! A thin client over the documents API with:
//! - Service account tokens via gcp_auth
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff on network errors and rate limits
//! - Request metrics

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{
    Document, ListDocumentsResponse, RunQueryRequest, RunQueryResult, StructuredQuery, Value,
};

/// OAuth scope for the Firestore API.
const DATASTORE_SCOPE: &[&str] = &["https://www.googleapis.com/auth/datastore"];

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                )
            })?;

        if project_id.is_empty() {
            return Err(FirestoreError::auth_error("GCP_PROJECT_ID cannot be empty"));
        }

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::from_env(),
        })
    }
}

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    auth: Arc<dyn TokenProvider>,
}

impl FirestoreClient {
    /// Create a new client.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let auth = Self::auth_provider()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("promptgen-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        let base_url = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/{}/documents",
            config.project_id, config.database_id
        );

        Ok(Self {
            http,
            config,
            base_url,
            auth,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        Self::new(FirestoreConfig::from_env()?).await
    }

    fn auth_provider() -> FirestoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(FirestoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    async fn token(&self) -> FirestoreResult<String> {
        let token = self
            .auth
            .token(DATASTORE_SCOPE)
            .await
            .map_err(|e| FirestoreError::auth_error(format!("Token fetch failed: {}", e)))?;
        Ok(token.as_str().to_string())
    }

    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, doc_id)
    }

    /// Read the error body and map the status to an error variant.
    async fn error_from(url: &str, response: reqwest::Response) -> FirestoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }

    // =========================================================================
    // CRUD operations
    // =========================================================================

    /// Get a document. Returns `None` when it does not exist.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = self.document_url(collection, doc_id);

        let result = with_retry(&self.config.retry, "get_document", || async {
            let token = self.token().await?;
            let response = self.http.get(&url).bearer_auth(&token).send().await?;

            match response.status() {
                StatusCode::OK => Ok(Some(response.json::<Document>().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                _ => Err(Self::error_from(&url, response).await),
            }
        })
        .await;

        record_request("get_document", collection, result.is_ok());
        result
    }

    /// Create a document with an explicit id.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = format!("{}/{}?documentId={}", self.base_url, collection, doc_id);
        let body = Document::new(fields);

        let result = with_retry(&self.config.retry, "create_document", || async {
            let token = self.token().await?;
            let response = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json::<Document>().await?),
                _ => Err(Self::error_from(&url, response).await),
            }
        })
        .await;

        record_request("create_document", collection, result.is_ok());
        if result.is_ok() {
            debug!(collection, doc_id, "Created document");
        }
        result
    }

    /// Patch a document. `mask` limits the update to the named fields;
    /// without it the whole document is replaced.
    pub async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        mask: Option<Vec<String>>,
    ) -> FirestoreResult<Document> {
        let mut url = self.document_url(collection, doc_id);
        if let Some(paths) = &mask {
            let params: Vec<String> = paths
                .iter()
                .map(|p| format!("updateMask.fieldPaths={}", p))
                .collect();
            url = format!("{}?{}", url, params.join("&"));
        }
        let body = Document::new(fields);

        let result = with_retry(&self.config.retry, "update_document", || async {
            let token = self.token().await?;
            let response = self
                .http
                .patch(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => Ok(response.json::<Document>().await?),
                _ => Err(Self::error_from(&url, response).await),
            }
        })
        .await;

        record_request("update_document", collection, result.is_ok());
        result
    }

    /// Delete a document. Deleting a missing document is not an error.
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<()> {
        let url = self.document_url(collection, doc_id);

        let result = with_retry(&self.config.retry, "delete_document", || async {
            let token = self.token().await?;
            let response = self.http.delete(&url).bearer_auth(&token).send().await?;

            match response.status() {
                StatusCode::OK | StatusCode::NOT_FOUND => Ok(()),
                _ => Err(Self::error_from(&url, response).await),
            }
        })
        .await;

        record_request("delete_document", collection, result.is_ok());
        result
    }

    /// List every document in a collection, following pagination.
    pub async fn list_documents(&self, collection: &str) -> FirestoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!("{}/{}?pageSize=300", self.base_url, collection);
            if let Some(token) = &page_token {
                url = format!("{}&pageToken={}", url, token);
            }

            let page = with_retry(&self.config.retry, "list_documents", || async {
                let token = self.token().await?;
                let response = self.http.get(&url).bearer_auth(&token).send().await?;

                match response.status() {
                    StatusCode::OK => Ok(response.json::<ListDocumentsResponse>().await?),
                    _ => Err(Self::error_from(&url, response).await),
                }
            })
            .await;

            record_request("list_documents", collection, page.is_ok());
            let page = page?;

            documents.extend(page.documents.unwrap_or_default());
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    /// Run a structured query and collect the matching documents.
    pub async fn run_query(&self, query: StructuredQuery) -> FirestoreResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.base_url);
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let body = RunQueryRequest {
            structured_query: query,
        };

        let result = with_retry(&self.config.retry, "run_query", || async {
            let token = self.token().await?;
            let response = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => {
                    let results: Vec<RunQueryResult> = response.json().await?;
                    Ok(results.into_iter().filter_map(|r| r.document).collect())
                }
                _ => Err(Self::error_from(&url, response).await),
            }
        })
        .await;

        record_request("run_query", &collection, result.is_ok());
        result
    }
}
