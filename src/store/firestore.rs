//! Cloud Firestore REST backend.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::value::{decode_document, encode_fields};
use super::{validate_collection, validate_fields, Document, DocumentPath, DocumentStore, Fields};
use crate::auth::TokenSource;
use crate::error::{AppError, Result};
use crate::retry::RetryPolicy;

/// Documents requested per page when listing a collection.
pub const LIST_PAGE_SIZE: usize = 300;

// == Firestore Store ==
/// Talks to `{root}/projects/{project}/databases/{database}/documents`.
pub struct FirestoreStore {
    client: Client,
    tokens: Arc<dyn TokenSource>,
    retry: RetryPolicy,
    documents_url: String,
}

impl FirestoreStore {
    /// Creates a store for one project database.
    ///
    /// # Arguments
    /// * `root` - REST root, e.g. `https://firestore.googleapis.com/v1`
    /// * `project_id` - Google Cloud project
    /// * `database_id` - usually `(default)`
    pub fn new(
        client: Client,
        tokens: Arc<dyn TokenSource>,
        retry: RetryPolicy,
        root: &str,
        project_id: &str,
        database_id: &str,
    ) -> Self {
        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            root.trim_end_matches('/'),
            project_id,
            database_id
        );
        Self {
            client,
            tokens,
            retry,
            documents_url,
        }
    }

    /// Appends `segments` to the documents URL, percent-encoding each one.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = Url::parse(&self.documents_url).map_err(|e| {
            AppError::Config(format!("invalid firestore URL {}: {}", self.documents_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!("firestore URL {} has no path", self.documents_url))
            })?
            .extend(segments);
        Ok(url)
    }

    fn document_url(&self, path: &DocumentPath) -> Result<Url> {
        self.url(path.collection.split('/').chain([path.id.as_str()]))
    }

    /// Sends a request built by `build`, with a bearer token, retrying
    /// transient failures and refreshing the token once on 401.
    async fn send<F>(&self, label: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Sync,
    {
        let build = &build;
        self.retry
            .run(label, move || async move {
                let response = self.send_once(build).await?;
                if response.status() != StatusCode::UNAUTHORIZED {
                    return Ok(response);
                }

                warn!("{}: token rejected, refreshing", label);
                self.tokens.invalidate().await;
                self.send_once(build).await
            })
            .await
    }

    async fn send_once<F>(&self, build: &F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let token = self.tokens.token().await?;
        let response = build()
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("firestore: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Unavailable(format!(
                "firestore returned {}: {}",
                status, body
            )));
        }
        Ok(response)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        self.client.request(method, url.clone())
    }
}

/// Maps a non-success response to an error.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = format!("firestore returned {}: {}", status, body);
    Err(match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::BAD_REQUEST => AppError::InvalidRequest(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Auth(message),
        _ => AppError::Upstream(message),
    })
}

async fn read_json(response: Response) -> Result<Value> {
    response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("malformed firestore response: {}", e)))
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        let url = self.document_url(path)?;
        let response = self
            .send("firestore get", || self.request(Method::GET, &url))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Document {} not found", path);
            return Ok(None);
        }
        let body = read_json(check(response).await?).await?;
        decode_document(&body).map(Some)
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<Document> {
        validate_fields(&fields)?;

        let url = self.document_url(path)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .send("firestore set", || {
                self.request(Method::PATCH, &url).json(&body)
            })
            .await?;

        let body = read_json(check(response).await?).await?;
        decode_document(&body)
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        let url = self.document_url(path)?;
        let response = self
            .send("firestore delete", || self.request(Method::DELETE, &url))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response).await.map(|_| ())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        validate_collection(collection)?;

        let url = self.url(collection.split('/'))?;
        let page_size = LIST_PAGE_SIZE.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let response = self
                .send("firestore list", || {
                    let mut query = vec![("pageSize", page_size.clone())];
                    if let Some(token) = &page_token {
                        query.push(("pageToken", token.clone()));
                    }
                    self.request(Method::GET, &url).query(&query)
                })
                .await?;

            let body = read_json(check(response).await?).await?;
            if let Some(items) = body.get("documents").and_then(Value::as_array) {
                for item in items {
                    documents.push(decode_document(item)?);
                }
            }

            match body.get("nextPageToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        documents.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("Listed {} documents in {}", documents.len(), collection);
        Ok(documents)
    }
}
