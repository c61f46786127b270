//! Startup document fetch
//!
//! Fetches one configured document when the server starts and logs it, which
//! doubles as a connectivity and credentials check against the store.

use tracing::info;

use crate::error::Result;
use crate::store::{Document, DocumentPath, DocumentStore};

/// Fetches `path` and logs its fields when it exists.
pub async fn fetch_bootstrap_document(
    store: &dyn DocumentStore,
    path: &str,
) -> Result<Option<Document>> {
    let path = DocumentPath::parse(path)?;
    let document = store.get(&path).await?;

    match &document {
        Some(doc) => info!(
            "Bootstrap document {}: {}",
            path,
            serde_json::Value::Object(doc.fields.clone())
        ),
        None => info!("Bootstrap document {} not found", path),
    }

    Ok(document)
}
