/// Document storage for invoices and payment evidence
///
/// The workflow only ever stores server-generated names and reads them back;
/// the bytes live behind the `DocumentStore` trait. The shipped
/// `LocalDocumentStore` writes to a local directory (by default a temporary
/// one) and makes no durability promise: **documents may be lost across
/// process restarts**. Callers treat a missing read as a distinct,
/// user-actionable condition rather than an internal error. A durable
/// object-store implementation can replace it behind the same trait.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::path::PathBuf;
use tracing::warn;

/// Error type for document storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Client-visible name failed validation (path traversal, empty)
    #[error("Invalid document name: {0}")]
    InvalidName(String),

    /// Underlying filesystem failure
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability contract for storing workflow documents
///
/// Implementations own the mapping from generated names to bytes. `get`
/// returns `Ok(None)` when the document is absent; for the local store that
/// includes documents evicted by a restart.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes bytes under the given generated name
    async fn put(&self, name: &str, bytes: Bytes) -> Result<(), StorageError>;

    /// Reads bytes by name; None when absent
    async fn get(&self, name: &str) -> Result<Option<Bytes>, StorageError>;

    /// Removes a document; absent documents are not an error
    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Local-directory document store
///
/// Ephemeral by contract: the default root lives under the system temp
/// directory and its contents do not survive a host cleanup or container
/// restart.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    /// Creates a store rooted at the given directory, creating it if needed
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Creates a store under the system temp directory
    pub async fn in_temp_dir() -> Result<Self, StorageError> {
        let root = std::env::temp_dir().join("worklog-documents");
        warn!(
            root = %root.display(),
            "Document store is ephemeral; contents may be lost across restarts"
        );
        Self::new(root).await
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn put(&self, name: &str, bytes: Bytes) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, &bytes).await?;
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Bytes>, StorageError> {
        let path = self.resolve(name)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve(name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Rejects names that could escape the storage root
///
/// Stored names are always server-generated, so anything with a path
/// separator or dot-dot segment is an attack, not a mistake.
fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("empty name".to_string()));
    }

    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(StorageError::InvalidName(name.to_string()));
    }

    Ok(())
}

/// Generates the stored name for an invoice document
///
/// `invoice_<invoiceNumber>_<timestamp>.<ext>`, with the extension taken
/// from the uploaded file name (default "pdf").
pub fn invoice_file_name(invoice_number: &str, original_name: &str) -> String {
    format!(
        "invoice_{}_{}.{}",
        invoice_number,
        Utc::now().timestamp(),
        extension_of(original_name)
    )
}

/// Generates the stored name for a payment evidence document
pub fn evidence_file_name(original_name: &str) -> String {
    format!(
        "evidence_{}_{}.{}",
        uuid::Uuid::new_v4().simple(),
        Utc::now().timestamp(),
        extension_of(original_name)
    )
}

fn extension_of(original_name: &str) -> &str {
    std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("pdf")
}
