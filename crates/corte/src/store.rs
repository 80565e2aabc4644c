//! Storage collaborator: where order documents live between import and
//! printing.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use corte_core::CorteError;
use corte_pdf::{StampRequest, stamp};
use tracing::debug;

/// The two documents stored per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDocument {
    /// The service order itself.
    Order,
    /// Proof of service attached after execution.
    Receipt,
}

impl OrderDocument {
    pub fn file_name(&self) -> &'static str {
        match self {
            OrderDocument::Order => "ordem.pdf",
            OrderDocument::Receipt => "comprovante.pdf",
        }
    }
}

/// Storage path of an order's document.
pub fn order_document_path(order_id: &str, document: OrderDocument) -> String {
    format!("{}/{}", order_id.trim_matches('/'), document.file_name())
}

/// A blob store holding documents by path.
///
/// Failures carry the underlying message unchanged; callers do not retry.
pub trait DocumentStore {
    /// Store `bytes` at `path`, replacing any previous content.
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, CorteError>;

    fn download(&self, path: &str) -> Result<Vec<u8>, CorteError>;

    fn public_url(&self, path: &str) -> String;
}

/// Store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
    public_base: String,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a store path under the root, refusing escapes.
    fn resolve(&self, path: &str) -> Result<PathBuf, CorteError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.as_os_str().is_empty() {
            return Err(CorteError::Storage(format!("invalid storage path {path:?}")));
        }
        Ok(self.root.join(relative))
    }
}

impl DocumentStore for FsDocumentStore {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, CorteError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CorteError::Storage(e.to_string()))?;
        }
        std::fs::write(&target, bytes).map_err(|e| CorteError::Storage(e.to_string()))?;
        debug!(path, content_type, bytes = bytes.len(), "uploaded document");
        Ok(path.to_string())
    }

    fn download(&self, path: &str) -> Result<Vec<u8>, CorteError> {
        let target = self.resolve(path)?;
        std::fs::read(&target).map_err(|e| CorteError::Storage(format!("{path}: {e}")))
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.public_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, (String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for a stored path.
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects
            .lock()
            .ok()?
            .get(path)
            .map(|(content_type, _)| content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, CorteError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| CorteError::Storage("store lock poisoned".to_string()))?;
        objects.insert(path.to_string(), (content_type.to_string(), bytes.to_vec()));
        Ok(path.to_string())
    }

    fn download(&self, path: &str) -> Result<Vec<u8>, CorteError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| CorteError::Storage("store lock poisoned".to_string()))?;
        objects
            .get(path)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| CorteError::Storage(format!("object not found: {path}")))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{path}")
    }
}

/// Download an order's document and stamp it.
pub fn stamp_stored_order(
    store: &dyn DocumentStore,
    order_id: &str,
    request: &StampRequest,
) -> Result<Vec<u8>, CorteError> {
    let path = order_document_path(order_id, OrderDocument::Order);
    let bytes = store.download(&path)?;
    stamp(&bytes, request)
}
