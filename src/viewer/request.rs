//! Load request and response types

use std::fmt;
use std::sync::Arc;

use super::backend::{DocumentHandle, PageImage};
use super::sequence::PageRequest;

/// Locator of the document to display (a path or URL).
///
/// Cheap to clone; the same reference is shared by the state, the
/// in-flight request and the resolved handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentRef(Arc<str>);

impl DocumentRef {
    #[must_use]
    pub fn new(locator: impl AsRef<str>) -> Self {
        Self(Arc::from(locator.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Generation tag carried by every load request.
///
/// Generations only grow; a response is applied only when its tag matches
/// the generation the state is currently waiting for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadId(u64);

impl LoadId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Request sent to viewer workers
#[derive(Debug)]
pub enum WorkerRequest {
    /// Resolve a document into a handle
    Resolve { id: LoadId, reference: DocumentRef },

    /// Render one page of a resolved document
    Render {
        id: LoadId,
        document: DocumentHandle,
        request: PageRequest,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from the external document resolver or page renderer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentFault {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document engine: {0}")]
    Engine(String),

    #[error("{detail}")]
    Generic { detail: String },
}

impl DocumentFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from viewer workers
#[derive(Debug)]
pub enum WorkerResponse {
    /// Document resolved successfully
    Resolved { id: LoadId, handle: DocumentHandle },

    /// Resolution failed
    Rejected { id: LoadId, fault: DocumentFault },

    /// A page finished rendering, successfully or not
    Rendered {
        id: LoadId,
        request: PageRequest,
        result: Result<PageImage, DocumentFault>,
    },

    /// Request was dropped before a worker ran it
    Cancelled(LoadId),
}

impl WorkerResponse {
    #[must_use]
    pub fn id(&self) -> LoadId {
        match self {
            Self::Resolved { id, .. } | Self::Rejected { id, .. } | Self::Rendered { id, .. } => {
                *id
            }
            Self::Cancelled(id) => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_refs_compare_by_locator() {
        let a = DocumentRef::new("doc-a.pdf");
        let b: DocumentRef = "doc-a.pdf".into();
        assert_eq!(a, b);
        assert_ne!(a, DocumentRef::from(String::from("doc-b.pdf")));
        assert_eq!(a.to_string(), "doc-a.pdf");
    }

    #[test]
    fn load_ids_increase() {
        let id = LoadId::new(7);
        assert_eq!(id.next(), LoadId::new(8));
        assert!(id.next() > id);
        assert_eq!(id.to_string(), "#7");
    }
}
