//! External document capabilities
//!
//! The viewer never parses documents itself. A [`DocumentResolver`] turns a
//! reference into a [`DocumentHandle`] (page count plus metadata), and a
//! [`PageRenderer`] rasterizes one page of that handle. Both run on worker
//! threads.

use std::sync::Arc;

use super::request::{DocumentFault, DocumentRef};
use super::sequence::PageRequest;

/// Resolved document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentHandle {
    pub reference: DocumentRef,
    pub page_count: usize,
    pub title: Option<String>,
}

impl DocumentHandle {
    #[must_use]
    pub fn new(reference: DocumentRef, page_count: usize) -> Self {
        Self {
            reference,
            page_count,
            title: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Outcome of rasterizing one page.
///
/// Only the raster geometry is kept; the bitmap itself is not retained.
/// `text` is only filled in when the request asked for a text layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageImage {
    pub width_px: u32,
    pub height_px: u32,
    pub text: Option<String>,
}

/// Resolves a reference into a document handle.
///
/// Called from worker threads; may block.
pub trait DocumentResolver: Send + Sync {
    fn resolve(&self, reference: &DocumentRef) -> Result<DocumentHandle, DocumentFault>;
}

/// Renders a single page of a resolved document.
///
/// Engines such as MuPDF keep per-thread document state, so a renderer is
/// not shared: every worker builds its own through a [`RendererFactory`].
pub trait PageRenderer {
    fn render_page(
        &self,
        document: &DocumentHandle,
        request: &PageRequest,
    ) -> Result<PageImage, DocumentFault>;
}

/// Builds one [`PageRenderer`] per worker thread
pub type RendererFactory = Arc<dyn Fn() -> Box<dyn PageRenderer> + Send + Sync>;
