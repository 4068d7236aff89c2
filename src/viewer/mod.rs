//! Paginated document viewer

mod backend;
mod controller;
#[cfg(feature = "pdf")]
mod mupdf_backend;
mod request;
mod sequence;
mod service;
mod state;
mod worker;

pub use backend::{DocumentHandle, DocumentResolver, PageImage, PageRenderer, RendererFactory};
pub use controller::{CompletionCallback, ViewerConfig, ViewerController};
#[cfg(feature = "pdf")]
pub use mupdf_backend::{MupdfRenderer, MupdfResolver};
pub use request::{DocumentFault, DocumentRef, LoadId, WorkerRequest, WorkerResponse};
pub use sequence::{PageIndex, PageRequest, PageRequests, PageSequence, RenderOptions};
pub use service::ViewerService;
pub use state::{Command, Effect, LoadState, PageContent, PageView, ViewerState};

/// Default number of viewer worker threads
pub const DEFAULT_WORKERS: usize = 2;
