//! Viewer controller - ties load state, worker answers and page views together

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use super::DEFAULT_WORKERS;
use super::backend::{DocumentResolver, PageRenderer, RendererFactory};
use super::request::{DocumentRef, LoadId, WorkerResponse};
use super::sequence::{PageSequence, RenderOptions};
use super::service::ViewerService;
use super::state::{Command, Effect, LoadState, PageContent, PageView, ViewerState};

/// Caller-owned notification, invoked once per fully rendered load
pub type CompletionCallback = Box<dyn FnMut()>;

/// Tunables for a [`ViewerController`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewerConfig {
    pub workers: usize,
    pub render_options: RenderOptions,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            render_options: RenderOptions::default(),
        }
    }
}

/// Owns the load state of one viewer and the page views derived from it.
///
/// Never blocks on the resolver or the renderer: both run on the worker
/// pool, and their answers are applied by [`ViewerController::poll`].
pub struct ViewerController {
    state: ViewerState,
    service: ViewerService,
    render_options: RenderOptions,
    pages: Vec<PageView>,
    on_complete: Option<CompletionCallback>,
}

impl ViewerController {
    /// `renderer` is called once on each worker thread to build that
    /// worker's renderer.
    #[must_use]
    pub fn new<F, R>(resolver: Arc<dyn DocumentResolver>, renderer: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: PageRenderer + 'static,
    {
        Self::with_config(resolver, renderer, ViewerConfig::default())
    }

    #[must_use]
    pub fn with_config<F, R>(
        resolver: Arc<dyn DocumentResolver>,
        renderer: F,
        config: ViewerConfig,
    ) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: PageRenderer + 'static,
    {
        let renderers: RendererFactory =
            Arc::new(move || Box::new(renderer()) as Box<dyn PageRenderer>);
        Self {
            state: ViewerState::new(),
            service: ViewerService::with_workers(resolver, renderers, config.workers),
            render_options: config.render_options,
            pages: Vec::new(),
            on_complete: None,
        }
    }

    /// Register the completion callback
    #[must_use]
    pub fn on_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Point the viewer at a document, or at nothing.
    ///
    /// Passing the current reference again is a no-op.
    pub fn set_document(&mut self, reference: Option<DocumentRef>) {
        self.apply_command(Command::SetDocument(reference));
    }

    pub fn reload(&mut self) {
        self.apply_command(Command::Reload);
    }

    /// Apply every worker answer that has arrived. Returns whether any did.
    pub fn poll(&mut self) -> bool {
        let responses = self.service.poll_responses();
        let changed = !responses.is_empty();
        for response in responses {
            self.handle_response(response);
        }
        changed
    }

    /// Wait up to `timeout` for one worker answer and apply it
    pub fn wait_response(&mut self, timeout: Duration) -> bool {
        match self.service.recv_timeout(timeout) {
            Some(response) => {
                self.handle_response(response);
                true
            }
            None => false,
        }
    }

    fn handle_response(&mut self, response: WorkerResponse) {
        match response {
            WorkerResponse::Resolved { id, handle } => {
                self.apply_command(Command::Resolved { id, handle });
            }
            WorkerResponse::Rejected { id, fault } => {
                error!("Failed to load document ({id}): {fault}");
                self.apply_command(Command::Rejected { id, fault });
            }
            WorkerResponse::Rendered {
                id,
                request,
                result,
            } => {
                let content = match result {
                    Ok(image) => PageContent::Rendered(image),
                    Err(fault) => {
                        warn!("Failed to render page {} ({id}): {fault}", request.index);
                        PageContent::Failed(fault.to_string())
                    }
                };
                self.apply_command(Command::PageRendered {
                    id,
                    view: PageView { request, content },
                });
            }
            WorkerResponse::Cancelled(id) => {
                debug!("Work for load {id} dropped before it started");
            }
        }
    }

    fn apply_command(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CancelLoad(id) => self.service.cancel(id),

                Effect::ClearPages => self.pages.clear(),

                Effect::StartLoad { id, reference } => {
                    info!("Loading {reference} ({id})");
                    self.service.resolve(id, reference);
                }

                Effect::RenderPages { id, page_count } => self.render_pages(id, page_count),

                Effect::StorePage(view) => {
                    let slot = view.request.index.zero_based();
                    if let Some(page) = self.pages.get_mut(slot) {
                        *page = view;
                    }
                }

                Effect::NotifyComplete => {
                    if let Some(callback) = self.on_complete.as_mut() {
                        callback();
                    }
                }
            }
        }
    }

    fn render_pages(&mut self, id: LoadId, page_count: usize) {
        let LoadState::Loaded { handle } = &self.state.load else {
            return;
        };

        let sequence = PageSequence::with_options(page_count, self.render_options);
        self.pages = sequence
            .iter()
            .map(|request| PageView {
                request,
                content: PageContent::Pending,
            })
            .collect();
        for request in &sequence {
            self.service.render(id, handle.clone(), request);
        }
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.state.load
    }

    #[must_use]
    pub fn document(&self) -> Option<&DocumentRef> {
        self.state.reference.as_ref()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.state.page_count()
    }

    /// Pages of the current load still waiting for a worker
    #[must_use]
    pub fn pages_pending(&self) -> usize {
        self.state.pages_outstanding()
    }

    /// Page requests for the current document; empty unless loaded
    #[must_use]
    pub fn page_sequence(&self) -> PageSequence {
        PageSequence::with_options(self.state.page_count(), self.render_options)
    }

    /// One view per page, in page order; pending until its render lands
    #[must_use]
    pub fn pages(&self) -> &[PageView] {
        &self.pages
    }
}
