//! Viewer load state management

use log::{debug, warn};

use super::backend::{DocumentHandle, PageImage};
use super::request::{DocumentFault, DocumentRef, LoadId};
use super::sequence::PageRequest;

/// Where the viewer is in its load cycle
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No document, or nothing requested yet
    #[default]
    NotLoaded,
    /// Waiting for the resolver to answer `id`
    Loading { reference: DocumentRef, id: LoadId },
    /// Resolved; the page count is known
    Loaded { handle: DocumentHandle },
    /// The resolver rejected the current reference
    Failed {
        reference: DocumentRef,
        reason: String,
    },
}

impl LoadState {
    /// Page count of the current document, 0 unless loaded
    #[must_use]
    pub fn page_count(&self) -> usize {
        match self {
            Self::Loaded { handle } => handle.page_count,
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// What a page view displays
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageContent {
    /// Requested from the workers, not answered yet
    Pending,
    Rendered(PageImage),
    /// The renderer failed for this page; the view still occupies its slot
    Failed(String),
}

/// One page slot in the viewport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageView {
    pub request: PageRequest,
    pub content: PageContent,
}

/// Current state of the viewer for a (possibly absent) document
#[derive(Clone, Debug, Default)]
pub struct ViewerState {
    /// Document the caller asked for
    pub reference: Option<DocumentRef>,

    /// Progress of the current load
    pub load: LoadState,

    /// Most recently issued load generation
    last_id: LoadId,

    /// Page renders of the current load still in flight
    pages_outstanding: usize,
}

impl ViewerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.load.page_count()
    }

    #[must_use]
    pub fn last_id(&self) -> LoadId {
        self.last_id
    }

    #[must_use]
    pub fn pages_outstanding(&self) -> usize {
        self.pages_outstanding
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetDocument(reference) => {
                if self.reference == reference {
                    vec![]
                } else {
                    self.restart(reference)
                }
            }

            Command::Reload => {
                if self.reference.is_some() {
                    self.restart(self.reference.clone())
                } else {
                    vec![]
                }
            }

            Command::Resolved { id, handle } => match &self.load {
                LoadState::Loading { id: waiting, .. } if *waiting == id => {
                    let page_count = handle.page_count;
                    debug!("Load {id} resolved with {page_count} pages");
                    self.load = LoadState::Loaded { handle };
                    self.pages_outstanding = page_count;

                    let mut effects = vec![Effect::RenderPages { id, page_count }];
                    if page_count == 0 {
                        effects.push(Effect::NotifyComplete);
                    }
                    effects
                }
                _ => {
                    warn!("Discarding stale resolution of {} ({id})", handle.reference);
                    vec![]
                }
            },

            Command::Rejected { id, fault } => match &self.load {
                LoadState::Loading {
                    id: waiting,
                    reference,
                } if *waiting == id => {
                    debug!("Load {id} of {reference} failed: {fault}");
                    self.load = LoadState::Failed {
                        reference: reference.clone(),
                        reason: fault.to_string(),
                    };
                    vec![]
                }
                _ => {
                    debug!("Ignoring stale rejection {id}: {fault}");
                    vec![]
                }
            },

            Command::PageRendered { id, view } => {
                let current = matches!(self.load, LoadState::Loaded { .. })
                    && id == self.last_id
                    && self.pages_outstanding > 0;
                if !current {
                    debug!("Discarding stale render of page {} ({id})", view.request.index);
                    return vec![];
                }

                self.pages_outstanding -= 1;
                let mut effects = vec![Effect::StorePage(view)];
                if self.pages_outstanding == 0 {
                    debug!("Load {id} fully rendered");
                    effects.push(Effect::NotifyComplete);
                }
                effects
            }
        }
    }

    fn restart(&mut self, reference: Option<DocumentRef>) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(3);

        if self.load.is_loading() || self.pages_outstanding > 0 {
            effects.push(Effect::CancelLoad(self.last_id));
        }
        self.pages_outstanding = 0;
        effects.push(Effect::ClearPages);

        self.reference = reference.clone();
        match reference {
            Some(reference) => {
                let id = self.last_id.next();
                self.last_id = id;
                self.load = LoadState::Loading {
                    reference: reference.clone(),
                    id,
                };
                effects.push(Effect::StartLoad { id, reference });
            }
            None => self.load = LoadState::NotLoaded,
        }

        effects
    }
}

/// Commands that modify viewer state
#[derive(Clone, Debug)]
pub enum Command {
    /// Replace the document reference; `None` clears the viewer
    SetDocument(Option<DocumentRef>),
    /// Load the current reference again
    Reload,
    /// Resolver answered a load
    Resolved { id: LoadId, handle: DocumentHandle },
    /// Resolver rejected a load
    Rejected { id: LoadId, fault: DocumentFault },
    /// A worker answered one page render
    PageRendered { id: LoadId, view: PageView },
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Drop interest in a pending load
    CancelLoad(LoadId),
    /// Discard every page view
    ClearPages,
    /// Ask the resolver for a document
    StartLoad { id: LoadId, reference: DocumentRef },
    /// Expand the page sequence and queue one render per page
    RenderPages { id: LoadId, page_count: usize },
    /// Put a finished page into its slot
    StorePage(PageView),
    /// Invoke the completion callback
    NotifyComplete,
}
