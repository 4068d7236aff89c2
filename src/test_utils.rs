//! Fakes for the external document capabilities

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use flume::{Receiver, Sender};

use crate::viewer::{
    CompletionCallback, DocumentFault, DocumentHandle, DocumentRef, DocumentResolver, PageImage,
    PageRenderer, PageRequest,
};

/// Answers immediately from a fixed table; unknown references are not found
#[derive(Default)]
pub struct StaticResolver {
    documents: HashMap<String, Result<usize, DocumentFault>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, reference: &str, page_count: usize) -> Self {
        self.documents.insert(reference.to_string(), Ok(page_count));
        self
    }

    pub fn with_failure(mut self, reference: &str, fault: DocumentFault) -> Self {
        self.documents.insert(reference.to_string(), Err(fault));
        self
    }
}

impl DocumentResolver for StaticResolver {
    fn resolve(&self, reference: &DocumentRef) -> Result<DocumentHandle, DocumentFault> {
        match self.documents.get(reference.as_str()) {
            Some(Ok(pages)) => Ok(DocumentHandle::new(reference.clone(), *pages)),
            Some(Err(fault)) => Err(fault.clone()),
            None => Err(DocumentFault::NotFound(reference.to_string())),
        }
    }
}

/// Blocks each resolution until the test releases it through its gate
#[derive(Default)]
pub struct GatedResolver {
    gates: Mutex<HashMap<String, Receiver<Result<usize, DocumentFault>>>>,
}

impl GatedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sending on the returned channel completes the resolution of `reference`
    pub fn gate(&self, reference: &str) -> Sender<Result<usize, DocumentFault>> {
        let (tx, rx) = flume::bounded(1);
        self.gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(reference.to_string(), rx);
        tx
    }
}

impl DocumentResolver for GatedResolver {
    fn resolve(&self, reference: &DocumentRef) -> Result<DocumentHandle, DocumentFault> {
        let gate = self
            .gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| DocumentFault::NotFound(reference.to_string()))?;

        let pages = gate
            .recv()
            .map_err(|_| DocumentFault::generic("gate dropped"))??;
        Ok(DocumentHandle::new(reference.clone(), pages))
    }
}

/// Something observable that happened during a test
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Observed {
    Rendered {
        reference: DocumentRef,
        request: PageRequest,
    },
    Completed,
}

/// Ordered record of renders and completion callbacks, shared between the
/// worker threads and the test
#[derive(Clone, Default)]
pub struct Timeline(Arc<Mutex<Vec<Observed>>>);

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Observed>> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn push(&self, entry: Observed) {
        self.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<Observed> {
        self.lock().clone()
    }

    pub fn completions(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, Observed::Completed))
            .count()
    }

    pub fn renders(&self) -> Vec<(DocumentRef, PageRequest)> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Observed::Rendered { reference, request } => Some((reference.clone(), *request)),
                Observed::Completed => None,
            })
            .collect()
    }

    /// Completion callback that records into this timeline
    pub fn completion_callback(&self) -> CompletionCallback {
        let timeline = self.clone();
        Box::new(move || timeline.push(Observed::Completed))
    }
}

/// Renders 1×1 pages and records every request
#[derive(Clone)]
pub struct RecordingRenderer {
    timeline: Timeline,
    failing_pages: HashSet<usize>,
    delay: Duration,
}

impl RecordingRenderer {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            failing_pages: HashSet::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn failing_on(mut self, page: usize) -> Self {
        self.failing_pages.insert(page);
        self
    }

    /// Sleep this long before answering each page
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Factory handing every worker its own copy of this renderer
    pub fn per_worker(self) -> impl Fn() -> RecordingRenderer + Send + Sync + 'static {
        move || self.clone()
    }
}

impl PageRenderer for RecordingRenderer {
    fn render_page(
        &self,
        document: &DocumentHandle,
        request: &PageRequest,
    ) -> Result<PageImage, DocumentFault> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.timeline.push(Observed::Rendered {
            reference: document.reference.clone(),
            request: *request,
        });

        if self.failing_pages.contains(&request.index.get()) {
            return Err(DocumentFault::Engine(format!(
                "cannot draw page {}",
                request.index
            )));
        }

        Ok(PageImage {
            width_px: 1,
            height_px: 1,
            text: request
                .options
                .text_layer
                .then(|| format!("text of page {}", request.index)),
        })
    }
}
