//! Viewer worker - runs in separate thread(s)

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::{debug, info};

use super::backend::{DocumentResolver, PageRenderer};
use super::request::{LoadId, WorkerRequest, WorkerResponse};

/// Shared set of loads nobody is waiting for any more
pub type CancelledLoads = Arc<Mutex<HashSet<LoadId>>>;

fn is_cancelled(cancelled: &CancelledLoads, id: LoadId) -> bool {
    cancelled
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .contains(&id)
}

pub fn viewer_worker(
    resolver: Arc<dyn DocumentResolver>,
    renderer: Box<dyn PageRenderer>,
    requests: Receiver<WorkerRequest>,
    responses: Sender<WorkerResponse>,
    cancelled: CancelledLoads,
) {
    for request in requests {
        let response = match request {
            WorkerRequest::Resolve { id, reference } => {
                if is_cancelled(&cancelled, id) {
                    debug!("Skipping cancelled load {id} of {reference}");
                    WorkerResponse::Cancelled(id)
                } else {
                    info!("Resolving {reference} ({id})");
                    match resolver.resolve(&reference) {
                        Ok(handle) => WorkerResponse::Resolved { id, handle },
                        Err(fault) => WorkerResponse::Rejected { id, fault },
                    }
                }
            }

            WorkerRequest::Render {
                id,
                document,
                request,
            } => {
                if is_cancelled(&cancelled, id) {
                    WorkerResponse::Cancelled(id)
                } else {
                    WorkerResponse::Rendered {
                        id,
                        request,
                        result: renderer.render_page(&document, &request),
                    }
                }
            }

            WorkerRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            break;
        }
    }
}
