//! Worker lifecycle hosting
//!
//! The host owns the worker's lifecycle state and decides whether a
//! request is routed through the worker or straight to the network:
//!
//! | State | `fetch` |
//! |-------|---------|
//! | Installing | network |
//! | Activated | worker |
//! | Failed | network |

use crate::error::PrecacheResult;
use crate::http::Request;
use crate::worker::{FetchSource, Served, ServiceWorker};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    Activated,
    Failed,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Installing => "installing",
            Self::Activated => "activated",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Runs a worker's install once and dispatches fetches by lifecycle state
pub struct WorkerHost {
    worker: ServiceWorker,
    state: RwLock<WorkerState>,
    install_lock: Mutex<()>,
}

impl WorkerHost {
    /// Host a worker that has not been installed yet
    pub fn new(worker: ServiceWorker) -> Self {
        Self {
            worker,
            state: RwLock::new(WorkerState::Installing),
            install_lock: Mutex::new(()),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// The hosted worker
    pub fn worker(&self) -> &ServiceWorker {
        &self.worker
    }

    /// Run the install handler and activate the worker on success.
    ///
    /// A no-op once activated. After a failure the next call retries.
    pub async fn install(&self) -> PrecacheResult<()> {
        let _guard = self.install_lock.lock().await;

        if self.state().await == WorkerState::Activated {
            debug!("Worker already activated");
            return Ok(());
        }

        *self.state.write().await = WorkerState::Installing;

        match self.worker.on_install().await {
            Ok(()) => {
                *self.state.write().await = WorkerState::Activated;
                debug!("Worker activated for {}", self.worker.origin());
                Ok(())
            }
            Err(e) => {
                *self.state.write().await = WorkerState::Failed;
                debug!("Worker install failed: {}", e);
                Err(e)
            }
        }
    }

    /// Route a request through the worker if activated, else to the network
    pub async fn fetch(&self, request: &Request) -> PrecacheResult<Served> {
        let state = self.state().await;
        if state == WorkerState::Activated {
            return self.worker.respond(request).await;
        }

        debug!("Worker {}, bypassing: {} {}", state, request.method, request.url);
        let response = self.worker.network().fetch(request).await?;
        Ok(Served {
            source: FetchSource::Network,
            response,
        })
    }
}
