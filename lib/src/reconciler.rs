// Copyright (c) 2022-2023 The MobileCoin Foundation

//! External event reconciler
//!
//! Routes out-of-band [PushPayload]s to the controller currently open for
//! the payload's operation, matching both the operation and session ids.
//! Controllers register an inbound queue on attach and are deregistered
//! when the returned [Registration] is dropped.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

use log::{debug, trace};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use stepup_proto::{OperationId, ProtoError, PushPayload, SessionId};

type Routes = Mutex<HashMap<OperationId, Route>>;

/// Inbound queue for a registered controller
struct Route {
    id: u64,
    /// Currently open session for the controller
    session: watch::Receiver<Option<SessionId>>,
    tx: mpsc::UnboundedSender<PushPayload>,
}

/// Router for externally delivered confirmation codes
#[derive(Clone, Default)]
pub struct Reconciler {
    routes: Arc<Routes>,
    next_id: Arc<AtomicU64>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a payload to the matching open controller.
    ///
    /// Returns false (dropping the payload) when no controller is open for
    /// the exact operation and session.
    pub fn route(&self, payload: PushPayload) -> bool {
        let routes = self.routes.lock();

        let route = match routes.get(payload.operation_id()) {
            Some(r) => r,
            None => {
                trace!("no route for operation {}", payload.operation_id());
                return false;
            }
        };

        if route.session.borrow().as_ref() != Some(payload.session_id()) {
            trace!(
                "session mismatch for operation {} (payload: {})",
                payload.operation_id(),
                payload.session_id()
            );
            return false;
        }

        debug!(
            "routing {} payload for operation {}",
            payload.kind(),
            payload.operation_id()
        );

        route.tx.send(payload).is_ok()
    }

    /// Strictly decode and route a JSON payload
    pub fn route_json(&self, buff: &[u8]) -> Result<bool, ProtoError> {
        let p = PushPayload::decode(buff)?;
        Ok(self.route(p))
    }

    /// Check whether a controller is registered for the provided operation
    pub fn is_registered(&self, operation_id: &OperationId) -> bool {
        self.routes.lock().contains_key(operation_id)
    }

    /// Register an inbound queue for an operation, replacing any existing route
    pub(crate) fn register(
        &self,
        operation_id: OperationId,
        session: watch::Receiver<Option<SessionId>>,
    ) -> (Registration, mpsc::UnboundedReceiver<PushPayload>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();

        debug!("registering route {} for operation {}", id, operation_id);

        self.routes
            .lock()
            .insert(operation_id.clone(), Route { id, session, tx });

        let r = Registration {
            id,
            operation_id,
            routes: Arc::downgrade(&self.routes),
        };

        (r, rx)
    }
}

/// Reconciler registration, deregistering on drop
pub struct Registration {
    id: u64,
    operation_id: OperationId,
    routes: Weak<Routes>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let routes = match self.routes.upgrade() {
            Some(r) => r,
            None => return,
        };

        let mut routes = routes.lock();

        // Only remove our own route, a newer flow may have replaced it
        if routes.get(&self.operation_id).map(|r| r.id) == Some(self.id) {
            debug!("deregistering route {} for {}", self.id, self.operation_id);
            routes.remove(&self.operation_id);
        }
    }
}
