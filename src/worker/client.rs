//! Worker actor and the client handle that talks to it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::{
    BuildPayload, WorkerError, WorkerRequest, WorkerResponse, WorkerTask, handle_request,
};
use crate::config::TopologyConfig;
use crate::types::{TopologyResult, WellSnapshot};

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<WorkerResponse>>>>;

// ============================================================================
// Worker
// ============================================================================

/// Runs builds one at a time on the blocking pool, in arrival order.
pub struct TopologyWorker {
    config: Arc<TopologyConfig>,
    rx: mpsc::Receiver<WorkerRequest>,
    tx: mpsc::Sender<WorkerResponse>,
}

impl TopologyWorker {
    pub fn new(
        config: TopologyConfig,
        rx: mpsc::Receiver<WorkerRequest>,
        tx: mpsc::Sender<WorkerResponse>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            rx,
            tx,
        }
    }

    pub async fn run(mut self) {
        info!("TopologyWorker starting");

        while let Some(request) = self.rx.recv().await {
            let request_id = request.request_id;
            let config = Arc::clone(&self.config);
            let response = match tokio::task::spawn_blocking(move || handle_request(request, &config))
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(request_id, error = %e, "Build task panicked");
                    WorkerResponse::failure(request_id, format!("build task failed: {e}"))
                }
            };
            debug!(request_id, status = ?response.status, "Build finished");

            if self.tx.send(response).await.is_err() {
                break;
            }
        }

        info!("TopologyWorker stopped");
    }
}

// ============================================================================
// Client
// ============================================================================

/// A submitted build awaiting its response.
#[derive(Debug)]
pub struct PendingBuild {
    pub request_id: u64,
    rx: oneshot::Receiver<WorkerResponse>,
}

impl PendingBuild {
    pub async fn response(self) -> Result<WorkerResponse, WorkerError> {
        let request_id = self.request_id;
        self.rx
            .await
            .map_err(|_| WorkerError::ResponseDropped(request_id))
    }
}

/// Owns the request id sequence and the in-flight map for one worker.
pub struct WorkerClient {
    next_request_id: AtomicU64,
    tx: mpsc::Sender<WorkerRequest>,
    pending: PendingMap,
}

impl WorkerClient {
    /// Spawn a worker and its response router on the current runtime.
    pub fn spawn(config: TopologyConfig) -> Self {
        let capacity = config.worker.channel_capacity;
        let (request_tx, request_rx) = mpsc::channel(capacity);
        let (response_tx, response_rx) = mpsc::channel(capacity);

        tokio::spawn(TopologyWorker::new(config, request_rx, response_tx).run());

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(route_responses(response_rx, Arc::clone(&pending)));

        Self::from_parts(request_tx, pending)
    }

    fn from_parts(tx: mpsc::Sender<WorkerRequest>, pending: PendingMap) -> Self {
        Self {
            next_request_id: AtomicU64::new(1),
            tx,
            pending,
        }
    }

    /// Queue a build. The snapshot is copied into the request. Ids start at 1
    /// and strictly increase.
    pub async fn submit(
        &self,
        snapshot: &WellSnapshot,
        well_id: &str,
    ) -> Result<PendingBuild, WorkerError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let (response_tx, rx) = oneshot::channel();
        // Registered before the send so a fast worker cannot answer an id
        // the router does not know yet
        self.lock_pending().insert(request_id, response_tx);
        let guard = PendingEntry {
            pending: &self.pending,
            request_id,
            armed: true,
        };

        let request = WorkerRequest {
            request_id,
            task: WorkerTask::BuildTopologyModel,
            payload: BuildPayload {
                state_snapshot: snapshot.clone(),
                well_id: well_id.to_string(),
            },
        };
        if self.tx.send(request).await.is_err() {
            return Err(WorkerError::WorkerStopped);
        }
        guard.disarm();
        debug!(request_id, well_id, "Build submitted");

        Ok(PendingBuild { request_id, rx })
    }

    /// Submit and wait for one build.
    pub async fn build(&self, snapshot: &WellSnapshot, well_id: &str) -> Result<TopologyResult> {
        let pending = self
            .submit(snapshot, well_id)
            .await
            .context("Failed to submit topology build")?;
        let response = pending
            .response()
            .await
            .context("Topology worker response channel closed")?;
        response.into_result().context("Topology build failed")
    }

    /// The id the next `submit` will use.
    pub fn peek_next_request_id(&self) -> u64 {
        self.next_request_id.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<WorkerResponse>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Removes a pending entry unless the request reached the worker, so a
/// failed or cancelled `submit` leaves nothing in flight.
struct PendingEntry<'a> {
    pending: &'a PendingMap,
    request_id: u64,
    armed: bool,
}

impl PendingEntry<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&self.request_id);
        }
    }
}

async fn route_responses(mut rx: mpsc::Receiver<WorkerResponse>, pending: PendingMap) {
    while let Some(response) = rx.recv().await {
        let request_id = response.request_id;
        let waiter = pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&request_id);
        match waiter {
            Some(tx) => {
                // Receiver may have been dropped; that caller no longer cares
                let _ = tx.send(response);
            }
            None => warn!(request_id, "Response for unknown request dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::ResponseStatus;

    #[tokio::test]
    async fn ids_are_strictly_increasing() {
        let client = WorkerClient::spawn(TopologyConfig::default());
        let a = client.submit(&WellSnapshot::default(), "W").await.unwrap();
        let b = client.submit(&WellSnapshot::default(), "W").await.unwrap();
        assert_eq!(a.request_id, 1);
        assert_eq!(b.request_id, 2);
        assert_eq!(client.peek_next_request_id(), 3);

        let ra = a.response().await.unwrap();
        let rb = b.response().await.unwrap();
        assert_eq!(ra.request_id, 1);
        assert_eq!(rb.request_id, 2);
        assert_eq!(rb.status, ResponseStatus::Success);
        assert_eq!(client.in_flight(), 0);
    }

    #[tokio::test]
    async fn build_returns_result_for_well() {
        let client = WorkerClient::spawn(TopologyConfig::default());
        let result = client.build(&WellSnapshot::default(), "W-9").await.unwrap();
        assert_eq!(result.well_id, "W-9");
        assert_eq!(result.request_id, 1);
    }

    #[test]
    fn cancelled_submit_leaves_nothing_in_flight() {
        // Nobody drains the queue, so the second send waits for capacity
        let (tx, _rx) = mpsc::channel(1);
        let client = WorkerClient::from_parts(tx, Arc::new(Mutex::new(HashMap::new())));
        let snapshot = WellSnapshot::default();

        let mut first = tokio_test::task::spawn(client.submit(&snapshot, "W"));
        assert!(first.poll().is_ready());
        assert_eq!(client.in_flight(), 1);

        let mut second = tokio_test::task::spawn(client.submit(&snapshot, "W"));
        assert!(second.poll().is_pending());
        assert_eq!(client.in_flight(), 2);
        drop(second);

        assert_eq!(client.in_flight(), 1);
        assert_eq!(client.peek_next_request_id(), 3);
    }

    #[test]
    fn submit_to_stopped_worker_is_not_left_pending() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let client = WorkerClient::from_parts(tx, Arc::new(Mutex::new(HashMap::new())));
        let err = tokio_test::block_on(client.submit(&WellSnapshot::default(), "W")).unwrap_err();
        assert!(matches!(err, WorkerError::WorkerStopped));
        assert_eq!(client.in_flight(), 0);
    }

    #[test]
    fn blocking_caller_can_drive_a_build() {
        let result = tokio_test::block_on(async {
            let client = WorkerClient::spawn(TopologyConfig::default());
            client.build(&WellSnapshot::default(), "W-1").await
        })
        .unwrap();
        assert!(result.nodes.iter().all(|n| n.depth_top.is_none()));
    }
}
