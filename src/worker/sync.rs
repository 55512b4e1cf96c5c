//! Latest-request-wins application of worker responses.

use tracing::{debug, warn};

use super::WorkerResponse;
use crate::types::TopologyResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Became the current result
    Applied,
    /// Superseded by a newer request; discarded
    Stale,
    /// Latest request, but it failed; the previous result is kept
    Rejected,
}

/// Holds the last applied result and the newest issued request id.
#[derive(Debug, Default)]
pub struct ResultSynchronizer {
    latest_issued: u64,
    current: Option<TopologyResult>,
    last_error: Option<String>,
}

impl ResultSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a request went out. Ids below the newest are ignored.
    pub fn note_issued(&mut self, request_id: u64) {
        self.latest_issued = self.latest_issued.max(request_id);
    }

    pub fn latest_issued(&self) -> u64 {
        self.latest_issued
    }

    pub fn apply(&mut self, response: WorkerResponse) -> SyncOutcome {
        let request_id = response.request_id;
        if request_id != self.latest_issued {
            debug!(
                request_id,
                latest = self.latest_issued,
                "Discarding stale topology response"
            );
            return SyncOutcome::Stale;
        }

        match response.into_result() {
            Ok(result) => {
                self.current = Some(result);
                self.last_error = None;
                SyncOutcome::Applied
            }
            Err(e) => {
                warn!(request_id, error = %e, "Topology build rejected");
                self.last_error = Some(e.to_string());
                SyncOutcome::Rejected
            }
        }
    }

    /// Last successfully applied result.
    pub fn current(&self) -> Option<&TopologyResult> {
        self.current.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopologyConfig;
    use crate::topology::{BuildRequest, build_topology_model};
    use crate::types::WellSnapshot;

    fn ok(request_id: u64) -> WorkerResponse {
        let result = build_topology_model(
            &WellSnapshot::default(),
            &BuildRequest::new(request_id, "W"),
            &TopologyConfig::default(),
        )
        .unwrap();
        WorkerResponse::success(request_id, result)
    }

    #[test]
    fn only_latest_response_applies() {
        let mut sync = ResultSynchronizer::new();
        sync.note_issued(1);
        sync.note_issued(2);

        assert_eq!(sync.apply(ok(1)), SyncOutcome::Stale);
        assert!(sync.current().is_none());
        assert_eq!(sync.apply(ok(2)), SyncOutcome::Applied);
        assert_eq!(sync.current().map(|r| r.request_id), Some(2));
    }

    #[test]
    fn failure_keeps_last_good_result() {
        let mut sync = ResultSynchronizer::new();
        sync.note_issued(1);
        assert_eq!(sync.apply(ok(1)), SyncOutcome::Applied);

        sync.note_issued(2);
        let outcome = sync.apply(WorkerResponse::failure(2, "boom"));
        assert_eq!(outcome, SyncOutcome::Rejected);
        assert_eq!(sync.current().map(|r| r.request_id), Some(1));
        assert!(sync.last_error().is_some_and(|e| e.contains("boom")));
    }

    #[test]
    fn issued_ids_never_go_backwards() {
        let mut sync = ResultSynchronizer::new();
        sync.note_issued(5);
        sync.note_issued(3);
        assert_eq!(sync.latest_issued(), 5);
        assert_eq!(sync.apply(ok(3)), SyncOutcome::Stale);
    }
}
