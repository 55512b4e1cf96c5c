//! Off-thread topology builds.
//!
//! The editing side owns a [`WorkerClient`]; builds run on a
//! [`TopologyWorker`] actor and come back as [`WorkerResponse`] envelopes.
//! [`ResultSynchronizer`] decides which responses are applied: only the one
//! carrying the most recently issued request id. Older in-flight builds are
//! never cancelled, their responses are simply dropped as stale.
//!
//! Envelopes serialize to the JSON shape a browser worker would post:
//!
//! ```json
//! {"requestId": 3, "task": "build-topology-model",
//!  "payload": {"stateSnapshot": {...}, "wellId": "W-1"}}
//! ```

mod client;
pub mod sync;

pub use client::{PendingBuild, TopologyWorker, WorkerClient};
pub use sync::{ResultSynchronizer, SyncOutcome};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TopologyConfig;
use crate::topology::{BuildRequest, build_topology_model};
use crate::types::{TopologyResult, WellSnapshot};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("topology worker is not running")]
    WorkerStopped,

    #[error("response for request {0} was never delivered")]
    ResponseDropped(u64),

    #[error("build {request_id} failed: {message}")]
    BuildFailed { request_id: u64, message: String },

    #[error("response for request {0} reported success without a result")]
    MissingResult(u64),
}

// ============================================================================
// Envelopes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerTask {
    BuildTopologyModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPayload {
    /// Owned copy; later edits on the client never reach an in-flight build
    pub state_snapshot: WellSnapshot,
    pub well_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub request_id: u64,
    pub task: WorkerTask,
    pub payload: BuildPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponse {
    pub request_id: u64,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TopologyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl WorkerResponse {
    pub fn success(request_id: u64, result: TopologyResult) -> Self {
        Self {
            request_id,
            status: ResponseStatus::Success,
            result: Some(result),
            error: None,
            completed_at: Utc::now(),
        }
    }

    pub fn failure(request_id: u64, message: impl Into<String>) -> Self {
        Self {
            request_id,
            status: ResponseStatus::Error,
            result: None,
            error: Some(message.into()),
            completed_at: Utc::now(),
        }
    }

    pub fn into_result(self) -> Result<TopologyResult, WorkerError> {
        match (self.status, self.result) {
            (ResponseStatus::Success, Some(result)) => Ok(result),
            (ResponseStatus::Success, None) => Err(WorkerError::MissingResult(self.request_id)),
            (ResponseStatus::Error, _) => Err(WorkerError::BuildFailed {
                request_id: self.request_id,
                message: self.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }
}

/// Run one request to completion. Build errors become error responses, so
/// the caller always gets an envelope back.
pub fn handle_request(request: WorkerRequest, config: &TopologyConfig) -> WorkerResponse {
    let WorkerRequest {
        request_id,
        task,
        payload,
    } = request;
    match task {
        WorkerTask::BuildTopologyModel => {
            let build = BuildRequest::new(request_id, payload.well_id);
            match build_topology_model(&payload.state_snapshot, &build, config) {
                Ok(result) => WorkerResponse::success(request_id, result),
                Err(e) => WorkerResponse::failure(request_id, e.to_string()),
            }
        }
    }
}
