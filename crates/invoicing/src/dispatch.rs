//! Outbound message seams: the dispatcher and the tracking cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One templated message to one phone number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRequest {
    /// International form without `+`, e.g. "84901111111".
    pub phone: String,
    pub template_id: String,
    pub fields: Map<String, Value>,
    pub tracking_id: Option<String>,
}

/// What the messaging provider said about one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub success: bool,
    pub message: String,
}

impl DispatchOutcome {
    pub fn sent(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Transport-level failure: the provider could not be asked at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DispatchError(pub String);

/// Sends templated messages. No retries are expected from implementations.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    /// Send one message.
    ///
    /// A provider rejection is an `Ok` outcome with `success == false`;
    /// `Err` is reserved for transport failures.
    async fn send(&self, request: &DispatchRequest) -> Result<DispatchOutcome, DispatchError>;
}

/// Short-lived key/value store read by the delivery-status callback.
pub trait TrackingCache: Send + Sync {
    /// Store `value` under `key` for `ttl`. Never fails from the caller's view.
    fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration);
}

struct TrackedValue {
    value: String,
    expires_at: Instant,
}

/// Process-local [`TrackingCache`] with expiry checked on read.
#[derive(Clone, Default)]
pub struct MemoryTrackingCache {
    entries: Arc<DashMap<String, TrackedValue>>,
}

impl MemoryTrackingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`, unless it has expired.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if Instant::now() <= entry.expires_at {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at >= now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TrackingCache for MemoryTrackingCache {
    fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            TrackedValue {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Tracking entry stored");
    }
}

impl std::fmt::Debug for MemoryTrackingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTrackingCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
