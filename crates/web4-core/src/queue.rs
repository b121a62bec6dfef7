//! Offline pairing-request queue records.
//!
//! Requests are indexed per target into three sub-queues (standard,
//! priority, proxy), each ordered by (priority DESC, created_at ASC). The
//! index key inverts the priority byte so a forward prefix scan yields the
//! processing order directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{LctId, RequestId, Timestamp};

// ── Classification ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Standard,
    Proxy,
    Emergency,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Standard => "standard",
            RequestType::Proxy => "proxy",
            RequestType::Emergency => "emergency",
        }
    }

    /// Which sub-queue requests of this type are filed under.
    pub fn sub_queue(&self) -> SubQueue {
        match self {
            RequestType::Standard => SubQueue::Standard,
            RequestType::Emergency => SubQueue::Priority,
            RequestType::Proxy => SubQueue::Proxy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl Priority {
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Inverted byte for index keys: higher priority sorts first under an
    /// ascending scan.
    pub fn inverted(&self) -> u8 {
        255 - self.as_byte()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// The three per-target sub-queues, in processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubQueue {
    Priority = 0,
    Standard = 1,
    Proxy = 2,
}

impl SubQueue {
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Queued,
    Processing,
    Completed { completed_at: Timestamp },
    Failed { failed_at: Timestamp, reason: String },
    Expired { expired_at: Timestamp },
    Cancelled { cancelled_at: Timestamp, reason: String },
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Queued => "queued",
            RequestStatus::Processing => "processing",
            RequestStatus::Completed { .. } => "completed",
            RequestStatus::Failed { .. } => "failed",
            RequestStatus::Expired { .. } => "expired",
            RequestStatus::Cancelled { .. } => "cancelled",
        }
    }
}

/// A pairing request parked for an offline target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRequest {
    pub request_id: RequestId,
    pub initiator: LctId,
    pub target: LctId,
    pub request_type: RequestType,
    pub priority: Priority,
    pub status: RequestStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub retry_count: u32,
    /// Earliest block time the processor may attempt this request again.
    /// Zero means immediately eligible.
    pub next_attempt_at: Timestamp,
    pub proxy_component: Option<LctId>,
    pub metadata: BTreeMap<String, String>,
}

impl PairingRequest {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// The component the pairing is actually initiated against: the proxy
    /// for proxy-type requests, otherwise the target itself.
    pub fn pairing_counterparty(&self) -> &LctId {
        match (&self.request_type, &self.proxy_component) {
            (RequestType::Proxy, Some(proxy)) => proxy,
            _ => &self.target,
        }
    }

    /// The index key this request occupies while queued.
    pub fn index_key(&self) -> Vec<u8> {
        index_key(
            &self.target,
            self.request_type.sub_queue(),
            self.priority,
            self.created_at,
            &self.request_id,
        )
    }
}

/// Composite sub-queue index key:
/// target ‖ 0xff ‖ sub_queue ‖ inverted_priority ‖ created_at_be ‖ request_id.
/// The 0xff separator keeps distinct target ids from sharing prefixes.
pub fn index_key(
    target: &LctId,
    sub_queue: SubQueue,
    priority: Priority,
    created_at: Timestamp,
    request_id: &RequestId,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(target.as_bytes().len() + 14 + request_id.as_bytes().len());
    key.extend_from_slice(target.as_bytes());
    key.push(0xff);
    key.push(sub_queue.as_byte());
    key.push(priority.inverted());
    key.extend_from_slice(&created_at.to_be_bytes());
    key.extend_from_slice(request_id.as_bytes());
    key
}

/// Prefix selecting one sub-queue of one target.
pub fn index_prefix(target: &LctId, sub_queue: SubQueue) -> Vec<u8> {
    let mut key = Vec::with_capacity(target.as_bytes().len() + 2);
    key.extend_from_slice(target.as_bytes());
    key.push(0xff);
    key.push(sub_queue.as_byte());
    key
}

// ── Offline bookkeeping ───────────────────────────────────────────────────────

/// Per-target record of pending offline work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineOperation {
    pub component: LctId,
    pub pending_requests: Vec<RequestId>,
    pub operation_count: u64,
    pub last_seen: Timestamp,
    pub accepts_proxy: bool,
}

impl OfflineOperation {
    pub fn new(component: LctId, now: Timestamp) -> Self {
        Self {
            component,
            pending_requests: Vec::new(),
            operation_count: 0,
            last_seen: now,
            accepts_proxy: true,
        }
    }
}

/// Per-component queue summary (query result; derived from the index).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub component: LctId,
    pub standard_count: u64,
    pub priority_count: u64,
    pub proxy_count: u64,
    pub oldest_pending: Option<Timestamp>,
    pub last_processed: Option<Timestamp>,
}
