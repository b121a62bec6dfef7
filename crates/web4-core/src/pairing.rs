//! Pairing protocol records: bidirectional challenge/response sessions and
//! the active-pairing registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{LctId, PairingId, SessionId, Timestamp};

// ── Session ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Pending,
    Completed { completed_at: Timestamp },
    Expired { expired_at: Timestamp },
    Failed { failed_at: Timestamp, reason: String },
}

/// One side's challenge within a session. The response is an Ed25519
/// signature over `challenge` by the holder's signing key;
/// `expected_response_hash` commits to the challenge for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingChallenge {
    pub holder: LctId,
    pub challenge: Vec<u8>,
    pub expected_response_hash: [u8; 32],
    pub verified: bool,
}

/// A pending or finished pairing handshake. Both participants must verify
/// their challenge before the session completes; expired sessions never
/// produce active pairings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingSession {
    pub session_id: SessionId,
    pub initiator: LctId,
    pub target: LctId,
    pub status: SessionStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub metadata: BTreeMap<String, String>,
    pub initiator_challenge: PairingChallenge,
    pub target_challenge: PairingChallenge,
}

impl PairingSession {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// The challenge belonging to `lct`, if it is a participant.
    pub fn challenge_for(&self, lct: &LctId) -> Option<&PairingChallenge> {
        if *lct == self.initiator {
            Some(&self.initiator_challenge)
        } else if *lct == self.target {
            Some(&self.target_challenge)
        } else {
            None
        }
    }

    pub fn challenge_for_mut(&mut self, lct: &LctId) -> Option<&mut PairingChallenge> {
        if *lct == self.initiator {
            Some(&mut self.initiator_challenge)
        } else if *lct == self.target {
            Some(&mut self.target_challenge)
        } else {
            None
        }
    }

    pub fn both_verified(&self) -> bool {
        self.initiator_challenge.verified && self.target_challenge.verified
    }
}

// ── Active pairing ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingStatus {
    Active,
    Revoked {
        revoked_at: Timestamp,
        revoked_by: LctId,
        reason: String,
    },
}

/// An established bidirectional relationship. The component pair is stored
/// in lexicographic order so the unordered key is canonical.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePairing {
    pub pairing_id: PairingId,
    pub component_a: LctId,
    pub component_b: LctId,
    pub session_id: SessionId,
    pub established_at: Timestamp,
    pub status: PairingStatus,
}

impl ActivePairing {
    /// Canonical (a, b) ordering for an unordered component pair.
    pub fn canonical_pair(x: &LctId, y: &LctId) -> (LctId, LctId) {
        if x.as_str() <= y.as_str() {
            (x.clone(), y.clone())
        } else {
            (y.clone(), x.clone())
        }
    }

    pub fn involves(&self, lct: &LctId) -> bool {
        self.component_a == *lct || self.component_b == *lct
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, PairingStatus::Active)
    }
}
