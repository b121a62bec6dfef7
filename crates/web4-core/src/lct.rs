//! Linked Context Token (LCT): the on-chain identity record and its
//! Markov Relevancy Horizon (MRH) edge sets.
//!
//! The four MRH sets are pairwise disjoint at all times; `bound_entity` is
//! set exactly once; LCTs are never deleted, only revoked.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{
    Amount, Ed25519PublicKey, Ed25519Signature, LctId, Nonce, SocietyId, Timestamp,
    X25519PublicKey,
};

// ── EntityType ────────────────────────────────────────────────────────────────

/// What kind of entity an LCT represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Human,
    Ai,
    Role,
    Society,
    Device,
    Service,
    Dictionary,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Human => "human",
            EntityType::Ai => "ai",
            EntityType::Role => "role",
            EntityType::Society => "society",
            EntityType::Device => "device",
            EntityType::Service => "service",
            EntityType::Dictionary => "dictionary",
        }
    }
}

// ── Status ────────────────────────────────────────────────────────────────────

/// LCT lifecycle status. Anything other than `Active` bars the LCT from
/// initiating new pairings, queue requests, discharges, or witness
/// attestations; historical edges are preserved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LctStatus {
    Active,
    Suspended { suspended_at: Timestamp },
    Revoked { revoked_at: Timestamp, reason: String },
    Expired { expired_at: Timestamp },
}

impl LctStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, LctStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LctStatus::Active => "active",
            LctStatus::Suspended { .. } => "suspended",
            LctStatus::Revoked { .. } => "revoked",
            LctStatus::Expired { .. } => "expired",
        }
    }
}

// ── MRH ───────────────────────────────────────────────────────────────────────

/// Which of the four MRH edge sets an update targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MrhSet {
    Bound,
    Paired,
    Witnessing,
    Broadcast,
}

impl MrhSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            MrhSet::Bound => "bound",
            MrhSet::Paired => "paired",
            MrhSet::Witnessing => "witnessing",
            MrhSet::Broadcast => "broadcast",
        }
    }
}

/// Markov Relevancy Horizon: the per-LCT relationship graph, four pairwise
/// disjoint sets of LCT ids. Stored separately from the LCT record so that
/// edge churn does not rewrite identity state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mrh {
    pub lct_id: LctId,
    pub bound: BTreeSet<LctId>,
    pub paired: BTreeSet<LctId>,
    pub witnessing: BTreeSet<LctId>,
    pub broadcast: BTreeSet<LctId>,
}

impl Mrh {
    pub fn new(lct_id: LctId) -> Self {
        Self {
            lct_id,
            ..Default::default()
        }
    }

    pub fn set(&self, set: MrhSet) -> &BTreeSet<LctId> {
        match set {
            MrhSet::Bound => &self.bound,
            MrhSet::Paired => &self.paired,
            MrhSet::Witnessing => &self.witnessing,
            MrhSet::Broadcast => &self.broadcast,
        }
    }

    pub fn set_mut(&mut self, set: MrhSet) -> &mut BTreeSet<LctId> {
        match set {
            MrhSet::Bound => &mut self.bound,
            MrhSet::Paired => &mut self.paired,
            MrhSet::Witnessing => &mut self.witnessing,
            MrhSet::Broadcast => &mut self.broadcast,
        }
    }

    /// True if `id` appears in any set other than `except`.
    pub fn appears_outside(&self, id: &LctId, except: MrhSet) -> bool {
        [MrhSet::Bound, MrhSet::Paired, MrhSet::Witnessing, MrhSet::Broadcast]
            .into_iter()
            .filter(|s| *s != except)
            .any(|s| self.set(s).contains(id))
    }

    /// Invariant check: the four sets share no member.
    pub fn sets_disjoint(&self) -> bool {
        let total =
            self.bound.len() + self.paired.len() + self.witnessing.len() + self.broadcast.len();
        let mut union = BTreeSet::new();
        union.extend(self.bound.iter());
        union.extend(self.paired.iter());
        union.extend(self.witnessing.iter());
        union.extend(self.broadcast.iter());
        union.len() == total
    }
}

// ── Birth certificate ─────────────────────────────────────────────────────────

/// A witness endorsement on a birth certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthWitness {
    pub witness: LctId,
    pub signature: Ed25519Signature,
}

/// Issued when a society admits a newly minted LCT as a citizen-to-be.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthCertificate {
    pub society: SocietyId,
    pub rights: Vec<String>,
    pub responsibilities: Vec<String>,
    pub issued_at: Timestamp,
    pub initial_atp: Amount,
    pub witnesses: Vec<BirthWitness>,
}

// ── LCT record ────────────────────────────────────────────────────────────────

/// Full on-chain LCT state as stored in the state DB. Embedded trust views
/// are deliberately absent: the Trust module owns tensor state and the query
/// layer resolves it on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lct {
    pub id: LctId,
    pub entity_type: EntityType,
    pub signing_key: Ed25519PublicKey,
    pub agreement_key: X25519PublicKey,
    pub binding_signature: Ed25519Signature,
    /// The LCT that minted this one. Controls it alongside the LCT itself.
    pub created_by: LctId,
    /// Opaque reference to the bound real-world entity. Monotonic: set
    /// exactly once by Bind and never changed afterwards.
    pub bound_entity: Option<String>,
    pub birth_certificate: Option<BirthCertificate>,
    pub status: LctStatus,
    /// Replay-protection counter for the transaction envelope.
    pub nonce: Nonce,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Lct {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// True if `caller` may administer this LCT: the LCT itself, or its
    /// minter.
    pub fn controlled_by(&self, caller: &LctId) -> bool {
        self.id == *caller || self.created_by == *caller
    }
}

// ── Witness attestation record ────────────────────────────────────────────────

/// Append-only record of one LCT witnessing another. Keyed by
/// (target, witness, witnessed_at); history is never rewritten.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessRecord {
    pub witness: LctId,
    pub target: LctId,
    pub signature: Ed25519Signature,
    pub confidence: crate::score::ScoreMicros,
    pub witnessed_at: Timestamp,
}
