//! Trust (T3) and value (V3) tensor records.
//!
//! A tensor bundles per-dimension scores for one relationship. Entries and
//! witness statements are append-only audit history; the overall trust score
//! is derived (decay + witness adjustment are applied lazily against the
//! block clock, so reads stay honest without a write).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::score::{ScoreDelta, ScoreMicros};
use crate::types::{Ed25519Signature, LctId, TensorId, Timestamp};

// ── Kind and dimensions ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TensorKind {
    /// Trust tensor: reliability, authenticity, behavioural, longevity, witness.
    T3,
    /// Value tensor: economic, social, knowledge.
    V3,
}

impl TensorKind {
    pub fn as_byte(&self) -> u8 {
        match self {
            TensorKind::T3 => 0,
            TensorKind::V3 => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TensorKind::T3 => "t3",
            TensorKind::V3 => "v3",
        }
    }

    pub fn dimensions(&self) -> &'static [Dimension] {
        match self {
            TensorKind::T3 => &[
                Dimension::Reliability,
                Dimension::Authenticity,
                Dimension::Behavioural,
                Dimension::Longevity,
                Dimension::Witness,
            ],
            TensorKind::V3 => &[
                Dimension::Economic,
                Dimension::Social,
                Dimension::Knowledge,
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    // T3
    Reliability,
    Authenticity,
    Behavioural,
    Longevity,
    Witness,
    // V3
    Economic,
    Social,
    Knowledge,
}

impl Dimension {
    pub fn kind(&self) -> TensorKind {
        match self {
            Dimension::Reliability
            | Dimension::Authenticity
            | Dimension::Behavioural
            | Dimension::Longevity
            | Dimension::Witness => TensorKind::T3,
            Dimension::Economic | Dimension::Social | Dimension::Knowledge => TensorKind::V3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Reliability => "reliability",
            Dimension::Authenticity => "authenticity",
            Dimension::Behavioural => "behavioural",
            Dimension::Longevity => "longevity",
            Dimension::Witness => "witness",
            Dimension::Economic => "economic",
            Dimension::Social => "social",
            Dimension::Knowledge => "knowledge",
        }
    }
}

// ── Tensor state ──────────────────────────────────────────────────────────────

/// One dimension's live state within a tensor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionState {
    pub score: ScoreMicros,
    pub weight: ScoreMicros,
    pub evidence_count: u64,
    pub last_evidence: Timestamp,
}

/// A tensor bound to one (owner, partner) relationship. Weights within a
/// tensor sum to SCORE_SCALE ± rounding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipTrustTensor {
    pub tensor_id: TensorId,
    pub kind: TensorKind,
    pub owner: LctId,
    pub partner: LctId,
    pub dimensions: BTreeMap<Dimension, DimensionState>,
    /// Derived score as of `last_updated`; queries re-derive against the
    /// current block time.
    pub overall_trust_score: ScoreMicros,
    pub interaction_count: u64,
    pub decay_factor: ScoreMicros,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    /// Monotone sequence for entry-id derivation.
    pub entry_seq: u64,
}

impl RelationshipTrustTensor {
    pub fn dimension(&self, d: Dimension) -> Option<&DimensionState> {
        self.dimensions.get(&d)
    }
}

// ── Audit history ─────────────────────────────────────────────────────────────

/// Append-only evidence entry behind a score update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorEntry {
    pub entry_id: String,
    pub tensor_id: TensorId,
    pub source: LctId,
    pub dimension: Dimension,
    /// Signed delta in micro-units, in [−SCORE_SCALE, SCORE_SCALE].
    pub score_delta: ScoreDelta,
    pub evidence: Vec<u8>,
    pub confidence: ScoreMicros,
    pub created_at: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    pub fn as_sign(&self) -> i64 {
        match self {
            Polarity::Positive => 1,
            Polarity::Negative => -1,
            Polarity::Neutral => 0,
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Polarity::Positive => b'+',
            Polarity::Negative => b'-',
            Polarity::Neutral => b'0',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
            Polarity::Neutral => "neutral",
        }
    }
}

/// Append-only third-party statement about a tensor's subject. The signature
/// is verifiable against the witnessing LCT's signing key; once stored it
/// retains effect even if the witness later becomes inactive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorWitness {
    pub witness_id: String,
    pub tensor_id: TensorId,
    pub witness: LctId,
    pub witnessed: LctId,
    pub statement: Vec<u8>,
    pub confidence: ScoreMicros,
    pub polarity: Polarity,
    pub signature: Ed25519Signature,
    pub created_at: Timestamp,
}
