//! Governance-updatable module parameters. One serde record per module,
//! stored in state under `params/{module}`; readers fall back to these
//! compiled defaults when no record has been written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::score::{ScoreMicros, SCORE_SCALE};
use crate::tensor::Dimension;
use crate::types::Ed25519PublicKey;

// ── Pairing ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairingParams {
    pub max_session_validity_minutes: u32,
    pub default_session_validity_minutes: u32,
    pub require_authorization: bool,
    pub allow_self_revocation: bool,
    pub challenge_size_bytes: u32,
    pub max_pairings_per_component: u32,
}

impl Default for PairingParams {
    fn default() -> Self {
        Self {
            max_session_validity_minutes: 60,
            default_session_validity_minutes: 30,
            require_authorization: true,
            allow_self_revocation: true,
            challenge_size_bytes: 32,
            max_pairings_per_component: 50,
        }
    }
}

// ── Queue ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueueParams {
    pub max_queue_time_hours: u32,
    pub max_requests_per_component: u32,
    pub max_batch_processing_size: u32,
    pub enable_proxy_processing: bool,
    pub auto_cancel_expired: bool,
    pub enable_retry: bool,
    pub max_retry_attempts: u32,
    /// Backoff base: a retry reschedules after base × 2^retry_count minutes.
    pub retry_base_minutes: u32,
    /// Requests examined per end-of-block expiry sweep page.
    pub expiry_sweep_page_size: u32,
}

impl Default for QueueParams {
    fn default() -> Self {
        Self {
            max_queue_time_hours: 168,
            max_requests_per_component: 100,
            max_batch_processing_size: 10,
            enable_proxy_processing: true,
            auto_cancel_expired: true,
            enable_retry: true,
            max_retry_attempts: 3,
            retry_base_minutes: 1,
            expiry_sweep_page_size: 50,
        }
    }
}

// ── Trust ─────────────────────────────────────────────────────────────────────

/// Trust calculation algorithm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalcAlgorithm {
    /// Full model: confidence-weighted base, temporal decay, witness
    /// adjustment.
    #[default]
    WitnessWeightedDecay,
    /// Plain weighted average of dimension scores, no decay or witnesses.
    SimpleAverage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustParams {
    pub default_initial_trust_score: ScoreMicros,
    /// Per-day multiplicative decay, micro-units (0.999 by default).
    pub daily_decay_factor: ScoreMicros,
    /// Hard floor the decay never drops below.
    pub decay_floor: ScoreMicros,
    pub witness_influence_factor: ScoreMicros,
    pub min_witnesses_for_high_trust: u32,
    pub default_calculation_algorithm: CalcAlgorithm,
    /// Default dimension weights, micro-units, summing to SCORE_SCALE per kind.
    pub t3_weights: BTreeMap<Dimension, ScoreMicros>,
    pub v3_weights: BTreeMap<Dimension, ScoreMicros>,
}

impl Default for TrustParams {
    fn default() -> Self {
        let t3_weights = BTreeMap::from([
            (Dimension::Reliability, 200_000),
            (Dimension::Authenticity, 200_000),
            (Dimension::Behavioural, 200_000),
            (Dimension::Longevity, 200_000),
            (Dimension::Witness, 200_000),
        ]);
        let v3_weights = BTreeMap::from([
            (Dimension::Economic, 334_000),
            (Dimension::Social, 333_000),
            (Dimension::Knowledge, 333_000),
        ]);
        Self {
            default_initial_trust_score: SCORE_SCALE / 2,
            daily_decay_factor: 999_000,
            decay_floor: 100_000,
            witness_influence_factor: 100_000,
            min_witnesses_for_high_trust: 3,
            default_calculation_algorithm: CalcAlgorithm::default(),
            t3_weights,
            v3_weights,
        }
    }
}

// ── Energy ────────────────────────────────────────────────────────────────────

/// A producer whose work proofs are accepted for recharge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedProducer {
    pub name: String,
    pub key: Ed25519PublicKey,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnergyParams {
    /// Minimum flow/stock ratio, micro-units.
    pub velocity_requirement: ScoreMicros,
    pub velocity_window_secs: i64,
    /// Per-epoch ATP decay, micro-units.
    pub demurrage_rate: ScoreMicros,
    pub demurrage_epoch_secs: i64,
    /// Transparent producer list ("solar", "wind", "generator", …) with the
    /// verifying key each signs work proofs under.
    pub approved_producers: Vec<ApprovedProducer>,
    pub r6_max_field_bytes: usize,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            velocity_requirement: 100_000, // 10 %
            velocity_window_secs: 86_400,
            demurrage_rate: 10_000, // 1 % per epoch
            demurrage_epoch_secs: 7 * 86_400,
            approved_producers: Vec::new(),
            r6_max_field_bytes: 512,
        }
    }
}

// ── Update envelope ───────────────────────────────────────────────────────────

/// Typed params replacement carried by the governance `UpdateParams` message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamsUpdate {
    Pairing(PairingParams),
    Queue(QueueParams),
    Trust(TrustParams),
    Energy(EnergyParams),
}

impl ParamsUpdate {
    pub fn module(&self) -> &'static str {
        match self {
            ParamsUpdate::Pairing(_) => "pairing",
            ParamsUpdate::Queue(_) => "queue",
            ParamsUpdate::Trust(_) => "trust",
            ParamsUpdate::Energy(_) => "energy",
        }
    }
}
