//! Pure trust-score arithmetic. Everything here is fixed-point and
//! side-effect free; the keeper supplies witness reliabilities and the
//! block clock.

use web4_core::params::{CalcAlgorithm, TrustParams};
use web4_core::score::{clamp_signed, confidence_factor, mul, powi, ScoreMicros, SCORE_SCALE};
use web4_core::tensor::{RelationshipTrustTensor, TensorWitness};
use web4_core::types::Timestamp;

/// A witness statement paired with the witness's own reliability score.
pub struct WeightedWitness<'a> {
    pub witness: &'a TensorWitness,
    pub reliability: ScoreMicros,
}

/// Confidence-weighted base score:
/// Σ_d (w_d · s_d · cf(n_d)) / Σ_d w_d.
pub fn base_score(tensor: &RelationshipTrustTensor) -> ScoreMicros {
    let mut weighted_sum: u128 = 0;
    let mut total_weight: u128 = 0;
    for state in tensor.dimensions.values() {
        let cf = confidence_factor(state.evidence_count);
        weighted_sum += mul(state.weight, mul(state.score, cf)) as u128;
        total_weight += state.weight as u128;
    }
    if total_weight == 0 {
        return 0;
    }
    ((weighted_sum * SCORE_SCALE as u128) / total_weight) as ScoreMicros
}

/// Cumulative decay multiplier for whole days elapsed since the tensor was
/// last updated, floored at the configured minimum.
pub fn decay_multiplier(
    last_updated: Timestamp,
    now: Timestamp,
    params: &TrustParams,
) -> ScoreMicros {
    let days = ((now - last_updated).max(0) / 86_400) as u64;
    powi(params.daily_decay_factor, days, params.decay_floor)
}

/// Witness adjustment, signed micro-units:
/// influence · (Σ_w weight_w · polarity_w) / (Σ_w weight_w),
/// where weight_w = reliability(witness) · confidence_w. Zero when no
/// witnesses are present.
pub fn witness_adjustment(witnesses: &[WeightedWitness<'_>], params: &TrustParams) -> i128 {
    let mut numerator: i128 = 0;
    let mut denominator: i128 = 0;
    for w in witnesses {
        let weight = mul(w.reliability, w.witness.confidence) as i128;
        numerator += weight * w.witness.polarity.as_sign() as i128;
        denominator += weight;
    }
    if denominator == 0 {
        return 0;
    }
    let ratio = numerator * SCORE_SCALE as i128 / denominator;
    params.witness_influence_factor as i128 * ratio / SCORE_SCALE as i128
}

/// Overall trust: clamp(base · decay + witnessAdj, 0, 1).
pub fn overall_trust(
    tensor: &RelationshipTrustTensor,
    witnesses: &[WeightedWitness<'_>],
    params: &TrustParams,
    now: Timestamp,
    algorithm: CalcAlgorithm,
) -> ScoreMicros {
    match algorithm {
        CalcAlgorithm::WitnessWeightedDecay => {
            let base = base_score(tensor);
            let decayed = mul(base, decay_multiplier(tensor.last_updated, now, params));
            clamp_signed(decayed as i128 + witness_adjustment(witnesses, params))
        }
        CalcAlgorithm::SimpleAverage => {
            let mut weighted_sum: u128 = 0;
            let mut total_weight: u128 = 0;
            for state in tensor.dimensions.values() {
                weighted_sum += mul(state.weight, state.score) as u128;
                total_weight += state.weight as u128;
            }
            if total_weight == 0 {
                return 0;
            }
            ((weighted_sum * SCORE_SCALE as u128) / total_weight) as ScoreMicros
        }
    }
}

/// Damped score update: new = clamp(current + delta · confidence · lr, 0, 1).
pub fn apply_delta(
    current: ScoreMicros,
    delta: i64,
    confidence: ScoreMicros,
    evidence_count: u64,
) -> ScoreMicros {
    let lr = web4_core::score::learning_rate(evidence_count);
    let effect = delta as i128 * confidence as i128 / SCORE_SCALE as i128 * lr as i128
        / SCORE_SCALE as i128;
    clamp_signed(current as i128 + effect)
}

/// Gravity aggregation: relationship scores pulled together, each weighted
/// by its interaction mass. Used for component-level trust queries.
pub fn gravity_aggregate(scores: &[(ScoreMicros, u64)]) -> ScoreMicros {
    let mut weighted_sum: u128 = 0;
    let mut total_mass: u128 = 0;
    for (score, interactions) in scores {
        let mass = (*interactions + 1) as u128;
        weighted_sum += *score as u128 * mass;
        total_mass += mass;
    }
    if total_mass == 0 {
        return 0;
    }
    (weighted_sum / total_mass) as ScoreMicros
}
