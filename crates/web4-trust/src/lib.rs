//! web4-trust
//!
//! Relationship trust tensors: damped score evolution with append-only
//! evidence history, signed witness ingestion, lazy temporal decay and
//! gravity aggregation across a component's relationships.

pub mod query;
pub mod scoring;

pub use query::TrustQuery;
pub use scoring::{
    apply_delta, base_score, decay_multiplier, gravity_aggregate, overall_trust,
    witness_adjustment, WeightedWitness,
};

use tracing::info;

use web4_core::constants::{MAX_EVIDENCE_BYTES, TENSOR_WITNESS_DOMAIN};
use web4_core::error::Web4Error;
use web4_core::lct::Lct;
use web4_core::params::TrustParams;
use web4_core::score::{clamp, ScoreDelta, ScoreMicros, SCORE_SCALE};
use web4_core::tensor::{
    Dimension, DimensionState, Polarity, RelationshipTrustTensor, TensorEntry, TensorKind,
    TensorWitness,
};
use web4_core::types::{Ed25519Signature, LctId, TensorId, Timestamp};
use web4_crypto::{entry_id, tensor_id, verify_signature, witness_id};
use web4_state::{Event, StateDb, TxCtx};

/// Keeper for tensor state.
pub struct TrustKeeper;

impl TrustKeeper {
    // ── Create ───────────────────────────────────────────────────────────────

    /// Create the owner↔partner tensor of `kind`, or return the existing
    /// id: tensor identity is content-derived, so creation is idempotent.
    pub fn create_tensor(
        ctx: &mut TxCtx,
        owner: &Lct,
        partner: &LctId,
        kind: TensorKind,
    ) -> Result<TensorId, Web4Error> {
        if owner.id == *partner {
            return Err(Web4Error::InvalidInput("a tensor needs two distinct parties".into()));
        }
        if !ctx.db.lct_exists(partner) {
            return Err(Web4Error::LctNotFound(partner.to_string()));
        }

        let tid = tensor_id(&owner.id, partner, kind);
        if ctx.db.get_tensor(&tid)?.is_some() {
            return Ok(tid);
        }

        let params: TrustParams = ctx.db.get_params("trust")?;
        let weights = match kind {
            TensorKind::T3 => &params.t3_weights,
            TensorKind::V3 => &params.v3_weights,
        };
        let dimensions = kind
            .dimensions()
            .iter()
            .map(|d| {
                (
                    *d,
                    DimensionState {
                        score: params.default_initial_trust_score,
                        weight: weights.get(d).copied().unwrap_or(0),
                        evidence_count: 0,
                        last_evidence: ctx.now,
                    },
                )
            })
            .collect();

        let tensor = RelationshipTrustTensor {
            tensor_id: tid.clone(),
            kind,
            owner: owner.id.clone(),
            partner: partner.clone(),
            dimensions,
            overall_trust_score: params.default_initial_trust_score,
            interaction_count: 0,
            decay_factor: params.daily_decay_factor,
            created_at: ctx.now,
            last_updated: ctx.now,
            entry_seq: 0,
        };
        ctx.staged.tensors.push(tensor);
        ctx.emit(
            Event::new("tensor_created")
                .attr("tensor_id", &tid)
                .attr("kind", kind.as_str())
                .attr("owner", &owner.id)
                .attr("partner", partner),
        );
        info!(tensor = %tid, kind = kind.as_str(), "tensor created");
        Ok(tid)
    }

    // ── Score updates ────────────────────────────────────────────────────────

    /// Apply a damped score delta to one dimension and append the evidence
    /// entry. History is never rewritten.
    pub fn update_tensor_score(
        ctx: &mut TxCtx,
        caller: &Lct,
        tid: &TensorId,
        dimension: Dimension,
        score_delta: ScoreDelta,
        evidence: Vec<u8>,
        confidence: ScoreMicros,
    ) -> Result<ScoreMicros, Web4Error> {
        if score_delta.unsigned_abs() > SCORE_SCALE {
            return Err(Web4Error::InvalidInput("score_delta outside [-1, 1]".into()));
        }
        if evidence.len() > MAX_EVIDENCE_BYTES {
            return Err(Web4Error::EvidenceTooLarge { max: MAX_EVIDENCE_BYTES });
        }

        let mut tensor = ctx
            .db
            .get_tensor(tid)?
            .ok_or_else(|| Web4Error::TensorNotFound(tid.to_string()))?;
        if tensor.owner != caller.id && tensor.partner != caller.id {
            return Err(Web4Error::Unauthorized(format!(
                "{} is not a party of tensor {tid}",
                caller.id
            )));
        }
        if dimension.kind() != tensor.kind {
            return Err(Web4Error::InvalidInput(format!(
                "dimension {} does not belong to a {} tensor",
                dimension.as_str(),
                tensor.kind.as_str()
            )));
        }

        let confidence = clamp(confidence);
        let state = tensor
            .dimensions
            .get_mut(&dimension)
            .ok_or_else(|| Web4Error::InvalidInput("dimension absent from tensor".into()))?;
        let new_score = apply_delta(state.score, score_delta, confidence, state.evidence_count);
        state.score = new_score;
        state.evidence_count += 1;
        state.last_evidence = ctx.now;

        let entry = TensorEntry {
            entry_id: entry_id(tid, tensor.entry_seq),
            tensor_id: tid.clone(),
            source: caller.id.clone(),
            dimension,
            score_delta,
            evidence,
            confidence,
            created_at: ctx.now,
        };
        let seq = tensor.entry_seq;
        tensor.entry_seq += 1;
        tensor.interaction_count += 1;
        tensor.last_updated = ctx.now;
        tensor.overall_trust_score = Self::compute_overall(ctx.db, &tensor, ctx.now)?;

        ctx.staged.tensor_entries.push((entry, seq));
        ctx.emit(
            Event::new("tensor_score_updated")
                .attr("tensor_id", tid)
                .attr("dimension", dimension.as_str())
                .attr("score", new_score)
                .attr("overall", tensor.overall_trust_score),
        );
        let overall = tensor.overall_trust_score;
        ctx.staged.tensors.push(tensor);
        Ok(overall)
    }

    // ── Witness ingestion ────────────────────────────────────────────────────

    /// Store a signed third-party statement and refresh the derived score.
    /// The witness must be active now; stored statements keep their effect
    /// regardless of the witness's later status.
    pub fn add_tensor_witness(
        ctx: &mut TxCtx,
        witness: &Lct,
        tid: &TensorId,
        witnessed: &LctId,
        statement: Vec<u8>,
        confidence: ScoreMicros,
        polarity: Polarity,
        signature: Ed25519Signature,
    ) -> Result<(), Web4Error> {
        if !witness.is_active() {
            return Err(Web4Error::LctNotActive(witness.id.to_string()));
        }
        if statement.len() > MAX_EVIDENCE_BYTES {
            return Err(Web4Error::EvidenceTooLarge { max: MAX_EVIDENCE_BYTES });
        }

        let mut tensor = ctx
            .db
            .get_tensor(tid)?
            .ok_or_else(|| Web4Error::TensorNotFound(tid.to_string()))?;
        if tensor.owner != *witnessed && tensor.partner != *witnessed {
            return Err(Web4Error::InvalidInput(format!(
                "{witnessed} is not a party of tensor {tid}"
            )));
        }
        if witness.id == *witnessed {
            return Err(Web4Error::InvalidInput("an lct cannot witness itself".into()));
        }

        let mut message = Vec::new();
        message.extend_from_slice(TENSOR_WITNESS_DOMAIN);
        message.extend_from_slice(tid.as_bytes());
        message.extend_from_slice(witnessed.as_bytes());
        message.push(polarity.as_byte());
        message.extend_from_slice(&statement);
        verify_signature(&witness.signing_key, &message, &signature)?;

        let record = TensorWitness {
            witness_id: witness_id(tid, &witness.id, ctx.now),
            tensor_id: tid.clone(),
            witness: witness.id.clone(),
            witnessed: witnessed.clone(),
            statement,
            confidence: clamp(confidence),
            polarity,
            signature,
            created_at: ctx.now,
        };
        ctx.staged.tensor_witnesses.push(record.clone());

        // Recompute immediately so reads in the same block already see the
        // adjusted score. The stored witness is folded in by hand because
        // the staged write is not yet visible in the db.
        let mut witnesses = ctx.db.iter_tensor_witnesses(tid)?;
        witnesses.push(record);
        let params: TrustParams = ctx.db.get_params("trust")?;
        let weighted: Vec<WeightedWitness<'_>> = witnesses
            .iter()
            .map(|w| {
                Ok(WeightedWitness {
                    reliability: Self::reliability_of(ctx.db, &w.witness, &params)?,
                    witness: w,
                })
            })
            .collect::<Result<_, Web4Error>>()?;
        tensor.overall_trust_score = overall_trust(
            &tensor,
            &weighted,
            &params,
            ctx.now,
            params.default_calculation_algorithm,
        );

        ctx.emit(
            Event::new("tensor_witness_added")
                .attr("tensor_id", tid)
                .attr("witness", &witness.id)
                .attr("polarity", polarity.as_str())
                .attr("overall", tensor.overall_trust_score),
        );
        ctx.staged.tensors.push(tensor);
        Ok(())
    }

    // ── Derived values ───────────────────────────────────────────────────────

    /// Overall trust for a tensor from committed witness state.
    pub fn compute_overall(
        db: &StateDb,
        tensor: &RelationshipTrustTensor,
        now: Timestamp,
    ) -> Result<ScoreMicros, Web4Error> {
        let params: TrustParams = db.get_params("trust")?;
        let witnesses = db.iter_tensor_witnesses(&tensor.tensor_id)?;
        let weighted: Vec<WeightedWitness<'_>> = witnesses
            .iter()
            .map(|w| {
                Ok(WeightedWitness {
                    reliability: Self::reliability_of(db, &w.witness, &params)?,
                    witness: w,
                })
            })
            .collect::<Result<_, Web4Error>>()?;
        Ok(overall_trust(
            tensor,
            &weighted,
            &params,
            now,
            params.default_calculation_algorithm,
        ))
    }

    /// A witness's own reliability: the reliability dimension of its
    /// primary T3 tensor. The primary tensor is the most exercised
    /// relationship it owns, ties broken by tensor id; falls back to the
    /// initial trust score.
    pub fn reliability_of(
        db: &StateDb,
        lct: &LctId,
        params: &TrustParams,
    ) -> Result<ScoreMicros, Web4Error> {
        let mut primary: Option<RelationshipTrustTensor> = None;
        for tensor in db.iter_tensors()? {
            if tensor.kind != TensorKind::T3 || tensor.owner != *lct {
                continue;
            }
            let better = match &primary {
                None => true,
                Some(p) => {
                    (tensor.interaction_count, &tensor.tensor_id)
                        > (p.interaction_count, &p.tensor_id)
                }
            };
            if better {
                primary = Some(tensor);
            }
        }
        Ok(primary
            .and_then(|t| t.dimension(Dimension::Reliability).map(|d| d.score))
            .unwrap_or(params.default_initial_trust_score))
    }
}
