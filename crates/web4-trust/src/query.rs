use web4_core::error::Web4Error;
use web4_core::params::{CalcAlgorithm, TrustParams};
use web4_core::score::ScoreMicros;
use web4_core::tensor::{RelationshipTrustTensor, TensorEntry, TensorWitness};
use web4_core::types::{LctId, TensorId, Timestamp};
use web4_state::StateDb;

use crate::scoring::{gravity_aggregate, overall_trust, WeightedWitness};
use crate::TrustKeeper;

/// Read-only view over tensor state. Scores are derived lazily against the
/// supplied block time, so decay is visible without a write.
pub struct TrustQuery<'a> {
    db: &'a StateDb,
}

impl<'a> TrustQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    /// The tensor with its overall score refreshed to `now`, optionally
    /// with its append-only history attached.
    pub fn get_relationship_tensor(
        &self,
        id: &TensorId,
        include_history: bool,
        now: Timestamp,
    ) -> Result<(RelationshipTrustTensor, Vec<TensorEntry>, Vec<TensorWitness>), Web4Error> {
        let mut tensor = self
            .db
            .get_tensor(id)?
            .ok_or_else(|| Web4Error::TensorNotFound(id.to_string()))?;
        tensor.overall_trust_score = TrustKeeper::compute_overall(self.db, &tensor, now)?;
        let (entries, witnesses) = if include_history {
            (
                self.db.iter_tensor_entries(id)?,
                self.db.iter_tensor_witnesses(id)?,
            )
        } else {
            (Vec::new(), Vec::new())
        };
        Ok((tensor, entries, witnesses))
    }

    /// History entries within [from, to], in append order.
    pub fn get_tensor_history(
        &self,
        id: &TensorId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<TensorEntry>, Web4Error> {
        if self.db.get_tensor(id)?.is_none() {
            return Err(Web4Error::TensorNotFound(id.to_string()));
        }
        Ok(self
            .db
            .iter_tensor_entries(id)?
            .into_iter()
            .filter(|e| e.created_at >= from && e.created_at <= to)
            .collect())
    }

    /// High-trust classification: the derived score must clear the
    /// threshold AND the tensor must carry at least
    /// `min_witnesses_for_high_trust` independent witnesses.
    pub fn is_high_trust(
        &self,
        id: &TensorId,
        threshold: ScoreMicros,
        now: Timestamp,
    ) -> Result<bool, Web4Error> {
        let params: TrustParams = self.db.get_params("trust")?;
        let (tensor, _, _) = self.get_relationship_tensor(id, false, now)?;
        let witness_count = self.db.iter_tensor_witnesses(id)?.len() as u32;
        Ok(tensor.overall_trust_score >= threshold
            && witness_count >= params.min_witnesses_for_high_trust)
    }

    /// Component-level trust for `lct`: every relationship it participates
    /// in, decayed to `now`, pulled together by gravity aggregation with
    /// interaction counts as mass.
    pub fn calculate_relationship_trust(
        &self,
        lct: &LctId,
        algorithm: Option<CalcAlgorithm>,
        now: Timestamp,
    ) -> Result<ScoreMicros, Web4Error> {
        let params: TrustParams = self.db.get_params("trust")?;
        let algorithm = algorithm.unwrap_or(params.default_calculation_algorithm);

        let mut scores = Vec::new();
        for tensor in self.db.iter_tensors()? {
            if tensor.owner != *lct && tensor.partner != *lct {
                continue;
            }
            let witnesses = self.db.iter_tensor_witnesses(&tensor.tensor_id)?;
            let weighted: Vec<WeightedWitness<'_>> = witnesses
                .iter()
                .map(|w| {
                    Ok(WeightedWitness {
                        reliability: TrustKeeper::reliability_of(self.db, &w.witness, &params)?,
                        witness: w,
                    })
                })
                .collect::<Result<_, Web4Error>>()?;
            let score = overall_trust(&tensor, &weighted, &params, now, algorithm);
            scores.push((score, tensor.interaction_count));
        }
        Ok(gravity_aggregate(&scores))
    }
}
