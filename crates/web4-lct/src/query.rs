use web4_core::error::Web4Error;
use web4_core::lct::{EntityType, Lct, Mrh, WitnessRecord};
use web4_core::types::LctId;
use web4_state::StateDb;

/// Read-only view over LCT state.
pub struct LctQuery<'a> {
    db: &'a StateDb,
}

impl<'a> LctQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn get(&self, id: &LctId) -> Result<Lct, Web4Error> {
        self.db
            .get_lct(id)?
            .ok_or_else(|| Web4Error::LctNotFound(id.to_string()))
    }

    /// The LCT together with its MRH edge sets.
    pub fn get_with_mrh(&self, id: &LctId) -> Result<(Lct, Mrh), Web4Error> {
        let lct = self.get(id)?;
        let mrh = self
            .db
            .get_mrh(id)?
            .unwrap_or_else(|| Mrh::new(id.clone()));
        Ok((lct, mrh))
    }

    /// Paginated listing, optionally filtered by entity type. Offset-based:
    /// ids are iterated in key order, so pages are stable between writes.
    pub fn list(
        &self,
        entity_type: Option<EntityType>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Lct>, Web4Error> {
        Ok(self
            .db
            .iter_lcts()?
            .into_iter()
            .filter(|l| entity_type.map(|t| l.entity_type == t).unwrap_or(true))
            .skip(offset)
            .take(limit)
            .collect())
    }

    /// Witness attestations received by `target`, in append order.
    pub fn witnesses_of(&self, target: &LctId) -> Result<Vec<WitnessRecord>, Web4Error> {
        self.db.iter_witness_records(target)
    }

    /// Human-readable one-line summary of an LCT's state.
    pub fn describe(&self, id: &LctId) -> Result<String, Web4Error> {
        let lct = self.get(id)?;
        let created = chrono::DateTime::from_timestamp(lct.created_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| lct.created_at.to_string());
        let bound = lct
            .bound_entity
            .as_deref()
            .map(|e| format!("bound to {e}"))
            .unwrap_or_else(|| "unbound".to_string());
        Ok(format!(
            "LCT {} | {} | {} | {} | created {}",
            &id.as_str()[..id.as_str().len().min(16)],
            lct.entity_type.as_str(),
            lct.status.as_str(),
            bound,
            created
        ))
    }
}
