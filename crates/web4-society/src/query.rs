use web4_core::error::Web4Error;
use web4_core::society::{Dispute, LawDecision, Society};
use web4_core::types::{LctId, SocietyId};
use web4_state::StateDb;

/// Read-only view over society state.
pub struct SocietyQuery<'a> {
    db: &'a StateDb,
}

impl<'a> SocietyQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn get(&self, id: &SocietyId) -> Result<Society, Web4Error> {
        self.db
            .get_society(id)?
            .ok_or_else(|| Web4Error::SocietyNotFound(id.to_string()))
    }

    /// True if `lct` holds the society's treasury role.
    pub fn is_treasury(&self, society: &SocietyId, lct: &LctId) -> Result<bool, Web4Error> {
        Ok(self.get(society)?.holds_treasury_role(lct))
    }

    /// Oracle decisions for a society, in decision order.
    pub fn decisions(&self, society: &SocietyId) -> Result<Vec<LawDecision>, Web4Error> {
        self.db.iter_decisions(society)
    }

    pub fn disputes(&self, society: &SocietyId) -> Result<Vec<Dispute>, Web4Error> {
        self.db.iter_disputes(society)
    }
}
