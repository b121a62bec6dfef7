use web4_core::energy::{AdpToken, AtpToken, EnergyPool};
use web4_core::error::Web4Error;
use web4_core::types::{AdpId, AtpId, SocietyId};
use web4_state::StateDb;

/// Read-only view over energy state.
pub struct EnergyQuery<'a> {
    db: &'a StateDb,
}

impl<'a> EnergyQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn get_pool(&self, society: &SocietyId) -> Result<EnergyPool, Web4Error> {
        self.db
            .get_pool(society)?
            .ok_or_else(|| Web4Error::PoolNotFound(society.to_string()))
    }

    /// Audit record for a charged-token issue (mint or recharge).
    pub fn get_atp_token(&self, id: &AtpId) -> Result<AtpToken, Web4Error> {
        self.db
            .get_atp_token(id)?
            .ok_or_else(|| Web4Error::AtpNotFound(id.to_string()))
    }

    /// A live (unconsumed) discharged token.
    pub fn get_adp_token(&self, id: &AdpId) -> Result<AdpToken, Web4Error> {
        self.db
            .get_adp_token(id)?
            .ok_or_else(|| Web4Error::AdpNotFound(id.to_string()))
    }
}
