use web4_core::error::Web4Error;
use web4_core::registry::{AuthorizationDecision, ComponentRecord, RevocationEvent};
use web4_core::types::ComponentHash;
use web4_state::StateDb;

use crate::RegistryKeeper;

/// Read-only view over registry state.
pub struct RegistryQuery<'a> {
    db: &'a StateDb,
}

impl<'a> RegistryQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    /// Metadata for a registered component hash.
    pub fn get_metadata(&self, hash: &ComponentHash) -> Result<ComponentRecord, Web4Error> {
        self.db
            .get_component(hash)?
            .ok_or_else(|| Web4Error::ComponentNotFound(hash.to_string()))
    }

    pub fn check_authorization(
        &self,
        source: &ComponentHash,
        target: &ComponentHash,
    ) -> Result<AuthorizationDecision, Web4Error> {
        RegistryKeeper::check_pairing_authorization(self.db, source, target)
    }

    pub fn revocations(&self, target: &ComponentHash) -> Result<Vec<RevocationEvent>, Web4Error> {
        self.db.iter_revocations(target)
    }
}
