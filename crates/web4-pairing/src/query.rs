use web4_core::error::Web4Error;
use web4_core::pairing::{ActivePairing, PairingSession, SessionStatus};
use web4_core::types::{LctId, SessionId, Timestamp};
use web4_state::StateDb;

/// Read-only view over pairing state. Session expiry is evaluated lazily
/// against the supplied block time, so reads stay honest between writes.
pub struct PairingQuery<'a> {
    db: &'a StateDb,
}

impl<'a> PairingQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    /// The stored session with its effective status: a pending session past
    /// its expiry reads as expired.
    pub fn get_session(&self, id: &SessionId, now: Timestamp) -> Result<PairingSession, Web4Error> {
        let mut session = self
            .db
            .get_session(id)?
            .ok_or_else(|| Web4Error::SessionNotFound(id.to_string()))?;
        if session.status == SessionStatus::Pending && session.is_expired(now) {
            session.status = SessionStatus::Expired { expired_at: session.expires_at };
        }
        Ok(session)
    }

    /// Current pairing state for an unordered component pair.
    pub fn get_pairing_status(
        &self,
        a: &LctId,
        b: &LctId,
    ) -> Result<Option<ActivePairing>, Web4Error> {
        self.db.get_active_pairing(a, b)
    }

    /// Every pairing in status active that involves `lct`.
    pub fn list_active_pairings(&self, lct: &LctId) -> Result<Vec<ActivePairing>, Web4Error> {
        Ok(self
            .db
            .iter_active_pairings()?
            .into_iter()
            .filter(|p| p.is_active() && p.involves(lct))
            .collect())
    }
}
