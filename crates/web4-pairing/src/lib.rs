//! web4-pairing
//!
//! Bidirectional pairing: both components prove control of their signing
//! keys over fresh deterministic challenges before a relationship is
//! established. At most one active pairing exists per unordered component
//! pair; expired sessions never produce pairings.

pub mod query;

pub use query::PairingQuery;

use tracing::info;

use web4_core::constants::{MAX_METADATA_BYTES, MAX_METADATA_ENTRIES};
use web4_core::error::Web4Error;
use web4_core::lct::Lct;
use web4_core::pairing::{
    ActivePairing, PairingChallenge, PairingSession, PairingStatus, SessionStatus,
};
use web4_core::params::PairingParams;
use web4_core::types::{ComponentHash, LctId, PairingId, SessionId};
use web4_crypto::{pairing_id, session_id, verify_signature};
use web4_lct::LctKeeper;
use web4_registry::RegistryKeeper;
use web4_state::{Event, TxCtx};

use std::collections::BTreeMap;

/// Keeper for pairing sessions and the active-pairing registry.
pub struct PairingKeeper;

impl PairingKeeper {
    // ── Initiate ─────────────────────────────────────────────────────────────

    /// Open a pairing session between `initiator` and `target`: two fresh
    /// challenges, status pending, expiry at now + validity.
    pub fn initiate(
        ctx: &mut TxCtx,
        initiator: &Lct,
        target: &LctId,
        validity_minutes: Option<u32>,
        metadata: BTreeMap<String, String>,
    ) -> Result<SessionId, Web4Error> {
        let params: PairingParams = ctx.db.get_params("pairing")?;

        if initiator.id == *target {
            return Err(Web4Error::InvalidInput("cannot pair a component with itself".into()));
        }
        let target_lct = LctKeeper::require_active(ctx.db, target)?;
        validate_metadata(&metadata)?;

        let validity = validity_minutes.unwrap_or(params.default_session_validity_minutes);
        if validity == 0 {
            return Err(Web4Error::InvalidInput("validity must be at least one minute".into()));
        }
        if validity > params.max_session_validity_minutes {
            return Err(Web4Error::ValidityTooLong {
                got: validity,
                max: params.max_session_validity_minutes,
            });
        }

        // One active pairing per unordered pair.
        if let Some(existing) = ctx.db.get_active_pairing(&initiator.id, target)? {
            if existing.is_active() {
                return Err(Web4Error::AlreadyPaired(
                    initiator.id.to_string(),
                    target.to_string(),
                ));
            }
        }
        for side in [&initiator.id, target] {
            let count = ctx.db.count_active_pairings_for(side)?;
            if count >= params.max_pairings_per_component {
                return Err(Web4Error::PairingCapReached {
                    component: side.to_string(),
                    max: params.max_pairings_per_component,
                });
            }
        }

        // Registered physical components also pass the registry policy table.
        if params.require_authorization {
            Self::check_registry_authorization(ctx, initiator, &target_lct)?;
        }

        let entropy = ctx.rng.draw32();
        let sid = session_id(&initiator.id, target, &entropy);
        let challenge_len = params.challenge_size_bytes as usize;
        let initiator_challenge = Self::make_challenge(ctx, &initiator.id, challenge_len);
        let target_challenge = Self::make_challenge(ctx, target, challenge_len);

        let session = PairingSession {
            session_id: sid.clone(),
            initiator: initiator.id.clone(),
            target: target.clone(),
            status: SessionStatus::Pending,
            created_at: ctx.now,
            expires_at: ctx.now + validity as i64 * 60,
            metadata,
            initiator_challenge,
            target_challenge,
        };
        ctx.staged.sessions.push(session);
        ctx.emit(
            Event::new("pairing_initiated")
                .attr("session_id", &sid)
                .attr("initiator", &initiator.id)
                .attr("target", target)
                .attr("validity_minutes", validity),
        );
        info!(session = %sid, initiator = %initiator.id, target = %target, "pairing initiated");
        Ok(sid)
    }

    fn make_challenge(ctx: &mut TxCtx, holder: &LctId, len: usize) -> PairingChallenge {
        let challenge = ctx.rng.challenge(len);
        let expected_response_hash = *blake3::hash(&challenge).as_bytes();
        PairingChallenge {
            holder: holder.clone(),
            challenge,
            expected_response_hash,
            verified: false,
        }
    }

    /// When both ends are bound to registered component hashes, the registry
    /// policy table decides whether they may pair at all.
    fn check_registry_authorization(
        ctx: &TxCtx,
        initiator: &Lct,
        target: &Lct,
    ) -> Result<(), Web4Error> {
        let (Some(source), Some(dest)) = (&initiator.bound_entity, &target.bound_entity) else {
            return Ok(());
        };
        let source = ComponentHash(source.clone());
        let dest = ComponentHash(dest.clone());
        if ctx.db.get_component(&source)?.is_none() || ctx.db.get_component(&dest)?.is_none() {
            return Ok(());
        }
        let decision = RegistryKeeper::check_pairing_authorization(ctx.db, &source, &dest)?;
        if !decision.authorized {
            return Err(Web4Error::Unauthorized(format!(
                "registry denied pairing: {}",
                decision.reason
            )));
        }
        Ok(())
    }

    // ── Complete ─────────────────────────────────────────────────────────────

    /// One side's signed challenge response. On the second valid response
    /// the session completes: an ActivePairing is created and both MRH
    /// `paired` sets are updated. Returns the pairing id when established.
    pub fn complete(
        ctx: &mut TxCtx,
        caller: &Lct,
        sid: &SessionId,
        response: &web4_core::types::Ed25519Signature,
    ) -> Result<Option<PairingId>, Web4Error> {
        let mut session = ctx
            .db
            .get_session(sid)?
            .ok_or_else(|| Web4Error::SessionNotFound(sid.to_string()))?;

        match &session.status {
            SessionStatus::Pending => {}
            SessionStatus::Completed { .. } => {
                return Err(Web4Error::InvalidInput(format!(
                    "session {sid} is already completed"
                )));
            }
            SessionStatus::Expired { .. } | SessionStatus::Failed { .. } => {
                return Err(Web4Error::SessionExpired(sid.to_string()));
            }
        }
        // Logical timeout: expired sessions cannot be completed and never
        // produce active pairings.
        if session.is_expired(ctx.now) {
            return Err(Web4Error::SessionExpired(sid.to_string()));
        }

        let challenge = session
            .challenge_for_mut(&caller.id)
            .ok_or_else(|| Web4Error::NotAParticipant(caller.id.to_string(), sid.to_string()))?;
        // Only the first valid response per side is honoured.
        if challenge.verified {
            return Err(Web4Error::InvalidInput(format!(
                "challenge for {} already verified",
                caller.id
            )));
        }
        verify_signature(&caller.signing_key, &challenge.challenge, response)
            .map_err(|_| Web4Error::ChallengeVerificationFailed)?;
        challenge.verified = true;

        let established = if session.both_verified() {
            // Block order resolves races: a pairing established meanwhile
            // rejects this completion.
            if let Some(existing) = ctx
                .db
                .get_active_pairing(&session.initiator, &session.target)?
            {
                if existing.is_active() {
                    return Err(Web4Error::AlreadyPaired(
                        session.initiator.to_string(),
                        session.target.to_string(),
                    ));
                }
            }
            session.status = SessionStatus::Completed { completed_at: ctx.now };

            let pid = pairing_id(sid);
            let (a, b) = ActivePairing::canonical_pair(&session.initiator, &session.target);
            let pairing = ActivePairing {
                pairing_id: pid.clone(),
                component_a: a.clone(),
                component_b: b.clone(),
                session_id: sid.clone(),
                established_at: ctx.now,
                status: PairingStatus::Active,
            };
            LctKeeper::add_paired_edge(ctx, &a, &b)?;
            ctx.staged.active_pairings.push(pairing);
            ctx.emit(
                Event::new("pairing_completed")
                    .attr("session_id", sid)
                    .attr("pairing_id", &pid)
                    .attr("component_a", &a)
                    .attr("component_b", &b),
            );
            info!(session = %sid, pairing = %pid, "pairing completed");
            Some(pid)
        } else {
            ctx.emit(
                Event::new("pairing_challenge_verified")
                    .attr("session_id", sid)
                    .attr("participant", &caller.id),
            );
            None
        };

        ctx.staged.sessions.push(session);
        Ok(established)
    }

    // ── Revoke ───────────────────────────────────────────────────────────────

    /// Permanently revoke an active pairing and drop the MRH edges on both
    /// sides. Either participant may revoke (when self-revocation is on);
    /// a participant's controller always may.
    pub fn revoke(
        ctx: &mut TxCtx,
        caller: &Lct,
        pid: &PairingId,
        reason: &str,
    ) -> Result<(), Web4Error> {
        if reason.is_empty() {
            return Err(Web4Error::InvalidInput("revocation reason is mandatory".into()));
        }
        let params: PairingParams = ctx.db.get_params("pairing")?;

        let mut pairing = ctx
            .db
            .get_pairing_by_id(pid)?
            .ok_or_else(|| Web4Error::PairingNotFound(pid.to_string()))?;
        if !pairing.is_active() {
            return Err(Web4Error::InvalidInput(format!("pairing {pid} is already revoked")));
        }

        let is_participant = pairing.involves(&caller.id);
        let controls_participant = [&pairing.component_a, &pairing.component_b]
            .into_iter()
            .any(|side| {
                ctx.db
                    .get_lct(side)
                    .ok()
                    .flatten()
                    .map(|l| l.controlled_by(&caller.id))
                    .unwrap_or(false)
            });
        if is_participant && !params.allow_self_revocation {
            return Err(Web4Error::Unauthorized(
                "self-revocation is disabled by pairing policy".into(),
            ));
        }
        if !is_participant && !controls_participant {
            return Err(Web4Error::Unauthorized(format!(
                "{} is neither participant nor controller of {pid}",
                caller.id
            )));
        }

        pairing.status = PairingStatus::Revoked {
            revoked_at: ctx.now,
            revoked_by: caller.id.clone(),
            reason: reason.to_string(),
        };
        LctKeeper::remove_paired_edge(ctx, &pairing.component_a, &pairing.component_b)?;
        ctx.emit(
            Event::new("pairing_revoked")
                .attr("pairing_id", pid)
                .attr("revoked_by", &caller.id)
                .attr("reason", reason),
        );
        info!(pairing = %pid, by = %caller.id, "pairing revoked");
        ctx.staged.active_pairings.push(pairing);
        Ok(())
    }
}

fn validate_metadata(metadata: &BTreeMap<String, String>) -> Result<(), Web4Error> {
    if metadata.len() > MAX_METADATA_ENTRIES {
        return Err(Web4Error::MetadataTooLarge(MAX_METADATA_ENTRIES));
    }
    for (key, value) in metadata {
        if key.len() > MAX_METADATA_BYTES || value.len() > MAX_METADATA_BYTES {
            return Err(Web4Error::MetadataTooLarge(MAX_METADATA_ENTRIES));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_core::error::ErrorCode;
    use web4_core::lct::EntityType;
    use web4_crypto::KeyPair;
    use web4_state::{BlockCtx, StateDb};

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("web4_pairing_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn block(time: i64) -> BlockCtx {
        BlockCtx::new(1, time, [5u8; 32])
    }

    fn mint(db: &StateDb, kp: &KeyPair, tx_index: u32) -> Lct {
        let mut ctx = TxCtx::new(db, &block(0), tx_index);
        let id = LctKeeper::mint(
            &mut ctx,
            &LctId("lct:operator".into()),
            EntityType::Device,
            kp.signing_public,
            kp.agreement_public,
            kp.binding_signature(),
        )
        .unwrap();
        ctx.commit().unwrap();
        db.get_lct(&id).unwrap().unwrap()
    }

    fn initiate(
        db: &StateDb,
        initiator: &Lct,
        target: &LctId,
        validity: u32,
        time: i64,
        tx_index: u32,
    ) -> SessionId {
        let mut ctx = TxCtx::new(db, &block(time), tx_index);
        let sid = PairingKeeper::initiate(
            &mut ctx,
            initiator,
            target,
            Some(validity),
            BTreeMap::new(),
        )
        .unwrap();
        ctx.commit().unwrap();
        sid
    }

    fn complete(
        db: &StateDb,
        caller: &Lct,
        kp: &KeyPair,
        sid: &SessionId,
        time: i64,
        tx_index: u32,
    ) -> Result<Option<PairingId>, Web4Error> {
        let session = db.get_session(sid).unwrap().unwrap();
        let challenge = session.challenge_for(&caller.id).unwrap();
        let response = kp.sign(&challenge.challenge);
        let mut ctx = TxCtx::new(db, &block(time), tx_index);
        let result = PairingKeeper::complete(&mut ctx, caller, sid, &response)?;
        ctx.commit().unwrap();
        Ok(result)
    }

    #[test]
    fn full_handshake_establishes_pairing() {
        let db = temp_db("handshake");
        let (kp_a, kp_b) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);

        // t=0: initiate with 30 minutes validity.
        let sid = initiate(&db, &a, &b.id, 30, 0, 2);
        let session = db.get_session(&sid).unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.expires_at, 30 * 60);
        assert_ne!(
            session.initiator_challenge.challenge,
            session.target_challenge.challenge
        );

        // t=10m: first side verifies, session still pending.
        assert!(complete(&db, &a, &kp_a, &sid, 600, 3).unwrap().is_none());
        let session = db.get_session(&sid).unwrap().unwrap();
        assert!(session.initiator_challenge.verified);
        assert_eq!(session.status, SessionStatus::Pending);

        // t=20m: second side completes the pairing.
        let pid = complete(&db, &b, &kp_b, &sid, 1_200, 4).unwrap().unwrap();
        let session = db.get_session(&sid).unwrap().unwrap();
        assert!(matches!(session.status, SessionStatus::Completed { .. }));

        let pairing = db.get_pairing_by_id(&pid).unwrap().unwrap();
        assert!(pairing.is_active());
        assert!(db.get_active_pairing(&a.id, &b.id).unwrap().is_some());

        let mrh_a = db.get_mrh(&a.id).unwrap().unwrap();
        let mrh_b = db.get_mrh(&b.id).unwrap().unwrap();
        assert!(mrh_a.paired.contains(&b.id));
        assert!(mrh_b.paired.contains(&a.id));

        // t=25m: completing again fails.
        let err = complete(&db, &a, &kp_a, &sid, 1_500, 5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn expired_session_cannot_complete() {
        let db = temp_db("expired");
        let (kp_a, kp_b) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);

        // 10-minute session; A completes at t=5m, B arrives at t=11m.
        let sid = initiate(&db, &a, &b.id, 10, 0, 2);
        complete(&db, &a, &kp_a, &sid, 300, 3).unwrap();
        let err = complete(&db, &b, &kp_b, &sid, 660, 4).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Expired);

        assert!(db.get_active_pairing(&a.id, &b.id).unwrap().is_none());
        let mrh_a = db.get_mrh(&a.id).unwrap().unwrap();
        assert!(mrh_a.paired.is_empty());
    }

    #[test]
    fn validity_boundary_enforced() {
        let db = temp_db("validity");
        let (kp_a, kp_b) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);
        let max = PairingParams::default().max_session_validity_minutes;

        // Exactly the maximum is accepted.
        initiate(&db, &a, &b.id, max, 0, 2);

        // One past it is rejected.
        let mut ctx = TxCtx::new(&db, &block(0), 3);
        let err = PairingKeeper::initiate(&mut ctx, &a, &b.id, Some(max + 1), BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn wrong_key_fails_challenge() {
        let db = temp_db("wrongkey");
        let (kp_a, kp_b) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);

        let sid = initiate(&db, &a, &b.id, 30, 0, 2);
        // A signs with B's key: verification fails against A's stored key.
        let err = complete(&db, &a, &kp_b, &sid, 60, 3).unwrap_err();
        assert!(matches!(err, Web4Error::ChallengeVerificationFailed));
    }

    #[test]
    fn stranger_is_not_a_participant() {
        let db = temp_db("stranger");
        let (kp_a, kp_b, kp_c) = (KeyPair::generate(), KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);
        let c = mint(&db, &kp_c, 2);

        let sid = initiate(&db, &a, &b.id, 30, 0, 3);
        let mut ctx = TxCtx::new(&db, &block(60), 4);
        let err = PairingKeeper::complete(&mut ctx, &c, &sid, &kp_c.sign(b"x")).unwrap_err();
        assert!(matches!(err, Web4Error::NotAParticipant(_, _)));
    }

    #[test]
    fn duplicate_active_pairing_rejected() {
        let db = temp_db("duplicate");
        let (kp_a, kp_b) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);

        let sid = initiate(&db, &a, &b.id, 30, 0, 2);
        complete(&db, &a, &kp_a, &sid, 60, 3).unwrap();
        complete(&db, &b, &kp_b, &sid, 120, 4).unwrap();

        // New initiation for the same unordered pair (either direction).
        let mut ctx = TxCtx::new(&db, &block(200), 5);
        let err = PairingKeeper::initiate(&mut ctx, &b, &a.id, Some(30), BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyPaired);
    }

    #[test]
    fn revoke_drops_edges_and_is_permanent() {
        let db = temp_db("revoke");
        let (kp_a, kp_b) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);

        let sid = initiate(&db, &a, &b.id, 30, 0, 2);
        complete(&db, &a, &kp_a, &sid, 60, 3).unwrap();
        let pid = complete(&db, &b, &kp_b, &sid, 120, 4).unwrap().unwrap();

        let mut ctx = TxCtx::new(&db, &block(300), 5);
        PairingKeeper::revoke(&mut ctx, &b, &pid, "battery swapped").unwrap();
        ctx.commit().unwrap();

        let pairing = db.get_pairing_by_id(&pid).unwrap().unwrap();
        assert!(!pairing.is_active());
        assert!(db.get_mrh(&a.id).unwrap().unwrap().paired.is_empty());
        assert!(db.get_mrh(&b.id).unwrap().unwrap().paired.is_empty());

        // Revoking again is rejected.
        let mut ctx = TxCtx::new(&db, &block(400), 6);
        let err = PairingKeeper::revoke(&mut ctx, &b, &pid, "again").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        // After revocation the pair may re-pair.
        let sid2 = initiate(&db, &a, &b.id, 30, 500, 7);
        complete(&db, &a, &kp_a, &sid2, 560, 8).unwrap();
        assert!(complete(&db, &b, &kp_b, &sid2, 620, 9).unwrap().is_some());
    }
}
