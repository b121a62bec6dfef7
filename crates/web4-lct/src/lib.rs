//! web4-lct
//!
//! LCT lifecycle: minting, binding, MRH edge maintenance, witnessing,
//! birth certificates and status administration.
//!
//! State machine:
//!
//! ```text
//!  (none) --Mint--> active --Bind--> active(bound) --Revoke--> revoked
//!                      \                                        ^
//!                       \--Revoke--------------------------------/
//! ```
//!
//! `suspended` and `expired` are reachable from `active` via the
//! administrative status message; both bar new activity but preserve
//! historical edges. LCTs are never deleted.

pub mod query;

pub use query::LctQuery;

use tracing::info;

use web4_core::constants::{MAX_EVIDENCE_BYTES, MAX_RIGHTS_ENTRIES, WITNESS_DOMAIN};
use web4_core::error::Web4Error;
use web4_core::lct::{
    BirthCertificate, EntityType, Lct, LctStatus, Mrh, MrhSet, WitnessRecord,
};
use web4_core::score::{clamp, ScoreMicros};
use web4_core::transaction::AdminStatus;
use web4_core::types::{
    Amount, Ed25519PublicKey, Ed25519Signature, LctId, SocietyId, X25519PublicKey,
};
use web4_crypto::{lct_id_from_keys, verify_binding, verify_signature};
use web4_state::{Event, StateDb, TxCtx};

/// Keeper for LCT identity state.
pub struct LctKeeper;

impl LctKeeper {
    // ── Mint ─────────────────────────────────────────────────────────────────

    /// Mint a new LCT. The id is derived from the public keys, so minting
    /// the same keys twice collides and is rejected.
    pub fn mint(
        ctx: &mut TxCtx,
        creator: &LctId,
        entity_type: EntityType,
        signing_key: Ed25519PublicKey,
        agreement_key: X25519PublicKey,
        binding_signature: Ed25519Signature,
    ) -> Result<LctId, Web4Error> {
        verify_binding(&signing_key, &agreement_key, &binding_signature)?;

        let id = lct_id_from_keys(&signing_key, &agreement_key);
        if ctx.db.lct_exists(&id) {
            return Err(Web4Error::LctAlreadyExists(id.to_string()));
        }

        let lct = Lct {
            id: id.clone(),
            entity_type,
            signing_key,
            agreement_key,
            binding_signature,
            created_by: creator.clone(),
            bound_entity: None,
            birth_certificate: None,
            status: LctStatus::Active,
            nonce: 0,
            created_at: ctx.now,
            updated_at: ctx.now,
        };
        ctx.staged.lcts.push(lct);
        ctx.staged.mrhs.push(Mrh::new(id.clone()));
        ctx.emit(
            Event::new("lct_minted")
                .attr("lct_id", &id)
                .attr("entity_type", entity_type.as_str())
                .attr("created_by", creator),
        );
        info!(lct = %id, entity_type = entity_type.as_str(), "minted lct");
        Ok(id)
    }

    // ── Bind ─────────────────────────────────────────────────────────────────

    /// Bind an LCT to its real-world entity, exactly once. If the entity
    /// reference is itself an existing LCT, the permanent `bound` MRH edge
    /// is recorded on both sides.
    pub fn bind(
        ctx: &mut TxCtx,
        caller: &LctId,
        lct_id: &LctId,
        entity_id: &str,
        proof: &[u8],
    ) -> Result<(), Web4Error> {
        if entity_id.is_empty() {
            return Err(Web4Error::InvalidInput("entity_id must be non-empty".into()));
        }
        if proof.len() > MAX_EVIDENCE_BYTES {
            return Err(Web4Error::EvidenceTooLarge { max: MAX_EVIDENCE_BYTES });
        }

        let mut lct = ctx
            .db
            .get_lct(lct_id)?
            .ok_or_else(|| Web4Error::LctNotFound(lct_id.to_string()))?;
        if !lct.controlled_by(caller) {
            return Err(Web4Error::Unauthorized(format!(
                "{caller} does not control {lct_id}"
            )));
        }
        if lct.bound_entity.is_some() {
            return Err(Web4Error::AlreadyBound(lct_id.to_string()));
        }

        lct.bound_entity = Some(entity_id.to_string());
        lct.updated_at = ctx.now;

        // Bound MRH edges exist only for LCT-to-LCT ownership; an opaque
        // external reference binds without graph edges.
        let entity_lct = LctId(entity_id.to_string());
        if entity_lct.is_well_formed() && ctx.db.lct_exists(&entity_lct) {
            let mut own_mrh = Self::mrh_of(ctx.db, lct_id)?;
            let mut peer_mrh = Self::mrh_of(ctx.db, &entity_lct)?;
            Self::insert_edge(&mut own_mrh, MrhSet::Bound, &entity_lct)?;
            Self::insert_edge(&mut peer_mrh, MrhSet::Bound, lct_id)?;
            ctx.staged.mrhs.push(own_mrh);
            ctx.staged.mrhs.push(peer_mrh);
        }

        ctx.staged.lcts.push(lct);
        ctx.emit(
            Event::new("lct_bound")
                .attr("lct_id", lct_id)
                .attr("entity_id", entity_id),
        );
        Ok(())
    }

    // ── MRH maintenance ──────────────────────────────────────────────────────

    /// Direct MRH edits. `Bound` additions are only legal from within Bind
    /// and are rejected here; all edits preserve set disjointness.
    pub fn update_mrh(
        ctx: &mut TxCtx,
        caller: &LctId,
        lct_id: &LctId,
        set: MrhSet,
        add: &[LctId],
        remove: &[LctId],
    ) -> Result<(), Web4Error> {
        let lct = ctx
            .db
            .get_lct(lct_id)?
            .ok_or_else(|| Web4Error::LctNotFound(lct_id.to_string()))?;
        if !lct.controlled_by(caller) {
            return Err(Web4Error::Unauthorized(format!(
                "{caller} does not control {lct_id}"
            )));
        }
        if set == MrhSet::Bound && !add.is_empty() {
            return Err(Web4Error::InvalidInput(
                "bound edges are established by Bind, not by direct MRH update".into(),
            ));
        }

        let mut mrh = Self::mrh_of(ctx.db, lct_id)?;
        for id in add {
            if !ctx.db.lct_exists(id) {
                return Err(Web4Error::LctNotFound(id.to_string()));
            }
            Self::insert_edge(&mut mrh, set, id)?;
        }
        for id in remove {
            mrh.set_mut(set).remove(id);
        }
        ctx.staged.mrhs.push(mrh);
        ctx.emit(
            Event::new("mrh_updated")
                .attr("lct_id", lct_id)
                .attr("set", set.as_str())
                .attr("added", add.len())
                .attr("removed", remove.len()),
        );
        Ok(())
    }

    // ── Witnessing ───────────────────────────────────────────────────────────

    /// Append a witness attestation by `witness` about `target`. The
    /// signature covers WITNESS_DOMAIN ‖ witness ‖ target under the
    /// witness's signing key.
    pub fn witness(
        ctx: &mut TxCtx,
        witness: &Lct,
        target: &LctId,
        signature: Ed25519Signature,
        confidence: ScoreMicros,
    ) -> Result<(), Web4Error> {
        if !witness.is_active() {
            return Err(Web4Error::LctNotActive(witness.id.to_string()));
        }
        if !ctx.db.lct_exists(target) {
            return Err(Web4Error::LctNotFound(target.to_string()));
        }
        if witness.id == *target {
            return Err(Web4Error::InvalidInput("an lct cannot witness itself".into()));
        }

        let mut message = Vec::with_capacity(WITNESS_DOMAIN.len() + 96);
        message.extend_from_slice(WITNESS_DOMAIN);
        message.extend_from_slice(witness.id.as_bytes());
        message.extend_from_slice(target.as_bytes());
        verify_signature(&witness.signing_key, &message, &signature)?;

        let record = WitnessRecord {
            witness: witness.id.clone(),
            target: target.clone(),
            signature,
            confidence: clamp(confidence),
            witnessed_at: ctx.now,
        };
        ctx.staged.witness_records.push(record);

        // Witnessing edges are best-effort: an edge that would break MRH
        // disjointness (e.g. the peer is already paired) is skipped while
        // the attestation itself is still recorded.
        let mut witness_mrh = Self::mrh_of(ctx.db, &witness.id)?;
        let mut target_mrh = Self::mrh_of(ctx.db, target)?;
        if Self::insert_edge(&mut witness_mrh, MrhSet::Witnessing, target).is_ok() {
            ctx.staged.mrhs.push(witness_mrh);
        }
        if Self::insert_edge(&mut target_mrh, MrhSet::Witnessing, &witness.id).is_ok() {
            ctx.staged.mrhs.push(target_mrh);
        }

        ctx.emit(
            Event::new("lct_witnessed")
                .attr("witness", &witness.id)
                .attr("target", target)
                .attr("confidence", confidence),
        );
        Ok(())
    }

    // ── Birth certificate ────────────────────────────────────────────────────

    /// Issue a birth certificate to `recipient` on behalf of `society`. The
    /// caller must hold the society's treasury role. The ATP grant is an
    /// allocation against the society pool, recorded on the certificate;
    /// pool totals move only through Mint and demurrage.
    pub fn issue_birth_certificate(
        ctx: &mut TxCtx,
        caller: &LctId,
        recipient: &LctId,
        society: &SocietyId,
        rights: Vec<String>,
        responsibilities: Vec<String>,
        initial_atp: Amount,
    ) -> Result<(), Web4Error> {
        if rights.len() > MAX_RIGHTS_ENTRIES || responsibilities.len() > MAX_RIGHTS_ENTRIES {
            return Err(Web4Error::InvalidInput(format!(
                "at most {MAX_RIGHTS_ENTRIES} rights/responsibilities entries"
            )));
        }
        let society_record = ctx
            .db
            .get_society(society)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society.to_string()))?;
        if !society_record.holds_treasury_role(caller) {
            return Err(Web4Error::NotTreasury(society.to_string()));
        }

        let mut lct = ctx
            .db
            .get_lct(recipient)?
            .ok_or_else(|| Web4Error::LctNotFound(recipient.to_string()))?;
        if lct.birth_certificate.is_some() {
            return Err(Web4Error::InvalidInput(format!(
                "{recipient} already carries a birth certificate"
            )));
        }

        lct.birth_certificate = Some(BirthCertificate {
            society: society.clone(),
            rights,
            responsibilities,
            issued_at: ctx.now,
            initial_atp,
            witnesses: Vec::new(),
        });
        lct.updated_at = ctx.now;
        ctx.staged.lcts.push(lct);
        ctx.emit(
            Event::new("birth_certificate_issued")
                .attr("recipient", recipient)
                .attr("society", society)
                .attr("initial_atp", initial_atp),
        );
        Ok(())
    }

    // ── Status transitions ───────────────────────────────────────────────────

    /// Permanently revoke an LCT. Historical edges are preserved; the LCT
    /// can no longer initiate anything.
    pub fn revoke(
        ctx: &mut TxCtx,
        caller: &LctId,
        lct_id: &LctId,
        reason: &str,
    ) -> Result<(), Web4Error> {
        let mut lct = ctx
            .db
            .get_lct(lct_id)?
            .ok_or_else(|| Web4Error::LctNotFound(lct_id.to_string()))?;
        if !lct.controlled_by(caller) {
            return Err(Web4Error::Unauthorized(format!(
                "{caller} does not control {lct_id}"
            )));
        }
        if matches!(lct.status, LctStatus::Revoked { .. }) {
            return Err(Web4Error::InvalidInput("lct is already revoked".into()));
        }

        lct.status = LctStatus::Revoked {
            revoked_at: ctx.now,
            reason: reason.to_string(),
        };
        lct.updated_at = ctx.now;
        ctx.staged.lcts.push(lct);
        ctx.emit(
            Event::new("lct_revoked")
                .attr("lct_id", lct_id)
                .attr("reason", reason),
        );
        info!(lct = %lct_id, "revoked lct");
        Ok(())
    }

    /// Administrative suspension / reactivation / expiry. Authorization
    /// (founding-society treasury) is checked by the engine. Revocation is
    /// permanent and cannot be undone here.
    pub fn set_status(
        ctx: &mut TxCtx,
        lct_id: &LctId,
        status: AdminStatus,
    ) -> Result<(), Web4Error> {
        let mut lct = ctx
            .db
            .get_lct(lct_id)?
            .ok_or_else(|| Web4Error::LctNotFound(lct_id.to_string()))?;
        if matches!(lct.status, LctStatus::Revoked { .. }) {
            return Err(Web4Error::InvalidInput("revocation is permanent".into()));
        }

        lct.status = match status {
            AdminStatus::Active => LctStatus::Active,
            AdminStatus::Suspended => LctStatus::Suspended { suspended_at: ctx.now },
            AdminStatus::Expired => LctStatus::Expired { expired_at: ctx.now },
        };
        lct.updated_at = ctx.now;
        let status_str = lct.status.as_str();
        ctx.staged.lcts.push(lct);
        ctx.emit(
            Event::new("lct_status_changed")
                .attr("lct_id", lct_id)
                .attr("status", status_str),
        );
        Ok(())
    }

    // ── Cross-module helpers ─────────────────────────────────────────────────

    /// Load an LCT, requiring it to exist and be active.
    pub fn require_active(db: &StateDb, id: &LctId) -> Result<Lct, Web4Error> {
        let lct = db
            .get_lct(id)?
            .ok_or_else(|| Web4Error::LctNotFound(id.to_string()))?;
        if !lct.is_active() {
            return Err(Web4Error::LctNotActive(id.to_string()));
        }
        Ok(lct)
    }

    /// Record the symmetric `paired` edge for a freshly established pairing.
    /// Called by the pairing keeper inside the same transaction.
    pub fn add_paired_edge(ctx: &mut TxCtx, a: &LctId, b: &LctId) -> Result<(), Web4Error> {
        let mut mrh_a = Self::mrh_of(ctx.db, a)?;
        let mut mrh_b = Self::mrh_of(ctx.db, b)?;
        // Pairing supersedes a witnessing edge between the same two ids.
        mrh_a.witnessing.remove(b);
        mrh_b.witnessing.remove(a);
        Self::insert_edge(&mut mrh_a, MrhSet::Paired, b)?;
        Self::insert_edge(&mut mrh_b, MrhSet::Paired, a)?;
        ctx.staged.mrhs.push(mrh_a);
        ctx.staged.mrhs.push(mrh_b);
        Ok(())
    }

    /// Remove the symmetric `paired` edge on revocation.
    pub fn remove_paired_edge(ctx: &mut TxCtx, a: &LctId, b: &LctId) -> Result<(), Web4Error> {
        let mut mrh_a = Self::mrh_of(ctx.db, a)?;
        let mut mrh_b = Self::mrh_of(ctx.db, b)?;
        mrh_a.paired.remove(b);
        mrh_b.paired.remove(a);
        ctx.staged.mrhs.push(mrh_a);
        ctx.staged.mrhs.push(mrh_b);
        Ok(())
    }

    fn mrh_of(db: &StateDb, id: &LctId) -> Result<Mrh, Web4Error> {
        Ok(db.get_mrh(id)?.unwrap_or_else(|| Mrh::new(id.clone())))
    }

    /// Insert an edge, enforcing pairwise disjointness of the four sets.
    fn insert_edge(mrh: &mut Mrh, set: MrhSet, id: &LctId) -> Result<(), Web4Error> {
        if mrh.appears_outside(id, set) {
            return Err(Web4Error::InvalidInput(format!(
                "{id} already appears in another mrh set of {}",
                mrh.lct_id
            )));
        }
        mrh.set_mut(set).insert(id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_core::error::ErrorCode;
    use web4_crypto::KeyPair;
    use web4_state::BlockCtx;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("web4_lct_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn block(time: i64) -> BlockCtx {
        BlockCtx::new(1, time, [3u8; 32])
    }

    fn operator() -> LctId {
        LctId("lct:operator".into())
    }

    /// Mint an LCT for `kp` and commit it.
    fn mint(db: &StateDb, kp: &KeyPair, tx_index: u32) -> LctId {
        let mut ctx = TxCtx::new(db, &block(1_000), tx_index);
        let id = LctKeeper::mint(
            &mut ctx,
            &operator(),
            EntityType::Device,
            kp.signing_public,
            kp.agreement_public,
            kp.binding_signature(),
        )
        .unwrap();
        ctx.commit().unwrap();
        id
    }

    #[test]
    fn mint_derives_deterministic_id() {
        let db = temp_db("mint");
        let kp = KeyPair::generate();
        let id = mint(&db, &kp, 0);
        assert_eq!(id, kp.lct_id);

        let stored = db.get_lct(&id).unwrap().unwrap();
        assert_eq!(stored.status, LctStatus::Active);
        assert!(stored.bound_entity.is_none());
        assert!(db.get_mrh(&id).unwrap().is_some());
    }

    #[test]
    fn remint_same_keys_rejected() {
        let db = temp_db("remint");
        let kp = KeyPair::generate();
        mint(&db, &kp, 0);

        let mut ctx = TxCtx::new(&db, &block(1_001), 1);
        let err = LctKeeper::mint(
            &mut ctx,
            &operator(),
            EntityType::Device,
            kp.signing_public,
            kp.agreement_public,
            kp.binding_signature(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyExists);
    }

    #[test]
    fn mint_rejects_bad_binding() {
        let db = temp_db("badbind");
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let mut ctx = TxCtx::new(&db, &block(1_000), 0);
        let err = LctKeeper::mint(
            &mut ctx,
            &operator(),
            EntityType::Device,
            kp.signing_public,
            kp.agreement_public,
            other.binding_signature(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SignatureInvalid);
    }

    #[test]
    fn bind_is_exactly_once() {
        let db = temp_db("bind");
        let kp = KeyPair::generate();
        let id = mint(&db, &kp, 0);

        let mut ctx = TxCtx::new(&db, &block(1_100), 1);
        LctKeeper::bind(&mut ctx, &id, &id, "dev-001", b"proof").unwrap();
        ctx.commit().unwrap();
        assert_eq!(
            db.get_lct(&id).unwrap().unwrap().bound_entity.as_deref(),
            Some("dev-001")
        );

        let mut ctx = TxCtx::new(&db, &block(1_200), 2);
        let err = LctKeeper::bind(&mut ctx, &id, &id, "dev-002", b"proof").unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyBound);
    }

    #[test]
    fn bind_requires_control() {
        let db = temp_db("bindctl");
        let kp = KeyPair::generate();
        let id = mint(&db, &kp, 0);
        let stranger = LctId("lct:stranger".into());

        let mut ctx = TxCtx::new(&db, &block(1_100), 1);
        let err = LctKeeper::bind(&mut ctx, &stranger, &id, "dev-001", b"").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        // The minter also controls the LCT.
        let mut ctx = TxCtx::new(&db, &block(1_100), 2);
        LctKeeper::bind(&mut ctx, &operator(), &id, "dev-001", b"").unwrap();
    }

    #[test]
    fn direct_bound_update_rejected() {
        let db = temp_db("mrhbound");
        let kp = KeyPair::generate();
        let peer = KeyPair::generate();
        let id = mint(&db, &kp, 0);
        let peer_id = mint(&db, &peer, 1);

        let mut ctx = TxCtx::new(&db, &block(1_100), 2);
        let err = LctKeeper::update_mrh(
            &mut ctx,
            &id,
            &id,
            MrhSet::Bound,
            &[peer_id],
            &[],
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn mrh_disjointness_enforced() {
        let db = temp_db("mrhdisjoint");
        let kp = KeyPair::generate();
        let peer = KeyPair::generate();
        let id = mint(&db, &kp, 0);
        let peer_id = mint(&db, &peer, 1);

        let mut ctx = TxCtx::new(&db, &block(1_100), 2);
        LctKeeper::update_mrh(&mut ctx, &id, &id, MrhSet::Broadcast, &[peer_id.clone()], &[])
            .unwrap();
        ctx.commit().unwrap();

        // The same peer cannot also join the witnessing set.
        let mut ctx = TxCtx::new(&db, &block(1_200), 3);
        let err = LctKeeper::update_mrh(
            &mut ctx,
            &id,
            &id,
            MrhSet::Witnessing,
            &[peer_id.clone()],
            &[],
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        // After removal it can move sets.
        let mut ctx = TxCtx::new(&db, &block(1_300), 4);
        LctKeeper::update_mrh(&mut ctx, &id, &id, MrhSet::Broadcast, &[], &[peer_id.clone()])
            .unwrap();
        ctx.commit().unwrap();
        let mut ctx = TxCtx::new(&db, &block(1_400), 5);
        LctKeeper::update_mrh(&mut ctx, &id, &id, MrhSet::Witnessing, &[peer_id.clone()], &[])
            .unwrap();
        ctx.commit().unwrap();
        let mrh = db.get_mrh(&id).unwrap().unwrap();
        assert!(mrh.witnessing.contains(&peer_id));
        assert!(mrh.sets_disjoint());
    }

    #[test]
    fn witness_appends_record_and_edges() {
        let db = temp_db("witness");
        let witness_kp = KeyPair::generate();
        let target_kp = KeyPair::generate();
        let witness_id = mint(&db, &witness_kp, 0);
        let target_id = mint(&db, &target_kp, 1);

        let mut message = Vec::new();
        message.extend_from_slice(WITNESS_DOMAIN);
        message.extend_from_slice(witness_id.as_bytes());
        message.extend_from_slice(target_id.as_bytes());
        let signature = witness_kp.sign(&message);

        let witness_lct = db.get_lct(&witness_id).unwrap().unwrap();
        let mut ctx = TxCtx::new(&db, &block(2_000), 2);
        LctKeeper::witness(&mut ctx, &witness_lct, &target_id, signature, 800_000).unwrap();
        ctx.commit().unwrap();

        let records = db.iter_witness_records(&target_id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].confidence, 800_000);
        let mrh = db.get_mrh(&witness_id).unwrap().unwrap();
        assert!(mrh.witnessing.contains(&target_id));
    }

    #[test]
    fn witness_rejects_invalid_signature() {
        let db = temp_db("witnessbad");
        let witness_kp = KeyPair::generate();
        let target_kp = KeyPair::generate();
        let witness_id = mint(&db, &witness_kp, 0);
        let target_id = mint(&db, &target_kp, 1);

        let witness_lct = db.get_lct(&witness_id).unwrap().unwrap();
        let mut ctx = TxCtx::new(&db, &block(2_000), 2);
        let err = LctKeeper::witness(
            &mut ctx,
            &witness_lct,
            &target_id,
            witness_kp.sign(b"something else"),
            800_000,
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SignatureInvalid);
    }

    #[test]
    fn revoke_is_permanent() {
        let db = temp_db("revoke");
        let kp = KeyPair::generate();
        let id = mint(&db, &kp, 0);

        let mut ctx = TxCtx::new(&db, &block(3_000), 1);
        LctKeeper::revoke(&mut ctx, &id, &id, "decommissioned").unwrap();
        ctx.commit().unwrap();
        assert!(matches!(
            db.get_lct(&id).unwrap().unwrap().status,
            LctStatus::Revoked { .. }
        ));

        // Administrative reactivation cannot undo a revocation.
        let mut ctx = TxCtx::new(&db, &block(3_100), 2);
        let err = LctKeeper::set_status(&mut ctx, &id, AdminStatus::Active).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn suspension_round_trips() {
        let db = temp_db("suspend");
        let kp = KeyPair::generate();
        let id = mint(&db, &kp, 0);

        let mut ctx = TxCtx::new(&db, &block(3_000), 1);
        LctKeeper::set_status(&mut ctx, &id, AdminStatus::Suspended).unwrap();
        ctx.commit().unwrap();
        assert!(LctKeeper::require_active(&db, &id).is_err());

        let mut ctx = TxCtx::new(&db, &block(3_100), 2);
        LctKeeper::set_status(&mut ctx, &id, AdminStatus::Active).unwrap();
        ctx.commit().unwrap();
        assert!(LctKeeper::require_active(&db, &id).is_ok());
    }
}
