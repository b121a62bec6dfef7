//! web4-society
//!
//! The governance layer: societies own a law oracle, a treasury role and an
//! energy pool. Admission runs through the oracle synchronously within the
//! admitting transaction; every decision is persisted.

pub mod oracle;
pub mod query;

pub use oracle::{decide_admission, require_live_oracle};
pub use query::SocietyQuery;

use tracing::info;

use web4_core::constants::MAX_EVIDENCE_BYTES;
use web4_core::error::Web4Error;
use web4_core::lct::{EntityType, Lct};
use web4_core::society::{
    CitizenRecord, Constitution, Dispute, DisputeStatus, LawDecision, Society, Verdict,
};
use web4_core::transaction::DisputeResolution;
use web4_core::types::{
    Amount, Ed25519PublicKey, Ed25519Signature, LctId, SocietyId, X25519PublicKey,
};
use web4_crypto::dispute_id;
use web4_lct::LctKeeper;
use web4_energy::EnergyKeeper;
use web4_state::{Event, StateDb, TxCtx};

use std::collections::BTreeMap;

/// Keeper for society state.
pub struct SocietyKeeper;

impl SocietyKeeper {
    // ── Founding ─────────────────────────────────────────────────────────────

    /// Found a society: mint its LCT from the supplied keys, seat the
    /// founder as the first treasury-role holder, and create the pool with
    /// its initial ATP issue.
    #[allow(clippy::too_many_arguments)]
    pub fn create_society(
        ctx: &mut TxCtx,
        founder: &Lct,
        name: &str,
        constitution: Constitution,
        signing_key: Ed25519PublicKey,
        agreement_key: X25519PublicKey,
        binding_signature: Ed25519Signature,
        law_oracle: &LctId,
        treasury_role: &LctId,
        initial_pool: Amount,
    ) -> Result<SocietyId, Web4Error> {
        if name.is_empty() {
            return Err(Web4Error::InvalidInput("society name must be non-empty".into()));
        }
        Self::require_role(ctx.db, law_oracle)?;
        Self::require_role(ctx.db, treasury_role)?;

        let society_id = LctKeeper::mint(
            ctx,
            &founder.id,
            EntityType::Society,
            signing_key,
            agreement_key,
            binding_signature,
        )?;
        if ctx.db.get_society(&society_id)?.is_some() {
            return Err(Web4Error::SocietyAlreadyExists(society_id.to_string()));
        }

        let mut members = BTreeMap::new();
        members.insert(
            founder.id.clone(),
            CitizenRecord {
                lct: founder.id.clone(),
                role: treasury_role.clone(),
                rights: constitution.rights.clone(),
                responsibilities: constitution.responsibilities.clone(),
                joined_at: ctx.now,
                atp_allocated: 0,
            },
        );
        let society = Society {
            lct_id: society_id.clone(),
            name: name.to_string(),
            law_oracle_lct: law_oracle.clone(),
            treasury_role: treasury_role.clone(),
            constitution,
            members,
            created_at: ctx.now,
        };
        EnergyKeeper::create_pool(ctx, &society_id, initial_pool)?;
        ctx.staged.societies.push(society);
        ctx.emit(
            Event::new("society_created")
                .attr("society", &society_id)
                .attr("name", name)
                .attr("founder", &founder.id)
                .attr("initial_pool", initial_pool),
        );
        info!(society = %society_id, name, "society created");
        Ok(society_id)
    }

    // ── Admission ────────────────────────────────────────────────────────────

    /// Request citizenship. The law oracle decides synchronously; the
    /// decision is persisted and emitted whether or not it admits. Only an
    /// approve/conditional verdict adds the citizen record.
    pub fn join(
        ctx: &mut TxCtx,
        candidate: &Lct,
        society_id: &SocietyId,
        role: &LctId,
    ) -> Result<Verdict, Web4Error> {
        let mut society = ctx
            .db
            .get_society(society_id)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society_id.to_string()))?;
        require_live_oracle(ctx.db, &society)?;
        Self::require_role(ctx.db, role)?;

        let verdict = decide_admission(&society, &candidate.id, role);
        let decision = LawDecision {
            society: society_id.clone(),
            candidate: candidate.id.clone(),
            requested_role: role.clone(),
            verdict: verdict.clone(),
            decided_at: ctx.now,
        };
        ctx.staged.decisions.push(decision);
        ctx.emit(
            Event::new("law_oracle_decision")
                .attr("society", society_id)
                .attr("candidate", &candidate.id)
                .attr("verdict", verdict.as_str()),
        );

        if verdict.admits() {
            let rights = match &verdict {
                Verdict::Conditional { rights } => rights.clone(),
                _ => society.constitution.rights.clone(),
            };
            society.members.insert(
                candidate.id.clone(),
                CitizenRecord {
                    lct: candidate.id.clone(),
                    role: role.clone(),
                    rights,
                    responsibilities: society.constitution.responsibilities.clone(),
                    joined_at: ctx.now,
                    atp_allocated: 0,
                },
            );
            ctx.emit(
                Event::new("citizen_joined")
                    .attr("society", society_id)
                    .attr("citizen", &candidate.id)
                    .attr("role", role),
            );
            ctx.staged.societies.push(society);
            info!(society = %society_id, citizen = %candidate.id, "citizen admitted");
        }
        Ok(verdict)
    }

    /// Leave a society. The last treasury-role holder cannot leave: the
    /// pool would be orphaned.
    pub fn leave(
        ctx: &mut TxCtx,
        caller: &Lct,
        society_id: &SocietyId,
    ) -> Result<(), Web4Error> {
        let mut society = ctx
            .db
            .get_society(society_id)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society_id.to_string()))?;
        let member = society
            .member(&caller.id)
            .ok_or_else(|| Web4Error::Unauthorized(format!(
                "{} is not a citizen of {society_id}",
                caller.id
            )))?;

        if member.role == society.treasury_role {
            let treasury_holders = society
                .members
                .values()
                .filter(|m| m.role == society.treasury_role)
                .count();
            if treasury_holders == 1 {
                return Err(Web4Error::InvalidInput(
                    "the last treasury-role holder cannot leave".into(),
                ));
            }
        }

        society.members.remove(&caller.id);
        ctx.emit(
            Event::new("citizen_left")
                .attr("society", society_id)
                .attr("citizen", &caller.id),
        );
        ctx.staged.societies.push(society);
        Ok(())
    }

    /// Replace the constitution. Treasury role only, and only while the
    /// oracle seat is live.
    pub fn amend_constitution(
        ctx: &mut TxCtx,
        caller: &Lct,
        society_id: &SocietyId,
        constitution: Constitution,
    ) -> Result<(), Web4Error> {
        let mut society = ctx
            .db
            .get_society(society_id)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society_id.to_string()))?;
        require_live_oracle(ctx.db, &society)?;
        if !society.holds_treasury_role(&caller.id) {
            return Err(Web4Error::NotTreasury(society_id.to_string()));
        }

        society.constitution = constitution;
        ctx.emit(
            Event::new("constitution_amended")
                .attr("society", society_id)
                .attr("amended_by", &caller.id),
        );
        ctx.staged.societies.push(society);
        Ok(())
    }

    // ── Disputes ─────────────────────────────────────────────────────────────

    /// File a dispute between two citizens.
    pub fn file_dispute(
        ctx: &mut TxCtx,
        plaintiff: &Lct,
        society_id: &SocietyId,
        defendant: &LctId,
        claim: &str,
        evidence: Vec<Vec<u8>>,
    ) -> Result<String, Web4Error> {
        if claim.is_empty() {
            return Err(Web4Error::InvalidInput("dispute claim must be non-empty".into()));
        }
        if evidence.iter().any(|e| e.len() > MAX_EVIDENCE_BYTES) {
            return Err(Web4Error::EvidenceTooLarge { max: MAX_EVIDENCE_BYTES });
        }
        let society = ctx
            .db
            .get_society(society_id)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society_id.to_string()))?;
        if society.member(&plaintiff.id).is_none() {
            return Err(Web4Error::Unauthorized(format!(
                "{} is not a citizen of {society_id}",
                plaintiff.id
            )));
        }
        if society.member(defendant).is_none() {
            return Err(Web4Error::InvalidInput(format!(
                "defendant {defendant} is not a citizen of {society_id}"
            )));
        }

        let did = dispute_id(society_id, &plaintiff.id, ctx.now);
        let dispute = Dispute {
            dispute_id: did.clone(),
            society: society_id.clone(),
            plaintiff: plaintiff.id.clone(),
            defendant: defendant.clone(),
            claim: claim.to_string(),
            evidence,
            status: DisputeStatus::Pending,
            filed_at: ctx.now,
        };
        ctx.staged.disputes.push(dispute);
        ctx.emit(
            Event::new("dispute_filed")
                .attr("society", society_id)
                .attr("dispute_id", &did)
                .attr("plaintiff", &plaintiff.id)
                .attr("defendant", defendant),
        );
        Ok(did)
    }

    /// Advance a dispute. Only the oracle seat (the role LCT itself, or a
    /// citizen holding it) may investigate, resolve or dismiss.
    pub fn resolve_dispute(
        ctx: &mut TxCtx,
        caller: &Lct,
        society_id: &SocietyId,
        did: &str,
        resolution: DisputeResolution,
    ) -> Result<(), Web4Error> {
        let society = ctx
            .db
            .get_society(society_id)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society_id.to_string()))?;
        let is_oracle = caller.id == society.law_oracle_lct
            || society
                .member(&caller.id)
                .map(|m| m.role == society.law_oracle_lct)
                .unwrap_or(false);
        if !is_oracle {
            return Err(Web4Error::Unauthorized(format!(
                "{} does not hold the oracle seat of {society_id}",
                caller.id
            )));
        }

        let mut dispute = ctx
            .db
            .get_dispute(society_id, did)?
            .ok_or_else(|| Web4Error::DisputeNotFound(did.to_string()))?;
        if !dispute.status.is_open() {
            return Err(Web4Error::InvalidInput(format!(
                "dispute {did} is already {}",
                dispute.status.as_str()
            )));
        }

        dispute.status = match resolution {
            DisputeResolution::Investigate => DisputeStatus::Investigating,
            DisputeResolution::Resolve { resolution } => DisputeStatus::Resolved {
                resolution,
                resolved_at: ctx.now,
            },
            DisputeResolution::Dismiss { reason } => DisputeStatus::Dismissed {
                reason,
                dismissed_at: ctx.now,
            },
        };
        let status_str = dispute.status.as_str();
        ctx.staged.disputes.push(dispute);
        ctx.emit(
            Event::new("dispute_updated")
                .attr("society", society_id)
                .attr("dispute_id", did)
                .attr("status", status_str),
        );
        Ok(())
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// Require an existing, active role LCT.
    fn require_role(db: &StateDb, id: &LctId) -> Result<(), Web4Error> {
        let lct = LctKeeper::require_active(db, id)?;
        if lct.entity_type != EntityType::Role {
            return Err(Web4Error::InvalidInput(format!(
                "{id} is not a role lct"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_core::error::ErrorCode;
    use web4_core::transaction::AdminStatus;
    use web4_crypto::KeyPair;
    use web4_state::BlockCtx;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("web4_society_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn block(time: i64) -> BlockCtx {
        BlockCtx::new(1, time, [17u8; 32])
    }

    fn mint(db: &StateDb, kp: &KeyPair, entity_type: EntityType, tx_index: u32) -> Lct {
        let mut ctx = TxCtx::new(db, &block(0), tx_index);
        let id = LctKeeper::mint(
            &mut ctx,
            &LctId("lct:operator".into()),
            entity_type,
            kp.signing_public,
            kp.agreement_public,
            kp.binding_signature(),
        )
        .unwrap();
        ctx.commit().unwrap();
        db.get_lct(&id).unwrap().unwrap()
    }

    struct Fixture {
        founder: Lct,
        oracle_role: Lct,
        citizen_role: Lct,
        society: SocietyId,
    }

    fn open_constitution() -> Constitution {
        Constitution {
            principles: vec!["energy follows trust".into()],
            rights: vec!["energy.discharge".into()],
            responsibilities: vec!["report telemetry".into()],
            governance_rules: BTreeMap::new(),
            economic_rules: BTreeMap::new(),
            membership_open: true,
        }
    }

    fn found_society(db: &StateDb) -> Fixture {
        let founder = mint(db, &KeyPair::generate(), EntityType::Human, 0);
        let oracle_role = mint(db, &KeyPair::generate(), EntityType::Role, 1);
        let treasury_role = mint(db, &KeyPair::generate(), EntityType::Role, 2);
        let citizen_role = mint(db, &KeyPair::generate(), EntityType::Role, 3);

        let society_kp = KeyPair::generate();
        let mut ctx = TxCtx::new(db, &block(100), 4);
        let society = SocietyKeeper::create_society(
            &mut ctx,
            &founder,
            "pit-lane",
            open_constitution(),
            society_kp.signing_public,
            society_kp.agreement_public,
            society_kp.binding_signature(),
            &oracle_role.id,
            &treasury_role.id,
            1_000,
        )
        .unwrap();
        ctx.commit().unwrap();
        Fixture { founder, oracle_role, citizen_role, society }
    }

    #[test]
    fn founding_seats_treasury_and_creates_pool() {
        let db = temp_db("found");
        let f = found_society(&db);

        let society = db.get_society(&f.society).unwrap().unwrap();
        assert!(society.holds_treasury_role(&f.founder.id));
        assert_eq!(society.members.len(), 1);

        let pool = db.get_pool(&f.society).unwrap().unwrap();
        assert_eq!(pool.atp_balance, 1_000);

        let society_lct = db.get_lct(&f.society).unwrap().unwrap();
        assert_eq!(society_lct.entity_type, EntityType::Society);
    }

    #[test]
    fn join_admits_through_oracle_and_persists_decision() {
        let db = temp_db("join");
        let f = found_society(&db);
        let candidate = mint(&db, &KeyPair::generate(), EntityType::Device, 10);

        let mut ctx = TxCtx::new(&db, &block(200), 11);
        let verdict =
            SocietyKeeper::join(&mut ctx, &candidate, &f.society, &f.citizen_role.id).unwrap();
        ctx.commit().unwrap();
        assert_eq!(verdict, Verdict::Approve);

        let society = db.get_society(&f.society).unwrap().unwrap();
        assert!(society.member(&candidate.id).is_some());
        let decisions = db.iter_decisions(&f.society).unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].candidate, candidate.id);
    }

    #[test]
    fn closed_membership_denies_but_records_decision() {
        let db = temp_db("closed");
        let f = found_society(&db);

        // Close the constitution.
        let mut closed = open_constitution();
        closed.membership_open = false;
        let mut ctx = TxCtx::new(&db, &block(150), 10);
        SocietyKeeper::amend_constitution(&mut ctx, &f.founder, &f.society, closed).unwrap();
        ctx.commit().unwrap();

        let candidate = mint(&db, &KeyPair::generate(), EntityType::Device, 11);
        let mut ctx = TxCtx::new(&db, &block(200), 12);
        let verdict =
            SocietyKeeper::join(&mut ctx, &candidate, &f.society, &f.citizen_role.id).unwrap();
        ctx.commit().unwrap();
        assert!(matches!(verdict, Verdict::Deny { .. }));

        let society = db.get_society(&f.society).unwrap().unwrap();
        assert!(society.member(&candidate.id).is_none());
        // The denial is still on record.
        assert_eq!(db.iter_decisions(&f.society).unwrap().len(), 1);
    }

    #[test]
    fn dead_oracle_blocks_admission_and_amendment() {
        let db = temp_db("deadoracle");
        let f = found_society(&db);

        // Suspend the oracle seat.
        let mut ctx = TxCtx::new(&db, &block(150), 10);
        LctKeeper::set_status(&mut ctx, &f.oracle_role.id, AdminStatus::Suspended).unwrap();
        ctx.commit().unwrap();

        let candidate = mint(&db, &KeyPair::generate(), EntityType::Device, 11);
        let mut ctx = TxCtx::new(&db, &block(200), 12);
        let err = SocietyKeeper::join(&mut ctx, &candidate, &f.society, &f.citizen_role.id)
            .unwrap_err();
        assert!(matches!(err, Web4Error::OracleUnavailable(_)));

        let mut ctx = TxCtx::new(&db, &block(200), 13);
        let err = SocietyKeeper::amend_constitution(
            &mut ctx, &f.founder, &f.society, open_constitution(),
        )
        .unwrap_err();
        assert!(matches!(err, Web4Error::OracleUnavailable(_)));
    }

    #[test]
    fn last_treasury_holder_cannot_leave() {
        let db = temp_db("leave");
        let f = found_society(&db);

        let mut ctx = TxCtx::new(&db, &block(200), 10);
        let err = SocietyKeeper::leave(&mut ctx, &f.founder, &f.society).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        // An ordinary citizen leaves freely.
        let citizen = mint(&db, &KeyPair::generate(), EntityType::Device, 11);
        let mut ctx = TxCtx::new(&db, &block(210), 12);
        SocietyKeeper::join(&mut ctx, &citizen, &f.society, &f.citizen_role.id).unwrap();
        ctx.commit().unwrap();
        let mut ctx = TxCtx::new(&db, &block(220), 13);
        SocietyKeeper::leave(&mut ctx, &citizen, &f.society).unwrap();
        ctx.commit().unwrap();
        let society = db.get_society(&f.society).unwrap().unwrap();
        assert!(society.member(&citizen.id).is_none());
    }

    #[test]
    fn dispute_lifecycle() {
        let db = temp_db("dispute");
        let f = found_society(&db);
        let citizen = mint(&db, &KeyPair::generate(), EntityType::Device, 10);
        let mut ctx = TxCtx::new(&db, &block(200), 11);
        SocietyKeeper::join(&mut ctx, &citizen, &f.society, &f.citizen_role.id).unwrap();
        ctx.commit().unwrap();

        // Citizen files against the founder.
        let mut ctx = TxCtx::new(&db, &block(300), 12);
        let did = SocietyKeeper::file_dispute(
            &mut ctx,
            &citizen,
            &f.society,
            &f.founder.id,
            "withheld telemetry credits",
            vec![b"log-excerpt".to_vec()],
        )
        .unwrap();
        ctx.commit().unwrap();

        // Only the oracle seat may resolve.
        let mut ctx = TxCtx::new(&db, &block(310), 13);
        let err = SocietyKeeper::resolve_dispute(
            &mut ctx, &citizen, &f.society, &did,
            DisputeResolution::Dismiss { reason: "n/a".into() },
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        let mut ctx = TxCtx::new(&db, &block(320), 14);
        SocietyKeeper::resolve_dispute(
            &mut ctx, &f.oracle_role, &f.society, &did, DisputeResolution::Investigate,
        )
        .unwrap();
        ctx.commit().unwrap();
        let dispute = db.get_dispute(&f.society, &did).unwrap().unwrap();
        assert_eq!(dispute.status, DisputeStatus::Investigating);

        let mut ctx = TxCtx::new(&db, &block(330), 15);
        SocietyKeeper::resolve_dispute(
            &mut ctx, &f.oracle_role, &f.society, &did,
            DisputeResolution::Resolve { resolution: "credits restored".into() },
        )
        .unwrap();
        ctx.commit().unwrap();
        let dispute = db.get_dispute(&f.society, &did).unwrap().unwrap();
        assert!(matches!(dispute.status, DisputeStatus::Resolved { .. }));

        // Closed disputes stay closed.
        let mut ctx = TxCtx::new(&db, &block(340), 16);
        let err = SocietyKeeper::resolve_dispute(
            &mut ctx, &f.oracle_role, &f.society, &did, DisputeResolution::Investigate,
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }
}
