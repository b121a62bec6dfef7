use std::sync::Arc;

use tracing::info;

use web4_core::error::Web4Error;
use web4_core::lct::Lct;
use web4_core::params::ParamsUpdate;
use web4_core::transaction::{Msg, Transaction};
use web4_core::types::LctId;
use web4_crypto::verify_signature;
use web4_energy::EnergyKeeper;
use web4_genesis::genesis_society;
use web4_lct::LctKeeper;
use web4_pairing::PairingKeeper;
use web4_queue::QueueKeeper;
use web4_registry::RegistryKeeper;
use web4_society::SocietyKeeper;
use web4_state::{BlockCtx, Event, StateDb, TxCtx};
use web4_trust::TrustKeeper;

// ── Engine ────────────────────────────────────────────────────────────────────

/// The state transition engine.
///
/// Validates and applies transactions against the persistent state
/// database. Each `apply` call is atomic: either the whole message commits
/// or nothing does.
pub struct Engine {
    pub db: Arc<StateDb>,
}

impl Engine {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db }
    }

    /// Validate and apply one transaction. Returns the emitted events.
    pub fn apply(
        &self,
        tx: &Transaction,
        block: &BlockCtx,
        tx_index: u32,
    ) -> Result<Vec<Event>, Web4Error> {
        // ── Resolve the signer ────────────────────────────────────────────────
        // Unsigned or unbound callers are rejected before validation: the
        // signer must resolve to a stored LCT.
        let signer = self
            .db
            .get_lct(&tx.signer)?
            .ok_or_else(|| Web4Error::LctNotFound(tx.signer.to_string()))?;
        if !signer.is_active() {
            return Err(Web4Error::LctNotActive(tx.signer.to_string()));
        }

        // ── Signature ─────────────────────────────────────────────────────────
        verify_signature(&signer.signing_key, &tx.body_bytes(), &tx.signature)?;

        // ── Nonce ─────────────────────────────────────────────────────────────
        if tx.nonce != signer.nonce {
            return Err(Web4Error::InvalidNonce {
                expected: signer.nonce,
                got: tx.nonce,
            });
        }

        // ── Dispatch ──────────────────────────────────────────────────────────
        let mut ctx = TxCtx::new(&self.db, block, tx_index);
        self.dispatch(&mut ctx, &signer, &tx.msg)?;

        // Fold the nonce bump into any staged copy of the signer so a
        // handler's own write (bind, revoke) is not clobbered.
        match ctx.staged.lct_mut(&signer.id) {
            Some(staged) => staged.nonce = signer.nonce + 1,
            None => {
                let mut bumped = signer.clone();
                bumped.nonce += 1;
                ctx.staged.lcts.push(bumped);
            }
        }

        // ── Commit ────────────────────────────────────────────────────────────
        let events = ctx.commit()?;
        info!(signer = %tx.signer, module = tx.msg.module(), "applied transaction");
        Ok(events)
    }

    // ── Message dispatch ──────────────────────────────────────────────────────

    fn dispatch(&self, ctx: &mut TxCtx, signer: &Lct, msg: &Msg) -> Result<(), Web4Error> {
        match msg {
            // ── Registry ─────────────────────────────────────────────────────
            Msg::RegisterComponent { real_id, manufacturer_id, category, context } => {
                RegistryKeeper::register_component(
                    ctx, &signer.id, real_id, manufacturer_id, category, context,
                )
                .map(|_| ())
            }
            Msg::CreatePairingAuthorization { source_hash, target_hash, context, allowed } => {
                RegistryKeeper::create_pairing_authorization(
                    ctx, &signer.id, source_hash, target_hash, context, *allowed,
                )
            }
            Msg::CreateRevocationEvent { target_hash, reason } => {
                RegistryKeeper::create_revocation_event(ctx, &signer.id, target_hash, reason)
            }

            // ── LCT ──────────────────────────────────────────────────────────
            Msg::MintLct { entity_type, signing_key, agreement_key, binding_signature } => {
                LctKeeper::mint(
                    ctx,
                    &signer.id,
                    *entity_type,
                    *signing_key,
                    *agreement_key,
                    binding_signature.clone(),
                )
                .map(|_| ())
            }
            Msg::BindLct { lct_id, entity_id, proof } => {
                LctKeeper::bind(ctx, &signer.id, lct_id, entity_id, proof)
            }
            Msg::UpdateMrh { lct_id, set, add, remove } => {
                LctKeeper::update_mrh(ctx, &signer.id, lct_id, *set, add, remove)
            }
            Msg::WitnessLct { target, signature, confidence } => {
                LctKeeper::witness(ctx, signer, target, signature.clone(), *confidence)
            }
            Msg::IssueBirthCertificate {
                recipient, society, rights, responsibilities, initial_atp,
            } => LctKeeper::issue_birth_certificate(
                ctx,
                &signer.id,
                recipient,
                society,
                rights.clone(),
                responsibilities.clone(),
                *initial_atp,
            ),
            Msg::RevokeLct { lct_id, reason } => {
                LctKeeper::revoke(ctx, &signer.id, lct_id, reason)
            }
            Msg::SetLctStatus { lct_id, status } => {
                self.require_admin(&signer.id)?;
                LctKeeper::set_status(ctx, lct_id, *status)
            }

            // ── Pairing ──────────────────────────────────────────────────────
            Msg::InitiatePairing { target, validity_minutes, metadata } => {
                PairingKeeper::initiate(ctx, signer, target, *validity_minutes, metadata.clone())
                    .map(|_| ())
            }
            Msg::CompletePairing { session_id, response } => {
                PairingKeeper::complete(ctx, signer, session_id, response).map(|_| ())
            }
            Msg::RevokePairing { pairing_id, reason } => {
                PairingKeeper::revoke(ctx, signer, pairing_id, reason)
            }

            // ── Queue ────────────────────────────────────────────────────────
            Msg::QueuePairingRequest {
                target, request_type, priority, expiry_hours, proxy, metadata,
            } => QueueKeeper::queue_request(
                ctx,
                signer,
                target,
                *request_type,
                *priority,
                *expiry_hours,
                proxy.clone(),
                metadata.clone(),
            )
            .map(|_| ()),
            Msg::ProcessOfflineQueue { target, process_proxy, max_ops } => {
                QueueKeeper::process_offline_queue(ctx, signer, target, *process_proxy, *max_ops)
                    .map(|_| ())
            }
            Msg::CancelRequest { request_id, reason } => {
                QueueKeeper::cancel_request(ctx, signer, request_id, reason)
            }

            // ── Trust ────────────────────────────────────────────────────────
            Msg::CreateTensor { partner, kind } => {
                TrustKeeper::create_tensor(ctx, signer, partner, *kind).map(|_| ())
            }
            Msg::UpdateTensorScore { tensor_id, dimension, score_delta, evidence, confidence } => {
                TrustKeeper::update_tensor_score(
                    ctx,
                    signer,
                    tensor_id,
                    *dimension,
                    *score_delta,
                    evidence.clone(),
                    *confidence,
                )
                .map(|_| ())
            }
            Msg::AddTensorWitness {
                tensor_id, witnessed, statement, confidence, polarity, signature,
            } => TrustKeeper::add_tensor_witness(
                ctx,
                signer,
                tensor_id,
                witnessed,
                statement.clone(),
                *confidence,
                *polarity,
                signature.clone(),
            ),

            // ── Energy ───────────────────────────────────────────────────────
            Msg::MintAtp { society, amount } => {
                EnergyKeeper::mint_atp(ctx, signer, society, *amount)
            }
            Msg::DischargeAtp { society, amount, r6 } => {
                EnergyKeeper::discharge(ctx, signer, society, *amount, r6.clone()).map(|_| ())
            }
            Msg::RechargeAdp { adp_id, producer, work_proof } => {
                EnergyKeeper::recharge(ctx, signer, adp_id, producer, work_proof)
            }

            // ── Society ──────────────────────────────────────────────────────
            Msg::CreateSociety {
                name, constitution, signing_key, agreement_key, binding_signature,
                law_oracle, treasury_role, initial_pool,
            } => SocietyKeeper::create_society(
                ctx,
                signer,
                name,
                constitution.clone(),
                *signing_key,
                *agreement_key,
                binding_signature.clone(),
                law_oracle,
                treasury_role,
                *initial_pool,
            )
            .map(|_| ()),
            Msg::JoinSociety { society, role } => {
                SocietyKeeper::join(ctx, signer, society, role).map(|_| ())
            }
            Msg::AmendConstitution { society, constitution } => {
                SocietyKeeper::amend_constitution(ctx, signer, society, constitution.clone())
            }
            Msg::LeaveSociety { society } => SocietyKeeper::leave(ctx, signer, society),
            Msg::FileDispute { society, defendant, claim, evidence } => {
                SocietyKeeper::file_dispute(
                    ctx, signer, society, defendant, claim, evidence.clone(),
                )
                .map(|_| ())
            }
            Msg::ResolveDispute { society, dispute_id, resolution } => {
                SocietyKeeper::resolve_dispute(
                    ctx, signer, society, dispute_id, resolution.clone(),
                )
            }

            // ── Governance ───────────────────────────────────────────────────
            Msg::UpdateParams { update } => {
                self.require_admin(&signer.id)?;
                let bytes = match update {
                    ParamsUpdate::Pairing(p) => bincode::serialize(p),
                    ParamsUpdate::Queue(p) => bincode::serialize(p),
                    ParamsUpdate::Trust(p) => bincode::serialize(p),
                    ParamsUpdate::Energy(p) => bincode::serialize(p),
                }
                .map_err(|e| Web4Error::Serialization(e.to_string()))?;
                ctx.staged.params.push((update.module(), bytes));
                ctx.emit(Event::new("params_updated").attr("module", update.module()));
                Ok(())
            }
        }
    }

    /// Administrative messages require the founding society's treasury role.
    fn require_admin(&self, caller: &LctId) -> Result<(), Web4Error> {
        let society_id = genesis_society(&self.db)?
            .ok_or_else(|| Web4Error::Unauthorized("no founding society".into()))?;
        let society = self
            .db
            .get_society(&society_id)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society_id.to_string()))?;
        if !society.holds_treasury_role(caller) {
            return Err(Web4Error::Unauthorized(format!(
                "{caller} does not hold the founding treasury role"
            )));
        }
        Ok(())
    }

    // ── End of block ──────────────────────────────────────────────────────────

    /// Deterministic end-of-block work: the paginated queue-expiry sweep
    /// and the demurrage epoch sweep. Committed atomically like a message.
    pub fn end_block(&self, block: &BlockCtx) -> Result<Vec<Event>, Web4Error> {
        let mut ctx = TxCtx::new(&self.db, block, u32::MAX);
        QueueKeeper::sweep_expired(&mut ctx)?;
        EnergyKeeper::apply_demurrage(&mut ctx)?;
        ctx.commit()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use web4_core::energy::R6Action;
    use web4_core::error::ErrorCode;
    use web4_core::lct::{EntityType, LctStatus};
    use web4_core::params::{ApprovedProducer, EnergyParams, ParamsUpdate, QueueParams};
    use web4_core::queue::{Priority, RequestType};
    use web4_core::score::SCORE_SCALE;
    use web4_core::society::Constitution;
    use web4_core::tensor::{Polarity, TensorKind};
    use web4_core::transaction::AdminStatus;
    use web4_core::types::{AdpId, Ed25519Signature, SessionId, SocietyId, TensorId};
    use web4_crypto::KeyPair;
    use web4_genesis::{build, GenesisKeys, GenesisParams};
    use web4_pairing::PairingQuery;
    use web4_trust::TrustQuery;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn temp_db(name: &str) -> Arc<StateDb> {
        let dir = std::env::temp_dir().join(format!("web4_engine_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        Arc::new(StateDb::open(&dir).expect("open temp db"))
    }

    fn block(time: i64) -> BlockCtx {
        let mut hash = [21u8; 32];
        hash[0] = (time % 251) as u8;
        hash[1] = (time / 251 % 251) as u8;
        BlockCtx::new(1, time, hash)
    }

    struct Chain {
        engine: Engine,
        keys: GenesisKeys,
        society: SocietyId,
        producer: KeyPair,
    }

    fn setup(name: &str) -> Chain {
        let db = temp_db(name);
        let constitution = Constitution {
            principles: vec!["energy follows trust".into()],
            rights: vec!["energy.discharge".into()],
            responsibilities: vec!["report telemetry".into()],
            governance_rules: BTreeMap::new(),
            economic_rules: BTreeMap::new(),
            membership_open: true,
        };
        let (mut params, keys) =
            GenesisParams::generate(0, "pit-lane", constitution, 1_000);
        let producer = KeyPair::generate();
        params.approved_producers.push(ApprovedProducer {
            name: "solar".into(),
            key: producer.signing_public,
        });
        let society = build(&db, &params).unwrap();
        Chain { engine: Engine::new(db), keys, society, producer }
    }

    /// Sign and build a transaction for `kp` at its current on-chain nonce.
    fn make_tx(chain: &Chain, kp: &KeyPair, msg: Msg) -> Transaction {
        let nonce = chain
            .engine
            .db
            .get_lct(&kp.lct_id)
            .unwrap()
            .map(|l| l.nonce)
            .unwrap_or(0);
        let body = Transaction::signing_bytes(nonce, &kp.lct_id, &msg);
        Transaction {
            nonce,
            signer: kp.lct_id.clone(),
            msg,
            signature: kp.sign(&body),
        }
    }

    fn apply(chain: &Chain, kp: &KeyPair, msg: Msg, time: i64, tx_index: u32) -> Vec<Event> {
        let tx = make_tx(chain, kp, msg);
        chain.engine.apply(&tx, &block(time), tx_index).unwrap()
    }

    fn apply_err(chain: &Chain, kp: &KeyPair, msg: Msg, time: i64, tx_index: u32) -> Web4Error {
        let tx = make_tx(chain, kp, msg);
        chain.engine.apply(&tx, &block(time), tx_index).unwrap_err()
    }

    fn mint_device(chain: &Chain, kp: &KeyPair, time: i64, tx_index: u32) {
        apply(
            chain,
            &chain.keys.founder,
            Msg::MintLct {
                entity_type: EntityType::Device,
                signing_key: kp.signing_public,
                agreement_key: kp.agreement_public,
                binding_signature: kp.binding_signature(),
            },
            time,
            tx_index,
        );
    }

    fn complete_pairing_msg(chain: &Chain, kp: &KeyPair, sid: &SessionId) -> Msg {
        let session = chain.engine.db.get_session(sid).unwrap().unwrap();
        let challenge = session.challenge_for(&kp.lct_id).unwrap();
        Msg::CompletePairing {
            session_id: sid.clone(),
            response: kp.sign(&challenge.challenge),
        }
    }

    fn session_id_from(events: &[Event]) -> SessionId {
        SessionId(
            events
                .iter()
                .find(|e| e.kind == "pairing_initiated")
                .and_then(|e| e.get("session_id"))
                .expect("pairing_initiated event")
                .to_string(),
        )
    }

    fn r6_for(caller: &web4_core::types::LctId, amount: u128) -> R6Action {
        R6Action {
            rules: "battery-discharge-v1".into(),
            roles: format!("operator={caller}"),
            request: "drive-stint".into(),
            reference: "telemetry-window-42".into(),
            resource: amount.to_string(),
            result: "pack-output".into(),
        }
    }

    // ── Envelope validation ───────────────────────────────────────────────────

    #[test]
    fn unknown_signer_rejected() {
        let chain = setup("unknown_signer");
        let stranger = KeyPair::generate();
        let err = apply_err(
            &chain,
            &stranger,
            Msg::RegisterComponent {
                real_id: "SN-1".into(),
                manufacturer_id: "MFR".into(),
                category: "battery".into(),
                context: "".into(),
            },
            10,
            0,
        );
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn bad_signature_rejected() {
        let chain = setup("bad_sig");
        let msg = Msg::RegisterComponent {
            real_id: "SN-1".into(),
            manufacturer_id: "MFR".into(),
            category: "battery".into(),
            context: "".into(),
        };
        let mut tx = make_tx(&chain, &chain.keys.founder, msg);
        tx.signature = Ed25519Signature(vec![0; 64]);
        let err = chain.engine.apply(&tx, &block(10), 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SignatureInvalid);
    }

    #[test]
    fn nonce_replay_rejected() {
        let chain = setup("replay");
        let msg = Msg::RegisterComponent {
            real_id: "SN-1".into(),
            manufacturer_id: "MFR".into(),
            category: "battery".into(),
            context: "".into(),
        };
        let tx = make_tx(&chain, &chain.keys.founder, msg);
        chain.engine.apply(&tx, &block(10), 0).unwrap();
        // Replaying the identical transaction fails the nonce check.
        let err = chain.engine.apply(&tx, &block(11), 1).unwrap_err();
        assert!(matches!(err, Web4Error::InvalidNonce { expected: 1, got: 0 }));
    }

    #[test]
    fn failed_message_stages_nothing() {
        let chain = setup("atomicity");
        // Discharge with a bad R6: the pool must be untouched and the
        // nonce must not advance.
        let err = apply_err(
            &chain,
            &chain.keys.founder,
            Msg::DischargeAtp {
                society: chain.society.clone(),
                amount: 300,
                r6: r6_for(&chain.keys.founder.lct_id, 999),
            },
            10,
            0,
        );
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        let pool = chain.engine.db.get_pool(&chain.society).unwrap().unwrap();
        assert_eq!(pool.atp_balance, 1_000);
        let founder = chain.engine.db.get_lct(&chain.keys.founder.lct_id).unwrap().unwrap();
        assert_eq!(founder.nonce, 0);
    }

    // ── Identity lifecycle ────────────────────────────────────────────────────

    #[test]
    fn mint_bind_revoke_lifecycle() {
        let chain = setup("lifecycle");
        let device = KeyPair::generate();

        let events = apply(
            &chain,
            &chain.keys.founder,
            Msg::MintLct {
                entity_type: EntityType::Device,
                signing_key: device.signing_public,
                agreement_key: device.agreement_public,
                binding_signature: device.binding_signature(),
            },
            10,
            0,
        );
        assert!(events.iter().any(|e| e.kind == "lct_minted"));
        let lct = chain.engine.db.get_lct(&device.lct_id).unwrap().unwrap();
        assert_eq!(lct.status, LctStatus::Active);

        // Bind to "dev-001".
        apply(
            &chain,
            &device,
            Msg::BindLct {
                lct_id: device.lct_id.clone(),
                entity_id: "dev-001".into(),
                proof: vec![],
            },
            20,
            1,
        );
        let lct = chain.engine.db.get_lct(&device.lct_id).unwrap().unwrap();
        assert_eq!(lct.bound_entity.as_deref(), Some("dev-001"));

        // Bind again ⇒ AlreadyBound.
        let err = apply_err(
            &chain,
            &device,
            Msg::BindLct {
                lct_id: device.lct_id.clone(),
                entity_id: "dev-002".into(),
                proof: vec![],
            },
            30,
            2,
        );
        assert_eq!(err.code(), ErrorCode::AlreadyBound);

        // Revoke ⇒ revoked; the device can no longer act.
        apply(
            &chain,
            &device,
            Msg::RevokeLct { lct_id: device.lct_id.clone(), reason: "retired".into() },
            40,
            3,
        );
        let lct = chain.engine.db.get_lct(&device.lct_id).unwrap().unwrap();
        assert!(matches!(lct.status, LctStatus::Revoked { .. }));
        let err = apply_err(
            &chain,
            &device,
            Msg::BindLct {
                lct_id: device.lct_id.clone(),
                entity_id: "dev-003".into(),
                proof: vec![],
            },
            50,
            4,
        );
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        // Re-minting the same keys ⇒ AlreadyExists.
        let err = apply_err(
            &chain,
            &chain.keys.founder,
            Msg::MintLct {
                entity_type: EntityType::Device,
                signing_key: device.signing_public,
                agreement_key: device.agreement_public,
                binding_signature: device.binding_signature(),
            },
            60,
            5,
        );
        assert_eq!(err.code(), ErrorCode::AlreadyExists);
    }

    // ── Pairing handshake ─────────────────────────────────────────────────────

    #[test]
    fn full_pairing_handshake() {
        let chain = setup("handshake");
        let (a, b) = (KeyPair::generate(), KeyPair::generate());
        mint_device(&chain, &a, 0, 0);
        mint_device(&chain, &b, 0, 1);

        let events = apply(
            &chain,
            &a,
            Msg::InitiatePairing {
                target: b.lct_id.clone(),
                validity_minutes: Some(30),
                metadata: BTreeMap::new(),
            },
            0,
            2,
        );
        let sid = session_id_from(&events);

        // t=10m: A verifies, still pending.
        let msg = complete_pairing_msg(&chain, &a, &sid);
        let events = apply(&chain, &a, msg, 600, 3);
        assert!(events.iter().any(|e| e.kind == "pairing_challenge_verified"));

        // t=20m: B completes.
        let msg = complete_pairing_msg(&chain, &b, &sid);
        let events = apply(&chain, &b, msg, 1_200, 4);
        assert!(events.iter().any(|e| e.kind == "pairing_completed"));

        let pairing = chain.engine.db.get_active_pairing(&a.lct_id, &b.lct_id).unwrap().unwrap();
        assert!(pairing.is_active());
        let mrh = chain.engine.db.get_mrh(&a.lct_id).unwrap().unwrap();
        assert!(mrh.paired.contains(&b.lct_id));

        // t=25m: a further Complete fails.
        let msg = Msg::CompletePairing {
            session_id: sid.clone(),
            response: a.sign(b"anything"),
        };
        let err = apply_err(&chain, &a, msg, 1_500, 5);
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn expired_session_never_pairs() {
        let chain = setup("expired_session");
        let (a, b) = (KeyPair::generate(), KeyPair::generate());
        mint_device(&chain, &a, 0, 0);
        mint_device(&chain, &b, 0, 1);

        let events = apply(
            &chain,
            &a,
            Msg::InitiatePairing {
                target: b.lct_id.clone(),
                validity_minutes: Some(10),
                metadata: BTreeMap::new(),
            },
            0,
            2,
        );
        let sid = session_id_from(&events);

        let msg = complete_pairing_msg(&chain, &a, &sid);
        apply(&chain, &a, msg, 300, 3);

        // t=11m: expired.
        let msg = complete_pairing_msg(&chain, &b, &sid);
        let err = apply_err(&chain, &b, msg, 660, 4);
        assert_eq!(err.code(), ErrorCode::Expired);

        assert!(chain.engine.db.get_active_pairing(&a.lct_id, &b.lct_id).unwrap().is_none());
        let mrh = chain.engine.db.get_mrh(&a.lct_id).unwrap().unwrap();
        assert!(mrh.paired.is_empty());

        // The query layer reads the session as expired.
        let query = PairingQuery::new(&chain.engine.db);
        let session = query.get_session(&sid, 700).unwrap();
        assert!(matches!(
            session.status,
            web4_core::pairing::SessionStatus::Expired { .. }
        ));
    }

    // ── Queue ordering ────────────────────────────────────────────────────────

    #[test]
    fn queued_requests_drain_by_priority() {
        let chain = setup("queue_order");
        let (a, b, c, target) = (
            KeyPair::generate(),
            KeyPair::generate(),
            KeyPair::generate(),
            KeyPair::generate(),
        );
        mint_device(&chain, &a, 0, 0);
        mint_device(&chain, &b, 0, 1);
        mint_device(&chain, &c, 0, 2);
        mint_device(&chain, &target, 0, 3);

        for (kp, priority, time, index) in [
            (&a, Priority::Low, 0_i64, 4_u32),
            (&b, Priority::Critical, 1, 5),
            (&c, Priority::High, 2, 6),
        ] {
            apply(
                &chain,
                kp,
                Msg::QueuePairingRequest {
                    target: target.lct_id.clone(),
                    request_type: RequestType::Standard,
                    priority,
                    expiry_hours: Some(24),
                    proxy: None,
                    metadata: BTreeMap::new(),
                },
                time,
                index,
            );
        }

        let events = apply(
            &chain,
            &target,
            Msg::ProcessOfflineQueue {
                target: target.lct_id.clone(),
                process_proxy: false,
                max_ops: 3,
            },
            10,
            7,
        );
        let processed = events.iter().find(|e| e.kind == "queue_processed").unwrap();
        assert_eq!(processed.get("completed"), Some("3"));

        // All three ended completed, and three pairing sessions were
        // initiated in priority order (critical, high, low).
        let initiations: Vec<_> = events
            .iter()
            .filter(|e| e.kind == "pairing_initiated")
            .filter_map(|e| e.get("initiator"))
            .collect();
        assert_eq!(
            initiations,
            vec![b.lct_id.as_str(), c.lct_id.as_str(), a.lct_id.as_str()]
        );
    }

    // ── Energy cycle ──────────────────────────────────────────────────────────

    #[test]
    fn discharge_then_recharge_restores_pool() {
        let chain = setup("energy_cycle");
        let founder = &chain.keys.founder;

        let events = apply(
            &chain,
            founder,
            Msg::DischargeAtp {
                society: chain.society.clone(),
                amount: 300,
                r6: r6_for(&founder.lct_id, 300),
            },
            10,
            0,
        );
        let adp = AdpId(
            events
                .iter()
                .find(|e| e.kind == "atp_discharged")
                .and_then(|e| e.get("adp_id"))
                .unwrap()
                .to_string(),
        );
        let pool = chain.engine.db.get_pool(&chain.society).unwrap().unwrap();
        assert_eq!((pool.atp_balance, pool.adp_balance), (700, 300));

        let proof = chain
            .producer
            .sign(&web4_energy::work_proof_message(&adp, 300));
        apply(
            &chain,
            founder,
            Msg::RechargeAdp {
                adp_id: adp.clone(),
                producer: "solar".into(),
                work_proof: proof.clone(),
            },
            20,
            1,
        );
        let pool = chain.engine.db.get_pool(&chain.society).unwrap().unwrap();
        assert_eq!((pool.atp_balance, pool.adp_balance), (1_000, 0));

        // The token is consumed: a second recharge is NotFound.
        let err = apply_err(
            &chain,
            founder,
            Msg::RechargeAdp {
                adp_id: adp,
                producer: "solar".into(),
                work_proof: proof,
            },
            30,
            2,
        );
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    // ── Trust decay and witnessing ────────────────────────────────────────────

    #[test]
    fn trust_decays_and_witness_lifts() {
        let chain = setup("trust_decay");
        let (a, b, w) = (KeyPair::generate(), KeyPair::generate(), KeyPair::generate());
        mint_device(&chain, &a, 0, 0);
        mint_device(&chain, &b, 0, 1);
        mint_device(&chain, &w, 0, 2);

        let events = apply(
            &chain,
            &a,
            Msg::CreateTensor { partner: b.lct_id.clone(), kind: TensorKind::T3 },
            0,
            3,
        );
        let tid = TensorId(
            events
                .iter()
                .find(|e| e.kind == "tensor_created")
                .and_then(|e| e.get("tensor_id"))
                .unwrap()
                .to_string(),
        );

        let query = TrustQuery::new(&chain.engine.db);
        let (fresh, _, _) = query.get_relationship_tensor(&tid, false, 0).unwrap();
        let (aged, _, _) = query
            .get_relationship_tensor(&tid, false, 10 * 86_400)
            .unwrap();
        // Ten days of 0.999 decay shave the derived score.
        assert!(aged.overall_trust_score < fresh.overall_trust_score);

        // A signed positive witness lifts it back.
        let statement = b"observed clean telemetry".to_vec();
        let mut message = Vec::new();
        message.extend_from_slice(web4_core::constants::TENSOR_WITNESS_DOMAIN);
        message.extend_from_slice(tid.as_bytes());
        message.extend_from_slice(a.lct_id.as_bytes());
        message.push(Polarity::Positive.as_byte());
        message.extend_from_slice(&statement);
        apply(
            &chain,
            &w,
            Msg::AddTensorWitness {
                tensor_id: tid.clone(),
                witnessed: a.lct_id.clone(),
                statement,
                confidence: SCORE_SCALE,
                polarity: Polarity::Positive,
                signature: w.sign(&message),
            },
            10 * 86_400,
            4,
        );
        let (witnessed, _, _) = query
            .get_relationship_tensor(&tid, false, 10 * 86_400)
            .unwrap();
        assert!(witnessed.overall_trust_score > aged.overall_trust_score);
    }

    // ── Birth certificates ────────────────────────────────────────────────────

    #[test]
    fn birth_certificate_is_treasury_gated() {
        let chain = setup("birthcert");
        let device = KeyPair::generate();
        mint_device(&chain, &device, 0, 0);

        // The device cannot issue its own certificate.
        let err = apply_err(
            &chain,
            &device,
            Msg::IssueBirthCertificate {
                recipient: device.lct_id.clone(),
                society: chain.society.clone(),
                rights: vec!["energy.discharge".into()],
                responsibilities: vec![],
                initial_atp: 50,
            },
            10,
            1,
        );
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        // The founding treasury can.
        apply(
            &chain,
            &chain.keys.founder,
            Msg::IssueBirthCertificate {
                recipient: device.lct_id.clone(),
                society: chain.society.clone(),
                rights: vec!["energy.discharge".into()],
                responsibilities: vec!["report telemetry".into()],
                initial_atp: 50,
            },
            20,
            2,
        );
        let lct = chain.engine.db.get_lct(&device.lct_id).unwrap().unwrap();
        let cert = lct.birth_certificate.unwrap();
        assert_eq!(cert.society, chain.society);
        assert_eq!(cert.initial_atp, 50);

        // One certificate per LCT.
        let err = apply_err(
            &chain,
            &chain.keys.founder,
            Msg::IssueBirthCertificate {
                recipient: device.lct_id.clone(),
                society: chain.society.clone(),
                rights: vec![],
                responsibilities: vec![],
                initial_atp: 0,
            },
            30,
            3,
        );
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    // ── Administration and sweeps ─────────────────────────────────────────────

    #[test]
    fn admin_messages_are_treasury_gated() {
        let chain = setup("admin");
        let device = KeyPair::generate();
        mint_device(&chain, &device, 0, 0);

        // The device cannot suspend LCTs or update params.
        let err = apply_err(
            &chain,
            &device,
            Msg::SetLctStatus { lct_id: device.lct_id.clone(), status: AdminStatus::Suspended },
            10,
            1,
        );
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        // The founding treasury can.
        apply(
            &chain,
            &chain.keys.founder,
            Msg::SetLctStatus { lct_id: device.lct_id.clone(), status: AdminStatus::Suspended },
            20,
            2,
        );
        let lct = chain.engine.db.get_lct(&device.lct_id).unwrap().unwrap();
        assert!(matches!(lct.status, LctStatus::Suspended { .. }));

        // Suspended LCTs cannot sign transactions.
        let err = apply_err(
            &chain,
            &device,
            Msg::CreateTensor {
                partner: chain.keys.founder.lct_id.clone(),
                kind: TensorKind::T3,
            },
            30,
            3,
        );
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        // Params update round-trips through governance.
        let mut queue_params = QueueParams::default();
        queue_params.max_retry_attempts = 5;
        apply(
            &chain,
            &chain.keys.founder,
            Msg::UpdateParams { update: ParamsUpdate::Queue(queue_params.clone()) },
            40,
            4,
        );
        let stored: QueueParams = chain.engine.db.get_params("queue").unwrap();
        assert_eq!(stored, queue_params);
    }

    #[test]
    fn end_block_runs_demurrage_and_expiry() {
        let chain = setup("endblock");
        let (a, target) = (KeyPair::generate(), KeyPair::generate());
        mint_device(&chain, &a, 0, 0);
        mint_device(&chain, &target, 0, 1);

        apply(
            &chain,
            &a,
            Msg::QueuePairingRequest {
                target: target.lct_id.clone(),
                request_type: RequestType::Standard,
                priority: Priority::Normal,
                expiry_hours: Some(1),
                proxy: None,
                metadata: BTreeMap::new(),
            },
            0,
            2,
        );

        let epoch = EnergyParams::default().demurrage_epoch_secs;
        let events = chain.engine.end_block(&block(epoch)).unwrap();
        assert!(events.iter().any(|e| e.kind == "request_expired"));
        assert!(events.iter().any(|e| e.kind == "demurrage_applied"));

        // 1% of 1000 burned.
        let pool = chain.engine.db.get_pool(&chain.society).unwrap().unwrap();
        assert_eq!(pool.atp_balance, 990);
    }
}
