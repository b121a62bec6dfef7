//! Staged mutations: every keeper stages its writes here while a message is
//! being validated and applied. Nothing touches the database until the whole
//! message succeeds; on error the buffer is dropped and no partial effects
//! survive.

use web4_core::energy::{AdpToken, AtpToken, EnergyPool};
use web4_core::error::Web4Error;
use web4_core::lct::{Lct, Mrh, WitnessRecord};
use web4_core::pairing::{ActivePairing, PairingSession};
use web4_core::queue::{OfflineOperation, PairingRequest};
use web4_core::registry::{ComponentRecord, PairingAuthorization, RevocationEvent};
use web4_core::society::{Dispute, LawDecision, Society};
use web4_core::tensor::{RelationshipTrustTensor, TensorEntry, TensorWitness};
use web4_core::types::{AdpId, LctId, RequestId};

use crate::db::StateDb;

/// All state changes staged by a message handler before atomic commit.
#[derive(Default)]
pub struct Staged {
    pub lcts: Vec<Lct>,
    pub mrhs: Vec<Mrh>,
    pub witness_records: Vec<WitnessRecord>,
    pub sessions: Vec<PairingSession>,
    pub active_pairings: Vec<ActivePairing>,
    pub requests: Vec<PairingRequest>,
    pub offline_ops: Vec<OfflineOperation>,
    /// (index key, request id) insertions into the sub-queue index.
    pub queue_index_puts: Vec<(Vec<u8>, RequestId)>,
    pub queue_index_dels: Vec<Vec<u8>>,
    pub tensors: Vec<RelationshipTrustTensor>,
    /// (entry, sequence) pairs; the sequence orders the append-only log.
    pub tensor_entries: Vec<(TensorEntry, u64)>,
    pub tensor_witnesses: Vec<TensorWitness>,
    pub pools: Vec<EnergyPool>,
    pub atp_tokens: Vec<AtpToken>,
    pub adp_tokens: Vec<AdpToken>,
    /// Tokens consumed by recharge; removed on commit.
    pub adp_consumed: Vec<AdpId>,
    pub societies: Vec<Society>,
    pub decisions: Vec<LawDecision>,
    pub disputes: Vec<Dispute>,
    pub components: Vec<ComponentRecord>,
    pub pairing_auths: Vec<PairingAuthorization>,
    pub revocations: Vec<RevocationEvent>,
    /// (module, serialized record) params replacements.
    pub params: Vec<(&'static str, Vec<u8>)>,
    /// (meta key, value) writes; None removes the key.
    pub meta: Vec<(String, Option<Vec<u8>>)>,
}

impl Staged {
    /// A staged LCT write for `id`, if any. Lets the engine fold its nonce
    /// bump into a copy a handler already modified instead of clobbering it.
    pub fn lct_mut(&mut self, id: &LctId) -> Option<&mut Lct> {
        self.lcts.iter_mut().find(|l| l.id == *id)
    }

    /// Apply every staged write to the database. Writes are ordered so that
    /// later stages of the same record overwrite earlier ones.
    pub fn commit(self, db: &StateDb) -> Result<(), Web4Error> {
        for lct in &self.lcts {
            db.put_lct(lct)?;
        }
        for mrh in &self.mrhs {
            db.put_mrh(mrh)?;
        }
        for record in &self.witness_records {
            db.put_witness_record(record)?;
        }
        for session in &self.sessions {
            db.put_session(session)?;
        }
        for pairing in &self.active_pairings {
            db.put_active_pairing(pairing)?;
        }
        for request in &self.requests {
            db.put_request(request)?;
        }
        for op in &self.offline_ops {
            db.put_offline_op(op)?;
        }
        for key in &self.queue_index_dels {
            db.remove_queue_index(key)?;
        }
        for (key, id) in &self.queue_index_puts {
            db.put_queue_index(key, id)?;
        }
        for tensor in &self.tensors {
            db.put_tensor(tensor)?;
        }
        for (entry, seq) in &self.tensor_entries {
            db.put_tensor_entry(entry, *seq)?;
        }
        for witness in &self.tensor_witnesses {
            db.put_tensor_witness(witness)?;
        }
        for pool in &self.pools {
            db.put_pool(pool)?;
        }
        for token in &self.atp_tokens {
            db.put_atp_token(token)?;
        }
        for token in &self.adp_tokens {
            db.put_adp_token(token)?;
        }
        for id in &self.adp_consumed {
            db.remove_adp_token(id)?;
        }
        for society in &self.societies {
            db.put_society(society)?;
        }
        for decision in &self.decisions {
            db.put_decision(decision)?;
        }
        for dispute in &self.disputes {
            db.put_dispute(dispute)?;
        }
        for component in &self.components {
            db.put_component(component)?;
        }
        for auth in &self.pairing_auths {
            db.put_pairing_auth(auth)?;
        }
        for revocation in &self.revocations {
            db.put_revocation(revocation)?;
        }
        for (module, bytes) in &self.params {
            db.put_params_raw(module, bytes)?;
        }
        for (key, value) in &self.meta {
            match value {
                Some(bytes) => db.put_meta(key, bytes)?,
                None => db.remove_meta(key)?,
            }
        }
        Ok(())
    }
}
