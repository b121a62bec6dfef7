use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use web4_core::energy::{AdpToken, AtpToken, EnergyPool};
use web4_core::error::Web4Error;
use web4_core::lct::{Lct, Mrh, WitnessRecord};
use web4_core::pairing::ActivePairing;
use web4_core::queue::{OfflineOperation, PairingRequest, SubQueue};
use web4_core::registry::{ComponentRecord, PairingAuthorization, RevocationEvent};
use web4_core::society::{Dispute, LawDecision, Society};
use web4_core::tensor::{RelationshipTrustTensor, TensorEntry, TensorWitness};
use web4_core::types::{
    AdpId, AtpId, ComponentHash, LctId, PairingId, RequestId, SessionId, SocietyId, TensorId,
};

/// Separator byte between components of composite keys. Id strings are
/// ASCII, so 0xff never appears inside them.
pub const KEY_SEP: u8 = 0xff;

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees, one per logical prefix:
///   lcts             — lct id bytes                  → bincode(Lct)
///   mrh              — lct id bytes                  → bincode(Mrh)
///   witness_records  — target ‖ SEP ‖ witness ‖ t_be → bincode(WitnessRecord)
///   sessions         — session id bytes              → bincode(PairingSession)
///   active_pairings  — a ‖ SEP ‖ b (a < b)           → bincode(ActivePairing)
///   pairing_index    — pairing id bytes              → pair key bytes
///   requests         — request id bytes              → bincode(PairingRequest)
///   queue_index      — composite sub-queue key       → request id bytes
///   offline_ops      — component id bytes            → bincode(OfflineOperation)
///   tensors          — tensor id bytes               → bincode(RelationshipTrustTensor)
///   tensor_entries   — tensor ‖ SEP ‖ seq_be         → bincode(TensorEntry)
///   tensor_witnesses — tensor ‖ SEP ‖ witness id     → bincode(TensorWitness)
///   pools            — society id bytes              → bincode(EnergyPool)
///   atp_tokens       — atp id bytes                  → bincode(AtpToken)
///   adp_tokens       — adp id bytes                  → bincode(AdpToken)
///   societies        — society id bytes              → bincode(Society)
///   decisions        — society ‖ SEP ‖ candidate ‖ t → bincode(LawDecision)
///   disputes         — society ‖ SEP ‖ dispute id    → bincode(Dispute)
///   components       — component hash bytes          → bincode(ComponentRecord)
///   pairing_auths    — source ‖ SEP ‖ target         → bincode(PairingAuthorization)
///   revocations      — target ‖ SEP ‖ t_be           → bincode(RevocationEvent)
///   params           — module name bytes             → bincode(params record)
///   meta             — utf8 key bytes                → raw bytes (cursors)
pub struct StateDb {
    _db: sled::Db,
    lcts: sled::Tree,
    mrh: sled::Tree,
    witness_records: sled::Tree,
    sessions: sled::Tree,
    active_pairings: sled::Tree,
    pairing_index: sled::Tree,
    requests: sled::Tree,
    queue_index: sled::Tree,
    offline_ops: sled::Tree,
    tensors: sled::Tree,
    tensor_entries: sled::Tree,
    tensor_witnesses: sled::Tree,
    pools: sled::Tree,
    atp_tokens: sled::Tree,
    adp_tokens: sled::Tree,
    societies: sled::Tree,
    decisions: sled::Tree,
    disputes: sled::Tree,
    components: sled::Tree,
    pairing_auths: sled::Tree,
    revocations: sled::Tree,
    params: sled::Tree,
    meta: sled::Tree,
}

fn storage_err(e: sled::Error) -> Web4Error {
    Web4Error::Storage(e.to_string())
}

fn ser_err(e: bincode::Error) -> Web4Error {
    Web4Error::Serialization(e.to_string())
}

/// a ‖ SEP ‖ b composite key.
pub fn composite_key(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(a.len() + 1 + b.len());
    key.extend_from_slice(a);
    key.push(KEY_SEP);
    key.extend_from_slice(b);
    key
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Web4Error> {
        let db = sled::open(path).map_err(storage_err)?;
        let tree = |name: &str| db.open_tree(name).map_err(storage_err);
        Ok(Self {
            lcts: tree("lcts")?,
            mrh: tree("mrh")?,
            witness_records: tree("witness_records")?,
            sessions: tree("sessions")?,
            active_pairings: tree("active_pairings")?,
            pairing_index: tree("pairing_index")?,
            requests: tree("requests")?,
            queue_index: tree("queue_index")?,
            offline_ops: tree("offline_ops")?,
            tensors: tree("tensors")?,
            tensor_entries: tree("tensor_entries")?,
            tensor_witnesses: tree("tensor_witnesses")?,
            pools: tree("pools")?,
            atp_tokens: tree("atp_tokens")?,
            adp_tokens: tree("adp_tokens")?,
            societies: tree("societies")?,
            decisions: tree("decisions")?,
            disputes: tree("disputes")?,
            components: tree("components")?,
            pairing_auths: tree("pairing_auths")?,
            revocations: tree("revocations")?,
            params: tree("params")?,
            meta: tree("meta")?,
            _db: db,
        })
    }

    // ── Generic helpers ──────────────────────────────────────────────────────

    fn get<T: DeserializeOwned>(tree: &sled::Tree, key: &[u8]) -> Result<Option<T>, Web4Error> {
        match tree.get(key).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(tree: &sled::Tree, key: &[u8], value: &T) -> Result<(), Web4Error> {
        let bytes = bincode::serialize(value).map_err(ser_err)?;
        tree.insert(key, bytes).map_err(storage_err)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(tree: &sled::Tree, prefix: &[u8]) -> Result<Vec<T>, Web4Error> {
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(ser_err)?);
        }
        Ok(out)
    }

    // ── LCTs ─────────────────────────────────────────────────────────────────

    pub fn get_lct(&self, id: &LctId) -> Result<Option<Lct>, Web4Error> {
        Self::get(&self.lcts, id.as_bytes())
    }

    pub fn put_lct(&self, lct: &Lct) -> Result<(), Web4Error> {
        Self::put(&self.lcts, lct.id.as_bytes(), lct)
    }

    pub fn lct_exists(&self, id: &LctId) -> bool {
        self.lcts.contains_key(id.as_bytes()).unwrap_or(false)
    }

    /// Every LCT in the DB. Callers filter/paginate.
    pub fn iter_lcts(&self) -> Result<Vec<Lct>, Web4Error> {
        Self::scan(&self.lcts, &[])
    }

    pub fn get_mrh(&self, id: &LctId) -> Result<Option<Mrh>, Web4Error> {
        Self::get(&self.mrh, id.as_bytes())
    }

    pub fn put_mrh(&self, mrh: &Mrh) -> Result<(), Web4Error> {
        Self::put(&self.mrh, mrh.lct_id.as_bytes(), mrh)
    }

    pub fn put_witness_record(&self, record: &WitnessRecord) -> Result<(), Web4Error> {
        let key = composite_key(
            record.target.as_bytes(),
            &composite_key(record.witness.as_bytes(), &record.witnessed_at.to_be_bytes()),
        );
        Self::put(&self.witness_records, &key, record)
    }

    pub fn iter_witness_records(&self, target: &LctId) -> Result<Vec<WitnessRecord>, Web4Error> {
        let mut prefix = target.as_bytes().to_vec();
        prefix.push(KEY_SEP);
        Self::scan(&self.witness_records, &prefix)
    }

    // ── Pairing sessions ─────────────────────────────────────────────────────

    pub fn get_session(
        &self,
        id: &SessionId,
    ) -> Result<Option<web4_core::pairing::PairingSession>, Web4Error> {
        Self::get(&self.sessions, id.as_bytes())
    }

    pub fn put_session(
        &self,
        session: &web4_core::pairing::PairingSession,
    ) -> Result<(), Web4Error> {
        Self::put(&self.sessions, session.session_id.as_bytes(), session)
    }

    // ── Active pairings ──────────────────────────────────────────────────────

    /// Key for the canonical (a < b) unordered pair.
    pub fn pair_key(a: &LctId, b: &LctId) -> Vec<u8> {
        let (x, y) = ActivePairing::canonical_pair(a, b);
        composite_key(x.as_bytes(), y.as_bytes())
    }

    pub fn get_active_pairing(
        &self,
        a: &LctId,
        b: &LctId,
    ) -> Result<Option<ActivePairing>, Web4Error> {
        Self::get(&self.active_pairings, &Self::pair_key(a, b))
    }

    pub fn put_active_pairing(&self, pairing: &ActivePairing) -> Result<(), Web4Error> {
        let key = Self::pair_key(&pairing.component_a, &pairing.component_b);
        Self::put(&self.active_pairings, &key, pairing)?;
        self.pairing_index
            .insert(pairing.pairing_id.as_bytes(), key)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_pairing_by_id(&self, id: &PairingId) -> Result<Option<ActivePairing>, Web4Error> {
        match self.pairing_index.get(id.as_bytes()).map_err(storage_err)? {
            Some(key) => {
                // The pair slot may have been re-paired under a newer id;
                // a stale index entry resolves to nothing.
                let pairing: Option<ActivePairing> = Self::get(&self.active_pairings, &key)?;
                Ok(pairing.filter(|p| p.pairing_id == *id))
            }
            None => Ok(None),
        }
    }

    pub fn iter_active_pairings(&self) -> Result<Vec<ActivePairing>, Web4Error> {
        Self::scan(&self.active_pairings, &[])
    }

    /// Count of pairings in status active that involve `lct`.
    pub fn count_active_pairings_for(&self, lct: &LctId) -> Result<u32, Web4Error> {
        let mut count = 0;
        for pairing in self.iter_active_pairings()? {
            if pairing.is_active() && pairing.involves(lct) {
                count += 1;
            }
        }
        Ok(count)
    }

    // ── Queue ────────────────────────────────────────────────────────────────

    pub fn get_request(&self, id: &RequestId) -> Result<Option<PairingRequest>, Web4Error> {
        Self::get(&self.requests, id.as_bytes())
    }

    pub fn put_request(&self, request: &PairingRequest) -> Result<(), Web4Error> {
        Self::put(&self.requests, request.request_id.as_bytes(), request)
    }

    pub fn put_queue_index(&self, key: &[u8], request_id: &RequestId) -> Result<(), Web4Error> {
        self.queue_index
            .insert(key, request_id.as_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn remove_queue_index(&self, key: &[u8]) -> Result<(), Web4Error> {
        self.queue_index.remove(key).map_err(storage_err)?;
        Ok(())
    }

    /// Queued (index key, request id) pairs for one sub-queue of one
    /// target, in processing order (priority DESC, created_at ASC).
    pub fn scan_sub_queue(
        &self,
        target: &LctId,
        sub_queue: SubQueue,
    ) -> Result<Vec<(Vec<u8>, RequestId)>, Web4Error> {
        let prefix = web4_core::queue::index_prefix(target, sub_queue);
        let mut out = Vec::new();
        for item in self.queue_index.scan_prefix(&prefix) {
            let (key, value) = item.map_err(storage_err)?;
            let id = String::from_utf8(value.to_vec())
                .map_err(|e| Web4Error::Serialization(e.to_string()))?;
            out.push((key.to_vec(), RequestId(id)));
        }
        Ok(out)
    }

    pub fn get_offline_op(&self, component: &LctId) -> Result<Option<OfflineOperation>, Web4Error> {
        Self::get(&self.offline_ops, component.as_bytes())
    }

    pub fn put_offline_op(&self, op: &OfflineOperation) -> Result<(), Web4Error> {
        Self::put(&self.offline_ops, op.component.as_bytes(), op)
    }

    /// A page of requests starting strictly after `cursor` (request-id key
    /// order), for the deterministic expiry sweep.
    pub fn scan_requests_after(
        &self,
        cursor: Option<&[u8]>,
        limit: usize,
    ) -> Result<Vec<PairingRequest>, Web4Error> {
        let mut out = Vec::new();
        let iter: Box<dyn Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>> = match cursor {
            Some(c) => {
                let mut after = c.to_vec();
                after.push(0);
                Box::new(self.requests.range(after..))
            }
            None => Box::new(self.requests.iter()),
        };
        for item in iter.take(limit) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(ser_err)?);
        }
        Ok(out)
    }

    // ── Tensors ──────────────────────────────────────────────────────────────

    pub fn get_tensor(
        &self,
        id: &TensorId,
    ) -> Result<Option<RelationshipTrustTensor>, Web4Error> {
        Self::get(&self.tensors, id.as_bytes())
    }

    pub fn put_tensor(&self, tensor: &RelationshipTrustTensor) -> Result<(), Web4Error> {
        Self::put(&self.tensors, tensor.tensor_id.as_bytes(), tensor)
    }

    pub fn iter_tensors(&self) -> Result<Vec<RelationshipTrustTensor>, Web4Error> {
        Self::scan(&self.tensors, &[])
    }

    pub fn put_tensor_entry(&self, entry: &TensorEntry, seq: u64) -> Result<(), Web4Error> {
        let key = composite_key(entry.tensor_id.as_bytes(), &seq.to_be_bytes());
        Self::put(&self.tensor_entries, &key, entry)
    }

    /// Entries for a tensor in append order.
    pub fn iter_tensor_entries(&self, tensor: &TensorId) -> Result<Vec<TensorEntry>, Web4Error> {
        let mut prefix = tensor.as_bytes().to_vec();
        prefix.push(KEY_SEP);
        Self::scan(&self.tensor_entries, &prefix)
    }

    pub fn put_tensor_witness(&self, witness: &TensorWitness) -> Result<(), Web4Error> {
        let key = composite_key(witness.tensor_id.as_bytes(), witness.witness_id.as_bytes());
        Self::put(&self.tensor_witnesses, &key, witness)
    }

    pub fn iter_tensor_witnesses(
        &self,
        tensor: &TensorId,
    ) -> Result<Vec<TensorWitness>, Web4Error> {
        let mut prefix = tensor.as_bytes().to_vec();
        prefix.push(KEY_SEP);
        Self::scan(&self.tensor_witnesses, &prefix)
    }

    // ── Energy ───────────────────────────────────────────────────────────────

    pub fn get_pool(&self, society: &SocietyId) -> Result<Option<EnergyPool>, Web4Error> {
        Self::get(&self.pools, society.as_bytes())
    }

    pub fn put_pool(&self, pool: &EnergyPool) -> Result<(), Web4Error> {
        Self::put(&self.pools, pool.society.as_bytes(), pool)
    }

    pub fn iter_pools(&self) -> Result<Vec<EnergyPool>, Web4Error> {
        Self::scan(&self.pools, &[])
    }

    pub fn get_atp_token(&self, id: &AtpId) -> Result<Option<AtpToken>, Web4Error> {
        Self::get(&self.atp_tokens, id.as_bytes())
    }

    pub fn put_atp_token(&self, token: &AtpToken) -> Result<(), Web4Error> {
        Self::put(&self.atp_tokens, token.id.as_bytes(), token)
    }

    pub fn get_adp_token(&self, id: &AdpId) -> Result<Option<AdpToken>, Web4Error> {
        Self::get(&self.adp_tokens, id.as_bytes())
    }

    pub fn put_adp_token(&self, token: &AdpToken) -> Result<(), Web4Error> {
        Self::put(&self.adp_tokens, token.id.as_bytes(), token)
    }

    /// Single-consumption: the token is removed, not tombstoned.
    pub fn remove_adp_token(&self, id: &AdpId) -> Result<(), Web4Error> {
        self.adp_tokens.remove(id.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    // ── Societies ────────────────────────────────────────────────────────────

    pub fn get_society(&self, id: &SocietyId) -> Result<Option<Society>, Web4Error> {
        Self::get(&self.societies, id.as_bytes())
    }

    pub fn put_society(&self, society: &Society) -> Result<(), Web4Error> {
        Self::put(&self.societies, society.lct_id.as_bytes(), society)
    }

    pub fn put_decision(&self, decision: &LawDecision) -> Result<(), Web4Error> {
        let key = composite_key(
            decision.society.as_bytes(),
            &composite_key(
                decision.candidate.as_bytes(),
                &decision.decided_at.to_be_bytes(),
            ),
        );
        Self::put(&self.decisions, &key, decision)
    }

    pub fn iter_decisions(&self, society: &SocietyId) -> Result<Vec<LawDecision>, Web4Error> {
        let mut prefix = society.as_bytes().to_vec();
        prefix.push(KEY_SEP);
        Self::scan(&self.decisions, &prefix)
    }

    pub fn get_dispute(
        &self,
        society: &SocietyId,
        dispute_id: &str,
    ) -> Result<Option<Dispute>, Web4Error> {
        let key = composite_key(society.as_bytes(), dispute_id.as_bytes());
        Self::get(&self.disputes, &key)
    }

    pub fn put_dispute(&self, dispute: &Dispute) -> Result<(), Web4Error> {
        let key = composite_key(dispute.society.as_bytes(), dispute.dispute_id.as_bytes());
        Self::put(&self.disputes, &key, dispute)
    }

    pub fn iter_disputes(&self, society: &SocietyId) -> Result<Vec<Dispute>, Web4Error> {
        let mut prefix = society.as_bytes().to_vec();
        prefix.push(KEY_SEP);
        Self::scan(&self.disputes, &prefix)
    }

    // ── Registry ─────────────────────────────────────────────────────────────

    pub fn get_component(
        &self,
        hash: &ComponentHash,
    ) -> Result<Option<ComponentRecord>, Web4Error> {
        Self::get(&self.components, hash.as_bytes())
    }

    pub fn put_component(&self, record: &ComponentRecord) -> Result<(), Web4Error> {
        Self::put(&self.components, record.component_hash.as_bytes(), record)
    }

    pub fn get_pairing_auth(
        &self,
        source: &ComponentHash,
        target: &ComponentHash,
    ) -> Result<Option<PairingAuthorization>, Web4Error> {
        let key = composite_key(source.as_bytes(), target.as_bytes());
        Self::get(&self.pairing_auths, &key)
    }

    pub fn put_pairing_auth(&self, auth: &PairingAuthorization) -> Result<(), Web4Error> {
        let key = composite_key(auth.source_hash.as_bytes(), auth.target_hash.as_bytes());
        Self::put(&self.pairing_auths, &key, auth)
    }

    pub fn put_revocation(&self, revocation: &RevocationEvent) -> Result<(), Web4Error> {
        let key = composite_key(
            revocation.target_hash.as_bytes(),
            &revocation.created_at.to_be_bytes(),
        );
        Self::put(&self.revocations, &key, revocation)
    }

    pub fn iter_revocations(
        &self,
        target: &ComponentHash,
    ) -> Result<Vec<RevocationEvent>, Web4Error> {
        let mut prefix = target.as_bytes().to_vec();
        prefix.push(KEY_SEP);
        Self::scan(&self.revocations, &prefix)
    }

    // ── Params ───────────────────────────────────────────────────────────────

    /// Read a module's param record, falling back to its compiled default.
    pub fn get_params<T: DeserializeOwned + Default>(&self, module: &str) -> Result<T, Web4Error> {
        Ok(Self::get(&self.params, module.as_bytes())?.unwrap_or_default())
    }

    pub fn put_params<T: Serialize>(&self, module: &str, params: &T) -> Result<(), Web4Error> {
        Self::put(&self.params, module.as_bytes(), params)
    }

    /// Pre-serialized params write (staged commits carry bytes).
    pub fn put_params_raw(&self, module: &str, bytes: &[u8]) -> Result<(), Web4Error> {
        self.params
            .insert(module.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), Web4Error> {
        self.meta.insert(key.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, Web4Error> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage_err)
    }

    pub fn remove_meta(&self, key: &str) -> Result<(), Web4Error> {
        self.meta.remove(key.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Web4Error> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }
}
