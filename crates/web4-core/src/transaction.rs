use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::energy::R6Action;
use crate::lct::{EntityType, MrhSet};
use crate::params::ParamsUpdate;
use crate::queue::{Priority, RequestType};
use crate::score::{ScoreDelta, ScoreMicros};
use crate::society::Constitution;
use crate::tensor::{Dimension, Polarity, TensorKind};
use crate::types::{
    AdpId, Amount, ComponentHash, Ed25519PublicKey, Ed25519Signature, LctId, Nonce, PairingId,
    RequestId, SessionId, SocietyId, TensorId, X25519PublicKey,
};

// ── Administrative status target ──────────────────────────────────────────────

/// Target status for the administrative `SetLctStatus` message. Revocation
/// has its own message; this covers suspension, reactivation and expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminStatus {
    Active,
    Suspended,
    Expired,
}

// ── Msg ───────────────────────────────────────────────────────────────────────

/// Every state-changing operation on the ledger is one of these variants.
/// Each transaction carries exactly one message, addressed to one module.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Msg {
    // ── Registry ─────────────────────────────────────────────────────────────
    /// Register an anonymous component. Only domain-separated hashes of the
    /// real identifiers are written to state. Idempotent under identical
    /// inputs.
    RegisterComponent {
        real_id: String,
        manufacturer_id: String,
        category: String,
        context: String,
    },

    /// Insert a table-driven pairing policy entry.
    CreatePairingAuthorization {
        source_hash: ComponentHash,
        target_hash: ComponentHash,
        context: String,
        allowed: bool,
    },

    /// Record a revocation event against a component hash.
    CreateRevocationEvent {
        target_hash: ComponentHash,
        reason: String,
    },

    // ── LCT ──────────────────────────────────────────────────────────────────
    /// Mint a new LCT. The id is derived from the public keys; re-minting
    /// identical keys is rejected.
    MintLct {
        entity_type: EntityType,
        signing_key: Ed25519PublicKey,
        agreement_key: X25519PublicKey,
        binding_signature: Ed25519Signature,
    },

    /// Bind an LCT to its real-world entity. Exactly once per LCT.
    BindLct {
        lct_id: LctId,
        entity_id: String,
        proof: Vec<u8>,
    },

    /// Add/remove MRH edges. `Bound` additions are only legal from within
    /// Bind and are rejected here.
    UpdateMrh {
        lct_id: LctId,
        set: MrhSet,
        add: Vec<LctId>,
        remove: Vec<LctId>,
    },

    /// Append a witness attestation for `target` signed by the caller.
    WitnessLct {
        target: LctId,
        signature: Ed25519Signature,
        confidence: ScoreMicros,
    },

    /// Issue a birth certificate. Caller must hold the treasury role of
    /// `society`.
    IssueBirthCertificate {
        recipient: LctId,
        society: SocietyId,
        rights: Vec<String>,
        responsibilities: Vec<String>,
        initial_atp: Amount,
    },

    /// Permanently revoke an LCT.
    RevokeLct { lct_id: LctId, reason: String },

    /// Administrative suspension / reactivation / expiry.
    SetLctStatus { lct_id: LctId, status: AdminStatus },

    // ── Pairing ──────────────────────────────────────────────────────────────
    InitiatePairing {
        target: LctId,
        validity_minutes: Option<u32>,
        metadata: BTreeMap<String, String>,
    },

    /// One side's signed challenge response.
    CompletePairing {
        session_id: SessionId,
        response: Ed25519Signature,
    },

    RevokePairing { pairing_id: PairingId, reason: String },

    // ── Queue ────────────────────────────────────────────────────────────────
    QueuePairingRequest {
        target: LctId,
        request_type: RequestType,
        priority: Priority,
        expiry_hours: Option<u32>,
        proxy: Option<LctId>,
        metadata: BTreeMap<String, String>,
    },

    ProcessOfflineQueue {
        target: LctId,
        process_proxy: bool,
        max_ops: u32,
    },

    CancelRequest { request_id: RequestId, reason: String },

    // ── Trust ────────────────────────────────────────────────────────────────
    /// Create (or return the id of) the caller↔partner tensor of `kind`.
    CreateTensor { partner: LctId, kind: TensorKind },

    UpdateTensorScore {
        tensor_id: TensorId,
        dimension: Dimension,
        score_delta: ScoreDelta,
        evidence: Vec<u8>,
        confidence: ScoreMicros,
    },

    AddTensorWitness {
        tensor_id: TensorId,
        witnessed: LctId,
        statement: Vec<u8>,
        confidence: ScoreMicros,
        polarity: Polarity,
        signature: Ed25519Signature,
    },

    // ── Energy ───────────────────────────────────────────────────────────────
    /// Issue new ATP into a society's pool. Treasury role only.
    MintAtp { society: SocietyId, amount: Amount },

    /// R6-gated discharge: ATP → ADP, total-preserving.
    DischargeAtp {
        society: SocietyId,
        amount: Amount,
        r6: R6Action,
    },

    /// Work-proof-gated recharge: consumes the ADP token, ADP → ATP.
    RechargeAdp {
        adp_id: AdpId,
        producer: String,
        work_proof: Ed25519Signature,
    },

    // ── Society ──────────────────────────────────────────────────────────────
    /// Found a society: mints the society's own LCT from the supplied keys,
    /// seats the founder as first treasury-role holder, creates the pool.
    CreateSociety {
        name: String,
        constitution: Constitution,
        signing_key: Ed25519PublicKey,
        agreement_key: X25519PublicKey,
        binding_signature: Ed25519Signature,
        /// Role LCT (entity_type = role) for the law oracle seat.
        law_oracle: LctId,
        /// Role LCT (entity_type = role) held by the founder as treasury.
        treasury_role: LctId,
        initial_pool: Amount,
    },

    JoinSociety { society: SocietyId, role: LctId },

    /// Replace the constitution. Treasury role only; requires a live oracle.
    AmendConstitution {
        society: SocietyId,
        constitution: Constitution,
    },

    LeaveSociety { society: SocietyId },

    FileDispute {
        society: SocietyId,
        defendant: LctId,
        claim: String,
        evidence: Vec<Vec<u8>>,
    },

    ResolveDispute {
        society: SocietyId,
        dispute_id: String,
        resolution: DisputeResolution,
    },

    // ── Governance ───────────────────────────────────────────────────────────
    /// Replace one module's parameter record. Founding-society treasury only.
    UpdateParams { update: ParamsUpdate },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeResolution {
    Investigate,
    Resolve { resolution: String },
    Dismiss { reason: String },
}

impl Msg {
    /// The module a message is addressed to (event/log attribute).
    pub fn module(&self) -> &'static str {
        use Msg::*;
        match self {
            RegisterComponent { .. }
            | CreatePairingAuthorization { .. }
            | CreateRevocationEvent { .. } => "registry",
            MintLct { .. } | BindLct { .. } | UpdateMrh { .. } | WitnessLct { .. }
            | IssueBirthCertificate { .. } | RevokeLct { .. } | SetLctStatus { .. } => "lct",
            InitiatePairing { .. } | CompletePairing { .. } | RevokePairing { .. } => "pairing",
            QueuePairingRequest { .. } | ProcessOfflineQueue { .. } | CancelRequest { .. } => {
                "queue"
            }
            CreateTensor { .. } | UpdateTensorScore { .. } | AddTensorWitness { .. } => "trust",
            MintAtp { .. } | DischargeAtp { .. } | RechargeAdp { .. } => "energy",
            CreateSociety { .. } | JoinSociety { .. } | AmendConstitution { .. }
            | LeaveSociety { .. } | FileDispute { .. } | ResolveDispute { .. } => "society",
            UpdateParams { .. } => "params",
        }
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A signed transaction. The signature covers the bincode serialization of
/// the body (nonce, signer, msg); the signer resolves to an LCT whose
/// signing key verifies it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Per-LCT monotonically increasing counter (replay protection).
    pub nonce: Nonce,
    /// The LCT authorising this transaction.
    pub signer: LctId,
    pub msg: Msg,
    pub signature: Ed25519Signature,
}

/// The body bytes covered by the transaction signature.
#[derive(Serialize)]
pub struct TransactionBody<'a> {
    pub nonce: Nonce,
    pub signer: &'a LctId,
    pub msg: &'a Msg,
}

impl Transaction {
    pub fn body(&self) -> TransactionBody<'_> {
        TransactionBody {
            nonce: self.nonce,
            signer: &self.signer,
            msg: &self.msg,
        }
    }

    /// Canonical body bytes (bincode) for signing and verification.
    pub fn body_bytes(&self) -> Vec<u8> {
        bincode::serialize(&self.body()).expect("body serialization is infallible")
    }

    /// Body bytes for a not-yet-signed transaction (client side).
    pub fn signing_bytes(nonce: Nonce, signer: &LctId, msg: &Msg) -> Vec<u8> {
        bincode::serialize(&TransactionBody { nonce, signer, msg })
            .expect("body serialization is infallible")
    }
}
