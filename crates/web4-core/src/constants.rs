//! ─── Web4 Protocol Constants ────────────────────────────────────────────────
//!
//! Domain-separation strings for every hash and signature context, plus the
//! handful of limits that are consensus rules rather than governance
//! parameters (those live in `params`).

// ── Hash domains (id derivation) ─────────────────────────────────────────────

/// LCT id: blake3(LCT_ID_DOMAIN ‖ signing_pk ‖ agreement_pk).
pub const LCT_ID_DOMAIN: &[u8] = b"web4/lct";

/// Pairing session id: blake3(SESSION_ID_DOMAIN ‖ initiator ‖ target ‖ rng32).
pub const SESSION_ID_DOMAIN: &[u8] = b"web4/session";

/// Active pairing id: blake3(PAIRING_ID_DOMAIN ‖ session_id).
pub const PAIRING_ID_DOMAIN: &[u8] = b"web4/pairing";

/// Queued request id: blake3(REQUEST_ID_DOMAIN ‖ initiator ‖ target ‖ rng32).
pub const REQUEST_ID_DOMAIN: &[u8] = b"web4/request";

/// Tensor id: blake3(TENSOR_ID_DOMAIN ‖ owner ‖ partner ‖ kind_byte).
pub const TENSOR_ID_DOMAIN: &[u8] = b"web4/tensor";

/// ATP audit id: blake3(ATP_ID_DOMAIN ‖ lct ‖ time_be ‖ draw_be).
pub const ATP_ID_DOMAIN: &[u8] = b"web4/atp";

/// ADP token id: blake3(ADP_ID_DOMAIN ‖ lct ‖ time_be ‖ draw_be).
/// Commits to (discharging LCT, block time).
pub const ADP_ID_DOMAIN: &[u8] = b"web4/adp";

/// Tensor entry id: blake3(ENTRY_ID_DOMAIN ‖ tensor ‖ seq_be).
pub const ENTRY_ID_DOMAIN: &[u8] = b"web4/tensor-entry";

/// Tensor witness id: blake3(WITNESS_ID_DOMAIN ‖ tensor ‖ witness ‖ time_be).
pub const WITNESS_ID_DOMAIN: &[u8] = b"web4/tensor-witness";

/// Dispute id: blake3(DISPUTE_ID_DOMAIN ‖ society ‖ plaintiff ‖ time_be).
pub const DISPUTE_ID_DOMAIN: &[u8] = b"web4/dispute";

// ── Registry hash domains ─────────────────────────────────────────────────────

pub const REGISTRY_COMPONENT_DOMAIN: &[u8] = b"web4/registry/component";
pub const REGISTRY_MANUFACTURER_DOMAIN: &[u8] = b"web4/registry/manufacturer";
pub const REGISTRY_CATEGORY_DOMAIN: &[u8] = b"web4/registry/category";

// ── Signature domains ─────────────────────────────────────────────────────────

/// Binding signature: Ed25519 over BINDING_DOMAIN ‖ signing_pk ‖ agreement_pk.
pub const BINDING_DOMAIN: &[u8] = b"web4/lct-binding";

/// Witness attestation: Ed25519 over WITNESS_DOMAIN ‖ witness ‖ target.
pub const WITNESS_DOMAIN: &[u8] = b"web4/witness";

/// Tensor witness statement: Ed25519 over
/// TENSOR_WITNESS_DOMAIN ‖ tensor ‖ witnessed ‖ polarity ‖ statement.
pub const TENSOR_WITNESS_DOMAIN: &[u8] = b"web4/tensor-statement";

/// Producer work proof: Ed25519 over WORK_PROOF_DOMAIN ‖ adp_id ‖ amount_be.
pub const WORK_PROOF_DOMAIN: &[u8] = b"web4/work";

// ── Consensus limits ──────────────────────────────────────────────────────────

/// Maximum metadata entries per pairing session or queued request.
pub const MAX_METADATA_ENTRIES: usize = 16;

/// Maximum bytes per metadata key or value.
pub const MAX_METADATA_BYTES: usize = 256;

/// Maximum bytes for opaque evidence blobs (tensor entries, disputes, binds).
pub const MAX_EVIDENCE_BYTES: usize = 4_096;

/// Maximum rights/responsibilities strings per birth certificate or citizen.
pub const MAX_RIGHTS_ENTRIES: usize = 32;
