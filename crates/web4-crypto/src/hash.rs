//! Domain-separated BLAKE3 derivations for every content-derived id.

use web4_core::constants::{
    ADP_ID_DOMAIN, ATP_ID_DOMAIN, DISPUTE_ID_DOMAIN, ENTRY_ID_DOMAIN, LCT_ID_DOMAIN,
    PAIRING_ID_DOMAIN, REGISTRY_CATEGORY_DOMAIN, REGISTRY_COMPONENT_DOMAIN,
    REGISTRY_MANUFACTURER_DOMAIN, REQUEST_ID_DOMAIN, SESSION_ID_DOMAIN, TENSOR_ID_DOMAIN,
    WITNESS_ID_DOMAIN,
};
use web4_core::tensor::TensorKind;
use web4_core::types::{
    AdpId, AtpId, ComponentHash, Ed25519PublicKey, LctId, PairingId, RequestId, SessionId,
    SocietyId, TensorId, Timestamp, X25519PublicKey,
};

/// BLAKE3 over a domain string plus concatenated parts.
pub fn domain_hash(domain: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

// ── Identity ──────────────────────────────────────────────────────────────────

/// Deterministic LCT id from the two public keys. Re-minting identical keys
/// therefore collides and is rejected.
pub fn lct_id_from_keys(signing: &Ed25519PublicKey, agreement: &X25519PublicKey) -> LctId {
    LctId::from_digest(&domain_hash(
        LCT_ID_DOMAIN,
        &[signing.as_bytes(), agreement.as_bytes()],
    ))
}

// ── Pairing ───────────────────────────────────────────────────────────────────

pub fn session_id(initiator: &LctId, target: &LctId, entropy: &[u8; 32]) -> SessionId {
    SessionId::from_digest(&domain_hash(
        SESSION_ID_DOMAIN,
        &[initiator.as_bytes(), target.as_bytes(), entropy],
    ))
}

pub fn pairing_id(session: &SessionId) -> PairingId {
    PairingId::from_digest(&domain_hash(PAIRING_ID_DOMAIN, &[session.as_bytes()]))
}

// ── Queue ─────────────────────────────────────────────────────────────────────

pub fn request_id(initiator: &LctId, target: &LctId, entropy: &[u8; 32]) -> RequestId {
    RequestId::from_digest(&domain_hash(
        REQUEST_ID_DOMAIN,
        &[initiator.as_bytes(), target.as_bytes(), entropy],
    ))
}

// ── Trust ─────────────────────────────────────────────────────────────────────

pub fn tensor_id(owner: &LctId, partner: &LctId, kind: TensorKind) -> TensorId {
    TensorId::from_digest(&domain_hash(
        TENSOR_ID_DOMAIN,
        &[owner.as_bytes(), partner.as_bytes(), &[kind.as_byte()]],
    ))
}

pub fn entry_id(tensor: &TensorId, seq: u64) -> String {
    hex::encode(domain_hash(
        ENTRY_ID_DOMAIN,
        &[tensor.as_bytes(), &seq.to_be_bytes()],
    ))
}

pub fn witness_id(tensor: &TensorId, witness: &LctId, at: Timestamp) -> String {
    hex::encode(domain_hash(
        WITNESS_ID_DOMAIN,
        &[tensor.as_bytes(), witness.as_bytes(), &at.to_be_bytes()],
    ))
}

// ── Energy ────────────────────────────────────────────────────────────────────

/// ADP id commits to (discharging LCT, block time); the draw counter keeps
/// multiple discharges within one transaction distinct.
pub fn adp_id(discharged_by: &LctId, at: Timestamp, draw: u64) -> AdpId {
    AdpId::from_digest(&domain_hash(
        ADP_ID_DOMAIN,
        &[discharged_by.as_bytes(), &at.to_be_bytes(), &draw.to_be_bytes()],
    ))
}

pub fn atp_id(recharged_by: &LctId, at: Timestamp, draw: u64) -> AtpId {
    AtpId::from_digest(&domain_hash(
        ATP_ID_DOMAIN,
        &[recharged_by.as_bytes(), &at.to_be_bytes(), &draw.to_be_bytes()],
    ))
}

// ── Society ───────────────────────────────────────────────────────────────────

pub fn dispute_id(society: &SocietyId, plaintiff: &LctId, at: Timestamp) -> String {
    hex::encode(domain_hash(
        DISPUTE_ID_DOMAIN,
        &[society.as_bytes(), plaintiff.as_bytes(), &at.to_be_bytes()],
    ))
}

// ── Registry ──────────────────────────────────────────────────────────────────

pub fn component_hash(real_id: &str) -> ComponentHash {
    ComponentHash::from_digest(&domain_hash(
        REGISTRY_COMPONENT_DOMAIN,
        &[real_id.as_bytes()],
    ))
}

pub fn manufacturer_hash(manufacturer_id: &str) -> ComponentHash {
    ComponentHash::from_digest(&domain_hash(
        REGISTRY_MANUFACTURER_DOMAIN,
        &[manufacturer_id.as_bytes()],
    ))
}

pub fn category_hash(category: &str) -> ComponentHash {
    ComponentHash::from_digest(&domain_hash(
        REGISTRY_CATEGORY_DOMAIN,
        &[category.as_bytes()],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_hashes_are_domain_separated() {
        // The same plaintext under different domains must not collide.
        assert_ne!(component_hash("SN-1234"), manufacturer_hash("SN-1234"));
        assert_ne!(component_hash("SN-1234"), category_hash("SN-1234"));
    }

    #[test]
    fn registry_hash_is_stable() {
        assert_eq!(component_hash("SN-1234"), component_hash("SN-1234"));
        assert_ne!(component_hash("SN-1234"), component_hash("SN-1235"));
    }

    #[test]
    fn adp_id_distinguishes_draws() {
        let lct = LctId("lct:abc".into());
        assert_ne!(adp_id(&lct, 100, 0), adp_id(&lct, 100, 1));
        assert_ne!(adp_id(&lct, 100, 0), adp_id(&lct, 101, 0));
    }

    #[test]
    fn tensor_id_depends_on_direction_and_kind() {
        let a = LctId("lct:a".into());
        let b = LctId("lct:b".into());
        assert_ne!(tensor_id(&a, &b, TensorKind::T3), tensor_id(&b, &a, TensorKind::T3));
        assert_ne!(tensor_id(&a, &b, TensorKind::T3), tensor_id(&a, &b, TensorKind::V3));
    }
}
