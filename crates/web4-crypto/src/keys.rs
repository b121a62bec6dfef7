use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use web4_core::constants::BINDING_DOMAIN;
use web4_core::error::Web4Error;
use web4_core::types::{Ed25519PublicKey, Ed25519Signature, LctId, X25519PublicKey};

use crate::hash::lct_id_from_keys;

/// A component keypair: Ed25519 signing key plus X25519 agreement key, with
/// the LCT id derived from both public halves.
///
/// The agreement secret never enters the core: components keep it for
/// off-chain key agreement; the ledger only stores and binds its public
/// half. Secret bytes are wiped on drop.
#[derive(Serialize, Deserialize)]
pub struct KeyPair {
    pub lct_id: LctId,
    pub signing_public: Ed25519PublicKey,
    pub agreement_public: X25519PublicKey,
    signing_secret: [u8; 32],
}

impl KeyPair {
    /// Generate a fresh keypair from OS randomness. Client/test side only;
    /// consensus code never generates keys.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        let sk = SigningKey::generate(&mut rng);
        let mut agreement = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rng, &mut agreement);
        Self::from_parts(sk.to_bytes(), agreement)
    }

    /// Rebuild a keypair from stored secret bytes.
    pub fn from_parts(signing_secret: [u8; 32], agreement_public: [u8; 32]) -> Self {
        let sk = SigningKey::from_bytes(&signing_secret);
        let signing_public = Ed25519PublicKey(sk.verifying_key().to_bytes());
        let agreement_public = X25519PublicKey(agreement_public);
        let lct_id = lct_id_from_keys(&signing_public, &agreement_public);
        Self {
            lct_id,
            signing_public,
            agreement_public,
            signing_secret,
        }
    }

    /// Sign `message` with the Ed25519 signing key.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let sk = SigningKey::from_bytes(&self.signing_secret);
        Ed25519Signature(sk.sign(message).to_bytes().to_vec())
    }

    /// Produce the binding signature covering both public keys.
    pub fn binding_signature(&self) -> Ed25519Signature {
        self.sign(&binding_message(&self.signing_public, &self.agreement_public))
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.signing_secret.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ lct_id: {:?} }}", self.lct_id)
    }
}

// ── Verification ──────────────────────────────────────────────────────────────

/// The canonical binding message: BINDING_DOMAIN ‖ signing_pk ‖ agreement_pk.
pub fn binding_message(signing: &Ed25519PublicKey, agreement: &X25519PublicKey) -> Vec<u8> {
    let mut msg = Vec::with_capacity(BINDING_DOMAIN.len() + 64);
    msg.extend_from_slice(BINDING_DOMAIN);
    msg.extend_from_slice(signing.as_bytes());
    msg.extend_from_slice(agreement.as_bytes());
    msg
}

/// Verify an Ed25519 signature against a stored public key.
pub fn verify_signature(
    public: &Ed25519PublicKey,
    message: &[u8],
    signature: &Ed25519Signature,
) -> Result<(), Web4Error> {
    let vk = VerifyingKey::from_bytes(public.as_bytes())
        .map_err(|_| Web4Error::SignatureInvalid)?;
    let sig_bytes: [u8; 64] = signature
        .as_bytes()
        .try_into()
        .map_err(|_| Web4Error::SignatureInvalid)?;
    vk.verify(message, &Signature::from_bytes(&sig_bytes))
        .map_err(|_| Web4Error::SignatureInvalid)
}

/// Verify a binding signature proving control of the signing key over both
/// presented public keys.
pub fn verify_binding(
    signing: &Ed25519PublicKey,
    agreement: &X25519PublicKey,
    binding: &Ed25519Signature,
) -> Result<(), Web4Error> {
    verify_signature(signing, &binding_message(signing, agreement), binding)
        .map_err(|_| Web4Error::BindingInvalid)
}
