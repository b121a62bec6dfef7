//! Genesis configuration: the founding identities and the first society.

use serde::{Deserialize, Serialize};

use web4_core::params::ApprovedProducer;
use web4_core::society::Constitution;
use web4_core::types::{
    Amount, Ed25519PublicKey, Ed25519Signature, Timestamp, X25519PublicKey,
};
use web4_crypto::KeyPair;

/// One founding seat: public keys plus the binding signature proving the
/// holder controls them. Secret keys never enter genesis state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisIdentity {
    pub signing_key: Ed25519PublicKey,
    pub agreement_key: X25519PublicKey,
    pub binding_signature: Ed25519Signature,
}

impl From<&KeyPair> for GenesisIdentity {
    fn from(kp: &KeyPair) -> Self {
        Self {
            signing_key: kp.signing_public,
            agreement_key: kp.agreement_public,
            binding_signature: kp.binding_signature(),
        }
    }
}

/// Everything needed to build the founding state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    pub genesis_time: Timestamp,
    pub founder: GenesisIdentity,
    pub society: GenesisIdentity,
    pub treasury_role: GenesisIdentity,
    pub law_oracle_role: GenesisIdentity,
    pub society_name: String,
    pub constitution: Constitution,
    /// First ATP issue into the founding pool.
    pub initial_atp: Amount,
    pub approved_producers: Vec<ApprovedProducer>,
}

/// The founding keypairs, for node operators bootstrapping a network (and
/// for tests that need to sign as the founder).
pub struct GenesisKeys {
    pub founder: KeyPair,
    pub society: KeyPair,
    pub treasury_role: KeyPair,
    pub law_oracle_role: KeyPair,
}

impl GenesisParams {
    /// Serialize for distribution to node operators.
    pub fn to_json(&self) -> Result<String, web4_core::error::Web4Error> {
        serde_json::to_string_pretty(self)
            .map_err(|e| web4_core::error::Web4Error::Serialization(e.to_string()))
    }

    /// Parse a distributed genesis document.
    pub fn from_json(json: &str) -> Result<Self, web4_core::error::Web4Error> {
        serde_json::from_str(json)
            .map_err(|e| web4_core::error::Web4Error::Serialization(e.to_string()))
    }

    /// Generate a complete genesis with fresh keys. Client-side tooling:
    /// consensus code never generates keys.
    pub fn generate(
        genesis_time: Timestamp,
        society_name: &str,
        constitution: Constitution,
        initial_atp: Amount,
    ) -> (Self, GenesisKeys) {
        let keys = GenesisKeys {
            founder: KeyPair::generate(),
            society: KeyPair::generate(),
            treasury_role: KeyPair::generate(),
            law_oracle_role: KeyPair::generate(),
        };
        let params = Self {
            genesis_time,
            founder: (&keys.founder).into(),
            society: (&keys.society).into(),
            treasury_role: (&keys.treasury_role).into(),
            law_oracle_role: (&keys.law_oracle_role).into(),
            society_name: society_name.to_string(),
            constitution,
            initial_atp,
            approved_producers: Vec::new(),
        };
        (params, keys)
    }
}
