pub mod hash;
pub mod keys;
pub mod rng;

pub use hash::{
    adp_id, atp_id, category_hash, component_hash, dispute_id, domain_hash, entry_id,
    lct_id_from_keys, manufacturer_hash, pairing_id, request_id, session_id, tensor_id,
    witness_id,
};
pub use keys::{binding_message, verify_binding, verify_signature, KeyPair};
pub use rng::TxRng;
