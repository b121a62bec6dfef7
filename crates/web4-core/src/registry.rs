//! Anonymous component registry records. Only domain-separated hashes of
//! real-world identifiers ever reach state.

use serde::{Deserialize, Serialize};

use crate::types::{ComponentHash, LctId, Timestamp};

/// A registered anonymous component: the hash triple plus a metadata
/// pointer. Re-registering identical inputs is a no-op returning this
/// record unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub component_hash: ComponentHash,
    pub manufacturer_hash: ComponentHash,
    pub category_hash: ComponentHash,
    pub registered_by: LctId,
    /// Free-form registration context (e.g. deployment batch).
    pub context: String,
    pub registered_at: Timestamp,
}

/// Table-driven pairing policy entry for a (source, target) hash pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingAuthorization {
    pub source_hash: ComponentHash,
    pub target_hash: ComponentHash,
    pub context: String,
    pub allowed: bool,
    pub created_by: LctId,
    pub created_at: Timestamp,
}

/// Recorded revocation of a component's authorisations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEvent {
    pub target_hash: ComponentHash,
    pub reason: String,
    pub created_by: LctId,
    pub created_at: Timestamp,
}

/// Result of a pairing-authorization check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    pub authorized: bool,
    pub reason: String,
}
