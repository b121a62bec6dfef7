use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC) supplied by the deterministic block clock.
pub type Timestamp = i64;

/// Token amount in base units. u128 leaves ample headroom for pool balances.
pub type Amount = u128;

/// Transaction sequence number per LCT (monotonically increasing).
pub type Nonce = u64;

// ── String identifiers ────────────────────────────────────────────────────────
//
// Every on-chain entity is addressed by an opaque string id with a documented
// prefix. Ids are content-derived: prefix + first 40 hex chars of a
// domain-separated BLAKE3 digest.

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident, $prefix:expr) => {
        $(#[$doc])*
        #[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Build an id from a 32-byte digest: prefix + 40 hex chars.
            pub fn from_digest(digest: &[u8; 32]) -> Self {
                Self(format!("{}{}", $prefix, &hex::encode(digest)[..40]))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn as_bytes(&self) -> &[u8] {
                self.0.as_bytes()
            }

            /// True if the string carries this id type's prefix.
            pub fn is_well_formed(&self) -> bool {
                self.0.starts_with($prefix) && self.0.len() > $prefix.len()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let short = if self.0.len() > $prefix.len() + 8 {
                    &self.0[..$prefix.len() + 8]
                } else {
                    &self.0
                };
                write!(f, "{}({}…)", stringify!($name), short)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Linked Context Token identifier, derived from the LCT's public keys.
    LctId,
    "lct:"
);

string_id!(
    /// Pairing session identifier.
    SessionId,
    "pair:"
);

string_id!(
    /// Active pairing identifier, derived from the originating session.
    PairingId,
    "pair:"
);

string_id!(
    /// Queued pairing request identifier.
    RequestId,
    "req:"
);

string_id!(
    /// Relationship trust tensor identifier.
    TensorId,
    "tensor:"
);

string_id!(
    /// Charged (ATP) token audit record identifier.
    AtpId,
    "atp:"
);

string_id!(
    /// Discharged (ADP) token identifier; consumed on recharge.
    AdpId,
    "adp:"
);

/// Societies are addressed by their own LCT id.
pub type SocietyId = LctId;

// ── Hash strings ──────────────────────────────────────────────────────────────

/// 64-hex-char anonymous hash of a real-world identifier. The plaintext never
/// reaches state.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentHash(pub String);

impl ComponentHash {
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ComponentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ComponentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentHash({}…)", &self.0[..self.0.len().min(12)])
    }
}

// ── Key material ──────────────────────────────────────────────────────────────

/// Ed25519 verifying key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey({})", &self.to_b58()[..8])
    }
}

/// X25519 agreement key (32 bytes). The core stores and binds it; key
/// agreement itself happens off-chain between paired components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519PublicKey({})", &bs58::encode(&self.0).into_string()[..8])
    }
}

/// Ed25519 signature (64 bytes, held as a Vec for serde friendliness).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519Signature(pub Vec<u8>);

impl Ed25519Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature({}b)", self.0.len())
    }
}
