use thiserror::Error;

/// Stable error codes surfaced to callers. Every [`Web4Error`] variant maps
/// onto exactly one code; only the `Transient` family triggers queue retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    AlreadyExists,
    AlreadyBound,
    AlreadyPaired,
    Unauthorized,
    SignatureInvalid,
    Expired,
    VelocityViolation,
    InsufficientFunds,
    Transient,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::NotFound => "not_found",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::AlreadyBound => "already_bound",
            ErrorCode::AlreadyPaired => "already_paired",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::SignatureInvalid => "signature_invalid",
            ErrorCode::Expired => "expired",
            ErrorCode::VelocityViolation => "velocity_violation",
            ErrorCode::InsufficientFunds => "insufficient_funds",
            ErrorCode::Transient => "transient",
            ErrorCode::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum Web4Error {
    // ── Validation ───────────────────────────────────────────────────────────
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("metadata exceeds limits ({0} entries max)")]
    MetadataTooLarge(usize),

    #[error("evidence blob exceeds {max} bytes")]
    EvidenceTooLarge { max: usize },

    // ── Lookup / uniqueness ──────────────────────────────────────────────────
    #[error("lct not found: {0}")]
    LctNotFound(String),

    #[error("pairing session not found: {0}")]
    SessionNotFound(String),

    #[error("active pairing not found: {0}")]
    PairingNotFound(String),

    #[error("queued request not found: {0}")]
    RequestNotFound(String),

    #[error("tensor not found: {0}")]
    TensorNotFound(String),

    #[error("adp token not found (or already consumed): {0}")]
    AdpNotFound(String),

    #[error("atp audit record not found: {0}")]
    AtpNotFound(String),

    #[error("energy pool not found for society: {0}")]
    PoolNotFound(String),

    #[error("society not found: {0}")]
    SocietyNotFound(String),

    #[error("dispute not found: {0}")]
    DisputeNotFound(String),

    #[error("component hash not registered: {0}")]
    ComponentNotFound(String),

    #[error("lct already exists for these keys: {0}")]
    LctAlreadyExists(String),

    #[error("lct is already bound: {0}")]
    AlreadyBound(String),

    #[error("components are already actively paired: {0} / {1}")]
    AlreadyPaired(String, String),

    #[error("society already exists for lct: {0}")]
    SocietyAlreadyExists(String),

    #[error("{0} is already a member of {1}")]
    AlreadyMember(String, String),

    // ── Authorization ────────────────────────────────────────────────────────
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("caller is not the treasury role of society {0}")]
    NotTreasury(String),

    #[error("lct {0} is not a participant of session {1}")]
    NotAParticipant(String, String),

    #[error("lct {0} is not active")]
    LctNotActive(String),

    #[error("society {0} has no live law oracle")]
    OracleUnavailable(String),

    #[error("law oracle denied admission: {0}")]
    AdmissionDenied(String),

    // ── Cryptography ─────────────────────────────────────────────────────────
    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("binding signature does not cover the presented keys")]
    BindingInvalid,

    #[error("challenge response verification failed")]
    ChallengeVerificationFailed,

    #[error("work proof rejected: {0}")]
    InvalidWorkProof(String),

    // ── Policy ───────────────────────────────────────────────────────────────
    #[error("session {0} has expired")]
    SessionExpired(String),

    #[error("request {0} has expired")]
    RequestExpired(String),

    #[error("transaction nonce mismatch: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("insufficient atp: need {need}, have {have}")]
    InsufficientAtp { need: u128, have: u128 },

    #[error("discharge would breach the velocity reserve ({reserve} protected)")]
    VelocityViolation { reserve: u128 },

    #[error("r6 action invalid: {0}")]
    InvalidR6(String),

    #[error("queue for {target} is full ({max} requests)")]
    QueueFull { target: String, max: u32 },

    #[error("session validity {got} minutes exceeds maximum {max}")]
    ValidityTooLong { got: u32, max: u32 },

    #[error("queue expiry {got} hours exceeds maximum {max}")]
    QueueTimeTooLong { got: u32, max: u32 },

    #[error("pairing cap reached for {component} ({max} active pairings)")]
    PairingCapReached { component: String, max: u32 },

    // ── Queue retry family ───────────────────────────────────────────────────
    /// The only retriable family: a pairing-layer failure that block order
    /// may resolve (queue processing reschedules with backoff).
    #[error("transient: {0}")]
    Transient(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl Web4Error {
    /// The stable code for this error, per the closed taxonomy.
    pub fn code(&self) -> ErrorCode {
        use Web4Error::*;
        match self {
            InvalidInput(_) | MetadataTooLarge(_) | EvidenceTooLarge { .. }
            | InvalidR6(_) | QueueFull { .. } | ValidityTooLong { .. }
            | QueueTimeTooLong { .. } | PairingCapReached { .. }
            | InvalidNonce { .. } => ErrorCode::InvalidInput,

            LctNotFound(_) | SessionNotFound(_) | PairingNotFound(_)
            | RequestNotFound(_) | TensorNotFound(_) | AdpNotFound(_)
            | AtpNotFound(_) | PoolNotFound(_) | SocietyNotFound(_)
            | DisputeNotFound(_) | ComponentNotFound(_) => ErrorCode::NotFound,

            LctAlreadyExists(_) | SocietyAlreadyExists(_) | AlreadyMember(_, _) => {
                ErrorCode::AlreadyExists
            }
            AlreadyBound(_) => ErrorCode::AlreadyBound,
            AlreadyPaired(_, _) => ErrorCode::AlreadyPaired,

            Unauthorized(_) | NotTreasury(_) | NotAParticipant(_, _)
            | LctNotActive(_) | OracleUnavailable(_) | AdmissionDenied(_) => {
                ErrorCode::Unauthorized
            }

            SignatureInvalid | BindingInvalid | ChallengeVerificationFailed
            | InvalidWorkProof(_) => ErrorCode::SignatureInvalid,

            SessionExpired(_) | RequestExpired(_) => ErrorCode::Expired,
            VelocityViolation { .. } => ErrorCode::VelocityViolation,
            InsufficientAtp { .. } => ErrorCode::InsufficientFunds,
            Transient(_) => ErrorCode::Transient,
            Serialization(_) | Storage(_) => ErrorCode::Internal,
        }
    }

    /// True if queue processing may reschedule the failed operation.
    pub fn is_transient(&self) -> bool {
        self.code() == ErrorCode::Transient
    }
}
