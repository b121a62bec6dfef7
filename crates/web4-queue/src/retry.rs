//! Retry classification and deterministic backoff.

use web4_core::error::{ErrorCode, Web4Error};

/// Whether a pairing-layer failure is permanent for queue purposes.
///
/// `AlreadyPaired` and every explicit validation rejection are permanent;
/// only the residue (internal/transient storage conditions) reschedules.
pub fn is_permanent_pairing_failure(err: &Web4Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::AlreadyPaired
            | ErrorCode::AlreadyExists
            | ErrorCode::AlreadyBound
            | ErrorCode::InvalidInput
            | ErrorCode::Unauthorized
            | ErrorCode::SignatureInvalid
            | ErrorCode::NotFound
            | ErrorCode::Expired
    )
}

/// Exponential backoff: base × 2^retry_count minutes, in seconds.
pub fn backoff_delay_secs(base_minutes: u32, retry_count: u32) -> i64 {
    let shift = retry_count.min(16);
    base_minutes as i64 * (1_i64 << shift) * 60
}
