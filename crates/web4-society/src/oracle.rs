//! The law oracle: a deterministic decision rule set served synchronously
//! within the admitting transaction. The oracle seat is a role LCT; a
//! society whose seat is missing or inactive cannot admit members or amend
//! its constitution.

use web4_core::error::Web4Error;
use web4_core::lct::EntityType;
use web4_core::society::{Society, Verdict};
use web4_core::types::LctId;
use web4_state::StateDb;

/// Governance-rule key consulted for conditional admission.
pub const ADMISSION_RULE: &str = "admission";

/// Check that the society's oracle seat is live: the role LCT exists, is of
/// entity_type role, and is active.
pub fn require_live_oracle(db: &StateDb, society: &Society) -> Result<(), Web4Error> {
    let oracle = db
        .get_lct(&society.law_oracle_lct)?
        .ok_or_else(|| Web4Error::OracleUnavailable(society.lct_id.to_string()))?;
    if oracle.entity_type != EntityType::Role || !oracle.is_active() {
        return Err(Web4Error::OracleUnavailable(society.lct_id.to_string()));
    }
    Ok(())
}

/// The admission rule set, evaluated deterministically:
/// - a closed constitution denies;
/// - `admission = conditional` admits with rights restricted to the
///   constitution's default set;
/// - otherwise the candidate is approved.
pub fn decide_admission(society: &Society, candidate: &LctId, role: &LctId) -> Verdict {
    if society.members.contains_key(candidate) {
        return Verdict::Deny {
            reason: format!("{candidate} is already a citizen"),
        };
    }
    if !society.constitution.membership_open {
        return Verdict::Deny {
            reason: "membership is closed by the constitution".into(),
        };
    }
    if role == &society.treasury_role
        && society
            .constitution
            .governance_rules
            .get("treasury_admission")
            .map(|v| v == "founder_only")
            .unwrap_or(true)
    {
        // The treasury seat is not open to self-service admission.
        return Verdict::Deny {
            reason: "treasury role is not open for admission".into(),
        };
    }
    if society
        .constitution
        .governance_rules
        .get(ADMISSION_RULE)
        .map(|v| v == "conditional")
        .unwrap_or(false)
    {
        return Verdict::Conditional {
            rights: society.constitution.rights.clone(),
        };
    }
    Verdict::Approve
}
