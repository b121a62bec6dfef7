//! Society records: constitution, citizen roster, law-oracle decisions and
//! disputes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Amount, LctId, SocietyId, Timestamp};

// ── Constitution ──────────────────────────────────────────────────────────────

/// The founding document of a society. Governance and economic rules are
/// free-form key/value pairs interpreted by the law oracle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constitution {
    pub principles: Vec<String>,
    pub rights: Vec<String>,
    pub responsibilities: Vec<String>,
    pub governance_rules: BTreeMap<String, String>,
    pub economic_rules: BTreeMap<String, String>,
    /// Whether the oracle admits non-founder candidates at all.
    pub membership_open: bool,
}

// ── Citizens ──────────────────────────────────────────────────────────────────

/// One member of a society. `role` is itself an LCT of entity_type `role`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenRecord {
    pub lct: LctId,
    pub role: LctId,
    pub rights: Vec<String>,
    pub responsibilities: Vec<String>,
    pub joined_at: Timestamp,
    pub atp_allocated: Amount,
}

/// Governance container owning a law oracle, an energy pool, and a roster of
/// citizen LCTs. The pool id equals the society id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Society {
    /// The society's own LCT id (doubles as the society id and pool id).
    pub lct_id: SocietyId,
    pub name: String,
    pub law_oracle_lct: LctId,
    /// Role LCT whose holders may mint into and administer the pool.
    pub treasury_role: LctId,
    pub constitution: Constitution,
    pub members: BTreeMap<LctId, CitizenRecord>,
    pub created_at: Timestamp,
}

impl Society {
    pub fn member(&self, lct: &LctId) -> Option<&CitizenRecord> {
        self.members.get(lct)
    }

    /// True if `lct` is a member holding the treasury role.
    pub fn holds_treasury_role(&self, lct: &LctId) -> bool {
        self.members
            .get(lct)
            .map(|m| m.role == self.treasury_role)
            .unwrap_or(false)
    }
}

// ── Law oracle ────────────────────────────────────────────────────────────────

/// Oracle verdict on an admission or amendment request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Approve,
    /// Admitted with rights restricted to the listed set.
    Conditional { rights: Vec<String> },
    Deny { reason: String },
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approve => "approve",
            Verdict::Conditional { .. } => "conditional",
            Verdict::Deny { .. } => "deny",
        }
    }

    pub fn admits(&self) -> bool {
        !matches!(self, Verdict::Deny { .. })
    }
}

/// Persisted record of one oracle decision, bound to the transaction that
/// carried the request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawDecision {
    pub society: SocietyId,
    pub candidate: LctId,
    pub requested_role: LctId,
    pub verdict: Verdict,
    pub decided_at: Timestamp,
}

// ── Disputes ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisputeStatus {
    Pending,
    Investigating,
    Resolved { resolution: String, resolved_at: Timestamp },
    Dismissed { reason: String, dismissed_at: Timestamp },
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Pending => "pending",
            DisputeStatus::Investigating => "investigating",
            DisputeStatus::Resolved { .. } => "resolved",
            DisputeStatus::Dismissed { .. } => "dismissed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DisputeStatus::Pending | DisputeStatus::Investigating)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub dispute_id: String,
    pub society: SocietyId,
    pub plaintiff: LctId,
    pub defendant: LctId,
    pub claim: String,
    pub evidence: Vec<Vec<u8>>,
    pub status: DisputeStatus,
    pub filed_at: Timestamp,
}
