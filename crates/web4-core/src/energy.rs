//! Energy-cycle records: society-owned pools, ATP/ADP audit tokens and the
//! R6 action descriptor that gates every discharge.
//!
//! Pool conservation: `atp_balance + adp_balance` moves only through Mint
//! (up) and demurrage (down); Discharge and Recharge are total-preserving.

use serde::{Deserialize, Serialize};

use crate::score::ScoreMicros;
use crate::types::{AdpId, Amount, AtpId, LctId, SocietyId, Timestamp};

// ── Pool ──────────────────────────────────────────────────────────────────────

/// One energy pool per society. Tokens are society-owned; there is no
/// per-LCT wallet, only pool-level balances plus per-token audit records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyPool {
    pub society: SocietyId,
    pub atp_balance: Amount,
    pub adp_balance: Amount,
    /// Minimum ratio of circulating flow to stock, micro-units.
    pub velocity_requirement: ScoreMicros,
    /// Per-epoch decay applied to the ATP balance, micro-units.
    pub demurrage_rate: ScoreMicros,
    /// Rolling discharge volume within the current velocity window.
    pub discharged_in_window: Amount,
    pub window_start: Timestamp,
    pub last_demurrage_at: Timestamp,
}

impl EnergyPool {
    pub fn total(&self) -> Amount {
        self.atp_balance + self.adp_balance
    }

    /// ATP floor implied by the velocity requirement: discharges must not
    /// take the charged balance below this reserve.
    pub fn protected_reserve(&self) -> Amount {
        (self.total() * self.velocity_requirement as u128)
            / crate::score::SCORE_SCALE as u128
    }
}

// ── Tokens ────────────────────────────────────────────────────────────────────

/// Audit record for charged energy entering the pool (mint or recharge).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtpToken {
    pub id: AtpId,
    pub society: SocietyId,
    pub amount: Amount,
    pub recharged_by: LctId,
    pub recharge_time: Timestamp,
    /// Producer work-proof signature; empty for treasury mints.
    pub work_proof: Vec<u8>,
}

/// A discharged token awaiting recharge. Single-consumption: deleted when
/// recharged, after which its id resolves to nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdpToken {
    pub id: AdpId,
    pub society: SocietyId,
    pub amount: Amount,
    pub discharged_by: LctId,
    pub discharge_time: Timestamp,
    pub r6: R6Action,
}

// ── R6 ────────────────────────────────────────────────────────────────────────

/// The six-field descriptor required to authorise any discharge:
/// rules, roles, request, reference, resource, result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct R6Action {
    pub rules: String,
    pub roles: String,
    pub request: String,
    pub reference: String,
    pub resource: String,
    pub result: String,
}

impl R6Action {
    /// Field-level validation shared by every discharge path:
    /// all six fields non-empty and within the size limit, `roles` naming
    /// the acting LCT, `resource` parsing to exactly the discharged amount.
    pub fn validate(
        &self,
        caller: &LctId,
        amount: Amount,
        max_field_bytes: usize,
    ) -> Result<(), String> {
        for (name, value) in [
            ("rules", &self.rules),
            ("roles", &self.roles),
            ("request", &self.request),
            ("reference", &self.reference),
            ("resource", &self.resource),
            ("result", &self.result),
        ] {
            if value.is_empty() {
                return Err(format!("{name} field is empty"));
            }
            if value.len() > max_field_bytes {
                return Err(format!("{name} field exceeds {max_field_bytes} bytes"));
            }
        }
        if !self.roles.contains(caller.as_str()) {
            return Err(format!("roles does not name the acting lct {caller}"));
        }
        let declared: Amount = self
            .resource
            .trim()
            .parse()
            .map_err(|_| "resource is not a parseable amount".to_string())?;
        if declared != amount {
            return Err(format!(
                "resource declares {declared} but discharge is for {amount}"
            ));
        }
        Ok(())
    }
}
