//! web4-energy
//!
//! The ATP/ADP energy cycle. One pool per society; tokens are
//! society-owned with per-token audit records. Discharge is R6-gated and
//! velocity-enforced, recharge is work-proof-gated, and pool totals move
//! only through mint and the demurrage sweep.

pub mod query;

pub use query::EnergyQuery;

use tracing::info;

use web4_core::constants::WORK_PROOF_DOMAIN;
use web4_core::energy::{AdpToken, AtpToken, EnergyPool, R6Action};
use web4_core::error::Web4Error;
use web4_core::lct::Lct;
use web4_core::params::EnergyParams;
use web4_core::score::SCORE_SCALE;
use web4_core::types::{AdpId, Amount, Ed25519Signature, LctId, SocietyId};
use web4_crypto::{adp_id, atp_id, verify_signature};
use web4_state::{Event, TxCtx};

/// Keeper for energy pools and token audit state.
pub struct EnergyKeeper;

impl EnergyKeeper {
    // ── Pool lifecycle ───────────────────────────────────────────────────────

    /// Create a society's pool with its initial ATP issue. Called by the
    /// society keeper when a society is founded; the initial balance is the
    /// pool's first mint.
    pub fn create_pool(
        ctx: &mut TxCtx,
        society: &SocietyId,
        initial_atp: Amount,
    ) -> Result<(), Web4Error> {
        if ctx.db.get_pool(society)?.is_some() {
            return Err(Web4Error::SocietyAlreadyExists(society.to_string()));
        }
        let params: EnergyParams = ctx.db.get_params("energy")?;
        let pool = EnergyPool {
            society: society.clone(),
            atp_balance: initial_atp,
            adp_balance: 0,
            velocity_requirement: params.velocity_requirement,
            demurrage_rate: params.demurrage_rate,
            discharged_in_window: 0,
            window_start: ctx.now,
            last_demurrage_at: ctx.now,
        };
        ctx.staged.pools.push(pool);
        ctx.emit(
            Event::new("atp_minted")
                .attr("society", society)
                .attr("amount", initial_atp)
                .attr("reason", "pool_created"),
        );
        Ok(())
    }

    /// Issue new ATP into a society's pool. Treasury role only; the only
    /// balance increase besides recharge conversion.
    pub fn mint_atp(
        ctx: &mut TxCtx,
        caller: &Lct,
        society: &SocietyId,
        amount: Amount,
    ) -> Result<(), Web4Error> {
        if amount == 0 {
            return Err(Web4Error::InvalidInput("mint amount must be positive".into()));
        }
        let society_record = ctx
            .db
            .get_society(society)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society.to_string()))?;
        if !society_record.holds_treasury_role(&caller.id) {
            return Err(Web4Error::NotTreasury(society.to_string()));
        }
        let mut pool = ctx
            .db
            .get_pool(society)?
            .ok_or_else(|| Web4Error::PoolNotFound(society.to_string()))?;

        pool.atp_balance += amount;
        let draw = ctx.rng.draws();
        ctx.rng.draw32();
        let token = AtpToken {
            id: atp_id(&caller.id, ctx.now, draw),
            society: society.clone(),
            amount,
            recharged_by: caller.id.clone(),
            recharge_time: ctx.now,
            work_proof: Vec::new(),
        };
        ctx.staged.pools.push(pool);
        ctx.emit(
            Event::new("atp_minted")
                .attr("society", society)
                .attr("amount", amount)
                .attr("atp_id", &token.id)
                .attr("minted_by", &caller.id),
        );
        ctx.staged.atp_tokens.push(token);
        info!(society = %society, amount, "minted atp");
        Ok(())
    }

    // ── Discharge ────────────────────────────────────────────────────────────

    /// R6-gated discharge: ATP → ADP, total-preserving. The caller must be
    /// a citizen of the society; the pool must stay above the velocity
    /// reserve.
    pub fn discharge(
        ctx: &mut TxCtx,
        caller: &Lct,
        society: &SocietyId,
        amount: Amount,
        r6: R6Action,
    ) -> Result<AdpId, Web4Error> {
        if amount == 0 {
            return Err(Web4Error::InvalidInput("discharge amount must be positive".into()));
        }
        let params: EnergyParams = ctx.db.get_params("energy")?;
        let society_record = ctx
            .db
            .get_society(society)?
            .ok_or_else(|| Web4Error::SocietyNotFound(society.to_string()))?;
        if society_record.member(&caller.id).is_none() {
            return Err(Web4Error::Unauthorized(format!(
                "{} is not a citizen of {society}",
                caller.id
            )));
        }
        r6.validate(&caller.id, amount, params.r6_max_field_bytes)
            .map_err(Web4Error::InvalidR6)?;

        let mut pool = ctx
            .db
            .get_pool(society)?
            .ok_or_else(|| Web4Error::PoolNotFound(society.to_string()))?;
        if pool.atp_balance < amount {
            return Err(Web4Error::InsufficientAtp {
                need: amount,
                have: pool.atp_balance,
            });
        }
        let reserve = pool.protected_reserve();
        if pool.atp_balance - amount < reserve {
            return Err(Web4Error::VelocityViolation { reserve });
        }

        // Roll the velocity window before accounting this discharge.
        if ctx.now >= pool.window_start + params.velocity_window_secs {
            pool.window_start = ctx.now;
            pool.discharged_in_window = 0;
        }
        pool.discharged_in_window += amount;
        pool.atp_balance -= amount;
        pool.adp_balance += amount;

        let draw = ctx.rng.draws();
        ctx.rng.draw32();
        let token = AdpToken {
            id: adp_id(&caller.id, ctx.now, draw),
            society: society.clone(),
            amount,
            discharged_by: caller.id.clone(),
            discharge_time: ctx.now,
            r6,
        };
        let id = token.id.clone();
        ctx.staged.pools.push(pool);
        ctx.staged.adp_tokens.push(token);
        ctx.emit(
            Event::new("atp_discharged")
                .attr("society", society)
                .attr("amount", amount)
                .attr("adp_id", &id)
                .attr("discharged_by", &caller.id),
        );
        info!(society = %society, amount, adp = %id, "discharged atp");
        Ok(id)
    }

    // ── Recharge ─────────────────────────────────────────────────────────────

    /// Work-proof-gated recharge: ADP → ATP, total-preserving. The ADP
    /// token is single-consumption; its id resolves to nothing afterwards.
    pub fn recharge(
        ctx: &mut TxCtx,
        caller: &Lct,
        id: &AdpId,
        producer: &str,
        work_proof: &Ed25519Signature,
    ) -> Result<(), Web4Error> {
        let params: EnergyParams = ctx.db.get_params("energy")?;
        let token = ctx
            .db
            .get_adp_token(id)?
            .ok_or_else(|| Web4Error::AdpNotFound(id.to_string()))?;

        let producer_key = params
            .approved_producers
            .iter()
            .find(|p| p.name == producer)
            .map(|p| p.key)
            .ok_or_else(|| {
                Web4Error::InvalidWorkProof(format!("{producer} is not an approved producer"))
            })?;
        verify_signature(&producer_key, &work_proof_message(id, token.amount), work_proof)
            .map_err(|_| Web4Error::InvalidWorkProof("signature does not verify".into()))?;

        let mut pool = ctx
            .db
            .get_pool(&token.society)?
            .ok_or_else(|| Web4Error::PoolNotFound(token.society.to_string()))?;
        pool.adp_balance -= token.amount;
        pool.atp_balance += token.amount;

        let draw = ctx.rng.draws();
        ctx.rng.draw32();
        let audit = AtpToken {
            id: atp_id(&caller.id, ctx.now, draw),
            society: token.society.clone(),
            amount: token.amount,
            recharged_by: caller.id.clone(),
            recharge_time: ctx.now,
            work_proof: work_proof.as_bytes().to_vec(),
        };
        ctx.staged.pools.push(pool);
        ctx.staged.adp_consumed.push(id.clone());
        ctx.emit(
            Event::new("adp_recharged")
                .attr("society", &token.society)
                .attr("amount", token.amount)
                .attr("adp_id", id)
                .attr("atp_id", &audit.id)
                .attr("producer", producer),
        );
        ctx.staged.atp_tokens.push(audit);
        info!(adp = %id, producer, "recharged adp");
        Ok(())
    }

    // ── Demurrage ────────────────────────────────────────────────────────────

    /// End-of-epoch sweep: for every pool with one or more elapsed epochs,
    /// burn floor(atp · rate) per epoch. The only non-conservative pool
    /// operation besides mint.
    pub fn apply_demurrage(ctx: &mut TxCtx) -> Result<u32, Web4Error> {
        let params: EnergyParams = ctx.db.get_params("energy")?;
        if params.demurrage_epoch_secs <= 0 {
            return Ok(0);
        }
        let mut swept = 0;
        for mut pool in ctx.db.iter_pools()? {
            let mut burned: Amount = 0;
            while ctx.now >= pool.last_demurrage_at + params.demurrage_epoch_secs {
                let cut = (pool.atp_balance * pool.demurrage_rate as u128)
                    / SCORE_SCALE as u128;
                pool.atp_balance -= cut;
                burned += cut;
                pool.last_demurrage_at += params.demurrage_epoch_secs;
            }
            if burned > 0 {
                ctx.emit(
                    Event::new("demurrage_applied")
                        .attr("society", &pool.society)
                        .attr("burned", burned),
                );
                ctx.staged.pools.push(pool);
                swept += 1;
            }
        }
        Ok(swept)
    }
}

/// Build the message a producer signs to prove work behind a recharge.
pub fn work_proof_message(id: &AdpId, amount: Amount) -> Vec<u8> {
    let mut message = Vec::with_capacity(WORK_PROOF_DOMAIN.len() + 64);
    message.extend_from_slice(WORK_PROOF_DOMAIN);
    message.extend_from_slice(id.as_bytes());
    message.extend_from_slice(&amount.to_be_bytes());
    message
}
