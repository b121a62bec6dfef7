//! web4-genesis
//!
//! Builds the founding state from scratch, writing directly into a
//! `StateDb` without going through the transaction engine (genesis carries
//! no transaction signatures; it is the founding document):
//!
//! 1. Founder LCT (human), treasury role LCT, law-oracle role LCT.
//! 2. The founding society's own LCT plus its record, with the founder
//!    seated as first treasury-role holder.
//! 3. The society's energy pool with its initial ATP issue.
//! 4. Energy params carrying the approved producer set.
//!
//! The founding society id is recorded under the `genesis_society` meta key;
//! the engine gates administrative messages on its treasury role.

pub mod params;

pub use params::{GenesisIdentity, GenesisKeys, GenesisParams};

use std::collections::BTreeMap;
use tracing::info;

use web4_core::energy::EnergyPool;
use web4_core::error::Web4Error;
use web4_core::lct::{EntityType, Lct, LctStatus, Mrh};
use web4_core::params::EnergyParams;
use web4_core::society::{CitizenRecord, Society};
use web4_core::types::{LctId, SocietyId};
use web4_crypto::{lct_id_from_keys, verify_binding};
use web4_state::StateDb;

/// Meta key holding the founding society id.
pub const GENESIS_SOCIETY_KEY: &str = "genesis_society";

/// Build the founding state. Fails if any binding signature is invalid or
/// the database already carries a genesis.
pub fn build(db: &StateDb, params: &GenesisParams) -> Result<SocietyId, Web4Error> {
    if db.get_meta(GENESIS_SOCIETY_KEY)?.is_some() {
        return Err(Web4Error::InvalidInput("genesis already written".into()));
    }

    let founder = write_lct(db, &params.founder, EntityType::Human, params.genesis_time)?;
    let treasury_role =
        write_lct(db, &params.treasury_role, EntityType::Role, params.genesis_time)?;
    let law_oracle =
        write_lct(db, &params.law_oracle_role, EntityType::Role, params.genesis_time)?;
    let society_id = write_lct(db, &params.society, EntityType::Society, params.genesis_time)?;

    let mut members = BTreeMap::new();
    members.insert(
        founder.clone(),
        CitizenRecord {
            lct: founder.clone(),
            role: treasury_role.clone(),
            rights: params.constitution.rights.clone(),
            responsibilities: params.constitution.responsibilities.clone(),
            joined_at: params.genesis_time,
            atp_allocated: 0,
        },
    );
    let society = Society {
        lct_id: society_id.clone(),
        name: params.society_name.clone(),
        law_oracle_lct: law_oracle,
        treasury_role,
        constitution: params.constitution.clone(),
        members,
        created_at: params.genesis_time,
    };
    db.put_society(&society)?;

    let energy_params = EnergyParams {
        approved_producers: params.approved_producers.clone(),
        ..EnergyParams::default()
    };
    db.put_params("energy", &energy_params)?;
    db.put_pool(&EnergyPool {
        society: society_id.clone(),
        atp_balance: params.initial_atp,
        adp_balance: 0,
        velocity_requirement: energy_params.velocity_requirement,
        demurrage_rate: energy_params.demurrage_rate,
        discharged_in_window: 0,
        window_start: params.genesis_time,
        last_demurrage_at: params.genesis_time,
    })?;

    db.put_meta(GENESIS_SOCIETY_KEY, society_id.as_bytes())?;
    db.flush()?;
    info!(society = %society_id, name = %params.society_name, "genesis written");
    Ok(society_id)
}

fn write_lct(
    db: &StateDb,
    identity: &GenesisIdentity,
    entity_type: EntityType,
    now: i64,
) -> Result<LctId, Web4Error> {
    verify_binding(
        &identity.signing_key,
        &identity.agreement_key,
        &identity.binding_signature,
    )?;
    let id = lct_id_from_keys(&identity.signing_key, &identity.agreement_key);
    let lct = Lct {
        id: id.clone(),
        entity_type,
        signing_key: identity.signing_key,
        agreement_key: identity.agreement_key,
        binding_signature: identity.binding_signature.clone(),
        created_by: id.clone(),
        bound_entity: None,
        birth_certificate: None,
        status: LctStatus::Active,
        nonce: 0,
        created_at: now,
        updated_at: now,
    };
    db.put_lct(&lct)?;
    db.put_mrh(&Mrh::new(id.clone()))?;
    Ok(id)
}

/// The founding society id, if a genesis has been written.
pub fn genesis_society(db: &StateDb) -> Result<Option<SocietyId>, Web4Error> {
    Ok(db
        .get_meta(GENESIS_SOCIETY_KEY)?
        .map(|bytes| LctId(String::from_utf8_lossy(&bytes).into_owned())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_core::society::Constitution;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("web4_genesis_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn constitution() -> Constitution {
        Constitution {
            membership_open: true,
            ..Constitution::default()
        }
    }

    #[test]
    fn build_seeds_society_pool_and_seats() {
        let db = temp_db("build");
        let (params, keys) = GenesisParams::generate(1_000, "pit-lane", constitution(), 10_000);
        let society_id = build(&db, &params).unwrap();

        let society = db.get_society(&society_id).unwrap().unwrap();
        assert!(society.holds_treasury_role(&keys.founder.lct_id));
        assert_eq!(society.name, "pit-lane");

        let pool = db.get_pool(&society_id).unwrap().unwrap();
        assert_eq!(pool.atp_balance, 10_000);
        assert_eq!(pool.adp_balance, 0);

        let oracle = db.get_lct(&society.law_oracle_lct).unwrap().unwrap();
        assert_eq!(oracle.entity_type, EntityType::Role);
        assert_eq!(genesis_society(&db).unwrap(), Some(society_id));
    }

    #[test]
    fn params_json_round_trip() {
        let (params, _) = GenesisParams::generate(1_000, "pit-lane", constitution(), 10_000);
        let json = params.to_json().unwrap();
        let parsed = GenesisParams::from_json(&json).unwrap();
        assert_eq!(parsed.society_name, params.society_name);
        assert_eq!(parsed.founder.signing_key, params.founder.signing_key);
        assert_eq!(parsed.initial_atp, params.initial_atp);
    }

    #[test]
    fn build_is_once_only() {
        let db = temp_db("once");
        let (params, _) = GenesisParams::generate(1_000, "pit-lane", constitution(), 10_000);
        build(&db, &params).unwrap();
        assert!(build(&db, &params).is_err());
    }
}
