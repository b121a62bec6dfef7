//! web4-registry
//!
//! Anonymous component registry: real-world identifiers are hashed with
//! domain separation before anything reaches state, and pairing policy
//! between component hashes is table-driven.

pub mod query;

pub use query::RegistryQuery;

use tracing::info;

use web4_core::error::Web4Error;
use web4_core::registry::{
    AuthorizationDecision, ComponentRecord, PairingAuthorization, RevocationEvent,
};
use web4_core::types::{ComponentHash, LctId};
use web4_crypto::{category_hash, component_hash, manufacturer_hash};
use web4_state::{Event, StateDb, TxCtx};

/// Keeper for the anonymous component registry.
pub struct RegistryKeeper;

impl RegistryKeeper {
    /// Register an anonymous component. The real identifiers are hashed and
    /// discarded; only the hash triple is stored. Idempotent: identical
    /// inputs return the existing record with no state change.
    pub fn register_component(
        ctx: &mut TxCtx,
        caller: &LctId,
        real_id: &str,
        manufacturer_id: &str,
        category: &str,
        context: &str,
    ) -> Result<(ComponentHash, ComponentHash, ComponentHash), Web4Error> {
        if real_id.is_empty() || manufacturer_id.is_empty() || category.is_empty() {
            return Err(Web4Error::InvalidInput(
                "real_id, manufacturer_id and category must be non-empty".into(),
            ));
        }

        let hashes = (
            component_hash(real_id),
            manufacturer_hash(manufacturer_id),
            category_hash(category),
        );

        // Idempotent re-registration: return the stored triple untouched.
        if let Some(existing) = ctx.db.get_component(&hashes.0)? {
            return Ok((
                existing.component_hash,
                existing.manufacturer_hash,
                existing.category_hash,
            ));
        }

        let record = ComponentRecord {
            component_hash: hashes.0.clone(),
            manufacturer_hash: hashes.1.clone(),
            category_hash: hashes.2.clone(),
            registered_by: caller.clone(),
            context: context.to_string(),
            registered_at: ctx.now,
        };
        ctx.staged.components.push(record);
        ctx.emit(
            Event::new("component_registered")
                .attr("component_hash", &hashes.0)
                .attr("manufacturer_hash", &hashes.1)
                .attr("category_hash", &hashes.2)
                .attr("registered_by", caller),
        );
        info!(component = %hashes.0, "registered anonymous component");
        Ok(hashes)
    }

    /// Insert a pairing policy row for a (source, target) hash pair. Both
    /// hashes must already be registered.
    pub fn create_pairing_authorization(
        ctx: &mut TxCtx,
        caller: &LctId,
        source: &ComponentHash,
        target: &ComponentHash,
        context: &str,
        allowed: bool,
    ) -> Result<(), Web4Error> {
        if ctx.db.get_component(source)?.is_none() {
            return Err(Web4Error::ComponentNotFound(source.to_string()));
        }
        if ctx.db.get_component(target)?.is_none() {
            return Err(Web4Error::ComponentNotFound(target.to_string()));
        }
        let auth = PairingAuthorization {
            source_hash: source.clone(),
            target_hash: target.clone(),
            context: context.to_string(),
            allowed,
            created_by: caller.clone(),
            created_at: ctx.now,
        };
        ctx.staged.pairing_auths.push(auth);
        ctx.emit(
            Event::new("pairing_authorization_created")
                .attr("source_hash", source)
                .attr("target_hash", target)
                .attr("allowed", allowed),
        );
        Ok(())
    }

    /// Record a revocation against a component hash. Revoked components
    /// fail every subsequent authorization check.
    pub fn create_revocation_event(
        ctx: &mut TxCtx,
        caller: &LctId,
        target: &ComponentHash,
        reason: &str,
    ) -> Result<(), Web4Error> {
        if reason.is_empty() {
            return Err(Web4Error::InvalidInput("revocation reason is mandatory".into()));
        }
        if ctx.db.get_component(target)?.is_none() {
            return Err(Web4Error::ComponentNotFound(target.to_string()));
        }
        let revocation = RevocationEvent {
            target_hash: target.clone(),
            reason: reason.to_string(),
            created_by: caller.clone(),
            created_at: ctx.now,
        };
        ctx.staged.revocations.push(revocation);
        ctx.emit(
            Event::new("component_revoked")
                .attr("target_hash", target)
                .attr("reason", reason),
        );
        Ok(())
    }

    /// Table-driven authorization check between two component hashes:
    /// revocations deny first; an explicit rule in either direction decides
    /// next; otherwise components of the same manufacturer may pair, and
    /// everything else is denied.
    pub fn check_pairing_authorization(
        db: &StateDb,
        source: &ComponentHash,
        target: &ComponentHash,
    ) -> Result<AuthorizationDecision, Web4Error> {
        if !db.iter_revocations(source)?.is_empty() {
            return Ok(AuthorizationDecision {
                authorized: false,
                reason: format!("source component {source} is revoked"),
            });
        }
        if !db.iter_revocations(target)?.is_empty() {
            return Ok(AuthorizationDecision {
                authorized: false,
                reason: format!("target component {target} is revoked"),
            });
        }

        let rule = match db.get_pairing_auth(source, target)? {
            Some(rule) => Some(rule),
            None => db.get_pairing_auth(target, source)?,
        };
        if let Some(rule) = rule {
            return Ok(AuthorizationDecision {
                authorized: rule.allowed,
                reason: format!("explicit rule ({})", rule.context),
            });
        }

        let source_record = db
            .get_component(source)?
            .ok_or_else(|| Web4Error::ComponentNotFound(source.to_string()))?;
        let target_record = db
            .get_component(target)?
            .ok_or_else(|| Web4Error::ComponentNotFound(target.to_string()))?;
        if source_record.manufacturer_hash == target_record.manufacturer_hash {
            return Ok(AuthorizationDecision {
                authorized: true,
                reason: "same manufacturer".into(),
            });
        }
        Ok(AuthorizationDecision {
            authorized: false,
            reason: "no authorization rule for this pair".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_state::BlockCtx;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("web4_registry_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn block() -> BlockCtx {
        BlockCtx::new(1, 1_000, [9u8; 32])
    }

    fn caller() -> LctId {
        LctId("lct:caller".into())
    }

    fn register(db: &StateDb, real: &str, mfr: &str) -> ComponentHash {
        let mut ctx = TxCtx::new(db, &block(), 0);
        let (ch, _, _) =
            RegistryKeeper::register_component(&mut ctx, &caller(), real, mfr, "battery", "test")
                .unwrap();
        ctx.commit().unwrap();
        ch
    }

    #[test]
    fn register_rejects_empty_fields() {
        let db = temp_db("empty");
        let mut ctx = TxCtx::new(&db, &block(), 0);
        let err =
            RegistryKeeper::register_component(&mut ctx, &caller(), "", "mfr", "cat", "")
                .unwrap_err();
        assert_eq!(err.code(), web4_core::error::ErrorCode::InvalidInput);
    }

    #[test]
    fn register_is_idempotent() {
        let db = temp_db("idem");
        let first = register(&db, "SN-1", "MFR-A");

        // Second registration returns the same hashes and stages nothing.
        let mut ctx = TxCtx::new(&db, &block(), 1);
        let (again, _, _) = RegistryKeeper::register_component(
            &mut ctx, &caller(), "SN-1", "MFR-A", "battery", "test",
        )
        .unwrap();
        assert_eq!(first, again);
        assert!(ctx.staged.components.is_empty());
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn same_manufacturer_pairs_by_default() {
        let db = temp_db("mfr");
        let a = register(&db, "SN-1", "MFR-A");
        let b = register(&db, "SN-2", "MFR-A");
        let c = register(&db, "SN-3", "MFR-B");

        let decision = RegistryKeeper::check_pairing_authorization(&db, &a, &b).unwrap();
        assert!(decision.authorized);

        let decision = RegistryKeeper::check_pairing_authorization(&db, &a, &c).unwrap();
        assert!(!decision.authorized);
    }

    #[test]
    fn explicit_rule_overrides_default() {
        let db = temp_db("rule");
        let a = register(&db, "SN-1", "MFR-A");
        let c = register(&db, "SN-3", "MFR-B");

        let mut ctx = TxCtx::new(&db, &block(), 2);
        RegistryKeeper::create_pairing_authorization(&mut ctx, &caller(), &a, &c, "fleet", true)
            .unwrap();
        ctx.commit().unwrap();

        // Checked in both directions.
        assert!(RegistryKeeper::check_pairing_authorization(&db, &a, &c).unwrap().authorized);
        assert!(RegistryKeeper::check_pairing_authorization(&db, &c, &a).unwrap().authorized);
    }

    #[test]
    fn revocation_denies_everything() {
        let db = temp_db("revoke");
        let a = register(&db, "SN-1", "MFR-A");
        let b = register(&db, "SN-2", "MFR-A");

        let mut ctx = TxCtx::new(&db, &block(), 3);
        RegistryKeeper::create_revocation_event(&mut ctx, &caller(), &a, "recalled").unwrap();
        ctx.commit().unwrap();

        let decision = RegistryKeeper::check_pairing_authorization(&db, &a, &b).unwrap();
        assert!(!decision.authorized);
        assert!(decision.reason.contains("revoked"));
    }
}
