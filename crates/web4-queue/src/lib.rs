//! web4-queue
//!
//! Offline pairing-request queue: requests park per target in three indexed
//! sub-queues (priority, standard, proxy) and drain in strict
//! (priority DESC, created_at ASC) order when the target comes online.
//! Transient pairing failures reschedule with deterministic exponential
//! backoff; expiry is lazy plus a paginated end-of-block sweep.

pub mod query;
pub mod retry;

pub use query::QueueQuery;
pub use retry::{backoff_delay_secs, is_permanent_pairing_failure};

use tracing::{info, warn};

use web4_core::constants::{MAX_METADATA_BYTES, MAX_METADATA_ENTRIES};
use web4_core::error::Web4Error;
use web4_core::lct::Lct;
use web4_core::params::QueueParams;
use web4_core::queue::{
    OfflineOperation, PairingRequest, Priority, RequestStatus, RequestType, SubQueue,
};
use web4_core::types::{LctId, RequestId};
use web4_crypto::request_id;
use web4_lct::LctKeeper;
use web4_pairing::PairingKeeper;
use web4_state::{Event, TxCtx};

use std::collections::BTreeMap;

/// Outcome of one batch-processing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub completed: u32,
    pub retried: u32,
    pub failed: u32,
    pub expired: u32,
}

/// Keeper for the offline request queue.
pub struct QueueKeeper;

impl QueueKeeper {
    // ── Queue ────────────────────────────────────────────────────────────────

    /// Park a pairing request for an offline `target`.
    pub fn queue_request(
        ctx: &mut TxCtx,
        initiator: &Lct,
        target: &LctId,
        request_type: RequestType,
        priority: Priority,
        expiry_hours: Option<u32>,
        proxy: Option<LctId>,
        metadata: BTreeMap<String, String>,
    ) -> Result<RequestId, Web4Error> {
        let params: QueueParams = ctx.db.get_params("queue")?;

        if !ctx.db.lct_exists(target) {
            return Err(Web4Error::LctNotFound(target.to_string()));
        }
        if initiator.id == *target {
            return Err(Web4Error::InvalidInput("cannot queue a request against oneself".into()));
        }
        validate_metadata(&metadata)?;

        let expiry = expiry_hours.unwrap_or(params.max_queue_time_hours);
        if expiry == 0 {
            return Err(Web4Error::InvalidInput("expiry must be at least one hour".into()));
        }
        if expiry > params.max_queue_time_hours {
            return Err(Web4Error::QueueTimeTooLong {
                got: expiry,
                max: params.max_queue_time_hours,
            });
        }

        let mut offline_op = ctx
            .db
            .get_offline_op(target)?
            .unwrap_or_else(|| OfflineOperation::new(target.clone(), ctx.now));
        if offline_op.pending_requests.len() as u32 >= params.max_requests_per_component {
            return Err(Web4Error::QueueFull {
                target: target.to_string(),
                max: params.max_requests_per_component,
            });
        }

        let proxy_component = match request_type {
            RequestType::Proxy => {
                let proxy = proxy.ok_or_else(|| {
                    Web4Error::InvalidInput("proxy requests must name a proxy component".into())
                })?;
                LctKeeper::require_active(ctx.db, &proxy)?;
                if !offline_op.accepts_proxy {
                    return Err(Web4Error::Unauthorized(format!(
                        "{target} does not accept proxy operations"
                    )));
                }
                Some(proxy)
            }
            _ => None,
        };

        let entropy = ctx.rng.draw32();
        let rid = request_id(&initiator.id, target, &entropy);
        let request = PairingRequest {
            request_id: rid.clone(),
            initiator: initiator.id.clone(),
            target: target.clone(),
            request_type,
            priority,
            status: RequestStatus::Queued,
            created_at: ctx.now,
            expires_at: ctx.now + expiry as i64 * 3_600,
            retry_count: 0,
            next_attempt_at: 0,
            proxy_component,
            metadata,
        };

        offline_op.pending_requests.push(rid.clone());
        offline_op.operation_count += 1;

        ctx.staged.queue_index_puts.push((request.index_key(), rid.clone()));
        ctx.staged.requests.push(request);
        ctx.staged.offline_ops.push(offline_op);
        ctx.emit(
            Event::new("request_queued")
                .attr("request_id", &rid)
                .attr("initiator", &initiator.id)
                .attr("target", target)
                .attr("type", request_type.as_str())
                .attr("priority", priority.as_str()),
        );
        info!(request = %rid, target = %target, priority = priority.as_str(), "request queued");
        Ok(rid)
    }

    // ── Process ──────────────────────────────────────────────────────────────

    /// Drain up to `max_ops` requests for `target`: priority sub-queue
    /// first, then standard, then proxy (when enabled and requested); each
    /// sub-queue in strict (priority DESC, created_at ASC) order.
    pub fn process_offline_queue(
        ctx: &mut TxCtx,
        caller: &Lct,
        target: &LctId,
        process_proxy: bool,
        max_ops: u32,
    ) -> Result<ProcessOutcome, Web4Error> {
        let params: QueueParams = ctx.db.get_params("queue")?;

        let target_lct = ctx
            .db
            .get_lct(target)?
            .ok_or_else(|| Web4Error::LctNotFound(target.to_string()))?;
        // Coming online is the target's own act: the target or whoever
        // controls it drains the queue.
        if !target_lct.controlled_by(&caller.id) {
            return Err(Web4Error::Unauthorized(format!(
                "{} does not control queue target {target}",
                caller.id
            )));
        }

        let max_ops = if max_ops == 0 { params.max_batch_processing_size } else { max_ops };
        if max_ops > params.max_batch_processing_size {
            return Err(Web4Error::InvalidInput(format!(
                "max_ops {max_ops} exceeds batch limit {}",
                params.max_batch_processing_size
            )));
        }

        let mut offline_op = ctx
            .db
            .get_offline_op(target)?
            .unwrap_or_else(|| OfflineOperation::new(target.clone(), ctx.now));

        let mut sub_queues = vec![SubQueue::Priority, SubQueue::Standard];
        if process_proxy && params.enable_proxy_processing {
            sub_queues.push(SubQueue::Proxy);
        }

        let mut outcome = ProcessOutcome::default();
        let mut slots_used = 0u32;
        'queues: for sub_queue in sub_queues {
            for (index_key, rid) in ctx.db.scan_sub_queue(target, sub_queue)? {
                if slots_used >= max_ops {
                    break 'queues;
                }
                let Some(mut request) = ctx.db.get_request(&rid)? else {
                    warn!(request = %rid, "sub-queue index points at missing request");
                    ctx.staged.queue_index_dels.push(index_key);
                    continue;
                };
                if request.status != RequestStatus::Queued {
                    // Stale index entry from an earlier terminal transition.
                    ctx.staged.queue_index_dels.push(request.index_key());
                    continue;
                }

                // Lazy expiry during traversal.
                if params.auto_cancel_expired && request.is_expired(ctx.now) {
                    Self::finish(ctx, &mut offline_op, &mut request,
                        RequestStatus::Expired { expired_at: ctx.now });
                    ctx.emit(
                        Event::new("request_expired").attr("request_id", &request.request_id),
                    );
                    outcome.expired += 1;
                    continue;
                }
                // Backoff: not yet eligible, does not consume a slot.
                if request.next_attempt_at > ctx.now {
                    continue;
                }

                slots_used += 1;
                request.status = RequestStatus::Processing;
                let result = Self::attempt_pairing(ctx, &request);
                match result {
                    Ok(()) => {
                        Self::finish(ctx, &mut offline_op, &mut request,
                            RequestStatus::Completed { completed_at: ctx.now });
                        outcome.completed += 1;
                    }
                    Err(err) if is_permanent_pairing_failure(&err) => {
                        let reason = err.to_string();
                        Self::finish(ctx, &mut offline_op, &mut request,
                            RequestStatus::Failed { failed_at: ctx.now, reason: reason.clone() });
                        ctx.emit(
                            Event::new("request_failed")
                                .attr("request_id", &request.request_id)
                                .attr("reason", &reason),
                        );
                        outcome.failed += 1;
                    }
                    Err(err) => {
                        // Transient: reschedule with exponential backoff, or
                        // give up once the retry budget is spent.
                        request.retry_count += 1;
                        if params.enable_retry && request.retry_count <= params.max_retry_attempts {
                            request.next_attempt_at = ctx.now
                                + backoff_delay_secs(params.retry_base_minutes, request.retry_count);
                            request.status = RequestStatus::Queued;
                            ctx.staged.requests.push(request);
                            outcome.retried += 1;
                        } else {
                            let reason = format!("retries exhausted: {err}");
                            Self::finish(ctx, &mut offline_op, &mut request,
                                RequestStatus::Failed { failed_at: ctx.now, reason: reason.clone() });
                            ctx.emit(
                                Event::new("request_failed")
                                    .attr("request_id", &request.request_id)
                                    .attr("reason", &reason),
                            );
                            outcome.failed += 1;
                        }
                    }
                }
            }
        }

        offline_op.last_seen = ctx.now;
        ctx.staged.offline_ops.push(offline_op);
        ctx.emit(
            Event::new("queue_processed")
                .attr("target", target)
                .attr("completed", outcome.completed)
                .attr("retried", outcome.retried)
                .attr("failed", outcome.failed)
                .attr("expired", outcome.expired),
        );
        info!(target = %target, ?outcome, "processed offline queue");
        Ok(outcome)
    }

    /// One pairing attempt on behalf of a queued request.
    fn attempt_pairing(ctx: &mut TxCtx, request: &PairingRequest) -> Result<(), Web4Error> {
        let initiator = LctKeeper::require_active(ctx.db, &request.initiator)?;
        let counterparty = request.pairing_counterparty().clone();
        PairingKeeper::initiate(ctx, &initiator, &counterparty, None, request.metadata.clone())
            .map(|_| ())
    }

    /// Terminal transition shared by completion, failure, expiry and
    /// cancellation: drop the index entry and the offline back-pointer.
    fn finish(
        ctx: &mut TxCtx,
        offline_op: &mut OfflineOperation,
        request: &mut PairingRequest,
        status: RequestStatus,
    ) {
        ctx.staged.queue_index_dels.push(request.index_key());
        offline_op.pending_requests.retain(|r| *r != request.request_id);
        request.status = status;
        ctx.staged.requests.push(request.clone());
    }

    // ── Cancel ───────────────────────────────────────────────────────────────

    /// Cancel a queued request. Only the initiator (or its controller) may
    /// cancel, only from status `queued`, and a reason is mandatory.
    pub fn cancel_request(
        ctx: &mut TxCtx,
        caller: &Lct,
        rid: &RequestId,
        reason: &str,
    ) -> Result<(), Web4Error> {
        if reason.is_empty() {
            return Err(Web4Error::InvalidInput("cancellation reason is mandatory".into()));
        }
        let mut request = ctx
            .db
            .get_request(rid)?
            .ok_or_else(|| Web4Error::RequestNotFound(rid.to_string()))?;
        let initiator = ctx
            .db
            .get_lct(&request.initiator)?
            .ok_or_else(|| Web4Error::LctNotFound(request.initiator.to_string()))?;
        if !initiator.controlled_by(&caller.id) {
            return Err(Web4Error::Unauthorized(format!(
                "{} did not create request {rid}",
                caller.id
            )));
        }
        if request.status != RequestStatus::Queued {
            return Err(Web4Error::InvalidInput(format!(
                "request {rid} is {}, only queued requests cancel",
                request.status.as_str()
            )));
        }

        let mut offline_op = ctx
            .db
            .get_offline_op(&request.target)?
            .unwrap_or_else(|| OfflineOperation::new(request.target.clone(), ctx.now));
        Self::finish(ctx, &mut offline_op, &mut request,
            RequestStatus::Cancelled { cancelled_at: ctx.now, reason: reason.to_string() });
        ctx.staged.offline_ops.push(offline_op);
        ctx.emit(
            Event::new("request_cancelled")
                .attr("request_id", rid)
                .attr("reason", reason),
        );
        Ok(())
    }

    // ── Expiry sweep ─────────────────────────────────────────────────────────

    /// Deterministic paginated end-of-block sweep: expire overdue queued
    /// requests one page at a time, resuming from a stored cursor. Returns
    /// the number expired this page.
    pub fn sweep_expired(ctx: &mut TxCtx) -> Result<u32, Web4Error> {
        let params: QueueParams = ctx.db.get_params("queue")?;
        if !params.auto_cancel_expired {
            return Ok(0);
        }

        let cursor = ctx.db.get_meta("queue_expiry_cursor")?;
        let page = ctx
            .db
            .scan_requests_after(cursor.as_deref(), params.expiry_sweep_page_size as usize)?;

        let mut expired = 0;
        for mut request in page.iter().cloned() {
            if request.status == RequestStatus::Queued && request.is_expired(ctx.now) {
                let mut offline_op = ctx
                    .db
                    .get_offline_op(&request.target)?
                    .unwrap_or_else(|| OfflineOperation::new(request.target.clone(), ctx.now));
                Self::finish(ctx, &mut offline_op, &mut request,
                    RequestStatus::Expired { expired_at: ctx.now });
                ctx.staged.offline_ops.push(offline_op);
                ctx.emit(Event::new("request_expired").attr("request_id", &request.request_id));
                expired += 1;
            }
        }

        // Advance or wrap the cursor so successive blocks cover the whole
        // request space.
        let next = match page.last() {
            Some(last) if page.len() == params.expiry_sweep_page_size as usize => {
                Some(last.request_id.as_bytes().to_vec())
            }
            _ => None,
        };
        ctx.staged.meta.push(("queue_expiry_cursor".into(), next));
        Ok(expired)
    }
}

fn validate_metadata(metadata: &BTreeMap<String, String>) -> Result<(), Web4Error> {
    if metadata.len() > MAX_METADATA_ENTRIES {
        return Err(Web4Error::MetadataTooLarge(MAX_METADATA_ENTRIES));
    }
    for (key, value) in metadata {
        if key.len() > MAX_METADATA_BYTES || value.len() > MAX_METADATA_BYTES {
            return Err(Web4Error::MetadataTooLarge(MAX_METADATA_ENTRIES));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use web4_core::error::ErrorCode;
    use web4_core::lct::EntityType;
    use web4_crypto::KeyPair;
    use web4_state::{BlockCtx, StateDb};

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("web4_queue_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn block(time: i64, index: u32) -> BlockCtx {
        // Vary the hash with the index so rng streams differ per tx.
        let mut hash = [7u8; 32];
        hash[0] = index as u8;
        BlockCtx::new(1, time, hash)
    }

    fn mint(db: &StateDb, kp: &KeyPair, tx_index: u32) -> Lct {
        let mut ctx = TxCtx::new(db, &block(0, tx_index), tx_index);
        let id = LctKeeper::mint(
            &mut ctx,
            &LctId("lct:operator".into()),
            EntityType::Device,
            kp.signing_public,
            kp.agreement_public,
            kp.binding_signature(),
        )
        .unwrap();
        ctx.commit().unwrap();
        db.get_lct(&id).unwrap().unwrap()
    }

    fn queue(
        db: &StateDb,
        initiator: &Lct,
        target: &LctId,
        priority: Priority,
        time: i64,
        tx_index: u32,
    ) -> RequestId {
        let mut ctx = TxCtx::new(db, &block(time, tx_index), tx_index);
        let rid = QueueKeeper::queue_request(
            &mut ctx,
            initiator,
            target,
            RequestType::Standard,
            priority,
            Some(24),
            None,
            BTreeMap::new(),
        )
        .unwrap();
        ctx.commit().unwrap();
        rid
    }

    #[test]
    fn queue_rejects_unknown_target() {
        let db = temp_db("unknown");
        let kp = KeyPair::generate();
        let initiator = mint(&db, &kp, 0);
        let mut ctx = TxCtx::new(&db, &block(0, 1), 1);
        let err = QueueKeeper::queue_request(
            &mut ctx,
            &initiator,
            &LctId("lct:ghost".into()),
            RequestType::Standard,
            Priority::Normal,
            None,
            None,
            BTreeMap::new(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn priority_ordering_drains_critical_first() {
        let db = temp_db("ordering");
        let (kp_a, kp_b, kp_c, kp_t) = (
            KeyPair::generate(),
            KeyPair::generate(),
            KeyPair::generate(),
            KeyPair::generate(),
        );
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);
        let c = mint(&db, &kp_c, 2);
        let target = mint(&db, &kp_t, 3);

        // Queue (low, t=0), (critical, t=1), (high, t=2).
        let low = queue(&db, &a, &target.id, Priority::Low, 0, 4);
        let critical = queue(&db, &b, &target.id, Priority::Critical, 1, 5);
        let high = queue(&db, &c, &target.id, Priority::High, 2, 6);

        let order: Vec<RequestId> = db
            .scan_sub_queue(&target.id, SubQueue::Standard)
            .unwrap()
            .into_iter()
            .map(|(_, id)| id)
            .collect();
        assert_eq!(order, vec![critical.clone(), high.clone(), low.clone()]);

        let mut ctx = TxCtx::new(&db, &block(10, 7), 7);
        let outcome =
            QueueKeeper::process_offline_queue(&mut ctx, &target, &target.id, false, 3).unwrap();
        ctx.commit().unwrap();
        assert_eq!(outcome.completed, 3);

        for rid in [&critical, &high, &low] {
            let request = db.get_request(rid).unwrap().unwrap();
            assert!(matches!(request.status, RequestStatus::Completed { .. }));
        }
        // The index is drained.
        assert!(db.scan_sub_queue(&target.id, SubQueue::Standard).unwrap().is_empty());
    }

    #[test]
    fn batch_limit_caps_processing() {
        let db = temp_db("batch");
        let kp_t = KeyPair::generate();
        let target = mint(&db, &kp_t, 0);

        let mut initiators = Vec::new();
        for i in 0..3 {
            let kp = KeyPair::generate();
            initiators.push(mint(&db, &kp, 1 + i));
        }
        for (i, initiator) in initiators.iter().enumerate() {
            queue(&db, initiator, &target.id, Priority::Normal, i as i64, 10 + i as u32);
        }

        let mut ctx = TxCtx::new(&db, &block(10, 20), 20);
        let outcome =
            QueueKeeper::process_offline_queue(&mut ctx, &target, &target.id, false, 2).unwrap();
        ctx.commit().unwrap();
        assert_eq!(outcome.completed, 2);
        assert_eq!(db.scan_sub_queue(&target.id, SubQueue::Standard).unwrap().len(), 1);
    }

    #[test]
    fn queue_capacity_boundary() {
        let db = temp_db("capacity");
        let kp_t = KeyPair::generate();
        let target = mint(&db, &kp_t, 0);

        let mut custom = QueueParams::default();
        custom.max_requests_per_component = 2;
        db.put_params("queue", &custom).unwrap();

        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let kp3 = KeyPair::generate();
        let i1 = mint(&db, &kp1, 1);
        let i2 = mint(&db, &kp2, 2);
        let i3 = mint(&db, &kp3, 3);

        // Insertion at the cap succeeds; the next is rejected.
        queue(&db, &i1, &target.id, Priority::Normal, 0, 4);
        queue(&db, &i2, &target.id, Priority::Normal, 1, 5);
        let mut ctx = TxCtx::new(&db, &block(2, 6), 6);
        let err = QueueKeeper::queue_request(
            &mut ctx,
            &i3,
            &target.id,
            RequestType::Standard,
            Priority::Normal,
            None,
            None,
            BTreeMap::new(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn cancel_only_from_queued() {
        let db = temp_db("cancel");
        let (kp_a, kp_t) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let target = mint(&db, &kp_t, 1);
        let rid = queue(&db, &a, &target.id, Priority::Normal, 0, 2);

        // A stranger cannot cancel.
        let kp_s = KeyPair::generate();
        let stranger = mint(&db, &kp_s, 3);
        let mut ctx = TxCtx::new(&db, &block(5, 4), 4);
        let err = QueueKeeper::cancel_request(&mut ctx, &stranger, &rid, "nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        // Reason is mandatory.
        let mut ctx = TxCtx::new(&db, &block(5, 5), 5);
        let err = QueueKeeper::cancel_request(&mut ctx, &a, &rid, "").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        // The initiator cancels.
        let mut ctx = TxCtx::new(&db, &block(5, 6), 6);
        QueueKeeper::cancel_request(&mut ctx, &a, &rid, "changed plans").unwrap();
        ctx.commit().unwrap();
        let request = db.get_request(&rid).unwrap().unwrap();
        assert!(matches!(request.status, RequestStatus::Cancelled { .. }));

        // Cancelled requests cannot cancel again.
        let mut ctx = TxCtx::new(&db, &block(6, 7), 7);
        let err = QueueKeeper::cancel_request(&mut ctx, &a, &rid, "again").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn processing_requires_queue_ownership() {
        let db = temp_db("ownership");
        let (kp_a, kp_t) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let target = mint(&db, &kp_t, 1);
        queue(&db, &a, &target.id, Priority::Normal, 0, 2);

        // The initiator does not control the target's queue.
        let mut ctx = TxCtx::new(&db, &block(10, 3), 3);
        let err =
            QueueKeeper::process_offline_queue(&mut ctx, &a, &target.id, false, 5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn expired_requests_transition_during_processing() {
        let db = temp_db("lazyexpiry");
        let (kp_a, kp_t) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let target = mint(&db, &kp_t, 1);

        // 24h expiry, then process far in the future.
        let rid = queue(&db, &a, &target.id, Priority::Normal, 0, 2);
        let mut ctx = TxCtx::new(&db, &block(48 * 3_600, 3), 3);
        let outcome =
            QueueKeeper::process_offline_queue(&mut ctx, &target, &target.id, false, 5).unwrap();
        ctx.commit().unwrap();
        assert_eq!(outcome.expired, 1);
        assert_eq!(outcome.completed, 0);
        let request = db.get_request(&rid).unwrap().unwrap();
        assert!(matches!(request.status, RequestStatus::Expired { .. }));
    }

    #[test]
    fn already_paired_is_a_permanent_failure() {
        let db = temp_db("permfail");
        let (kp_a, kp_t) = (KeyPair::generate(), KeyPair::generate());
        let a = mint(&db, &kp_a, 0);
        let target = mint(&db, &kp_t, 1);

        // Establish a live pairing first.
        let mut ctx = TxCtx::new(&db, &block(0, 2), 2);
        let sid = PairingKeeper::initiate(&mut ctx, &a, &target.id, Some(30), BTreeMap::new())
            .unwrap();
        ctx.commit().unwrap();
        let session = db.get_session(&sid).unwrap().unwrap();
        let mut ctx = TxCtx::new(&db, &block(1, 3), 3);
        PairingKeeper::complete(&mut ctx, &a, &sid,
            &kp_a.sign(&session.initiator_challenge.challenge)).unwrap();
        ctx.commit().unwrap();
        let session = db.get_session(&sid).unwrap().unwrap();
        let mut ctx = TxCtx::new(&db, &block(2, 4), 4);
        PairingKeeper::complete(&mut ctx, &target, &sid,
            &kp_t.sign(&session.target_challenge.challenge)).unwrap();
        ctx.commit().unwrap();

        // A queued duplicate fails permanently, without retries.
        let rid = queue(&db, &a, &target.id, Priority::Normal, 10, 5);
        let mut ctx = TxCtx::new(&db, &block(20, 6), 6);
        let outcome =
            QueueKeeper::process_offline_queue(&mut ctx, &target, &target.id, false, 5).unwrap();
        ctx.commit().unwrap();
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.retried, 0);
        let request = db.get_request(&rid).unwrap().unwrap();
        assert!(matches!(request.status, RequestStatus::Failed { .. }));
        assert_eq!(request.retry_count, 0);
    }

    #[test]
    fn proxy_requests_drain_last() {
        let db = temp_db("proxylast");
        let (kp_a, kp_b, kp_p, kp_t) = (
            KeyPair::generate(),
            KeyPair::generate(),
            KeyPair::generate(),
            KeyPair::generate(),
        );
        let a = mint(&db, &kp_a, 0);
        let b = mint(&db, &kp_b, 1);
        let proxy = mint(&db, &kp_p, 2);
        let target = mint(&db, &kp_t, 3);

        // Proxy request queued before a standard one.
        let mut ctx = TxCtx::new(&db, &block(0, 4), 4);
        let proxy_rid = QueueKeeper::queue_request(
            &mut ctx,
            &a,
            &target.id,
            RequestType::Proxy,
            Priority::Critical,
            Some(24),
            Some(proxy.id.clone()),
            BTreeMap::new(),
        )
        .unwrap();
        ctx.commit().unwrap();
        let standard_rid = queue(&db, &b, &target.id, Priority::Low, 1, 5);

        // One slot, proxy processing on: the standard queue still wins.
        let mut ctx = TxCtx::new(&db, &block(10, 6), 6);
        let outcome =
            QueueKeeper::process_offline_queue(&mut ctx, &target, &target.id, true, 1).unwrap();
        ctx.commit().unwrap();
        assert_eq!(outcome.completed, 1);
        let standard = db.get_request(&standard_rid).unwrap().unwrap();
        assert!(matches!(standard.status, RequestStatus::Completed { .. }));
        let proxied = db.get_request(&proxy_rid).unwrap().unwrap();
        assert_eq!(proxied.status, RequestStatus::Queued);

        // Next slot drains the proxy queue; the session targets the proxy.
        let mut ctx = TxCtx::new(&db, &block(20, 7), 7);
        let outcome =
            QueueKeeper::process_offline_queue(&mut ctx, &target, &target.id, true, 1).unwrap();
        ctx.commit().unwrap();
        assert_eq!(outcome.completed, 1);
        let proxied = db.get_request(&proxy_rid).unwrap().unwrap();
        assert!(matches!(proxied.status, RequestStatus::Completed { .. }));
    }

    #[test]
    fn sweep_expires_and_pages() {
        let db = temp_db("sweep");
        let kp_t = KeyPair::generate();
        let target = mint(&db, &kp_t, 0);
        let mut rids = Vec::new();
        for i in 0..3 {
            let kp = KeyPair::generate();
            let initiator = mint(&db, &kp, 1 + i);
            rids.push(queue(&db, &initiator, &target.id, Priority::Normal, i as i64, 10 + i as u32));
        }

        let mut custom = QueueParams::default();
        custom.expiry_sweep_page_size = 2;
        db.put_params("queue", &custom).unwrap();

        // Two pages cover all three requests.
        let far = 200 * 3_600;
        let mut ctx = TxCtx::new(&db, &block(far, 20), 20);
        let first = QueueKeeper::sweep_expired(&mut ctx).unwrap();
        ctx.commit().unwrap();
        let mut ctx = TxCtx::new(&db, &block(far, 21), 21);
        let second = QueueKeeper::sweep_expired(&mut ctx).unwrap();
        ctx.commit().unwrap();
        assert_eq!(first + second, 3);

        for rid in &rids {
            let request = db.get_request(rid).unwrap().unwrap();
            assert!(matches!(request.status, RequestStatus::Expired { .. }));
        }
        // Cursor wrapped after the short page.
        assert!(db.get_meta("queue_expiry_cursor").unwrap().is_none());
    }
}
