use web4_core::error::Web4Error;
use web4_core::queue::{
    OfflineOperation, PairingRequest, QueueStatus, RequestStatus, RequestType, SubQueue,
};
use web4_core::types::{LctId, RequestId};
use web4_state::StateDb;

/// Read-only view over queue state.
pub struct QueueQuery<'a> {
    db: &'a StateDb,
}

impl<'a> QueueQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn get_request(&self, id: &RequestId) -> Result<PairingRequest, Web4Error> {
        self.db
            .get_request(id)?
            .ok_or_else(|| Web4Error::RequestNotFound(id.to_string()))
    }

    /// Queued requests for `target`, in processing order, optionally
    /// filtered by type/status, paginated by offset.
    pub fn get_queued_requests(
        &self,
        target: &LctId,
        request_type: Option<RequestType>,
        status: Option<&RequestStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PairingRequest>, Web4Error> {
        let mut out = Vec::new();
        for sub_queue in [SubQueue::Priority, SubQueue::Standard, SubQueue::Proxy] {
            for (_, rid) in self.db.scan_sub_queue(target, sub_queue)? {
                if let Some(request) = self.db.get_request(&rid)? {
                    if request_type.map(|t| request.request_type == t).unwrap_or(true)
                        && status.map(|s| request.status == *s).unwrap_or(true)
                    {
                        out.push(request);
                    }
                }
            }
        }
        Ok(out.into_iter().skip(offset).take(limit).collect())
    }

    /// Requests delegated to `proxy` that are still queued.
    pub fn list_proxy_queue(&self, proxy: &LctId) -> Result<Vec<PairingRequest>, Web4Error> {
        let mut out = Vec::new();
        for request in self.db.scan_requests_after(None, usize::MAX)? {
            if request.status == RequestStatus::Queued
                && request.proxy_component.as_ref() == Some(proxy)
            {
                out.push(request);
            }
        }
        Ok(out)
    }

    /// Per-component queue summary derived from the index.
    pub fn queue_status(&self, component: &LctId) -> Result<QueueStatus, Web4Error> {
        let mut counts = [0u64; 3];
        let mut oldest: Option<i64> = None;
        for (slot, sub_queue) in
            [SubQueue::Priority, SubQueue::Standard, SubQueue::Proxy].iter().enumerate()
        {
            for (_, rid) in self.db.scan_sub_queue(component, *sub_queue)? {
                if let Some(request) = self.db.get_request(&rid)? {
                    if request.status == RequestStatus::Queued {
                        counts[slot] += 1;
                        oldest = Some(oldest.map_or(request.created_at, |o: i64| {
                            o.min(request.created_at)
                        }));
                    }
                }
            }
        }
        let last_processed = self.db.get_offline_op(component)?.map(|op| op.last_seen);
        Ok(QueueStatus {
            component: component.clone(),
            priority_count: counts[0],
            standard_count: counts[1],
            proxy_count: counts[2],
            oldest_pending: oldest,
            last_processed,
        })
    }

    pub fn offline_operation(&self, component: &LctId) -> Result<Option<OfflineOperation>, Web4Error> {
        self.db.get_offline_op(component)
    }
}
