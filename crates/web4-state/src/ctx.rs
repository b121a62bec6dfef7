//! Block and transaction execution contexts.
//!
//! Keepers see one `TxCtx` per message: read committed state through `db`,
//! stage writes in `staged`, emit events, and draw deterministic randomness.
//! The engine commits or discards the whole context.

use web4_core::error::Web4Error;
use web4_core::types::Timestamp;
use web4_crypto::TxRng;

use crate::db::StateDb;
use crate::events::{Event, EventBuf};
use crate::staged::Staged;

/// Deterministic per-block inputs from the host chain's header.
#[derive(Clone, Copy, Debug)]
pub struct BlockCtx {
    pub height: u64,
    /// Block time: the only clock keeper code may observe.
    pub time: Timestamp,
    pub hash: [u8; 32],
}

impl BlockCtx {
    pub fn new(height: u64, time: Timestamp, hash: [u8; 32]) -> Self {
        Self { height, time, hash }
    }
}

/// Execution context for a single message.
pub struct TxCtx<'a> {
    pub db: &'a StateDb,
    pub now: Timestamp,
    pub height: u64,
    pub rng: TxRng,
    pub staged: Staged,
    pub events: EventBuf,
}

impl<'a> TxCtx<'a> {
    pub fn new(db: &'a StateDb, block: &BlockCtx, tx_index: u32) -> Self {
        Self {
            db,
            now: block.time,
            height: block.height,
            rng: TxRng::new(&block.hash, tx_index),
            staged: Staged::default(),
            events: EventBuf::default(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.emit(event);
    }

    /// Commit all staged writes and hand back the emitted events.
    pub fn commit(self) -> Result<Vec<Event>, Web4Error> {
        self.staged.commit(self.db)?;
        Ok(self.events.take())
    }
}
