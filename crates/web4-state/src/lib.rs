//! web4-state
//!
//! The shared transactional KV layer: a sled-backed [`StateDb`] with one
//! named tree per logical state prefix, the staged-mutation buffer that
//! gives messages all-or-nothing semantics, the structured event buffer,
//! and the deterministic block/transaction contexts keepers execute under.

pub mod ctx;
pub mod db;
pub mod events;
pub mod staged;

pub use ctx::{BlockCtx, TxCtx};
pub use db::{composite_key, StateDb, KEY_SEP};
pub use events::{Event, EventBuf};
pub use staged::Staged;
