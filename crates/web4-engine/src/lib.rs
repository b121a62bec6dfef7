//! web4-engine
//!
//! The transaction engine: resolves and authenticates the signing LCT,
//! dispatches the message to its module keeper, and commits staged writes
//! plus events atomically. Any keeper error discards every staged write,
//! so partial effects are impossible. Also drives the deterministic
//! end-of-block sweeps (queue expiry, demurrage).

pub mod engine;

pub use engine::Engine;
