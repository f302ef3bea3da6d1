//! Replica core library — the source/replica pair and its validation rules.
//!
//! - [`pair`] — [`SyncPair`] plus the standalone checks the mirror engine reuses
//! - [`error`] — [`PairError`]

pub mod error;
pub mod pair;

pub use error::PairError;
pub use pair::{ensure_disjoint, ensure_source_dir, SyncPair};
