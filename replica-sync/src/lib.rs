//! # replica-sync
//!
//! The mirror engine: destroy the replica, then copy the source tree into its
//! place. Call [`mirror`] once per cycle.

pub mod error;
pub mod mirror;

pub use error::MirrorError;
pub use mirror::mirror;
