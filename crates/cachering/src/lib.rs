//! Consistent hashing ring for cache peer selection.
//!
//! This crate maps an unbounded set of string keys onto a small, changing
//! set of named nodes. Adding or removing a node remaps only the keys near
//! that node's positions; every other key keeps its owner.
//!
//! The ring uses virtual nodes: each node occupies `replicas` positions,
//! determined by `hash(index ++ name)`. More replicas = smoother
//! distribution at the cost of a larger snapshot.
//!
//! Lookups never lock. The ring state lives in an immutable [`Snapshot`]
//! published through an atomic pointer swap; [`Ring::add`] and
//! [`Ring::remove`] serialize among themselves, build a modified copy, and
//! publish it.

mod config;
mod error;
pub mod hash;
mod ring;
mod snapshot;


pub use config::{DEFAULT_REPLICAS, RingConfig};
pub use error::RingError;
pub use hash::{HashAlgorithm, HashFn};
pub use ring::Ring;
pub use snapshot::{Remap, Snapshot};
