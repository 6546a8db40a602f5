//! Brill Test Harness - in-memory substrate simulation
//!
//! This crate provides:
//! - A single-router in-memory substrate implementing the transport
//!   contract: mem storages, live subscribers, admin-space control plane
//! - Key-expression matching for `*` and `**` patterns
//!
//! Live samples are delivered inline on the publisher's thread, which makes
//! tests deterministic while keeping the "delivery happens off the
//! subscriber's thread" shape of the real substrate.

pub mod keyexpr;
pub mod simulator;

pub use keyexpr::*;
pub use simulator::*;
