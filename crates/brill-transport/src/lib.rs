//! Brill Transport Contract - the seam to the dissemination substrate
//!
//! The substrate (wire protocol, peer discovery, routing, socket and thread
//! management, persistent storage) is an external collaborator. This crate
//! pins down exactly what the client requires from it:
//! - session open/close against a configured endpoint
//! - put/get/delete on hierarchical keys
//! - subscriber declaration with sample callbacks
//! - router identity discovery
//!
//! The substrate owns all network I/O threads. Sample callbacks run on its
//! delivery threads; `get` blocks the calling thread until the query is
//! exhausted.

pub mod config;
pub mod session;

pub use config::*;
pub use session::*;
