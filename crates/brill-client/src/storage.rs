//! Mem storage control-plane records and request encoding
//!
//! Ephemeral server-side storages are created and destroyed by publishing
//! JSON requests into the router's admin space. The router that answered
//! identity discovery at creation time is recorded with the storage name;
//! removal must address that same router, since the storage only exists
//! there.

use serde::Serialize;

use brill_core::RouterId;

/// Volume backing the storage; only memory-backed volumes are managed here
pub const VOLUME_MEMORY: &str = "memory";

/// Local record of a created mem storage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemStorageRecord {
    /// Unique storage name
    pub name: String,
    /// Router the creation request was addressed to
    pub router: RouterId,
}

/// Control-plane request body for storage creation
#[derive(Serialize, Debug)]
pub struct StorageRequest<'a> {
    pub key_expr: &'a str,
    pub volume: &'a str,
}

/// Admin-space key addressing one named storage on one router
pub fn admin_keyexpr(router: &RouterId, name: &str) -> String {
    format!("@/{router}/router/config/plugins/storage_manager/storages/{name}")
}
