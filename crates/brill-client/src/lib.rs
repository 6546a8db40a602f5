//! Brill Client - session, subscription and storage management
//!
//! This crate provides:
//! - Connection lifecycle (connect/reconnect/disconnect) against a router
//! - One live subscription per topic with race-free catch-up replay
//! - Typed publish and blocking query of stored values
//! - Control of ephemeral server-side mem storages via the admin space
//!
//! All mutable state lives inside one [`Client`] instance; independent
//! clients coexist without interference.

pub mod client;
pub mod storage;
pub mod subscription;

pub use client::*;
pub use storage::*;
pub use subscription::*;

/// DNS name of the default router
pub const DEFAULT_HOST: &str = "localhost";
/// Port of the default router
pub const DEFAULT_PORT: u16 = 7447;
