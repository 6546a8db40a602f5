//! Error types for the brill client

use thiserror::Error;

/// Core brill errors
#[derive(Error, Debug)]
pub enum BrillError {
    // Session errors
    #[error("not connected")]
    NotConnected,

    #[error("no router reachable")]
    NoRouter,

    #[error("session closed")]
    SessionClosed,

    // Registration errors
    #[error("already subscribed to {0}")]
    AlreadySubscribed(String),

    #[error("no subscription for {0}")]
    NoSuchSubscription(String),

    #[error("mem storage already exists: {0}")]
    StorageExists(String),

    #[error("no mem storage named {0}")]
    NoSuchStorage(String),

    // Key errors
    #[error("invalid key expression: {0}")]
    InvalidKeyExpr(String),

    // Control plane errors
    #[error("control plane request failed: {0}")]
    ControlPlane(String),

    // Transport errors
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for BrillError {
    fn from(err: serde_json::Error) -> Self {
        BrillError::ControlPlane(err.to_string())
    }
}

/// Result type for brill operations
pub type BrillResult<T> = Result<T, BrillError>;
