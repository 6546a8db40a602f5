//! Brill Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the brill client:
//! - Router identities (RouterId)
//! - Timestamp normalization (Ntp64)
//! - Wire encoding tags (Encoding) and typed value serialization
//! - The Variable value record with borrowed-or-owned storage

pub mod encoding;
pub mod error;
pub mod id;
pub mod time;
pub mod value;
pub mod variable;

pub use encoding::*;
pub use error::*;
pub use id::*;
pub use time::*;
pub use value::*;
pub use variable::*;
