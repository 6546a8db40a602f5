//! Identity types for the brill client
//!
//! Router identities are opaque 128-bit values assigned by the substrate.
//! They are only ever compared and formatted, never interpreted.

use std::fmt;

/// Router identity - opaque 128-bit identifier of a reachable peer
///
/// Formatted as 32 lowercase hex characters, least-significant byte last,
/// matching the substrate's admin-space representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RouterId(pub [u8; 16]);

impl RouterId {
    pub const ZERO: RouterId = RouterId([0; 16]);

    #[inline]
    pub fn new(id: [u8; 16]) -> Self {
        RouterId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        RouterId(bytes)
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Router({self})")
    }
}
