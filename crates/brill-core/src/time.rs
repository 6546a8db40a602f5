//! Timestamp normalization
//!
//! The substrate stamps samples with NTP64 fixed-point time:
//!
//! ```text
//! byte    7        6        5        4
//!  -------- -------- -------- --------
//! |             seconds               |
//!  -------- -------- -------- --------
//! byte    3        2        1        0
//!  -------- -------- -------- --------
//! |            fractions              |
//!  -------- -------- -------- --------
//! ```
//!
//! One fraction is 1/2^32 seconds (roughly 232 ps). Applications work in
//! integer nanoseconds since the Unix epoch, so the conversion goes through
//! floating point and callers must tolerate sub-nanosecond rounding error.

use std::fmt;

const FRACTIONS_PER_SECOND: f64 = 4_294_967_296.0; // 2^32
const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// NTP64 fixed-point network time: 32-bit seconds, 32-bit fractional second
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ntp64(pub u64);

impl Ntp64 {
    pub const ZERO: Ntp64 = Ntp64(0);

    #[inline]
    pub fn new(raw: u64) -> Self {
        Ntp64(raw)
    }

    /// Build from whole seconds and a 1/2^32 s fraction
    #[inline]
    pub fn from_parts(seconds: u32, fraction: u32) -> Self {
        Ntp64(((seconds as u64) << 32) | fraction as u64)
    }

    /// Whole seconds (high 32 bits)
    #[inline]
    pub fn seconds(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Fractional second in 1/2^32 s units (low 32 bits)
    #[inline]
    pub fn fraction(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    /// Convert to nanoseconds since the Unix epoch
    ///
    /// Computed as `(seconds + fraction / 2^32) * 10^9` in floating point,
    /// truncated to an unsigned integer. The result can be off by less than
    /// a nanosecond from the exact fixed-point value.
    pub fn to_unix_nanos(self) -> u64 {
        let seconds = (self.0 >> 32) as f64;
        let fraction = (self.0 & 0xFFFF_FFFF) as f64;
        ((seconds + fraction / FRACTIONS_PER_SECOND) * NANOS_PER_SECOND) as u64
    }

    /// Build from nanoseconds since the Unix epoch
    ///
    /// Inverse of [`to_unix_nanos`](Self::to_unix_nanos), used by test
    /// harnesses that stamp samples from a wall clock.
    pub fn from_unix_nanos(nanos: u64) -> Self {
        let seconds = nanos / 1_000_000_000;
        let rem = (nanos % 1_000_000_000) as f64;
        let fraction = (rem / NANOS_PER_SECOND * FRACTIONS_PER_SECOND) as u64;
        Ntp64((seconds << 32) | (fraction & 0xFFFF_FFFF))
    }
}

impl fmt::Debug for Ntp64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ntp64({}s+{})", self.seconds(), self.fraction())
    }
}
