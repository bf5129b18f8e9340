//! Pipeline message versions.
//!
//! # Design
//!
//! Every message exchanged between pipeline stages carries a `Version`: a
//! monotonically increasing sequence number owned by the channel it travels
//! on.  A stage remembers the last version it consumed and asks the channel
//! for anything newer; a publisher must advance a channel by exactly one
//! version per publish.
//!
//! Stages that sit next to each other in the tick pipeline may run their
//! channels with a fixed offset between them (see `tm-pipeline`'s
//! `VersionOffset`), so `Version` supports signed offsets.

use std::fmt;

/// A channel sequence number.
///
/// Stored as `u64`: at 1,000 publishes per second it lasts ~585 million
/// years.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version(pub u64);

impl Version {
    pub const ZERO: Version = Version(0);

    /// The version immediately after `self`.
    #[inline]
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }

    /// Shift by a signed offset.  Returns `None` on underflow/overflow.
    #[inline]
    pub fn checked_offset(self, offset: i64) -> Option<Version> {
        self.0.checked_add_signed(offset).map(Version)
    }
}

impl std::ops::Sub for Version {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Version) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
