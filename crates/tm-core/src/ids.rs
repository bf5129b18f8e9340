//! Actor identifiers.
//!
//! Ids are assigned by the world backend and are sparse, so they are never
//! used to index a `Vec`.  Per-tick lookups go through an `ActorId → index`
//! map built from the localization frame.

use std::fmt;

/// Identifier of a world actor, managed or unregistered.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

impl From<u32> for ActorId {
    #[inline]
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
