//! Versioned latest-wins channel between two pipeline stages.
//!
//! # Protocol
//!
//! ```text
//! producer:  publish(DataPacket { version: current + 1, data })   never blocks
//! consumer:  receive(since) → newest packet with version > since  blocks
//! ```
//!
//! The channel holds a single slot.  A publish overwrites whatever the
//! consumer has not picked up yet, so a slow consumer skips intermediate
//! versions rather than queueing them.  Publishing any version other than
//! `current + 1` is rejected with [`PipelineError::VersionDesync`].

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tm_core::Version;

use crate::{PipelineError, PipelineResult};

/// One message: a payload stamped with the channel version it was published at.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPacket<T> {
    pub version: Version,
    pub data:    T,
}

impl<T> DataPacket<T> {
    pub fn new(version: Version, data: T) -> Self {
        Self { version, data }
    }
}

struct Slot<T> {
    version: Version,
    data:    Option<T>,
    closed:  bool,
}

/// A single-slot versioned channel.
///
/// Share it between threads with `Arc<Messenger<T>>`.  Payloads are cloned
/// out on receive, so `T` is normally an `Arc` around the real data.
pub struct Messenger<T> {
    slot:  Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T: Clone> Messenger<T> {
    /// An empty channel at [`Version::ZERO`].
    pub fn new() -> Self {
        Self::with_version(Version::ZERO)
    }

    /// An empty channel whose first accepted publish is `version + 1`.
    pub fn with_version(version: Version) -> Self {
        Self {
            slot: Mutex::new(Slot { version, data: None, closed: false }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The version of the newest packet (or the initial version if nothing
    /// has been published yet).
    pub fn version(&self) -> Version {
        self.lock().version
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Replace the slot with `packet` and wake every waiting receiver.
    ///
    /// Returns the new channel version.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::VersionDesync`] if `packet.version` is not exactly
    ///   one past the current version.  The slot is left untouched.
    /// - [`PipelineError::Closed`] after [`close`](Self::close).
    pub fn publish(&self, packet: DataPacket<T>) -> PipelineResult<Version> {
        let mut slot = self.lock();
        if slot.closed {
            return Err(PipelineError::Closed);
        }
        let expected = slot.version.next();
        if packet.version != expected {
            return Err(PipelineError::VersionDesync { expected, got: packet.version });
        }
        slot.version = packet.version;
        slot.data    = Some(packet.data);
        drop(slot);
        self.ready.notify_all();
        Ok(packet.version)
    }

    /// Block until a packet newer than `since` is available and return it.
    ///
    /// Packets published before close are still delivered; once none newer
    /// than `since` remain, a closed channel returns
    /// [`PipelineError::Closed`].
    pub fn receive(&self, since: Version) -> PipelineResult<DataPacket<T>> {
        let mut slot = self.lock();
        loop {
            if let Some(packet) = Self::newer(&slot, since) {
                return Ok(packet);
            }
            if slot.closed {
                return Err(PipelineError::Closed);
            }
            slot = self.ready.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Non-blocking [`receive`](Self::receive): `Ok(None)` if nothing newer
    /// than `since` is available yet.
    pub fn try_receive(&self, since: Version) -> PipelineResult<Option<DataPacket<T>>> {
        let slot = self.lock();
        match Self::newer(&slot, since) {
            Some(packet)          => Ok(Some(packet)),
            None if slot.closed   => Err(PipelineError::Closed),
            None                  => Ok(None),
        }
    }

    /// Shut the channel down.  Blocked and future receivers drain the last
    /// packet and then see [`PipelineError::Closed`]; publishes fail.
    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    fn newer(slot: &Slot<T>, since: Version) -> Option<DataPacket<T>> {
        match &slot.data {
            Some(data) if slot.version > since => Some(DataPacket::new(slot.version, data.clone())),
            _ => None,
        }
    }
}

impl<T: Clone> Default for Messenger<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── VersionOffset ─────────────────────────────────────────────────────────────

/// Fixed distance between a stage's downstream channel version and its
/// upstream channel version.
///
/// A stage whose consumer runs earlier in the tick than its producer's
/// consumer publishes one version behind its upstream channel: that is
/// [`VersionOffset::LEADS_CONSUMER`], the default.  The coupling is checked
/// once when the stage is wired up; after that every publish advances the
/// downstream channel by exactly one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionOffset(pub i64);

impl VersionOffset {
    /// Downstream runs one version behind upstream.
    pub const LEADS_CONSUMER: VersionOffset = VersionOffset(-1);
    /// Downstream and upstream share version numbers.
    pub const ALIGNED: VersionOffset = VersionOffset(0);

    /// The downstream version paired with upstream version `upstream`.
    #[inline]
    pub fn apply(self, upstream: Version) -> Option<Version> {
        upstream.checked_offset(self.0)
    }

    /// Check that `downstream` is paired with `upstream` under this offset.
    pub fn check(self, upstream: Version, downstream: Version) -> PipelineResult<()> {
        match self.apply(upstream) {
            Some(expected) if expected == downstream => Ok(()),
            Some(expected) => Err(PipelineError::Config(format!(
                "downstream channel at {downstream}, expected {expected} \
                 (upstream {upstream}, offset {})",
                self.0
            ))),
            None => Err(PipelineError::Config(format!(
                "offset {} cannot be applied to upstream {upstream}",
                self.0
            ))),
        }
    }
}

impl Default for VersionOffset {
    fn default() -> Self {
        Self::LEADS_CONSUMER
    }
}
