//! Double-buffered stage output.

use std::sync::Arc;

use tracing::debug;

/// Two output slots that alternate between "being written this tick" and
/// "published last tick".
///
/// Publishing hands the downstream stage an `Arc` clone of the written slot
/// and makes the other slot the write target.  The write slot is mutated in
/// place only while this buffer holds the sole reference to it.  If a reader
/// still holds it from two ticks ago, the slot is detached and replaced with
/// a fresh allocation so the reader's copy is never mutated; each such event
/// is counted as a contention.
#[derive(Debug)]
pub struct DoubleBuffer<T> {
    slots:       [Arc<Vec<T>>; 2],
    active:      usize,
    contentions: u64,
}

impl<T: Clone + Default> DoubleBuffer<T> {
    /// Both slots pre-allocated with `len` default values.
    pub fn new(len: usize) -> Self {
        Self {
            slots:       [Arc::new(vec![T::default(); len]), Arc::new(vec![T::default(); len])],
            active:      0,
            contentions: 0,
        }
    }

    /// The slot being written this tick, resized to `len`.
    pub fn write_slot(&mut self, len: usize) -> &mut [T] {
        let slot = &mut self.slots[self.active];
        if Arc::get_mut(slot).is_none() {
            self.contentions += 1;
            debug!(
                slot = self.active,
                readers = Arc::strong_count(slot) - 1,
                "output slot still held downstream; detaching"
            );
            *slot = Arc::new(vec![T::default(); len]);
        }
        // Sole owner here: either get_mut succeeded above or the slot was
        // just replaced.
        let buffer = Arc::make_mut(slot);
        buffer.resize(len, T::default());
        buffer.as_mut_slice()
    }

    /// Hand out the slot written this tick and flip roles.
    pub fn publish(&mut self) -> Arc<Vec<T>> {
        let written = Arc::clone(&self.slots[self.active]);
        self.active ^= 1;
        written
    }

    /// Contents of the slot that will be written next tick.
    pub fn write_target(&self) -> &[T] {
        &self.slots[self.active]
    }

    /// Index of the slot that will be written next.
    pub fn active(&self) -> usize {
        self.active
    }

    /// How many times a write slot had to be detached from a reader.
    pub fn contentions(&self) -> u64 {
        self.contentions
    }
}
