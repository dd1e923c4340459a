//! Byte-bounded output event sequence.

use tactus_types::TimedEvent;

/// Default number of event slots reserved up front.
pub const DEFAULT_EVENT_SLOTS: usize = 512;

/// Output events of one block, bounded by a byte budget.
///
/// Storage is reserved once at construction; appending never reallocates.
/// An event that does not fit in either the byte budget or the reserved
/// slots is dropped and counted.
#[derive(Debug, Clone)]
pub struct EventSequence {
    events: Vec<TimedEvent>,
    capacity_bytes: u32,
    used_bytes: u32,
    dropped: u32,
}

impl Default for EventSequence {
    fn default() -> Self {
        Self::with_slots(DEFAULT_EVENT_SLOTS)
    }
}

impl EventSequence {
    pub fn with_slots(slots: usize) -> Self {
        Self {
            events: Vec::with_capacity(slots),
            capacity_bytes: 0,
            used_bytes: 0,
            dropped: 0,
        }
    }

    /// Empty the sequence and set the byte budget for the next block.
    pub fn reset(&mut self, capacity_bytes: u32) {
        self.events.clear();
        self.capacity_bytes = capacity_bytes;
        self.used_bytes = 0;
        self.dropped = 0;
    }

    /// Append `event` if it fits. Returns false when it was dropped.
    pub fn push(&mut self, event: TimedEvent) -> bool {
        let size = event.wire_size();
        let fits_bytes = self.used_bytes.saturating_add(size) <= self.capacity_bytes;
        let fits_slots = self.events.len() < self.events.capacity();
        if !(fits_bytes && fits_slots) {
            self.dropped += 1;
            return false;
        }
        debug_assert!(
            self.events.last().map_or(true, |last| last.frame <= event.frame),
            "events must be appended in frame order"
        );
        self.used_bytes += size;
        self.events.push(event);
        true
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity_bytes(&self) -> u32 {
        self.capacity_bytes
    }

    pub fn used_bytes(&self) -> u32 {
        self.used_bytes
    }

    /// Events rejected since the last reset.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<'a> IntoIterator for &'a EventSequence {
    type Item = &'a TimedEvent;
    type IntoIter = std::slice::Iter<'a, TimedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
