//! Lock-free hand-off of control values to the audio thread.
//!
//! Three snapshot slots rotate between the publisher and the receiver:
//! the publisher fills its back slot and swaps it with the middle one; the
//! receiver swaps the middle slot into the front when it is fresh. Neither
//! side ever waits, and the receiver always sees a complete snapshot.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tactus_types::ControlSnapshot;

/// State byte layout: [fresh:1][unused:1][back:2][middle:2][front:2]
const FRONT_SHIFT: u8 = 0;
const MIDDLE_SHIFT: u8 = 2;
const BACK_SHIFT: u8 = 4;
const SLOT_MASK: u8 = 0b11;
const FRESH: u8 = 0x80;

const INITIAL_STATE: u8 = (2 << BACK_SHIFT) | (1 << MIDDLE_SHIFT) | (0 << FRONT_SHIFT);

struct SnapshotSlots {
    slots: [UnsafeCell<ControlSnapshot>; 3],
    state: AtomicU8,
}

// Safety: each slot is only touched by the side that currently owns it,
// and ownership changes hands through the atomic state.
unsafe impl Send for SnapshotSlots {}
unsafe impl Sync for SnapshotSlots {}

impl SnapshotSlots {
    fn new(initial: ControlSnapshot) -> Self {
        Self {
            slots: [
                UnsafeCell::new(initial),
                UnsafeCell::new(initial),
                UnsafeCell::new(initial),
            ],
            state: AtomicU8::new(INITIAL_STATE),
        }
    }

    fn slot(state: u8, shift: u8) -> usize {
        ((state >> shift) & SLOT_MASK) as usize
    }

    /// Swap back and middle, marking the middle fresh.
    fn publish(&self, snapshot: ControlSnapshot) {
        let back = Self::slot(self.state.load(Ordering::Acquire), BACK_SHIFT);
        // Safety: the back slot belongs to the single publisher.
        unsafe {
            *self.slots[back].get() = snapshot;
        }

        let mut state = self.state.load(Ordering::Acquire);
        loop {
            let next = ((Self::slot(state, MIDDLE_SHIFT) as u8) << BACK_SHIFT)
                | ((Self::slot(state, BACK_SHIFT) as u8) << MIDDLE_SHIFT)
                | ((Self::slot(state, FRONT_SHIFT) as u8) << FRONT_SHIFT)
                | FRESH;
            match self
                .state
                .compare_exchange_weak(state, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => break,
                Err(current) => state = current,
            }
        }
    }

    fn has_fresh(&self) -> bool {
        self.state.load(Ordering::Acquire) & FRESH != 0
    }

    /// Swap a fresh middle into the front and copy the front out.
    fn consume(&self) -> ControlSnapshot {
        let mut state = self.state.load(Ordering::Acquire);
        while state & FRESH != 0 {
            let next = ((Self::slot(state, BACK_SHIFT) as u8) << BACK_SHIFT)
                | ((Self::slot(state, FRONT_SHIFT) as u8) << MIDDLE_SHIFT)
                | ((Self::slot(state, MIDDLE_SHIFT) as u8) << FRONT_SHIFT);
            match self
                .state
                .compare_exchange_weak(state, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    state = next;
                    break;
                }
                Err(current) => state = current,
            }
        }
        let front = Self::slot(state, FRONT_SHIFT);
        // Safety: the front slot belongs to the single receiver.
        unsafe { *self.slots[front].get() }
    }
}

/// Control-thread half: publishes new control values.
pub struct ControlPublisher {
    shared: Arc<SnapshotSlots>,
    current: ControlSnapshot,
}

impl ControlPublisher {
    pub fn publish(&mut self, snapshot: ControlSnapshot) {
        self.current = snapshot;
        self.shared.publish(snapshot);
    }

    /// Edit the last published snapshot and publish the result.
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&mut ControlSnapshot),
    {
        let mut snapshot = self.current;
        f(&mut snapshot);
        self.publish(snapshot);
    }

    /// The last published snapshot.
    pub fn current(&self) -> ControlSnapshot {
        self.current
    }
}

/// Audio-thread half: reads the latest complete snapshot without blocking.
pub struct ControlReceiver {
    shared: Arc<SnapshotSlots>,
}

impl ControlReceiver {
    pub fn has_fresh(&self) -> bool {
        self.shared.has_fresh()
    }

    pub fn latest(&mut self) -> ControlSnapshot {
        self.shared.consume()
    }
}

/// Create a publisher/receiver pair; both start out holding `initial`.
pub fn control_channel(initial: ControlSnapshot) -> (ControlPublisher, ControlReceiver) {
    let shared = Arc::new(SnapshotSlots::new(initial));
    (
        ControlPublisher {
            shared: Arc::clone(&shared),
            current: initial,
        },
        ControlReceiver { shared },
    )
}
