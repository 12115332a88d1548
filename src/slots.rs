//! Connection slot table (C3): a direct-mapped table of [`Connection`]s
//! keyed by socket descriptor, bounding concurrency at a configured maximum.
//!
//! Each slot carries its own mutex rather than one lock guarding the whole
//! table (§9, "alternatively, guard each slot with a mutex"): one-shot
//! readiness already guarantees at most one thread ever touches a given
//! slot at a time, so per-slot locks are never contended — they exist only
//! to satisfy Rust's aliasing rules for a table shared across the reactor
//! and worker threads, not to serialize real concurrent access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::connection::Connection;

pub struct SlotTable {
    slots: Vec<Mutex<Option<Connection>>>,
    live: AtomicUsize,
}

impl SlotTable {
    pub fn new(max_connections: usize) -> Self {
        let mut slots = Vec::with_capacity(max_connections);
        slots.resize_with(max_connections, || Mutex::new(None));
        SlotTable {
            slots,
            live: AtomicUsize::new(0),
        }
    }

    /// The configured maximum number of simultaneous connections.
    pub fn max(&self) -> usize {
        self.slots.len()
    }

    /// The process-wide live connection count (§3 invariant 3).
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn is_full(&self) -> bool {
        self.live_count() >= self.max()
    }

    /// Installs `conn` at `index`. Fails (without touching the live count)
    /// if `index` is out of range or already occupied.
    pub fn try_insert(&self, index: usize, conn: Connection) -> bool {
        let Some(cell) = self.slots.get(index) else {
            return false;
        };
        let mut slot = cell.lock().unwrap();
        if slot.is_some() {
            return false;
        }
        *slot = Some(conn);
        self.live.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Runs `f` against the connection at `index`, if any is installed
    /// there. Returns `None` if the slot is empty or out of range.
    pub fn with_slot<R>(&self, index: usize, f: impl FnOnce(&mut Connection) -> R) -> Option<R> {
        let cell = self.slots.get(index)?;
        let mut slot = cell.lock().unwrap();
        slot.as_mut().map(f)
    }

    /// Destroys the slot at `index`, dropping its connection (and with it,
    /// the socket and any memory map) and decrementing the live count
    /// exactly once (§3 Lifecycle).
    pub fn close(&self, index: usize) {
        let Some(cell) = self.slots.get(index) else {
            return;
        };
        let mut slot = cell.lock().unwrap();
        if slot.take().is_some() {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
