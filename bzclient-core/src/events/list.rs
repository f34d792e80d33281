// Sorted, deduplicated client list for a single event.
//
// Dispatch walks a snapshot of the live entries taken when the pass begins.
// Clients may insert or remove entries (their own or others') while a pass is
// in flight: removal tombstones the entry so the pass skips it, insertion
// lands in sorted position but is not visited until the next pass. Tombstones
// and entries whose client was dropped are compacted when the outermost pass
// ends, or by an explicit `purify`. Each entry's tombstone flag is shared with
// the snapshots that include it, so a walk checks removal without touching
// the list.

use std::cell::Cell;
use std::rc::Rc;

use crate::events::client::{ClientRef, ClientSeq, OrderType};

#[derive(Debug, Clone)]
struct ListEntry {
    client: ClientRef,
    removed: Rc<Cell<bool>>,
}

/// One client in a dispatch snapshot.
#[derive(Debug, Clone)]
pub struct PassEntry {
    client: ClientRef,
    removed: Rc<Cell<bool>>,
}

impl PassEntry {
    pub fn client(&self) -> &ClientRef {
        &self.client
    }

    /// True once the entry was removed from its list.
    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }
}

#[derive(Debug, Clone)]
pub struct EventClientList {
    order: OrderType,
    reversed: bool,
    entries: Vec<ListEntry>,
    passes: usize,
    dirty: bool,
}

impl EventClientList {
    pub fn new(order: OrderType, reversed: bool) -> Self {
        Self {
            order,
            reversed,
            entries: Vec::new(),
            passes: 0,
            dirty: false,
        }
    }

    pub fn order_type(&self) -> OrderType {
        self.order
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    fn goes_before(&self, a: &ClientRef, b: &ClientRef) -> bool {
        if self.reversed {
            b.precedes(a, self.order)
        } else {
            a.precedes(b, self.order)
        }
    }

    fn live(&self) -> impl Iterator<Item = &ClientRef> {
        self.entries
            .iter()
            .filter(|e| !e.removed.get() && e.client.is_alive())
            .map(|e| &e.client)
    }

    /// Insert `client` in sorted position.
    ///
    /// Returns `false` when the client is already listed, or another live
    /// entry has the same name and order for this list's dimension.
    pub fn insert(&mut self, client: &ClientRef) -> bool {
        let order = client.order(self.order);
        let clash = self.live().any(|c| {
            c.seq() == client.seq() || (c.name() == client.name() && c.order(self.order) == order)
        });
        if clash {
            return false;
        }
        let pos = self
            .entries
            .partition_point(|e| self.goes_before(&e.client, client));
        self.entries.insert(
            pos,
            ListEntry {
                client: client.clone(),
                removed: Rc::new(Cell::new(false)),
            },
        );
        true
    }

    /// Remove the entry for `seq`. Returns `false` if it is not listed.
    pub fn remove(&mut self, seq: ClientSeq) -> bool {
        let Some(pos) = self
            .entries
            .iter()
            .position(|e| !e.removed.get() && e.client.seq() == seq)
        else {
            return false;
        };
        self.entries[pos].removed.set(true);
        if self.passes > 0 {
            self.dirty = true;
        } else {
            self.entries.remove(pos);
        }
        true
    }

    pub fn contains(&self, seq: ClientSeq) -> bool {
        self.live().any(|c| c.seq() == seq)
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.live().next().is_none()
    }

    /// Live clients in dispatch order.
    pub fn clients(&self) -> Vec<ClientRef> {
        self.live().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.live().map(|c| c.name().to_string()).collect()
    }

    /// Drop tombstones and dead clients. A no-op while a pass is in flight.
    pub fn purify(&mut self) {
        if self.passes > 0 {
            return;
        }
        self.entries.retain(|e| !e.removed.get() && e.client.is_alive());
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty || self.entries.iter().any(|e| !e.client.is_alive())
    }

    pub fn in_pass(&self) -> bool {
        self.passes > 0
    }

    /// Start a dispatch pass and return the clients it will visit.
    pub fn begin_pass(&mut self) -> Vec<PassEntry> {
        self.passes += 1;
        self.entries
            .iter()
            .filter(|e| !e.removed.get() && e.client.is_alive())
            .map(|e| PassEntry {
                client: e.client.clone(),
                removed: Rc::clone(&e.removed),
            })
            .collect()
    }

    /// Finish a dispatch pass; the outermost one compacts the list.
    pub fn end_pass(&mut self) {
        self.passes = self.passes.saturating_sub(1);
        if self.passes == 0 && self.is_dirty() {
            self.purify();
        }
    }
}
