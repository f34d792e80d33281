//! Event Handler
//!
//! The registry every event client goes through. It keeps a master list of
//! registered clients, one sorted [`EventClientList`] per list-managed event,
//! and the [`GfxBlockMgr`] whose blocks those clients compete for.
//!
//! # Registration
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use bzclient_core::events::{ClientInfo, EventClient, EventHandler};
//!
//! struct Hud(ClientInfo);
//!
//! impl EventClient for Hud {
//!     fn info(&self) -> &ClientInfo {
//!         &self.0
//!     }
//! }
//!
//! let handler = EventHandler::new();
//! let hud: Rc<dyn EventClient> = Rc::new(Hud(ClientInfo::new("hud", 3)));
//! assert!(handler.add_client(&hud));
//! assert!(handler.insert_event(&hud, "DrawScreen"));
//! ```
//!
//! Registration failures never panic: every call returns `false` and logs
//! the reason at debug level.
//!
//! # Ownership
//!
//! The handler never owns a client. It keeps weak references, so a client
//! that is dropped without `remove_client` simply stops receiving events and
//! is swept on the next [`EventHandler::purify`].

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::events::client::{ClientRef, ClientSeq, EventClient, OrderType};
use crate::events::list::EventClientList;
use crate::events::table::{EventId, EventSpec, LoopType, EVENT_TABLE};
use crate::gfx::{deliver_all, BlockType, EntityKind, GfxBlockMgr};

pub struct EventHandler {
    /// Every registered client, sorted by script id.
    clients: RefCell<EventClientList>,
    next_seq: Cell<u64>,
    /// One list per event, indexed by `EventId`; `None` for direct events.
    lists: Vec<Option<RefCell<EventClientList>>>,
    gfx: RefCell<GfxBlockMgr>,
}

impl EventHandler {
    pub fn new() -> Self {
        let lists = EVENT_TABLE
            .iter()
            .map(|spec| {
                spec.order
                    .map(|order| RefCell::new(EventClientList::new(order, spec.is_reversed())))
            })
            .collect();
        Self {
            clients: RefCell::new(EventClientList::new(OrderType::ScriptId, false)),
            next_seq: Cell::new(1),
            lists,
            gfx: RefCell::new(GfxBlockMgr::new()),
        }
    }

    pub(crate) fn list(&self, id: EventId) -> Option<&RefCell<EventClientList>> {
        self.lists.get(id as usize).and_then(Option::as_ref)
    }

    /// The registration of `client`, if it has one.
    pub fn client_ref(&self, client: &Rc<dyn EventClient>) -> Option<ClientRef> {
        self.clients
            .borrow()
            .clients()
            .into_iter()
            .find(|r| r.refers_to(client))
    }

    pub fn is_registered(&self, client: &Rc<dyn EventClient>) -> bool {
        self.client_ref(client).is_some()
    }

    /// Registered clients in script id order.
    pub fn clients(&self) -> Vec<ClientRef> {
        self.clients.borrow().clients()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    pub fn add_client(&self, client: &Rc<dyn EventClient>) -> bool {
        if client.name().is_empty() {
            log::debug!("EventClients must have valid names");
            return false;
        }
        if self.is_registered(client) {
            log::debug!("EventClient {} is already registered", client.name());
            return false;
        }
        let seq = ClientSeq(self.next_seq.get());
        self.next_seq.set(seq.0 + 1);
        let entry = ClientRef::new(seq, client);
        if !self.clients.borrow_mut().insert(&entry) {
            log::debug!("Duplicate EventClient name: {}", client.name());
            return false;
        }
        log::debug!("added event client {} (script {})", client.name(), client.script_id());
        true
    }

    /// Unregister `client` from the master list, every event list and every
    /// gfx block. Blocks it owned pass to the next queued claim.
    pub fn remove_client(&self, client: &Rc<dyn EventClient>) -> bool {
        let Some(entry) = self.client_ref(client) else {
            return false;
        };
        let seq = entry.seq();
        self.clients.borrow_mut().remove(seq);
        for list in self.lists.iter().flatten() {
            list.borrow_mut().remove(seq);
        }
        let mut notices = Vec::new();
        self.gfx.borrow_mut().remove_client(seq, &mut notices);
        deliver_all(notices);
        log::debug!("removed event client {}", entry.name());
        true
    }

    /// Whether `client` holds every capability `event` requires.
    pub fn can_use_event(&self, client: &dyn EventClient, event: &str) -> bool {
        EventId::from_name(event).is_some_and(|id| Self::can_use(client, id.spec()))
    }

    fn can_use(client: &dyn EventClient, spec: &EventSpec) -> bool {
        (!spec.req_full_read() || client.full_read())
            && (!spec.req_game_ctrl() || client.game_ctrl())
            && (!spec.req_input_ctrl() || client.input_ctrl())
    }

    pub fn insert_event(&self, client: &Rc<dyn EventClient>, event: &str) -> bool {
        let Some(entry) = self.client_ref(client) else {
            log::debug!("{}: cannot insert {}, client is not registered", client.name(), event);
            return false;
        };
        let Some(id) = EventId::from_name(event) else {
            log::debug!("{}: unknown event {}", client.name(), event);
            return false;
        };
        let Some(list) = self.list(id) else {
            log::debug!("{}: event {} is not list-managed", client.name(), event);
            return false;
        };
        if !Self::can_use(client.as_ref(), id.spec()) {
            log::debug!("{}: missing capability for {}", client.name(), event);
            return false;
        }
        let inserted = list.borrow_mut().insert(&entry);
        if !inserted {
            log::debug!("{}: duplicate entry in {}", client.name(), event);
        }
        inserted
    }

    pub fn remove_event(&self, client: &Rc<dyn EventClient>, event: &str) -> bool {
        let Some(entry) = self.client_ref(client) else {
            return false;
        };
        let Some(list) = EventId::from_name(event).and_then(|id| self.list(id)) else {
            return false;
        };
        list.borrow_mut().remove(entry.seq())
    }

    /// Compact every list and sweep clients that were dropped while
    /// registered.
    pub fn purify(&self) {
        self.clients.borrow_mut().purify();
        for list in self.lists.iter().flatten() {
            list.borrow_mut().purify();
        }
        let mut notices = Vec::new();
        self.gfx.borrow_mut().prune_dead(&mut notices);
        deliver_all(notices);
    }

    // -----------------------------------------------------------------------
    // Event table queries
    // -----------------------------------------------------------------------

    /// Every known event name, in table order.
    pub fn event_names(&self) -> Vec<&'static str> {
        EVENT_TABLE.iter().map(|s| s.name).collect()
    }

    pub fn event_info(&self, event: &str) -> Option<&'static EventSpec> {
        EventId::from_name(event).map(EventId::spec)
    }

    /// Names of the clients registered for `event`, in dispatch order.
    pub fn event_clients(&self, event: &str) -> Vec<String> {
        EventId::from_name(event)
            .and_then(|id| self.list(id))
            .map(|list| list.borrow().names())
            .unwrap_or_default()
    }

    pub fn is_known(&self, event: &str) -> bool {
        EventId::from_name(event).is_some()
    }

    pub fn is_managed(&self, event: &str) -> bool {
        self.event_info(event).is_some_and(EventSpec::is_managed)
    }

    pub fn is_reversed(&self, event: &str) -> bool {
        self.event_info(event).is_some_and(EventSpec::is_reversed)
    }

    pub fn is_reentrant(&self, event: &str) -> bool {
        self.event_info(event).is_some_and(EventSpec::is_reentrant)
    }

    pub fn req_full_read(&self, event: &str) -> bool {
        self.event_info(event).is_some_and(EventSpec::req_full_read)
    }

    pub fn req_game_ctrl(&self, event: &str) -> bool {
        self.event_info(event).is_some_and(EventSpec::req_game_ctrl)
    }

    pub fn req_input_ctrl(&self, event: &str) -> bool {
        self.event_info(event).is_some_and(EventSpec::req_input_ctrl)
    }

    pub fn loop_type(&self, event: &str) -> Option<LoopType> {
        self.event_info(event).map(|s| s.loop_type)
    }

    // -----------------------------------------------------------------------
    // Gfx blocks
    // -----------------------------------------------------------------------

    pub fn gfx_blocks(&self) -> Ref<'_, GfxBlockMgr> {
        self.gfx.borrow()
    }

    /// Claim a block for `client`. Returns `true` if it owns the block after
    /// the call.
    pub fn set_gfx_block(
        &self,
        client: &Rc<dyn EventClient>,
        block_type: BlockType,
        id: i32,
        queue: bool,
    ) -> bool {
        let Some(entry) = self.client_ref(client) else {
            log::debug!("{}: cannot claim a gfx block before registering", client.name());
            return false;
        };
        let mut notices = Vec::new();
        let owns = match self.gfx.borrow_mut().block_mut(block_type, id) {
            Some(block) => block.set(&entry, queue, &mut notices),
            None => false,
        };
        deliver_all(notices);
        owns
    }

    pub fn remove_gfx_block(&self, client: &Rc<dyn EventClient>, block_type: BlockType, id: i32) -> bool {
        let Some(entry) = self.client_ref(client) else {
            return false;
        };
        let mut notices = Vec::new();
        let removed = match self.gfx.borrow_mut().block_mut(block_type, id) {
            Some(block) => block.remove(entry.seq(), &mut notices),
            None => false,
        };
        deliver_all(notices);
        removed
    }

    /// Name of the client owning a block.
    pub fn gfx_owner(&self, block_type: BlockType, id: i32) -> Option<String> {
        self.gfx
            .borrow()
            .block(block_type, id)
            .and_then(|b| b.owner())
            .map(|o| o.name().to_string())
    }

    pub fn add_gfx_entity(&self, kind: EntityKind, id: i32) -> bool {
        self.gfx.borrow_mut().add_entity(kind, id)
    }

    pub fn remove_gfx_entity(&self, kind: EntityKind, id: i32) -> bool {
        let mut notices = Vec::new();
        let removed = self.gfx.borrow_mut().remove_entity(kind, id, &mut notices);
        deliver_all(notices);
        removed
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
