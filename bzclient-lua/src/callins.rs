//! Call-in registry: maps event ids to the Lua functions a script installed
//! for them.
//!
//! Functions are held directly; a handle's Lua state never leaves its thread.
use std::collections::BTreeMap;

use bzclient_core::events::EventId;
use mlua::Function;

#[derive(Default)]
pub struct CallInRegistry {
    functions: BTreeMap<EventId, Function>,
}

impl CallInRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `func` for `event`, replacing any previous one.
    pub fn register(&mut self, event: EventId, func: Function) {
        self.functions.insert(event, func);
    }

    /// A clone of the installed function, so the caller can drop the borrow
    /// before calling into Lua.
    pub fn get(&self, event: EventId) -> Option<Function> {
        self.functions.get(&event).cloned()
    }

    pub fn has_call_in(&self, event: EventId) -> bool {
        self.functions.contains_key(&event)
    }

    pub fn remove(&mut self, event: EventId) -> bool {
        self.functions.remove(&event).is_some()
    }

    /// Installed events, in table order.
    pub fn events(&self) -> Vec<EventId> {
        self.functions.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.functions.clear();
    }
}
