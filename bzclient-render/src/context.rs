//! Context Initializer Registry
//!
//! GL objects die with their context. Everything that owns one registers
//! here as a [`ContextResource`]; when the window system tears the context
//! down the registry walks every resource with `free_context`, and once a
//! new context exists it walks them again with `init_context`.
//!
//! The registry only holds weak references. A resource unregisters itself
//! when dropped, and a resource that is already gone is skipped.
//!
//! # Rules
//!
//! - GL objects must not be created while free functions run.
//! - GL objects must not be deleted while init functions run.
//! - Deleting without a context is skipped; the objects are already gone.

use std::cell::{Cell, RefCell};
use std::rc::Weak;

use crate::error::ContextError;
use crate::gl::ObjectKind;

/// Something that holds GL objects across context loss.
pub trait ContextResource {
    /// Release every GL object. Must be safe to call twice.
    fn free_context(&self);
    /// Recreate what can be recreated without the owner's help.
    fn init_context(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey(u64);

struct WalkGuard<'a>(&'a Cell<bool>);

impl Drop for WalkGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct ContextRegistry {
    entries: RefCell<Vec<(ContextKey, Weak<dyn ContextResource>)>>,
    next_key: Cell<u64>,
    executing_free: Cell<bool>,
    executing_init: Cell<bool>,
    has_context: Cell<bool>,
}

impl ContextRegistry {
    /// A registry for a context that is already current.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_key: Cell::new(1),
            executing_free: Cell::new(false),
            executing_init: Cell::new(false),
            has_context: Cell::new(true),
        }
    }

    pub fn register(&self, resource: Weak<dyn ContextResource>) -> ContextKey {
        let key = ContextKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.entries.borrow_mut().push((key, resource));
        key
    }

    pub fn unregister(&self, key: ContextKey) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(k, _)| *k != key);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn is_executing_free_funcs(&self) -> bool {
        self.executing_free.get()
    }

    pub fn is_executing_init_funcs(&self) -> bool {
        self.executing_init.get()
    }

    pub fn has_context(&self) -> bool {
        self.has_context.get()
    }

    /// Gate for object creation.
    pub fn check_create(&self, kind: ObjectKind) -> Result<(), ContextError> {
        if self.executing_free.get() {
            log::error!("creating a {} while context free functions run", kind.name());
            return Err(ContextError::CreateDuringFree(kind));
        }
        if !self.has_context.get() {
            return Err(ContextError::NoContext(kind));
        }
        Ok(())
    }

    /// Gate for explicit object deletion.
    pub fn check_delete(&self, kind: ObjectKind) -> Result<(), ContextError> {
        if self.executing_init.get() {
            log::error!("deleting a {} while context init functions run", kind.name());
            return Err(ContextError::DeleteDuringInit(kind));
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<(ContextKey, Weak<dyn ContextResource>)> {
        self.entries.borrow().clone()
    }

    fn still_registered(&self, key: ContextKey) -> bool {
        self.entries.borrow().iter().any(|(k, _)| *k == key)
    }

    fn check_walk(&self, name: &'static str) -> Result<(), ContextError> {
        if self.executing_free.get() || self.executing_init.get() {
            log::error!("context {} walk requested during another walk", name);
            return Err(ContextError::ReentrantWalk(name));
        }
        Ok(())
    }

    /// Free every resource in registration order. The context counts as
    /// gone afterwards.
    pub fn free_all(&self) -> Result<(), ContextError> {
        self.check_walk("free")?;
        log::info!("freeing GL context resources ({} registered)", self.len());
        {
            self.executing_free.set(true);
            let _guard = WalkGuard(&self.executing_free);
            for (key, entry) in self.snapshot() {
                if !self.still_registered(key) {
                    continue;
                }
                if let Some(resource) = entry.upgrade() {
                    resource.free_context();
                }
            }
        }
        self.has_context.set(false);
        Ok(())
    }

    /// Initialise every resource in registration order against a fresh
    /// context.
    pub fn init_all(&self) -> Result<(), ContextError> {
        self.check_walk("init")?;
        self.has_context.set(true);
        log::info!("initialising GL context resources ({} registered)", self.len());
        self.executing_init.set(true);
        let _guard = WalkGuard(&self.executing_init);
        for (key, entry) in self.snapshot() {
            if !self.still_registered(key) {
                continue;
            }
            if let Some(resource) = entry.upgrade() {
                resource.init_context();
            }
        }
        Ok(())
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}
