//! GPU resource wrappers.
//!
//! Every wrapper owns one GL object name (a shader also owns its stage
//! objects), allocates it eagerly, and registers itself with the
//! [`ContextRegistry`] for as long as it lives. `free_context` releases the
//! name and leaves [`GlId::INVALID`] behind; calling it again does nothing.
//! `init_context` brings back what the wrapper can rebuild alone:
//! renderbuffers, queries, buffers (from their retained data) and materials.
//! Display lists, shaders, textures and framebuffers are rebuilt by their
//! owners, who get a `GLContextInit` call-in for it.

mod buffer;
mod display_list;
mod framebuffer;
mod material;
mod shader;
mod texture;

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::context::{ContextKey, ContextRegistry, ContextResource};
use crate::error::ContextError;
use crate::gl::{GlApi, GlId, ObjectKind};

pub use buffer::{GlBuffer, Query};
pub use display_list::DisplayList;
pub use framebuffer::{Fbo, Rbo};
pub use material::Material;
pub use shader::Shader;
pub use texture::Texture;

/// One registered GL object name.
pub struct GlObject {
    gl: Rc<dyn GlApi>,
    registry: Rc<ContextRegistry>,
    key: ContextKey,
    kind: ObjectKind,
    id: Cell<GlId>,
}

impl GlObject {
    pub fn id(&self) -> GlId {
        self.id.get()
    }

    pub fn is_valid(&self) -> bool {
        self.id.get().is_valid()
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn gl(&self) -> &dyn GlApi {
        self.gl.as_ref()
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Release the name. Safe to call on an already freed object.
    pub fn free(&self) {
        let id = self.id.replace(GlId::INVALID);
        if !id.is_valid() {
            return;
        }
        if self.registry.has_context() {
            self.gl.delete_object(self.kind, id);
        } else {
            log::debug!("not deleting {} {}, no context", self.kind.name(), id.0);
        }
    }

    /// Allocate a fresh name if the old one was freed. Returns the new name.
    pub fn recreate(&self) -> Option<GlId> {
        if self.is_valid() || self.registry.check_create(self.kind).is_err() {
            return None;
        }
        let id = self.gl.gen_object(self.kind);
        self.id.set(id);
        Some(id)
    }

    /// Explicit deletion, refused while init functions run.
    pub fn delete(&self) -> Result<(), ContextError> {
        self.registry.check_delete(self.kind)?;
        self.free();
        Ok(())
    }
}

impl Drop for GlObject {
    fn drop(&mut self) {
        if self.is_valid() && self.registry.is_executing_init_funcs() {
            log::error!("{} {} dropped during context init", self.kind.name(), self.id().0);
        }
        self.free();
        self.registry.unregister(self.key);
    }
}

/// Allocate a `kind` name and build a registered wrapper around it.
pub(crate) fn create<T, F>(
    gl: &Rc<dyn GlApi>,
    registry: &Rc<ContextRegistry>,
    kind: ObjectKind,
    build: F,
) -> Result<Rc<T>, ContextError>
where
    T: ContextResource + 'static,
    F: FnOnce(GlObject) -> T,
{
    registry.check_create(kind)?;
    let id = gl.gen_object(kind);
    Ok(Rc::new_cyclic(|weak: &Weak<T>| {
        let resource: Weak<dyn ContextResource> = weak.clone();
        let key = registry.register(resource);
        build(GlObject {
            gl: Rc::clone(gl),
            registry: Rc::clone(registry),
            key,
            kind,
            id: Cell::new(id),
        })
    }))
}
