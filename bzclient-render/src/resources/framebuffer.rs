use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ContextRegistry, ContextResource};
use crate::error::ContextError;
use crate::gl::{GlApi, GlId, ObjectKind};
use crate::resources::{create, GlObject};

/// Framebuffer object. Attachments reference other objects' names, which
/// change across a context reset, so the owner re-attaches.
pub struct Fbo {
    object: GlObject,
    attachments: RefCell<Vec<(u32, GlId)>>,
}

impl Fbo {
    pub fn new(gl: &Rc<dyn GlApi>, registry: &Rc<ContextRegistry>) -> Result<Rc<Self>, ContextError> {
        create(gl, registry, ObjectKind::Framebuffer, |object| Self {
            object,
            attachments: RefCell::new(Vec::new()),
        })
    }

    pub fn id(&self) -> GlId {
        self.object.id()
    }

    pub fn is_valid(&self) -> bool {
        self.object.is_valid()
    }

    pub fn attach(&self, attachment: u32, target: GlId) {
        self.object.gl().framebuffer_attach(self.id(), attachment, target);
        let mut attachments = self.attachments.borrow_mut();
        attachments.retain(|(a, _)| *a != attachment);
        attachments.push((attachment, target));
    }

    pub fn attachments(&self) -> Vec<(u32, GlId)> {
        self.attachments.borrow().clone()
    }

    pub fn delete(&self) -> Result<(), ContextError> {
        self.object.delete()
    }
}

impl ContextResource for Fbo {
    fn free_context(&self) {
        self.object.free();
        self.attachments.borrow_mut().clear();
    }

    fn init_context(&self) {}
}

/// Renderbuffer. Its storage is fully described by format and size, so it
/// comes back by itself after a context reset.
pub struct Rbo {
    object: GlObject,
    format: u32,
    width: u32,
    height: u32,
}

impl Rbo {
    pub fn new(
        gl: &Rc<dyn GlApi>,
        registry: &Rc<ContextRegistry>,
        format: u32,
        width: u32,
        height: u32,
    ) -> Result<Rc<Self>, ContextError> {
        let rbo = create(gl, registry, ObjectKind::Renderbuffer, |object| Self {
            object,
            format,
            width,
            height,
        })?;
        rbo.allocate();
        Ok(rbo)
    }

    fn allocate(&self) {
        self.object
            .gl()
            .renderbuffer_storage(self.id(), self.format, self.width, self.height);
    }

    pub fn id(&self) -> GlId {
        self.object.id()
    }

    pub fn is_valid(&self) -> bool {
        self.object.is_valid()
    }

    pub fn format(&self) -> u32 {
        self.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn delete(&self) -> Result<(), ContextError> {
        self.object.delete()
    }
}

impl ContextResource for Rbo {
    fn free_context(&self) {
        self.object.free();
    }

    fn init_context(&self) {
        if self.object.recreate().is_some() {
            self.allocate();
        }
    }
}
