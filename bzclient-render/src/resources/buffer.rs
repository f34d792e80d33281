use std::cell::RefCell;
use std::rc::Rc;

use bytemuck::Pod;

use crate::context::{ContextRegistry, ContextResource};
use crate::error::ContextError;
use crate::gl::{GlApi, GlId, ObjectKind};
use crate::resources::{create, GlObject};

/// Vertex/index buffer. Keeps a copy of its contents so it can re-upload
/// after a context reset.
pub struct GlBuffer {
    object: GlObject,
    data: RefCell<Vec<u8>>,
}

impl GlBuffer {
    pub fn new<T: Pod>(
        gl: &Rc<dyn GlApi>,
        registry: &Rc<ContextRegistry>,
        data: &[T],
    ) -> Result<Rc<Self>, ContextError> {
        let bytes = bytemuck::cast_slice::<T, u8>(data).to_vec();
        let buffer = create(gl, registry, ObjectKind::Buffer, |object| Self {
            object,
            data: RefCell::new(bytes),
        })?;
        buffer.upload();
        Ok(buffer)
    }

    fn upload(&self) {
        self.object.gl().buffer_data(self.id(), &self.data.borrow());
    }

    /// Replace the contents.
    pub fn update<T: Pod>(&self, data: &[T]) {
        *self.data.borrow_mut() = bytemuck::cast_slice::<T, u8>(data).to_vec();
        if self.is_valid() {
            self.upload();
        }
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    pub fn id(&self) -> GlId {
        self.object.id()
    }

    pub fn is_valid(&self) -> bool {
        self.object.is_valid()
    }

    pub fn delete(&self) -> Result<(), ContextError> {
        self.object.delete()
    }
}

impl ContextResource for GlBuffer {
    fn free_context(&self) {
        self.object.free();
    }

    fn init_context(&self) {
        if self.object.recreate().is_some() {
            self.upload();
        }
    }
}

/// Occlusion query. Results do not survive a reset; the name does.
pub struct Query {
    object: GlObject,
}

impl Query {
    pub fn new(gl: &Rc<dyn GlApi>, registry: &Rc<ContextRegistry>) -> Result<Rc<Self>, ContextError> {
        create(gl, registry, ObjectKind::Query, |object| Self { object })
    }

    pub fn id(&self) -> GlId {
        self.object.id()
    }

    pub fn is_valid(&self) -> bool {
        self.object.is_valid()
    }

    pub fn delete(&self) -> Result<(), ContextError> {
        self.object.delete()
    }
}

impl ContextResource for Query {
    fn free_context(&self) {
        self.object.free();
    }

    fn init_context(&self) {
        self.object.recreate();
    }
}
