use std::rc::Rc;

use crate::context::{ContextRegistry, ContextResource};
use crate::error::ContextError;
use crate::gl::{GlApi, GlId, ObjectKind};
use crate::resources::{create, GlObject};

pub struct Texture {
    object: GlObject,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn new(
        gl: &Rc<dyn GlApi>,
        registry: &Rc<ContextRegistry>,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) -> Result<Rc<Self>, ContextError> {
        let texture = create(gl, registry, ObjectKind::Texture, |object| Self {
            object,
            width,
            height,
        })?;
        gl.tex_image_2d(texture.id(), width, height, pixels);
        Ok(texture)
    }

    pub fn id(&self) -> GlId {
        self.object.id()
    }

    pub fn is_valid(&self) -> bool {
        self.object.is_valid()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn delete(&self) -> Result<(), ContextError> {
        self.object.delete()
    }
}

impl ContextResource for Texture {
    fn free_context(&self) {
        self.object.free();
    }

    // Pixel data is not retained; the owner reloads it.
    fn init_context(&self) {}
}
