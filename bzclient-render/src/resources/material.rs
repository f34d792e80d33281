use std::cell::Cell;
use std::rc::Rc;

use crate::context::{ContextRegistry, ContextResource};
use crate::error::ContextError;
use crate::gl::{GlApi, GlId, MaterialParams, ObjectKind};
use crate::resources::{create, GlObject};

/// Material parameters compiled into a display list. The parameters are
/// retained, so the list is recompiled after a context reset.
pub struct Material {
    object: GlObject,
    params: Cell<MaterialParams>,
}

impl Material {
    pub fn new(
        gl: &Rc<dyn GlApi>,
        registry: &Rc<ContextRegistry>,
        params: MaterialParams,
    ) -> Result<Rc<Self>, ContextError> {
        let material = create(gl, registry, ObjectKind::DisplayList, |object| Self {
            object,
            params: Cell::new(params),
        })?;
        material.compile();
        Ok(material)
    }

    fn compile(&self) {
        let gl = self.object.gl();
        gl.new_list(self.id());
        gl.apply_material(&self.params.get());
        gl.end_list();
    }

    pub fn params(&self) -> MaterialParams {
        self.params.get()
    }

    pub fn set_params(&self, params: MaterialParams) {
        self.params.set(params);
        if self.is_valid() {
            self.compile();
        }
    }

    /// Apply the material.
    pub fn execute(&self) {
        if self.is_valid() {
            self.object.gl().call_list(self.id());
        }
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

impl ContextResource for Material {
    fn free_context(&self) {
        self.object.free();
    }

    fn init_context(&self) {
        if self.object.recreate().is_some() {
            self.compile();
        }
    }
}
