use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ContextRegistry, ContextResource};
use crate::error::ContextError;
use crate::gl::{GlApi, GlId, ObjectKind, ShaderStage};
use crate::resources::{create, GlObject};

/// A linked program and the stage objects it was built from.
pub struct Shader {
    program: GlObject,
    stages: RefCell<Vec<(ShaderStage, GlId)>>,
}

impl Shader {
    /// Compile every stage and link them.
    ///
    /// # Arguments
    ///
    /// * `sources` - One source per stage; at least one is needed to link
    ///
    /// # Returns
    ///
    /// The info log of the first stage that fails to compile, or of the
    /// link, as an error. Everything allocated so far is released.
    pub fn new(
        gl: &Rc<dyn GlApi>,
        registry: &Rc<ContextRegistry>,
        sources: &[(ShaderStage, &str)],
    ) -> Result<Rc<Self>, ContextError> {
        let shader = create(gl, registry, ObjectKind::Program, |program| Self {
            program,
            stages: RefCell::new(Vec::new()),
        })?;
        for (stage, source) in sources {
            registry.check_create(ObjectKind::Shader)?;
            let id = gl.gen_object(ObjectKind::Shader);
            shader.stages.borrow_mut().push((*stage, id));
            gl.compile_shader(id, *stage, source)
                .map_err(|log| ContextError::Compile {
                    stage: stage.name(),
                    log,
                })?;
        }
        let ids: Vec<GlId> = shader.stages.borrow().iter().map(|(_, id)| *id).collect();
        gl.link_program(shader.id(), &ids).map_err(ContextError::Link)?;
        Ok(shader)
    }

    pub fn id(&self) -> GlId {
        self.program.id()
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_valid()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.borrow().len()
    }

    /// Make this the current program.
    pub fn activate(&self) {
        if self.is_valid() {
            self.program.gl().use_program(self.id());
        }
    }

    pub fn delete(&self) -> Result<(), ContextError> {
        self.program.registry().check_delete(ObjectKind::Program)?;
        self.free_context();
        Ok(())
    }

    fn free_stages(&self) {
        let stages = std::mem::take(&mut *self.stages.borrow_mut());
        if !self.program.registry().has_context() {
            return;
        }
        for (_, id) in stages {
            self.program.gl().delete_object(ObjectKind::Shader, id);
        }
    }
}

impl ContextResource for Shader {
    fn free_context(&self) {
        self.free_stages();
        self.program.free();
    }

    // Sources are not retained; the owner recompiles.
    fn init_context(&self) {}
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.free_stages();
    }
}
