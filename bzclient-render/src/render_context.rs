use std::rc::{Rc, Weak};

use bytemuck::Pod;

use crate::context::{ContextRegistry, ContextResource};
use crate::error::{ContextError, RenderError};
use crate::gl::{GlApi, MaterialParams, ShaderStage};
use crate::pass::PassState;
use crate::resources::{DisplayList, Fbo, GlBuffer, Material, Query, Rbo, Shader, Texture};

/// Everything a draw call-in needs: the GL backend, the context registry and
/// the pass state. Passed by reference instead of living in statics.
pub struct RenderContext {
    gl: Rc<dyn GlApi>,
    registry: Rc<ContextRegistry>,
    pass: Rc<PassState>,
}

impl RenderContext {
    /// Set up against a context that is already current. The pass state
    /// builds its state lists immediately.
    pub fn new(gl: Rc<dyn GlApi>) -> Self {
        let registry = Rc::new(ContextRegistry::new());
        let pass = Rc::new(PassState::new(Rc::clone(&gl)));
        pass.init_context();
        registry.register(Rc::downgrade(&pass) as Weak<dyn ContextResource>);
        Self { gl, registry, pass }
    }

    pub fn gl(&self) -> &Rc<dyn GlApi> {
        &self.gl
    }

    pub fn registry(&self) -> &Rc<ContextRegistry> {
        &self.registry
    }

    pub fn pass(&self) -> &Rc<PassState> {
        &self.pass
    }

    pub fn has_context(&self) -> bool {
        self.registry.has_context()
    }

    // -----------------------------------------------------------------------
    // Context lifecycle
    // -----------------------------------------------------------------------

    /// Free every registered resource, then let the backend drop the context.
    pub fn lose_context(&self) -> Result<(), ContextError> {
        self.registry.free_all()?;
        self.gl.release_context();
        Ok(())
    }

    /// Make a new context current and reinitialise every registered resource.
    pub fn restore_context(&self) -> Result<(), ContextError> {
        self.gl.create_context();
        self.registry.init_all()
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    pub fn create_display_list(&self) -> Result<Rc<DisplayList>, ContextError> {
        DisplayList::new(&self.gl, &self.registry)
    }

    /// Record a display list. `body` runs with the list open; pushes and pops
    /// it makes through the pass state become the list's stack effect.
    pub fn compile_list<F>(&self, body: F) -> Result<Rc<DisplayList>, RenderError>
    where
        F: FnOnce(&PassState),
    {
        let list = self.create_display_list()?;
        self.pass.new_list(list.id())?;
        body(&self.pass);
        let effect = self.pass.end_list()?;
        list.set_stack_effect(effect);
        Ok(list)
    }

    pub fn call_list(&self, list: &DisplayList) -> Result<(), RenderError> {
        self.pass.call_list(list.id(), list.stack_effect())?;
        Ok(())
    }

    pub fn create_shader(&self, sources: &[(ShaderStage, &str)]) -> Result<Rc<Shader>, ContextError> {
        Shader::new(&self.gl, &self.registry, sources)
    }

    pub fn create_texture(
        &self,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) -> Result<Rc<Texture>, ContextError> {
        Texture::new(&self.gl, &self.registry, width, height, pixels)
    }

    pub fn create_fbo(&self) -> Result<Rc<Fbo>, ContextError> {
        Fbo::new(&self.gl, &self.registry)
    }

    pub fn create_rbo(&self, format: u32, width: u32, height: u32) -> Result<Rc<Rbo>, ContextError> {
        Rbo::new(&self.gl, &self.registry, format, width, height)
    }

    pub fn create_buffer<T: Pod>(&self, data: &[T]) -> Result<Rc<GlBuffer>, ContextError> {
        GlBuffer::new(&self.gl, &self.registry, data)
    }

    pub fn create_query(&self) -> Result<Rc<Query>, ContextError> {
        Query::new(&self.gl, &self.registry)
    }

    pub fn create_material(&self, params: MaterialParams) -> Result<Rc<Material>, ContextError> {
        Material::new(&self.gl, &self.registry, params)
    }
}
