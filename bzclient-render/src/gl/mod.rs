//! GL backend seam.
//!
//! Everything above this module talks to OpenGL through [`GlApi`]. The trait
//! is deliberately small: object name management, the attribute and matrix
//! stacks, display-list recording and the few uploads the resource wrappers
//! need. [`HeadlessGl`] implements it without a driver and is what the tests
//! and the headless CLI run on.

pub mod headless;
pub mod matrix;
pub mod state;

use serde::{Deserialize, Serialize};

pub use headless::{GlCommand, HeadlessGl};
pub use matrix::{Mat4, IDENTITY};
pub use state::{MaterialParams, ModeState, ShadowSettings};

/// `GL_ALL_ATTRIB_BITS`
pub const ALL_ATTRIB_BITS: u32 = 0xFFFF_FFFF;

/// A GL object name. Zero is never handed out by GL, so it doubles as the
/// "no object" sentinel a freed wrapper holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GlId(pub u32);

impl GlId {
    pub const INVALID: GlId = GlId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    DisplayList,
    Texture,
    Shader,
    Program,
    Framebuffer,
    Renderbuffer,
    Buffer,
    Query,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::DisplayList => "display list",
            ObjectKind::Texture => "texture",
            ObjectKind::Shader => "shader",
            ObjectKind::Program => "program",
            ObjectKind::Framebuffer => "framebuffer",
            ObjectKind::Renderbuffer => "renderbuffer",
            ObjectKind::Buffer => "buffer",
            ObjectKind::Query => "query",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatrixMode {
    ModelView,
    Projection,
    Texture,
}

impl MatrixMode {
    pub const ALL: [MatrixMode; 3] = [MatrixMode::ModelView, MatrixMode::Projection, MatrixMode::Texture];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Stack depth every implementation guarantees.
    pub fn limit(self) -> usize {
        match self {
            MatrixMode::ModelView => 32,
            MatrixMode::Projection | MatrixMode::Texture => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MatrixMode::ModelView => "GL_MODELVIEW",
            MatrixMode::Projection => "GL_PROJECTION",
            MatrixMode::Texture => "GL_TEXTURE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// The OpenGL calls the client core makes.
///
/// Calls that GL compiles into a display list (stack operations, matrix
/// loads, state blocks, list calls) are recorded instead of executed while a
/// list is open. Object creation and deletion always execute.
pub trait GlApi {
    fn gen_object(&self, kind: ObjectKind) -> GlId;
    fn delete_object(&self, kind: ObjectKind, id: GlId);

    fn push_attrib(&self, bits: u32);
    fn pop_attrib(&self);
    fn attrib_stack_depth(&self) -> usize;

    fn matrix_mode(&self, mode: MatrixMode);
    fn push_matrix(&self);
    fn pop_matrix(&self);
    fn matrix_stack_depth(&self, mode: MatrixMode) -> usize;
    fn load_identity(&self);
    fn load_matrix(&self, m: &Mat4);
    fn mult_matrix(&self, m: &Mat4);

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32);

    fn new_list(&self, id: GlId);
    fn end_list(&self);
    fn call_list(&self, id: GlId);

    fn apply_mode_state(&self, state: &ModeState);
    fn apply_material(&self, params: &MaterialParams);
    fn use_program(&self, program: GlId);

    /// Compile a shader object. The error carries the info log.
    fn compile_shader(&self, shader: GlId, stage: ShaderStage, source: &str) -> Result<(), String>;
    /// Attach `shaders` to `program` and link it.
    fn link_program(&self, program: GlId, shaders: &[GlId]) -> Result<(), String>;

    fn tex_image_2d(&self, texture: GlId, width: u32, height: u32, pixels: Option<&[u8]>);
    fn renderbuffer_storage(&self, rbo: GlId, format: u32, width: u32, height: u32);
    fn buffer_data(&self, buffer: GlId, data: &[u8]);
    fn framebuffer_attach(&self, fbo: GlId, attachment: u32, target: GlId);

    /// The window system is about to destroy the context.
    fn release_context(&self) {}
    /// A new context has been made current.
    fn create_context(&self) {}
}
