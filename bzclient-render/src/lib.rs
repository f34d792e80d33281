//! OpenGL pass state and GPU resource lifecycle for the BZFlag client.
//!
//! [`PassState`] brackets the draw phases the core event handler runs and
//! keeps GL stacks balanced between clients. [`ContextRegistry`] and the
//! wrappers in [`resources`] keep GPU objects consistent across context
//! loss. [`RenderContext`] ties the three to one [`GlApi`] backend.

pub mod context;
pub mod error;
pub mod gl;
pub mod pass;
pub mod render_context;
pub mod resources;

pub use context::{ContextKey, ContextRegistry, ContextResource};
pub use error::{ContextError, PassStateError, RenderError};
pub use gl::{GlApi, GlId, HeadlessGl, MatrixMode, ObjectKind, ShaderStage};
pub use pass::{PassState, StackEffect};
pub use render_context::RenderContext;
