use bzclient_core::DrawPhase;
use thiserror::Error;

use crate::gl::{MatrixMode, ObjectKind};

fn phase_name(phase: &Option<DrawPhase>) -> &'static str {
    phase.map_or("none", DrawPhase::name)
}

/// Misuse of the pass state: unbalanced stacks, wrong phase, bad list nesting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassStateError {
    #[error("cannot enable {}, {} is still active", .requested.name(), .active.name())]
    PhaseActive {
        active: DrawPhase,
        requested: DrawPhase,
    },

    #[error("{} is not the active draw mode ({})", .requested.name(), phase_name(.active))]
    WrongPhase {
        requested: DrawPhase,
        active: Option<DrawPhase>,
    },

    #[error("drawing is not enabled")]
    NotDrawing,

    #[error("attribute stack overflow (depth {depth}, max {max})")]
    AttribOverflow { depth: i32, max: i32 },

    #[error("attribute stack underflow (depth {depth}, min {min})")]
    AttribUnderflow { depth: i32, min: i32 },

    #[error("{} stack overflow (limit {limit})", .mode.name())]
    MatrixOverflow { mode: MatrixMode, limit: usize },

    #[error("{} stack underflow", .mode.name())]
    MatrixUnderflow { mode: MatrixMode },

    #[error("a display list is already being created")]
    ListInProgress,

    #[error("no display list is being created")]
    NoListOpen,

    #[error("display list has been freed")]
    InvalidList,
}

/// Violations of the context-initializer protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("creating a {} while context free functions run", .0.name())]
    CreateDuringFree(ObjectKind),

    #[error("deleting a {} while context init functions run", .0.name())]
    DeleteDuringInit(ObjectKind),

    #[error("context {0} walk started while another walk is running")]
    ReentrantWalk(&'static str),

    #[error("no GL context to create a {} in", .0.name())]
    NoContext(ObjectKind),

    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: &'static str, log: String },

    #[error("program failed to link: {0}")]
    Link(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error(transparent)]
    Pass(#[from] PassStateError),

    #[error(transparent)]
    Context(#[from] ContextError),
}
