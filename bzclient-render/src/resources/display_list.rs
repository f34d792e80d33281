use std::cell::Cell;
use std::rc::Rc;

use crate::context::{ContextRegistry, ContextResource};
use crate::error::ContextError;
use crate::gl::{GlApi, GlId, ObjectKind};
use crate::pass::StackEffect;
use crate::resources::{create, GlObject};

/// A display list name plus what running it does to the attribute stack.
pub struct DisplayList {
    object: GlObject,
    effect: Cell<StackEffect>,
}

impl DisplayList {
    pub fn new(gl: &Rc<dyn GlApi>, registry: &Rc<ContextRegistry>) -> Result<Rc<Self>, ContextError> {
        create(gl, registry, ObjectKind::DisplayList, |object| Self {
            object,
            effect: Cell::new(StackEffect::default()),
        })
    }

    pub fn id(&self) -> GlId {
        self.object.id()
    }

    pub fn is_valid(&self) -> bool {
        self.object.is_valid()
    }

    pub fn stack_effect(&self) -> StackEffect {
        self.effect.get()
    }

    pub fn set_stack_effect(&self, effect: StackEffect) {
        self.effect.set(effect);
    }

    pub fn delete(&self) -> Result<(), ContextError> {
        self.object.delete()
    }
}

impl ContextResource for DisplayList {
    fn free_context(&self) {
        self.object.free();
        self.effect.set(StackEffect::default());
    }

    // The owner re-records its lists on GLContextInit.
    fn init_context(&self) {}
}
