// Context loss and recovery of the GPU resource wrappers.
mod utils;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bzclient_render::gl::MaterialParams;
use bzclient_render::resources::Texture;
use bzclient_render::{ContextError, ContextResource, GlId, ObjectKind, ShaderStage};
use utils::headless;

const VERTEX: &str = "void main() { gl_Position = ftransform(); }";
const FRAGMENT: &str = "void main() { gl_FragColor = vec4(1.0); }";

fn free_twice(resource: &dyn ContextResource) {
    resource.free_context();
    resource.free_context();
}

#[test]
fn freeing_twice_matches_freeing_once() {
    let (gl, ctx) = headless();
    let list = ctx.create_display_list().unwrap();
    let shader = ctx
        .create_shader(&[(ShaderStage::Vertex, VERTEX), (ShaderStage::Fragment, FRAGMENT)])
        .unwrap();
    let texture = ctx.create_texture(64, 64, None).unwrap();
    let fbo = ctx.create_fbo().unwrap();
    let rbo = ctx.create_rbo(0x81A6, 64, 64).unwrap();
    let buffer = ctx.create_buffer(&[1.0f32, 2.0, 3.0]).unwrap();
    let query = ctx.create_query().unwrap();
    let material = ctx.create_material(MaterialParams::default()).unwrap();

    free_twice(list.as_ref());
    free_twice(shader.as_ref());
    free_twice(texture.as_ref());
    free_twice(fbo.as_ref());
    free_twice(rbo.as_ref());
    free_twice(buffer.as_ref());
    free_twice(query.as_ref());
    free_twice(material.as_ref());

    assert_eq!(gl.double_deletes(), 0);
    assert_eq!(list.id(), GlId::INVALID);
    assert_eq!(shader.id(), GlId::INVALID);
    assert_eq!(shader.stage_count(), 0);
    assert_eq!(texture.id(), GlId::INVALID);
    assert_eq!(fbo.id(), GlId::INVALID);
    assert_eq!(rbo.id(), GlId::INVALID);
    assert_eq!(buffer.id(), GlId::INVALID);
    assert_eq!(query.id(), GlId::INVALID);
    assert_eq!(material.id(), GlId::INVALID);

    // only the pass state lists are left
    assert_eq!(gl.live_count(), 8);
}

#[test]
fn context_reset_recreates_what_can_be_recreated() {
    let (gl, ctx) = headless();
    let list = ctx.create_display_list().unwrap();
    let texture = ctx.create_texture(16, 16, None).unwrap();
    let fbo = ctx.create_fbo().unwrap();
    let rbo = ctx.create_rbo(0x81A6, 32, 8).unwrap();
    let buffer = ctx.create_buffer(&[7u16, 8, 9, 10]).unwrap();
    let query = ctx.create_query().unwrap();
    let params = MaterialParams {
        shininess: 12.0,
        ..MaterialParams::default()
    };
    let material = ctx.create_material(params).unwrap();

    ctx.lose_context().unwrap();
    assert!(!ctx.has_context());
    assert_eq!(gl.leaked(), 0);

    ctx.restore_context().unwrap();
    assert!(ctx.has_context());

    assert!(!list.is_valid());
    assert!(!texture.is_valid());
    assert!(!fbo.is_valid());

    assert!(rbo.is_valid());
    assert_eq!(gl.texture_size(rbo.id()), Some((32, 8)));
    assert!(query.is_valid());
    assert!(buffer.is_valid());
    assert_eq!(gl.buffer_len(buffer.id()), Some(8));
    assert!(material.is_valid());
    material.execute();
    assert_eq!(gl.material(), Some(params));

    for phase in bzclient_core::DrawPhase::ALL {
        assert!(gl.is_live(ctx.pass().state_list(phase)));
    }
}

#[test]
fn dropping_a_wrapper_frees_and_unregisters() {
    let (gl, ctx) = headless();
    let registered = ctx.registry().len();
    let texture = ctx.create_texture(4, 4, None).unwrap();
    let id = texture.id();
    assert_eq!(ctx.registry().len(), registered + 1);

    drop(texture);
    assert!(!gl.is_live(id));
    assert_eq!(ctx.registry().len(), registered);
}

#[test]
fn explicit_delete_then_drop_deletes_once() {
    let (gl, ctx) = headless();
    let query = ctx.create_query().unwrap();
    query.delete().unwrap();
    assert!(!query.is_valid());
    drop(query);
    assert_eq!(gl.double_deletes(), 0);
}

#[test]
fn shader_errors_release_everything() {
    let (gl, ctx) = headless();
    let before = gl.live_count();
    let err = ctx
        .create_shader(&[(ShaderStage::Vertex, VERTEX), (ShaderStage::Fragment, "#error nope")])
        .err();
    assert!(matches!(err, Some(ContextError::Compile { stage: "fragment", .. })));
    assert_eq!(gl.live_count(), before);

    let err = ctx.create_shader(&[]).err();
    assert!(matches!(err, Some(ContextError::Link(_))));
    assert_eq!(gl.live_count(), before);
}

/// Misbehaves during the context walks and records what happened.
struct Meddler {
    victim: RefCell<Option<Rc<Texture>>>,
    ctx: Weak<bzclient_render::RenderContext>,
    outcomes: RefCell<Vec<Result<(), ContextError>>>,
}

impl ContextResource for Meddler {
    fn free_context(&self) {
        if let Some(ctx) = self.ctx.upgrade() {
            let created = ctx.create_query().map(|_| ());
            self.outcomes.borrow_mut().push(created);
        }
    }

    fn init_context(&self) {
        if let Some(victim) = self.victim.borrow().as_ref() {
            self.outcomes.borrow_mut().push(victim.delete());
        }
    }
}

#[test]
fn walks_reject_creation_during_free_and_deletion_during_init() {
    let (gl, ctx) = headless();
    let ctx = Rc::new(ctx);
    let victim = ctx.create_texture(2, 2, None).unwrap();
    let meddler = Rc::new(Meddler {
        victim: RefCell::new(Some(victim)),
        ctx: Rc::downgrade(&ctx),
        outcomes: RefCell::new(Vec::new()),
    });
    ctx.registry()
        .register(Rc::downgrade(&meddler) as Weak<dyn ContextResource>);

    ctx.lose_context().unwrap();
    ctx.restore_context().unwrap();

    assert_eq!(
        *meddler.outcomes.borrow(),
        vec![
            Err(ContextError::CreateDuringFree(ObjectKind::Query)),
            Err(ContextError::DeleteDuringInit(ObjectKind::Texture)),
        ]
    );
    assert!(!ctx.registry().is_executing_free_funcs());
    assert!(!ctx.registry().is_executing_init_funcs());
    assert_eq!(gl.leaked(), 0);
}

#[test]
fn creation_without_a_context_is_refused() {
    let (_gl, ctx) = headless();
    ctx.lose_context().unwrap();
    assert_eq!(
        ctx.create_query().err(),
        Some(ContextError::NoContext(ObjectKind::Query))
    );
}

#[test]
fn init_without_a_prior_free_allocates_nothing() {
    let (gl, ctx) = headless();
    let _rbo = ctx.create_rbo(0x8058, 4, 4).unwrap();
    let _buffer = ctx.create_buffer(&[1.0f32, 2.0]).unwrap();
    let _query = ctx.create_query().unwrap();
    let before = gl.live_count();
    assert_eq!(gl.live_objects(ObjectKind::DisplayList), 8);

    ctx.registry().init_all().unwrap();
    assert_eq!(gl.live_count(), before);
    assert_eq!(gl.live_objects(ObjectKind::DisplayList), 8);

    ctx.restore_context().unwrap();
    assert_eq!(gl.live_count(), before);
    assert_eq!(gl.leaked(), 0);
}
