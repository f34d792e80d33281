// Draw passes run through the event handler with the real pass state.
mod utils;

use std::cell::RefCell;
use std::rc::Rc;

use bzclient_core::events::{ClientInfo, DrawPhase, EventClient, EventHandler};
use bzclient_core::{CallInResult, EventError};
use bzclient_render::gl::{GlApi, GlCommand};
use bzclient_render::{GlId, HeadlessGl, MatrixMode, PassState};
use utils::headless;

/// Leaves the attribute and matrix stacks dirty on purpose.
struct Sloppy {
    info: ClientInfo,
    pass: Rc<PassState>,
    gl: Rc<HeadlessGl>,
    seen: Rc<RefCell<Vec<(String, i32, usize)>>>,
}

impl EventClient for Sloppy {
    fn info(&self) -> &ClientInfo {
        &self.info
    }

    fn draw(&self, _phase: DrawPhase) -> CallInResult {
        self.seen.borrow_mut().push((
            self.info.name.clone(),
            self.pass.attrib_depth(),
            self.gl.matrix_stack_depth(MatrixMode::ModelView),
        ));
        self.pass.push_attrib(0x4000)?;
        self.pass.push_attrib(0x0008)?;
        self.pass.push_matrix()?;
        Ok(())
    }
}

fn sloppy(
    name: &str,
    order: i32,
    pass: &Rc<PassState>,
    gl: &Rc<HeadlessGl>,
    seen: &Rc<RefCell<Vec<(String, i32, usize)>>>,
) -> Rc<dyn EventClient> {
    Rc::new(Sloppy {
        info: ClientInfo::new(name, order).with_orders(0, order, order),
        pass: Rc::clone(pass),
        gl: Rc::clone(gl),
        seen: Rc::clone(seen),
    })
}

#[test]
fn every_client_starts_from_a_clean_state() {
    let (gl, ctx) = headless();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let handler = EventHandler::new();
    for (name, order) in [("first", 2), ("second", 1)] {
        let client = sloppy(name, order, ctx.pass(), &gl, &seen);
        assert!(handler.add_client(&client));
        assert!(handler.insert_event(&client, "DrawScreen"));
    }

    handler.draw_screen(ctx.pass().as_ref()).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![("first".to_string(), 1, 1), ("second".to_string(), 1, 1)]
    );
    assert_eq!(ctx.pass().draw_mode(), None);
    assert!(!ctx.pass().drawing_enabled());
    assert_eq!(gl.attrib_stack_depth(), 0);
    for mode in MatrixMode::ALL {
        assert_eq!(gl.matrix_stack_depth(mode), 1, "{}", mode.name());
    }
    assert_eq!(gl.program(), GlId::INVALID);
    assert!(gl.errors().is_empty());

    // a second frame finds nothing left over
    seen.borrow_mut().clear();
    handler.draw_screen(ctx.pass().as_ref()).unwrap();
    assert_eq!(seen.borrow().len(), 2);
    assert!(seen.borrow().iter().all(|(_, attribs, _)| *attribs == 1));
}

#[test]
fn phases_cannot_overlap() {
    let (_gl, ctx) = headless();
    let pass = ctx.pass();
    pass.enable_phase(DrawPhase::World).unwrap();
    assert!(pass.enable_phase(DrawPhase::Screen).is_err());
    assert!(pass.disable_phase(DrawPhase::Screen).is_err());
    pass.disable_phase(DrawPhase::World).unwrap();
    assert!(pass.push_attrib(0x4000).is_err());
}

struct Broken {
    info: ClientInfo,
}

impl EventClient for Broken {
    fn info(&self) -> &ClientInfo {
        &self.info
    }

    fn draw(&self, _phase: DrawPhase) -> CallInResult {
        Err(bzclient_core::CallInError::Script("attempt to index a nil value".into()))
    }
}

#[test]
fn failed_draw_leaves_the_pass_closed() {
    let (gl, ctx) = headless();
    let handler = EventHandler::new();
    let client: Rc<dyn EventClient> = Rc::new(Broken {
        info: ClientInfo::new("broken", 3),
    });
    handler.add_client(&client);
    handler.insert_event(&client, "DrawRadar");

    let err = handler.draw_radar(ctx.pass().as_ref()).unwrap_err();
    assert!(matches!(err, EventError::CallIn { .. }));
    assert_eq!(ctx.pass().draw_mode(), None);
    assert_eq!(gl.attrib_stack_depth(), 0);

    // the next pass still opens
    handler.draw_radar(ctx.pass().as_ref()).unwrap_err();
    assert_eq!(ctx.pass().draw_mode(), None);
}

#[test]
fn compiled_lists_carry_their_stack_effect() {
    let (gl, ctx) = headless();
    let list = ctx
        .compile_list(|pass| {
            pass.push_attrib(0x4000).unwrap();
            pass.push_attrib(0x0001).unwrap();
            pass.pop_attrib().unwrap();
        })
        .unwrap();
    let effect = list.stack_effect();
    assert_eq!((effect.end, effect.min, effect.max), (1, 0, 2));
    assert_eq!(
        gl.list(list.id()),
        Some(vec![
            GlCommand::PushAttrib(0x4000),
            GlCommand::PushAttrib(0x0001),
            GlCommand::PopAttrib,
        ])
    );

    // outside a pass nothing may run
    assert!(ctx.call_list(&list).is_err());

    let pass = ctx.pass();
    pass.enable_phase(DrawPhase::World).unwrap();
    pass.set_max_attrib_depth(2);
    // depth 1 + max 2 would reach 3
    assert!(ctx.call_list(&list).is_err());
    pass.set_max_attrib_depth(16);
    ctx.call_list(&list).unwrap();
    assert_eq!(pass.attrib_depth(), 2);
    assert_eq!(gl.attrib_stack_depth(), 2);
    pass.disable_phase(DrawPhase::World).unwrap();
    assert_eq!(gl.attrib_stack_depth(), 0);
}
