//! Test Utilities
//!
//! A render context on the headless backend, with the backend kept at hand
//! for inspection.

#![allow(dead_code)]

use std::rc::Rc;

use bzclient_render::{HeadlessGl, RenderContext};

pub fn headless() -> (Rc<HeadlessGl>, RenderContext) {
    let gl = Rc::new(HeadlessGl::new());
    let ctx = RenderContext::new(gl.clone());
    (gl, ctx)
}
