//! Test Utilities
//!
//! A script host on the headless GL backend and shortcuts for reading what
//! scripts left in their globals.

#![allow(dead_code)]

use std::rc::Rc;

use bzclient_core::ClientInfo;
use bzclient_lua::{LuaHandle, ScriptHost};
use bzclient_render::HeadlessGl;
use mlua::FromLua;

pub fn host() -> (ScriptHost, Rc<HeadlessGl>) {
    let gl = Rc::new(HeadlessGl::new());
    (ScriptHost::new(gl.clone()), gl)
}

/// A client with every capability.
pub fn trusted(name: &str, script_id: i32) -> ClientInfo {
    ClientInfo::new(name, script_id).with_capabilities(true, true, true)
}

pub fn global<T: FromLua>(handle: &LuaHandle, name: &str) -> T {
    handle
        .lua()
        .globals()
        .get::<T>(name)
        .unwrap_or_else(|err| panic!("global {name}: {err}"))
}
