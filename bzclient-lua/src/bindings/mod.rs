pub mod gfx;
pub mod gl;
pub mod script;

use std::rc::Weak;

use mlua::{FromLuaMulti, Function, IntoLuaMulti, Lua};

use crate::error::IntoAnyhow;
use crate::handle::LuaHandle;

pub use gl::{ScriptObject, ScriptResources};

/// Install the `Script`, `gl` and `gfx` globals.
pub fn register_all(lua: &Lua, this: &Weak<LuaHandle>) -> anyhow::Result<()> {
    let globals = lua.globals();

    let script = lua.create_table().into_anyhow()?;
    script::register(lua, &script, this)?;
    globals.set("Script", script).into_anyhow()?;

    let gl = lua.create_table().into_anyhow()?;
    gl::register(lua, &gl, this)?;
    globals.set("gl", gl).into_anyhow()?;

    let gfx = lua.create_table().into_anyhow()?;
    gfx::register(lua, &gfx, this)?;
    globals.set("gfx", gfx).into_anyhow()?;
    Ok(())
}

/// A Lua function that runs `f` against the handle owning the state.
pub(crate) fn handle_fn<A, R, F>(lua: &Lua, this: &Weak<LuaHandle>, f: F) -> mlua::Result<Function>
where
    A: FromLuaMulti,
    R: IntoLuaMulti,
    F: Fn(&Lua, &LuaHandle, A) -> mlua::Result<R> + 'static,
{
    let this = this.clone();
    lua.create_function(move |lua, args: A| {
        let handle = this
            .upgrade()
            .ok_or_else(|| mlua::Error::runtime("script handle has been unloaded"))?;
        f(lua, &handle, args)
    })
}
