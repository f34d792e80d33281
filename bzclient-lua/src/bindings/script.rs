//! `Script` table: the handle's identity and call-in management.
use std::rc::Weak;

use bzclient_core::EventClient;
use mlua::{Function, Lua, Table};

use crate::bindings::handle_fn;
use crate::error::IntoAnyhow;
use crate::handle::LuaHandle;

pub fn register(lua: &Lua, script: &Table, this: &Weak<LuaHandle>) -> anyhow::Result<()> {
    // Script.GetName() → string
    let get_name = handle_fn(lua, this, |_, h, ()| Ok(h.name().to_string())).into_anyhow()?;
    // Script.GetID() → integer
    let get_id = handle_fn(lua, this, |_, h, ()| Ok(h.script_id())).into_anyhow()?;
    let get_full_read = handle_fn(lua, this, |_, h, ()| Ok(h.full_read())).into_anyhow()?;
    let get_game_ctrl = handle_fn(lua, this, |_, h, ()| Ok(h.game_ctrl())).into_anyhow()?;
    let get_input_ctrl = handle_fn(lua, this, |_, h, ()| Ok(h.input_ctrl())).into_anyhow()?;

    // Script.CanUseCallIn(name) → boolean
    let can_use_call_in = handle_fn(lua, this, |_, h, name: String| {
        Ok(h.handler().can_use_event(h, &name))
    })
    .into_anyhow()?;

    // Script.SetCallIn(name, fn | nil) → boolean
    let set_call_in = handle_fn(lua, this, |_, h, (name, func): (String, Option<Function>)| {
        Ok(h.set_call_in(&name, func))
    })
    .into_anyhow()?;

    // Script.GetCallInInfo(name) → table | nil
    let get_call_in_info = handle_fn(lua, this, |lua, h, name: String| {
        let Some(spec) = h.handler().event_info(&name) else {
            return Ok(None);
        };
        let info = lua.create_table()?;
        info.set("loopType", spec.loop_type.name())?;
        info.set("reversed", spec.is_reversed())?;
        info.set("reentrant", spec.is_reentrant())?;
        info.set("reqFullRead", spec.req_full_read())?;
        info.set("reqGameCtrl", spec.req_game_ctrl())?;
        info.set("reqInputCtrl", spec.req_input_ctrl())?;
        info.set("managed", spec.is_managed())?;
        Ok(Some(info))
    })
    .into_anyhow()?;

    script.set("GetName", get_name).into_anyhow()?;
    script.set("GetID", get_id).into_anyhow()?;
    script.set("GetFullRead", get_full_read).into_anyhow()?;
    script.set("GetGameCtrl", get_game_ctrl).into_anyhow()?;
    script.set("GetInputCtrl", get_input_ctrl).into_anyhow()?;
    script.set("CanUseCallIn", can_use_call_in).into_anyhow()?;
    script.set("SetCallIn", set_call_in).into_anyhow()?;
    script.set("GetCallInInfo", get_call_in_info).into_anyhow()?;
    Ok(())
}
