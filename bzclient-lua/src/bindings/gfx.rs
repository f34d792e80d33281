//! `gfx` table: claiming and releasing gfx blocks.
use std::rc::Weak;

use bzclient_core::gfx::{id_code, id_string, type_code, type_string};
use mlua::{Lua, Table, Value};

use crate::bindings::handle_fn;
use crate::convert::{block_id_arg, block_type_arg};
use crate::error::IntoAnyhow;
use crate::handle::LuaHandle;

pub fn register(lua: &Lua, gfx: &Table, this: &Weak<LuaHandle>) -> anyhow::Result<()> {
    // gfx.SetBlock(type, id [, queue]) → boolean, true if the script owns it
    let set_block = handle_fn(
        lua,
        this,
        |_, h, (block_type, id, queue): (Value, Value, Option<bool>)| {
            let block_type = block_type_arg(&block_type)?;
            let id = block_id_arg(&id)?;
            let Some(client) = h.as_client() else {
                return Ok(false);
            };
            Ok(h.handler()
                .set_gfx_block(&client, block_type, id, queue.unwrap_or(false)))
        },
    )
    .into_anyhow()?;

    // gfx.RemoveBlock(type, id) → boolean
    let remove_block = handle_fn(lua, this, |_, h, (block_type, id): (Value, Value)| {
        let block_type = block_type_arg(&block_type)?;
        let id = block_id_arg(&id)?;
        let Some(client) = h.as_client() else {
            return Ok(false);
        };
        Ok(h.handler().remove_gfx_block(&client, block_type, id))
    })
    .into_anyhow()?;

    // gfx.GetOwner(type, id) → string | nil
    let get_owner = handle_fn(lua, this, |_, h, (block_type, id): (Value, Value)| {
        let block_type = block_type_arg(&block_type)?;
        let id = block_id_arg(&id)?;
        Ok(h.handler().gfx_owner(block_type, id))
    })
    .into_anyhow()?;

    let get_type_string = lua
        .create_function(|_, code: i32| Ok(type_string(code)))
        .into_anyhow()?;
    let get_type_id = lua
        .create_function(|_, name: String| Ok(type_code(&name)))
        .into_anyhow()?;
    let get_id_string = lua
        .create_function(|_, id: i32| Ok(id_string(id)))
        .into_anyhow()?;
    let get_id_number = lua
        .create_function(|_, name: String| Ok(id_code(&name)))
        .into_anyhow()?;

    gfx.set("SetBlock", set_block).into_anyhow()?;
    gfx.set("RemoveBlock", remove_block).into_anyhow()?;
    gfx.set("GetOwner", get_owner).into_anyhow()?;
    gfx.set("GetTypeString", get_type_string).into_anyhow()?;
    gfx.set("GetTypeID", get_type_id).into_anyhow()?;
    gfx.set("GetIDString", get_id_string).into_anyhow()?;
    gfx.set("GetIDNumber", get_id_number).into_anyhow()?;
    Ok(())
}
