//! `gl` table: stack operations through the pass state, and GPU objects.
//!
//! Scripts never see GL names. Every object a script creates is kept in the
//! handle's [`ScriptResources`] and the script gets a small integer for it.
//! The wrapper stays registered with the context registry, so a context reset
//! frees it like any other; the script rebuilds what it needs from its
//! `GLContextInit` call-in.

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use bzclient_core::EventClient;
use bzclient_render::gl::ALL_ATTRIB_BITS;
use bzclient_render::resources::{DisplayList, Fbo, GlBuffer, Query, Rbo, Shader, Texture};
use bzclient_render::{ContextError, GlApi, GlId, MatrixMode, ObjectKind, ShaderStage};
use mlua::{Function, Lua, Table};

use crate::bindings::handle_fn;
use crate::error::{IntoAnyhow, LuaBindingError};
use crate::handle::LuaHandle;

/// `GL_RGBA8`
const DEFAULT_RBO_FORMAT: u32 = 0x8058;

#[derive(Clone)]
pub enum ScriptObject {
    List(Rc<DisplayList>),
    Texture(Rc<Texture>),
    Shader(Rc<Shader>),
    Fbo(Rc<Fbo>),
    Rbo(Rc<Rbo>),
    Buffer(Rc<GlBuffer>),
    Query(Rc<Query>),
}

impl ScriptObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ScriptObject::List(_) => ObjectKind::DisplayList,
            ScriptObject::Texture(_) => ObjectKind::Texture,
            ScriptObject::Shader(_) => ObjectKind::Program,
            ScriptObject::Fbo(_) => ObjectKind::Framebuffer,
            ScriptObject::Rbo(_) => ObjectKind::Renderbuffer,
            ScriptObject::Buffer(_) => ObjectKind::Buffer,
            ScriptObject::Query(_) => ObjectKind::Query,
        }
    }

    pub fn gl_id(&self) -> GlId {
        match self {
            ScriptObject::List(o) => o.id(),
            ScriptObject::Texture(o) => o.id(),
            ScriptObject::Shader(o) => o.id(),
            ScriptObject::Fbo(o) => o.id(),
            ScriptObject::Rbo(o) => o.id(),
            ScriptObject::Buffer(o) => o.id(),
            ScriptObject::Query(o) => o.id(),
        }
    }

    fn delete(&self) -> Result<(), ContextError> {
        match self {
            ScriptObject::List(o) => o.delete(),
            ScriptObject::Texture(o) => o.delete(),
            ScriptObject::Shader(o) => o.delete(),
            ScriptObject::Fbo(o) => o.delete(),
            ScriptObject::Rbo(o) => o.delete(),
            ScriptObject::Buffer(o) => o.delete(),
            ScriptObject::Query(o) => o.delete(),
        }
    }
}

/// GPU objects owned by one script, keyed by the number the script holds.
#[derive(Default)]
pub struct ScriptResources {
    next: u32,
    objects: BTreeMap<u32, ScriptObject>,
}

impl ScriptResources {
    pub fn insert(&mut self, object: ScriptObject) -> u32 {
        self.next += 1;
        self.objects.insert(self.next, object);
        self.next
    }

    pub fn get(&self, handle: u32) -> Option<&ScriptObject> {
        self.objects.get(&handle)
    }

    pub fn remove(&mut self, handle: u32) -> Option<ScriptObject> {
        self.objects.remove(&handle)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.values().filter(|o| o.kind() == kind).count()
    }
}

fn lua_err<E>(err: E) -> mlua::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    mlua::Error::external(err)
}

fn lookup(h: &LuaHandle, handle: u32, kind: ObjectKind) -> mlua::Result<ScriptObject> {
    let object = h
        .resources()
        .get(handle)
        .cloned()
        .ok_or_else(|| LuaBindingError::Binding(format!("no {} with handle {}", kind.name(), handle)))?;
    if object.kind() != kind {
        return Err(LuaBindingError::Binding(format!(
            "handle {} is a {}, not a {}",
            handle,
            object.kind().name(),
            kind.name()
        ))
        .into());
    }
    Ok(object)
}

/// Delete through the context protocol, then forget the handle. A refused
/// delete keeps the handle so the script can retry.
fn delete_object(h: &LuaHandle, handle: u32, kind: ObjectKind) -> mlua::Result<bool> {
    let object = match lookup(h, handle, kind) {
        Ok(object) => object,
        Err(_) => return Ok(false),
    };
    object.delete().map_err(lua_err)?;
    h.resources_mut().remove(handle);
    Ok(true)
}

fn matrix_mode_arg(name: &str) -> mlua::Result<MatrixMode> {
    MatrixMode::from_name(name)
        .ok_or_else(|| LuaBindingError::Binding(format!("unknown matrix mode {}", name)).into())
}

pub fn register(lua: &Lua, gl: &Table, this: &Weak<LuaHandle>) -> anyhow::Result<()> {
    // gl.PushAttrib([bits])
    let push_attrib = handle_fn(lua, this, |_, h, bits: Option<u32>| {
        h.render()
            .pass()
            .push_attrib(bits.unwrap_or(ALL_ATTRIB_BITS))
            .map_err(lua_err)
    })
    .into_anyhow()?;

    // gl.PopAttrib()
    let pop_attrib = handle_fn(lua, this, |_, h, ()| {
        h.render().pass().pop_attrib().map_err(lua_err)
    })
    .into_anyhow()?;

    // gl.MatrixMode("GL_MODELVIEW" | "GL_PROJECTION" | "GL_TEXTURE")
    let matrix_mode = handle_fn(lua, this, |_, h, name: String| {
        let mode = matrix_mode_arg(&name)?;
        h.render().pass().matrix_mode(mode).map_err(lua_err)
    })
    .into_anyhow()?;

    let push_matrix = handle_fn(lua, this, |_, h, ()| {
        h.render().pass().push_matrix().map_err(lua_err)
    })
    .into_anyhow()?;

    let pop_matrix = handle_fn(lua, this, |_, h, ()| {
        h.render().pass().pop_matrix().map_err(lua_err)
    })
    .into_anyhow()?;

    // gl.CreateList(fn, ...) → handle
    let create_list = handle_fn(lua, this, |_, h, (body, args): (Function, mlua::MultiValue)| {
        let mut failure = None;
        let list = h
            .render()
            .compile_list(|_| {
                if let Err(err) = body.call::<()>(args) {
                    failure = Some(err);
                }
            })
            .map_err(lua_err)?;
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(h.resources_mut().insert(ScriptObject::List(list)))
    })
    .into_anyhow()?;

    // gl.CallList(handle)
    let call_list = handle_fn(lua, this, |_, h, handle: u32| {
        let ScriptObject::List(list) = lookup(h, handle, ObjectKind::DisplayList)? else {
            return Ok(());
        };
        h.render().call_list(&list).map_err(lua_err)
    })
    .into_anyhow()?;

    let delete_list = handle_fn(lua, this, |_, h, handle: u32| {
        delete_object(h, handle, ObjectKind::DisplayList)
    })
    .into_anyhow()?;

    // gl.CreatingList() → boolean
    let creating_list = handle_fn(lua, this, |_, h, ()| Ok(h.render().pass().creating_list()))
        .into_anyhow()?;

    // gl.CreateTexture(width, height) → handle
    let create_texture = handle_fn(lua, this, |_, h, (width, height): (u32, u32)| {
        let texture = h.render().create_texture(width, height, None).map_err(lua_err)?;
        Ok(h.resources_mut().insert(ScriptObject::Texture(texture)))
    })
    .into_anyhow()?;

    let delete_texture = handle_fn(lua, this, |_, h, handle: u32| {
        delete_object(h, handle, ObjectKind::Texture)
    })
    .into_anyhow()?;

    // gl.CreateShader({ vertex = src, geometry = src, fragment = src })
    //   → handle | nil, log
    let create_shader = handle_fn(lua, this, |_, h, sources: Table| {
        let mut stages = Vec::new();
        for (stage, key) in [
            (ShaderStage::Vertex, "vertex"),
            (ShaderStage::Geometry, "geometry"),
            (ShaderStage::Fragment, "fragment"),
        ] {
            if let Some(source) = sources.get::<Option<String>>(key)? {
                stages.push((stage, source));
            }
        }
        let borrowed: Vec<(ShaderStage, &str)> =
            stages.iter().map(|(stage, src)| (*stage, src.as_str())).collect();
        match h.render().create_shader(&borrowed) {
            Ok(shader) => Ok((Some(h.resources_mut().insert(ScriptObject::Shader(shader))), None)),
            Err(err @ (ContextError::Compile { .. } | ContextError::Link(_))) => {
                log::warn!("{}: {}", h.info().name, err);
                Ok((None, Some(err.to_string())))
            }
            Err(err) => Err(lua_err(err)),
        }
    })
    .into_anyhow()?;

    let delete_shader = handle_fn(lua, this, |_, h, handle: u32| {
        delete_object(h, handle, ObjectKind::Program)
    })
    .into_anyhow()?;

    // gl.UseShader(handle | 0)
    let use_shader = handle_fn(lua, this, |_, h, handle: u32| {
        if handle == 0 {
            h.render().gl().use_program(GlId::INVALID);
            return Ok(true);
        }
        let ScriptObject::Shader(shader) = lookup(h, handle, ObjectKind::Program)? else {
            return Ok(false);
        };
        shader.activate();
        Ok(shader.is_valid())
    })
    .into_anyhow()?;

    // gl.CreateFBO() → handle
    let create_fbo = handle_fn(lua, this, |_, h, ()| {
        let fbo = h.render().create_fbo().map_err(lua_err)?;
        Ok(h.resources_mut().insert(ScriptObject::Fbo(fbo)))
    })
    .into_anyhow()?;

    let delete_fbo = handle_fn(lua, this, |_, h, handle: u32| {
        delete_object(h, handle, ObjectKind::Framebuffer)
    })
    .into_anyhow()?;

    // gl.CreateRBO(width, height [, format]) → handle
    let create_rbo = handle_fn(lua, this, |_, h, (width, height, format): (u32, u32, Option<u32>)| {
        let rbo = h
            .render()
            .create_rbo(format.unwrap_or(DEFAULT_RBO_FORMAT), width, height)
            .map_err(lua_err)?;
        Ok(h.resources_mut().insert(ScriptObject::Rbo(rbo)))
    })
    .into_anyhow()?;

    let delete_rbo = handle_fn(lua, this, |_, h, handle: u32| {
        delete_object(h, handle, ObjectKind::Renderbuffer)
    })
    .into_anyhow()?;

    // gl.CreateBuffer({ numbers }) → handle
    let create_buffer = handle_fn(lua, this, |_, h, data: Vec<f32>| {
        let buffer = h.render().create_buffer(&data).map_err(lua_err)?;
        Ok(h.resources_mut().insert(ScriptObject::Buffer(buffer)))
    })
    .into_anyhow()?;

    let delete_buffer = handle_fn(lua, this, |_, h, handle: u32| {
        delete_object(h, handle, ObjectKind::Buffer)
    })
    .into_anyhow()?;

    // gl.CreateQuery() → handle
    let create_query = handle_fn(lua, this, |_, h, ()| {
        let query = h.render().create_query().map_err(lua_err)?;
        Ok(h.resources_mut().insert(ScriptObject::Query(query)))
    })
    .into_anyhow()?;

    let delete_query = handle_fn(lua, this, |_, h, handle: u32| {
        delete_object(h, handle, ObjectKind::Query)
    })
    .into_anyhow()?;

    gl.set("PushAttrib", push_attrib).into_anyhow()?;
    gl.set("PopAttrib", pop_attrib).into_anyhow()?;
    gl.set("MatrixMode", matrix_mode).into_anyhow()?;
    gl.set("PushMatrix", push_matrix).into_anyhow()?;
    gl.set("PopMatrix", pop_matrix).into_anyhow()?;
    gl.set("CreateList", create_list).into_anyhow()?;
    gl.set("CallList", call_list).into_anyhow()?;
    gl.set("DeleteList", delete_list).into_anyhow()?;
    gl.set("CreatingList", creating_list).into_anyhow()?;
    gl.set("CreateTexture", create_texture).into_anyhow()?;
    gl.set("DeleteTexture", delete_texture).into_anyhow()?;
    gl.set("CreateShader", create_shader).into_anyhow()?;
    gl.set("DeleteShader", delete_shader).into_anyhow()?;
    gl.set("UseShader", use_shader).into_anyhow()?;
    gl.set("CreateFBO", create_fbo).into_anyhow()?;
    gl.set("DeleteFBO", delete_fbo).into_anyhow()?;
    gl.set("CreateRBO", create_rbo).into_anyhow()?;
    gl.set("DeleteRBO", delete_rbo).into_anyhow()?;
    gl.set("CreateBuffer", create_buffer).into_anyhow()?;
    gl.set("DeleteBuffer", delete_buffer).into_anyhow()?;
    gl.set("CreateQuery", create_query).into_anyhow()?;
    gl.set("DeleteQuery", delete_query).into_anyhow()?;
    gl.set("ALL_ATTRIB_BITS", ALL_ATTRIB_BITS).into_anyhow()?;
    Ok(())
}
