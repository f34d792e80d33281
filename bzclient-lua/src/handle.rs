//! Lua-backed event clients.
//!
//! A [`LuaHandle`] owns one Lua state. Its call-ins look up the function the
//! script installed for the event and call it; a Lua error comes back as
//! [`CallInError::Script`] and the dispatcher reports it. Scripts install
//! call-ins either by defining a global function named after the event before
//! [`LuaHandle::update_call_ins`] runs, or at any time with `Script.SetCallIn`.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use anyhow::Context;
use bzclient_core::events::{EventId, EVENT_TABLE};
use bzclient_core::game::{FiringInfo, FlagRef, FlagType, PlayerRef, ShotRef};
use bzclient_core::gfx::BlockType;
use bzclient_core::{CallInResult, ClientInfo, DrawPhase, EventClient, EventHandler, KeyModifiers};
use bzclient_render::RenderContext;
use mlua::{Function, IntoLuaMulti, Lua, LuaSerdeExt, Value};

use crate::bindings::{self, ScriptResources};
use crate::callins::CallInRegistry;
use crate::convert::{modifier_bits, returned_string, returned_strings, returned_true};
use crate::error::{script_error, IntoAnyhow};

pub struct LuaHandle {
    info: ClientInfo,
    lua: Lua,
    call_ins: RefCell<CallInRegistry>,
    resources: RefCell<ScriptResources>,
    handler: Rc<EventHandler>,
    render: Rc<RenderContext>,
    this: Weak<LuaHandle>,
}

impl std::fmt::Debug for LuaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuaHandle")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl LuaHandle {
    /// Create a handle with the `Script`, `gl` and `gfx` tables installed.
    /// It is not registered with the handler yet.
    pub fn new(
        info: ClientInfo,
        handler: &Rc<EventHandler>,
        render: &Rc<RenderContext>,
    ) -> anyhow::Result<Rc<Self>> {
        let handle = Rc::new_cyclic(|this| Self {
            info,
            lua: Lua::new(),
            call_ins: RefCell::new(CallInRegistry::new()),
            resources: RefCell::new(ScriptResources::default()),
            handler: Rc::clone(handler),
            render: Rc::clone(render),
            this: this.clone(),
        });
        bindings::register_all(&handle.lua, &handle.this)
            .with_context(|| format!("Failed to install bindings for {}", handle.info.name))?;
        Ok(handle)
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn handler(&self) -> &Rc<EventHandler> {
        &self.handler
    }

    pub fn render(&self) -> &Rc<RenderContext> {
        &self.render
    }

    pub(crate) fn resources(&self) -> Ref<'_, ScriptResources> {
        self.resources.borrow()
    }

    pub(crate) fn resources_mut(&self) -> RefMut<'_, ScriptResources> {
        self.resources.borrow_mut()
    }

    /// This handle as the handler sees it.
    pub fn as_client(&self) -> Option<Rc<dyn EventClient>> {
        self.this.upgrade().map(|rc| rc as Rc<dyn EventClient>)
    }

    /// Run a chunk, then pick up any call-ins it defined as globals.
    pub fn load(&self, source: &str, chunk_name: &str) -> anyhow::Result<()> {
        self.lua
            .load(source)
            .set_name(chunk_name)
            .exec()
            .into_anyhow()
            .with_context(|| format!("Failed to execute Lua script: {}", chunk_name))?;
        let installed = self.update_call_ins();
        log::info!("{}: loaded {} ({} call-ins)", self.info.name, chunk_name, installed);
        Ok(())
    }

    pub fn exec(&self, code: &str) -> anyhow::Result<()> {
        self.lua
            .load(code)
            .exec()
            .into_anyhow()
            .context("Failed to execute Lua string")
    }

    /// Install every global function named after an event this handle may
    /// use. Returns how many call-ins are installed afterwards.
    pub fn update_call_ins(&self) -> usize {
        let globals = self.lua.globals();
        for spec in EVENT_TABLE.iter() {
            if let Ok(Value::Function(func)) = globals.get::<Value>(spec.name) {
                self.install(spec.id, func);
            }
        }
        self.call_ins.borrow().events().len()
    }

    fn install(&self, id: EventId, func: Function) -> bool {
        let name = id.name();
        if !self.handler.can_use_event(self, name) {
            log::debug!("{}: not allowed to use {}", self.info.name, name);
            return false;
        }
        if id.spec().is_managed() && !self.call_ins.borrow().has_call_in(id) {
            let Some(client) = self.as_client() else {
                return false;
            };
            if !self.handler.insert_event(&client, name) {
                return false;
            }
        }
        self.call_ins.borrow_mut().register(id, func);
        true
    }

    /// Install or, with `None`, remove the call-in for `event`.
    pub fn set_call_in(&self, event: &str, func: Option<Function>) -> bool {
        let Some(id) = EventId::from_name(event) else {
            log::debug!("{}: unknown call-in {}", self.info.name, event);
            return false;
        };
        match func {
            Some(func) => self.install(id, func),
            None => {
                self.call_ins.borrow_mut().remove(id);
                if let Some(client) = self.as_client() {
                    self.handler.remove_event(&client, event);
                }
                true
            }
        }
    }

    pub fn has_call_in(&self, event: &str) -> bool {
        EventId::from_name(event).is_some_and(|id| self.call_ins.borrow().has_call_in(id))
    }

    /// Names of the installed call-ins.
    pub fn call_in_names(&self) -> Vec<&'static str> {
        self.call_ins.borrow().events().into_iter().map(EventId::name).collect()
    }

    fn call(&self, id: EventId, args: impl IntoLuaMulti) -> CallInResult<Value> {
        let Some(func) = self.call_ins.borrow().get(id) else {
            return Ok(Value::Nil);
        };
        func.call::<Value>(args).map_err(script_error)
    }

    fn call_bool(&self, id: EventId, args: impl IntoLuaMulti) -> CallInResult<bool> {
        self.call(id, args).map(|v| returned_true(&v))
    }

    fn call_unit(&self, id: EventId, args: impl IntoLuaMulti) -> CallInResult {
        self.call(id, args).map(|_| ())
    }

    fn firing_info(&self, info: &FiringInfo) -> CallInResult<Value> {
        self.lua.to_value(info).map_err(script_error)
    }
}

fn flag_abbrev(flag_type: Option<&FlagType>) -> Option<String> {
    flag_type.map(|f| f.abbrev.clone())
}

impl EventClient for LuaHandle {
    fn info(&self) -> &ClientInfo {
        &self.info
    }

    fn update(&self) -> CallInResult {
        self.call_unit(EventId::Update, ())
    }

    fn bzdb_change(&self, name: &str) -> CallInResult {
        self.call_unit(EventId::BzdbChange, name)
    }

    fn command_fallback(&self, command: &str) -> CallInResult<bool> {
        self.call_bool(EventId::CommandFallback, command)
    }

    fn recv_chat_msg(&self, msg: &str, src_id: i32, dst_id: i32, action: bool) -> CallInResult {
        self.call_unit(EventId::RecvChatMsg, (msg, src_id, dst_id, action))
    }

    fn recv_lua_data(
        &self,
        src_player: i32,
        src_script: i32,
        dst_player: i32,
        dst_script: i32,
        status: i32,
        data: &str,
    ) -> CallInResult {
        self.call_unit(
            EventId::RecvLuaData,
            (src_player, src_script, dst_player, dst_script, status, data),
        )
    }

    fn server_joined(&self) -> CallInResult {
        self.call_unit(EventId::ServerJoined, ())
    }

    fn server_parted(&self) -> CallInResult {
        self.call_unit(EventId::ServerParted, ())
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    fn player_added(&self, player: &PlayerRef) -> CallInResult {
        self.call_unit(EventId::PlayerAdded, player.id)
    }

    fn player_removed(&self, player: &PlayerRef) -> CallInResult {
        self.call_unit(EventId::PlayerRemoved, player.id)
    }

    fn player_spawned(&self, player: &PlayerRef) -> CallInResult {
        self.call_unit(EventId::PlayerSpawned, player.id)
    }

    fn player_killed(
        &self,
        victim: &PlayerRef,
        killer: Option<&PlayerRef>,
        reason: i32,
        flag_type: Option<&FlagType>,
        phy_drv: i32,
    ) -> CallInResult {
        self.call_unit(
            EventId::PlayerKilled,
            (victim.id, killer.map(|k| k.id), reason, flag_abbrev(flag_type), phy_drv),
        )
    }

    fn player_jumped(&self, player: &PlayerRef) -> CallInResult {
        self.call_unit(EventId::PlayerJumped, player.id)
    }

    fn player_landed(&self, player: &PlayerRef, vel: f32) -> CallInResult {
        self.call_unit(EventId::PlayerLanded, (player.id, vel))
    }

    fn player_teleported(&self, player: &PlayerRef, src_link: i32, dst_link: i32) -> CallInResult {
        self.call_unit(EventId::PlayerTeleported, (player.id, src_link, dst_link))
    }

    fn player_team_change(&self, player: &PlayerRef, old_team: i32) -> CallInResult {
        self.call_unit(EventId::PlayerTeamChange, (player.id, old_team))
    }

    fn player_score_change(&self, player: &PlayerRef) -> CallInResult {
        self.call_unit(EventId::PlayerScoreChange, player.id)
    }

    // -----------------------------------------------------------------------
    // Shots
    // -----------------------------------------------------------------------

    fn shot_added(&self, info: &FiringInfo) -> CallInResult {
        let table = self.firing_info(info)?;
        self.call_unit(EventId::ShotAdded, table)
    }

    fn shot_removed(&self, info: &FiringInfo) -> CallInResult {
        let table = self.firing_info(info)?;
        self.call_unit(EventId::ShotRemoved, table)
    }

    fn shot_ricochet(&self, shot: &ShotRef, pos: [f32; 3], normal: [f32; 3]) -> CallInResult {
        self.call_unit(
            EventId::ShotRicochet,
            (shot.block_id(), pos[0], pos[1], pos[2], normal[0], normal[1], normal[2]),
        )
    }

    fn shot_teleported(&self, shot: &ShotRef, src_link: i32, dst_link: i32) -> CallInResult {
        self.call_unit(EventId::ShotTeleported, (shot.block_id(), src_link, dst_link))
    }

    // -----------------------------------------------------------------------
    // Flags
    // -----------------------------------------------------------------------

    fn flag_added(&self, flag: &FlagRef) -> CallInResult {
        self.call_unit(EventId::FlagAdded, flag.id)
    }

    fn flag_removed(&self, flag: &FlagRef) -> CallInResult {
        self.call_unit(EventId::FlagRemoved, flag.id)
    }

    fn flag_grabbed(&self, flag: &FlagRef, player: &PlayerRef) -> CallInResult {
        self.call_unit(EventId::FlagGrabbed, (flag.id, player.id))
    }

    fn flag_dropped(&self, flag: &FlagRef, player: &PlayerRef) -> CallInResult {
        self.call_unit(EventId::FlagDropped, (flag.id, player.id))
    }

    fn flag_captured(&self, flag: &FlagRef, player: Option<&PlayerRef>) -> CallInResult {
        self.call_unit(EventId::FlagCaptured, (flag.id, player.map(|p| p.id)))
    }

    fn flag_transferred(&self, flag: &FlagRef, src: &PlayerRef, dst: &PlayerRef) -> CallInResult {
        self.call_unit(EventId::FlagTransferred, (flag.id, src.id, dst.id))
    }

    // -----------------------------------------------------------------------
    // GL context and drawing
    // -----------------------------------------------------------------------

    fn gl_resize(&self) -> CallInResult {
        self.call_unit(EventId::GlResize, ())
    }

    fn gl_context_init(&self) -> CallInResult {
        self.call_unit(EventId::GlContextInit, ())
    }

    fn gl_context_free(&self) -> CallInResult {
        self.call_unit(EventId::GlContextFree, ())
    }

    fn gl_unmapped(&self) -> CallInResult {
        self.call_unit(EventId::GlUnmapped, ())
    }

    fn draw(&self, phase: DrawPhase) -> CallInResult {
        self.call_unit(EventId::draw(phase), ())
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    fn key_press(&self, _taken: bool, key: i32, mods: KeyModifiers) -> CallInResult<bool> {
        self.call_bool(
            EventId::KeyPress,
            (key, modifier_bits(mods), mods.contains(KeyModifiers::REPEAT)),
        )
    }

    fn key_release(&self, _taken: bool, key: i32, mods: KeyModifiers) -> CallInResult<bool> {
        self.call_bool(EventId::KeyRelease, (key, modifier_bits(mods)))
    }

    fn unicode_text(&self, _taken: bool, unicode: u32) -> CallInResult<bool> {
        self.call_bool(EventId::UnicodeText, unicode)
    }

    fn mouse_press(&self, _taken: bool, x: i32, y: i32, button: i32) -> CallInResult<bool> {
        self.call_bool(EventId::MousePress, (x, y, button))
    }

    fn mouse_move(&self, _taken: bool, x: i32, y: i32) -> CallInResult<bool> {
        self.call_bool(EventId::MouseMove, (x, y))
    }

    fn mouse_release(&self, _taken: bool, x: i32, y: i32, button: i32) -> CallInResult<bool> {
        self.call_bool(EventId::MouseRelease, (x, y, button))
    }

    fn mouse_wheel(&self, _taken: bool, value: f32) -> CallInResult<bool> {
        self.call_bool(EventId::MouseWheel, value)
    }

    fn is_above(&self, x: i32, y: i32) -> CallInResult<bool> {
        self.call_bool(EventId::IsAbove, (x, y))
    }

    fn get_tooltip(&self, x: i32, y: i32) -> CallInResult<String> {
        let value = self.call(EventId::GetTooltip, (x, y))?;
        Ok(returned_string(&value).unwrap_or_default())
    }

    fn word_complete(&self, line: &str, partials: &mut BTreeSet<String>) -> CallInResult {
        let value = self.call(EventId::WordComplete, line)?;
        partials.extend(returned_strings(value).map_err(script_error)?);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Game control
    // -----------------------------------------------------------------------

    fn forbid_spawn(&self) -> CallInResult<bool> {
        self.call_bool(EventId::ForbidSpawn, ())
    }

    fn forbid_jump(&self) -> CallInResult<bool> {
        self.call_bool(EventId::ForbidJump, ())
    }

    fn forbid_flag_drop(&self) -> CallInResult<bool> {
        self.call_bool(EventId::ForbidFlagDrop, ())
    }

    fn forbid_shot(&self) -> CallInResult<bool> {
        self.call_bool(EventId::ForbidShot, ())
    }

    fn forbid_shot_lock(&self, player: &PlayerRef) -> CallInResult<bool> {
        self.call_bool(EventId::ForbidShotLock, player.id)
    }

    fn forbid_shot_hit(&self, player: &PlayerRef, shot: &ShotRef, pos: [f32; 3]) -> CallInResult<bool> {
        self.call_bool(
            EventId::ForbidShotHit,
            (player.id, shot.block_id(), pos[0], pos[1], pos[2]),
        )
    }

    // -----------------------------------------------------------------------
    // Direct
    // -----------------------------------------------------------------------

    fn shutdown(&self) -> CallInResult {
        self.call_unit(EventId::Shutdown, ())
    }

    fn got_gfx_block(&self, block_type: BlockType, id: i32) -> CallInResult {
        self.call_unit(EventId::GotGfxBlock, (block_type.code(), id))
    }

    fn lost_gfx_block(&self, block_type: BlockType, id: i32) -> CallInResult {
        self.call_unit(EventId::LostGfxBlock, (block_type.code(), id))
    }
}
