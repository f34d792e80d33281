// Fan-out of call-ins to the event lists.
//
// Every public method here picks its event's list and walks it with the
// event's loop policy. The walk visits a snapshot taken when it starts:
// clients removed mid-walk are skipped, clients added mid-walk wait for the
// next dispatch. No list borrow is held while a client runs.

use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::rc::Rc;

use crate::error::{CallInError, CallInResult, EventError};
use crate::events::client::{EventClient, KeyModifiers};
use crate::events::handler::EventHandler;
use crate::events::list::EventClientList;
use crate::events::phase::{DrawPhase, PassBracket};
use crate::events::table::EventId;
use crate::game::{FiringInfo, FlagRef, FlagType, PlayerRef, ShotRef};

struct PassGuard<'a> {
    list: &'a std::cell::RefCell<EventClientList>,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.list.borrow_mut().end_pass();
    }
}

fn report(client: &Rc<dyn EventClient>, id: EventId, err: &CallInError) {
    log::warn!("{}::{} failed: {}", client.name(), id.name(), err);
}

impl EventHandler {
    fn walk<F>(&self, id: EventId, mut visit: F)
    where
        F: FnMut(&Rc<dyn EventClient>) -> ControlFlow<()>,
    {
        let Some(cell) = self.list(id) else {
            return;
        };
        let snapshot = {
            let mut list = cell.borrow_mut();
            if list.in_pass() && !id.spec().is_reentrant() {
                log::debug!("{} is already being dispatched, ignoring nested call", id.name());
                return;
            }
            list.begin_pass()
        };
        let _guard = PassGuard { list: cell };
        for entry in &snapshot {
            if entry.is_removed() {
                continue;
            }
            let Some(client) = entry.client().upgrade() else {
                continue;
            };
            if visit(&client).is_break() {
                break;
            }
        }
    }

    /// Call every client, ignoring results.
    fn run_basic<F>(&self, id: EventId, mut call: F)
    where
        F: FnMut(&dyn EventClient) -> CallInResult,
    {
        self.walk(id, |client| {
            if let Err(err) = call(client.as_ref()) {
                report(client, id, &err);
            }
            ControlFlow::Continue(())
        });
    }

    /// Call clients until one answers `true`.
    fn run_first_true<F>(&self, id: EventId, mut call: F) -> bool
    where
        F: FnMut(&dyn EventClient) -> CallInResult<bool>,
    {
        let mut answer = false;
        self.walk(id, |client| match call(client.as_ref()) {
            Ok(true) => {
                answer = true;
                ControlFlow::Break(())
            }
            Ok(false) => ControlFlow::Continue(()),
            Err(err) => {
                report(client, id, &err);
                ControlFlow::Continue(())
            }
        });
        answer
    }

    /// Call clients until one answers a non-empty string.
    fn run_first_string<F>(&self, id: EventId, mut call: F) -> String
    where
        F: FnMut(&dyn EventClient) -> CallInResult<String>,
    {
        let mut answer = String::new();
        self.walk(id, |client| match call(client.as_ref()) {
            Ok(text) if !text.is_empty() => {
                answer = text;
                ControlFlow::Break(())
            }
            Ok(_) => ControlFlow::Continue(()),
            Err(err) => {
                report(client, id, &err);
                ControlFlow::Continue(())
            }
        });
        answer
    }

    /// Call every client, threading the `taken` flag through: each client
    /// sees whether an earlier one already claimed the input.
    fn run_boolean_or<F>(&self, id: EventId, mut taken: bool, mut call: F) -> bool
    where
        F: FnMut(&dyn EventClient, bool) -> CallInResult<bool>,
    {
        self.walk(id, |client| {
            match call(client.as_ref(), taken) {
                Ok(claimed) => taken = claimed || taken,
                Err(err) => report(client, id, &err),
            }
            ControlFlow::Continue(())
        });
        taken
    }

    // -----------------------------------------------------------------------
    // Frame and messaging
    // -----------------------------------------------------------------------

    pub fn update(&self) {
        self.run_basic(EventId::Update, |c| c.update());
    }

    pub fn bzdb_change(&self, name: &str) {
        self.run_basic(EventId::BzdbChange, |c| c.bzdb_change(name));
    }

    pub fn command_fallback(&self, command: &str) -> bool {
        self.run_first_true(EventId::CommandFallback, |c| c.command_fallback(command))
    }

    pub fn recv_chat_msg(&self, msg: &str, src_id: i32, dst_id: i32, action: bool) {
        self.run_basic(EventId::RecvChatMsg, |c| c.recv_chat_msg(msg, src_id, dst_id, action));
    }

    /// Deliver script data. A destination script id of 0 reaches every
    /// listener, anything else only the client with that script id.
    pub fn recv_lua_data(
        &self,
        src_player: i32,
        src_script: i32,
        dst_player: i32,
        dst_script: i32,
        status: i32,
        data: &str,
    ) {
        self.run_basic(EventId::RecvLuaData, |c| {
            if dst_script != 0 && dst_script != c.script_id() {
                return Ok(());
            }
            c.recv_lua_data(src_player, src_script, dst_player, dst_script, status, data)
        });
    }

    pub fn server_joined(&self) {
        self.run_basic(EventId::ServerJoined, |c| c.server_joined());
    }

    pub fn server_parted(&self) {
        self.run_basic(EventId::ServerParted, |c| c.server_parted());
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    pub fn player_added(&self, player: &PlayerRef) {
        self.run_basic(EventId::PlayerAdded, |c| c.player_added(player));
    }

    pub fn player_removed(&self, player: &PlayerRef) {
        self.run_basic(EventId::PlayerRemoved, |c| c.player_removed(player));
    }

    pub fn player_spawned(&self, player: &PlayerRef) {
        self.run_basic(EventId::PlayerSpawned, |c| c.player_spawned(player));
    }

    pub fn player_killed(
        &self,
        victim: &PlayerRef,
        killer: Option<&PlayerRef>,
        reason: i32,
        flag_type: Option<&FlagType>,
        phy_drv: i32,
    ) {
        self.run_basic(EventId::PlayerKilled, |c| {
            c.player_killed(victim, killer, reason, flag_type, phy_drv)
        });
    }

    pub fn player_jumped(&self, player: &PlayerRef) {
        self.run_basic(EventId::PlayerJumped, |c| c.player_jumped(player));
    }

    pub fn player_landed(&self, player: &PlayerRef, vel: f32) {
        self.run_basic(EventId::PlayerLanded, |c| c.player_landed(player, vel));
    }

    pub fn player_teleported(&self, player: &PlayerRef, src_link: i32, dst_link: i32) {
        self.run_basic(EventId::PlayerTeleported, |c| {
            c.player_teleported(player, src_link, dst_link)
        });
    }

    pub fn player_team_change(&self, player: &PlayerRef, old_team: i32) {
        self.run_basic(EventId::PlayerTeamChange, |c| c.player_team_change(player, old_team));
    }

    pub fn player_score_change(&self, player: &PlayerRef) {
        self.run_basic(EventId::PlayerScoreChange, |c| c.player_score_change(player));
    }

    // -----------------------------------------------------------------------
    // Shots
    // -----------------------------------------------------------------------

    pub fn shot_added(&self, info: &FiringInfo) {
        self.run_basic(EventId::ShotAdded, |c| c.shot_added(info));
    }

    pub fn shot_removed(&self, info: &FiringInfo) {
        self.run_basic(EventId::ShotRemoved, |c| c.shot_removed(info));
    }

    pub fn shot_ricochet(&self, shot: &ShotRef, pos: [f32; 3], normal: [f32; 3]) {
        self.run_basic(EventId::ShotRicochet, |c| c.shot_ricochet(shot, pos, normal));
    }

    pub fn shot_teleported(&self, shot: &ShotRef, src_link: i32, dst_link: i32) {
        self.run_basic(EventId::ShotTeleported, |c| c.shot_teleported(shot, src_link, dst_link));
    }

    // -----------------------------------------------------------------------
    // Flags
    // -----------------------------------------------------------------------

    pub fn flag_added(&self, flag: &FlagRef) {
        self.run_basic(EventId::FlagAdded, |c| c.flag_added(flag));
    }

    pub fn flag_removed(&self, flag: &FlagRef) {
        self.run_basic(EventId::FlagRemoved, |c| c.flag_removed(flag));
    }

    pub fn flag_grabbed(&self, flag: &FlagRef, player: &PlayerRef) {
        self.run_basic(EventId::FlagGrabbed, |c| c.flag_grabbed(flag, player));
    }

    pub fn flag_dropped(&self, flag: &FlagRef, player: &PlayerRef) {
        self.run_basic(EventId::FlagDropped, |c| c.flag_dropped(flag, player));
    }

    pub fn flag_captured(&self, flag: &FlagRef, player: Option<&PlayerRef>) {
        self.run_basic(EventId::FlagCaptured, |c| c.flag_captured(flag, player));
    }

    pub fn flag_transferred(&self, flag: &FlagRef, src: &PlayerRef, dst: &PlayerRef) {
        self.run_basic(EventId::FlagTransferred, |c| c.flag_transferred(flag, src, dst));
    }

    // -----------------------------------------------------------------------
    // GL context
    // -----------------------------------------------------------------------

    pub fn gl_resize(&self) {
        self.run_basic(EventId::GlResize, |c| c.gl_resize());
    }

    pub fn gl_context_init(&self) {
        self.run_basic(EventId::GlContextInit, |c| c.gl_context_init());
    }

    pub fn gl_context_free(&self) {
        self.run_basic(EventId::GlContextFree, |c| c.gl_context_free());
    }

    pub fn gl_unmapped(&self) {
        self.run_basic(EventId::GlUnmapped, |c| c.gl_unmapped());
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    /// Run a draw pass.
    ///
    /// Does nothing when no client listens. Otherwise the pass is enabled,
    /// the first client draws from the fresh phase state, every later client
    /// gets a reset first, and the pass is disabled at the end. A failing
    /// client is logged and the pass moves on to the next one; the first
    /// such error is returned once the bracket is disabled. A failing reset
    /// ends the pass early.
    pub fn draw(&self, phase: DrawPhase, pass: &dyn PassBracket) -> Result<(), EventError> {
        let id = EventId::draw(phase);
        let Some(list) = self.list(id) else {
            return Ok(());
        };
        if list.borrow().is_empty() {
            return Ok(());
        }
        pass.enable(phase).map_err(|cause| EventError::Pass {
            event: id.name(),
            cause,
        })?;

        let mut first = true;
        let mut outcome = Ok(());
        self.walk(id, |client| {
            if !first {
                if let Err(cause) = pass.reset(phase) {
                    outcome = Err(EventError::Pass {
                        event: id.name(),
                        cause,
                    });
                    return ControlFlow::Break(());
                }
            }
            first = false;
            if let Err(source) = client.draw(phase) {
                report(client, id, &source);
                if outcome.is_ok() {
                    outcome = Err(EventError::CallIn {
                        client: client.name().to_string(),
                        event: id.name(),
                        source,
                    });
                }
            }
            ControlFlow::Continue(())
        });

        let disabled = pass.disable(phase).map_err(|cause| EventError::Pass {
            event: id.name(),
            cause,
        });
        outcome.and(disabled)
    }

    pub fn draw_genesis(&self, pass: &dyn PassBracket) -> Result<(), EventError> {
        self.draw(DrawPhase::Genesis, pass)
    }

    pub fn draw_world_start(&self, pass: &dyn PassBracket) -> Result<(), EventError> {
        self.draw(DrawPhase::WorldStart, pass)
    }

    pub fn draw_world(&self, pass: &dyn PassBracket) -> Result<(), EventError> {
        self.draw(DrawPhase::World, pass)
    }

    pub fn draw_world_alpha(&self, pass: &dyn PassBracket) -> Result<(), EventError> {
        self.draw(DrawPhase::WorldAlpha, pass)
    }

    pub fn draw_world_shadow(&self, pass: &dyn PassBracket) -> Result<(), EventError> {
        self.draw(DrawPhase::WorldShadow, pass)
    }

    pub fn draw_screen_start(&self, pass: &dyn PassBracket) -> Result<(), EventError> {
        self.draw(DrawPhase::ScreenStart, pass)
    }

    pub fn draw_screen(&self, pass: &dyn PassBracket) -> Result<(), EventError> {
        self.draw(DrawPhase::Screen, pass)
    }

    pub fn draw_radar(&self, pass: &dyn PassBracket) -> Result<(), EventError> {
        self.draw(DrawPhase::Radar, pass)
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn key_press(&self, taken: bool, key: i32, mods: KeyModifiers) -> bool {
        self.run_boolean_or(EventId::KeyPress, taken, |c, t| c.key_press(t, key, mods))
    }

    pub fn key_release(&self, taken: bool, key: i32, mods: KeyModifiers) -> bool {
        self.run_boolean_or(EventId::KeyRelease, taken, |c, t| c.key_release(t, key, mods))
    }

    pub fn unicode_text(&self, taken: bool, unicode: u32) -> bool {
        self.run_boolean_or(EventId::UnicodeText, taken, |c, t| c.unicode_text(t, unicode))
    }

    pub fn mouse_press(&self, taken: bool, x: i32, y: i32, button: i32) -> bool {
        self.run_boolean_or(EventId::MousePress, taken, |c, t| c.mouse_press(t, x, y, button))
    }

    pub fn mouse_move(&self, taken: bool, x: i32, y: i32) -> bool {
        self.run_boolean_or(EventId::MouseMove, taken, |c, t| c.mouse_move(t, x, y))
    }

    pub fn mouse_release(&self, taken: bool, x: i32, y: i32, button: i32) -> bool {
        self.run_boolean_or(EventId::MouseRelease, taken, |c, t| {
            c.mouse_release(t, x, y, button)
        })
    }

    pub fn mouse_wheel(&self, taken: bool, value: f32) -> bool {
        self.run_boolean_or(EventId::MouseWheel, taken, |c, t| c.mouse_wheel(t, value))
    }

    pub fn is_above(&self, x: i32, y: i32) -> bool {
        self.run_first_true(EventId::IsAbove, |c| c.is_above(x, y))
    }

    pub fn get_tooltip(&self, x: i32, y: i32) -> String {
        self.run_first_string(EventId::GetTooltip, |c| c.get_tooltip(x, y))
    }

    /// Collect completions for `line` into `partials`.
    ///
    /// Each client fills a set of its own, so one client cannot see or
    /// clobber another's answers; the sets are merged afterwards. Empty
    /// strings are legitimate completions and are kept.
    pub fn word_complete(&self, line: &str, partials: &mut BTreeSet<String>) {
        self.walk(EventId::WordComplete, |client| {
            let mut mine = BTreeSet::new();
            match client.word_complete(line, &mut mine) {
                Ok(()) => partials.extend(mine),
                Err(err) => report(client, EventId::WordComplete, &err),
            }
            ControlFlow::Continue(())
        });
    }

    // -----------------------------------------------------------------------
    // Game control
    // -----------------------------------------------------------------------

    pub fn forbid_spawn(&self) -> bool {
        self.run_first_true(EventId::ForbidSpawn, |c| c.forbid_spawn())
    }

    pub fn forbid_jump(&self) -> bool {
        self.run_first_true(EventId::ForbidJump, |c| c.forbid_jump())
    }

    pub fn forbid_flag_drop(&self) -> bool {
        self.run_first_true(EventId::ForbidFlagDrop, |c| c.forbid_flag_drop())
    }

    pub fn forbid_shot(&self) -> bool {
        self.run_first_true(EventId::ForbidShot, |c| c.forbid_shot())
    }

    pub fn forbid_shot_lock(&self, player: &PlayerRef) -> bool {
        self.run_first_true(EventId::ForbidShotLock, |c| c.forbid_shot_lock(player))
    }

    pub fn forbid_shot_hit(&self, player: &PlayerRef, shot: &ShotRef, pos: [f32; 3]) -> bool {
        self.run_first_true(EventId::ForbidShotHit, |c| c.forbid_shot_hit(player, shot, pos))
    }

    // -----------------------------------------------------------------------
    // Direct
    // -----------------------------------------------------------------------

    /// Tell every registered client the client is going down.
    pub fn shutdown(&self) {
        for entry in self.clients() {
            if let Some(client) = entry.upgrade() {
                if let Err(err) = client.shutdown() {
                    report(&client, EventId::Shutdown, &err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::client::ClientInfo;
    use std::cell::RefCell;

    struct Recorder {
        info: ClientInfo,
        answer: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl EventClient for Recorder {
        fn info(&self) -> &ClientInfo {
            &self.info
        }

        fn update(&self) -> CallInResult {
            self.log.borrow_mut().push(self.info.name.clone());
            Ok(())
        }

        fn forbid_spawn(&self) -> CallInResult<bool> {
            self.log.borrow_mut().push(self.info.name.clone());
            Ok(self.answer)
        }

        fn key_press(&self, taken: bool, _key: i32, _mods: KeyModifiers) -> CallInResult<bool> {
            self.log.borrow_mut().push(format!("{}:{}", self.info.name, taken));
            Ok(self.answer)
        }

        fn get_tooltip(&self, _x: i32, _y: i32) -> CallInResult<String> {
            if self.answer {
                Ok(self.info.name.clone())
            } else {
                Ok(String::new())
            }
        }
    }

    fn recorder(
        name: &str,
        id: i32,
        answer: bool,
        log: &Rc<RefCell<Vec<String>>>,
    ) -> Rc<dyn EventClient> {
        Rc::new(Recorder {
            info: ClientInfo::new(name, id).with_capabilities(true, true, true),
            answer,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn first_string_stops_at_first_answer() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let handler = EventHandler::new();
        let clients: Vec<_> = [("a", 1, false), ("b", 2, true), ("c", 3, true)]
            .into_iter()
            .map(|(name, id, answer)| recorder(name, id, answer, &log))
            .collect();
        for c in &clients {
            handler.add_client(c);
            handler.insert_event(c, "GetTooltip");
        }
        assert_eq!(handler.get_tooltip(0, 0), "b");
    }

    #[test]
    fn boolean_or_threads_taken_flag() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let handler = EventHandler::new();
        let clients: Vec<_> = [("a", 1, false), ("b", 2, true), ("c", 3, false)]
            .into_iter()
            .map(|(name, id, answer)| recorder(name, id, answer, &log))
            .collect();
        for c in &clients {
            handler.add_client(c);
            handler.insert_event(c, "KeyPress");
        }
        assert!(handler.key_press(false, 13, KeyModifiers::empty()));
        assert_eq!(*log.borrow(), vec!["a:false", "b:false", "c:true"]);
    }

    #[test]
    fn empty_draw_list_skips_the_bracket() {
        struct Refuse;
        impl PassBracket for Refuse {
            fn enable(&self, _phase: DrawPhase) -> anyhow::Result<()> {
                anyhow::bail!("should not be called")
            }
            fn reset(&self, _phase: DrawPhase) -> anyhow::Result<()> {
                anyhow::bail!("should not be called")
            }
            fn disable(&self, _phase: DrawPhase) -> anyhow::Result<()> {
                anyhow::bail!("should not be called")
            }
        }
        let handler = EventHandler::new();
        assert!(handler.draw_world(&Refuse).is_ok());
    }
}
