//! Event clients.
//!
//! An event client is anything that wants to hear about game and render
//! events: a Lua script, a built-in HUD component, a test recorder. Each
//! client carries a fixed identity (name and script id), four sort keys and
//! three capability flags, all decided when the client is built.
//!
//! Every call-in has a neutral default, so an implementation only overrides
//! the hooks it cares about:
//!
//! ```rust,no_run
//! use bzclient_core::events::{ClientInfo, EventClient};
//! use bzclient_core::CallInResult;
//!
//! struct Clock {
//!     info: ClientInfo,
//! }
//!
//! impl EventClient for Clock {
//!     fn info(&self) -> &ClientInfo {
//!         &self.info
//!     }
//!
//!     fn update(&self) -> CallInResult {
//!         log::trace!("tick");
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::CallInResult;
use crate::events::phase::DrawPhase;
use crate::game::{FiringInfo, FlagRef, FlagType, PlayerRef, ShotRef};
use crate::gfx::BlockType;

/// The four dimensions an event list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum OrderType {
    /// The client's script id doubles as a sort key.
    ScriptId = 0,
    GameState = 1,
    DrawWorld = 2,
    DrawScreen = 3,
}

impl OrderType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(OrderType::ScriptId),
            1 => Some(OrderType::GameState),
            2 => Some(OrderType::DrawWorld),
            3 => Some(OrderType::DrawScreen),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OrderType::ScriptId => "ScriptIDOrder",
            OrderType::GameState => "GameStateOrder",
            OrderType::DrawWorld => "DrawWorldOrder",
            OrderType::DrawScreen => "DrawScreenOrder",
        }
    }
}

bitflags! {
    /// Keyboard modifier bits as scripts see them. Bits 3..=6 are reserved.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const ALT    = 1 << 0;
        const CTRL   = 1 << 1;
        const SHIFT  = 1 << 2;
        const REPEAT = 1 << 7;
    }
}

/// Identity, ordering and capabilities of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    /// Script id 0 is reserved for the server.
    pub script_id: i32,
    pub game_state_order: i32,
    pub draw_world_order: i32,
    pub draw_screen_order: i32,
    pub full_read: bool,
    pub game_ctrl: bool,
    pub input_ctrl: bool,
}

impl ClientInfo {
    /// A client with every order set to its script id and no capabilities.
    pub fn new(name: impl Into<String>, script_id: i32) -> Self {
        Self {
            name: name.into(),
            script_id,
            game_state_order: script_id,
            draw_world_order: script_id,
            draw_screen_order: script_id,
            full_read: false,
            game_ctrl: false,
            input_ctrl: false,
        }
    }

    pub fn with_orders(mut self, game_state: i32, draw_world: i32, draw_screen: i32) -> Self {
        self.game_state_order = game_state;
        self.draw_world_order = draw_world;
        self.draw_screen_order = draw_screen;
        self
    }

    pub fn with_capabilities(mut self, full_read: bool, game_ctrl: bool, input_ctrl: bool) -> Self {
        self.full_read = full_read;
        self.game_ctrl = game_ctrl;
        self.input_ctrl = input_ctrl;
        self
    }

    pub fn order(&self, order: OrderType) -> i32 {
        match order {
            OrderType::ScriptId => self.script_id,
            OrderType::GameState => self.game_state_order,
            OrderType::DrawWorld => self.draw_world_order,
            OrderType::DrawScreen => self.draw_screen_order,
        }
    }
}

/// A participant in event dispatch.
///
/// Call-ins take `&self`; clients that keep state use interior mutability.
/// A call-in may re-enter the [`EventHandler`](crate::events::EventHandler)
/// to register or drop events, including the one being dispatched.
pub trait EventClient {
    fn info(&self) -> &ClientInfo;

    fn name(&self) -> &str {
        &self.info().name
    }

    fn script_id(&self) -> i32 {
        self.info().script_id
    }

    fn order(&self, order: OrderType) -> i32 {
        self.info().order(order)
    }

    /// Order for a raw dimension code, -1 when the code is not a dimension.
    fn order_by_code(&self, code: i32) -> i32 {
        OrderType::from_code(code).map_or(-1, |order| self.order(order))
    }

    fn full_read(&self) -> bool {
        self.info().full_read
    }

    fn game_ctrl(&self) -> bool {
        self.info().game_ctrl
    }

    fn input_ctrl(&self) -> bool {
        self.info().input_ctrl
    }

    // -----------------------------------------------------------------------
    // Frame and messaging
    // -----------------------------------------------------------------------

    fn update(&self) -> CallInResult {
        Ok(())
    }

    fn bzdb_change(&self, _name: &str) -> CallInResult {
        Ok(())
    }

    fn command_fallback(&self, _command: &str) -> CallInResult<bool> {
        Ok(false)
    }

    fn recv_chat_msg(&self, _msg: &str, _src_id: i32, _dst_id: i32, _action: bool) -> CallInResult {
        Ok(())
    }

    fn recv_lua_data(
        &self,
        _src_player: i32,
        _src_script: i32,
        _dst_player: i32,
        _dst_script: i32,
        _status: i32,
        _data: &str,
    ) -> CallInResult {
        Ok(())
    }

    fn server_joined(&self) -> CallInResult {
        Ok(())
    }

    fn server_parted(&self) -> CallInResult {
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    fn player_added(&self, _player: &PlayerRef) -> CallInResult {
        Ok(())
    }

    fn player_removed(&self, _player: &PlayerRef) -> CallInResult {
        Ok(())
    }

    fn player_spawned(&self, _player: &PlayerRef) -> CallInResult {
        Ok(())
    }

    fn player_killed(
        &self,
        _victim: &PlayerRef,
        _killer: Option<&PlayerRef>,
        _reason: i32,
        _flag_type: Option<&FlagType>,
        _phy_drv: i32,
    ) -> CallInResult {
        Ok(())
    }

    fn player_jumped(&self, _player: &PlayerRef) -> CallInResult {
        Ok(())
    }

    fn player_landed(&self, _player: &PlayerRef, _vel: f32) -> CallInResult {
        Ok(())
    }

    fn player_teleported(&self, _player: &PlayerRef, _src_link: i32, _dst_link: i32) -> CallInResult {
        Ok(())
    }

    fn player_team_change(&self, _player: &PlayerRef, _old_team: i32) -> CallInResult {
        Ok(())
    }

    fn player_score_change(&self, _player: &PlayerRef) -> CallInResult {
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shots
    // -----------------------------------------------------------------------

    fn shot_added(&self, _info: &FiringInfo) -> CallInResult {
        Ok(())
    }

    fn shot_removed(&self, _info: &FiringInfo) -> CallInResult {
        Ok(())
    }

    fn shot_ricochet(&self, _shot: &ShotRef, _pos: [f32; 3], _normal: [f32; 3]) -> CallInResult {
        Ok(())
    }

    fn shot_teleported(&self, _shot: &ShotRef, _src_link: i32, _dst_link: i32) -> CallInResult {
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Flags
    // -----------------------------------------------------------------------

    fn flag_added(&self, _flag: &FlagRef) -> CallInResult {
        Ok(())
    }

    fn flag_removed(&self, _flag: &FlagRef) -> CallInResult {
        Ok(())
    }

    fn flag_grabbed(&self, _flag: &FlagRef, _player: &PlayerRef) -> CallInResult {
        Ok(())
    }

    fn flag_dropped(&self, _flag: &FlagRef, _player: &PlayerRef) -> CallInResult {
        Ok(())
    }

    fn flag_captured(&self, _flag: &FlagRef, _player: Option<&PlayerRef>) -> CallInResult {
        Ok(())
    }

    fn flag_transferred(&self, _flag: &FlagRef, _src: &PlayerRef, _dst: &PlayerRef) -> CallInResult {
        Ok(())
    }

    // -----------------------------------------------------------------------
    // GL context and drawing
    // -----------------------------------------------------------------------

    fn gl_resize(&self) -> CallInResult {
        Ok(())
    }

    fn gl_context_init(&self) -> CallInResult {
        Ok(())
    }

    fn gl_context_free(&self) -> CallInResult {
        Ok(())
    }

    fn gl_unmapped(&self) -> CallInResult {
        Ok(())
    }

    fn draw(&self, _phase: DrawPhase) -> CallInResult {
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    fn key_press(&self, _taken: bool, _key: i32, _mods: KeyModifiers) -> CallInResult<bool> {
        Ok(false)
    }

    fn key_release(&self, _taken: bool, _key: i32, _mods: KeyModifiers) -> CallInResult<bool> {
        Ok(false)
    }

    fn unicode_text(&self, _taken: bool, _unicode: u32) -> CallInResult<bool> {
        Ok(false)
    }

    fn mouse_press(&self, _taken: bool, _x: i32, _y: i32, _button: i32) -> CallInResult<bool> {
        Ok(false)
    }

    fn mouse_move(&self, _taken: bool, _x: i32, _y: i32) -> CallInResult<bool> {
        Ok(false)
    }

    fn mouse_release(&self, _taken: bool, _x: i32, _y: i32, _button: i32) -> CallInResult<bool> {
        Ok(false)
    }

    /// Positive values scroll up.
    fn mouse_wheel(&self, _taken: bool, _value: f32) -> CallInResult<bool> {
        Ok(false)
    }

    fn is_above(&self, _x: i32, _y: i32) -> CallInResult<bool> {
        Ok(false)
    }

    fn get_tooltip(&self, _x: i32, _y: i32) -> CallInResult<String> {
        Ok(String::new())
    }

    fn word_complete(&self, _line: &str, _partials: &mut BTreeSet<String>) -> CallInResult {
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Game control
    // -----------------------------------------------------------------------

    fn forbid_spawn(&self) -> CallInResult<bool> {
        Ok(false)
    }

    fn forbid_jump(&self) -> CallInResult<bool> {
        Ok(false)
    }

    fn forbid_flag_drop(&self) -> CallInResult<bool> {
        Ok(false)
    }

    fn forbid_shot(&self) -> CallInResult<bool> {
        Ok(false)
    }

    fn forbid_shot_lock(&self, _player: &PlayerRef) -> CallInResult<bool> {
        Ok(false)
    }

    fn forbid_shot_hit(&self, _player: &PlayerRef, _shot: &ShotRef, _pos: [f32; 3]) -> CallInResult<bool> {
        Ok(false)
    }

    // -----------------------------------------------------------------------
    // Delivered directly, not through an event list
    // -----------------------------------------------------------------------

    fn shutdown(&self) -> CallInResult {
        Ok(())
    }

    fn got_gfx_block(&self, _block_type: BlockType, _id: i32) -> CallInResult {
        Ok(())
    }

    fn lost_gfx_block(&self, _block_type: BlockType, _id: i32) -> CallInResult {
        Ok(())
    }
}

/// Registration sequence number, assigned by the handler when a client is
/// added. Breaks ties between clients with equal order and name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientSeq(pub u64);

/// Non-owning reference to a registered client, with the sort keys copied
/// out so lists can order entries without reaching into the client.
#[derive(Clone)]
pub struct ClientRef {
    seq: ClientSeq,
    name: Rc<str>,
    orders: [i32; 4],
    client: Weak<dyn EventClient>,
}

impl ClientRef {
    pub fn new(seq: ClientSeq, client: &Rc<dyn EventClient>) -> Self {
        let info = client.info();
        Self {
            seq,
            name: Rc::from(info.name.as_str()),
            orders: [
                info.script_id,
                info.game_state_order,
                info.draw_world_order,
                info.draw_screen_order,
            ],
            client: Rc::downgrade(client),
        }
    }

    pub fn seq(&self) -> ClientSeq {
        self.seq
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self, order: OrderType) -> i32 {
        self.orders[order as usize]
    }

    pub fn upgrade(&self) -> Option<Rc<dyn EventClient>> {
        self.client.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.client.strong_count() > 0
    }

    /// Whether this reference points at `client`.
    pub fn refers_to(&self, client: &Rc<dyn EventClient>) -> bool {
        std::ptr::eq(
            self.client.as_ptr() as *const (),
            Rc::as_ptr(client) as *const (),
        )
    }

    /// Strict ordering used by event lists and gfx blocks: order, then name,
    /// then registration sequence.
    pub fn precedes(&self, other: &ClientRef, order: OrderType) -> bool {
        (self.order(order), &*self.name, self.seq) < (other.order(order), &*other.name, other.seq)
    }
}

impl fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRef")
            .field("seq", &self.seq.0)
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare(ClientInfo);

    impl EventClient for Bare {
        fn info(&self) -> &ClientInfo {
            &self.0
        }
    }

    #[test]
    fn key_modifier_bits() {
        assert_eq!(KeyModifiers::ALT.bits(), 0x01);
        assert_eq!(KeyModifiers::CTRL.bits(), 0x02);
        assert_eq!(KeyModifiers::SHIFT.bits(), 0x04);
        assert_eq!(KeyModifiers::REPEAT.bits(), 0x80);
        let mods = KeyModifiers::from_bits_truncate(0x87 | 0x18);
        assert_eq!(mods, KeyModifiers::all());
    }

    #[test]
    fn order_by_code_rejects_unknown_dimensions() {
        let client = Bare(ClientInfo::new("Foo", 5).with_orders(10, 20, 30));
        assert_eq!(client.order_by_code(0), 5);
        assert_eq!(client.order_by_code(1), 10);
        assert_eq!(client.order_by_code(2), 20);
        assert_eq!(client.order_by_code(3), 30);
        assert_eq!(client.order_by_code(4), -1);
        assert_eq!(client.order_by_code(-1), -1);
    }

    #[test]
    fn defaults_are_neutral() {
        let client = Bare(ClientInfo::new("Foo", 1));
        assert_eq!(client.command_fallback("x"), Ok(false));
        assert_eq!(client.key_press(true, 32, KeyModifiers::empty()), Ok(false));
        assert_eq!(client.get_tooltip(0, 0), Ok(String::new()));
        assert_eq!(client.forbid_spawn(), Ok(false));
        let mut partials = BTreeSet::new();
        client.word_complete("/he", &mut partials).unwrap();
        assert!(partials.is_empty());
    }

    #[test]
    fn client_ref_tracks_liveness() {
        let client: Rc<dyn EventClient> = Rc::new(Bare(ClientInfo::new("Foo", 1)));
        let r = ClientRef::new(ClientSeq(7), &client);
        assert!(r.is_alive());
        assert!(r.refers_to(&client));
        drop(client);
        assert!(!r.is_alive());
        assert!(r.upgrade().is_none());
    }

    #[test]
    fn precedes_breaks_ties_by_name_then_seq() {
        let a: Rc<dyn EventClient> = Rc::new(Bare(ClientInfo::new("Alpha", 1)));
        let b: Rc<dyn EventClient> = Rc::new(Bare(ClientInfo::new("Beta", 1)));
        let ra = ClientRef::new(ClientSeq(2), &a);
        let rb = ClientRef::new(ClientSeq(1), &b);
        assert!(ra.precedes(&rb, OrderType::ScriptId));
        let ra2 = ClientRef::new(ClientSeq(3), &a);
        assert!(ra.precedes(&ra2, OrderType::ScriptId));
        assert!(!ra2.precedes(&ra, OrderType::ScriptId));
    }
}
