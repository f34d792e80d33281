// Declarative event table.
//
// Every event the client knows about is listed here exactly once, with the
// order dimension its list sorts by, how dispatch walks that list, and the
// property bits (capability requirements, reversal, reentrancy). The table is
// fixed at compile time; nothing can change an event's policy at runtime.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::events::client::OrderType;
use crate::events::phase::DrawPhase;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EventProps: u32 {
        const REQ_FULL_READ  = 1 << 0;
        const REQ_GAME_CTRL  = 1 << 1;
        const REQ_INPUT_CTRL = 1 << 2;
        const REVERSED       = 1 << 3;
        const REENTRANT      = 1 << 4;
    }
}

/// How dispatch walks an event's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopType {
    Basic,
    Special,
    FirstTrue,
    FirstFalse,
    FirstNumber,
    FirstString,
    BooleanOr,
}

impl LoopType {
    pub fn name(self) -> &'static str {
        match self {
            LoopType::Basic => "BASIC",
            LoopType::Special => "SPECIAL",
            LoopType::FirstTrue => "FIRST_TRUE",
            LoopType::FirstFalse => "FIRST_FALSE",
            LoopType::FirstNumber => "FIRST_NUMBER",
            LoopType::FirstString => "FIRST_STRING",
            LoopType::BooleanOr => "BOOLEAN_OR",
        }
    }
}

macro_rules! event_ids {
    ($($variant:ident),* $(,)?) => {
        /// Every named event. Discriminants index [`EVENT_TABLE`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EventId {
            $($variant),*
        }

        impl EventId {
            pub const ALL: &'static [EventId] = &[$(EventId::$variant),*];
        }
    };
}

event_ids!(
    Update,
    BzdbChange,
    CommandFallback,
    RecvChatMsg,
    RecvLuaData,
    ServerJoined,
    ServerParted,
    PlayerAdded,
    PlayerRemoved,
    PlayerSpawned,
    PlayerKilled,
    PlayerJumped,
    PlayerLanded,
    PlayerTeleported,
    PlayerTeamChange,
    PlayerScoreChange,
    ShotAdded,
    ShotRemoved,
    ShotRicochet,
    ShotTeleported,
    FlagAdded,
    FlagRemoved,
    FlagGrabbed,
    FlagDropped,
    FlagCaptured,
    FlagTransferred,
    GlResize,
    GlContextInit,
    GlContextFree,
    GlUnmapped,
    DrawGenesis,
    DrawWorldStart,
    DrawWorld,
    DrawWorldAlpha,
    DrawWorldShadow,
    DrawScreenStart,
    DrawScreen,
    DrawRadar,
    KeyPress,
    KeyRelease,
    UnicodeText,
    MousePress,
    MouseMove,
    MouseRelease,
    MouseWheel,
    IsAbove,
    GetTooltip,
    WordComplete,
    ForbidSpawn,
    ForbidJump,
    ForbidFlagDrop,
    ForbidShot,
    ForbidShotLock,
    ForbidShotHit,
    Shutdown,
    GotGfxBlock,
    LostGfxBlock,
);

impl EventId {
    pub fn spec(self) -> &'static EventSpec {
        &EVENT_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        EVENT_TABLE.iter().find(|s| s.name == name).map(|s| s.id)
    }

    pub fn draw(phase: DrawPhase) -> Self {
        match phase {
            DrawPhase::Genesis => EventId::DrawGenesis,
            DrawPhase::WorldStart => EventId::DrawWorldStart,
            DrawPhase::World => EventId::DrawWorld,
            DrawPhase::WorldAlpha => EventId::DrawWorldAlpha,
            DrawPhase::WorldShadow => EventId::DrawWorldShadow,
            DrawPhase::ScreenStart => EventId::DrawScreenStart,
            DrawPhase::Screen => EventId::DrawScreen,
            DrawPhase::Radar => EventId::DrawRadar,
        }
    }
}

/// One row of the event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpec {
    pub id: EventId,
    pub name: &'static str,
    /// `None` for events delivered directly instead of through a list.
    pub order: Option<OrderType>,
    pub loop_type: LoopType,
    pub props: EventProps,
}

impl EventSpec {
    pub fn is_managed(&self) -> bool {
        self.order.is_some()
    }

    pub fn req_full_read(&self) -> bool {
        self.props.contains(EventProps::REQ_FULL_READ)
    }

    pub fn req_game_ctrl(&self) -> bool {
        self.props.contains(EventProps::REQ_GAME_CTRL)
    }

    pub fn req_input_ctrl(&self) -> bool {
        self.props.contains(EventProps::REQ_INPUT_CTRL)
    }

    pub fn is_reversed(&self) -> bool {
        self.props.contains(EventProps::REVERSED)
    }

    pub fn is_reentrant(&self) -> bool {
        self.props.contains(EventProps::REENTRANT)
    }
}

const FULL_READ: EventProps = EventProps::REQ_FULL_READ;
const GAME_CTRL: EventProps = EventProps::REQ_GAME_CTRL;
const INPUT_CTRL: EventProps = EventProps::REQ_INPUT_CTRL;
const REVERSED: EventProps = EventProps::REVERSED;
const REENTRANT: EventProps = EventProps::REENTRANT;
const NONE: EventProps = EventProps::empty();

const fn row(
    id: EventId,
    name: &'static str,
    order: OrderType,
    loop_type: LoopType,
    props: EventProps,
) -> EventSpec {
    EventSpec {
        id,
        name,
        order: Some(order),
        loop_type,
        props,
    }
}

const fn direct(id: EventId, name: &'static str) -> EventSpec {
    EventSpec {
        id,
        name,
        order: None,
        loop_type: LoopType::Basic,
        props: NONE,
    }
}

use EventId as E;
use LoopType as L;
use OrderType as O;

pub static EVENT_TABLE: [EventSpec; 57] = [
    row(E::Update, "Update", O::ScriptId, L::Basic, NONE),
    row(E::BzdbChange, "BZDBChange", O::GameState, L::Basic, REENTRANT),
    row(E::CommandFallback, "CommandFallback", O::DrawScreen, L::FirstTrue, NONE),
    // Tagged first-true; dispatch still delivers to every listener.
    row(E::RecvChatMsg, "RecvChatMsg", O::ScriptId, L::FirstTrue, NONE),
    row(E::RecvLuaData, "RecvLuaData", O::ScriptId, L::FirstTrue, NONE),
    row(E::ServerJoined, "ServerJoined", O::GameState, L::Basic, NONE),
    row(E::ServerParted, "ServerParted", O::GameState, L::Basic, NONE),
    row(E::PlayerAdded, "PlayerAdded", O::GameState, L::Basic, NONE),
    row(E::PlayerRemoved, "PlayerRemoved", O::GameState, L::Basic, NONE),
    row(E::PlayerSpawned, "PlayerSpawned", O::GameState, L::Basic, NONE),
    row(E::PlayerKilled, "PlayerKilled", O::GameState, L::Basic, NONE),
    row(E::PlayerJumped, "PlayerJumped", O::GameState, L::Basic, FULL_READ),
    row(E::PlayerLanded, "PlayerLanded", O::GameState, L::Basic, FULL_READ),
    row(E::PlayerTeleported, "PlayerTeleported", O::GameState, L::Basic, FULL_READ),
    row(E::PlayerTeamChange, "PlayerTeamChange", O::GameState, L::Basic, NONE),
    row(E::PlayerScoreChange, "PlayerScoreChange", O::GameState, L::Basic, NONE),
    row(E::ShotAdded, "ShotAdded", O::GameState, L::Basic, FULL_READ),
    row(E::ShotRemoved, "ShotRemoved", O::GameState, L::Basic, FULL_READ),
    row(E::ShotRicochet, "ShotRicochet", O::GameState, L::Basic, FULL_READ),
    row(E::ShotTeleported, "ShotTeleported", O::GameState, L::Basic, FULL_READ),
    row(E::FlagAdded, "FlagAdded", O::GameState, L::Basic, NONE),
    row(E::FlagRemoved, "FlagRemoved", O::GameState, L::Basic, NONE),
    row(E::FlagGrabbed, "FlagGrabbed", O::GameState, L::Basic, NONE),
    row(E::FlagDropped, "FlagDropped", O::GameState, L::Basic, NONE),
    row(E::FlagCaptured, "FlagCaptured", O::GameState, L::Basic, NONE),
    row(E::FlagTransferred, "FlagTransferred", O::GameState, L::Basic, NONE),
    row(E::GlResize, "GLResize", O::ScriptId, L::Basic, NONE),
    row(E::GlContextInit, "GLContextInit", O::ScriptId, L::Basic, NONE),
    row(E::GlContextFree, "GLContextFree", O::ScriptId, L::Basic, NONE),
    row(E::GlUnmapped, "GLUnmapped", O::ScriptId, L::Basic, NONE),
    row(E::DrawGenesis, "DrawGenesis", O::DrawScreen, L::Basic, REVERSED),
    row(E::DrawWorldStart, "DrawWorldStart", O::DrawWorld, L::Basic, REVERSED),
    row(E::DrawWorld, "DrawWorld", O::DrawWorld, L::Basic, REVERSED),
    row(E::DrawWorldAlpha, "DrawWorldAlpha", O::DrawWorld, L::Basic, REVERSED),
    row(E::DrawWorldShadow, "DrawWorldShadow", O::DrawWorld, L::Basic, REVERSED),
    row(E::DrawScreenStart, "DrawScreenStart", O::DrawScreen, L::Basic, REVERSED),
    row(E::DrawScreen, "DrawScreen", O::DrawScreen, L::Basic, REVERSED),
    row(E::DrawRadar, "DrawRadar", O::DrawScreen, L::Basic, REVERSED),
    row(E::KeyPress, "KeyPress", O::ScriptId, L::BooleanOr, INPUT_CTRL),
    row(E::KeyRelease, "KeyRelease", O::ScriptId, L::BooleanOr, INPUT_CTRL),
    row(E::UnicodeText, "UnicodeText", O::ScriptId, L::BooleanOr, INPUT_CTRL),
    row(E::MousePress, "MousePress", O::ScriptId, L::BooleanOr, INPUT_CTRL),
    row(E::MouseMove, "MouseMove", O::ScriptId, L::BooleanOr, INPUT_CTRL),
    row(E::MouseRelease, "MouseRelease", O::ScriptId, L::BooleanOr, INPUT_CTRL),
    row(E::MouseWheel, "MouseWheel", O::ScriptId, L::BooleanOr, INPUT_CTRL),
    row(E::IsAbove, "IsAbove", O::ScriptId, L::FirstTrue, INPUT_CTRL),
    row(E::GetTooltip, "GetTooltip", O::ScriptId, L::FirstString, INPUT_CTRL),
    row(E::WordComplete, "WordComplete", O::ScriptId, L::Special, INPUT_CTRL),
    row(E::ForbidSpawn, "ForbidSpawn", O::GameState, L::FirstTrue, GAME_CTRL),
    row(E::ForbidJump, "ForbidJump", O::GameState, L::FirstTrue, GAME_CTRL),
    row(E::ForbidFlagDrop, "ForbidFlagDrop", O::GameState, L::FirstTrue, GAME_CTRL),
    row(E::ForbidShot, "ForbidShot", O::GameState, L::FirstTrue, GAME_CTRL),
    row(E::ForbidShotLock, "ForbidShotLock", O::GameState, L::FirstTrue, GAME_CTRL),
    row(E::ForbidShotHit, "ForbidShotHit", O::GameState, L::FirstTrue, GAME_CTRL),
    direct(E::Shutdown, "Shutdown"),
    direct(E::GotGfxBlock, "GotGfxBlock"),
    direct(E::LostGfxBlock, "LostGfxBlock"),
];
