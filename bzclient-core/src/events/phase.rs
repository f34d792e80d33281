use serde::{Deserialize, Serialize};

/// The eight draw passes of a client frame, in the order the renderer runs
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum DrawPhase {
    Genesis = 0,
    WorldStart = 1,
    World = 2,
    WorldAlpha = 3,
    WorldShadow = 4,
    ScreenStart = 5,
    Screen = 6,
    Radar = 7,
}

impl DrawPhase {
    pub const COUNT: usize = 8;

    pub const ALL: [DrawPhase; Self::COUNT] = [
        DrawPhase::Genesis,
        DrawPhase::WorldStart,
        DrawPhase::World,
        DrawPhase::WorldAlpha,
        DrawPhase::WorldShadow,
        DrawPhase::ScreenStart,
        DrawPhase::Screen,
        DrawPhase::Radar,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Event name of the phase; also the name the pass state reports.
    pub fn name(self) -> &'static str {
        match self {
            DrawPhase::Genesis => "DrawGenesis",
            DrawPhase::WorldStart => "DrawWorldStart",
            DrawPhase::World => "DrawWorld",
            DrawPhase::WorldAlpha => "DrawWorldAlpha",
            DrawPhase::WorldShadow => "DrawWorldShadow",
            DrawPhase::ScreenStart => "DrawScreenStart",
            DrawPhase::Screen => "DrawScreen",
            DrawPhase::Radar => "DrawRadar",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// World phases draw in world space with the scene's projection.
    pub fn is_world(self) -> bool {
        matches!(
            self,
            DrawPhase::WorldStart
                | DrawPhase::World
                | DrawPhase::WorldAlpha
                | DrawPhase::WorldShadow
        )
    }
}

/// Brackets a draw pass with GL state setup and teardown.
///
/// The event handler calls `enable` before the first client of a draw event,
/// `reset` before every later client, and `disable` once all clients ran.
/// Implementations use interior mutability: clients reach the same pass state
/// from inside their call-ins.
pub trait PassBracket {
    fn enable(&self, phase: DrawPhase) -> anyhow::Result<()>;
    fn reset(&self, phase: DrawPhase) -> anyhow::Result<()>;
    fn disable(&self, phase: DrawPhase) -> anyhow::Result<()>;
}
