// Stable names for gfx block types and global block ids. Scripts request
// blocks by these strings, so they must not change.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i32)]
pub enum BlockType {
    Global = 0,
    Tank = 1,
    Shot = 2,
    Flag = 3,
    TankRadar = 4,
    ShotRadar = 5,
    FlagRadar = 6,
}

impl BlockType {
    pub const ALL: [BlockType; 7] = [
        BlockType::Global,
        BlockType::Tank,
        BlockType::Shot,
        BlockType::Flag,
        BlockType::TankRadar,
        BlockType::ShotRadar,
        BlockType::FlagRadar,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockType::Global => "global",
            BlockType::Tank => "tank",
            BlockType::Shot => "shot",
            BlockType::Flag => "flag",
            BlockType::TankRadar => "tankradar",
            BlockType::ShotRadar => "shotradar",
            BlockType::FlagRadar => "flagradar",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Entity blocks drawn in world space. Global blocks carry their own flag.
    pub fn is_world_entity(self) -> bool {
        matches!(self, BlockType::Tank | BlockType::Shot | BlockType::Flag)
    }
}

/// Type name for a raw code, `"unknown"` when out of range.
pub fn type_string(code: i32) -> &'static str {
    BlockType::from_code(code).map_or("unknown", BlockType::name)
}

/// Type code for a name, -1 when unknown.
pub fn type_code(name: &str) -> i32 {
    BlockType::from_name(name).map_or(-1, BlockType::code)
}

macro_rules! global_blocks {
    (world: [$($w:ident => $wn:literal),* $(,)?], screen: [$($s:ident => $sn:literal),* $(,)?]) => {
        /// The statically allocated global blocks. World blocks come first.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(i32)]
        pub enum GlobalBlock {
            $($w,)*
            $($s,)*
        }

        impl GlobalBlock {
            pub const ALL: &'static [GlobalBlock] = &[
                $(GlobalBlock::$w,)*
                $(GlobalBlock::$s,)*
            ];

            pub fn name(self) -> &'static str {
                match self {
                    $(GlobalBlock::$w => $wn,)*
                    $(GlobalBlock::$s => $sn,)*
                }
            }

            pub fn is_world(self) -> bool {
                matches!(self, $(GlobalBlock::$w)|*)
            }
        }
    };
}

global_blocks!(
    world: [
        Obstacles => "obstacles",
        Sky => "sky",
        Stars => "stars",
        Clouds => "clouds",
        Ground => "ground",
        Lights => "lights",
        Mirror => "mirror",
        Shadows => "shadows",
        Mountains => "mountains",
        Explosions => "explosions",
        Insides => "insides",
        Halos => "halos",
        TrackMarks => "trackMarks",
        Weather => "weather",
        Effects => "effects",
    ],
    screen: [
        Cursor => "cursor",
        Console => "console",
        Radar => "radar",
        TeamScores => "teamScores",
        PlayerScores => "playerScores",
        Menu => "menu",
        Compose => "compose",
        TargetBox => "targetBox",
        ShotStatus => "shotStatus",
        Markers => "markers",
        Times => "times",
        Labels => "labels",
        Cracks => "cracks",
        Status => "status",
        Clock => "clock",
        FlagHelp => "flagHelp",
        Alerts => "alerts",
    ]
);

impl GlobalBlock {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }
}

/// Global block name for an id, `"unknown"` when out of range.
pub fn id_string(id: i32) -> &'static str {
    GlobalBlock::from_id(id).map_or("unknown", GlobalBlock::name)
}

/// Global block id for a name, -1 when unknown.
pub fn id_code(name: &str) -> i32 {
    GlobalBlock::from_name(name).map_or(-1, GlobalBlock::id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_strings() {
        assert_eq!(type_string(0), "global");
        assert_eq!(type_string(4), "tankradar");
        assert_eq!(type_string(7), "unknown");
        assert_eq!(type_string(-1), "unknown");
        assert_eq!(type_code("flagradar"), 6);
        assert_eq!(type_code("Tank"), -1);
    }

    #[test]
    fn global_ids_are_contiguous() {
        assert_eq!(GlobalBlock::ALL.len(), 32);
        for (i, block) in GlobalBlock::ALL.iter().enumerate() {
            assert_eq!(block.id() as usize, i);
            assert_eq!(GlobalBlock::from_name(block.name()), Some(*block));
        }
    }

    #[test]
    fn id_strings() {
        assert_eq!(id_string(GlobalBlock::Obstacles.id()), "obstacles");
        assert_eq!(id_string(GlobalBlock::Radar.id()), "radar");
        assert_eq!(id_code("menu"), GlobalBlock::Menu.id());
        assert_eq!(id_code("trackMarks"), GlobalBlock::TrackMarks.id());
        assert_eq!(id_code("nothing"), -1);
        assert_eq!(id_string(32), "unknown");
        assert_eq!(id_string(-3), "unknown");
    }

    #[test]
    fn world_and_screen_split() {
        assert!(GlobalBlock::Effects.is_world());
        assert!(!GlobalBlock::Cursor.is_world());
        assert_eq!(GlobalBlock::ALL.iter().filter(|b| b.is_world()).count(), 15);
    }
}
