// Game entity references handed to call-ins.
//
// The players, flags and shots themselves live in the game layer; the event
// core only needs a stable, serialisable description of each one to pass
// along to clients.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: i32,
    pub team: i32,
    pub callsign: String,
}

impl PlayerRef {
    pub fn new(id: i32, team: i32, callsign: impl Into<String>) -> Self {
        Self {
            id,
            team,
            callsign: callsign.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagType {
    pub abbrev: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRef {
    pub id: i32,
    pub flag_type: FlagType,
    /// Player currently carrying the flag.
    pub owner: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShotRef {
    pub player_id: i32,
    pub shot_id: i32,
}

impl ShotRef {
    /// Id used for the shot's gfx blocks. Shot ids are unique per player,
    /// so the player id goes into the high half.
    pub fn block_id(&self) -> i32 {
        (self.player_id << 16) | (self.shot_id & 0xFFFF)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiringInfo {
    pub shot: ShotRef,
    pub flag_type: Option<FlagType>,
    pub lifetime: f32,
    pub pos: [f32; 3],
    pub vel: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shot_block_ids_are_distinct_per_player() {
        let a = ShotRef { player_id: 1, shot_id: 3 };
        let b = ShotRef { player_id: 3, shot_id: 1 };
        assert_ne!(a.block_id(), b.block_id());
        assert_eq!(a.block_id(), 0x0001_0003);
    }
}
