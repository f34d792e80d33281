use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::events::client::ClientSeq;
use crate::gfx::block::{GfxBlock, GfxNotice};
use crate::gfx::names::{BlockType, GlobalBlock};

/// Game entities that carry their own pair of gfx blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Shot,
    Flag,
}

impl EntityKind {
    /// The world block and the radar block of the entity.
    pub fn block_types(self) -> [BlockType; 2] {
        match self {
            EntityKind::Player => [BlockType::Tank, BlockType::TankRadar],
            EntityKind::Shot => [BlockType::Shot, BlockType::ShotRadar],
            EntityKind::Flag => [BlockType::Flag, BlockType::FlagRadar],
        }
    }
}

/// Owns every gfx block: the global ones for the lifetime of the manager,
/// the per-entity ones between `add_entity` and `remove_entity`.
#[derive(Debug, Clone)]
pub struct GfxBlockMgr {
    globals: Vec<GfxBlock>,
    entities: BTreeMap<(BlockType, i32), GfxBlock>,
}

impl GfxBlockMgr {
    pub fn new() -> Self {
        let globals = GlobalBlock::ALL
            .iter()
            .map(|b| GfxBlock::new(BlockType::Global, b.id(), b.is_world()))
            .collect();
        Self {
            globals,
            entities: BTreeMap::new(),
        }
    }

    pub fn global(&self, block: GlobalBlock) -> &GfxBlock {
        &self.globals[block as usize]
    }

    pub fn global_mut(&mut self, block: GlobalBlock) -> &mut GfxBlock {
        &mut self.globals[block as usize]
    }

    pub fn block(&self, block_type: BlockType, id: i32) -> Option<&GfxBlock> {
        match block_type {
            BlockType::Global => GlobalBlock::from_id(id).map(|b| self.global(b)),
            _ => self.entities.get(&(block_type, id)),
        }
    }

    pub fn block_mut(&mut self, block_type: BlockType, id: i32) -> Option<&mut GfxBlock> {
        match block_type {
            BlockType::Global => GlobalBlock::from_id(id).map(|b| self.global_mut(b)),
            _ => self.entities.get_mut(&(block_type, id)),
        }
    }

    /// Create the blocks of a new entity. Returns `false` if it already has them.
    pub fn add_entity(&mut self, kind: EntityKind, id: i32) -> bool {
        let [world, radar] = kind.block_types();
        if self.entities.contains_key(&(world, id)) {
            return false;
        }
        self.entities
            .insert((world, id), GfxBlock::new(world, id, true));
        self.entities
            .insert((radar, id), GfxBlock::new(radar, id, false));
        true
    }

    /// Destroy an entity's blocks, telling their owners they lost them.
    pub fn remove_entity(&mut self, kind: EntityKind, id: i32, notices: &mut Vec<GfxNotice>) -> bool {
        let mut found = false;
        for block_type in kind.block_types() {
            if let Some(mut block) = self.entities.remove(&(block_type, id)) {
                block.clear(notices);
                found = true;
            }
        }
        found
    }

    pub fn entity_block_count(&self) -> usize {
        self.entities.len()
    }

    /// Purge a departing client from every block.
    pub fn remove_client(&mut self, seq: ClientSeq, notices: &mut Vec<GfxNotice>) {
        for block in &mut self.globals {
            block.remove(seq, notices);
        }
        for block in self.entities.values_mut() {
            block.remove(seq, notices);
        }
    }

    /// Forget claims of clients that were dropped without being removed.
    pub fn prune_dead(&mut self, notices: &mut Vec<GfxNotice>) {
        for block in self.globals.iter_mut().chain(self.entities.values_mut()) {
            block.prune_dead(notices);
        }
    }

    /// Blocks currently owned by `seq`.
    pub fn owned_by(&self, seq: ClientSeq) -> Vec<(BlockType, i32)> {
        self.globals
            .iter()
            .chain(self.entities.values())
            .filter(|b| b.owner().is_some_and(|o| o.seq() == seq))
            .map(|b| (b.block_type(), b.id()))
            .collect()
    }
}

impl Default for GfxBlockMgr {
    fn default() -> Self {
        Self::new()
    }
}
