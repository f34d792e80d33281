// Exclusive ownership of a renderable region.
//
// `clients[0]` is the owner; everything after it is a queued claim in
// priority order. Priority compares draw-world order for world blocks and
// draw-screen order otherwise, then name, then registration sequence.
// Ownership changes are not delivered from inside the block: they are pushed
// onto a notice list the caller delivers once its own borrows are released,
// since a client reacting to a notice may call straight back into the
// block manager.

use smallvec::SmallVec;

use crate::events::client::{ClientRef, ClientSeq, OrderType};
use crate::gfx::names::BlockType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Got,
    Lost,
}

/// A pending `GotGfxBlock`/`LostGfxBlock` call-in.
#[derive(Debug, Clone)]
pub struct GfxNotice {
    pub client: ClientRef,
    pub kind: NoticeKind,
    pub block_type: BlockType,
    pub id: i32,
}

impl GfxNotice {
    pub fn deliver(&self) {
        let Some(client) = self.client.upgrade() else {
            return;
        };
        let result = match self.kind {
            NoticeKind::Got => client.got_gfx_block(self.block_type, self.id),
            NoticeKind::Lost => client.lost_gfx_block(self.block_type, self.id),
        };
        if let Err(err) = result {
            let event = match self.kind {
                NoticeKind::Got => "GotGfxBlock",
                NoticeKind::Lost => "LostGfxBlock",
            };
            log::warn!("{}::{} failed: {}", client.name(), event, err);
        }
    }
}

/// Deliver notices in the order they were raised.
pub fn deliver_all(notices: Vec<GfxNotice>) {
    for notice in &notices {
        notice.deliver();
    }
}

#[derive(Debug, Clone)]
pub struct GfxBlock {
    block_type: BlockType,
    id: i32,
    world: bool,
    clients: SmallVec<[ClientRef; 2]>,
}

impl GfxBlock {
    pub fn new(block_type: BlockType, id: i32, world: bool) -> Self {
        Self {
            block_type,
            id,
            world,
            clients: SmallVec::new(),
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn is_world(&self) -> bool {
        self.world
    }

    /// True while some client owns the block.
    pub fn blocked(&self) -> bool {
        !self.clients.is_empty()
    }

    pub fn owner(&self) -> Option<&ClientRef> {
        self.clients.first()
    }

    /// Claims waiting behind the owner, best first.
    pub fn queued(&self) -> &[ClientRef] {
        self.clients.get(1..).unwrap_or(&[])
    }

    pub fn contains(&self, seq: ClientSeq) -> bool {
        self.clients.iter().any(|c| c.seq() == seq)
    }

    fn order_type(&self) -> OrderType {
        if self.world {
            OrderType::DrawWorld
        } else {
            OrderType::DrawScreen
        }
    }

    fn is_better(&self, a: &ClientRef, b: &ClientRef) -> bool {
        a.precedes(b, self.order_type())
    }

    fn notice(&self, client: &ClientRef, kind: NoticeKind) -> GfxNotice {
        GfxNotice {
            client: client.clone(),
            kind,
            block_type: self.block_type,
            id: self.id,
        }
    }

    /// Claim the block for `client`.
    ///
    /// Returns `true` if `client` owns the block afterwards. A losing claim
    /// is kept in priority order when `queue` is set and dropped otherwise.
    pub fn set(&mut self, client: &ClientRef, queue: bool, notices: &mut Vec<GfxNotice>) -> bool {
        if self.clients.is_empty() {
            self.clients.push(client.clone());
            return true;
        }
        if self.clients[0].seq() == client.seq() {
            return true;
        }
        for i in 0..self.clients.len() {
            if self.clients[i].seq() == client.seq() {
                return false;
            }
            if self.is_better(client, &self.clients[i]) {
                if i == 0 {
                    self.clients.insert(0, client.clone());
                    notices.push(self.notice(&self.clients[1], NoticeKind::Lost));
                    return true;
                }
                if queue {
                    self.clients.insert(i, client.clone());
                }
                return false;
            }
        }
        if queue {
            self.clients.push(client.clone());
        }
        false
    }

    /// Drop every claim held by `seq`. Returns `false` if it held none.
    pub fn remove(&mut self, seq: ClientSeq, notices: &mut Vec<GfxNotice>) -> bool {
        let old_owner = self.clients.first().map(ClientRef::seq);
        let before = self.clients.len();
        self.clients.retain(|c| c.seq() != seq);
        if self.clients.len() == before {
            return false;
        }
        if let Some(new_owner) = self.clients.first() {
            if Some(new_owner.seq()) != old_owner {
                notices.push(self.notice(new_owner, NoticeKind::Got));
            }
        }
        true
    }

    /// Release the block entirely, telling the owner it lost it.
    pub fn clear(&mut self, notices: &mut Vec<GfxNotice>) {
        if let Some(owner) = self.clients.first() {
            notices.push(self.notice(owner, NoticeKind::Lost));
        }
        self.clients.clear();
    }

    /// Forget claims whose client has been dropped.
    pub fn prune_dead(&mut self, notices: &mut Vec<GfxNotice>) {
        let old_owner = self.clients.first().map(ClientRef::seq);
        self.clients.retain(|c| c.is_alive());
        if let Some(new_owner) = self.clients.first() {
            if Some(new_owner.seq()) != old_owner {
                notices.push(self.notice(new_owner, NoticeKind::Got));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::client::{ClientInfo, EventClient};
    use std::rc::Rc;

    struct Drawer(ClientInfo);

    impl EventClient for Drawer {
        fn info(&self) -> &ClientInfo {
            &self.0
        }
    }

    fn drawer(name: &str, screen_order: i32, seq: u64) -> (Rc<dyn EventClient>, ClientRef) {
        let client: Rc<dyn EventClient> =
            Rc::new(Drawer(ClientInfo::new(name, seq as i32).with_orders(0, 0, screen_order)));
        let r = ClientRef::new(ClientSeq(seq), &client);
        (client, r)
    }

    #[test]
    fn unowned_block_goes_to_first_claim() {
        let (_x, x) = drawer("x", 5, 1);
        let mut block = GfxBlock::new(BlockType::Global, 18, false);
        let mut notices = Vec::new();
        assert!(!block.blocked());
        assert!(block.set(&x, false, &mut notices));
        assert!(block.blocked());
        assert!(block.set(&x, false, &mut notices));
        assert!(notices.is_empty());
    }

    #[test]
    fn better_claim_takes_over_and_notifies_once() {
        let (_x, x) = drawer("x", 5, 1);
        let (_y, y) = drawer("y", 1, 2);
        let mut block = GfxBlock::new(BlockType::Global, 18, false);
        let mut notices = Vec::new();
        block.set(&x, false, &mut notices);
        assert!(block.set(&y, false, &mut notices));
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Lost);
        assert_eq!(notices[0].client.seq(), x.seq());
        assert_eq!(block.owner().map(ClientRef::seq), Some(y.seq()));
    }

    #[test]
    fn losing_claim_is_queued_or_dropped() {
        let (_x, x) = drawer("x", 1, 1);
        let (_y, y) = drawer("y", 5, 2);
        let (_z, z) = drawer("z", 3, 3);
        let mut block = GfxBlock::new(BlockType::Global, 18, false);
        let mut notices = Vec::new();
        block.set(&x, false, &mut notices);
        assert!(!block.set(&y, false, &mut notices));
        assert!(block.queued().is_empty());
        assert!(!block.set(&y, true, &mut notices));
        assert!(!block.set(&z, true, &mut notices));
        let queued: Vec<_> = block.queued().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(queued, vec!["z", "y"]);
        assert!(!block.set(&z, true, &mut notices));
        assert_eq!(block.queued().len(), 2);
        assert!(notices.is_empty());
    }

    #[test]
    fn remove_hands_over_to_next_in_line() {
        let (_x, x) = drawer("x", 1, 1);
        let (_y, y) = drawer("y", 5, 2);
        let mut block = GfxBlock::new(BlockType::Global, 18, false);
        let mut notices = Vec::new();
        block.set(&x, false, &mut notices);
        block.set(&y, true, &mut notices);
        assert!(block.remove(x.seq(), &mut notices));
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Got);
        assert_eq!(notices[0].client.seq(), y.seq());
        assert!(!block.remove(x.seq(), &mut notices));
    }

    #[test]
    fn removing_a_queued_claim_does_not_notify() {
        let (_x, x) = drawer("x", 1, 1);
        let (_y, y) = drawer("y", 5, 2);
        let mut block = GfxBlock::new(BlockType::Global, 18, false);
        let mut notices = Vec::new();
        block.set(&x, false, &mut notices);
        block.set(&y, true, &mut notices);
        assert!(block.remove(y.seq(), &mut notices));
        assert!(notices.is_empty());
    }

    #[test]
    fn world_blocks_compare_draw_world_order() {
        let a: Rc<dyn EventClient> =
            Rc::new(Drawer(ClientInfo::new("a", 1).with_orders(0, 9, 1)));
        let b: Rc<dyn EventClient> =
            Rc::new(Drawer(ClientInfo::new("b", 2).with_orders(0, 1, 9)));
        let ra = ClientRef::new(ClientSeq(1), &a);
        let rb = ClientRef::new(ClientSeq(2), &b);
        let mut notices = Vec::new();

        let mut world = GfxBlock::new(BlockType::Tank, 3, true);
        world.set(&ra, false, &mut notices);
        assert!(world.set(&rb, false, &mut notices));

        let mut screen = GfxBlock::new(BlockType::TankRadar, 3, false);
        screen.set(&ra, false, &mut notices);
        assert!(!screen.set(&rb, false, &mut notices));
    }

    #[test]
    fn clear_notifies_owner() {
        let (_x, x) = drawer("x", 1, 1);
        let mut block = GfxBlock::new(BlockType::Flag, 2, true);
        let mut notices = Vec::new();
        block.set(&x, false, &mut notices);
        block.clear(&mut notices);
        assert!(!block.blocked());
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Lost);
    }
}
