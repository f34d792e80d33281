//! Gfx blocks: exclusive ownership of renderable regions.
//!
//! A block stands for something only one client should draw at a time: the
//! radar, the console, the sky, a particular tank. Clients claim blocks
//! through the [`EventHandler`](crate::events::EventHandler), which looks up
//! their registration and delivers ownership notices.

pub mod block;
pub mod manager;
pub mod names;

pub use block::{deliver_all, GfxBlock, GfxNotice, NoticeKind};
pub use manager::{EntityKind, GfxBlockMgr};
pub use names::{id_code, id_string, type_code, type_string, BlockType, GlobalBlock};
