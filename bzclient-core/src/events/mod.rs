//! Ordered publish/subscribe dispatch of client call-ins.

pub mod client;
mod dispatch;
pub mod handler;
pub mod list;
pub mod phase;
pub mod table;

pub use client::{ClientInfo, ClientRef, ClientSeq, EventClient, KeyModifiers, OrderType};
pub use handler::EventHandler;
pub use list::{EventClientList, PassEntry};
pub use phase::{DrawPhase, PassBracket};
pub use table::{EventId, EventProps, EventSpec, LoopType, EVENT_TABLE};
