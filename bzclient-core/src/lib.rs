//! Event dispatch and gfx block ownership for the BZFlag client.
//!
//! Scripts and built-in components register as [`events::EventClient`]s with
//! an [`events::EventHandler`], subscribe to named events, and compete for
//! [`gfx`] blocks. Draw events are bracketed through the
//! [`events::PassBracket`] seam, which the render crate implements.

pub mod error;
pub mod events;
pub mod game;
pub mod gfx;

pub use error::{CallInError, CallInResult, EventError};
pub use events::{
    ClientInfo, DrawPhase, EventClient, EventHandler, KeyModifiers, OrderType, PassBracket,
};
