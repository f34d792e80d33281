//! Lua scripting for the BZFlag client.
//!
//! Each script runs in its own Lua state behind a [`LuaHandle`], which is an
//! ordinary event client to the core handler. Scripts see three tables:
//! `Script` for their identity and call-ins, `gl` for pass-state stack
//! operations and GPU objects, and `gfx` for gfx block ownership.
//! [`ScriptHost`] wires scripts, the handler and a render context together.

pub mod bindings;
pub mod callins;
pub mod convert;
pub mod error;
pub mod handle;
pub mod host;

pub use error::{IntoAnyhow, LuaBindingError};
pub use handle::LuaHandle;
pub use host::ScriptHost;
