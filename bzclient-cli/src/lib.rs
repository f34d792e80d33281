//! Headless driver for the BZFlag client core.
//!
//! Lists the event table and block names, and runs Lua scripts against a
//! [`HeadlessGl`](bzclient_render::HeadlessGl) backend for a number of frames.

pub mod commands;
pub mod config;
