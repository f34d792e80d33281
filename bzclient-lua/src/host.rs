//! Script host.
//!
//! Owns the event handler, the render context and every loaded script, and
//! drives them through frames and context resets the way the client's main
//! loop does.

use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use bzclient_core::{ClientInfo, DrawPhase, EventClient, EventHandler};
use bzclient_render::{GlApi, RenderContext};

use crate::error::LuaBindingError;
use crate::handle::LuaHandle;

pub struct ScriptHost {
    handler: Rc<EventHandler>,
    render: Rc<RenderContext>,
    scripts: Vec<Rc<LuaHandle>>,
    frame: u64,
}

impl ScriptHost {
    pub fn new(gl: Rc<dyn GlApi>) -> Self {
        Self {
            handler: Rc::new(EventHandler::new()),
            render: Rc::new(RenderContext::new(gl)),
            scripts: Vec::new(),
            frame: 0,
        }
    }

    pub fn handler(&self) -> &Rc<EventHandler> {
        &self.handler
    }

    pub fn render(&self) -> &Rc<RenderContext> {
        &self.render
    }

    pub fn scripts(&self) -> &[Rc<LuaHandle>] {
        &self.scripts
    }

    pub fn script(&self, name: &str) -> Option<&Rc<LuaHandle>> {
        self.scripts.iter().find(|s| s.name() == name)
    }

    /// Frames run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Register a new script client and run its source.
    ///
    /// # Arguments
    ///
    /// * `info` - Name, script id, orders and capabilities of the client
    /// * `source` - Lua source, run once at load
    /// * `chunk_name` - Name Lua errors refer to
    ///
    /// # Returns
    ///
    /// The loaded handle. A script whose chunk fails is unregistered again.
    pub fn load_script(
        &mut self,
        info: ClientInfo,
        source: &str,
        chunk_name: &str,
    ) -> anyhow::Result<Rc<LuaHandle>> {
        if self.script(&info.name).is_some() {
            return Err(LuaBindingError::Binding(format!(
                "a script named {} is already loaded",
                info.name
            ))
            .into());
        }
        let handle = LuaHandle::new(info, &self.handler, &self.render)?;
        let client: Rc<dyn EventClient> = handle.clone();
        if !self.handler.add_client(&client) {
            anyhow::bail!("event handler refused client {}", handle.name());
        }
        if let Err(err) = handle.load(source, chunk_name) {
            self.handler.remove_client(&client);
            return Err(err);
        }
        self.scripts.push(Rc::clone(&handle));
        Ok(handle)
    }

    pub fn load_script_file(&mut self, info: ClientInfo, path: &Path) -> anyhow::Result<Rc<LuaHandle>> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Lua script: {}", path.display()))?;
        self.load_script(info, &source, &path.to_string_lossy())
    }

    /// Shut a script down and drop it. Its gfx blocks pass to the next
    /// queued claims and its GPU objects are freed.
    pub fn unload_script(&mut self, name: &str) -> Result<(), LuaBindingError> {
        let pos = self
            .scripts
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| LuaBindingError::ScriptNotFound(name.to_string()))?;
        let handle = self.scripts.remove(pos);
        if let Err(err) = handle.shutdown() {
            log::warn!("{}::Shutdown failed: {}", name, err);
        }
        let client: Rc<dyn EventClient> = handle;
        self.handler.remove_client(&client);
        log::info!("unloaded script {}", name);
        Ok(())
    }

    /// One client frame: `Update`, then every draw pass in order. Returns
    /// how many passes a script broke; those are logged and skipped.
    pub fn run_frame(&mut self) -> usize {
        self.frame += 1;
        self.handler.update();
        let pass = self.render.pass();
        let mut failed = 0;
        for phase in DrawPhase::ALL {
            if let Err(err) = self.handler.draw(phase, pass.as_ref()) {
                log::warn!("frame {}: {}", self.frame, err);
                failed += 1;
            }
        }
        failed
    }

    /// Lose and recover the GL context. Scripts hear `GLContextFree` while
    /// their objects still exist and `GLContextInit` once the registry has
    /// rebuilt what it can.
    pub fn reset_context(&self) -> anyhow::Result<()> {
        log::info!("resetting GL context");
        self.handler.gl_context_free();
        self.render
            .lose_context()
            .context("Failed to free GL context resources")?;
        self.render
            .restore_context()
            .context("Failed to initialise GL context resources")?;
        self.handler.gl_context_init();
        Ok(())
    }

    /// Deliver `Shutdown` to every client and drop all scripts.
    pub fn shutdown(&mut self) {
        self.handler.shutdown();
        for handle in self.scripts.drain(..) {
            let client: Rc<dyn EventClient> = handle;
            self.handler.remove_client(&client);
        }
    }
}
