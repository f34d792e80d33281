//! Test Utilities
//!
//! Recording event clients and a recording pass bracket. Everything they see
//! is appended to a shared call log so tests can assert on dispatch order.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use bzclient_core::events::{ClientInfo, DrawPhase, EventClient, KeyModifiers, PassBracket};
use bzclient_core::gfx::{id_string, type_string, BlockType};
use bzclient_core::{CallInError, CallInResult};

pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.borrow().clone()
}

type Hook = Box<dyn Fn()>;

/// A client that logs every call-in it receives as `"name:Event"`.
pub struct RecordingClient {
    info: ClientInfo,
    log: CallLog,
    answer: bool,
    fail: bool,
    completions: Vec<String>,
    hook: RefCell<Option<Hook>>,
}

impl RecordingClient {
    pub fn new(info: ClientInfo, log: &CallLog) -> Self {
        Self {
            info,
            log: Rc::clone(log),
            answer: false,
            fail: false,
            completions: Vec::new(),
            hook: RefCell::new(None),
        }
    }

    /// Value returned from boolean call-ins.
    pub fn answering(mut self, answer: bool) -> Self {
        self.answer = answer;
        self
    }

    /// Make every call-in after logging fail with a script error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn completing(mut self, words: &[&str]) -> Self {
        self.completions = words.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn into_rc(self) -> Rc<dyn EventClient> {
        Rc::new(self)
    }

    fn record(&self, what: impl AsRef<str>) -> CallInResult {
        self.log
            .borrow_mut()
            .push(format!("{}:{}", self.info.name, what.as_ref()));
        if self.fail {
            return Err(CallInError::Script(format!("{} blew up", self.info.name)));
        }
        Ok(())
    }
}

/// Install a closure run at the start of the client's `update` call-in.
pub fn on_update(client: &Rc<RecordingClient>, hook: impl Fn() + 'static) {
    *client.hook.borrow_mut() = Some(Box::new(hook));
}

impl EventClient for RecordingClient {
    fn info(&self) -> &ClientInfo {
        &self.info
    }

    fn update(&self) -> CallInResult {
        if let Some(hook) = self.hook.borrow().as_ref() {
            hook();
        }
        self.record("Update")
    }

    fn bzdb_change(&self, name: &str) -> CallInResult {
        self.record(format!("BZDBChange({name})"))
    }

    fn recv_lua_data(
        &self,
        _src_player: i32,
        _src_script: i32,
        _dst_player: i32,
        dst_script: i32,
        _status: i32,
        data: &str,
    ) -> CallInResult {
        self.record(format!("RecvLuaData({dst_script},{data})"))
    }

    fn draw(&self, phase: DrawPhase) -> CallInResult {
        self.record(phase.name())
    }

    fn key_press(&self, taken: bool, _key: i32, _mods: KeyModifiers) -> CallInResult<bool> {
        self.record(format!("KeyPress({taken})"))?;
        Ok(self.answer)
    }

    fn mouse_move(&self, taken: bool, _x: i32, _y: i32) -> CallInResult<bool> {
        self.record(format!("MouseMove({taken})"))?;
        Ok(self.answer)
    }

    fn forbid_spawn(&self) -> CallInResult<bool> {
        self.record("ForbidSpawn")?;
        Ok(self.answer)
    }

    fn word_complete(&self, _line: &str, partials: &mut BTreeSet<String>) -> CallInResult {
        partials.extend(self.completions.iter().cloned());
        self.record("WordComplete")
    }

    fn got_gfx_block(&self, block_type: BlockType, id: i32) -> CallInResult {
        self.record(format!("Got({},{})", block_type.name(), block_name(block_type, id)))
    }

    fn lost_gfx_block(&self, block_type: BlockType, id: i32) -> CallInResult {
        self.record(format!("Lost({},{})", block_type.name(), block_name(block_type, id)))
    }
}

fn block_name(block_type: BlockType, id: i32) -> String {
    if block_type == BlockType::Global {
        id_string(id).to_string()
    } else {
        format!("{}#{}", type_string(block_type.code()), id)
    }
}

/// Pass bracket that logs `enable/reset/disable(Phase)` into a call log.
pub struct RecordingPass {
    log: CallLog,
}

impl RecordingPass {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
        }
    }
}

impl PassBracket for RecordingPass {
    fn enable(&self, phase: DrawPhase) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("enable({})", phase.name()));
        Ok(())
    }

    fn reset(&self, phase: DrawPhase) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("reset({})", phase.name()));
        Ok(())
    }

    fn disable(&self, phase: DrawPhase) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("disable({})", phase.name()));
        Ok(())
    }
}
