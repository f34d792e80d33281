//! Headless GL
//!
//! A [`GlApi`] that keeps the state a driver would keep and nothing else: the
//! attribute stack, three matrix stacks, live object names and the contents
//! of compiled display lists. Misuse a real driver would flag with
//! `glGetError` (stack over/underflow, deleting a name that is not live) is
//! counted so tests can assert on it.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::gl::matrix::{self, Mat4, IDENTITY};
use crate::gl::{GlApi, GlId, MaterialParams, MatrixMode, ModeState, ObjectKind, ShaderStage};

/// `GL_MAX_ATTRIB_STACK_DEPTH` of the modelled implementation.
pub const MAX_ATTRIB_STACK_DEPTH: usize = 16;
/// `GL_MAX_LIST_NESTING`
const MAX_LIST_NESTING: usize = 64;

/// A call that can be compiled into a display list.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCommand {
    PushAttrib(u32),
    PopAttrib,
    MatrixMode(MatrixMode),
    PushMatrix,
    PopMatrix,
    LoadIdentity,
    LoadMatrix(Mat4),
    MultMatrix(Mat4),
    Scissor([i32; 4]),
    CallList(GlId),
    ModeState(ModeState),
    Material(MaterialParams),
    UseProgram(GlId),
}

struct Inner {
    next_name: u32,
    live: BTreeMap<GlId, ObjectKind>,
    double_deletes: usize,
    leaked: usize,
    attribs: Vec<u32>,
    mode: MatrixMode,
    matrices: [Vec<Mat4>; 3],
    recording: Option<(GlId, Vec<GlCommand>)>,
    lists: HashMap<GlId, Vec<GlCommand>>,
    mode_state: Option<ModeState>,
    material: Option<MaterialParams>,
    program: GlId,
    scissor: Option<[i32; 4]>,
    compiled: HashMap<GlId, bool>,
    textures: HashMap<GlId, (u32, u32)>,
    buffers: HashMap<GlId, usize>,
    errors: Vec<String>,
}

impl Inner {
    fn new() -> Self {
        Self {
            next_name: 1,
            live: BTreeMap::new(),
            double_deletes: 0,
            leaked: 0,
            attribs: Vec::new(),
            mode: MatrixMode::ModelView,
            matrices: [vec![IDENTITY], vec![IDENTITY], vec![IDENTITY]],
            recording: None,
            lists: HashMap::new(),
            mode_state: None,
            material: None,
            program: GlId::INVALID,
            scissor: None,
            compiled: HashMap::new(),
            textures: HashMap::new(),
            buffers: HashMap::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, message: String) {
        log::debug!("headless gl: {}", message);
        self.errors.push(message);
    }

    fn top(&mut self) -> &mut Mat4 {
        let stack = &mut self.matrices[self.mode.index()];
        let last = stack.len() - 1;
        &mut stack[last]
    }

    fn submit(&mut self, command: GlCommand) {
        match &mut self.recording {
            Some((_, commands)) => commands.push(command),
            None => self.execute(command, 0),
        }
    }

    fn execute(&mut self, command: GlCommand, nesting: usize) {
        match command {
            GlCommand::PushAttrib(bits) => {
                if self.attribs.len() >= MAX_ATTRIB_STACK_DEPTH {
                    self.error("glPushAttrib: GL_STACK_OVERFLOW".to_string());
                } else {
                    self.attribs.push(bits);
                }
            }
            GlCommand::PopAttrib => {
                if self.attribs.pop().is_none() {
                    self.error("glPopAttrib: GL_STACK_UNDERFLOW".to_string());
                }
            }
            GlCommand::MatrixMode(mode) => self.mode = mode,
            GlCommand::PushMatrix => {
                let mode = self.mode;
                let stack = &mut self.matrices[mode.index()];
                if stack.len() >= mode.limit() {
                    self.error(format!("glPushMatrix({}): GL_STACK_OVERFLOW", mode.name()));
                } else {
                    let top = stack[stack.len() - 1];
                    stack.push(top);
                }
            }
            GlCommand::PopMatrix => {
                let mode = self.mode;
                let stack = &mut self.matrices[mode.index()];
                if stack.len() <= 1 {
                    self.error(format!("glPopMatrix({}): GL_STACK_UNDERFLOW", mode.name()));
                } else {
                    stack.pop();
                }
            }
            GlCommand::LoadIdentity => *self.top() = IDENTITY,
            GlCommand::LoadMatrix(m) => *self.top() = m,
            GlCommand::MultMatrix(m) => {
                let top = self.top();
                *top = matrix::multiply(top, &m);
            }
            GlCommand::Scissor(rect) => self.scissor = Some(rect),
            GlCommand::CallList(id) => {
                if nesting >= MAX_LIST_NESTING {
                    self.error(format!("glCallList({}): nesting too deep", id.0));
                    return;
                }
                if let Some(commands) = self.lists.get(&id).cloned() {
                    for command in commands {
                        self.execute(command, nesting + 1);
                    }
                }
            }
            GlCommand::ModeState(state) => self.mode_state = Some(state),
            GlCommand::Material(params) => self.material = Some(params),
            GlCommand::UseProgram(id) => self.program = id,
        }
    }
}

pub struct HeadlessGl {
    inner: RefCell<Inner>,
}

impl HeadlessGl {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Inner::new()),
        }
    }

    pub fn live_count(&self) -> usize {
        self.inner.borrow().live.len()
    }

    pub fn live_objects(&self, kind: ObjectKind) -> usize {
        self.inner.borrow().live.values().filter(|k| **k == kind).count()
    }

    pub fn is_live(&self, id: GlId) -> bool {
        self.inner.borrow().live.contains_key(&id)
    }

    /// Deletes of names that were not live.
    pub fn double_deletes(&self) -> usize {
        self.inner.borrow().double_deletes
    }

    /// Objects still live when the last context was released.
    pub fn leaked(&self) -> usize {
        self.inner.borrow().leaked
    }

    pub fn errors(&self) -> Vec<String> {
        self.inner.borrow().errors.clone()
    }

    pub fn mode_state(&self) -> Option<ModeState> {
        self.inner.borrow().mode_state
    }

    pub fn material(&self) -> Option<MaterialParams> {
        self.inner.borrow().material
    }

    pub fn program(&self) -> GlId {
        self.inner.borrow().program
    }

    pub fn scissor_box(&self) -> Option<[i32; 4]> {
        self.inner.borrow().scissor
    }

    pub fn current_matrix_mode(&self) -> MatrixMode {
        self.inner.borrow().mode
    }

    pub fn matrix_top(&self, mode: MatrixMode) -> Mat4 {
        let inner = self.inner.borrow();
        let stack = &inner.matrices[mode.index()];
        stack[stack.len() - 1]
    }

    /// Recorded contents of a display list.
    pub fn list(&self, id: GlId) -> Option<Vec<GlCommand>> {
        self.inner.borrow().lists.get(&id).cloned()
    }

    pub fn texture_size(&self, id: GlId) -> Option<(u32, u32)> {
        self.inner.borrow().textures.get(&id).copied()
    }

    pub fn buffer_len(&self, id: GlId) -> Option<usize> {
        self.inner.borrow().buffers.get(&id).copied()
    }
}

impl Default for HeadlessGl {
    fn default() -> Self {
        Self::new()
    }
}

impl GlApi for HeadlessGl {
    fn gen_object(&self, kind: ObjectKind) -> GlId {
        let mut inner = self.inner.borrow_mut();
        let id = GlId(inner.next_name);
        inner.next_name += 1;
        inner.live.insert(id, kind);
        id
    }

    fn delete_object(&self, kind: ObjectKind, id: GlId) {
        let mut inner = self.inner.borrow_mut();
        if inner.live.remove(&id).is_none() {
            inner.double_deletes += 1;
            log::warn!("headless gl: deleting {} {} which is not live", kind.name(), id.0);
            return;
        }
        inner.lists.remove(&id);
        inner.compiled.remove(&id);
        inner.textures.remove(&id);
        inner.buffers.remove(&id);
    }

    fn push_attrib(&self, bits: u32) {
        self.inner.borrow_mut().submit(GlCommand::PushAttrib(bits));
    }

    fn pop_attrib(&self) {
        self.inner.borrow_mut().submit(GlCommand::PopAttrib);
    }

    fn attrib_stack_depth(&self) -> usize {
        self.inner.borrow().attribs.len()
    }

    fn matrix_mode(&self, mode: MatrixMode) {
        self.inner.borrow_mut().submit(GlCommand::MatrixMode(mode));
    }

    fn push_matrix(&self) {
        self.inner.borrow_mut().submit(GlCommand::PushMatrix);
    }

    fn pop_matrix(&self) {
        self.inner.borrow_mut().submit(GlCommand::PopMatrix);
    }

    fn matrix_stack_depth(&self, mode: MatrixMode) -> usize {
        self.inner.borrow().matrices[mode.index()].len()
    }

    fn load_identity(&self) {
        self.inner.borrow_mut().submit(GlCommand::LoadIdentity);
    }

    fn load_matrix(&self, m: &Mat4) {
        self.inner.borrow_mut().submit(GlCommand::LoadMatrix(*m));
    }

    fn mult_matrix(&self, m: &Mat4) {
        self.inner.borrow_mut().submit(GlCommand::MultMatrix(*m));
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.inner
            .borrow_mut()
            .submit(GlCommand::Scissor([x, y, width, height]));
    }

    fn new_list(&self, id: GlId) {
        let mut inner = self.inner.borrow_mut();
        if inner.recording.is_some() {
            inner.error(format!("glNewList({}): GL_INVALID_OPERATION", id.0));
            return;
        }
        inner.recording = Some((id, Vec::new()));
    }

    fn end_list(&self) {
        let mut inner = self.inner.borrow_mut();
        match inner.recording.take() {
            Some((id, commands)) => {
                if inner.live.contains_key(&id) {
                    inner.lists.insert(id, commands);
                }
            }
            None => inner.error("glEndList: GL_INVALID_OPERATION".to_string()),
        }
    }

    fn call_list(&self, id: GlId) {
        self.inner.borrow_mut().submit(GlCommand::CallList(id));
    }

    fn apply_mode_state(&self, state: &ModeState) {
        self.inner.borrow_mut().submit(GlCommand::ModeState(*state));
    }

    fn apply_material(&self, params: &MaterialParams) {
        self.inner.borrow_mut().submit(GlCommand::Material(*params));
    }

    fn use_program(&self, program: GlId) {
        self.inner.borrow_mut().submit(GlCommand::UseProgram(program));
    }

    fn compile_shader(&self, shader: GlId, stage: ShaderStage, source: &str) -> Result<(), String> {
        let mut inner = self.inner.borrow_mut();
        let ok = !source.trim().is_empty() && !source.contains("#error");
        inner.compiled.insert(shader, ok);
        if ok {
            Ok(())
        } else {
            Err(format!("0:1: {} shader failed to compile", stage.name()))
        }
    }

    fn link_program(&self, program: GlId, shaders: &[GlId]) -> Result<(), String> {
        let inner = self.inner.borrow();
        if !inner.live.contains_key(&program) {
            return Err(format!("program {} is not live", program.0));
        }
        if shaders.is_empty() {
            return Err("no shaders attached".to_string());
        }
        if shaders
            .iter()
            .any(|s| !inner.compiled.get(s).copied().unwrap_or(false))
        {
            return Err("attached shader is not compiled".to_string());
        }
        Ok(())
    }

    fn tex_image_2d(&self, texture: GlId, width: u32, height: u32, _pixels: Option<&[u8]>) {
        self.inner
            .borrow_mut()
            .textures
            .insert(texture, (width, height));
    }

    fn renderbuffer_storage(&self, rbo: GlId, _format: u32, width: u32, height: u32) {
        self.inner.borrow_mut().textures.insert(rbo, (width, height));
    }

    fn buffer_data(&self, buffer: GlId, data: &[u8]) {
        self.inner.borrow_mut().buffers.insert(buffer, data.len());
    }

    fn framebuffer_attach(&self, fbo: GlId, _attachment: u32, target: GlId) {
        let mut inner = self.inner.borrow_mut();
        if !inner.live.contains_key(&fbo) || (target.is_valid() && !inner.live.contains_key(&target)) {
            inner.error(format!("glFramebufferTexture({}): GL_INVALID_OPERATION", fbo.0));
        }
    }

    fn release_context(&self) {
        let mut inner = self.inner.borrow_mut();
        let leaked = inner.live.len();
        if leaked > 0 {
            log::warn!("headless gl: {} objects still live at context release", leaked);
        }
        let errors = std::mem::take(&mut inner.errors);
        let double_deletes = inner.double_deletes;
        *inner = Inner::new();
        inner.errors = errors;
        inner.double_deletes = double_deletes;
        inner.leaked += leaked;
    }
}
