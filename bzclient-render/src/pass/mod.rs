//! OpenGL Pass State
//!
//! Brackets each of the eight draw phases so every event client starts from
//! the same GL state, and keeps the attribute and matrix stacks balanced
//! across clients that share them.
//!
//! A pass runs as `enable_phase` -> client -> `reset_phase` -> client ... ->
//! `disable_phase`. Enabling pushes one attribute level, calls the phase's
//! precompiled state list and loads the phase matrices; resetting pops back to
//! depth 0 and does it again; disabling unwinds everything.
//!
//! Clients push and pop attributes through [`PassState::push_attrib`] and
//! [`PassState::pop_attrib`], which keep a depth counter within
//! `[min, max]`. While a display list is being recorded the pushes only
//! accumulate into a [`StackEffect`]; calling the list later checks the whole
//! effect against the current depth before it runs.

pub mod view;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bzclient_core::{DrawPhase, PassBracket};

use crate::context::ContextResource;
use crate::error::PassStateError;
use crate::gl::matrix::{self, Mat4};
use crate::gl::{GlApi, GlId, ModeState, MatrixMode, ObjectKind, ShadowSettings, ALL_ATTRIB_BITS};

pub use view::{RadarView, ScreenConfig, ViewSetup, WindowGeometry};

/// Default upper bound of the client-visible attribute stack.
pub const DEFAULT_MAX_ATTRIB_DEPTH: i32 = 16;

/// What running a display list does to the attribute stack, relative to the
/// depth it is called at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackEffect {
    pub end: i32,
    pub min: i32,
    pub max: i32,
}

impl StackEffect {
    fn push(&mut self) {
        self.end += 1;
        self.max = self.max.max(self.end);
    }

    fn pop(&mut self) {
        self.end -= 1;
        self.min = self.min.min(self.end);
    }

    /// Effect of running `inner` after `self`.
    fn then(self, inner: StackEffect) -> StackEffect {
        StackEffect {
            end: self.end + inner.end,
            min: self.min.min(self.end + inner.min),
            max: self.max.max(self.end + inner.max),
        }
    }
}

pub struct PassState {
    gl: Rc<dyn GlApi>,

    draw_mode: Cell<Option<DrawPhase>>,
    drawing_enabled: Cell<bool>,
    creating_list: Cell<bool>,
    old_drawing_enabled: Cell<bool>,
    recording: Cell<StackEffect>,

    attrib_depth: Cell<i32>,
    min_attrib_depth: Cell<i32>,
    max_attrib_depth: Cell<i32>,
    low_water: Cell<i32>,
    high_water: Cell<i32>,

    matrix_mode: Cell<MatrixMode>,
    matrix_depth: Cell<[usize; 3]>,

    state_lists: Cell<[GlId; DrawPhase::COUNT]>,
    shadows: Cell<ShadowSettings>,
    view: RefCell<ViewSetup>,
}

impl PassState {
    /// The state lists are not built until [`ContextResource::init_context`]
    /// runs.
    pub fn new(gl: Rc<dyn GlApi>) -> Self {
        Self {
            gl,
            draw_mode: Cell::new(None),
            drawing_enabled: Cell::new(false),
            creating_list: Cell::new(false),
            old_drawing_enabled: Cell::new(false),
            recording: Cell::new(StackEffect::default()),
            attrib_depth: Cell::new(0),
            min_attrib_depth: Cell::new(0),
            max_attrib_depth: Cell::new(DEFAULT_MAX_ATTRIB_DEPTH),
            low_water: Cell::new(0),
            high_water: Cell::new(0),
            matrix_mode: Cell::new(MatrixMode::ModelView),
            matrix_depth: Cell::new([1; 3]),
            state_lists: Cell::new([GlId::INVALID; DrawPhase::COUNT]),
            shadows: Cell::new(ShadowSettings::default()),
            view: RefCell::new(ViewSetup::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn draw_mode(&self) -> Option<DrawPhase> {
        self.draw_mode.get()
    }

    pub fn draw_mode_name(&self) -> &'static str {
        self.draw_mode.get().map_or("none", DrawPhase::name)
    }

    pub fn drawing_enabled(&self) -> bool {
        self.drawing_enabled.get()
    }

    pub fn creating_list(&self) -> bool {
        self.creating_list.get()
    }

    pub fn attrib_depth(&self) -> i32 {
        self.attrib_depth.get()
    }

    pub fn attrib_bounds(&self) -> (i32, i32) {
        (self.min_attrib_depth.get(), self.max_attrib_depth.get())
    }

    pub fn set_max_attrib_depth(&self, max: i32) {
        self.max_attrib_depth.set(max.max(self.min_attrib_depth.get()));
    }

    /// Lowest and highest depth reached since the last reset.
    pub fn water_marks(&self) -> (i32, i32) {
        (self.low_water.get(), self.high_water.get())
    }

    pub fn reset_water_marks(&self) {
        let depth = self.attrib_depth.get();
        self.low_water.set(depth);
        self.high_water.set(depth);
    }

    pub fn current_matrix_mode(&self) -> MatrixMode {
        self.matrix_mode.get()
    }

    pub fn matrix_depth(&self, mode: MatrixMode) -> usize {
        self.matrix_depth.get()[mode.index()]
    }

    pub fn state_list(&self, phase: DrawPhase) -> GlId {
        self.state_lists.get()[phase.index()]
    }

    pub fn shadow_settings(&self) -> ShadowSettings {
        self.shadows.get()
    }

    pub fn view(&self) -> ViewSetup {
        *self.view.borrow()
    }

    // -----------------------------------------------------------------------
    // Scene setup
    // -----------------------------------------------------------------------

    pub fn config_screen(&self, width: f32, distance: f32) {
        let mut view = self.view.borrow_mut();
        view.screen = ScreenConfig { width, distance };
    }

    pub fn set_window(&self, window: WindowGeometry) {
        self.view.borrow_mut().window = window;
    }

    pub fn set_world_matrices(&self, projection: Mat4, view_matrix: Mat4, deep_projection: Mat4) {
        let mut view = self.view.borrow_mut();
        view.world_projection = projection;
        view.world_view = view_matrix;
        view.deep_projection = deep_projection;
    }

    pub fn set_shadow_matrix(&self, shadow: Mat4) {
        self.view.borrow_mut().shadow_matrix = shadow;
    }

    pub fn set_radar(&self, radar: RadarView) {
        self.view.borrow_mut().radar = radar;
    }

    /// Change the shadow mode. Built state lists are rebuilt to match.
    pub fn set_shadow_settings(&self, shadows: ShadowSettings) {
        if self.shadows.replace(shadows) == shadows {
            return;
        }
        if self.state_lists.get().iter().any(|id| id.is_valid()) {
            log::debug!("shadow settings changed, rebuilding pass state lists");
            self.free_context();
            self.init_context();
        }
    }

    // -----------------------------------------------------------------------
    // Attribute stack
    // -----------------------------------------------------------------------

    pub fn try_attrib_stack_change(&self, change: i32) -> Result<(), PassStateError> {
        let depth = self.attrib_depth.get();
        let result = depth + change;
        let (min, max) = self.attrib_bounds();
        if result < min {
            return Err(PassStateError::AttribUnderflow { depth, min });
        }
        if result > max {
            return Err(PassStateError::AttribOverflow { depth, max });
        }
        self.set_attrib_depth(result);
        Ok(())
    }

    /// Check that the depth stays inside the bounds through a sequence whose
    /// extremes are `min_change` and `max_change`, then apply `end_change`.
    pub fn try_attrib_stack_range_change(
        &self,
        end_change: i32,
        min_change: i32,
        max_change: i32,
    ) -> Result<(), PassStateError> {
        let depth = self.attrib_depth.get();
        let (min, max) = self.attrib_bounds();
        if depth + min_change < min {
            return Err(PassStateError::AttribUnderflow { depth, min });
        }
        if depth + max_change > max {
            return Err(PassStateError::AttribOverflow { depth, max });
        }
        self.try_attrib_stack_change(end_change)
    }

    fn set_attrib_depth(&self, depth: i32) {
        self.attrib_depth.set(depth);
        self.low_water.set(self.low_water.get().min(depth));
        self.high_water.set(self.high_water.get().max(depth));
    }

    pub fn push_attrib(&self, bits: u32) -> Result<(), PassStateError> {
        if self.creating_list.get() {
            let mut effect = self.recording.get();
            effect.push();
            self.recording.set(effect);
            self.gl.push_attrib(bits);
            return Ok(());
        }
        self.check_drawing()?;
        self.try_attrib_stack_change(1).inspect_err(|err| {
            log::error!("PushAttrib in {}: {}", self.draw_mode_name(), err);
        })?;
        self.gl.push_attrib(bits);
        Ok(())
    }

    pub fn pop_attrib(&self) -> Result<(), PassStateError> {
        if self.creating_list.get() {
            let mut effect = self.recording.get();
            effect.pop();
            self.recording.set(effect);
            self.gl.pop_attrib();
            return Ok(());
        }
        self.check_drawing()?;
        self.try_attrib_stack_change(-1).inspect_err(|err| {
            log::error!("PopAttrib in {}: {}", self.draw_mode_name(), err);
        })?;
        self.gl.pop_attrib();
        Ok(())
    }

    fn check_drawing(&self) -> Result<(), PassStateError> {
        if self.drawing_enabled.get() {
            Ok(())
        } else {
            Err(PassStateError::NotDrawing)
        }
    }

    // -----------------------------------------------------------------------
    // Matrix stacks
    // -----------------------------------------------------------------------

    pub fn matrix_mode(&self, mode: MatrixMode) -> Result<(), PassStateError> {
        self.check_drawing()?;
        self.matrix_mode.set(mode);
        self.gl.matrix_mode(mode);
        Ok(())
    }

    /// Matrix pushes recorded into a display list are not tracked.
    pub fn push_matrix(&self) -> Result<(), PassStateError> {
        self.check_drawing()?;
        if !self.creating_list.get() {
            let mode = self.matrix_mode.get();
            let mut depths = self.matrix_depth.get();
            if depths[mode.index()] >= mode.limit() {
                let err = PassStateError::MatrixOverflow {
                    mode,
                    limit: mode.limit(),
                };
                log::error!("PushMatrix in {}: {}", self.draw_mode_name(), err);
                return Err(err);
            }
            depths[mode.index()] += 1;
            self.matrix_depth.set(depths);
        }
        self.gl.push_matrix();
        Ok(())
    }

    pub fn pop_matrix(&self) -> Result<(), PassStateError> {
        self.check_drawing()?;
        if !self.creating_list.get() {
            let mode = self.matrix_mode.get();
            let mut depths = self.matrix_depth.get();
            if depths[mode.index()] <= 1 {
                let err = PassStateError::MatrixUnderflow { mode };
                log::error!("PopMatrix in {}: {}", self.draw_mode_name(), err);
                return Err(err);
            }
            depths[mode.index()] -= 1;
            self.matrix_depth.set(depths);
        }
        self.gl.pop_matrix();
        Ok(())
    }

    fn clear_matrix_stack(&self, mode: MatrixMode) {
        self.gl.matrix_mode(mode);
        for _ in 1..self.gl.matrix_stack_depth(mode) {
            self.gl.pop_matrix();
        }
        let mut depths = self.matrix_depth.get();
        depths[mode.index()] = 1;
        self.matrix_depth.set(depths);
    }

    fn reset_identity_matrices(&self) {
        for mode in [MatrixMode::Texture, MatrixMode::Projection, MatrixMode::ModelView] {
            self.clear_matrix_stack(mode);
            self.gl.load_identity();
        }
        self.matrix_mode.set(MatrixMode::ModelView);
    }

    fn reset_world_matrices(&self) {
        let view = self.view();
        self.clear_matrix_stack(MatrixMode::Texture);
        self.gl.load_identity();
        self.clear_matrix_stack(MatrixMode::Projection);
        self.gl.load_matrix(&view.world_projection);
        self.clear_matrix_stack(MatrixMode::ModelView);
        self.gl.load_matrix(&view.world_view);
        self.matrix_mode.set(MatrixMode::ModelView);
    }

    fn reset_world_shadow_matrices(&self) {
        self.reset_world_matrices();
        self.gl.mult_matrix(&self.view.borrow().shadow_matrix);
    }

    fn revert_shadow_matrices(&self) {
        let view = self.view();
        self.clear_matrix_stack(MatrixMode::Texture);
        self.gl.load_identity();
        self.clear_matrix_stack(MatrixMode::Projection);
        self.gl.load_matrix(&view.deep_projection);
        // the background renderer loads its own model-view
        self.clear_matrix_stack(MatrixMode::ModelView);
        self.matrix_mode.set(MatrixMode::ModelView);
    }

    fn reset_screen_matrices(&self) {
        self.reset_identity_matrices();
        let (projection, model_view) = self.view.borrow().screen_matrices();
        self.gl.matrix_mode(MatrixMode::Projection);
        self.gl.mult_matrix(&projection);
        self.gl.matrix_mode(MatrixMode::ModelView);
        self.gl.mult_matrix(&model_view);
    }

    fn revert_screen_matrices(&self) {
        self.clear_matrix_stack(MatrixMode::Texture);
        self.gl.load_identity();
        self.clear_matrix_stack(MatrixMode::Projection);
        self.gl.load_identity();
        self.gl.mult_matrix(&matrix::ortho_2d(0.0, 1.0, 0.0, 1.0));
        self.clear_matrix_stack(MatrixMode::ModelView);
        self.gl.load_identity();
        self.matrix_mode.set(MatrixMode::ModelView);
    }

    fn reset_radar_matrices(&self) {
        self.reset_identity_matrices();
        self.gl.mult_matrix(&self.view.borrow().radar.transform);
    }

    /// Matrices a client of `phase` starts from.
    fn apply_phase_matrices(&self, phase: DrawPhase) {
        match phase {
            DrawPhase::Genesis
            | DrawPhase::WorldStart
            | DrawPhase::World
            | DrawPhase::WorldAlpha => self.reset_world_matrices(),
            DrawPhase::WorldShadow => self.reset_world_shadow_matrices(),
            DrawPhase::ScreenStart | DrawPhase::Screen => self.reset_screen_matrices(),
            DrawPhase::Radar => self.reset_radar_matrices(),
        }
    }

    /// Matrices left behind when `phase` ends.
    fn revert_phase_matrices(&self, phase: DrawPhase) {
        match phase {
            DrawPhase::Genesis => self.reset_identity_matrices(),
            DrawPhase::WorldStart | DrawPhase::World | DrawPhase::WorldAlpha => {
                self.reset_world_matrices()
            }
            DrawPhase::WorldShadow => self.revert_shadow_matrices(),
            DrawPhase::ScreenStart | DrawPhase::Screen => self.revert_screen_matrices(),
            DrawPhase::Radar => self.reset_screen_matrices(),
        }
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    /// Log stacks that are not where a pass expects them. Returns `false` if
    /// any is off.
    fn check_stack_depths(&self, name: &str) -> bool {
        let mut ok = true;
        for mode in MatrixMode::ALL {
            let depth = self.gl.matrix_stack_depth(mode);
            if depth != 1 {
                log::error!("{}_STACK_DEPTH for {} at {}", mode.name(), name, depth);
                ok = false;
            }
        }
        let depth = self.gl.attrib_stack_depth();
        if depth != 0 {
            log::error!("GL_ATTRIB_STACK_DEPTH for {} at {}", name, depth);
            ok = false;
        }
        ok
    }

    fn execute_attrib_stack(&self, target: usize) {
        for _ in target..self.gl.attrib_stack_depth() {
            self.gl.pop_attrib();
        }
    }

    fn apply_scissor(&self, phase: DrawPhase) {
        let view = self.view.borrow();
        let [x, y, w, h] = match phase {
            DrawPhase::Radar => view.radar.scissor,
            _ => view.window.main_scissor(),
        };
        self.gl.scissor(x, y, w, h);
    }

    fn reset_state(&self, phase: DrawPhase) {
        self.execute_attrib_stack(0);
        self.gl.push_attrib(ALL_ATTRIB_BITS);
        self.attrib_depth.set(1);
        self.reset_water_marks();
        self.gl.call_list(self.state_list(phase));
    }

    pub fn enable_phase(&self, phase: DrawPhase) -> Result<(), PassStateError> {
        self.check_stack_depths(phase.name());
        if let Some(active) = self.draw_mode.get() {
            return Err(PassStateError::PhaseActive {
                active,
                requested: phase,
            });
        }
        log::debug!("enabling {}", phase.name());
        self.draw_mode.set(Some(phase));
        self.drawing_enabled.set(true);

        self.apply_scissor(phase);
        self.reset_state(phase);
        self.apply_phase_matrices(phase);
        Ok(())
    }

    pub fn reset_phase(&self, phase: DrawPhase) -> Result<(), PassStateError> {
        self.expect_phase(phase)?;
        self.apply_phase_matrices(phase);
        self.reset_state(phase);
        self.apply_scissor(phase);
        Ok(())
    }

    pub fn disable_phase(&self, phase: DrawPhase) -> Result<(), PassStateError> {
        self.expect_phase(phase)?;
        self.revert_phase_matrices(phase);
        self.draw_mode.set(None);
        self.drawing_enabled.set(false);
        self.execute_attrib_stack(0);
        self.attrib_depth.set(0);
        self.gl.use_program(GlId::INVALID);
        log::debug!("disabled {}", phase.name());
        Ok(())
    }

    fn expect_phase(&self, phase: DrawPhase) -> Result<(), PassStateError> {
        match self.draw_mode.get() {
            Some(active) if active == phase => Ok(()),
            active => Err(PassStateError::WrongPhase {
                requested: phase,
                active,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Display lists
    // -----------------------------------------------------------------------

    /// Start recording into `list`. Drawing is enabled while recording so
    /// list contents can be built outside a pass.
    pub fn new_list(&self, list: GlId) -> Result<(), PassStateError> {
        if self.creating_list.get() {
            return Err(PassStateError::ListInProgress);
        }
        if !list.is_valid() {
            return Err(PassStateError::InvalidList);
        }
        self.old_drawing_enabled.set(self.drawing_enabled.get());
        self.drawing_enabled.set(true);
        self.creating_list.set(true);
        self.recording.set(StackEffect::default());
        self.gl.new_list(list);
        Ok(())
    }

    /// Finish recording and return what the list does to the attribute stack.
    pub fn end_list(&self) -> Result<StackEffect, PassStateError> {
        if !self.creating_list.get() {
            return Err(PassStateError::NoListOpen);
        }
        self.gl.end_list();
        self.drawing_enabled.set(self.old_drawing_enabled.get());
        self.creating_list.set(false);
        Ok(self.recording.replace(StackEffect::default()))
    }

    /// Run `list`, refusing if its stack effect would leave the bounds.
    pub fn call_list(&self, list: GlId, effect: StackEffect) -> Result<(), PassStateError> {
        if !list.is_valid() {
            return Err(PassStateError::InvalidList);
        }
        if self.creating_list.get() {
            self.recording.set(self.recording.get().then(effect));
            self.gl.call_list(list);
            return Ok(());
        }
        self.check_drawing()?;
        self.try_attrib_stack_range_change(effect.end, effect.min, effect.max)
            .inspect_err(|err| log::error!("CallList in {}: {}", self.draw_mode_name(), err))?;
        self.gl.call_list(list);
        Ok(())
    }
}

impl PassBracket for PassState {
    fn enable(&self, phase: DrawPhase) -> anyhow::Result<()> {
        Ok(self.enable_phase(phase)?)
    }

    fn reset(&self, phase: DrawPhase) -> anyhow::Result<()> {
        Ok(self.reset_phase(phase)?)
    }

    fn disable(&self, phase: DrawPhase) -> anyhow::Result<()> {
        Ok(self.disable_phase(phase)?)
    }
}

impl ContextResource for PassState {
    fn free_context(&self) {
        let mut lists = self.state_lists.get();
        for id in lists.iter_mut().filter(|id| id.is_valid()) {
            self.gl.delete_object(ObjectKind::DisplayList, *id);
            *id = GlId::INVALID;
        }
        self.state_lists.set(lists);
    }

    // Phases whose list survived are left alone.
    fn init_context(&self) {
        let shadows = self.shadows.get();
        let mut lists = self.state_lists.get();
        for phase in DrawPhase::ALL {
            if lists[phase.index()].is_valid() {
                continue;
            }
            let id = self.gl.gen_object(ObjectKind::DisplayList);
            self.gl.new_list(id);
            self.gl.apply_mode_state(&ModeState::for_phase(phase, &shadows));
            self.gl.end_list();
            lists[phase.index()] = id;
        }
        self.state_lists.set(lists);
    }
}
