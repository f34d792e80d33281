// Fixed-function state blocks the pass state compiles into display lists.

use bzclient_core::DrawPhase;
use serde::{Deserialize, Serialize};

/// How shadows are drawn. Changing it rebuilds the per-phase state lists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub stencil_shadows: bool,
    pub shadow_alpha: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            stencil_shadows: false,
            shadow_alpha: 0.5,
        }
    }
}

/// The GL state every draw pass starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeState {
    pub depth_test: bool,
    pub depth_mask: bool,
    pub blend: bool,
    pub cull_face: bool,
    pub lighting: bool,
    pub fog: bool,
    pub stencil_test: bool,
    pub polygon_stipple: bool,
    pub scissor_test: bool,
    pub color: [f32; 4],
}

impl ModeState {
    pub fn for_phase(phase: DrawPhase, shadows: &ShadowSettings) -> Self {
        use DrawPhase::*;

        let shadow = phase == WorldShadow;
        let color = match (shadow, shadows.stencil_shadows) {
            (false, _) => [1.0, 1.0, 1.0, 1.0],
            (true, true) => [0.0, 0.0, 0.0, shadows.shadow_alpha],
            (true, false) => [0.0, 0.0, 0.0, 1.0],
        };
        Self {
            depth_test: phase.is_world(),
            depth_mask: matches!(phase, WorldStart | World),
            blend: !matches!(phase, WorldStart | World | WorldShadow),
            cull_face: matches!(phase, WorldStart | World | WorldAlpha),
            lighting: matches!(phase, WorldStart | World | WorldAlpha),
            fog: phase.is_world(),
            stencil_test: shadow && shadows.stencil_shadows,
            polygon_stipple: shadow && !shadows.stencil_shadows,
            scissor_test: true,
            color,
        }
    }
}

/// Front-and-back material colors, as `glMaterialfv` takes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emission: [f32; 4],
    pub shininess: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2, 1.0],
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            emission: [0.0, 0.0, 0.0, 1.0],
            shininess: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_phases_test_depth() {
        let shadows = ShadowSettings::default();
        for phase in DrawPhase::ALL {
            let state = ModeState::for_phase(phase, &shadows);
            assert_eq!(state.depth_test, phase.is_world(), "{}", phase.name());
            assert_eq!(state.fog, phase.is_world());
            assert!(state.scissor_test);
        }
    }

    #[test]
    fn depth_writes_and_blending() {
        let shadows = ShadowSettings::default();
        let world = ModeState::for_phase(DrawPhase::World, &shadows);
        assert!(world.depth_mask && !world.blend && world.cull_face && world.lighting);

        let alpha = ModeState::for_phase(DrawPhase::WorldAlpha, &shadows);
        assert!(!alpha.depth_mask && alpha.blend && alpha.cull_face);

        let screen = ModeState::for_phase(DrawPhase::Screen, &shadows);
        assert!(screen.blend && !screen.lighting && !screen.cull_face);
    }

    #[test]
    fn shadow_phase_follows_shadow_mode() {
        let stipple = ModeState::for_phase(DrawPhase::WorldShadow, &ShadowSettings::default());
        assert!(!stipple.stencil_test && stipple.polygon_stipple);
        assert_eq!(stipple.color, [0.0, 0.0, 0.0, 1.0]);

        let stencil = ModeState::for_phase(
            DrawPhase::WorldShadow,
            &ShadowSettings {
                stencil_shadows: true,
                shadow_alpha: 0.25,
            },
        );
        assert!(stencil.stencil_test && !stencil.polygon_stipple);
        assert_eq!(stencil.color, [0.0, 0.0, 0.0, 0.25]);
    }
}
