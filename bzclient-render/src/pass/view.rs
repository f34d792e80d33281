// Window geometry and the matrices each draw phase starts from.

use serde::{Deserialize, Serialize};

use crate::gl::matrix::{self, Mat4, IDENTITY};

/// Physical screen size used to build the screen-space frustum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Screen width in meters.
    pub width: f32,
    /// Eye-to-screen distance in meters.
    pub distance: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 0.36,
            distance: 0.60,
        }
    }
}

/// Where the main window sits on the display, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub display_width: i32,
    pub display_height: i32,
    /// Window position with a top-left display origin.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Origin of the 3D view inside the window.
    pub origin_x: i32,
    pub origin_y: i32,
    /// Height of the 3D view; the rest of the window is panels.
    pub view_height: i32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            display_width: 1024,
            display_height: 768,
            x: 0,
            y: 0,
            width: 1024,
            height: 768,
            origin_x: 0,
            origin_y: 0,
            view_height: 768,
        }
    }
}

impl WindowGeometry {
    /// Scissor box covering the 3D view.
    pub fn main_scissor(&self) -> [i32; 4] {
        let y_offset = self.height - self.view_height;
        [
            self.origin_x,
            self.origin_y + y_offset,
            self.width,
            self.view_height,
        ]
    }
}

/// Radar placement supplied by the radar renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarView {
    pub transform: Mat4,
    pub scissor: [i32; 4],
}

impl Default for RadarView {
    fn default() -> Self {
        Self {
            transform: IDENTITY,
            scissor: [0, 0, 0, 0],
        }
    }
}

/// Scene-supplied matrices plus the screen setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSetup {
    pub world_projection: Mat4,
    pub world_view: Mat4,
    /// Projection with a far plane pushed out for shadow volumes.
    pub deep_projection: Mat4,
    pub shadow_matrix: Mat4,
    pub window: WindowGeometry,
    pub screen: ScreenConfig,
    pub radar: RadarView,
}

impl ViewSetup {
    pub fn new() -> Self {
        Self {
            world_projection: IDENTITY,
            world_view: IDENTITY,
            deep_projection: IDENTITY,
            shadow_matrix: IDENTITY,
            window: WindowGeometry::default(),
            screen: ScreenConfig::default(),
            radar: RadarView::default(),
        }
    }

    /// Projection and model-view for screen drawing.
    ///
    /// The frustum puts the eye `screen.distance` meters in front of the
    /// display's center, so a window that is not centered sees the screen
    /// plane off-axis. The model-view moves the origin onto the screen plane
    /// at the window's bottom-left corner, one unit per pixel.
    pub fn screen_matrices(&self) -> (Mat4, Mat4) {
        let w = &self.window;
        let flipped_y = w.display_height - (w.y + w.height);

        let half_sx = 0.5 * w.display_width as f32;
        let half_sy = 0.5 * w.display_height as f32;
        let wppx = (w.origin_x + w.x) as f32;
        let wppy = (w.origin_y + flipped_y) as f32;

        let zplane = self.screen.distance * (w.display_width as f32 / self.screen.width);
        let znear = zplane * 0.5;
        let zfar = zplane * 2.0;
        let factor = znear / zplane;
        let left = (wppx - half_sx) * factor;
        let bottom = (wppy - half_sy) * factor;
        let right = ((wppx + w.width as f32) - half_sx) * factor;
        let top = ((wppy + w.height as f32) - half_sy) * factor;

        let projection = matrix::frustum(left, right, bottom, top, znear, zfar);
        let dist_adj = zplane / znear;
        let model_view = matrix::translation(left * dist_adj, bottom * dist_adj, -zplane);
        (projection, model_view)
    }
}

impl Default for ViewSetup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scissor_skips_the_panel_area() {
        let w = WindowGeometry {
            height: 800,
            view_height: 600,
            ..WindowGeometry::default()
        };
        assert_eq!(w.main_scissor(), [0, 200, 1024, 600]);
    }

    #[test]
    fn fullscreen_window_puts_origin_at_bottom_left() {
        let view = ViewSetup::new();
        let (projection, model_view) = view.screen_matrices();
        let zplane = 0.60 * (1024.0 / 0.36);
        assert!((model_view[14] + zplane).abs() < 1e-3);
        assert!((model_view[12] + 512.0).abs() < 1e-3);
        assert!((model_view[13] + 384.0).abs() < 1e-3);
        // symmetric frustum for a centered window
        assert!(projection[8].abs() < 1e-6);
        assert!(projection[9].abs() < 1e-6);
        assert_eq!(projection[11], -1.0);
    }
}
