/// Column-major 4x4 matrix, laid out the way `glLoadMatrixf` expects.
pub type Mat4 = [f32; 16];

pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// `a * b`, both column-major.
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
        }
    }
    out
}

/// Same matrix `glFrustum` builds.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let mut m = [0.0; 16];
    m[0] = (2.0 * near) / (right - left);
    m[5] = (2.0 * near) / (top - bottom);
    m[8] = (right + left) / (right - left);
    m[9] = (top + bottom) / (top - bottom);
    m[10] = -(far + near) / (far - near);
    m[11] = -1.0;
    m[14] = -(2.0 * far * near) / (far - near);
    m
}

/// Same matrix `gluOrtho2D` builds (near -1, far 1).
pub fn ortho_2d(left: f32, right: f32, bottom: f32, top: f32) -> Mat4 {
    let mut m = IDENTITY;
    m[0] = 2.0 / (right - left);
    m[5] = 2.0 / (top - bottom);
    m[10] = -1.0;
    m[12] = -(right + left) / (right - left);
    m[13] = -(top + bottom) / (top - bottom);
    m
}

pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    let mut m = IDENTITY;
    m[12] = x;
    m[13] = y;
    m[14] = z;
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_neutral() {
        let t = translation(1.0, 2.0, 3.0);
        assert_eq!(multiply(&IDENTITY, &t), t);
        assert_eq!(multiply(&t, &IDENTITY), t);
    }

    #[test]
    fn translations_compose() {
        let m = multiply(&translation(1.0, 0.0, 0.0), &translation(0.0, 2.0, -1.0));
        assert_eq!(m, translation(1.0, 2.0, -1.0));
    }

    #[test]
    fn ortho_unit_square() {
        let m = ortho_2d(0.0, 1.0, 0.0, 1.0);
        assert_eq!(m[0], 2.0);
        assert_eq!(m[5], 2.0);
        assert_eq!(m[12], -1.0);
        assert_eq!(m[13], -1.0);
    }
}
