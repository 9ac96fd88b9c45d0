//! Math utilities and types
//!
//! Provides the vector/matrix aliases used by the shading kernels together
//! with the small set of shading-language intrinsics (`saturate`,
//! `smoothstep`, `mix`, `fract`) the kernels are written in terms of.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Clamp into `[0, 1]`
pub fn saturate(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Per-component [`saturate`]
pub fn saturate_vec3(value: Vec3) -> Vec3 {
    value.map(saturate)
}

/// Hermite interpolation between `edge0` and `edge1`
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = saturate((x - edge0) / (edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation between vectors
pub fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Fractional part, always in `[0, 1)` (matches `fract`, not `f32::fract`)
pub fn frac(value: f32) -> f32 {
    value - value.floor()
}

/// Per-component [`frac`]
pub fn frac_vec2(value: Vec2) -> Vec2 {
    value.map(frac)
}

/// Transform a normal by the upper 3x3 of `world` and renormalize
pub fn transform_normal(normal: &Vec3, world: &Mat4) -> Vec3 {
    world.transform_vector(normal).normalize()
}

/// Transform a point by an affine matrix, ignoring the projective row
pub fn transform_position(position: &Vec3, matrix: &Mat4) -> Vec3 {
    (matrix * position.push(1.0)).xyz()
}

/// Signed distance of `position` to `plane` when enabled, `1.0` otherwise
pub fn clip_distance(position: &Vec3, plane: &Vec4, enabled: bool) -> f32 {
    if enabled {
        plane.dot(&position.push(1.0))
    } else {
        1.0
    }
}

/// Convert a matrix to the column-major array layout used in GPU blocks
pub fn mat4_to_gpu(matrix: &Mat4) -> [[f32; 4]; 4] {
    (*matrix).into()
}

/// Convert a column-major GPU array back into a matrix
pub fn mat4_from_gpu(columns: &[[f32; 4]; 4]) -> Mat4 {
    Mat4::from(*columns)
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a right-handed perspective projection with depth mapped to `[0, 1]`
    fn perspective_zo(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed off-center orthographic projection with depth mapped to `[0, 1]`
    fn orthographic_off_center_zo(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4;

    /// The camera's world-space right vector, taken from the first row of a view matrix
    fn view_right(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn perspective_zo(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = near * far / (near - far);
        result[(3, 2)] = -1.0;
        result
    }

    fn orthographic_off_center_zo(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (top - bottom);
        result[(2, 2)] = 1.0 / (near - far);
        result[(0, 3)] = (left + right) / (left - right);
        result[(1, 3)] = (top + bottom) / (bottom - top);
        result[(2, 3)] = near / (near - far);
        result
    }

    fn look_at(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(*eye), &Point3::from(*target), up)
    }

    fn view_right(&self) -> Vec3 {
        Vec3::new(self[(0, 0)], self[(0, 1)], self[(0, 2)])
    }
}
