//! Constant buffer layouts shared with the GLSL side
//!
//! Every block is `#[repr(C)]` with explicit padding so that its byte layout
//! matches std140 exactly and it can be uploaded with `bytemuck::bytes_of`.
//! Matrices are stored column-major. Booleans are 32-bit (`0` or `1`).

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{mat4_from_gpu, mat4_to_gpu, Mat4, Vec2, Vec3, Vec4};

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Per-frame constants visible to every stage (set 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobalConstants {
    /// Camera position in world space
    pub camera_position: [f32; 3],
    /// Seconds since the game started
    pub time_in_seconds: f32,
    /// World to clip transform
    pub view_projection: [[f32; 4]; 4],
    /// First user clipping plane (xyz normal, w distance)
    pub clipping_plane1: [f32; 4],
    /// Second user clipping plane
    pub clipping_plane2: [f32; 4],
    /// Whether `clipping_plane1` is active
    pub has_clipping_plane1: u32,
    /// Whether `clipping_plane2` is active
    pub has_clipping_plane2: u32,
    /// Render target size in pixels
    pub viewport_size: [f32; 2],
}

impl Default for GlobalConstants {
    fn default() -> Self {
        Self {
            camera_position: [0.0; 3],
            time_in_seconds: 0.0,
            view_projection: IDENTITY,
            clipping_plane1: [0.0; 4],
            clipping_plane2: [0.0; 4],
            has_clipping_plane1: 0,
            has_clipping_plane2: 0,
            viewport_size: [800.0, 600.0],
        }
    }
}

impl GlobalConstants {
    /// Camera position as a vector
    pub fn camera_position(&self) -> Vec3 {
        Vec3::from(self.camera_position)
    }

    /// View-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        mat4_from_gpu(&self.view_projection)
    }

    /// Set the view-projection matrix
    pub fn set_view_projection(&mut self, matrix: &Mat4) {
        self.view_projection = mat4_to_gpu(matrix);
    }

    /// Clipping planes paired with their enable flags
    pub fn clipping_planes(&self) -> [(Vec4, bool); 2] {
        [
            (Vec4::from(self.clipping_plane1), self.has_clipping_plane1 != 0),
            (Vec4::from(self.clipping_plane2), self.has_clipping_plane2 != 0),
        ]
    }

    /// Enable or disable a clipping plane (`index` 0 or 1)
    pub fn set_clipping_plane(&mut self, index: usize, plane: Option<Vec4>) {
        let (slot, flag) = match index {
            0 => (&mut self.clipping_plane1, &mut self.has_clipping_plane1),
            _ => (&mut self.clipping_plane2, &mut self.has_clipping_plane2),
        };
        match plane {
            Some(plane) => {
                *slot = plane.into();
                *flag = 1;
            }
            None => {
                *slot = [0.0; 4];
                *flag = 0;
            }
        }
    }
}

/// One directional light; each vec3 occupies a full 16-byte slot
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Default)]
pub struct Light {
    /// Ambient contribution
    pub ambient: [f32; 3],
    /// std140 padding
    pub _padding0: f32,
    /// Diffuse and specular colour
    pub color: [f32; 3],
    /// std140 padding
    pub _padding1: f32,
    /// Direction the light travels (from the light towards the scene)
    pub direction: [f32; 3],
    /// std140 padding
    pub _padding2: f32,
}

impl Light {
    /// Size of one light in bytes
    pub const SIZE_IN_BYTES: usize = 48;

    /// Build a light from vectors
    pub fn new(ambient: Vec3, color: Vec3, direction: Vec3) -> Self {
        Self {
            ambient: ambient.into(),
            color: color.into(),
            direction: direction.into(),
            ..Self::default()
        }
    }

    /// Ambient colour
    pub fn ambient(&self) -> Vec3 {
        Vec3::from(self.ambient)
    }

    /// Light colour
    pub fn color(&self) -> Vec3 {
        Vec3::from(self.color)
    }

    /// Direction of travel
    pub fn direction(&self) -> Vec3 {
        Vec3::from(self.direction)
    }
}

/// Number of directional lights every lighting block carries
pub const NUM_LIGHTS: usize = 3;

/// Fragment-stage lighting block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Default)]
pub struct LightingConstantsPS {
    /// The three directional lights; light 0 is the shadow caster
    pub lights: [Light; NUM_LIGHTS],
}

/// Vertex-stage lighting block carrying the cloud projection
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightingConstantsVS {
    /// World to cloud-shadow space
    pub cloud_shadow_matrix: [[f32; 4]; 4],
}

impl Default for LightingConstantsVS {
    fn default() -> Self {
        Self { cloud_shadow_matrix: IDENTITY }
    }
}

impl LightingConstantsVS {
    /// Cloud shadow matrix
    pub fn cloud_shadow_matrix(&self) -> Mat4 {
        mat4_from_gpu(&self.cloud_shadow_matrix)
    }
}

/// Cascaded shadow constants for the fragment stage
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowConstantsPS {
    /// World to global shadow UV space
    pub shadow_matrix: [[f32; 4]; 4],
    /// View-space far distance of each cascade
    pub cascade_splits: [f32; 4],
    /// Per-cascade offset from global shadow space (xyz)
    pub cascade_offsets: [[f32; 4]; 4],
    /// Per-cascade scale from global shadow space (xyz)
    pub cascade_scales: [[f32; 4]; 4],
    /// Receiver depth bias
    pub bias: f32,
    /// Normal-offset scale
    pub offset_scale: f32,
    /// Tint cascades for debugging
    pub visualize_cascades: u32,
    /// Blend between neighbouring cascades near the split
    pub filter_across_cascades: u32,
    /// Distance where shadows finish fading out
    pub shadow_distance: f32,
    /// Raw [`crate::render::shadows::ShadowsType`]
    pub shadows_type: u32,
    /// Number of cascades in use
    pub num_splits: u32,
    /// std140 padding
    pub _padding: f32,
}

impl Default for ShadowConstantsPS {
    fn default() -> Self {
        Self {
            shadow_matrix: IDENTITY,
            cascade_splits: [0.0; 4],
            cascade_offsets: [[0.0; 4]; 4],
            cascade_scales: [[1.0; 4]; 4],
            bias: 0.0,
            offset_scale: 0.0,
            visualize_cascades: 0,
            filter_across_cascades: 0,
            shadow_distance: 1.0,
            shadows_type: 0,
            num_splits: 1,
            _padding: 0.0,
        }
    }
}

impl ShadowConstantsPS {
    /// Global shadow matrix
    pub fn shadow_matrix(&self) -> Mat4 {
        mat4_from_gpu(&self.shadow_matrix)
    }

    /// Offset of cascade `index`
    pub fn cascade_offset(&self, index: usize) -> Vec3 {
        Vec4::from(self.cascade_offsets[index]).xyz()
    }

    /// Scale of cascade `index`
    pub fn cascade_scale(&self, index: usize) -> Vec3 {
        Vec4::from(self.cascade_scales[index]).xyz()
    }
}

/// Per-mesh feature switches
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable, Default)]
pub struct MeshConstants {
    /// Leading padding so the flags sit in the upper half of the vec4
    pub _padding: [u32; 2],
    /// Whether vertices are skinned
    pub skinning_enabled: u32,
    /// Whether the house colour is applied
    pub has_house_color: u32,
}

/// Per-render-item vertex constants
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderItemConstantsVS {
    /// Object to world transform
    pub world: [[f32; 4]; 4],
}

impl Default for RenderItemConstantsVS {
    fn default() -> Self {
        Self { world: IDENTITY }
    }
}

impl RenderItemConstantsVS {
    /// Build from a world matrix
    pub fn new(world: &Mat4) -> Self {
        Self { world: mat4_to_gpu(world) }
    }

    /// World matrix
    pub fn world(&self) -> Mat4 {
        mat4_from_gpu(&self.world)
    }
}

/// Per-render-item fragment constants
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderItemConstantsPS {
    /// Player colour
    pub house_color: [f32; 3],
    /// Overall opacity
    pub opacity: f32,
    /// Colour multiplier
    pub tint_color: [f32; 3],
    /// std140 padding
    pub _padding: f32,
}

impl Default for RenderItemConstantsPS {
    fn default() -> Self {
        Self {
            house_color: [1.0; 3],
            opacity: 1.0,
            tint_color: [1.0; 3],
            _padding: 0.0,
        }
    }
}

/// One radius cursor decal in the structured buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Default)]
pub struct RadiusCursorDecal {
    /// World-space XY of the decal's bottom-left corner
    pub bottom_left_corner_position: [f32; 2],
    /// Edge length of the decal square
    pub diameter: f32,
    /// Layer in the decal texture array
    pub decal_texture_index: u32,
    /// Current opacity (carried but not applied when compositing)
    pub opacity: f32,
    /// std430 padding to 32 bytes
    pub _padding: [f32; 3],
}

impl RadiusCursorDecal {
    /// Size of one decal in bytes
    pub const SIZE_IN_BYTES: usize = 32;

    /// Bottom-left corner as a vector
    pub fn bottom_left(&self) -> Vec2 {
        Vec2::from(self.bottom_left_corner_position)
    }
}

/// Constant block bounding the decal loop
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable, Default)]
pub struct RadiusCursorDecalConstants {
    /// std140 padding
    pub _padding: [u32; 3],
    /// Number of valid entries in the decal buffer
    pub num_radius_cursor_decals: u32,
}
