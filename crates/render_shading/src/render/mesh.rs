//! Mesh vertex transform
//!
//! Skinned meshes store each vertex twice, once relative to each of its two
//! bones. A vertex dominated by its first bone skips the second matrix.

use bitflags::bitflags;

use crate::error::{Result, ShadingError};
use crate::foundation::math::{clip_distance, transform_normal, transform_position, Mat4, Vec2, Vec3, Vec4};
use crate::render::cloud::get_cloud_uv;
use crate::render::layout::{
    GlobalConstants, LightingConstantsVS, MeshConstants, MeshVertex, RenderItemConstantsPS,
    RenderItemConstantsVS,
};

/// Weight above which the second bone is ignored
pub const SINGLE_BONE_WEIGHT_THRESHOLD: f32 = 0.99;

bitflags! {
    /// Per-mesh feature switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshFlags: u32 {
        /// Vertices are transformed by bone matrices
        const SKINNED = 1 << 0;
        /// Diffuse colour is multiplied by the owning player's colour
        const HOUSE_COLOR = 1 << 1;
    }
}

impl MeshFlags {
    /// GPU representation
    pub fn to_constants(self) -> MeshConstants {
        MeshConstants {
            _padding: [0; 2],
            skinning_enabled: u32::from(self.contains(Self::SKINNED)),
            has_house_color: u32::from(self.contains(Self::HOUSE_COLOR)),
        }
    }

    /// Decode the GPU representation; any non-zero flag counts as set
    pub fn from_constants(constants: &MeshConstants) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::SKINNED, constants.skinning_enabled != 0);
        flags.set(Self::HOUSE_COLOR, constants.has_house_color != 0);
        flags
    }
}

impl From<MeshFlags> for MeshConstants {
    fn from(flags: MeshFlags) -> Self {
        flags.to_constants()
    }
}

/// Object-space position and normal after skinning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinnedVertex {
    /// Position
    pub position: Vec3,
    /// Normal, not renormalized
    pub normal: Vec3,
}

/// Vertex stage outputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    /// Clip-space position
    pub clip_position: Vec4,
    /// World-space position
    pub world_position: Vec3,
    /// Unit world-space normal
    pub world_normal: Vec3,
    /// Cloud texture coordinate
    pub cloud_uv: Vec2,
    /// Signed distances to the two user clipping planes
    pub clip_distances: [f32; 2],
    /// Texture coordinate
    pub uv0: Vec2,
}

fn bone(bones: &[Mat4], index: u32) -> Result<&Mat4> {
    bones.get(index as usize).ok_or(ShadingError::BoneIndexOutOfRange {
        index,
        bone_count: bones.len(),
    })
}

fn blend_two_bones(vertex: &MeshVertex, bones: &[Mat4]) -> Result<SkinnedVertex> {
    let [i0, i1] = vertex.bone_indices;
    let [w0, w1] = vertex.bone_weights;
    let b0 = bone(bones, i0)?;
    let b1 = bone(bones, i1)?;

    let position = transform_position(&Vec3::from(vertex.position0), b0) * w0
        + transform_position(&Vec3::from(vertex.position1), b1) * w1;
    let normal = b0.transform_vector(&Vec3::from(vertex.normal0)) * w0
        + b1.transform_vector(&Vec3::from(vertex.normal1)) * w1;

    Ok(SkinnedVertex { position, normal })
}

/// Apply linear-blend skinning. With skinning disabled the bone array is
/// never read and slot 0 passes through.
pub fn skin_vertex(vertex: &MeshVertex, bones: &[Mat4], mesh: &MeshConstants) -> Result<SkinnedVertex> {
    let position0 = Vec3::from(vertex.position0);
    let normal0 = Vec3::from(vertex.normal0);

    if mesh.skinning_enabled == 0 {
        return Ok(SkinnedVertex { position: position0, normal: normal0 });
    }

    if vertex.bone_weights[0] >= SINGLE_BONE_WEIGHT_THRESHOLD {
        let b0 = bone(bones, vertex.bone_indices[0])?;
        return Ok(SkinnedVertex {
            position: transform_position(&position0, b0),
            normal: b0.transform_vector(&normal0),
        });
    }

    blend_two_bones(vertex, bones)
}

/// Full vertex stage: skinning, world and clip transforms, clip distances
/// and the cloud texture coordinate
pub fn mesh_vertex(
    vertex: &MeshVertex,
    bones: &[Mat4],
    mesh: &MeshConstants,
    render_item: &RenderItemConstantsVS,
    global: &GlobalConstants,
    lighting: &LightingConstantsVS,
) -> Result<VertexOutput> {
    let skinned = skin_vertex(vertex, bones, mesh)?;
    let world = render_item.world();

    let world_position = transform_position(&skinned.position, &world);
    let world_normal = transform_normal(&skinned.normal, &world);
    let clip_position = global.view_projection() * world_position.push(1.0);

    let [(plane1, enabled1), (plane2, enabled2)] = global.clipping_planes();

    Ok(VertexOutput {
        clip_position,
        world_position,
        world_normal,
        cloud_uv: get_cloud_uv(&world_position, lighting, global.time_in_seconds),
        clip_distances: [
            clip_distance(&world_position, &plane1, enabled1),
            clip_distance(&world_position, &plane2, enabled2),
        ],
        uv0: Vec2::from(vertex.uv0),
    })
}

/// Apply house colour, tint and opacity to a sampled diffuse colour
pub fn apply_render_item_color(
    diffuse_texture: Vec4,
    render_item: &RenderItemConstantsPS,
    mesh: &MeshConstants,
) -> Vec4 {
    let mut rgb = diffuse_texture.xyz();
    if mesh.has_house_color != 0 {
        rgb.component_mul_assign(&Vec3::from(render_item.house_color));
    }
    rgb.component_mul_assign(&Vec3::from(render_item.tint_color));
    rgb.push(diffuse_texture.w * render_item.opacity)
}
