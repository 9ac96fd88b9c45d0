//! Vertex input layout
//!
//! Locations are positional and must match the vertex buffer the host binds.
//! The second position/normal slot feeds the two-bone skinning path.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Vec2, Vec3};

/// Interleaved mesh vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Default)]
pub struct MeshVertex {
    /// Position relative to bone 0
    pub position0: [f32; 3],
    /// Position relative to bone 1
    pub position1: [f32; 3],
    /// Normal relative to bone 0
    pub normal0: [f32; 3],
    /// Normal relative to bone 1
    pub normal1: [f32; 3],
    /// Tangent
    pub tangent: [f32; 3],
    /// Binormal
    pub binormal: [f32; 3],
    /// Indices into the bone matrix array
    pub bone_indices: [u32; 2],
    /// Weights of the two bones
    pub bone_weights: [f32; 2],
    /// Texture coordinate
    pub uv0: [f32; 2],
}

/// One vertex attribute: shader location, byte offset and component count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// `layout(location = N)`
    pub location: u32,
    /// Byte offset inside [`MeshVertex`]
    pub offset: u32,
    /// Number of 32-bit components
    pub components: u32,
    /// Whether the components are unsigned integers
    pub integer: bool,
}

impl MeshVertex {
    /// Bytes between consecutive vertices
    pub const STRIDE: u32 = 96;

    /// Attribute table in location order
    pub const ATTRIBUTES: [VertexAttribute; 9] = [
        attr(0, 0, 3, false),
        attr(1, 12, 3, false),
        attr(2, 24, 3, false),
        attr(3, 36, 3, false),
        attr(4, 48, 3, false),
        attr(5, 60, 3, false),
        attr(6, 72, 2, true),
        attr(7, 80, 2, false),
        attr(8, 88, 2, false),
    ];

    /// Rigid vertex: both slots hold the same data and bone 0 has full weight
    pub fn rigid(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position0: position.into(),
            position1: position.into(),
            normal0: normal.into(),
            normal1: normal.into(),
            bone_weights: [1.0, 0.0],
            uv0: uv.into(),
            ..Self::default()
        }
    }
}

const fn attr(location: u32, offset: u32, components: u32, integer: bool) -> VertexAttribute {
    VertexAttribute { location, offset, components, integer }
}
