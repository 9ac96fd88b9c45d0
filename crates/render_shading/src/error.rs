//! Error types for host-side validation and resource management

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised before constants reach the GPU
#[derive(Error, Debug)]
pub enum ShadingError {
    /// `NumSplits` is zero or exceeds the number of cascade slots
    #[error("Cascade count {count} is outside 1..={max}")]
    CascadeCountOutOfRange {
        /// Requested split count
        count: u32,
        /// Number of cascade slots in the constant block
        max: usize,
    },

    /// Cascade split distances must increase monotonically
    #[error("Cascade split {index} ({value}) is not greater than the previous split ({previous})")]
    NonMonotonicSplits {
        /// Index of the offending split
        index: usize,
        /// Its value
        value: f32,
        /// The value before it
        previous: f32,
    },

    /// A cascade scale with zero depth extent would divide by zero
    #[error("Cascade {index} has a zero depth scale")]
    DegenerateCascadeScale {
        /// Cascade index
        index: usize,
    },

    /// Raw enum value in a constant block has no meaning
    #[error("Invalid {field} value {value}")]
    InvalidEnumValue {
        /// Field name
        field: &'static str,
        /// Raw value
        value: u32,
    },

    /// Raw boolean in a constant block is neither 0 nor 1
    #[error("Boolean field {field} holds {value}, expected 0 or 1")]
    InvalidBool {
        /// Field name
        field: &'static str,
        /// Raw value
        value: u32,
    },

    /// Shadow distance must be positive for the fade to be defined
    #[error("Shadow distance must be positive, got {0}")]
    InvalidShadowDistance(f32),

    /// Shadow map has no texels or too few layers
    #[error("Shadow map is {width}x{height} with {layers} layers, need at least {required} layers")]
    InvalidShadowMap {
        /// Width in texels
        width: u32,
        /// Height in texels
        height: u32,
        /// Array layers present
        layers: usize,
        /// Array layers needed
        required: usize,
    },

    /// The decal count field is larger than the decal buffer
    #[error("Decal count {count} exceeds decal buffer length {capacity}")]
    DecalCountExceedsBuffer {
        /// Count written into the constant block
        count: u32,
        /// Entries actually present
        capacity: usize,
    },

    /// A decal with non-positive diameter produces infinite UVs
    #[error("Decal {index} has non-positive diameter {diameter}")]
    InvalidDecalDiameter {
        /// Decal index
        index: usize,
        /// Its diameter
        diameter: f32,
    },

    /// A decal references a texture layer that does not exist
    #[error("Decal {index} references texture layer {layer}, only {layers} layers exist")]
    DecalTextureOutOfRange {
        /// Decal index
        index: usize,
        /// Referenced layer
        layer: u32,
        /// Layers available
        layers: u32,
    },

    /// No more decal texture layers can be registered
    #[error("Decal texture array is full ({0} layers)")]
    DecalTextureArrayFull(u32),

    /// Decal texture has the wrong dimensions
    #[error("Decal texture must be {expected}x{expected}, got {width}x{height}")]
    InvalidDecalTextureSize {
        /// Required edge length
        expected: u32,
        /// Supplied width
        width: u32,
        /// Supplied height
        height: u32,
    },

    /// Image data could not be decoded
    #[error("Failed to load texture: {0}")]
    TextureLoad(String),

    /// The decal handle was removed or never issued
    #[error("Unknown decal handle")]
    UnknownDecal,

    /// Vertex references a bone outside the skinning buffer
    #[error("Bone index {index} is out of range for {bone_count} bones")]
    BoneIndexOutOfRange {
        /// Referenced bone
        index: u32,
        /// Bones supplied
        bone_count: usize,
    },

    /// A transform needed for cascade setup could not be inverted
    #[error("Matrix is not invertible: {0}")]
    SingularMatrix(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for shading operations
pub type Result<T> = std::result::Result<T, ShadingError>;
