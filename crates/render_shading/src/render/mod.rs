//! # Shading
//!
//! GPU constant layouts and CPU reference implementations of the shading
//! kernels.
//!
//! ## Layout
//!
//! - **layout**: std140 constant blocks, binding table per layout revision, vertex layout
//! - **lighting**: three-light directional lighting
//! - **shadows**: cascade setup, cascade selection, PCF and cascade blending
//! - **mesh**: skinning and the vertex transform
//! - **cloud** and **decals**: leaf effects composited over lit surfaces
//! - **forward**: object and terrain fragment shading built from the above
//! - **validation**: host-side checks of everything the kernels assume
//!
//! Kernels take their constants as explicit arguments and never log.

pub mod cloud;
pub mod decals;
pub mod forward;
pub mod layout;
pub mod lighting;
pub mod mesh;
pub mod shadows;
pub mod texture;
pub mod validation;

pub use decals::{DecalHandle, RadiusCursorDecals, RadiusDecalTemplate};
pub use forward::{shade_object, shade_terrain, FragmentInput, FrameResources};
pub use lighting::{do_lighting, DirectionalLight, LightingEnvironment, LightingType, Material};
pub use mesh::{mesh_vertex, skin_vertex, MeshFlags, VertexOutput};
pub use shadows::{ShadowFrustumCalculator, ShadowsType};
