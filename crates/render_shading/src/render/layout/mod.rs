//! GPU wire contract
//!
//! Constant block layouts, the per-revision binding table and the vertex
//! input layout the compiled shaders expect.

pub mod bindings;
pub mod uniforms;
pub mod vertex;

pub use bindings::{BindingLayout, LayoutVersion, ResourceBinding, SetBinding};
pub use uniforms::{
    GlobalConstants, Light, LightingConstantsPS, LightingConstantsVS, MeshConstants,
    RadiusCursorDecal, RadiusCursorDecalConstants, RenderItemConstantsPS, RenderItemConstantsVS,
    ShadowConstantsPS, NUM_LIGHTS,
};
pub use vertex::MeshVertex;
