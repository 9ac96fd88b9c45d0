//! # Render Shading
//!
//! Host-side half of a game renderer's shading stages: the constant blocks
//! uploaded to the GPU and a CPU reference for the math the shaders run.
//!
//! ## Features
//!
//! - **Wire contract**: `bytemuck` constant blocks with std140 layout and a
//!   versioned descriptor binding table
//! - **Cascaded shadows**: frustum splitting, texel-snapped cascades, 1/3/5/7
//!   tap PCF, cascade blending and distance fade
//! - **Lighting**: three directional lights with Blinn-Phong specular
//! - **Skinning**: two-bone linear blend with a dominant-bone shortcut
//! - **Terrain effects**: scrolling cloud shadows and radius cursor decals
//! - **Validation**: host checks for every invariant the shaders rely on
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use render_shading::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let settings = RenderSettings::load_from_file("render.toml")?;
//!     settings.validate()?;
//!
//!     let camera = ShadowCamera::look_at(
//!         Vec3::new(0.0, -60.0, 40.0),
//!         Vec3::zeros(),
//!         Vec3::z(),
//!         1.0,
//!         16.0 / 9.0,
//!         1.0,
//!         2000.0,
//!     );
//!     let calculator = ShadowFrustumCalculator::new(settings.shadows.clone());
//!     let constants = calculator.constants(&camera, Vec3::new(-0.3, 0.2, -0.9))?;
//!     validate_shadow_constants(&constants)?;
//!
//!     let bytes = bytemuck::bytes_of(&constants);
//!     assert_eq!(bytes.len(), 240);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod foundation;
pub mod render;

mod error;

pub use error::{Result, ShadingError};

/// Common imports
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, RenderSettings, ShadowMapCascades, ShadowSettings},
        foundation::{
            math::{Mat4, Vec2, Vec3, Vec4},
            time::TimeInterval,
        },
        render::{
            layout::{BindingLayout, GlobalConstants, LayoutVersion, ShadowConstantsPS},
            lighting::{DirectionalLight, LightingEnvironment, LightingType, Material},
            shadows::{PcfKernel, ShadowCamera, ShadowFrustumCalculator, ShadowsType},
            validation::validate_shadow_constants,
        },
        Result, ShadingError,
    };
}
