//! Cascaded shadow maps
//!
//! The view frustum is split into up to [`NUM_CASCADES`] depth ranges, each
//! rendered into one layer of a depth array. Fragments pick their cascade by
//! view-space depth, filter with percentage-closer filtering and blend across
//! cascade seams.
//!
//! [`frustum`] computes the per-cascade projections on the host and packs
//! them into [`ShadowConstantsPS`](crate::render::layout::ShadowConstantsPS).
//! [`cascade`] and [`pcf`] evaluate visibility for a fragment.

pub mod cascade;
pub mod frustum;
pub mod pcf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShadingError};

pub use cascade::{
    select_cascade, shadow_visibility, shadow_visibility_with_kernel, CascadeProjection,
    ShadowFragment, CASCADE_BLEND_THRESHOLD, CASCADE_COLORS,
};
pub use frustum::{ShadowCamera, ShadowData, ShadowFrustumCalculator};
pub use pcf::{sample_optimized_pcf, DepthArrayShadowMap, PcfKernel, ShadowMap};

/// Number of cascade slots in the shadow constant block
pub const NUM_CASCADES: usize = 4;

/// Shadow filtering quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ShadowsType {
    /// Shadows disabled, visibility is always one
    None = 0,
    /// Single hardware-filtered tap
    Hard = 1,
    /// Wide PCF kernel
    #[default]
    Soft = 2,
}

impl ShadowsType {
    /// Decode the raw value stored in the constant block
    pub fn from_raw(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Hard),
            2 => Ok(Self::Soft),
            _ => Err(ShadingError::InvalidEnumValue { field: "shadows_type", value }),
        }
    }

    /// Value stored in the constant block
    pub const fn to_raw(self) -> u32 {
        self as u32
    }
}
