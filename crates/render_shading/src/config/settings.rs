//! Render settings
//!
//! Host-facing knobs that end up in the shadow, lighting and binding
//! configuration. Defaults describe a four-cascade soft-shadow setup.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::render::layout::LayoutVersion;
use crate::render::lighting::LightingType;
use crate::render::shadows::{PcfKernel, ShadowsType, NUM_CASCADES};

/// Number of shadow cascades rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMapCascades {
    /// A single cascade covering the whole shadow distance
    One,
    /// Two cascades
    Two,
    /// Four cascades
    Four,
}

impl ShadowMapCascades {
    /// Number of cascades as a count
    pub const fn count(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }
}

/// Shadow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Filter quality, or `None` to disable shadows
    pub shadows_type: ShadowsType,
    /// How many cascades to split the view into
    pub cascades: ShadowMapCascades,
    /// Split position (fraction of shadow distance) for two cascades
    pub cascades2_split_depth: f32,
    /// Split positions (fractions of shadow distance) for four cascades
    pub cascades4_split_depths: [f32; 3],
    /// Depth bias subtracted from the receiver depth
    pub bias: f32,
    /// Normal-offset scale applied along the surface normal
    pub normal_offset: f32,
    /// View-space distance at which shadows have fully faded out
    pub shadow_distance: f32,
    /// Width and height of each cascade layer in texels
    pub shadow_map_size: u32,
    /// Snap cascades to texel increments to stop shimmering
    pub stabilize_cascades: bool,
    /// Tint each cascade a different colour
    pub visualize_cascades: bool,
    /// Override the kernel chosen by `shadows_type`
    pub filter_kernel: Option<PcfKernel>,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            shadows_type: ShadowsType::Soft,
            cascades: ShadowMapCascades::Four,
            cascades2_split_depth: 0.25,
            cascades4_split_depths: [0.05, 0.15, 0.5],
            bias: 0.002,
            normal_offset: 0.4,
            shadow_distance: 1000.0,
            shadow_map_size: 1024,
            stabilize_cascades: true,
            visualize_cascades: false,
            filter_kernel: None,
        }
    }
}

impl ShadowSettings {
    /// Kernel actually used for filtering
    pub fn effective_kernel(&self) -> PcfKernel {
        self.filter_kernel
            .unwrap_or_else(|| PcfKernel::for_shadows_type(self.shadows_type))
    }

    /// Split fractions of the shadow distance, padded with zeros to four entries
    pub fn split_fractions(&self) -> [f32; NUM_CASCADES] {
        match self.cascades {
            ShadowMapCascades::One => [1.0, 0.0, 0.0, 0.0],
            ShadowMapCascades::Two => [self.cascades2_split_depth, 1.0, 0.0, 0.0],
            ShadowMapCascades::Four => {
                let [x, y, z] = self.cascades4_split_depths;
                [x, y, z, 1.0]
            }
        }
    }

    /// Validate the shadow configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shadow_map_size == 0 || !self.shadow_map_size.is_power_of_two() {
            return Err(ConfigError::Invalid {
                field: "shadow_map_size",
                reason: format!("must be a non-zero power of two, got {}", self.shadow_map_size),
            });
        }

        if !(self.shadow_distance > 0.0) {
            return Err(ConfigError::Invalid {
                field: "shadow_distance",
                reason: format!("must be positive, got {}", self.shadow_distance),
            });
        }

        if self.bias < 0.0 || self.normal_offset < 0.0 {
            return Err(ConfigError::Invalid {
                field: "bias",
                reason: "bias and normal_offset must not be negative".to_string(),
            });
        }

        let count = self.cascades.count();
        let fractions = self.split_fractions();
        let mut previous = 0.0;
        for (i, &fraction) in fractions.iter().take(count).enumerate() {
            if !(fraction > previous && fraction <= 1.0) {
                return Err(ConfigError::Invalid {
                    field: "cascade splits",
                    reason: format!(
                        "split {} ({}) must lie in ({}, 1]",
                        i, fraction, previous
                    ),
                });
            }
            previous = fraction;
        }

        Ok(())
    }
}

/// Top-level render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Binding layout revision the compiled shaders expect
    pub layout_version: LayoutVersion,
    /// Which lighting block the pass binds
    pub lighting_type: LightingType,
    /// Whether object shading computes specular highlights
    pub specular_enabled: bool,
    /// Shadow configuration
    pub shadows: ShadowSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            layout_version: LayoutVersion::Current,
            lighting_type: LightingType::Object,
            specular_enabled: true,
            shadows: ShadowSettings::default(),
        }
    }
}

impl RenderSettings {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: "cannot be empty".to_string(),
            });
        }
        self.shadows.validate()
    }

    /// Install the logger, using `log_level` when `RUST_LOG` is unset
    pub fn init_logging(&self) {
        crate::foundation::logging::init_with_level(&self.log_level);
    }
}

impl Config for RenderSettings {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        RenderSettings::default().validate().unwrap();
    }

    #[test]
    fn test_effective_kernel_follows_shadows_type() {
        let mut shadows = ShadowSettings::default();
        assert_eq!(shadows.effective_kernel(), PcfKernel::Five);

        shadows.shadows_type = ShadowsType::Hard;
        assert_eq!(shadows.effective_kernel(), PcfKernel::Single);

        shadows.filter_kernel = Some(PcfKernel::Seven);
        assert_eq!(shadows.effective_kernel(), PcfKernel::Seven);
    }

    #[test]
    fn test_split_fractions_per_cascade_count() {
        let mut shadows = ShadowSettings::default();
        assert_eq!(shadows.split_fractions(), [0.05, 0.15, 0.5, 1.0]);

        shadows.cascades = ShadowMapCascades::Two;
        assert_eq!(shadows.split_fractions(), [0.25, 1.0, 0.0, 0.0]);

        shadows.cascades = ShadowMapCascades::One;
        assert_eq!(shadows.split_fractions(), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_non_increasing_splits_are_rejected() {
        let shadows = ShadowSettings {
            cascades4_split_depths: [0.2, 0.1, 0.5],
            ..ShadowSettings::default()
        };
        assert!(matches!(
            shadows.validate(),
            Err(ConfigError::Invalid { field: "cascade splits", .. })
        ));
    }

    #[test]
    fn test_bad_shadow_map_size_is_rejected() {
        let shadows = ShadowSettings {
            shadow_map_size: 1000,
            ..ShadowSettings::default()
        };
        assert!(shadows.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = RenderSettings {
            specular_enabled: false,
            shadows: ShadowSettings {
                shadows_type: ShadowsType::Hard,
                filter_kernel: Some(PcfKernel::Three),
                ..ShadowSettings::default()
            },
            ..RenderSettings::default()
        };

        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed = RenderSettings::from_toml_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_ron_partial_document_uses_defaults() {
        let parsed = RenderSettings::from_ron_str("(specular_enabled: false)").unwrap();
        assert!(!parsed.specular_enabled);
        assert_eq!(parsed.shadows, ShadowSettings::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join("render_shading_settings_test.toml");
        let path = path.to_string_lossy().to_string();

        let settings = RenderSettings::default();
        settings.save_to_file(&path).unwrap();
        let loaded = RenderSettings::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_logging_init_is_repeatable() {
        let settings = RenderSettings::default();
        settings.init_logging();
        settings.init_logging();
        log::debug!("logger installed at {}", settings.log_level);
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        assert!(matches!(
            RenderSettings::load_from_file("settings.json"),
            Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            RenderSettings::default().save_to_file("settings.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
