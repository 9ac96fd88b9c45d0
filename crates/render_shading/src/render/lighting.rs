//! Directional lighting
//!
//! Every lighting block carries exactly three directional lights. Light 0 is
//! the sun and is the only one attenuated by shadows. Terrain and objects
//! get separate blocks so the map can light them differently.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{saturate, saturate_vec3, Vec3};
use crate::render::layout::{Light, LightingConstantsPS, LightingConstantsVS, NUM_LIGHTS};

/// Which lighting block a pass binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightingType {
    /// Unlit
    None,
    /// Terrain lighting block
    Terrain,
    /// Object lighting block
    #[default]
    Object,
}

/// Surface response used by [`do_lighting`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Multiplies each light's ambient colour
    pub ambient: Vec3,
    /// Multiplies each light's diffuse colour
    pub diffuse: Vec3,
    /// Multiplies each light's specular colour
    pub specular: Vec3,
    /// Blinn-Phong exponent
    pub shininess: f32,
}

impl Material {
    /// Purely diffuse white material
    pub fn diffuse_white() -> Self {
        Self {
            ambient: Vec3::repeat(1.0),
            diffuse: Vec3::repeat(1.0),
            specular: Vec3::zeros(),
            shininess: 1.0,
        }
    }

    /// Set the specular response
    pub fn with_specular(mut self, specular: Vec3, shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse_white()
    }
}

/// Builder for one GPU [`Light`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Ambient colour
    pub ambient: Vec3,
    /// Diffuse and specular colour
    pub color: Vec3,
    /// Direction of travel, normalized
    pub direction: Vec3,
}

impl DirectionalLight {
    /// Create a directional light
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            ambient: Vec3::zeros(),
            color,
            direction: direction.normalize(),
        }
    }

    /// Set the ambient term
    pub fn with_ambient(mut self, ambient: Vec3) -> Self {
        self.ambient = ambient;
        self
    }

    /// A light that contributes nothing, used to fill unused slots
    pub fn off() -> Self {
        Self {
            ambient: Vec3::zeros(),
            color: Vec3::zeros(),
            direction: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// GPU representation
    pub fn to_gpu(&self) -> Light {
        Light::new(self.ambient, self.color, self.direction)
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        light.to_gpu()
    }
}

/// Pack up to three lights, filling the rest with [`DirectionalLight::off`]
pub fn lighting_constants(lights: &[DirectionalLight]) -> LightingConstantsPS {
    let mut constants = LightingConstantsPS::default();
    for (i, slot) in constants.lights.iter_mut().enumerate() {
        *slot = lights.get(i).copied().unwrap_or_else(DirectionalLight::off).into();
    }
    if lights.len() > NUM_LIGHTS {
        log::warn!("{} lights supplied, only the first {} are used", lights.len(), NUM_LIGHTS);
    }
    constants
}

/// Per-frame lighting state for both lighting types
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightingEnvironment {
    /// Lights applied to terrain
    pub terrain: LightingConstantsPS,
    /// Lights applied to objects
    pub object: LightingConstantsPS,
    /// Cloud shadow projection
    pub cloud: LightingConstantsVS,
}

impl LightingEnvironment {
    /// Same lights for terrain and objects
    pub fn uniform(lights: &[DirectionalLight]) -> Self {
        let constants = lighting_constants(lights);
        Self {
            terrain: constants,
            object: constants,
            cloud: LightingConstantsVS::default(),
        }
    }

    /// Block bound for `lighting_type`, `None` for unlit passes
    pub fn select(&self, lighting_type: LightingType) -> Option<&LightingConstantsPS> {
        match lighting_type {
            LightingType::None => None,
            LightingType::Terrain => Some(&self.terrain),
            LightingType::Object => Some(&self.object),
        }
    }

    /// Midday sun with two fill lights
    pub fn outdoor_daylight() -> Self {
        Self::uniform(&[
            DirectionalLight::new(Vec3::new(-0.3, 0.2, -0.9), Vec3::new(1.0, 0.98, 0.9))
                .with_ambient(Vec3::new(0.3, 0.3, 0.35)),
            DirectionalLight::new(Vec3::new(0.6, -0.4, -0.5), Vec3::new(0.25, 0.25, 0.3)),
            DirectionalLight::new(Vec3::new(0.1, 0.8, -0.3), Vec3::new(0.15, 0.15, 0.2)),
        ])
    }

    /// Low warm sun
    pub fn evening() -> Self {
        Self::uniform(&[
            DirectionalLight::new(Vec3::new(-0.9, 0.1, -0.35), Vec3::new(0.9, 0.6, 0.4))
                .with_ambient(Vec3::new(0.2, 0.15, 0.2)),
            DirectionalLight::new(Vec3::new(0.7, 0.0, -0.7), Vec3::new(0.15, 0.15, 0.25)),
        ])
    }
}

/// Result of [`do_lighting`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingResult {
    /// Ambient plus diffuse, clamped to `[0, 1]` per channel
    pub diffuse: Vec3,
    /// Specular highlight, unclamped
    pub specular: Vec3,
}

/// Surface inputs for one lighting evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingInput {
    /// World-space position
    pub world_position: Vec3,
    /// Unit surface normal
    pub world_normal: Vec3,
    /// Camera position
    pub camera_position: Vec3,
    /// Per-channel shadow visibility of light 0
    pub shadow_visibility: Vec3,
}

/// Accumulate the three directional lights
pub fn do_lighting(
    lighting: &LightingConstantsPS,
    input: &LightingInput,
    material: &Material,
    specular_enabled: bool,
) -> LightingResult {
    let n = input.world_normal;
    let mut diffuse = Vec3::zeros();
    let mut specular = Vec3::zeros();

    let view = if specular_enabled {
        (input.camera_position - input.world_position).normalize()
    } else {
        Vec3::zeros()
    };

    for (i, light) in lighting.lights.iter().enumerate() {
        let direction = light.direction();
        let mut color = light.color();
        if i == 0 {
            color.component_mul_assign(&input.shadow_visibility);
        }

        let ambient = light.ambient().component_mul(&material.ambient);
        let n_dot_l = saturate(n.dot(&-direction));
        diffuse += ambient + n_dot_l * material.diffuse.component_mul(&color);

        if specular_enabled {
            let half = (view - direction).normalize();
            let n_dot_h = saturate(n.dot(&half));
            specular += n_dot_h.powf(material.shininess) * material.specular.component_mul(&color);
        }
    }

    LightingResult {
        diffuse: saturate_vec3(diffuse),
        specular,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_light(light: DirectionalLight) -> LightingConstantsPS {
        lighting_constants(&[light])
    }

    fn input(normal: Vec3) -> LightingInput {
        LightingInput {
            world_position: Vec3::zeros(),
            world_normal: normal,
            camera_position: Vec3::new(0.0, 0.0, 10.0),
            shadow_visibility: Vec3::repeat(1.0),
        }
    }

    #[test]
    fn test_back_facing_light_contributes_no_diffuse() {
        let directions = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.3, -0.2, 0.9),
            Vec3::new(1.0, 0.0, 0.0),
        ];
        for direction in directions {
            let lights = single_light(DirectionalLight::new(direction, Vec3::repeat(1.0)));
            let result = do_lighting(&lights, &input(Vec3::z()), &Material::default(), false);
            assert_eq!(result.diffuse, Vec3::zeros(), "direction {:?}", direction);
        }
    }

    #[test]
    fn test_facing_light_gives_full_diffuse() {
        let lights = single_light(DirectionalLight::new(-Vec3::z(), Vec3::new(0.5, 0.25, 1.0)));
        let result = do_lighting(&lights, &input(Vec3::z()), &Material::default(), false);
        assert_relative_eq!(result.diffuse, Vec3::new(0.5, 0.25, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_shadow_only_attenuates_first_light() {
        let lights = lighting_constants(&[
            DirectionalLight::new(-Vec3::z(), Vec3::new(0.4, 0.0, 0.0)),
            DirectionalLight::new(-Vec3::z(), Vec3::new(0.0, 0.4, 0.0)),
        ]);
        let mut shadowed = input(Vec3::z());
        shadowed.shadow_visibility = Vec3::zeros();

        let result = do_lighting(&lights, &shadowed, &Material::default(), false);
        assert_relative_eq!(result.diffuse, Vec3::new(0.0, 0.4, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_diffuse_is_clamped_specular_is_not() {
        let bright = DirectionalLight::new(-Vec3::z(), Vec3::repeat(2.0)).with_ambient(Vec3::repeat(1.0));
        let lights = lighting_constants(&[bright, bright, bright]);
        let material = Material::default().with_specular(Vec3::repeat(1.0), 8.0);

        let result = do_lighting(&lights, &input(Vec3::z()), &material, true);
        assert_relative_eq!(result.diffuse, Vec3::repeat(1.0));
        assert_relative_eq!(result.specular, Vec3::repeat(6.0), epsilon = 1e-5);
    }

    #[test]
    fn test_specular_disabled_is_zero() {
        let lights = single_light(DirectionalLight::new(-Vec3::z(), Vec3::repeat(1.0)));
        let material = Material::default().with_specular(Vec3::repeat(1.0), 16.0);
        let result = do_lighting(&lights, &input(Vec3::z()), &material, false);
        assert_eq!(result.specular, Vec3::zeros());
    }

    #[test]
    fn test_select_lighting_block() {
        let mut environment = LightingEnvironment::outdoor_daylight();
        environment.terrain = LightingEnvironment::evening().terrain;

        assert!(environment.select(LightingType::None).is_none());
        assert_eq!(environment.select(LightingType::Terrain), Some(&environment.terrain));
        assert_eq!(environment.select(LightingType::Object), Some(&environment.object));
        assert_ne!(environment.terrain, environment.object);
    }

    #[test]
    fn test_unused_light_slots_are_dark() {
        let constants = lighting_constants(&[DirectionalLight::new(-Vec3::z(), Vec3::repeat(1.0))]);
        assert_eq!(constants.lights[1].color(), Vec3::zeros());
        assert_eq!(constants.lights[2].ambient(), Vec3::zeros());
    }
}
