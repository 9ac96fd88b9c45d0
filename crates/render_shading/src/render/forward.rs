//! Forward shading of object and terrain fragments
//!
//! Combines the leaf kernels the way the fragment stages do: shadow
//! visibility feeds light 0, lighting modulates the surface colour, clouds
//! darken everything, and terrain additionally receives radius decals.

use crate::config::RenderSettings;
use crate::error::Result;
use crate::foundation::math::{saturate, Vec2, Vec3, Vec4};
use crate::render::cloud::cloud_color;
use crate::render::decals::radius_cursor_decal_color;
use crate::render::layout::{
    GlobalConstants, LightingConstantsPS, MeshConstants, RadiusCursorDecal, RadiusCursorDecalConstants,
    RenderItemConstantsPS, ShadowConstantsPS,
};
use crate::render::lighting::{do_lighting, LightingEnvironment, LightingInput, LightingResult, LightingType, Material};
use crate::render::mesh::apply_render_item_color;
use crate::render::shadows::{shadow_visibility, shadow_visibility_with_kernel, ShadowFragment, ShadowMap};
use crate::render::texture::{Texture2D, TextureArray};

/// Interpolated fragment inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInput {
    /// World-space position
    pub world_position: Vec3,
    /// World-space normal, renormalized before use
    pub world_normal: Vec3,
    /// Positive view-space depth
    pub depth_vs: f32,
    /// Cloud texture coordinate from the vertex stage
    pub cloud_uv: Vec2,
    /// Screen-space x derivative of `world_position`
    pub world_position_dx: Vec3,
    /// Screen-space y derivative of `world_position`
    pub world_position_dy: Vec3,
}

impl FragmentInput {
    /// Fragment without screen-space derivatives
    pub fn new(world_position: Vec3, world_normal: Vec3, depth_vs: f32, cloud_uv: Vec2) -> Self {
        Self {
            world_position,
            world_normal,
            depth_vs,
            cloud_uv,
            world_position_dx: Vec3::zeros(),
            world_position_dy: Vec3::zeros(),
        }
    }
}

/// Radius decal state bound for terrain passes
#[derive(Clone, Copy)]
pub struct DecalResources<'a> {
    /// Decal buffer
    pub decals: &'a [RadiusCursorDecal],
    /// Decal count
    pub constants: &'a RadiusCursorDecalConstants,
    /// Decal texture array
    pub textures: &'a dyn TextureArray,
}

/// Everything bound for one frame
#[derive(Clone, Copy)]
pub struct FrameResources<'a> {
    /// Render settings
    pub settings: &'a RenderSettings,
    /// Global constants
    pub global: &'a GlobalConstants,
    /// Terrain and object lighting
    pub lighting: &'a LightingEnvironment,
    /// Shadow constants
    pub shadow_constants: &'a ShadowConstantsPS,
    /// Cascade depth array
    pub shadow_map: &'a dyn ShadowMap,
    /// Cloud texture
    pub cloud_texture: &'a dyn Texture2D,
    /// Radius decals, if any
    pub decals: Option<DecalResources<'a>>,
}

impl FrameResources<'_> {
    fn light(&self, lighting: &LightingConstantsPS, fragment: &FragmentInput, material: &Material, specular: bool) -> LightingResult {
        let normal = fragment.world_normal.normalize();
        let sun = lighting.lights[0].direction();
        let n_dot_l = saturate(normal.dot(&-sun));

        let shadow_fragment = ShadowFragment::new(fragment.world_position, fragment.depth_vs, n_dot_l, normal)
            .with_derivatives(fragment.world_position_dx, fragment.world_position_dy);
        let shadows = &self.settings.shadows;
        let visibility = match shadows.filter_kernel {
            Some(kernel) => shadow_visibility_with_kernel(self.shadow_map, &shadow_fragment, self.shadow_constants, kernel),
            None => shadow_visibility(self.shadow_map, &shadow_fragment, self.shadow_constants),
        };

        let input = LightingInput {
            world_position: fragment.world_position,
            world_normal: normal,
            camera_position: self.global.camera_position(),
            shadow_visibility: visibility,
        };
        do_lighting(lighting, &input, material, specular)
    }

    fn lighting_for(&self, fragment: &FragmentInput, material: &Material, lighting_type: LightingType, specular: bool) -> LightingResult {
        match self.lighting.select(lighting_type) {
            Some(lighting) => self.light(lighting, fragment, material, specular),
            None => LightingResult { diffuse: Vec3::repeat(1.0), specular: Vec3::zeros() },
        }
    }
}

/// Shade an object fragment. `diffuse_texture` is the sampled diffuse map.
pub fn shade_object(
    frame: &FrameResources<'_>,
    fragment: &FragmentInput,
    material: &Material,
    diffuse_texture: Vec4,
    render_item: &RenderItemConstantsPS,
    mesh: &MeshConstants,
) -> Vec4 {
    let settings = frame.settings;
    let lit = frame.lighting_for(fragment, material, settings.lighting_type, settings.specular_enabled);
    let surface = apply_render_item_color(diffuse_texture, render_item, mesh);
    let cloud = cloud_color(frame.cloud_texture, fragment.cloud_uv);

    let rgb = (lit.diffuse.component_mul(&surface.xyz()) + lit.specular).component_mul(&cloud);
    rgb.push(surface.w)
}

/// Shade a terrain fragment. Terrain is diffuse-only and receives decals.
pub fn shade_terrain(
    frame: &FrameResources<'_>,
    fragment: &FragmentInput,
    material: &Material,
    terrain_texture: Vec3,
) -> Result<Vec3> {
    let lit = frame.lighting_for(fragment, material, LightingType::Terrain, false);
    let cloud = cloud_color(frame.cloud_texture, fragment.cloud_uv);
    let mut rgb = lit.diffuse.component_mul(&terrain_texture).component_mul(&cloud);

    if let Some(decals) = &frame.decals {
        let decal = radius_cursor_decal_color(
            fragment.world_position.xy(),
            decals.decals,
            decals.constants,
            decals.textures,
        )?;
        rgb += decal.xyz();
    }

    Ok(rgb)
}
