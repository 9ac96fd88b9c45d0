//! Radius cursor decals
//!
//! Range indicators projected straight down onto the terrain. The host keeps
//! a short list of decals, each throbbing its opacity, and uploads them as a
//! structured buffer with a count. Decal textures live in one array so the
//! fragment loop can index them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, ShadingError};
use crate::foundation::math::{Vec2, Vec4};
use crate::foundation::time::TimeInterval;
use crate::render::layout::{RadiusCursorDecal, RadiusCursorDecalConstants};
use crate::render::texture::{AddressMode, RgbaTextureArray, TextureArray};

/// Decals drawn at once; adding another evicts the oldest
pub const MAX_DECALS: usize = 8;

/// Layers in the decal texture array
pub const MAX_DECAL_TEXTURES: u32 = 20;

/// Edge length every decal texture must have
pub const DECAL_TEXTURE_SIZE: u32 = 512;

/// Composite every active decal over a terrain fragment.
///
/// Returns the premultiplied colour sum in rgb and the alpha sum in a. The
/// per-decal opacity is not applied.
pub fn radius_cursor_decal_color<A: TextureArray + ?Sized>(
    world_xy: Vec2,
    decals: &[RadiusCursorDecal],
    constants: &RadiusCursorDecalConstants,
    textures: &A,
) -> Result<Vec4> {
    let count = constants.num_radius_cursor_decals;
    let active = decals
        .get(..count as usize)
        .ok_or(ShadingError::DecalCountExceedsBuffer { count, capacity: decals.len() })?;

    let mut result = Vec4::zeros();
    for decal in active {
        let uv = (world_xy - decal.bottom_left()) / decal.diameter;
        let color = textures.sample_layer(uv, decal.decal_texture_index);

        result.x += color.x * color.w;
        result.y += color.y * color.w;
        result.z += color.z * color.w;
        result.w += color.w;
    }
    Ok(result)
}

new_key_type! {
    /// Handle to a decal owned by [`RadiusCursorDecals`]
    pub struct DecalHandle;
}

/// Appearance shared by every decal of one kind
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusDecalTemplate {
    /// Key identifying the texture in the decal texture array
    pub texture_name: String,
    /// Texture image, `DECAL_TEXTURE_SIZE` square
    pub texture: Arc<RgbaImage>,
    /// Opacity at the bottom of a throb
    pub opacity_min: f32,
    /// Opacity at the top of a throb
    pub opacity_max: f32,
    /// Length of one throb cycle
    pub opacity_throb_time: Duration,
}

#[derive(Debug, Clone)]
struct DecalEntry {
    decal: RadiusCursorDecal,
    opacity_min: f32,
    opacity_max: f32,
    half_throb: Duration,
    opacity_delta_per_millisecond: f32,
    is_opacity_increasing: bool,
    next_opacity_direction_change: Duration,
}

/// Owns the decal list and the decal texture array
#[derive(Debug)]
pub struct RadiusCursorDecals {
    entries: SlotMap<DecalHandle, DecalEntry>,
    order: VecDeque<DecalHandle>,
    texture_indices: HashMap<String, u32>,
    textures: RgbaTextureArray,
    buffer: [RadiusCursorDecal; MAX_DECALS],
    constants: RadiusCursorDecalConstants,
}

impl Default for RadiusCursorDecals {
    fn default() -> Self {
        Self::new()
    }
}

impl RadiusCursorDecals {
    /// Empty decal list
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: VecDeque::with_capacity(MAX_DECALS),
            texture_indices: HashMap::new(),
            textures: RgbaTextureArray::new(DECAL_TEXTURE_SIZE, DECAL_TEXTURE_SIZE, AddressMode::Border),
            buffer: [RadiusCursorDecal::default(); MAX_DECALS],
            constants: RadiusCursorDecalConstants::default(),
        }
    }

    /// Array layer for `template`'s texture, uploading it on first use
    pub fn texture_index(&mut self, template: &RadiusDecalTemplate) -> Result<u32> {
        if let Some(&index) = self.texture_indices.get(&template.texture_name) {
            return Ok(index);
        }

        let registered = self.textures.layer_count();
        if registered == MAX_DECAL_TEXTURES {
            log::warn!(
                "Cannot register decal texture {}: array is full",
                template.texture_name
            );
            return Err(ShadingError::DecalTextureArrayFull(MAX_DECAL_TEXTURES));
        }

        let index = self.textures.push_layer(template.texture.as_ref().clone())?;
        self.texture_indices.insert(template.texture_name.clone(), index);
        log::info!("Registered decal texture {} at layer {}", template.texture_name, index);
        Ok(index)
    }

    /// Add a decal of `radius` world units, evicting the oldest when full
    pub fn add_decal(
        &mut self,
        template: &RadiusDecalTemplate,
        radius: f32,
        time: &TimeInterval,
    ) -> Result<DecalHandle> {
        let texture_index = self.texture_index(template)?;

        if self.order.len() == MAX_DECALS {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(oldest);
                log::debug!("Decal list full, evicted oldest decal");
            }
        }

        let throb_millis = template.opacity_throb_time.as_secs_f32() * 1000.0;
        let opacity_delta_per_millisecond = if throb_millis > 0.0 {
            (template.opacity_max - template.opacity_min) / throb_millis
        } else {
            0.0
        };
        let half_throb = template.opacity_throb_time / 2;

        let handle = self.entries.insert(DecalEntry {
            decal: RadiusCursorDecal {
                decal_texture_index: texture_index,
                diameter: radius * 2.0,
                opacity: template.opacity_min,
                ..RadiusCursorDecal::default()
            },
            opacity_min: template.opacity_min,
            opacity_max: template.opacity_max,
            half_throb,
            opacity_delta_per_millisecond,
            is_opacity_increasing: true,
            next_opacity_direction_change: time.total_time + half_throb,
        });
        self.order.push_back(handle);
        Ok(handle)
    }

    /// Centre the decal on `position`
    pub fn set_decal_position(&mut self, handle: DecalHandle, position: Vec2) -> Result<()> {
        let entry = self.entries.get_mut(handle).ok_or(ShadingError::UnknownDecal)?;
        let radius = entry.decal.diameter / 2.0;
        entry.decal.bottom_left_corner_position = (position - Vec2::repeat(radius)).into();
        Ok(())
    }

    /// Remove a decal
    pub fn remove_decal(&mut self, handle: DecalHandle) -> Result<()> {
        self.entries.remove(handle).ok_or(ShadingError::UnknownDecal)?;
        self.order.retain(|&h| h != handle);
        Ok(())
    }

    /// Advance opacity throbbing and repack the upload buffer
    pub fn update(&mut self, time: &TimeInterval) {
        let delta_millis = time.delta_millis();
        self.buffer = [RadiusCursorDecal::default(); MAX_DECALS];

        for (slot, handle) in self.order.iter().enumerate() {
            let Some(entry) = self.entries.get_mut(*handle) else {
                continue;
            };

            if time.total_time > entry.next_opacity_direction_change {
                entry.is_opacity_increasing = !entry.is_opacity_increasing;
                entry.next_opacity_direction_change = time.total_time + entry.half_throb;
            }

            let delta = entry.opacity_delta_per_millisecond * delta_millis;
            let opacity = if entry.is_opacity_increasing {
                entry.decal.opacity + delta
            } else {
                entry.decal.opacity - delta
            };
            // Clamped to the template range; a long frame would otherwise overshoot.
            entry.decal.opacity = opacity.clamp(entry.opacity_min, entry.opacity_max);

            self.buffer[slot] = entry.decal;
        }

        self.constants.num_radius_cursor_decals = self.order.len() as u32;
    }

    /// Current state of a decal
    pub fn get(&self, handle: DecalHandle) -> Option<&RadiusCursorDecal> {
        self.entries.get(handle).map(|entry| &entry.decal)
    }

    /// Number of live decals
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no decals are live
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Decal buffer as of the last [`update`](Self::update)
    pub fn buffer(&self) -> &[RadiusCursorDecal; MAX_DECALS] {
        &self.buffer
    }

    /// Decal count block as of the last [`update`](Self::update)
    pub fn constants(&self) -> &RadiusCursorDecalConstants {
        &self.constants
    }

    /// The decal texture array
    pub fn textures(&self) -> &RgbaTextureArray {
        &self.textures
    }
}
