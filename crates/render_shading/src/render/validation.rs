//! Host-side checks run before constants are uploaded
//!
//! The shading stages index arrays and divide by host-supplied values
//! without any checks. Everything they assume is verified here instead, and
//! every failure is logged at `warn` before it is returned.

use crate::error::{Result, ShadingError};
use crate::render::layout::{
    GlobalConstants, MeshConstants, MeshVertex, RadiusCursorDecal, RadiusCursorDecalConstants,
    ShadowConstantsPS,
};
use crate::render::shadows::{ShadowMap, ShadowsType, NUM_CASCADES};

fn reported<T>(result: Result<T>) -> Result<T> {
    if let Err(error) = &result {
        log::warn!("Constant validation failed: {}", error);
    }
    result
}

fn check_bool(field: &'static str, value: u32) -> Result<()> {
    if value > 1 {
        return Err(ShadingError::InvalidBool { field, value });
    }
    Ok(())
}

/// Check the shadow block: cascade count, enum and flag values, split order
/// and non-degenerate cascade scales
pub fn validate_shadow_constants(constants: &ShadowConstantsPS) -> Result<()> {
    reported(check_shadow_constants(constants))
}

fn check_shadow_constants(constants: &ShadowConstantsPS) -> Result<()> {
    let shadows_type = ShadowsType::from_raw(constants.shadows_type)?;
    check_bool("visualize_cascades", constants.visualize_cascades)?;
    check_bool("filter_across_cascades", constants.filter_across_cascades)?;

    if shadows_type == ShadowsType::None {
        return Ok(());
    }

    let count = constants.num_splits as usize;
    if count == 0 || count > NUM_CASCADES {
        return Err(ShadingError::CascadeCountOutOfRange { count: constants.num_splits, max: NUM_CASCADES });
    }

    if !(constants.shadow_distance > 0.0) {
        return Err(ShadingError::InvalidShadowDistance(constants.shadow_distance));
    }

    let splits = &constants.cascade_splits[..count];
    if !(splits[0] > 0.0) {
        return Err(ShadingError::NonMonotonicSplits { index: 0, value: splits[0], previous: 0.0 });
    }
    for (index, pair) in splits.windows(2).enumerate() {
        if !(pair[1] > pair[0]) {
            return Err(ShadingError::NonMonotonicSplits { index: index + 1, value: pair[1], previous: pair[0] });
        }
    }

    for index in 0..count {
        let scale = constants.cascade_scale(index);
        if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ShadingError::DegenerateCascadeScale { index });
        }
    }

    Ok(())
}

/// Check that the shadow map has texels and a layer for every cascade
pub fn validate_shadow_map<M: ShadowMap + ?Sized>(shadow_map: &M, constants: &ShadowConstantsPS) -> Result<()> {
    let (width, height) = shadow_map.size();
    let layers = shadow_map.layer_count();
    let required = (constants.num_splits as usize).min(NUM_CASCADES);
    if width == 0 || height == 0 || layers < required {
        return reported(Err(ShadingError::InvalidShadowMap { width, height, layers, required }));
    }
    Ok(())
}

/// Check the decal count against the buffer and each active decal's
/// diameter and texture layer
pub fn validate_decals(
    decals: &[RadiusCursorDecal],
    constants: &RadiusCursorDecalConstants,
    texture_layers: u32,
) -> Result<()> {
    reported(check_decals(decals, constants, texture_layers))
}

fn check_decals(decals: &[RadiusCursorDecal], constants: &RadiusCursorDecalConstants, texture_layers: u32) -> Result<()> {
    let count = constants.num_radius_cursor_decals;
    let active = decals
        .get(..count as usize)
        .ok_or(ShadingError::DecalCountExceedsBuffer { count, capacity: decals.len() })?;

    for (index, decal) in active.iter().enumerate() {
        if !(decal.diameter > 0.0) {
            return Err(ShadingError::InvalidDecalDiameter { index, diameter: decal.diameter });
        }
        if decal.decal_texture_index >= texture_layers {
            return Err(ShadingError::DecalTextureOutOfRange {
                index,
                layer: decal.decal_texture_index,
                layers: texture_layers,
            });
        }
    }
    Ok(())
}

/// Check that every bone a skinned vertex references exists
pub fn validate_bone_indices(vertices: &[MeshVertex], bone_count: usize, mesh: &MeshConstants) -> Result<()> {
    if mesh.skinning_enabled == 0 {
        return Ok(());
    }
    let bad = vertices
        .iter()
        .flat_map(|vertex| vertex.bone_indices)
        .find(|&index| index as usize >= bone_count);
    match bad {
        Some(index) => reported(Err(ShadingError::BoneIndexOutOfRange { index, bone_count })),
        None => Ok(()),
    }
}

/// Check the 32-bit booleans of the per-mesh block
pub fn validate_mesh_constants(mesh: &MeshConstants) -> Result<()> {
    reported(
        check_bool("skinning_enabled", mesh.skinning_enabled)
            .and_then(|()| check_bool("has_house_color", mesh.has_house_color)),
    )
}

/// Check the clipping plane flags of the global block
pub fn validate_global_constants(global: &GlobalConstants) -> Result<()> {
    reported(
        check_bool("has_clipping_plane1", global.has_clipping_plane1)
            .and_then(|()| check_bool("has_clipping_plane2", global.has_clipping_plane2)),
    )
}
