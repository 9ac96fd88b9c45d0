//! Per-fragment cascaded shadow visibility

use super::pcf::{sample_optimized_pcf, PcfKernel, ShadowMap};
use super::{ShadowsType, NUM_CASCADES};
use crate::foundation::math::{mix, saturate, saturate_vec3, smoothstep, transform_position, Vec3};
use crate::render::layout::ShadowConstantsPS;

/// Fraction of a cascade's depth range over which it blends into the next one
pub const CASCADE_BLEND_THRESHOLD: f32 = 0.1;

/// Tints used when cascade visualisation is on: red, green, blue, yellow
pub const CASCADE_COLORS: [[f32; 3]; NUM_CASCADES] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
];

/// Fragment inputs to [`shadow_visibility`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFragment {
    /// World-space position
    pub world_position: Vec3,
    /// Positive view-space depth
    pub depth_vs: f32,
    /// Clamped cosine between normal and light
    pub n_dot_l: f32,
    /// Unit world-space normal
    pub normal: Vec3,
    /// Screen-space x derivative of `world_position`
    pub world_position_dx: Vec3,
    /// Screen-space y derivative of `world_position`
    pub world_position_dy: Vec3,
}

impl ShadowFragment {
    /// Fragment with zero screen-space derivatives
    pub fn new(world_position: Vec3, depth_vs: f32, n_dot_l: f32, normal: Vec3) -> Self {
        Self {
            world_position,
            depth_vs,
            n_dot_l,
            normal,
            world_position_dx: Vec3::zeros(),
            world_position_dy: Vec3::zeros(),
        }
    }

    /// Attach screen-space derivatives of the world position
    pub fn with_derivatives(mut self, dx: Vec3, dy: Vec3) -> Self {
        self.world_position_dx = dx;
        self.world_position_dy = dy;
        self
    }
}

/// A position in shadow space with its screen-space derivatives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeProjection {
    /// UV in xy, depth in z
    pub position: Vec3,
    /// x derivative
    pub dx: Vec3,
    /// y derivative
    pub dy: Vec3,
}

impl CascadeProjection {
    /// Move from global shadow space into the space of cascade `index`
    pub fn in_cascade(&self, constants: &ShadowConstantsPS, index: usize) -> Self {
        let offset = constants.cascade_offset(index);
        let scale = constants.cascade_scale(index);
        Self {
            position: (self.position + offset).component_mul(&scale),
            dx: self.dx.component_mul(&scale),
            dy: self.dy.component_mul(&scale),
        }
    }
}

/// Index of the cascade covering `depth_vs`. Later cascades win ties, and the
/// result never exceeds `num_splits - 1` or the last cascade slot.
pub fn select_cascade(depth_vs: f32, splits: &[f32; NUM_CASCADES], num_splits: u32) -> usize {
    let last = (num_splits as usize).saturating_sub(1).min(NUM_CASCADES - 1);
    let mut index = 0;
    for (i, &split) in splits.iter().enumerate().take(last) {
        if depth_vs > split {
            index = i + 1;
        }
    }
    index
}

/// World-space offset along the normal, widest at grazing angles
pub fn normal_offset(
    shadow_map_width: u32,
    n_dot_l: f32,
    normal: &Vec3,
    offset_scale: f32,
    cascade_scale_z: f32,
) -> Vec3 {
    let texel_size = 2.0 / shadow_map_width as f32;
    let normal_offset_scale = saturate(1.0 - n_dot_l);
    texel_size * offset_scale * normal_offset_scale * normal / cascade_scale_z.abs()
}

/// Project a fragment into global shadow space, applying the normal offset
/// for cascade `index`
pub fn project_fragment<M: ShadowMap + ?Sized>(
    shadow_map: &M,
    fragment: &ShadowFragment,
    constants: &ShadowConstantsPS,
    index: usize,
) -> CascadeProjection {
    let (width, _) = shadow_map.size();
    let offset = normal_offset(
        width,
        fragment.n_dot_l,
        &fragment.normal,
        constants.offset_scale,
        constants.cascade_scale(index).z,
    );

    let matrix = constants.shadow_matrix();
    let linear = matrix.fixed_view::<3, 3>(0, 0);
    CascadeProjection {
        position: transform_position(&(fragment.world_position + offset), &matrix),
        dx: linear * fragment.world_position_dx,
        dy: linear * fragment.world_position_dy,
    }
}

/// Filtered, optionally tinted visibility from a single cascade
pub fn sample_shadow_cascade<M: ShadowMap + ?Sized>(
    shadow_map: &M,
    projection: &CascadeProjection,
    index: usize,
    constants: &ShadowConstantsPS,
    kernel: PcfKernel,
) -> Vec3 {
    let projection = projection.in_cascade(constants, index);

    let color = if constants.visualize_cascades != 0 {
        Vec3::from(CASCADE_COLORS[index])
    } else {
        Vec3::repeat(1.0)
    };

    let shadow = sample_optimized_pcf(shadow_map, projection.position, index, constants.bias, kernel);
    color * shadow
}

/// Per-channel visibility of the shadow-casting light, using the kernel the
/// constants' quality level selects
pub fn shadow_visibility<M: ShadowMap + ?Sized>(
    shadow_map: &M,
    fragment: &ShadowFragment,
    constants: &ShadowConstantsPS,
) -> Vec3 {
    // Unknown quality values fall back to the single tap like the GPU switch does.
    let kernel = ShadowsType::from_raw(constants.shadows_type)
        .map_or(PcfKernel::Single, PcfKernel::for_shadows_type);
    shadow_visibility_with_kernel(shadow_map, fragment, constants, kernel)
}

/// [`shadow_visibility`] with an explicit filter kernel
pub fn shadow_visibility_with_kernel<M: ShadowMap + ?Sized>(
    shadow_map: &M,
    fragment: &ShadowFragment,
    constants: &ShadowConstantsPS,
    kernel: PcfKernel,
) -> Vec3 {
    if constants.shadows_type == ShadowsType::None.to_raw() {
        return Vec3::repeat(1.0);
    }

    let depth = fragment.depth_vs;
    let index = select_cascade(depth, &constants.cascade_splits, constants.num_splits);
    let projection = project_fragment(shadow_map, fragment, constants, index);

    let mut visibility = sample_shadow_cascade(shadow_map, &projection, index, constants, kernel);

    if constants.filter_across_cascades != 0 {
        let next_split = constants.cascade_splits[index];
        let split_size = if index == 0 {
            next_split
        } else {
            next_split - constants.cascade_splits[index - 1]
        };
        let split_dist = (next_split - depth) / split_size;

        let has_next = index + 1 < constants.num_splits as usize && index + 1 < NUM_CASCADES;
        if split_dist <= CASCADE_BLEND_THRESHOLD && has_next {
            let next = sample_shadow_cascade(shadow_map, &projection, index + 1, constants, kernel);
            let amount = smoothstep(0.0, CASCADE_BLEND_THRESHOLD, split_dist);
            visibility = mix(next, visibility, amount);
        }
    }

    let distance = constants.shadow_distance;
    let fade = smoothstep(distance * 0.9, distance, depth);
    saturate_vec3(visibility + Vec3::repeat(fade))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shadows::DepthArrayShadowMap;
    use approx::assert_relative_eq;

    fn constants(splits: [f32; 4], num_splits: u32) -> ShadowConstantsPS {
        ShadowConstantsPS {
            cascade_splits: splits,
            num_splits,
            shadow_distance: 1000.0,
            shadows_type: ShadowsType::Soft.to_raw(),
            filter_across_cascades: 1,
            ..ShadowConstantsPS::default()
        }
    }

    fn fragment(depth: f32) -> ShadowFragment {
        ShadowFragment::new(Vec3::new(0.5, 0.5, 0.5), depth, 1.0, Vec3::z())
    }

    /// Cascade 0 fully lit, cascade 1 fully shadowed
    fn lit_then_shadowed() -> DepthArrayShadowMap {
        let mut map = DepthArrayShadowMap::new(16, 16, 2);
        map.fill_layer(1, 0.0);
        map
    }

    #[test]
    fn test_select_cascade_last_match_wins() {
        let splits = [10.0, 30.0, 60.0, 100.0];
        assert_eq!(select_cascade(45.0, &splits, 4), 2);
        assert_eq!(select_cascade(5.0, &splits, 4), 0);
        assert_eq!(select_cascade(10.0, &splits, 4), 0);
        assert_eq!(select_cascade(30.5, &splits, 4), 2);
        assert_eq!(select_cascade(500.0, &splits, 4), 3);
    }

    #[test]
    fn test_select_cascade_respects_num_splits() {
        let splits = [10.0, 30.0, 60.0, 100.0];
        assert_eq!(select_cascade(500.0, &splits, 2), 1);
        assert_eq!(select_cascade(500.0, &splits, 1), 0);
        assert_eq!(select_cascade(500.0, &splits, 0), 0);
        assert_eq!(select_cascade(500.0, &splits, 99), 3);
    }

    #[test]
    fn test_shadows_disabled_is_fully_visible() {
        let mut map = DepthArrayShadowMap::new(4, 4, 1);
        map.fill_layer(0, 0.0);
        let mut c = constants([100.0, 0.0, 0.0, 0.0], 1);
        c.shadows_type = ShadowsType::None.to_raw();

        for kernel in [PcfKernel::Single, PcfKernel::Seven] {
            let v = shadow_visibility_with_kernel(&map, &fragment(5.0), &c, kernel);
            assert_eq!(v, Vec3::repeat(1.0));
        }
    }

    #[test]
    fn test_distance_fade_edges() {
        let mut map = DepthArrayShadowMap::new(16, 16, 1);
        map.fill_layer(0, 0.0);
        let mut c = constants([1000.0, 0.0, 0.0, 0.0], 1);
        c.filter_across_cascades = 0;
        let distance = c.shadow_distance;

        let at_start = shadow_visibility(&map, &fragment(0.9 * distance), &c);
        assert_relative_eq!(at_start, Vec3::zeros(), epsilon = 1e-5);

        let at_end = shadow_visibility(&map, &fragment(distance), &c);
        assert_relative_eq!(at_end, Vec3::repeat(1.0), epsilon = 1e-5);

        let midway = shadow_visibility(&map, &fragment(0.95 * distance), &c);
        assert!(midway.x > 0.0 && midway.x < 1.0);
    }

    #[test]
    fn test_cascade_blend_is_continuous_at_threshold() {
        let map = lit_then_shadowed();
        let c = constants([10.0, 100.0, 0.0, 0.0], 2);

        // split_dist = (10 - depth) / 10 reaches the threshold at depth 9
        let before = shadow_visibility(&map, &fragment(8.99), &c);
        let at = shadow_visibility(&map, &fragment(9.0), &c);
        let after = shadow_visibility(&map, &fragment(9.01), &c);

        assert_relative_eq!(before, Vec3::repeat(1.0), epsilon = 1e-5);
        assert_relative_eq!(at, Vec3::repeat(1.0), epsilon = 1e-4);
        assert_relative_eq!(after.x, 1.0, epsilon = 1e-3);

        let mut previous = shadow_visibility(&map, &fragment(8.98), &c).x;
        for step in 1..=40 {
            let depth = 8.98 + step as f32 * 0.001;
            let value = shadow_visibility(&map, &fragment(depth), &c).x;
            assert!((value - previous).abs() < 1e-3, "jump of {} at depth {}", value - previous, depth);
            previous = value;
        }
    }

    #[test]
    fn test_cascade_blend_reaches_next_cascade_at_split() {
        let map = lit_then_shadowed();
        let c = constants([10.0, 100.0, 0.0, 0.0], 2);

        let at_split = shadow_visibility(&map, &fragment(10.0), &c);
        assert_relative_eq!(at_split, Vec3::zeros(), epsilon = 1e-5);

        let halfway = shadow_visibility(&map, &fragment(9.5), &c);
        assert_relative_eq!(halfway.x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_no_blend_when_disabled_or_last_cascade() {
        let map = lit_then_shadowed();
        let mut c = constants([10.0, 100.0, 0.0, 0.0], 2);
        c.filter_across_cascades = 0;
        assert_relative_eq!(shadow_visibility(&map, &fragment(9.9), &c), Vec3::repeat(1.0));

        let single = constants([10.0, 0.0, 0.0, 0.0], 1);
        assert_relative_eq!(shadow_visibility(&map, &fragment(9.9), &single), Vec3::repeat(1.0));
    }

    #[test]
    fn test_visualize_cascades_tints() {
        let map = DepthArrayShadowMap::new(8, 8, 2);
        let mut c = constants([10.0, 100.0, 0.0, 0.0], 2);
        c.visualize_cascades = 1;
        c.filter_across_cascades = 0;

        let near = shadow_visibility(&map, &fragment(5.0), &c);
        assert_relative_eq!(near, Vec3::new(1.0, 0.0, 0.0));
        let far = shadow_visibility(&map, &fragment(50.0), &c);
        assert_relative_eq!(far, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_normal_offset_scales_with_grazing_angle() {
        let normal = Vec3::z();
        assert_eq!(normal_offset(1024, 1.0, &normal, 0.4, 1.0), Vec3::zeros());

        let grazing = normal_offset(1024, 0.0, &normal, 0.4, -2.0);
        assert_relative_eq!(grazing.z, 2.0 / 1024.0 * 0.4 / 2.0);
    }

    #[test]
    fn test_derivatives_follow_linear_part() {
        let map = DepthArrayShadowMap::new(8, 8, 1);
        let mut c = constants([100.0, 0.0, 0.0, 0.0], 1);
        c.shadow_matrix = crate::foundation::math::mat4_to_gpu(
            &(crate::foundation::math::Mat4::new_translation(&Vec3::new(5.0, 5.0, 5.0))
                * crate::foundation::math::Mat4::new_scaling(2.0)),
        );
        let f = fragment(1.0).with_derivatives(Vec3::x(), Vec3::y());

        let projection = project_fragment(&map, &f, &c, 0);
        assert_relative_eq!(projection.dx, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(projection.dy, Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(projection.position, Vec3::new(6.0, 6.0, 6.0));
    }
}
