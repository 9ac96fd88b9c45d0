//! Cascade setup on the host
//!
//! Splits the camera frustum into depth slices, fits an orthographic light
//! camera around each slice, and expresses every cascade as an offset and
//! scale relative to one global shadow matrix so the fragment stage only
//! needs a single matrix multiply.

use crate::config::ShadowSettings;
use crate::error::{Result, ShadingError};
use crate::foundation::math::{mat4_to_gpu, Mat4, Mat4Ext, Point3, Vec3, Vec4};
use crate::render::layout::ShadowConstantsPS;

use super::NUM_CASCADES;

/// Corners of the normalized device cube, near face first (depth 0 to 1)
const NDC_CORNERS: [[f32; 3]; 8] = [
    [-1.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
];

/// The viewing camera as seen by the shadow setup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCamera {
    /// World to view transform
    pub view: Mat4,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width over height
    pub aspect_ratio: f32,
    /// Near plane distance
    pub near_plane: f32,
    /// Far plane distance
    pub far_plane: f32,
}

impl ShadowCamera {
    /// Camera at `eye` looking at `target`
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, fov_y: f32, aspect_ratio: f32, near_plane: f32, far_plane: f32) -> Self {
        Self {
            view: Mat4::look_at(&eye, &target, &up),
            fov_y,
            aspect_ratio,
            near_plane,
            far_plane,
        }
    }

    /// Projection with the far plane pulled in to `far_plane`
    pub fn projection(&self, far_plane: f32) -> Mat4 {
        Mat4::perspective_zo(self.fov_y, self.aspect_ratio, self.near_plane, far_plane)
    }
}

/// Everything the shadow pass and the fragment stage need for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowData {
    /// World to global shadow UV space
    pub shadow_matrix: Mat4,
    /// View-space far distance of each cascade
    pub cascade_splits: [f32; NUM_CASCADES],
    /// Per-cascade offset from global shadow space
    pub cascade_offsets: [Vec4; NUM_CASCADES],
    /// Per-cascade scale from global shadow space
    pub cascade_scales: [Vec4; NUM_CASCADES],
    /// View-projection each cascade's casters are rendered with
    pub shadow_camera_view_projections: [Mat4; NUM_CASCADES],
    /// Width and height of each cascade layer
    pub shadow_map_size: u32,
}

impl Default for ShadowData {
    fn default() -> Self {
        Self {
            shadow_matrix: Mat4::identity(),
            cascade_splits: [0.0; NUM_CASCADES],
            cascade_offsets: [Vec4::zeros(); NUM_CASCADES],
            cascade_scales: [Vec4::repeat(1.0); NUM_CASCADES],
            shadow_camera_view_projections: [Mat4::identity(); NUM_CASCADES],
            shadow_map_size: 1024,
        }
    }
}

impl ShadowData {
    /// Pack the first `num_cascades` cascades into the GPU block, zeroing
    /// the unused slots. Cross-cascade filtering is always enabled.
    pub fn pack(&self, num_cascades: u32, settings: &ShadowSettings) -> Result<ShadowConstantsPS> {
        let count = num_cascades as usize;
        if count == 0 || count > NUM_CASCADES {
            return Err(ShadingError::CascadeCountOutOfRange { count: num_cascades, max: NUM_CASCADES });
        }

        let mut constants = ShadowConstantsPS {
            shadow_matrix: mat4_to_gpu(&self.shadow_matrix),
            cascade_splits: [0.0; NUM_CASCADES],
            cascade_offsets: [[0.0; 4]; NUM_CASCADES],
            cascade_scales: [[0.0; 4]; NUM_CASCADES],
            bias: settings.bias,
            offset_scale: settings.normal_offset,
            visualize_cascades: u32::from(settings.visualize_cascades),
            filter_across_cascades: 1,
            shadow_distance: settings.shadow_distance,
            shadows_type: settings.shadows_type.to_raw(),
            num_splits: num_cascades,
            _padding: 0.0,
        };

        for i in 0..count {
            constants.cascade_splits[i] = self.cascade_splits[i];
            constants.cascade_offsets[i] = self.cascade_offsets[i].into();
            constants.cascade_scales[i] = self.cascade_scales[i].into();
        }

        Ok(constants)
    }
}

/// Computes [`ShadowData`] for a camera and a directional light
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowFrustumCalculator {
    settings: ShadowSettings,
}

impl ShadowFrustumCalculator {
    /// Calculator for `settings`
    pub fn new(settings: ShadowSettings) -> Self {
        Self { settings }
    }

    /// Settings in use
    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// Replace the settings
    pub fn set_settings(&mut self, settings: ShadowSettings) {
        self.settings = settings;
    }

    /// Fit every cascade and return the frame's shadow data
    pub fn calculate(&self, camera: &ShadowCamera, light_direction: Vec3) -> Result<ShadowData> {
        let settings = &self.settings;
        let light_direction = light_direction.normalize();
        let far_plane = camera.far_plane.min(settings.shadow_distance);
        let view_projection = camera.projection(far_plane) * camera.view;
        let inverse_view_projection = view_projection
            .try_inverse()
            .ok_or(ShadingError::SingularMatrix("camera view-projection"))?;

        let full_corners = frustum_corners(&inverse_view_projection);

        let stabilize = settings.stabilize_cascades;
        let up = light_up(
            if stabilize { Vec3::z() } else { camera.view.view_right() },
            &light_direction,
        );

        let global_shadow_matrix = global_shadow_matrix(&full_corners, &light_direction, &up);
        let splits = settings.split_fractions();
        let num_cascades = settings.cascades.count();
        let size = settings.shadow_map_size as f32;

        let mut data = ShadowData {
            shadow_matrix: global_shadow_matrix,
            shadow_map_size: settings.shadow_map_size,
            ..ShadowData::default()
        };

        for cascade in 0..num_cascades {
            let previous_split = if cascade == 0 { 0.0 } else { splits[cascade - 1] };
            let split = splits[cascade];

            let corners = slice_corners(&full_corners, previous_split, split);
            let center = corners.iter().sum::<Vec3>() / 8.0;

            let (min_extents, max_extents) = if stabilize {
                let radius = corners
                    .iter()
                    .map(|corner| (corner - center).norm())
                    .fold(0.0_f32, f32::max);
                let radius = (radius * 16.0).ceil() / 16.0;
                (Vec3::repeat(-radius), Vec3::repeat(radius))
            } else {
                let light_view = Mat4::look_at(&center, &(center + light_direction), &up);
                let mut mins = Vec3::repeat(f32::MAX);
                let mut maxes = Vec3::repeat(f32::MIN);
                for corner in &corners {
                    let p = light_view.transform_point(&Point3::from(*corner)).coords;
                    mins = mins.inf(&p);
                    maxes = maxes.sup(&p);
                }

                let scale = (size + settings.effective_kernel().width() as f32) / size;
                mins.x *= scale;
                mins.y *= scale;
                maxes.x *= scale;
                maxes.y *= scale;
                (mins, maxes)
            };

            let extents = max_extents - min_extents;
            let camera_position = center + light_direction * min_extents.z;

            let view = Mat4::look_at(&camera_position, &center, &up);
            let mut projection = Mat4::orthographic_off_center_zo(
                min_extents.x,
                max_extents.x,
                min_extents.y,
                max_extents.y,
                0.0,
                extents.z,
            );

            if stabilize {
                let origin = (projection * view) * Vec4::new(0.0, 0.0, 0.0, 1.0) * (size / 2.0);
                let rounded = origin.map(f32::round_ties_even);
                let offset = (rounded - origin) * (2.0 / size);
                projection[(0, 3)] += offset.x;
                projection[(1, 3)] += offset.y;
            }

            let cascade_view_projection = projection * view;
            data.shadow_camera_view_projections[cascade] = cascade_view_projection;

            let cascade_matrix = tex_scale_bias() * cascade_view_projection;
            data.cascade_splits[cascade] = camera.near_plane + split * (far_plane - camera.near_plane);

            let inverse_cascade = cascade_matrix
                .try_inverse()
                .ok_or(ShadingError::SingularMatrix("cascade shadow matrix"))?;
            let to_global = |uvw: Point3| {
                let world = inverse_cascade.transform_point(&uvw);
                global_shadow_matrix.transform_point(&world).coords
            };
            let corner = to_global(Point3::origin());
            let other_corner = to_global(Point3::new(1.0, 1.0, 1.0));

            let scale = (other_corner - corner).map(|extent| 1.0 / extent);
            data.cascade_offsets[cascade] = (-corner).push(0.0);
            data.cascade_scales[cascade] = scale.push(1.0);
        }

        log::debug!(
            "Fitted {} shadow cascades, splits {:?}",
            num_cascades,
            &data.cascade_splits[..num_cascades]
        );

        Ok(data)
    }

    /// [`calculate`](Self::calculate) followed by [`ShadowData::pack`]
    pub fn constants(&self, camera: &ShadowCamera, light_direction: Vec3) -> Result<ShadowConstantsPS> {
        let data = self.calculate(camera, light_direction)?;
        data.pack(self.settings.cascades.count() as u32, &self.settings)
    }
}

/// Maps clip-space xy in `[-1, 1]` to UV in `[0, 1]` with y pointing down
fn tex_scale_bias() -> Mat4 {
    Mat4::new_translation(&Vec3::new(0.5, 0.5, 0.0)) * Mat4::new_nonuniform_scaling(&Vec3::new(0.5, -0.5, 1.0))
}

fn frustum_corners(inverse_view_projection: &Mat4) -> [Vec3; 8] {
    NDC_CORNERS.map(|ndc| inverse_view_projection.transform_point(&Point3::from(ndc)).coords)
}

/// Corners of the slice between fractions `near` and `far` of the frustum depth
fn slice_corners(corners: &[Vec3; 8], near: f32, far: f32) -> [Vec3; 8] {
    let mut slice = *corners;
    for i in 0..4 {
        let ray = corners[i + 4] - corners[i];
        slice[i] = corners[i] + ray * near;
        slice[i + 4] = corners[i] + ray * far;
    }
    slice
}

/// `preferred` unless it is parallel to the light, in which case +Y
fn light_up(preferred: Vec3, light_direction: &Vec3) -> Vec3 {
    if preferred.cross(light_direction).norm_squared() < 1e-6 {
        Vec3::y()
    } else {
        preferred
    }
}

/// Unit orthographic camera around the frustum centre, used as the common
/// reference frame for every cascade
fn global_shadow_matrix(corners: &[Vec3; 8], light_direction: &Vec3, up: &Vec3) -> Mat4 {
    let center = corners.iter().sum::<Vec3>() / 8.0;
    let position = center + light_direction * 0.5;
    let view = Mat4::look_at(&position, &center, up);
    let projection = Mat4::orthographic_off_center_zo(-0.5, 0.5, -0.5, 0.5, 0.0, 1.0);
    tex_scale_bias() * projection * view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShadowMapCascades;
    use crate::render::shadows::ShadowsType;
    use approx::assert_relative_eq;

    fn camera() -> ShadowCamera {
        ShadowCamera::look_at(
            Vec3::new(0.0, -60.0, 40.0),
            Vec3::zeros(),
            Vec3::z(),
            std::f32::consts::FRAC_PI_3,
            16.0 / 9.0,
            1.0,
            2000.0,
        )
    }

    fn sun() -> Vec3 {
        Vec3::new(-0.3, 0.2, -0.9).normalize()
    }

    fn settings(stabilize: bool) -> ShadowSettings {
        ShadowSettings {
            shadow_distance: 500.0,
            stabilize_cascades: stabilize,
            ..ShadowSettings::default()
        }
    }

    fn uvw(matrix: &Mat4, p: &Vec3) -> Vec3 {
        matrix.transform_point(&Point3::from(*p)).coords
    }

    #[test]
    fn test_splits_use_clamped_far_plane() {
        let calculator = ShadowFrustumCalculator::new(settings(true));
        let data = calculator.calculate(&camera(), sun()).unwrap();

        let expected = [0.05, 0.15, 0.5, 1.0].map(|f| 1.0 + f * 499.0);
        for (split, expected) in data.cascade_splits.iter().zip(expected) {
            assert_relative_eq!(*split, expected, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_cascade_offset_scale_matches_cascade_projection() {
        for stabilize in [true, false] {
            let calculator = ShadowFrustumCalculator::new(settings(stabilize));
            let data = calculator.calculate(&camera(), sun()).unwrap();

            let points = [Vec3::new(3.0, 10.0, 0.0), Vec3::new(-20.0, 40.0, 5.0), Vec3::new(1.0, 2.0, 3.0)];
            for cascade in 0..NUM_CASCADES {
                let cascade_matrix = tex_scale_bias() * data.shadow_camera_view_projections[cascade];
                for p in &points {
                    let global = uvw(&data.shadow_matrix, p);
                    let via_offsets = (global + data.cascade_offsets[cascade].xyz())
                        .component_mul(&data.cascade_scales[cascade].xyz());
                    let direct = uvw(&cascade_matrix, p);
                    assert_relative_eq!(via_offsets, direct, epsilon = 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_stabilized_slices_fit_inside_their_cascade() {
        let calculator = ShadowFrustumCalculator::new(settings(true));
        let camera = camera();
        let data = calculator.calculate(&camera, sun()).unwrap();

        let inverse = (camera.projection(500.0) * camera.view).try_inverse().unwrap();
        let corners = frustum_corners(&inverse);
        let fractions = calculator.settings().split_fractions();

        for cascade in 0..NUM_CASCADES {
            let near = if cascade == 0 { 0.0 } else { fractions[cascade - 1] };
            let slice = slice_corners(&corners, near, fractions[cascade]);
            let matrix = tex_scale_bias() * data.shadow_camera_view_projections[cascade];
            for corner in &slice {
                let p = uvw(&matrix, corner);
                for value in [p.x, p.y, p.z] {
                    assert!((-1e-3..=1.0 + 1e-3).contains(&value), "cascade {} corner {:?}", cascade, p);
                }
            }
        }
    }

    #[test]
    fn test_stabilized_origin_is_texel_snapped() {
        let calculator = ShadowFrustumCalculator::new(settings(true));
        let data = calculator.calculate(&camera(), sun()).unwrap();
        let half = data.shadow_map_size as f32 / 2.0;

        for view_projection in &data.shadow_camera_view_projections {
            let origin = view_projection * Vec4::new(0.0, 0.0, 0.0, 1.0) * half;
            assert_relative_eq!(origin.x, origin.x.round(), epsilon = 1e-2);
            assert_relative_eq!(origin.y, origin.y.round(), epsilon = 1e-2);
        }
    }

    #[test]
    fn test_pack_zero_fills_unused_cascades() {
        let shadow_settings = ShadowSettings {
            cascades: ShadowMapCascades::Two,
            shadows_type: ShadowsType::Hard,
            visualize_cascades: true,
            ..settings(true)
        };
        let calculator = ShadowFrustumCalculator::new(shadow_settings.clone());
        let constants = calculator.constants(&camera(), sun()).unwrap();

        assert_eq!(constants.num_splits, 2);
        assert_eq!(constants.filter_across_cascades, 1);
        assert_eq!(constants.visualize_cascades, 1);
        assert_eq!(constants.shadows_type, ShadowsType::Hard.to_raw());
        assert_eq!(constants.cascade_splits[2], 0.0);
        assert_eq!(constants.cascade_offsets[3], [0.0; 4]);
        assert_eq!(constants.cascade_scales[2], [0.0; 4]);
        assert!(constants.cascade_splits[1] > constants.cascade_splits[0]);
        assert_relative_eq!(constants.bias, shadow_settings.bias);
    }

    #[test]
    fn test_pack_rejects_bad_cascade_count() {
        let data = ShadowData::default();
        let settings = ShadowSettings::default();
        assert!(matches!(
            data.pack(0, &settings),
            Err(ShadingError::CascadeCountOutOfRange { count: 0, .. })
        ));
        assert!(matches!(
            data.pack(5, &settings),
            Err(ShadingError::CascadeCountOutOfRange { count: 5, max: 4 })
        ));
    }

    #[test]
    fn test_vertical_light_falls_back_to_another_up_vector() {
        let calculator = ShadowFrustumCalculator::new(settings(true));
        let data = calculator.calculate(&camera(), -Vec3::z()).unwrap();
        assert!(data.shadow_matrix.iter().all(|v| v.is_finite()));
        assert!(data.cascade_scales.iter().all(|s| s.iter().all(|v| v.is_finite())));
    }
}
