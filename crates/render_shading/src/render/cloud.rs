//! Scrolling cloud shadows

use crate::foundation::math::{frac_vec2, Vec2, Vec3};
use crate::render::layout::LightingConstantsVS;
use crate::render::texture::Texture2D;

/// World units covered by one repeat of the cloud texture
pub const CLOUD_TEXTURE_SCALE: f32 = 660.0;

/// Scroll speed in texture repeats per second
pub const CLOUD_SCROLL_SPEED: [f32; 2] = [-0.012, -0.02];

/// Cloud texture coordinate for a world position at `time_in_seconds`
pub fn get_cloud_uv(world_position: &Vec3, lighting: &LightingConstantsVS, time_in_seconds: f32) -> Vec2 {
    let projected = (lighting.cloud_shadow_matrix() * world_position.push(1.0)).xy();
    let scroll = frac_vec2(Vec2::from(CLOUD_SCROLL_SPEED) * time_in_seconds);
    projected / CLOUD_TEXTURE_SCALE + scroll
}

/// Cloud shadow colour multiplied into lit surfaces
pub fn cloud_color<T: Texture2D + ?Sized>(cloud_texture: &T, cloud_uv: Vec2) -> Vec3 {
    cloud_texture.sample(cloud_uv).xyz()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4;
    use crate::render::texture::RgbaTexture;
    use approx::assert_relative_eq;

    #[test]
    fn test_cloud_uv_at_time_zero() {
        let lighting = LightingConstantsVS::default();
        let uv = get_cloud_uv(&Vec3::new(330.0, 660.0, 12.0), &lighting, 0.0);
        assert_relative_eq!(uv, Vec2::new(0.5, 1.0));
    }

    #[test]
    fn test_cloud_uv_scroll_wraps() {
        let lighting = LightingConstantsVS::default();
        let origin = Vec3::zeros();

        let uv = get_cloud_uv(&origin, &lighting, 10.0);
        assert_relative_eq!(uv, Vec2::new(0.88, 0.8), epsilon = 1e-5);

        // 50 s scrolls x by exactly -0.6 and y by exactly one repeat
        let uv = get_cloud_uv(&origin, &lighting, 50.0);
        assert_relative_eq!(uv, Vec2::new(0.4, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_cloud_matrix_is_applied() {
        let lighting = LightingConstantsVS {
            cloud_shadow_matrix: crate::foundation::math::mat4_to_gpu(&Mat4::new_translation(&Vec3::new(66.0, 0.0, 0.0))),
        };
        let uv = get_cloud_uv(&Vec3::zeros(), &lighting, 0.0);
        assert_relative_eq!(uv, Vec2::new(0.1, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_cloud_color_is_texture_rgb() {
        let texture = RgbaTexture::solid(4, 4, [255, 128, 0, 10]);
        let color = cloud_color(&texture, Vec2::new(0.3, 0.7));
        assert_relative_eq!(color, Vec3::new(1.0, 128.0 / 255.0, 0.0), epsilon = 1e-6);
    }
}
