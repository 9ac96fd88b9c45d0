//! Percentage-closer filtering
//!
//! The wide kernels place taps between texel centres so that each hardware
//! bilinear comparison covers a 2x2 block, which lets an NxN tent filter run
//! with `((N + 1) / 2)^2` taps. The per-axis weights for each kernel sum to
//! a constant so the result is divided by that constant squared.

use serde::{Deserialize, Serialize};

use super::ShadowsType;
use crate::foundation::math::{Vec2, Vec3};

/// Filter footprint used by [`sample_optimized_pcf`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PcfKernel {
    /// One hardware bilinear comparison at the sample position
    Single,
    /// 3x3 tent, 2x2 taps
    Three,
    /// 5x5 tent, 3x3 taps
    Five,
    /// 7x7 tent, 4x4 taps
    Seven,
}

/// Per-axis tap weights and texel offsets for one kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTaps {
    weights: [f32; 4],
    offsets: [f32; 4],
    len: usize,
}

impl AxisTaps {
    fn new<const N: usize>(weights: [f32; N], offsets: [f32; N]) -> Self {
        let mut taps = Self { weights: [0.0; 4], offsets: [0.0; 4], len: N };
        taps.weights[..N].copy_from_slice(&weights);
        taps.offsets[..N].copy_from_slice(&offsets);
        taps
    }

    /// `(weight, offset in texels)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.weights[..self.len]
            .iter()
            .copied()
            .zip(self.offsets[..self.len].iter().copied())
    }

    /// Number of taps along the axis
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Sum of the weights along the axis
    pub fn weight_sum(&self) -> f32 {
        self.weights[..self.len].iter().sum()
    }
}

impl PcfKernel {
    /// Kernel selected by a quality level. Only `Soft` widens the filter.
    pub const fn for_shadows_type(shadows_type: ShadowsType) -> Self {
        match shadows_type {
            ShadowsType::Soft => Self::Five,
            ShadowsType::None | ShadowsType::Hard => Self::Single,
        }
    }

    /// Footprint width in texels, used to pad cascade extents
    pub const fn width(self) -> u32 {
        match self {
            Self::Single => 2,
            Self::Three => 3,
            Self::Five => 5,
            Self::Seven => 7,
        }
    }

    /// Divisor applied to the weighted tap sum
    pub const fn normalizer(self) -> f32 {
        match self {
            Self::Single => 1.0,
            Self::Three => 16.0,
            Self::Five => 144.0,
            Self::Seven => 2704.0,
        }
    }

    /// Tap weights and offsets along one axis for sub-texel position `s`
    pub fn axis_taps(self, s: f32) -> AxisTaps {
        match self {
            Self::Single => AxisTaps::new([1.0], [0.0]),
            Self::Three => {
                let w0 = 3.0 - 2.0 * s;
                let w1 = 1.0 + 2.0 * s;
                AxisTaps::new([w0, w1], [(2.0 - s) / w0 - 1.0, s / w1 + 1.0])
            }
            Self::Five => {
                let w0 = 4.0 - 3.0 * s;
                let w1 = 7.0;
                let w2 = 1.0 + 3.0 * s;
                AxisTaps::new(
                    [w0, w1, w2],
                    [(3.0 - 2.0 * s) / w0 - 2.0, (3.0 + s) / w1, s / w2 + 2.0],
                )
            }
            Self::Seven => {
                let w0 = 5.0 * s - 6.0;
                let w1 = 11.0 * s - 28.0;
                let w2 = -(11.0 * s + 17.0);
                let w3 = -(5.0 * s + 1.0);
                AxisTaps::new(
                    [w0, w1, w2, w3],
                    [
                        (4.0 * s - 5.0) / w0 - 3.0,
                        (4.0 * s - 16.0) / w1 - 1.0,
                        -(7.0 * s + 5.0) / w2 + 1.0,
                        -s / w3 + 3.0,
                    ],
                )
            }
        }
    }
}

/// A layered depth texture sampled with a comparison sampler
pub trait ShadowMap {
    /// Width and height of each layer in texels
    fn size(&self) -> (u32, u32);

    /// Number of array layers
    fn layer_count(&self) -> usize;

    /// Bilinear-filtered `reference <= stored` comparison at `uv` in `layer`.
    /// Coordinates clamp to the edge.
    fn sample_compare(&self, uv: Vec2, layer: usize, reference: f32) -> f32;
}

/// CPU depth array, one layer per cascade
#[derive(Debug, Clone, PartialEq)]
pub struct DepthArrayShadowMap {
    width: u32,
    height: u32,
    layers: Vec<Vec<f32>>,
}

impl DepthArrayShadowMap {
    /// Map with every texel at the far plane (fully lit)
    pub fn new(width: u32, height: u32, layer_count: usize) -> Self {
        let texels = width as usize * height as usize;
        Self {
            width,
            height,
            layers: vec![vec![1.0; texels]; layer_count],
        }
    }

    /// Fill one layer with a constant depth
    pub fn fill_layer(&mut self, layer: usize, depth: f32) {
        if let Some(texels) = self.layers.get_mut(layer) {
            texels.fill(depth);
        }
    }

    /// Write one texel; out-of-range writes are ignored
    pub fn set_depth(&mut self, layer: usize, x: u32, y: u32, depth: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        if let Some(texels) = self.layers.get_mut(layer) {
            texels[index] = depth;
        }
    }

    /// Read one texel
    pub fn depth(&self, layer: usize, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.layers.get(layer).map(|texels| texels[self.index(x, y)])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn compare_texel(&self, texels: &[f32], x: i64, y: i64, reference: f32) -> f32 {
        let x = x.clamp(0, i64::from(self.width) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height) - 1) as u32;
        if reference <= texels[self.index(x, y)] {
            1.0
        } else {
            0.0
        }
    }
}

impl ShadowMap for DepthArrayShadowMap {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn sample_compare(&self, uv: Vec2, layer: usize, reference: f32) -> f32 {
        if self.width == 0 || self.height == 0 || self.layers.is_empty() {
            return 1.0;
        }
        let texels = &self.layers[layer.min(self.layers.len() - 1)];

        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.compare_texel(texels, x0, y0, reference);
        let c10 = self.compare_texel(texels, x0 + 1, y0, reference);
        let c01 = self.compare_texel(texels, x0, y0 + 1, reference);
        let c11 = self.compare_texel(texels, x0 + 1, y0 + 1, reference);

        let top = c00 + (c10 - c00) * fx;
        let bottom = c01 + (c11 - c01) * fx;
        top + (bottom - top) * fy
    }
}

/// Filtered shadow test for `shadow_pos` (UV in xy, depth in z) in `layer`
pub fn sample_optimized_pcf<M: ShadowMap + ?Sized>(
    shadow_map: &M,
    shadow_pos: Vec3,
    layer: usize,
    bias: f32,
    kernel: PcfKernel,
) -> f32 {
    let light_depth = shadow_pos.z - bias;

    if kernel == PcfKernel::Single {
        return shadow_map.sample_compare(shadow_pos.xy(), layer, light_depth);
    }

    let (width, height) = shadow_map.size();
    let size = Vec2::new(width as f32, height as f32);
    let size_inv = Vec2::new(1.0 / size.x, 1.0 / size.y);

    let uv = shadow_pos.xy().component_mul(&size);
    let base = (uv + Vec2::repeat(0.5)).map(f32::floor);
    let s = uv.x + 0.5 - base.x;
    let t = uv.y + 0.5 - base.y;
    let base_uv = (base - Vec2::repeat(0.5)).component_mul(&size_inv);

    let u_taps = kernel.axis_taps(s);
    let v_taps = kernel.axis_taps(t);

    let mut sum = 0.0;
    for (vw, v) in v_taps.iter() {
        for (uw, u) in u_taps.iter() {
            let tap = base_uv + Vec2::new(u, v).component_mul(&size_inv);
            sum += uw * vw * shadow_map.sample_compare(tap, layer, light_depth);
        }
    }

    sum / kernel.normalizer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const WIDE_KERNELS: [PcfKernel; 3] = [PcfKernel::Three, PcfKernel::Five, PcfKernel::Seven];

    fn noisy_map(size: u32) -> DepthArrayShadowMap {
        let mut map = DepthArrayShadowMap::new(size, size, 1);
        let mut state = 0x2545_f491_u32;
        for y in 0..size {
            for x in 0..size {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                map.set_depth(0, x, y, (state % 1000) as f32 / 1000.0);
            }
        }
        map
    }

    #[test]
    fn test_tap_counts() {
        assert_eq!(PcfKernel::Single.axis_taps(0.5).len(), 1);
        assert_eq!(PcfKernel::Three.axis_taps(0.5).len(), 2);
        assert_eq!(PcfKernel::Five.axis_taps(0.5).len(), 3);
        assert_eq!(PcfKernel::Seven.axis_taps(0.5).len(), 4);
    }

    #[test]
    fn test_tap_weights_sum_to_normalizer() {
        for kernel in WIDE_KERNELS {
            for i in 0..=10 {
                let s = i as f32 / 10.0;
                for j in 0..=10 {
                    let t = j as f32 / 10.0;
                    let u = kernel.axis_taps(s);
                    let v = kernel.axis_taps(t);
                    let mut total = 0.0;
                    for (vw, _) in v.iter() {
                        for (uw, _) in u.iter() {
                            total += uw * vw;
                        }
                    }
                    assert_relative_eq!(total, kernel.normalizer(), max_relative = 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_five_tap_weights_are_positive() {
        for i in 0..=10 {
            let taps = PcfKernel::Five.axis_taps(i as f32 / 10.0);
            assert!(taps.iter().all(|(w, _)| w > 0.0));
            assert_relative_eq!(taps.weight_sum(), 12.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_kernel_for_shadows_type() {
        assert_eq!(PcfKernel::for_shadows_type(ShadowsType::Soft), PcfKernel::Five);
        assert_eq!(PcfKernel::for_shadows_type(ShadowsType::Hard), PcfKernel::Single);
        assert_eq!(PcfKernel::for_shadows_type(ShadowsType::None), PcfKernel::Single);
    }

    #[test]
    fn test_uniform_maps_give_binary_results() {
        let lit = DepthArrayShadowMap::new(64, 64, 1);
        let mut shadowed = DepthArrayShadowMap::new(64, 64, 1);
        shadowed.fill_layer(0, 0.0);

        let pos = Vec3::new(0.37, 0.61, 0.5);
        for kernel in [PcfKernel::Single, PcfKernel::Three, PcfKernel::Five, PcfKernel::Seven] {
            assert_relative_eq!(sample_optimized_pcf(&lit, pos, 0, 0.0, kernel), 1.0, epsilon = 1e-5);
            assert_relative_eq!(sample_optimized_pcf(&shadowed, pos, 0, 0.0, kernel), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_results_stay_in_unit_range() {
        let map = noisy_map(32);
        for kernel in [PcfKernel::Single, PcfKernel::Three, PcfKernel::Five, PcfKernel::Seven] {
            for i in 0..25 {
                let pos = Vec3::new(
                    (i as f32 * 0.137).fract(),
                    (i as f32 * 0.291).fract(),
                    (i as f32 * 0.043).fract(),
                );
                let value = sample_optimized_pcf(&map, pos, 0, 0.001, kernel);
                assert!(
                    (-1e-5..=1.0 + 1e-5).contains(&value),
                    "{:?} at {:?} gave {}",
                    kernel,
                    pos,
                    value
                );
            }
        }
    }

    #[test]
    fn test_bias_moves_the_comparison() {
        let mut map = DepthArrayShadowMap::new(8, 8, 1);
        map.fill_layer(0, 0.5);
        let pos = Vec3::new(0.5, 0.5, 0.501);
        assert_eq!(sample_optimized_pcf(&map, pos, 0, 0.0, PcfKernel::Single), 0.0);
        assert_eq!(sample_optimized_pcf(&map, pos, 0, 0.002, PcfKernel::Single), 1.0);
    }

    #[test]
    fn test_bilinear_comparison_blends_neighbours() {
        let mut map = DepthArrayShadowMap::new(2, 1, 1);
        map.set_depth(0, 0, 0, 1.0);
        map.set_depth(0, 1, 0, 0.0);

        assert_relative_eq!(map.sample_compare(Vec2::new(0.5, 0.5), 0, 0.5), 0.5);
        assert_relative_eq!(map.sample_compare(Vec2::new(0.25, 0.5), 0, 0.5), 1.0);
        assert_relative_eq!(map.sample_compare(Vec2::new(0.0, 0.5), 0, 0.5), 1.0);
        assert_relative_eq!(map.sample_compare(Vec2::new(1.0, 0.5), 0, 0.5), 0.0);
    }

    #[test]
    fn test_layer_index_clamps() {
        let mut map = DepthArrayShadowMap::new(4, 4, 2);
        map.fill_layer(1, 0.0);
        assert_eq!(map.sample_compare(Vec2::new(0.5, 0.5), 5, 0.5), 0.0);
        assert_eq!(map.depth(0, 4, 0), None);
    }
}
