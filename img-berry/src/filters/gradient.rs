//! 梯度幅值.

use ndarray::Array2;

use crate::data::Image2d;
use crate::naming::fmt_g;

use super::smooth::gaussian_smooth;
use super::{clamp_index, fill_indexed, Filter};

/// 中心差分梯度幅值, 导数按像素间距换算为物理单位.
///
/// 边界处邻居被钳制到图像内, 即 `(f[1] - f[0]) / 2`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct GradientMagnitude;

fn gradient_magnitude(img: &Image2d<f32>) -> Image2d<f32> {
    let src = img.data();
    let (h, w) = src.dim();
    let [sx, sy] = img.geometry().spacing;
    let (sx, sy) = (sx as f32, sy as f32);
    let mut out = Array2::<f32>::zeros((h, w));
    fill_indexed(&mut out, |(y, x)| {
        let (y, x) = (y as isize, x as isize);
        let at = |yy: isize, xx: isize| src[(clamp_index(yy, h), clamp_index(xx, w))];
        let dx = (at(y, x + 1) - at(y, x - 1)) / (2.0 * sx);
        let dy = (at(y + 1, x) - at(y - 1, x)) / (2.0 * sy);
        (dx * dx + dy * dy).sqrt()
    });
    img.with_data(out)
}

impl Filter for GradientMagnitude {
    #[inline]
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        gradient_magnitude(img)
    }

    fn tag(&self) -> String {
        "gradmag".to_string()
    }
}

/// 高斯平滑后的梯度幅值. `sigma` 以物理单位给出.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GradientMagnitudeGaussian {
    /// 高斯标准差.
    pub sigma: f64,
}

impl GradientMagnitudeGaussian {
    /// 以标准差构造.
    #[inline]
    pub const fn new(sigma: f64) -> Self {
        Self { sigma }
    }
}

impl Filter for GradientMagnitudeGaussian {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        gradient_magnitude(&gaussian_smooth(img, self.sigma, true, true))
    }

    fn tag(&self) -> String {
        format!("gradmagRec_sigma{}", fmt_g(self.sigma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_x(h: usize, w: usize, slope: f32) -> Image2d<f32> {
        Image2d::new(Array2::from_shape_fn((h, w), |(_, x)| x as f32 * slope))
    }

    #[test]
    fn test_ramp_gradient() {
        let out = GradientMagnitude.apply(&ramp_x(4, 6, 3.0));
        assert_relative_eq!(out[(2, 2)], 3.0);
        // 边界为单侧差分的一半.
        assert_relative_eq!(out[(2, 0)], 1.5);
        assert_relative_eq!(out[(0, 5)], 1.5);
    }

    #[test]
    fn test_spacing_scales_gradient() {
        let mut img = ramp_x(3, 5, 2.0);
        img.geometry_mut().spacing = [0.5, 1.0];
        let out = GradientMagnitude.apply(&img);
        assert_relative_eq!(out[(1, 2)], 4.0);
    }

    #[test]
    fn test_gaussian_gradient_of_ramp() {
        let out = GradientMagnitudeGaussian::new(1.0).apply(&ramp_x(12, 20, 1.0));
        // 远离边界时, 高斯平滑不改变线性斜坡.
        assert_relative_eq!(out[(6, 10)], 1.0, epsilon = 1e-4);
        assert_eq!(GradientMagnitudeGaussian::new(1.0).tag(), "gradmagRec_sigma1");
    }
}
