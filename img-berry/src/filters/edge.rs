//! 边缘检测.

use imageproc::edges::canny;

use crate::data::Image2d;
use crate::naming::fmt_g;

use super::{DiscreteGaussian, Filter, LinearMap};

/// 离散高斯预平滑的核宽上限.
const CANNY_MAX_KERNEL_WIDTH: usize = 32;

/// Canny 边缘检测. 输出中边缘像素为 255, 其余为 0.
///
/// # 注意
///
/// 先以方差 `variance` 做离散高斯平滑. 平滑结果已在 `[0, 255]` 内时直接量化为
/// 8-bit, 否则先把 `[min, max]` 线性映射到 `[0, 255]`, `lower` / `upper` 也按同一
/// 斜率缩放, 因此阈值始终以输入图像的灰度为单位. 非常量的图像不会因为超出
/// 8-bit 范围而丢失边缘. `imageproc` 内部还会再做一次 `sigma = 1.4` 的高斯模糊.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Canny {
    /// 预平滑方差.
    pub variance: f64,
    /// 低阈值, 梯度低于它的像素不可能是边缘.
    pub lower: f32,
    /// 高阈值, 梯度高于它的像素一定是边缘.
    pub upper: f32,
}

impl Canny {
    /// 构造.
    #[inline]
    pub const fn new(variance: f64, lower: f32, upper: f32) -> Self {
        Self {
            variance,
            lower,
            upper,
        }
    }
}

impl Filter for Canny {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        let smoothed = DiscreteGaussian::new(self.variance, CANNY_MAX_KERNEL_WIDTH).apply(img);
        let (lo, hi) = smoothed.min_max().unwrap_or((0.0, 0.0));
        let in_range = lo >= 0.0 && hi <= 255.0;
        if !in_range && lo == hi {
            return img.map(|_| 0.0);
        }
        let map = if in_range {
            LinearMap::fit(0.0, 255.0, 0.0, 255.0)
        } else {
            LinearMap::fit(f64::from(lo), f64::from(hi), 0.0, 255.0)
        };
        let gray = smoothed.map(|v| map.apply(v)).cast::<u8>().to_gray_image();
        let scale = map.scale as f32;
        let edges = canny(&gray, self.lower * scale, self.upper * scale);
        let out = Image2d::from_gray_image(&edges).to_f32();
        img.with_data(out.into_raw())
    }

    fn tag(&self) -> String {
        format!(
            "canny_var{}_thr{}-{}",
            fmt_g(self.variance),
            fmt_g(self.lower as f64),
            fmt_g(self.upper as f64)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_step_edge() {
        let data = Array2::from_shape_fn((20, 20), |(_, x)| if x < 10 { 0.0f32 } else { 200.0 });
        let f = Canny::new(1.0, 10.0, 30.0);
        let out = f.apply(&Image2d::new(data));

        assert!(out.data().iter().all(|&v| v == 0.0 || v == 255.0));
        assert!((8..12).any(|x| out.data().column(x).iter().any(|&v| v == 255.0)));
        for x in 0..5 {
            assert!(out.data().column(x).iter().all(|&v| v == 0.0));
        }
        assert_eq!(f.tag(), "canny_var1_thr10-30");
    }

    fn step(low: f32, high: f32) -> Image2d<f32> {
        Image2d::new(Array2::from_shape_fn((20, 20), |(_, x)| {
            if x < 10 {
                low
            } else {
                high
            }
        }))
    }

    fn edge_columns(out: &Image2d<f32>) -> Vec<usize> {
        (0..out.width())
            .filter(|&x| out.data().column(x).iter().any(|&v| v == 255.0))
            .collect()
    }

    #[test]
    fn test_step_edge_above_u8_range() {
        let out = Canny::new(1.0, 10.0, 30.0).apply(&step(1000.0, 2000.0));
        let cols = edge_columns(&out);
        assert!(!cols.is_empty());
        assert!(cols.iter().all(|x| (7..13).contains(x)));
    }

    #[test]
    fn test_step_edge_hounsfield_like() {
        let out = Canny::new(1.0, 100.0, 300.0).apply(&step(-1000.0, 1000.0));
        let cols = edge_columns(&out);
        assert!(!cols.is_empty());
        assert!(cols.iter().all(|x| (7..13).contains(x)));
        assert!(out.data().iter().all(|&v| v == 0.0 || v == 255.0));
    }

    #[test]
    fn test_step_edge_negative_values() {
        let out = Canny::new(1.0, 10.0, 30.0).apply(&step(-50.0, 50.0));
        assert!(!edge_columns(&out).is_empty());
    }

    #[test]
    fn test_thresholds_in_input_units() {
        // 阶跃高度 2000 远低于阈值时不应有边缘.
        let out = Canny::new(1.0, 1e6, 2e6).apply(&step(-1000.0, 1000.0));
        assert!(edge_columns(&out).is_empty());
    }

    #[test]
    fn test_constant_out_of_range() {
        let img = Image2d::new(Array2::from_elem((8, 8), -300.0f32));
        let out = Canny::new(1.0, 10.0, 30.0).apply(&img);
        assert!(out.data().iter().all(|&v| v == 0.0));
    }
}
