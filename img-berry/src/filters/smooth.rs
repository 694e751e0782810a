//! 平滑滤波: 均值, 中值, 离散高斯, 二项式模糊, 单方向高斯.

use ndarray::{Array2, ArrayView2, Axis};
use ordered_float::OrderedFloat;

use crate::data::Image2d;
use crate::naming::fmt_g;

use super::{clamp_index, fill_indexed, Filter};

/// 沿 `axis` 做一维卷积. `kernel` 长度为奇数, 中心对齐.
pub(crate) fn convolve_axis(src: ArrayView2<f32>, kernel: &[f32], axis: Axis) -> Array2<f32> {
    let r = (kernel.len() / 2) as isize;
    let (h, w) = src.dim();
    let mut out = Array2::<f32>::zeros((h, w));
    fill_indexed(&mut out, |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &c)| {
                let off = k as isize - r;
                let p = if axis == Axis(0) {
                    (clamp_index(y as isize + off, h), x)
                } else {
                    (y, clamp_index(x as isize + off, w))
                };
                c * src[p]
            })
            .sum()
    });
    out
}

/// 归一化的采样高斯核, 半径为 `radius`.
pub(crate) fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f32> {
    if sigma <= 0.0 || radius == 0 {
        return vec![1.0];
    }
    let r = radius as isize;
    let raw: Vec<f64> = (-r..=r)
        .map(|i| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|v| (v / sum) as f32).collect()
}

/// 以像素为单位的 `sigma` 在两个方向上做高斯平滑. 核半径为 `ceil(4 sigma)`.
pub(crate) fn gaussian_smooth(img: &Image2d<f32>, sigma: f64, x: bool, y: bool) -> Image2d<f32> {
    let g = img.geometry();
    let mut data = img.data().to_owned();
    for (on, axis, spacing) in [(x, Axis(1), g.spacing[0]), (y, Axis(0), g.spacing[1])] {
        if !on {
            continue;
        }
        let sigma_px = sigma / spacing.abs().max(f64::EPSILON);
        let kernel = gaussian_kernel(sigma_px, (4.0 * sigma_px).ceil() as usize);
        data = convolve_axis(data.view(), &kernel, axis);
    }
    img.with_data(data)
}

/// 均值滤波, 窗口为 `(2r + 1) x (2r + 1)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Mean {
    /// 邻域半径.
    pub radius: usize,
}

impl Mean {
    /// 以半径构造.
    #[inline]
    pub const fn new(radius: usize) -> Self {
        Self { radius }
    }

    /// 以窗口边长构造, 半径为 `kernel / 2`.
    #[inline]
    pub const fn with_kernel(kernel: usize) -> Self {
        Self::new(kernel / 2)
    }

    /// 窗口边长.
    #[inline]
    pub const fn kernel(&self) -> usize {
        2 * self.radius + 1
    }
}

impl Filter for Mean {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        let k = self.kernel();
        let kernel = vec![1.0 / k as f32; k];
        let rows = convolve_axis(img.data(), &kernel, Axis(1));
        img.with_data(convolve_axis(rows.view(), &kernel, Axis(0)))
    }

    fn tag(&self) -> String {
        format!("mean_{0}x{0}", self.kernel())
    }
}

/// 中值滤波, 窗口为 `(2r + 1) x (2r + 1)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Median {
    /// 邻域半径.
    pub radius: usize,
}

impl Median {
    /// 以半径构造.
    #[inline]
    pub const fn new(radius: usize) -> Self {
        Self { radius }
    }

    /// 以窗口边长构造, 半径为 `kernel / 2`.
    #[inline]
    pub const fn with_kernel(kernel: usize) -> Self {
        Self::new(kernel / 2)
    }

    /// 窗口边长.
    #[inline]
    pub const fn kernel(&self) -> usize {
        2 * self.radius + 1
    }
}

impl Filter for Median {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        let src = img.data();
        let (h, w) = src.dim();
        let r = self.radius as isize;
        let mut out = Array2::<f32>::zeros((h, w));
        fill_indexed(&mut out, |(y, x)| {
            let mut window = Vec::with_capacity(self.kernel() * self.kernel());
            for dy in -r..=r {
                for dx in -r..=r {
                    let p = (clamp_index(y as isize + dy, h), clamp_index(x as isize + dx, w));
                    window.push(OrderedFloat(src[p]));
                }
            }
            let mid = window.len() / 2;
            window.select_nth_unstable(mid).1 .0
        });
        img.with_data(out)
    }

    fn tag(&self) -> String {
        format!("median_{0}x{0}", self.kernel())
    }
}

/// 离散高斯平滑.
///
/// 方差以物理单位给出, 会按像素间距换算. 核宽度取满足截断误差
/// `max_error` 的最小奇数, 但不超过 `max_kernel_width`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DiscreteGaussian {
    /// 高斯方差.
    pub variance: f64,

    /// 核的最大宽度.
    pub max_kernel_width: usize,

    /// 允许被截断的高斯质量.
    pub max_error: f64,
}

impl DiscreteGaussian {
    /// 默认截断误差为 0.01.
    #[inline]
    pub const fn new(variance: f64, max_kernel_width: usize) -> Self {
        Self {
            variance,
            max_kernel_width,
            max_error: 0.01,
        }
    }

    /// 给定像素单位 `sigma` 时的核半径.
    fn radius_for(&self, sigma: f64) -> usize {
        let max_radius = self.max_kernel_width.saturating_sub(1) / 2;
        if sigma <= 0.0 {
            return 0;
        }
        let full = gaussian_kernel(sigma, (6.0 * sigma).ceil() as usize + 1);
        let center = full.len() / 2;
        (0..=max_radius)
            .find(|&r| {
                let mass: f32 = full[center.saturating_sub(r)..=(center + r).min(full.len() - 1)]
                    .iter()
                    .sum();
                f64::from(mass) >= 1.0 - self.max_error
            })
            .unwrap_or(max_radius)
    }
}

impl Filter for DiscreteGaussian {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        let g = img.geometry();
        let mut data = img.data().to_owned();
        for (axis, spacing) in [(Axis(1), g.spacing[0]), (Axis(0), g.spacing[1])] {
            let sigma = (self.variance.max(0.0)).sqrt() / spacing.abs().max(f64::EPSILON);
            let kernel = gaussian_kernel(sigma, self.radius_for(sigma));
            if kernel.len() > 1 {
                data = convolve_axis(data.view(), &kernel, axis);
            }
        }
        img.with_data(data)
    }

    fn tag(&self) -> String {
        format!(
            "discreteGaussian_V{}_K{}",
            fmt_g(self.variance),
            self.max_kernel_width
        )
    }
}

/// 二项式模糊: 每次重复都在两个方向上各做一次 `[1, 2, 1] / 4` 平滑.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BinomialBlur {
    /// 重复次数.
    pub repetitions: usize,
}

impl BinomialBlur {
    /// 以重复次数构造.
    #[inline]
    pub const fn new(repetitions: usize) -> Self {
        Self { repetitions }
    }
}

impl Filter for BinomialBlur {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        const KERNEL: [f32; 3] = [0.25, 0.5, 0.25];
        let mut data = img.data().to_owned();
        for _ in 0..self.repetitions {
            data = convolve_axis(data.view(), &KERNEL, Axis(1));
            data = convolve_axis(data.view(), &KERNEL, Axis(0));
        }
        img.with_data(data)
    }

    fn tag(&self) -> String {
        format!("binomialBlur_R{}", self.repetitions)
    }
}

/// 沿指定方向的零阶高斯平滑. `sigma` 以物理单位给出.
///
/// 文件名片段沿用 `recursiveGaussian` 的叫法.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisGaussian {
    /// 标准差.
    pub sigma: f64,

    /// 是否沿 x (宽度) 方向平滑.
    pub along_x: bool,

    /// 是否沿 y (高度) 方向平滑.
    pub along_y: bool,
}

impl AxisGaussian {
    /// 只沿 x 方向.
    #[inline]
    pub const fn x(sigma: f64) -> Self {
        Self {
            sigma,
            along_x: true,
            along_y: false,
        }
    }

    /// 只沿 y 方向.
    #[inline]
    pub const fn y(sigma: f64) -> Self {
        Self {
            sigma,
            along_x: false,
            along_y: true,
        }
    }

    /// 先 x 后 y.
    #[inline]
    pub const fn xy(sigma: f64) -> Self {
        Self {
            sigma,
            along_x: true,
            along_y: true,
        }
    }
}

impl Filter for AxisGaussian {
    #[inline]
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        gaussian_smooth(img, self.sigma, self.along_x, self.along_y)
    }

    fn tag(&self) -> String {
        format!(
            "recursiveGaussian{}{}_S{}",
            if self.along_x { "X" } else { "" },
            if self.along_y { "Y" } else { "" },
            fmt_g(self.sigma)
        )
    }
}
