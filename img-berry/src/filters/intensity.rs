//! 灰度变换: 线性重缩放, 平移缩放, 标准化, 阈值.

use crate::data::{Image2d, Pixel, Volume};
use crate::naming::fmt_g;

use super::Filter;

/// 线性映射 `v * scale + shift`, 结果被限制在 `[min, max]` 内.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearMap {
    /// 斜率.
    pub scale: f64,
    /// 截距.
    pub shift: f64,
    /// 输出下限.
    pub min: f64,
    /// 输出上限.
    pub max: f64,
}

impl LinearMap {
    /// 把 `[in_min, in_max]` 映射到 `[out_min, out_max]`.
    ///
    /// 输入为常量时: 若 `in_max != 0`, 斜率为 `(out_max - out_min) / in_max`;
    /// 否则斜率为 0, 所有像素映射到 `out_min`.
    pub fn fit(in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> Self {
        let scale = if in_max != in_min {
            (out_max - out_min) / (in_max - in_min)
        } else if in_max != 0.0 {
            (out_max - out_min) / in_max
        } else {
            0.0
        };
        Self {
            scale,
            shift: out_min - in_min * scale,
            min: out_min.min(out_max),
            max: out_max.max(out_min),
        }
    }

    /// 映射单个值.
    #[inline]
    pub fn apply(&self, v: f32) -> f32 {
        (f64::from(v) * self.scale + self.shift).clamp(self.min, self.max) as f32
    }
}

/// 把图像灰度线性拉伸到 `[out_min, out_max]`.
pub fn rescale<S: Pixel>(img: &Image2d<S>, out_min: f32, out_max: f32) -> Image2d<f32> {
    let (lo, hi) = img.min_max().unwrap_or((0.0, 0.0));
    let map = LinearMap::fit(lo as f64, hi as f64, out_min as f64, out_max as f64);
    img.map(|v| map.apply(v.to_f32()))
}

/// 拉伸到 `[out_min, out_max]` 后转换为像素类型 `T` (截断小数).
#[inline]
pub fn rescale_to<T: Pixel, S: Pixel>(img: &Image2d<S>, out_min: f32, out_max: f32) -> Image2d<T> {
    rescale(img, out_min, out_max).cast()
}

/// 拉伸到 `[0, 255]` 并转换为 `u8`, 即可以直接保存为位图的形式.
#[inline]
pub fn rescale_to_u8<S: Pixel>(img: &Image2d<S>) -> Image2d<u8> {
    rescale_to(img, 0.0, 255.0)
}

/// 体数据版本的 [`rescale_to`]. 最值取自整个体数据.
pub fn rescale_volume_to<T: Pixel, S: Pixel>(
    vol: &Volume<S>,
    out_min: f32,
    out_max: f32,
) -> Volume<T> {
    let (lo, hi) = vol.min_max().unwrap_or((0.0, 0.0));
    let map = LinearMap::fit(lo as f64, hi as f64, out_min as f64, out_max as f64);
    vol.map(|v| T::from_f32(map.apply(v.to_f32())))
}

/// 标准化: 减去均值, 再除以 (无偏) 标准差. 标准差为 0 时输出全 0.
pub fn normalize(img: &Image2d<f32>) -> Image2d<f32> {
    match img.statistics() {
        Some(s) if s.sigma > 0.0 => {
            let (mean, sigma) = (s.mean, s.sigma);
            img.map(|v| ((f64::from(v) - mean) / sigma) as f32)
        }
        _ => img.map(|_| 0.0),
    }
}

/// `(v + shift) * scale`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShiftScale {
    /// 先加上的平移量.
    pub shift: f64,
    /// 再乘上的缩放量.
    pub scale: f64,
}

/// 平移缩放后转换到有界像素类型时, 超出范围的像素个数.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ShiftScaleReport {
    /// 低于类型下限的像素个数.
    pub underflow: usize,
    /// 高于类型上限的像素个数.
    pub overflow: usize,
}

impl ShiftScale {
    /// 构造.
    #[inline]
    pub const fn new(shift: f64, scale: f64) -> Self {
        Self { shift, scale }
    }

    #[inline]
    fn eval(&self, v: f32) -> f32 {
        ((f64::from(v) + self.shift) * self.scale) as f32
    }

    /// 变换后转换为 `T`, 同时统计越界像素.
    pub fn apply_to<T: Pixel>(&self, img: &Image2d<f32>) -> (Image2d<T>, ShiftScaleReport) {
        let mut report = ShiftScaleReport::default();
        let out = img.map(|v| {
            let v = self.eval(v);
            if v < T::MIN_F32 {
                report.underflow += 1;
            } else if v > T::MAX_F32 {
                report.overflow += 1;
            }
            T::from_f32(v)
        });
        (out, report)
    }
}

impl Filter for ShiftScale {
    #[inline]
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        img.map(|v| self.eval(v))
    }

    fn tag(&self) -> String {
        format!("shiftScale_S{}_K{}", fmt_g(self.shift), fmt_g(self.scale))
    }
}

/// 二值阈值: `[lower, upper]` 内的像素取 `inside`, 其余取 `outside`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BinaryThreshold {
    /// 下界 (含).
    pub lower: f32,
    /// 上界 (含).
    pub upper: f32,
    /// 区间内像素的输出值.
    pub inside: f32,
    /// 区间外像素的输出值.
    pub outside: f32,
}

impl Filter for BinaryThreshold {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        img.map(|v| {
            if self.lower <= v && v <= self.upper {
                self.inside
            } else {
                self.outside
            }
        })
    }

    fn tag(&self) -> String {
        format!(
            "binary_{}-{}_in{}_out{}",
            fmt_g(self.lower as f64),
            fmt_g(self.upper as f64),
            fmt_g(self.inside as f64),
            fmt_g(self.outside as f64)
        )
    }
}

/// 阈值: 不满足条件的像素被替换为 `outside`, 其余保持不变.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Threshold {
    /// 低于 `value` 的像素被替换.
    Below {
        /// 阈值.
        value: f32,
        /// 替换值.
        outside: f32,
    },
    /// 高于 `value` 的像素被替换.
    Above {
        /// 阈值.
        value: f32,
        /// 替换值.
        outside: f32,
    },
    /// `[lower, upper]` 之外的像素被替换.
    Outside {
        /// 下界 (含).
        lower: f32,
        /// 上界 (含).
        upper: f32,
        /// 替换值.
        outside: f32,
    },
}

impl Threshold {
    #[inline]
    fn keeps(&self, v: f32) -> bool {
        match *self {
            Threshold::Below { value, .. } => v >= value,
            Threshold::Above { value, .. } => v <= value,
            Threshold::Outside { lower, upper, .. } => lower <= v && v <= upper,
        }
    }

    #[inline]
    fn outside(&self) -> f32 {
        match *self {
            Threshold::Below { outside, .. }
            | Threshold::Above { outside, .. }
            | Threshold::Outside { outside, .. } => outside,
        }
    }
}

impl Filter for Threshold {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        let outside = self.outside();
        img.map(|v| if self.keeps(v) { v } else { outside })
    }

    fn tag(&self) -> String {
        match *self {
            Threshold::Below { value, outside } => {
                format!("thresholdBelow_{}_out{}", fmt_g(value as f64), fmt_g(outside as f64))
            }
            Threshold::Above { value, outside } => {
                format!("thresholdAbove_{}_out{}", fmt_g(value as f64), fmt_g(outside as f64))
            }
            Threshold::Outside {
                lower,
                upper,
                outside,
            } => format!(
                "thresholdOutside_{}-{}_out{}",
                fmt_g(lower as f64),
                fmt_g(upper as f64),
                fmt_g(outside as f64)
            ),
        }
    }
}
