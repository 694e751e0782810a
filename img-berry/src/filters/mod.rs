//! 2D 滤波器.
//!
//! 所有滤波器在 `f32` 图像上工作, 边界按零通量 (复制边缘像素) 处理.
//! 每个滤波器都能给出一个 `tag`, 用于拼接输出文件名.

use ndarray::{Array2, Zip};

use crate::data::Image2d;
use crate::Idx2d;

mod edge;
mod gradient;
mod intensity;
mod smooth;

pub use edge::Canny;
pub use gradient::{GradientMagnitude, GradientMagnitudeGaussian};
pub use intensity::{
    normalize, rescale, rescale_to, rescale_to_u8, rescale_volume_to, BinaryThreshold, LinearMap,
    ShiftScale, ShiftScaleReport, Threshold,
};
pub use smooth::{AxisGaussian, BinomialBlur, DiscreteGaussian, Mean, Median};

/// 2D 图像滤波器.
pub trait Filter: Send + Sync {
    /// 处理 `img`, 返回新图像. 空间信息保持不变.
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32>;

    /// 文件名中代表该滤波器及其参数的片段, 如 `binomialBlur_R5`.
    fn tag(&self) -> String;
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    #[inline]
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        (**self).apply(img)
    }

    #[inline]
    fn tag(&self) -> String {
        (**self).tag()
    }
}

/// 依次执行的滤波器链. `tag` 由各级 `tag` 以 `_` 逆序连接, 即最后一级在前,
/// 如 `gradmag_mean_5x5`.
#[derive(Default)]
pub struct Chain {
    stages: Vec<Box<dyn Filter>>,
}

impl Chain {
    /// 空链, 即恒等变换.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一级.
    pub fn then<F: Filter + 'static>(mut self, f: F) -> Self {
        self.stages.push(Box::new(f));
        self
    }

    /// 级数.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// 是否为空链.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Filter for Chain {
    fn apply(&self, img: &Image2d<f32>) -> Image2d<f32> {
        let mut out = img.clone();
        for f in self.stages.iter() {
            out = f.apply(&out);
        }
        out
    }

    fn tag(&self) -> String {
        self.stages
            .iter()
            .rev()
            .map(|f| f.tag())
            .collect::<Vec<_>>()
            .join("_")
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// 借助 `rayon`, 并行地以 `op(索引)` 填充 `out` 的每个像素.
        pub(crate) fn fill_indexed<F>(out: &mut Array2<f32>, op: F)
        where
            F: Fn(Idx2d) -> f32 + Sync + Send,
        {
            Zip::indexed(out).par_for_each(|p, o| *o = op(p));
        }
    } else {
        /// 以 `op(索引)` 填充 `out` 的每个像素.
        pub(crate) fn fill_indexed<F>(out: &mut Array2<f32>, op: F)
        where
            F: Fn(Idx2d) -> f32 + Sync + Send,
        {
            Zip::indexed(out).for_each(|p, o| *o = op(p));
        }
    }
}

/// 把越界的一维索引钳制到 `[0, n)` 内 (零通量边界).
#[inline]
pub(crate) fn clamp_index(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}
