use thiserror::Error;

use crate::Idx2d;

/// 分割失败的原因.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// 种子点不在图像内.
    #[error("seed {seed:?} lies outside image of shape {shape:?}")]
    SeedOutside {
        /// 种子点 `(h, w)`.
        seed: Idx2d,
        /// 图像形状 `(h, w)`.
        shape: Idx2d,
    },

    /// 输入图像没有像素.
    #[error("cannot segment an empty image")]
    EmptyImage,

    /// 分水岭变换构造失败.
    #[error("watershed: {0}")]
    Watershed(String),
}

/// 分割结果.
pub type SegmentResult<T> = Result<T, SegmentError>;
