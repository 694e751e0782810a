//! 读写错误.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::{LayoutError, PixelKind};

/// 图像读写错误.
#[derive(Debug, Error)]
pub enum IoError {
    /// 文件系统错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// png/jpg/bmp/tif 编解码错误.
    #[error(transparent)]
    Raster(#[from] image::ImageError),

    /// NIfTI 编解码错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// npy 读取错误.
    #[error(transparent)]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    /// npy 写入错误.
    #[error(transparent)]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    /// DICOM 解析或像素解码错误.
    #[error("DICOM: {0}")]
    Dicom(String),

    /// MetaImage 头文件不合法.
    #[error("MetaImage header `{path}`: {reason}")]
    MetaHeader {
        /// 头文件路径.
        path: PathBuf,
        /// 原因.
        reason: String,
    },

    /// 无法由扩展名判断格式, 或该格式不支持此操作.
    #[error("unsupported format for `{0}`")]
    UnsupportedFormat(String),

    /// 图像维数不符合要求.
    #[error("`{path}` is a {found}D image, expected {expected}D")]
    Dimension {
        /// 文件路径.
        path: PathBuf,
        /// 期望的维数.
        expected: usize,
        /// 实际维数.
        found: usize,
    },

    /// 该格式无法存储此像素类型.
    #[error("{format} cannot store pixel type {kind}")]
    PixelType {
        /// 像素类型.
        kind: PixelKind,
        /// 格式名.
        format: &'static str,
    },

    /// `.raw` 文件旁找不到头文件.
    #[error("no .mhd/.mha/.nhdr header found for `{0}`")]
    MissingHeader(PathBuf),

    /// 像素个数与形状不符.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// 读写结果.
pub type IoResult<T> = Result<T, IoError>;
