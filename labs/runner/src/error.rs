//! 命令执行错误.

use img_berry::data::LayoutError;
use img_berry::io::IoError;
use img_berry::segment::SegmentError;
use img_berry::series::SeriesError;
use thiserror::Error;
use utils::UsageError;

/// 命令执行失败的原因.
#[derive(Debug, Error)]
pub enum LabError {
    /// 命令行用法错误. 调用方应打印用法.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// 图像读写失败.
    #[error("image i/o: {0}")]
    Io(#[from] IoError),

    /// 序列读取失败.
    #[error("series: {0}")]
    Series(#[from] SeriesError),

    /// 分割失败.
    #[error("segmentation: {0}")]
    Segment(#[from] SegmentError),

    /// 切片或堆叠失败.
    #[error("layout: {0}")]
    Layout(#[from] LayoutError),

    /// 创建目录等文件系统操作失败.
    #[error("file system: {0}")]
    Fs(#[from] std::io::Error),
}

/// 命令执行结果.
pub type LabResult<T = ()> = Result<T, LabError>;
