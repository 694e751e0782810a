//! 区域生长与分水岭分割.
//!
//! 所有分割器都在 `f32` 图像上工作, 输出与输入形状, 空间信息相同的 `f32` 图像:
//! 区域生长输出 `replace` / 0 的掩膜, 分水岭输出标签图.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use ndarray::Array2;

use crate::data::Image2d;
use crate::Idx2d;

mod connected;
mod error;
mod watershed;

pub use connected::{ConfidenceConnected, ConnectedThreshold, NeighborhoodConnected};
pub use error::{SegmentError, SegmentResult};
pub use watershed::Watershed;

/// 2D 图像分割器.
pub trait Segmenter: Send + Sync {
    /// 分割 `img`.
    fn segment(&self, img: &Image2d<f32>) -> SegmentResult<Image2d<f32>>;
}

/// 检查图像非空且 `seed` 落在图像内.
pub(crate) fn check_seed(img: &Image2d<f32>, seed: Idx2d) -> SegmentResult<()> {
    if img.is_empty() {
        return Err(SegmentError::EmptyImage);
    }
    if !img.contains(seed) {
        return Err(SegmentError::SeedOutside {
            seed,
            shape: img.shape(),
        });
    }
    Ok(())
}

/// 对 `mask` 做四连通标记. 背景标签为 0, 前景标签从 1 开始.
pub(crate) fn label_mask(mask: &Array2<bool>) -> Array2<u32> {
    let (h, w) = mask.dim();
    let gray = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([if mask[(y as usize, x as usize)] { u8::MAX } else { 0 }])
    });
    let labels = connected_components(&gray, Connectivity::Four, Luma([0u8]));
    Array2::from_shape_fn((h, w), |(y, x)| labels.get_pixel(x as u32, y as u32)[0])
}

/// `mask` 中与 `seed` 四连通的区域. `seed` 不在 `mask` 内时区域为空.
pub(crate) fn connected_region(mask: &Array2<bool>, seed: Idx2d) -> Array2<bool> {
    let labels = label_mask(mask);
    let target = labels[seed];
    if target == 0 {
        return Array2::from_elem(mask.dim(), false);
    }
    labels.mapv(|l| l == target)
}

/// 区域内取 `replace`, 其余取 0.
pub(crate) fn paint(img: &Image2d<f32>, region: &Array2<bool>, replace: f32) -> Image2d<f32> {
    img.with_data(region.mapv(|r| if r { replace } else { 0.0 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_connected_region() {
        let mask = array![
            [true, true, false, true],
            [false, true, false, true],
            [true, false, false, true],
        ];
        let region = connected_region(&mask, (0, 0));
        assert_eq!(region.iter().filter(|&&r| r).count(), 3);
        assert!(!region[(2, 0)]);
        assert!(!region[(0, 3)]);

        assert!(connected_region(&mask, (1, 2)).iter().all(|&r| !r));
    }

    #[test]
    fn test_check_seed() {
        let img = Image2d::<f32>::zeros((4, 5));
        assert!(check_seed(&img, (3, 4)).is_ok());
        assert!(matches!(
            check_seed(&img, (4, 0)),
            Err(SegmentError::SeedOutside { seed: (4, 0), .. })
        ));
        assert!(matches!(
            check_seed(&Image2d::<f32>::zeros((0, 0)), (0, 0)),
            Err(SegmentError::EmptyImage)
        ));
    }
}
