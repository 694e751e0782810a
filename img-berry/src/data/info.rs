//! 图像元信息报告.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Image2d, Pixel, Volume};

/// 图像的尺寸, 空间信息和前若干个像素.
///
/// 尺寸与像素索引都按物理坐标轴 `(x, y[, z])` 排列.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ImageInfo {
    /// 维数.
    pub dimension: usize,

    /// 像素类型 (MetaImage 命名).
    pub pixel_type: String,

    /// 尺寸.
    pub size: Vec<usize>,

    /// 原点.
    pub origin: Vec<f64>,

    /// 间距.
    pub spacing: Vec<f64>,

    /// 方向矩阵, 行优先.
    pub direction: Vec<f64>,

    /// 行优先的前若干个像素.
    pub first_pixels: Vec<(Vec<usize>, f32)>,
}

impl ImageInfo {
    /// 收集 2D 图像信息, 附带前 `n` 个像素.
    pub fn of_image<T: Pixel>(img: &Image2d<T>, n: usize) -> Self {
        let g = img.geometry();
        Self {
            dimension: 2,
            pixel_type: T::KIND.to_string(),
            size: img.size().to_vec(),
            origin: g.origin.to_vec(),
            spacing: g.spacing.to_vec(),
            direction: g.direction_flat(),
            first_pixels: img
                .pos_iter()
                .take(n)
                .map(|(h, w)| (vec![w, h], img[(h, w)].to_f32()))
                .collect(),
        }
    }

    /// 收集 3D 体数据信息, 附带前 `n` 个体素.
    pub fn of_volume<T: Pixel>(vol: &Volume<T>, n: usize) -> Self {
        let g = vol.geometry();
        Self {
            dimension: 3,
            pixel_type: T::KIND.to_string(),
            size: vol.size().to_vec(),
            origin: g.origin.to_vec(),
            spacing: g.spacing.to_vec(),
            direction: g.direction_flat(),
            first_pixels: vol
                .indexed_iter()
                .take(n)
                .map(|((z, h, w), v)| (vec![w, h, z], v.to_f32()))
                .collect(),
        }
    }
}

impl fmt::Display for ImageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const S4: &str = "    ";

        writeln!(f, "Dimension: {}", self.dimension)?;
        writeln!(f, "Pixel type: {}", self.pixel_type)?;
        writeln!(f, "Size: {:?}", self.size)?;
        writeln!(f, "Origin: {:?}", self.origin)?;
        writeln!(f, "Spacing: {:?}", self.spacing)?;
        writeln!(f, "Direction:")?;
        for row in self.direction.chunks(self.dimension.max(1)) {
            writeln!(f, "{S4}{row:?}")?;
        }
        write!(f, "First {} pixels:", self.first_pixels.len())?;
        for (idx, v) in self.first_pixels.iter() {
            write!(f, "\n{S4}{idx:?} = {v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ImageInfo;
    use crate::Image2d;
    use ndarray::array;

    #[test]
    fn test_first_pixels_in_xy_order() {
        let img = Image2d::new(array![[1u8, 2, 3], [4, 5, 6]]);
        let info = ImageInfo::of_image(&img, 4);
        assert_eq!(info.size, vec![3, 2]);
        assert_eq!(info.first_pixels[3], (vec![0, 1], 4.0));

        let text = info.to_string();
        assert!(text.contains("Size: [3, 2]"));
        assert!(text.contains("[1, 0] = 2"));
        assert!(text.contains("Pixel type: MET_UCHAR"));
    }
}
