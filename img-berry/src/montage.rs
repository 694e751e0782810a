//! 拼图: 把若干幅图像按网格排列成一幅 8-bit 灰度图, 用来代替交互式查看.

use std::path::Path;

use image::{imageops, GrayImage, Luma};
use log::info;

use crate::data::{Image2d, Pixel, Volume};
use crate::filters::rescale_to_u8;
use crate::io::{self, IoResult};

/// 网格拼图.
///
/// 每个格子的大小取所有图像中最大的宽和高, 图像放在格子左上角,
/// 格子之间以 `gap` 像素的背景隔开.
#[derive(Clone, Debug)]
pub struct Montage {
    columns: usize,
    gap: usize,
    background: u8,
    rescale: bool,
    tiles: Vec<Image2d<u8>>,
}

impl Montage {
    /// 每行 `columns` 幅图像. `columns` 为 0 时视作 1.
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            gap: 2,
            background: 0,
            rescale: true,
            tiles: Vec::new(),
        }
    }

    /// 格子间距.
    #[inline]
    pub fn gap(mut self, gap: usize) -> Self {
        self.gap = gap;
        self
    }

    /// 背景灰度.
    #[inline]
    pub fn background(mut self, background: u8) -> Self {
        self.background = background;
        self
    }

    /// 加入图像前是否先拉伸到 `[0, 255]`. 默认拉伸; 否则直接截断转换.
    #[inline]
    pub fn rescale(mut self, rescale: bool) -> Self {
        self.rescale = rescale;
        self
    }

    /// 加入一幅图像.
    pub fn push<T: Pixel>(&mut self, img: &Image2d<T>) -> &mut Self {
        let tile = if self.rescale {
            rescale_to_u8(img)
        } else {
            img.cast()
        };
        self.tiles.push(tile);
        self
    }

    /// 加入体数据的所有水平切片. 每个切片单独拉伸.
    pub fn push_volume<T: Pixel>(&mut self, vol: &Volume<T>) -> &mut Self {
        let tiles = if self.rescale {
            vol.map_slices(|s| rescale_to_u8(&s))
        } else {
            vol.map_slices(|s| s.cast())
        };
        self.tiles.extend(tiles);
        self
    }

    /// 体数据所有切片的拼图, 列数取 `ceil(sqrt(切片数))`.
    pub fn of_volume<T: Pixel>(vol: &Volume<T>) -> Self {
        let columns = (vol.len_z() as f64).sqrt().ceil() as usize;
        let mut m = Self::new(columns);
        m.push_volume(vol);
        m
    }

    /// 图像个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// 是否没有图像.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// 渲染. 没有图像时返回 `None`.
    pub fn render(&self) -> Option<Image2d<u8>> {
        let cell_w = self.tiles.iter().map(Image2d::width).max()?;
        let cell_h = self.tiles.iter().map(Image2d::height).max()?;
        let cols = self.columns.min(self.tiles.len());
        let rows = (self.tiles.len() + cols - 1) / cols;
        let span = |n: usize, cell: usize| n * cell + (n - 1) * self.gap;

        let mut canvas = GrayImage::from_pixel(
            span(cols, cell_w) as u32,
            span(rows, cell_h) as u32,
            Luma([self.background]),
        );
        for (i, tile) in self.tiles.iter().enumerate() {
            let x = (i % cols) * (cell_w + self.gap);
            let y = (i / cols) * (cell_h + self.gap);
            imageops::replace(&mut canvas, &tile.to_gray_image(), x as i64, y as i64);
        }
        Some(Image2d::from_gray_image(&canvas))
    }

    /// 渲染并写到 `path`. 没有图像时什么也不做, 返回 `false`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> IoResult<bool> {
        let Some(img) = self.render() else {
            return Ok(false);
        };
        io::write_image(&img, path.as_ref())?;
        info!(
            "montage of {} images written to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_render_grid() {
        let mut m = Montage::new(2).gap(1).background(7);
        m.push(&Image2d::new(array![[0.0f32, 1.0], [2.0, 3.0]]))
            .push(&Image2d::new(array![[5u8]]))
            .push(&Image2d::new(array![[1u16, 1], [1, 1]]));
        assert_eq!(m.len(), 3);

        let out = m.render().unwrap();
        assert_eq!(out.shape(), (5, 5));
        assert_eq!(out[(0, 0)], 0);
        assert_eq!(out[(1, 1)], 255);
        // 常量图像拉伸后全为 0.
        assert_eq!(out[(3, 0)], 0);
        // 间隔与未填满的格子.
        assert_eq!(out[(0, 2)], 7);
        assert_eq!(out[(3, 3)], 7);
        // 1x1 的图像只占格子左上角.
        assert_eq!(out[(1, 4)], 7);
    }

    #[test]
    fn test_volume_montage() {
        let vol = Volume::from_vec((3, 1, 2), vec![0i16, 10, 5, 5, -3, 3]).unwrap();
        let m = Montage::of_volume(&vol).gap(0);
        assert_eq!(m.len(), 3);
        let out = m.render().unwrap();
        assert_eq!(out.shape(), (2, 4));
        assert_eq!(out.to_row_major_vec(), vec![0, 255, 0, 0, 0, 255, 0, 0]);

        assert!(Montage::new(3).render().is_none());
    }

    #[test]
    fn test_save() {
        let dir = crate::io::test_dir("montage");
        let path = dir.join("m.png");
        let mut m = Montage::new(1).rescale(false);
        m.push(&Image2d::new(array![[9u8, 200]]));
        assert!(m.save(&path).unwrap());

        let back: Image2d<u8> = crate::io::read_image(&path).unwrap();
        assert_eq!(back.to_row_major_vec(), vec![9, 200]);
        assert!(!Montage::new(1).save(dir.join("none.png")).unwrap());
    }
}
