//! 2D 图像与 3D 体数据.
//!
//! 像素按 `(h, w)` / `(z, h, w)` 索引, 空间信息 ([`Geometry`]) 则按物理坐标轴
//! `(x, y[, z])` 排列. 两种顺序的转换集中在 `size()` 和读写模块中.

use std::ops::{Index, IndexMut};

use image::{GrayImage, Luma};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3, Axis};
use rand::Rng;
use thiserror::Error;

use crate::{Idx2d, Idx3d};

mod geometry;
mod info;
mod iter;
mod pixel;
mod stats;

pub use geometry::Geometry;
pub use info::ImageInfo;
pub use iter::PosIter;
pub use pixel::{Pixel, PixelKind};
pub use stats::Statistics;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 构造或切分图像时的形状错误.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Z 切片索引越界.
    #[error("slice index {index} out of range, volume has {len} slices")]
    SliceOutOfRange {
        /// 请求的索引.
        index: usize,
        /// 切片个数.
        len: usize,
    },

    /// 没有可以堆叠的切片.
    #[error("no slices to stack")]
    EmptyStack,

    /// 第 `index` 个切片的形状与第一个切片不一致.
    #[error("slice {index} has shape {found:?}, expected {expected:?}")]
    MismatchedSlice {
        /// 切片序号.
        index: usize,
        /// 第一个切片的形状.
        expected: Idx2d,
        /// 实际形状.
        found: Idx2d,
    },

    /// 数据长度与形状不符.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

/// 二维单通道图像.
#[derive(Clone, Debug)]
pub struct Image2d<T> {
    data: Array2<T>,
    geometry: Geometry<2>,
}

/// 三维单通道体数据, 可看作沿 z 方向堆叠的 [`Image2d`].
#[derive(Clone, Debug)]
pub struct Volume<T> {
    data: Array3<T>,
    geometry: Geometry<3>,
}

impl<T: Pixel> Image2d<T> {
    /// 以默认空间信息包装 `data`.
    #[inline]
    pub fn new(data: Array2<T>) -> Self {
        Self::with_geometry(data, Geometry::default())
    }

    /// 以给定空间信息包装 `data`.
    #[inline]
    pub fn with_geometry(data: Array2<T>, geometry: Geometry<2>) -> Self {
        Self { data, geometry }
    }

    /// 创建形状为 `(h, w)`, 所有像素为 0 的图像.
    #[inline]
    pub fn zeros(shape: Idx2d) -> Self {
        Self::new(Array2::from_elem(shape, T::default()))
    }

    /// 以行优先的像素向量创建图像.
    pub fn from_vec(shape: Idx2d, pixels: Vec<T>) -> Result<Self, LayoutError> {
        Ok(Self::new(Array2::from_shape_vec(shape, pixels)?))
    }

    /// 数据形状 `(h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 按物理坐标轴排列的尺寸 `[w, h]`.
    #[inline]
    pub fn size(&self) -> [usize; 2] {
        let (h, w) = self.shape();
        [w, h]
    }

    /// 宽度.
    #[inline]
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// 高度.
    #[inline]
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// 像素总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否没有像素.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 底层数据视图.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// 底层数据可变视图.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.data.view_mut()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<T> {
        self.data
    }

    /// 空间信息.
    #[inline]
    pub fn geometry(&self) -> &Geometry<2> {
        &self.geometry
    }

    /// 可变空间信息.
    #[inline]
    pub fn geometry_mut(&mut self) -> &mut Geometry<2> {
        &mut self.geometry
    }

    /// 获取 `pos` 处像素. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<T> {
        self.data.get(pos).copied()
    }

    /// `pos` 是否在图像内.
    #[inline]
    pub fn contains(&self, (h0, w0): Idx2d) -> bool {
        let (h, w) = self.shape();
        h0 < h && w0 < w
    }

    /// 行优先的索引迭代器.
    #[inline]
    pub fn pos_iter(&self) -> PosIter {
        PosIter::new(self.shape())
    }

    /// 行优先地迭代 `(索引, 像素)`.
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, T)> + '_ {
        self.data.indexed_iter().map(|(p, &v)| (p, v))
    }

    /// 以行优先顺序复制出所有像素.
    #[inline]
    pub fn to_row_major_vec(&self) -> Vec<T> {
        self.data.iter().copied().collect()
    }

    /// 逐像素变换, 保留空间信息.
    pub fn map<U: Pixel, F: FnMut(T) -> U>(&self, f: F) -> Image2d<U> {
        Image2d::with_geometry(self.data.mapv(f), self.geometry)
    }

    /// 用 `data` 替换像素, 保留空间信息.
    ///
    /// # 注意
    ///
    /// 调用者负责保证形状一致; 形状不同时空间信息仍会被沿用.
    #[inline]
    pub fn with_data<U: Pixel>(&self, data: Array2<U>) -> Image2d<U> {
        Image2d::with_geometry(data, self.geometry)
    }

    /// 像素类型转换. 见 [`Pixel::from_f32`].
    #[inline]
    pub fn cast<U: Pixel>(&self) -> Image2d<U> {
        self.map(|v| U::from_f32(v.to_f32()))
    }

    /// 转换为 `f32` 图像.
    #[inline]
    pub fn to_f32(&self) -> Image2d<f32> {
        self.map(Pixel::to_f32)
    }

    /// 最小值与最大值. 空图像返回 `None`.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        min_max(self.data.iter().copied())
    }

    /// 全图统计量. 空图像返回 `None`.
    #[inline]
    pub fn statistics(&self) -> Option<Statistics> {
        Statistics::from_values(self.data.iter().map(|v| v.to_f32()))
    }
}

impl Image2d<f32> {
    /// 创建像素在 `[low, high)` 内均匀分布的随机图像.
    pub fn random_uniform<R: Rng + ?Sized>(shape: Idx2d, low: f32, high: f32, rng: &mut R) -> Self {
        Self::new(Array2::from_shape_simple_fn(shape, || rng.gen_range(low..high)))
    }
}

impl Image2d<u8> {
    /// 转换为 `image` crate 的灰度图, 以便调用 `imageproc`.
    pub fn to_gray_image(&self) -> GrayImage {
        let (h, w) = self.shape();
        GrayImage::from_fn(w as u32, h as u32, |x, y| {
            Luma([self.data[(y as usize, x as usize)]])
        })
    }

    /// 由 `image` crate 的灰度图构造, 使用默认空间信息.
    pub fn from_gray_image(buf: &GrayImage) -> Self {
        let (w, h) = buf.dimensions();
        Self::new(Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
            buf.get_pixel(x as u32, y as u32).0[0]
        }))
    }
}

impl<T> Index<Idx2d> for Image2d<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<Idx2d> for Image2d<T> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T: Pixel> Volume<T> {
    /// 以默认空间信息包装 `data`.
    #[inline]
    pub fn new(data: Array3<T>) -> Self {
        Self::with_geometry(data, Geometry::default())
    }

    /// 以给定空间信息包装 `data`.
    #[inline]
    pub fn with_geometry(data: Array3<T>, geometry: Geometry<3>) -> Self {
        Self { data, geometry }
    }

    /// 创建形状为 `(z, h, w)`, 所有体素为 0 的体数据.
    #[inline]
    pub fn zeros(shape: Idx3d) -> Self {
        Self::new(Array3::from_elem(shape, T::default()))
    }

    /// 以行优先的体素向量创建体数据.
    pub fn from_vec(shape: Idx3d, voxels: Vec<T>) -> Result<Self, LayoutError> {
        Ok(Self::new(Array3::from_shape_vec(shape, voxels)?))
    }

    /// 把 2D 图像看作只有一层的体数据.
    pub fn from_image(img: Image2d<T>) -> Self {
        let geometry = img.geometry.extend_z(1.0);
        Self::with_geometry(img.data.insert_axis(Axis(0)), geometry)
    }

    /// 沿 z 方向堆叠 `slices`, 层间距为 `z_spacing`.
    /// 空间信息的其余部分取自第一个切片.
    pub fn from_slices(slices: &[Image2d<T>], z_spacing: f64) -> Result<Self, LayoutError> {
        let first = slices.first().ok_or(LayoutError::EmptyStack)?;
        let expected = first.shape();
        if let Some((index, s)) = slices
            .iter()
            .enumerate()
            .find(|(_, s)| s.shape() != expected)
        {
            return Err(LayoutError::MismatchedSlice {
                index,
                expected,
                found: s.shape(),
            });
        }
        let views: Vec<_> = slices.iter().map(|s| s.data.view()).collect();
        let data = ndarray::stack(Axis(0), &views)?;
        Ok(Self::with_geometry(data, first.geometry.extend_z(z_spacing)))
    }

    /// 数据形状 `(z, h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 按物理坐标轴排列的尺寸 `[w, h, z]`.
    #[inline]
    pub fn size(&self) -> [usize; 3] {
        let (z, h, w) = self.shape();
        [w, h, z]
    }

    /// 水平切片形状 `(h, w)`.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 体素总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否没有体素.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 底层数据视图.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// 底层数据可变视图.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, T> {
        self.data.view_mut()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<T> {
        self.data
    }

    /// 空间信息.
    #[inline]
    pub fn geometry(&self) -> &Geometry<3> {
        &self.geometry
    }

    /// 可变空间信息.
    #[inline]
    pub fn geometry_mut(&mut self) -> &mut Geometry<3> {
        &mut self.geometry
    }

    /// 获取 `pos` 处体素. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<T> {
        self.data.get(pos).copied()
    }

    /// 行优先地迭代 `(索引, 体素)`.
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx3d, T)> + '_ {
        self.data.indexed_iter().map(|(p, &v)| (p, v))
    }

    /// 以行优先顺序复制出所有体素.
    #[inline]
    pub fn to_row_major_vec(&self) -> Vec<T> {
        self.data.iter().copied().collect()
    }

    /// 提取第 `z` 个水平切片, 空间信息随之降维.
    pub fn slice_at(&self, z: usize) -> Result<Image2d<T>, LayoutError> {
        let len = self.len_z();
        if z >= len {
            return Err(LayoutError::SliceOutOfRange { index: z, len });
        }
        Ok(self.slice_unchecked(z))
    }

    #[inline]
    fn slice_unchecked(&self, z: usize) -> Image2d<T> {
        Image2d::with_geometry(
            self.data.index_axis(Axis(0), z).to_owned(),
            self.geometry.collapse_z(z),
        )
    }

    /// 按升序迭代水平切片视图.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, T>> {
        self.data.axis_iter(Axis(0))
    }

    /// 逐体素变换, 保留空间信息.
    pub fn map<U: Pixel, F: FnMut(T) -> U>(&self, f: F) -> Volume<U> {
        Volume::with_geometry(self.data.mapv(f), self.geometry)
    }

    /// 像素类型转换. 见 [`Pixel::from_f32`].
    #[inline]
    pub fn cast<U: Pixel>(&self) -> Volume<U> {
        self.map(|v| U::from_f32(v.to_f32()))
    }

    /// 转换为 `f32` 体数据.
    #[inline]
    pub fn to_f32(&self) -> Volume<f32> {
        self.map(Pixel::to_f32)
    }

    /// 最小值与最大值. 空体数据返回 `None`.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        min_max(self.data.iter().copied())
    }

    /// 全体统计量. 空体数据返回 `None`.
    #[inline]
    pub fn statistics(&self) -> Option<Statistics> {
        Statistics::from_values(self.data.iter().map(|v| v.to_f32()))
    }

    /// 对每个水平切片施加 `op`, 返回处理后的切片. 打开 `rayon` feature 时并行处理.
    pub fn map_slices<U, F>(&self, op: F) -> Vec<Image2d<U>>
    where
        U: Pixel,
        F: Fn(Image2d<T>) -> Image2d<U> + Sync + Send,
    {
        #[cfg(feature = "rayon")]
        let slices = (0..self.len_z())
            .into_par_iter()
            .map(|z| op(self.slice_unchecked(z)))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let slices = (0..self.len_z())
            .map(|z| op(self.slice_unchecked(z)))
            .collect();

        slices
    }
}

impl<T> Index<Idx3d> for Volume<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<Idx3d> for Volume<T> {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

fn min_max<T: Pixel, I: Iterator<Item = T>>(it: I) -> Option<(f32, f32)> {
    it.map(Pixel::to_f32).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_create_sizes() {
        let img = Image2d::<u16>::zeros((348, 720));
        assert_eq!(img.size(), [720, 348]);
        assert_eq!(img.len(), 720 * 348);

        let vol = Volume::<u16>::zeros((20, 256, 256));
        assert_eq!(vol.size(), [256, 256, 20]);
        assert_eq!(vol.slice_shape(), (256, 256));
    }

    #[test]
    fn test_cast_and_min_max() {
        let img = Image2d::new(array![[-1.5f32, 300.0], [12.9, 0.0]]);
        assert_eq!(img.min_max(), Some((-1.5, 300.0)));
        let u: Image2d<u8> = img.cast();
        assert_eq!(u.to_row_major_vec(), vec![0, 255, 12, 0]);
        assert!(Image2d::<u8>::zeros((0, 0)).min_max().is_none());
    }

    #[test]
    fn test_slice_at() {
        let mut vol = Volume::<u8>::zeros((3, 2, 2));
        vol[(1, 0, 1)] = 7;
        vol.geometry_mut().spacing = [0.5, 0.5, 2.0];
        let s = vol.slice_at(1).unwrap();
        assert_eq!(s[(0, 1)], 7);
        assert_eq!(s.geometry().spacing, [0.5, 0.5]);
        assert!(matches!(
            vol.slice_at(3),
            Err(LayoutError::SliceOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_from_slices() {
        let a = Image2d::new(array![[1u8, 2], [3, 4]]);
        let b = Image2d::new(array![[5u8, 6], [7, 8]]);
        let vol = Volume::from_slices(&[a.clone(), b], 3.0).unwrap();
        assert_eq!(vol.shape(), (2, 2, 2));
        assert_eq!(vol[(1, 1, 0)], 7);
        assert_eq!(vol.geometry().spacing[2], 3.0);

        assert!(matches!(
            Volume::<u8>::from_slices(&[], 1.0),
            Err(LayoutError::EmptyStack)
        ));
        let odd = Image2d::<u8>::zeros((3, 2));
        assert!(matches!(
            Volume::from_slices(&[a, odd], 1.0),
            Err(LayoutError::MismatchedSlice { index: 1, .. })
        ));
    }

    #[test]
    fn test_map_slices_keeps_order() {
        let vol = Volume::from_vec((3, 1, 2), vec![0u8, 1, 2, 3, 4, 5]).unwrap();
        let doubled = vol.map_slices(|s| s.map(|v| v as f32 * 2.0));
        let firsts: Vec<f32> = doubled.iter().map(|s| s[(0, 0)]).collect();
        assert_eq!(firsts, vec![0.0, 4.0, 8.0]);
    }

    #[test]
    fn test_gray_image_conversion() {
        let img = Image2d::new(array![[1u8, 2, 3], [4, 5, 6]]);
        let buf = img.to_gray_image();
        assert_eq!(buf.dimensions(), (3, 2));
        assert_eq!(buf.get_pixel(2, 1).0[0], 6);
        let back = Image2d::from_gray_image(&buf);
        assert_eq!(back.to_row_major_vec(), img.to_row_major_vec());
    }

    #[test]
    fn test_random_uniform_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let img = Image2d::random_uniform((20, 20), 0.0, 1.0, &mut rng);
        let (lo, hi) = img.min_max().unwrap();
        assert!(lo >= 0.0 && hi < 1.0);
        assert_eq!(img.shape(), (20, 20));
    }
}
