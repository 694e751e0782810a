//! 不区分维数的图像布局, 供各个编解码器共用.

use either::Either;

use crate::data::{Geometry, Image2d, Pixel, PixelKind, Volume};

use super::{IoError, IoResult};

/// 按物理坐标轴排列的图像布局. `size.len()` 即维数.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Grid {
    pub size: Vec<usize>,
    pub spacing: Vec<f64>,
    pub origin: Vec<f64>,
    pub direction: Vec<f64>,
}

impl Grid {
    pub fn of_image<T: Pixel>(img: &Image2d<T>) -> Self {
        let g = img.geometry();
        Self {
            size: img.size().to_vec(),
            spacing: g.spacing.to_vec(),
            origin: g.origin.to_vec(),
            direction: g.direction_flat(),
        }
    }

    pub fn of_volume<T: Pixel>(vol: &Volume<T>) -> Self {
        let g = vol.geometry();
        Self {
            size: vol.size().to_vec(),
            spacing: g.spacing.to_vec(),
            origin: g.origin.to_vec(),
            direction: g.direction_flat(),
        }
    }

    /// 以默认空间信息构造.
    pub fn with_size(size: Vec<usize>) -> Self {
        let d = size.len();
        let mut direction = vec![0.0; d * d];
        for i in 0..d {
            direction[i * d + i] = 1.0;
        }
        Self {
            size,
            spacing: vec![1.0; d],
            origin: vec![0.0; d],
            direction,
        }
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.size.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size.iter().product()
    }

    /// 补齐到 3 维, 用于只支持 3D 布局的格式.
    pub fn padded3(&self) -> Self {
        if self.ndims() >= 3 {
            return self.clone();
        }
        let mut padded = Self::with_size(vec![1; 3]);
        let d = self.ndims();
        for i in 0..d {
            padded.size[i] = self.size[i];
            padded.spacing[i] = self.spacing[i];
            padded.origin[i] = self.origin[i];
            for j in 0..d {
                padded.direction[i * 3 + j] = self.direction[i * d + j];
            }
        }
        padded
    }

    fn geometry<const D: usize>(&self) -> Geometry<D> {
        let mut g = Geometry::<D>::default();
        for i in 0..D {
            g.spacing[i] = self.spacing.get(i).copied().unwrap_or(1.0);
            g.origin[i] = self.origin.get(i).copied().unwrap_or(0.0);
            for j in 0..D {
                if let Some(&v) = self.direction.get(i * self.ndims() + j) {
                    g.direction[i][j] = v;
                }
            }
        }
        g
    }

    /// 用行优先的像素值组装 2D 或 3D 图像.
    ///
    /// 3D 数据若只有一层, 仍按 3D 返回; 由调用方决定是否降维.
    pub fn assemble(
        &self,
        values: Vec<f32>,
        source: &std::path::Path,
    ) -> IoResult<Either<Image2d<f32>, Volume<f32>>> {
        match self.size.as_slice() {
            &[w, h] => {
                let img = Image2d::from_vec((h, w), values)?;
                Ok(Either::Left(Image2d::with_geometry(
                    img.into_raw(),
                    self.geometry(),
                )))
            }
            &[w, h, z] => {
                let vol = Volume::from_vec((z, h, w), values)?;
                Ok(Either::Right(Volume::with_geometry(
                    vol.into_raw(),
                    self.geometry(),
                )))
            }
            _ => Err(IoError::Dimension {
                path: source.to_path_buf(),
                expected: if self.ndims() < 2 { 2 } else { 3 },
                found: self.ndims(),
            }),
        }
    }
}

/// 将像素按 `T` 的存储类型编码为字节流.
pub(crate) fn encode<T: Pixel>(values: &[T], big_endian: bool) -> Vec<u8> {
    macro_rules! put {
        ($out: ident, $v: expr) => {
            if big_endian {
                $out.extend_from_slice(&$v.to_be_bytes())
            } else {
                $out.extend_from_slice(&$v.to_le_bytes())
            }
        };
    }

    let mut out = Vec::with_capacity(values.len() * T::KIND.byte_len());
    for v in values.iter().map(|v| v.to_f32()) {
        match T::KIND {
            PixelKind::U8 => out.push(u8::from_f32(v)),
            PixelKind::I16 => put!(out, i16::from_f32(v)),
            PixelKind::U16 => put!(out, u16::from_f32(v)),
            PixelKind::F32 => put!(out, v),
        }
    }
    out
}
