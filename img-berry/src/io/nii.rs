//! NIfTI-1 (`.nii`, `.nii.gz`) 读写, 由 `nifti` crate 完成.

use std::path::Path;

use either::Either;
use ndarray::Array3;
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::data::{Image2d, LayoutError, Pixel, PixelKind, Volume};

use super::grid::Grid;
use super::IoResult;

/// 读取 NIfTI 文件.
///
/// 文件中的 `[W, H, z]` 被转换为 `(z, H, W)`. 原点取 `qoffset_{x, y, z}`,
/// 方向矩阵保持单位阵.
pub(crate) fn read(path: &Path) -> IoResult<Either<Image2d<f32>, Volume<f32>>> {
    let obj = ReaderOptions::new().read_file(path)?;
    let header = obj.header().clone();
    let data = obj.into_volume().into_ndarray::<f32>()?;

    let size = data.shape().to_vec();
    let values: Vec<f32> = data.reversed_axes().iter().copied().collect();

    let mut grid = Grid::with_size(size);
    let offsets = [header.quatern_x, header.quatern_y, header.quatern_z];
    for i in 0..grid.ndims().min(3) {
        let dim = header.pixdim[i + 1];
        if dim > 0.0 {
            grid.spacing[i] = dim as f64;
        }
        grid.origin[i] = offsets[i] as f64;
    }
    grid.assemble(values, path)
}

/// 写入 NIfTI 文件. 2D 图像写为一层的 3D 体数据. 路径以 `.gz` 结尾时压缩.
pub(crate) fn write<T: Pixel>(grid: &Grid, values: &[T], path: &Path) -> IoResult<()> {
    let g = grid.padded3();
    let header = NiftiHeader {
        pixdim: [
            1.0,
            g.spacing[0] as f32,
            g.spacing[1] as f32,
            g.spacing[2] as f32,
            1.0,
            1.0,
            1.0,
            1.0,
        ],
        quatern_x: g.origin[0] as f32,
        quatern_y: g.origin[1] as f32,
        quatern_z: g.origin[2] as f32,
        ..Default::default()
    };
    let shape = (g.size[2], g.size[1], g.size[0]);

    macro_rules! write_as {
        ($t: ty) => {{
            let voxels = values.iter().map(|v| <$t>::from_f32(v.to_f32())).collect();
            let data = Array3::<$t>::from_shape_vec(shape, voxels).map_err(LayoutError::from)?;
            // (z, H, W) -> [W, H, z].
            WriterOptions::new(path)
                .reference_header(&header)
                .write_nifti(&data.reversed_axes())?;
        }};
    }

    match T::KIND {
        PixelKind::U8 => write_as!(u8),
        PixelKind::I16 => write_as!(i16),
        PixelKind::U16 => write_as!(u16),
        PixelKind::F32 => write_as!(f32),
    }
    Ok(())
}
