//! `.npy` 数组读写, 由 `ndarray-npy` 完成. 只保存 `f32` 像素, 不保存空间信息.

use std::path::Path;

use either::Either;
use ndarray::{ArrayD, IxDyn};

use crate::data::{Image2d, LayoutError, Pixel, Volume};

use super::grid::Grid;
use super::IoResult;

pub(crate) fn read(path: &Path) -> IoResult<Either<Image2d<f32>, Volume<f32>>> {
    let data: ArrayD<f32> = ndarray_npy::read_npy(path)?;
    let size = data.shape().iter().rev().copied().collect();
    let values = data.iter().copied().collect();
    Grid::with_size(size).assemble(values, path)
}

pub(crate) fn write<T: Pixel>(grid: &Grid, values: &[T], path: &Path) -> IoResult<()> {
    let shape: Vec<usize> = grid.size.iter().rev().copied().collect();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values.iter().map(|v| v.to_f32()).collect())
        .map_err(LayoutError::from)?;
    ndarray_npy::write_npy(path, &data)?;
    Ok(())
}
