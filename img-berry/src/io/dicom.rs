//! DICOM 读取. 文件解析由 `dicom-object` 完成, 像素解码 (含模态 LUT,
//! 即 rescale slope/intercept) 由 `dicom-pixeldata` 完成.

use std::path::Path;

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::{open_file, DefaultDicomObject};
use dicom_pixeldata::PixelDecoder;
use either::Either;

use crate::data::{Image2d, Volume};

use super::grid::Grid;
use super::{IoError, IoResult};

/// 元信息值的最大显示长度.
const MAX_VALUE_LEN: usize = 64;

#[inline]
fn dicom_error<E: std::fmt::Display>(e: E) -> IoError {
    IoError::Dicom(e.to_string())
}

#[inline]
fn open(path: &Path) -> IoResult<DefaultDicomObject> {
    open_file(path).map_err(dicom_error)
}

/// 读取多值浮点字段. 字段缺失或无法转换时返回 `None`.
fn floats(obj: &DefaultDicomObject, tag: Tag) -> Option<Vec<f64>> {
    obj.element(tag).ok()?.to_multi_float64().ok()
}

/// 读取 DICOM 图像. 单帧返回 2D 图像, 多帧返回 3D 体数据.
///
/// 间距取自 `PixelSpacing` (行间距, 列间距) 与 `SpacingBetweenSlices`/`SliceThickness`,
/// 原点取自 `ImagePositionPatient`, 方向取自 `ImageOrientationPatient`.
pub(crate) fn read(path: &Path) -> IoResult<Either<Image2d<f32>, Volume<f32>>> {
    let obj = open(path)?;
    let pixels = obj.decode_pixel_data().map_err(dicom_error)?;
    if pixels.samples_per_pixel() != 1 {
        return Err(IoError::UnsupportedFormat(format!(
            "{}: {} samples per pixel",
            path.display(),
            pixels.samples_per_pixel()
        )));
    }
    let rows = pixels.rows() as usize;
    let cols = pixels.columns() as usize;
    let frames = pixels.number_of_frames() as usize;
    let values: Vec<f32> = pixels.to_vec::<f32>().map_err(dicom_error)?;

    let mut grid = if frames > 1 {
        Grid::with_size(vec![cols, rows, frames])
    } else {
        Grid::with_size(vec![cols, rows])
    };
    apply_geometry(&obj, &mut grid);

    let expected = grid.len();
    if values.len() < expected {
        return Err(IoError::Dicom(format!(
            "{}: decoded {} pixels, expected {expected}",
            path.display(),
            values.len()
        )));
    }
    grid.assemble(values[..expected].to_vec(), path)
}

fn apply_geometry(obj: &DefaultDicomObject, grid: &mut Grid) {
    let d = grid.ndims();
    if let Some(ps) = floats(obj, tags::PIXEL_SPACING).filter(|v| v.len() >= 2) {
        grid.spacing[0] = ps[1];
        grid.spacing[1] = ps[0];
    }
    if d == 3 {
        if let Some(z) = z_spacing_of(obj) {
            grid.spacing[2] = z;
        }
    }
    if let Some(pos) = floats(obj, tags::IMAGE_POSITION_PATIENT).filter(|v| v.len() >= 3) {
        for (o, p) in grid.origin.iter_mut().zip(pos) {
            *o = p;
        }
    }
    if let Some(dir) = floats(obj, tags::IMAGE_ORIENTATION_PATIENT).filter(|v| v.len() == 6) {
        let (r, c) = (&dir[..3], &dir[3..]);
        // 方向矩阵的列依次为行方向, 列方向和二者的法向.
        let n = [
            r[1] * c[2] - r[2] * c[1],
            r[2] * c[0] - r[0] * c[2],
            r[0] * c[1] - r[1] * c[0],
        ];
        for i in 0..d {
            grid.direction[i * d] = r[i];
            grid.direction[i * d + 1] = c[i];
            if d == 3 {
                grid.direction[i * d + 2] = n[i];
            }
        }
    }
}

fn z_spacing_of(obj: &DefaultDicomObject) -> Option<f64> {
    [tags::SPACING_BETWEEN_SLICES, tags::SLICE_THICKNESS]
        .into_iter()
        .filter_map(|t| floats(obj, t))
        .filter_map(|v| v.first().copied())
        .find(|&v| v > 0.0)
}

/// 读取 DICOM 文件记录的层间距 (`SpacingBetweenSlices`, 其次 `SliceThickness`).
pub fn dicom_z_spacing<P: AsRef<Path>>(path: P) -> IoResult<Option<f64>> {
    Ok(z_spacing_of(&open(path.as_ref())?))
}

/// 列出 DICOM 数据集中的 `(标签, 值)`, 跳过像素数据. 过长的值会被截断,
/// 无法以文本表示的值显示为 `<binary>`.
pub fn dicom_metadata<P: AsRef<Path>>(path: P) -> IoResult<Vec<(String, String)>> {
    let obj = open(path.as_ref())?;
    let entries = obj
        .iter()
        .filter(|e| e.header().tag != tags::PIXEL_DATA)
        .map(|e| {
            let value = match e.to_str() {
                Ok(s) => {
                    let s = s.trim_end_matches(['\0', ' ']);
                    if s.chars().count() > MAX_VALUE_LEN {
                        format!("{}...", s.chars().take(MAX_VALUE_LEN).collect::<String>())
                    } else {
                        s.to_string()
                    }
                }
                Err(_) => "<binary>".to_string(),
            };
            (e.header().tag.to_string(), value)
        })
        .collect();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::test_dir;

    #[test]
    fn test_not_a_dicom_file() {
        let path = test_dir("dicom_bad").join("IMG0001");
        std::fs::write(&path, b"definitely not DICOM").unwrap();
        assert!(matches!(read(&path), Err(IoError::Dicom(_))));
        assert!(matches!(dicom_metadata(&path), Err(IoError::Dicom(_))));
    }
}
