//! 图像读写.
//!
//! 格式由扩展名 (不区分大小写) 决定:
//!
//! | 扩展名 | 读 | 写 |
//! |-------|----|----|
//! | png, jpg, bmp, tif 等 | 2D 灰度 | 2D `u8`/`u16` |
//! | dcm 或无扩展名 | 2D, 多帧 3D | - |
//! | mha, mhd | 2D/3D | 2D/3D |
//! | nii, nii.gz | 2D/3D | 3D |
//! | vtk | - | 2D/3D |
//! | npy | 2D/3D | 2D/3D (`f32`) |
//!
//! 所有读取都先得到 `f32` 图像, 再按需转换为目标像素类型.

use std::path::{Path, PathBuf};

use either::Either;
use image::ImageFormat;
use log::debug;

use crate::data::{Image2d, Pixel, Volume};

mod dicom;
mod error;
mod grid;
mod meta;
mod nii;
mod npy;
mod raster;
mod vtk;

pub use dicom::{dicom_metadata, dicom_z_spacing};
pub use error::{IoError, IoResult};
pub use meta::{find_header_for_raw, MetElement, MetaHeader};
pub use raster::{read_rgb, write_rgb};

use grid::Grid;

/// 文件格式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Format {
    /// `image` crate 支持的普通位图.
    Raster(ImageFormat),
    /// DICOM.
    Dicom,
    /// MetaImage (`.mha` 或 `.mhd`).
    Meta,
    /// NIfTI-1.
    Nifti,
    /// VTK legacy structured points.
    Vtk,
    /// NumPy `.npy`.
    Npy,
    /// NRRD. 只用于识别, 不支持读写.
    Nrrd,
}

impl Format {
    /// 由路径扩展名判断格式. 没有扩展名的文件视为 DICOM.
    pub fn from_path<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".nii.gz") {
            return Ok(Self::Nifti);
        }
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase()) else {
            return Ok(Self::Dicom);
        };
        Ok(match ext.as_str() {
            "dcm" | "dicom" | "ima" => Self::Dicom,
            "mha" | "mhd" => Self::Meta,
            "nii" => Self::Nifti,
            "vtk" => Self::Vtk,
            "npy" => Self::Npy,
            "nrrd" | "nhdr" => Self::Nrrd,
            other => ImageFormat::from_extension(other)
                .map(Self::Raster)
                .ok_or_else(|| IoError::UnsupportedFormat(path.display().to_string()))?,
        })
    }

    /// 格式名.
    pub fn name(self) -> &'static str {
        match self {
            Self::Raster(_) => "raster",
            Self::Dicom => "DICOM",
            Self::Meta => "MetaImage",
            Self::Nifti => "NIfTI",
            Self::Vtk => "VTK",
            Self::Npy => "npy",
            Self::Nrrd => "NRRD",
        }
    }
}

#[inline]
fn unsupported(format: Format, op: &str, path: &Path) -> IoError {
    IoError::UnsupportedFormat(format!("{} ({} {op})", path.display(), format.name()))
}

/// 读取 2D 或 3D 图像.
pub fn read_any<P: AsRef<Path>>(path: P) -> IoResult<Either<Image2d<f32>, Volume<f32>>> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    debug!("reading `{}` as {}", path.display(), format.name());
    match format {
        Format::Raster(_) => raster::read(path).map(Either::Left),
        Format::Dicom => dicom::read(path),
        Format::Meta => meta::read(path),
        Format::Nifti => nii::read(path),
        Format::Npy => npy::read(path),
        Format::Vtk | Format::Nrrd => Err(unsupported(format, "reading", path)),
    }
}

/// 读取 2D 图像. 只有一层的 3D 文件被视为 2D.
pub fn read_image<T: Pixel, P: AsRef<Path>>(path: P) -> IoResult<Image2d<T>> {
    let path = path.as_ref();
    match read_any(path)? {
        Either::Left(img) => Ok(img.cast()),
        Either::Right(vol) if vol.len_z() == 1 => Ok(vol.slice_at(0)?.cast()),
        Either::Right(_) => Err(IoError::Dimension {
            path: path.to_path_buf(),
            expected: 2,
            found: 3,
        }),
    }
}

/// 读取 3D 体数据. 2D 文件被视为只有一层的体数据.
pub fn read_volume<T: Pixel, P: AsRef<Path>>(path: P) -> IoResult<Volume<T>> {
    Ok(match read_any(path)? {
        Either::Left(img) => Volume::from_image(img).cast(),
        Either::Right(vol) => vol.cast(),
    })
}

/// 按扩展名选择格式写入 2D 图像.
#[inline]
pub fn write_image<T: Pixel, P: AsRef<Path>>(img: &Image2d<T>, path: P) -> IoResult<()> {
    WriterOptions::new(path).write_image(img)
}

/// 按扩展名选择格式写入 3D 体数据.
#[inline]
pub fn write_volume<T: Pixel, P: AsRef<Path>>(vol: &Volume<T>, path: P) -> IoResult<()> {
    WriterOptions::new(path).write_volume(vol)
}

/// 写入选项. 默认由扩展名决定格式, 也可以显式指定.
///
/// ```no_run
/// use img_berry::io::{read_volume, Format, WriterOptions};
///
/// let vol = read_volume::<f32, _>("brain.mha")?;
/// WriterOptions::new("brain.dat")
///     .format(Format::Vtk)
///     .write_volume(&vol)?;
/// # Ok::<(), img_berry::io::IoError>(())
/// ```
#[derive(Clone, Debug)]
pub struct WriterOptions {
    path: PathBuf,
    format: Option<Format>,
    compress: bool,
}

impl WriterOptions {
    /// 写入 `path`.
    ///
    /// # 注意
    ///
    /// 扩展名在写入时才被检查, 因此可以先用 [`Self::format`] 指定格式.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format: None,
            compress: false,
        }
    }

    /// 显式指定格式.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// 是否压缩 (目前只对 MetaImage 生效).
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    fn resolve(&self) -> IoResult<Format> {
        match self.format {
            Some(f) => Ok(f),
            None => Format::from_path(&self.path),
        }
    }

    /// 写入 2D 图像.
    pub fn write_image<T: Pixel>(&self, img: &Image2d<T>) -> IoResult<()> {
        match self.resolve()? {
            Format::Raster(_) => {
                debug!("writing `{}` as raster", self.path.display());
                raster::write(img, &self.path)
            }
            format => self.write_grid(format, &Grid::of_image(img), &img.to_row_major_vec()),
        }
    }

    /// 写入 3D 体数据. 位图格式只接受一层的体数据.
    pub fn write_volume<T: Pixel>(&self, vol: &Volume<T>) -> IoResult<()> {
        match self.resolve()? {
            Format::Raster(_) if vol.len_z() == 1 => self.write_image(&vol.slice_at(0)?),
            Format::Raster(_) => Err(IoError::Dimension {
                path: self.path.clone(),
                expected: 2,
                found: 3,
            }),
            format => self.write_grid(format, &Grid::of_volume(vol), &vol.to_row_major_vec()),
        }
    }

    fn write_grid<T: Pixel>(&self, format: Format, grid: &Grid, values: &[T]) -> IoResult<()> {
        let path = self.path.as_path();
        debug!("writing `{}` as {}", path.display(), format.name());
        match format {
            Format::Meta => meta::write(grid, values, path, self.compress),
            Format::Nifti => nii::write(grid, values, path),
            Format::Vtk => vtk::write(grid, values, path),
            Format::Npy => npy::write(grid, values, path),
            Format::Raster(_) | Format::Dicom | Format::Nrrd => {
                Err(unsupported(format, "writing", path))
            }
        }
    }
}

/// 测试用临时目录.
#[cfg(test)]
pub(crate) fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("img-berry-tests").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            Format::from_path("a/b.PNG").unwrap(),
            Format::Raster(ImageFormat::Png)
        );
        assert_eq!(
            Format::from_path("x.jpg").unwrap(),
            Format::Raster(ImageFormat::Jpeg)
        );
        assert_eq!(Format::from_path("x.nii.gz").unwrap(), Format::Nifti);
        assert_eq!(Format::from_path("x.mhd").unwrap(), Format::Meta);
        assert_eq!(Format::from_path("dicom/IMG0001").unwrap(), Format::Dicom);
        assert_eq!(Format::from_path("h.nhdr").unwrap(), Format::Nrrd);
        assert!(matches!(
            Format::from_path("a.xyz"),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_png_u8_round_trip() {
        let path = test_dir("io_png").join("a.png");
        let img = Image2d::new(array![[0u8, 10, 255], [7, 8, 9]]);
        write_image(&img, &path).unwrap();
        let back: Image2d<u8> = read_image(&path).unwrap();
        assert_eq!(back.to_row_major_vec(), img.to_row_major_vec());

        let vol: Volume<f32> = read_volume(&path).unwrap();
        assert_eq!(vol.shape(), (1, 2, 3));
    }

    #[test]
    fn test_png_rejects_float() {
        let path = test_dir("io_png_float").join("f.png");
        let img = Image2d::new(array![[0.5f32]]);
        assert!(matches!(
            write_image(&img, &path),
            Err(IoError::PixelType { .. })
        ));
    }

    #[test]
    fn test_read_image_rejects_volume() {
        let path = test_dir("io_dim").join("v.mha");
        let vol = Volume::<u8>::zeros((2, 2, 2));
        write_volume(&vol, &path).unwrap();
        assert!(matches!(
            read_image::<u8, _>(&path),
            Err(IoError::Dimension { found: 3, .. })
        ));
        assert!(matches!(
            write_volume(&vol, path.with_extension("png")),
            Err(IoError::Dimension { .. })
        ));
    }

    #[test]
    fn test_explicit_writer() {
        let path = test_dir("io_explicit").join("out.dat");
        let vol = Volume::<f32>::zeros((2, 2, 2));
        assert!(write_volume(&vol, &path).is_err());
        WriterOptions::new(&path)
            .format(Format::Vtk)
            .write_volume(&vol)
            .unwrap();
        let text = std::fs::read(&path).unwrap();
        assert!(text.starts_with(b"# vtk DataFile Version 3.0"));
    }

    #[test]
    fn test_nrrd_unsupported() {
        assert!(matches!(
            read_any("volume.nhdr"),
            Err(IoError::UnsupportedFormat(_))
        ));
    }
}
