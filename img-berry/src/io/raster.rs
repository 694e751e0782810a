//! png, jpg, bmp, tif 等普通位图. 编解码由 `image` crate 完成.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Primitive, RgbImage};

use crate::data::{Image2d, Pixel, PixelKind};

use super::{IoError, IoResult};

/// 以灰度读取位图. 彩色图像按亮度转换为单通道, 像素值保持原始范围 (如 0~255).
pub(crate) fn read(path: &Path) -> IoResult<Image2d<f32>> {
    let dynimg = image::open(path)?;
    match dynimg {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => from_buffer(dynimg.to_luma16()),
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            from_buffer(dynimg.to_luma32f())
        }
        _ => from_buffer(dynimg.to_luma8()),
    }
}

fn from_buffer<P>(buf: ImageBuffer<Luma<P>, Vec<P>>) -> IoResult<Image2d<f32>>
where
    P: Primitive + Into<f32>,
{
    let (w, h) = buf.dimensions();
    let values = buf.into_raw().into_iter().map(Into::into).collect();
    Ok(Image2d::from_vec((h as usize, w as usize), values)?)
}

/// 写入位图. 只接受 `u8` 与 `u16` 像素; 格式由扩展名决定.
pub(crate) fn write<T: Pixel>(img: &Image2d<T>, path: &Path) -> IoResult<()> {
    let (h, w) = img.shape();
    let (w, h) = (w as u32, h as u32);
    match T::KIND {
        PixelKind::U8 => {
            let pixels = img.cast::<u8>().to_row_major_vec();
            let buf = GrayImage::from_raw(w, h, pixels).ok_or_else(|| size_mismatch(path))?;
            buf.save(path)?;
        }
        PixelKind::U16 => {
            let pixels = img.cast::<u16>().to_row_major_vec();
            let buf = ImageBuffer::<Luma<u16>, _>::from_raw(w, h, pixels)
                .ok_or_else(|| size_mismatch(path))?;
            buf.save(path)?;
        }
        kind => {
            return Err(IoError::PixelType {
                kind,
                format: "raster writer",
            })
        }
    }
    Ok(())
}

#[inline]
fn size_mismatch(path: &Path) -> IoError {
    IoError::UnsupportedFormat(format!("{}: buffer size mismatch", path.display()))
}

/// 读取 8-bit RGB 图像.
pub fn read_rgb<P: AsRef<Path>>(path: P) -> IoResult<RgbImage> {
    Ok(image::open(path.as_ref())?.to_rgb8())
}

/// 写入 8-bit RGB 图像, 格式由扩展名决定.
pub fn write_rgb<P: AsRef<Path>>(img: &RgbImage, path: P) -> IoResult<()> {
    img.save(path.as_ref())?;
    Ok(())
}
