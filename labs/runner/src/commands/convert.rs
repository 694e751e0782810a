//! 格式转换与类型转换.

use img_berry::filters::rescale_to_u8;
use img_berry::io::{read_image, read_rgb, read_volume, write_rgb, Format, WriterOptions};
use img_berry::montage::Montage;
use img_berry::Image2d;
use log::warn;
use utils::Args;

use super::{save, save_rescaled, sibling};
use crate::error::LabResult;

/// RGB 示例像素的坐标 `(x, y)`.
const SAMPLE_PIXEL: (u32, u32) = (25, 35);

/// 以 8-bit 读入, 再按输出扩展名写出.
pub fn convert(mut args: Args) -> LabResult {
    let input = args.required("input")?;
    let output = args.required("output")?;
    args.finish()?;

    let img: Image2d<u8> = read_image(&input)?;
    save(&img, output.clone().into())?;
    println!("Conversion done: {input} -> {output}");
    Ok(())
}

/// DICOM 按 `i16` 读入, 拉伸到 `[0, 255]` 后写成 PNG.
pub fn dicom_to_png(mut args: Args) -> LabResult {
    let input = args.required("input.dcm")?;
    let output = args.required("output.png")?;
    args.finish()?;

    let img: Image2d<i16> = read_image(&input)?;
    save_rescaled(&img, output.clone().into())?;
    println!("Converted: {input} -> {output}");
    Ok(())
}

/// 读取 DICOM, 在输入旁写出预览.
pub fn dicom_view(mut args: Args) -> LabResult {
    let input = args.required("input.dcm")?;
    args.finish()?;

    let img: Image2d<i16> = read_image(&input)?;
    println!("DICOM image: {}x{}", img.width(), img.height());
    save_rescaled(&img, sibling(&input, "_preview.png"))?;
    Ok(())
}

/// 以 `f32` 读入 3D 图像, 强制使用 VTK 写出.
pub fn export_vtk(mut args: Args) -> LabResult {
    let input = args.required("input")?;
    let output = args.required("output.vtk")?;
    args.finish()?;

    let vol = read_volume::<f32, _>(&input)?;
    WriterOptions::new(&output)
        .format(Format::Vtk)
        .write_volume(&vol)?;
    println!("Exported to VTK: {output}");
    Ok(())
}

/// 拉伸到 `[0, 255]` 并转换为 8-bit, 另外写出转换前后的对比拼图.
pub fn cast(mut args: Args) -> LabResult {
    let input = args.required("input")?;
    let output = args.required("output")?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let converted = rescale_to_u8(&img);
    save(&converted, output.clone().into())?;

    let preview = sibling(&output, "_preview.png");
    let mut m = Montage::new(2);
    m.push(&img).push(&converted);
    if m.save(&preview)? {
        println!("Saved: {}", preview.display());
    }
    Ok(())
}

/// 读取 RGB 图像, 打印 (25, 35) 处的像素, 写出副本和 PNG 预览.
pub fn rgb_pixel(mut args: Args) -> LabResult {
    let input = args.required("input")?;
    let output = args.required("output")?;
    args.finish()?;

    let img = read_rgb(&input)?;
    let (x, y) = SAMPLE_PIXEL;
    if x < img.width() && y < img.height() {
        let [r, g, b] = img.get_pixel(x, y).0;
        println!("Sample pixel at ({x},{y}): Red={r}, Green={g}, Blue={b}");
    } else {
        warn!(
            "pixel ({x},{y}) lies outside the {}x{} image",
            img.width(),
            img.height()
        );
    }

    write_rgb(&img, &output)?;
    println!("Image written to {output}");
    let preview = sibling(&output, "_preview.png");
    write_rgb(&img, &preview)?;
    println!("Preview saved to {}", preview.display());
    Ok(())
}

/// 取出第 `z` 个水平切片. 写成位图时先拉伸到 `[0, 255]`.
pub fn extract_slice(mut args: Args) -> LabResult {
    let input = args.required("volume")?;
    let output = args.required("output")?;
    let z: usize = args.parse("z")?;
    args.finish()?;

    let vol = read_volume::<f32, _>(&input)?;
    let slice = vol.slice_at(z)?;
    match Format::from_path(&output)? {
        Format::Raster(_) => save_rescaled(&slice, output.clone().into())?,
        _ => save(&slice, output.clone().into())?,
    };
    println!("Slice Z={z} extracted to: {output}");
    Ok(())
}
