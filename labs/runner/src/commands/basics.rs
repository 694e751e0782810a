//! 基础操作: 创建, 查看, 信息, 逐像素运算.

use either::Either;
use img_berry::data::ImageInfo;
use img_berry::io::read_any;
use img_berry::montage::Montage;
use img_berry::{Image2d, Volume};
use utils::Args;

use super::{save_rescaled, sibling};
use crate::error::LabResult;

/// 打印信息时展示的像素个数.
const INFO_PIXELS: usize = 10;

/// 分配 720x348 的 2D 图像和 256x256x20 的 3D 图像.
pub fn create(args: Args) -> LabResult {
    args.finish()?;
    let img = Image2d::<u16>::zeros((348, 720));
    println!("2D image created with size: {:?}", img.size());
    let vol = Volume::<u16>::zeros((20, 256, 256));
    println!("3D image created with size: {:?}", vol.size());
    Ok(())
}

/// 读取图像, 拉伸后写出预览. 3D 图像写出所有切片的拼图.
pub fn show(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let preview = args
        .next_opt()
        .map_or_else(|| sibling(&input, "_preview.png"), Into::into);
    args.finish()?;

    match read_any(&input)? {
        Either::Left(img) => {
            println!("Input image: {}x{}", img.width(), img.height());
            save_rescaled(&img, preview)?;
        }
        Either::Right(vol) => {
            let [w, h, z] = vol.size();
            println!("Input volume: {w}x{h}x{z}");
            if Montage::of_volume(&vol).save(&preview)? {
                println!("Saved: {}", preview.display());
            }
        }
    }
    Ok(())
}

/// 打印尺寸, 原点, 间距, 方向以及前 10 个像素.
pub fn info(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    args.finish()?;

    let info = match read_any(&input)? {
        Either::Left(img) => ImageInfo::of_image(&img, INFO_PIXELS),
        Either::Right(vol) => ImageInfo::of_volume(&vol, INFO_PIXELS),
    };
    utils::sep();
    println!("{info}");
    utils::sep();
    Ok(())
}

/// 生成 20x20 的 `[0, 1)` 均匀随机图像, 逐像素平方, 打印第一行的前 10 个像素.
pub fn square_random(args: Args) -> LabResult {
    args.finish()?;
    let input = Image2d::random_uniform((20, 20), 0.0, 1.0, &mut rand::thread_rng());
    let output = input.map(|v| v * v);

    println!("Squaring every pixel (output = input * input):");
    for ((h, w), v) in input.indexed_iter().take(10) {
        println!(
            "Index: ({h}, {w}), input: {v:.4}, output: {:.4}",
            output[(h, w)]
        );
    }
    Ok(())
}
