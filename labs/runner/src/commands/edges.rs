//! 梯度, 阈值, 边缘检测流水线. 默认输出到当前目录.

use img_berry::filters::{
    BinaryThreshold, Canny, Chain, Filter, GradientMagnitude, GradientMagnitudeGaussian, Mean,
    Threshold,
};
use img_berry::io::read_image;
use img_berry::naming::{fmt_to_string, FileStem, OutputName};
use img_berry::Image2d;
use utils::config::{resolve_output_dir, OutputFallback};
use utils::Args;

use super::{save, save_rescaled};
use crate::error::LabResult;

/// 5x5 均值平滑后分别求梯度幅值和高斯梯度幅值.
pub fn gradient(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let sigma: f64 = args.parse_or("sigma", 1.0)?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::Cwd)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let base = FileStem::parse(&input).base;
    let sigma_part = format!("sigma{}", fmt_to_string(sigma));

    let plain = Chain::new().then(Mean::with_kernel(5)).then(GradientMagnitude);
    let gauss = Chain::new()
        .then(Mean::with_kernel(5))
        .then(GradientMagnitudeGaussian::new(sigma));
    let outputs = [
        (plain, "gradmag_gauss_mean5x5"),
        (gauss, "gradmagRec_mean5x5"),
    ];

    println!("Generated images:");
    for (chain, tag) in outputs.iter() {
        let path = OutputName::new(&dir, &base)
            .part(tag)
            .part(&sigma_part)
            .ext(".png")
            .to_path();
        save_rescaled(&chain.apply(&img), path)?;
    }
    Ok(())
}

/// 二值阈值和 "低于阈值置为 outside" 阈值.
pub fn threshold(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let lower: f32 = args.parse_or("lower", 150.0)?;
    let upper: f32 = args.parse_or("upper", 180.0)?;
    let outside: f32 = args.parse_or("outside", 0.0)?;
    let inside: f32 = args.parse_or("inside", 255.0)?;
    let below: f32 = args.parse_or("below", 180.0)?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::Cwd)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let base = FileStem::parse(&input).base;
    let filters: [Box<dyn Filter>; 2] = [
        Box::new(BinaryThreshold {
            lower,
            upper,
            inside,
            outside,
        }),
        Box::new(Threshold::Below {
            value: below,
            outside,
        }),
    ];
    for f in filters.iter() {
        let path = OutputName::new(&dir, &base).part(f.tag()).ext(".png").to_path();
        save(&f.apply(&img).cast::<u8>(), path)?;
    }
    Ok(())
}

/// Canny 边缘检测.
pub fn canny(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let variance: f64 = args.parse("variance")?;
    let lower: f32 = args.parse("lower")?;
    let upper: f32 = args.parse("upper")?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::Cwd)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let filter = Canny::new(variance, lower, upper);
    let path = OutputName::new(&dir, FileStem::parse(&input).base)
        .part(filter.tag())
        .ext(".png")
        .to_path();
    save(&filter.apply(&img).cast::<u8>(), path)?;
    Ok(())
}
