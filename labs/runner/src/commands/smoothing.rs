//! 灰度变换与平滑流水线. 默认输出到 `$BERRY_OUTPUT_DIR` 或 `~/images/images_generated`.

use img_berry::consts::DEFAULT_EXT;
use img_berry::filters::{
    normalize, rescale, rescale_to_u8, AxisGaussian, BinomialBlur, DiscreteGaussian, Filter, Mean,
    Median, ShiftScale,
};
use img_berry::io::read_image;
use img_berry::montage::Montage;
use img_berry::naming::{FileStem, OutputName};
use img_berry::Image2d;
use utils::config::{resolve_output_dir, OutputFallback};
use utils::Args;

use super::{save, save_rescaled};
use crate::error::LabResult;

/// 均值滤波, 半径为 `kernel / 2`, 另外写出原图与结果的对比拼图.
pub fn mean(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let kernel: usize = args.parse("kernel_size")?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::EnvOrHome)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let filter = Mean::with_kernel(kernel);
    let filtered = filter.apply(&img);

    let stem = FileStem::parse(&input);
    let name = OutputName::new(&dir, &stem.base).part(filter.tag());
    save(&filtered.cast::<u8>(), name.clone().ext(stem.ext_or(DEFAULT_EXT)).to_path())?;

    let montage = name.part("montage").ext(".png").to_path();
    let mut m = Montage::new(2).rescale(false);
    m.push(&img).push(&filtered);
    if m.save(&montage)? {
        println!("Saved: {}", montage.display());
    }
    Ok(())
}

/// 线性拉伸, 平移缩放, 标准化.
pub fn intensity(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::EnvOrHome)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let [w, h] = img.size();
    println!("Image size: {w} x {h}");

    let rescaled = rescale(&img, 10.0, 250.0);
    let (shifted, report) = ShiftScale::new(25.0, 1.2).apply_to::<u8>(&img);
    if report.underflow + report.overflow > 0 {
        log::warn!(
            "shift/scale: {} pixels below 0 and {} above 255 were clamped",
            report.underflow,
            report.overflow
        );
    }
    let normalized = rescale_to_u8(&normalize(&img));

    let at = |name: &str| OutputName::new(&dir, name).ext(".png").to_path();
    save(&img.cast::<u8>(), at("original"))?;
    save(&rescaled.cast::<u8>(), at("rescale"))?;
    save(&shifted, at("shift_scale"))?;
    save(&normalized, at("normalize"))?;
    println!("Images saved in: {}", dir.display());
    Ok(())
}

/// 3x3 / 5x5 均值与中值滤波.
pub fn denoise(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::EnvOrHome)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let [w, h] = img.size();
    println!("Image size: {w} x {h}");

    let filters: [Box<dyn Filter>; 4] = [
        Box::new(Mean::with_kernel(3)),
        Box::new(Mean::with_kernel(5)),
        Box::new(Median::with_kernel(3)),
        Box::new(Median::with_kernel(5)),
    ];
    for f in filters.iter() {
        let path = OutputName::new(&dir, f.tag()).ext(DEFAULT_EXT).to_path();
        save(&f.apply(&img).cast::<u8>(), path)?;
    }
    println!("Filtered images saved in: {}", dir.display());
    Ok(())
}

/// 离散高斯, 二项式模糊, X 方向与 XY 方向高斯平滑. 输出沿用输入的扩展名.
pub fn smooth(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::EnvOrHome)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let stem = FileStem::parse(&input);
    let ext = stem.ext_or(DEFAULT_EXT);
    let at = |part: String| OutputName::new(&dir, &stem.base).part(part).ext(ext).to_path();

    save_rescaled(&img, at("original".to_string()))?;
    let filters: [Box<dyn Filter>; 4] = [
        Box::new(DiscreteGaussian::new(4.0, 3)),
        Box::new(BinomialBlur::new(5)),
        Box::new(AxisGaussian::x(3.0)),
        Box::new(AxisGaussian::xy(3.0)),
    ];
    for f in filters.iter() {
        save_rescaled(&f.apply(&img), at(f.tag()))?;
    }
    println!("Images saved in: {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{arg, file_names, names, run, test_dir, write_phantom};

    #[test]
    fn test_mean_outputs() {
        let input = write_phantom(&test_dir("mean_in"));
        let out = test_dir("mean_out");
        run("mean", [input, "3".to_string(), arg(&out)]).unwrap();
        assert_eq!(
            file_names(&out),
            names(["scan_mean_3x3.png", "scan_mean_3x3_montage.png"])
        );
    }

    #[test]
    fn test_intensity_outputs() {
        let input = write_phantom(&test_dir("intensity_in"));
        let out = test_dir("intensity_out");
        run("intensity", [input, arg(&out)]).unwrap();
        assert_eq!(
            file_names(&out),
            names(["original.png", "rescale.png", "shift_scale.png", "normalize.png"])
        );
    }

    #[test]
    fn test_denoise_outputs() {
        let input = write_phantom(&test_dir("denoise_in"));
        let out = test_dir("denoise_out");
        run("denoise", [input, arg(&out)]).unwrap();
        assert_eq!(
            file_names(&out),
            names(["mean_3x3.jpg", "mean_5x5.jpg", "median_3x3.jpg", "median_5x5.jpg"])
        );
    }

    #[test]
    fn test_smooth_keeps_input_extension() {
        let input = write_phantom(&test_dir("smooth_in"));
        let out = test_dir("smooth_out");
        run("smooth", [input, arg(&out)]).unwrap();
        assert_eq!(
            file_names(&out),
            names([
                "scan_original.png",
                "scan_discreteGaussian_V4_K3.png",
                "scan_binomialBlur_R5.png",
                "scan_recursiveGaussianX_S3.png",
                "scan_recursiveGaussianXY_S3.png",
            ])
        );
    }

    #[test]
    fn test_missing_kernel_is_usage_error() {
        let input = write_phantom(&test_dir("mean_usage"));
        assert!(matches!(
            run("mean", [input]),
            Err(crate::error::LabError::Usage(_))
        ));
    }
}
