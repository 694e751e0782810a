//! 命令表与各命令共用的小工具.

use std::path::{Path, PathBuf};

use img_berry::filters::rescale_to_u8;
use img_berry::io::write_image;
use img_berry::naming::FileStem;
use img_berry::{Image2d, Pixel};
use log::info;
use utils::Args;

use crate::error::LabResult;

mod basics;
mod convert;
mod edges;
mod segmentation;
mod smoothing;
mod volumes;

#[cfg(test)]
mod fixtures;

/// 一个子命令.
pub struct Command {
    /// 命令名.
    pub name: &'static str,
    /// 参数说明.
    pub usage: &'static str,
    /// 执行函数. 参数中不含命令名.
    pub run: fn(Args) -> LabResult,
}

/// 所有子命令.
pub const COMMANDS: &[Command] = &[
    Command {
        name: "create",
        usage: "",
        run: basics::create,
    },
    Command {
        name: "show",
        usage: "<image> [preview.png]",
        run: basics::show,
    },
    Command {
        name: "info",
        usage: "<image>",
        run: basics::info,
    },
    Command {
        name: "square-random",
        usage: "",
        run: basics::square_random,
    },
    Command {
        name: "mean",
        usage: "<image> <kernel_size> [out_dir]",
        run: smoothing::mean,
    },
    Command {
        name: "intensity",
        usage: "<image> [out_dir]",
        run: smoothing::intensity,
    },
    Command {
        name: "denoise",
        usage: "<image> [out_dir]",
        run: smoothing::denoise,
    },
    Command {
        name: "smooth",
        usage: "<image> [out_dir]",
        run: smoothing::smooth,
    },
    Command {
        name: "gradient",
        usage: "<image> [sigma=1] [out_dir=./]",
        run: edges::gradient,
    },
    Command {
        name: "threshold",
        usage: "<image> [lower=150] [upper=180] [outside=0] [inside=255] [below=180] [out_dir=./]",
        run: edges::threshold,
    },
    Command {
        name: "canny",
        usage: "<image> <variance> <lower> <upper> [out_dir=./]",
        run: edges::canny,
    },
    Command {
        name: "region-grow",
        usage: "<image> <prefix> [out_dir=./]",
        run: segmentation::region_grow,
    },
    Command {
        name: "watershed",
        usage: "<image> <prefix> [out_dir=./]",
        run: segmentation::watershed,
    },
    Command {
        name: "convert",
        usage: "<input> <output>",
        run: convert::convert,
    },
    Command {
        name: "dicom-to-png",
        usage: "<input.dcm> <output.png>",
        run: convert::dicom_to_png,
    },
    Command {
        name: "dicom-view",
        usage: "<input.dcm>",
        run: convert::dicom_view,
    },
    Command {
        name: "export-vtk",
        usage: "<input> <output.vtk>",
        run: convert::export_vtk,
    },
    Command {
        name: "cast",
        usage: "<input> <output>",
        run: convert::cast,
    },
    Command {
        name: "rgb-pixel",
        usage: "<input> <output>",
        run: convert::rgb_pixel,
    },
    Command {
        name: "extract-slice",
        usage: "<volume> <output> <z>",
        run: convert::extract_slice,
    },
    Command {
        name: "series-to-volume",
        usage: "<pattern> <start> <end> <output>",
        run: volumes::series_to_volume,
    },
    Command {
        name: "dicom-series",
        usage: "<dir> <output> --start N --end M [--prefix IMG] [--ext EXT...]",
        run: volumes::dicom_series,
    },
    Command {
        name: "volume-slices",
        usage: "<volume> [montage.png]",
        run: volumes::volume_slices,
    },
];

/// 按名字查找命令.
pub fn find(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// 写出图像并打印路径.
fn save<T: Pixel>(img: &Image2d<T>, path: PathBuf) -> LabResult<PathBuf> {
    write_image(img, &path)?;
    info!("wrote {}x{} image", img.width(), img.height());
    println!("Saved: {}", path.display());
    Ok(path)
}

/// 拉伸到 `[0, 255]` 后以 8-bit 写出.
#[inline]
fn save_rescaled<T: Pixel>(img: &Image2d<T>, path: PathBuf) -> LabResult<PathBuf> {
    save(&rescale_to_u8(img), path)
}

/// 与 `path` 同目录, 名为 `{base}{suffix}` 的文件.
fn sibling(path: &str, suffix: &str) -> PathBuf {
    let stem = FileStem::parse(path);
    Path::new(path).with_file_name(format!("{}{suffix}", stem.base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_command_names_unique() {
        let names: HashSet<_> = COMMANDS.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), COMMANDS.len());
        assert!(find("region-grow").is_some());
        assert!(find("diffusion").is_none());
    }

    #[test]
    fn test_sibling() {
        assert_eq!(
            sibling("data/scan.dcm", "_preview.png"),
            Path::new("data").join("scan_preview.png")
        );
        assert_eq!(sibling("scan", "_preview.png"), PathBuf::from("scan_preview.png"));
    }
}
