//! 体数据: 编号序列堆叠, DICOM 序列, 切片拼图.

use std::path::{Path, PathBuf};

use img_berry::io::{dicom_metadata, dicom_z_spacing, find_header_for_raw, read_volume, write_volume};
use img_berry::montage::Montage;
use img_berry::series::{prefixed_series, read_series, NumericSeries, SeriesError};
use img_berry::{Pixel, Volume};
use itertools::Itertools;
use utils::{Args, UsageError};

use super::sibling;
use crate::error::LabResult;

/// 拼图每行的切片数.
const MONTAGE_COLUMNS: usize = 4;

fn save_slices<T: Pixel>(vol: &Volume<T>, path: &Path) -> LabResult {
    let mut m = Montage::new(MONTAGE_COLUMNS);
    m.push_volume(vol);
    if m.save(path)? {
        println!("Slices montage saved to {}", path.display());
    }
    Ok(())
}

/// 把 `t%02d.bmp` 样式的编号序列堆叠成 8-bit 体数据.
pub fn series_to_volume(mut args: Args) -> LabResult {
    let pattern = args.required("pattern")?;
    let start: u32 = args.parse("start")?;
    let end: u32 = args.parse("end")?;
    let output = args.required("output")?;
    args.finish()?;

    let files = NumericSeries::new(pattern, start, end)?.file_names();
    let vol = read_series::<u8, _>(&files, 1.0)?;
    write_volume(&vol, &output)?;
    println!("3D volume created: {output}");
    save_slices(&vol, &sibling(&output, "_slices.png"))
}

/// 读取 `{dir}/{prefix}{index}{ext}` 样式的 DICOM 序列, 打印文件与元数据, 写出体数据.
pub fn dicom_series(mut args: Args) -> LabResult {
    let start: u32 = args
        .parse_flag("--start")?
        .ok_or_else(|| UsageError::Missing("start".to_string()))?;
    let end: u32 = args
        .parse_flag("--end")?
        .ok_or_else(|| UsageError::Missing("end".to_string()))?;
    let prefix = args.flag_value("--prefix")?.unwrap_or_else(|| "IMG".to_string());
    let exts = args
        .flag_values("--ext")
        .unwrap_or_else(|| vec![String::new(), ".dcm".to_string()]);
    let dir = args.required("dir")?;
    let output = args.required("output")?;
    args.finish()?;

    let exts = exts.iter().map(String::as_str).collect_vec();
    let files = prefixed_series(&dir, &prefix, start, end, &exts)?;
    let first = files
        .first()
        .ok_or(SeriesError::EmptyRange { start, end })?;
    let z_spacing = dicom_z_spacing(first)?.unwrap_or(1.0);
    let vol = read_series::<i16, _>(&files, z_spacing)?;

    println!("Read {} slices:", files.len());
    for f in files.iter() {
        println!("  {}", file_name(f));
    }
    println!("=== Volume metadata ===");
    for (key, value) in dicom_metadata(first)? {
        println!("{key}: {value}");
    }
    println!("=======================");

    write_volume(&vol, &output)?;
    println!("Volume saved to {output}");
    Ok(())
}

/// 读取体数据 (`.raw` 会先找到对应的头文件), 打印尺寸等信息并写出所有切片的拼图.
pub fn volume_slices(mut args: Args) -> LabResult {
    let input = args.required("volume")?;
    let montage = args
        .next_opt()
        .map_or_else(|| sibling(&input, "_slices.png"), PathBuf::from);
    args.finish()?;

    let path = if Path::new(&input)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("raw"))
    {
        find_header_for_raw(&input)?
    } else {
        PathBuf::from(&input)
    };
    let vol = read_volume::<f32, _>(&path)?;
    let g = vol.geometry();
    println!("Size: {:?}", vol.size());
    println!("Spacing: {:?}", g.spacing);
    println!("Origin: {:?}", g.origin);
    save_slices(&vol, &montage)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
