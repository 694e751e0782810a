//! 命令测试共用的输入图像与临时目录.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use img_berry::io::write_image;
use img_berry::Image2d;
use utils::Args;

use super::find;
use crate::error::LabResult;

/// 清空并返回临时目录 `{tmp}/berry-labs-tests/{name}`.
pub(crate) fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("berry-labs-tests").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 160x160 的 8-bit 合成图像: 背景 40, `(128, 128)` 处半径 20 的圆盘为 90,
/// `(40, 40)` 处半径 12 的圆盘为 200.
pub(crate) fn phantom() -> Image2d<u8> {
    let disk = |(h, w): (usize, usize), (ch, cw): (usize, usize), r: usize| {
        let (dh, dw) = (h.abs_diff(ch), w.abs_diff(cw));
        dh * dh + dw * dw <= r * r
    };
    let pixels = (0..160 * 160)
        .map(|i| {
            let p = (i / 160, i % 160);
            if disk(p, (128, 128), 20) {
                90
            } else if disk(p, (40, 40), 12) {
                200
            } else {
                40
            }
        })
        .collect();
    Image2d::from_vec((160, 160), pixels).unwrap()
}

/// 把 [`phantom`] 写到 `dir/scan.png`, 返回路径.
pub(crate) fn write_phantom(dir: &Path) -> String {
    let path = dir.join("scan.png");
    write_image(&phantom(), &path).unwrap();
    path.display().to_string()
}

/// 以 `args` 执行命令 `name`.
pub(crate) fn run<I, S>(name: &str, args: I) -> LabResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let command = find(name).unwrap();
    (command.run)(Args::new(args))
}

/// `dir` 下的所有文件名.
pub(crate) fn file_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

/// 以字符串切片构造期望的文件名集合.
pub(crate) fn names<I, S>(it: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    it.into_iter().map(Into::into).collect()
}

/// `dir` 的字符串形式, 用作命令参数.
pub(crate) fn arg(dir: &Path) -> String {
    dir.display().to_string()
}
