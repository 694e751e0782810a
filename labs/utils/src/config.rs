//! 输出目录配置.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use img_berry::consts::OUTPUT_DIR_ENV;
use img_berry::naming::home_images_dir_with;
use log::debug;

/// 命令行没有给出输出目录时的回退方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputFallback {
    /// 当前目录.
    Cwd,
    /// 见 [`output_dir_from_env_or_home`].
    EnvOrHome,
}

/// 获取默认输出目录.
///
/// 1. 若环境变量 `$BERRY_OUTPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/images/images_generated`;
/// 3. 无法确定主目录时, 返回当前目录.
pub fn output_dir_from_env_or_home() -> PathBuf {
    match env::var(OUTPUT_DIR_ENV) {
        Ok(d) if !d.is_empty() => PathBuf::from(d),
        _ => home_images_dir_with(["images_generated"]).unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// 按 "命令行参数 → 回退方式" 的顺序确定输出目录, 并确保目录存在.
pub fn resolve_output_dir(arg: Option<String>, fallback: OutputFallback) -> io::Result<PathBuf> {
    let dir = match (arg, fallback) {
        (Some(d), _) => PathBuf::from(d),
        (None, OutputFallback::Cwd) => PathBuf::from("."),
        (None, OutputFallback::EnvOrHome) => output_dir_from_env_or_home(),
    };
    ensure_dir(&dir)?;
    Ok(dir)
}

/// 目录不存在时创建它 (含父目录).
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> io::Result<()> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        debug!("creating output directory `{}`", dir.display());
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
