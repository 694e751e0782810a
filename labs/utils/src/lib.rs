//! 实验程序依赖的通用组件.

use std::io;

use log::LevelFilter;
use simple_logger::SimpleLogger;

pub mod args;
pub mod config;

pub use args::{Args, UsageError};

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: io::Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 初始化日志. 默认级别为 `info`, 可以用 `RUST_LOG` 覆盖.
///
/// 重复初始化时静默忽略.
pub fn init_logger() {
    let _ = SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sep_to() {
        let mut buf = Vec::new();
        sep_to(&mut buf).unwrap();
        assert_eq!(buf, format!("{SEP}\n").into_bytes());
    }

    #[test]
    fn test_cpus() {
        assert!(cpus() >= 1);
    }
}
