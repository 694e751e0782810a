//! 编号文件序列: 由模式生成文件名, 逐个读取 2D 切片并堆叠为体数据.

use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::data::{LayoutError, Pixel, Volume};
use crate::io::{read_image, IoError};

/// 文件序列错误.
#[derive(Debug, Error)]
pub enum SeriesError {
    /// 模式中没有恰好一个 `%d` 类占位符.
    #[error("bad series pattern `{0}`, expected exactly one of %d, %Nd, %0Nd")]
    BadPattern(String),

    /// 起止索引为空区间.
    #[error("empty index range {start}..={end}")]
    EmptyRange {
        /// 起始索引.
        start: u32,
        /// 终止索引.
        end: u32,
    },

    /// 某个索引找不到文件.
    #[error("no slice file for index {index}, tried {tried:?}")]
    MissingSlice {
        /// 索引.
        index: u32,
        /// 尝试过的路径.
        tried: Vec<PathBuf>,
    },

    /// 切片读取错误.
    #[error(transparent)]
    Io(#[from] IoError),

    /// 切片形状不一致.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// 以 printf 风格模式生成的编号文件名序列, 如 `t%02d.bmp` 从 50 到 60.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NumericSeries {
    pattern: String,
    start: u32,
    end: u32,
    step: u32,
}

impl NumericSeries {
    /// 生成 `start..=end` 的序列, 步长为 1.
    pub fn new<S: Into<String>>(pattern: S, start: u32, end: u32) -> Result<Self, SeriesError> {
        let pattern = pattern.into();
        format_index(&pattern, start)?;
        if start > end {
            return Err(SeriesError::EmptyRange { start, end });
        }
        Ok(Self {
            pattern,
            start,
            end,
            step: 1,
        })
    }

    /// 设置步长. 步长为 0 时按 1 处理.
    pub fn step(mut self, step: u32) -> Self {
        self.step = step.max(1);
        self
    }

    /// 生成全部文件名.
    pub fn file_names(&self) -> Vec<PathBuf> {
        (self.start..=self.end)
            .step_by(self.step as usize)
            .filter_map(|i| format_index(&self.pattern, i).ok())
            .map(PathBuf::from)
            .collect()
    }
}

/// 占位符宽度上限.
const MAX_INDEX_WIDTH: usize = 32;

/// 用 `index` 替换模式中唯一的 `%d`, `%Nd` 或 `%0Nd`. `%%` 表示字面量 `%`.
pub fn format_index(pattern: &str, index: u32) -> Result<String, SeriesError> {
    let bad = || SeriesError::BadPattern(pattern.to_string());

    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars().peekable();
    let mut replaced = false;
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        let zero = chars.next_if_eq(&'0').is_some();
        let mut width = 0usize;
        while let Some(d) = chars.peek().and_then(|d| d.to_digit(10)) {
            width = width
                .checked_mul(10)
                .and_then(|w| w.checked_add(d as usize))
                .filter(|&w| w <= MAX_INDEX_WIDTH)
                .ok_or_else(bad)?;
            chars.next();
        }
        if chars.next() != Some('d') || replaced {
            return Err(bad());
        }
        if zero {
            out.push_str(&format!("{index:0width$}"));
        } else {
            out.push_str(&format!("{index:width$}"));
        }
        replaced = true;
    }
    if replaced {
        Ok(out)
    } else {
        Err(bad())
    }
}

/// 为 `start..=end` 中每个索引寻找 `{dir}/{prefix}{index}{ext}`, `exts` 依次尝试.
pub fn prefixed_series<P: AsRef<Path>>(
    dir: P,
    prefix: &str,
    start: u32,
    end: u32,
    exts: &[&str],
) -> Result<Vec<PathBuf>, SeriesError> {
    if start > end {
        return Err(SeriesError::EmptyRange { start, end });
    }
    let dir = dir.as_ref();
    (start..=end)
        .map(|index| {
            let tried: Vec<PathBuf> = exts
                .iter()
                .map(|ext| dir.join(format!("{prefix}{index}{ext}")))
                .collect();
            match tried.iter().find(|p| p.is_file()) {
                Some(p) => Ok(p.clone()),
                None => Err(SeriesError::MissingSlice { index, tried }),
            }
        })
        .collect()
}

/// 逐个读取 `files` 并沿 z 方向堆叠, 层间距为 `z_spacing`.
pub fn read_series<T: Pixel, P: AsRef<Path>>(
    files: &[P],
    z_spacing: f64,
) -> Result<Volume<T>, SeriesError> {
    let slices = files
        .iter()
        .map(|f| {
            debug!("reading slice `{}`", f.as_ref().display());
            read_image::<T, _>(f)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Volume::from_slices(&slices, z_spacing)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{test_dir, write_image};
    use crate::Image2d;

    #[test]
    fn test_format_index() {
        assert_eq!(format_index("t%02d.bmp", 5).unwrap(), "t05.bmp");
        assert_eq!(format_index("t%02d.bmp", 123).unwrap(), "t123.bmp");
        assert_eq!(format_index("s%d.png", 7).unwrap(), "s7.png");
        assert_eq!(format_index("s%3d", 7).unwrap(), "s  7");
        assert_eq!(format_index("100%%_%d", 1).unwrap(), "100%_1");
        assert!(format_index("plain.png", 1).is_err());
        assert!(format_index("%d_%d", 1).is_err());
        assert!(format_index("%s", 1).is_err());
        assert!(format_index("t%032d", 1).is_ok());
        assert!(matches!(format_index("t%033d", 1), Err(SeriesError::BadPattern(_))));
        assert!(matches!(
            format_index("t%0999999999999999999999d.png", 1),
            Err(SeriesError::BadPattern(_))
        ));
    }

    #[test]
    fn test_numeric_series() {
        let s = NumericSeries::new("t%02d.bmp", 50, 53).unwrap();
        assert_eq!(
            s.file_names(),
            ["t50.bmp", "t51.bmp", "t52.bmp", "t53.bmp"].map(PathBuf::from)
        );
        assert_eq!(s.step(2).file_names().len(), 2);
        assert!(matches!(
            NumericSeries::new("t%d", 3, 2),
            Err(SeriesError::EmptyRange { start: 3, end: 2 })
        ));
    }

    #[test]
    fn test_prefixed_series_and_read() {
        let dir = test_dir("series_prefixed");
        for i in 1..=3u8 {
            let img = Image2d::new(ndarray::Array2::from_elem((2, 2), i));
            write_image(&img, dir.join(format!("IMG{i}.png"))).unwrap();
        }
        let files = prefixed_series(&dir, "IMG", 1, 3, &["", ".png"]).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[2].ends_with("IMG3.png"));

        let vol: Volume<u8> = read_series(&files, 2.0).unwrap();
        assert_eq!(vol.shape(), (3, 2, 2));
        assert_eq!(vol[(2, 1, 1)], 3);

        assert!(matches!(
            prefixed_series(&dir, "IMG", 1, 4, &["", ".png"]),
            Err(SeriesError::MissingSlice { index: 4, .. })
        ));
    }
}
