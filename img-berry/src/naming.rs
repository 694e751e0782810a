//! 输出文件命名.
//!
//! 每个流水线都按 `{目录}/{输入文件名}_{参数...}{扩展名}` 的模式命名输出.
//! 参数中的浮点数沿用 C 格式化习惯: `%g` (如 `2.5`, `0.0025`, `1e-05`),
//! `%f` (如 `1.000000`), 或固定位数小数 (如 `0.005`).

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// 输入文件名拆分出的基础名与扩展名.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileStem {
    /// 去掉目录和扩展名后的文件名.
    pub base: String,

    /// 带点的扩展名, 如 `.png`. 没有扩展名时为 `None`.
    pub ext: Option<String>,
}

impl FileStem {
    /// 拆分 `path`. 同时接受 `/` 和 `\` 作为目录分隔符.
    ///
    /// 只有最后一个 `.` 之后的部分被视为扩展名; 以 `.` 开头的文件名没有扩展名.
    pub fn parse(path: &str) -> Self {
        let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
        match file.rfind('.') {
            Some(dot) if dot > 0 => Self {
                base: file[..dot].to_string(),
                ext: Some(file[dot..].to_string()),
            },
            _ => Self {
                base: file.to_string(),
                ext: None,
            },
        }
    }

    /// 从 `Path` 拆分.
    #[inline]
    pub fn of_path<P: AsRef<Path>>(path: P) -> Self {
        Self::parse(&path.as_ref().to_string_lossy())
    }

    /// 扩展名, 缺失时使用 `default`.
    #[inline]
    pub fn ext_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.ext.as_deref().unwrap_or(default)
    }
}

/// 输出路径构造器.
///
/// ```
/// use img_berry::naming::OutputName;
///
/// let p = OutputName::new("out", "brain")
///     .part("CT")
///     .part(format_args!("L{}", 15))
///     .ext(".png")
///     .to_path();
/// assert_eq!(p, std::path::Path::new("out").join("brain_CT_L15.png"));
/// ```
#[derive(Clone, Debug)]
pub struct OutputName {
    dir: PathBuf,
    base: String,
    parts: Vec<String>,
    ext: String,
}

impl OutputName {
    /// 在 `dir` 目录下以 `base` 为前缀.
    pub fn new<P: AsRef<Path>, S: Into<String>>(dir: P, base: S) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            base: base.into(),
            parts: Vec::new(),
            ext: String::new(),
        }
    }

    /// 追加一段以 `_` 连接的参数.
    pub fn part<D: Display>(mut self, part: D) -> Self {
        self.parts.push(part.to_string());
        self
    }

    /// 设置扩展名 (带点).
    pub fn ext<S: Into<String>>(mut self, ext: S) -> Self {
        self.ext = ext.into();
        self
    }

    /// 文件名部分.
    pub fn file_name(&self) -> String {
        let mut name = self.base.clone();
        for p in self.parts.iter() {
            name.push('_');
            name.push_str(p);
        }
        name.push_str(&self.ext);
        name
    }

    /// 完整路径.
    #[inline]
    pub fn to_path(&self) -> PathBuf {
        self.dir.join(self.file_name())
    }
}

/// 按 C `%g` (6 位有效数字) 格式化, 即 C++ 流输出 `double` 的默认样式.
pub fn fmt_g(v: f64) -> String {
    const PRECISION: i32 = 6;

    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return if v.is_nan() {
            "nan".to_string()
        } else if v > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    // 先按有效数字舍入, 再决定指数, 以处理 999999.5 这类进位.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        trim_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

/// 按 C `%f` 格式化 (6 位小数), 即 `std::to_string(double)` 的样式.
#[inline]
pub fn fmt_to_string(v: f64) -> String {
    format!("{v:.6}")
}

/// 固定 `precision` 位小数.
#[inline]
pub fn fmt_fixed(v: f64, precision: usize) -> String {
    format!("{v:.precision$}")
}

/// 获取 `{用户主目录}/images` 目录下给定继续项组成的全路径.
pub fn home_images_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("images");
    ans.extend(it);
    Some(ans)
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
