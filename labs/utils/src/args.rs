//! 位置参数游标. 各命令按顺序取出自己的参数, 取不到或解析失败时报告用法错误.

use std::collections::VecDeque;
use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// 命令行用法错误.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum UsageError {
    /// 缺少必需参数.
    #[error("missing argument <{0}>")]
    Missing(String),

    /// 参数无法解析.
    #[error("invalid value `{value}` for <{name}>: {reason}")]
    Invalid {
        /// 参数名.
        name: String,
        /// 原始值.
        value: String,
        /// 解析错误.
        reason: String,
    },

    /// 多余的参数.
    #[error("unexpected argument `{0}`")]
    Unexpected(String),

    /// 未知命令.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
}

/// 剩余的命令行参数.
#[derive(Clone, Debug)]
pub struct Args {
    items: VecDeque<String>,
}

impl Args {
    /// 以 `items` 构造. 不含程序名.
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(items: I) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// 取进程的命令行参数, 跳过程序名.
    pub fn from_env() -> Self {
        Self::new(std::env::args().skip(1))
    }

    /// 剩余参数个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否没有剩余参数.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 取出下一个参数.
    #[inline]
    pub fn next_opt(&mut self) -> Option<String> {
        self.items.pop_front()
    }

    /// 取出下一个必需参数.
    pub fn required(&mut self, name: &str) -> Result<String, UsageError> {
        self.next_opt()
            .ok_or_else(|| UsageError::Missing(name.to_string()))
    }

    /// 取出并解析下一个必需参数.
    pub fn parse<T>(&mut self, name: &str) -> Result<T, UsageError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.required(name)?;
        parse_value(name, value)
    }

    /// 取出并解析下一个可选参数, 没有时返回 `default`.
    pub fn parse_or<T>(&mut self, name: &str, default: T) -> Result<T, UsageError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.next_opt() {
            Some(value) => parse_value(name, value),
            None => Ok(default),
        }
    }

    /// 在任意位置找到 `flag`, 取出它和紧随其后的一个值.
    pub fn flag_value(&mut self, flag: &str) -> Result<Option<String>, UsageError> {
        let Some(at) = self.items.iter().position(|a| a == flag) else {
            return Ok(None);
        };
        self.items.remove(at);
        self.items
            .remove(at)
            .map(Some)
            .ok_or_else(|| UsageError::Missing(flag.trim_start_matches('-').to_string()))
    }

    /// 同 [`Self::flag_value`], 并解析该值.
    pub fn parse_flag<T>(&mut self, flag: &str) -> Result<Option<T>, UsageError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.flag_value(flag)?
            .map(|v| parse_value(flag.trim_start_matches('-'), v))
            .transpose()
    }

    /// 在任意位置找到 `flag`, 取出它和其后直到下一个 `--` 开头的参数之前的所有值.
    /// 没有找到 `flag` 时返回 `None`.
    pub fn flag_values(&mut self, flag: &str) -> Option<Vec<String>> {
        let at = self.items.iter().position(|a| a == flag)?;
        self.items.remove(at);
        let mut values = Vec::new();
        while at < self.items.len() && !self.items[at].starts_with("--") {
            values.extend(self.items.remove(at));
        }
        Some(values)
    }

    /// 确认所有参数都已被取出.
    pub fn finish(self) -> Result<(), UsageError> {
        match self.items.into_iter().next() {
            Some(extra) => Err(UsageError::Unexpected(extra)),
            None => Ok(()),
        }
    }
}

fn parse_value<T>(name: &str, value: String) -> Result<T, UsageError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| UsageError::Invalid {
        name: name.to_string(),
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional() {
        let mut a = Args::new(["in.png", "5", "x"]);
        assert_eq!(a.required("input").unwrap(), "in.png");
        assert_eq!(a.parse::<usize>("kernel").unwrap(), 5);
        assert!(matches!(
            a.parse::<f64>("sigma"),
            Err(UsageError::Invalid { ref value, .. }) if value == "x"
        ));
        assert_eq!(a.parse_or("lower", 150.0f32).unwrap(), 150.0);
        assert_eq!(
            a.required("out"),
            Err(UsageError::Missing("out".to_string()))
        );
    }

    #[test]
    fn test_flags() {
        let mut a = Args::new(["dir", "--start", "1", "out.mha", "--ext", "", ".dcm", "--end", "3"]);
        assert_eq!(a.parse_flag::<u32>("--start").unwrap(), Some(1));
        assert_eq!(a.parse_flag::<u32>("--end").unwrap(), Some(3));
        assert_eq!(a.flag_value("--prefix").unwrap(), None);
        assert_eq!(
            a.flag_values("--ext"),
            Some(vec![String::new(), ".dcm".to_string()])
        );
        assert_eq!(a.required("dir").unwrap(), "dir");
        assert_eq!(a.required("out").unwrap(), "out.mha");
        assert!(a.finish().is_ok());

        let mut b = Args::new(["--start"]);
        assert!(b.flag_value("--start").is_err());
        assert_eq!(
            Args::new(["extra"]).finish(),
            Err(UsageError::Unexpected("extra".to_string()))
        );
    }
}
