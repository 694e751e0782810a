//! 参数扫描.
//!
//! 以参数列表的笛卡尔积枚举所有组合, 对每个组合执行一次处理并写出一个文件,
//! 最后汇总写出与失败的情况.

use std::fmt::{self, Display};
use std::path::PathBuf;

use itertools::{iproduct, Itertools};
use log::{info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

/// 待执行的参数组合.
#[derive(Clone, Debug, PartialEq)]
pub struct Sweep<P> {
    combos: Vec<P>,
}

impl<P> Sweep<P> {
    /// 直接给出所有组合.
    #[inline]
    pub fn new(combos: Vec<P>) -> Self {
        Self { combos }
    }

    /// 组合个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.combos.len()
    }

    /// 是否没有组合.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    /// 按顺序遍历所有组合.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.combos.iter()
    }

    /// 把 `other` 的组合接在后面.
    pub fn chain(mut self, other: Sweep<P>) -> Self {
        self.combos.extend(other.combos);
        self
    }

    /// 以 `f` 变换每个组合.
    pub fn map<Q, F: FnMut(P) -> Q>(self, f: F) -> Sweep<Q> {
        Sweep::new(self.combos.into_iter().map(f).collect())
    }
}

impl<A: Clone, B: Clone> Sweep<(A, B)> {
    /// `a x b`, `b` 变化最快.
    pub fn grid2(a: &[A], b: &[B]) -> Self {
        Self::new(iproduct!(a.iter().cloned(), b.iter().cloned()).collect())
    }
}

impl<A: Clone, B: Clone, C: Clone> Sweep<(A, B, C)> {
    /// `a x b x c`, `c` 变化最快.
    pub fn grid3(a: &[A], b: &[B], c: &[C]) -> Self {
        Self::new(iproduct!(a.iter().cloned(), b.iter().cloned(), c.iter().cloned()).collect())
    }
}

impl<T: Clone> Sweep<Vec<T>> {
    /// 任意多个同类型参数列表的笛卡尔积, 最后一个列表变化最快.
    pub fn grid_n(axes: &[Vec<T>]) -> Self {
        if axes.is_empty() {
            return Self::new(Vec::new());
        }
        Self::new(
            axes.iter()
                .map(|a| a.iter().cloned())
                .multi_cartesian_product()
                .collect(),
        )
    }
}

impl<P: Sync> Sweep<P> {
    /// 对每个组合执行 `op`. `op` 返回写出的文件路径.
    /// 打开 `rayon` feature 时并行执行, 结果仍按组合顺序排列.
    pub fn run<F, E>(&self, op: F) -> SweepReport
    where
        F: Fn(&P) -> Result<PathBuf, E> + Sync + Send,
        E: Display,
    {
        let one = |p: &P| op(p).map_err(|e| e.to_string());

        #[cfg(feature = "rayon")]
        let results: Vec<_> = self.combos.par_iter().map(one).collect();

        #[cfg(not(feature = "rayon"))]
        let results: Vec<_> = self.combos.iter().map(one).collect();

        let mut report = SweepReport::default();
        for (index, r) in results.into_iter().enumerate() {
            match r {
                Ok(path) => {
                    info!("sweep #{index}: wrote {}", path.display());
                    report.written.push(path);
                }
                Err(e) => {
                    warn!("sweep #{index}: {e}");
                    report.failed.push((index, e));
                }
            }
        }
        report
    }
}

impl<'a, P> IntoIterator for &'a Sweep<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 一次扫描的汇总.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepReport {
    /// 成功写出的文件, 按组合顺序.
    pub written: Vec<PathBuf>,
    /// 失败的组合序号及原因.
    pub failed: Vec<(usize, String)>,
}

impl SweepReport {
    /// 是否全部成功.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// 合并两次扫描的结果. `other` 中的序号保持不变.
    pub fn merge(mut self, other: SweepReport) -> Self {
        self.written.extend(other.written);
        self.failed.extend(other.failed);
        self
    }
}

impl Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} written, {} failed", self.written.len(), self.failed.len())?;
        for (index, reason) in self.failed.iter() {
            write!(f, "\n    #{index}: {reason}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_order() {
        let s = Sweep::grid2(&[0, 1], &["a", "b", "c"]);
        assert_eq!(s.len(), 6);
        assert_eq!(s.iter().next(), Some(&(0, "a")));
        assert_eq!(s.iter().nth(1), Some(&(0, "b")));
        assert_eq!(s.iter().last(), Some(&(1, "c")));

        let s3 = Sweep::grid3(&[1, 2], &[1.0, 2.5], &[1, 3]);
        assert_eq!(s3.len(), 8);
        assert_eq!(s3.iter().nth(1), Some(&(1, 1.0, 3)));

        let n = Sweep::grid_n(&[vec![1, 2], vec![3], vec![4, 5]]);
        assert_eq!(n.len(), 4);
        assert_eq!(n.iter().last(), Some(&vec![2, 3, 5]));
        assert!(Sweep::<Vec<i32>>::grid_n(&[]).is_empty());
    }

    #[test]
    fn test_run_report() {
        let _ = simple_logger::SimpleLogger::new().init();
        let s = Sweep::new(vec![1, 2, 3, 4]).chain(Sweep::new(vec![5]));
        let report = s.run(|&i| {
            if i % 2 == 0 {
                Err(format!("even {i}"))
            } else {
                Ok(PathBuf::from(format!("{i}.png")))
            }
        });
        assert!(!report.is_ok());
        assert_eq!(
            report.written,
            vec![
                PathBuf::from("1.png"),
                PathBuf::from("3.png"),
                PathBuf::from("5.png")
            ]
        );
        assert_eq!(
            report.failed,
            vec![(1, "even 2".to_string()), (3, "even 4".to_string())]
        );
        assert_eq!(
            report.to_string(),
            "3 written, 2 failed\n    #1: even 2\n    #3: even 4"
        );
    }
}
