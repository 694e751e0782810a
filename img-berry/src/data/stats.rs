//! 像素统计量.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一组像素值的基础统计量. 所有累加都在 `f64` 上完成.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    /// 参与统计的像素个数.
    pub count: usize,

    /// 最小值.
    pub min: f64,

    /// 最大值.
    pub max: f64,

    /// 总和.
    pub sum: f64,

    /// 平均值.
    pub mean: f64,

    /// 无偏标准差 (分母为 `count - 1`). 只有一个像素时为 0.
    pub sigma: f64,
}

impl Statistics {
    /// 统计 `it` 给出的所有值. 若 `it` 为空, 则返回 `None`.
    pub fn from_values<I: IntoIterator<Item = f32>>(it: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in it.into_iter().map(f64::from) {
            count += 1;
            sum += v;
            sum_sq += v * v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let mean = sum / n;
        let sigma = if count > 1 {
            ((sum_sq - sum * sum / n) / (n - 1.0)).max(0.0).sqrt()
        } else {
            0.0
        };
        Some(Self {
            count,
            min,
            max,
            sum,
            mean,
            sigma,
        })
    }

    /// 无偏方差.
    #[inline]
    pub fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty() {
        assert!(Statistics::from_values(std::iter::empty()).is_none());
    }

    #[test]
    fn test_single() {
        let s = Statistics::from_values([4.0]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.sigma, 0.0);
        assert_eq!(s.mean, 4.0);
    }

    #[test]
    fn test_unbiased_sigma() {
        let s = Statistics::from_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(s.mean, 5.0);
        assert_relative_eq!(s.variance(), 32.0 / 7.0, epsilon = 1e-12);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.sum, 40.0);
    }
}
