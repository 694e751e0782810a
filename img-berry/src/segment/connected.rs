//! 基于阈值区间的区域生长.

use log::debug;
use ndarray::Array2;

use crate::data::{Image2d, Statistics};
use crate::Idx2d;

use super::{check_seed, connected_region, paint, SegmentResult, Segmenter};

/// 从 `seed` 出发, 与之四连通且灰度在 `[lower, upper]` 内的像素取 `replace`.
///
/// # 注意
///
/// 种子本身不在区间内时, 输出全为 0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConnectedThreshold {
    /// 种子点 `(h, w)`.
    pub seed: Idx2d,
    /// 下界 (含).
    pub lower: f32,
    /// 上界 (含).
    pub upper: f32,
    /// 区域内的输出值.
    pub replace: f32,
}

impl ConnectedThreshold {
    /// 构造.
    #[inline]
    pub const fn new(seed: Idx2d, lower: f32, upper: f32, replace: f32) -> Self {
        Self {
            seed,
            lower,
            upper,
            replace,
        }
    }

    fn region(&self, img: &Image2d<f32>) -> Array2<bool> {
        let mask = img.data().mapv(|v| self.lower <= v && v <= self.upper);
        connected_region(&mask, self.seed)
    }
}

impl Segmenter for ConnectedThreshold {
    fn segment(&self, img: &Image2d<f32>) -> SegmentResult<Image2d<f32>> {
        check_seed(img, self.seed)?;
        Ok(paint(img, &self.region(img), self.replace))
    }
}

/// 类似 [`ConnectedThreshold`], 但像素只有在以它为中心, 半径为 `radius` 的
/// 整个方形邻域 (被图像边界截断) 都落在 `[lower, upper]` 内时才算合格.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NeighborhoodConnected {
    /// 种子点 `(h, w)`.
    pub seed: Idx2d,
    /// 邻域半径.
    pub radius: usize,
    /// 下界 (含).
    pub lower: f32,
    /// 上界 (含).
    pub upper: f32,
    /// 区域内的输出值.
    pub replace: f32,
}

impl NeighborhoodConnected {
    /// 以整个 `f32` 取值范围为区间构造.
    #[inline]
    pub const fn new(seed: Idx2d, radius: usize, replace: f32) -> Self {
        Self {
            seed,
            radius,
            lower: f32::MIN,
            upper: f32::MAX,
            replace,
        }
    }

    /// 设置区间.
    #[inline]
    pub const fn with_bounds(mut self, lower: f32, upper: f32) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }
}

impl Segmenter for NeighborhoodConnected {
    fn segment(&self, img: &Image2d<f32>) -> SegmentResult<Image2d<f32>> {
        check_seed(img, self.seed)?;
        let data = img.data();
        let (h, w) = img.shape();
        let r = self.radius;
        let mask = Array2::from_shape_fn((h, w), |(y, x)| {
            let rows = y.saturating_sub(r)..(y + r + 1).min(h);
            let cols = x.saturating_sub(r)..(x + r + 1).min(w);
            rows.flat_map(|yy| cols.clone().map(move |xx| (yy, xx)))
                .all(|p| self.lower <= data[p] && data[p] <= self.upper)
        });
        Ok(paint(img, &connected_region(&mask, self.seed), self.replace))
    }
}

/// 置信连通: 以种子邻域的 `均值 ± multiplier * 标准差` 为区间做阈值生长,
/// 再以当前区域的统计量重新估计区间, 重复 `iterations` 次.
///
/// # 注意
///
/// 1. 初始区间会被扩大到包含种子本身的灰度.
/// 2. 标准差为无偏估计.
/// 3. 某次迭代后区域为空时提前结束, 输出全为 0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConfidenceConnected {
    /// 种子点 `(h, w)`.
    pub seed: Idx2d,
    /// 估计初始统计量的邻域半径.
    pub initial_radius: usize,
    /// 标准差倍数.
    pub multiplier: f64,
    /// 重新估计区间的次数.
    pub iterations: usize,
    /// 区域内的输出值.
    pub replace: f32,
}

impl ConfidenceConnected {
    fn interval(&self, stats: &Statistics) -> (f32, f32) {
        let half = self.multiplier * stats.sigma;
        ((stats.mean - half) as f32, (stats.mean + half) as f32)
    }
}

impl Segmenter for ConfidenceConnected {
    fn segment(&self, img: &Image2d<f32>) -> SegmentResult<Image2d<f32>> {
        check_seed(img, self.seed)?;
        let data = img.data();
        let (h, w) = img.shape();
        let (sy, sx) = self.seed;
        let r = self.initial_radius;

        let rows = sy.saturating_sub(r)..(sy + r + 1).min(h);
        let cols = sx.saturating_sub(r)..(sx + r + 1).min(w);
        let around_seed = rows.flat_map(|y| cols.clone().map(move |x| data[(y, x)]));
        let seed_value = data[self.seed];
        let (lower, upper) = Statistics::from_values(around_seed)
            .map_or((seed_value, seed_value), |s| self.interval(&s));
        let mut grow = ConnectedThreshold::new(
            self.seed,
            lower.min(seed_value),
            upper.max(seed_value),
            self.replace,
        );
        let mut region = grow.region(img);
        debug!(
            "confidence connected: initial interval [{}, {}]",
            grow.lower, grow.upper
        );

        for it in 0..self.iterations {
            let inside = data
                .iter()
                .zip(region.iter())
                .filter(|(_, &r)| r)
                .map(|(&v, _)| v);
            let Some(stats) = Statistics::from_values(inside) else {
                break;
            };
            (grow.lower, grow.upper) = self.interval(&stats);
            region = grow.region(img);
            debug!(
                "confidence connected: iteration {} interval [{}, {}]",
                it + 1,
                grow.lower,
                grow.upper
            );
        }
        Ok(paint(img, &region, self.replace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// 左侧 `[0, 3)` 列为 100, 右侧为 200, 中间第 3 列为 150.
    fn two_plateaus() -> Image2d<f32> {
        Image2d::new(Array2::from_shape_fn((6, 7), |(_, x)| match x {
            0..=2 => 100.0,
            3 => 150.0,
            _ => 200.0,
        }))
    }

    fn count(img: &Image2d<f32>, v: f32) -> usize {
        img.data().iter().filter(|&&p| p == v).count()
    }

    #[test]
    fn test_connected_threshold() {
        let img = two_plateaus();
        let out = ConnectedThreshold::new((0, 0), 50.0, 150.0, 255.0)
            .segment(&img)
            .unwrap();
        assert_eq!(count(&out, 255.0), 6 * 4);
        assert_eq!(out[(0, 6)], 0.0);

        // 种子不在区间内.
        let out = ConnectedThreshold::new((0, 6), 50.0, 150.0, 255.0)
            .segment(&img)
            .unwrap();
        assert_eq!(count(&out, 0.0), img.len());
    }

    #[test]
    fn test_connected_threshold_disconnected() {
        let img = Image2d::new(array![[10.0f32, 90.0, 10.0], [10.0, 90.0, 10.0]]);
        let out = ConnectedThreshold::new((0, 0), 0.0, 20.0, 1.0)
            .segment(&img)
            .unwrap();
        assert_eq!(out.to_row_major_vec(), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(ConnectedThreshold::new((2, 0), 0.0, 20.0, 1.0)
            .segment(&img)
            .is_err());
    }

    #[test]
    fn test_neighborhood_connected() {
        let img = two_plateaus();
        let f = NeighborhoodConnected::new((0, 0), 1, 255.0).with_bounds(50.0, 150.0);
        let out = f.segment(&img).unwrap();
        // 第 2 列的邻域包含 150 仍合格, 第 3 列的邻域包含 200 不合格.
        assert_eq!(count(&out, 255.0), 6 * 3);

        let all = NeighborhoodConnected::new((0, 0), 3, 7.0).segment(&img).unwrap();
        assert_eq!(count(&all, 7.0), img.len());
    }

    #[test]
    fn test_confidence_connected() {
        let mut img = two_plateaus();
        img[(0, 0)] = 104.0;
        img[(1, 1)] = 96.0;
        let f = ConfidenceConnected {
            seed: (2, 1),
            initial_radius: 1,
            multiplier: 2.5,
            iterations: 3,
            replace: 255.0,
        };
        let out = f.segment(&img).unwrap();
        // 两个扰动像素落在区间外.
        assert_eq!(count(&out, 255.0), 6 * 3 - 2);
        assert_eq!(out[(0, 0)], 0.0);
        assert_eq!(out[(0, 3)], 0.0);
    }

    #[test]
    fn test_confidence_connected_flat_seed() {
        // 种子邻域方差为 0, 区间退化为种子值本身.
        let img = two_plateaus();
        let f = ConfidenceConnected {
            seed: (5, 6),
            initial_radius: 1,
            multiplier: 1.0,
            iterations: 1,
            replace: 9.0,
        };
        let out = f.segment(&img).unwrap();
        assert_eq!(count(&out, 9.0), 6 * 3);
    }
}
