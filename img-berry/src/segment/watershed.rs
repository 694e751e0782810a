//! 分水岭分割.

use std::collections::{HashMap, HashSet};

use log::debug;
use ndarray::Array2;
use rustronomy_watershed::{TransformBuilder, WatershedUtils as _};

use crate::data::Image2d;
use crate::filters::LinearMap;
use crate::Idx2d;

use super::{label_mask, SegmentError, SegmentResult, Segmenter};

/// 灰度被量化到 `[0, WATER_MAX]`. `u8::MAX` 在分水岭变换中表示永不淹没.
const WATER_MAX: u8 = u8::MAX - 1;

/// 分水岭分割, 输入通常是梯度幅值图. 输出为标签图: 0 为未被淹没的像素,
/// 其余像素按所属集水盆标为 1, 2, ... (按行优先顺序首次出现的先后编号).
///
/// # 注意
///
/// 1. 低于 `min + threshold * (max - min)` 的灰度被抬平到该值, 抬平后的每个
///    四连通平台各作为一个种子, 另外每个严格局部极小值也是一个种子.
/// 2. 水位最高涨到 `level * 254` (灰度被线性映射到 `[0, 254]`).
/// 3. 图像最外一圈像素不会被淹没.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Watershed {
    /// 抬平阈值, 取值 `[0, 1]`.
    pub threshold: f64,
    /// 最高水位, 取值 `[0, 1]`.
    pub level: f64,
}

impl Watershed {
    /// 构造.
    #[inline]
    pub const fn new(threshold: f64, level: f64) -> Self {
        Self { threshold, level }
    }

    fn max_water_level(&self) -> u8 {
        (self.level.clamp(0.0, 1.0) * f64::from(WATER_MAX)).round() as u8
    }
}

impl Segmenter for Watershed {
    fn segment(&self, img: &Image2d<f32>) -> SegmentResult<Image2d<f32>> {
        let (min, max) = img.min_max().ok_or(SegmentError::EmptyImage)?;
        let cut = min + self.threshold.clamp(0.0, 1.0) as f32 * (max - min);
        let map = LinearMap::fit(f64::from(min), f64::from(max), 0.0, f64::from(WATER_MAX));
        let heights = img.data().mapv(|v| map.apply(v.max(cut)) as u8);
        let basins = img.data().mapv(|v| v <= cut);

        let transform = TransformBuilder::new_segmenting()
            .set_max_water_lvl(self.max_water_level())
            .build()
            .map_err(SegmentError::Watershed)?;
        let mut seeds = transform.find_local_minima(heights.view());
        seeds.extend(basin_seeds(&basins));
        seeds.sort_unstable();
        seeds.dedup();
        debug!(
            "watershed: threshold {} level {} with {} seeds",
            self.threshold,
            self.level,
            seeds.len()
        );

        let lakes = transform.transform(heights.view(), &seeds);
        Ok(img.with_data(relabel(&lakes)))
    }
}

/// 每个平台按行优先顺序的第一个像素.
fn basin_seeds(basins: &Array2<bool>) -> Vec<Idx2d> {
    let labels = label_mask(basins);
    let mut seen = HashSet::new();
    labels
        .indexed_iter()
        .filter(|&(_, &l)| l != 0 && seen.insert(l))
        .map(|(p, _)| p)
        .collect()
}

/// 按首次出现的顺序把标签重新编号为 1, 2, ...
fn relabel(lakes: &Array2<usize>) -> Array2<f32> {
    let mut ids: HashMap<usize, usize> = HashMap::new();
    lakes.mapv(|c| {
        if c == 0 {
            return 0.0;
        }
        let next = ids.len() + 1;
        *ids.entry(c).or_insert(next) as f32
    })
}
