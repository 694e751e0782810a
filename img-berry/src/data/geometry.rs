//! 图像的物理空间信息.

/// 图像的物理空间信息: 像素间距, 原点和方向矩阵.
///
/// # 注意
///
/// 与像素数据的 `(z, h, w)` 索引顺序相反, 这里的所有数组都按物理坐标轴
/// `(x, y[, z])` 排列, 即 `spacing[0]` 是宽度方向的间距.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry<const D: usize> {
    /// 像素/体素间距, 一般以毫米为单位.
    pub spacing: [f64; D],

    /// 第一个像素中心的物理坐标.
    pub origin: [f64; D],

    /// 方向余弦矩阵, 行优先.
    pub direction: [[f64; D]; D],
}

impl<const D: usize> Default for Geometry<D> {
    fn default() -> Self {
        let mut direction = [[0.0; D]; D];
        for (i, row) in direction.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self {
            spacing: [1.0; D],
            origin: [0.0; D],
            direction,
        }
    }
}

impl<const D: usize> Geometry<D> {
    /// 以给定间距构造, 原点为 0, 方向为单位矩阵.
    #[inline]
    pub fn with_spacing(spacing: [f64; D]) -> Self {
        Self {
            spacing,
            ..Default::default()
        }
    }

    /// 方向矩阵是否为单位矩阵.
    pub fn is_identity_direction(&self) -> bool {
        self.direction.iter().enumerate().all(|(i, row)| {
            row.iter()
                .enumerate()
                .all(|(j, &v)| v == if i == j { 1.0 } else { 0.0 })
        })
    }

    /// 方向矩阵按行优先展开.
    pub fn direction_flat(&self) -> Vec<f64> {
        self.direction.iter().flatten().copied().collect()
    }
}

impl Geometry<3> {
    /// 取 `(x, y)` 平面的部分, 得到 Z 切片的空间信息.
    ///
    /// `z_offset` 为切片的 z 索引, 原点会沿 z 方向平移到该切片.
    pub fn collapse_z(&self, z_offset: usize) -> Geometry<2> {
        let dz = self.spacing[2] * z_offset as f64;
        let d = &self.direction;
        Geometry {
            spacing: [self.spacing[0], self.spacing[1]],
            origin: [self.origin[0] + d[0][2] * dz, self.origin[1] + d[1][2] * dz],
            direction: [[d[0][0], d[0][1]], [d[1][0], d[1][1]]],
        }
    }
}

impl Geometry<2> {
    /// 添加 z 方向, 间距为 `z_spacing`.
    pub fn extend_z(&self, z_spacing: f64) -> Geometry<3> {
        let d = &self.direction;
        Geometry {
            spacing: [self.spacing[0], self.spacing[1], z_spacing],
            origin: [self.origin[0], self.origin[1], 0.0],
            direction: [[d[0][0], d[0][1], 0.0], [d[1][0], d[1][1], 0.0], [0.0, 0.0, 1.0]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Geometry;

    #[test]
    fn test_default_is_identity() {
        let g = Geometry::<3>::default();
        assert!(g.is_identity_direction());
        assert_eq!(g.spacing, [1.0; 3]);
        assert_eq!(g.direction_flat(), vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_collapse_and_extend() {
        let mut g = Geometry::<3>::with_spacing([0.5, 0.7, 2.0]);
        g.origin = [1.0, 2.0, 3.0];
        let flat = g.collapse_z(4);
        assert_eq!(flat.spacing, [0.5, 0.7]);
        assert_eq!(flat.origin, [1.0, 2.0]);
        assert!(flat.is_identity_direction());

        let back = flat.extend_z(2.0);
        assert_eq!(back.spacing, [0.5, 0.7, 2.0]);
        assert!(back.is_identity_direction());
    }
}
