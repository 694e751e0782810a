use crate::Idx2d;

/// 行优先的二维索引迭代器, 依次产生 `(0, 0), (0, 1), ..., (h - 1, w - 1)`.
///
/// 与 `flat_map` 组合出的等价迭代器相比, 该结构更小, 且实现了
/// `ExactSizeIterator`, 便于 `take(n)` 后预分配.
#[derive(Debug, Clone)]
pub struct PosIter {
    cur_h: usize,
    cur_w: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    /// 遍历形状为 `(h, w)` 的图像的所有索引.
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self {
            cur_h: 0,
            cur_w: 0,
            h,
            w,
        }
    }

    #[inline]
    fn remaining(&self) -> usize {
        if self.w == 0 || self.cur_h >= self.h {
            0
        } else {
            (self.h - self.cur_h) * self.w - self.cur_w
        }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining() == 0 {
            return None;
        }
        let ret_pos = (self.cur_h, self.cur_w);
        if self.cur_w + 1 == self.w {
            self.cur_w = 0;
            self.cur_h += 1;
        } else {
            self.cur_w += 1;
        }
        Some(ret_pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for PosIter {}

#[cfg(test)]
mod tests {
    use super::PosIter;
    use crate::Idx2d;

    fn pos_iter_builtin((h, w): Idx2d) -> impl Iterator<Item = Idx2d> {
        (0..h).flat_map(move |first| (0..w).map(move |second| (first, second)))
    }

    #[test]
    fn test_pos_iter_matches_flat_map() {
        for i in 0..=4 {
            for j in 0..=4 {
                let tup = (i, j);
                assert!(Iterator::eq(pos_iter_builtin(tup), PosIter::new(tup)));
            }
        }
    }

    #[test]
    fn test_exact_size() {
        let mut it = PosIter::new((3, 4));
        assert_eq!(it.len(), 12);
        it.next();
        it.next();
        assert_eq!(it.len(), 10);
        assert_eq!(it.nth(3), Some((1, 1)));
        assert_eq!(PosIter::new((0, 7)).len(), 0);
    }
}
