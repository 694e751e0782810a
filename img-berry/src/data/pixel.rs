//! 标量像素类型.

use std::fmt::{self, Debug};

/// 支持的像素类型标签.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PixelKind {
    /// `u8`.
    U8,
    /// `i16`.
    I16,
    /// `u16`.
    U16,
    /// `f32`.
    F32,
}

impl PixelKind {
    /// MetaImage 头文件中 `ElementType` 字段的名字.
    pub const fn met_type(self) -> &'static str {
        match self {
            PixelKind::U8 => "MET_UCHAR",
            PixelKind::I16 => "MET_SHORT",
            PixelKind::U16 => "MET_USHORT",
            PixelKind::F32 => "MET_FLOAT",
        }
    }

    /// 单个像素的字节数.
    pub const fn byte_len(self) -> usize {
        match self {
            PixelKind::U8 => 1,
            PixelKind::I16 | PixelKind::U16 => 2,
            PixelKind::F32 => 4,
        }
    }
}

impl fmt::Display for PixelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.met_type())
    }
}

/// 可存入 [`crate::Image2d`] / [`crate::Volume`] 的标量像素类型.
///
/// 所有计算都在 `f32` 上进行, 像素类型只决定读写时的取值范围和存储格式.
pub trait Pixel: Copy + Default + PartialOrd + Debug + Send + Sync + 'static {
    /// 该类型能表示的最小值.
    const MIN_F32: f32;

    /// 该类型能表示的最大值.
    const MAX_F32: f32;

    /// 类型标签.
    const KIND: PixelKind;

    /// 无损 (或尽量无损) 地转换为 `f32`.
    fn to_f32(self) -> f32;

    /// 从 `f32` 转换. 超出范围的值被截断到类型边界, 小数部分向零截断,
    /// NaN 映射为 0.
    fn from_f32(v: f32) -> Self;
}

macro_rules! impl_int_pixel {
    ($($t: ty => $kind: ident),+) => {
        $(
            impl Pixel for $t {
                const MIN_F32: f32 = <$t>::MIN as f32;
                const MAX_F32: f32 = <$t>::MAX as f32;
                const KIND: PixelKind = PixelKind::$kind;

                #[inline]
                fn to_f32(self) -> f32 {
                    self as f32
                }

                /// `as` 本身就是饱和转换.
                #[inline]
                fn from_f32(v: f32) -> Self {
                    v as $t
                }
            }
        )+
    };
}

impl_int_pixel!(u8 => U8, i16 => I16, u16 => U16);

impl Pixel for f32 {
    const MIN_F32: f32 = f32::MIN;
    const MAX_F32: f32 = f32::MAX;
    const KIND: PixelKind = PixelKind::F32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::{Pixel, PixelKind};

    #[test]
    fn test_from_f32_saturates_and_truncates() {
        assert_eq!(u8::from_f32(-3.0), 0);
        assert_eq!(u8::from_f32(255.9), 255);
        assert_eq!(u8::from_f32(1000.0), 255);
        assert_eq!(u8::from_f32(12.7), 12);
        assert_eq!(u8::from_f32(f32::NAN), 0);
        assert_eq!(i16::from_f32(-12.7), -12);
        assert_eq!(i16::from_f32(-1e6), i16::MIN);
        assert_eq!(u16::from_f32(70000.0), u16::MAX);
    }

    #[test]
    fn test_met_names() {
        assert_eq!(u8::KIND.met_type(), "MET_UCHAR");
        assert_eq!(f32::KIND.to_string(), "MET_FLOAT");
        assert_eq!(PixelKind::I16.byte_len(), 2);
        assert_eq!(i16::MIN_F32, -32768.0);
    }
}
