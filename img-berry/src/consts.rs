//! 通用常量.

use crate::Idx2d;

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道灰色.
    pub const GRAY: u8 = 0b_1000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;
}

/// 区域生长默认种子点 `(h, w)`.
pub const DEFAULT_SEED: Idx2d = (128, 128);

/// 输入文件没有扩展名时, 平滑类流水线输出使用的扩展名.
pub const DEFAULT_EXT: &str = ".jpg";

/// 指定输出目录的环境变量.
pub const OUTPUT_DIR_ENV: &str = "BERRY_OUTPUT_DIR";
