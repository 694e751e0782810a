#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供 2D / 3D 医学图像的读写, 滤波, 阈值, 区域生长与分水岭分割,
//! 以及输出文件命名和参数扫描等流水线基础设施.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 像素按 `(h, w)` / `(z, h, w)` 存储和索引, 空间信息 (间距, 原点, 方向)
//!   按物理坐标轴 `(x, y[, z])` 排列.
//! 2. 所有滤波和分割都在 `f32` 上进行. 读入时转换为 `f32`, 写出前再转换为目标像素类型.
//! 3. 库代码不会因为用户输入而 panic, 错误通过各模块的错误类型返回.
//!
//! # 模块
//!
//! ### 图像数据 ✅
//!
//! [`Image2d`], [`Volume`], 像素类型与空间信息.
//!
//! 实现位于 `img-berry/src/data`.
//!
//! ### 读写 ✅
//!
//! PNG / JPEG / BMP / TIFF 位图, DICOM, MetaImage (`.mha` / `.mhd`), NIfTI,
//! VTK legacy 与 `.npy`. 按扩展名选择格式.
//!
//! 实现位于 `img-berry/src/io`.
//!
//! ### 编号序列 ✅
//!
//! `slice%03d.png` 样式的数字序列和 `IMG0001` 样式的前缀序列, 堆叠成体数据.
//!
//! 实现位于 `img-berry/src/series.rs`.
//!
//! ### 滤波 ✅
//!
//! 灰度变换, 均值 / 中值 / 高斯平滑, 梯度幅值, Canny 边缘.
//!
//! 实现位于 `img-berry/src/filters`.
//!
//! ### 分割 ✅
//!
//! 连通阈值, 邻域连通, 置信连通区域生长, 以及分水岭.
//!
//! 实现位于 `img-berry/src/segment`.
//!
//! ### 流水线基础设施 ✅
//!
//! 1. 输出文件命名 (`naming`). ✅
//! 2. 参数扫描 (`sweep`). ✅
//! 3. 拼图预览 (`montage`). ✅

/// 二维索引 `(h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 图像与体数据.
pub mod data;

pub use data::{Geometry, Image2d, Pixel, PixelKind, Volume};

pub mod consts;
pub mod filters;
pub mod io;
pub mod montage;
pub mod naming;
pub mod prelude;
pub mod segment;
pub mod series;
pub mod sweep;
