//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::data::{Geometry, Image2d, ImageInfo, Pixel, PixelKind, Statistics, Volume};
pub use crate::filters::{Chain, Filter};
pub use crate::io::{read_image, read_volume, write_image, write_volume, IoError, IoResult};
pub use crate::naming::{fmt_g, FileStem, OutputName};
pub use crate::segment::{SegmentError, Segmenter};
pub use crate::{Idx2d, Idx3d};
