//! MetaImage (`.mha` / `.mhd` + `.raw`) 编解码.
//!
//! 头文件是 `Key = Value` 形式的文本, `ElementDataFile` 必须是最后一个字段.
//! 数据可以紧跟在头文件后 (`LOCAL`), 也可以位于单独的文件中.

use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use either::Either;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::data::{Image2d, Pixel, Volume};
use crate::naming::{fmt_g, FileStem};

use super::grid::{encode, Grid};
use super::{IoError, IoResult};

/// MetaImage 支持的元素类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MetElement {
    /// `MET_CHAR`.
    Char,
    /// `MET_UCHAR`.
    UChar,
    /// `MET_SHORT`.
    Short,
    /// `MET_USHORT`.
    UShort,
    /// `MET_INT`.
    Int,
    /// `MET_UINT`.
    UInt,
    /// `MET_FLOAT`.
    Float,
    /// `MET_DOUBLE`.
    Double,
}

impl MetElement {
    /// 由头文件中的名字解析.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "MET_CHAR" => Self::Char,
            "MET_UCHAR" => Self::UChar,
            "MET_SHORT" => Self::Short,
            "MET_USHORT" => Self::UShort,
            "MET_INT" | "MET_LONG" => Self::Int,
            "MET_UINT" | "MET_ULONG" => Self::UInt,
            "MET_FLOAT" => Self::Float,
            "MET_DOUBLE" => Self::Double,
            _ => return None,
        })
    }

    /// 头文件中的名字.
    pub fn name(self) -> &'static str {
        match self {
            Self::Char => "MET_CHAR",
            Self::UChar => "MET_UCHAR",
            Self::Short => "MET_SHORT",
            Self::UShort => "MET_USHORT",
            Self::Int => "MET_INT",
            Self::UInt => "MET_UINT",
            Self::Float => "MET_FLOAT",
            Self::Double => "MET_DOUBLE",
        }
    }

    /// 单个元素的字节数.
    pub fn byte_len(self) -> usize {
        match self {
            Self::Char | Self::UChar => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// 解码一个元素. `b.len()` 必须等于 `self.byte_len()`.
    fn decode(self, b: &[u8], msb: bool) -> f32 {
        macro_rules! num {
            ($t: ty, $n: literal) => {{
                let mut a = [0u8; $n];
                a.copy_from_slice(b);
                if msb {
                    <$t>::from_be_bytes(a)
                } else {
                    <$t>::from_le_bytes(a)
                }
            }};
        }

        match self {
            Self::Char => b[0] as i8 as f32,
            Self::UChar => b[0] as f32,
            Self::Short => num!(i16, 2) as f32,
            Self::UShort => num!(u16, 2) as f32,
            Self::Int => num!(i32, 4) as f32,
            Self::UInt => num!(u32, 4) as f32,
            Self::Float => num!(f32, 4),
            Self::Double => num!(f64, 8) as f32,
        }
    }
}

/// MetaImage 头文件中本库关心的字段.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaHeader {
    /// 按物理坐标轴排列的尺寸.
    pub dim_size: Vec<usize>,
    /// 间距.
    pub spacing: Vec<f64>,
    /// 原点 (`Offset`).
    pub offset: Vec<f64>,
    /// 方向矩阵 (`TransformMatrix`), 行优先.
    pub transform: Vec<f64>,
    /// 元素类型.
    pub element: MetElement,
    /// 是否大端序.
    pub msb: bool,
    /// 数据是否经 zlib 压缩.
    pub compressed: bool,
    /// 压缩后的字节数.
    pub compressed_size: Option<usize>,
    /// 分离数据文件的头部字节数; `-1` 表示数据位于文件末尾.
    pub header_size: i64,
    /// `LOCAL` 或数据文件名.
    pub data_file: String,
}

impl MetaHeader {
    /// 解析头文件文本. 返回头文件和 `ElementDataFile` 行之后第一个字节的偏移.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), String> {
        let mut ndims = None;
        let mut dim_size = None;
        let mut spacing = None;
        let mut offset = None;
        let mut transform = None;
        let mut element = None;
        let mut msb = false;
        let mut compressed = false;
        let mut compressed_size = None;
        let mut header_size = 0i64;
        let mut channels = 1usize;

        let mut pos = 0usize;
        loop {
            if pos >= bytes.len() {
                return Err("missing ElementDataFile".to_string());
            }
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |i| pos + i);
            let line = String::from_utf8_lossy(&bytes[pos..end]);
            pos = (end + 1).min(bytes.len());

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| format!("malformed line `{line}`"))?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "ObjectType" if value != "Image" => {
                    return Err(format!("ObjectType `{value}` is not Image"))
                }
                "NDims" => ndims = Some(parse_one::<usize>(key, value)?),
                "DimSize" => dim_size = Some(parse_list::<usize>(key, value)?),
                "ElementSpacing" => spacing = Some(parse_list::<f64>(key, value)?),
                "ElementSize" if spacing.is_none() => {
                    spacing = Some(parse_list::<f64>(key, value)?)
                }
                "Offset" | "Origin" | "Position" => offset = Some(parse_list::<f64>(key, value)?),
                "TransformMatrix" | "Rotation" | "Orientation" => {
                    transform = Some(parse_list::<f64>(key, value)?)
                }
                "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => msb = parse_bool(value),
                "CompressedData" => compressed = parse_bool(value),
                "CompressedDataSize" => compressed_size = Some(parse_one::<usize>(key, value)?),
                "HeaderSize" => header_size = parse_one::<i64>(key, value)?,
                "ElementNumberOfChannels" => channels = parse_one::<usize>(key, value)?,
                "ElementType" => {
                    element = Some(
                        MetElement::from_name(value)
                            .ok_or_else(|| format!("unsupported ElementType `{value}`"))?,
                    )
                }
                "ElementDataFile" => {
                    let dim_size = dim_size.ok_or("missing DimSize")?;
                    let n = ndims.unwrap_or(dim_size.len());
                    if dim_size.len() != n {
                        return Err(format!("DimSize has {} values, NDims is {n}", dim_size.len()));
                    }
                    if channels != 1 {
                        return Err(format!("{channels}-channel images are not supported"));
                    }
                    let header = Self {
                        spacing: fit(spacing, n, 1.0),
                        offset: fit(offset, n, 0.0),
                        transform: transform
                            .filter(|t| t.len() == n * n)
                            .unwrap_or_else(|| Grid::with_size(vec![0; n]).direction),
                        element: element.ok_or("missing ElementType")?,
                        dim_size,
                        msb,
                        compressed,
                        compressed_size,
                        header_size,
                        data_file: value.to_string(),
                    };
                    return Ok((header, pos));
                }
                _ => {}
            }
        }
    }

    fn grid(&self) -> Grid {
        Grid {
            size: self.dim_size.clone(),
            spacing: self.spacing.clone(),
            origin: self.offset.clone(),
            direction: self.transform.clone(),
        }
    }

    /// 由图像布局和像素类型构造头文件.
    fn of_grid<T: Pixel>(grid: &Grid, data_file: String) -> Self {
        Self {
            dim_size: grid.size.clone(),
            spacing: grid.spacing.clone(),
            offset: grid.origin.clone(),
            transform: grid.direction.clone(),
            element: MetElement::from_name(T::KIND.met_type()).unwrap_or(MetElement::Float),
            msb: false,
            compressed: false,
            compressed_size: None,
            header_size: 0,
            data_file,
        }
    }
}

impl fmt::Display for MetaHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: Copy, F: Fn(T) -> String>(v: &[T], op: F) -> String {
            v.iter().map(|&x| op(x)).collect::<Vec<_>>().join(" ")
        }

        let tf = |b: bool| if b { "True" } else { "False" };
        writeln!(f, "ObjectType = Image")?;
        writeln!(f, "NDims = {}", self.dim_size.len())?;
        writeln!(f, "BinaryData = True")?;
        writeln!(f, "BinaryDataByteOrderMSB = {}", tf(self.msb))?;
        writeln!(f, "CompressedData = {}", tf(self.compressed))?;
        if let Some(n) = self.compressed_size {
            writeln!(f, "CompressedDataSize = {n}")?;
        }
        writeln!(f, "TransformMatrix = {}", join(&self.transform, fmt_g))?;
        writeln!(f, "Offset = {}", join(&self.offset, fmt_g))?;
        writeln!(f, "ElementSpacing = {}", join(&self.spacing, fmt_g))?;
        writeln!(f, "DimSize = {}", join(&self.dim_size, |d: usize| d.to_string()))?;
        writeln!(f, "ElementType = {}", self.element.name())?;
        writeln!(f, "ElementDataFile = {}", self.data_file)
    }
}

fn parse_one<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("bad value `{value}` for {key}"))
}

fn parse_list<T: std::str::FromStr>(key: &str, value: &str) -> Result<Vec<T>, String> {
    value
        .split_whitespace()
        .map(|v| parse_one(key, v))
        .collect()
}

#[inline]
fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// 将可选列表截断或补齐到 `n` 项.
fn fit(v: Option<Vec<f64>>, n: usize, fill: f64) -> Vec<f64> {
    let mut v = v.unwrap_or_default();
    v.resize(n, fill);
    v
}

fn header_error(path: &Path, reason: String) -> IoError {
    IoError::MetaHeader {
        path: path.to_path_buf(),
        reason,
    }
}

/// 解压时预先分配的字节数上限. 头文件中的 `DimSize` 不可信.
const MAX_PREALLOC: usize = 64 << 20;

/// 读取 MetaImage, 返回 2D 或 3D 图像.
pub(crate) fn read(path: &Path) -> IoResult<Either<Image2d<f32>, Volume<f32>>> {
    let bytes = fs::read(path)?;
    let (header, offset) = MetaHeader::parse(&bytes).map_err(|r| header_error(path, r))?;
    let grid = header.grid();

    let raw = match header.data_file.as_str() {
        "LOCAL" => bytes[offset..].to_vec(),
        "LIST" => return Err(header_error(path, "ElementDataFile = LIST".to_string())),
        name if name.contains('%') => {
            return Err(header_error(path, format!("file pattern `{name}`")))
        }
        name => {
            let data_path = path.parent().unwrap_or_else(|| Path::new("")).join(name);
            let data = fs::read(&data_path)?;
            skip_header(data, header.header_size)
        }
    };

    let expected = grid
        .size
        .iter()
        .try_fold(header.element.byte_len(), |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| header_error(path, format!("DimSize {:?} is too large", grid.size)))?;
    let raw = if header.compressed {
        let mut out = Vec::with_capacity(expected.min(MAX_PREALLOC));
        ZlibDecoder::new(raw.as_slice()).read_to_end(&mut out)?;
        out
    } else {
        raw
    };
    if raw.len() < expected {
        return Err(header_error(
            path,
            format!("expected {expected} data bytes, found {}", raw.len()),
        ));
    }

    // `HeaderSize = -1` 时数据位于文件末尾, 否则忽略尾部多余字节.
    let data = if !header.compressed && header.header_size == -1 {
        &raw[raw.len() - expected..]
    } else {
        &raw[..expected]
    };
    let values: Vec<f32> = data
        .chunks_exact(header.element.byte_len())
        .map(|c| header.element.decode(c, header.msb))
        .collect();

    grid.assemble(values, path)
}

fn skip_header(mut data: Vec<u8>, header_size: i64) -> Vec<u8> {
    if header_size > 0 {
        let n = (header_size as usize).min(data.len());
        data.drain(..n);
    }
    data
}

/// 写入 MetaImage. `.mha` 把数据写在头文件后; `.mhd` 写入同名的
/// `.raw` (压缩时 `.zraw`) 数据文件.
pub(crate) fn write<T: Pixel>(
    grid: &Grid,
    values: &[T],
    path: &Path,
    compress: bool,
) -> IoResult<()> {
    let detached = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("mhd"));
    let data_name = if detached {
        let base = FileStem::of_path(path).base;
        format!("{base}.{}", if compress { "zraw" } else { "raw" })
    } else {
        "LOCAL".to_string()
    };

    let mut header = MetaHeader::of_grid::<T>(grid, data_name.clone());
    let mut data = encode(values, false);
    if compress {
        let mut e = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
        e.write_all(&data)?;
        data = e.finish()?;
        header.compressed = true;
        header.compressed_size = Some(data.len());
    }

    let mut file = fs::File::create(path)?;
    file.write_all(header.to_string().as_bytes())?;
    if detached {
        let data_path: PathBuf = path.parent().unwrap_or_else(|| Path::new("")).join(data_name);
        fs::write(data_path, &data)?;
    } else {
        file.write_all(&data)?;
    }
    Ok(())
}

/// 为 `.raw` 数据文件寻找同名的 `.mhd`, `.mha` 或 `.nhdr` 头文件.
///
/// 若 `path` 不是 `.raw` 文件, 直接返回 `path`.
pub fn find_header_for_raw<P: AsRef<Path>>(path: P) -> IoResult<PathBuf> {
    let path = path.as_ref();
    if !path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("raw"))
    {
        return Ok(path.to_path_buf());
    }
    ["mhd", "mha", "nhdr"]
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|p| p.is_file())
        .ok_or_else(|| IoError::MissingHeader(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::test_dir;
    use ndarray::array;

    const HEADER: &str = "ObjectType = Image\nNDims = 2\nBinaryData = True\n\
        BinaryDataByteOrderMSB = False\nElementSpacing = 0.5 2\nDimSize = 3 2\n\
        ElementType = MET_SHORT\nElementDataFile = LOCAL\n";

    #[test]
    fn test_parse_header() {
        let (h, offset) = MetaHeader::parse(HEADER.as_bytes()).unwrap();
        assert_eq!(offset, HEADER.len());
        assert_eq!(h.dim_size, vec![3, 2]);
        assert_eq!(h.spacing, vec![0.5, 2.0]);
        assert_eq!(h.offset, vec![0.0, 0.0]);
        assert_eq!(h.transform, vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(h.element, MetElement::Short);
        assert!(!h.compressed);
    }

    #[test]
    fn test_parse_rejects() {
        assert!(MetaHeader::parse(b"NDims = 2\nDimSize = 3 2\n").is_err());
        assert!(MetaHeader::parse(b"ObjectType = Mesh\nElementDataFile = LOCAL\n").is_err());
        let bad = "NDims = 3\nDimSize = 3 2\nElementType = MET_UCHAR\nElementDataFile = LOCAL\n";
        assert!(MetaHeader::parse(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_read_local_short() {
        let dir = test_dir("meta_local");
        let path = dir.join("a.mha");
        let mut bytes = HEADER.as_bytes().to_vec();
        for v in [-1i16, 0, 1, 2, 300, -300] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        fs::write(&path, bytes).unwrap();

        let img = read(&path).unwrap().left().unwrap();
        assert_eq!(img.shape(), (2, 3));
        assert_eq!(img[(1, 1)], 300.0);
        assert_eq!(img[(0, 0)], -1.0);
        assert_eq!(img.geometry().spacing, [0.5, 2.0]);
    }

    #[test]
    fn test_read_rejects_oversized_dim_size() {
        let dir = test_dir("meta_oversized");
        let path = dir.join("huge.mha");
        let header = format!(
            "ObjectType = Image\nNDims = 3\nDimSize = {0} {0} {0}\n\
             ElementType = MET_FLOAT\nCompressedData = True\nElementDataFile = LOCAL\n",
            u64::MAX / 2
        );
        fs::write(&path, header).unwrap();
        assert!(matches!(read(&path), Err(IoError::MetaHeader { .. })));
    }

    #[test]
    fn test_write_then_read_detached_compressed() {
        let dir = test_dir("meta_detached");
        let path = dir.join("vol.mhd");
        let vol = Volume::from_vec((2, 2, 2), vec![0u8, 1, 2, 3, 4, 5, 6, 255]).unwrap();
        write(&Grid::of_volume(&vol), &vol.to_row_major_vec(), &path, true).unwrap();
        assert!(dir.join("vol.zraw").is_file());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("ElementType = MET_UCHAR"));
        assert!(text.contains("ElementDataFile = vol.zraw"));

        let back = read(&path).unwrap().right().unwrap();
        assert_eq!(back.shape(), (2, 2, 2));
        assert_eq!(back[(1, 1, 1)], 255.0);
        assert_eq!(back[(0, 1, 0)], 2.0);
    }

    #[test]
    fn test_write_local_float_keeps_geometry() {
        let dir = test_dir("meta_float");
        let path = dir.join("f.mha");
        let mut img = Image2d::new(array![[0.25f32, -1.5], [3.0, 4.0]]);
        img.geometry_mut().spacing = [0.7, 0.3];
        img.geometry_mut().origin = [10.0, -2.5];
        write(&Grid::of_image(&img), &img.to_row_major_vec(), &path, false).unwrap();

        let back = read(&path).unwrap().left().unwrap();
        assert_eq!(back.to_row_major_vec(), img.to_row_major_vec());
        assert_eq!(back.geometry(), img.geometry());
    }

    #[test]
    fn test_find_header_for_raw() {
        let dir = test_dir("meta_raw_lookup");
        let raw = dir.join("scan.raw");
        fs::write(&raw, [0u8; 4]).unwrap();
        assert!(matches!(
            find_header_for_raw(&raw),
            Err(IoError::MissingHeader(_))
        ));
        fs::write(dir.join("scan.mhd"), HEADER).unwrap();
        assert_eq!(find_header_for_raw(&raw).unwrap(), dir.join("scan.mhd"));
        assert_eq!(find_header_for_raw(dir.join("x.png")).unwrap(), dir.join("x.png"));
    }
}
