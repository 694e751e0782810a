//! VTK legacy `STRUCTURED_POINTS` 写入. 数据为大端二进制.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::{Pixel, PixelKind};
use crate::naming::fmt_g;

use super::grid::{encode, Grid};
use super::IoResult;

fn scalar_name(kind: PixelKind) -> &'static str {
    match kind {
        PixelKind::U8 => "unsigned_char",
        PixelKind::I16 => "short",
        PixelKind::U16 => "unsigned_short",
        PixelKind::F32 => "float",
    }
}

/// 写入 2D 或 3D 图像. 2D 图像写为一层的 3D 网格.
///
/// # 注意
///
/// 该格式没有方向矩阵, 方向信息会被丢弃.
pub(crate) fn write<T: Pixel>(grid: &Grid, values: &[T], path: &Path) -> IoResult<()> {
    let g = grid.padded3();
    let join = |v: &[f64]| v.iter().map(|&x| fmt_g(x)).collect::<Vec<_>>().join(" ");

    let mut w = BufWriter::new(fs::File::create(path)?);
    writeln!(w, "# vtk DataFile Version 3.0")?;
    writeln!(w, "VTK File Generated by img-berry")?;
    writeln!(w, "BINARY")?;
    writeln!(w, "DATASET STRUCTURED_POINTS")?;
    writeln!(w, "DIMENSIONS {} {} {}", g.size[0], g.size[1], g.size[2])?;
    writeln!(w, "SPACING {}", join(&g.spacing))?;
    writeln!(w, "ORIGIN {}", join(&g.origin))?;
    writeln!(w, "POINT_DATA {}", g.len())?;
    writeln!(w, "SCALARS scalars {} 1", scalar_name(T::KIND))?;
    writeln!(w, "LOOKUP_TABLE default")?;
    w.write_all(&encode(values, true))?;
    writeln!(w)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::test_dir;
    use crate::Volume;

    #[test]
    fn test_header_and_payload() {
        let dir = test_dir("vtk");
        let path = dir.join("v.vtk");
        let mut vol = Volume::from_vec((2, 1, 3), vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        vol.geometry_mut().spacing = [0.5, 0.5, 2.5];
        write(&Grid::of_volume(&vol), &vol.to_row_major_vec(), &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("DIMENSIONS 3 1 2\n"));
        assert!(text.contains("SPACING 0.5 0.5 2.5\n"));
        assert!(text.contains("POINT_DATA 6\n"));
        assert!(text.contains("SCALARS scalars float 1\n"));

        let marker = b"LOOKUP_TABLE default\n";
        let start = bytes
            .windows(marker.len())
            .position(|w| w == marker)
            .unwrap()
            + marker.len();
        assert_eq!(&bytes[start..start + 4], &0.0f32.to_be_bytes());
        assert_eq!(&bytes[start + 4..start + 8], &1.0f32.to_be_bytes());
        assert_eq!(bytes.len(), start + 6 * 4 + 1);
    }
}
