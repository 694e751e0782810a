//! 区域生长与分水岭的参数扫描. 默认输出到当前目录.

use std::path::PathBuf;

use img_berry::consts::{gray, DEFAULT_SEED};
use img_berry::filters::{Filter, GradientMagnitude, Median};
use img_berry::io::read_image;
use img_berry::naming::{fmt_fixed, fmt_g, FileStem, OutputName};
use img_berry::segment::{
    ConfidenceConnected, ConnectedThreshold, NeighborhoodConnected, Segmenter, Watershed,
};
use img_berry::sweep::{Sweep, SweepReport};
use img_berry::Image2d;
use utils::config::{resolve_output_dir, OutputFallback};
use utils::Args;

use super::save_rescaled;
use crate::error::{LabError, LabResult};

/// 平滑方式: `sigma > 0` 时先做 5x5 中值滤波.
const SIGMAS: [f64; 2] = [0.0, 1.0];
const MEDIAN_RADIUS: usize = 2;

const CT_BOUNDS: [(f32, f32); 3] = [(15.0, 100.0), (50.0, 150.0), (80.0, 200.0)];
const NC_RADII: [usize; 2] = [1, 3];
const CC_RADII: [usize; 2] = [1, 2];
const CC_MULTIPLIERS: [f64; 2] = [1.0, 2.5];
const CC_ITERATIONS: [usize; 2] = [1, 3];

const WS_MODES: [&str; 2] = ["none", "median"];
const WS_THRESHOLDS: [f64; 3] = [0.001, 0.005, 0.01];
const WS_LEVELS: [f64; 4] = [0.1, 0.2, 0.3, 0.4];

/// 区域生长方式及其参数.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Grow {
    Connected { lower: f32, upper: f32 },
    Neighborhood { radius: usize },
    Confidence { radius: usize, multiplier: f64, iterations: usize },
}

impl Grow {
    fn all() -> Vec<Grow> {
        let connected = CT_BOUNDS
            .iter()
            .map(|&(lower, upper)| Grow::Connected { lower, upper });
        let neighborhood = NC_RADII.iter().map(|&radius| Grow::Neighborhood { radius });
        let confidence = Sweep::grid3(&CC_RADII, &CC_MULTIPLIERS, &CC_ITERATIONS)
            .map(|(radius, multiplier, iterations)| Grow::Confidence {
                radius,
                multiplier,
                iterations,
            });
        connected
            .chain(neighborhood)
            .chain(confidence.iter().copied())
            .collect()
    }

    fn segmenter(&self) -> Box<dyn Segmenter> {
        let replace = f32::from(gray::WHITE);
        match *self {
            Grow::Connected { lower, upper } => {
                Box::new(ConnectedThreshold::new(DEFAULT_SEED, lower, upper, replace))
            }
            Grow::Neighborhood { radius } => {
                Box::new(NeighborhoodConnected::new(DEFAULT_SEED, radius, replace))
            }
            Grow::Confidence {
                radius,
                multiplier,
                iterations,
            } => Box::new(ConfidenceConnected {
                seed: DEFAULT_SEED,
                initial_radius: radius,
                multiplier,
                iterations,
                replace,
            }),
        }
    }

    /// 如 `CT_sigma0_L15_U100`, `CC_sigma1_R2_M2.5_It3`.
    fn tag(&self, sigma: f64) -> String {
        let sigma = fmt_g(sigma);
        match *self {
            Grow::Connected { lower, upper } => format!(
                "CT_sigma{sigma}_L{}_U{}",
                fmt_g(f64::from(lower)),
                fmt_g(f64::from(upper))
            ),
            Grow::Neighborhood { radius } => format!("NC_sigma{sigma}_R{radius}"),
            Grow::Confidence {
                radius,
                multiplier,
                iterations,
            } => format!(
                "CC_sigma{sigma}_R{radius}_M{}_It{iterations}",
                fmt_g(multiplier)
            ),
        }
    }
}

fn print_report(report: &SweepReport) {
    utils::sep();
    println!("{report}");
}

/// 连通阈值, 邻域连通, 置信连通区域生长, 分别在原图和中值滤波后的图上扫描参数.
pub fn region_grow(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let prefix = args.required("prefix")?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::Cwd)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let base = FileStem::parse(&input).base;
    let name = |part: String| OutputName::new(&dir, &base).part(&prefix).part(part).ext(".png");

    let processed = SIGMAS
        .iter()
        .map(|&sigma| {
            let proc = if sigma > 0.0 {
                Median::new(MEDIAN_RADIUS).apply(&img)
            } else {
                img.clone()
            };
            let path = name(format!("processed_sigma{}", fmt_g(sigma))).to_path();
            save_rescaled(&proc, path)?;
            Ok(proc)
        })
        .collect::<LabResult<Vec<_>>>()?;

    let sweep = Sweep::grid2(&[0usize, 1], &Grow::all());
    let report = sweep.run(|&(i, grow)| -> Result<PathBuf, LabError> {
        let seg = grow.segmenter().segment(&processed[i])?;
        save_rescaled(&seg, name(grow.tag(SIGMAS[i])).to_path())
    });
    print_report(&report);
    println!("Processing finished.");
    Ok(())
}

/// 原图或中值滤波后求梯度幅值, 再以不同抬平阈值和水位做分水岭.
pub fn watershed(mut args: Args) -> LabResult {
    let input = args.required("image")?;
    let prefix = args.required("prefix")?;
    let dir = resolve_output_dir(args.next_opt(), OutputFallback::Cwd)?;
    args.finish()?;

    let img: Image2d<f32> = read_image(&input)?;
    let base = FileStem::parse(&input).base;
    let name = |part: String| OutputName::new(&dir, &base).part(&prefix).part(part).ext(".png");

    let gradients = WS_MODES
        .iter()
        .map(|&mode| {
            let proc = match mode {
                "median" => Median::new(MEDIAN_RADIUS).apply(&img),
                _ => img.clone(),
            };
            save_rescaled(&proc, name(format!("{mode}_processed")).to_path())?;
            Ok(GradientMagnitude.apply(&proc))
        })
        .collect::<LabResult<Vec<_>>>()?;

    let sweep = Sweep::grid3(&[0usize, 1], &WS_THRESHOLDS, &WS_LEVELS);
    let report = sweep.run(|&(i, threshold, level)| -> Result<PathBuf, LabError> {
        let labels = Watershed::new(threshold, level).segment(&gradients[i])?;
        let part = format!(
            "WS_{}_T{}_L{}",
            WS_MODES[i],
            fmt_fixed(threshold, 3),
            fmt_fixed(level, 1)
        );
        save_rescaled(&labels, name(part).to_path())
    });
    print_report(&report);
    println!("Watershed segmentation finished.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{arg, file_names, names, run, test_dir, write_phantom};
    use super::*;

    #[test]
    fn test_grow_combinations() {
        let all = Grow::all();
        assert_eq!(all.len(), 3 + 2 + 8);
        assert_eq!(all[0].tag(0.0), "CT_sigma0_L15_U100");
        assert_eq!(all[3].tag(1.0), "NC_sigma1_R1");
        assert_eq!(all.last().map(|g| g.tag(1.0)).as_deref(), Some("CC_sigma1_R2_M2.5_It3"));
    }

    #[test]
    fn test_region_grow_outputs() {
        let input = write_phantom(&test_dir("region_grow_in"));
        let out = test_dir("region_grow_out");
        run("region-grow", [input, "lab".to_string(), arg(&out)]).unwrap();

        let mut expected = names(["scan_lab_processed_sigma0.png", "scan_lab_processed_sigma1.png"]);
        for sigma in ["0", "1"] {
            for (l, u) in [(15, 100), (50, 150), (80, 200)] {
                expected.insert(format!("scan_lab_CT_sigma{sigma}_L{l}_U{u}.png"));
            }
            for r in [1, 3] {
                expected.insert(format!("scan_lab_NC_sigma{sigma}_R{r}.png"));
            }
            for r in [1, 2] {
                for m in ["1", "2.5"] {
                    for it in [1, 3] {
                        expected.insert(format!("scan_lab_CC_sigma{sigma}_R{r}_M{m}_It{it}.png"));
                    }
                }
            }
        }
        assert_eq!(expected.len(), 2 + 26);
        assert_eq!(file_names(&out), expected);

        // 种子点 (128, 128) 处为 90, 在 [50, 150] 内.
        let seg: Image2d<u8> = read_image(out.join("scan_lab_CT_sigma0_L50_U150.png")).unwrap();
        assert_eq!(seg[(128, 128)], 255);
        assert_eq!(seg[(0, 0)], 0);
        assert_eq!(seg[(40, 40)], 0);
    }

    #[test]
    fn test_watershed_outputs() {
        let input = write_phantom(&test_dir("watershed_in"));
        let out = test_dir("watershed_out");
        run("watershed", [input, "lab".to_string(), arg(&out)]).unwrap();

        let mut expected = names(["scan_lab_none_processed.png", "scan_lab_median_processed.png"]);
        for mode in ["none", "median"] {
            for t in ["0.001", "0.005", "0.010"] {
                for l in ["0.1", "0.2", "0.3", "0.4"] {
                    expected.insert(format!("scan_lab_WS_{mode}_T{t}_L{l}.png"));
                }
            }
        }
        assert_eq!(expected.len(), 2 + 24);
        assert_eq!(file_names(&out), expected);
    }

    #[test]
    fn test_region_grow_requires_prefix() {
        let input = write_phantom(&test_dir("region_grow_usage"));
        assert!(matches!(run("region-grow", [input]), Err(LabError::Usage(_))));
    }
}
