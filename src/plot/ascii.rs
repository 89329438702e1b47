//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, deterministic output (helpful for golden
//! tests). Plot elements:
//! - elastic points: `e`
//! - fracture points: `f`
//! - other overlay series: caller-chosen marker
//! - fitted forms: `-` line over their validity domain

use crate::domain::{CurvePoint, FitResult, LoadDisplacementCurve};
use crate::models::predict;

pub const ELASTIC_MARKER: char = 'e';
pub const FRACTURE_MARKER: char = 'f';

/// Points drawn with one marker.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    pub points: &'a [CurvePoint],
    pub marker: char,
}

/// Plot one split curve and the forms fitted to it.
pub fn render_curve_plot(curve: &LoadDisplacementCurve, fits: &[&FitResult], width: usize, height: usize) -> String {
    let series = [
        Series {
            points: &curve.elastic,
            marker: ELASTIC_MARKER,
        },
        Series {
            points: &curve.fracture,
            marker: FRACTURE_MARKER,
        },
    ];
    render_ascii_plot(&series, fits, width, height)
}

/// Plot any number of point series plus fitted forms.
pub fn render_ascii_plot(series: &[Series<'_>], fits: &[&FitResult], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let fit_curves: Vec<Vec<(f64, f64)>> = fits.iter().map(|f| sample_fit(f, width)).collect();

    let all_x = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.displacement))
        .chain(fit_curves.iter().flatten().map(|&(x, _)| x));
    let (x_min, x_max) = range(all_x).unwrap_or((0.0, 1.0));

    let all_y = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.load))
        .chain(fit_curves.iter().flatten().map(|&(_, y)| y));
    let (y_min, y_max) = range(all_y).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curves first so points overlay them.
    for curve in &fit_curves {
        draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);
    }

    for s in series {
        for p in s.points {
            if !(p.displacement.is_finite() && p.load.is_finite()) {
                continue;
            }
            let x = map_x(p.displacement, x_min, x_max, width);
            let y = map_y(p.load, y_min, y_max, height);
            grid[y][x] = s.marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: U=[{x_min:.3}, {x_max:.3}] | P=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn sample_fit(fit: &FitResult, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let x = fit.x_min + u * (fit.x_max - fit.x_min);
            (x, predict(fit.form, x, &fit.params))
        })
        .filter(|(_, y)| y.is_finite())
        .collect()
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // top row is the maximum
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitForm, MseStats, Quality};

    fn pt(displacement: f64, load: f64) -> CurvePoint {
        CurvePoint { displacement, load }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let curve = LoadDisplacementCurve {
            elastic: vec![pt(0.0, 0.0), pt(0.8, 4.0)],
            fracture: vec![pt(1.2, 7.0), pt(2.0, 3.0)],
        };
        let fit = FitResult {
            form: FitForm::Linear,
            params: vec![0.0, 5.0],
            covariance: vec![vec![0.0; 2]; 2],
            x_min: 0.0,
            x_max: 2.0,
            iterations: 1,
            quality: Quality::Mse(MseStats { mse: 0.0, mean: 0.0, std: 0.0, n: 4 }),
        };

        let txt = render_curve_plot(&curve, &[&fit], 11, 5);
        let expected = concat!(
            "Plot: U=[0.000, 2.000] | P=[-0.50, 10.50]\n",
            "          -\n",
            "      f--- \n",
            "    e--    \n",
            " ---      f\n",
            "e          \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_plot_keeps_its_frame() {
        let txt = render_ascii_plot(&[], &[], 10, 5);
        assert_eq!(txt.lines().count(), 6);
        assert!(txt.lines().skip(1).all(|l| l.chars().count() == 10 && l.trim().is_empty()));
    }
}
