//! Terminal charts drawn on a fixed character grid.
//!
//! Output is deterministic for a given input and size, which keeps the golden
//! tests stable.
//!
//! Two charts:
//! - release overlay: one digit glyph per sample (`1`..`9`), segments joined with `.`
//! - calibration: standards as `o`, fitted line as `-`

use crate::compare::ComparisonSet;
use crate::domain::{CalibrationModel, CalibrationPoint};

/// Render the cumulative-release overlay for a comparison set.
pub fn render_release_overlay(set: &ComparisonSet<'_>, width: usize, height: usize) -> String {
    let series: Vec<(String, Vec<(f64, f64)>)> = set
        .iter()
        .map(|s| (s.label.to_string(), s.points().collect()))
        .collect();
    render_series_overlay(&series, width, height)
}

/// Render an overlay of labelled `(time, cumulative)` series.
pub fn render_series_overlay(series: &[(String, Vec<(f64, f64)>)], width: usize, height: usize) -> String {
    let all = series.iter().flat_map(|(_, pts)| pts.iter().copied());
    let Some(frame) = Frame::fit(all, width, height) else {
        return "Plot: no release data to plot.\n".to_string();
    };

    let mut grid = frame.blank_grid();
    // Segments first; glyphs overwrite them.
    for (_, pts) in series {
        draw_polyline(&mut grid, &frame, pts, '.');
    }
    for (idx, (_, pts)) in series.iter().enumerate() {
        let glyph = series_glyph(idx);
        for &(t, y) in pts {
            if let Some((col, row)) = frame.cell(t, y) {
                grid[row][col] = glyph;
            }
        }
    }

    let (t_min, t_max) = frame.x;
    let (y_min, y_max) = frame.y;
    let mut out = format!("Plot: time=[{t_min:.2}, {t_max:.2}] h | cumulative=[{y_min:.2}, {y_max:.2}] ug\n");
    push_grid(&mut out, &grid);

    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(idx, (label, _))| format!("{}={label}", series_glyph(idx)))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join(" ")));
    out
}

/// Render the standards and the fitted calibration line.
pub fn render_calibration_plot(
    points: &[CalibrationPoint],
    model: &CalibrationModel,
    width: usize,
    height: usize,
) -> String {
    let observed: Vec<(f64, f64)> = points.iter().map(|p| (p.concentration, p.absorbance)).collect();
    let Some(span) = Frame::fit(observed.iter().copied(), width, height) else {
        return "Plot: no calibration standards to plot.\n".to_string();
    };
    let line = sample_line(model, span.x, span.width);

    // Re-frame so the y range covers the line as well as the standards.
    let Some(frame) = Frame::fit(observed.iter().chain(&line).copied(), width, height) else {
        return "Plot: no calibration standards to plot.\n".to_string();
    };

    let mut grid = frame.blank_grid();
    draw_polyline(&mut grid, &frame, &line, '-');
    for &(c, a) in &observed {
        if let Some((col, row)) = frame.cell(c, a) {
            grid[row][col] = 'o';
        }
    }

    let (c_min, c_max) = frame.x;
    let (a_min, a_max) = frame.y;
    let mut out = format!(
        "Plot: concentration=[{c_min:.2}, {c_max:.2}] ug/mL | absorbance=[{a_min:.4}, {a_max:.4}] AU\n"
    );
    push_grid(&mut out, &grid);
    out
}

/// Glyph for the series at `idx` (`1`..`9`, then `*`).
pub fn series_glyph(idx: usize) -> char {
    char::from_digit((idx + 1) as u32, 10)
        .filter(|_| idx < 9)
        .unwrap_or('*')
}

/// Data ranges mapped onto a `width × height` grid (row 0 is the top).
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: (f64, f64),
    y: (f64, f64),
    width: usize,
    height: usize,
}

impl Frame {
    /// Frame covering every finite point, with 5% headroom on the y axis.
    fn fit(points: impl Iterator<Item = (f64, f64)>, width: usize, height: usize) -> Option<Self> {
        let mut x = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y = (f64::INFINITY, f64::NEG_INFINITY);
        for (px, py) in points.filter(|(a, b)| a.is_finite() && b.is_finite()) {
            x = (x.0.min(px), x.1.max(px));
            y = (y.0.min(py), y.1.max(py));
        }
        if !(x.0 <= x.1 && y.0 <= y.1) {
            return None;
        }
        // A single time point still needs a non-empty span.
        if x.1 <= x.0 {
            x.1 = x.0 + 1.0;
        }
        let pad = ((y.1 - y.0) * 0.05).max(1e-12);

        Some(Self {
            x,
            y: (y.0 - pad, y.1 + pad),
            width: width.max(10),
            height: height.max(5),
        })
    }

    fn blank_grid(&self) -> Vec<Vec<char>> {
        vec![vec![' '; self.width]; self.height]
    }

    /// `(column, row)` for a data point, `None` for non-finite input.
    fn cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let col = scale(x, self.x, self.width);
        let row = self.height - 1 - scale(y, self.y, self.height);
        Some((col, row))
    }
}

/// Position of `v` within `range` on `0..n`, clamped to the ends.
fn scale(v: f64, (lo, hi): (f64, f64), n: usize) -> usize {
    let u = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    (u * (n.max(2) - 1) as f64).round() as usize
}

fn sample_line(model: &CalibrationModel, (c_min, c_max): (f64, f64), n: usize) -> Vec<(f64, f64)> {
    let steps = n.max(2) - 1;
    (0..=steps)
        .map(|i| {
            let c = c_min + (c_max - c_min) * i as f64 / steps as f64;
            (c, model.predict_absorbance(c))
        })
        .collect()
}

fn push_grid(out: &mut String, grid: &[Vec<char>]) {
    for row in grid {
        out.extend(row.iter());
        out.push('\n');
    }
}

fn draw_polyline(grid: &mut [Vec<char>], frame: &Frame, points: &[(f64, f64)], ch: char) {
    let cells: Vec<(usize, usize)> = points.iter().filter_map(|&(x, y)| frame.cell(x, y)).collect();
    for pair in cells.windows(2) {
        draw_segment(grid, pair[0], pair[1], ch);
    }
}

/// Fill empty cells along a segment, one cell per step on the longer axis.
fn draw_segment(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (c0, r0) = (from.0 as f64, from.1 as f64);
    let (dc, dr) = (to.0 as f64 - c0, to.1 as f64 - r0);
    let steps = dc.abs().max(dr.abs()) as usize;

    for i in 0..=steps {
        let f = if steps == 0 { 0.0 } else { i as f64 / steps as f64 };
        let col = (c0 + f * dc).round() as usize;
        let row = (r0 + f * dr).round() as usize;
        if let Some(cell) = grid.get_mut(row).and_then(|r| r.get_mut(col)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }
    }
}
