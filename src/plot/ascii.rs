//! Terminal preview of a target payoff and its approximations.
//!
//! Fixed-size character canvas, deterministic output (golden-tested below).
//! The target is drawn as `o` points on top of one line per approximation,
//! each with its own glyph (`-`, `~`, `*`).

/// One approximation drawn as a line.
#[derive(Debug, Clone)]
pub struct AsciiSeries<'a> {
    pub glyph: char,
    pub label: &'a str,
    pub values: &'a [f64],
}

/// Render target points over approximation lines.
pub fn render_ascii_plot(
    prices: &[f64],
    target: &[f64],
    series: &[AsciiSeries<'_>],
    width: usize,
    height: usize,
) -> String {
    let xs = finite_span(prices.iter().copied()).unwrap_or((0.0, 1.0));
    let ys = finite_span(
        target
            .iter()
            .chain(series.iter().flat_map(|s| s.values.iter()))
            .copied(),
    )
    .map(|(lo, hi)| {
        let margin = ((hi - lo) * 0.05).max(1e-12);
        (lo - margin, hi + margin)
    })
    .unwrap_or((0.0, 1.0));

    let mut canvas = Canvas::new(width.max(10), height.max(5), xs, ys);
    for s in series {
        canvas.polyline(prices, s.values, s.glyph);
    }
    // Target last so its points stay visible where lines cross.
    for (&x, &y) in prices.iter().zip(target) {
        if let Some(cell) = canvas.cell(x, y) {
            canvas.put(cell, 'o', true);
        }
    }

    let legend: Vec<String> = std::iter::once("o target".to_string())
        .chain(series.iter().map(|s| format!("{} {}", s.glyph, s.label)))
        .collect();

    let mut out = format!(
        "Plot: S=[{:.2}, {:.2}] | payoff=[{:.2}, {:.2}] | {}\n",
        xs.0,
        xs.1,
        ys.0,
        ys.1,
        legend.join(", ")
    );
    out.push_str(&canvas.render());
    out
}

struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
    xs: (f64, f64),
    ys: (f64, f64),
}

impl Canvas {
    fn new(width: usize, height: usize, xs: (f64, f64), ys: (f64, f64)) -> Self {
        Self {
            width,
            height,
            cells: vec![' '; width * height],
            xs,
            ys,
        }
    }

    /// `(column, row)` of a data point; row 0 is the top (largest payoff).
    fn cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let u = ((x - self.xs.0) / (self.xs.1 - self.xs.0)).clamp(0.0, 1.0);
        let v = ((y - self.ys.0) / (self.ys.1 - self.ys.0)).clamp(0.0, 1.0);
        let col = (u * (self.width - 1) as f64).round() as usize;
        let row = ((1.0 - v) * (self.height - 1) as f64).round() as usize;
        Some((col, row))
    }

    fn put(&mut self, (col, row): (usize, usize), glyph: char, overwrite: bool) {
        let idx = row * self.width + col;
        if overwrite || self.cells[idx] == ' ' {
            self.cells[idx] = glyph;
        }
    }

    /// Connect consecutive points column by column, filling vertical gaps so
    /// steep segments stay continuous. Never overwrites an occupied cell.
    fn polyline(&mut self, xs: &[f64], ys: &[f64], glyph: char) {
        let mut prev: Option<(usize, usize)> = None;
        for (&x, &y) in xs.iter().zip(ys) {
            let Some(next) = self.cell(x, y) else {
                prev = None;
                continue;
            };
            match prev {
                None => self.put(next, glyph, false),
                Some(from) => self.segment(from, next, glyph),
            }
            prev = Some(next);
        }
    }

    fn segment(&mut self, (c0, r0): (usize, usize), (c1, r1): (usize, usize), glyph: char) {
        let (lo, hi) = if c0 <= c1 { (c0, c1) } else { (c1, c0) };
        let row_at = |c: usize| -> usize {
            if c1 == c0 {
                r1
            } else {
                let t = (c as f64 - c0 as f64) / (c1 as f64 - c0 as f64);
                (r0 as f64 + t * (r1 as f64 - r0 as f64)).round() as usize
            }
        };

        let mut last_row = row_at(lo);
        for c in lo..=hi {
            let row = row_at(c);
            let (top, bottom) = if c == lo {
                (row, row)
            } else {
                (row.min(last_row), row.max(last_row))
            };
            for r in top..=bottom {
                self.put((c, r), glyph, false);
            }
            last_row = row;
        }
        if c0 == c1 {
            for r in r0.min(r1)..=r0.max(r1) {
                self.put((c0, r), glyph, false);
            }
        }
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

fn finite_span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (hi > lo).then_some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let prices = [0.0, 1.0];
        let target = [0.0, 1.0];
        let flat = [0.0, 0.0];
        let txt = render_ascii_plot(
            &prices,
            &target,
            &[AsciiSeries {
                glyph: '-',
                label: "L2",
                values: &flat,
            }],
            10,
            5,
        );
        let expected = concat!(
            "Plot: S=[0.00, 1.00] | payoff=[-0.05, 1.05] | o target, - L2\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn steep_segment_has_no_vertical_gaps() {
        let prices = [0.0, 0.1];
        let steep = [0.0, 1.0];
        let txt = render_ascii_plot(
            &prices,
            &[f64::NAN, f64::NAN],
            &[AsciiSeries {
                glyph: '*',
                label: "L1",
                values: &steep,
            }],
            10,
            6,
        );
        // Every canvas row carries at least one glyph.
        assert!(txt.lines().skip(1).all(|line| line.contains('*')), "{txt}");
    }
}
