//! SVG charts for the paper, rendered with Plotters.
//!
//! Two charts per run:
//! - target payoff against each approximation on the evaluation grid
//! - grouped bar chart of the fitted weights, one color per method
//!
//! All series and bounds are computed by the caller; these functions only draw.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::domain::FitMethod;
use crate::error::AppError;

/// One reconstructed curve on the evaluation grid.
#[derive(Debug, Clone)]
pub struct CurveSeries<'a> {
    pub method: FitMethod,
    pub label: String,
    pub values: &'a [f64],
}

/// Weights of one method, aligned to a shared list of basis names.
#[derive(Debug, Clone)]
pub struct WeightSeries<'a> {
    pub method: FitMethod,
    pub values: &'a [f64],
}

const SIZE: (u32, u32) = (900, 480);

/// SVG legend text, e.g. `L2 Approximation (γ=0.10)`.
pub fn curve_legend(method: FitMethod, gamma: f64) -> String {
    format!("{} (γ={gamma:.2})", method.series_title())
}

fn method_color(method: FitMethod) -> RGBColor {
    match method {
        FitMethod::L2 => RGBColor(200, 30, 30),
        FitMethod::L1 => RGBColor(30, 60, 200),
        FitMethod::Weighted => RGBColor(0, 120, 0),
    }
}

pub fn render_comparison_svg(
    path: &Path,
    title: &str,
    prices: &[f64],
    target: &[f64],
    series: &[CurveSeries<'_>],
) -> Result<(), AppError> {
    draw_comparison(path, title, prices, target, series)
        .map_err(|e| AppError::new(2, format!("Failed to render '{}': {e}", path.display())))
}

pub fn render_weights_svg(
    path: &Path,
    title: &str,
    names: &[String],
    series: &[WeightSeries<'_>],
) -> Result<(), AppError> {
    draw_weights(path, title, names, series)
        .map_err(|e| AppError::new(2, format!("Failed to render '{}': {e}", path.display())))
}

fn draw_comparison(
    path: &Path,
    title: &str,
    prices: &[f64],
    target: &[f64],
    series: &[CurveSeries<'_>],
) -> Result<(), Box<dyn Error>> {
    let (x0, x1) = bounds(prices.iter().copied()).ok_or("empty price grid")?;
    let all_y = target
        .iter()
        .chain(series.iter().flat_map(|s| s.values.iter()))
        .copied();
    let (y0, y1) = bounds(all_y).ok_or("no finite payoff values")?;
    let (y0, y1) = pad(y0, y1, 0.05);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("Underlying Asset Price at Maturity")
        .y_desc("Payoff")
        .light_line_style(RGBColor(235, 235, 235))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            prices.iter().copied().zip(target.iter().copied()),
            BLACK.stroke_width(2),
        ))?
        .label("Target Payoff")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

    for s in series {
        let color = method_color(s.method);
        chart
            .draw_series(LineSeries::new(
                prices.iter().copied().zip(s.values.iter().copied()),
                color.stroke_width(2),
            ))?
            .label(s.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_weights(
    path: &Path,
    title: &str,
    names: &[String],
    series: &[WeightSeries<'_>],
) -> Result<(), Box<dyn Error>> {
    if names.is_empty() || series.is_empty() {
        return Err("nothing to plot".into());
    }
    let all = series.iter().flat_map(|s| s.values.iter()).copied().chain([0.0]);
    let (y0, y1) = bounds(all).ok_or("no finite weights")?;
    let (y0, y1) = pad(y0, y1, 0.1);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let p = names.len();
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5..(p as f64 - 0.5), y0..y1)?;

    let label_for = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < p {
            names[i as usize].clone()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(p)
        .x_label_formatter(&label_for)
        .y_desc("Weight")
        .light_line_style(RGBColor(235, 235, 235))
        .draw()?;

    chart.draw_series(LineSeries::new(
        [(-0.5, 0.0), (p as f64 - 0.5, 0.0)],
        BLACK.stroke_width(1),
    ))?;

    let group = 0.8;
    let bar = group / series.len() as f64;
    for (m, s) in series.iter().enumerate() {
        let color = method_color(s.method);
        chart
            .draw_series(s.values.iter().enumerate().map(|(j, &w)| {
                let left = j as f64 - group / 2.0 + m as f64 * bar;
                Rectangle::new([(left, 0.0), (left + bar, w)], color.filled())
            }))?
            .label(s.method.display_name())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return None;
    }
    if hi <= lo {
        return Some((lo - 0.5, hi + 0.5));
    }
    Some((lo, hi))
}

fn pad(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}
