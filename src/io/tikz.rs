//! pgfplots snippets that plot the exported `.dat` tables.
//!
//! The paper `\input`s these files; they reference the `.dat` files by bare name,
//! so both must live in the same directory as the document.

use std::fs;
use std::path::Path;

use crate::domain::FitMethod;
use crate::error::AppError;

/// One `\addplot` line: dat column index, style, and legend text.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub column: usize,
    pub style: &'static str,
    pub legend: String,
}

/// Line style per method.
pub fn series_style(method: FitMethod) -> &'static str {
    match method {
        FitMethod::L2 => "thick, dashed, red",
        FitMethod::L1 => "thick, dashdotted, blue",
        FitMethod::Weighted => "thick, dotted, green!50!black",
    }
}

/// Legend text, e.g. `L2 Approximation ($\gamma=0.10$)`.
pub fn series_legend(method: FitMethod, gamma: f64) -> String {
    format!("{} ($\\gamma={gamma:.2}$)", method.series_title())
}

/// Render a `tikzpicture` plotting `dat_name` column 0 against the target
/// (column 1) and each series.
pub fn render_axis(title: &str, dat_name: &str, series: &[PlotSeries]) -> String {
    let mut out = String::new();
    out.push_str("\\begin{tikzpicture}\n");
    out.push_str("\\begin{axis}[\n");
    out.push_str("    width=0.9\\textwidth,\n");
    out.push_str("    height=6cm,\n");
    out.push_str("    grid=both,\n");
    out.push_str("    grid style={line width=.1pt, draw=gray!10},\n");
    out.push_str("    major grid style={line width=.2pt,draw=gray!50},\n");
    out.push_str("    xlabel style={font=\\tiny},\n");
    out.push_str("    ylabel style={font=\\tiny},\n");
    out.push_str("    tick label style={font=\\tiny},\n");
    out.push_str("    title style={font=\\small},\n");
    out.push_str("    legend style={font=\\tiny, at={(0.02,0.98)}, anchor=north west},\n");
    out.push_str("    xlabel={Underlying Asset Price at Maturity},\n");
    out.push_str("    ylabel={Payoff},\n");
    out.push_str(&format!("    title={{{title}}}\n"));
    out.push_str("]\n\n");

    out.push_str(&format!(
        "\\addplot[thick, black] table[x index=0,y index=1] {{{dat_name}}};\n"
    ));
    out.push_str("\\addlegendentry{Target Payoff}\n\n");

    for s in series {
        out.push_str(&format!(
            "\\addplot[{}] table[x index=0,y index={}] {{{dat_name}}};\n",
            s.style, s.column
        ));
        out.push_str(&format!("\\addlegendentry{{{}}}\n\n", s.legend));
    }

    out.push_str("\\end{axis}\n");
    out.push_str("\\end{tikzpicture}\n");
    out
}

pub fn write_axis(
    path: &Path,
    title: &str,
    dat_name: &str,
    series: &[PlotSeries],
) -> Result<(), AppError> {
    fs::write(path, render_axis(title, dat_name, series))
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_references_dat_columns_and_gamma() {
        let series = vec![
            PlotSeries {
                column: 2,
                style: series_style(FitMethod::L2),
                legend: series_legend(FitMethod::L2, 0.1),
            },
            PlotSeries {
                column: 3,
                style: series_style(FitMethod::L1),
                legend: series_legend(FitMethod::L1, 0.1),
            },
        ];
        let tex = render_axis("L1 and L2 Regularization Comparison", "cmp.dat", &series);

        assert!(tex.starts_with("\\begin{tikzpicture}"));
        assert!(tex.contains("title={L1 and L2 Regularization Comparison}"));
        assert!(tex.contains("\\addplot[thick, black] table[x index=0,y index=1] {cmp.dat};"));
        assert!(tex.contains(
            "\\addplot[thick, dashdotted, blue] table[x index=0,y index=3] {cmp.dat};"
        ));
        assert!(tex.contains("\\addlegendentry{L2 Approximation ($\\gamma=0.10$)}"));
        assert!(tex.trim_end().ends_with("\\end{tikzpicture}"));
    }
}
