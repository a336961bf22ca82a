//! Weighted absolute-error fit by iteratively reweighted least squares.
//!
//! Objective:
//!
//! ```text
//! minimize Σ_i c_i |(A w - b)_i| + γ Σ_j |w_j|
//! ```
//!
//! Each step replaces every absolute value `|x|` by the quadratic majorizer
//! `x² / (2|x₀|) + |x₀| / 2` around the current iterate and solves the resulting
//! weighted ridge system
//!
//! ```text
//! (Aᵀ U A + V) w = Aᵀ U b,   U = diag(c_i / |r_i|),  V = diag(γ / |w_j|)
//! ```
//!
//! Magnitudes are floored at `floor` so exact fits and zero weights stay finite.
//! The best iterate (by the true objective) is returned; weights below the floor
//! are snapped to exactly zero unless that worsens the objective.

use nalgebra::{DMatrix, DVector};

use crate::math::solve_least_squares;

#[derive(Debug, Clone, Copy)]
pub struct IrlsOptions {
    pub max_iter: usize,
    /// Relative objective change that counts as converged.
    pub tol: f64,
    /// Floor on `|r_i|` and `|w_j|` in the reweighting step.
    pub floor: f64,
}

impl Default for IrlsOptions {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tol: 1e-10,
            floor: 1e-6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IrlsSolution {
    pub w: DVector<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// `Σ c_i |(A w - b)_i| + γ ‖w‖₁`
pub fn weighted_l1_objective(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    c: &DVector<f64>,
    w: &DVector<f64>,
    gamma: f64,
) -> f64 {
    let r = a * w - b;
    let fit: f64 = r.iter().zip(c.iter()).map(|(ri, ci)| ci * ri.abs()).sum();
    fit + gamma * w.lp_norm(1)
}

pub fn solve_weighted_l1(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    c: &DVector<f64>,
    gamma: f64,
    w0: DVector<f64>,
    opts: &IrlsOptions,
) -> IrlsSolution {
    let p = a.ncols();
    let at = a.transpose();

    let mut w = w0;
    let mut objective = weighted_l1_objective(a, b, c, &w, gamma);
    let mut best = (w.clone(), objective);
    let mut converged = false;
    let mut iterations = 0;

    for iter in 1..=opts.max_iter {
        iterations = iter;
        let r = a * &w - b;

        let u = DVector::from_iterator(
            r.len(),
            r.iter()
                .zip(c.iter())
                .map(|(ri, ci)| ci / ri.abs().max(opts.floor)),
        );
        // Aᵀ U as a scaled copy of Aᵀ (column i scaled by u_i).
        let mut at_u = at.clone();
        for (i, ui) in u.iter().enumerate() {
            at_u.column_mut(i).scale_mut(*ui);
        }

        let mut normal = &at_u * a;
        if gamma > 0.0 {
            for j in 0..p {
                normal[(j, j)] += gamma / w[j].abs().max(opts.floor);
            }
        }
        let rhs = &at_u * b;

        let next = match normal.clone().cholesky() {
            Some(chol) => chol.solve(&rhs),
            None => match solve_least_squares(&normal, &rhs) {
                Some(v) => v,
                None => break,
            },
        };
        if !next.iter().all(|v| v.is_finite()) {
            break;
        }

        let next_obj = weighted_l1_objective(a, b, c, &next, gamma);
        let change = (objective - next_obj).abs() / objective.abs().max(1.0);
        w = next;
        objective = next_obj;
        if objective < best.1 {
            best = (w.clone(), objective);
        }
        if change < opts.tol {
            converged = true;
            break;
        }
    }

    let (w, objective) = snap_small_weights(a, b, c, gamma, opts.floor, best);

    IrlsSolution {
        w,
        objective,
        iterations,
        converged,
    }
}

/// Zero out weights below `floor` unless that raises the objective.
fn snap_small_weights(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    c: &DVector<f64>,
    gamma: f64,
    floor: f64,
    (w, objective): (DVector<f64>, f64),
) -> (DVector<f64>, f64) {
    let snapped = w.map(|v| if v.abs() < floor { 0.0 } else { v });
    let snapped_obj = weighted_l1_objective(a, b, c, &snapped, gamma);
    if snapped_obj <= objective {
        (snapped, snapped_obj)
    } else {
        (w, objective)
    }
}
