//! Exact lasso by a dual active-set method.
//!
//! Objective (same scaling as the usual lasso formulation):
//!
//! ```text
//! minimize (1 / 2n) ‖A w - b‖² + λ ‖w‖₁
//! ```
//!
//! Multiplying by `n` and dualizing gives a projection of `b` onto a polytope:
//!
//! ```text
//! minimize ½ ‖θ - b‖²   subject to   |A_jᵀ θ| ≤ nλ  for every column j
//! ```
//!
//! The optimal `θ` is the lasso residual `b - A w`, and the weights are the
//! signed multipliers of the active constraints. We solve the projection with
//! the Goldfarb-Idnani dual method: start from the unconstrained optimum
//! `θ = b`, repeatedly pick the most violated constraint and move towards it,
//! dropping active constraints whose multiplier would turn negative.
//!
//! The active constraint normals stay linearly independent, so the solver is
//! exact on rank-deficient bases (calls and puts at the same strike, or the
//! spot column next to a full strike ladder) where coordinate descent stalls
//! on flat directions. Inactive coordinates come out as exact `0.0`, and with
//! `λ ≥ max_j |A_jᵀ b| / n` the solution is the zero vector.

use nalgebra::{DMatrix, DVector};

use super::ols::{RANK_RTOL, solve_least_squares};

#[derive(Debug, Clone, Copy)]
pub struct LassoOptions {
    /// Cap on active-set changes (one per added or dropped constraint).
    pub max_iter: usize,
    /// A column counts as violating when `|A_jᵀ r| / n > λ (1 + tol)`.
    pub tol: f64,
}

impl Default for LassoOptions {
    fn default() -> Self {
        Self {
            max_iter: 10_000,
            tol: 1e-10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LassoSolution {
    pub w: DVector<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Active constraint `sign · A_colᵀ θ ≤ nλ` with its multiplier.
#[derive(Debug, Clone, Copy)]
struct Bound {
    col: usize,
    sign: f64,
    mult: f64,
}

/// Solve the lasso for one `λ`.
///
/// `λ = 0` is plain least squares (minimum-norm on rank-deficient designs).
/// When the step cap is reached the weights of the current active set are
/// returned with `converged = false`.
pub fn solve_lasso(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    lambda: f64,
    opts: &LassoOptions,
) -> LassoSolution {
    let p = a.ncols();
    if lambda <= 0.0 {
        return match solve_least_squares(a, b) {
            Some(w) => LassoSolution {
                w,
                iterations: 0,
                converged: true,
            },
            None => LassoSolution {
                w: DVector::zeros(p),
                iterations: 0,
                converged: false,
            },
        };
    }

    let bound = lambda * a.nrows().max(1) as f64;
    let limit = bound * (1.0 + opts.tol);

    let mut theta = b.clone();
    let mut active: Vec<Bound> = Vec::new();
    let mut steps = 0;

    loop {
        let Some((col, sign)) = most_violated(a, &theta, &active, limit) else {
            return finish(p, &active, steps, true);
        };
        let normal: DVector<f64> = a.column(col) * (-sign);
        let normal_norm = normal.norm();
        let mut entering = 0.0;

        // Move towards the entering constraint until it is satisfied, dropping
        // blocking constraints on the way.
        loop {
            if steps >= opts.max_iter {
                return finish(p, &active, steps, false);
            }
            steps += 1;

            let Some((coef, z)) = project_out(a, &active, &normal) else {
                return finish(p, &active, steps, false);
            };

            // Partial step: first active multiplier to reach zero.
            let mut partial = f64::INFINITY;
            let mut blocking = None;
            for (k, (c, bnd)) in coef.iter().zip(&active).enumerate() {
                if *c > 0.0 {
                    let t = bnd.mult / c;
                    if t < partial {
                        partial = t;
                        blocking = Some(k);
                    }
                }
            }

            // Full step: enough to satisfy the entering constraint.
            let full = if z.norm() <= RANK_RTOL * normal_norm {
                f64::INFINITY
            } else {
                let slack = bound - sign * a.column(col).dot(&theta);
                -slack / z.dot(&normal)
            };

            let t = partial.min(full);
            if !t.is_finite() {
                return finish(p, &active, steps, false);
            }
            if full.is_finite() {
                theta.axpy(t, &z, 1.0);
            }
            for (bnd, c) in active.iter_mut().zip(coef.iter()) {
                bnd.mult -= t * c;
            }
            entering += t;

            if full <= partial {
                active.push(Bound {
                    col,
                    sign,
                    mult: entering,
                });
                break;
            }
            if let Some(k) = blocking {
                active.remove(k);
            }
        }
    }
}

/// Column with the largest `|A_jᵀ θ|` above `limit`, skipping active ones.
fn most_violated(
    a: &DMatrix<f64>,
    theta: &DVector<f64>,
    active: &[Bound],
    limit: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut worst = limit;
    for j in 0..a.ncols() {
        if active.iter().any(|bnd| bnd.col == j) {
            continue;
        }
        let g = a.column(j).dot(theta);
        if g.abs() > worst {
            worst = g.abs();
            best = Some((j, g.signum()));
        }
    }
    best
}

/// Split `normal` into its least-squares coefficients on the active normals
/// and the orthogonal remainder `z`.
fn project_out(
    a: &DMatrix<f64>,
    active: &[Bound],
    normal: &DVector<f64>,
) -> Option<(DVector<f64>, DVector<f64>)> {
    if active.is_empty() {
        return Some((DVector::zeros(0), normal.clone()));
    }
    let mut normals = DMatrix::<f64>::zeros(a.nrows(), active.len());
    for (k, bnd) in active.iter().enumerate() {
        normals.set_column(k, &(a.column(bnd.col) * (-bnd.sign)));
    }

    let qr = normals.clone().qr();
    let q = qr.q();
    let coef = qr.r().solve_upper_triangular(&(q.transpose() * normal))?;
    let z = normal - &normals * &coef;
    Some((coef, z))
}

fn finish(p: usize, active: &[Bound], iterations: usize, converged: bool) -> LassoSolution {
    let mut w = DVector::<f64>::zeros(p);
    for bnd in active {
        w[bnd.col] = bnd.sign * bnd.mult;
    }
    LassoSolution {
        w,
        iterations,
        converged,
    }
}

/// Largest violation of the lasso optimality conditions at `w`.
///
/// With `g = Aᵀ(b - A w) / n`: `|g_j - λ sign(w_j)|` on the support and
/// `max(|g_j| - λ, 0)` elsewhere. Zero means `w` is a minimizer.
pub fn kkt_violation(a: &DMatrix<f64>, b: &DVector<f64>, w: &DVector<f64>, lambda: f64) -> f64 {
    let inv_n = 1.0 / a.nrows().max(1) as f64;
    let grad = a.transpose() * (b - a * w) * inv_n;
    grad.iter()
        .zip(w.iter())
        .map(|(g, wj)| {
            if *wj != 0.0 {
                (g - lambda * wj.signum()).abs()
            } else {
                (g.abs() - lambda).max(0.0)
            }
        })
        .fold(0.0, f64::max)
}

/// Smallest `λ` for which the lasso solution is identically zero.
pub fn lambda_max(a: &DMatrix<f64>, b: &DVector<f64>) -> f64 {
    let inv_n = 1.0 / a.nrows().max(1) as f64;
    (a.transpose() * b).amax() * inv_n
}
