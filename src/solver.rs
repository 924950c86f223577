//! Generic root-finding used by every solver stage.
//!
//! Scalar root-finds (Colebrook, single-unknown mass balances) go through
//! `roots::find_root_brent`. Multi-variable root-finds (the impeller
//! discharge coupling, one step of the diffuser march) go through
//! [`solve_n`], a damped Newton iteration with a finite-difference
//! Jacobian and backtracking line search, in the spirit of
//! `tf-solver::newton` (see `examples/kyleas-thermoflow`): build the
//! Jacobian numerically, solve the linear system with `nalgebra`'s LU
//! (falling back to nothing fancier — this crate's systems are small and
//! well-scaled), and backtrack on the residual norm rather than trust a
//! full Newton step.
//!
//! Every residual closure here returns a plain `f64`/`DVector<f64>`, never
//! a `Result`: per spec section 7, EOS failures inside a residual
//! evaluation are caught locally by the caller and replaced with the
//! saturating sentinel `1e4` so the root-finder steers away rather than
//! aborting. [`sentinel`] is the helper that performs that substitution.

use nalgebra::{DMatrix, DVector};
use roots::{Convergency, SimpleConvergency};
use thiserror::Error;

/// Residual-vector infinity-norm acceptance threshold (spec: 1e-3).
pub const ACCEPTANCE_TOL: f64 = 1e-3;

/// Root-finder internal convergence tolerance (spec: 1e-4).
pub const SOLVE_TOL: f64 = 1e-4;

/// The saturating sentinel substituted for a residual equation whose
/// evaluation hit an EOS failure.
pub const SENTINEL: f64 = 1e4;

#[derive(Debug, Error, Clone)]
pub enum SolverError {
    #[error("root finder did not converge: residual inf-norm {residual_norm:.3e} after {iterations} iterations")]
    NonConvergent { residual_norm: f64, iterations: usize },
    #[error("line search stalled at iteration {iteration}")]
    Stalled { iteration: usize },
    #[error("scalar root bracket invalid: {reason}")]
    BadBracket { reason: String },
}

/// Fold a fallible residual value into a plain `f64`, substituting
/// [`SENTINEL`] on failure.
pub fn sentinel<T, E>(result: Result<T, E>, f: impl FnOnce(T) -> f64) -> f64 {
    match result {
        Ok(v) => f(v),
        Err(_) => SENTINEL,
    }
}

/// Bracketed scalar root-find via Brent's method.
pub fn solve_scalar<F>(lo: f64, hi: f64, f: F) -> Result<f64, SolverError>
where
    F: Fn(f64) -> f64,
{
    let mut conv = SimpleConvergency {
        eps: SOLVE_TOL,
        max_iter: 100,
    };
    roots::find_root_brent(lo, hi, f, &mut conv).map_err(|_| SolverError::NonConvergent {
        residual_norm: f64::NAN,
        iterations: conv.max_iter,
    })
}

/// Result of a multi-variable Newton solve.
pub struct NewtonResult {
    pub x: DVector<f64>,
    pub residual_norm_inf: f64,
    pub iterations: usize,
}

/// Damped Newton solve of `residual(x) = 0` with a finite-difference
/// Jacobian and backtracking line search.
///
/// Acceptance is on the infinity norm of the residual: the caller (every
/// stage solver) treats `residual_norm_inf > ACCEPTANCE_TOL` on return as a
/// choke, matching spec section 4's "any residual > 1e-3 on return -> choke".
pub fn solve_n<F>(x0: &[f64], mut residual: F, max_iter: usize) -> Result<NewtonResult, SolverError>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    let n = x0.len();
    let mut x = DVector::from_row_slice(x0);
    let mut r = DVector::from_row_slice(&residual(x.as_slice()));
    let mut r_norm = inf_norm(&r);

    for iter in 0..max_iter {
        if r_norm <= ACCEPTANCE_TOL * 1e-2 {
            return Ok(NewtonResult {
                x,
                residual_norm_inf: r_norm,
                iterations: iter,
            });
        }

        let jac = finite_diff_jacobian(&x, &mut residual, &r, n);

        let dx = match jac.clone().lu().solve(&(-&r)) {
            Some(dx) => dx,
            None => {
                let svd = jac.svd(true, true);
                let threshold = 1e-10 * svd.singular_values.max().max(1.0);
                match svd.solve(&(-&r), threshold) {
                    Ok(dx) => dx,
                    Err(_) => {
                        return Err(SolverError::NonConvergent {
                            residual_norm: r_norm,
                            iterations: iter,
                        });
                    }
                }
            }
        };

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..30 {
            let x_trial = &x + alpha * &dx;
            let r_trial = DVector::from_row_slice(&residual(x_trial.as_slice()));
            let r_trial_norm = inf_norm(&r_trial);
            if r_trial_norm.is_finite() && r_trial_norm < r_norm {
                accepted = Some((x_trial, r_trial, r_trial_norm));
                break;
            }
            alpha *= 0.5;
        }

        match accepted {
            Some((x_new, r_new, r_new_norm)) => {
                x = x_new;
                r = r_new;
                r_norm = r_new_norm;
            }
            None => {
                return Err(SolverError::Stalled { iteration: iter });
            }
        }
    }

    Ok(NewtonResult {
        x,
        residual_norm_inf: r_norm,
        iterations: max_iter,
    })
}

fn inf_norm(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0_f64, |acc, &x| acc.max(x.abs()))
}

fn finite_diff_jacobian<F>(
    x: &DVector<f64>,
    residual: &mut F,
    r0: &DVector<f64>,
    n: usize,
) -> DMatrix<f64>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    let mut jac = DMatrix::zeros(n, n);
    for j in 0..n {
        let h = 1e-6 * x[j].abs().max(1.0);
        let mut x_pert = x.clone();
        x_pert[j] += h;
        let r_pert = DVector::from_row_slice(&residual(x_pert.as_slice()));
        for i in 0..n {
            jac[(i, j)] = (r_pert[i] - r0[i]) / h;
        }
    }
    jac
}
