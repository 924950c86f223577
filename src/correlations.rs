//! The Moody (Darcy) friction factor.

use crate::solver::solve_scalar;

/// Laminar-flow cutoff Reynolds number.
const RE_LAMINAR: f64 = 2300.0;

/// Moody friction factor for a given Reynolds number and relative roughness.
///
/// Laminar flow (`re < 2300`) is the closed-form `64/re`. Turbulent flow
/// solves the Colebrook equation
/// `1/sqrt(f) = -2 log10(r/3.72 + 2.51/(re sqrt(f)))`
/// for `f`, bracketed on `(1e-5, 1.0)` starting from the textbook guess of
/// `0.02`.
pub fn moody(re: f64, roughness: f64) -> f64 {
    if re < RE_LAMINAR {
        return 64.0 / re;
    }

    let colebrook = |f: f64| {
        let inv_sqrt_f = 1.0 / f.sqrt();
        -2.0 * (roughness / 3.72 + 2.51 / (re * f.sqrt())).log10() - inv_sqrt_f
    };

    solve_scalar(1e-5, 1.0, colebrook).unwrap_or(0.02)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn laminar_matches_closed_form() {
        let re = 1000.0;
        assert_float_eq!(moody(re, 0.01), 64.0 / re, rel <= 1e-3);
    }

    #[test]
    fn turbulent_matches_reference_value() {
        assert_float_eq!(moody(5000.0, 0.01), 0.0472, rel <= 1e-3);
    }

    #[test]
    fn laminar_decreases_with_reynolds() {
        assert!(moody(1000.0, 0.01) > moody(2000.0, 0.01));
    }
}
