//! A corresponding-states cubic equation of state (Peng-Robinson), usable as
//! a [`Fluid`] with no native dependency.
//!
//! Directly generalizes `rtbo-realgas-rs`'s `EquationOfState`/`Molecule`
//! machinery: the `a`/`b`/`z_polyn` coefficients are the teacher's own
//! Peng-Robinson formulas, inverted here to answer all four single-phase
//! `Pair` queries instead of only `(P, T) -> Z`. This back-end has no
//! saturation model, so `TQ`/`PQ` always fail, and any query that only has
//! a solution on the liquid branch fails too (the gas-branch root solve
//! simply does not converge).

use std::f64::consts::SQRT_2;

use crate::solver::{solve_n, solve_scalar};
use crate::thermo::{EosError, Fluid, FluidLimits, Pair, Phase, ThermoProp};

/// Universal gas constant, J/(mol.K)
const R: f64 = 8.31446262;
/// Reference temperature for the ideal-gas enthalpy/entropy datum, K
const T0: f64 = 298.15;
/// Reference pressure for the ideal-gas entropy datum, Pa
const P0: f64 = 101_325.0;

/// A single corresponding-states substance, evaluated with the
/// Peng-Robinson equation of state and a constant ideal-gas specific heat.
#[derive(Debug, Clone, Copy)]
pub struct CubicGas {
    pub name: &'static str,
    /// Molar mass, kg/mol
    pub molar_mass: f64,
    /// Critical pressure, Pa
    pub pc: f64,
    /// Critical temperature, K
    pub tc: f64,
    /// Acentric factor
    pub w: f64,
    /// Ideal-gas specific heat at constant pressure, J/(kg.K)
    pub cp0: f64,
    /// Reference dynamic viscosity, Pa.s, at `t_ref`
    pub mu_ref: f64,
    /// Reference temperature for the viscosity power law, K
    pub t_ref: f64,
}

impl CubicGas {
    /// Dry air, treated as a single pseudo-substance.
    pub const fn air() -> Self {
        CubicGas {
            name: "air",
            molar_mass: 0.0289647,
            pc: 3.786e6,
            tc: 132.65,
            w: 0.035,
            cp0: 1005.0,
            mu_ref: 1.81e-5,
            t_ref: 293.15,
        }
    }

    /// Nitrogen.
    pub const fn nitrogen() -> Self {
        CubicGas {
            name: "N2",
            molar_mass: 0.0280134,
            pc: 3.39e6,
            tc: 126.2,
            w: 0.037,
            cp0: 1040.0,
            mu_ref: 1.76e-5,
            t_ref: 293.15,
        }
    }

    /// Carbon dioxide.
    pub const fn co2() -> Self {
        CubicGas {
            name: "CO2",
            molar_mass: 0.0440095,
            pc: 7.375e6,
            tc: 304.13,
            w: 0.225,
            cp0: 845.0,
            mu_ref: 1.47e-5,
            t_ref: 293.15,
        }
    }

    fn specific_r(&self) -> f64 {
        R / self.molar_mass
    }

    /// The attraction parameter `a(T)` (Peng-Robinson).
    fn a_param(&self, t: f64) -> f64 {
        let m = if self.w <= 0.491 {
            0.37464 + 1.56226 * self.w - 0.26992 * self.w * self.w
        } else {
            0.379642 + 1.487503 * self.w - 0.164423 * self.w * self.w
                + 0.016666 * self.w * self.w * self.w
        };
        let alpha = 1.0 + m * (1.0 - (t / self.tc).sqrt());
        let alpha = alpha * alpha;
        alpha * 0.4572355289213821 * R * R * self.tc * self.tc / self.pc
    }

    /// The covolume parameter `b` (temperature-independent).
    fn b_param(&self) -> f64 {
        0.07779607390388844 * R * self.tc / self.pc
    }

    fn da_dt(&self, t: f64) -> f64 {
        let h = 1e-3 * t;
        (self.a_param(t + h) - self.a_param(t - h)) / (2.0 * h)
    }

    /// Solve the cubic `Z^3 + a2 Z^2 + a1 Z + a0 = 0` for the gas-branch
    /// (largest) real root at the given `(P, T)`.
    fn compressibility(&self, p: f64, t: f64) -> Result<f64, EosError> {
        let a = self.a_param(t) * p / (R * R * t * t);
        let b = self.b_param() * p / (R * t);

        let poly = move |z: f64| z.powi(3) + (b - 1.0) * z * z + (a - 3.0 * b * b - 2.0 * b) * z
            + (b * b * b + b * b - a * b);

        solve_scalar(b * 1.0001, 1000.0, poly).map_err(|_| {
            EosError::out_of_range(
                Pair::PT,
                p,
                t,
                format!("{}: no gas-branch root at this (P, T)", self.name),
            )
        })
    }

    /// Specific enthalpy and entropy (mass basis) at a known `(P, T, Z)`.
    fn h_s(&self, p: f64, t: f64, z: f64) -> (f64, f64) {
        let a = self.a_param(t);
        let b = self.b_param();
        let da_dt = self.da_dt(t);
        let bb = b * p / (R * t);

        let log_term = ((z + (1.0 + SQRT_2) * bb) / (z + (1.0 - SQRT_2) * bb)).ln();
        let dep_h = R * t * (z - 1.0) + (t * da_dt - a) / (2.0 * SQRT_2 * b) * log_term;
        let dep_s = R * (z - bb).ln() + da_dt / (2.0 * SQRT_2 * b) * log_term;

        let rs = self.specific_r();
        let h_ig = self.cp0 * (t - T0);
        let s_ig = self.cp0 * (t / T0).ln() - rs * (p / P0).ln();

        (h_ig + dep_h / self.molar_mass, s_ig + dep_s / self.molar_mass)
    }

    fn speed_of_sound(&self, t: f64) -> f64 {
        let rs = self.specific_r();
        let gamma = self.cp0 / (self.cp0 - rs);
        (gamma * rs * t).sqrt()
    }

    fn viscosity(&self, t: f64) -> f64 {
        self.mu_ref * (t / self.t_ref).powf(0.7)
    }

    fn phase_at(&self, p: f64, t: f64) -> Phase {
        match (t > self.tc, p > self.pc) {
            (true, true) => Phase::Supercritical,
            (true, false) => Phase::SupercriticalGas,
            _ => Phase::Gas,
        }
    }

    fn prop_at_pt(&self, p: f64, t: f64) -> Result<(f64, f64, f64, f64), EosError> {
        let z = self.compressibility(p, t)?;
        let d = p / (z * self.specific_r() * t);
        let (h, s) = self.h_s(p, t, z);
        Ok((d, h, s, z))
    }

    fn build<'f>(&'f self, p: f64, t: f64, d: f64, h: f64, s: f64) -> ThermoProp<'f> {
        ThermoProp::new(
            self,
            p,
            t,
            d,
            h,
            s,
            self.speed_of_sound(t),
            self.viscosity(t),
            self.phase_at(p, t),
        )
    }
}

impl Fluid for CubicGas {
    fn thermo_prop(&self, pair: Pair, v1: f64, v2: f64) -> Result<ThermoProp<'_>, EosError> {
        match pair {
            Pair::PT => {
                let (p, t) = (v1, v2);
                let (d, h, s, _z) = self.prop_at_pt(p, t)?;
                Ok(self.build(p, t, d, h, s))
            }
            Pair::PH => {
                let (p, h_target) = (v1, v2);
                let residual = |t: f64| {
                    match self.prop_at_pt(p, t) {
                        Ok((_, h, _, _)) => h - h_target,
                        Err(_) => crate::solver::SENTINEL,
                    }
                };
                let t = solve_scalar(30.0, 2000.0, residual).map_err(|_| {
                    EosError::out_of_range(pair, v1, v2, "no gas-branch solution for PH")
                })?;
                let (d, h, s, _z) = self.prop_at_pt(p, t)?;
                Ok(self.build(p, t, d, h, s))
            }
            Pair::PS => {
                let (p, s_target) = (v1, v2);
                let residual = |t: f64| match self.prop_at_pt(p, t) {
                    Ok((_, _, s, _)) => s - s_target,
                    Err(_) => crate::solver::SENTINEL,
                };
                let t = solve_scalar(30.0, 2000.0, residual).map_err(|_| {
                    EosError::out_of_range(pair, v1, v2, "no gas-branch solution for PS")
                })?;
                let (d, h, s, _z) = self.prop_at_pt(p, t)?;
                Ok(self.build(p, t, d, h, s))
            }
            Pair::HS => {
                let (h_target, s_target) = (v1, v2);
                let result = solve_n(
                    &[T0 * 1.2, P0 * 2.0],
                    |x| {
                        let (t, p) = (x[0], x[1]);
                        if t <= 1.0 || p <= 1.0 {
                            return vec![crate::solver::SENTINEL, crate::solver::SENTINEL];
                        }
                        match self.prop_at_pt(p, t) {
                            Ok((_, h, s, _)) => vec![h - h_target, s - s_target],
                            Err(_) => vec![crate::solver::SENTINEL, crate::solver::SENTINEL],
                        }
                    },
                    100,
                )
                .map_err(|_| EosError::out_of_range(pair, v1, v2, "no gas-branch solution for HS"))?;

                let (t, p) = (result.x[0], result.x[1]);
                let (d, h, s, _z) = self.prop_at_pt(p, t)?;
                Ok(self.build(p, t, d, h, s))
            }
            Pair::TQ | Pair::PQ => Err(EosError::out_of_range(
                pair,
                v1,
                v2,
                format!("{}: reference backend has no saturation model", self.name),
            )),
        }
    }

    fn limits(&self) -> FluidLimits {
        FluidLimits {
            p_max: 1e8,
            t_max: 2000.0,
            p_crit: self.pc,
            t_crit: self.tc,
            p_triple: 1.0,
            t_triple: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn pt_roundtrips_through_ph() {
        let gas = CubicGas::air();
        let tp = gas.thermo_prop(Pair::PT, 5e5, 350.0).unwrap();
        let back = gas.thermo_prop(Pair::PH, tp.p, tp.h).unwrap();
        assert_float_eq!(back.t, tp.t, rel <= 1e-3);
        assert_float_eq!(back.d, tp.d, rel <= 1e-3);
    }

    #[test]
    fn pt_roundtrips_through_ps() {
        let gas = CubicGas::nitrogen();
        let tp = gas.thermo_prop(Pair::PT, 3e5, 280.0).unwrap();
        let back = gas.thermo_prop(Pair::PS, tp.p, tp.s).unwrap();
        assert_float_eq!(back.t, tp.t, rel <= 1e-3);
    }

    #[test]
    fn density_increases_with_pressure() {
        let gas = CubicGas::air();
        let lo = gas.thermo_prop(Pair::PT, 1e5, 300.0).unwrap();
        let hi = gas.thermo_prop(Pair::PT, 5e5, 300.0).unwrap();
        assert!(hi.d > lo.d);
    }

    #[test]
    fn saturation_queries_are_out_of_range() {
        let gas = CubicGas::air();
        assert!(gas.thermo_prop(Pair::TQ, 290.0, 0.0).is_err());
        assert!(gas.thermo_prop(Pair::PQ, 1e5, 0.0).is_err());
    }
}
