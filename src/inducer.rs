//! Station 1 (inducer inlet) and station 2 (impeller inlet) solve.
//!
//! Grounded on `examples/original_source/radcompressor/inducer.py`: the
//! inlet speed is a one-variable mass-balance root-find, the inducer
//! passage is a two-variable coupled solve (mass balance plus a Moody
//! friction pressure-drop) against the inlet total state.

use crate::correlations::moody;
use crate::geometry::Geometry;
use crate::condition::OperatingCondition;
use crate::solver::{sentinel, solve_n};
use crate::station::Station;
use crate::thermo::{static_from_total, Fluid, Pair};

/// Marker returned when the inducer cannot pass the prescribed mass flow.
#[derive(Debug, Clone, Copy)]
pub struct Choke;

/// The converged inducer solve: inlet (station 1) and impeller-entry
/// (station 2) conditions, plus the passage's isentropic efficiency.
pub struct InducerResult<'f> {
    pub inlet: Station<'f>,
    pub outlet: Station<'f>,
    /// Isentropic enthalpy rise across the passage, J/kg
    pub dh0s: f64,
    pub eff: f64,
}

/// Solve the inducer passage for the given geometry and operating point.
///
/// `heat` is an optional heat addition rate, J/s, added to the working
/// fluid between station 1 and station 2 (zero for an adiabatic inducer).
pub fn solve<'f>(
    geom: &Geometry,
    op: &OperatingCondition,
    fluid: &'f dyn Fluid,
    heat: f64,
) -> Result<InducerResult<'f>, Choke> {
    let in_total = fluid.thermo_prop(Pair::PT, op.p_in, op.t_in).map_err(|_| Choke)?;

    let a1_eff = geom.a1_eff();
    let c1_guess = op.m_dot / a1_eff / in_total.d;
    if c1_guess / in_total.a > 1.5 {
        return Err(Choke);
    }

    let resolve_c1 = |x: &[f64]| {
        let c1 = x[0];
        vec![sentinel(static_from_total(&in_total, c1), |stat1| {
            (op.m_dot - a1_eff * c1 * stat1.d) / op.m_dot
        })]
    };
    let sol1 = solve_n(&[c1_guess], resolve_c1, 100).map_err(|_| Choke)?;
    if sol1.residual_norm_inf > 1e-3 {
        return Err(Choke);
    }
    let c1 = sol1.x[0];

    let static1 = static_from_total(&in_total, c1).map_err(|_| Choke)?;
    let m_abs1 = c1 / static1.a;

    let a2_eff = geom.a2_eff();
    if m_abs1 * a1_eff / a2_eff >= 0.99 {
        return Err(Choke);
    }

    let c2_guess = op.m_dot / a2_eff / static1.d;
    let re_g = c2_guess * 2.0 * geom.r2s * static1.d / static1.v;
    let cf_g = moody(re_g, geom.rug_ind / (2.0 * geom.r2s));
    let dp_guess = 4.0 * cf_g * geom.l_ind * c2_guess * c2_guess / (4.0 * geom.r2s) * static1.d;
    let pout_guess = in_total.p - dp_guess;

    let resolve_out = |x: &[f64]| {
        let (c2, pout) = (x[0], x[1]);
        let attempt = || -> Result<(f64, f64), crate::thermo::EosError> {
            let tot2 = fluid.thermo_prop(Pair::PH, pout, in_total.h + heat / op.m_dot)?;
            let stat2 = static_from_total(&tot2, c2)?;
            let err2 = (op.m_dot - a2_eff * c2 * stat2.d) / op.m_dot;

            let re = c2 * 2.0 * geom.r2s * stat2.d / stat2.v;
            let cf = moody(re, geom.rug_ind / (2.0 * geom.r2s));
            let dp = 4.0 * cf * geom.l_ind * c2 * c2 / (4.0 * geom.r2s) * stat2.d;
            let pout_calc = in_total.p - dp;
            let err3 = (pout_calc - tot2.p) / in_total.p;
            Ok((err2, err3))
        };
        match attempt() {
            Ok((e2, e3)) => vec![e2, e3],
            Err(_) => vec![crate::solver::SENTINEL, crate::solver::SENTINEL],
        }
    };
    let sol2 = solve_n(&[c2_guess, pout_guess], resolve_out, 100).map_err(|_| Choke)?;
    if sol2.residual_norm_inf > 1e-3 {
        return Err(Choke);
    }
    let (c2, pout) = (sol2.x[0], sol2.x[1]);

    let out_total = fluid
        .thermo_prop(Pair::PH, pout, in_total.h + heat / op.m_dot)
        .map_err(|_| Choke)?;
    let out_isentropic = fluid
        .thermo_prop(Pair::PS, pout, in_total.s)
        .map_err(|_| Choke)?;
    let out_static = static_from_total(&out_total, c2).map_err(|_| Choke)?;

    let inlet = Station {
        total: in_total,
        static_state: static1,
        isentropic: None,
        c: c1,
        alpha: 0.0,
        a_eff: a1_eff,
        m_abs: m_abs1,
    };

    let outlet = Station {
        total: out_total,
        static_state: out_static,
        isentropic: Some(out_isentropic),
        c: c2,
        alpha: 0.0,
        a_eff: a2_eff,
        m_abs: c2 / out_static.a,
    };

    let eff = outlet.isentropic_efficiency(inlet.total.h).unwrap();
    let dh0s = out_isentropic.h - inlet.total.h;

    Ok(InducerResult {
        inlet,
        outlet,
        dh0s,
        eff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluids::reference::CubicGas;

    fn sample_geometry() -> Geometry {
        Geometry {
            r1: 0.03,
            r2h: 0.015,
            r2s: 0.035,
            r4: 0.06,
            r5: 0.09,
            b4: 0.006,
            b5: 0.006,
            beta2: -35.0,
            beta2s: -55.0,
            beta4: -40.0,
            alpha2: 0.0,
            n_blades: 9,
            n_splits: 9,
            blade_e: 0.5e-3,
            clearance: 0.3e-3,
            backface: 0.5e-3,
            rug_imp: 3e-6,
            rug_ind: 3e-6,
            l_ind: 0.1,
            l_comp: 0.05,
            blockage: [1.0, 0.98, 0.95, 0.92, 0.98],
        }
    }

    #[test]
    fn converges_at_a_modest_flow() {
        let geom = sample_geometry();
        let op = OperatingCondition::new(101_325.0, 288.15, 3000.0, 0.3);
        let gas = CubicGas::air();
        let result = solve(&geom, &op, &gas, 0.0);
        assert!(result.is_ok(), "expected a converged inducer solve");
        let r = result.unwrap();
        assert!(r.outlet.total.p < r.inlet.total.p, "friction should drop total pressure");
        assert!(r.dh0s.is_finite());
    }

    #[test]
    fn chokes_at_an_excessive_flow() {
        let geom = sample_geometry();
        let op = OperatingCondition::new(101_325.0, 288.15, 3000.0, 50.0);
        let gas = CubicGas::air();
        assert!(solve(&geom, &op, &gas, 0.0).is_err());
    }
}
