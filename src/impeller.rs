//! Impeller solve: inlet relative triangle, incidence loss, throat mass
//! balance, and the four-variable discharge coupling.
//!
//! Grounded on `examples/original_source/radcomp/impeller.py`. The six loss
//! correlations (`skin_friction`, `diffusion_factor`, `blade_loading`,
//! `clearance`, `disc_friction`, `recirculation`) are carried over as
//! free functions rather than methods on a mutable instance, since nothing
//! here needs shared mutable state beyond the values already threaded
//! through `calculate`'s locals.

use std::f64::consts::PI;

use crate::condition::OperatingCondition;
use crate::correlations::moody;
use crate::geometry::Geometry;
use crate::solver::solve_n;
use crate::station::{Losses, RelativeStation, Station};
use crate::thermo::{static_from_total, total_from_static, Fluid, Pair, Phase};

/// Why the impeller solve did not produce a usable operating point.
#[derive(Debug, Clone, Copy)]
pub enum ImpellerFailure {
    /// A mass-flow or mass-flow/angle root-find failed to converge, or a
    /// Mach-number limit was exceeded.
    Choke,
    /// The discharge relative total state resolved inside the two-phase dome.
    Wet,
}

/// The converged impeller solve.
pub struct ImpellerResult<'f> {
    pub inlet: RelativeStation<'f>,
    pub throat: RelativeStation<'f>,
    pub outlet: RelativeStation<'f>,
    pub losses: Losses,
    pub dh0s: f64,
    pub eff: f64,
}

fn skin_friction_losses(geom: &Geometry, w_avg: f64, d_avg: f64, v_avg: f64) -> f64 {
    let (dh, lh) = geom.hydraulic_diameter();
    let re = dh * w_avg * d_avg / v_avg;
    let cf = moody(re, geom.rug_imp / dh);
    4.0 * cf * lh * w_avg * w_avg / (2.0 * dh)
}

#[allow(clippy::too_many_arguments)]
fn diffusion_factor(geom: &Geometry, out_h: f64, w4: f64, wx: f64, omega: f64) -> f64 {
    let (_, lh) = geom.hydraulic_diameter();
    let dh_aero = out_h / (omega * geom.r4).powi(2);
    1.0 - w4 / wx
        + PI * geom.r4.powi(2) * dh_aero * omega
            / ((geom.n_blades + geom.n_splits) as f64 * lh * wx)
        + 0.1 * (geom.r2s - geom.r2h + geom.b4) / 2.0 / (geom.r4 - geom.r2s) * (1.0 + w4 / wx)
}

fn blade_loading_losses(geom: &Geometry, df: f64, omega: f64) -> f64 {
    0.05 * df * df * (omega * geom.r4).powi(2)
}

#[allow(clippy::too_many_arguments)]
fn clearance_losses(geom: &Geometry, tp4_d: f64, in2_d: f64, in2_c: f64, c4t: f64, omega: f64) -> f64 {
    let c4t = c4t.abs();
    let tip_speed = omega * geom.r4;
    let inner = 4.0 * PI / geom.b4 / geom.n_blades as f64 * c4t * in2_c * geom.alpha2.to_radians().cos()
        / tip_speed.powi(2)
        * (geom.r2s.powi(2) - geom.r2h.powi(2))
        / ((geom.r4 - geom.r2s) * (1.0 + tp4_d / in2_d));
    0.6 * geom.clearance / geom.b4 * c4t / tip_speed * inner.max(0.0).sqrt() * tip_speed.powi(2)
}

fn disc_friction_losses(geom: &Geometry, tp4_d: f64, tp4_v: f64, m_dot: f64, omega: f64) -> f64 {
    let re_y = 2.0 * omega * geom.r4.powi(2) * tp4_d / tp4_v;
    let kf = if re_y > 3e5 {
        0.102 * (geom.backface / geom.r4).powf(0.1) / re_y.powf(0.2)
    } else {
        3.7 * (geom.backface / geom.r4).powf(0.1) / re_y.powf(0.5)
    };
    0.25 * tp4_d * omega * geom.r4.powi(3) * kf / m_dot * (omega * geom.r4).powi(2)
}

fn recirculation_losses(geom: &Geometry, df: f64, alpha: f64, omega: f64) -> f64 {
    0.02 * df * df * alpha.to_radians().abs().tan() * (omega * geom.r4).powi(2)
}

/// Solve the impeller for the converged inducer outlet (impeller inlet)
/// station.
pub fn solve<'f>(
    geom: &Geometry,
    op: &OperatingCondition,
    fluid: &'f dyn Fluid,
    inducer_outlet: Station<'f>,
) -> Result<ImpellerResult<'f>, ImpellerFailure> {
    let alpha2 = geom.alpha2.to_radians();
    let c2 = inducer_outlet.c;
    let c2_theta = c2 * alpha2.sin();
    let c2_m = c2 * alpha2.cos();

    let w2t_s = geom.r2s * op.omega - c2_theta;
    let beta2_fs = -(w2t_s / c2_m).atan().to_degrees();
    let w2_s = c2_m / beta2_fs.to_radians().cos();

    let w2t = geom.r2rms() * op.omega - c2_theta;
    let beta2_f = -(w2t / c2_m).atan().to_degrees();
    let w2 = c2_m / beta2_f.to_radians().cos();

    let in2_relative =
        total_from_static(&inducer_outlet.static_state, w2).map_err(|_| ImpellerFailure::Wet)?;

    let m_rel2 = w2 / inducer_outlet.static_state.a;
    let m_rels2 = w2_s / inducer_outlet.static_state.a;
    if m_rel2 >= 0.99 {
        return Err(ImpellerFailure::Choke);
    }

    let beta2_opt = geom.beta2_opt();
    let dh_inc = 0.5
        * (w2 * (beta2_f.abs() - beta2_opt.abs()).abs().to_radians().sin()).powi(2);

    let rel3_temp = fluid
        .thermo_prop(Pair::HS, in2_relative.h - dh_inc, in2_relative.s)
        .map_err(|_| ImpellerFailure::Choke)?;
    let in3_relative = fluid
        .thermo_prop(Pair::PH, rel3_temp.p, in2_relative.h)
        .map_err(|_| ImpellerFailure::Choke)?;

    let a_y = geom.a_y();
    let resolve_static = |x: &[f64]| {
        let w = x[0];
        match static_from_total(&in2_relative, w) {
            Ok(stat3) => vec![(op.m_dot - a_y * w * stat3.d) / op.m_dot],
            Err(_) => vec![crate::solver::SENTINEL],
        }
    };
    let w3_guess = 0.65 * in2_relative.a;
    let sol3 = solve_n(&[w3_guess], resolve_static, 100).map_err(|_| ImpellerFailure::Choke)?;
    if sol3.residual_norm_inf > 1e-3 {
        return Err(ImpellerFailure::Choke);
    }
    let w3_throat = sol3.x[0];
    let in3_static =
        static_from_total(&in2_relative, w3_throat).map_err(|_| ImpellerFailure::Choke)?;

    let c3_m = c2_m * geom.a_x() / a_y;
    let c3 = c3_m / alpha2.cos();
    let m_rel3 = w3_throat / in3_static.a;
    let m_abs3 = c3 / in3_static.a;
    let in3_total = total_from_static(&in3_static, c3).map_err(|_| ImpellerFailure::Choke)?;

    let h4_rel = 0.5 * ((geom.r4 * op.omega).powi(2) - (geom.r2rms() * op.omega).powi(2))
        + in2_relative.h;
    let tp4_rel = fluid
        .thermo_prop(Pair::HS, h4_rel, in2_relative.s)
        .map_err(|_| ImpellerFailure::Choke)?;
    if tp4_rel.phase == Phase::TwoPhase {
        return Err(ImpellerFailure::Wet);
    }

    let a4_total = 2.0 * PI * geom.r4 * geom.b4 * geom.blockage[3];

    let discharge_residual = |x: &[f64]| -> Vec<f64> {
        let (beta4_f, w4, dh_losses, p4_rel) = (x[0], x[1], x[2], x[3]);
        let attempt = || -> Result<[f64; 4], crate::thermo::EosError> {
            let dh_lo = dh_losses.max(0.0);
            let p4r = if p4_rel <= 0.0 { tp4_rel.p } else { p4_rel };

            let tp4_r = fluid.thermo_prop(Pair::PH, p4r, h4_rel + dh_lo)?;
            let a4_rel = a4_total * beta4_f.to_radians().cos();
            let tp4_stat = static_from_total(&tp4_r, w4)?;
            let err0 = (op.m_dot - a4_rel * w4 * tp4_stat.d) / op.m_dot;

            let c4m = op.m_dot / a4_total / tp4_stat.d;
            let c4t = c4m * geom.beta4.to_radians().tan() + geom.slip() * (geom.r4 * op.omega);
            let w4t = geom.r4 * op.omega - c4t;
            let w4_new = (w4t * w4t + c4m * c4m).sqrt();
            let beta4_f_new = -(w4t / w4_new).asin().to_degrees();
            let err1 = (beta4_f_new - beta4_f) / 60.0;

            let c4 = (c4t * c4t + c4m * c4m).sqrt();
            let alpha = (c4t / c4m).atan().to_degrees();

            let tp4_tot = total_from_static(&tp4_stat, c4)?;
            let out_h = tp4_tot.h - inducer_outlet.total.h;
            let df = diffusion_factor(geom, out_h, w4, w2, op.omega);

            let dh_sf = skin_friction_losses(
                geom,
                (w2 + w4) / 2.0,
                (inducer_outlet.static_state.d + tp4_stat.d) / 2.0,
                (inducer_outlet.static_state.v + tp4_stat.v) / 2.0,
            );
            let dh_bl = blade_loading_losses(geom, df, op.omega);
            let dh_cl = clearance_losses(
                geom,
                tp4_stat.d,
                inducer_outlet.static_state.d,
                c2,
                c4t,
                op.omega,
            );
            let dh_losses_int = dh_sf + dh_bl + dh_cl + dh_inc;

            let dh_df = disc_friction_losses(geom, tp4_stat.d, tp4_stat.v, op.m_dot, op.omega);
            let dh_r = recirculation_losses(geom, df, alpha, op.omega);
            let dh_losses_ext = dh_df + dh_r;

            let err2 = (dh_losses_ext - dh_losses) / in2_relative.h;

            let tp4_temp = fluid.thermo_prop(Pair::HS, h4_rel - dh_losses_int, in2_relative.s)?;
            let err3 = (tp4_temp.p - tp4_r.p) / in2_relative.p + (p4_rel - p4r).abs();

            Ok([err0, err1, err2, err3])
        };
        match attempt() {
            Ok(errs) => errs.to_vec(),
            Err(_) => vec![crate::solver::SENTINEL; 4],
        }
    };

    let beta4_f0 = geom.beta4 - 10.0;
    let a4_rel0 = a4_total * beta4_f0.to_radians().cos();
    let w4_guess = op.m_dot / a4_rel0 / tp4_rel.d;
    let dh_df_guess = disc_friction_losses(geom, tp4_rel.d, tp4_rel.v, op.m_dot, op.omega);

    let sol4 = solve_n(
        &[beta4_f0, w4_guess, dh_df_guess, tp4_rel.p],
        discharge_residual,
        150,
    )
    .map_err(|_| ImpellerFailure::Choke)?;
    if sol4.residual_norm_inf > 1e-3 {
        return Err(ImpellerFailure::Choke);
    }

    let (beta4_f, w4, dh_losses, p4_rel) = (sol4.x[0], sol4.x[1], sol4.x[2], sol4.x[3]);

    let out_relative = fluid
        .thermo_prop(Pair::PH, p4_rel, h4_rel + dh_losses)
        .map_err(|_| ImpellerFailure::Choke)?;
    let out_static = static_from_total(&out_relative, w4).map_err(|_| ImpellerFailure::Choke)?;

    let c4m = op.m_dot / a4_total / out_static.d;
    let c4t = c4m * geom.beta4.to_radians().tan() + geom.slip() * (geom.r4 * op.omega);
    let c4 = (c4t * c4t + c4m * c4m).sqrt();
    let alpha = (c4t / c4m).atan().to_degrees();

    let out_total = total_from_static(&out_static, c4).map_err(|_| ImpellerFailure::Choke)?;
    let out_isentropic = fluid
        .thermo_prop(Pair::PS, out_total.p, inducer_outlet.static_state.s)
        .map_err(|_| ImpellerFailure::Choke)?;

    let out_h = out_total.h - inducer_outlet.total.h;
    let df = diffusion_factor(geom, out_h, w4, w2, op.omega);

    let losses = Losses {
        skin_friction: skin_friction_losses(
            geom,
            (w2 + w4) / 2.0,
            (inducer_outlet.static_state.d + out_static.d) / 2.0,
            (inducer_outlet.static_state.v + out_static.v) / 2.0,
        ),
        blade_loading: blade_loading_losses(geom, df, op.omega),
        clearance: clearance_losses(
            geom,
            out_static.d,
            inducer_outlet.static_state.d,
            c2,
            c4t,
            op.omega,
        ),
        incidence: dh_inc,
        disc_friction: disc_friction_losses(geom, out_static.d, out_static.v, op.m_dot, op.omega),
        recirculation: recirculation_losses(geom, df, alpha, op.omega),
    };

    let m_abs4 = c4 / out_static.a;
    let m_abs_m4 = c4 * alpha.to_radians().cos() / out_static.a;
    let m_rel4 = w4 / out_static.a;

    let outlet = RelativeStation {
        station: Station {
            total: out_total,
            static_state: out_static,
            isentropic: Some(out_isentropic),
            c: c4,
            alpha,
            a_eff: a4_total,
            m_abs: m_abs4,
        },
        relative: out_relative,
        w: w4,
        ws: f64::NAN,
        beta: beta4_f,
        m_rel: m_rel4,
        m_rels: f64::NAN,
        m_abs_m: m_abs_m4,
    };

    let dh0s = out_isentropic.h - inducer_outlet.total.h;
    let eff = out_h / dh0s;

    if m_rel4 >= 0.99 || m_abs_m4 >= 0.99 || out_total.p < inducer_outlet.total.p {
        return Err(ImpellerFailure::Choke);
    }

    let inlet = RelativeStation {
        station: Station {
            total: inducer_outlet.total,
            static_state: inducer_outlet.static_state,
            isentropic: None,
            c: c2,
            alpha: geom.alpha2,
            a_eff: inducer_outlet.a_eff,
            m_abs: inducer_outlet.m_abs,
        },
        relative: in2_relative,
        w: w2,
        ws: w2_s,
        beta: beta2_f,
        m_rel: m_rel2,
        m_rels: m_rels2,
        m_abs_m: f64::NAN,
    };

    let throat = RelativeStation {
        station: Station {
            total: in3_total,
            static_state: in3_static,
            isentropic: None,
            c: c3,
            alpha: geom.alpha2,
            a_eff: a_y,
            m_abs: m_abs3,
        },
        relative: in3_relative,
        w: w3_throat,
        ws: f64::NAN,
        beta: f64::NAN,
        m_rel: m_rel3,
        m_rels: f64::NAN,
        m_abs_m: f64::NAN,
    };

    Ok(ImpellerResult {
        inlet,
        throat,
        outlet,
        losses,
        dh0s,
        eff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluids::mock::MockFluid;
    use crate::fluids::reference::CubicGas;
    use crate::{condition::OperatingCondition, inducer};

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
    fn converges_downstream_of_a_converged_inducer() {
        let geom = sample_geometry();
        let op = OperatingCondition::new(101_325.0, 288.15, 3000.0, 0.3);
        let gas = CubicGas::air();
        let ind = inducer::solve(&geom, &op, &gas, 0.0).expect("inducer should converge");
        let result = solve(&geom, &op, &gas, ind.outlet);
        if let Err(ImpellerFailure::Choke) = &result {
            // Some geometry/operating-point combinations are legitimately
            // infeasible; this still exercises the full discharge solve path.
            return;
        }
        let r = result.expect("expected convergence or a choke flag");
        assert!(r.outlet.total.p > r.inlet.total.p, "impeller should raise total pressure");
        assert!(r.losses.total() > 0.0);
    }

    #[test]
    fn two_phase_relative_stagnation_at_discharge_sets_wet() {
        let geom = sample_geometry();
        let op = OperatingCondition::new(101_325.0, 288.15, 3000.0, 0.3);
        let gas = CubicGas::air();
        let ind = inducer::solve(&geom, &op, &gas, 0.0).expect("inducer should converge");

        // Replicate `solve`'s own relative-triangle math up to `h4_rel` so the
        // mock's threshold sits just below the station-4 query it needs to
        // intercept, and above every earlier `HS` query in the same solve.
        let alpha2 = geom.alpha2.to_radians();
        let c2 = ind.outlet.c;
        let c2_theta = c2 * alpha2.sin();
        let c2_m = c2 * alpha2.cos();
        let w2t = geom.r2rms() * op.omega - c2_theta;
        let beta2_f = -(w2t / c2_m).atan().to_degrees();
        let w2 = c2_m / beta2_f.to_radians().cos();
        let in2_h = ind.outlet.static_state.h + 0.5 * w2 * w2;
        let h4_rel =
            0.5 * ((geom.r4 * op.omega).powi(2) - (geom.r2rms() * op.omega).powi(2)) + in2_h;

        let mock = MockFluid::new(&gas, h4_rel - 1.0);
        let result = solve(&geom, &op, &mock, ind.outlet);
        assert!(matches!(result, Err(ImpellerFailure::Wet)));
    }
}
