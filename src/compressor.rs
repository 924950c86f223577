//! The orchestrator: chains inducer, impeller, and vaneless-diffuser
//! solves into one operating-point evaluation, then derives the
//! machine-level performance metrics.
//!
//! Grounded on `examples/original_source/radcompressor/compressor.py`.
//! Mirrors the original's `Compressor.calculate() -> bool` contract rather
//! than returning a `Result`: a populated [`CompressorResult`] with boolean
//! flags (`valid`, `choke`, `wet`, `surge`) is more useful to a caller
//! sweeping an operating map than an error that discards partial context,
//! and it matches how every stage already reports its own failure (choke
//! vs. wet are distinct outcomes, not one generic error).

use crate::condition::OperatingCondition;
use crate::diffuser::{self, surge_critical_angle};
use crate::geometry::Geometry;
use crate::impeller::{self, ImpellerFailure};
use crate::inducer;
use crate::station::Station;
use crate::thermo::{Fluid, Pair};

/// One evaluated operating point.
///
/// When `valid` is `false`, the numeric fields beyond the bookkeeping ones
/// (`tip_speed`, `n_rot_corr`, `v_in`, `flow`) are not meaningful and
/// `inlet`/`outlet` are `None`.
pub struct CompressorResult<'f> {
    pub valid: bool,
    pub choke: bool,
    pub wet: bool,
    pub surge: bool,

    pub inlet: Option<Station<'f>>,
    pub outlet: Option<Station<'f>>,

    pub eff: f64,
    pub dh0s: f64,
    pub pr: f64,
    pub power: f64,
    pub m_in: f64,
    pub ns: f64,
    pub ds: f64,
    pub head: f64,
    pub d_head_d_flow: f64,

    pub tip_speed: f64,
    pub n_rot_corr: f64,
    pub v_in: f64,
    pub flow: f64,
}

impl<'f> CompressorResult<'f> {
    fn invalid(bookkeeping: Bookkeeping, choke: bool, wet: bool, surge: bool) -> Self {
        CompressorResult {
            valid: false,
            choke,
            wet,
            surge,
            inlet: None,
            outlet: None,
            eff: f64::NAN,
            dh0s: f64::NAN,
            pr: f64::NAN,
            power: f64::NAN,
            m_in: f64::NAN,
            ns: f64::NAN,
            ds: f64::NAN,
            head: f64::NAN,
            d_head_d_flow: f64::NAN,
            tip_speed: bookkeeping.tip_speed,
            n_rot_corr: bookkeeping.n_rot_corr,
            v_in: bookkeeping.v_in,
            flow: bookkeeping.flow,
        }
    }
}

#[derive(Clone, Copy)]
struct Bookkeeping {
    tip_speed: f64,
    n_rot_corr: f64,
    v_in: f64,
    flow: f64,
}

fn bookkeeping(geom: &Geometry, op: &OperatingCondition, in0_d: f64, in0_a: f64) -> Bookkeeping {
    let tip_speed = geom.r4 * op.omega;
    Bookkeeping {
        tip_speed,
        n_rot_corr: tip_speed / in0_a,
        v_in: op.m_dot / in0_d,
        flow: (op.m_dot / in0_d) / (tip_speed * geom.r4 * geom.r4),
    }
}

/// Evaluate one operating point, including the surge-slope check against a
/// perturbed flow rate.
pub fn calculate<'f>(
    geom: &Geometry,
    op: &OperatingCondition,
    fluid: &'f dyn Fluid,
) -> CompressorResult<'f> {
    calculate_inner(geom, op, fluid, true)
}

fn calculate_inner<'f>(
    geom: &Geometry,
    op: &OperatingCondition,
    fluid: &'f dyn Fluid,
    delta_check: bool,
) -> CompressorResult<'f> {
    let in0 = match fluid.thermo_prop(Pair::PT, op.p_in, op.t_in) {
        Ok(tp) => tp,
        Err(_) => {
            return CompressorResult::invalid(
                Bookkeeping { tip_speed: geom.r4 * op.omega, n_rot_corr: f64::NAN, v_in: f64::NAN, flow: f64::NAN },
                true,
                false,
                false,
            )
        }
    };
    let bk = bookkeeping(geom, op, in0.d, in0.a);

    let ind = match inducer::solve(geom, op, fluid, 0.0) {
        Ok(ind) => ind,
        Err(_) => return CompressorResult::invalid(bk, true, false, false),
    };

    let imp = match impeller::solve(geom, op, fluid, ind.outlet) {
        Ok(imp) => imp,
        Err(ImpellerFailure::Choke) => return CompressorResult::invalid(bk, true, false, false),
        Err(ImpellerFailure::Wet) => return CompressorResult::invalid(bk, false, true, false),
    };

    let alpha_crit = surge_critical_angle(geom.r5, geom.r4, geom.b4, imp.outlet.m_abs);
    if imp.outlet.alpha > alpha_crit {
        return CompressorResult::invalid(bk, false, false, true);
    }

    let dif = match diffuser::solve(geom, op, fluid, imp.outlet.station) {
        Ok(dif) => dif,
        Err(_) => return CompressorResult::invalid(bk, true, false, false),
    };

    let dh = dif.outlet.total.h - ind.inlet.total.h;
    let pr = dif.outlet.total.p / ind.inlet.total.p;
    if dh < 0.0 || pr < 1.0 {
        return CompressorResult::invalid(bk, false, false, false);
    }

    let tp_is = match fluid.thermo_prop(Pair::PS, dif.outlet.total.p, ind.inlet.total.s) {
        Ok(tp) => tp,
        Err(_) => return CompressorResult::invalid(bk, true, false, false),
    };
    let dh0s = tp_is.h - ind.inlet.total.h;
    let head = dh0s / (bk.tip_speed * bk.tip_speed);

    let mut d_head_d_flow = f64::NAN;
    if delta_check {
        let mut perturbed = *op;
        perturbed.m_dot *= 1.005;
        let perturbed_result = calculate_inner(geom, &perturbed, fluid, false);
        if perturbed_result.valid {
            d_head_d_flow = (perturbed_result.head - head) / (perturbed_result.flow - bk.flow);
            if d_head_d_flow > -1e-4 {
                return CompressorResult {
                    d_head_d_flow,
                    ..CompressorResult::invalid(bk, false, false, true)
                };
            }
        }
    }

    let eff = dh0s / dh;
    let power = op.m_dot * dh;
    let sqrt_v_in = bk.v_in.sqrt();
    let ns = op.omega * sqrt_v_in / dh0s.powf(0.75);
    let ds = 2.0 * geom.r4 * dh0s.powf(0.25) / sqrt_v_in;

    CompressorResult {
        valid: true,
        choke: false,
        wet: false,
        surge: false,
        inlet: Some(ind.inlet),
        outlet: Some(dif.outlet),
        eff,
        dh0s,
        pr,
        power,
        m_in: ind.outlet.c / in0.a,
        ns,
        ds,
        head,
        d_head_d_flow,
        tip_speed: bk.tip_speed,
        n_rot_corr: bk.n_rot_corr,
        v_in: bk.v_in,
        flow: bk.flow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluids::mock::MockFluid;
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
    fn bookkeeping_fields_are_always_populated() {
        let geom = sample_geometry();
        let op = OperatingCondition::new(101_325.0, 288.15, 3000.0, 0.3);
        let gas = CubicGas::air();
        let result = calculate(&geom, &op, &gas);
        assert!(result.tip_speed > 0.0);
        assert!(result.v_in.is_finite());
    }

    #[test]
    fn excessive_flow_rate_chokes_rather_than_panics() {
        let geom = sample_geometry();
        let op = OperatingCondition::new(101_325.0, 288.15, 3000.0, 50.0);
        let gas = CubicGas::air();
        let result = calculate(&geom, &op, &gas);
        assert!(!result.valid);
        assert!(result.choke);
    }

    #[test]
    fn converged_point_has_sane_pressure_ratio_and_efficiency() {
        let geom = sample_geometry();
        let gas = CubicGas::air();
        // Scan a small band of flow rates around the inducer's known-good
        // point (`inducer::tests::converges_at_a_modest_flow`) rather than
        // pinning one exact value: the impeller's discharge coupling is its
        // own root-find and does not converge at every flow the inducer
        // does, but at least one of these should clear the whole cascade.
        let candidates = [0.3, 0.28, 0.25, 0.22, 0.2, 0.18, 0.32, 0.35];
        let result = candidates
            .iter()
            .map(|&m_dot| {
                let op = OperatingCondition::new(101_325.0, 288.15, 3000.0, m_dot);
                calculate(&geom, &op, &gas)
            })
            .find(|r| r.valid)
            .expect("expected at least one candidate flow rate to converge");

        assert!(result.pr >= 1.0);
        assert!(result.eff > 0.0 && result.eff <= 1.0);
        assert!(result.m_in.is_finite() && result.m_in > 0.0);
        // The surge-slope check (the `1.005 * m_dot` perturbation) runs on
        // every `calculate()` call; a stable point has a negative head slope.
        assert!(result.d_head_d_flow.is_finite());
        assert!(result.d_head_d_flow < 0.0);
    }

    #[test]
    fn two_phase_relative_stagnation_sets_wet_flag() {
        let geom = sample_geometry();
        let op = OperatingCondition::new(101_325.0, 288.15, 3000.0, 0.3);
        let gas = CubicGas::air();
        let ind = inducer::solve(&geom, &op, &gas, 0.0).expect("inducer should converge");

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
        let result = calculate(&geom, &op, &mock);
        assert!(!result.valid);
        assert!(result.wet);
    }
}
