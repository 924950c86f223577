//! CoolProp-backed [`Fluid`] implementation, behind the `coolprop` feature.
//!
//! Wraps `rfluids`'s high-level `Fluid` handle the way
//! `kyleas-thermoflow`'s `tf-fluids::coolprop` module does: one handle per
//! substance, `in_state` re-solved for every query. Per the EOS contract
//! (`crate::thermo::Fluid`), a handle must not be shared across threads
//! while a solve is in flight; `rfluids::Fluid` is cheap enough to
//! construct that `CoolPropFluid` just holds the substance identity and
//! builds a fresh handle per query rather than caching mutable state behind
//! a lock.

use std::cell::RefCell;

use rfluids::prelude::*;

use crate::thermo::{EosError, Fluid, FluidLimits, Pair, Phase, ThermoProp};

/// A pure substance backed by CoolProp's Helmholtz-energy formulations.
pub struct CoolPropFluid {
    substance: Pure,
    last_limits: RefCell<Option<FluidLimits>>,
}

impl CoolPropFluid {
    pub fn new(substance: Pure) -> Self {
        CoolPropFluid {
            substance,
            last_limits: RefCell::new(None),
        }
    }

    pub fn water() -> Self {
        Self::new(Pure::Water)
    }

    fn fluid_at(&self, a: FluidInput, b: FluidInput) -> Result<rfluids::Fluid, String> {
        rfluids::Fluid::from(self.substance)
            .update(a, b)
            .map_err(|e| e.to_string())
    }

    fn snapshot(&self, pair: Pair, v1: f64, v2: f64) -> Result<ThermoProp<'_>, EosError> {
        let mut state = match pair {
            Pair::PT => self.fluid_at(FluidInput::pressure_si(v1), FluidInput::temperature_si(v2)),
            Pair::PH => self.fluid_at(FluidInput::pressure_si(v1), FluidInput::enthalpy_si(v2)),
            Pair::PS => self.fluid_at(FluidInput::pressure_si(v1), FluidInput::entropy_si(v2)),
            Pair::HS => self.fluid_at(FluidInput::enthalpy_si(v1), FluidInput::entropy_si(v2)),
            Pair::TQ => self.fluid_at(FluidInput::temperature_si(v1), FluidInput::quality_si(v2)),
            Pair::PQ => self.fluid_at(FluidInput::pressure_si(v1), FluidInput::quality_si(v2)),
        }
        .map_err(|reason| EosError::out_of_range(pair, v1, v2, reason))?;

        let p = state.pressure().map_err(|e| EosError::out_of_range(pair, v1, v2, e.to_string()))?;
        let t = state
            .temperature()
            .map_err(|e| EosError::out_of_range(pair, v1, v2, e.to_string()))?;
        let d = state
            .density()
            .map_err(|e| EosError::out_of_range(pair, v1, v2, e.to_string()))?;
        let h = state
            .enthalpy()
            .map_err(|e| EosError::out_of_range(pair, v1, v2, e.to_string()))?;
        let s = state
            .entropy()
            .map_err(|e| EosError::out_of_range(pair, v1, v2, e.to_string()))?;
        let a = state
            .sound_speed()
            .map_err(|e| EosError::out_of_range(pair, v1, v2, e.to_string()))?;
        let mu = state
            .dynamic_viscosity()
            .map_err(|e| EosError::out_of_range(pair, v1, v2, e.to_string()))?;
        let quality = state.quality().ok();

        let phase = match quality {
            Some(q) if q > 0.0 && q < 1.0 => Phase::TwoPhase,
            _ if t > self.critical_temperature() && p > self.critical_pressure() => {
                Phase::Supercritical
            }
            _ if t > self.critical_temperature() => Phase::SupercriticalGas,
            _ => Phase::Gas,
        };

        if phase == Phase::TwoPhase && !matches!(pair, Pair::TQ | Pair::PQ) {
            return Err(EosError::out_of_range(
                pair,
                v1,
                v2,
                "state resolved inside the two-phase dome",
            ));
        }

        Ok(ThermoProp::new(self, p, t, d, h, s, a, mu, phase))
    }

    fn critical_temperature(&self) -> f64 {
        rfluids::Fluid::from(self.substance)
            .trivial_output(FluidTrivialParam::TCrit)
            .unwrap_or(f64::INFINITY)
    }

    fn critical_pressure(&self) -> f64 {
        rfluids::Fluid::from(self.substance)
            .trivial_output(FluidTrivialParam::PCrit)
            .unwrap_or(f64::INFINITY)
    }
}

impl Fluid for CoolPropFluid {
    fn thermo_prop(&self, pair: Pair, v1: f64, v2: f64) -> Result<ThermoProp<'_>, EosError> {
        self.snapshot(pair, v1, v2)
    }

    fn limits(&self) -> FluidLimits {
        if let Some(limits) = *self.last_limits.borrow() {
            return limits;
        }
        let handle = rfluids::Fluid::from(self.substance);
        let limits = FluidLimits {
            p_max: handle.trivial_output(FluidTrivialParam::PMax).unwrap_or(f64::INFINITY),
            t_max: handle.trivial_output(FluidTrivialParam::TMax).unwrap_or(f64::INFINITY),
            p_crit: handle.trivial_output(FluidTrivialParam::PCrit).unwrap_or(f64::NAN),
            t_crit: handle.trivial_output(FluidTrivialParam::TCrit).unwrap_or(f64::NAN),
            p_triple: handle
                .trivial_output(FluidTrivialParam::PTriple)
                .unwrap_or(f64::NAN),
            t_triple: handle
                .trivial_output(FluidTrivialParam::TTriple)
                .unwrap_or(f64::NAN),
        };
        *self.last_limits.borrow_mut() = Some(limits);
        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn water_critical_point_matches_reference() {
        let water = CoolPropFluid::water();
        let limits = water.limits();
        assert_float_eq!(limits.t_crit, 647.096, rel <= 1e-6);
        assert_float_eq!(limits.p_crit, 22_064_000.0, rel <= 1e-6);
    }

    #[test]
    fn tq_saturated_liquid_density_matches_reference() {
        let water = CoolPropFluid::water();
        let tp = water.thermo_prop(Pair::TQ, 290.0, 0.0).unwrap();
        assert_float_eq!(tp.d, 998.7578446208877, rel <= 1e-6);
    }
}
