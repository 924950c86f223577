//! Test-only [`Fluid`] double that can script a two-phase result on demand.
//!
//! Grounded on the `FakeThermo` pattern in
//! `other_examples/.../twine-components-src-turbomachinery-turbine-isentropic.rs`:
//! a thin wrapper around a real backend that intercepts one query shape to
//! produce an outcome the real backend cannot reach on its own. Here that
//! outcome is [`Phase::TwoPhase`] on an `HS` query, which the reference
//! [`crate::fluids::reference::CubicGas`] backend can never return (it has
//! no saturation model, `reference.rs`'s `TQ`/`PQ` arms always error).

use crate::thermo::{EosError, Fluid, FluidLimits, Pair, Phase, ThermoProp};

/// Wraps `inner` and reports every other field unchanged, except that any
/// `HS` query with `v1 >= wet_above_h` is reported as [`Phase::TwoPhase`]
/// instead of whatever phase `inner` actually resolved.
pub struct MockFluid<'f> {
    inner: &'f dyn Fluid,
    wet_above_h: f64,
}

impl<'f> MockFluid<'f> {
    pub fn new(inner: &'f dyn Fluid, wet_above_h: f64) -> Self {
        MockFluid { inner, wet_above_h }
    }
}

impl<'f> Fluid for MockFluid<'f> {
    fn thermo_prop(&self, pair: Pair, v1: f64, v2: f64) -> Result<ThermoProp<'_>, EosError> {
        let tp = self.inner.thermo_prop(pair, v1, v2)?;
        let phase = if pair == Pair::HS && v1 >= self.wet_above_h {
            Phase::TwoPhase
        } else {
            tp.phase
        };
        Ok(ThermoProp::new(self, tp.p, tp.t, tp.d, tp.h, tp.s, tp.a, tp.v, phase))
    }

    fn limits(&self) -> FluidLimits {
        self.inner.limits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluids::reference::CubicGas;

    #[test]
    fn reports_two_phase_only_at_or_above_threshold() {
        let air = CubicGas::air();
        let baseline = air.thermo_prop(Pair::PT, 101_325.0, 288.15).unwrap();
        let mock = MockFluid::new(&air, baseline.h + 1.0);

        let below = mock
            .thermo_prop(Pair::HS, baseline.h - 1.0, baseline.s)
            .unwrap();
        assert_ne!(below.phase, Phase::TwoPhase);

        let above = mock
            .thermo_prop(Pair::HS, baseline.h + 10.0, baseline.s)
            .unwrap();
        assert_eq!(above.phase, Phase::TwoPhase);
    }

    #[test]
    fn leaves_other_pairs_untouched() {
        let air = CubicGas::air();
        let mock = MockFluid::new(&air, 0.0);
        let direct = air.thermo_prop(Pair::PT, 101_325.0, 288.15).unwrap();
        let via_mock = mock.thermo_prop(Pair::PT, 101_325.0, 288.15).unwrap();
        assert_eq!(via_mock.phase, direct.phase);
        assert_eq!(via_mock.h, direct.h);
    }
}
