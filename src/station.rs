//! Station records: the thermodynamic state and velocity triangle each
//! solver stage builds at a measurement plane.
//!
//! These replace the Python `InducerState`/`ImpellerState` dataclasses
//! (`examples/original_source/radcompressor/inducer.py`,
//! `examples/original_source/radcomp/impeller.py`), which default every
//! field to NaN and mutate in place. A [`Station`]/[`RelativeStation`] is
//! instead only ever built once every field is known, after the stage's
//! root-find has converged.

use crate::thermo::ThermoProp;

/// An absolute-frame flow station: inducer inlet (1), impeller inlet (2),
/// or diffuser outlet (5).
#[derive(Clone, Copy)]
pub struct Station<'f> {
    pub total: ThermoProp<'f>,
    pub static_state: ThermoProp<'f>,
    /// Isentropic-to-this-point reference state, when the stage computes one.
    pub isentropic: Option<ThermoProp<'f>>,
    /// Absolute flow speed, m/s
    pub c: f64,
    /// Absolute flow angle from meridional, deg
    pub alpha: f64,
    /// Effective flow area at this station, m^2
    pub a_eff: f64,
    /// Absolute Mach number
    pub m_abs: f64,
}

impl<'f> Station<'f> {
    /// Isentropic efficiency `dh0s / (total.h - reference.h)` over the
    /// supplied upstream total state, following the `eff = dh0s / delta_h`
    /// convention used by every stage (with the sign of `dh0s` preserved at
    /// the `+/-inf` limit when `delta_h` is within `1e-6` of zero).
    pub fn isentropic_efficiency(&self, upstream_total_h: f64) -> Option<f64> {
        let isen = self.isentropic?;
        let dh0s = isen.h - upstream_total_h;
        let delta_h = self.total.h - upstream_total_h;
        Some(if delta_h.abs() <= 1e-6 {
            f64::INFINITY.copysign(dh0s)
        } else {
            dh0s / delta_h
        })
    }
}

/// A relative-frame flow station inside the impeller: inlet (2), throat (3),
/// or discharge (4).
#[derive(Clone, Copy)]
pub struct RelativeStation<'f> {
    pub station: Station<'f>,
    pub relative: ThermoProp<'f>,
    /// Relative flow speed at the rms radius, m/s
    pub w: f64,
    /// Relative flow speed at the shroud, m/s
    pub ws: f64,
    /// Relative flow angle from meridional, deg
    pub beta: f64,
    pub m_rel: f64,
    pub m_rels: f64,
    /// Absolute Mach number based on the meridional velocity component only
    pub m_abs_m: f64,
}

impl<'f> std::ops::Deref for RelativeStation<'f> {
    type Target = Station<'f>;
    fn deref(&self) -> &Station<'f> {
        &self.station
    }
}

/// The six additive enthalpy-loss terms accumulated across the impeller.
///
/// `skin_friction`, `blade_loading`, `clearance`, and `incidence` are
/// "internal" losses (appear in the static enthalpy rise); `disc_friction`
/// and `recirculation` are "external"/parasitic losses (windage, not seen by
/// the fluid passing through the blade passage).
#[derive(Debug, Clone, Copy, Default)]
pub struct Losses {
    pub skin_friction: f64,
    pub blade_loading: f64,
    pub clearance: f64,
    pub incidence: f64,
    pub disc_friction: f64,
    pub recirculation: f64,
}

impl Losses {
    pub fn internal(&self) -> f64 {
        self.skin_friction + self.blade_loading + self.clearance + self.incidence
    }

    pub fn external(&self) -> f64 {
        self.disc_friction + self.recirculation
    }

    pub fn total(&self) -> f64 {
        self.internal() + self.external()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn losses_sum_correctly() {
        let l = Losses {
            skin_friction: 1.0,
            blade_loading: 2.0,
            clearance: 3.0,
            incidence: 4.0,
            disc_friction: 5.0,
            recirculation: 6.0,
        };
        assert_eq!(l.internal(), 10.0);
        assert_eq!(l.external(), 11.0);
        assert_eq!(l.total(), 21.0);
    }
}
