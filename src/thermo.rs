//! The equation-of-state (EOS) back-end contract.
//!
//! `Fluid` is the trait every real-fluid property back-end implements; a
//! `&dyn Fluid` is the non-owning "handle" threaded through every solver
//! stage (see [`ThermoProp::fluid`]). Two concrete implementations ship in
//! [`crate::fluids`]: a corresponding-states cubic EOS usable without any
//! native dependency, and an optional CoolProp-backed implementation.

use std::fmt;

use thiserror::Error;

/// The six input pairs the EOS contract accepts.
///
/// Mirrors CoolProp's/REFPROP's input-pair convention: each variant names
/// the two state variables supplied, in the order they are passed to
/// [`Fluid::thermo_prop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pair {
    /// Pressure, temperature
    PT,
    /// Specific enthalpy, specific entropy
    HS,
    /// Pressure, specific enthalpy
    PH,
    /// Pressure, specific entropy
    PS,
    /// Temperature, vapor quality
    TQ,
    /// Pressure, vapor quality
    PQ,
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Pair::PT => "PT",
            Pair::HS => "HS",
            Pair::PH => "PH",
            Pair::PS => "PS",
            Pair::TQ => "TQ",
            Pair::PQ => "PQ",
        };
        f.write_str(s)
    }
}

/// The phase tag reported alongside every [`ThermoProp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Gas,
    TwoPhase,
    Supercritical,
    SupercriticalGas,
}

/// An immutable snapshot of a fluid state, produced only by [`Fluid::thermo_prop`]
/// or the isentropic helpers below.
///
/// Invariant: if `phase == Phase::TwoPhase` then `a` and `v` were taken at
/// the saturated-vapor boundary, not at the true two-phase mixture state.
#[derive(Clone, Copy)]
pub struct ThermoProp<'f> {
    /// Pressure, Pa
    pub p: f64,
    /// Temperature, K
    pub t: f64,
    /// Density, kg/m^3
    pub d: f64,
    /// Specific enthalpy, J/kg
    pub h: f64,
    /// Specific entropy, J/(kg.K)
    pub s: f64,
    /// Speed of sound, m/s
    pub a: f64,
    /// Dynamic viscosity, Pa.s
    pub v: f64,
    /// Phase tag
    pub phase: Phase,
    fluid: &'f dyn Fluid,
}

impl<'f> ThermoProp<'f> {
    /// Construct a state snapshot. Only [`Fluid`] implementations should call this.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fluid: &'f dyn Fluid,
        p: f64,
        t: f64,
        d: f64,
        h: f64,
        s: f64,
        a: f64,
        v: f64,
        phase: Phase,
    ) -> Self {
        ThermoProp {
            p,
            t,
            d,
            h,
            s,
            a,
            v,
            phase,
            fluid,
        }
    }

    /// The non-owning handle to the fluid that produced this state. Use it
    /// to issue further property queries without re-threading a separate
    /// fluid reference through every call site.
    pub fn fluid(&self) -> &'f dyn Fluid {
        self.fluid
    }
}

impl fmt::Debug for ThermoProp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThermoProp")
            .field("p", &self.p)
            .field("t", &self.t)
            .field("d", &self.d)
            .field("h", &self.h)
            .field("s", &self.s)
            .field("a", &self.a)
            .field("v", &self.v)
            .field("phase", &self.phase)
            .finish()
    }
}

/// Fluid-limit accessors every back-end must expose.
#[derive(Debug, Clone, Copy)]
pub struct FluidLimits {
    pub p_max: f64,
    pub t_max: f64,
    pub p_crit: f64,
    pub t_crit: f64,
    pub p_triple: f64,
    pub t_triple: f64,
}

/// EOS back-end failure. Out-of-range inputs and liquid-phase results both
/// surface as `OutOfRange` (spec: "Fails with OutOfRange when the EOS
/// rejects inputs or when the returned phase is liquid").
#[derive(Debug, Error, Clone)]
pub enum EosError {
    #[error("out of range for {pair}({v1}, {v2}): {reason}")]
    OutOfRange {
        pair: Pair,
        v1: f64,
        v2: f64,
        reason: String,
    },
}

impl EosError {
    pub fn out_of_range(pair: Pair, v1: f64, v2: f64, reason: impl Into<String>) -> Self {
        EosError::OutOfRange {
            pair,
            v1,
            v2,
            reason: reason.into(),
        }
    }
}

/// An EOS back-end handle.
///
/// Implementations may be stateful (they may hold the result of the last
/// query internally, e.g. behind a `RefCell`, the way a CoolProp
/// `AbstractState` does): a handle must never be shared across threads
/// during a solve. Construct one handle per worker thread.
pub trait Fluid {
    /// One-shot property query.
    fn thermo_prop(&self, pair: Pair, v1: f64, v2: f64) -> Result<ThermoProp<'_>, EosError>;

    /// Fluid-limit constants (critical point, triple point, machine max P/T).
    fn limits(&self) -> FluidLimits;

    /// Optional one-time side effect (e.g. REFPROP's fluid activation). No-op by default.
    fn activate(&self) -> Result<(), EosError> {
        Ok(())
    }
}

/// Get the static flow condition from the total (stagnation) condition and
/// the flow speed: `static = eos("HS", tot.h - v^2/2, tot.s)`.
pub fn static_from_total<'f>(tot: &ThermoProp<'f>, speed: f64) -> Result<ThermoProp<'f>, EosError> {
    tot.fluid()
        .thermo_prop(Pair::HS, tot.h - 0.5 * speed * speed, tot.s)
}

/// Get the total (stagnation) condition from a static condition and the
/// flow speed: `total = eos("HS", stat.h + v^2/2, stat.s)`.
pub fn total_from_static<'f>(
    stat: &ThermoProp<'f>,
    speed: f64,
) -> Result<ThermoProp<'f>, EosError> {
    stat.fluid()
        .thermo_prop(Pair::HS, stat.h + 0.5 * speed * speed, stat.s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluids::reference::CubicGas;

    #[test]
    fn total_static_round_trip_recovers_the_static_state() {
        let gas = CubicGas::air();
        let speed = 120.0;
        let stat = gas.thermo_prop(Pair::PT, 101_325.0, 288.15).unwrap();

        let tot = total_from_static(&stat, speed).unwrap();
        let round_tripped = static_from_total(&tot, speed).unwrap();

        assert!((round_tripped.h - stat.h).abs() <= 1e-6 * stat.h.abs());
        assert!((round_tripped.s - stat.s).abs() <= 1e-6 * stat.s.abs().max(1.0));
        assert!((round_tripped.p - stat.p).abs() <= 1e-6 * stat.p.abs());
        assert!((round_tripped.t - stat.t).abs() <= 1e-6 * stat.t.abs());
    }
}
