//! One-dimensional mean-line performance solver for centrifugal
//! compressors, over a pluggable real-fluid equation-of-state back-end.
//!
//! The solve cascades three stages, each a root-find against the working
//! fluid's [`thermo::Fluid`] contract: [`inducer`] (station 1 and 2),
//! [`impeller`] (stations 2 through 4), and [`diffuser`] (the vaneless
//! radial march to station 5). [`compressor::calculate`] chains all three
//! and derives the machine-level performance metrics (pressure ratio,
//! isentropic efficiency, specific speed/diameter, surge margin).
//!
//! Two fluid back-ends ship with the crate: [`fluids::reference::CubicGas`]
//! (a self-contained Peng-Robinson gas, no native dependency) and, behind
//! the `coolprop` feature, [`fluids::coolprop::CoolPropFluid`].

pub mod compressor;
pub mod condition;
pub mod correlations;
pub mod diffuser;
pub mod fluids;
pub mod geometry;
pub mod impeller;
pub mod inducer;
pub mod solver;
pub mod station;
pub mod thermo;

pub use compressor::{calculate, CompressorResult};
pub use condition::OperatingCondition;
pub use geometry::Geometry;
pub use thermo::{EosError, Fluid, Pair, Phase, ThermoProp};
