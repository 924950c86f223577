//! Concrete [`crate::thermo::Fluid`] back-ends.
//!
//! The EOS back-end itself is a collaborator whose contract is fixed by
//! [`crate::thermo`] and whose real implementations (Helmholtz-based,
//! REFPROP-accurate) live outside this crate. The two back-ends here exist
//! so the solver is exercisable and testable without a native dependency.

pub mod reference;

#[cfg(feature = "coolprop")]
pub mod coolprop;

#[cfg(test)]
pub mod mock;
