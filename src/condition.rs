//! The operating point at which the machine is evaluated.

use serde::{Deserialize, Serialize};

/// A single operating point: inlet fluid state, rotational speed, and mass flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingCondition {
    /// Inlet total pressure, Pa
    pub p_in: f64,
    /// Inlet total temperature, K
    pub t_in: f64,
    /// Rotational speed, rad/s
    pub omega: f64,
    /// Mass flow rate, kg/s
    pub m_dot: f64,
}

impl OperatingCondition {
    pub fn new(p_in: f64, t_in: f64, omega: f64, m_dot: f64) -> Self {
        OperatingCondition {
            p_in,
            t_in,
            omega,
            m_dot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_given_fields() {
        let c = OperatingCondition::new(101325.0, 288.15, 3000.0, 0.5);
        assert_eq!(c.p_in, 101325.0);
        assert_eq!(c.m_dot, 0.5);
    }
}
