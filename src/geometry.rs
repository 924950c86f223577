//! The compressor's dimensional and blade geometry, and the quantities
//! derived from it.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// All dimensional and blade parameters of the machine.
///
/// Invariants: `r4 > r2s > r2h > 0`; `b4`, `b5`, and every entry of
/// `blockage` lie in `(0, 1]`; all angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Inducer inlet radius, m
    pub r1: f64,
    /// Impeller hub radius, m
    pub r2h: f64,
    /// Impeller shroud tip radius, m
    pub r2s: f64,
    /// Impeller outlet (tip) radius, m
    pub r4: f64,
    /// Diffuser outlet radius, m
    pub r5: f64,
    /// Impeller outlet blade height, m
    pub b4: f64,
    /// Diffuser outlet passage width, m
    pub b5: f64,
    /// Mid-blade impeller inlet angle, deg
    pub beta2: f64,
    /// Impeller shroud inlet angle, deg
    pub beta2s: f64,
    /// Impeller outlet blade angle, deg
    pub beta4: f64,
    /// Inlet flow angle, deg
    pub alpha2: f64,
    /// Number of main blades
    pub n_blades: u32,
    /// Number of splitter blades
    pub n_splits: u32,
    /// Blade thickness, m
    pub blade_e: f64,
    /// Tip clearance, m
    pub clearance: f64,
    /// Backface clearance, m
    pub backface: f64,
    /// Impeller surface roughness, m
    pub rug_imp: f64,
    /// Inducer surface roughness, m
    pub rug_ind: f64,
    /// Inducer length, m
    pub l_ind: f64,
    /// Impeller length, m (no impact on calculation, carried for record-keeping)
    pub l_comp: f64,
    /// Blockage factors, one per station: [inducer, impeller inlet, throat, impeller outlet, diffuser]
    pub blockage: [f64; 5],
}

impl Geometry {
    /// Root-mean-square impeller inlet radius: `sqrt((r2s^2 + r2h^2) / 2)`.
    pub fn r2rms(&self) -> f64 {
        ((self.r2s.powi(2) + self.r2h.powi(2)) / 2.0).sqrt()
    }

    /// Effective inducer throat area.
    pub fn a1_eff(&self) -> f64 {
        self.r1.powi(2) * PI * self.blockage[0]
    }

    /// Effective impeller-entry area.
    pub fn a2_eff(&self) -> f64 {
        (self.r2s.powi(2) - self.r2h.powi(2))
            * PI
            * self.blockage[1]
            * self.alpha2.to_radians().cos()
    }

    /// Meridional effective area at station 2.
    pub fn a_x(&self) -> f64 {
        (self.r2s.powi(2) - self.r2h.powi(2)) * PI * self.blockage[1] * self.beta2.to_radians().cos()
    }

    /// Throat effective area at station 3, with blade blockage removed.
    pub fn a_y(&self) -> f64 {
        ((self.r2s.powi(2) - self.r2h.powi(2)) * PI * self.beta2.to_radians().cos()
            - (self.r2s - self.r2h) * self.blade_e * self.n_blades as f64)
            * self.blockage[2]
    }

    /// Optimum relative flow angle at the leading edge: `atan((A_x/A_y) tan(beta2))`.
    pub fn beta2_opt(&self) -> f64 {
        (self.a_x() / self.a_y() * self.beta2.to_radians().tan())
            .atan()
            .to_degrees()
    }

    /// Slip factor (Wiesner-Busemann): `1 - sqrt(cos(beta4)) / (n_blades+n_splits)^0.7`.
    pub fn slip(&self) -> f64 {
        1.0 - self.beta4.to_radians().cos().sqrt()
            / ((self.n_blades + self.n_splits) as f64).powf(0.7)
    }

    /// Impeller hydraulic diameter and length, `(Dh, Lh)`, following the
    /// published closed form over `(r2h/r2s, beta2s, beta4, n_blades, b4, r4)`.
    pub fn hydraulic_diameter(&self) -> (f64, f64) {
        let la = self.r2h / self.r2s;
        let beta4 = self.beta4.to_radians();
        let beta2s = self.beta2s.to_radians();

        let dh = 2.0
            * self.r4
            * (1.0 / (self.n_blades as f64 / PI / beta4.cos() + 2.0 * self.r4 / self.b4)
                + self.r2s / self.r4
                    / (2.0 / (1.0 - la)
                        + 2.0 * self.n_blades as f64 / PI / (1.0 + la)
                            * (1.0 + (1.0 + la.powi(2) / 2.0) * beta2s.tan().powi(2)).sqrt()));

        let lh = self.r4 * (1.0 - self.r2rms() * 2.0 / 0.3048) / beta4.cos();

        (dh, lh)
    }

    /// Build a `Geometry` from a flat key-value record (spec section 6):
    /// keys are matched case-insensitively, unknown keys are ignored, and
    /// blockage may be supplied either as `blockage: [f64; 5]` (via
    /// [`Geometry::new_from_values`]) or as five scalar keys
    /// `blockage1..blockage5`.
    pub fn from_map(data: impl IntoIterator<Item = (String, f64)>) -> Result<Geometry, String> {
        let mut values: HashMap<String, f64> = HashMap::new();
        for (k, v) in data {
            values.insert(k.to_lowercase(), v);
        }

        let mut blockage = [1.0_f64; 5];
        let mut has_blockage = false;
        for (i, slot) in blockage.iter_mut().enumerate() {
            if let Some(&v) = values.get(&format!("blockage{}", i + 1)) {
                *slot = v;
                has_blockage = true;
            }
        }
        if !has_blockage {
            return Err("blockage needs to be provided as blockage1..blockage5".to_string());
        }

        macro_rules! field {
            ($name:literal) => {
                *values
                    .get($name)
                    .ok_or_else(|| format!("missing geometry field `{}`", $name))?
            };
        }

        Ok(Geometry {
            r1: field!("r1"),
            r2h: field!("r2h"),
            r2s: field!("r2s"),
            r4: field!("r4"),
            r5: field!("r5"),
            b4: field!("b4"),
            b5: field!("b5"),
            beta2: field!("beta2"),
            beta2s: field!("beta2s"),
            beta4: field!("beta4"),
            alpha2: field!("alpha2"),
            n_blades: field!("n_blades") as u32,
            n_splits: field!("n_splits") as u32,
            blade_e: field!("blade_e"),
            clearance: field!("clearance"),
            backface: field!("backface"),
            rug_imp: field!("rug_imp"),
            rug_ind: field!("rug_ind"),
            l_ind: field!("l_ind"),
            l_comp: values.get("l_comp").copied().unwrap_or(0.0),
            blockage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Geometry {
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
    fn r2rms_between_hub_and_shroud() {
        let g = sample();
        assert!(g.r2rms() > g.r2h && g.r2rms() < g.r2s);
    }

    #[test]
    fn slip_decreases_with_fewer_blades() {
        let mut g = sample();
        let slip_9 = g.slip();
        g.n_blades = 6;
        g.n_splits = 6;
        let slip_6 = g.slip();
        assert!(slip_6 < slip_9, "slip should decrease with fewer blades");
    }

    #[test]
    fn from_map_accepts_blockage_scalars() {
        let mut data: HashMap<String, f64> = HashMap::new();
        data.insert("R1".into(), 0.03);
        data.insert("r2h".into(), 0.015);
        data.insert("r2s".into(), 0.035);
        data.insert("r4".into(), 0.06);
        data.insert("r5".into(), 0.09);
        data.insert("b4".into(), 0.006);
        data.insert("b5".into(), 0.006);
        data.insert("beta2".into(), -35.0);
        data.insert("beta2s".into(), -55.0);
        data.insert("beta4".into(), -40.0);
        data.insert("alpha2".into(), 0.0);
        data.insert("n_blades".into(), 9.0);
        data.insert("n_splits".into(), 9.0);
        data.insert("blade_e".into(), 0.5e-3);
        data.insert("clearance".into(), 0.3e-3);
        data.insert("backface".into(), 0.5e-3);
        data.insert("rug_imp".into(), 3e-6);
        data.insert("rug_ind".into(), 3e-6);
        data.insert("l_ind".into(), 0.1);
        for i in 0..5 {
            data.insert(format!("blockage{}", i + 1), 0.9);
        }
        data.insert("not_a_field".into(), 42.0);

        let geom = Geometry::from_map(data).expect("should parse");
        assert_eq!(geom.blockage, [0.9; 5]);
    }

    #[test]
    fn from_map_rejects_missing_blockage() {
        let data: HashMap<String, f64> = HashMap::new();
        assert!(Geometry::from_map(data).is_err());
    }
}
