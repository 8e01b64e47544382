//! # Shaft Materials
//!
//! Material definitions for the low-speed shaft: the static properties used by
//! the beam model and distortion-energy sizing, and the derived S-N fatigue
//! model used by the damage accumulator.
//!
//! ## Fatigue Model
//!
//! The endurance limit is a Marin-factored fraction of the ultimate strength:
//!
//! ```text
//! Se = C_size · C_surf · C_temp · C_rel · C_env · 0.5 · Sut
//! C_surf = 4.51 · (Sut / 1 MPa)^-0.265      (machined surface)
//! Sm = 0.9 · Sut                            (strength at 10³ cycles)
//! ```
//!
//! The S-N law is `S = a · N^b`. When a fatigue exponent `m` is supplied the
//! slope is `b = -1/m`, otherwise it runs from `Sm` at 10³ cycles to `Se` at
//! the knee (5·10⁸ cycles by default).
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::materials::{ShaftSteel, FatigueMaterial};
//!
//! let steel = ShaftSteel::default();
//! let fatigue = FatigueMaterial::from_steel(&steel, None, None).unwrap();
//!
//! // Lower stress never shortens life
//! assert!(fatigue.cycles_to_failure(100e6) > fatigue.cycles_to_failure(200e6));
//! // Zero stress never fails
//! assert!(fatigue.cycles_to_failure(0.0).is_infinite());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Static and endurance properties of the shaft steel.
///
/// Defaults describe a quenched-and-tempered 34CrNiMo6 forging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaftSteel {
    /// Material designation
    pub name: String,
    /// Density (kg/m³)
    pub density_kg_m3: f64,
    /// Young's modulus (Pa)
    pub elastic_modulus_pa: f64,
    /// Yield strength used by the static distortion-energy sizing (psi)
    pub static_yield_strength_psi: f64,
    /// Ultimate tensile strength (Pa)
    pub ultimate_strength_pa: f64,
    /// Fraction of Sut reached at 10³ cycles in bending
    pub strength_ratio_1e3: f64,
    /// Marin size factor (diameters above 10 in)
    pub size_factor: f64,
    /// Marin temperature factor
    pub temperature_factor: f64,
    /// Marin reliability factor (0.814 = 99 %)
    pub reliability_factor: f64,
    /// Marin environment factor
    pub environment_factor: f64,
    /// Cycle count where the derived S-N line reaches the endurance limit
    pub knee_cycles: f64,
}

impl Default for ShaftSteel {
    fn default() -> Self {
        ShaftSteel {
            name: "34CrNiMo6 +QT".to_string(),
            density_kg_m3: 7800.0,
            elastic_modulus_pa: 2.1e11,
            static_yield_strength_psi: 66_000.0,
            ultimate_strength_pa: 700.0e6,
            strength_ratio_1e3: 0.9,
            size_factor: 0.6,
            temperature_factor: 1.0,
            reliability_factor: 0.814,
            environment_factor: 1.0,
            knee_cycles: 5.0e8,
        }
    }
}

impl ShaftSteel {
    /// Validate material constants.
    pub fn validate(&self) -> CalcResult<()> {
        let positive = [
            ("density_kg_m3", self.density_kg_m3),
            ("elastic_modulus_pa", self.elastic_modulus_pa),
            ("static_yield_strength_psi", self.static_yield_strength_psi),
            ("ultimate_strength_pa", self.ultimate_strength_pa),
            ("strength_ratio_1e3", self.strength_ratio_1e3),
            ("size_factor", self.size_factor),
            ("temperature_factor", self.temperature_factor),
            ("reliability_factor", self.reliability_factor),
            ("environment_factor", self.environment_factor),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Material constant must be positive and finite",
                ));
            }
        }
        if !(self.knee_cycles.is_finite() && self.knee_cycles > 1.0e3) {
            return Err(CalcError::invalid_input(
                "knee_cycles",
                self.knee_cycles.to_string(),
                "Knee must lie beyond 10^3 cycles",
            ));
        }
        Ok(())
    }

    /// Machined-surface Marin factor for a given ultimate strength
    pub fn surface_factor(ultimate_strength_pa: f64) -> f64 {
        4.51 * (ultimate_strength_pa / 1.0e6).powf(-0.265)
    }
}

/// Derived S-N curve with Goodman mean-stress correction.
///
/// Built once per evaluation and shared by every damage trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueMaterial {
    /// Ultimate tensile strength (Pa)
    pub ultimate_strength_pa: f64,
    /// Strength at 10³ cycles (Pa)
    pub strength_1e3_pa: f64,
    /// Modified endurance limit (Pa)
    pub endurance_limit_pa: f64,
    /// S-N slope b in `S = a·N^b` (negative)
    pub sn_slope: f64,
    /// S-N intercept a in `S = a·N^b` (Pa)
    pub sn_intercept_pa: f64,
}

impl FatigueMaterial {
    /// Derive the S-N curve.
    ///
    /// `ultimate_strength_pa` overrides the steel's Sut; `fatigue_exponent`
    /// fixes the inverse slope `m` instead of deriving it from the knee.
    pub fn from_steel(
        steel: &ShaftSteel,
        ultimate_strength_pa: Option<f64>,
        fatigue_exponent: Option<f64>,
    ) -> CalcResult<Self> {
        steel.validate()?;

        let sut = ultimate_strength_pa.unwrap_or(steel.ultimate_strength_pa);
        if !(sut.is_finite() && sut > 0.0) {
            return Err(CalcError::invalid_input(
                "ultimate_strength_pa",
                sut.to_string(),
                "Ultimate strength must be positive",
            ));
        }

        let sm = steel.strength_ratio_1e3 * sut;
        let se = steel.size_factor
            * ShaftSteel::surface_factor(sut)
            * steel.temperature_factor
            * steel.reliability_factor
            * steel.environment_factor
            * 0.5
            * sut;

        let sn_slope = match fatigue_exponent {
            Some(m) if m.is_finite() && m > 0.0 => -1.0 / m,
            Some(m) => {
                return Err(CalcError::invalid_input(
                    "fatigue_exponent",
                    m.to_string(),
                    "Fatigue exponent must be positive",
                ))
            }
            None => (sm / se).log10() / (3.0 - steel.knee_cycles.log10()),
        };
        if !(sn_slope < 0.0) {
            return Err(CalcError::invalid_input(
                "ultimate_strength_pa",
                sut.to_string(),
                "Derived S-N slope is not negative",
            ));
        }

        Ok(FatigueMaterial {
            ultimate_strength_pa: sut,
            strength_1e3_pa: sm,
            endurance_limit_pa: se,
            sn_slope,
            sn_intercept_pa: sm / 1000f64.powf(sn_slope),
        })
    }

    /// Inverse slope m = -1/b
    pub fn exponent(&self) -> f64 {
        -1.0 / self.sn_slope
    }

    /// Cycles to failure at a fully reversed stress amplitude.
    ///
    /// Non-positive stress means infinite life.
    pub fn cycles_to_failure(&self, stress_pa: f64) -> f64 {
        if !(stress_pa > 0.0) {
            return f64::INFINITY;
        }
        (stress_pa / self.sn_intercept_pa).powf(1.0 / self.sn_slope)
    }

    /// Goodman equivalent fully reversed stress `S_alt / (1 - S_mean/Sut)`.
    ///
    /// A mean at or beyond Sut gives an infinite equivalent stress.
    pub fn goodman(&self, alternating_pa: f64, mean_pa: f64) -> f64 {
        let knockdown = 1.0 - mean_pa / self.ultimate_strength_pa;
        if knockdown <= 0.0 {
            return f64::INFINITY;
        }
        alternating_pa / knockdown
    }

    /// Goodman stress at a compressive mean of magnitude `mean_magnitude_pa`
    pub fn goodman_compressive(&self, alternating_pa: f64, mean_magnitude_pa: f64) -> f64 {
        self.goodman(alternating_pa, -mean_magnitude_pa.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_fatigue() -> FatigueMaterial {
        FatigueMaterial::from_steel(&ShaftSteel::default(), None, None).unwrap()
    }

    #[test]
    fn test_endurance_limit() {
        let fatigue = default_fatigue();
        // 0.6 * 4.51*700^-0.265 * 0.814 * 0.5 * 700 MPa ≈ 136 MPa
        assert!((fatigue.endurance_limit_pa / 1e6 - 136.0).abs() < 2.0);
        assert!((fatigue.strength_1e3_pa - 630e6).abs() < 1.0);
    }

    #[test]
    fn test_sn_curve_passes_through_anchor_points() {
        let steel = ShaftSteel::default();
        let fatigue = FatigueMaterial::from_steel(&steel, None, None).unwrap();
        let n_sm = fatigue.cycles_to_failure(fatigue.strength_1e3_pa);
        assert!((n_sm.log10() - 3.0).abs() < 1e-9);
        let n_se = fatigue.cycles_to_failure(fatigue.endurance_limit_pa);
        assert!((n_se.log10() - steel.knee_cycles.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_exponent() {
        let fatigue = FatigueMaterial::from_steel(&ShaftSteel::default(), None, Some(10.0)).unwrap();
        assert!((fatigue.sn_slope + 0.1).abs() < 1e-12);
        assert!((fatigue.exponent() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_exponent() {
        assert!(FatigueMaterial::from_steel(&ShaftSteel::default(), None, Some(-3.0)).is_err());
    }

    #[test]
    fn test_goodman_compressive_mean_relieves() {
        let fatigue = default_fatigue();
        let relieved = fatigue.goodman_compressive(100e6, 70e6);
        assert!(relieved < 100e6);
        assert!((relieved - 100e6 / 1.1).abs() < 1.0);
        assert!(fatigue.goodman(100e6, 700e6).is_infinite());
    }

    #[test]
    fn test_invalid_steel() {
        let steel = ShaftSteel {
            density_kg_m3: 0.0,
            ..ShaftSteel::default()
        };
        assert!(steel.validate().is_err());
    }
}
