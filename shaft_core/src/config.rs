//! # Design Constants
//!
//! Every numeric constant the sizing routines depend on, with the defaults
//! used for utility-scale steel shafts. All sections deserialize with
//! `#[serde(default)]`, so a constants file only needs to list what it
//! overrides:
//!
//! ```json
//! {
//!   "static_safety_factor": 3.0,
//!   "steel": { "ultimate_strength_pa": 800e6 },
//!   "search": { "fine_step_m": 0.001 }
//! }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::config::DesignConstants;
//!
//! let constants = DesignConstants::from_json_str(r#"{ "gravity": 9.80665 }"#).unwrap();
//! assert_eq!(constants.gravity, 9.80665);
//! assert_eq!(constants.search.coarse_step_m, 0.05);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::materials::ShaftSteel;
use crate::units::{Degrees, Radians};

/// Root constants container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConstants {
    /// Gravitational acceleration (m/s²); 0 removes every weight load
    pub gravity: f64,
    /// Safety factor in the distortion-energy sizing formula
    pub static_safety_factor: f64,
    /// Divides every bearing misalignment allowance
    pub bearing_safety_factor: f64,
    /// Allowable slope at the gearbox coupling in the four-point layout (arc-minutes)
    pub coupling_slope_limit_arcmin: f64,
    /// Shaft steel
    pub steel: ShaftSteel,
    /// Span search settings
    pub search: SearchSettings,
    /// Fatigue diameter search settings
    pub fatigue: FatigueSettings,
    /// Synthesized spectrum settings
    pub spectrum: SpectrumSettings,
    /// Empirical geometry and mass allowances
    pub allowances: Allowances,
}

impl Default for DesignConstants {
    fn default() -> Self {
        DesignConstants {
            gravity: 9.81,
            static_safety_factor: 2.5,
            bearing_safety_factor: 1.0,
            coupling_slope_limit_arcmin: 4.0,
            steel: ShaftSteel::default(),
            search: SearchSettings::default(),
            fatigue: FatigueSettings::default(),
            spectrum: SpectrumSettings::default(),
            allowances: Allowances::default(),
        }
    }
}

/// Incremental span search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// First candidate span (m)
    pub seed_span_m: f64,
    /// Coarse pass step (m)
    pub coarse_step_m: f64,
    /// Refinement pass step (m)
    pub fine_step_m: f64,
    /// Slope mismatch accepted as an exact hit (rad)
    pub slope_tolerance_rad: f64,
    /// Stations sampled per beam segment for the moment envelope
    pub sample_points: usize,
    /// Smallest outer diameter the static solver will produce (m)
    pub min_outer_diameter_m: f64,
    /// Hard cap on iterations of any one search loop
    pub max_iterations: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            seed_span_m: 0.5,
            coarse_step_m: 0.05,
            fine_step_m: 0.0025,
            slope_tolerance_rad: 1.0e-4,
            sample_points: 101,
            min_outer_diameter_m: 0.2,
            max_iterations: 10_000,
        }
    }
}

/// Fatigue seat-diameter search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueSettings {
    /// Diameter increment per trial (m)
    pub diameter_step_m: f64,
    /// Absolute upper bound on a seat diameter (m)
    pub diameter_limit_m: f64,
    /// Largest damage accepted as adequate
    pub allowable_damage: f64,
}

impl Default for FatigueSettings {
    fn default() -> Self {
        FatigueSettings {
            diameter_step_m: 0.01,
            diameter_limit_m: 5.0,
            allowable_damage: 1.0,
        }
    }
}

/// DS472-style spectrum synthesis constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumSettings {
    /// Air density (kg/m³)
    pub air_density: f64,
    /// Blade pressure multiplier (2.5 for all blades combined)
    pub k_b: f64,
    /// Rotor dynamic response factor
    pub k_r: f64,
    /// Number of log-spaced cycle bins
    pub bins: usize,
    /// Seconds per design-life year
    pub seconds_per_year: f64,
}

impl Default for SpectrumSettings {
    fn default() -> Self {
        SpectrumSettings {
            air_density: 1.225,
            k_b: 2.5,
            k_r: 0.8,
            bins: 100,
            seconds_per_year: 365.0 * 24.0 * 60.0 * 60.0,
        }
    }
}

/// Empirical allowances from as-built shafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allowances {
    /// Flange mass as a fraction of the bare shaft mass
    pub flange_mass_fraction: f64,
    /// Center of mass position as a fraction of length, from the downwind end
    pub cm_fraction: f64,
    /// Housing mass multiplier on the rolling-element mass (8000/2700)
    pub housing_mass_ratio: f64,
    /// Hub-to-main-bearing distance regression `a·D_rotor + b` (m)
    pub hub_to_bearing_slope: f64,
    pub hub_to_bearing_offset_m: f64,
    /// Flange length regression `c·exp(k·D_rotor)` (m)
    pub flange_length_coefficient_m: f64,
    pub flange_length_exponent: f64,
    /// Rotor mass regression `c·P^e` with P in kW, used when no rotor mass is given
    pub rotor_mass_coefficient: f64,
    pub rotor_mass_exponent: f64,
    /// Rotor mass below which the regression replaces the input (kg)
    pub rotor_mass_floor_kg: f64,
}

impl Default for Allowances {
    fn default() -> Self {
        Allowances {
            flange_mass_fraction: 0.33,
            cm_fraction: 0.65,
            housing_mass_ratio: 8000.0 / 2700.0,
            hub_to_bearing_slope: 0.007835,
            hub_to_bearing_offset_m: 0.9642,
            flange_length_coefficient_m: 0.9918,
            flange_length_exponent: 0.0068,
            rotor_mass_coefficient: 23.566,
            rotor_mass_exponent: 0.6,
            rotor_mass_floor_kg: 100.0,
        }
    }
}

impl Allowances {
    /// Default hub-center to main-bearing distance for a rotor diameter
    pub fn hub_to_bearing_m(&self, rotor_diameter_m: f64) -> f64 {
        self.hub_to_bearing_slope * rotor_diameter_m + self.hub_to_bearing_offset_m
    }

    /// Default flange length for a rotor diameter
    pub fn flange_length_m(&self, rotor_diameter_m: f64) -> f64 {
        self.flange_length_coefficient_m * (self.flange_length_exponent * rotor_diameter_m).exp()
    }

    /// Rotor mass estimate from machine rating
    pub fn rotor_mass_kg(&self, machine_rating_kw: f64) -> f64 {
        self.rotor_mass_coefficient * machine_rating_kw.powf(self.rotor_mass_exponent)
    }
}

impl DesignConstants {
    /// Parse constants from JSON text.
    pub fn from_json_str(json: &str) -> CalcResult<Self> {
        let constants: DesignConstants =
            serde_json::from_str(json).map_err(|e| CalcError::SerializationError {
                reason: format!("Invalid design constants: {}", e),
            })?;
        constants.validate()?;
        Ok(constants)
    }

    /// Load constants from a JSON file.
    pub fn from_json_file(path: &Path) -> CalcResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        Self::from_json_str(&contents)
    }

    /// Coupling slope allowance in radians
    pub fn coupling_slope_limit(&self) -> Radians {
        Degrees::from_arcmin(self.coupling_slope_limit_arcmin).into()
    }

    /// Validate all sections.
    pub fn validate(&self) -> CalcResult<()> {
        self.steel.validate()?;

        if !(self.gravity.is_finite() && self.gravity >= 0.0) {
            return Err(CalcError::invalid_input(
                "gravity",
                self.gravity.to_string(),
                "Gravity cannot be negative",
            ));
        }

        let positive = [
            ("static_safety_factor", self.static_safety_factor),
            ("bearing_safety_factor", self.bearing_safety_factor),
            ("coupling_slope_limit_arcmin", self.coupling_slope_limit_arcmin),
            ("search.seed_span_m", self.search.seed_span_m),
            ("search.coarse_step_m", self.search.coarse_step_m),
            ("search.fine_step_m", self.search.fine_step_m),
            ("search.min_outer_diameter_m", self.search.min_outer_diameter_m),
            ("fatigue.diameter_step_m", self.fatigue.diameter_step_m),
            ("fatigue.diameter_limit_m", self.fatigue.diameter_limit_m),
            ("fatigue.allowable_damage", self.fatigue.allowable_damage),
            ("spectrum.air_density", self.spectrum.air_density),
            ("spectrum.k_b", self.spectrum.k_b),
            ("spectrum.k_r", self.spectrum.k_r),
            ("spectrum.seconds_per_year", self.spectrum.seconds_per_year),
            ("allowances.cm_fraction", self.allowances.cm_fraction),
            ("allowances.housing_mass_ratio", self.allowances.housing_mass_ratio),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Must be positive and finite",
                ));
            }
        }

        if self.search.fine_step_m > self.search.coarse_step_m {
            return Err(CalcError::invalid_input(
                "search.fine_step_m",
                self.search.fine_step_m.to_string(),
                "Refinement step must not exceed the coarse step",
            ));
        }
        if !(self.search.slope_tolerance_rad >= 0.0) {
            return Err(CalcError::invalid_input(
                "search.slope_tolerance_rad",
                self.search.slope_tolerance_rad.to_string(),
                "Tolerance must be non-negative",
            ));
        }
        if self.search.sample_points < 3 {
            return Err(CalcError::invalid_input(
                "search.sample_points",
                self.search.sample_points.to_string(),
                "At least 3 stations per segment are required",
            ));
        }
        if self.search.max_iterations == 0 {
            return Err(CalcError::invalid_input(
                "search.max_iterations",
                "0",
                "Iteration cap must be positive",
            ));
        }
        if self.spectrum.bins < 3 {
            return Err(CalcError::invalid_input(
                "spectrum.bins",
                self.spectrum.bins.to_string(),
                "At least 3 spectrum bins are required",
            ));
        }
        if self.allowances.flange_mass_fraction < 0.0 {
            return Err(CalcError::invalid_input(
                "allowances.flange_mass_fraction",
                self.allowances.flange_mass_fraction.to_string(),
                "Allowance cannot be negative",
            ));
        }
        if self.allowances.cm_fraction > 1.0 {
            return Err(CalcError::invalid_input(
                "allowances.cm_fraction",
                self.allowances.cm_fraction.to_string(),
                "Center of mass fraction must lie within the shaft",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DesignConstants::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{ "static_safety_factor": 3.0, "search": { "fine_step_m": 0.001 } }"#;
        let constants = DesignConstants::from_json_str(json).unwrap();
        assert_eq!(constants.static_safety_factor, 3.0);
        assert_eq!(constants.search.fine_step_m, 0.001);
        assert_eq!(constants.search.coarse_step_m, 0.05);
        assert_eq!(constants.steel.density_kg_m3, 7800.0);
    }

    #[test]
    fn test_rejects_fine_step_larger_than_coarse() {
        let json = r#"{ "search": { "fine_step_m": 0.1 } }"#;
        let err = DesignConstants::from_json_str(json).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_malformed_json() {
        let err = DesignConstants::from_json_str("{ not json").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_regressions() {
        let allowances = Allowances::default();
        assert!((allowances.hub_to_bearing_m(126.0) - 1.951410).abs() < 1e-6);
        assert!((allowances.flange_length_m(126.0) - 0.9918 * (0.8568f64).exp()).abs() < 1e-9);
        assert!((allowances.rotor_mass_kg(5000.0) - 23.566 * 5000f64.powf(0.6)).abs() < 1e-9);
    }

    #[test]
    fn test_coupling_limit() {
        let limit = DesignConstants::default().coupling_slope_limit();
        assert!((limit.0 - 4.0 / 60.0 / 180.0 * std::f64::consts::PI).abs() < 1e-15);
    }
}
