//! Wind climate and rated operating point
//!
//! Inputs to spectrum synthesis: a Weibull wind-speed distribution with its
//! operating window, the IEC turbulence class, and the rotor's rated
//! operating point.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::errors::{CalcError, CalcResult};

/// IEC 61400-1 turbulence class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurbulenceClass {
    #[serde(rename = "A")]
    A,
    #[default]
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
}

impl TurbulenceClass {
    pub const ALL: [TurbulenceClass; 3] = [TurbulenceClass::A, TurbulenceClass::B, TurbulenceClass::C];

    /// Reference turbulence intensity I_t
    pub fn intensity(&self) -> f64 {
        match self {
            TurbulenceClass::A => 0.18,
            TurbulenceClass::B => 0.14,
            TurbulenceClass::C => 0.12,
        }
    }

    /// Parse from a class letter, ignoring case
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(TurbulenceClass::A),
            "B" => Ok(TurbulenceClass::B),
            "C" => Ok(TurbulenceClass::C),
            _ => Err(CalcError::invalid_input(
                "turbulence_class",
                s,
                "Expected A, B or C",
            )),
        }
    }
}

impl std::fmt::Display for TurbulenceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            TurbulenceClass::A => "A",
            TurbulenceClass::B => "B",
            TurbulenceClass::C => "C",
        };
        write!(f, "{}", letter)
    }
}

/// Site wind climate and service life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindClimate {
    /// Weibull scale parameter A (m/s)
    pub weibull_scale_m_s: f64,
    /// Weibull shape parameter k
    pub weibull_shape: f64,
    /// Cut-in wind speed (m/s)
    pub cut_in_m_s: f64,
    /// Rated wind speed (m/s)
    pub rated_m_s: f64,
    /// Cut-out wind speed (m/s)
    pub cut_out_m_s: f64,
    /// Fraction of time the turbine is available
    pub availability: f64,
    /// Design life (years)
    pub design_life_years: f64,
    pub turbulence_class: TurbulenceClass,
}

impl Default for WindClimate {
    /// Moderate site, IEC class II-B
    fn default() -> Self {
        WindClimate {
            weibull_scale_m_s: 8.0,
            weibull_shape: 2.0,
            cut_in_m_s: 3.0,
            rated_m_s: 11.4,
            cut_out_m_s: 25.0,
            availability: 0.95,
            design_life_years: 20.0,
            turbulence_class: TurbulenceClass::B,
        }
    }
}

impl WindClimate {
    /// Validate for spectrum synthesis.
    pub fn validate(&self) -> CalcResult<()> {
        let positive = [
            ("weibull_scale_m_s", self.weibull_scale_m_s),
            ("weibull_shape", self.weibull_shape),
            ("rated_m_s", self.rated_m_s),
            ("cut_out_m_s", self.cut_out_m_s),
            ("design_life_years", self.design_life_years),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Must be positive"));
            }
        }
        if !(self.cut_in_m_s.is_finite() && self.cut_in_m_s >= 0.0 && self.cut_in_m_s < self.cut_out_m_s) {
            return Err(CalcError::invalid_input(
                "cut_in_m_s",
                self.cut_in_m_s.to_string(),
                "Cut-in speed must be non-negative and below cut-out",
            ));
        }
        if !(self.availability > 0.0 && self.availability <= 1.0) {
            return Err(CalcError::invalid_input(
                "availability",
                self.availability.to_string(),
                "Availability must lie in (0, 1]",
            ));
        }
        Ok(())
    }

    /// Weibull probability that the wind lies between cut-in and cut-out
    pub fn operating_probability(&self) -> f64 {
        let cdf_tail = |v: f64| (-(v / self.weibull_scale_m_s).powf(self.weibull_shape)).exp();
        cdf_tail(self.cut_in_m_s) - cdf_tail(self.cut_out_m_s)
    }

    /// Operating seconds over the design life
    pub fn operating_seconds(&self, seconds_per_year: f64) -> f64 {
        self.availability * self.design_life_years * seconds_per_year * self.operating_probability()
    }
}

/// Rotor operating point at rated power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedOperation {
    /// Rotor diameter (m)
    pub rotor_diameter_m: f64,
    pub blade_number: u32,
    /// Rotor speed at rated power (rpm)
    pub rated_speed_rpm: f64,
    /// Electrical rating (kW)
    pub machine_rating_kw: f64,
    /// Drivetrain efficiency at rated power
    pub drivetrain_efficiency: f64,
}

impl RatedOperation {
    pub fn validate(&self) -> CalcResult<()> {
        let positive = [
            ("rotor_diameter_m", self.rotor_diameter_m),
            ("rated_speed_rpm", self.rated_speed_rpm),
            ("machine_rating_kw", self.machine_rating_kw),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Must be positive"));
            }
        }
        if self.blade_number == 0 {
            return Err(CalcError::invalid_input("blade_number", "0", "At least one blade is required"));
        }
        if !(self.drivetrain_efficiency > 0.0 && self.drivetrain_efficiency <= 1.0) {
            return Err(CalcError::invalid_input(
                "drivetrain_efficiency",
                self.drivetrain_efficiency.to_string(),
                "Efficiency must lie in (0, 1]",
            ));
        }
        Ok(())
    }

    /// Rotor angular speed (rad/s)
    pub fn angular_speed(&self) -> f64 {
        self.rated_speed_rpm * PI / 30.0
    }

    /// Aerodynamic torque at rated power (N·m)
    pub fn rated_torque(&self) -> f64 {
        self.machine_rating_kw * 1000.0 / self.drivetrain_efficiency / self.angular_speed()
    }

    /// Tip-speed ratio at rated wind speed
    pub fn tip_speed_ratio(&self, rated_wind_m_s: f64) -> f64 {
        self.angular_speed() * self.rotor_diameter_m / 2.0 / rated_wind_m_s
    }

    /// Characteristic load cycle count over the design life: one cycle per
    /// blade passage while operating
    pub fn characteristic_cycles(&self, climate: &WindClimate, seconds_per_year: f64) -> f64 {
        let blade_passing_hz = self.blade_number as f64 * self.rated_speed_rpm / 60.0;
        blade_passing_hz * climate.operating_seconds(seconds_per_year)
    }

    /// Rotor revolutions over the design life
    pub fn life_revolutions(&self, climate: &WindClimate, seconds_per_year: f64) -> f64 {
        self.characteristic_cycles(climate, seconds_per_year) / self.blade_number as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: f64 = 365.0 * 24.0 * 3600.0;

    fn five_mw() -> RatedOperation {
        RatedOperation {
            rotor_diameter_m: 126.0,
            blade_number: 3,
            rated_speed_rpm: 12.1,
            machine_rating_kw: 5000.0,
            drivetrain_efficiency: 0.944,
        }
    }

    #[test]
    fn test_turbulence_intensity() {
        assert_eq!(TurbulenceClass::A.intensity(), 0.18);
        assert_eq!(TurbulenceClass::B.intensity(), 0.14);
        assert_eq!(TurbulenceClass::C.intensity(), 0.12);
        assert_eq!(TurbulenceClass::from_str_flexible("b").unwrap(), TurbulenceClass::B);
        assert!(TurbulenceClass::from_str_flexible("D").is_err());
        assert_eq!(serde_json::to_string(&TurbulenceClass::C).unwrap(), "\"C\"");
    }

    #[test]
    fn test_operating_probability() {
        let climate = WindClimate::default();
        let expected = (-(3.0f64 / 8.0).powi(2)).exp() - (-(25.0f64 / 8.0).powi(2)).exp();
        assert!((climate.operating_probability() - expected).abs() < 1e-12);
        assert!(climate.operating_probability() > 0.85 && climate.operating_probability() < 0.88);
    }

    #[test]
    fn test_rated_torque() {
        let op = five_mw();
        // 5 MW / 0.944 at 12.1 rpm ≈ 4.18 MN·m
        assert!((op.rated_torque() / 1e6 - 4.18).abs() < 0.01);
        assert!((op.tip_speed_ratio(11.4) - 7.0).abs() < 0.05);
    }

    #[test]
    fn test_cycle_counts() {
        let op = five_mw();
        let climate = WindClimate::default();
        let n_f = op.characteristic_cycles(&climate, YEAR);
        let expected = 0.95 * 3.0 * 12.1 / 60.0 * 20.0 * YEAR * climate.operating_probability();
        assert!((n_f - expected).abs() / expected < 1e-12);
        assert!((op.life_revolutions(&climate, YEAR) - n_f / 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_weibull_scale_rejected() {
        let climate = WindClimate {
            weibull_scale_m_s: 0.0,
            ..WindClimate::default()
        };
        let err = climate.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_operating_window_rejected() {
        let climate = WindClimate {
            cut_in_m_s: 30.0,
            ..WindClimate::default()
        };
        assert!(climate.validate().is_err());
        let op = RatedOperation {
            drivetrain_efficiency: 1.2,
            ..five_mw()
        };
        assert!(op.validate().is_err());
    }
}
