//! Rotor loads and fatigue load spectra
//!
//! This module provides the load side of the shaft sizing: the extreme hub
//! loads that drive static sizing, the wind climate that drives the fatigue
//! spectrum, and the spectrum itself.
//!
//! # Overview
//!
//! - [`LoadChannel`] - The six hub load components (Fx, Fy, Fz, Mx, My, Mz)
//! - [`RotorLoads`] - Extreme hub loads plus rotor mass and diameter
//! - [`WindClimate`] / [`RatedOperation`] - Inputs to spectrum synthesis
//! - [`LoadSpectrum`] - Range/count bins per channel
//!
//! # Example
//!
//! ```
//! use shaft_core::loads::{LoadChannel, RotorLoads};
//!
//! let loads = RotorLoads {
//!     my: -16.7e6,
//!     fz: -8.4e5,
//!     ..RotorLoads::with_rotor(110_000.0, 126.0)
//! };
//! assert!(loads.validate().is_ok());
//! assert_eq!(loads.component(LoadChannel::My), -16.7e6);
//! ```

pub mod spectrum;
pub mod wind;

pub use spectrum::{ChannelSpectrum, ExternalSpectrum, LoadSpectrum, SpectrumArrays, SpectrumSource};
pub use wind::{RatedOperation, TurbulenceClass, WindClimate};

use serde::{Deserialize, Serialize};

use crate::config::Allowances;
use crate::errors::{CalcError, CalcResult};

/// Hub load components in shaft coordinates.
///
/// x runs along the shaft toward the gearbox, z is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadChannel {
    /// Fx - Rotor thrust
    Fx,
    /// Fy - Lateral hub shear
    Fy,
    /// Fz - Vertical hub shear
    Fz,
    /// Mx - Rotor torque
    Mx,
    /// My - Nodding moment
    My,
    /// Mz - Yawing moment
    Mz,
}

impl LoadChannel {
    /// All channels in storage order
    pub const ALL: [LoadChannel; 6] = [
        LoadChannel::Fx,
        LoadChannel::Fy,
        LoadChannel::Fz,
        LoadChannel::Mx,
        LoadChannel::My,
        LoadChannel::Mz,
    ];

    /// Short code (Fx, Fy, ...)
    pub fn code(&self) -> &'static str {
        match self {
            LoadChannel::Fx => "Fx",
            LoadChannel::Fy => "Fy",
            LoadChannel::Fz => "Fz",
            LoadChannel::Mx => "Mx",
            LoadChannel::My => "My",
            LoadChannel::Mz => "Mz",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            LoadChannel::Fx => "Rotor thrust",
            LoadChannel::Fy => "Lateral shear",
            LoadChannel::Fz => "Vertical shear",
            LoadChannel::Mx => "Rotor torque",
            LoadChannel::My => "Nodding moment",
            LoadChannel::Mz => "Yawing moment",
        }
    }

    /// Whether the channel is a moment (N·m) rather than a force (N)
    pub fn is_moment(&self) -> bool {
        matches!(self, LoadChannel::Mx | LoadChannel::My | LoadChannel::Mz)
    }

    /// Position in [`LoadChannel::ALL`]
    pub fn index(&self) -> usize {
        match self {
            LoadChannel::Fx => 0,
            LoadChannel::Fy => 1,
            LoadChannel::Fz => 2,
            LoadChannel::Mx => 3,
            LoadChannel::My => 4,
            LoadChannel::Mz => 5,
        }
    }

    /// Unit label for display
    pub fn unit(&self) -> &'static str {
        if self.is_moment() {
            "N·m"
        } else {
            "N"
        }
    }
}

impl std::fmt::Display for LoadChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Extreme hub loads with the rotor properties they come from.
///
/// Forces in N, moments in N·m, at the hub center. A rotor mass below the
/// regression floor is replaced by an estimate from the machine rating
/// (see [`RotorLoads::effective_rotor_mass`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotorLoads {
    #[serde(default)]
    pub fx: f64,
    #[serde(default)]
    pub fy: f64,
    #[serde(default)]
    pub fz: f64,
    #[serde(default)]
    pub mx: f64,
    #[serde(default)]
    pub my: f64,
    #[serde(default)]
    pub mz: f64,
    /// Rotor mass (kg); 0 means estimate from rating
    #[serde(default)]
    pub rotor_mass_kg: f64,
    /// Rotor diameter (m)
    pub rotor_diameter_m: f64,
}

impl RotorLoads {
    /// Unloaded rotor of a given mass and diameter
    pub fn with_rotor(rotor_mass_kg: f64, rotor_diameter_m: f64) -> Self {
        RotorLoads {
            fx: 0.0,
            fy: 0.0,
            fz: 0.0,
            mx: 0.0,
            my: 0.0,
            mz: 0.0,
            rotor_mass_kg,
            rotor_diameter_m,
        }
    }

    /// Value of one component
    pub fn component(&self, channel: LoadChannel) -> f64 {
        match channel {
            LoadChannel::Fx => self.fx,
            LoadChannel::Fy => self.fy,
            LoadChannel::Fz => self.fz,
            LoadChannel::Mx => self.mx,
            LoadChannel::My => self.my,
            LoadChannel::Mz => self.mz,
        }
    }

    /// Rotor mass used by the sizing, falling back to the rating regression
    pub fn effective_rotor_mass(&self, allowances: &Allowances, machine_rating_kw: f64) -> f64 {
        if self.rotor_mass_kg < allowances.rotor_mass_floor_kg {
            allowances.rotor_mass_kg(machine_rating_kw)
        } else {
            self.rotor_mass_kg
        }
    }

    /// Validate that all components are finite and the rotor is physical
    pub fn validate(&self) -> CalcResult<()> {
        for channel in LoadChannel::ALL {
            let value = self.component(channel);
            if !value.is_finite() {
                return Err(CalcError::invalid_input(
                    format!("rotor_loads.{}", channel.code().to_lowercase()),
                    value.to_string(),
                    "Load component must be finite",
                ));
            }
        }
        if !(self.rotor_mass_kg.is_finite() && self.rotor_mass_kg >= 0.0) {
            return Err(CalcError::invalid_input(
                "rotor_mass_kg",
                self.rotor_mass_kg.to_string(),
                "Rotor mass cannot be negative",
            ));
        }
        if !(self.rotor_diameter_m.is_finite() && self.rotor_diameter_m > 0.0) {
            return Err(CalcError::invalid_input(
                "rotor_diameter_m",
                self.rotor_diameter_m.to_string(),
                "Rotor diameter must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_codes_and_order() {
        for (i, channel) in LoadChannel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
        assert_eq!(LoadChannel::Mx.code(), "Mx");
        assert!(LoadChannel::Mz.is_moment());
        assert!(!LoadChannel::Fy.is_moment());
        assert_eq!(LoadChannel::Fx.unit(), "N");
    }

    #[test]
    fn test_rotor_mass_fallback() {
        let allowances = Allowances::default();
        let estimated = RotorLoads::with_rotor(0.0, 126.0);
        let expected = 23.566 * 5000f64.powf(0.6);
        assert!((estimated.effective_rotor_mass(&allowances, 5000.0) - expected).abs() < 1e-9);

        let given = RotorLoads::with_rotor(110_000.0, 126.0);
        assert_eq!(given.effective_rotor_mass(&allowances, 5000.0), 110_000.0);
    }

    #[test]
    fn test_validation() {
        assert!(RotorLoads::with_rotor(1000.0, 0.0).validate().is_err());
        assert!(RotorLoads::with_rotor(-1.0, 100.0).validate().is_err());
        let bad = RotorLoads {
            my: f64::NAN,
            ..RotorLoads::with_rotor(1000.0, 100.0)
        };
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("rotor_loads.my"));
    }

    #[test]
    fn test_serde_defaults() {
        let loads: RotorLoads = serde_json::from_str(r#"{ "mx": 4.18e6, "rotor_diameter_m": 126.0 }"#).unwrap();
        assert_eq!(loads.mx, 4.18e6);
        assert_eq!(loads.fz, 0.0);
        assert_eq!(loads.rotor_mass_kg, 0.0);
    }
}
