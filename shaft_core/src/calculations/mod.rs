//! # Shaft Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(input, constants) -> Result<*Result, CalcError>` - Pure calculation function
//!
//! ## Modules
//!
//! - [`beam_segment`] - Two-support beam with Macaulay-bracket loads
//! - [`static_sizing`] - Distortion-energy diameters and slope-limited span search
//! - [`fatigue`] - Miner damage at a seat and the seat diameter search
//! - [`mass_properties`] - Shaft mass, center of mass, inertia, bearing locations
//! - [`low_speed_shaft`] - The full sizing: static, fatigue, bearings, mass

pub mod beam_segment;
pub mod fatigue;
pub mod low_speed_shaft;
pub mod mass_properties;
pub mod static_sizing;

use serde::{Deserialize, Serialize};

use crate::config::DesignConstants;
use crate::errors::CalcResult;

pub use low_speed_shaft::{FatigueMode, LowSpeedShaftInput, LowSpeedShaftResult};
pub use static_sizing::SupportTopology;

/// Enum wrapper for all calculation types stored in a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    /// Low-speed shaft with its main bearings
    LowSpeedShaft(LowSpeedShaftInput),
}

/// Result of running a [`CalculationItem`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationOutput {
    LowSpeedShaft(LowSpeedShaftResult),
}

impl CalculationItem {
    /// User-provided label
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::LowSpeedShaft(input) => &input.label,
        }
    }

    /// Calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::LowSpeedShaft(_) => "LowSpeedShaft",
        }
    }

    /// Run the calculation
    pub fn run(&self, constants: &DesignConstants) -> CalcResult<CalculationOutput> {
        match self {
            CalculationItem::LowSpeedShaft(input) => {
                low_speed_shaft::calculate(input, constants).map(CalculationOutput::LowSpeedShaft)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_tagging() {
        let input = LowSpeedShaftInput::reference_5mw(SupportTopology::FourPoint, FatigueMode::Off);
        let item = CalculationItem::LowSpeedShaft(input);
        assert_eq!(item.calc_type(), "LowSpeedShaft");
        assert_eq!(item.label(), "5MW four-point");

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"LowSpeedShaft\""));
        let roundtrip: CalculationItem = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.label(), item.label());
    }

    #[test]
    fn test_run_dispatches() {
        let input = LowSpeedShaftInput::reference_5mw(SupportTopology::ThreePoint, FatigueMode::Off);
        let output = CalculationItem::LowSpeedShaft(input).run(&DesignConstants::default()).unwrap();
        match output {
            CalculationOutput::LowSpeedShaft(result) => assert!(result.mass_kg > 0.0),
        }
    }
}
