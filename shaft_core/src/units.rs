//! # Unit Types
//!
//! Type-safe wrappers for the units the sizing routines cross between.
//! The shaft model works in SI internally; the distortion-energy sizing
//! formula and its yield strength are carried in US customary units, so
//! the conversions live here rather than as loose literals.
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::units::{Inches, Meters, NewtonMeters, InchPounds};
//!
//! let d_m: Meters = Inches(40.0).into();
//! assert!((d_m.0 - 1.016).abs() < 1e-4);
//!
//! let m: InchPounds = NewtonMeters(1000.0).into();
//! assert!((m.0 - 8850.745).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};

/// Meters per inch (US survey inch, as used by the sizing regressions)
pub const METERS_PER_INCH: f64 = 0.0254000508001;

/// Inch-pounds per newton-meter
pub const INLB_PER_NM: f64 = 8.850745454036;

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Inches> for Meters {
    fn from(inches: Inches) -> Self {
        Meters(inches.0 * METERS_PER_INCH)
    }
}

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

impl Kilograms {
    /// Weight under the given gravitational acceleration
    pub fn weight(self, gravity: f64) -> Newtons {
        Newtons(self.0 * gravity)
    }
}

/// Moment in newton-meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMeters(pub f64);

/// Moment in inch-pounds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InchPounds(pub f64);

impl From<NewtonMeters> for InchPounds {
    fn from(nm: NewtonMeters) -> Self {
        InchPounds(nm.0 * INLB_PER_NM)
    }
}

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl Degrees {
    /// Build from arc-minutes
    pub fn from_arcmin(arcmin: f64) -> Self {
        Degrees(arcmin / 60.0)
    }
}

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_to_meters() {
        let d: Meters = Inches(100.0).into();
        assert!((d.0 - 2.54000508001).abs() < 1e-12);
    }

    #[test]
    fn test_kilonewton_meter_to_inch_pounds() {
        let m: InchPounds = NewtonMeters(1000.0).into();
        assert!((m.0 - 8850.745454036).abs() < 1e-6);
    }

    #[test]
    fn test_arcmin_to_radians() {
        let limit: Radians = Degrees::from_arcmin(3.0).into();
        assert!((limit.0 - 3.0 / 60.0 / 180.0 * std::f64::consts::PI).abs() < 1e-15);
    }

    #[test]
    fn test_kilograms_serialize_bare() {
        let w = Kilograms(41.5);
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, "41.5");

        let roundtrip: Kilograms = serde_json::from_str(&json).unwrap();
        assert_eq!(w, roundtrip);
        assert!((roundtrip.weight(9.81).0 - 407.115).abs() < 1e-9);
    }
}
