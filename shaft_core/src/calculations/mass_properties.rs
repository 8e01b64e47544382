//! # Shaft Mass Properties
//!
//! Mass, length, center of mass and inertia of the finished shaft, and the
//! nacelle-frame locations of its bearings.
//!
//! The shaft body is a frustum between the two seats, a cylinder under each
//! bearing face, and in the four-point layout a cylinder at the gearbox-end
//! diameter over the gearbox-side span. The bore runs through all of it.
//! Flange mass is a fixed fraction of the body.
//!
//! Locations are walked back from the gearbox upwind face along the tilted
//! shaft axis, so a positive shaft angle raises the hub end.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::static_sizing::SupportTopology;
use crate::config::Allowances;
use crate::errors::{CalcError, CalcResult};
use crate::units::Radians;

/// Seat diameters, spans and bearing faces of the finished shaft.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShaftOutline {
    pub topology: SupportTopology,
    /// Hub-side seat outer diameter (m)
    pub hub_seat_diameter_m: f64,
    /// Second seat outer diameter (m)
    pub second_seat_diameter_m: f64,
    /// Gearbox-end outer diameter (m)
    pub gearbox_end_diameter_m: f64,
    pub bore_m: f64,
    pub main_span_m: f64,
    /// Zero in the three-point layout
    pub gearbox_span_m: f64,
    pub upwind_face_width_m: f64,
    pub downwind_face_width_m: f64,
    pub flange_length_m: f64,
}

/// Where the shaft meets the gearbox.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GearboxMounting {
    /// Gearbox center of mass in the nacelle frame (m)
    pub gearbox_cm: [f64; 3],
    pub gearbox_length_m: f64,
    pub shaft_angle: Radians,
    pub shrink_disc_mass_kg: f64,
}

impl GearboxMounting {
    /// Gearbox upwind face, the downwind end of the shaft
    pub fn downwind_end(&self) -> [f64; 3] {
        [
            self.gearbox_cm[0] - self.gearbox_length_m / 2.0,
            self.gearbox_cm[1],
            self.gearbox_cm[2],
        ]
    }

    /// Point `distance` upwind of the gearbox face along the shaft axis
    pub fn upwind_of_gearbox(&self, distance: f64) -> [f64; 3] {
        let [x, y, z] = self.downwind_end();
        let angle = self.shaft_angle.0;
        [x - distance * angle.cos(), y, z + distance * angle.sin()]
    }
}

/// Finished shaft properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShaftMassProperties {
    /// Shaft with flange and shrink disc (kg)
    pub mass_kg: f64,
    /// Overall length including the flange (m)
    pub length_m: f64,
    pub cm: [f64; 3],
    /// Principal inertia about the center of mass (kg·m²)
    pub inertia: [f64; 3],
    /// Upwind bearing center (m)
    pub upwind_bearing_location: [f64; 3],
    /// Second seat center (m)
    pub second_bearing_location: [f64; 3],
}

impl ShaftOutline {
    pub fn validate(&self) -> CalcResult<()> {
        let outers = [
            ("hub_seat_diameter_m", self.hub_seat_diameter_m),
            ("second_seat_diameter_m", self.second_seat_diameter_m),
            ("gearbox_end_diameter_m", self.gearbox_end_diameter_m),
        ];
        for (field, outer) in outers {
            if !(outer.is_finite() && outer > 0.0 && outer >= self.bore_m) {
                return Err(CalcError::invalid_input(
                    field,
                    outer.to_string(),
                    "Outer diameter must be positive and at least the bore",
                ));
            }
        }
        let lengths = [
            ("main_span_m", self.main_span_m),
            ("gearbox_span_m", self.gearbox_span_m),
            ("upwind_face_width_m", self.upwind_face_width_m),
            ("downwind_face_width_m", self.downwind_face_width_m),
            ("flange_length_m", self.flange_length_m),
        ];
        for (field, value) in lengths {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Length cannot be negative"));
            }
        }
        let faces = (self.upwind_face_width_m + self.downwind_face_width_m) / 2.0;
        if self.main_span_m <= faces {
            return Err(CalcError::invalid_input(
                "main_span_m",
                self.main_span_m.to_string(),
                format!("Main span must exceed the half face widths ({:.4} m)", faces),
            ));
        }
        Ok(())
    }

    /// Frustum length between the bearing faces
    fn free_span(&self) -> f64 {
        self.main_span_m - (self.upwind_face_width_m + self.downwind_face_width_m) / 2.0
    }

    /// Body volume less the bore (m³)
    pub fn volume(&self) -> f64 {
        let (d1, d2, di) = (self.hub_seat_diameter_m, self.second_seat_diameter_m, self.bore_m);
        let free = self.free_span();
        let ring = |outer: f64, length: f64| PI / 4.0 * (outer * outer - di * di) * length;

        let frustum = PI / 12.0 * (d1 * d1 + d2 * d2 + d1 * d2) * free - PI / 4.0 * di * di * free;
        let seats = ring(d1, self.upwind_face_width_m) + ring(d2, self.downwind_face_width_m);
        let gearbox = match self.topology {
            SupportTopology::ThreePoint => 0.0,
            SupportTopology::FourPoint => ring(self.gearbox_end_diameter_m, self.gearbox_span_m),
        };
        frustum + seats + gearbox
    }

    /// Overall length including the flange (m)
    pub fn length(&self) -> f64 {
        self.main_span_m
            + self.gearbox_span_m
            + (self.upwind_face_width_m + self.downwind_face_width_m) / 2.0
            + self.flange_length_m
    }
}

/// Mass, center of mass, inertia and bearing locations of the shaft.
pub fn shaft_mass_properties(
    outline: &ShaftOutline,
    mounting: &GearboxMounting,
    density_kg_m3: f64,
    allowances: &Allowances,
) -> CalcResult<ShaftMassProperties> {
    outline.validate()?;

    let body = density_kg_m3 * outline.volume() * (1.0 + allowances.flange_mass_fraction);
    let mass = body + mounting.shrink_disc_mass_kg;
    let length = outline.length();

    let downwind = mounting.downwind_end();
    let body_cm = mounting.upwind_of_gearbox(allowances.cm_fraction * length);
    let cm = if mass > 0.0 {
        let mut blended = [0.0; 3];
        for (axis, value) in blended.iter_mut().enumerate() {
            *value = (body * body_cm[axis] + mounting.shrink_disc_mass_kg * downwind[axis]) / mass;
        }
        blended
    } else {
        downwind
    };

    let (di, d_out) = (outline.bore_m, outline.hub_seat_diameter_m);
    let ixx = mass * (di * di + d_out * d_out) / 8.0;
    let iyy = mass * (di * di + d_out * d_out + 4.0 / 3.0 * length * length) / 16.0;

    let second = outline.gearbox_span_m + outline.downwind_face_width_m / 2.0;
    let upwind = second + outline.main_span_m;

    tracing::debug!(mass, length, body, "shaft mass properties");

    Ok(ShaftMassProperties {
        mass_kg: mass,
        length_m: length,
        cm,
        inertia: [ixx, iyy, iyy],
        upwind_bearing_location: mounting.upwind_of_gearbox(upwind),
        second_bearing_location: mounting.upwind_of_gearbox(second),
    })
}
