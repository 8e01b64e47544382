//! # Seat Fatigue
//!
//! Palmgren-Miner damage at a bearing seat and the diameter search that
//! grows the seat until the damage is acceptable.
//!
//! ## Damage
//!
//! Spectrum bins are cumulative: `N` cycles reach or exceed the range at `N`.
//! Damage is the Miner integral over the cycle axis plus the once-per-revolution
//! bending from gravity:
//!
//! ```text
//! D = ∫ dN / N_f(S(N))  +  N_rev / N_f(S_det)
//! ```
//!
//! The integral uses Simpson's rule on the bin counts.
//!
//! ### Shared-axis spectra
//! All channels combine per bin into a von Mises range
//! `σ = √((σ_b + σ_n)² + 3τ²)`, corrected with Goodman at the compressive
//! mean stress from mean thrust, mean torque and axial gravity.
//!
//! ### Independent-axis spectra
//! Each channel is integrated on its own cycle axis. Thrust enters at half its
//! range; bending, shear and torque enter at their full range. Channels with
//! no non-zero range or count are skipped.
//!
//! ## Axial gravity
//! The shaft body weight is recomputed for every trial diameter, so a growing
//! seat also grows the compressive mean stress it carries.
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::calculations::fatigue::SeatSection;
//!
//! let section = SeatSection::new(1.0, 0.1);
//! assert!((section.polar_moment() - 2.0 * section.second_moment()).abs() < 1e-15);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::FatigueSettings;
use crate::errors::{CalcError, CalcResult};
use crate::loads::{LoadChannel, LoadSpectrum};
use crate::materials::FatigueMaterial;
use crate::numeric;
use crate::units::Radians;

/// Which seat is being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Seat {
    /// Upwind bearing seat, carrying the hub bending
    #[serde(rename = "hub-side")]
    HubSide,
    /// Downwind bearing or gearbox seat
    #[serde(rename = "gearbox-side")]
    GearboxSide,
}

impl Seat {
    /// Short tag used in reports and errors
    pub fn code(&self) -> &'static str {
        match self {
            Seat::HubSide => "hub-side",
            Seat::GearboxSide => "gearbox-side",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Seat::HubSide => "hub-side seat",
            Seat::GearboxSide => "gearbox-side seat",
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Hollow circular section at a seat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeatSection {
    pub outer_m: f64,
    pub bore_m: f64,
}

impl SeatSection {
    pub fn new(outer_m: f64, bore_m: f64) -> Self {
        SeatSection { outer_m, bore_m }
    }

    pub fn area(&self) -> f64 {
        PI / 4.0 * (self.outer_m.powi(2) - self.bore_m.powi(2))
    }

    pub fn second_moment(&self) -> f64 {
        PI / 64.0 * (self.outer_m.powi(4) - self.bore_m.powi(4))
    }

    pub fn polar_moment(&self) -> f64 {
        2.0 * self.second_moment()
    }

    /// Bending stress per unit moment at the outer fiber (1/m³)
    fn bending_factor(&self) -> f64 {
        self.outer_m / (2.0 * self.second_moment())
    }

    /// Shear stress per unit torque at the outer fiber (1/m³)
    fn torsion_factor(&self) -> f64 {
        self.outer_m / (2.0 * self.polar_moment())
    }
}

/// Hollow frustum running from the seat being sized to a fixed partner diameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShaftBody {
    /// Outer diameter at the far end of the body (m)
    pub partner_diameter_m: f64,
    pub length_m: f64,
    /// Steel density times gravity (N/m³)
    pub specific_weight_n_m3: f64,
}

impl ShaftBody {
    /// Body weight with the seat end at `section` (N)
    pub fn weight_n(&self, section: &SeatSection) -> f64 {
        let (a, b) = (section.outer_m, self.partner_diameter_m);
        let volume = PI / 12.0 * (a * a + b * b + a * b) * self.length_m
            - PI / 4.0 * section.bore_m.powi(2) * self.length_m;
        self.specific_weight_n_m3 * volume
    }
}

/// Loads acting at one seat besides the spectrum itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeatLoading {
    pub seat: Seat,
    pub shaft_angle: Radians,
    /// Whether the hub bending moments reach this seat
    pub carries_bending: bool,
    /// Lever arm turning hub shear ranges into seat bending (m)
    pub shear_lever_m: f64,
    /// Rotor weight whose axial component loads the seat (N)
    pub rotor_weight_n: f64,
    pub shaft_body: ShaftBody,
    /// Gravity bending reversed once per revolution (N·m)
    pub deterministic_moment_nm: f64,
}

impl SeatLoading {
    /// Rotor plus shaft weight at a trial section (N)
    pub fn axial_weight_n(&self, section: &SeatSection) -> f64 {
        self.rotor_weight_n + self.shaft_body.weight_n(section)
    }
}

/// Damage split by source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub stochastic: f64,
    pub deterministic: f64,
}

impl Damage {
    pub fn total(&self) -> f64 {
        self.stochastic + self.deterministic
    }
}

/// Converged seat diameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeatFatigue {
    pub seat: Seat,
    /// Seat outer diameter (m)
    pub diameter_m: f64,
    pub damage: Damage,
    /// Diameters tried, including the accepted one
    pub trials: usize,
}

/// Compressive mean von Mises stress at the seat (Pa)
fn mean_stress(spectrum: &LoadSpectrum, loading: &SeatLoading, section: &SeatSection) -> f64 {
    let angle = loading.shaft_angle.0;
    let area = section.area();
    let shear = spectrum.mx_mean * section.torsion_factor();
    let normal = spectrum.fx_mean / area * angle.cos() + loading.axial_weight_n(section) * angle.sin() / area;
    (normal * normal + 3.0 * shear * shear).sqrt()
}

fn shared_axis_damage(
    material: &FatigueMaterial,
    spectrum: &LoadSpectrum,
    loading: &SeatLoading,
    section: &SeatSection,
    mean: f64,
) -> CalcResult<f64> {
    let bin = |channel: LoadChannel| &spectrum.channel(channel).ranges;
    let counts = &spectrum.channel(LoadChannel::Fx).counts;
    let (fx, fy, fz) = (bin(LoadChannel::Fx), bin(LoadChannel::Fy), bin(LoadChannel::Fz));
    let (mx, my, mz) = (bin(LoadChannel::Mx), bin(LoadChannel::My), bin(LoadChannel::Mz));

    let cos = loading.shaft_angle.0.cos();
    let area = section.area();
    let bending = section.bending_factor();
    let torsion = section.torsion_factor();

    let inverse_life: Vec<f64> = (0..counts.len())
        .map(|i| {
            let bend = if loading.carries_bending {
                (my[i].hypot(mz[i]) + fy[i].hypot(fz[i]) * loading.shear_lever_m) * bending
            } else {
                0.0
            };
            let shear = mx[i].abs() * torsion;
            let normal = fx[i] / area * cos;
            let range = ((bend + normal).powi(2) + 3.0 * shear * shear).sqrt();
            1.0 / material.cycles_to_failure(material.goodman_compressive(range, mean))
        })
        .collect();

    numeric::simpson(counts, &inverse_life)
}

fn independent_axis_damage(
    material: &FatigueMaterial,
    spectrum: &LoadSpectrum,
    loading: &SeatLoading,
    section: &SeatSection,
) -> CalcResult<f64> {
    let area = section.area();
    let bending = section.bending_factor();
    let torsion = section.torsion_factor();

    let mut damage = 0.0;
    for channel in LoadChannel::ALL {
        // Thrust is reversed about zero; the others are peak-to-peak
        let amplitude_fraction = if channel == LoadChannel::Fx { 0.5 } else { 1.0 };
        let stress_per_load = match channel {
            LoadChannel::Fx => 1.0 / area,
            LoadChannel::Mx => 3f64.sqrt() * torsion,
            LoadChannel::Fy | LoadChannel::Fz if loading.carries_bending => loading.shear_lever_m * bending,
            LoadChannel::My | LoadChannel::Mz if loading.carries_bending => bending,
            _ => continue,
        };
        let bins = spectrum.channel(channel);
        if bins.is_degenerate() || stress_per_load == 0.0 {
            tracing::debug!(seat = %loading.seat, channel = %channel, "skipping channel without load");
            continue;
        }
        let inverse_life: Vec<f64> = bins
            .ranges
            .iter()
            .map(|range| 1.0 / material.cycles_to_failure(amplitude_fraction * range * stress_per_load))
            .collect();
        damage += numeric::simpson(&bins.counts, &inverse_life)?;
    }
    Ok(damage)
}

/// Damage at one seat diameter.
pub fn seat_damage(
    material: &FatigueMaterial,
    spectrum: &LoadSpectrum,
    loading: &SeatLoading,
    section: &SeatSection,
) -> CalcResult<Damage> {
    if !(section.outer_m > section.bore_m && section.bore_m >= 0.0) {
        return Err(CalcError::invalid_input(
            "seat_diameter_m",
            section.outer_m.to_string(),
            "Seat diameter must exceed the bore",
        ));
    }

    let (stochastic, mean) = if spectrum.is_shared_axis() {
        let mean = mean_stress(spectrum, loading, section);
        (shared_axis_damage(material, spectrum, loading, section, mean)?, mean)
    } else {
        (independent_axis_damage(material, spectrum, loading, section)?, 0.0)
    };

    let deterministic_stress = (loading.deterministic_moment_nm * section.bending_factor()).abs();
    let deterministic = if deterministic_stress > 0.0 {
        spectrum.rotor_revolutions
            / material.cycles_to_failure(material.goodman_compressive(deterministic_stress, mean))
    } else {
        0.0
    };

    Ok(Damage {
        stochastic: numeric::ensure_finite(stochastic, "stochastic_damage")?,
        deterministic: numeric::ensure_finite(deterministic, "deterministic_damage")?,
    })
}

/// Grow a seat from `start_diameter_m` until its damage is acceptable.
///
/// The bore stays fixed. Fails with `InfeasibleFatigue` once the diameter
/// limit has been tried without success.
pub fn size_seat(
    material: &FatigueMaterial,
    spectrum: &LoadSpectrum,
    loading: &SeatLoading,
    start_diameter_m: f64,
    bore_m: f64,
    settings: &FatigueSettings,
) -> CalcResult<SeatFatigue> {
    let mut diameter = start_diameter_m;
    let mut trials = 0usize;
    loop {
        trials += 1;
        let damage = seat_damage(material, spectrum, loading, &SeatSection::new(diameter, bore_m))?;
        tracing::debug!(
            seat = %loading.seat,
            diameter,
            damage = damage.total(),
            "fatigue trial"
        );

        if damage.total() <= settings.allowable_damage {
            tracing::info!(seat = %loading.seat, diameter, damage = damage.total(), trials, "seat fatigue satisfied");
            return Ok(SeatFatigue {
                seat: loading.seat,
                diameter_m: diameter,
                damage,
                trials,
            });
        }
        if diameter >= settings.diameter_limit_m {
            return Err(CalcError::infeasible_fatigue(
                loading.seat.code(),
                diameter,
                settings.diameter_limit_m,
                damage.total(),
            ));
        }
        diameter = (diameter + settings.diameter_step_m).min(settings.diameter_limit_m);
    }
}
