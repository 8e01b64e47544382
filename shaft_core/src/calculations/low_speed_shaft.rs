//! # Low-Speed Shaft Sizing
//!
//! Sizes a wind-turbine low-speed shaft and its main bearings from the hub
//! loads and the position of the gearbox.
//!
//! ## Procedure
//!
//! 1. Static sizing: distortion-energy diameters and the longest bearing span
//!    that keeps every bearing within its misalignment allowance
//!    ([`static_sizing`](super::static_sizing)).
//! 2. Fatigue (optional): a load spectrum is synthesized from the wind climate
//!    or taken from supplied arrays, and each seat grows until its Miner
//!    damage is at most one ([`fatigue`](super::fatigue)). Without a fatigue
//!    check each seat is rounded up to the next catalog bore of its bearing.
//! 3. Bearings are looked up at the final seat diameters and the shaft mass
//!    properties are finalized ([`mass_properties`](super::mass_properties)).
//!
//! ## Frames
//!
//! Hub loads are in shaft coordinates: x along the shaft toward the gearbox,
//! z up. Positions are in the nacelle frame with the tower axis at the origin,
//! the hub at `x = -overhang` and the gearbox center at `gearbox_cm`.
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::calculations::low_speed_shaft::{calculate, FatigueMode, LowSpeedShaftInput};
//! use shaft_core::calculations::static_sizing::SupportTopology;
//! use shaft_core::config::DesignConstants;
//!
//! let input = LowSpeedShaftInput::reference_5mw(SupportTopology::ThreePoint, FatigueMode::Off);
//! let result = calculate(&input, &DesignConstants::default()).unwrap();
//!
//! println!("Shaft: {:.3} m long, {:.0} kg", result.length_m, result.mass_kg);
//! assert!(result.hub_seat_diameter_m >= result.bore_m);
//! ```

use serde::{Deserialize, Serialize};

use super::fatigue::{self, Damage, Seat, SeatLoading, ShaftBody};
use super::mass_properties::{self, GearboxMounting, ShaftOutline};
use super::static_sizing::{self, ShaftGeometry, ShaftLoadCase, StaticSizing, SupportReaction, SupportTopology};
use crate::bearings::{self, BearingAssembly, BearingSeat, BearingType};
use crate::config::DesignConstants;
use crate::errors::{CalcError, CalcResult};
use crate::loads::{ExternalSpectrum, LoadChannel, LoadSpectrum, RatedOperation, RotorLoads, WindClimate};
use crate::materials::FatigueMaterial;
use crate::units::{Degrees, Kilograms, Radians};

/// Whether and how the seats are checked for fatigue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FatigueMode {
    /// Seats rounded up from their static diameters to catalog bores
    #[default]
    #[serde(rename = "off")]
    Off,
    /// Spectrum synthesized from the wind climate
    #[serde(rename = "synthesized")]
    Synthesized,
    /// Spectrum supplied as range/count arrays
    #[serde(rename = "external")]
    External,
}

impl FatigueMode {
    pub const ALL: [FatigueMode; 3] = [FatigueMode::Off, FatigueMode::Synthesized, FatigueMode::External];

    pub fn display_name(&self) -> &'static str {
        match self {
            FatigueMode::Off => "off",
            FatigueMode::Synthesized => "synthesized",
            FatigueMode::External => "external",
        }
    }

    /// Parse from a name, ignoring case
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" | "none" | "0" => Ok(FatigueMode::Off),
            "synthesized" | "synthesised" | "ds472" | "1" => Ok(FatigueMode::Synthesized),
            "external" | "2" => Ok(FatigueMode::External),
            _ => Err(CalcError::invalid_input(
                "fatigue_mode",
                s,
                "Expected off, synthesized or external",
            )),
        }
    }
}

impl std::fmt::Display for FatigueMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn default_blade_number() -> u32 {
    3
}

fn default_drivetrain_efficiency() -> f64 {
    0.944
}

/// Input parameters for a low-speed shaft.
///
/// SI units throughout. Zero in an optional length or strength field means
/// "use the default".
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "LSS-1",
///   "topology": "three-point",
///   "rotor_loads": { "fx": 599610, "fz": -842710, "mx": 4180000, "my": -16665000,
///                    "rotor_mass_kg": 142585.75, "rotor_diameter_m": 126.0 },
///   "machine_rating_kw": 5000,
///   "gearbox_mass_kg": 56456, "gearbox_length_m": 1.512, "gearbox_cm": [0.1, 0.0, 0.8],
///   "carrier_mass_kg": 8000, "shrink_disc_mass_kg": 1666.5,
///   "overhang_m": 5.0191, "shaft_angle_deg": 5.0, "shaft_ratio": 0.1,
///   "upwind_bearing": "SRB", "downwind_bearing": "TRB2",
///   "fatigue_mode": "synthesized", "rated_speed_rpm": 12.1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowSpeedShaftInput {
    /// User label (e.g., "LSS-1")
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub topology: SupportTopology,

    /// Extreme hub loads with rotor mass and diameter
    pub rotor_loads: RotorLoads,

    /// Hub loads already contain the rotor weight
    #[serde(default)]
    pub rotor_weight_in_loads: bool,

    /// Electrical rating (kW)
    pub machine_rating_kw: f64,

    #[serde(default)]
    pub gearbox_mass_kg: f64,

    pub gearbox_length_m: f64,

    /// Gearbox center of mass in the nacelle frame (m)
    pub gearbox_cm: [f64; 3],

    #[serde(default)]
    pub carrier_mass_kg: f64,

    #[serde(default)]
    pub shrink_disc_mass_kg: f64,

    /// Tower axis to hub center (m)
    pub overhang_m: f64,

    /// Shaft tilt (degrees, hub end up)
    pub shaft_angle_deg: f64,

    /// Bore to outer diameter ratio; 0 for a solid shaft
    #[serde(default)]
    pub shaft_ratio: f64,

    pub upwind_bearing: BearingType,

    /// Downwind bearing, or the gearbox-side seat in the three-point layout
    pub downwind_bearing: BearingType,

    #[serde(default)]
    pub fatigue_mode: FatigueMode,

    /// Ultimate strength override (Pa)
    #[serde(default)]
    pub ultimate_strength_pa: f64,

    /// S-N inverse slope m; 0 derives it from the knee
    #[serde(default)]
    pub fatigue_exponent: f64,

    #[serde(default)]
    pub climate: WindClimate,

    /// Rotor speed at rated power (rpm)
    #[serde(default)]
    pub rated_speed_rpm: f64,

    #[serde(default = "default_drivetrain_efficiency")]
    pub drivetrain_efficiency: f64,

    #[serde(default = "default_blade_number")]
    pub blade_number: u32,

    /// Hub center to upwind bearing (m); 0 uses the rotor diameter regression
    #[serde(default)]
    pub hub_to_bearing_m: f64,

    /// Flange length (m); 0 uses the rotor diameter regression
    #[serde(default)]
    pub flange_length_m: f64,

    /// Range/count arrays for [`FatigueMode::External`]
    #[serde(default)]
    pub external_spectrum: Option<ExternalSpectrum>,
}

impl LowSpeedShaftInput {
    /// NREL 5 MW rotor loads on a moderate site, with a nacelle long enough
    /// for the slope-limited spans of both layouts.
    pub fn reference_5mw(topology: SupportTopology, fatigue_mode: FatigueMode) -> Self {
        LowSpeedShaftInput {
            label: format!("5MW {}", topology.code()),
            topology,
            rotor_loads: RotorLoads {
                fx: 599_610.0,
                fy: 186_780.0,
                fz: -842_710.0,
                mx: 4.18e6,
                my: -16_665_000.0,
                mz: 2_896_300.0,
                rotor_mass_kg: 142_585.75,
                rotor_diameter_m: 126.0,
            },
            rotor_weight_in_loads: false,
            machine_rating_kw: 5000.0,
            gearbox_mass_kg: 56_456.0,
            gearbox_length_m: 1.512,
            gearbox_cm: [3.2, 0.0, 0.8],
            carrier_mass_kg: 8000.0,
            shrink_disc_mass_kg: 1666.5,
            overhang_m: 6.5,
            shaft_angle_deg: 5.0,
            shaft_ratio: 0.1,
            upwind_bearing: BearingType::Srb,
            downwind_bearing: BearingType::Trb2,
            fatigue_mode,
            ultimate_strength_pa: 0.0,
            fatigue_exponent: 0.0,
            climate: WindClimate::default(),
            rated_speed_rpm: 12.1,
            drivetrain_efficiency: default_drivetrain_efficiency(),
            blade_number: default_blade_number(),
            hub_to_bearing_m: 0.0,
            flange_length_m: 0.0,
            external_spectrum: None,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        self.rotor_loads.validate()?;

        if !(self.machine_rating_kw.is_finite() && self.machine_rating_kw > 0.0) {
            return Err(CalcError::invalid_input(
                "machine_rating_kw",
                self.machine_rating_kw.to_string(),
                "Machine rating must be positive",
            ));
        }
        if !(self.overhang_m.is_finite() && self.overhang_m > 0.0) {
            return Err(CalcError::invalid_input(
                "overhang_m",
                self.overhang_m.to_string(),
                "Overhang must be positive",
            ));
        }
        let non_negative = [
            ("gearbox_mass_kg", self.gearbox_mass_kg),
            ("gearbox_length_m", self.gearbox_length_m),
            ("carrier_mass_kg", self.carrier_mass_kg),
            ("shrink_disc_mass_kg", self.shrink_disc_mass_kg),
            ("ultimate_strength_pa", self.ultimate_strength_pa),
            ("fatigue_exponent", self.fatigue_exponent),
            ("hub_to_bearing_m", self.hub_to_bearing_m),
            ("flange_length_m", self.flange_length_m),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Cannot be negative"));
            }
        }
        if let Some(value) = self.gearbox_cm.iter().find(|v| !v.is_finite()) {
            return Err(CalcError::invalid_input("gearbox_cm", value.to_string(), "Position must be finite"));
        }
        if !(self.shaft_angle_deg.is_finite() && self.shaft_angle_deg.abs() < 90.0) {
            return Err(CalcError::invalid_input(
                "shaft_angle_deg",
                self.shaft_angle_deg.to_string(),
                "Shaft angle must be below 90°",
            ));
        }
        if !(self.shaft_ratio >= 0.0 && self.shaft_ratio < 1.0) {
            return Err(CalcError::invalid_input(
                "shaft_ratio",
                self.shaft_ratio.to_string(),
                "Bore ratio must lie in [0, 1)",
            ));
        }

        match self.fatigue_mode {
            FatigueMode::Off => {}
            FatigueMode::Synthesized => {
                self.climate.validate()?;
                self.rated_operation().validate()?;
            }
            FatigueMode::External => match &self.external_spectrum {
                Some(spectrum) => spectrum.validate()?,
                None => return Err(CalcError::missing_field("external_spectrum")),
            },
        }
        Ok(())
    }

    /// Rated operating point of the rotor
    pub fn rated_operation(&self) -> RatedOperation {
        RatedOperation {
            rotor_diameter_m: self.rotor_loads.rotor_diameter_m,
            blade_number: self.blade_number,
            rated_speed_rpm: self.rated_speed_rpm,
            machine_rating_kw: self.machine_rating_kw,
            drivetrain_efficiency: self.drivetrain_efficiency,
        }
    }

    pub fn shaft_angle(&self) -> Radians {
        Degrees(self.shaft_angle_deg).into()
    }

    /// Room for the bearing spans between the upwind bearing and the gearbox face (m)
    pub fn span_budget_m(&self, hub_to_bearing_m: f64) -> f64 {
        self.overhang_m - hub_to_bearing_m + (self.gearbox_cm[0] - self.gearbox_length_m / 2.0)
    }
}

/// One bearing position on the finished shaft
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BearingResult {
    pub seat: BearingSeat,
    /// Bearing center in the nacelle frame (m)
    pub location: [f64; 3],
    /// Bearing plus housing
    pub assembly: BearingAssembly,
    /// Extreme-load reaction in shaft coordinates
    pub reaction: SupportReaction,
    /// Required basic dynamic rating (N), synthesized spectra only
    pub required_rating_n: Option<f64>,
}

/// Results of a low-speed shaft sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowSpeedShaftResult {
    pub label: String,
    pub topology: SupportTopology,
    pub fatigue_mode: FatigueMode,

    /// Overall length including flange (m)
    pub length_m: f64,
    /// Hub-side seat diameter (m)
    pub hub_seat_diameter_m: f64,
    /// Second seat diameter (m)
    pub second_seat_diameter_m: f64,
    pub bore_m: f64,
    /// Largest outer diameter along the shaft (m)
    pub max_outer_diameter_m: f64,

    /// Shaft with flange and shrink disc (kg)
    pub mass_kg: f64,
    pub cm: [f64; 3],
    /// Principal inertia about the center of mass (kg·m²)
    pub inertia: [f64; 3],

    pub upwind_bearing: BearingResult,
    /// Downwind bearing, or the massless gearbox-side seat in three-point
    pub second_bearing: BearingResult,

    /// Static sizing diagnostics (spans, static diameters, slopes)
    pub static_sizing: StaticSizing,
    pub hub_seat_damage: Option<Damage>,
    pub gearbox_seat_damage: Option<Damage>,

    /// Rotor mass used, after any regression fallback (kg)
    pub rotor_mass_kg: f64,
    pub hub_to_bearing_m: f64,
    pub flange_length_m: f64,
    pub span_budget_m: f64,
}

impl LowSpeedShaftResult {
    /// Whether a fatigue check grew either seat beyond its static diameter
    pub fn fatigue_governs(&self) -> bool {
        let geometry = &self.static_sizing.geometry;
        let checked = self.hub_seat_damage.is_some() || self.gearbox_seat_damage.is_some();
        checked
            && (self.hub_seat_diameter_m > geometry.d_max
                || self.second_seat_diameter_m > geometry.second_seat_diameter())
    }
}

/// Seat diameters after the fatigue check
struct SeatSizes {
    hub: f64,
    second: f64,
    hub_damage: Option<Damage>,
    second_damage: Option<Damage>,
}

fn load_spectrum(input: &LowSpeedShaftInput, constants: &DesignConstants) -> CalcResult<Option<LoadSpectrum>> {
    let op = input.rated_operation();
    match input.fatigue_mode {
        FatigueMode::Off => Ok(None),
        FatigueMode::Synthesized => LoadSpectrum::synthesize(&op, &input.climate, &constants.spectrum).map(Some),
        FatigueMode::External => {
            let external = input
                .external_spectrum
                .as_ref()
                .ok_or_else(|| CalcError::missing_field("external_spectrum"))?;
            let revolutions = if op.validate().is_ok() && input.climate.validate().is_ok() {
                Some(op.life_revolutions(&input.climate, constants.spectrum.seconds_per_year))
            } else {
                None
            };
            LoadSpectrum::from_external(external, revolutions, input.blade_number).map(Some)
        }
    }
}

/// Hub-side and gearbox-side loading besides the spectrum.
///
/// The gearbox seat's shaft body ends at the static hub seat; callers move
/// it to the sized hub seat once that is known.
fn seat_loadings(
    input: &LowSpeedShaftInput,
    constants: &DesignConstants,
    geometry: &ShaftGeometry,
    rotor_weight_n: f64,
) -> (SeatLoading, SeatLoading) {
    let angle = input.shaft_angle();
    let cos = angle.0.cos();
    let body = ShaftBody {
        partner_diameter_m: geometry.d_min,
        length_m: geometry.gearbox_end_x(),
        specific_weight_n_m3: constants.steel.density_kg_m3 * constants.gravity,
    };

    let hub = SeatLoading {
        seat: Seat::HubSide,
        shaft_angle: angle,
        carries_bending: true,
        shear_lever_m: geometry.hub_to_bearing_m,
        rotor_weight_n,
        shaft_body: body,
        deterministic_moment_nm: rotor_weight_n * cos * geometry.hub_to_bearing_m,
    };
    let overhung = match input.topology {
        SupportTopology::ThreePoint => 0.0,
        SupportTopology::FourPoint => {
            Kilograms(input.shrink_disc_mass_kg + input.gearbox_mass_kg)
                .weight(constants.gravity)
                .0
                * cos
                * geometry.gearbox_span_m
        }
    };
    let gearbox = SeatLoading {
        seat: Seat::GearboxSide,
        shaft_angle: angle,
        carries_bending: false,
        shear_lever_m: 0.0,
        rotor_weight_n,
        shaft_body: ShaftBody {
            partner_diameter_m: geometry.d_max,
            ..body
        },
        deterministic_moment_nm: overhung,
    };
    (hub, gearbox)
}

/// Seats rounded up to catalog bores when fatigue is not checked
fn catalog_seats(input: &LowSpeedShaftInput, geometry: &ShaftGeometry) -> CalcResult<SeatSizes> {
    let hub = BearingSeat::from_catalog(input.upwind_bearing, geometry.d_max)?;
    let second = BearingSeat::from_catalog(input.downwind_bearing, geometry.second_seat_diameter())?;
    tracing::debug!(
        hub = hub.diameter_m,
        second = second.diameter_m,
        "seats rounded to catalog bores"
    );
    Ok(SeatSizes {
        hub: hub.diameter_m,
        second: second.diameter_m,
        hub_damage: None,
        second_damage: None,
    })
}

fn size_seats(
    input: &LowSpeedShaftInput,
    constants: &DesignConstants,
    sizing: &StaticSizing,
    spectrum: Option<&LoadSpectrum>,
    rotor_weight_n: f64,
) -> CalcResult<SeatSizes> {
    let geometry = &sizing.geometry;
    let spectrum = match spectrum {
        Some(spectrum) => spectrum,
        None => return catalog_seats(input, geometry),
    };

    let positive = |v: f64| if v > 0.0 { Some(v) } else { None };
    let material = FatigueMaterial::from_steel(
        &constants.steel,
        positive(input.ultimate_strength_pa),
        positive(input.fatigue_exponent),
    )?;
    let (hub_loading, gearbox_loading) = seat_loadings(input, constants, geometry, rotor_weight_n);

    let hub = fatigue::size_seat(
        &material,
        spectrum,
        &hub_loading,
        geometry.d_max,
        geometry.d_bore,
        &constants.fatigue,
    )?;
    let gearbox_loading = SeatLoading {
        shaft_body: ShaftBody {
            partner_diameter_m: hub.diameter_m,
            ..gearbox_loading.shaft_body
        },
        ..gearbox_loading
    };
    let second = fatigue::size_seat(
        &material,
        spectrum,
        &gearbox_loading,
        geometry.second_seat_diameter(),
        geometry.d_bore,
        &constants.fatigue,
    )?;

    Ok(SeatSizes {
        hub: hub.diameter_m,
        second: second.diameter_m,
        hub_damage: Some(hub.damage),
        second_damage: Some(second.damage),
    })
}

/// Required dynamic ratings of the physical bearings.
///
/// Hub moment ranges are reacted as a couple over the main span on top of
/// the static reaction; the locating bearing takes the thrust.
fn required_ratings(
    input: &LowSpeedShaftInput,
    sizing: &StaticSizing,
    spectrum: &LoadSpectrum,
    rotor_weight_n: f64,
) -> CalcResult<(Option<f64>, Option<f64>)> {
    if !spectrum.is_shared_axis() {
        return Ok((None, None));
    }
    let span = sizing.geometry.main_span_m;
    let angle = input.shaft_angle().0;
    let blades = input.blade_number as f64;
    let my = &spectrum.channel(LoadChannel::My).ranges;
    let mz = &spectrum.channel(LoadChannel::Mz).ranges;
    let fx = &spectrum.channel(LoadChannel::Fx).ranges;
    let counts: Vec<f64> = spectrum
        .channel(LoadChannel::Fx)
        .counts
        .iter()
        .map(|n| n / blades)
        .collect();

    let radial = |reaction: &SupportReaction| -> Vec<f64> {
        my.iter()
            .zip(mz)
            .map(|(m_y, m_z)| {
                (m_y.abs() / span + reaction.vertical_n.abs()).hypot(m_z.abs() / span + reaction.horizontal_n.abs())
            })
            .collect()
    };
    let thrust: Vec<f64> = fx
        .iter()
        .map(|f| f * angle.cos() + (rotor_weight_n + sizing.shaft_weight_n) * angle.sin())
        .collect();
    let unloaded = vec![0.0; counts.len()];

    let upwind_axial = match input.topology {
        SupportTopology::ThreePoint => &thrust,
        SupportTopology::FourPoint => &unloaded,
    };
    let upwind = bearings::required_dynamic_rating(
        input.upwind_bearing,
        &radial(&sizing.upwind_reaction),
        upwind_axial,
        &counts,
        spectrum.rotor_revolutions,
    )?;

    let second = match input.topology {
        SupportTopology::ThreePoint => None,
        SupportTopology::FourPoint => Some(bearings::required_dynamic_rating(
            input.downwind_bearing,
            &radial(&sizing.second_reaction),
            &thrust,
            &counts,
            spectrum.rotor_revolutions,
        )?),
    };
    Ok((Some(upwind), second))
}

/// Size a low-speed shaft and its main bearings.
///
/// This is a pure function suitable for LLM invocation.
///
/// # Errors
///
/// * `InvalidInput` / `MissingField` - rejected inputs
/// * `InfeasibleGeometry` - no admissible span inside the envelope, or the
///   bearing faces do not fit on the span
/// * `InfeasibleFatigue` - a seat reached the diameter limit
/// * `NonConvergence` - a span search hit its iteration cap
pub fn calculate(input: &LowSpeedShaftInput, constants: &DesignConstants) -> CalcResult<LowSpeedShaftResult> {
    input.validate()?;
    constants.validate()?;

    let weight = |mass_kg: f64| Kilograms(mass_kg).weight(constants.gravity).0;
    let allowances = &constants.allowances;
    let rotor_diameter = input.rotor_loads.rotor_diameter_m;
    let rotor_mass_kg = input
        .rotor_loads
        .effective_rotor_mass(allowances, input.machine_rating_kw);
    let rotor_weight_n = weight(rotor_mass_kg);
    let hub_to_bearing_m = if input.hub_to_bearing_m > 0.0 {
        input.hub_to_bearing_m
    } else {
        allowances.hub_to_bearing_m(rotor_diameter)
    };
    let flange_length_m = if input.flange_length_m > 0.0 {
        input.flange_length_m
    } else {
        allowances.flange_length_m(rotor_diameter)
    };
    let span_budget_m = input.span_budget_m(hub_to_bearing_m);

    let case = ShaftLoadCase {
        topology: input.topology,
        loads: input.rotor_loads,
        rotor_weight_n: if input.rotor_weight_in_loads { 0.0 } else { rotor_weight_n },
        shrink_disc_weight_n: weight(input.shrink_disc_mass_kg),
        carrier_weight_n: weight(input.carrier_mass_kg),
        gearbox_weight_n: weight(input.gearbox_mass_kg),
        shaft_angle: input.shaft_angle(),
        hub_to_bearing_m,
        span_budget_m,
        shaft_ratio: input.shaft_ratio,
        upwind_limit: Radians(input.upwind_bearing.allowable_misalignment().0 / constants.bearing_safety_factor),
        downwind_limit: Radians(input.downwind_bearing.allowable_misalignment().0 / constants.bearing_safety_factor),
    };
    let sizing = static_sizing::size_shaft(&case, constants)?;
    let geometry = sizing.geometry;

    let spectrum = load_spectrum(input, constants)?;
    let seats = size_seats(input, constants, &sizing, spectrum.as_ref(), rotor_weight_n)?;

    let upwind_seat = BearingSeat::from_regression(input.upwind_bearing, seats.hub)?;
    let second_seat = match input.topology {
        SupportTopology::ThreePoint => BearingSeat::virtual_seat(input.downwind_bearing, seats.second)?,
        SupportTopology::FourPoint => BearingSeat::from_regression(input.downwind_bearing, seats.second)?,
    };

    let faces = (upwind_seat.face_width_m + second_seat.face_width_m) / 2.0;
    if geometry.main_span_m <= faces {
        return Err(CalcError::infeasible_geometry(
            "bearing faces",
            faces,
            geometry.main_span_m,
            "Bearing faces do not fit on the main span",
        ));
    }

    let outline = ShaftOutline {
        topology: input.topology,
        hub_seat_diameter_m: seats.hub,
        second_seat_diameter_m: seats.second,
        gearbox_end_diameter_m: geometry.d_min,
        bore_m: geometry.d_bore,
        main_span_m: geometry.main_span_m,
        gearbox_span_m: geometry.gearbox_span_m,
        upwind_face_width_m: upwind_seat.face_width_m,
        downwind_face_width_m: second_seat.face_width_m,
        flange_length_m,
    };
    let mounting = GearboxMounting {
        gearbox_cm: input.gearbox_cm,
        gearbox_length_m: input.gearbox_length_m,
        shaft_angle: input.shaft_angle(),
        shrink_disc_mass_kg: input.shrink_disc_mass_kg,
    };
    let props = mass_properties::shaft_mass_properties(&outline, &mounting, constants.steel.density_kg_m3, allowances)?;

    let (upwind_rating, second_rating) = match &spectrum {
        Some(spectrum) => required_ratings(input, &sizing, spectrum, rotor_weight_n)?,
        None => (None, None),
    };

    let housing = allowances.housing_mass_ratio;
    let upwind_bearing = BearingResult {
        seat: upwind_seat,
        location: props.upwind_bearing_location,
        assembly: BearingAssembly::new(&upwind_seat, props.upwind_bearing_location, housing),
        reaction: sizing.upwind_reaction,
        required_rating_n: upwind_rating,
    };
    let second_bearing = BearingResult {
        seat: second_seat,
        location: props.second_bearing_location,
        assembly: BearingAssembly::new(&second_seat, props.second_bearing_location, housing),
        reaction: sizing.second_reaction,
        required_rating_n: second_rating,
    };

    let max_outer_diameter_m = [seats.hub, seats.second, geometry.d_max, geometry.d_med, geometry.d_min]
        .into_iter()
        .fold(0.0, f64::max);

    tracing::info!(
        label = %input.label,
        topology = %input.topology,
        fatigue = %input.fatigue_mode,
        length_m = props.length_m,
        hub_seat_m = seats.hub,
        second_seat_m = seats.second,
        mass_kg = props.mass_kg,
        "low-speed shaft sized"
    );

    Ok(LowSpeedShaftResult {
        label: input.label.clone(),
        topology: input.topology,
        fatigue_mode: input.fatigue_mode,
        length_m: props.length_m,
        hub_seat_diameter_m: seats.hub,
        second_seat_diameter_m: seats.second,
        bore_m: geometry.d_bore,
        max_outer_diameter_m,
        mass_kg: props.mass_kg,
        cm: props.cm,
        inertia: props.inertia,
        upwind_bearing,
        second_bearing,
        static_sizing: sizing,
        hub_seat_damage: seats.hub_damage,
        gearbox_seat_damage: seats.second_damage,
        rotor_mass_kg,
        hub_to_bearing_m,
        flange_length_m,
        span_budget_m,
    })
}
