//! # Static Shaft Sizing
//!
//! Sizes the shaft outer diameters from the extreme hub loads and finds the
//! longest bearing span that keeps the shaft slope at every bearing within
//! the bearing's misalignment allowance.
//!
//! ## Diameter
//!
//! Distortion-energy criterion with the moment and torque in in-lb and the
//! yield strength in psi:
//!
//! ```text
//! D = [16·n / (π·Sy) · √(4·M² + 3·T²)]^(1/3)
//! ```
//!
//! A hollow shaft with bore `d_i = ratio·D_max` keeps the same section by
//! growing to `(D⁴ + d_i⁴)^(1/4)`.
//!
//! ## Span Search
//!
//! The constraint `g(L) = max_i(|θ_i| - limit_i)` is stepped from the seed
//! span in coarse increments until it changes sign, then refined with the fine
//! step from one coarse step before the crossing. The accepted span is the
//! grid point next to the crossing where `g ≤ 0`. Diameters only grow while
//! the search runs, so the shaft is sized for the worst span it visited.
//!
//! ## Topologies
//!
//! | Topology    | Supports                        | Slope checks                     |
//! |-------------|---------------------------------|----------------------------------|
//! | Three-point | main bearing, gearbox seat      | main bearing, gearbox seat       |
//! | Four-point  | upwind and downwind bearings    | both bearings, then the coupling |
//!
//! The four-point layout sizes the gearbox-side span in a second search once
//! the main span is fixed.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::beam_segment::{BeamLoad, BeamModel, TwoPlaneBeam};
use crate::config::{DesignConstants, SearchSettings};
use crate::errors::{CalcError, CalcResult};
use crate::loads::RotorLoads;
use crate::units::{InchPounds, Inches, Meters, NewtonMeters, Radians};

/// How the drivetrain carries the low-speed shaft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupportTopology {
    /// One main bearing; the gearbox trunnions carry the shaft end
    #[default]
    #[serde(rename = "three-point")]
    ThreePoint,
    /// Two main bearings; the gearbox hangs off the shaft end
    #[serde(rename = "four-point")]
    FourPoint,
}

impl SupportTopology {
    pub const ALL: [SupportTopology; 2] = [SupportTopology::ThreePoint, SupportTopology::FourPoint];

    pub fn display_name(&self) -> &'static str {
        match self {
            SupportTopology::ThreePoint => "Three-point",
            SupportTopology::FourPoint => "Four-point",
        }
    }

    /// Lower-case tag, same as the serialized form
    pub fn code(&self) -> &'static str {
        match self {
            SupportTopology::ThreePoint => "three-point",
            SupportTopology::FourPoint => "four-point",
        }
    }

    /// Whether the second seat carries a physical bearing
    pub fn has_second_bearing(&self) -> bool {
        matches!(self, SupportTopology::FourPoint)
    }

    /// Parse from "three-point", "3pt", "four-point", "4", ...
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().replace(&['_', ' '][..], "-").as_str() {
            "three-point" | "threepoint" | "3pt" | "3-point" | "3" => Ok(SupportTopology::ThreePoint),
            "four-point" | "fourpoint" | "4pt" | "4-point" | "4" => Ok(SupportTopology::FourPoint),
            _ => Err(CalcError::invalid_input(
                "topology",
                s,
                "Expected three-point or four-point",
            )),
        }
    }
}

impl std::fmt::Display for SupportTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Everything the static solver needs about one drivetrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaftLoadCase {
    pub topology: SupportTopology,
    /// Extreme hub loads
    pub loads: RotorLoads,
    /// Rotor weight applied at the hub in addition to `loads` (N)
    pub rotor_weight_n: f64,
    /// Shrink disc weight at the gearbox end (N)
    pub shrink_disc_weight_n: f64,
    /// Planet carrier weight at the gearbox seat, three-point only (N)
    pub carrier_weight_n: f64,
    /// Gearbox weight hung off the shaft end, four-point only (N)
    pub gearbox_weight_n: f64,
    /// Shaft tilt
    pub shaft_angle: Radians,
    /// Hub center to upwind bearing (m)
    pub hub_to_bearing_m: f64,
    /// Longest admissible span from the upwind bearing to the gearbox face (m)
    pub span_budget_m: f64,
    /// Bore to outer diameter ratio
    pub shaft_ratio: f64,
    /// Slope allowance at the upwind bearing
    pub upwind_limit: Radians,
    /// Slope allowance at the second seat
    pub downwind_limit: Radians,
}

impl ShaftLoadCase {
    pub fn validate(&self) -> CalcResult<()> {
        self.loads.validate()?;

        let non_negative = [
            ("rotor_weight_n", self.rotor_weight_n),
            ("shrink_disc_weight_n", self.shrink_disc_weight_n),
            ("carrier_weight_n", self.carrier_weight_n),
            ("gearbox_weight_n", self.gearbox_weight_n),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Weight cannot be negative"));
            }
        }
        if !(self.hub_to_bearing_m.is_finite() && self.hub_to_bearing_m > 0.0) {
            return Err(CalcError::invalid_input(
                "hub_to_bearing_m",
                self.hub_to_bearing_m.to_string(),
                "Hub to bearing distance must be positive",
            ));
        }
        if !self.span_budget_m.is_finite() {
            return Err(CalcError::invalid_input(
                "span_budget_m",
                self.span_budget_m.to_string(),
                "Span budget must be finite",
            ));
        }
        if !(self.shaft_ratio >= 0.0 && self.shaft_ratio < 1.0) {
            return Err(CalcError::invalid_input(
                "shaft_ratio",
                self.shaft_ratio.to_string(),
                "Bore ratio must lie in [0, 1)",
            ));
        }
        if !(self.shaft_angle.0.is_finite() && self.shaft_angle.0.abs() < PI / 2.0) {
            return Err(CalcError::invalid_input(
                "shaft_angle",
                self.shaft_angle.0.to_string(),
                "Shaft angle must be below 90°",
            ));
        }
        for (field, limit) in [("upwind_limit", self.upwind_limit), ("downwind_limit", self.downwind_limit)] {
            if !(limit.0.is_finite() && limit.0 > 0.0) {
                return Err(CalcError::invalid_input(field, limit.0.to_string(), "Slope allowance must be positive"));
            }
        }
        Ok(())
    }
}

/// Solved shaft dimensions.
///
/// Stations run from the hub center at x = 0. In the three-point layout the
/// gearbox-side span is zero and `d_med` equals `d_min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShaftGeometry {
    pub topology: SupportTopology,
    /// Hub center to upwind bearing (m)
    pub hub_to_bearing_m: f64,
    /// Upwind bearing to second seat (m)
    pub main_span_m: f64,
    /// Downwind bearing to gearbox coupling, four-point only (m)
    pub gearbox_span_m: f64,
    /// Outer diameter at the hub-side seat and largest moment (m)
    pub d_max: f64,
    /// Outer diameter at the downwind bearing (m)
    pub d_med: f64,
    /// Outer diameter at the gearbox end (m)
    pub d_min: f64,
    /// Bore diameter (m)
    pub d_bore: f64,
    pub shaft_angle: Radians,
}

impl ShaftGeometry {
    pub fn upwind_bearing_x(&self) -> f64 {
        self.hub_to_bearing_m
    }

    pub fn second_seat_x(&self) -> f64 {
        self.hub_to_bearing_m + self.main_span_m
    }

    pub fn gearbox_end_x(&self) -> f64 {
        self.second_seat_x() + self.gearbox_span_m
    }

    /// Outer diameter at the second seat
    pub fn second_seat_diameter(&self) -> f64 {
        match self.topology {
            SupportTopology::ThreePoint => self.d_min,
            SupportTopology::FourPoint => self.d_med,
        }
    }

    /// Bore to outer diameter ratio at the hub-side seat
    pub fn diameter_ratio(&self) -> f64 {
        self.d_bore / self.d_max
    }

    /// Hollow section area (m²)
    pub fn area(&self, outer: f64) -> f64 {
        PI / 4.0 * (outer.powi(2) - self.d_bore.powi(2))
    }

    /// Hollow section second moment of area (m⁴)
    pub fn second_moment(&self, outer: f64) -> f64 {
        PI / 64.0 * (outer.powi(4) - self.d_bore.powi(4))
    }

    /// Check outer ≥ bore everywhere and the ratio bounds
    pub fn validate(&self) -> CalcResult<()> {
        for (field, outer) in [("d_max", self.d_max), ("d_med", self.d_med), ("d_min", self.d_min)] {
            if !(outer.is_finite() && outer > 0.0 && outer >= self.d_bore) {
                return Err(CalcError::invalid_input(
                    field,
                    outer.to_string(),
                    format!("Outer diameter must be positive and at least the bore ({:.4} m)", self.d_bore),
                ));
            }
        }
        let ratio = self.diameter_ratio();
        if !(ratio >= 0.0 && ratio < 1.0) {
            return Err(CalcError::invalid_input(
                "diameter_ratio",
                ratio.to_string(),
                "Bore ratio must lie in [0, 1)",
            ));
        }
        if !(self.main_span_m > 0.0 && self.gearbox_span_m >= 0.0) {
            return Err(CalcError::invalid_input(
                "main_span_m",
                self.main_span_m.to_string(),
                "Spans must be positive",
            ));
        }
        Ok(())
    }
}

/// Solid shaft diameter from the distortion-energy criterion (m)
pub fn distortion_energy_diameter(moment_nm: f64, torque_nm: f64, safety_factor: f64, yield_psi: f64) -> f64 {
    let m = InchPounds::from(NewtonMeters(moment_nm.abs())).0;
    let t = InchPounds::from(NewtonMeters(torque_nm.abs())).0;
    let inches = (16.0 * safety_factor / (PI * yield_psi) * (4.0 * m * m + 3.0 * t * t).sqrt()).cbrt();
    Meters::from(Inches(inches)).0
}

/// Outer diameter of a hollow section matching a solid one
pub fn hollow_equivalent(solid: f64, bore: f64) -> f64 {
    (solid.powi(4) + bore.powi(4)).powf(0.25)
}

/// Slope at one station against its allowance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlopeCheck {
    pub station: String,
    /// Distance from the hub center (m)
    pub position_m: f64,
    /// Resultant slope magnitude (rad)
    pub slope_rad: f64,
    /// Allowance (rad)
    pub limit_rad: f64,
}

impl SlopeCheck {
    /// Slope minus allowance; positive means violated
    pub fn margin(&self) -> f64 {
        self.slope_rad - self.limit_rad
    }

    /// Slope over allowance
    pub fn utilization(&self) -> f64 {
        self.slope_rad / self.limit_rad
    }
}

/// Support reaction components (N)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportReaction {
    pub axial_n: f64,
    pub vertical_n: f64,
    pub horizontal_n: f64,
}

impl SupportReaction {
    pub fn radial(&self) -> f64 {
        self.vertical_n.hypot(self.horizontal_n)
    }
}

/// Outcome of one span search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanSearch {
    pub span_m: f64,
    pub evaluations: usize,
}

/// Static sizing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSizing {
    pub geometry: ShaftGeometry,
    /// Slopes at every bearing station of the final geometry
    pub slopes: Vec<SlopeCheck>,
    /// Reaction at the upwind bearing
    pub upwind_reaction: SupportReaction,
    /// Reaction at the second seat (downwind bearing or gearbox)
    pub second_reaction: SupportReaction,
    /// Largest resultant bending moment (N·m)
    pub max_moment_nm: f64,
    /// Where it occurs (m from hub center)
    pub max_moment_station_m: f64,
    /// Beam evaluations over all searches
    pub evaluations: usize,
    /// Shaft weight of the final geometry (N)
    pub shaft_weight_n: f64,
}

/// Step a span from `seed` toward `budget` until `g` changes sign, then
/// refine.
///
/// `g` is evaluated in increasing span order only. A constraint that never
/// becomes active before the budget is an `InfeasibleGeometry` error: the
/// shaft does not fit the envelope.
pub fn search_span<F>(mut g: F, seed: f64, budget: f64, settings: &SearchSettings, stage: &str) -> CalcResult<SpanSearch>
where
    F: FnMut(f64) -> CalcResult<f64>,
{
    if budget < seed {
        return Err(CalcError::infeasible_geometry(stage, seed, budget, "Span budget is shorter than the seed span"));
    }

    let tol = settings.slope_tolerance_rad;
    let mut evaluations = 0usize;
    let count = |evaluations: &mut usize| -> CalcResult<()> {
        *evaluations += 1;
        if *evaluations > settings.max_iterations {
            Err(CalcError::non_convergence(stage, settings.max_iterations))
        } else {
            Ok(())
        }
    };

    count(&mut evaluations)?;
    let g_seed = g(seed)?;
    if g_seed.abs() <= tol {
        return Ok(SpanSearch { span_m: seed, evaluations });
    }
    let seed_violated = g_seed > 0.0;

    // Coarse pass: find the interval holding the sign change
    let mut span = seed;
    let mut bracket = None;
    loop {
        let next = span + settings.coarse_step_m;
        if next > budget {
            break;
        }
        count(&mut evaluations)?;
        let value = g(next)?;
        tracing::debug!(stage, span = next, g = value, "coarse step");
        if value.abs() <= tol {
            return Ok(SpanSearch { span_m: next, evaluations });
        }
        if (value > 0.0) != seed_violated {
            bracket = Some((span, next));
            break;
        }
        span = next;
    }

    let (lo, hi) = match bracket {
        Some(interval) => interval,
        None => {
            // Tail interval up to the budget
            count(&mut evaluations)?;
            let at_budget = g(budget)?;
            if at_budget.abs() <= tol || ((at_budget > 0.0) != seed_violated) {
                (span, budget)
            } else if at_budget <= 0.0 {
                tracing::warn!(stage, budget, "slope limit never reached within the span budget");
                return Err(CalcError::infeasible_geometry(
                    stage,
                    budget,
                    budget,
                    "Slope allowance not reached before the span budget ran out",
                ));
            } else {
                return Err(CalcError::infeasible_geometry(
                    stage,
                    budget,
                    budget,
                    "Slope allowance exceeded at every span within the budget",
                ));
            }
        }
    };

    // Fine pass from the start of the bracket
    let mut span = lo;
    count(&mut evaluations)?;
    let mut previous = g(lo)?;
    while span < hi {
        let next = (span + settings.fine_step_m).min(hi);
        count(&mut evaluations)?;
        let value = g(next)?;
        tracing::debug!(stage, span = next, g = value, "fine step");
        if value.abs() <= tol || (value > 0.0) != (previous > 0.0) {
            let accepted = if value <= tol { next } else { span };
            return Ok(SpanSearch { span_m: accepted, evaluations });
        }
        span = next;
        previous = value;
    }

    if previous <= 0.0 {
        Ok(SpanSearch { span_m: hi, evaluations })
    } else {
        Err(CalcError::infeasible_geometry(stage, hi, budget, "Slope limit crossing was lost during refinement"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    MainSpan,
    GearboxSpan,
    Final,
}

/// Beam builder holding the solid-equivalent diameters grown so far
struct SpanEvaluator<'a> {
    case: &'a ShaftLoadCase,
    constants: &'a DesignConstants,
    /// Solid-equivalent [max, med, min]
    solid: [f64; 3],
}

impl<'a> SpanEvaluator<'a> {
    fn new(case: &'a ShaftLoadCase, constants: &'a DesignConstants) -> Self {
        let floor = constants.search.min_outer_diameter_m;
        SpanEvaluator {
            case,
            constants,
            solid: [floor; 3],
        }
    }

    fn geometry(&self, main_span_m: f64, gearbox_span_m: f64) -> ShaftGeometry {
        let bore = self.case.shaft_ratio * self.solid[0];
        let d_min = hollow_equivalent(self.solid[2], bore);
        let d_med = match self.case.topology {
            SupportTopology::ThreePoint => d_min,
            SupportTopology::FourPoint => hollow_equivalent(self.solid[1], bore),
        };
        ShaftGeometry {
            topology: self.case.topology,
            hub_to_bearing_m: self.case.hub_to_bearing_m,
            main_span_m,
            gearbox_span_m,
            d_max: hollow_equivalent(self.solid[0], bore),
            d_med,
            d_min,
            d_bore: bore,
            shaft_angle: self.case.shaft_angle,
        }
    }

    /// Frustum from d_max to d_min over the full shaft, less the bore
    fn shaft_weight(&self, geometry: &ShaftGeometry) -> f64 {
        let (a, b) = (geometry.d_max, geometry.d_min);
        let length = geometry.gearbox_end_x();
        let volume = PI / 12.0 * (a * a + b * b + a * b) * length - PI / 4.0 * geometry.d_bore.powi(2) * length;
        self.constants.steel.density_kg_m3 * self.constants.gravity * volume
    }

    fn beam(&self, geometry: &ShaftGeometry) -> CalcResult<TwoPlaneBeam> {
        let loads = &self.case.loads;
        let cos = self.case.shaft_angle.0.cos();
        let end = geometry.gearbox_end_x();
        let e = self.constants.steel.elastic_modulus_pa;
        let i = geometry.second_moment(geometry.d_max);
        let weight = self.shaft_weight(geometry);

        let mut vertical = BeamModel::new(e, i)
            .with_load(BeamLoad::point_force(loads.fz - self.case.rotor_weight_n * cos, 0.0))
            .with_load(BeamLoad::point_moment(loads.my, 0.0))
            .with_load(BeamLoad::distributed(-weight * cos / end, 0.0, end))
            .with_load(BeamLoad::point_force(-self.case.shrink_disc_weight_n * cos, end));
        let end_weight = match self.case.topology {
            SupportTopology::ThreePoint => self.case.carrier_weight_n,
            SupportTopology::FourPoint => self.case.gearbox_weight_n,
        };
        vertical.add_load(BeamLoad::point_force(-end_weight * cos, end));
        // Positive Mz turns +x toward +y, the opposite sense of the beam couple
        let horizontal = BeamModel::new(e, i)
            .with_load(BeamLoad::point_force(loads.fy, 0.0))
            .with_load(BeamLoad::point_moment(-loads.mz, 0.0));

        let (a, b) = match self.case.topology {
            SupportTopology::ThreePoint => (geometry.upwind_bearing_x(), end),
            SupportTopology::FourPoint => (geometry.upwind_bearing_x(), geometry.second_seat_x()),
        };
        TwoPlaneBeam::solve(&vertical, &horizontal, a, b)
    }

    /// Largest moment over the hub overhang, the span(s) and any gearbox overhang
    fn max_moment(&self, beam: &TwoPlaneBeam, geometry: &ShaftGeometry) -> (f64, f64) {
        let points = self.constants.search.sample_points;
        let stations = [
            0.0,
            geometry.upwind_bearing_x(),
            geometry.second_seat_x(),
            geometry.gearbox_end_x(),
        ];
        stations
            .windows(2)
            .filter(|w| w[1] > w[0])
            .map(|w| beam.max_moment(w[0], w[1], points))
            .fold((0.0, 0.0), |best, (x, m)| if m > best.1 { (x, m) } else { best })
    }

    fn resize(&mut self, beam: &TwoPlaneBeam, geometry: &ShaftGeometry) {
        let size = |moment: f64| {
            distortion_energy_diameter(
                moment,
                self.case.loads.mx,
                self.constants.static_safety_factor,
                self.constants.steel.static_yield_strength_psi,
            )
        };
        let (_, m_max) = self.max_moment(beam, geometry);
        let m_med = beam.moment_magnitude(geometry.second_seat_x());
        let m_end = beam.moment_magnitude(geometry.gearbox_end_x());

        for (slot, moment) in self.solid.iter_mut().zip([m_max, m_med, m_end]) {
            *slot = slot.max(size(moment));
        }
    }

    fn slope_checks(&self, beam: &TwoPlaneBeam, geometry: &ShaftGeometry, stage: Stage) -> Vec<SlopeCheck> {
        let check = |station: &str, x: f64, limit: f64| SlopeCheck {
            station: station.to_string(),
            position_m: x,
            slope_rad: beam.slope_magnitude(x),
            limit_rad: limit,
        };
        let upwind = self.case.upwind_limit.0;
        let downwind = self.case.downwind_limit.0;
        let coupling = self.constants.coupling_slope_limit().0 / self.constants.bearing_safety_factor;

        match (self.case.topology, stage) {
            (SupportTopology::ThreePoint, _) => vec![
                check("main bearing", geometry.upwind_bearing_x(), upwind),
                check("gearbox seat", geometry.gearbox_end_x(), downwind),
            ],
            (SupportTopology::FourPoint, Stage::MainSpan) => vec![
                check("upwind bearing", geometry.upwind_bearing_x(), upwind),
                check("downwind bearing", geometry.second_seat_x(), downwind),
            ],
            (SupportTopology::FourPoint, Stage::GearboxSpan) => {
                vec![check("gearbox coupling", geometry.gearbox_end_x(), coupling)]
            }
            (SupportTopology::FourPoint, Stage::Final) => vec![
                check("upwind bearing", geometry.upwind_bearing_x(), upwind),
                check("downwind bearing", geometry.second_seat_x(), downwind),
                check("gearbox coupling", geometry.gearbox_end_x(), coupling),
            ],
        }
    }

    /// Size the diameters at a span pair and return the worst slope margin
    fn evaluate(&mut self, main_span_m: f64, gearbox_span_m: f64, stage: Stage) -> CalcResult<f64> {
        let geometry = self.geometry(main_span_m, gearbox_span_m);
        let beam = self.beam(&geometry)?;
        self.resize(&beam, &geometry);

        let geometry = self.geometry(main_span_m, gearbox_span_m);
        let beam = self.beam(&geometry)?;
        let margin = self
            .slope_checks(&beam, &geometry, stage)
            .iter()
            .map(SlopeCheck::margin)
            .fold(f64::NEG_INFINITY, f64::max);
        Ok(margin)
    }
}

/// Run the span search(es) and size the shaft for the extreme loads.
pub fn size_shaft(case: &ShaftLoadCase, constants: &DesignConstants) -> CalcResult<StaticSizing> {
    case.validate()?;
    let settings = &constants.search;
    let seed = settings.seed_span_m;
    let mut evaluator = SpanEvaluator::new(case, constants);

    let (main, gearbox) = match case.topology {
        SupportTopology::ThreePoint => {
            let main = search_span(
                |span| evaluator.evaluate(span, 0.0, Stage::MainSpan),
                seed,
                case.span_budget_m,
                settings,
                "main span",
            )?;
            (main, None)
        }
        SupportTopology::FourPoint => {
            let main = search_span(
                |span| evaluator.evaluate(span, seed, Stage::MainSpan),
                seed,
                case.span_budget_m - seed,
                settings,
                "main span",
            )?;
            let gearbox_budget = (case.span_budget_m - main.span_m).max(seed);
            let gearbox = search_span(
                |span| evaluator.evaluate(main.span_m, span, Stage::GearboxSpan),
                seed,
                gearbox_budget,
                settings,
                "gearbox span",
            )?;
            (main, Some(gearbox))
        }
    };

    let gearbox_span = gearbox.map(|g| g.span_m).unwrap_or(0.0);
    let geometry = evaluator.geometry(main.span_m, gearbox_span);
    geometry.validate()?;
    let beam = evaluator.beam(&geometry)?;
    let slopes = evaluator.slope_checks(&beam, &geometry, Stage::Final);
    let (max_moment_station_m, max_moment_nm) = evaluator.max_moment(&beam, &geometry);
    let shaft_weight_n = evaluator.shaft_weight(&geometry);

    // Axial load goes to the locating bearing: the main bearing in three-point,
    // the downwind bearing in four-point
    let sin = case.shaft_angle.0.sin();
    let axial = -case.loads.fx - (case.rotor_weight_n + shaft_weight_n) * sin;
    let (upwind_axial, second_axial) = match case.topology {
        SupportTopology::ThreePoint => (axial, 0.0),
        SupportTopology::FourPoint => (0.0, axial),
    };
    let upwind_reaction = SupportReaction {
        axial_n: upwind_axial,
        vertical_n: beam.vertical.reactions.0,
        horizontal_n: beam.horizontal.reactions.0,
    };
    let second_reaction = SupportReaction {
        axial_n: second_axial,
        vertical_n: beam.vertical.reactions.1,
        horizontal_n: beam.horizontal.reactions.1,
    };

    let evaluations = main.evaluations + gearbox.map(|g| g.evaluations).unwrap_or(0);

    tracing::info!(
        topology = %case.topology,
        main_span_m = geometry.main_span_m,
        gearbox_span_m = geometry.gearbox_span_m,
        d_max = geometry.d_max,
        d_min = geometry.d_min,
        evaluations,
        "static sizing converged"
    );

    Ok(StaticSizing {
        geometry,
        slopes,
        upwind_reaction,
        second_reaction,
        max_moment_nm,
        max_moment_station_m,
        evaluations,
        shaft_weight_n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bearings::BearingType;

    fn reference_case(topology: SupportTopology, span_budget_m: f64) -> ShaftLoadCase {
        ShaftLoadCase {
            topology,
            loads: RotorLoads {
                fx: 1.0e6,
                fy: 0.0,
                fz: -8.4e5,
                mx: 4.18e6,
                my: -16.7e6,
                mz: 0.0,
                rotor_mass_kg: 110_000.0,
                rotor_diameter_m: 126.0,
            },
            rotor_weight_n: 0.0,
            shrink_disc_weight_n: 1000.0 * 9.81,
            carrier_weight_n: 8000.0 * 9.81,
            gearbox_weight_n: 56_456.0 * 9.81,
            shaft_angle: crate::units::Degrees(5.0).into(),
            hub_to_bearing_m: 1.951,
            span_budget_m,
            shaft_ratio: 0.1,
            upwind_limit: BearingType::Srb.allowable_misalignment(),
            downwind_limit: BearingType::Trb2.allowable_misalignment(),
        }
    }

    #[test]
    fn test_distortion_energy_diameter() {
        // 18.34 MN·m with 4.18 MN·m torque ≈ 40 in
        let d = distortion_energy_diameter(18.34e6, 4.18e6, 2.5, 66_000.0);
        assert!((d - 1.015).abs() < 0.005, "d = {}", d);
        assert_eq!(distortion_energy_diameter(0.0, 0.0, 2.5, 66_000.0), 0.0);
        // Sign of the loads does not matter
        assert_eq!(
            distortion_energy_diameter(-5.0e6, 1.0e6, 2.5, 66_000.0),
            distortion_energy_diameter(5.0e6, -1.0e6, 2.5, 66_000.0)
        );
    }

    #[test]
    fn test_hollow_equivalent() {
        assert!((hollow_equivalent(1.0, 0.0) - 1.0).abs() < 1e-15);
        let d = hollow_equivalent(1.0, 0.5);
        // Same section modulus proxy: D⁴ - d⁴ equals the solid D⁴
        assert!((d.powi(4) - 0.5f64.powi(4) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_search_finds_crossing_within_fine_step() {
        let settings = SearchSettings::default();
        let root = 2.3456;
        let result = search_span(|l| Ok(l - root), 0.5, 10.0, &settings, "test").unwrap();
        // Accepted span sits on the admissible side within one fine step of the root
        assert!(result.span_m <= root + settings.slope_tolerance_rad + 1e-12);
        assert!(root - result.span_m <= settings.fine_step_m + 1e-9);
    }

    #[test]
    fn test_search_decreasing_constraint() {
        let settings = SearchSettings {
            slope_tolerance_rad: 0.0,
            ..SearchSettings::default()
        };
        // Violated at short spans, admissible beyond 1.3
        let result = search_span(|l| Ok(1.3 - l), 0.5, 5.0, &settings, "test").unwrap();
        assert!(result.span_m >= 1.3 - 1e-9);
        assert!(result.span_m - 1.3 <= settings.fine_step_m + 1e-9);
    }

    #[test]
    fn test_search_never_reaching_limit_is_infeasible() {
        let settings = SearchSettings::default();
        let err = search_span(|_| Ok(-1.0), 0.5, 2.0, &settings, "main span").unwrap_err();
        assert!(err.is_infeasible_design());
        match err {
            CalcError::InfeasibleGeometry { stage, .. } => assert_eq!(stage, "main span"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_search_infeasible() {
        let settings = SearchSettings::default();
        let err = search_span(|_| Ok(1.0), 0.5, 2.0, &settings, "test").unwrap_err();
        assert_eq!(err.error_code(), "INFEASIBLE_GEOMETRY");

        let err = search_span(|_| Ok(-1.0), 0.5, 0.3, &settings, "test").unwrap_err();
        assert_eq!(err.error_code(), "INFEASIBLE_GEOMETRY");
    }

    #[test]
    fn test_search_iteration_cap() {
        let settings = SearchSettings {
            max_iterations: 5,
            ..SearchSettings::default()
        };
        let err = search_span(|_| Ok(-1.0), 0.5, 100.0, &settings, "test").unwrap_err();
        assert_eq!(err.error_code(), "NON_CONVERGENCE");
    }

    #[test]
    fn test_three_point_reaches_slope_limit() {
        let constants = DesignConstants::default();
        let case = reference_case(SupportTopology::ThreePoint, 8.0);
        let sizing = size_shaft(&case, &constants).unwrap();

        assert!(sizing.geometry.main_span_m > 1.5 && sizing.geometry.main_span_m < 6.0);
        let tol = constants.search.slope_tolerance_rad;
        for check in &sizing.slopes {
            assert!(check.margin() <= tol, "{} exceeds its allowance", check.station);
        }
        // Hub overhang moment governs the seat diameter
        assert!(sizing.geometry.d_max > 0.9 && sizing.geometry.d_max < 1.2);
        // Only torque at the gearbox seat
        assert!(sizing.geometry.d_min < sizing.geometry.d_max);
        assert_eq!(sizing.geometry.d_med, sizing.geometry.d_min);
    }

    #[test]
    fn test_outer_never_below_bore() {
        let constants = DesignConstants::default();
        for topology in SupportTopology::ALL {
            let sizing = size_shaft(&reference_case(topology, 8.0), &constants).unwrap();
            let g = sizing.geometry;
            assert!(g.d_max >= g.d_bore && g.d_med >= g.d_bore && g.d_min >= g.d_bore);
            assert!((g.diameter_ratio() - 0.1).abs() < 0.01);
            assert!(g.validate().is_ok());
        }
    }

    #[test]
    fn test_short_budget_is_infeasible() {
        // Slope at the gearbox seat is still inside its allowance at 1.2 m
        let constants = DesignConstants::default();
        let err = size_shaft(&reference_case(SupportTopology::ThreePoint, 1.2), &constants).unwrap_err();
        assert_eq!(err.error_code(), "INFEASIBLE_GEOMETRY");
        assert!(err.is_infeasible_design());
    }

    #[test]
    fn test_budget_below_seed_is_infeasible() {
        let constants = DesignConstants::default();
        let err = size_shaft(&reference_case(SupportTopology::ThreePoint, 0.3), &constants).unwrap_err();
        assert!(err.is_infeasible_design());
    }

    #[test]
    fn test_four_point_has_gearbox_span() {
        let constants = DesignConstants::default();
        let sizing = size_shaft(&reference_case(SupportTopology::FourPoint, 8.0), &constants).unwrap();
        let g = sizing.geometry;
        assert!(g.gearbox_span_m > constants.search.seed_span_m);
        assert!(g.main_span_m + g.gearbox_span_m <= 8.0 + 1e-9);
        assert_eq!(sizing.slopes.len(), 3);
        assert!(g.d_med >= g.d_min);
        // Thrust is located by the downwind bearing
        assert_eq!(sizing.upwind_reaction.axial_n, 0.0);
        assert!(sizing.second_reaction.axial_n < 0.0);
    }

    #[test]
    fn test_axial_only_without_gravity_is_infeasible() {
        let constants = DesignConstants {
            gravity: 0.0,
            ..DesignConstants::default()
        };
        let case = ShaftLoadCase {
            loads: RotorLoads {
                fx: -5.0e5,
                ..RotorLoads::with_rotor(110_000.0, 126.0)
            },
            shrink_disc_weight_n: 0.0,
            carrier_weight_n: 0.0,
            ..reference_case(SupportTopology::ThreePoint, 2.0)
        };
        // No bending means no slope, so no span reaches its allowance
        let err = size_shaft(&case, &constants).unwrap_err();
        assert_eq!(err.error_code(), "INFEASIBLE_GEOMETRY");
    }

    #[test]
    fn test_reactions_balance_vertical_loads() {
        let constants = DesignConstants::default();
        let case = reference_case(SupportTopology::ThreePoint, 8.0);
        let sizing = size_shaft(&case, &constants).unwrap();
        let cos = case.shaft_angle.0.cos();
        let applied = case.loads.fz
            - (sizing.shaft_weight_n + case.shrink_disc_weight_n + case.carrier_weight_n) * cos;
        let reactions = sizing.upwind_reaction.vertical_n + sizing.second_reaction.vertical_n;
        assert!((reactions + applied).abs() < 1e-6 * applied.abs());
    }

    #[test]
    fn test_topology_parsing() {
        assert_eq!(SupportTopology::from_str_flexible("3pt").unwrap(), SupportTopology::ThreePoint);
        assert_eq!(SupportTopology::from_str_flexible("Four Point").unwrap(), SupportTopology::FourPoint);
        assert!(SupportTopology::from_str_flexible("five").is_err());
        for topology in SupportTopology::ALL {
            assert_eq!(serde_json::to_string(&topology).unwrap(), format!("\"{}\"", topology.code()));
            assert_eq!(SupportTopology::from_str_flexible(topology.code()).unwrap(), topology);
        }
        assert_eq!(
            serde_json::to_string(&SupportTopology::FourPoint).unwrap(),
            "\"four-point\""
        );
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let case = ShaftLoadCase {
            shaft_ratio: 1.0,
            ..reference_case(SupportTopology::ThreePoint, 2.0)
        };
        assert!(size_shaft(&case, &DesignConstants::default()).is_err());
    }
}
