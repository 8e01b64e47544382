//! Shaft Beam Model
//!
//! Euler-Bernoulli beam built by superposition of closed-form load terms.
//! The shaft runs along x from the hub center (x = 0, free end) toward the
//! gearbox. Every load type supplies its bending moment and the first and
//! second analytic integrals of that moment in Macaulay-bracket form, so the
//! slope and deflection anywhere follow from two integration constants:
//!
//! ```text
//! EI·θ(x) = ∫M + C1
//! EI·v(x) = ∫∫M + C1·x + C2
//! ```
//!
//! `C1` and `C2` come from zero deflection at the two supports and hold over
//! any overhang beyond them, so slope and deflection stay continuous.
//!
//! ## Sign Convention
//! - Transverse forces positive upward (+z or +y)
//! - Couples positive clockwise in the x-z view (rotation from +z toward +x)
//! - Positive moment: sagging; positive deflection: upward
//!
//! ## Example
//! ```rust
//! use shaft_core::calculations::beam_segment::{BeamLoad, BeamModel};
//!
//! // 2 m span between supports at x = 1 and x = 3, 10 kN upward at the free end
//! let mut model = BeamModel::new(2.1e11, 0.05);
//! model.add_load(BeamLoad::point_force(10_000.0, 0.0));
//!
//! let beam = model.solve_supports(1.0, 3.0).unwrap();
//! assert!(beam.deflection_at(1.0).abs() < 1e-12);
//! assert!(beam.deflection_at(3.0).abs() < 1e-12);
//! println!("Slope at hub: {:.3e} rad", beam.slope_at(0.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Macaulay bracket ⟨x - a⟩ raised to `power` (zero left of `a`)
fn bracket(x: f64, a: f64, power: i32) -> f64 {
    if x < a {
        0.0
    } else if power == 0 {
        1.0
    } else {
        (x - a).powi(power)
    }
}

/// A single load applied to the shaft
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeamLoad {
    /// Transverse point force (N) at position (m from hub center)
    PointForce { magnitude: f64, position: f64 },

    /// Point couple (N·m) at position (m from hub center)
    PointMoment { magnitude: f64, position: f64 },

    /// Uniform line load (N/m) over [start, end]
    Distributed { intensity: f64, start: f64, end: f64 },
}

impl BeamLoad {
    /// Create a point force
    pub fn point_force(magnitude: f64, position: f64) -> Self {
        BeamLoad::PointForce { magnitude, position }
    }

    /// Create a point couple
    pub fn point_moment(magnitude: f64, position: f64) -> Self {
        BeamLoad::PointMoment { magnitude, position }
    }

    /// Create a uniform line load
    pub fn distributed(intensity: f64, start: f64, end: f64) -> Self {
        BeamLoad::Distributed { intensity, start, end }
    }

    /// Net transverse force
    pub fn resultant(&self) -> f64 {
        match self {
            BeamLoad::PointForce { magnitude, .. } => *magnitude,
            BeamLoad::PointMoment { .. } => 0.0,
            BeamLoad::Distributed { intensity, start, end } => intensity * (end - start),
        }
    }

    /// Clockwise moment of the whole load about station `x`
    pub fn moment_about(&self, x: f64) -> f64 {
        match self {
            BeamLoad::PointForce { magnitude, position } => magnitude * (x - position),
            BeamLoad::PointMoment { magnitude, .. } => *magnitude,
            BeamLoad::Distributed { intensity, start, end } => {
                intensity * (end - start) * (x - 0.5 * (start + end))
            }
        }
    }

    /// Contribution to the bending moment at `x`
    pub fn moment_at(&self, x: f64) -> f64 {
        match self {
            BeamLoad::PointForce { magnitude, position } => magnitude * bracket(x, *position, 1),
            BeamLoad::PointMoment { magnitude, position } => magnitude * bracket(x, *position, 0),
            BeamLoad::Distributed { intensity, start, end } => {
                intensity * (bracket(x, *start, 2) - bracket(x, *end, 2)) / 2.0
            }
        }
    }

    /// ∫M dx from the hub to `x`
    pub fn moment_integral(&self, x: f64) -> f64 {
        match self {
            BeamLoad::PointForce { magnitude, position } => magnitude * bracket(x, *position, 2) / 2.0,
            BeamLoad::PointMoment { magnitude, position } => magnitude * bracket(x, *position, 1),
            BeamLoad::Distributed { intensity, start, end } => {
                intensity * (bracket(x, *start, 3) - bracket(x, *end, 3)) / 6.0
            }
        }
    }

    /// ∫∫M dx² from the hub to `x`
    pub fn moment_double_integral(&self, x: f64) -> f64 {
        match self {
            BeamLoad::PointForce { magnitude, position } => magnitude * bracket(x, *position, 3) / 6.0,
            BeamLoad::PointMoment { magnitude, position } => magnitude * bracket(x, *position, 2) / 2.0,
            BeamLoad::Distributed { intensity, start, end } => {
                intensity * (bracket(x, *start, 4) - bracket(x, *end, 4)) / 24.0
            }
        }
    }

    fn stations(&self) -> Vec<f64> {
        match self {
            BeamLoad::PointForce { position, .. } | BeamLoad::PointMoment { position, .. } => {
                vec![*position]
            }
            BeamLoad::Distributed { start, end, .. } => vec![*start, *end],
        }
    }
}

/// Unsupported beam: stiffness plus applied loads.
#[derive(Debug, Clone)]
pub struct BeamModel {
    /// Young's modulus (Pa)
    pub elastic_modulus: f64,
    /// Second moment of area (m⁴)
    pub second_moment: f64,
    /// Applied loads
    pub loads: Vec<BeamLoad>,
}

impl BeamModel {
    /// Create an unloaded beam
    pub fn new(elastic_modulus: f64, second_moment: f64) -> Self {
        BeamModel {
            elastic_modulus,
            second_moment,
            loads: Vec::new(),
        }
    }

    /// Add a load
    pub fn add_load(&mut self, load: BeamLoad) {
        self.loads.push(load);
    }

    /// Builder form of [`add_load`](Self::add_load)
    pub fn with_load(mut self, load: BeamLoad) -> Self {
        self.loads.push(load);
        self
    }

    /// Rest the beam on supports at `a < b`, solving reactions and integration constants.
    pub fn solve_supports(&self, a: f64, b: f64) -> CalcResult<SupportedBeam> {
        let span = b - a;
        if !(a.is_finite() && b.is_finite() && span > 1e-9) {
            return Err(CalcError::invalid_input(
                "support_span",
                format!("[{}, {}]", a, b),
                "Supports must be finite and ordered with a positive span",
            ));
        }
        let ei = self.elastic_modulus * self.second_moment;
        if !(ei.is_finite() && ei > 0.0) {
            return Err(CalcError::invalid_input(
                "bending_stiffness",
                ei.to_string(),
                "EI must be positive",
            ));
        }

        // Moment balance about b, then force balance
        let applied_moment_b: f64 = self.loads.iter().map(|l| l.moment_about(b)).sum();
        let applied_force: f64 = self.loads.iter().map(BeamLoad::resultant).sum();
        let reaction_a = -applied_moment_b / span;
        let reaction_b = -applied_force - reaction_a;

        let mut loads = self.loads.clone();
        loads.push(BeamLoad::point_force(reaction_a, a));
        loads.push(BeamLoad::point_force(reaction_b, b));

        let i2 = |x: f64| -> f64 { loads.iter().map(|l| l.moment_double_integral(x)).sum() };
        let c1 = -(i2(b) - i2(a)) / span;
        let c2 = -i2(a) - c1 * a;

        Ok(SupportedBeam {
            loads,
            supports: (a, b),
            reactions: (reaction_a, reaction_b),
            ei,
            c1,
            c2,
        })
    }
}

/// Beam resting on two supports with solved reactions.
#[derive(Debug, Clone)]
pub struct SupportedBeam {
    loads: Vec<BeamLoad>,
    /// Support stations (m)
    pub supports: (f64, f64),
    /// Upward support reactions (N)
    pub reactions: (f64, f64),
    ei: f64,
    c1: f64,
    c2: f64,
}

impl SupportedBeam {
    /// Bending moment at `x` (N·m)
    pub fn moment_at(&self, x: f64) -> f64 {
        self.loads.iter().map(|l| l.moment_at(x)).sum()
    }

    /// Slope at `x` (rad)
    pub fn slope_at(&self, x: f64) -> f64 {
        let i1: f64 = self.loads.iter().map(|l| l.moment_integral(x)).sum();
        (i1 + self.c1) / self.ei
    }

    /// Deflection at `x` (m)
    pub fn deflection_at(&self, x: f64) -> f64 {
        let i2: f64 = self.loads.iter().map(|l| l.moment_double_integral(x)).sum();
        (i2 + self.c1 * x + self.c2) / self.ei
    }

    /// Sample stations over [from, to]: `points` evenly spaced plus every load
    /// and support station inside the range
    pub fn sample_positions(&self, from: f64, to: f64, points: usize) -> Vec<f64> {
        let points = points.max(2);
        let mut positions: Vec<f64> = (0..points)
            .map(|i| from + (to - from) * i as f64 / (points - 1) as f64)
            .collect();
        for load in &self.loads {
            positions.extend(load.stations().into_iter().filter(|x| *x >= from && *x <= to));
        }
        positions.sort_by(|a, b| a.total_cmp(b));
        positions.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        positions
    }
}

/// Shaft bent in two orthogonal planes sharing the same supports.
///
/// The vertical plane carries gravity, Fz and My; the horizontal plane carries
/// Fy and Mz. Moments and slopes combine as vector resultants.
#[derive(Debug, Clone)]
pub struct TwoPlaneBeam {
    pub vertical: SupportedBeam,
    pub horizontal: SupportedBeam,
}

impl TwoPlaneBeam {
    /// Solve both planes on supports `a` and `b`
    pub fn solve(vertical: &BeamModel, horizontal: &BeamModel, a: f64, b: f64) -> CalcResult<Self> {
        Ok(TwoPlaneBeam {
            vertical: vertical.solve_supports(a, b)?,
            horizontal: horizontal.solve_supports(a, b)?,
        })
    }

    /// Resultant bending moment magnitude at `x`
    pub fn moment_magnitude(&self, x: f64) -> f64 {
        self.vertical.moment_at(x).hypot(self.horizontal.moment_at(x))
    }

    /// Resultant slope magnitude at `x`
    pub fn slope_magnitude(&self, x: f64) -> f64 {
        self.vertical.slope_at(x).hypot(self.horizontal.slope_at(x))
    }

    /// Largest resultant moment over [from, to] and where it occurs
    pub fn max_moment(&self, from: f64, to: f64, points: usize) -> (f64, f64) {
        let mut positions = self.vertical.sample_positions(from, to, points);
        positions.extend(self.horizontal.sample_positions(from, to, points));

        positions
            .into_iter()
            .map(|x| (x, self.moment_magnitude(x)))
            .fold((from, 0.0), |best, (x, m)| if m > best.1 { (x, m) } else { best })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: f64 = 2.0e11;
    const I: f64 = 1.0e-4;

    #[test]
    fn test_end_moment_slopes() {
        // Simply supported, couple M0 at the left support: θA = M0·L/3EI, θB = M0·L/6EI
        let m0 = 5_000.0;
        let l = 2.0;
        let beam = BeamModel::new(E, I)
            .with_load(BeamLoad::point_moment(m0, 0.0))
            .solve_supports(0.0, l)
            .unwrap();

        let ei = E * I;
        assert!((beam.slope_at(0.0).abs() - m0 * l / (3.0 * ei)).abs() < 1e-12);
        assert!((beam.slope_at(l).abs() - m0 * l / (6.0 * ei)).abs() < 1e-12);
        assert!(beam.slope_at(0.0) * beam.slope_at(l) < 0.0);
    }

    #[test]
    fn test_uniform_load_simply_supported() {
        let q = -1_000.0;
        let l = 3.0;
        let beam = BeamModel::new(E, I)
            .with_load(BeamLoad::distributed(q, 0.0, l))
            .solve_supports(0.0, l)
            .unwrap();

        let ei = E * I;
        // Reactions wL/2 upward
        assert!((beam.reactions.0 - 1_500.0).abs() < 1e-9);
        assert!((beam.reactions.1 - 1_500.0).abs() < 1e-9);
        // End slope wL³/24EI, midspan deflection 5wL⁴/384EI (downward)
        assert!((beam.slope_at(l).abs() - 1_000.0 * l.powi(3) / (24.0 * ei)).abs() < 1e-12);
        let mid = beam.deflection_at(l / 2.0);
        assert!(mid < 0.0);
        assert!((mid.abs() - 5.0 * 1_000.0 * l.powi(4) / (384.0 * ei)).abs() < 1e-12);
        // Midspan moment wL²/8
        assert!((beam.moment_at(l / 2.0).abs() - 1_000.0 * l * l / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_midspan_point_load() {
        let p = -2_000.0;
        let l = 4.0;
        let beam = BeamModel::new(E, I)
            .with_load(BeamLoad::point_force(p, l / 2.0))
            .solve_supports(0.0, l)
            .unwrap();

        let ei = E * I;
        assert!((beam.deflection_at(l / 2.0).abs() - 2_000.0 * l.powi(3) / (48.0 * ei)).abs() < 1e-12);
        assert!(beam.slope_at(l / 2.0).abs() < 1e-15);
    }

    #[test]
    fn test_overhang_tip_load() {
        // Supports at 1 and 3, tip force at the free end x = 0
        // Overhang a = 1, span L = 2: tip deflection P·a²(L + a)/3EI
        let p = 10_000.0;
        let beam = BeamModel::new(E, I)
            .with_load(BeamLoad::point_force(p, 0.0))
            .solve_supports(1.0, 3.0)
            .unwrap();

        let ei = E * I;
        assert!(beam.deflection_at(1.0).abs() < 1e-12);
        assert!(beam.deflection_at(3.0).abs() < 1e-12);
        assert!((beam.deflection_at(0.0) - p * 1.0 * 3.0 / (3.0 * ei)).abs() < 1e-12);
        // Far support slope P·a·L/6EI
        assert!((beam.slope_at(3.0).abs() - p * 1.0 * 2.0 / (6.0 * ei)).abs() < 1e-12);
        // Reactions: R_a = -P(L + a)/L, R_b = P·a/L
        assert!((beam.reactions.0 + p * 1.5).abs() < 1e-9);
        assert!((beam.reactions.1 - p * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_moment_vanishes_beyond_all_loads() {
        let beam = BeamModel::new(E, I)
            .with_load(BeamLoad::point_force(-3_000.0, 0.0))
            .with_load(BeamLoad::point_moment(12_000.0, 0.0))
            .with_load(BeamLoad::distributed(-800.0, 0.0, 4.0))
            .solve_supports(1.5, 4.0)
            .unwrap();
        assert!(beam.moment_at(4.0 + 1e-9).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_degenerate_span() {
        let model = BeamModel::new(E, I).with_load(BeamLoad::point_force(1.0, 0.0));
        assert!(model.solve_supports(1.0, 1.0).is_err());
        assert!(model.solve_supports(2.0, 1.0).is_err());
        assert!(BeamModel::new(E, 0.0).solve_supports(0.0, 1.0).is_err());
    }

    #[test]
    fn test_two_plane_resultants() {
        let vertical = BeamModel::new(E, I).with_load(BeamLoad::point_moment(3_000.0, 0.0));
        let horizontal = BeamModel::new(E, I).with_load(BeamLoad::point_moment(4_000.0, 0.0));
        let beam = TwoPlaneBeam::solve(&vertical, &horizontal, 0.0, 2.0).unwrap();
        assert!((beam.moment_magnitude(0.0) - 5_000.0).abs() < 1e-9);
        let (x, m) = beam.max_moment(0.0, 2.0, 11);
        assert!((m - 5_000.0).abs() < 1e-9);
        assert_eq!(x, 0.0);
    }

    #[test]
    fn test_sample_positions_include_supports() {
        let beam = BeamModel::new(E, I)
            .with_load(BeamLoad::point_force(1.0, 0.0))
            .solve_supports(1.234, 3.0)
            .unwrap();
        let positions = beam.sample_positions(0.0, 3.0, 11);
        assert!(positions.iter().any(|x| (*x - 1.234).abs() < 1e-15));
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn slopes_superpose(p in -1.0e5f64..1.0e5, c in -1.0e5f64..1.0e5, q in -1.0e4f64..1.0e4, x in 0.0f64..4.0) {
            let a = 1.0;
            let b = 3.5;
            let f = BeamLoad::point_force(p, 0.0);
            let m = BeamLoad::point_moment(c, 0.0);
            let w = BeamLoad::distributed(q, 0.0, 4.0);

            let combined = BeamModel::new(2.1e11, 0.02).with_load(f).with_load(m).with_load(w)
                .solve_supports(a, b).unwrap();
            let parts: f64 = [f, m, w].iter()
                .map(|l| BeamModel::new(2.1e11, 0.02).with_load(*l).solve_supports(a, b).unwrap().slope_at(x))
                .sum();
            prop_assert!((combined.slope_at(x) - parts).abs() <= 1e-12 + 1e-9 * parts.abs());
        }

        #[test]
        fn supports_never_deflect(p in -1.0e5f64..1.0e5, a in 0.1f64..2.0, span in 0.1f64..3.0) {
            let beam = BeamModel::new(2.1e11, 0.02)
                .with_load(BeamLoad::point_force(p, 0.0))
                .with_load(BeamLoad::distributed(-p / 10.0, 0.0, a + span))
                .solve_supports(a, a + span).unwrap();
            prop_assert!(beam.deflection_at(a).abs() < 1e-12);
            prop_assert!(beam.deflection_at(a + span).abs() < 1e-12);
        }
    }
}
