//! # shaft_core - Low-Speed Shaft Sizing Engine
//!
//! `shaft_core` sizes the low-speed shaft of a wind turbine drivetrain and its
//! main bearings from rotor hub loads. All inputs and outputs are
//! JSON-serializable so designs can be stored in projects or driven from
//! scripts.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: `calculate(input, constants)` is a pure function
//! - **JSON-First**: All inputs, results and errors implement Serialize/Deserialize
//! - **Rich Errors**: Infeasible layouts are structured errors, not panics
//! - **Explicit Constants**: Every empirical factor lives in [`config::DesignConstants`]
//!
//! ## Quick Start
//!
//! ```rust
//! use shaft_core::calculations::low_speed_shaft::{calculate, FatigueMode, LowSpeedShaftInput};
//! use shaft_core::calculations::static_sizing::SupportTopology;
//! use shaft_core::config::DesignConstants;
//!
//! let input = LowSpeedShaftInput::reference_5mw(SupportTopology::ThreePoint, FatigueMode::Off);
//! let result = calculate(&input, &DesignConstants::default()).unwrap();
//!
//! assert!(result.hub_seat_diameter_m > result.bore_m);
//! println!("{}: {:.0} kg, {:.2} m long", result.label, result.mass_kg, result.length_m);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Beam model, static and fatigue sizing, mass properties
//! - [`loads`] - Rotor loads, wind climate and load spectra
//! - [`bearings`] - Main bearing families and seat dimensions
//! - [`materials`] - Shaft steel and S-N curve
//! - [`config`] - Design constants and search settings
//! - [`project`] - Project container, metadata, and settings
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`pdf`] - Typst calculation reports
//! - [`units`] - Type-safe unit wrappers
//! - [`numeric`] - Quadrature and sampling helpers
//! - [`errors`] - Structured error types

pub mod bearings;
pub mod calculations;
pub mod config;
pub mod errors;
pub mod file_io;
pub mod loads;
pub mod materials;
pub mod numeric;
pub mod pdf;
pub mod project;
pub mod units;

pub use calculations::low_speed_shaft::{calculate, FatigueMode, LowSpeedShaftInput, LowSpeedShaftResult};
pub use calculations::static_sizing::SupportTopology;
pub use config::DesignConstants;
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_project, save_project, FileLock};
pub use project::{GlobalSettings, Project, ProjectMetadata};
