//! # Design Projects
//!
//! A `Project` groups shaft designs for one turbine study together with the
//! design constants they are sized against. Projects serialize to `.lss`
//! files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, engineer, turbine, timestamps)
//! ├── settings: GlobalSettings (design standard, design constants)
//! └── items: HashMap<Uuid, CalculationItem> (all shaft designs)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::calculations::low_speed_shaft::{FatigueMode, LowSpeedShaftInput};
//! use shaft_core::calculations::static_sizing::SupportTopology;
//! use shaft_core::calculations::CalculationItem;
//! use shaft_core::project::Project;
//!
//! let mut project = Project::new("Jane Engineer", "WT-042", "NREL 5MW");
//! let input = LowSpeedShaftInput::reference_5mw(SupportTopology::ThreePoint, FatigueMode::Off);
//! let id = project.add_item(CalculationItem::LowSpeedShaft(input));
//!
//! let results = project.run_all();
//! assert!(results[&id].is_ok());
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{CalculationItem, CalculationOutput};
use crate::config::DesignConstants;
use crate::errors::CalcResult;

/// Current schema version for .lss files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container, serialized to `.lss` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,

    pub settings: GlobalSettings,

    /// All shaft designs, keyed by UUID
    pub items: HashMap<Uuid, CalculationItem>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shaft_core::project::Project;
    ///
    /// let project = Project::new("John Doe", "WT-001", "NREL 5MW");
    /// assert_eq!(project.meta.turbine, "NREL 5MW");
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, turbine: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                turbine: turbine.into(),
                created: now,
                modified: now,
            },
            settings: GlobalSettings::default(),
            items: HashMap::new(),
        }
    }

    /// Add a design and return its UUID.
    pub fn add_item(&mut self, item: CalculationItem) -> Uuid {
        let id = Uuid::new_v4();
        self.items.insert(id, item);
        self.touch();
        id
    }

    /// Remove a design by UUID.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<CalculationItem> {
        let item = self.items.remove(id);
        if item.is_some() {
            self.touch();
        }
        item
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&CalculationItem> {
        self.items.get(id)
    }

    /// Mutable access; marks the project as modified when the item exists.
    pub fn get_item_mut(&mut self, id: &Uuid) -> Option<&mut CalculationItem> {
        if self.items.contains_key(id) {
            self.meta.modified = Utc::now();
            self.items.get_mut(id)
        } else {
            None
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Size every design against the project constants.
    ///
    /// Failures are kept per item so one infeasible layout does not hide the
    /// others.
    pub fn run_all(&self) -> HashMap<Uuid, CalcResult<CalculationOutput>> {
        self.items
            .iter()
            .map(|(id, item)| {
                let outcome = item.run(&self.settings.constants);
                if let Err(e) = &outcome {
                    tracing::warn!(label = item.label(), code = e.error_code(), "design failed: {}", e);
                }
                (*id, outcome)
            })
            .collect()
    }

    /// Items sorted by label for stable listings
    pub fn items_by_label(&self) -> Vec<(&Uuid, &CalculationItem)> {
        let mut items: Vec<_> = self.items.iter().collect();
        items.sort_by(|a, b| a.1.label().cmp(b.1.label()));
        items
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    /// Turbine or platform the designs belong to
    pub turbine: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Global project settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Design standard the loads come from (e.g., "IEC 61400-1 Ed. 3")
    pub standard: String,

    /// Constants every design in the project is sized against
    #[serde(default)]
    pub constants: DesignConstants,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSettings {
            standard: "IEC 61400-1 Ed. 3".to_string(),
            constants: DesignConstants::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::low_speed_shaft::{FatigueMode, LowSpeedShaftInput};
    use crate::calculations::static_sizing::SupportTopology;

    fn design(label: &str) -> CalculationItem {
        let mut input = LowSpeedShaftInput::reference_5mw(SupportTopology::ThreePoint, FatigueMode::Off);
        input.label = label.to_string();
        CalculationItem::LowSpeedShaft(input)
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("John Doe", "WT-001", "NREL 5MW");
        assert_eq!(project.meta.engineer, "John Doe");
        assert_eq!(project.meta.job_id, "WT-001");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.settings.constants, DesignConstants::default());
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("Jane Engineer", "WT-042", "NREL 5MW");
        project.add_item(design("LSS-1"));
        let json = serde_json::to_string_pretty(&project).unwrap();

        assert!(json.contains("Jane Engineer"));
        assert!(json.contains("IEC 61400-1"));
        assert!(json.contains("LowSpeedShaft"));

        let roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.meta.engineer, "Jane Engineer");
        assert_eq!(roundtrip.item_count(), 1);
    }

    #[test]
    fn test_add_remove_item() {
        let mut project = Project::new("Engineer", "WT-001", "Test");
        let id = project.add_item(design("LSS-1"));
        assert_eq!(project.item_count(), 1);
        assert!(project.get_item(&id).is_some());

        let removed = project.remove_item(&id);
        assert!(removed.is_some());
        assert_eq!(project.item_count(), 0);
        assert!(project.remove_item(&id).is_none());
    }

    #[test]
    fn test_run_all_keeps_failures_per_item() {
        let mut project = Project::new("Engineer", "WT-001", "Test");
        let good = project.add_item(design("LSS-good"));

        let mut cramped = LowSpeedShaftInput::reference_5mw(SupportTopology::ThreePoint, FatigueMode::Off);
        cramped.overhang_m = 1.5;
        let bad = project.add_item(CalculationItem::LowSpeedShaft(cramped));

        let results = project.run_all();
        assert!(results[&good].is_ok());
        assert!(results[&bad].as_ref().unwrap_err().is_infeasible_design());
    }

    #[test]
    fn test_items_by_label() {
        let mut project = Project::new("Engineer", "WT-001", "Test");
        project.add_item(design("LSS-b"));
        project.add_item(design("LSS-a"));
        let labels: Vec<_> = project.items_by_label().iter().map(|(_, item)| item.label()).collect();
        assert_eq!(labels, vec!["LSS-a", "LSS-b"]);
    }
}
