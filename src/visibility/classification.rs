//! Complexity and project-type classification
//!
//! Both labels are derived from the current form values and never stored on
//! their own: the caller recomputes them whenever an input field commits.

use super::resolver::FieldValues;
use crate::catalog::{Catalog, FieldId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project complexity, ordered `Simple < Standard < Complex`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Standard,
    Complex,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Self::Simple, Self::Standard, Self::Complex];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Standard => "standard",
            Self::Complex => "complex",
        }
    }

    /// Budget bracket -> complexity. Unknown or empty input is `Simple`.
    pub fn from_budget(budget: &str) -> Self {
        match budget.trim() {
            "Under $5K" | "$5K-15K" => Self::Simple,
            "$15K-50K" | "$50K-100K" => Self::Standard,
            "$100K-250K" | "$250K+" => Self::Complex,
            _ => Self::Simple,
        }
    }

    /// Duration bracket -> complexity. Unknown or empty input is `Simple`.
    pub fn from_duration(duration: &str) -> Self {
        match duration.trim() {
            "1-2 weeks" | "3-4 weeks" => Self::Simple,
            "1-3 months" | "3-6 months" => Self::Standard,
            "6-12 months" | "12+ months" => Self::Complex,
            _ => Self::Simple,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Higher of the budget and duration brackets
pub fn classify(budget: &str, duration: &str) -> Complexity {
    Complexity::from_budget(budget).max(Complexity::from_duration(duration))
}

/// Project type taken from the problem category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ProjectType {
    #[default]
    Strategic,
    Technical,
    Operational,
    /// Any other category, kept lowercase
    Other(String),
}

impl ProjectType {
    /// Case-insensitive pass-through of the category; empty is `Strategic`
    pub fn from_category(category: &str) -> Self {
        let category = category.trim().to_lowercase();
        match category.as_str() {
            "" | "strategic" => Self::Strategic,
            "technical" => Self::Technical,
            "operational" => Self::Operational,
            _ => Self::Other(category),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Strategic => "strategic",
            Self::Technical => "technical",
            Self::Operational => "operational",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Names of the fields that feed classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationInputs {
    pub budget: FieldId,
    pub duration: FieldId,
    pub category: FieldId,
}

impl Default for ClassificationInputs {
    fn default() -> Self {
        Self {
            budget: FieldId::new("budgetrange"),
            duration: FieldId::new("projectduration"),
            category: FieldId::new("problemcategory"),
        }
    }
}

impl ClassificationInputs {
    pub fn affects_complexity(&self, id: &FieldId) -> bool {
        id == &self.budget || id == &self.duration
    }

    pub fn affects_project_type(&self, id: &FieldId) -> bool {
        id == &self.category
    }

    pub fn is_input(&self, id: &FieldId) -> bool {
        self.affects_complexity(id) || self.affects_project_type(id)
    }
}

/// Current classification labels
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassificationState {
    pub complexity: Complexity,
    pub project_type: ProjectType,
}

impl ClassificationState {
    pub fn new(complexity: Complexity, project_type: ProjectType) -> Self {
        Self {
            complexity,
            project_type,
        }
    }

    /// Derive both labels from the form. Missing inputs read as empty.
    pub fn from_values(values: &impl FieldValues, inputs: &ClassificationInputs) -> Self {
        let read = |id: &FieldId| values.value_of(id).unwrap_or_default();
        Self {
            complexity: classify(&read(&inputs.budget), &read(&inputs.duration)),
            project_type: ProjectType::from_category(&read(&inputs.category)),
        }
    }
}

impl fmt::Display for ClassificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.complexity, self.project_type)
    }
}

/// Number of fields the classification gate admits at each complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldCounts {
    pub simple: usize,
    pub standard: usize,
    pub complex: usize,
}

/// Count fields admitted at every complexity for one project type
pub fn expected_counts(catalog: &Catalog, project_type: &ProjectType) -> FieldCounts {
    let mut counts = FieldCounts::default();
    for complexity in Complexity::ALL {
        let state = ClassificationState::new(complexity, project_type.clone());
        let admitted = catalog
            .fields()
            .iter()
            .filter(|f| super::resolver::classification_gate(f, &state))
            .count();
        match complexity {
            Complexity::Simple => counts.simple = admitted,
            Complexity::Standard => counts.standard = admitted,
            Complexity::Complex => counts.complex = admitted,
        }
    }
    counts
}
