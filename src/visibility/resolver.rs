//! Per-field visibility decision
//!
//! A field is visible when both gates pass:
//! - classification gate: universal, or licensed by both the current
//!   complexity flag and the current project-type flag
//! - dependency gate: no dependency, or the referenced field's current value
//!   matches one of the declared values
//!
//! The decision is pure. Clearing hidden values is the caller's job.

use super::classification::ClassificationState;
use crate::catalog::{FieldDescriptor, FieldId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read access to live form values
pub trait FieldValues {
    /// Current value of a field, `None` when the form has no such field.
    ///
    /// Multi-valued controls return their checked values joined with `|`.
    fn value_of(&self, id: &FieldId) -> Option<String>;
}

/// Write access needed to clear fields that become hidden
pub trait FieldValuesMut: FieldValues {
    /// Empty the field. Returns true if it held a value.
    fn clear_field(&mut self, id: &FieldId) -> bool;
}

impl FieldValues for HashMap<FieldId, String> {
    fn value_of(&self, id: &FieldId) -> Option<String> {
        self.get(id).cloned()
    }
}

impl FieldValuesMut for HashMap<FieldId, String> {
    fn clear_field(&mut self, id: &FieldId) -> bool {
        match self.get_mut(id) {
            Some(value) if !value.is_empty() => {
                value.clear();
                true
            }
            _ => false,
        }
    }
}

/// How a dependency's current value is compared with its declared values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyMatch {
    /// The whole value (pipe-joined for checkbox groups) equals a declared value
    #[default]
    Exact,
    /// Any pipe-separated part of the value equals a declared value
    AnyOverlap,
}

impl DependencyMatch {
    fn matches(&self, current: &str, declared: &[String]) -> bool {
        match self {
            Self::Exact => declared.iter().any(|d| d == current),
            Self::AnyOverlap => current
                .split('|')
                .filter(|part| !part.is_empty())
                .any(|part| declared.iter().any(|d| d == part)),
        }
    }
}

pub fn classification_gate(field: &FieldDescriptor, state: &ClassificationState) -> bool {
    field.is_universal
        || (field.complexity.allows(state.complexity) && field.types.allows(&state.project_type))
}

/// Fails closed when the referenced field is not in the form
pub fn dependency_gate(
    field: &FieldDescriptor,
    values: &impl FieldValues,
    policy: DependencyMatch,
) -> bool {
    let Some(dependency) = &field.depends_on else {
        return true;
    };
    match values.value_of(&dependency.field) {
        Some(current) => policy.matches(&current, &dependency.values),
        None => false,
    }
}

/// Visibility resolver configured with a dependency match policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    policy: DependencyMatch,
}

impl Resolver {
    pub fn new(policy: DependencyMatch) -> Self {
        Self { policy }
    }

    pub fn resolve(
        &self,
        field: &FieldDescriptor,
        state: &ClassificationState,
        values: &impl FieldValues,
    ) -> bool {
        classification_gate(field, state) && dependency_gate(field, values, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldKind;
    use crate::visibility::{Complexity, ProjectType};

    fn values(pairs: &[(&str, &str)]) -> HashMap<FieldId, String> {
        pairs
            .iter()
            .map(|(k, v)| (FieldId::new(*k), v.to_string()))
            .collect()
    }

    fn state(complexity: Complexity, project_type: ProjectType) -> ClassificationState {
        ClassificationState::new(complexity, project_type)
    }

    fn all_states() -> Vec<ClassificationState> {
        let mut states = Vec::new();
        for complexity in Complexity::ALL {
            for project_type in [
                ProjectType::Strategic,
                ProjectType::Technical,
                ProjectType::Operational,
                ProjectType::Other("research".into()),
            ] {
                states.push(state(complexity, project_type));
            }
        }
        states
    }

    #[test]
    fn test_universal_fields_always_visible() {
        let field = FieldDescriptor::new("A", "Company", FieldKind::Text).universal();
        let resolver = Resolver::default();
        for s in all_states() {
            assert!(resolver.resolve(&field, &s, &values(&[])));
        }
    }

    #[test]
    fn test_both_flags_must_license_the_field() {
        let field = FieldDescriptor::new("A", "Architecture", FieldKind::Textarea)
            .with_complexity(false, true, false)
            .with_types(false, true, false);
        let resolver = Resolver::default();
        let empty = values(&[]);

        assert!(resolver.resolve(
            &field,
            &state(Complexity::Standard, ProjectType::Technical),
            &empty
        ));
        assert!(!resolver.resolve(
            &field,
            &state(Complexity::Standard, ProjectType::Strategic),
            &empty
        ));
        assert!(!resolver.resolve(
            &field,
            &state(Complexity::Complex, ProjectType::Technical),
            &empty
        ));
    }

    #[test]
    fn test_complex_flag_alone_does_not_license_technical() {
        let field = FieldDescriptor::new("A", "Risk Register", FieldKind::Text)
            .with_complexity(false, false, true)
            .with_types(true, false, false);
        assert!(!classification_gate(
            &field,
            &state(Complexity::Complex, ProjectType::Technical)
        ));
    }

    #[test]
    fn test_missing_flags_hide_the_field() {
        let field = FieldDescriptor::new("A", "Notes", FieldKind::Text);
        for s in all_states() {
            assert!(!classification_gate(&field, &s));
        }
    }

    #[test]
    fn test_no_dependency_passes_gate() {
        let field = FieldDescriptor::new("A", "Notes", FieldKind::Text);
        assert!(dependency_gate(&field, &values(&[]), DependencyMatch::Exact));
    }

    #[test]
    fn test_dependency_on_missing_field_fails_closed() {
        let field = FieldDescriptor::new("A", "Tech Stack", FieldKind::Text)
            .universal()
            .depends_on("Ghost Field", &["Yes"]);
        let resolver = Resolver::default();
        for s in all_states() {
            assert!(!resolver.resolve(&field, &s, &values(&[("other", "Yes")])));
        }
    }

    #[test]
    fn test_dependency_value_membership() {
        let field = FieldDescriptor::new("A", "Tech Stack", FieldKind::Text)
            .universal()
            .depends_on("problemcategory", &["Technical", "Operational"]);

        assert!(dependency_gate(
            &field,
            &values(&[("problemcategory", "Technical")]),
            DependencyMatch::Exact
        ));
        assert!(!dependency_gate(
            &field,
            &values(&[("problemcategory", "Strategic")]),
            DependencyMatch::Exact
        ));
        assert!(!dependency_gate(
            &field,
            &values(&[("problemcategory", "")]),
            DependencyMatch::Exact
        ));
    }

    #[test]
    fn test_exact_match_compares_joined_checkbox_value() {
        let field = FieldDescriptor::new("A", "Data Notes", FieldKind::Text)
            .depends_on("channels", &["Email|Phone"]);
        let joined = values(&[("channels", "Email|Phone")]);
        let single = values(&[("channels", "Email")]);

        assert!(dependency_gate(&field, &joined, DependencyMatch::Exact));
        assert!(!dependency_gate(&field, &single, DependencyMatch::Exact));
    }

    #[test]
    fn test_any_overlap_matches_a_single_checked_value() {
        let field = FieldDescriptor::new("A", "Data Notes", FieldKind::Text)
            .depends_on("channels", &["Phone"]);
        let current = values(&[("channels", "Email|Phone")]);

        assert!(!dependency_gate(&field, &current, DependencyMatch::Exact));
        assert!(dependency_gate(&field, &current, DependencyMatch::AnyOverlap));
        assert!(!dependency_gate(
            &field,
            &values(&[("channels", "")]),
            DependencyMatch::AnyOverlap
        ));
    }

    #[test]
    fn test_gates_are_anded() {
        let field = FieldDescriptor::new("A", "Tech Stack", FieldKind::Text)
            .with_complexity(true, true, true)
            .with_types(false, true, false)
            .depends_on("problemcategory", &["Technical"]);
        let resolver = Resolver::new(DependencyMatch::Exact);
        let technical = values(&[("problemcategory", "Technical")]);

        assert!(resolver.resolve(
            &field,
            &state(Complexity::Simple, ProjectType::Technical),
            &technical
        ));
        assert!(!resolver.resolve(
            &field,
            &state(Complexity::Simple, ProjectType::Strategic),
            &technical
        ));
        assert!(!resolver.resolve(
            &field,
            &state(Complexity::Simple, ProjectType::Technical),
            &values(&[("problemcategory", "Strategic")])
        ));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let field = FieldDescriptor::new("A", "Tech Stack", FieldKind::Text)
            .everywhere()
            .depends_on("problemcategory", &["Technical"]);
        let resolver = Resolver::default();
        let s = state(Complexity::Standard, ProjectType::Technical);
        let v = values(&[("problemcategory", "Technical")]);
        assert_eq!(
            resolver.resolve(&field, &s, &v),
            resolver.resolve(&field, &s, &v)
        );
    }

    #[test]
    fn test_hashmap_clear_field() {
        let mut v = values(&[("a", "x"), ("b", "")]);
        assert!(v.clear_field(&FieldId::new("a")));
        assert_eq!(v.value_of(&FieldId::new("a")), Some(String::new()));
        assert!(!v.clear_field(&FieldId::new("b")));
        assert!(!v.clear_field(&FieldId::new("c")));
    }
}
