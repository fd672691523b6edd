//! Change propagation
//!
//! Owns the current classification and the last visibility decision for every
//! field and section. A committed value change re-runs classification when the
//! field is a classification input; a classification change re-resolves every
//! field, otherwise only the changed field's dependents are re-resolved.
//! Hidden fields are cleared, and clearing is treated as a change of its own so
//! dependency chains settle in one call.

use super::classification::{ClassificationInputs, ClassificationState};
use super::resolver::{FieldValues, FieldValuesMut, Resolver};
use crate::catalog::{Catalog, FieldDescriptor, FieldId, SectionId};
use std::collections::{HashMap, VecDeque};

/// What a propagation pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityChange {
    pub shown: Vec<FieldId>,
    pub hidden: Vec<FieldId>,
    pub cleared: Vec<FieldId>,
    pub classification_changed: bool,
}

impl VisibilityChange {
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
            && self.hidden.is_empty()
            && self.cleared.is_empty()
            && !self.classification_changed
    }
}

/// Visibility state for one form
#[derive(Debug, Clone)]
pub struct VisibilityEngine {
    inputs: ClassificationInputs,
    resolver: Resolver,
    state: ClassificationState,
    fields: HashMap<FieldId, bool>,
    sections: HashMap<SectionId, bool>,
}

impl VisibilityEngine {
    /// Start from the initial render state (`show_by_default` rules)
    pub fn new(catalog: &Catalog, inputs: ClassificationInputs, resolver: Resolver) -> Self {
        let fields = catalog
            .fields()
            .iter()
            .map(|f| (f.id.clone(), f.initially_visible()))
            .collect();
        let mut engine = Self {
            inputs,
            resolver,
            state: ClassificationState::default(),
            fields,
            sections: HashMap::new(),
        };
        engine.derive_sections(catalog);
        engine
    }

    pub fn classification(&self) -> &ClassificationState {
        &self.state
    }

    pub fn is_visible(&self, id: &FieldId) -> bool {
        self.fields.get(id).copied().unwrap_or(false)
    }

    pub fn is_section_visible(&self, id: &SectionId) -> bool {
        self.sections.get(id).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.fields.values().filter(|&&v| v).count()
    }

    /// Classify from the current values and resolve every field
    pub fn initialize(
        &mut self,
        catalog: &Catalog,
        values: &mut impl FieldValuesMut,
    ) -> VisibilityChange {
        let mut change = VisibilityChange::default();
        self.refresh_classification(&*values, &mut change);
        self.full_pass(catalog, values, &mut change);
        self.settle(catalog, values, &mut change);
        self.derive_sections(catalog);
        change
    }

    /// Back to the default classification, then resolve every field
    pub fn reset(&mut self, catalog: &Catalog, values: &mut impl FieldValuesMut) -> VisibilityChange {
        self.state = ClassificationState::default();
        self.initialize(catalog, values)
    }

    /// Propagate a committed value change of `changed`
    pub fn on_commit(
        &mut self,
        catalog: &Catalog,
        changed: &FieldId,
        values: &mut impl FieldValuesMut,
    ) -> VisibilityChange {
        let mut change = VisibilityChange::default();

        if self.inputs.is_input(changed) && self.refresh_classification(&*values, &mut change) {
            self.full_pass(catalog, values, &mut change);
        } else if catalog.has_dependents(changed) {
            self.cascade(catalog, vec![changed.clone()], values, &mut change);
        }

        self.settle(catalog, values, &mut change);
        self.derive_sections(catalog);

        if !change.is_empty() {
            tracing::debug!(
                field = %changed,
                shown = change.shown.len(),
                hidden = change.hidden.len(),
                cleared = change.cleared.len(),
                "Visibility updated"
            );
        }
        change
    }

    /// Recompute classification; true if either label moved
    fn refresh_classification(
        &mut self,
        values: &impl FieldValues,
        change: &mut VisibilityChange,
    ) -> bool {
        let next = ClassificationState::from_values(values, &self.inputs);
        if next == self.state {
            return false;
        }
        tracing::info!(from = %self.state, to = %next, "Classification changed");
        self.state = next;
        change.classification_changed = true;
        true
    }

    fn full_pass(
        &mut self,
        catalog: &Catalog,
        values: &mut impl FieldValuesMut,
        change: &mut VisibilityChange,
    ) {
        let mut cleared = Vec::new();
        for field in catalog.fields() {
            if self.evaluate(field, values, change) {
                cleared.push(field.id.clone());
            }
        }
        // Dependents resolved earlier in catalog order may have read a value
        // that was cleared later in the pass.
        self.cascade(catalog, cleared, values, change);
    }

    /// Re-resolve dependents of each changed field, following cleared fields
    fn cascade(
        &mut self,
        catalog: &Catalog,
        changed: Vec<FieldId>,
        values: &mut impl FieldValuesMut,
        change: &mut VisibilityChange,
    ) {
        let mut queue: VecDeque<FieldId> = changed.into();
        while let Some(id) = queue.pop_front() {
            let dependents: Vec<&FieldDescriptor> = catalog.dependents_of(&id).collect();
            for field in dependents {
                if self.evaluate(field, values, change) {
                    queue.push_back(field.id.clone());
                }
            }
        }
    }

    /// A hide may have cleared a classification input
    fn settle(
        &mut self,
        catalog: &Catalog,
        values: &mut impl FieldValuesMut,
        change: &mut VisibilityChange,
    ) {
        while change.cleared.iter().any(|id| self.inputs.is_input(id))
            && self.refresh_classification(&*values, change)
        {
            self.full_pass(catalog, values, change);
        }
    }

    /// Resolve one field, record the transition, clear it if hidden.
    /// Returns true if a value was cleared.
    fn evaluate(
        &mut self,
        field: &FieldDescriptor,
        values: &mut impl FieldValuesMut,
        change: &mut VisibilityChange,
    ) -> bool {
        let visible = self.resolver.resolve(field, &self.state, &*values);
        let was_visible = self.fields.insert(field.id.clone(), visible).unwrap_or(false);

        if visible && !was_visible {
            change.shown.push(field.id.clone());
        } else if !visible && was_visible {
            change.hidden.push(field.id.clone());
        }

        if !visible && values.clear_field(&field.id) {
            change.cleared.push(field.id.clone());
            return true;
        }
        false
    }

    fn derive_sections(&mut self, catalog: &Catalog) {
        self.sections = catalog
            .sections()
            .iter()
            .map(|section| {
                let any_visible = section.fields.iter().any(|id| self.is_visible(id));
                (section.id.clone(), any_visible)
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDescriptor, FieldKind};
    use crate::visibility::{Complexity, DependencyMatch, ProjectType};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> FieldId {
        FieldId::new(s)
    }

    fn select(section: &str, label: &str, options: &[&str]) -> FieldDescriptor {
        FieldDescriptor::new(section, label, FieldKind::Select)
            .universal()
            .with_options(options)
    }

    /// Budget/duration/category inputs plus a few gated fields
    fn catalog() -> Catalog {
        Catalog::from_descriptors(vec![
            select("Scope", "Budget Range", &["$5K-15K", "$15K-50K", "$250K+"]),
            select("Scope", "Project Duration", &["1-2 weeks", "6-12 months"]),
            select("Scope", "Problem Category", &["Strategic", "Technical", "Operational"]),
            FieldDescriptor::new("Tech", "Tech Stack", FieldKind::Text)
                .everywhere()
                .depends_on("problemcategory", &["Technical", "Operational"]),
            FieldDescriptor::new("Detail", "Architecture", FieldKind::Textarea)
                .with_complexity(false, true, true)
                .with_types(false, true, false),
            FieldDescriptor::new("Detail", "Risk Register", FieldKind::Textarea)
                .with_complexity(false, false, true)
                .with_types(true, true, true),
        ])
    }

    fn values(catalog: &Catalog) -> HashMap<FieldId, String> {
        catalog
            .fields()
            .iter()
            .map(|f| (f.id.clone(), String::new()))
            .collect()
    }

    fn engine(catalog: &Catalog) -> VisibilityEngine {
        VisibilityEngine::new(catalog, ClassificationInputs::default(), Resolver::default())
    }

    fn set(values: &mut HashMap<FieldId, String>, field: &str, value: &str) {
        values.insert(id(field), value.to_string());
    }

    #[test]
    fn test_initial_state_follows_show_by_default() {
        let catalog = catalog();
        let engine = engine(&catalog);

        assert!(engine.is_visible(&id("budgetrange")));
        // dependent fields start visible, plain gated fields start hidden
        assert!(engine.is_visible(&id("techstack")));
        assert!(!engine.is_visible(&id("architecture")));
        assert_eq!(engine.classification(), &ClassificationState::default());
    }

    #[test]
    fn test_initialize_resolves_every_field() {
        let catalog = catalog();
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);

        let change = engine.initialize(&catalog, &mut values);

        assert!(!change.classification_changed);
        assert_eq!(change.hidden, vec![id("techstack")]);
        assert!(engine.is_visible(&id("problemcategory")));
        assert!(!engine.is_visible(&id("architecture")));
        assert!(!engine.is_visible(&id("riskregister")));
    }

    #[test]
    fn test_scenario_complexity_from_either_input() {
        let catalog = catalog();
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);
        engine.initialize(&catalog, &mut values);

        set(&mut values, "budgetrange", "$5K-15K");
        engine.on_commit(&catalog, &id("budgetrange"), &mut values);
        assert_eq!(engine.classification().complexity, Complexity::Simple);

        set(&mut values, "projectduration", "6-12 months");
        let change = engine.on_commit(&catalog, &id("projectduration"), &mut values);
        assert!(change.classification_changed);
        assert_eq!(engine.classification().complexity, Complexity::Complex);
        assert!(engine.is_visible(&id("riskregister")));
        assert_eq!(change.shown, vec![id("riskregister")]);
    }

    #[test]
    fn test_project_type_change_reresolves_all_fields() {
        let catalog = catalog();
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);
        engine.initialize(&catalog, &mut values);

        set(&mut values, "budgetrange", "$15K-50K");
        engine.on_commit(&catalog, &id("budgetrange"), &mut values);
        assert!(!engine.is_visible(&id("architecture")));

        set(&mut values, "problemcategory", "Technical");
        let change = engine.on_commit(&catalog, &id("problemcategory"), &mut values);

        assert!(change.classification_changed);
        assert_eq!(
            engine.classification(),
            &ClassificationState::new(Complexity::Standard, ProjectType::Technical)
        );
        assert!(engine.is_visible(&id("architecture")));
        assert!(engine.is_visible(&id("techstack")));
    }

    #[test]
    fn test_dependency_hide_clears_value() {
        let catalog = catalog();
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);
        engine.initialize(&catalog, &mut values);

        set(&mut values, "problemcategory", "Technical");
        engine.on_commit(&catalog, &id("problemcategory"), &mut values);
        set(&mut values, "techstack", "Rust");
        engine.on_commit(&catalog, &id("techstack"), &mut values);
        assert!(engine.is_visible(&id("techstack")));

        set(&mut values, "problemcategory", "Strategic");
        let change = engine.on_commit(&catalog, &id("problemcategory"), &mut values);

        assert!(!engine.is_visible(&id("techstack")));
        assert!(change.hidden.contains(&id("techstack")));
        assert_eq!(change.cleared, vec![id("techstack")]);
        assert_eq!(values.value_of(&id("techstack")), Some(String::new()));
    }

    #[test]
    fn test_targeted_pass_only_touches_dependents() {
        let catalog = Catalog::from_descriptors(vec![
            FieldDescriptor::new("A", "Has Website", FieldKind::RadioGroup)
                .universal()
                .with_options(&["Yes", "No"]),
            FieldDescriptor::new("A", "Website", FieldKind::Text)
                .universal()
                .depends_on("haswebsite", &["Yes"]),
            FieldDescriptor::new("A", "Notes", FieldKind::Text).universal(),
        ]);
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);
        engine.initialize(&catalog, &mut values);
        assert!(!engine.is_visible(&id("website")));

        set(&mut values, "haswebsite", "Yes");
        let change = engine.on_commit(&catalog, &id("haswebsite"), &mut values);
        assert!(!change.classification_changed);
        assert_eq!(change.shown, vec![id("website")]);

        // a field nobody depends on changes nothing
        set(&mut values, "notes", "hello");
        let change = engine.on_commit(&catalog, &id("notes"), &mut values);
        assert!(change.is_empty());
    }

    #[test]
    fn test_cleared_parent_hides_chained_dependents() {
        let catalog = Catalog::from_descriptors(vec![
            FieldDescriptor::new("A", "Category", FieldKind::Select)
                .universal()
                .with_options(&["Technical", "Strategic"]),
            FieldDescriptor::new("A", "Has Legacy", FieldKind::RadioGroup)
                .universal()
                .with_options(&["Yes", "No"])
                .depends_on("category", &["Technical"]),
            FieldDescriptor::new("A", "Legacy Systems", FieldKind::Text)
                .universal()
                .depends_on("haslegacy", &["Yes"]),
        ]);
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);
        engine.initialize(&catalog, &mut values);

        set(&mut values, "category", "Technical");
        engine.on_commit(&catalog, &id("category"), &mut values);
        set(&mut values, "haslegacy", "Yes");
        engine.on_commit(&catalog, &id("haslegacy"), &mut values);
        set(&mut values, "legacysystems", "COBOL");
        assert!(engine.is_visible(&id("legacysystems")));

        set(&mut values, "category", "Strategic");
        let change = engine.on_commit(&catalog, &id("category"), &mut values);

        assert_eq!(change.cleared, vec![id("haslegacy"), id("legacysystems")]);
        assert!(!engine.is_visible(&id("haslegacy")));
        assert!(!engine.is_visible(&id("legacysystems")));
        assert_eq!(values.value_of(&id("legacysystems")), Some(String::new()));
    }

    #[test]
    fn test_hidden_classification_input_reclassifies() {
        let catalog = Catalog::from_descriptors(vec![
            FieldDescriptor::new("A", "Paid Project", FieldKind::RadioGroup)
                .universal()
                .with_options(&["Yes", "No"]),
            FieldDescriptor::new("A", "Budget Range", FieldKind::Select)
                .universal()
                .with_options(&["$250K+"])
                .depends_on("paidproject", &["Yes"]),
            FieldDescriptor::new("A", "Risk Register", FieldKind::Text)
                .with_complexity(false, false, true)
                .with_types(true, true, true),
        ]);
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);
        engine.initialize(&catalog, &mut values);

        set(&mut values, "paidproject", "Yes");
        engine.on_commit(&catalog, &id("paidproject"), &mut values);
        set(&mut values, "budgetrange", "$250K+");
        engine.on_commit(&catalog, &id("budgetrange"), &mut values);
        assert_eq!(engine.classification().complexity, Complexity::Complex);
        assert!(engine.is_visible(&id("riskregister")));

        set(&mut values, "paidproject", "No");
        let change = engine.on_commit(&catalog, &id("paidproject"), &mut values);

        assert!(change.classification_changed);
        assert_eq!(engine.classification().complexity, Complexity::Simple);
        assert!(!engine.is_visible(&id("riskregister")));
    }

    #[test]
    fn test_repeated_passes_are_idempotent() {
        let catalog = catalog();
        let mut values = values(&catalog);
        set(&mut values, "problemcategory", "Technical");
        set(&mut values, "budgetrange", "$250K+");
        set(&mut values, "techstack", "Rust");

        let mut engine = engine(&catalog);
        engine.initialize(&catalog, &mut values);
        let first: Vec<bool> = catalog
            .fields()
            .iter()
            .map(|f| engine.is_visible(&f.id))
            .collect();

        let change = engine.initialize(&catalog, &mut values);
        let second: Vec<bool> = catalog
            .fields()
            .iter()
            .map(|f| engine.is_visible(&f.id))
            .collect();

        assert!(change.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_initialize_clears_hidden_restored_values() {
        let catalog = catalog();
        let mut values = values(&catalog);
        set(&mut values, "architecture", "stale answer");

        let mut engine = engine(&catalog);
        let change = engine.initialize(&catalog, &mut values);

        assert_eq!(change.cleared, vec![id("architecture")]);
        assert_eq!(values.value_of(&id("architecture")), Some(String::new()));
    }

    #[test]
    fn test_section_hidden_when_all_fields_hidden() {
        let catalog = catalog();
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);
        engine.initialize(&catalog, &mut values);

        let scope = &catalog.sections()[0].id;
        let tech = &catalog.sections()[1].id;
        let detail = &catalog.sections()[2].id;
        assert!(engine.is_section_visible(scope));
        assert!(!engine.is_section_visible(tech));
        assert!(!engine.is_section_visible(detail));

        // one visible field is enough to reveal the section
        set(&mut values, "projectduration", "6-12 months");
        engine.on_commit(&catalog, &id("projectduration"), &mut values);
        assert!(engine.is_visible(&id("riskregister")));
        assert!(!engine.is_visible(&id("architecture")));
        assert!(engine.is_section_visible(detail));
    }

    #[test]
    fn test_reset_returns_to_default_classification() {
        let catalog = catalog();
        let mut values = values(&catalog);
        let mut engine = engine(&catalog);
        set(&mut values, "budgetrange", "$250K+");
        engine.initialize(&catalog, &mut values);
        assert_eq!(engine.classification().complexity, Complexity::Complex);

        for v in values.values_mut() {
            v.clear();
        }
        engine.reset(&catalog, &mut values);
        assert_eq!(engine.classification(), &ClassificationState::default());
        assert!(!engine.is_visible(&id("riskregister")));
    }

    #[test]
    fn test_any_overlap_policy_reaches_engine() {
        let catalog = Catalog::from_descriptors(vec![
            FieldDescriptor::new("A", "Channels", FieldKind::CheckboxGroup)
                .universal()
                .with_options(&["Email", "Phone"]),
            FieldDescriptor::new("A", "Phone Hours", FieldKind::Text)
                .universal()
                .depends_on("channels", &["Phone"]),
        ]);
        let mut values = values(&catalog);
        let mut engine = VisibilityEngine::new(
            &catalog,
            ClassificationInputs::default(),
            Resolver::new(DependencyMatch::AnyOverlap),
        );
        engine.initialize(&catalog, &mut values);

        set(&mut values, "channels", "Email|Phone");
        engine.on_commit(&catalog, &id("channels"), &mut values);
        assert!(engine.is_visible(&id("phonehours")));
    }
}
