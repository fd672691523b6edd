//! Live form model

use super::field::FormField;
use crate::catalog::{Catalog, FieldDescriptor, FieldId, SectionId};
use crate::submission::Payload;
use crate::visibility::{
    ClassificationInputs, ClassificationState, FieldValues, FieldValuesMut, Resolver,
    VisibilityChange, VisibilityEngine,
};
use std::collections::{BTreeSet, HashMap};

/// Trait for common form operations
pub trait Form {
    fn field_count(&self) -> usize;
    fn active_field(&self) -> usize;
    fn set_active_field(&mut self, index: usize);
    fn next_field(&mut self) {
        let count = self.field_count();
        if count == 0 {
            return;
        }
        let current = self.active_field();
        self.set_active_field((current + 1) % count);
    }
    fn prev_field(&mut self) {
        let count = self.field_count();
        if count == 0 {
            return;
        }
        let current = self.active_field();
        if current == 0 {
            self.set_active_field(count - 1);
        } else {
            self.set_active_field(current - 1);
        }
    }
}

/// Values of every field in the form, in catalog order
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    fields: Vec<FormField>,
    index: HashMap<FieldId, usize>,
}

impl FormValues {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let fields: Vec<FormField> = catalog
            .fields()
            .iter()
            .map(FormField::from_descriptor)
            .collect();
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
        Self { fields, index }
    }

    pub fn get(&self, id: &FieldId) -> Option<&FormField> {
        self.index.get(id).map(|&i| &self.fields[i])
    }

    pub fn get_mut(&mut self, id: &FieldId) -> Option<&mut FormField> {
        self.index.get(id).map(|&i| &mut self.fields[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter()
    }

    /// Every field's entries, hidden ones included (they are empty)
    pub fn snapshot(&self) -> Payload {
        Payload::from_entries(
            self.fields
                .iter()
                .flat_map(|f| f.entries().into_iter().map(|v| (f.id.to_string(), v))),
        )
    }

    /// Apply saved answers. Unknown keys are skipped. Returns how many fields were set.
    pub fn restore(&mut self, saved: &Payload) -> usize {
        let mut restored = 0;
        for (key, value) in saved.iter() {
            if let Some(field) = self.get_mut(&FieldId::new(key.as_str())) {
                field.restore(value);
                if !field.is_empty() {
                    restored += 1;
                }
            }
        }
        restored
    }

    pub fn clear_all(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
    }
}

impl FieldValues for FormValues {
    fn value_of(&self, id: &FieldId) -> Option<String> {
        self.get(id).map(FormField::value_string)
    }
}

impl FieldValuesMut for FormValues {
    fn clear_field(&mut self, id: &FieldId) -> bool {
        self.get_mut(id).is_some_and(FormField::clear)
    }
}

/// Something the cursor can rest on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    SectionHeader(SectionId),
    Field(FieldId),
}

/// The intake form: catalog, live values, visibility and collapse state
#[derive(Debug, Clone)]
pub struct FormState {
    catalog: Catalog,
    values: FormValues,
    engine: VisibilityEngine,
    collapsed: BTreeSet<SectionId>,
    active_index: usize,
}

impl FormState {
    /// Build an empty form and run the first visibility pass
    pub fn new(catalog: Catalog, inputs: ClassificationInputs, resolver: Resolver) -> Self {
        Self::with_answers(catalog, inputs, resolver, None)
    }

    /// Build a form, applying saved answers before the first visibility pass
    pub fn with_answers(
        catalog: Catalog,
        inputs: ClassificationInputs,
        resolver: Resolver,
        saved: Option<&Payload>,
    ) -> Self {
        let mut values = FormValues::from_catalog(&catalog);
        if let Some(saved) = saved {
            let restored = values.restore(saved);
            tracing::info!(restored, "Restored saved answers");
        }
        let mut engine = VisibilityEngine::new(&catalog, inputs, resolver);
        engine.initialize(&catalog, &mut values);
        Self {
            catalog,
            values,
            engine,
            collapsed: BTreeSet::new(),
            active_index: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[cfg(test)]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn classification(&self) -> &ClassificationState {
        self.engine.classification()
    }

    pub fn is_visible(&self, id: &FieldId) -> bool {
        self.engine.is_visible(id)
    }

    pub fn visible_count(&self) -> usize {
        self.engine.visible_count()
    }

    pub fn field(&self, id: &FieldId) -> Option<&FormField> {
        self.values.get(id)
    }

    pub fn descriptor(&self, id: &FieldId) -> Option<&FieldDescriptor> {
        self.catalog.field(id)
    }

    /// Visible fields in catalog order
    pub fn visible_fields(&self) -> impl Iterator<Item = &FormField> {
        self.values.iter().filter(|f| self.engine.is_visible(&f.id))
    }

    /// Section headers of visible sections, followed by the visible fields of
    /// each expanded section
    pub fn focus_targets(&self) -> Vec<FocusTarget> {
        let mut targets = Vec::new();
        for section in self.catalog.sections() {
            if !self.engine.is_section_visible(&section.id) {
                continue;
            }
            targets.push(FocusTarget::SectionHeader(section.id.clone()));
            if self.collapsed.contains(&section.id) {
                continue;
            }
            targets.extend(
                section
                    .fields
                    .iter()
                    .filter(|id| self.engine.is_visible(id))
                    .map(|id| FocusTarget::Field(id.clone())),
            );
        }
        targets
    }

    pub fn focused(&self) -> Option<FocusTarget> {
        self.focus_targets().get(self.active_index).cloned()
    }

    pub fn focused_field(&self) -> Option<&FormField> {
        match self.focused()? {
            FocusTarget::Field(id) => self.values.get(&id),
            FocusTarget::SectionHeader(_) => None,
        }
    }

    /// Mutable access to the focused field. Callers must `commit` the field
    /// afterwards for visibility to follow the edit.
    pub fn focused_field_mut(&mut self) -> Option<&mut FormField> {
        match self.focused()? {
            FocusTarget::Field(id) => self.values.get_mut(&id),
            FocusTarget::SectionHeader(_) => None,
        }
    }

    /// Move focus onto a target if it is currently focusable
    pub fn focus(&mut self, target: &FocusTarget) -> bool {
        match self.focus_targets().iter().position(|t| t == target) {
            Some(index) => {
                self.active_index = index;
                true
            }
            None => false,
        }
    }

    /// Propagate a committed value change and keep focus on the same target
    pub fn commit(&mut self, id: &FieldId) -> VisibilityChange {
        let focused = self.focused();
        let change = self.engine.on_commit(&self.catalog, id, &mut self.values);
        self.restore_focus(focused);
        change
    }

    fn restore_focus(&mut self, previous: Option<FocusTarget>) {
        if let Some(target) = previous {
            if self.focus(&target) {
                return;
            }
        }
        let count = self.focus_targets().len();
        self.active_index = self.active_index.min(count.saturating_sub(1));
    }

    pub fn is_collapsed(&self, id: &SectionId) -> bool {
        self.collapsed.contains(id)
    }

    pub fn collapsed_sections(&self) -> Vec<SectionId> {
        self.collapsed.iter().cloned().collect()
    }

    /// Replace the collapsed set. Unknown section ids are ignored.
    pub fn set_collapsed(&mut self, ids: impl IntoIterator<Item = SectionId>) {
        let focused = self.focused();
        self.collapsed = ids
            .into_iter()
            .filter(|id| self.catalog.section(id).is_some())
            .collect();
        self.restore_focus(focused);
    }

    pub fn toggle_section(&mut self, id: &SectionId) {
        let focused = self.focused();
        if !self.collapsed.remove(id) {
            self.collapsed.insert(id.clone());
        }
        self.restore_focus(focused);
    }

    pub fn expand_all(&mut self) {
        self.set_collapsed(Vec::new());
    }

    pub fn collapse_all(&mut self) {
        let all: Vec<SectionId> = self
            .catalog
            .sections()
            .iter()
            .map(|s| s.id.clone())
            .collect();
        // The focused field disappears; land on its section header.
        let header = self.focused_section();
        self.set_collapsed(all);
        if let Some(header) = header {
            self.focus(&FocusTarget::SectionHeader(header));
        }
    }

    fn focused_section(&self) -> Option<SectionId> {
        match self.focused()? {
            FocusTarget::SectionHeader(id) => Some(id),
            FocusTarget::Field(id) => self
                .catalog
                .sections()
                .iter()
                .find(|s| s.fields.contains(&id))
                .map(|s| s.id.clone()),
        }
    }

    /// (filled, total) over visible fields
    pub fn completion(&self) -> (usize, usize) {
        let (filled, total) = self
            .visible_fields()
            .fold((0, 0), |(filled, total), f| {
                (filled + usize::from(!f.is_empty()), total + 1)
            });
        (filled, total)
    }

    /// Completion of visible fields as a rounded percentage
    pub fn progress_percent(&self) -> u8 {
        let (filled, total) = self.completion();
        if total == 0 {
            return 0;
        }
        ((filled as f64 / total as f64) * 100.0).round() as u8
    }

    /// Labels of visible required fields that have no value
    pub fn missing_required(&self) -> Vec<String> {
        self.visible_fields()
            .filter(|f| f.required && f.is_empty())
            .map(|f| f.label.clone())
            .collect()
    }

    /// Visible fields' answers, ready to submit
    pub fn payload(&self) -> Payload {
        Payload::from_entries(
            self.visible_fields()
                .flat_map(|f| f.entries().into_iter().map(|v| (f.id.to_string(), v))),
        )
    }

    /// Every field's answers for autosave
    pub fn snapshot(&self) -> Payload {
        self.values.snapshot()
    }

    /// Replace every value with saved answers and re-resolve the whole form
    pub fn apply_answers(&mut self, saved: &Payload) -> VisibilityChange {
        self.values.clear_all();
        let restored = self.values.restore(saved);
        tracing::info!(restored, "Restored saved answers");
        let focused = self.focused();
        let change = self.engine.reset(&self.catalog, &mut self.values);
        self.restore_focus(focused);
        change
    }

    /// Clear every value and return to the default classification
    pub fn reset(&mut self) -> VisibilityChange {
        self.values.clear_all();
        let change = self.engine.reset(&self.catalog, &mut self.values);
        self.collapsed.clear();
        self.active_index = 0;
        change
    }
}

impl Form for FormState {
    fn field_count(&self) -> usize {
        self.focus_targets().len()
    }
    fn active_field(&self) -> usize {
        self.active_index
    }
    fn set_active_field(&mut self, index: usize) {
        let count = self.field_count();
        self.active_index = index.min(count.saturating_sub(1));
    }
}
