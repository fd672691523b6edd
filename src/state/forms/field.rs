//! Form field value objects

use crate::catalog::{FieldDescriptor, FieldId, FieldKind};
use serde_json::Value;

/// Type-safe field values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text (text, textarea, date)
    Text(String),
    /// Single pick from the options (select, radio group)
    Single(Option<String>),
    /// Checked options of a checkbox group, kept in option order
    Multi(Vec<String>),
}

impl FieldValue {
    fn empty_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text | FieldKind::Textarea | FieldKind::Date => {
                FieldValue::Text(String::new())
            }
            FieldKind::Select | FieldKind::RadioGroup => FieldValue::Single(None),
            FieldKind::CheckboxGroup => FieldValue::Multi(Vec::new()),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

/// Represents a single form field with its configuration and value
#[derive(Debug, Clone)]
pub struct FormField {
    pub id: FieldId,
    pub label: String,
    pub kind: FieldKind,
    pub options: Vec<String>,
    pub placeholder: String,
    pub required: bool,
    pub value: FieldValue,
    /// Highlighted option in a checkbox group
    pub option_cursor: usize,
}

impl FormField {
    /// Create an empty field for a catalog entry
    pub fn from_descriptor(descriptor: &FieldDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            label: descriptor.label.clone(),
            kind: descriptor.kind,
            options: descriptor.options.clone(),
            placeholder: descriptor.placeholder.clone(),
            required: descriptor.required,
            value: FieldValue::empty_for(descriptor.kind),
            option_cursor: 0,
        }
    }

    pub fn is_multiline(&self) -> bool {
        self.kind.is_multiline()
    }

    /// Get the text value (returns empty string for choice fields)
    pub fn as_text(&self) -> &str {
        match &self.value {
            FieldValue::Text(s) => s,
            _ => "",
        }
    }

    /// Set the text value (ignored for choice fields)
    pub fn set_text(&mut self, value: impl Into<String>) {
        if let FieldValue::Text(s) = &mut self.value {
            *s = value.into();
        }
    }

    /// Push a character to the field value
    pub fn push_char(&mut self, c: char) {
        if let FieldValue::Text(s) = &mut self.value {
            s.push(c);
        }
    }

    /// Remove the last character from the field value
    pub fn pop_char(&mut self) {
        if let FieldValue::Text(s) = &mut self.value {
            s.pop();
        }
    }

    /// Pick an option by label. Returns false if the label is not an option.
    pub fn select(&mut self, option: &str) -> bool {
        if !self.options.iter().any(|o| o == option) {
            return false;
        }
        match &mut self.value {
            FieldValue::Single(selected) => *selected = Some(option.to_string()),
            FieldValue::Multi(checked) => {
                if !checked.iter().any(|c| c == option) {
                    checked.push(option.to_string());
                    self.sort_checked();
                }
            }
            FieldValue::Text(_) => return false,
        }
        true
    }

    /// Move the selection forward. Selects cycle through "no selection";
    /// radio groups only cycle through their options.
    pub fn select_next(&mut self) {
        let count = self.options.len();
        if count == 0 {
            return;
        }
        let current = self.selected_index();
        let next = match (self.kind, current) {
            (FieldKind::Select, Some(i)) if i + 1 == count => None,
            (_, Some(i)) => Some((i + 1) % count),
            (_, None) => Some(0),
        };
        self.set_selected_index(next);
    }

    /// Move the selection backward
    pub fn select_prev(&mut self) {
        let count = self.options.len();
        if count == 0 {
            return;
        }
        let current = self.selected_index();
        let prev = match (self.kind, current) {
            (FieldKind::Select, Some(0)) => None,
            (_, Some(0)) => Some(count - 1),
            (_, Some(i)) => Some(i - 1),
            (_, None) => Some(count - 1),
        };
        self.set_selected_index(prev);
    }

    fn selected_index(&self) -> Option<usize> {
        match &self.value {
            FieldValue::Single(Some(selected)) => self.options.iter().position(|o| o == selected),
            _ => None,
        }
    }

    fn set_selected_index(&mut self, index: Option<usize>) {
        if let FieldValue::Single(selected) = &mut self.value {
            *selected = index.and_then(|i| self.options.get(i).cloned());
        }
    }

    /// Move the checkbox cursor down (wraps)
    pub fn cursor_next(&mut self) {
        if !self.options.is_empty() {
            self.option_cursor = (self.option_cursor + 1) % self.options.len();
        }
    }

    /// Move the checkbox cursor up (wraps)
    pub fn cursor_prev(&mut self) {
        let count = self.options.len();
        if count == 0 {
            return;
        }
        if self.option_cursor == 0 {
            self.option_cursor = count - 1;
        } else {
            self.option_cursor -= 1;
        }
    }

    /// Toggle the option under the cursor in a checkbox group
    pub fn toggle_at_cursor(&mut self) {
        let Some(option) = self.options.get(self.option_cursor).cloned() else {
            return;
        };
        if let FieldValue::Multi(checked) = &mut self.value {
            if let Some(pos) = checked.iter().position(|c| c == &option) {
                checked.remove(pos);
            } else {
                checked.push(option);
                self.sort_checked();
            }
        }
    }

    pub fn is_checked(&self, option: &str) -> bool {
        match &self.value {
            FieldValue::Multi(checked) => checked.iter().any(|c| c == option),
            FieldValue::Single(selected) => selected.as_deref() == Some(option),
            FieldValue::Text(_) => false,
        }
    }

    fn sort_checked(&mut self) {
        let options = &self.options;
        if let FieldValue::Multi(checked) = &mut self.value {
            checked.sort_by_key(|c| options.iter().position(|o| o == c));
        }
    }

    /// Clear the field value. Returns true if there was anything to clear.
    pub fn clear(&mut self) -> bool {
        let had_value = !self.is_empty();
        self.value = FieldValue::empty_for(self.kind);
        self.option_cursor = 0;
        had_value
    }

    pub fn is_empty(&self) -> bool {
        match &self.value {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Single(selected) => selected.is_none(),
            FieldValue::Multi(checked) => checked.is_empty(),
        }
    }

    /// Value as seen by dependency rules: checked options joined with `|`
    pub fn value_string(&self) -> String {
        match &self.value {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Single(selected) => selected.clone().unwrap_or_default(),
            FieldValue::Multi(checked) => checked.join("|"),
        }
    }

    /// Entries this field contributes to a submission, one per control value.
    ///
    /// Text-like fields and selects always contribute (possibly empty); radio
    /// groups only when something is picked; checkbox groups once per checked
    /// option.
    pub fn entries(&self) -> Vec<String> {
        match (&self.value, self.kind) {
            (FieldValue::Text(s), _) => vec![s.clone()],
            (FieldValue::Single(selected), FieldKind::Select) => {
                vec![selected.clone().unwrap_or_default()]
            }
            (FieldValue::Single(selected), _) => selected.iter().cloned().collect(),
            (FieldValue::Multi(checked), _) => checked.clone(),
        }
    }

    /// Apply a saved value: a string, or an array of strings for checkbox groups.
    /// Options that no longer exist are ignored.
    pub fn restore(&mut self, saved: &Value) {
        self.clear();
        match (&self.value, saved) {
            (FieldValue::Text(_), Value::String(s)) => self.set_text(s.as_str()),
            (FieldValue::Single(_), Value::String(s)) if !s.is_empty() => {
                self.select(s);
            }
            (FieldValue::Multi(_), Value::String(s)) => {
                self.select(s);
            }
            (FieldValue::Multi(_), Value::Array(items)) => {
                for item in items.iter().filter_map(Value::as_str) {
                    self.select(item);
                }
            }
            _ => {}
        }
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Single(Some(selected)) => selected.clone(),
            FieldValue::Single(None) => String::new(),
            FieldValue::Multi(checked) => checked.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(kind: FieldKind, options: &[&str]) -> FormField {
        FormField::from_descriptor(
            &FieldDescriptor::new("S", "Field", kind).with_options(options),
        )
    }

    #[test]
    fn test_text_editing() {
        let mut f = field(FieldKind::Text, &[]);
        f.push_char('h');
        f.push_char('i');
        assert_eq!(f.as_text(), "hi");
        f.pop_char();
        assert_eq!(f.as_text(), "h");
        assert_eq!(f.value_string(), "h");
    }

    #[test]
    fn test_push_char_ignored_for_choice_fields() {
        let mut f = field(FieldKind::Select, &["A"]);
        f.push_char('x');
        assert!(f.is_empty());
        assert_eq!(f.as_text(), "");
    }

    #[test]
    fn test_select_cycles_through_no_selection() {
        let mut f = field(FieldKind::Select, &["A", "B"]);
        f.select_next();
        assert_eq!(f.value_string(), "A");
        f.select_next();
        assert_eq!(f.value_string(), "B");
        f.select_next();
        assert!(f.is_empty());
        f.select_prev();
        assert_eq!(f.value_string(), "B");
    }

    #[test]
    fn test_radio_cycles_only_options() {
        let mut f = field(FieldKind::RadioGroup, &["Yes", "No"]);
        f.select_prev();
        assert_eq!(f.value_string(), "No");
        f.select_next();
        assert_eq!(f.value_string(), "Yes");
        f.select_prev();
        assert_eq!(f.value_string(), "No");
    }

    #[test]
    fn test_checkbox_toggle_keeps_option_order() {
        let mut f = field(FieldKind::CheckboxGroup, &["Email", "Phone", "Chat"]);
        f.option_cursor = 2;
        f.toggle_at_cursor();
        f.cursor_prev();
        f.cursor_prev();
        f.toggle_at_cursor();
        assert_eq!(f.value_string(), "Email|Chat");
        assert!(f.is_checked("Chat"));

        f.cursor_prev();
        assert_eq!(f.option_cursor, 2);
        f.toggle_at_cursor();
        assert_eq!(f.value_string(), "Email");
    }

    #[test]
    fn test_clear_reports_previous_value() {
        let mut f = field(FieldKind::CheckboxGroup, &["Email"]);
        assert!(!f.clear());
        f.toggle_at_cursor();
        assert!(f.clear());
        assert!(f.is_empty());
        assert_eq!(f.value_string(), "");
    }

    #[test]
    fn test_whitespace_only_text_is_empty() {
        let mut f = field(FieldKind::Textarea, &[]);
        f.set_text("  \n ");
        assert!(f.is_empty());
    }

    #[test]
    fn test_entries_per_kind() {
        let mut text = field(FieldKind::Text, &[]);
        assert_eq!(text.entries(), vec![String::new()]);
        text.set_text("Acme");
        assert_eq!(text.entries(), vec!["Acme".to_string()]);

        let select = field(FieldKind::Select, &["A"]);
        assert_eq!(select.entries(), vec![String::new()]);

        let mut radio = field(FieldKind::RadioGroup, &["Yes", "No"]);
        assert!(radio.entries().is_empty());
        radio.select("No");
        assert_eq!(radio.entries(), vec!["No".to_string()]);

        let mut checks = field(FieldKind::CheckboxGroup, &["A", "B"]);
        checks.select("B");
        checks.select("A");
        assert_eq!(checks.entries(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_select_rejects_unknown_option() {
        let mut f = field(FieldKind::RadioGroup, &["Yes", "No"]);
        assert!(!f.select("Maybe"));
        assert!(f.is_empty());
    }

    #[test]
    fn test_restore_values() {
        let mut text = field(FieldKind::Text, &[]);
        text.restore(&json!("Acme"));
        assert_eq!(text.as_text(), "Acme");

        let mut select = field(FieldKind::Select, &["A", "B"]);
        select.restore(&json!("B"));
        assert_eq!(select.value_string(), "B");
        select.restore(&json!("Gone"));
        assert!(select.is_empty());

        let mut checks = field(FieldKind::CheckboxGroup, &["A", "B", "C"]);
        checks.restore(&json!(["C", "A", "Z"]));
        assert_eq!(checks.value_string(), "A|C");
        checks.restore(&json!("B"));
        assert_eq!(checks.value_string(), "B");
    }

    #[test]
    fn test_display_value() {
        let mut checks = field(FieldKind::CheckboxGroup, &["A", "B"]);
        checks.select("A");
        checks.select("B");
        assert_eq!(checks.display_value(), "A, B");
    }
}
