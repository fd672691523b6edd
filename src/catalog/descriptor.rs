//! Field descriptors loaded from the catalog

use crate::visibility::{Complexity, ProjectType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier assigned to a field when the catalog is loaded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Wrap an already-normalized identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an identifier from display text: lowercase, ASCII alphanumerics only
    pub fn normalize(text: &str) -> Self {
        Self(
            text.chars()
                .map(|c| c.to_ascii_lowercase())
                .filter(char::is_ascii_alphanumeric)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Input control used to render a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Textarea,
    Date,
    Select,
    CheckboxGroup,
    RadioGroup,
}

impl FieldKind {
    /// Parse the `form_class` column
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "text" => Some(Self::Text),
            "textarea" => Some(Self::Textarea),
            "date" => Some(Self::Date),
            "select" => Some(Self::Select),
            "checkbox-group" => Some(Self::CheckboxGroup),
            "radio-group" => Some(Self::RadioGroup),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Date => "date",
            Self::Select => "select",
            Self::CheckboxGroup => "checkbox-group",
            Self::RadioGroup => "radio-group",
        }
    }

    /// Kinds whose value is picked from the option list
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::CheckboxGroup | Self::RadioGroup)
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::Textarea)
    }
}

/// Per-complexity eligibility flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplexityFlags {
    pub simple: bool,
    pub standard: bool,
    pub complex: bool,
}

impl ComplexityFlags {
    pub fn allows(&self, complexity: Complexity) -> bool {
        match complexity {
            Complexity::Simple => self.simple,
            Complexity::Standard => self.standard,
            Complexity::Complex => self.complex,
        }
    }
}

/// Per-project-type eligibility flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeFlags {
    pub strategic: bool,
    pub technical: bool,
    pub operational: bool,
}

impl TypeFlags {
    /// Open project types outside the documented three license nothing
    pub fn allows(&self, project_type: &ProjectType) -> bool {
        match project_type {
            ProjectType::Strategic => self.strategic,
            ProjectType::Technical => self.technical,
            ProjectType::Operational => self.operational,
            ProjectType::Other(_) => false,
        }
    }
}

/// Explicit dependency on another field's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub field: FieldId,
    pub values: Vec<String>,
}

/// One form field as described by the catalog. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub section: String,
    pub label: String,
    pub instructions: String,
    pub placeholder: String,
    pub kind: FieldKind,
    pub required: bool,
    pub is_universal: bool,
    pub show_by_default: bool,
    pub depends_on: Option<Dependency>,
    pub complexity: ComplexityFlags,
    pub types: TypeFlags,
    pub options: Vec<String>,
}

impl FieldDescriptor {
    /// Create a descriptor with every flag off; the id is derived from the label
    #[cfg(test)]
    pub fn new(section: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            id: FieldId::normalize(label),
            section: section.to_string(),
            label: label.to_string(),
            instructions: String::new(),
            placeholder: String::new(),
            kind,
            required: false,
            is_universal: false,
            show_by_default: true,
            depends_on: None,
            complexity: ComplexityFlags::default(),
            types: TypeFlags::default(),
            options: Vec::new(),
        }
    }

    /// Visibility before the first resolver pass
    pub fn initially_visible(&self) -> bool {
        self.show_by_default && (self.is_universal || self.depends_on.is_some())
    }
}

#[cfg(test)]
impl FieldDescriptor {
    pub fn universal(mut self) -> Self {
        self.is_universal = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_complexity(mut self, simple: bool, standard: bool, complex: bool) -> Self {
        self.complexity = ComplexityFlags {
            simple,
            standard,
            complex,
        };
        self
    }

    pub fn with_types(mut self, strategic: bool, technical: bool, operational: bool) -> Self {
        self.types = TypeFlags {
            strategic,
            technical,
            operational,
        };
        self
    }

    /// Eligible at every complexity and type
    pub fn everywhere(self) -> Self {
        self.with_complexity(true, true, true)
            .with_types(true, true, true)
    }

    pub fn depends_on(mut self, field: &str, values: &[&str]) -> Self {
        self.depends_on = Some(Dependency {
            field: FieldId::normalize(field),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }
}
