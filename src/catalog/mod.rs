//! Field catalog
//!
//! The ordered list of field descriptors that drives the form, loaded from a
//! delimited-text file. Each field gets a stable [`FieldId`] at load time and
//! belongs to exactly one [`Section`].

mod descriptor;
mod parser;

pub use descriptor::{FieldDescriptor, FieldId, FieldKind};

use parser::parse_catalog;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that make the whole catalog unusable
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("field catalog is empty")]
    Empty,
    #[error("field catalog is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("failed to read field catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Identifier of a rendered section (`section-0`, `section-1`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(String);

impl SectionId {
    pub fn from_index(index: usize) -> Self {
        Self(format!("section-{index}"))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields grouped under one section title, in catalog order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub fields: Vec<FieldId>,
}

/// Loaded field catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    fields: Vec<FieldDescriptor>,
    sections: Vec<Section>,
    index: HashMap<FieldId, usize>,
}

impl Catalog {
    /// Build a catalog from descriptors, making ids unique and grouping sections.
    ///
    /// A later field whose id collides with an earlier one is renamed with a
    /// numeric suffix (`name_2`, `name_3`, ...). Dependencies keep pointing at
    /// the first field that claimed the name.
    pub fn from_descriptors(descriptors: Vec<FieldDescriptor>) -> Self {
        let mut fields = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::new();
        let mut sections: Vec<Section> = Vec::new();

        for mut field in descriptors {
            if index.contains_key(&field.id) {
                let base = field.id.as_str().to_string();
                let mut n = 2;
                while index.contains_key(&FieldId::new(format!("{base}_{n}"))) {
                    n += 1;
                }
                let renamed = FieldId::new(format!("{base}_{n}"));
                tracing::warn!(label = %field.label, id = %renamed, "Duplicate field id renamed");
                field.id = renamed;
            }

            match sections.iter_mut().find(|s| s.title == field.section) {
                Some(section) => section.fields.push(field.id.clone()),
                None => sections.push(Section {
                    id: SectionId::from_index(sections.len()),
                    title: field.section.clone(),
                    fields: vec![field.id.clone()],
                }),
            }

            index.insert(field.id.clone(), fields.len());
            fields.push(field);
        }

        Self {
            fields,
            sections,
            index,
        }
    }

    /// Parse catalog text
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let catalog = Self::from_descriptors(parse_catalog(text)?);
        tracing::info!(
            fields = catalog.len(),
            sections = catalog.sections.len(),
            "Loaded field catalog"
        );
        Ok(catalog)
    }

    /// Read and parse a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, id: &FieldId) -> Option<&FieldDescriptor> {
        self.index.get(id).map(|&i| &self.fields[i])
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Fields whose explicit dependency names `id`
    pub fn dependents_of<'a>(
        &'a self,
        id: &'a FieldId,
    ) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.depends_on.as_ref().is_some_and(|d| &d.field == id))
    }

    pub fn has_dependents(&self, id: &FieldId) -> bool {
        self.dependents_of(id).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
