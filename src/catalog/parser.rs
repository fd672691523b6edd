//! Delimited-text parser for the field catalog
//!
//! The header row names the columns. Rows are split on commas, but the split
//! is capped at `header_count - 1` so commas inside the trailing option labels
//! stay part of the last column.

use super::descriptor::{
    ComplexityFlags, Dependency, FieldDescriptor, FieldId, FieldKind, TypeFlags,
};
use super::CatalogError;
use std::collections::HashMap;

const DELIMITER: char = ',';

/// Maximum number of option columns (`item_label_1` .. `item_label_6`)
pub const MAX_OPTIONS: usize = 6;

/// Header row with a name -> column index lookup
#[derive(Debug)]
struct Header {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    fn parse(line: &str) -> Self {
        let columns: Vec<String> = line
            .split(DELIMITER)
            .map(|h| h.trim().to_string())
            .collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { columns, index }
    }

    fn require(&self, name: &'static str) -> Result<(), CatalogError> {
        if self.index.contains_key(name) {
            Ok(())
        } else {
            Err(CatalogError::MissingColumn(name))
        }
    }
}

/// One data row, padded to the header width
#[derive(Debug)]
struct Record<'a> {
    header: &'a Header,
    cells: Vec<String>,
}

impl Record<'_> {
    /// Cell for a named column, empty when the column is absent
    fn get(&self, column: &str) -> &str {
        self.header
            .index
            .get(column)
            .and_then(|&i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn flag(&self, column: &str) -> bool {
        self.get(column).eq_ignore_ascii_case("TRUE")
    }
}

/// Split a line on the delimiter, keeping overflow in the final cell
fn split_capped(line: &str, columns: usize) -> Vec<String> {
    let mut cells: Vec<String> = line
        .splitn(columns.max(1), DELIMITER)
        .map(|c| c.trim().to_string())
        .collect();
    cells.resize(columns, String::new());
    cells
}

/// Parse catalog text into descriptors. Unusable rows are dropped.
pub fn parse_catalog(text: &str) -> Result<Vec<FieldDescriptor>, CatalogError> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = normalized.trim().lines();

    let header = match lines.next() {
        Some(line) if !line.trim().is_empty() => Header::parse(line),
        _ => return Err(CatalogError::Empty),
    };
    header.require("form_label")?;
    header.require("form_class")?;

    let mut descriptors = Vec::new();
    for (row, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = Record {
            header: &header,
            cells: split_capped(line, header.columns.len()),
        };

        match descriptor_from_record(&record) {
            Some(descriptor) => descriptors.push(descriptor),
            None => tracing::warn!(
                row = row + 2,
                label = record.get("form_label"),
                kind = record.get("form_class"),
                "Dropping unusable catalog row"
            ),
        }
    }

    Ok(descriptors)
}

fn descriptor_from_record(record: &Record) -> Option<FieldDescriptor> {
    let label = record.get("form_label");
    let id = FieldId::normalize(label);
    if id.is_empty() {
        return None;
    }
    let kind = FieldKind::parse(record.get("form_class"))?;

    let depends_on = match record.get("depends_on_field") {
        "" => None,
        field => Some(Dependency {
            field: FieldId::normalize(field),
            values: record
                .get("depends_on_values")
                .split('|')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        }),
    };

    let options = if kind.is_choice() {
        (1..=MAX_OPTIONS)
            .map(|i| record.get(&format!("item_label_{i}")))
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    Some(FieldDescriptor {
        id,
        section: record.get("section_title").to_string(),
        label: label.to_string(),
        instructions: record.get("form_instructions").to_string(),
        placeholder: record.get("placeholder").to_string(),
        kind,
        required: record.flag("required"),
        is_universal: record.flag("is_universal"),
        show_by_default: !record.get("show_by_default").eq_ignore_ascii_case("FALSE"),
        depends_on,
        complexity: ComplexityFlags {
            simple: record.flag("complexity_simple"),
            standard: record.flag("complexity_standard"),
            complex: record.flag("complexity_complex"),
        },
        types: TypeFlags {
            strategic: record.flag("type_strategic"),
            technical: record.flag("type_technical"),
            operational: record.flag("type_operational"),
        },
        options,
    })
}
