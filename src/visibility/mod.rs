//! Conditional field visibility
//!
//! - `classification`: complexity and project-type labels from form values
//! - `resolver`: pure per-field show/hide decision
//! - `propagation`: re-resolution on committed changes, clearing hidden values
//! - `debounce`: coalescing of free-text edits before they commit

mod classification;
mod debounce;
mod propagation;
mod resolver;

pub use classification::{
    expected_counts, ClassificationInputs, ClassificationState, Complexity, ProjectType,
};
pub use debounce::Debouncer;
pub use propagation::{VisibilityChange, VisibilityEngine};
pub use resolver::{DependencyMatch, FieldValues, FieldValuesMut, Resolver};
