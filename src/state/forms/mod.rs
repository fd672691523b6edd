//! Form domain layer
//!
//! Field values and the live form: focus, collapse state and visibility
//! propagation over the loaded catalog.

mod field;
mod form_state;

pub use field::FormField;
pub use form_state::{FocusTarget, Form, FormState};
