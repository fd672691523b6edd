//! Form rendering module
//!
//! - `field_renderer`: one bordered widget per field kind
//! - `intake_form`: sections, headers and scrolling

mod field_renderer;
mod intake_form;

pub use intake_form::draw_intake_form;
