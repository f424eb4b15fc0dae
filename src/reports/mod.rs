//! Output renderers for collection results
//!
//! - **JSON**: the full list of [`CollectionRecord`](crate::facts::CollectionRecord)s as a
//!   pretty-printed array, one object per repository.
//! - **CSV**: a flattened projection with a fixed column order, a derived top language, and
//!   topics joined into a single cell.
//!
//! Both generators write into any [`core::fmt::Write`] so callers decide whether the
//! output lands in a file, a buffer, or standard output.

mod csv;
mod json;

pub use csv::{CSV_COLUMNS, generate as generate_csv};
pub use json::generate as generate_json;
