//! Record flattening - turn nested data records into flat, relational sheets.
//!
//! This module walks actual data (the schema planner in [`crate::schema`]
//! works from the schema alone) and produces one row per object instance,
//! with parent-link columns so sub-sheet rows can be joined back to their
//! ancestors.

pub mod flattener;
pub mod types;
pub mod writer;

pub use flattener::Flattener;
pub use types::{DelimiterPolicy, FlattenConfig, Row, Sheet, Workbook};
pub use writer::{SheetWriter, SingleWriter};
