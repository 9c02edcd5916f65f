//! Schema-driven sheet planning.
//!
//! This module computes, from a JSON Schema alone, how a nested record
//! shape decomposes into a main sheet plus named sub-sheets, including
//! column order and parent-link columns. No data is consulted; the
//! resulting [`SheetPlan`] is handed to the record flattener.

pub mod planner;
pub mod resolver;

pub use planner::{get_type_set, SheetPlan, SheetPlanner, SubSheetColumns};
pub use resolver::{resolve_references, Resolver};
