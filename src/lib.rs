//! # Flatiron - Nested JSON to Spreadsheet Sheets
//!
//! A library for converting hierarchically nested, schema-described records
//! (OCDS-style contracting data) into flat tabular sheets: a main sheet plus
//! named sub-sheets, with parent-link columns so sub-sheet rows can be
//! joined back to their ancestors.
//!
//! ## Modules
//!
//! - **schema**: plan sheets and columns from a JSON Schema, without data
//! - **flatten**: walk data records and populate the planned sheets
//!
//! ## Quick Start
//!
//! ### Planning from a schema
//!
//! ```rust
//! use flatiron::{FlattenConfig, SheetPlanner};
//! use serde_json::json;
//!
//! # fn main() -> flatiron::Result<()> {
//! let schema = json!({
//!     "properties": {
//!         "ocid": {"type": "string"},
//!         "awards": {
//!             "type": "array",
//!             "items": {
//!                 "type": "object",
//!                 "properties": {"id": {"type": "string"}}
//!             }
//!         }
//!     }
//! });
//!
//! let plan = SheetPlanner::new(FlattenConfig::default()).plan(&schema)?;
//! assert_eq!(plan.main_columns.first().unwrap(), "ocid");
//! assert_eq!(plan.sub_sheet_columns("awards").unwrap(), ["ocid", "id"]);
//! # Ok(())
//! # }
//! ```
//!
//! ### Flattening records
//!
//! ```rust
//! use flatiron::{FlattenConfig, Flattener};
//! use serde_json::json;
//!
//! # fn main() -> flatiron::Result<()> {
//! let releases = json!([{
//!     "ocid": "ocds-213czf-000-00001",
//!     "id": "1",
//!     "tender": {"value": {"amount": 1000, "currency": "GBP"}},
//!     "awards": [{"id": "award-1", "status": "active"}]
//! }]);
//!
//! let book = Flattener::new(FlattenConfig::default()).flatten_root(&releases)?;
//!
//! // Nested objects flatten in place; arrays of objects become sub-sheets.
//! assert!(book.main_sheet.columns.contains("tender/value/amount"));
//! assert_eq!(book.sub_sheets["awards"].rows[0]["main/id:awards"], json!("1"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod flatten;
pub mod input;
pub mod schema;

// Re-export commonly used types for convenience
pub use error::{FlattenError, Result};
pub use flatten::{
    DelimiterPolicy, FlattenConfig, Flattener, Row, Sheet, SheetWriter, SingleWriter, Workbook,
};
pub use schema::{get_type_set, resolve_references, SheetPlan, SheetPlanner};

use serde_json::Value;

/// Main entry point: plan sheets from an optional schema, then flatten a
/// data document into a workbook.
pub fn flatten_document(
    schema: Option<&Value>,
    data: &Value,
    config: FlattenConfig,
) -> Result<(Option<SheetPlan>, Workbook)> {
    match schema {
        Some(schema_root) => {
            let plan = SheetPlanner::new(config.clone()).plan(schema_root)?;
            let book = Flattener::with_plan(config, &plan).flatten_root(data)?;
            Ok((Some(plan), book))
        }
        None => {
            let book = Flattener::new(config).flatten_root(data)?;
            Ok((None, book))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_planned_flattening_end_to_end() {
        let schema = json!({
            "properties": {
                "ocid": {"type": "string"},
                "id": {"type": "string"},
                "awards": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "status": {"type": "string"}
                        }
                    }
                }
            }
        });
        let data = json!([{
            "ocid": "ocds-1",
            "id": "1",
            "awards": [
                {"id": "award-1", "status": "active"},
                {"id": "award-2", "status": "pending"}
            ]
        }]);

        let (plan, book) =
            flatten_document(Some(&schema), &data, FlattenConfig::default()).unwrap();

        let plan = plan.unwrap();
        assert_eq!(
            plan.sub_sheet_columns("awards").unwrap(),
            ["ocid", "main/id:awards", "id", "status"]
        );

        let awards = &book.sub_sheets["awards"];
        assert_eq!(awards.rows.len(), 2);
        assert_eq!(awards.rows[0]["ocid"], json!("ocds-1"));
        assert_eq!(awards.rows[0]["main/id:awards"], json!("1"));
        assert_eq!(awards.rows[1]["id"], json!("award-2"));
        // Data rows land in the columns the plan declared.
        let columns: Vec<&str> = awards.columns.iter().map(String::as_str).collect();
        assert_eq!(columns, ["ocid", "main/id:awards", "id", "status"]);
    }
}
