use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value;

/// One flattened row: column name to scalar (or delimiter-joined) value.
/// Rows are sparse; a row simply omits columns that only apply to other
/// rows in the same sheet.
pub type Row = IndexMap<String, Value>;

/// An ordered column list plus the rows appended so far. The column list
/// grows monotonically as new keys are first encountered; rows are fixed
/// once appended.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sheet {
    pub columns: IndexSet<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet::default()
    }

    /// Append a column name if this sheet has not seen it yet.
    pub fn add_column(&mut self, name: &str) {
        if !self.columns.contains(name) {
            self.columns.insert(name.to_string());
        }
    }
}

/// The flattener's output: the main sheet and every sub-sheet, addressed
/// by name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Workbook {
    pub main_sheet: Sheet,
    pub sub_sheets: IndexMap<String, Sheet>,
}

impl Workbook {
    pub(crate) fn sheet_mut(&mut self, target: &SheetRef) -> &mut Sheet {
        match target {
            SheetRef::Main => &mut self.main_sheet,
            SheetRef::Sub(name) => self.sub_sheets.entry(name.clone()).or_default(),
        }
    }
}

/// Which sheet a row is being flattened into.
#[derive(Debug, Clone)]
pub(crate) enum SheetRef {
    Main,
    Sub(String),
}

/// What to do when a scalar array element contains the join delimiter.
/// Joined cells cannot be split back apart in that case, so callers that
/// need lossless round-trips should use `Reject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterPolicy {
    /// Join anyway; the resulting cell is ambiguous on reconstruction.
    Join,
    /// Fail the whole conversion with a `DelimiterCollision` error.
    Reject,
}

/// Configuration shared by the planner and the flattener.
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Display name for the main sheet, and the namespace prefix used in
    /// parent-link column names.
    pub main_sheet_name: String,

    /// Slash-delimited path locating the record list inside the document;
    /// when unset, the document itself must be the list.
    pub root_list_path: Option<String>,

    /// Separator used when joining an array of scalars into one cell.
    pub array_delimiter: char,

    pub delimiter_policy: DelimiterPolicy,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            main_sheet_name: String::from("main"),
            root_list_path: None,
            array_delimiter: ';',
            delimiter_policy: DelimiterPolicy::Join,
        }
    }
}
