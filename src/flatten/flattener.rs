//! Data-driven record flattening.
//!
//! The flattener walks actual data records and emits one row per object
//! instance into the correct sheet. It honors the sub-sheet naming plan a
//! [`SheetPlanner`](crate::schema::SheetPlanner) produced, but can also run
//! schema-less and discover sheets and columns from the data alone.

use crate::error::{FlattenError, Result};
use crate::flatten::types::{DelimiterPolicy, FlattenConfig, Row, Sheet, SheetRef, Workbook};
use crate::input::path_search;
use crate::schema::SheetPlan;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Join-key values accumulated while descending into nested arrays of
/// objects. Extended by copy on the way down, so sibling branches never
/// observe each other's additions.
type ParentIds = IndexMap<String, Value>;

/// The closed set of runtime value shapes the flattener distinguishes.
enum ValueKind<'a> {
    Scalar,
    Object(&'a Map<String, Value>),
    ScalarArray(&'a [Value]),
    ObjectArray(Vec<&'a Map<String, Value>>),
}

fn classify<'a>(value: &'a Value, path: &str) -> Result<ValueKind<'a>> {
    match value {
        Value::String(_) | Value::Bool(_) | Value::Number(_) => Ok(ValueKind::Scalar),
        Value::Object(map) => Ok(ValueKind::Object(map)),
        Value::Array(items) => {
            if items.iter().all(is_scalar) {
                return Ok(ValueKind::ScalarArray(items));
            }
            match items.iter().map(Value::as_object).collect::<Option<Vec<_>>>() {
                Some(maps) => Ok(ValueKind::ObjectArray(maps)),
                None => Err(FlattenError::UnsupportedType {
                    path: path.to_string(),
                    found: "an array mixing records and other values".into(),
                }),
            }
        }
        Value::Null => Err(FlattenError::UnsupportedType {
            path: path.to_string(),
            found: "null".into(),
        }),
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Bool(_) | Value::Number(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Flattens top-level records into a [`Workbook`].
pub struct Flattener {
    config: FlattenConfig,
    /// Property key to sub-sheet display name, with the main-sheet prefix
    /// already stripped from the planner's mapping keys.
    sub_sheet_names: IndexMap<String, String>,
    seed: Option<PlanSeed>,
}

/// Planned column lists used to pre-seed output sheets so planned columns
/// keep their schema order even when the data fills them sparsely.
struct PlanSeed {
    main_columns: Vec<String>,
    sub_sheets: IndexMap<String, Vec<String>>,
}

impl Flattener {
    /// Schema-less flattener: sub-sheets are named by their property key
    /// and every column is discovered from the data.
    pub fn new(config: FlattenConfig) -> Self {
        Flattener {
            config,
            sub_sheet_names: IndexMap::new(),
            seed: None,
        }
    }

    /// Flattener driven by a planner's decomposition.
    pub fn with_plan(config: FlattenConfig, plan: &SheetPlan) -> Self {
        let sub_sheet_names = plan
            .sub_sheet_names
            .iter()
            .map(|(key, name)| {
                let stripped = key.split('/').skip(1).collect::<Vec<_>>().join("/");
                (stripped, name.clone())
            })
            .collect();
        let seed = PlanSeed {
            main_columns: plan.main_columns.iter().cloned().collect(),
            sub_sheets: plan
                .sub_sheets
                .iter()
                .map(|(name, columns)| (name.clone(), columns.columns()))
                .collect(),
        };
        Flattener {
            config,
            sub_sheet_names,
            seed: Some(seed),
        }
    }

    /// Locate the sequence of top-level records and flatten each one into
    /// the main sheet.
    pub fn flatten_root(&self, root: &Value) -> Result<Workbook> {
        let records = match &self.config.root_list_path {
            None => root.as_array().ok_or_else(|| {
                FlattenError::Configuration(
                    "top-level document is not an array; set root_list_path".into(),
                )
            })?,
            Some(path) => path_search(root, path)?.as_array().ok_or_else(|| {
                FlattenError::Configuration(format!("'{path}' does not lead to an array"))
            })?,
        };

        let mut book = Workbook::default();
        if let Some(seed) = &self.seed {
            for column in &seed.main_columns {
                book.main_sheet.add_column(column);
            }
            for (name, columns) in &seed.sub_sheets {
                let sheet = book.sub_sheets.entry(name.clone()).or_default();
                for column in columns {
                    sheet.add_column(column);
                }
            }
        }

        for record in records {
            let map = record.as_object().ok_or_else(|| FlattenError::UnsupportedType {
                path: self.config.main_sheet_name.clone(),
                found: "a top-level record that is not an object".into(),
            })?;
            self.flatten_record(&mut book, &SheetRef::Main, map, "", &ParentIds::new())?;
        }

        debug!(
            rows = book.main_sheet.rows.len(),
            sub_sheets = book.sub_sheets.len(),
            "flattened document"
        );
        Ok(book)
    }

    /// Flatten one record as a fresh row in `target`. Inherited join keys
    /// are written first so link columns lead the sheet's column order;
    /// the completed row is appended once the whole record is visited.
    fn flatten_record(
        &self,
        book: &mut Workbook,
        target: &SheetRef,
        record: &Map<String, Value>,
        path: &str,
        parent_ids: &ParentIds,
    ) -> Result<()> {
        let mut row = Row::new();
        let sheet = book.sheet_mut(target);
        for (key, value) in parent_ids {
            let column = match target {
                SheetRef::Sub(name) if key != "ocid" => format!("{key}:{name}"),
                _ => key.clone(),
            };
            sheet.add_column(&column);
            row.insert(column, value.clone());
        }

        self.flatten_into(book, target, record, "", path, &mut row, parent_ids)?;
        book.sheet_mut(target).rows.push(row);
        Ok(())
    }

    /// Visit one object's key/value pairs. `parent_name` prefixes column
    /// names within the current row; `path` is the full path from the
    /// record root, with `[]` marking array segments, and names the join
    /// keys derived from `ocid`/`id`.
    fn flatten_into(
        &self,
        book: &mut Workbook,
        target: &SheetRef,
        map: &Map<String, Value>,
        parent_name: &str,
        path: &str,
        row: &mut Row,
        inherited: &ParentIds,
    ) -> Result<()> {
        let ids = self.extend_ids(inherited, map, path);

        for (key, value) in map {
            let column = format!("{parent_name}{key}");
            match classify(value, &column)? {
                ValueKind::Scalar => {
                    book.sheet_mut(target).add_column(&column);
                    row.insert(column, value.clone());
                }
                ValueKind::Object(inner) => {
                    self.flatten_into(
                        book,
                        target,
                        inner,
                        &format!("{column}/"),
                        &format!("{path}{key}/"),
                        row,
                        &ids,
                    )?;
                }
                ValueKind::ScalarArray(items) => {
                    let joined = self.join_scalars(items, &column)?;
                    book.sheet_mut(target).add_column(&column);
                    row.insert(column, Value::String(joined));
                }
                ValueKind::ObjectArray(items) => {
                    let sheet_name = self
                        .sub_sheet_names
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| key.clone());
                    if !book.sub_sheets.contains_key(&sheet_name) {
                        trace!(sheet = %sheet_name, "discovered sub-sheet");
                        book.sub_sheets.insert(sheet_name.clone(), Sheet::new());
                    }
                    let child_target = SheetRef::Sub(sheet_name);
                    let child_path = format!("{path}{key}[]/");
                    for item in items {
                        self.flatten_record(book, &child_target, item, &child_path, &ids)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn extend_ids(&self, inherited: &ParentIds, map: &Map<String, Value>, path: &str) -> ParentIds {
        let mut ids = inherited.clone();
        if let Some(ocid) = map.get("ocid") {
            ids.insert("ocid".to_string(), ocid.clone());
        }
        if let Some(id) = map.get("id") {
            ids.insert(
                format!("{}/{path}id", self.config.main_sheet_name),
                id.clone(),
            );
        }
        ids
    }

    fn join_scalars(&self, items: &[Value], path: &str) -> Result<String> {
        let delimiter = self.config.array_delimiter;
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let text = scalar_text(item);
            if self.config.delimiter_policy == DelimiterPolicy::Reject && text.contains(delimiter) {
                return Err(FlattenError::DelimiterCollision {
                    path: path.to_string(),
                    delimiter,
                });
            }
            parts.push(text);
        }
        Ok(parts.join(&delimiter.to_string()))
    }
}
