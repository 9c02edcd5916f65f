//! Schema-driven sheet planning.
//!
//! The planner walks a JSON Schema once, without seeing any data, and
//! decides how the nested shape decomposes into a main sheet plus named
//! sub-sheets: which column names appear, in what order, and which
//! parent-link columns each sub-sheet needs to join rows back to their
//! ancestors.

use crate::error::{FlattenError, Result};
use crate::flatten::FlattenConfig;
use crate::schema::resolver::Resolver;
use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, trace};

const KNOWN_TYPES: [&str; 7] = [
    "object", "array", "string", "number", "integer", "boolean", "null",
];

/// Normalize a node's `type` attribute (a single string or a list of
/// strings) into a set for membership tests. A node without a `type`
/// yields an empty set.
pub fn get_type_set(node: &Value) -> Result<HashSet<String>> {
    let mut types = HashSet::new();
    match node.get("type") {
        None => {}
        Some(Value::String(t)) => {
            types.insert(t.clone());
        }
        Some(Value::Array(items)) => {
            for item in items {
                match item {
                    Value::String(t) => {
                        types.insert(t.clone());
                    }
                    other => {
                        return Err(FlattenError::UnsupportedType {
                            path: "type".into(),
                            found: format!("non-string type entry {other}"),
                        })
                    }
                }
            }
        }
        Some(other) => {
            return Err(FlattenError::UnsupportedType {
                path: "type".into(),
                found: format!("type attribute {other}"),
            })
        }
    }
    Ok(types)
}

/// The closed set of schema shapes the planner distinguishes.
enum SchemaKind<'a> {
    Scalar,
    Object(Option<&'a Map<String, Value>>),
    ArrayOfScalar,
    ArrayOfObject {
        properties: Option<&'a Map<String, Value>>,
        name_hint: Option<String>,
    },
}

fn classify<'a>(
    resolver: &Resolver<'a>,
    node: &'a Value,
    path: &str,
) -> Result<SchemaKind<'a>> {
    let types = get_type_set(node)?;
    if types.is_empty() {
        return Err(FlattenError::UnsupportedType {
            path: path.to_string(),
            found: "no declared type".into(),
        });
    }
    if let Some(unknown) = types.iter().find(|t| !KNOWN_TYPES.contains(&t.as_str())) {
        return Err(FlattenError::UnsupportedType {
            path: path.to_string(),
            found: format!("unrecognized schema type '{unknown}'"),
        });
    }

    if types.contains("object") {
        return Ok(SchemaKind::Object(properties_of(node)));
    }
    if types.contains("array") {
        let items = node.get("items").ok_or_else(|| FlattenError::UnsupportedType {
            path: path.to_string(),
            found: "array without an items schema".into(),
        })?;
        let (items, name_hint) = resolver.deref(items)?;
        if get_type_set(items)?.contains("object") {
            return Ok(SchemaKind::ArrayOfObject {
                properties: properties_of(items),
                name_hint,
            });
        }
        return Ok(SchemaKind::ArrayOfScalar);
    }
    Ok(SchemaKind::Scalar)
}

fn properties_of(node: &Value) -> Option<&Map<String, Value>> {
    node.get("properties").and_then(Value::as_object)
}

/// Column lists for one sub-sheet: `ocid` and the parent-link columns first,
/// then the fields discovered from the item properties. Both halves grow in
/// first-discovery order when several schema branches contribute to the same
/// sheet name.
#[derive(Debug, Clone, PartialEq)]
pub struct SubSheetColumns {
    link_columns: IndexSet<String>,
    field_columns: IndexSet<String>,
}

impl SubSheetColumns {
    fn new() -> Self {
        let mut link_columns = IndexSet::new();
        link_columns.insert("ocid".to_string());
        SubSheetColumns {
            link_columns,
            field_columns: IndexSet::new(),
        }
    }

    /// The full ordered column list for this sheet.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.link_columns.iter().cloned().collect();
        for column in &self.field_columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }
}

impl Serialize for SubSheetColumns {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.columns())
    }
}

/// The planner's output: ordered main-sheet columns, per-sub-sheet column
/// lists, and the property-key-to-sheet-name mapping the flattener consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetPlan {
    pub main_sheet_name: String,
    pub main_columns: IndexSet<String>,
    pub sub_sheets: IndexMap<String, SubSheetColumns>,
    /// Keyed `"<main_sheet_name>/<property-key>"`; the flattener strips the
    /// main-sheet prefix before lookup.
    pub sub_sheet_names: IndexMap<String, String>,
}

impl SheetPlan {
    pub fn sub_sheet_columns(&self, name: &str) -> Option<Vec<String>> {
        self.sub_sheets.get(name).map(SubSheetColumns::columns)
    }
}

enum SheetTarget {
    Main,
    Sub(String),
}

/// Computes a [`SheetPlan`] from a schema tree.
pub struct SheetPlanner {
    config: FlattenConfig,
}

impl SheetPlanner {
    pub fn new(config: FlattenConfig) -> Self {
        SheetPlanner { config }
    }

    /// Walk the schema's properties in declaration order and produce the
    /// sheet decomposition.
    pub fn plan(&self, root_schema: &Value) -> Result<SheetPlan> {
        let resolver = Resolver::new(root_schema);
        let (mut node, _) = resolver.deref(root_schema)?;

        if let Some(path) = &self.config.root_list_path {
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                let child = properties_of(node).and_then(|p| p.get(segment)).ok_or_else(|| {
                    FlattenError::Configuration(format!(
                        "root list path segment '{segment}' not found in schema"
                    ))
                })?;
                node = resolver.deref(child)?.0;
            }
        }

        // An array-wrapped root describes the record list itself.
        if get_type_set(node)?.contains("array") {
            let items = node.get("items").ok_or_else(|| {
                FlattenError::Configuration("root array schema has no items".into())
            })?;
            node = resolver.deref(items)?.0;
        }

        let mut plan = SheetPlan {
            main_sheet_name: self.config.main_sheet_name.clone(),
            ..SheetPlan::default()
        };
        if let Some(properties) = properties_of(node) {
            self.plan_properties(&resolver, properties, &mut plan, &SheetTarget::Main, "", "", &[])?;
        }

        debug!(
            main_columns = plan.main_columns.len(),
            sub_sheets = plan.sub_sheets.len(),
            "planned sheets"
        );
        Ok(plan)
    }

    /// `prefix` is the column-name prefix inside the sheet currently being
    /// populated; `path` is the full path from the record root, with `[]`
    /// marking array segments, used to derive parent-link column names.
    fn plan_properties<'a>(
        &self,
        resolver: &Resolver<'a>,
        properties: &'a Map<String, Value>,
        plan: &mut SheetPlan,
        target: &SheetTarget,
        prefix: &str,
        path: &str,
        id_bases: &[String],
    ) -> Result<()> {
        let mut bases = id_bases.to_vec();
        if properties.contains_key("id") {
            bases.push(format!("{}/{path}id", self.config.main_sheet_name));
        }

        for (key, raw) in properties {
            let (node, _) = resolver.deref(raw)?;
            match classify(resolver, node, &format!("{path}{key}"))? {
                SchemaKind::Scalar => {
                    add_column(plan, target, format!("{prefix}{key}"));
                }
                SchemaKind::Object(inner) => {
                    if let Some(inner) = inner {
                        self.plan_properties(
                            resolver,
                            inner,
                            plan,
                            target,
                            &format!("{prefix}{key}/"),
                            &format!("{path}{key}/"),
                            &bases,
                        )?;
                    }
                }
                SchemaKind::ArrayOfScalar => {
                    // Only a top-level array of scalars carries the :array
                    // marker; nested ones read unambiguously from their path.
                    let column = if prefix.is_empty() && matches!(target, SheetTarget::Main) {
                        format!("{key}:array")
                    } else {
                        format!("{prefix}{key}")
                    };
                    add_column(plan, target, column);
                }
                SchemaKind::ArrayOfObject {
                    properties: item_properties,
                    name_hint,
                } => {
                    let sheet_name = name_hint.unwrap_or_else(|| key.clone());
                    trace!(sheet = %sheet_name, property = %key, "planning sub-sheet");
                    plan.sub_sheet_names.insert(
                        format!("{}/{key}", self.config.main_sheet_name),
                        sheet_name.clone(),
                    );

                    let sub = plan
                        .sub_sheets
                        .entry(sheet_name.clone())
                        .or_insert_with(SubSheetColumns::new);
                    for base in &bases {
                        sub.link_columns.insert(format!("{base}:{sheet_name}"));
                    }
                    // id is a join key, so it leads the field columns no
                    // matter where the item schema declares it.
                    if item_properties.is_some_and(|p| p.contains_key("id")) {
                        sub.field_columns.insert("id".to_string());
                    }

                    if let Some(item_properties) = item_properties {
                        self.plan_properties(
                            resolver,
                            item_properties,
                            plan,
                            &SheetTarget::Sub(sheet_name),
                            "",
                            &format!("{path}{key}[]/"),
                            &bases,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn add_column(plan: &mut SheetPlan, target: &SheetTarget, name: String) {
    match target {
        SheetTarget::Main => {
            plan.main_columns.insert(name);
        }
        SheetTarget::Sub(sheet) => {
            if let Some(sub) = plan.sub_sheets.get_mut(sheet) {
                sub.field_columns.insert(name);
            }
        }
    }
}
