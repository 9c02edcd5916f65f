//! Local `$ref` resolution.
//!
//! References are JSON-pointer-style paths (`"#/a/b"`) into the same
//! document. The planner resolves them lazily through [`Resolver::deref`] so
//! the final path segment of a pointer can name the sub-sheet it resolves
//! to; [`resolve_references`] performs the eager whole-document substitution
//! for callers that want a reference-free tree.

use crate::error::{FlattenError, Result};
use serde_json::{Map, Value};

/// Resolves `$ref` nodes against a single parsed document.
pub struct Resolver<'a> {
    root: &'a Value,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Resolver { root }
    }

    /// Follow a chain of `$ref` nodes to the value they point at.
    ///
    /// Returns the target together with the final pointer's last path
    /// segment, which names sub-sheets for referenced definitions. Fails on
    /// missing targets and on reference cycles.
    pub fn deref(&self, node: &'a Value) -> Result<(&'a Value, Option<String>)> {
        let mut current = node;
        let mut hint = None;
        let mut chain: Vec<&str> = Vec::new();

        while let Some(pointer) = ref_pointer(current) {
            if chain.contains(&pointer) {
                return Err(FlattenError::Reference(format!(
                    "circular reference '{pointer}'"
                )));
            }
            chain.push(pointer);
            current = self.lookup(pointer)?;
            hint = pointer
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty() && *s != "#")
                .map(str::to_string);
        }

        Ok((current, hint))
    }

    /// Recursively replace every `$ref` node under `node` with its target.
    pub fn expand(&self, node: &'a Value) -> Result<Value> {
        self.expand_inner(node, &mut Vec::new())
    }

    fn expand_inner(&self, node: &'a Value, active: &mut Vec<String>) -> Result<Value> {
        if let Some(pointer) = ref_pointer(node) {
            if active.iter().any(|p| p == pointer) {
                return Err(FlattenError::Reference(format!(
                    "circular reference '{pointer}'"
                )));
            }
            let target = self.lookup(pointer)?;
            active.push(pointer.to_string());
            let expanded = self.expand_inner(target, active)?;
            active.pop();
            return Ok(expanded);
        }

        match node {
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.expand_inner(value, active)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => {
                let expanded: Result<Vec<Value>> = items
                    .iter()
                    .map(|item| self.expand_inner(item, active))
                    .collect();
                Ok(Value::Array(expanded?))
            }
            other => Ok(other.clone()),
        }
    }

    fn lookup(&self, pointer: &str) -> Result<&'a Value> {
        let path = pointer.strip_prefix('#').unwrap_or(pointer);
        let mut current = self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(|| FlattenError::Reference(pointer.to_string()))?;
        }
        Ok(current)
    }
}

fn ref_pointer(node: &Value) -> Option<&str> {
    node.as_object()?.get("$ref")?.as_str()
}

/// Replace every `$ref` in `root` with the node it points to.
pub fn resolve_references(root: &Value) -> Result<Value> {
    Resolver::new(root).expand(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_references_followed() {
        let document = json!({"a": {"$ref": "#/b"}, "b": "c"});
        let resolved = resolve_references(&document).unwrap();
        assert_eq!(resolved["a"], json!("c"));
    }

    #[test]
    fn test_reference_chain() {
        let document = json!({"a": {"$ref": "#/b"}, "b": {"$ref": "#/c"}, "c": 42});
        let resolved = resolve_references(&document).unwrap();
        assert_eq!(resolved["a"], json!(42));
    }

    #[test]
    fn test_nested_reference_target() {
        let document = json!({
            "a": {"$ref": "#/defs/inner"},
            "defs": {"inner": {"type": "string"}}
        });
        let resolver = Resolver::new(&document);
        let (target, hint) = resolver.deref(&document["a"]).unwrap();
        assert_eq!(target, &json!({"type": "string"}));
        assert_eq!(hint.as_deref(), Some("inner"));
    }

    #[test]
    fn test_missing_target() {
        let document = json!({"a": {"$ref": "#/nowhere"}});
        assert!(matches!(
            resolve_references(&document),
            Err(FlattenError::Reference(_))
        ));
    }

    #[test]
    fn test_circular_reference() {
        let document = json!({"a": {"$ref": "#/b"}, "b": {"$ref": "#/a"}});
        assert!(matches!(
            resolve_references(&document),
            Err(FlattenError::Reference(_))
        ));
    }
}
