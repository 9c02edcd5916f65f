//! Document loading helpers.
//!
//! Schema and data documents must keep two properties of the source text
//! that a default JSON parse discards: object key order (column order is
//! derived from declaration order) and the exact decimal representation of
//! numbers (monetary fields must round-trip unchanged). Both are handled by
//! serde_json's `preserve_order` and `arbitrary_precision` features, enabled
//! in Cargo.toml, so everything here parses into a plain [`Value`].

use crate::error::{FlattenError, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load a document from exactly one of a file on disk or an already-parsed
/// value. Supplying both or neither is a configuration error.
pub fn load_document(filename: Option<&Path>, document: Option<Value>) -> Result<Value> {
    match (filename, document) {
        (Some(_), Some(_)) => Err(FlattenError::Configuration(
            "only one of a filename and an in-memory document may be supplied".into(),
        )),
        (None, None) => Err(FlattenError::Configuration(
            "either a filename or an in-memory document must be supplied".into(),
        )),
        (Some(path), None) => {
            let file = File::open(path)?;
            Ok(serde_json::from_reader(BufReader::new(file))?)
        }
        (None, Some(value)) => Ok(value),
    }
}

/// Follow a slash-delimited key path into a document.
pub fn path_search<'a>(document: &'a Value, path: &str) -> Result<&'a Value> {
    let mut current = document;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = current.get(segment).ok_or_else(|| {
            FlattenError::Configuration(format!(
                "root list path segment '{segment}' not found in document"
            ))
        })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_filename_and_document_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{}").unwrap();

        let result = load_document(Some(file.path()), Some(json!({})));
        assert!(matches!(result, Err(FlattenError::Configuration(_))));

        let result = load_document(None, None);
        assert!(matches!(result, Err(FlattenError::Configuration(_))));
    }

    #[test]
    fn test_key_order_preserved() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"a":{}, "c":{}, "b":{}, "d":{}}"#).unwrap();

        let document = load_document(Some(file.path()), None).unwrap();
        let keys: Vec<&String> = document.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "c", "b", "d"]);
    }

    #[test]
    fn test_decimals_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"amount": 1.10}"#).unwrap();

        let document = load_document(Some(file.path()), None).unwrap();
        assert_eq!(document["amount"].to_string(), "1.10");
    }

    #[test]
    fn test_path_search() {
        let document = json!({"results": {"releases": [1, 2]}});
        let found = path_search(&document, "results/releases").unwrap();
        assert_eq!(found, &json!([1, 2]));

        assert!(matches!(
            path_search(&document, "results/missing"),
            Err(FlattenError::Configuration(_))
        ));
    }
}
