//! Typed JSON documents
//!
//! Persisted JSON files carry a document type identifier under `sDTI`.
//! Loading checks the identifier against a pattern; saving writes it.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use artdeck_core::dti::{self, Dti, DTI_KEY};
use artdeck_core::prelude::*;
use artdeck_daemon::workspace::{read_json, write_json_atomic};

/// Check the document type of a loaded value
pub fn check_typed(value: &Value, pattern: &str) -> Result<Dti> {
    match dti::check(value, pattern) {
        Some(dti) => Ok(dti),
        None => {
            let found = value
                .get(DTI_KEY)
                .and_then(Value::as_str)
                .unwrap_or("<none>")
                .to_string();
            Err(Error::document_type(pattern, found))
        }
    }
}

/// Load a JSON object and check its document type
pub fn load_typed(path: &Path, pattern: &str) -> Result<Map<String, Value>> {
    let value = read_json(path)?;
    check_typed(&value, pattern)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::config_invalid(format!(
            "{} does not contain a JSON object",
            path.display()
        ))),
    }
}

/// Load and deserialize a typed document
pub fn load_typed_as<T: DeserializeOwned>(path: &Path, pattern: &str) -> Result<T> {
    let map = load_typed(path, pattern)?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| Error::config_invalid(format!("{}: {}", path.display(), e)))
}

/// Like [`load_typed_as`], but a missing file gives `None`
pub fn load_typed_opt<T: DeserializeOwned>(path: &Path, pattern: &str) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    load_typed_as(path, pattern).map(Some)
}

/// Serialize `data` and save it with the document type `dti`
pub fn save_typed<T: Serialize>(path: &Path, dti: &str, data: &T) -> Result<()> {
    let mut value = serde_json::to_value(data)?;
    match &mut value {
        Value::Object(map) => {
            map.insert(DTI_KEY.to_string(), Value::String(dti.to_string()));
        }
        _ => {
            return Err(Error::config(format!(
                "document for {} is not a JSON object",
                path.display()
            )))
        }
    }
    write_json_atomic(path, &value)?;
    debug!("Saved {} to {:?}", dti, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        #[serde(rename = "iPort")]
        port: u16,
    }

    #[test]
    fn test_save_and_load_typed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.json");
        save_typed(&path, "/catharsys/gui/web:1.0", &Doc { port: 8080 }).unwrap();

        let raw = read_json(&path).unwrap();
        assert_eq!(raw["sDTI"], "/catharsys/gui/web:1.0");

        let doc: Doc = load_typed_as(&path, "/catharsys/gui/web:1").unwrap();
        assert_eq!(doc, Doc { port: 8080 });
    }

    #[test]
    fn test_wrong_type_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.json");
        write_json_atomic(&path, &json!({"sDTI": "/catharsys/launch:3.0"})).unwrap();

        let err = load_typed(&path, "/catharsys/gui/web:1").unwrap_err();
        assert!(matches!(err, Error::DocumentType { .. }));
    }

    #[test]
    fn test_missing_type_rejected() {
        let err = check_typed(&json!({"iPort": 1}), "/catharsys/gui/web:1").unwrap_err();
        assert!(err.to_string().contains("<none>"));
    }

    #[test]
    fn test_load_opt_missing_file() {
        let temp = TempDir::new().unwrap();
        let doc: Option<Doc> = load_typed_opt(&temp.path().join("nope.json"), "/x:1").unwrap();
        assert!(doc.is_none());
    }
}
