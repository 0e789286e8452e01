//! Field-level snapshots, differences and partial updates.
//!
//! Models are compared through their JSON form, so every entity with a serde
//! representation gets the same diff and patch semantics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult, FieldErrors};

/// Bookkeeping fields never reported in differences.
pub const INTERNAL_FIELDS: &[&str] = &["version", "created", "updated"];

/// Fields no client patch may set on any entity.
pub const ALWAYS_PROTECTED: &[&str] = &["id", "version", "created", "updated"];

fn to_object<T: Serialize>(model: &T) -> AppResult<Map<String, Value>> {
    match serde_json::to_value(model)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::InvalidInput(format!(
            "Expected an object, got {}",
            other
        ))),
    }
}

/// Full snapshot of a new entity, minus internal fields.
pub fn snapshot<T: Serialize>(model: &T) -> AppResult<Value> {
    let mut map = to_object(model)?;
    for field in INTERNAL_FIELDS {
        map.remove(*field);
    }
    Ok(Value::Object(map))
}

/// Changed fields as `{field: [old, new]}`, excluding internal fields.
pub fn diff<T: Serialize>(old: &T, new: &T) -> AppResult<Map<String, Value>> {
    let old = to_object(old)?;
    let new = to_object(new)?;

    let mut difference = Map::new();
    for (field, new_value) in new {
        if INTERNAL_FIELDS.contains(&field.as_str()) {
            continue;
        }
        let old_value = old.get(&field).cloned().unwrap_or(Value::Null);
        if old_value != new_value {
            difference.insert(field, Value::Array(vec![old_value, new_value]));
        }
    }
    Ok(difference)
}

/// Whether a difference touches `field`.
pub fn changed(difference: &Map<String, Value>, field: &str) -> bool {
    difference.contains_key(field)
}

/// Apply a client patch to `current`, returning the merged model.
///
/// Unknown fields, protected fields and values that do not deserialize into
/// the field's type are reported per field; nothing is applied on error.
pub fn apply_patch<T>(current: &T, patch: &Map<String, Value>, protected: &[&str]) -> AppResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let base = to_object(current)?;
    let mut merged = base.clone();
    let mut errors = FieldErrors::new();

    for (field, value) in patch {
        if ALWAYS_PROTECTED.contains(&field.as_str()) || protected.contains(&field.as_str()) {
            errors
                .entry(field.clone())
                .or_default()
                .push("This field cannot be changed here".to_string());
            continue;
        }
        if !base.contains_key(field) {
            errors
                .entry(field.clone())
                .or_default()
                .push("Unknown field".to_string());
            continue;
        }

        let mut candidate = base.clone();
        candidate.insert(field.clone(), value.clone());
        if let Err(e) = serde_json::from_value::<T>(Value::Object(candidate)) {
            errors
                .entry(field.clone())
                .or_default()
                .push(format!("Invalid value: {}", e));
            continue;
        }

        merged.insert(field.clone(), value.clone());
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(serde_json::from_value(Value::Object(merged))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: i32,
        version: i32,
        name: String,
        notes: String,
        sent: Option<chrono::NaiveDate>,
    }

    fn sample() -> Sample {
        Sample {
            id: 1,
            version: 3,
            name: "Acme".to_string(),
            notes: String::new(),
            sent: None,
        }
    }

    #[test]
    fn test_diff_reports_only_changed_fields() {
        let old = sample();
        let new = Sample {
            version: 4,
            name: "X".to_string(),
            ..old.clone()
        };
        let difference = diff(&old, &new).unwrap();
        assert_eq!(difference.len(), 1);
        assert_eq!(difference["name"], json!(["Acme", "X"]));
    }

    #[test]
    fn test_diff_of_identical_models_is_empty() {
        assert!(diff(&sample(), &sample()).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_drops_internal_fields() {
        let value = snapshot(&sample()).unwrap();
        assert!(value.get("version").is_none());
        assert_eq!(value["name"], "Acme");
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn test_apply_patch_merges_fields() {
        let patch = json!({"notes": "Y", "sent": "2024-03-01"});
        let merged = apply_patch(&sample(), patch.as_object().unwrap(), &[]).unwrap();
        assert_eq!(merged.notes, "Y");
        assert_eq!(
            merged.sent,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(merged.version, 3);
    }

    #[test]
    fn test_apply_patch_rejects_unknown_protected_and_invalid_fields() {
        let patch = json!({"colour": "red", "version": 9, "sent": "yesterday", "notes": "ok"});
        match apply_patch(&sample(), patch.as_object().unwrap(), &["name"]) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.contains_key("colour"));
                assert!(errors.contains_key("version"));
                assert!(errors.contains_key("sent"));
                assert!(!errors.contains_key("notes"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let patch = json!({"name": "Renamed"});
        assert!(apply_patch(&sample(), patch.as_object().unwrap(), &["name"]).is_err());
    }
}
