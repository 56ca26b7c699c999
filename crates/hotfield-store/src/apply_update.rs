//! Applies a parsed [`Update`] expression to a document payload (§4.G, §6).

use hotfield_core::Json;
use hotfield_filter::{Update, UpdateOp};

use crate::error::StoreError;

/// Apply every operation in `update` to `payload`, in order.
///
/// # Errors
///
/// Returns `StoreError::Update` if `$inc`/`$mul` is applied to a
/// non-numeric, non-absent field, or if `$push`/`$pull`/`$addToSet` is
/// applied to a non-array, non-absent field.
pub fn apply_update(payload: &mut Json, update: &Update) -> Result<(), StoreError> {
    for (path, op) in &update.ops {
        apply_one(payload, path, op)?;
    }
    Ok(())
}

fn apply_one(payload: &mut Json, path: &str, op: &UpdateOp) -> Result<(), StoreError> {
    match op {
        UpdateOp::Set(value) => {
            payload
                .set_path(path, value.clone())
                .map_err(|reason| StoreError::Update(format!("$set on '{path}': {reason}")))?;
        }
        UpdateOp::Unset => payload.unset_path(path),
        UpdateOp::Inc(delta) => {
            let current = current_number(payload, path, "$inc")?;
            set_number(payload, path, current + delta)?;
        }
        UpdateOp::Mul(factor) => {
            let current = current_number(payload, path, "$mul")?;
            set_number(payload, path, current * factor)?;
        }
        UpdateOp::Push(value) => {
            let mut array = current_array(payload, path, "$push")?;
            array.push(value.clone());
            set_array(payload, path, array)?;
        }
        UpdateOp::Pull(value) => {
            let mut array = current_array(payload, path, "$pull")?;
            array.retain(|existing| existing != value);
            set_array(payload, path, array)?;
        }
        UpdateOp::AddToSet(value) => {
            let mut array = current_array(payload, path, "$addToSet")?;
            if !array.contains(value) {
                array.push(value.clone());
            }
            set_array(payload, path, array)?;
        }
    }
    Ok(())
}

/// Current numeric value at `path`, treating an absent field as `0.0`.
///
/// # Errors
///
/// Returns `StoreError::Update` if the field is present but not a number.
fn current_number(payload: &Json, path: &str, op_name: &str) -> Result<f64, StoreError> {
    match payload.extract(path) {
        None | Some(Json::Null) => Ok(0.0),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| StoreError::Update(format!("{op_name} on '{path}': field is not a number"))),
    }
}

fn set_number(payload: &mut Json, path: &str, value: f64) -> Result<(), StoreError> {
    #[allow(clippy::cast_possible_truncation)]
    let json_value = if value.fract() == 0.0 && value.abs() < (i64::MAX as f64) {
        Json::Int(value as i64)
    } else {
        Json::Float(value)
    };
    payload
        .set_path(path, json_value)
        .map_err(|reason| StoreError::Update(format!("set numeric at '{path}': {reason}")))
}

/// Current array value at `path`, treating an absent field as an empty
/// array.
///
/// # Errors
///
/// Returns `StoreError::Update` if the field is present but not an array.
fn current_array(payload: &Json, path: &str, op_name: &str) -> Result<Vec<Json>, StoreError> {
    match payload.extract(path) {
        None | Some(Json::Null) => Ok(Vec::new()),
        Some(Json::Array(items)) => Ok(items.clone()),
        Some(_) => Err(StoreError::Update(format!("{op_name} on '{path}': field is not an array"))),
    }
}

fn set_array(payload: &mut Json, path: &str, items: Vec<Json>) -> Result<(), StoreError> {
    payload
        .set_path(path, Json::Array(items))
        .map_err(|reason| StoreError::Update(format!("set array at '{path}': {reason}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(value: serde_json::Value) -> Json {
        value.into()
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut payload = doc(serde_json::json!({}));
        let mut update = Update::new();
        update.push("a.b.c".to_string(), UpdateOp::Set(Json::Int(1)));
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload.extract("a.b.c"), Some(&Json::Int(1)));
    }

    #[test]
    fn applying_same_set_twice_is_idempotent() {
        let mut payload = doc(serde_json::json!({"name": "Alice"}));
        let mut update = Update::new();
        update.push("name".to_string(), UpdateOp::Set(Json::Str("Bob".into())));
        apply_update(&mut payload, &update).unwrap();
        let once = payload.clone();
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload, once);
    }

    #[test]
    fn unset_removes_leaf() {
        let mut payload = doc(serde_json::json!({"a": 1, "b": 2}));
        let mut update = Update::new();
        update.push("a".to_string(), UpdateOp::Unset);
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload.extract("a"), None);
        assert_eq!(payload.extract("b"), Some(&Json::Int(2)));
    }

    #[test]
    fn inc_on_absent_field_treats_as_zero() {
        let mut payload = doc(serde_json::json!({}));
        let mut update = Update::new();
        update.push("count".to_string(), UpdateOp::Inc(5.0));
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload.extract("count"), Some(&Json::Int(5)));
    }

    #[test]
    fn inc_on_string_field_errors() {
        let mut payload = doc(serde_json::json!({"count": "not a number"}));
        let mut update = Update::new();
        update.push("count".to_string(), UpdateOp::Inc(1.0));
        let err = apply_update(&mut payload, &update).unwrap_err();
        assert!(matches!(err, StoreError::Update(_)));
    }

    #[test]
    fn mul_on_absent_field_yields_zero_per_mongo_semantics() {
        let mut payload = doc(serde_json::json!({}));
        let mut update = Update::new();
        update.push("score".to_string(), UpdateOp::Mul(10.0));
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload.extract("score"), Some(&Json::Int(0)));
    }

    #[test]
    fn push_appends_and_creates_array() {
        let mut payload = doc(serde_json::json!({}));
        let mut update = Update::new();
        update.push("tags".to_string(), UpdateOp::Push(Json::Str("a".into())));
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload.extract("tags"), Some(&Json::Array(vec![Json::Str("a".into())])));
    }

    #[test]
    fn push_on_non_array_errors() {
        let mut payload = doc(serde_json::json!({"tags": "not an array"}));
        let mut update = Update::new();
        update.push("tags".to_string(), UpdateOp::Push(Json::Str("a".into())));
        let err = apply_update(&mut payload, &update).unwrap_err();
        assert!(matches!(err, StoreError::Update(_)));
    }

    #[test]
    fn pull_removes_deep_equal_elements() {
        let mut payload = doc(serde_json::json!({"tags": ["a", "b", "a"]}));
        let mut update = Update::new();
        update.push("tags".to_string(), UpdateOp::Pull(Json::Str("a".into())));
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload.extract("tags"), Some(&Json::Array(vec![Json::Str("b".into())])));
    }

    #[test]
    fn add_to_set_is_a_noop_when_element_present() {
        let mut payload = doc(serde_json::json!({"tags": ["a"]}));
        let mut update = Update::new();
        update.push("tags".to_string(), UpdateOp::AddToSet(Json::Str("a".into())));
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload.extract("tags"), Some(&Json::Array(vec![Json::Str("a".into())])));
    }

    #[test]
    fn add_to_set_appends_when_absent() {
        let mut payload = doc(serde_json::json!({"tags": ["a"]}));
        let mut update = Update::new();
        update.push("tags".to_string(), UpdateOp::AddToSet(Json::Str("b".into())));
        apply_update(&mut payload, &update).unwrap();
        assert_eq!(payload.extract("tags"), Some(&Json::Array(vec![Json::Str("a".into()), Json::Str("b".into())])));
    }
}
