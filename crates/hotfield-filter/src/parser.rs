//! Parse the client-facing MongoDB-style JSON grammar (§6) into a
//! [`Filter`] or [`Update`] AST.
//!
//! Parsing rule (§4.B): a map whose keys are *all* operators is a
//! predicate; a map containing any non-operator key is itself a
//! nested-object *value* and uses `$eq` against that structural value.

use hotfield_core::{json::is_reserved_operator, Json};
use serde_json::Value;

use crate::ast::{Filter, Operator};
use crate::error::FilterError;
use crate::update::{Update, UpdateOp};

fn to_json(v: &Value) -> Json {
    v.clone().into()
}

/// Parse a filter expression from a JSON object.
///
/// # Errors
///
/// Returns [`FilterError`] if the shape does not match the grammar in §6.
pub fn parse_filter(value: &Value) -> Result<Filter, FilterError> {
    let Value::Object(map) = value else {
        return Err(FilterError::NotAnObject(value.to_string()));
    };
    parse_object(map)
}

fn parse_object(map: &serde_json::Map<String, Value>) -> Result<Filter, FilterError> {
    let mut parts = Vec::new();

    for (key, val) in map {
        if key == "$and" {
            parts.push(parse_logical_array(val, "$and", Filter::And as fn(Vec<Filter>) -> Filter)?);
        } else if key == "$or" {
            parts.push(parse_logical_array(val, "$or", Filter::Or as fn(Vec<Filter>) -> Filter)?);
        } else if key == "$not" {
            let inner = parse_filter(val)?;
            parts.push(Filter::Not(Box::new(inner)));
        } else if is_reserved_operator(key) {
            return Err(FilterError::UnknownOperator(key.clone()));
        } else {
            parts.push(parse_field_predicate(key, val)?);
        }
    }

    match parts.len() {
        0 => Ok(Filter::And(Vec::new())), // empty object: match all
        1 => Ok(parts.into_iter().next().expect("len checked above")),
        _ => Ok(Filter::And(parts)),
    }
}

fn parse_logical_array(
    val: &Value,
    name: &'static str,
    build: fn(Vec<Filter>) -> Filter,
) -> Result<Filter, FilterError> {
    let arr = val.as_array().ok_or_else(|| FilterError::MalformedOperand {
        operator: name.to_string(),
        reason: "expected an array".to_string(),
    })?;
    if arr.is_empty() {
        return Err(FilterError::EmptyLogical(name));
    }
    let children = arr.iter().map(parse_filter).collect::<Result<Vec<_>, _>>()?;
    Ok(build(children))
}

fn parse_field_predicate(path: &str, val: &Value) -> Result<Filter, FilterError> {
    if let Value::Object(map) = val {
        if !map.is_empty() && map.keys().all(|k| is_reserved_operator(k)) {
            return parse_operator_object(path, map);
        }
    }
    // Implicit equality: raw scalar, array, or a nested-object *value*.
    Ok(Filter::eq(path, to_json(val)))
}

fn parse_operator_object(
    path: &str,
    map: &serde_json::Map<String, Value>,
) -> Result<Filter, FilterError> {
    let mut nodes = Vec::new();

    for (op, val) in map {
        let operator = match op.as_str() {
            "$eq" => Operator::Eq(to_json(val)),
            "$ne" => Operator::Ne(to_json(val)),
            "$gt" => Operator::Gt(to_json(val)),
            "$gte" => Operator::Gte(to_json(val)),
            "$lt" => Operator::Lt(to_json(val)),
            "$lte" => Operator::Lte(to_json(val)),
            "$in" => Operator::In(parse_value_array(op, val)?),
            "$nin" => Operator::Nin(parse_value_array(op, val)?),
            "$exists" => {
                let b = val.as_bool().ok_or_else(|| malformed(op, "expected a boolean"))?;
                Operator::Exists(b)
            }
            "$regex" => {
                let pattern = val.as_str().ok_or_else(|| malformed(op, "expected a string"))?.to_string();
                let options = map.get("$options").and_then(Value::as_str).map(str::to_string);
                Operator::Regex { pattern, options }
            }
            "$options" => continue, // consumed alongside $regex
            "$type" => {
                let t = val.as_str().ok_or_else(|| malformed(op, "expected a string"))?.to_string();
                Operator::Type(t)
            }
            "$all" => Operator::All(parse_value_array(op, val)?),
            "$elemMatch" => Operator::ElemMatch(Box::new(parse_filter(val)?)),
            "$size" => {
                let n = val.as_i64().ok_or_else(|| malformed(op, "expected an integer"))?;
                Operator::Size(n)
            }
            other => return Err(FilterError::UnknownOperator(other.to_string())),
        };
        nodes.push(Filter::Field { path: path.to_string(), op: operator });
    }

    if nodes.is_empty() {
        // This only happens for `{"$options": "i"}` with no accompanying
        // `$regex`, which is malformed on its own.
        return Err(FilterError::MalformedOperand {
            operator: path.to_string(),
            reason: "no operators present".to_string(),
        });
    }

    match nodes.len() {
        1 => Ok(nodes.into_iter().next().expect("len checked above")),
        _ => Ok(Filter::And(nodes)),
    }
}

fn parse_value_array(op: &str, val: &Value) -> Result<Vec<Json>, FilterError> {
    let arr = val.as_array().ok_or_else(|| malformed(op, "expected an array"))?;
    Ok(arr.iter().map(to_json).collect())
}

fn malformed(op: &str, reason: &str) -> FilterError {
    FilterError::MalformedOperand { operator: op.to_string(), reason: reason.to_string() }
}

/// Parse an update expression from a JSON object mapping operator names to
/// `{field_path: operand}` objects (§4.G, §6).
///
/// # Errors
///
/// Returns [`FilterError`] if the shape does not match the grammar, a
/// field name is reserved (`$`-prefixed) or addresses an envelope field
/// (`_`-prefixed).
pub fn parse_update(value: &Value) -> Result<Update, FilterError> {
    let Value::Object(ops) = value else {
        return Err(FilterError::NotAnObject(value.to_string()));
    };

    let mut update = Update::new();

    for (op_key, op_val) in ops {
        let Value::Object(fields) = op_val else {
            return Err(FilterError::MalformedOperand {
                operator: op_key.clone(),
                reason: "expected an object of field paths".to_string(),
            });
        };

        for (field, operand) in fields {
            if is_reserved_operator(field) {
                return Err(FilterError::ReservedFieldName(field.clone()));
            }
            if hotfield_core::json::is_envelope_field(field) {
                return Err(FilterError::EnvelopeFieldName(field.clone()));
            }

            let update_op = match op_key.as_str() {
                "$set" => UpdateOp::Set(to_json(operand)),
                "$unset" => UpdateOp::Unset,
                "$inc" => UpdateOp::Inc(numeric_operand(op_key, operand)?),
                "$mul" => UpdateOp::Mul(numeric_operand(op_key, operand)?),
                "$push" => UpdateOp::Push(to_json(operand)),
                "$pull" => UpdateOp::Pull(to_json(operand)),
                "$addToSet" => UpdateOp::AddToSet(to_json(operand)),
                other => return Err(FilterError::UnknownOperator(other.to_string())),
            };
            update.push(field.clone(), update_op);
        }
    }

    Ok(update)
}

fn numeric_operand(op: &str, val: &Value) -> Result<f64, FilterError> {
    val.as_f64().ok_or_else(|| malformed(op, "expected a number"))
}
