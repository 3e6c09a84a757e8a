#![forbid(unsafe_code)]

//! Transport-side request validation: a declarative pass over the incoming
//! JSON payload that collects every field problem before the engine is
//! invoked. The engine still re-validates chain structure inside its own
//! transaction; this layer only guards shapes and ranges.

use cl_core::model::Direction;
use cl_core::query::{DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
use cl_storage::{AddEntryRequest, OrderQuery, RepositionEntryRequest};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgsError {
    pub errors: Vec<FieldError>,
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid arguments:")?;
        for error in &self.errors {
            write!(f, " {} {};", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ArgsError {}

pub fn parse_add(value: &Value) -> Result<AddEntryRequest, ArgsError> {
    let mut errors = Vec::new();
    let name = required_str(value, "name", &mut errors);
    let prev = optional_str(value, "prev", &mut errors);
    let next = optional_str(value, "next", &mut errors);
    finish(errors)?;
    Ok(AddEntryRequest {
        name: name.unwrap_or_default(),
        prev,
        next,
    })
}

pub fn parse_remove(value: &Value) -> Result<i64, ArgsError> {
    let mut errors = Vec::new();
    let id = required_id(value, "id", &mut errors);
    finish(errors)?;
    Ok(id.unwrap_or_default())
}

pub fn parse_rename(value: &Value) -> Result<(i64, String), ArgsError> {
    let mut errors = Vec::new();
    let id = required_id(value, "id", &mut errors);
    let new_name = required_str(value, "newName", &mut errors);
    finish(errors)?;
    Ok((id.unwrap_or_default(), new_name.unwrap_or_default()))
}

pub fn parse_reposition(value: &Value) -> Result<RepositionEntryRequest, ArgsError> {
    let mut errors = Vec::new();
    let id = required_id(value, "id", &mut errors);
    let name = required_str(value, "name", &mut errors);
    let prev = optional_str(value, "prev", &mut errors);
    let next = optional_str(value, "next", &mut errors);
    finish(errors)?;
    Ok(RepositionEntryRequest {
        id: id.unwrap_or_default(),
        name: name.unwrap_or_default(),
        prev,
        next,
    })
}

pub fn parse_order_query(value: &Value) -> Result<OrderQuery, ArgsError> {
    let mut errors = Vec::new();

    let start_id = match value.get("startId") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) if id >= 0 => Some(id),
            _ => {
                push(&mut errors, "startId", "must be a non-negative integer");
                None
            }
        },
        Some(_) => {
            push(&mut errors, "startId", "must be a non-negative integer");
            None
        }
    };

    let limit = match value.get("limit") {
        None | Some(Value::Null) => DEFAULT_LIMIT,
        Some(Value::Number(n)) => match n.as_u64().map(|v| v as usize) {
            Some(v) if (MIN_LIMIT..=MAX_LIMIT).contains(&v) => v,
            _ => {
                push(&mut errors, "limit", "must be within 1..=100");
                DEFAULT_LIMIT
            }
        },
        Some(_) => {
            push(&mut errors, "limit", "must be within 1..=100");
            DEFAULT_LIMIT
        }
    };

    let direction = match value.get("direction") {
        None | Some(Value::Null) => Direction::Ascending,
        Some(Value::String(raw)) => match Direction::parse(raw) {
            Some(direction) => direction,
            None => {
                push(&mut errors, "direction", "must be ascending or descending");
                Direction::Ascending
            }
        },
        Some(_) => {
            push(&mut errors, "direction", "must be ascending or descending");
            Direction::Ascending
        }
    };

    finish(errors)?;
    Ok(OrderQuery {
        start_id,
        direction,
        limit,
    })
}

fn finish(errors: Vec<FieldError>) -> Result<(), ArgsError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ArgsError { errors })
    }
}

fn push(errors: &mut Vec<FieldError>, field: &'static str, message: &'static str) {
    errors.push(FieldError { field, message });
}

fn required_str(value: &Value, field: &'static str, errors: &mut Vec<FieldError>) -> Option<String> {
    match value.get(field) {
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(raw.clone()),
        Some(Value::String(_)) => {
            push(errors, field, "must not be empty");
            None
        }
        Some(_) => {
            push(errors, field, "must be a string");
            None
        }
        None => {
            push(errors, field, "is required");
            None
        }
    }
}

fn optional_str(value: &Value, field: &'static str, errors: &mut Vec<FieldError>) -> Option<String> {
    match value.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(raw.clone()),
        Some(Value::String(_)) => {
            push(errors, field, "must not be empty");
            None
        }
        Some(_) => {
            push(errors, field, "must be a string");
            None
        }
    }
}

fn required_id(value: &Value, field: &'static str, errors: &mut Vec<FieldError>) -> Option<i64> {
    match value.get(field) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) if id > 0 => Some(id),
            _ => {
                push(errors, field, "must be a positive integer");
                None
            }
        },
        Some(_) => {
            push(errors, field, "must be a positive integer");
            None
        }
        None => {
            push(errors, field, "is required");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_add_accepts_optional_neighbors() {
        let request =
            parse_add(&json!({ "name": "B", "prev": "A" })).expect("valid add args must parse");
        assert_eq!(request.name, "B");
        assert_eq!(request.prev.as_deref(), Some("A"));
        assert_eq!(request.next, None);
    }

    #[test]
    fn parse_add_collects_every_field_error() {
        let err = parse_add(&json!({ "name": "", "prev": 3 })).expect_err("bad args must fail");
        let fields: Vec<_> = err.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "prev"]);
    }

    #[test]
    fn parse_rename_requires_positive_id() {
        let err = parse_rename(&json!({ "id": 0, "newName": "X" }))
            .expect_err("zero id must be rejected");
        assert_eq!(err.errors[0].field, "id");
    }

    #[test]
    fn parse_order_query_applies_defaults() {
        let query = parse_order_query(&json!({})).expect("empty query must parse");
        assert_eq!(query, OrderQuery::default());
    }

    #[test]
    fn parse_order_query_checks_ranges_and_enum() {
        let err = parse_order_query(&json!({ "limit": 0, "direction": "sideways" }))
            .expect_err("out-of-range query must fail");
        let fields: Vec<_> = err.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["limit", "direction"]);

        let query = parse_order_query(&json!({ "startId": 4, "limit": 10, "direction": "DESC" }))
            .expect("valid query must parse");
        assert_eq!(query.start_id, Some(4));
        assert_eq!(query.limit, 10);
        assert_eq!(query.direction, Direction::Descending);
    }
}
