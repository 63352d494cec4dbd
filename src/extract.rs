//! Reduces parsed file content to a flat list of records.
//!
//! Tracked metric files have no standardized schema; nested JSON/YAML is
//! narrowed down either by an explicit query path or by searching for the
//! first list of records carrying the requested fields. Ambiguity surfaces
//! as an error instead of silently picking the wrong list.

use crate::data::{DataPoint, FieldNames};
use crate::errors::{self, Result};
use crate::parse::RawData;
use crate::query::QueryPath;
use itertools::Itertools;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub struct Extracted {
    pub points: Vec<DataPoint>,
    pub fieldnames: FieldNames,
}

/// Locate the record list to plot inside `raw`.
pub fn extract(
    raw: RawData,
    query: Option<&QueryPath>,
    fields: Option<&HashSet<String>>,
) -> Result<Extracted> {
    let RawData { data, fieldnames } = raw;
    if !data.is_object() {
        return into_points(data, fieldnames);
    }
    if let Some(query) = query {
        return apply_query(&data, query);
    }
    if let Some(fields) = fields {
        return find_records(&data, fields, fieldnames);
    }
    Err(errors::structure(
        "data is a nested mapping, a query path or a field filter is needed to locate the records",
    ))
}

/// Evaluate the query path: a unique record-list match wins, otherwise each
/// match must resolve through one shared field name and becomes a one-field
/// record of its own.
fn apply_query(data: &Value, query: &QueryPath) -> Result<Extracted> {
    let found = query.find(data);
    if found.is_empty() {
        return Err(errors::structure("query path matched nothing"));
    }
    if found.len() == 1
        && let Value::Array(items) = found[0].value
        && !items.is_empty()
        && items.iter().all(Value::is_object)
    {
        let points = items
            .iter()
            .map(|v| v.as_object().expect("all entries are mappings").clone())
            .collect_vec();
        let fieldnames = points[0].keys().cloned().collect_vec();
        return Ok(Extracted {
            points,
            fieldnames: Some(fieldnames),
        });
    }
    let field = match &found[0].field {
        Some(field) if found.iter().all(|m| m.field.as_deref() == Some(field.as_str())) => {
            field.clone()
        }
        _ => {
            return Err(errors::structure(
                "query result is neither a record list nor a single field",
            ));
        }
    };
    let points = found
        .iter()
        .map(|m| {
            let mut point = Map::new();
            point.insert(field.clone(), m.value.clone());
            point
        })
        .collect_vec();
    Ok(Extracted {
        points,
        fieldnames: Some(vec![field]),
    })
}

/// Depth-first search through the mapping, in key insertion order, for the
/// first list of records carrying every requested field.
fn find_records(
    data: &Value,
    fields: &HashSet<String>,
    fieldnames: FieldNames,
) -> Result<Extracted> {
    let Some(list) = first_record_list(data, fields) else {
        return Err(errors::structure(format!(
            "no record list with fields '{}' found",
            fields.iter().sorted().join(", ")
        )));
    };
    let points = list
        .iter()
        .map(|v| v.as_object().expect("all entries are mappings").clone())
        .collect_vec();
    let fieldnames =
        fieldnames.map(|names| names.into_iter().filter(|n| fields.contains(n)).collect_vec());
    Ok(Extracted { points, fieldnames })
}

fn first_record_list<'a>(value: &'a Value, fields: &HashSet<String>) -> Option<&'a Vec<Value>> {
    match value {
        Value::Object(map) => map.values().find_map(|v| first_record_list(v, fields)),
        Value::Array(items) => {
            if items.is_empty() || !items.iter().all(Value::is_object) {
                return None;
            }
            let keys: HashSet<&str> = items[0]
                .as_object()
                .expect("all entries are mappings")
                .keys()
                .map(String::as_str)
                .collect();
            fields
                .iter()
                .all(|f| keys.contains(f.as_str()))
                .then_some(items)
        }
        _ => None,
    }
}

fn into_points(data: Value, fieldnames: FieldNames) -> Result<Extracted> {
    let Value::Array(items) = data else {
        return Err(errors::structure("expected a list of records"));
    };
    let points = items
        .into_iter()
        .map(|v| match v {
            Value::Object(point) => Ok(point),
            _ => Err(errors::structure("every list entry must be a mapping")),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Extracted { points, fieldnames })
}
