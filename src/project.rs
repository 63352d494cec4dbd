//! Record post-processing: field projection and the default plot transform.

use crate::data::{DataPoint, FieldNames};
use crate::errors::{PlotError, Result};
use itertools::Itertools;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Narrow every record to the requested fields, keeping each record's own
/// key order. Every record must carry every requested field.
pub fn filter_fields(
    points: Vec<DataPoint>,
    fieldnames: FieldNames,
    fields: Option<&HashSet<String>>,
) -> Result<(Vec<DataPoint>, FieldNames)> {
    let Some(fields) = fields else {
        return Ok((points, fieldnames));
    };
    let mut narrowed = Vec::with_capacity(points.len());
    for point in &points {
        let missing = fields
            .iter()
            .filter(|f| !point.contains_key(f.as_str()))
            .sorted()
            .join(", ");
        if !missing.is_empty() {
            return Err(PlotError::FieldNotFound {
                missing,
                present: point.keys().join(", "),
            });
        }
        narrowed.push(
            point
                .iter()
                .filter(|(key, _)| fields.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<_, _>>(),
        );
    }
    let fieldnames =
        fieldnames.map(|names| names.into_iter().filter(|n| fields.contains(n)).collect_vec());
    Ok((narrowed, fieldnames))
}

/// Turn an arbitrary record list into an `(index, last column)` series:
/// `{"x": position, "y": value}` with `y` read from the last known column.
/// This is the schema-free fallback used when no explicit template is given.
pub fn to_default_series(
    points: Vec<DataPoint>,
    fieldnames: FieldNames,
    default_plot: bool,
) -> Result<(Vec<DataPoint>, FieldNames)> {
    if !default_plot {
        return Ok((points, fieldnames));
    }
    let names = Some(vec!["x".to_owned(), "y".to_owned()]);
    let y_key = fieldnames
        .as_ref()
        .and_then(|names| names.last().cloned())
        .or_else(|| points.first().and_then(|p| p.keys().last().cloned()));
    let Some(y_key) = y_key else {
        return Ok((Vec::new(), names));
    };
    let mut series = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        let y = point.get(&y_key).ok_or_else(|| PlotError::FieldNotFound {
            missing: y_key.clone(),
            present: point.keys().join(", "),
        })?;
        let mut out = Map::new();
        out.insert("x".to_owned(), Value::from(index));
        out.insert("y".to_owned(), y.clone());
        series.push(out);
    }
    Ok((series, names))
}
