//! Turning raw file content into revision-tagged data points.

use crate::errors::Result;
use crate::extract;
use crate::parse::{self, Format};
use crate::project;
use crate::query::QueryPath;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One labeled record of plottable values. Field insertion order is
/// preserved all the way into the filled template.
pub type DataPoint = Map<String, Value>;

/// Ordered column names describing a record collection, when known.
pub type FieldNames = Option<Vec<String>>;

/// Field appended to every data point to tell revisions apart.
pub const REVISION_FIELD: &str = "rev";

/// How to narrow parsed content down to data points.
#[derive(Default)]
pub struct ExtractOptions<'a> {
    /// Structural query locating the record list in nested input.
    pub query: Option<&'a QueryPath>,
    /// Keep only these fields, failing if any record lacks one.
    pub fields: Option<&'a HashSet<String>>,
    /// Reduce records to an `(index, last column)` series.
    pub default_plot: bool,
}

/// Run the full extraction pipeline for one file at one revision:
/// parse, extract, project, then tag every record with the revision.
pub fn to_datapoints(
    path: &str,
    revision: &str,
    content: &str,
    opts: &ExtractOptions,
) -> Result<Vec<DataPoint>> {
    let format = Format::from_path(path)?;
    let raw = parse::parse(path, format, content)?;
    let extracted = extract::extract(raw, opts.query, opts.fields)?;
    let (points, fieldnames) =
        project::filter_fields(extracted.points, extracted.fieldnames, opts.fields)?;
    let (mut points, _) = project::to_default_series(points, fieldnames, opts.default_plot)?;
    for point in &mut points {
        point.insert(REVISION_FIELD.to_owned(), Value::String(revision.to_owned()));
    }
    Ok(points)
}
