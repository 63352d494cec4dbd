//! Loading and merging data points across revisions.

use crate::data::{self, DataPoint, ExtractOptions};
use crate::errors::{PlotError, Result};
use crate::source::{ContentSource, HEAD_REVISION, ResolveError, WORKSPACE_REVISION};
use itertools::Itertools;
use log::{debug, warn};

/// Fill in the implicit revisions when one or none are given explicitly:
/// the working tree is always compared, and with no explicit revisions a
/// dirty working tree is also compared against the last checkpoint.
pub fn revisions_with_defaults(
    source: &dyn ContentSource,
    explicit: &[String],
) -> Result<Vec<String>> {
    let mut revisions = explicit.to_vec();
    if revisions.len() <= 1 {
        if revisions.is_empty() && source.is_modified()? {
            revisions.push(HEAD_REVISION.to_owned());
        }
        if revisions.last().map(String::as_str) != Some(WORKSPACE_REVISION) {
            revisions.push(WORKSPACE_REVISION.to_owned());
        }
    }
    Ok(revisions)
}

/// Load a datafile at every revision and merge the results, grouped by
/// revision in the given order.
///
/// A file missing at one revision is tolerated and reported as a warning;
/// a file missing at every revision is an error. Any other failure aborts
/// immediately.
pub fn from_revisions(
    source: &dyn ContentSource,
    datafile: &str,
    revisions: &[String],
    opts: &ExtractOptions,
) -> Result<Vec<DataPoint>> {
    let mut merged = Vec::new();
    let mut missing = Vec::new();
    for revision in revisions {
        match source.resolve(datafile, revision) {
            Ok(content) => {
                let points = data::to_datapoints(datafile, revision, &content, opts)?;
                debug!("'{datafile}' at '{revision}': {} points", points.len());
                merged.extend(points);
            }
            Err(ResolveError::NotFound { .. }) => missing.push(revision.clone()),
            Err(err) => return Err(err.into()),
        }
    }
    if merged.is_empty() && !missing.is_empty() {
        return Err(PlotError::NoMetricInHistory {
            path: datafile.to_owned(),
            revisions: revisions.iter().join(", "),
        });
    }
    for revision in &missing {
        warn!("file '{datafile}' was not found at: '{revision}', it will not be plotted");
    }
    Ok(merged)
}
