//! Main entry point: resolve the template, load every data source across
//! the requested revisions, fill the template.

use crate::data::ExtractOptions;
use crate::errors::{PlotError, Result};
use crate::load;
use crate::query::QueryPath;
use crate::source::ContentSource;
use crate::template::{self, TemplateStore};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;

/// What to plot.
#[derive(Default)]
pub struct PlotRequest {
    /// Metric file to plot; overrides the template's own data sources.
    pub datafile: Option<String>,
    /// Template path or name; the built-in default when not given.
    pub template: Option<String>,
    /// Revisions to compare, oldest first; implicit defaults per
    /// [load::revisions_with_defaults].
    pub revisions: Vec<String>,
    /// Keep only these fields of every record.
    pub fields: Option<HashSet<String>>,
    /// Structural query locating records in nested input.
    pub query: Option<String>,
}

/// Produce the filled visualization document for a request.
pub fn plot(
    source: &dyn ContentSource,
    store: &TemplateStore,
    request: &PlotRequest,
) -> Result<Value> {
    if request.datafile.is_none() && request.template.is_none() {
        return Err(PlotError::NoDataNorTemplate);
    }

    let template_path = store.resolve(request.template.as_deref())?;
    let default_plot = template_path == store.default_path();
    let template = store.load(&template_path)?;
    debug!("template: {}", template_path.display());

    let placeholders = template::discover_sources(&template);
    if let Some(datafile) = &request.datafile
        && placeholders.count() > 1
    {
        return Err(PlotError::TooManyDataSources {
            datafile: datafile.clone(),
            sources: placeholders.labels().iter().join(", "),
        });
    }

    let query = request.query.as_deref().map(QueryPath::parse).transpose()?;
    let opts = ExtractOptions {
        query: query.as_ref(),
        fields: request.fields.as_ref(),
        default_plot,
    };

    let revisions = load::revisions_with_defaults(source, &request.revisions)?;
    info!("revisions: {}", revisions.iter().join(", "));

    let mut data = IndexMap::new();
    match &request.datafile {
        Some(datafile) => {
            let points = load::from_revisions(source, datafile, &revisions, &opts)?;
            // a single explicit datafile takes over the template's one slot,
            // named or not
            let key = placeholders
                .sources
                .first()
                .cloned()
                .unwrap_or_else(|| datafile.clone());
            data.insert(key, points);
        }
        None => {
            for datafile in &placeholders.sources {
                let points = load::from_revisions(source, datafile, &revisions, &opts)?;
                data.insert(datafile.clone(), points);
            }
        }
    }

    template::fill(&template, &data, request.datafile.as_deref())
}
