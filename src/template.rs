//! Visualization templates: data placeholder discovery and substitution,
//! plus the on-disk template store.

use crate::data::{self, DataPoint};
use crate::errors::{PlotError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Marker string for a template's single unnamed data slot.
pub const DATA_ANCHOR: &str = "<METRIC_DATA>";
const NAMED_ANCHOR_PREFIX: &str = "<METRIC_DATA::";
const ANCHOR_SUFFIX: &str = ">";

/// File name of the built-in single-series line chart template.
pub const DEFAULT_TEMPLATE: &str = "default.json";

enum Anchor<'a> {
    Unnamed,
    Named(&'a str),
}

fn anchor(value: &Value) -> Option<Anchor<'_>> {
    let marker = value.as_str()?;
    if marker == DATA_ANCHOR {
        return Some(Anchor::Unnamed);
    }
    let source = marker
        .strip_prefix(NAMED_ANCHOR_PREFIX)?
        .strip_suffix(ANCHOR_SUFFIX)?;
    (!source.is_empty()).then_some(Anchor::Named(source))
}

/// The data sources a template asks for.
pub struct Placeholders {
    /// Named source identifiers in encounter order, without duplicates.
    pub sources: Vec<String>,
    pub has_unnamed: bool,
}

impl Placeholders {
    /// Total number of distinct data slots.
    pub fn count(&self) -> usize {
        self.sources.len() + usize::from(self.has_unnamed)
    }

    /// Every slot as a display label, for error messages.
    pub fn labels(&self) -> Vec<String> {
        let mut labels = self.sources.clone();
        if self.has_unnamed {
            labels.push(DATA_ANCHOR.to_owned());
        }
        labels
    }
}

/// Scan a template document for data placeholders.
pub fn discover_sources(template: &Value) -> Placeholders {
    let mut found = Placeholders {
        sources: Vec::new(),
        has_unnamed: false,
    };
    discover(template, &mut found);
    found
}

fn discover(value: &Value, found: &mut Placeholders) {
    match value {
        Value::Object(map) => map.values().for_each(|v| discover(v, found)),
        Value::Array(items) => items.iter().for_each(|v| discover(v, found)),
        value => match anchor(value) {
            Some(Anchor::Unnamed) => found.has_unnamed = true,
            Some(Anchor::Named(source)) => {
                if !found.sources.iter().any(|s| s == source) {
                    found.sources.push(source.to_owned());
                }
            }
            None => {}
        },
    }
}

/// Replace every data placeholder with the data points materialized for its
/// source. The unnamed slot is filled from `priority_source`. Every
/// placeholder must have data, or filling fails.
pub fn fill(
    template: &Value,
    data: &IndexMap<String, Vec<DataPoint>>,
    priority_source: Option<&str>,
) -> Result<Value> {
    let mut filled = template.clone();
    substitute(&mut filled, data, priority_source)?;
    Ok(filled)
}

fn substitute(
    value: &mut Value,
    data: &IndexMap<String, Vec<DataPoint>>,
    priority_source: Option<&str>,
) -> Result<()> {
    match value {
        Value::Object(map) => {
            for v in map.values_mut() {
                substitute(v, data, priority_source)?;
            }
        }
        Value::Array(items) => {
            for v in items {
                substitute(v, data, priority_source)?;
            }
        }
        other => {
            let dataset = match anchor(other) {
                Some(Anchor::Unnamed) => {
                    let source = priority_source.ok_or_else(|| missing(DATA_ANCHOR))?;
                    data.get(source).ok_or_else(|| missing(source))?
                }
                Some(Anchor::Named(source)) => data.get(source).ok_or_else(|| missing(source))?,
                None => return Ok(()),
            };
            *other = Value::Array(dataset.iter().cloned().map(Value::Object).collect());
        }
    }
    Ok(())
}

fn missing(source: &str) -> PlotError {
    PlotError::MissingDataSource {
        source_name: source.to_owned(),
    }
}

fn default_content() -> Value {
    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v4.json",
        "title": "",
        "data": {"values": DATA_ANCHOR},
        "mark": {"type": "line"},
        "encoding": {
            "x": {"field": "x", "type": "quantitative"},
            "y": {"field": "y", "type": "quantitative"},
            "color": {"field": data::REVISION_FIELD, "type": "nominal"}
        }
    })
}

/// On-disk storage for visualization templates.
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> TemplateStore {
        TemplateStore { dir: dir.into() }
    }

    /// Path of the built-in default template.
    pub fn default_path(&self) -> PathBuf {
        self.dir.join(DEFAULT_TEMPLATE)
    }

    /// Write the built-in templates if not already present.
    pub fn ensure_defaults(&self) -> Result<()> {
        let path = self.default_path();
        if path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        let file = fs::File::create(&path)?;
        dump(&default_content(), file)
    }

    /// Resolve a template identifier to a path: an existing file path wins,
    /// then a file in the store directory, then the built-in default.
    pub fn resolve(&self, template: Option<&str>) -> Result<PathBuf> {
        let Some(name) = template else {
            self.ensure_defaults()?;
            return Ok(self.default_path());
        };
        let direct = Path::new(name);
        if direct.exists() {
            return Ok(direct.to_path_buf());
        }
        let stored = self.dir.join(name);
        if stored.exists() {
            return Ok(stored);
        }
        Err(PlotError::TemplateNotFound {
            name: name.to_owned(),
        })
    }

    /// Load a template document from a resolved path.
    pub fn load(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Serialize a document the same way every run: four-space indentation and
/// insertion key order, so repeated runs on unchanged input are
/// byte-identical.
pub fn dump(value: &Value, writer: impl Write) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)?;
    Ok(())
}

/// [dump] into a string.
pub fn dump_string(value: &Value) -> Result<String> {
    let mut out = Vec::new();
    dump(value, &mut out)?;
    Ok(String::from_utf8(out).expect("serializer emits utf-8"))
}
