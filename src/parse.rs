//! Parsers for the supported metric file formats.

use crate::errors::{self, PlotError, Result};
use csv::{ReaderBuilder, Trim};
use itertools::Itertools;
use serde_json::{Map, Value};
use std::path::Path;

/// Synthetic column name used for single-column CSV input.
pub const VALUE_FIELD: &str = "value";

/// The supported metric file formats. The set is closed; anything else is
/// rejected up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
    Tsv,
    Yaml,
}

impl Format {
    /// Sniff the format from the file extension, case-insensitively.
    pub fn from_path(path: &str) -> Result<Format> {
        let lower = path.to_lowercase();
        match Path::new(&lower).extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("csv") => Ok(Format::Csv),
            Some("tsv") => Ok(Format::Tsv),
            Some("yaml") => Ok(Format::Yaml),
            _ => Err(PlotError::UnsupportedFormat {
                path: path.to_owned(),
            }),
        }
    }
}

/// Parsed file content before structure extraction: either already a list
/// of records, or an arbitrarily nested mapping.
#[derive(Debug)]
pub struct RawData {
    pub data: Value,
    /// Explicit column order, when the format carries one (CSV header row).
    pub fieldnames: Option<Vec<String>>,
}

/// Parse raw text content of a known format.
///
/// No filesystem access happens here; content is handed in by the caller.
pub fn parse(path: &str, format: Format, content: &str) -> Result<RawData> {
    match format {
        Format::Json => parse_json(path, content),
        Format::Csv => parse_csv(path, content, b','),
        Format::Tsv => parse_csv(path, content, b'\t'),
        Format::Yaml => parse_yaml(path, content),
    }
}

fn parse_json(path: &str, content: &str) -> Result<RawData> {
    let data = serde_json::from_str(content).map_err(|e| errors::parse(path, e))?;
    Ok(RawData {
        data,
        fieldnames: None,
    })
}

fn parse_yaml(path: &str, content: &str) -> Result<RawData> {
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| errors::parse(path, e))?;
    Ok(RawData {
        data: yaml_to_json(path, parsed)?,
        fieldnames: None,
    })
}

fn yaml_to_json(path: &str, value: serde_yaml::Value) -> Result<Value> {
    let converted = match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| errors::parse(path, "non-finite number"))?
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(|v| yaml_to_json(path, v))
                .collect::<Result<_>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    _ => return Err(errors::parse(path, "unsupported mapping key")),
                };
                map.insert(key, yaml_to_json(path, value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(path, tagged.value)?,
    };
    Ok(converted)
}

fn parse_csv(path: &str, content: &str, delimiter: u8) -> Result<RawData> {
    let mut probe = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut rows = probe.records();
    let Some(first) = rows.next() else {
        return Ok(RawData {
            data: Value::Array(Vec::new()),
            fieldnames: None,
        });
    };
    let first = first.map_err(|e| errors::parse(path, e))?;

    // A single-column file has no header row; every row is one bare value.
    if first.len() == 1 {
        let mut points = Vec::new();
        for row in std::iter::once(Ok(first)).chain(rows) {
            let row = row.map_err(|e| errors::parse(path, e))?;
            let cell = row.iter().next().unwrap_or("");
            let mut point = Map::new();
            point.insert(VALUE_FIELD.to_owned(), Value::String(cell.to_owned()));
            points.push(Value::Object(point));
        }
        return Ok(RawData {
            data: Value::Array(points),
            fieldnames: Some(vec![VALUE_FIELD.to_owned()]),
        });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());
    let fieldnames = reader
        .headers()
        .map_err(|e| errors::parse(path, e))?
        .iter()
        .map(str::to_owned)
        .collect_vec();
    let mut points = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| errors::parse(path, e))?;
        let mut point = Map::new();
        for (name, cell) in fieldnames.iter().zip(row.iter()) {
            point.insert(name.clone(), Value::String(cell.to_owned()));
        }
        points.push(Value::Object(point));
    }
    Ok(RawData {
        data: Value::Array(points),
        fieldnames: Some(fieldnames),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path("metric.json").unwrap(), Format::Json);
        assert_eq!(Format::from_path("logs/Loss.CSV").unwrap(), Format::Csv);
        assert_eq!(Format::from_path("metric.tsv").unwrap(), Format::Tsv);
        assert_eq!(Format::from_path("metric.yaml").unwrap(), Format::Yaml);
    }

    #[test]
    fn format_rejects_unknown_extensions() {
        for path in ["metric.txt", "metric", "metric.yml.bak"] {
            assert!(matches!(
                Format::from_path(path),
                Err(PlotError::UnsupportedFormat { .. })
            ));
        }
    }

    #[test]
    fn csv_with_header() {
        let raw = parse("m.csv", Format::Csv, "a,b\n1,10\n2,20\n").unwrap();
        assert_eq!(
            raw.fieldnames,
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(
            raw.data,
            json!([{"a": "1", "b": "10"}, {"a": "2", "b": "20"}])
        );
    }

    #[test]
    fn csv_header_and_cells_are_trimmed() {
        let raw = parse("m.csv", Format::Csv, "a, b\n1, 10\n").unwrap();
        assert_eq!(
            raw.fieldnames,
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(raw.data, json!([{"a": "1", "b": "10"}]));
    }

    #[test]
    fn csv_single_column_has_no_header() {
        let raw = parse("m.csv", Format::Csv, "10\n20\n30\n").unwrap();
        assert_eq!(raw.fieldnames, Some(vec![VALUE_FIELD.to_owned()]));
        assert_eq!(
            raw.data,
            json!([{"value": "10"}, {"value": "20"}, {"value": "30"}])
        );
    }

    #[test]
    fn csv_empty_content() {
        let raw = parse("m.csv", Format::Csv, "").unwrap();
        assert_eq!(raw.fieldnames, None);
        assert_eq!(raw.data, json!([]));
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let raw = parse("m.tsv", Format::Tsv, "a\tb\n1\t10\n").unwrap();
        assert_eq!(
            raw.fieldnames,
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(raw.data, json!([{"a": "1", "b": "10"}]));
    }

    #[test]
    fn json_preserves_key_order() {
        let raw = parse("m.json", Format::Json, r#"[{"b": 1, "a": 2}]"#).unwrap();
        let point = raw.data[0].as_object().unwrap();
        assert_eq!(point.keys().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn json_numbers_stay_numbers() {
        let raw = parse("m.json", Format::Json, r#"[{"x": 1, "y": 2.5}]"#).unwrap();
        assert_eq!(raw.data, json!([{"x": 1, "y": 2.5}]));
    }

    #[test]
    fn yaml_nested_mapping() {
        let raw = parse(
            "m.yaml",
            Format::Yaml,
            "train:\n  metrics:\n    - step: 1\n      loss: 0.5\n",
        )
        .unwrap();
        assert_eq!(
            raw.data,
            json!({"train": {"metrics": [{"step": 1, "loss": 0.5}]}})
        );
    }

    #[test]
    fn yaml_scalar_keys_are_stringified() {
        let raw = parse("m.yaml", Format::Yaml, "1: one\ntrue: yes\n").unwrap();
        let map = raw.data.as_object().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["1", "true"]);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse("m.json", Format::Json, "{not json"),
            Err(PlotError::Parse { .. })
        ));
    }
}
