//! A small structural query language for locating records inside nested
//! documents, e.g. `$.train.metrics[*].loss`.

use crate::errors::{PlotError, Result};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Step {
    Key(String),
    Index(usize),
    Wildcard,
}

/// A parsed query path.
///
/// Grammar: an optional leading `$`, then any number of steps of the form
/// `.key`, `.*`, `[index]`, `[*]` or `['key']`.
#[derive(Clone, Debug)]
pub struct QueryPath {
    steps: Vec<Step>,
}

/// One value matched by a query, together with the mapping key the final
/// step resolved through (`None` when the value sits in a list).
#[derive(Debug)]
pub struct Match<'a> {
    pub value: &'a Value,
    pub field: Option<String>,
}

impl QueryPath {
    pub fn parse(expr: &str) -> Result<QueryPath> {
        let mut steps = Vec::new();
        let mut rest = expr.strip_prefix('$').unwrap_or(expr);
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('.') {
                if let Some(tail) = tail.strip_prefix('*') {
                    steps.push(Step::Wildcard);
                    rest = tail;
                } else {
                    let end = tail.find(['.', '[']).unwrap_or(tail.len());
                    let key = &tail[..end];
                    if key.is_empty() {
                        return Err(bad_path(expr, "empty key segment"));
                    }
                    steps.push(Step::Key(key.to_owned()));
                    rest = &tail[end..];
                }
            } else if let Some(tail) = rest.strip_prefix('[') {
                let end = tail
                    .find(']')
                    .ok_or_else(|| bad_path(expr, "unterminated '['"))?;
                let inner = tail[..end].trim();
                if inner == "*" {
                    steps.push(Step::Wildcard);
                } else if let Some(key) = inner
                    .strip_prefix('\'')
                    .and_then(|k| k.strip_suffix('\''))
                {
                    steps.push(Step::Key(key.to_owned()));
                } else {
                    let index = inner
                        .parse()
                        .map_err(|_| bad_path(expr, "expected an index, '*' or a quoted key"))?;
                    steps.push(Step::Index(index));
                }
                rest = &tail[end + 1..];
            } else {
                return Err(bad_path(expr, "expected '.' or '['"));
            }
        }
        if steps.is_empty() {
            return Err(bad_path(expr, "empty path"));
        }
        Ok(QueryPath { steps })
    }

    /// Every value the path selects in `root`, in document order.
    pub fn find<'a>(&self, root: &'a Value) -> Vec<Match<'a>> {
        let mut matches = Vec::new();
        collect(root, &self.steps, None, &mut matches);
        matches
    }
}

fn bad_path(expr: &str, reason: &str) -> PlotError {
    PlotError::Structure {
        reason: format!("invalid query path '{expr}': {reason}"),
    }
}

fn collect<'a>(value: &'a Value, steps: &[Step], field: Option<&str>, out: &mut Vec<Match<'a>>) {
    let Some((step, rest)) = steps.split_first() else {
        out.push(Match {
            value,
            field: field.map(str::to_owned),
        });
        return;
    };
    match step {
        Step::Key(key) => {
            if let Some(next) = value.as_object().and_then(|map| map.get(key)) {
                collect(next, rest, Some(key), out);
            }
        }
        Step::Index(index) => {
            if let Some(next) = value.as_array().and_then(|items| items.get(*index)) {
                collect(next, rest, None, out);
            }
        }
        Step::Wildcard => match value {
            Value::Object(map) => {
                for (key, next) in map {
                    collect(next, rest, Some(key), out);
                }
            }
            Value::Array(items) => {
                for next in items {
                    collect(next, rest, None, out);
                }
            }
            _ => {}
        },
    }
}
