//! Event-driven YAML reader
//!
//! Open sequences and mappings live on a heap stack, so how deeply a
//! document may nest is bounded by memory only. The result is a JSON value
//! that the tree types then deserialize from.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};
use yaml_rust2::Yaml;
use yaml_rust2::parser::{Event, Parser, Tag};
use yaml_rust2::scanner::TScalarStyle;

use crate::error::{Error, Result};

const CORE_SCHEMA: &str = "tag:yaml.org,2002:";

/// A collection whose end event has not been seen yet.
enum Open {
    Seq {
        anchor: usize,
        items: Vec<Value>,
    },
    Map {
        anchor: usize,
        entries: Map<String, Value>,
        key: Option<String>,
    },
}

/// Parse a single-document YAML stream.
pub(super) fn parse(text: &str) -> Result<Value> {
    let mut parser = Parser::new_from_str(text);
    let mut anchors: HashMap<usize, Value> = HashMap::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut document: Option<Value> = None;

    loop {
        let (event, mark) = parser.next_token()?;
        let line = mark.line();

        let (anchor, value) = match event {
            Event::StreamEnd => break,
            Event::Nothing | Event::StreamStart | Event::DocumentStart | Event::DocumentEnd => {
                continue;
            }
            Event::SequenceStart(anchor, _) => {
                stack.push(Open::Seq {
                    anchor,
                    items: Vec::new(),
                });
                continue;
            }
            Event::MappingStart(anchor, _) => {
                stack.push(Open::Map {
                    anchor,
                    entries: Map::new(),
                    key: None,
                });
                continue;
            }
            Event::SequenceEnd | Event::MappingEnd => match stack.pop() {
                Some(Open::Seq { anchor, items }) => (anchor, Value::Array(items)),
                Some(Open::Map { anchor, entries, .. }) => (anchor, Value::Object(entries)),
                None => {
                    return Err(Error::Validation(format!(
                        "unbalanced collection end at line {}",
                        line
                    )));
                }
            },
            Event::Scalar(text, style, anchor, tag) => (anchor, scalar(text, style, tag.as_ref())?),
            Event::Alias(id) => match anchors.get(&id) {
                Some(value) => (0, value.clone()),
                None => {
                    return Err(Error::Validation(format!("unknown alias at line {}", line)));
                }
            },
        };

        if anchor > 0 {
            anchors.insert(anchor, value.clone());
        }

        match stack.last_mut() {
            Some(Open::Seq { items, .. }) => items.push(value),
            Some(Open::Map { entries, key, .. }) => match key.take() {
                Some(k) => {
                    entries.insert(k, value);
                }
                None => *key = Some(mapping_key(value, line)?),
            },
            None if document.is_none() => document = Some(value),
            None => {
                return Err(Error::Validation(
                    "expected a single document, found more".to_string(),
                ));
            }
        }
    }

    document.ok_or_else(|| Error::Validation("empty document".to_string()))
}

/// Resolve a scalar with the YAML 1.2 core schema. Quoted scalars are
/// always strings.
fn scalar(text: String, style: TScalarStyle, tag: Option<&Tag>) -> Result<Value> {
    if style != TScalarStyle::Plain {
        return Ok(Value::String(text));
    }
    if let Some(tag) = tag {
        if tag.handle != CORE_SCHEMA || tag.suffix == "str" {
            return Ok(Value::String(text));
        }
    }
    match Yaml::from_str(&text) {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::from(i)),
        Yaml::Real(real) => number(real),
        Yaml::String(s) => Ok(Value::String(s)),
        _ => Err(Error::Validation(format!("unsupported scalar '{}'", text))),
    }
}

fn number(real: String) -> Result<Value> {
    // Integers past i64::MAX resolve as reals; keep them exact.
    if let Ok(n) = real.parse::<u64>() {
        return Ok(Value::from(n));
    }
    Yaml::Real(real.clone())
        .into_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| Error::Validation(format!("'{}' is not a finite number", real)))
}

fn mapping_key(key: Value, line: usize) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(_) | Value::Object(_) => Err(Error::Validation(format!(
            "mapping key at line {} is not a scalar",
            line
        ))),
    }
}
