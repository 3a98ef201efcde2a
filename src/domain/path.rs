use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One segment of a field selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Wildcard,
}

/// Dotted field selector into a document (`interfaces.*.status`).
///
/// Field segments descend into mappings; a `*` segment descends into every
/// element of a list (or every entry of a mapping), producing one match per
/// element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::new(input, "path must not be empty"));
        }
        let mut segments = Vec::new();
        for segment in input.split('.') {
            if segment.is_empty() {
                return Err(PathError::new(input, "path has an empty segment"));
            }
            if segment == "*" {
                segments.push(PathSegment::Wildcard);
            } else {
                segments.push(PathSegment::Field(segment.to_string()));
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                formatter.write_str(".")?;
            }
            match segment {
                PathSegment::Field(name) => formatter.write_str(name)?,
                PathSegment::Wildcard => formatter.write_str("*")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid field path `{input}`: {reason}")]
pub struct PathError {
    input: String,
    reason: &'static str,
}

impl PathError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// One concrete match produced by resolving a path, tagged with the rendered
/// location (wildcards replaced by the concrete index or field name).
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub location: String,
    pub value: &'a Value,
}

/// Resolves `path` against `document`. Missing intermediate fields produce an
/// empty result set, never an error, so operators can distinguish "absent"
/// from "present but mismatched".
pub fn resolve<'a>(document: &'a Value, path: &FieldPath) -> Vec<Resolved<'a>> {
    let mut out = Vec::new();
    descend(document, path.segments(), String::new(), &mut out);
    out
}

fn descend<'a>(
    node: &'a Value,
    rest: &[PathSegment],
    location: String,
    out: &mut Vec<Resolved<'a>>,
) {
    let Some((segment, rest)) = rest.split_first() else {
        out.push(Resolved {
            location,
            value: node,
        });
        return;
    };
    match segment {
        PathSegment::Field(name) => {
            if let Value::Object(map) = node
                && let Some(child) = map.get(name)
            {
                descend(child, rest, join(&location, name), out);
            }
        }
        PathSegment::Wildcard => match node {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    descend(item, rest, join(&location, &index.to_string()), out);
                }
            }
            Value::Object(map) => {
                for (key, child) in map {
                    descend(child, rest, join(&location, key), out);
                }
            }
            _ => {}
        },
    }
}

fn join(location: &str, segment: &str) -> String {
    if location.is_empty() {
        segment.to_string()
    } else {
        format!("{location}.{segment}")
    }
}
