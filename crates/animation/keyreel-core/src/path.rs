//! Attribute paths into a snapshot tree.
//!
//! A path is an ordered list of segments, displayed dotted:
//!   "camera.zoom"             -> ["camera", "zoom"]
//!   "layers.cells.opacity"    -> ["layers", "cells", "opacity"]
//!
//! Segments are kept as a list because layer names are user-chosen and may
//! themselves contain dots; the dotted form is only used for display, config
//! keys and quick construction in code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KeyreelError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AttrPath {
    segments: Vec<String>,
}

impl AttrPath {
    /// Construct from already-split segments. Empty segments are rejected.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, KeyreelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(KeyreelError::InvalidPath {
                reason: "empty path".to_string(),
            });
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(KeyreelError::InvalidPath {
                reason: "empty path segment".to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// Parse a dotted path. Use [`AttrPath::from_segments`] when a segment
    /// contains a dot.
    pub fn parse(s: &str) -> Result<Self, KeyreelError> {
        if s.is_empty() {
            return Err(KeyreelError::InvalidPath {
                reason: "empty path".to_string(),
            });
        }
        Self::from_segments(s.split('.'))
    }

    /// Path of a per-layer attribute: `layers.<layer>.<attribute...>`.
    /// Fails on an empty layer name.
    pub fn layer(layer: &str, attribute: &AttrPath) -> Result<Self, KeyreelError> {
        if layer.is_empty() {
            return Err(KeyreelError::InvalidPath {
                reason: "empty layer name".to_string(),
            });
        }
        let mut segments = Vec::with_capacity(attribute.segments.len() + 2);
        segments.push(crate::schema::LAYERS_ROOT.to_string());
        segments.push(layer.to_string());
        segments.extend(attribute.segments.iter().cloned());
        Ok(Self { segments })
    }

    /// Concatenate two paths.
    pub fn concat(&self, tail: &AttrPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(tail.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; paths have at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    pub fn last(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub(crate) fn from_stack(stack: &[&str]) -> Self {
        Self {
            segments: stack.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl TryFrom<Vec<String>> for AttrPath {
    type Error = KeyreelError;
    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        AttrPath::from_segments(segments)
    }
}

impl From<AttrPath> for Vec<String> {
    fn from(path: AttrPath) -> Self {
        path.segments
    }
}

impl FromStr for AttrPath {
    type Err = KeyreelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttrPath::parse(s)
    }
}
