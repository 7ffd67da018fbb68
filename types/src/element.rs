//! Stage, property and link definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a stage within a pipeline. Used as the GStreamer element name.
pub type StageId = String;

/// A single processing stage: one GStreamer element created from a factory name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Unique identifier for this stage
    pub id: StageId,
    /// GStreamer element factory (e.g., "filesrc", "nvinfer", "qtmux")
    pub factory: String,
    /// Properties applied in order before the pipeline is activated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<(String, PropertyValue)>,
}

impl StageSpec {
    /// Create a stage with no properties.
    pub fn new(id: impl Into<String>, factory: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            factory: factory.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property (builder style).
    pub fn property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    /// Look up the last value set for a property.
    pub fn get_property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Property value that can be various types.
///
/// GStreamer properties can be strings, numbers, booleans, enums, etc.
/// Enums and flags are given as strings and parsed by GStreamer.
///
/// The JSON form is untagged, so any integer that fits an `i64` reads back
/// as `Int`, including one written from `UInt`. Both are converted to the
/// property's own type when applied, so the two behave the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Int(i64::from(i))
    }
}

impl From<u64> for PropertyValue {
    fn from(u: u64) -> Self {
        PropertyValue::UInt(u)
    }
}

impl From<u32> for PropertyValue {
    fn from(u: u32) -> Self {
        PropertyValue::UInt(u64::from(u))
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// A reference to a stage, optionally narrowed to one of its pads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadRef {
    pub stage_id: StageId,
    pub pad_name: Option<String>,
}

impl PadRef {
    /// Parse `stage` or `stage:pad`.
    ///
    /// Splits from the right, so stage ids may themselves contain colons.
    pub fn parse(spec: &str) -> Self {
        match spec.rsplit_once(':') {
            Some((stage, pad)) if !stage.is_empty() && !pad.is_empty() => Self {
                stage_id: stage.to_string(),
                pad_name: Some(pad.to_string()),
            },
            _ => Self {
                stage_id: spec.to_string(),
                pad_name: None,
            },
        }
    }
}

impl fmt::Display for PadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pad_name {
            Some(pad) => write!(f, "{}:{}", self.stage_id, pad),
            None => write!(f, "{}", self.stage_id),
        }
    }
}

/// A link between two stage pads known at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Source stage and pad (format: "stage_id" or "stage_id:pad_name")
    pub from: String,
    /// Destination stage and pad (format: "stage_id" or "stage_id:pad_name")
    pub to: String,
}

impl Link {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Convert both ends into structured pad references.
    pub fn to_pad_refs(&self) -> (PadRef, PadRef) {
        (PadRef::parse(&self.from), PadRef::parse(&self.to))
    }
}
