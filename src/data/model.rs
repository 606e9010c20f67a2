use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::key::TraceKey;

// ---------------------------------------------------------------------------
// TraceId – the opaque name of one exported trace
// ---------------------------------------------------------------------------

/// Identifier of a trace, normally the path of its sample file
/// (`data/PM_1_1_1_Imon.npy`). Only the base name carries structure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraceId(PathBuf);

impl TraceId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TraceId(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Final path component with the extension stripped, used as label.
    pub fn display_name(&self) -> String {
        self.0
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path of the sidecar metadata file (`.json` next to the samples).
    pub fn sidecar_path(&self) -> PathBuf {
        self.0.with_extension("json")
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for TraceId {
    fn from(s: &str) -> Self {
        TraceId::new(s)
    }
}

// ---------------------------------------------------------------------------
// MetadataValue – a scalar pulled out of the nested `params` tree
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value. Must be `Ord` so it can live in
/// `BTreeSet`s for the viewer's filter panel.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&JsonValue> for MetadataValue {
    fn from(val: &JsonValue) -> Self {
        match val {
            JsonValue::String(s) => MetadataValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MetadataValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    MetadataValue::Float(f)
                } else {
                    MetadataValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => MetadataValue::Bool(*b),
            JsonValue::Null => MetadataValue::Null,
            other => MetadataValue::String(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// ParamPath – where to find an auxiliary field inside `params`
// ---------------------------------------------------------------------------

/// A `/`-separated path into the `params` tree, e.g. `sweep/Rel. Sweep Time`.
/// Segments may contain spaces and dots; they are matched verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamPath(Vec<String>);

impl ParamPath {
    pub fn parse(s: &str) -> Self {
        ParamPath(s.split('/').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl Default for ParamPath {
    fn default() -> Self {
        ParamPath::parse("sweep/Rel. Sweep Time")
    }
}

impl fmt::Display for ParamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

// ---------------------------------------------------------------------------
// MetadataRecord – contents of the `.json` sidecar
// ---------------------------------------------------------------------------

/// Acquisition parameters of one trace. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetadataRecord {
    pub unit_x: String,
    pub unit_y: String,
    pub x_0: f64,
    pub delta_x: f64,
    /// Intended axis length. Signed so that corrupt files surface as
    /// `InvalidMetadata` instead of a deserialization error.
    pub numpnts: i64,
    #[serde(default)]
    pub params: JsonValue,
}

impl MetadataRecord {
    /// Look up a scalar inside `params`. Returns `None` if any segment is
    /// missing or an intermediate node is not an object.
    pub fn param(&self, path: &ParamPath) -> Option<MetadataValue> {
        let mut node = &self.params;
        for seg in path.segments() {
            node = node.as_object()?.get(seg)?;
        }
        Some(MetadataValue::from(node))
    }
}

// ---------------------------------------------------------------------------
// Samples and derived results
// ---------------------------------------------------------------------------

/// Samples of one trace. Length is not tied to `numpnts`.
pub type SampleArray = Vec<f64>;

/// The value computed for one trace.
#[derive(Debug, Clone, PartialEq)]
pub enum Derived {
    /// Windowed mean plus the optional auxiliary parameter printed next to it.
    Mean {
        value: f64,
        param: Option<MetadataValue>,
    },
    /// Reconstructed x-axis and the raw samples.
    Curve { x: Vec<f64>, y: SampleArray },
}

/// One entry of the ordered pipeline output.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedResult {
    pub id: TraceId,
    /// Base name of the identifier, used as label.
    pub name: String,
    pub unit_x: String,
    pub unit_y: String,
    pub value: Derived,
}

// ---------------------------------------------------------------------------
// CurveSet – pipeline output prepared for the viewer
// ---------------------------------------------------------------------------

/// One plotted trace.
#[derive(Debug, Clone)]
pub struct Curve {
    pub name: String,
    pub x: Vec<f64>,
    pub y: SampleArray,
    /// Key fields (`group`, `series`, `sweep`, `trace`) used by the filter panel.
    /// Empty when the name does not parse as a trace key.
    pub fields: BTreeMap<String, MetadataValue>,
}

/// All curves of one batch, in pipeline order, with per-field indices.
#[derive(Debug, Clone)]
pub struct CurveSet {
    pub curves: Vec<Curve>,
    pub column_names: Vec<String>,
    pub unique_values: BTreeMap<String, BTreeSet<MetadataValue>>,
    /// Axis units of the last trace in the batch.
    pub unit_x: String,
    pub unit_y: String,
}

impl CurveSet {
    /// Keep the curve results of a batch; other results are skipped.
    pub fn from_results(results: Vec<DerivedResult>) -> Self {
        let mut unit_x = String::new();
        let mut unit_y = String::new();
        let mut curves = Vec::with_capacity(results.len());

        for result in results {
            let Derived::Curve { x, y } = result.value else {
                continue;
            };
            let fields = TraceKey::parse_name(&result.name)
                .map(|key| key_fields(&key))
                .unwrap_or_default();
            unit_x = result.unit_x;
            unit_y = result.unit_y;
            curves.push(Curve {
                name: result.name,
                x,
                y,
                fields,
            });
        }

        let mut unique_values: BTreeMap<String, BTreeSet<MetadataValue>> = BTreeMap::new();
        for curve in &curves {
            for (col, val) in &curve.fields {
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        let column_names = unique_values.keys().cloned().collect();

        CurveSet {
            curves,
            column_names,
            unique_values,
            unit_x,
            unit_y,
        }
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

fn key_fields(key: &TraceKey) -> BTreeMap<String, MetadataValue> {
    BTreeMap::from([
        ("group".to_string(), MetadataValue::Integer(key.group)),
        ("series".to_string(), MetadataValue::Integer(key.series)),
        ("sweep".to_string(), MetadataValue::Integer(key.sweep)),
        ("trace".to_string(), MetadataValue::String(key.trace.clone())),
    ])
}
