use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use super::error::{Result, TraceError};
use super::model::{MetadataRecord, SampleArray, TraceId};
use super::npy;

// ---------------------------------------------------------------------------
// Text encoding of sidecar files
// ---------------------------------------------------------------------------

/// How sidecar bytes are turned into text before JSON parsing.
///
/// Exported unit strings may contain 8-bit characters (`µ`), so files written
/// by older exporters are not always valid UTF-8. One encoding is chosen per
/// run and applies to every sidecar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetadataEncoding {
    /// Strict UTF-8; invalid bytes are an error.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to one character, never fails.
    Latin1,
}

impl MetadataEncoding {
    pub fn decode(self, bytes: &[u8]) -> std::result::Result<String, std::str::Utf8Error> {
        match self {
            MetadataEncoding::Utf8 => std::str::from_utf8(bytes).map(str::to_string),
            MetadataEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Service traits used by the batch pipeline
// ---------------------------------------------------------------------------

/// Resolves a trace to its metadata record.
pub trait MetadataStore {
    fn load(&self, id: &TraceId) -> Result<MetadataRecord>;
}

/// Resolves a trace to its samples.
pub trait SampleSource {
    fn load(&self, id: &TraceId) -> Result<SampleArray>;
}

// ---------------------------------------------------------------------------
// Filesystem implementations
// ---------------------------------------------------------------------------

/// Reads `<name>.json` next to the sample file.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSidecarStore {
    pub encoding: MetadataEncoding,
}

impl JsonSidecarStore {
    pub fn new(encoding: MetadataEncoding) -> Self {
        Self { encoding }
    }
}

impl MetadataStore for JsonSidecarStore {
    fn load(&self, id: &TraceId) -> Result<MetadataRecord> {
        let path = id.sidecar_path();
        let bytes = std::fs::read(&path).map_err(|e| TraceError::io(&path, e))?;
        let text = self.encoding.decode(&bytes).map_err(|e| {
            TraceError::io(
                &path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        let record: MetadataRecord =
            serde_json::from_str(&text).map_err(|source| TraceError::Json {
                path: path.clone(),
                source,
            })?;
        log::debug!("loaded metadata {} ({} points)", path.display(), record.numpnts);
        Ok(record)
    }
}

/// Reads `.npy` or raw `.bin` sample files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSampleSource;

impl SampleSource for FileSampleSource {
    fn load(&self, id: &TraceId) -> Result<SampleArray> {
        let samples = npy::load_samples(id.path())?;
        log::debug!("loaded {} samples from {id}", samples.len());
        Ok(samples)
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write a trace as `<stem>.npy` plus its `<stem>.json` sidecar.
pub fn write_trace(npy_path: &Path, record: &MetadataRecord, samples: &[f64]) -> Result<()> {
    let file = File::create(npy_path).map_err(|e| TraceError::io(npy_path, e))?;
    let mut out = BufWriter::new(file);
    npy::write_npy(&mut out, samples)
        .and_then(|_| out.flush())
        .map_err(|e| TraceError::io(npy_path, e))?;
    write_sidecar(&npy_path.with_extension("json"), record)
}

/// Write the sidecar JSON (`x_0, delta_x, numpnts, unit_x, unit_y, params`).
pub fn write_sidecar(path: &Path, record: &MetadataRecord) -> Result<()> {
    let doc: JsonValue = json!({
        "x_0": record.x_0,
        "delta_x": record.delta_x,
        "numpnts": record.numpnts,
        "unit_x": record.unit_x,
        "unit_y": record.unit_y,
        "params": record.params,
    });
    let file = File::create(path).map_err(|e| TraceError::io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, &doc).map_err(|source| TraceError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    out.flush().map_err(|e| TraceError::io(path, e))
}
