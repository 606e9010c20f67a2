use std::collections::BTreeSet;

use glob::Pattern;

use super::axis::build_axis;
use super::error::{Result, TraceError};
use super::key::sort_ids;
use super::loader::{FileSampleSource, JsonSidecarStore, MetadataEncoding, MetadataStore, SampleSource};
use super::model::{Derived, DerivedResult, MetadataRecord, MetadataValue, ParamPath, TraceId};
use super::stats::windowed_mean;

/// Extensions of files that hold samples. Sidecars and anything else a broad
/// pattern picks up are ignored.
pub const SAMPLE_EXTENSIONS: [&str; 2] = ["npy", "bin"];

// ---------------------------------------------------------------------------
// Identifier namespace
// ---------------------------------------------------------------------------

/// Expands one shell-style pattern into trace identifiers.
pub trait TraceCatalog {
    fn expand(&self, pattern: &str) -> Result<Vec<TraceId>>;
}

/// Expands patterns against the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobCatalog;

impl TraceCatalog for GlobCatalog {
    fn expand(&self, pattern: &str) -> Result<Vec<TraceId>> {
        let paths = glob::glob(pattern).map_err(|source| TraceError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut result = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                TraceError::io(path, e.into_error())
            })?;
            if path.is_file() && has_sample_extension(&path) {
                result.push(TraceId::new(path));
            }
        }
        Ok(result)
    }
}

fn has_sample_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SAMPLE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// A fixed set of identifiers matched with the same pattern syntax.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    ids: Vec<TraceId>,
}

impl MemoryCatalog {
    pub fn new(ids: impl IntoIterator<Item = TraceId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl TraceCatalog for MemoryCatalog {
    fn expand(&self, pattern: &str) -> Result<Vec<TraceId>> {
        let compiled = Pattern::new(pattern).map_err(|source| TraceError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(self
            .ids
            .iter()
            .filter(|id| compiled.matches_path(id.path()))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to compute for every trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Mean over the half-open sample window `[start, end)`.
    Mean { start: i64, end: i64 },
    /// Reconstructed x-axis paired with the samples, for plotting or dumping.
    Curve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub operation: Operation,
    /// Order traces by [`TraceKey`](super::key::TraceKey) before processing.
    pub sort: bool,
    /// Auxiliary value reported next to each mean. Must exist when set.
    pub param: Option<ParamPath>,
}

impl PipelineOptions {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            sort: true,
            param: None,
        }
    }
}

// ---------------------------------------------------------------------------
// BatchPipeline
// ---------------------------------------------------------------------------

/// Expand → deduplicate → sort → load → compute, for one batch of patterns.
///
/// The pipeline holds no state between runs. Any error aborts the whole batch
/// and nothing is returned.
pub struct BatchPipeline<C, M, S> {
    catalog: C,
    metadata: M,
    samples: S,
}

impl BatchPipeline<GlobCatalog, JsonSidecarStore, FileSampleSource> {
    /// Pipeline over `.npy`/`.bin` files with `.json` sidecars on disk.
    pub fn from_files(encoding: MetadataEncoding) -> Self {
        BatchPipeline::new(GlobCatalog, JsonSidecarStore::new(encoding), FileSampleSource)
    }
}

impl<C: TraceCatalog, M: MetadataStore, S: SampleSource> BatchPipeline<C, M, S> {
    pub fn new(catalog: C, metadata: M, samples: S) -> Self {
        Self {
            catalog,
            metadata,
            samples,
        }
    }

    /// Union of all pattern matches, first occurrence wins.
    pub fn resolve<P: AsRef<str>>(&self, patterns: &[P]) -> Result<Vec<TraceId>> {
        if patterns.is_empty() {
            return Err(TraceError::Usage("at least one pattern is required".into()));
        }

        let mut seen = BTreeSet::new();
        let mut ids = Vec::new();
        for pattern in patterns {
            let matches = self.catalog.expand(pattern.as_ref())?;
            log::debug!("pattern '{}' matched {} traces", pattern.as_ref(), matches.len());
            for id in matches {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }

        if ids.is_empty() {
            return Err(TraceError::NoMatch {
                patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            });
        }
        Ok(ids)
    }

    /// Run one batch and return results in processing order.
    pub fn run<P: AsRef<str>>(
        &self,
        patterns: &[P],
        options: &PipelineOptions,
    ) -> Result<Vec<DerivedResult>> {
        let mut ids = self.resolve(patterns)?;
        if options.sort {
            sort_ids(&mut ids)?;
        }

        let results = ids
            .iter()
            .map(|id| self.process(id, options))
            .collect::<Result<Vec<_>>>()?;

        log::info!("processed {} traces", results.len());
        Ok(results)
    }

    fn process(&self, id: &TraceId, options: &PipelineOptions) -> Result<DerivedResult> {
        let record = self.metadata.load(id)?;
        let samples = self.samples.load(id)?;
        if record.numpnts < 0 || samples.len() != record.numpnts as usize {
            log::warn!(
                "{id}: metadata announces {} points but {} samples were loaded",
                record.numpnts,
                samples.len()
            );
        }

        let value = match options.operation {
            Operation::Mean { start, end } => {
                let param = match &options.param {
                    Some(path) => Some(lookup_param(id, &record, path)?),
                    None => None,
                };
                let value = windowed_mean(&samples, start, end).map_err(|source| {
                    TraceError::Index {
                        identifier: id.to_string(),
                        source,
                    }
                })?;
                Derived::Mean { value, param }
            }
            Operation::Curve => {
                let x = build_axis(&record).map_err(|e| TraceError::InvalidMetadata {
                    identifier: id.to_string(),
                    reason: e.to_string(),
                })?;
                Derived::Curve { x, y: samples }
            }
        };

        Ok(DerivedResult {
            id: id.clone(),
            name: id.display_name(),
            unit_x: record.unit_x,
            unit_y: record.unit_y,
            value,
        })
    }
}

fn lookup_param(
    id: &TraceId,
    record: &MetadataRecord,
    path: &ParamPath,
) -> Result<MetadataValue> {
    record
        .param(path)
        .ok_or_else(|| TraceError::InvalidMetadata {
            identifier: id.to_string(),
            reason: format!("parameter '{path}' not found"),
        })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::data::model::SampleArray;

    /// In-memory store that counts loads per identifier.
    #[derive(Default)]
    struct Memory {
        traces: BTreeMap<TraceId, (MetadataRecord, SampleArray)>,
        loads: RefCell<BTreeMap<TraceId, usize>>,
    }

    impl Memory {
        fn with(mut self, name: &str, sweep_time: f64, samples: &[f64]) -> Self {
            let record = MetadataRecord {
                unit_x: "s".into(),
                unit_y: "A".into(),
                x_0: 0.0,
                delta_x: 1.0,
                numpnts: samples.len() as i64,
                params: json!({ "sweep": { "Rel. Sweep Time": sweep_time } }),
            };
            self.traces
                .insert(TraceId::from(name), (record, samples.to_vec()));
            self
        }

        fn catalog(&self) -> MemoryCatalog {
            MemoryCatalog::new(self.traces.keys().cloned())
        }

        fn get(&self, id: &TraceId) -> Result<&(MetadataRecord, SampleArray)> {
            self.traces.get(id).ok_or_else(|| {
                TraceError::io(
                    id.path(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such trace"),
                )
            })
        }
    }

    impl MetadataStore for &Memory {
        fn load(&self, id: &TraceId) -> Result<MetadataRecord> {
            *self.loads.borrow_mut().entry(id.clone()).or_default() += 1;
            Ok(self.get(id)?.0.clone())
        }
    }

    impl SampleSource for &Memory {
        fn load(&self, id: &TraceId) -> Result<SampleArray> {
            Ok(self.get(id)?.1.clone())
        }
    }

    fn fixture() -> Memory {
        Memory::default()
            .with("PM_1_2_1_Imon", 2.0, &[1.0, 2.0, 3.0, 4.0])
            .with("PM_1_1_1_Imon", 1.0, &[1.0, 2.0, 3.0, 4.0, 5.0])
            .with("PM_2_1_1_Imon", 3.0, &[10.0, 20.0, 30.0])
            .with("PM_1_1_1_Vmon", 1.0, &[-1.0, -1.0, -1.0])
    }

    fn mean_options(start: i64, end: i64) -> PipelineOptions {
        PipelineOptions {
            operation: Operation::Mean { start, end },
            sort: true,
            param: Some(ParamPath::default()),
        }
    }

    fn names(results: &[DerivedResult]) -> Vec<&str> {
        results.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn sorted_means_with_sweep_time() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        let results = pipeline.run(&["PM_*_Imon"], &mean_options(0, 3)).unwrap();

        assert_eq!(names(&results), ["PM_1_1_1_Imon", "PM_1_2_1_Imon", "PM_2_1_1_Imon"]);
        assert_eq!(
            results[0].value,
            Derived::Mean {
                value: 2.0,
                param: Some(MetadataValue::Float(1.0))
            }
        );
        assert_eq!(
            results[2].value,
            Derived::Mean {
                value: 20.0,
                param: Some(MetadataValue::Float(3.0))
            }
        );
    }

    #[test]
    fn unsorted_keeps_pattern_order() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        let mut options = mean_options(0, 1);
        options.sort = false;
        let results = pipeline
            .run(&["PM_2_*", "PM_1_2_*", "PM_1_1_1_Imon"], &options)
            .unwrap();
        assert_eq!(names(&results), ["PM_2_1_1_Imon", "PM_1_2_1_Imon", "PM_1_1_1_Imon"]);
    }

    #[test]
    fn overlapping_patterns_load_each_trace_once() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        let results = pipeline
            .run(&["PM_1_*", "PM_*_Imon", "PM_1_1_1_Imon"], &mean_options(0, 2))
            .unwrap();

        assert_eq!(results.len(), 4);
        assert!(mem.loads.borrow().values().all(|&n| n == 1));
    }

    #[test]
    fn no_match_is_an_error() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        match pipeline.run(&["XY_*", "PM_9_*"], &mean_options(0, 1)) {
            Err(TraceError::NoMatch { patterns }) => assert_eq!(patterns, ["XY_*", "PM_9_*"]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(mem.loads.borrow().is_empty());
    }

    #[test]
    fn empty_pattern_list_is_usage_error() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        let none: [&str; 0] = [];
        assert!(matches!(
            pipeline.run(&none, &mean_options(0, 1)),
            Err(TraceError::Usage(_))
        ));
    }

    #[test]
    fn window_past_any_trace_fails_whole_batch() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        match pipeline.run(&["PM_*_Imon"], &mean_options(0, 4)) {
            Err(TraceError::Index { identifier, .. }) => assert_eq!(identifier, "PM_2_1_1_Imon"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unparseable_name_fails_sorted_batch_only() {
        let mem = fixture().with("PM_1_1_Imon", 0.0, &[1.0, 2.0]);
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        assert!(matches!(
            pipeline.run(&["PM_*"], &mean_options(0, 1)),
            Err(TraceError::Parse { .. })
        ));

        let mut options = mean_options(0, 1);
        options.sort = false;
        assert_eq!(pipeline.run(&["PM_*"], &options).unwrap().len(), 5);
    }

    #[test]
    fn missing_param_is_invalid_metadata() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        let mut options = mean_options(0, 1);
        options.param = Some(ParamPath::parse("series/Label"));
        assert!(matches!(
            pipeline.run(&["PM_1_1_1_Imon"], &options),
            Err(TraceError::InvalidMetadata { .. })
        ));

        options.param = None;
        let results = pipeline.run(&["PM_1_1_1_Imon"], &options).unwrap();
        assert_eq!(
            results[0].value,
            Derived::Mean {
                value: 1.0,
                param: None
            }
        );
    }

    #[test]
    fn curves_carry_axis_and_samples() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        let results = pipeline
            .run(&["PM_2_1_1_Imon"], &PipelineOptions::new(Operation::Curve))
            .unwrap();
        assert_eq!(
            results[0].value,
            Derived::Curve {
                x: vec![0.0, 1.5, 3.0],
                y: vec![10.0, 20.0, 30.0]
            }
        );
        assert_eq!(results[0].unit_x, "s");
    }

    #[test]
    fn bad_axis_metadata_is_reported() {
        let mut mem = fixture();
        if let Some((record, _)) = mem.traces.get_mut(&TraceId::from("PM_2_1_1_Imon")) {
            record.numpnts = 0;
        }
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        match pipeline.run(&["PM_*"], &PipelineOptions::new(Operation::Curve)) {
            Err(TraceError::InvalidMetadata { identifier, .. }) => {
                assert_eq!(identifier, "PM_2_1_1_Imon")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn corrupt_point_count_is_invalid_metadata() {
        let mut mem = fixture();
        if let Some((record, _)) = mem.traces.get_mut(&TraceId::from("PM_1_1_1_Vmon")) {
            record.numpnts = 1 << 62;
        }
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        match pipeline.run(&["PM_1_1_1_*"], &PipelineOptions::new(Operation::Curve)) {
            Err(TraceError::InvalidMetadata { identifier, reason }) => {
                assert_eq!(identifier, "PM_1_1_1_Vmon");
                assert!(reason.contains("cannot allocate"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        let options = mean_options(0, 2);
        let first = pipeline.run(&["PM_*"], &options).unwrap();
        let second = pipeline.run(&["PM_*"], &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_pattern_is_reported() {
        let mem = fixture();
        let pipeline = BatchPipeline::new(mem.catalog(), &mem, &mem);
        assert!(matches!(
            pipeline.run(&["PM_[1"], &mean_options(0, 1)),
            Err(TraceError::Pattern { .. })
        ));
    }
}
