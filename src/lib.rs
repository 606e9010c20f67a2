//! # pmtraces
//!
//! Batch tools for traces exported as `<prefix>_<group>_<series>_<sweep>_<trace>.npy`
//! with a `.json` sidecar holding units, axis origin, sample spacing and the
//! acquisition parameter tree.
//!
//! The [`data`] layer orders traces by their name fields, rebuilds x-axes,
//! averages sample windows and runs all of it as one all-or-nothing
//! [`BatchPipeline`]. [`report`] prints the results; [`app`] plots them.
//!
//! ```no_run
//! use pmtraces::{BatchPipeline, MetadataEncoding, Operation, PipelineOptions};
//!
//! let pipeline = BatchPipeline::from_files(MetadataEncoding::Utf8);
//! let options = PipelineOptions::new(Operation::Mean { start: 0, end: 100 });
//! for result in pipeline.run(&["PM_1_*_Imon.npy"], &options)? {
//!     println!("{}: {:?}", result.name, result.value);
//! }
//! # Ok::<(), pmtraces::TraceError>(())
//! ```

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod report;
pub mod state;
pub mod ui;

pub use data::axis::build_axis;
pub use data::error::{AxisError, KeyError, TraceError, WindowError};
pub use data::key::{compare, sort_ids, TraceKey};
pub use data::loader::{FileSampleSource, JsonSidecarStore, MetadataEncoding, MetadataStore, SampleSource};
pub use data::model::{CurveSet, Derived, DerivedResult, MetadataRecord, MetadataValue, ParamPath, TraceId};
pub use data::pipeline::{BatchPipeline, GlobCatalog, MemoryCatalog, Operation, PipelineOptions, TraceCatalog};
pub use data::stats::windowed_mean;
