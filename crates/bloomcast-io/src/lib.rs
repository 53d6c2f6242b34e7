//! File I/O, validation, and serialization for the bloomcast pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, ObservationSet};
pub use error::IoError;
pub use reader::ObservationReader;
pub use writer::{
    CandidateSummary, FoldSummary, ParamSet, Partition, PartitionMetrics, ResultWriter,
    TuningReport,
};
