pub mod compiler;
pub mod config;
pub mod errors;
pub mod fdr;
pub mod filter;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod scoring;

pub use compiler::ingest::{
    InputSource,
    IngestSummary,
    ingest_sources,
};
pub use compiler::{
    Compiler,
    PsmRecord,
};
pub use config::AnalysisConfig;
pub use errors::{
    ProtInferError,
    Result,
};
pub use inference::{
    InferenceMethod,
    InferenceParams,
    InferenceStrategy,
};
pub use models::ReportProtein;
pub use pipeline::{
    AnalysisReport,
    run_analysis,
};
pub use scoring::{
    ScoringStrategy,
    SpectraPolicy,
};
