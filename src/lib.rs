//! Trellis optimizer driver: pass registry, pass manager and error type.

pub mod errors;
pub mod pipeline;

pub use errors::{TrellisError, TrellisResult};
pub use pipeline::{
    DeadCodeElimination, Pass, PassManager, PassRegistry, PassStats, PipelineReport,
    load_program, verify,
};
