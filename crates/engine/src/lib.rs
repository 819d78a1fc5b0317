//! Precontractual process reconstruction engine.
//!
//! Turns a flat log of timestamped workflow events into per-stage
//! timelines, responsibility-attributed durations and cross-candidate
//! analytics. The pipeline is synchronous and purely in-memory: callers
//! fetch the raw event array, run it through [`CandidateAggregator`],
//! and hand the summaries to a renderer. Nothing here is cached or
//! mutated between runs; every invocation recomputes from source.

pub mod adapter;
pub mod aggregate;
pub mod analytics;
pub mod errors;
pub mod lexicon;
pub mod model;
pub mod stage;

pub use aggregate::{CandidateAggregator, InMemoryPersonDirectory, PersonDirectory};
pub use errors::{EngineError, EngineResult};
pub use lexicon::{VariantKind, VariantLexicon};
pub use model::{CandidateSummary, PhaseBlock, ResponsibilitySegment, StageSummary};
pub use stage::StageProcessor;
