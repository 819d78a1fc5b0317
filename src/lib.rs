//! precontrack library facade.
//!
//! Re-exports the engine crates and the report assembly used by the CLI
//! and by integration tests.

pub mod report;

pub use precontrack_core_types as core_types;
pub use precontrack_engine as engine;
pub use precontrack_registry as registry;
