//! Static responsibility reference data for the precontractual workflow.
//!
//! Maps (stage, phase number) pairs onto the organizational units that
//! own them. The table is compiled in; consumers receive an explicit
//! [`ResponsibilityRegistry`] instance so tests can substitute their own
//! entries.

pub mod api;
pub mod model;

pub use api::ResponsibilityRegistry;
pub use model::{OwnershipEntry, PhaseOwners, ResponsibleGroup, JOINT_SEPARATOR};
