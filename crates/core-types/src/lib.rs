//! Shared leaf types for the precontractual tracking workspace.
//!
//! Everything downstream (registry, engine, CLI) speaks in terms of the
//! canonical [`Event`] record defined here; upstream field-name
//! variations are folded into it at the boundary adapter.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod text;

/// Upstream identifier of a candidate progressing through the workflow.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical lifecycle status shared by events, phase blocks, stages and
/// candidates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Pending,
    InProgress,
    Finalized,
}

impl ProcessStatus {
    pub fn is_finalized(self) -> bool {
        matches!(self, ProcessStatus::Finalized)
    }

    /// Maps an upstream status label onto the canonical enum. Labels are
    /// compared through [`text::normalize`]; anything unrecognized counts
    /// as in progress.
    pub fn from_upstream(label: &str) -> Self {
        let key = text::normalize(label);
        if key.starts_with("finaliz") {
            ProcessStatus::Finalized
        } else if key.is_empty() || key == "pendiente" || key == "sin iniciar" {
            ProcessStatus::Pending
        } else {
            ProcessStatus::InProgress
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessStatus::Pending => "Pendiente",
            ProcessStatus::InProgress => "En proceso",
            ProcessStatus::Finalized => "Finalizada",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One immutable workflow event, already adapted at the system boundary.
/// The engine never mutates these.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub candidate_id: CandidateId,
    pub stage: String,
    /// Phase label carrying its leading order number, e.g. "10 Revisión".
    pub phase: String,
    pub event_type: String,
    pub status: ProcessStatus,
    /// Absent when the upstream timestamp was missing or unparseable.
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default = "default_attempt")]
    pub attempt: u32,
    #[serde(default)]
    pub responsible: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_attempt() -> u32 {
    1
}
