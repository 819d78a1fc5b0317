//! Derived view models produced by the pipeline. Always fully
//! recomputed from the source events, never patched incrementally.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use precontrack_core_types::{CandidateId, ProcessStatus};
use precontrack_registry::ResponsibleGroup;
use serde::{Deserialize, Serialize};

use crate::lexicon::VariantKind;

/// One rendered block in a stage timeline: a phase label plus an
/// optional variant sub-classification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseBlock {
    /// Full phase label with its order number, e.g. "10 Revisión".
    pub phase: String,
    pub variant: Option<VariantKind>,
    /// Label shown to consumers; variant blocks read
    /// "Revisión legal · Corrección solicitada".
    pub display_label: String,
    pub status: ProcessStatus,
    pub latest_timestamp: Option<DateTime<Utc>>,
    pub event_count: usize,
    /// Exactly one block per stage matches the most recent event's
    /// phase and variant.
    pub is_current: bool,
}

/// Elapsed time between two chronologically adjacent phase closings,
/// attributed to the arriving phase's responsible group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponsibilitySegment {
    pub from_phase: u32,
    pub to_phase: u32,
    pub elapsed_days: i64,
    /// Elapsed days divided among joint participants, one decimal.
    pub assigned_days: f64,
    pub responsible: String,
    pub group: ResponsibleGroup,
    pub shared: bool,
    pub participants: Vec<ResponsibleGroup>,
}

/// Everything derived for one candidate's stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: String,
    pub status: ProcessStatus,
    pub started_at: Option<DateTime<Utc>>,
    /// `None` while the stage is still open (fewer than two dated
    /// events); the duration then measures start to now.
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_days: i64,
    pub phase_blocks: Vec<PhaseBlock>,
    pub segments: Vec<ResponsibilitySegment>,
    /// Divided share per group; joint phases split the elapsed days.
    pub assigned_days: BTreeMap<ResponsibleGroup, f64>,
    /// Full elapsed days per participating group. Deliberately not
    /// divided: each joint owner sees the whole span.
    pub visible_days: BTreeMap<ResponsibleGroup, f64>,
    pub variant_counters: BTreeMap<VariantKind, usize>,
}

impl StageSummary {
    /// Degraded summary used when processing one stage fails, so the
    /// candidate keeps its other stages.
    pub fn empty(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            status: ProcessStatus::Pending,
            started_at: None,
            ended_at: None,
            duration_days: 0,
            phase_blocks: Vec::new(),
            segments: Vec::new(),
            assigned_days: BTreeMap::new(),
            visible_days: BTreeMap::new(),
            variant_counters: BTreeMap::new(),
        }
    }
}

/// Candidate-level rollup across stages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub candidate_id: CandidateId,
    pub display_name: String,
    pub stages: Vec<StageSummary>,
    pub total_duration_days: i64,
    pub assigned_totals: BTreeMap<ResponsibleGroup, f64>,
    pub visible_totals: BTreeMap<ResponsibleGroup, f64>,
    /// Finalized iff every stage summary is Finalized.
    pub overall_status: ProcessStatus,
}
