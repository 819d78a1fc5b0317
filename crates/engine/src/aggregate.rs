//! Candidate-level grouping and rollup.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use precontrack_core_types::{CandidateId, Event, ProcessStatus};
use tracing::warn;

use crate::model::{CandidateSummary, StageSummary};
use crate::stage::StageProcessor;

/// External person directory: candidate id → display name. Resolution
/// failure is answered with a placeholder, never an error.
pub trait PersonDirectory: Send + Sync {
    fn display_name(&self, id: &CandidateId) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryPersonDirectory {
    names: HashMap<String, String>,
}

impl InMemoryPersonDirectory {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }
}

impl PersonDirectory for InMemoryPersonDirectory {
    fn display_name(&self, id: &CandidateId) -> Option<String> {
        self.names.get(&id.0).cloned()
    }
}

/// One candidate's events bucketed by stage, both levels in first-seen
/// order. Only ever built from non-empty event groups.
#[derive(Clone, Debug)]
pub struct CandidateEvents {
    pub candidate_id: CandidateId,
    pub display_name: String,
    pub stages: Vec<(String, Vec<Event>)>,
}

/// Groups raw events per candidate and rolls stage summaries up into
/// candidate summaries.
pub struct CandidateAggregator {
    processor: StageProcessor,
    directory: Arc<dyn PersonDirectory>,
}

impl CandidateAggregator {
    pub fn new(processor: StageProcessor, directory: Arc<dyn PersonDirectory>) -> Self {
        Self {
            processor,
            directory,
        }
    }

    /// Partitions raw events by candidate, then by stage, preserving
    /// first-seen order at both levels. Sorting within a stage is the
    /// stage processor's job, not this layer's.
    pub fn group(&self, raw_events: &[Event]) -> Vec<CandidateEvents> {
        let mut order: Vec<CandidateId> = Vec::new();
        let mut buckets: HashMap<CandidateId, Vec<(String, Vec<Event>)>> = HashMap::new();

        for event in raw_events {
            let stages = buckets.entry(event.candidate_id.clone()).or_insert_with(|| {
                order.push(event.candidate_id.clone());
                Vec::new()
            });
            match stages.iter_mut().find(|(stage, _)| stage == &event.stage) {
                Some((_, bucket)) => bucket.push(event.clone()),
                None => stages.push((event.stage.clone(), vec![event.clone()])),
            }
        }

        order
            .into_iter()
            .map(|id| {
                let stages = buckets.remove(&id).unwrap_or_default();
                let display_name = self
                    .directory
                    .display_name(&id)
                    .unwrap_or_else(|| format!("Candidato {}", id));
                CandidateEvents {
                    candidate_id: id,
                    display_name,
                    stages,
                }
            })
            .collect()
    }

    /// A failure in one stage degrades that stage only; the candidate
    /// keeps its remaining summaries.
    pub fn rollup(&self, candidate: &CandidateEvents) -> CandidateSummary {
        let mut stages = Vec::with_capacity(candidate.stages.len());
        for (stage, events) in &candidate.stages {
            match self.processor.process(stage, events) {
                Ok(summary) => stages.push(summary),
                Err(err) => {
                    warn!(
                        candidate = %candidate.candidate_id,
                        stage = %stage,
                        error = %err,
                        "stage processing failed, emitting empty summary"
                    );
                    stages.push(StageSummary::empty(stage));
                }
            }
        }

        let total_duration_days = stages.iter().map(|s| s.duration_days).sum();
        let mut assigned_totals = BTreeMap::new();
        let mut visible_totals = BTreeMap::new();
        for summary in &stages {
            for (group, days) in &summary.assigned_days {
                *assigned_totals.entry(*group).or_insert(0.0) += days;
            }
            for (group, days) in &summary.visible_days {
                *visible_totals.entry(*group).or_insert(0.0) += days;
            }
        }
        let overall_status = if !stages.is_empty() && stages.iter().all(|s| s.status.is_finalized())
        {
            ProcessStatus::Finalized
        } else {
            ProcessStatus::InProgress
        };

        CandidateSummary {
            candidate_id: candidate.candidate_id.clone(),
            display_name: candidate.display_name.clone(),
            stages,
            total_duration_days,
            assigned_totals,
            visible_totals,
            overall_status,
        }
    }

    /// Full pipeline over one immutable raw event array. Rerunning over
    /// the same input yields identical summaries; nothing is cached.
    pub fn run(&self, raw_events: &[Event]) -> Vec<CandidateSummary> {
        self.group(raw_events)
            .iter()
            .map(|candidate| self.rollup(candidate))
            .collect()
    }
}
