//! Cross-candidate analytics. Pure functions over freshly computed
//! candidate summaries; no caching, no mutation of the inputs, and
//! well-defined empty results on an empty candidate set.

use std::collections::{BTreeMap, HashMap};

use precontrack_core_types::{CandidateId, ProcessStatus};
use precontrack_registry::ResponsibleGroup;
use serde::{Deserialize, Serialize};

use crate::model::CandidateSummary;

pub const DEFAULT_BOTTLENECKS: usize = 5;
pub const DEFAULT_RANKING: usize = 10;

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Duration statistics for one raw stage name across all candidates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageStat {
    pub stage: String,
    pub average_days: f64,
    pub max_days: i64,
    pub min_days: i64,
    pub sample_count: usize,
}

/// Flattens stage summaries grouped by raw stage name, in first-seen
/// order across the candidate list.
pub fn stage_averages(candidates: &[CandidateSummary]) -> Vec<StageStat> {
    let mut order: Vec<String> = Vec::new();
    let mut samples: HashMap<String, Vec<i64>> = HashMap::new();

    for candidate in candidates {
        for stage in &candidate.stages {
            let bucket = samples.entry(stage.stage.clone()).or_insert_with(|| {
                order.push(stage.stage.clone());
                Vec::new()
            });
            bucket.push(stage.duration_days);
        }
    }

    order
        .into_iter()
        .map(|stage| {
            let durations = samples.remove(&stage).unwrap_or_default();
            let sample_count = durations.len();
            let sum: i64 = durations.iter().sum();
            let average_days = if sample_count == 0 {
                0.0
            } else {
                round_tenth(sum as f64 / sample_count as f64)
            };
            StageStat {
                stage,
                average_days,
                max_days: durations.iter().max().copied().unwrap_or(0),
                min_days: durations.iter().min().copied().unwrap_or(0),
                sample_count,
            }
        })
        .collect()
}

/// Assigned-day totals per responsible group, with how many candidates
/// contributed to each.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupTotal {
    pub group: ResponsibleGroup,
    pub total_assigned_days: f64,
    pub candidate_count: usize,
    pub average_days_per_case: f64,
}

pub fn group_totals(candidates: &[CandidateSummary]) -> Vec<GroupTotal> {
    let mut totals: BTreeMap<ResponsibleGroup, (f64, usize)> = BTreeMap::new();
    for candidate in candidates {
        for (group, days) in &candidate.assigned_totals {
            let entry = totals.entry(*group).or_insert((0.0, 0));
            entry.0 += days;
            entry.1 += 1;
        }
    }
    totals
        .into_iter()
        .map(|(group, (total, count))| GroupTotal {
            group,
            total_assigned_days: round_tenth(total),
            candidate_count: count,
            average_days_per_case: if count == 0 {
                0.0
            } else {
                round_tenth(total / count as f64)
            },
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Moderate,
}

impl Severity {
    /// Fixed thresholds over the average stage duration in days.
    pub fn for_average(days: f64) -> Self {
        if days > 20.0 {
            Severity::Critical
        } else if days > 15.0 {
            Severity::High
        } else {
            Severity::Moderate
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bottleneck {
    pub stage: String,
    pub average_days: f64,
    pub sample_count: usize,
    pub severity: Severity,
}

/// Slowest stages by average duration, tagged with severity.
pub fn bottlenecks(candidates: &[CandidateSummary], limit: usize) -> Vec<Bottleneck> {
    let mut stats = stage_averages(candidates);
    stats.sort_by(|a, b| b.average_days.total_cmp(&a.average_days));
    stats
        .into_iter()
        .take(limit)
        .map(|stat| Bottleneck {
            severity: Severity::for_average(stat.average_days),
            stage: stat.stage,
            average_days: stat.average_days,
            sample_count: stat.sample_count,
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankingEntry {
    pub candidate_id: CandidateId,
    pub display_name: String,
    pub total_duration_days: i64,
    pub overall_status: ProcessStatus,
}

impl RankingEntry {
    fn from_summary(summary: &CandidateSummary) -> Self {
        Self {
            candidate_id: summary.candidate_id.clone(),
            display_name: summary.display_name.clone(),
            total_duration_days: summary.total_duration_days,
            overall_status: summary.overall_status,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ranking {
    /// Slowest candidates overall, descending by total duration.
    pub slowest: Vec<RankingEntry>,
    /// Fastest candidates among the finalized ones, ascending.
    pub fastest_finalized: Vec<RankingEntry>,
}

pub fn ranking(candidates: &[CandidateSummary], limit: usize) -> Ranking {
    let mut slowest: Vec<&CandidateSummary> = candidates.iter().collect();
    slowest.sort_by(|a, b| b.total_duration_days.cmp(&a.total_duration_days));

    let mut fastest: Vec<&CandidateSummary> = candidates
        .iter()
        .filter(|c| c.overall_status.is_finalized())
        .collect();
    fastest.sort_by(|a, b| a.total_duration_days.cmp(&b.total_duration_days));

    Ranking {
        slowest: slowest
            .into_iter()
            .take(limit)
            .map(RankingEntry::from_summary)
            .collect(),
        fastest_finalized: fastest
            .into_iter()
            .take(limit)
            .map(RankingEntry::from_summary)
            .collect(),
    }
}
