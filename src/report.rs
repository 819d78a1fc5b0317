//! Full report assembly for downstream renderers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use precontrack_engine::analytics::{self, Bottleneck, GroupTotal, Ranking, StageStat};
use precontrack_engine::model::CandidateSummary;
use precontrack_registry::ResponsibleGroup;
use serde::Serialize;

/// Everything a renderer needs from one pipeline run. The report is
/// rebuilt wholesale on every invocation; stale runs are discarded, not
/// merged.
#[derive(Clone, Debug, Serialize)]
pub struct FullReport {
    pub generated_at: DateTime<Utc>,
    pub candidates: Vec<CandidateSummary>,
    pub stage_averages: Vec<StageStat>,
    pub group_totals: Vec<GroupTotal>,
    pub bottlenecks: Vec<Bottleneck>,
    pub ranking: Ranking,
    /// Chart consumers key their series colors by group identity.
    pub group_colors: BTreeMap<ResponsibleGroup, String>,
}

impl FullReport {
    pub fn build(
        candidates: Vec<CandidateSummary>,
        bottleneck_limit: usize,
        ranking_limit: usize,
    ) -> Self {
        let stage_averages = analytics::stage_averages(&candidates);
        let group_totals = analytics::group_totals(&candidates);
        let bottlenecks = analytics::bottlenecks(&candidates, bottleneck_limit);
        let ranking = analytics::ranking(&candidates, ranking_limit);
        let group_colors = ResponsibleGroup::all()
            .into_iter()
            .map(|group| (group, group.color().to_string()))
            .collect();
        Self {
            generated_at: Utc::now(),
            candidates,
            stage_averages,
            group_totals,
            bottlenecks,
            ranking,
            group_colors,
        }
    }
}
