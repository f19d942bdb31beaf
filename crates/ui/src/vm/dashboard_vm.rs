use services::DashboardOverview;
use strand_core::model::{AssessmentId, StrandResults};

#[derive(Clone, Debug, PartialEq)]
pub enum DashboardVm {
    NotStarted,
    InProgress {
        assessment_id: AssessmentId,
        progress: u8,
    },
    Completed(ResultsVm),
}

impl DashboardVm {
    #[must_use]
    pub fn from_overview(overview: &DashboardOverview) -> Self {
        match overview {
            DashboardOverview::NotStarted => Self::NotStarted,
            DashboardOverview::InProgress {
                assessment_id,
                progress,
            } => Self::InProgress {
                assessment_id: *assessment_id,
                progress: progress.rounded(),
            },
            DashboardOverview::Completed {
                assessment_id,
                results,
            } => Self::Completed(ResultsVm::new(*assessment_id, results)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreRowVm {
    pub strand: String,
    pub score: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborRowVm {
    pub rank: usize,
    pub strand: String,
    pub distance: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResultsVm {
    pub assessment_id: AssessmentId,
    pub strand: String,
    pub description: String,
    pub dataset: String,
    pub taken_on: Option<String>,
    pub scores: Vec<ScoreRowVm>,
    /// Tie-break weights, shown only when the vote was tied.
    pub tie_weights: Vec<ScoreRowVm>,
    pub neighbors: Vec<NeighborRowVm>,
}

impl ResultsVm {
    #[must_use]
    pub fn new(assessment_id: AssessmentId, results: &StrandResults) -> Self {
        let scores = results
            .scores()
            .into_iter()
            .map(|(strand, score)| ScoreRowVm {
                strand: strand.label().to_string(),
                score: format!("{score:.2}"),
            })
            .collect();

        let tie_weights = results
            .tie_info
            .map(|tie| {
                [
                    ("STEM", tie.stem_weight),
                    ("HUMSS", tie.humss_weight),
                    ("ABM", tie.abm_weight),
                ]
                .into_iter()
                .map(|(strand, weight)| ScoreRowVm {
                    strand: strand.to_string(),
                    score: format!("{weight:.3}"),
                })
                .collect()
            })
            .unwrap_or_default();

        let mut sorted = results.neighbors.clone();
        sorted.sort_by(|a, b| {
            a.distance
                .unwrap_or(0.0)
                .total_cmp(&b.distance.unwrap_or(0.0))
        });
        let neighbors = sorted
            .iter()
            .enumerate()
            .map(|(index, neighbor)| NeighborRowVm {
                rank: index + 1,
                strand: neighbor.strand.label().to_string(),
                distance: format!("{:.3}", neighbor.distance.unwrap_or(0.0)),
            })
            .collect();

        Self {
            assessment_id,
            strand: results.recommended_strand.label().to_string(),
            description: results
                .recommendation_description
                .clone()
                .unwrap_or_else(|| "No description available.".to_string()),
            dataset: results
                .dataset_name
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            taken_on: results
                .created_at
                .map(|at| at.format("%B %-d, %Y %H:%M UTC").to_string()),
            scores,
            tie_weights,
            neighbors,
        }
    }
}
