use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Academic track produced by the external scoring service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Strand {
    Stem,
    Abm,
    Humss,
    Other(String),
}

impl Strand {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Strand::Stem => "STEM",
            Strand::Abm => "ABM",
            Strand::Humss => "HUMSS",
            Strand::Other(raw) => raw,
        }
    }
}

impl From<String> for Strand {
    fn from(raw: String) -> Self {
        let normalized = raw.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "STEM" => Strand::Stem,
            "ABM" => Strand::Abm,
            "HUMSS" => Strand::Humss,
            _ => Strand::Other(raw),
        }
    }
}

impl From<Strand> for String {
    fn from(strand: Strand) -> Self {
        strand.label().to_string()
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One nearest-neighbor record backing a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub neighbor_index: u32,
    pub strand: Strand,
    #[serde(default)]
    pub distance: Option<f64>,
}

/// Tie-break weights, present only when the vote was tied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieInfo {
    pub stem_weight: f64,
    pub humss_weight: f64,
    pub abm_weight: f64,
}

/// Graded outcome of a completed attempt, consumed as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrandResults {
    pub results_id: u64,
    pub recommended_strand: Strand,
    #[serde(default)]
    pub stem_score: Option<f64>,
    #[serde(default)]
    pub humss_score: Option<f64>,
    #[serde(default)]
    pub abm_score: Option<f64>,
    #[serde(default)]
    pub recommendation_description: Option<String>,
    #[serde(default)]
    pub dataset_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
    #[serde(default)]
    pub tie_info: Option<TieInfo>,
}

impl StrandResults {
    /// Scores paired with their strand, skipping strands the backend left out.
    #[must_use]
    pub fn scores(&self) -> Vec<(Strand, f64)> {
        [
            (Strand::Stem, self.stem_score),
            (Strand::Abm, self.abm_score),
            (Strand::Humss, self.humss_score),
        ]
        .into_iter()
        .filter_map(|(strand, score)| score.map(|s| (strand, s)))
        .collect()
    }

    #[must_use]
    pub fn was_tied(&self) -> bool {
        self.tie_info.is_some()
    }
}
