//! Protein scores from the scores of the PSM sets attributed to a protein.
//!
//! Scores of different kinds and directions are combined on the
//! [`ScoreModel::normalized`] scale, so a higher protein score is always better.

use crate::compiler::Compiler;
use crate::models::score::PSM_FDR_SCORE;
use crate::models::{
    AccessionId,
    GroupId,
    PeptideId,
    PsmSetId,
    ScoreModel,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// Which PSM sets of a protein contribute to its score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpectraPolicy {
    /// Only the best PSM set of every peptide.
    #[default]
    OnlyBest,
    All,
}

impl std::fmt::Display for SpectraPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpectraPolicy::OnlyBest => write!(f, "only_best"),
            SpectraPolicy::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for SpectraPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "only_best" | "only-best" | "best" => Ok(SpectraPolicy::OnlyBest),
            "all" => Ok(SpectraPolicy::All),
            _ => Err(format!(
                "Invalid spectra policy: '{}'. Valid options: only_best, all",
                s
            )),
        }
    }
}

/// The evidence attributed to one protein candidate.
#[derive(Debug, Clone, Copy)]
pub struct CandidateEvidence<'a> {
    pub compiler: &'a Compiler,
    pub group: GroupId,
    pub accessions: &'a [AccessionId],
    pub psm_sets: &'a [PsmSetId],
}

impl CandidateEvidence<'_> {
    /// Resolved scores of the contributing sets under `policy`, in set order.
    pub fn contributing_scores(&self, kind: &str, policy: SpectraPolicy) -> Vec<&ScoreModel> {
        let resolved = self
            .psm_sets
            .iter()
            .filter_map(|&set| self.compiler.resolve_set_score(set, kind).map(|s| (set, s)));
        match policy {
            SpectraPolicy::All => resolved.map(|(_, score)| score).collect(),
            SpectraPolicy::OnlyBest => {
                let mut best: BTreeMap<PeptideId, &ScoreModel> = BTreeMap::new();
                for (set, score) in resolved {
                    if score.value().is_nan() {
                        continue;
                    }
                    let peptide = self.compiler.psm_set(set).peptide();
                    best.entry(peptide)
                        .and_modify(|current| {
                            if score.direction().is_better(score.value(), current.value()) {
                                *current = score;
                            }
                        })
                        .or_insert(score);
                }
                best.into_values().collect()
            }
        }
    }
}

pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Score kind the strategy reads from the PSM sets.
    fn score_kind(&self) -> &str;

    /// NaN when no attributed set carries a usable score.
    fn score(&self, evidence: &CandidateEvidence<'_>, policy: SpectraPolicy) -> f64;
}

fn normalized_terms(
    evidence: &CandidateEvidence<'_>,
    kind: &str,
    policy: SpectraPolicy,
) -> Vec<f64> {
    evidence
        .contributing_scores(kind, policy)
        .into_iter()
        .filter_map(ScoreModel::normalized)
        .collect()
}

/// Product of the scores, i.e. the sum of their normalised values.
#[derive(Debug, Clone)]
pub struct Multiplicative {
    pub score_kind: String,
}

impl ScoringStrategy for Multiplicative {
    fn name(&self) -> &str {
        "multiplicative"
    }

    fn score_kind(&self) -> &str {
        &self.score_kind
    }

    fn score(&self, evidence: &CandidateEvidence<'_>, policy: SpectraPolicy) -> f64 {
        let terms = normalized_terms(evidence, &self.score_kind, policy);
        if terms.is_empty() {
            return f64::NAN;
        }
        terms.iter().sum()
    }
}

/// Geometric mean of the scores, the mean of their normalised values.
#[derive(Debug, Clone)]
pub struct GeometricMean {
    pub score_kind: String,
}

impl ScoringStrategy for GeometricMean {
    fn name(&self) -> &str {
        "geometric_mean"
    }

    fn score_kind(&self) -> &str {
        &self.score_kind
    }

    fn score(&self, evidence: &CandidateEvidence<'_>, policy: SpectraPolicy) -> f64 {
        let terms = normalized_terms(evidence, &self.score_kind, policy);
        if terms.is_empty() {
            return f64::NAN;
        }
        terms.iter().sum::<f64>() / terms.len() as f64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    #[default]
    Multiplicative,
    GeometricMean,
}

impl std::fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringMethod::Multiplicative => write!(f, "multiplicative"),
            ScoringMethod::GeometricMean => write!(f, "geometric_mean"),
        }
    }
}

impl std::str::FromStr for ScoringMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiplicative" => Ok(ScoringMethod::Multiplicative),
            "geometric_mean" | "geometric-mean" => Ok(ScoringMethod::GeometricMean),
            _ => Err(format!(
                "Invalid scoring method: '{}'. Valid options: multiplicative, geometric_mean",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringSettings {
    #[serde(default)]
    pub method: ScoringMethod,
    #[serde(default = "default_score_kind")]
    pub score: String,
    #[serde(default)]
    pub spectra: SpectraPolicy,
}

fn default_score_kind() -> String {
    PSM_FDR_SCORE.to_string()
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            method: ScoringMethod::default(),
            score: default_score_kind(),
            spectra: SpectraPolicy::default(),
        }
    }
}

impl ScoringSettings {
    pub fn strategy(&self) -> Box<dyn ScoringStrategy> {
        match self.method {
            ScoringMethod::Multiplicative => Box::new(Multiplicative {
                score_kind: self.score.clone(),
            }),
            ScoringMethod::GeometricMean => Box::new(GeometricMean {
                score_kind: self.score.clone(),
            }),
        }
    }
}
