use crate::fdr::DecoyStrategy;
use crate::filter::FilterSpec;
use crate::inference::InferenceMethod;
use crate::scoring::ScoringSettings;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

const DEFAULT_FDR_THRESHOLD: f64 = 0.01;

fn default_fdr_threshold() -> f64 {
    DEFAULT_FDR_THRESHOLD
}

fn default_true() -> bool {
    true
}

/// Settings of one analysis run. Loaded once and passed around by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub psm: PsmConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub protein: ProteinConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PsmConfig {
    /// Merge PSMs of different files into common PSM sets.
    #[serde(default = "default_true")]
    pub create_psm_sets: bool,
    #[serde(default)]
    pub decoy_strategy: DecoyStrategy,
    /// Score kind used for the FDR of a file, keyed by file name.
    #[serde(default)]
    pub preferred_scores: BTreeMap<String, String>,
    #[serde(default = "default_fdr_threshold")]
    pub fdr_threshold: f64,
}

impl Default for PsmConfig {
    fn default() -> Self {
        Self {
            create_psm_sets: true,
            decoy_strategy: DecoyStrategy::default(),
            preferred_scores: BTreeMap::new(),
            fdr_threshold: DEFAULT_FDR_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InferenceConfig {
    #[serde(default)]
    pub method: InferenceMethod,
    #[serde(default)]
    pub scoring: ScoringSettings,
    /// PSM and PSM set level filters, only evidence passing all of them is used.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    /// Differently modified forms of a sequence count as distinct peptides.
    #[serde(default)]
    pub consider_modifications: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProteinConfig {
    #[serde(default)]
    pub decoy_strategy: DecoyStrategy,
    #[serde(default = "default_fdr_threshold")]
    pub fdr_threshold: f64,
    /// Applied to the finished report.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

impl Default for ProteinConfig {
    fn default() -> Self {
        Self {
            decoy_strategy: DecoyStrategy::default(),
            fdr_threshold: DEFAULT_FDR_THRESHOLD,
            filters: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        ScoringMethod,
        SpectraPolicy,
    };

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert!(config.psm.create_psm_sets);
        assert_eq!(config.protein.fdr_threshold, 0.01);
        assert_eq!(config.inference.method, InferenceMethod::SpectrumExtractor);
        assert_eq!(config.inference.scoring.method, ScoringMethod::Multiplicative);
        assert_eq!(config.inference.scoring.score, "psm_fdr_score");
        assert_eq!(config.inference.scoring.spectra, SpectraPolicy::OnlyBest);
        assert!(!config.inference.consider_modifications);
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"{
            "psm": {
                "create_psm_sets": false,
                "decoy_strategy": {"strategy": "accession_pattern", "pattern": "DECOY_.*"},
                "preferred_scores": {"run1": "mascot_score"}
            },
            "inference": {
                "method": "report_all",
                "scoring": {"method": "geometric_mean", "score": "mascot_score", "spectra": "all"},
                "consider_modifications": true,
                "filters": [
                    {"name": "charge_filter", "comparator": "greater_equal", "value": 2},
                    {"name": "decoy_filter", "comparator": "equal", "value": false, "negate": false}
                ]
            },
            "protein": {"fdr_threshold": 0.05}
        }"#;
        let config: AnalysisConfig = serde_json::from_str(raw).unwrap();
        assert!(!config.psm.create_psm_sets);
        assert_eq!(
            config.psm.decoy_strategy,
            DecoyStrategy::AccessionPattern {
                pattern: "DECOY_.*".to_string()
            }
        );
        assert_eq!(config.psm.preferred_scores["run1"], "mascot_score");
        assert_eq!(config.inference.method, InferenceMethod::ReportAll);
        assert_eq!(config.inference.scoring.spectra, SpectraPolicy::All);
        assert_eq!(config.inference.filters.len(), 2);
        assert!(config.inference.consider_modifications);
        assert_eq!(config.protein.fdr_threshold, 0.05);
        assert_eq!(config.protein.decoy_strategy, DecoyStrategy::SearchEngineSpecific);
    }
}
