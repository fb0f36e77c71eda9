//! Typed score values.
//!
//! Scores reported by different engines are not comparable with each other, so a
//! [`ScoreModel`] always carries its kind and its ranking direction. Two models can
//! only be compared when their kinds agree, combining different kinds goes through
//! [`ScoreModel::normalized`].

use serde::{
    Deserialize,
    Serialize,
};
use std::cmp::Ordering;

pub const PSM_FDR_SCORE: &str = "psm_fdr_score";
pub const PSM_Q_VALUE: &str = "psm_q_value";
pub const PSM_AVERAGE_FDR_SCORE: &str = "psm_average_fdr_score";
pub const PSM_COMBINED_FDR_SCORE: &str = "psm_combined_fdr_score";

/// Smallest value a lower-is-better score is taken as before going to log space.
pub const LOWER_IS_BETTER_FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDirection {
    HigherIsBetter,
    LowerIsBetter,
}

impl ScoreDirection {
    /// `Ordering::Greater` means `a` is the better value.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match self {
            ScoreDirection::HigherIsBetter => a.total_cmp(&b),
            ScoreDirection::LowerIsBetter => b.total_cmp(&a),
        }
    }

    pub fn is_better(&self, a: f64, b: f64) -> bool {
        self.compare(a, b) == Ordering::Greater
    }
}

/// Granularity at which a score kind is meaningful.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScope {
    Psm,
    PsmSet,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownScore {
    pub short_name: &'static str,
    pub name: &'static str,
    pub direction: ScoreDirection,
    pub scope: ScoreScope,
}

const fn known(
    short_name: &'static str,
    name: &'static str,
    direction: ScoreDirection,
    scope: ScoreScope,
) -> KnownScore {
    KnownScore {
        short_name,
        name,
        direction,
        scope,
    }
}

use ScoreDirection::{
    HigherIsBetter,
    LowerIsBetter,
};

static KNOWN_SCORES: &[KnownScore] = &[
    known(PSM_FDR_SCORE, "PSM-level FDR score", LowerIsBetter, ScoreScope::Any),
    known(PSM_Q_VALUE, "PSM-level q-value", LowerIsBetter, ScoreScope::Any),
    known(
        PSM_AVERAGE_FDR_SCORE,
        "PSM-level average FDR score",
        LowerIsBetter,
        ScoreScope::PsmSet,
    ),
    known(
        PSM_COMBINED_FDR_SCORE,
        "PSM-level combined FDR score",
        LowerIsBetter,
        ScoreScope::PsmSet,
    ),
    known("mascot_score", "Mascot score", HigherIsBetter, ScoreScope::Psm),
    known("mascot_expect", "Mascot expectation value", LowerIsBetter, ScoreScope::Psm),
    known("xtandem_expect", "X!Tandem expect", LowerIsBetter, ScoreScope::Psm),
    known("xtandem_hyperscore", "X!Tandem hyperscore", HigherIsBetter, ScoreScope::Psm),
    known("msgf_raw", "MS-GF raw score", HigherIsBetter, ScoreScope::Psm),
    known("msgf_specevalue", "MS-GF SpecEValue", LowerIsBetter, ScoreScope::Psm),
    known("msgf_evalue", "MS-GF EValue", LowerIsBetter, ScoreScope::Psm),
    known("comet_expectation", "Comet expectation value", LowerIsBetter, ScoreScope::Psm),
    known("comet_xcorr", "Comet XCorr", HigherIsBetter, ScoreScope::Psm),
    known("sage_hyperscore", "Sage hyperscore", HigherIsBetter, ScoreScope::Psm),
    known(
        "openms_posterior_error_probability",
        "OpenMS posterior error probability",
        LowerIsBetter,
        ScoreScope::Psm,
    ),
    known("percolator_q_value", "Percolator q-value", LowerIsBetter, ScoreScope::Psm),
    known("percolator_pep", "Percolator PEP", LowerIsBetter, ScoreScope::Psm),
];

pub fn known_score(kind: &str) -> Option<&'static KnownScore> {
    KNOWN_SCORES.iter().find(|k| k.short_name == kind)
}

pub fn known_scores() -> &'static [KnownScore] {
    KNOWN_SCORES
}

/// Unknown kinds are assumed to be meaningful everywhere.
pub fn score_scope(kind: &str) -> ScoreScope {
    known_score(kind).map(|k| k.scope).unwrap_or(ScoreScope::Any)
}

pub fn is_psm_set_only(kind: &str) -> bool {
    score_scope(kind) == ScoreScope::PsmSet
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreModel {
    kind: String,
    value: f64,
    direction: ScoreDirection,
}

impl ScoreModel {
    pub fn new(kind: impl Into<String>, value: f64, direction: ScoreDirection) -> Self {
        Self {
            kind: kind.into(),
            value,
            direction,
        }
    }

    /// Builds a model for a registered kind, `None` if the kind is not registered.
    pub fn known(kind: &str, value: f64) -> Option<Self> {
        known_score(kind).map(|k| Self::new(k.short_name, value, k.direction))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn direction(&self) -> ScoreDirection {
        self.direction
    }

    /// `Some(Ordering::Greater)` if `self` is better than `other`.
    ///
    /// Returns `None` across kinds or when either value is NaN.
    pub fn compare(&self, other: &ScoreModel) -> Option<Ordering> {
        if self.kind != other.kind || self.value.is_nan() || other.value.is_nan() {
            return None;
        }
        Some(self.direction.compare(self.value, other.value))
    }

    /// Value on a common higher-is-better log10 scale.
    ///
    /// Summing normalised values is the log-space product of the raw scores.
    /// `None` for values that have no logarithm (non-positive higher-is-better
    /// scores, NaN).
    pub fn normalized(&self) -> Option<f64> {
        if self.value.is_nan() {
            return None;
        }
        match self.direction {
            ScoreDirection::HigherIsBetter => {
                if self.value > 0.0 {
                    Some(self.value.log10())
                } else {
                    None
                }
            }
            ScoreDirection::LowerIsBetter => Some(-self.value.max(LOWER_IS_BETTER_FLOOR).log10()),
        }
    }
}
