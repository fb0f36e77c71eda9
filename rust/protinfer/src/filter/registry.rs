use super::{
    Filter,
    FilterComparator,
    FilterItem,
    FilterOutcome,
    ItemKind,
};
use crate::compiler::Compiler;
use crate::errors::FilterError;
use crate::models::score::is_psm_set_only;
use crate::models::{
    PsmId,
    PsmSetId,
    ReportProtein,
    ScoreModel,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Score filters are named after the score kind they look at,
/// e.g. `psm_score_filter_psm_fdr_score`.
pub const PSM_SCORE_FILTER_PREFIX: &str = "psm_score_filter_";

/// Identifiers accepted by [`build_filter`], besides the `psm_score_filter_<kind>` family.
pub const FILTER_IDENTIFIERS: &[&str] = &[
    "charge_filter",
    "delta_mass_filter",
    "sequence_length_filter",
    "psm_rank_filter",
    "decoy_filter",
    "nr_psms_per_psm_set_filter",
    "protein_score_filter",
    "protein_q_value_filter",
    "protein_fdr_filter",
    "nr_peptides_per_protein_filter",
    "nr_psms_per_protein_filter",
    "nr_spectra_per_protein_filter",
    "nr_unique_peptides_per_protein_filter",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    PsmScore(String),
    Charge,
    /// Absolute mass difference in Da.
    DeltaMass,
    SequenceLength,
    PsmRank,
    Decoy,
    NrPsmsPerPsmSet,
    ProteinScore,
    ProteinQValue,
    ProteinFdr,
    NrPeptidesPerProtein,
    NrPsmsPerProtein,
    NrSpectraPerProtein,
    NrUniquePeptidesPerProtein,
}

impl FilterKind {
    pub fn from_identifier(name: &str) -> Option<Self> {
        if let Some(kind) = name.strip_prefix(PSM_SCORE_FILTER_PREFIX) {
            if kind.is_empty() {
                return None;
            }
            return Some(FilterKind::PsmScore(kind.to_string()));
        }
        let out = match name {
            "charge_filter" => FilterKind::Charge,
            "delta_mass_filter" => FilterKind::DeltaMass,
            "sequence_length_filter" => FilterKind::SequenceLength,
            "psm_rank_filter" => FilterKind::PsmRank,
            "decoy_filter" => FilterKind::Decoy,
            "nr_psms_per_psm_set_filter" => FilterKind::NrPsmsPerPsmSet,
            "protein_score_filter" => FilterKind::ProteinScore,
            "protein_q_value_filter" => FilterKind::ProteinQValue,
            "protein_fdr_filter" => FilterKind::ProteinFdr,
            "nr_peptides_per_protein_filter" => FilterKind::NrPeptidesPerProtein,
            "nr_psms_per_protein_filter" => FilterKind::NrPsmsPerProtein,
            "nr_spectra_per_protein_filter" => FilterKind::NrSpectraPerProtein,
            "nr_unique_peptides_per_protein_filter" => FilterKind::NrUniquePeptidesPerProtein,
            _ => return None,
        };
        Some(out)
    }

    fn takes_bool(&self) -> bool {
        matches!(self, FilterKind::Decoy)
    }

    pub fn supports(&self, kind: ItemKind) -> bool {
        match self {
            FilterKind::PsmScore(score) => match kind {
                ItemKind::Psm => !is_psm_set_only(score),
                ItemKind::PsmSet => true,
                ItemKind::Protein => false,
            },
            FilterKind::Charge
            | FilterKind::DeltaMass
            | FilterKind::SequenceLength
            | FilterKind::PsmRank
            | FilterKind::Decoy => matches!(kind, ItemKind::Psm | ItemKind::PsmSet),
            FilterKind::NrPsmsPerPsmSet => kind == ItemKind::PsmSet,
            FilterKind::ProteinScore
            | FilterKind::ProteinQValue
            | FilterKind::ProteinFdr
            | FilterKind::NrPeptidesPerProtein
            | FilterKind::NrPsmsPerProtein
            | FilterKind::NrSpectraPerProtein
            | FilterKind::NrUniquePeptidesPerProtein => kind == ItemKind::Protein,
        }
    }

    pub fn is_protein_level(&self) -> bool {
        self.supports(ItemKind::Protein)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterValue::Bool(x) => write!(f, "{}", x),
            FilterValue::Number(x) => write!(f, "{}", x),
        }
    }
}

/// A filter as written in a configuration file.
///
/// ```json
/// { "name": "psm_score_filter_psm_fdr_score", "comparator": "less_equal", "value": 0.01 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    pub comparator: FilterComparator,
    pub value: FilterValue,
    #[serde(default)]
    pub negate: bool,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>, comparator: FilterComparator, value: FilterValue) -> Self {
        Self {
            name: name.into(),
            comparator,
            value,
            negate: false,
        }
    }
}

/// A checked, ready to evaluate filter.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyFilter {
    name: String,
    kind: FilterKind,
    comparator: FilterComparator,
    value: FilterValue,
    negate: bool,
}

pub fn build_filter(spec: &FilterSpec) -> Result<AnyFilter, FilterError> {
    let kind = FilterKind::from_identifier(&spec.name).ok_or_else(|| FilterError::UnknownFilter {
        name: spec.name.clone(),
    })?;

    match (kind.takes_bool(), spec.value) {
        (true, FilterValue::Bool(_)) => {
            if !matches!(
                spec.comparator,
                FilterComparator::Equal | FilterComparator::NotEqual
            ) {
                return Err(FilterError::InvalidComparator {
                    filter: spec.name.clone(),
                    comparator: spec.comparator,
                });
            }
        }
        (false, FilterValue::Number(x)) if !x.is_nan() => {}
        (true, _) => {
            return Err(FilterError::ValueTypeMismatch {
                filter: spec.name.clone(),
                expected: "boolean",
            });
        }
        (false, _) => {
            return Err(FilterError::ValueTypeMismatch {
                filter: spec.name.clone(),
                expected: "numeric",
            });
        }
    }

    Ok(AnyFilter {
        name: spec.name.clone(),
        kind,
        comparator: spec.comparator,
        value: spec.value,
        negate: spec.negate,
    })
}

pub fn build_filters(specs: &[FilterSpec]) -> Result<Vec<AnyFilter>, FilterError> {
    specs.iter().map(build_filter).collect()
}

impl AnyFilter {
    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub fn comparator(&self) -> FilterComparator {
        self.comparator
    }

    pub fn value(&self) -> FilterValue {
        self.value
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// Score kind looked at by a `psm_score_filter_<kind>`.
    pub fn score_kind(&self) -> Option<&str> {
        match &self.kind {
            FilterKind::PsmScore(kind) => Some(kind),
            _ => None,
        }
    }

    fn number(&self, value: Option<f64>) -> FilterOutcome {
        match (value, self.value) {
            (Some(v), FilterValue::Number(threshold)) => {
                FilterOutcome::from_bool(self.comparator.compare(v, threshold))
            }
            _ => FilterOutcome::Fail,
        }
    }

    fn boolean(&self, value: bool) -> FilterOutcome {
        match self.value {
            FilterValue::Bool(threshold) => self
                .comparator
                .compare_bool(value, threshold)
                .map(FilterOutcome::from_bool)
                .unwrap_or(FilterOutcome::Unsupported),
            FilterValue::Number(_) => FilterOutcome::Unsupported,
        }
    }

    fn score(&self, score: Option<&ScoreModel>) -> FilterOutcome {
        self.number(score.map(|s| s.value()))
    }

    fn evaluate_psm(&self, compiler: &Compiler, id: PsmId) -> FilterOutcome {
        let psm = compiler.psm(id);
        match &self.kind {
            FilterKind::PsmScore(kind) => self.score(psm.score(kind)),
            FilterKind::Charge => self.number(Some(psm.charge() as f64)),
            FilterKind::DeltaMass => self.number(psm.delta_mass().map(f64::abs)),
            FilterKind::SequenceLength => {
                self.number(Some(compiler.peptide(psm.peptide()).sequence().len() as f64))
            }
            FilterKind::PsmRank => self.number(psm.rank().map(|r| r as f64)),
            FilterKind::Decoy => self.boolean(psm.is_decoy()),
            _ => FilterOutcome::Unsupported,
        }
    }

    fn evaluate_psm_set(&self, compiler: &Compiler, id: PsmSetId) -> FilterOutcome {
        let set = compiler.psm_set(id);
        let members = || set.psms().iter().map(|&p| compiler.psm(p));
        match &self.kind {
            FilterKind::PsmScore(kind) => self.score(compiler.resolve_set_score(id, kind)),
            FilterKind::Charge => self.number(Some(set.charge() as f64)),
            FilterKind::DeltaMass => self.number(
                members()
                    .filter_map(|p| p.delta_mass().map(f64::abs))
                    .min_by(|a, b| a.total_cmp(b)),
            ),
            FilterKind::SequenceLength => {
                self.number(Some(compiler.peptide(set.peptide()).sequence().len() as f64))
            }
            FilterKind::PsmRank => {
                self.number(members().filter_map(|p| p.rank()).min().map(|r| r as f64))
            }
            FilterKind::Decoy => self.boolean(set.is_decoy()),
            FilterKind::NrPsmsPerPsmSet => self.number(Some(set.psms().len() as f64)),
            _ => FilterOutcome::Unsupported,
        }
    }

    fn evaluate_protein(&self, protein: &ReportProtein) -> FilterOutcome {
        match &self.kind {
            FilterKind::ProteinScore => {
                self.number(Some(protein.score()).filter(|s| !s.is_nan()))
            }
            FilterKind::ProteinQValue => self.number(protein.q_value()),
            FilterKind::ProteinFdr => self.number(protein.fdr()),
            FilterKind::NrPeptidesPerProtein => self.number(Some(protein.nr_peptides() as f64)),
            FilterKind::NrPsmsPerProtein => self.number(Some(protein.nr_psms() as f64)),
            FilterKind::NrSpectraPerProtein => self.number(Some(protein.nr_spectra() as f64)),
            FilterKind::NrUniquePeptidesPerProtein => {
                self.number(Some(protein.nr_unique_peptides() as f64))
            }
            _ => FilterOutcome::Unsupported,
        }
    }
}

impl Filter for AnyFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, kind: ItemKind) -> bool {
        self.kind.supports(kind)
    }

    fn evaluate(&self, item: &FilterItem<'_>) -> FilterOutcome {
        if !self.supports(item.kind()) {
            return FilterOutcome::Unsupported;
        }
        let outcome = match *item {
            FilterItem::Psm(compiler, id) => self.evaluate_psm(compiler, id),
            FilterItem::PsmSet(compiler, id) => self.evaluate_psm_set(compiler, id),
            FilterItem::Protein(_, protein) => self.evaluate_protein(protein),
        };
        if self.negate {
            outcome.negate()
        } else {
            outcome
        }
    }
}

impl std::fmt::Display for AnyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negate {
            write!(f, "NOT ")?;
        }
        write!(f, "{} {} {}", self.name, self.comparator, self.value)
    }
}
