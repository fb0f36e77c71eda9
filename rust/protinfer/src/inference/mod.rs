mod evidence;
mod report_all;
mod spectrum_extractor;

pub use report_all::ReportAll;
pub use spectrum_extractor::SpectrumExtractor;

use crate::compiler::Compiler;
use crate::errors::InferenceError;
use crate::filter::{
    AnyFilter,
    FilterItem,
    satisfies_all,
};
use crate::models::ReportProtein;
use crate::scoring::{
    ScoringStrategy,
    SpectraPolicy,
};
use serde::{
    Deserialize,
    Serialize,
};

/// What counts as evidence and how candidates are scored.
#[derive(Clone, Copy)]
pub struct InferenceParams<'a> {
    /// Only PSM sets passing all of them count as evidence.
    pub filters: &'a [AnyFilter],
    pub scoring: &'a dyn ScoringStrategy,
    pub policy: SpectraPolicy,
    /// Count every modified form of a sequence as a peptide of its own.
    pub consider_modifications: bool,
}

pub trait InferenceStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Reported proteins, ordered by group and then by representative accession.
    fn infer(
        &self,
        compiler: &Compiler,
        params: &InferenceParams<'_>,
    ) -> Result<Vec<ReportProtein>, InferenceError>;
}

pub(crate) fn check_ready(compiler: &Compiler) -> Result<(), InferenceError> {
    if !compiler.is_closed() {
        return Err(InferenceError::GroupsNotBuilt);
    }
    if compiler.psm_sets().is_empty() && !compiler.psms().is_empty() {
        return Err(InferenceError::PsmSetsNotBuilt);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMethod {
    ReportAll,
    #[default]
    SpectrumExtractor,
}

impl InferenceMethod {
    pub fn strategy(&self) -> Box<dyn InferenceStrategy> {
        match self {
            InferenceMethod::ReportAll => Box::new(ReportAll),
            InferenceMethod::SpectrumExtractor => Box::new(SpectrumExtractor),
        }
    }
}

impl std::fmt::Display for InferenceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceMethod::ReportAll => write!(f, "report_all"),
            InferenceMethod::SpectrumExtractor => write!(f, "spectrum_extractor"),
        }
    }
}

impl std::str::FromStr for InferenceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report_all" | "report-all" | "all" => Ok(InferenceMethod::ReportAll),
            "spectrum_extractor" | "spectrum-extractor" | "parsimony" => {
                Ok(InferenceMethod::SpectrumExtractor)
            }
            _ => Err(format!(
                "Invalid inference method: '{}'. Valid options: report_all, spectrum_extractor",
                s
            )),
        }
    }
}

/// Keeps the proteins that pass every protein-level filter.
pub fn filter_report(
    compiler: &Compiler,
    proteins: Vec<ReportProtein>,
    filters: &[AnyFilter],
) -> Vec<ReportProtein> {
    if filters.is_empty() {
        return proteins;
    }
    proteins
        .into_iter()
        .filter(|p| satisfies_all(filters, &FilterItem::Protein(compiler, p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::PsmRecord;
    use crate::filter::{
        FilterComparator,
        FilterSpec,
        FilterValue,
        build_filter,
    };
    use crate::models::Modification;
    use crate::scoring::Multiplicative;

    fn compiler_from(psms: &[(&str, &str, &[&str])]) -> Compiler {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "engine").unwrap();
        for (i, (seq, spectrum, accessions)) in psms.iter().enumerate() {
            let mut rec = PsmRecord::new(*seq, 2, 400.0, *spectrum)
                .with_score("mascot_score", 10.0 + i as f64, None);
            for acc in accessions.iter() {
                rec = rec.with_accession(*acc);
            }
            compiler.add_psm(file, rec).unwrap();
        }
        compiler.build_groups().unwrap();
        compiler.build_psm_sets(true);
        compiler
    }

    fn mascot() -> Multiplicative {
        Multiplicative {
            score_kind: "mascot_score".to_string(),
        }
    }

    fn infer_with(
        strategy: &dyn InferenceStrategy,
        compiler: &Compiler,
        filters: &[AnyFilter],
        consider_modifications: bool,
    ) -> Result<Vec<ReportProtein>, InferenceError> {
        let scoring = mascot();
        let params = InferenceParams {
            filters,
            scoring: &scoring,
            policy: SpectraPolicy::OnlyBest,
            consider_modifications,
        };
        strategy.infer(compiler, &params)
    }

    fn infer(strategy: &dyn InferenceStrategy, compiler: &Compiler) -> Vec<ReportProtein> {
        infer_with(strategy, compiler, &[], false).unwrap()
    }

    #[test]
    fn test_not_ready() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "engine").unwrap();
        compiler
            .add_psm(file, PsmRecord::new("PEPTIDE", 2, 400.0, "s1").with_accession("P1"))
            .unwrap();
        let out = infer_with(&SpectrumExtractor, &compiler, &[], false);
        assert!(matches!(out, Err(InferenceError::GroupsNotBuilt)));
        compiler.build_groups().unwrap();
        let out = infer_with(&SpectrumExtractor, &compiler, &[], false);
        assert!(matches!(out, Err(InferenceError::PsmSetsNotBuilt)));
    }

    #[test]
    fn test_psms_added_after_set_building_are_evidence() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "engine").unwrap();
        compiler
            .add_psm(
                file,
                PsmRecord::new("PEPTIDE", 2, 400.0, "s1")
                    .with_score("mascot_score", 20.0, None)
                    .with_accession("P1"),
            )
            .unwrap();
        compiler.build_psm_sets(true);
        compiler
            .add_psm(
                file,
                PsmRecord::new("OTHERK", 2, 400.0, "s2")
                    .with_score("mascot_score", 25.0, None)
                    .with_accession("P2"),
            )
            .unwrap();
        compiler.build_groups().unwrap();
        compiler.build_psm_sets(true);

        let names: Vec<String> = infer(&SpectrumExtractor, &compiler)
            .iter()
            .map(|p| p.representative().to_string())
            .collect();
        assert_eq!(names, vec!["P1", "P2"]);
    }

    #[test]
    fn test_subset_attached_to_covering_protein() {
        let compiler = compiler_from(&[
            ("PEPTIDE", "s1", &["P1"]),
            ("PEPTIDEK", "s2", &["P1", "P2"]),
        ]);
        let proteins = infer(&SpectrumExtractor, &compiler);
        assert_eq!(proteins.len(), 1);
        assert_eq!(proteins[0].representative(), "P1");
        assert_eq!(proteins[0].nr_peptides(), 2);
        assert_eq!(proteins[0].nr_unique_peptides(), 2);
        assert_eq!(proteins[0].subsets().len(), 1);
        assert_eq!(proteins[0].subsets()[0].representative(), "P2");

        let all = infer(&ReportAll, &compiler);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].nr_unique_peptides(), 1);
        assert_eq!(all[1].nr_unique_peptides(), 0);
    }

    #[test]
    fn test_same_set_accessions_are_merged() {
        let compiler = compiler_from(&[("PEPTIDE", "s1", &["B", "A", "C"])]);
        let proteins = infer(&SpectrumExtractor, &compiler);
        assert_eq!(proteins.len(), 1);
        assert_eq!(proteins[0].accessions(), &["A", "B", "C"]);
        assert_eq!(proteins[0].accession_label(), "A,B,C");
    }

    #[test]
    fn test_union_cover_attaches_to_largest_overlap() {
        // P1 = {a, b, c}, P2 = {d, e}, P3 = {c, d} is explained by P1 and P2 together
        let compiler = compiler_from(&[
            ("AAAK", "s1", &["P1"]),
            ("BBBK", "s2", &["P1"]),
            ("CCCK", "s3", &["P1", "P3"]),
            ("DDDK", "s4", &["P2", "P3"]),
            ("EEEK", "s5", &["P2"]),
        ]);
        let proteins = infer(&SpectrumExtractor, &compiler);
        let names: Vec<&str> = proteins.iter().map(|p| p.representative()).collect();
        assert_eq!(names, vec!["P1", "P2"]);
        // equal overlap with both, the earlier chosen P1 takes it
        assert_eq!(proteins[0].subsets()[0].representative(), "P3");
        assert!(proteins[1].subsets().is_empty());

        let covered: std::collections::BTreeSet<_> = proteins
            .iter()
            .flat_map(|p| p.peptides().iter().copied())
            .collect();
        assert_eq!(covered.len(), 5);
    }

    #[test]
    fn test_filters_remove_evidence() {
        let compiler = compiler_from(&[
            ("PEPTIDE", "s1", &["P1"]),
            ("PEPTIDEK", "s2", &["P2"]),
        ]);
        // the first PSM scores 10, the second 11
        let filter = build_filter(&FilterSpec::new(
            "psm_score_filter_mascot_score",
            FilterComparator::Greater,
            FilterValue::Number(10.5),
        ))
        .unwrap();
        let proteins = infer_with(&SpectrumExtractor, &compiler, &[filter], false).unwrap();
        assert_eq!(proteins.len(), 1);
        assert_eq!(proteins[0].representative(), "P2");

        let report_filter = build_filter(&FilterSpec::new(
            "nr_peptides_per_protein_filter",
            FilterComparator::GreaterEqual,
            FilterValue::Number(2.0),
        ))
        .unwrap();
        assert!(filter_report(&compiler, proteins, &[report_filter]).is_empty());
    }

    #[test]
    fn test_classes_merge_when_filters_equalise_evidence() {
        // P1 = {a, b} and P2 = {a} are different classes, filtering b away
        // leaves them with the same evidence
        let compiler = compiler_from(&[
            ("PEPTIDEK", "s1", &["P1"]),
            ("PEPTIDE", "s2", &["P1", "P2"]),
        ]);
        assert_eq!(compiler.groups()[0].classes().len(), 2);
        let filter = build_filter(&FilterSpec::new(
            "psm_score_filter_mascot_score",
            FilterComparator::Greater,
            FilterValue::Number(10.5),
        ))
        .unwrap();
        let proteins = infer_with(&SpectrumExtractor, &compiler, &[filter], false).unwrap();
        assert_eq!(proteins.len(), 1);
        assert_eq!(proteins[0].accession_label(), "P1,P2");
        assert!(proteins[0].subsets().is_empty());
    }

    #[test]
    fn test_modified_forms_count_as_peptides() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "engine").unwrap();
        let oxidation = Modification::new('M', 15.994915, Some("Oxidation".into()), None);
        let records = [
            PsmRecord::new("PEPMIDEK", 2, 400.0, "s1").with_accession("P1"),
            PsmRecord::new("PEPMIDEK", 2, 408.0, "s2")
                .with_modification(4, oxidation)
                .with_accession("P1"),
            PsmRecord::new("SHAREDK", 2, 400.0, "s3")
                .with_accession("P1")
                .with_accession("P2"),
        ];
        for record in records {
            compiler
                .add_psm(file, record.with_score("mascot_score", 30.0, None))
                .unwrap();
        }
        compiler.build_groups().unwrap();
        compiler.build_psm_sets(true);

        let by_sequence = infer_with(&ReportAll, &compiler, &[], false).unwrap();
        assert_eq!(by_sequence[0].representative(), "P1");
        assert_eq!(by_sequence[0].nr_peptides(), 2);
        assert_eq!(by_sequence[0].nr_unique_peptides(), 1);
        assert!(by_sequence[0].forms().iter().all(|f| f.modifications.is_none()));

        let by_form = infer_with(&ReportAll, &compiler, &[], true).unwrap();
        assert_eq!(by_form[0].nr_peptides(), 3);
        assert_eq!(by_form[0].nr_unique_peptides(), 2);
        assert_eq!(by_form[0].peptides().len(), 2);
        assert_eq!(by_form[0].psm_sets(), by_sequence[0].psm_sets());
        assert_eq!(by_form[1].nr_peptides(), 1);

        let two_forms = build_filter(&FilterSpec::new(
            "nr_peptides_per_protein_filter",
            FilterComparator::GreaterEqual,
            FilterValue::Number(3.0),
        ))
        .unwrap();
        assert!(filter_report(&compiler, by_sequence, std::slice::from_ref(&two_forms)).is_empty());
        assert_eq!(filter_report(&compiler, by_form, &[two_forms]).len(), 1);
    }
}
