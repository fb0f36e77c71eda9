use super::InferenceParams;
use crate::compiler::Compiler;
use crate::filter::{
    FilterItem,
    satisfies_all,
};
use crate::models::{
    AccessionId,
    Group,
    PeptideForm,
    PeptideId,
    PsmSetId,
    ReportProtein,
};
use crate::scoring::CandidateEvidence;
use std::collections::{
    BTreeMap,
    BTreeSet,
};

/// The part of a group that survived the PSM-level filters.
pub(crate) struct GroupEvidence<'a> {
    pub compiler: &'a Compiler,
    pub group: &'a Group,
    /// Peptide forms with at least one surviving PSM set.
    pub sets_of_form: BTreeMap<PeptideForm, Vec<PsmSetId>>,
}

impl<'a> GroupEvidence<'a> {
    pub fn collect(compiler: &'a Compiler, group: &'a Group, params: &InferenceParams<'_>) -> Self {
        let mut sets_of_form: BTreeMap<PeptideForm, Vec<PsmSetId>> = BTreeMap::new();
        for &peptide in group.peptides() {
            for set in compiler.psm_sets_of_peptide(peptide) {
                if !satisfies_all(params.filters, &FilterItem::PsmSet(compiler, set)) {
                    continue;
                }
                let modifications = params
                    .consider_modifications
                    .then(|| compiler.psm_set(set).modification_key().to_string());
                sets_of_form
                    .entry(PeptideForm {
                        peptide,
                        modifications,
                    })
                    .or_default()
                    .push(set);
            }
        }
        Self {
            compiler,
            group,
            sets_of_form,
        }
    }

    /// Surviving forms of `peptides` (sorted by handle), in key order.
    pub fn surviving_forms(&self, peptides: &[PeptideId]) -> Vec<PeptideForm> {
        let mut forms = Vec::new();
        for &peptide in peptides {
            let start = PeptideForm {
                peptide,
                modifications: None,
            };
            forms.extend(
                self.sets_of_form
                    .range(start..)
                    .take_while(|(form, _)| form.peptide == peptide)
                    .map(|(form, _)| form.clone()),
            );
        }
        forms
    }

    /// Builds a protein from accessions (sorted by name) and the peptide forms
    /// it explains. Decoy state and FDR are filled in later.
    pub fn report_protein(
        &self,
        accessions: Vec<AccessionId>,
        forms: Vec<PeptideForm>,
        params: &InferenceParams<'_>,
    ) -> ReportProtein {
        let mut psm_sets: Vec<PsmSetId> = forms
            .iter()
            .filter_map(|form| self.sets_of_form.get(form))
            .flatten()
            .copied()
            .collect();
        psm_sets.sort();
        psm_sets.dedup();
        let mut peptides: Vec<PeptideId> = forms.iter().map(|form| form.peptide).collect();
        peptides.dedup();

        let nr_psms = psm_sets
            .iter()
            .map(|&set| self.compiler.psm_set(set).psms().len())
            .sum::<usize>();
        let nr_spectra = psm_sets
            .iter()
            .map(|&set| self.compiler.psm_set(set).spectrum_ref())
            .collect::<BTreeSet<_>>()
            .len();

        let score = params.scoring.score(
            &CandidateEvidence {
                compiler: self.compiler,
                group: self.group.id(),
                accessions: &accessions,
                psm_sets: &psm_sets,
            },
            params.policy,
        );

        ReportProtein {
            group: self.group.id(),
            accessions: accessions
                .iter()
                .map(|&acc| self.compiler.accession(acc).name().to_string())
                .collect(),
            accession_ids: accessions,
            peptides,
            forms,
            psm_sets,
            nr_psms,
            nr_spectra,
            nr_unique_peptides: 0,
            score,
            decoy: false,
            fdr: None,
            q_value: None,
            subsets: Vec::new(),
        }
    }
}

/// Sets `nr_unique_peptides` of every protein to the number of its peptide
/// forms no other protein of the list explains.
pub(crate) fn count_unique_peptides(proteins: &mut [ReportProtein]) {
    let mut seen_by: BTreeMap<&PeptideForm, usize> = BTreeMap::new();
    for protein in proteins.iter() {
        for form in protein.forms.iter() {
            *seen_by.entry(form).or_insert(0) += 1;
        }
    }
    let unique: Vec<usize> = proteins
        .iter()
        .map(|protein| {
            protein
                .forms
                .iter()
                .filter(|form| seen_by.get(form) == Some(&1))
                .count()
        })
        .collect();
    for (protein, nr_unique) in proteins.iter_mut().zip(unique) {
        protein.nr_unique_peptides = nr_unique;
    }
}

/// Candidates made of accessions that share exactly the same surviving
/// peptide forms, ordered by representative (smallest accession name first).
///
/// Starts from the evidence classes of the group, classes whose surviving
/// evidence became equal after filtering are merged.
pub(crate) fn collapse_same_sets(
    evidence: &GroupEvidence<'_>,
) -> Vec<(Vec<AccessionId>, Vec<PeptideForm>)> {
    let compiler = evidence.compiler;
    let mut by_forms: BTreeMap<Vec<PeptideForm>, Vec<AccessionId>> = BTreeMap::new();
    for class in evidence.group.classes() {
        let forms = evidence.surviving_forms(class.peptides());
        if !forms.is_empty() {
            by_forms
                .entry(forms)
                .or_default()
                .extend(class.accessions().iter().copied());
        }
    }
    let mut out: Vec<(Vec<AccessionId>, Vec<PeptideForm>)> = by_forms
        .into_iter()
        .map(|(forms, mut accessions)| {
            accessions.sort_by(|a, b| {
                compiler
                    .accession(*a)
                    .name()
                    .cmp(compiler.accession(*b).name())
            });
            (accessions, forms)
        })
        .collect();
    out.sort_by(|a, b| {
        compiler
            .accession(a.0[0])
            .name()
            .cmp(compiler.accession(b.0[0]).name())
    });
    out
}
