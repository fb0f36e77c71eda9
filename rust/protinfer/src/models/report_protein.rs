use super::{
    AccessionId,
    GroupId,
    PeptideForm,
    PeptideId,
    PsmSetId,
};
use serde::Serialize;

/// A protein as reported by protein inference.
///
/// Holds one or more accessions that share the same evidence, the first one
/// being the representative. Only the inference and FDR engines mutate it.
#[derive(Debug, Clone, Serialize)]
pub struct ReportProtein {
    pub(crate) group: GroupId,
    pub(crate) accession_ids: Vec<AccessionId>,
    pub(crate) accessions: Vec<String>,
    /// Distinct sequences, sorted by handle.
    pub(crate) peptides: Vec<PeptideId>,
    /// The evidence inference counted, sorted.
    pub(crate) forms: Vec<PeptideForm>,
    /// Sorted by handle.
    pub(crate) psm_sets: Vec<PsmSetId>,
    pub(crate) nr_psms: usize,
    pub(crate) nr_spectra: usize,
    pub(crate) nr_unique_peptides: usize,
    pub(crate) score: f64,
    pub(crate) decoy: bool,
    pub(crate) fdr: Option<f64>,
    pub(crate) q_value: Option<f64>,
    /// Candidates whose evidence is already explained by this protein.
    pub(crate) subsets: Vec<ReportProtein>,
}

impl ReportProtein {
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// The representative accession.
    pub fn representative(&self) -> &str {
        &self.accessions[0]
    }

    pub fn accessions(&self) -> &[String] {
        &self.accessions
    }

    pub fn accession_ids(&self) -> &[AccessionId] {
        &self.accession_ids
    }

    pub fn peptides(&self) -> &[PeptideId] {
        &self.peptides
    }

    pub fn forms(&self) -> &[PeptideForm] {
        &self.forms
    }

    pub fn psm_sets(&self) -> &[PsmSetId] {
        &self.psm_sets
    }

    /// Number of peptide forms, equal to the number of sequences unless
    /// modifications were considered.
    pub fn nr_peptides(&self) -> usize {
        self.forms.len()
    }

    pub fn nr_psms(&self) -> usize {
        self.nr_psms
    }

    pub fn nr_spectra(&self) -> usize {
        self.nr_spectra
    }

    /// Peptide forms not explained by any other reported protein of the same group.
    pub fn nr_unique_peptides(&self) -> usize {
        self.nr_unique_peptides
    }

    /// NaN if no PSM of this protein carried the scoring score.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn is_decoy(&self) -> bool {
        self.decoy
    }

    pub fn fdr(&self) -> Option<f64> {
        self.fdr
    }

    pub fn q_value(&self) -> Option<f64> {
        self.q_value
    }

    pub fn subsets(&self) -> &[ReportProtein] {
        &self.subsets
    }

    /// Comma separated accessions, the way protein lists are usually exported.
    pub fn accession_label(&self) -> String {
        self.accessions.join(",")
    }
}
