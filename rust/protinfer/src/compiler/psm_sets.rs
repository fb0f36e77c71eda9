use super::Compiler;
use crate::models::{
    PeptideId,
    PsmId,
    PsmSet,
    PsmSetId,
};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SetKey {
    sequence: String,
    modification_key: String,
    charge: i32,
    spectrum_ref: String,
    file: Option<String>,
}

impl Compiler {
    /// Groups the PSMs that describe the same observation into PSM sets.
    ///
    /// With `merge_across_files` the PSMs of different engines for the same
    /// spectrum end up in one set, otherwise the file is part of the key.
    /// Set ids follow the key order, so they do not depend on insertion order.
    /// Calling it again with the same flag and no insert in between keeps the
    /// existing sets and their scores.
    pub fn build_psm_sets(&mut self, merge_across_files: bool) -> &[PsmSet] {
        if self.psm_sets_merged == Some(merge_across_files) {
            return &self.psm_sets;
        }

        let mut keyed: BTreeMap<SetKey, Vec<PsmId>> = BTreeMap::new();
        for psm in self.psms.iter() {
            let key = SetKey {
                sequence: self.peptide(psm.peptide()).sequence().to_string(),
                modification_key: psm.modification_key(),
                charge: psm.charge,
                spectrum_ref: psm.spectrum_ref.clone(),
                file: (!merge_across_files).then(|| self.file(psm.file).name().to_string()),
            };
            keyed.entry(key).or_default().push(psm.id);
        }

        let mut sets = Vec::with_capacity(keyed.len());
        for (i, (key, mut psms)) in keyed.into_iter().enumerate() {
            psms.sort();
            let id = PsmSetId::new(i);
            let peptide = self.psm(psms[0]).peptide();
            let decoy = psms.iter().any(|&psm| self.psm(psm).is_decoy());
            for &psm in psms.iter() {
                self.psms[psm.index()].psm_set = Some(id);
            }
            sets.push(PsmSet {
                id,
                peptide,
                charge: key.charge,
                spectrum_ref: key.spectrum_ref,
                modification_key: key.modification_key,
                psms,
                scores: BTreeMap::new(),
                decoy,
            });
        }

        info!(
            "Built {} PSM sets from {} PSMs (merged across files: {})",
            sets.len(),
            self.psms.len(),
            merge_across_files
        );
        self.psm_sets = sets;
        self.psm_sets_merged = Some(merge_across_files);
        &self.psm_sets
    }

    /// PSM sets of one peptide.
    pub fn psm_sets_of_peptide(&self, peptide: PeptideId) -> Vec<PsmSetId> {
        let mut sets: Vec<PsmSetId> = self
            .peptide(peptide)
            .psms()
            .iter()
            .filter_map(|&psm| self.psm(psm).psm_set())
            .collect();
        sets.sort();
        sets.dedup();
        sets
    }
}
