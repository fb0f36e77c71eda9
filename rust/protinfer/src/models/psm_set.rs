use super::{
    PeptideId,
    PsmId,
    PsmSetId,
    ScoreModel,
};
use std::collections::BTreeMap;

/// PSMs that describe the same observation (same sequence, modifications,
/// charge and spectrum), possibly reported by several search engines.
#[derive(Debug, Clone)]
pub struct PsmSet {
    pub(crate) id: PsmSetId,
    pub(crate) peptide: PeptideId,
    pub(crate) charge: i32,
    pub(crate) spectrum_ref: String,
    pub(crate) modification_key: String,
    /// Sorted.
    pub(crate) psms: Vec<PsmId>,
    pub(crate) scores: BTreeMap<String, ScoreModel>,
    pub(crate) decoy: bool,
}

impl PsmSet {
    pub fn id(&self) -> PsmSetId {
        self.id
    }

    pub fn peptide(&self) -> PeptideId {
        self.peptide
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn spectrum_ref(&self) -> &str {
        &self.spectrum_ref
    }

    pub fn modification_key(&self) -> &str {
        &self.modification_key
    }

    pub fn psms(&self) -> &[PsmId] {
        &self.psms
    }

    /// Decoy state from the last applied decoy strategy.
    pub fn is_decoy(&self) -> bool {
        self.decoy
    }

    /// Set-level scores only, see [`crate::Compiler::resolve_set_score`] for
    /// the lookup that falls back to the member PSMs.
    pub fn score(&self, kind: &str) -> Option<&ScoreModel> {
        self.scores.get(kind)
    }

    pub(crate) fn set_score(&mut self, score: ScoreModel) {
        self.scores.insert(score.kind().to_string(), score);
    }
}
