use super::{
    FileId,
    Modification,
    PeptideId,
    PsmId,
    PsmSetId,
    ScoreModel,
};
use std::collections::BTreeMap;

/// One spectrum-to-sequence assignment reported by one search engine.
#[derive(Debug, Clone)]
pub struct Psm {
    pub(crate) id: PsmId,
    pub(crate) file: FileId,
    // Set on creation, there is no way to re-assign it.
    peptide: PeptideId,
    pub(crate) charge: i32,
    pub(crate) precursor_mz: f64,
    pub(crate) delta_mass: Option<f64>,
    pub(crate) retention_time: Option<f64>,
    pub(crate) spectrum_ref: String,
    pub(crate) modifications: BTreeMap<usize, Modification>,
    pub(crate) decoy: Option<bool>,
    /// Set by the last decoy strategy that was applied.
    pub(crate) decoy_state: Option<bool>,
    pub(crate) rank: Option<u32>,
    pub(crate) scores: BTreeMap<String, ScoreModel>,
    pub(crate) psm_set: Option<PsmSetId>,
}

impl Psm {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: PsmId,
        file: FileId,
        peptide: PeptideId,
        charge: i32,
        precursor_mz: f64,
        delta_mass: Option<f64>,
        retention_time: Option<f64>,
        spectrum_ref: String,
    ) -> Self {
        Self {
            id,
            file,
            peptide,
            charge,
            precursor_mz,
            delta_mass,
            retention_time,
            spectrum_ref,
            modifications: BTreeMap::new(),
            decoy: None,
            decoy_state: None,
            rank: None,
            scores: BTreeMap::new(),
            psm_set: None,
        }
    }

    pub fn id(&self) -> PsmId {
        self.id
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn peptide(&self) -> PeptideId {
        self.peptide
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn precursor_mz(&self) -> f64 {
        self.precursor_mz
    }

    /// `(precursor m/z - calculated m/z) * charge`, if the calculated m/z was reported.
    pub fn delta_mass(&self) -> Option<f64> {
        self.delta_mass
    }

    pub fn retention_time(&self) -> Option<f64> {
        self.retention_time
    }

    pub fn spectrum_ref(&self) -> &str {
        &self.spectrum_ref
    }

    pub fn modifications(&self) -> &BTreeMap<usize, Modification> {
        &self.modifications
    }

    /// The decoy flag set by the search engine, if it reported one.
    pub fn engine_decoy(&self) -> Option<bool> {
        self.decoy
    }

    /// Decoy state from the applied decoy strategy, the engine flag before that.
    pub fn is_decoy(&self) -> bool {
        self.decoy_state.or(self.decoy).unwrap_or(false)
    }

    pub fn rank(&self) -> Option<u32> {
        self.rank
    }

    pub fn scores(&self) -> impl Iterator<Item = &ScoreModel> {
        self.scores.values()
    }

    pub fn score(&self, kind: &str) -> Option<&ScoreModel> {
        self.scores.get(kind)
    }

    pub fn psm_set(&self) -> Option<PsmSetId> {
        self.psm_set
    }

    pub(crate) fn set_score(&mut self, score: ScoreModel) {
        self.scores.insert(score.kind().to_string(), score);
    }

    /// Position, residue and rounded mass of every modification, in position order.
    pub fn modification_key(&self) -> String {
        self.modifications
            .iter()
            .map(|(pos, m)| format!("{}:{}:{}", pos, m.residue, m.mass_string()))
            .collect::<Vec<_>>()
            .join(";")
    }
}
