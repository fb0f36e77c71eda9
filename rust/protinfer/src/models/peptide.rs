use super::{
    AccessionId,
    GroupId,
    PeptideId,
    PsmId,
};
use serde::Serialize;

/// A unique amino acid sequence, modifications live on the PSMs.
#[derive(Debug, Clone)]
pub struct Peptide {
    pub(crate) id: PeptideId,
    pub(crate) sequence: String,
    pub(crate) psms: Vec<PsmId>,
    /// Sorted and deduplicated.
    pub(crate) accessions: Vec<AccessionId>,
    pub(crate) group: Option<GroupId>,
}

impl Peptide {
    pub(crate) fn new(id: PeptideId, sequence: String) -> Self {
        Self {
            id,
            sequence,
            psms: Vec::new(),
            accessions: Vec::new(),
            group: None,
        }
    }

    pub fn id(&self) -> PeptideId {
        self.id
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn psms(&self) -> &[PsmId] {
        &self.psms
    }

    pub fn accessions(&self) -> &[AccessionId] {
        &self.accessions
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub(crate) fn link_accession(&mut self, accession: AccessionId) {
        if let Err(pos) = self.accessions.binary_search(&accession) {
            self.accessions.insert(pos, accession);
        }
    }
}

/// A peptide as counted by protein inference.
///
/// Without modifications considered a sequence has a single form, otherwise
/// every distinct modification key of its PSM sets is a form of its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PeptideForm {
    pub peptide: PeptideId,
    /// See [`crate::models::PsmSet::modification_key`].
    pub modifications: Option<String>,
}

/// Normalises a reported sequence: surrounding whitespace is dropped and
/// residues are upper-cased. `None` for empty or non-alphabetic input.
pub fn normalize_sequence(sequence: &str) -> Option<String> {
    let trimmed = sequence.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sequence() {
        assert_eq!(normalize_sequence(" peptidek "), Some("PEPTIDEK".to_string()));
        assert_eq!(normalize_sequence(""), None);
        assert_eq!(normalize_sequence("   "), None);
        assert_eq!(normalize_sequence("PEP[+16]TIDE"), None);
    }
}
