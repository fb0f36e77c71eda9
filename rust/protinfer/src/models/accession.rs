use super::{
    AccessionId,
    FileId,
    GroupId,
    PeptideId,
};
use std::collections::BTreeSet;

/// A protein identifier, unique by its accession string within one compilation.
#[derive(Debug, Clone)]
pub struct Accession {
    pub(crate) id: AccessionId,
    pub(crate) name: String,
    pub(crate) sequence: Option<String>,
    pub(crate) files: BTreeSet<FileId>,
    /// Sorted and deduplicated.
    pub(crate) peptides: Vec<PeptideId>,
    pub(crate) group: Option<GroupId>,
}

impl Accession {
    pub(crate) fn new(id: AccessionId, name: String) -> Self {
        Self {
            id,
            name,
            sequence: None,
            files: BTreeSet::new(),
            peptides: Vec::new(),
            group: None,
        }
    }

    pub fn id(&self) -> AccessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    pub fn files(&self) -> &BTreeSet<FileId> {
        &self.files
    }

    pub fn peptides(&self) -> &[PeptideId] {
        &self.peptides
    }

    /// `None` until the groups are built.
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub(crate) fn link_peptide(&mut self, peptide: PeptideId) {
        if let Err(pos) = self.peptides.binary_search(&peptide) {
            self.peptides.insert(pos, peptide);
        }
    }
}
