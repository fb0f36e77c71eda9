use super::{
    AccessionId,
    GroupId,
    PeptideId,
};
use serde::Serialize;
use std::cmp::Ordering;

/// How the peptide evidence of one inference candidate relates to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRelation {
    Same,
    /// Strict subset of the other side.
    Sub,
    /// Strict superset of the other side.
    Super,
    /// Overlapping, neither contains the other.
    Parallel,
    Disjoint,
}

impl GroupRelation {
    /// Relation of `a` to `b`. Both slices must be sorted and free of duplicates.
    pub fn between<T: Ord>(a: &[T], b: &[T]) -> Self {
        let shared = Self::shared_count(a, b);
        match (shared == a.len(), shared == b.len()) {
            _ if shared == 0 && !(a.is_empty() && b.is_empty()) => GroupRelation::Disjoint,
            (true, true) => GroupRelation::Same,
            (true, false) => GroupRelation::Sub,
            (false, true) => GroupRelation::Super,
            (false, false) => GroupRelation::Parallel,
        }
    }

    /// Number of elements two sorted, duplicate free slices have in common.
    pub fn shared_count<T: Ord>(a: &[T], b: &[T]) -> usize {
        let mut shared = 0usize;
        let (mut i, mut j) = (0usize, 0usize);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }
}

/// Accessions of a group that are explained by exactly the same peptides.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceClass {
    pub(crate) accessions: Vec<AccessionId>,
    pub(crate) peptides: Vec<PeptideId>,
}

impl EvidenceClass {
    pub fn accessions(&self) -> &[AccessionId] {
        &self.accessions
    }

    pub fn peptides(&self) -> &[PeptideId] {
        &self.peptides
    }
}

/// A protein-ambiguity group: one connected component of the
/// accession-peptide graph.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub(crate) id: GroupId,
    /// Sorted by handle.
    pub(crate) accessions: Vec<AccessionId>,
    /// Sorted by handle.
    pub(crate) peptides: Vec<PeptideId>,
    /// Ordered by the smallest accession name of each class.
    pub(crate) classes: Vec<EvidenceClass>,
}

impl Group {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn accessions(&self) -> &[AccessionId] {
        &self.accessions
    }

    pub fn peptides(&self) -> &[PeptideId] {
        &self.peptides
    }

    pub fn classes(&self) -> &[EvidenceClass] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_between() {
        assert_eq!(GroupRelation::between(&[1, 2, 3], &[1, 2, 3]), GroupRelation::Same);
        assert_eq!(GroupRelation::between(&[2], &[1, 2, 3]), GroupRelation::Sub);
        assert_eq!(GroupRelation::between(&[1, 2, 3], &[3]), GroupRelation::Super);
        assert_eq!(GroupRelation::between(&[1, 2], &[2, 3]), GroupRelation::Parallel);
        assert_eq!(GroupRelation::between(&[1, 2], &[3, 4]), GroupRelation::Disjoint);
        let empty: [u32; 0] = [];
        assert_eq!(GroupRelation::between(&empty, &empty), GroupRelation::Same);
        assert_eq!(GroupRelation::between(&empty, &[1]), GroupRelation::Disjoint);
        assert_eq!(GroupRelation::shared_count(&[1, 3, 5, 7], &[3, 4, 5]), 2);
    }
}
