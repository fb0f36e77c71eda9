//! Builds the accession-peptide-PSM graph from the identifications of several
//! search engine runs and clusters it into protein-ambiguity groups.

pub mod clustering;
pub mod ingest;
mod psm_sets;
mod record;

pub use record::{
    AccessionRecord,
    PsmRecord,
    ScoreRecord,
    ValidatedRecord,
};

use crate::errors::CompilerError;
use crate::models::score::is_psm_set_only;
use crate::models::{
    Accession,
    AccessionId,
    EvidenceClass,
    FileId,
    Group,
    GroupId,
    InputFile,
    Peptide,
    PeptideId,
    Psm,
    PsmId,
    PsmSet,
    PsmSetId,
    ScoreModel,
};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};
use tracing::{
    debug,
    info,
    warn,
};

/// Accessions and peptides of one connected component, before it becomes a [`Group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Sorted by handle.
    pub accessions: Vec<AccessionId>,
    /// Sorted by handle.
    pub peptides: Vec<PeptideId>,
}

/// Owner of every entity of one compilation.
///
/// Entities are stored in arenas and addressed by handles, the accessors that
/// take a handle panic when given a handle of another compilation. Once
/// [`Compiler::build_groups`] ran the graph is frozen and further inserts
/// return [`CompilerError::CompilationClosed`].
#[derive(Debug, Default)]
pub struct Compiler {
    files: Vec<InputFile>,
    file_index: HashMap<String, FileId>,
    accessions: Vec<Accession>,
    accession_index: HashMap<String, AccessionId>,
    peptides: Vec<Peptide>,
    peptide_index: HashMap<String, PeptideId>,
    psms: Vec<Psm>,
    psm_sets: Vec<PsmSet>,
    psm_sets_merged: Option<bool>,
    clusters: Option<Vec<Cluster>>,
    groups: Option<Vec<Group>>,
    rejected: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_open(&self, operation: &'static str) -> Result<(), CompilerError> {
        if self.groups.is_some() {
            return Err(CompilerError::CompilationClosed { operation });
        }
        Ok(())
    }

    fn check_file(&self, file: FileId) -> Result<(), CompilerError> {
        if file.index() >= self.files.len() {
            return Err(CompilerError::UnknownHandle {
                kind: "file",
                index: file.index(),
            });
        }
        Ok(())
    }

    /// Registers an input file. A name that is already known returns its existing id.
    pub fn insert_file(&mut self, name: &str, file_type: &str) -> Result<FileId, CompilerError> {
        self.check_open("insert a file")?;
        if let Some(&id) = self.file_index.get(name) {
            return Ok(id);
        }
        let id = FileId::new(self.files.len());
        self.files.push(InputFile {
            id,
            name: name.to_string(),
            file_type: file_type.to_string(),
        });
        self.file_index.insert(name.to_string(), id);
        debug!("Registered input file {} as {}", name, id);
        Ok(id)
    }

    /// Adds one PSM and the accessions it maps to.
    ///
    /// Malformed records are counted in [`Compiler::rejected_records`] and
    /// returned as [`CompilerError::MalformedRecord`], the compilation stays usable.
    pub fn add_psm(&mut self, file: FileId, record: PsmRecord) -> Result<PsmId, CompilerError> {
        self.check_open("add a PSM")?;
        self.check_file(file)?;
        match record.validate() {
            Ok(valid) => self.add_validated_psm(file, valid),
            Err(e) => {
                self.note_rejected(&e);
                Err(e)
            }
        }
    }

    /// Drops the cached clusters and PSM sets, the next build recomputes them.
    fn invalidate_derived(&mut self) {
        self.clusters = None;
        self.psm_sets_merged = None;
    }

    pub(crate) fn note_rejected(&mut self, error: &CompilerError) {
        self.rejected += 1;
        debug!("Rejected record: {}", error);
    }

    pub(crate) fn add_validated_psm(
        &mut self,
        file: FileId,
        record: ValidatedRecord,
    ) -> Result<PsmId, CompilerError> {
        self.check_open("add a PSM")?;
        self.check_file(file)?;
        self.invalidate_derived();

        let peptide = self.peptide_for(record.sequence);
        let id = PsmId::new(self.psms.len());
        let mut psm = Psm::new(
            id,
            file,
            peptide,
            record.charge,
            record.precursor_mz,
            record.delta_mass,
            record.retention_time,
            record.spectrum_ref,
        );
        psm.modifications = record.modifications;
        psm.decoy = record.decoy;
        psm.rank = record.rank;
        for score in record.scores {
            psm.set_score(score);
        }
        self.psms.push(psm);
        self.peptides[peptide.index()].psms.push(id);

        for (name, sequence) in record.accessions {
            let accession = self.accession_for(&name, sequence);
            self.link(peptide, accession, file);
        }
        Ok(id)
    }

    fn peptide_for(&mut self, sequence: String) -> PeptideId {
        if let Some(&id) = self.peptide_index.get(&sequence) {
            return id;
        }
        let id = PeptideId::new(self.peptides.len());
        self.peptide_index.insert(sequence.clone(), id);
        self.peptides.push(Peptide::new(id, sequence));
        id
    }

    fn accession_for(&mut self, name: &str, sequence: Option<String>) -> AccessionId {
        let id = match self.accession_index.get(name) {
            Some(&id) => id,
            None => {
                let id = AccessionId::new(self.accessions.len());
                self.accession_index.insert(name.to_string(), id);
                self.accessions.push(Accession::new(id, name.to_string()));
                id
            }
        };
        let accession = &mut self.accessions[id.index()];
        if accession.sequence.is_none() {
            accession.sequence = sequence.filter(|s| !s.is_empty());
        }
        id
    }

    fn link(&mut self, peptide: PeptideId, accession: AccessionId, file: FileId) {
        let acc = &mut self.accessions[accession.index()];
        acc.link_peptide(peptide);
        acc.files.insert(file);
        self.peptides[peptide.index()].link_accession(accession);
    }

    /// Resolves or creates an accession. The first non-empty sequence is kept.
    ///
    /// An accession that never gets a peptide linked stays outside of every
    /// cluster and group, its [`Accession::group`] remains `None`.
    pub fn add_accession(
        &mut self,
        name: &str,
        sequence: Option<&str>,
    ) -> Result<AccessionId, CompilerError> {
        self.check_open("add an accession")?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CompilerError::MalformedRecord {
                reason: "empty accession",
                context: String::new(),
            });
        }
        self.invalidate_derived();
        Ok(self.accession_for(name, sequence.map(|s| s.trim().to_string())))
    }

    /// Links the peptide of `psm` to `accession`, the PSM's file is recorded on the accession.
    pub fn link_peptide_to_accession(
        &mut self,
        psm: PsmId,
        accession: AccessionId,
    ) -> Result<(), CompilerError> {
        self.check_open("link a peptide")?;
        let (peptide, file) = match self.psms.get(psm.index()) {
            Some(p) => (p.peptide(), p.file()),
            None => {
                return Err(CompilerError::UnknownHandle {
                    kind: "psm",
                    index: psm.index(),
                });
            }
        };
        if accession.index() >= self.accessions.len() {
            return Err(CompilerError::UnknownHandle {
                kind: "accession",
                index: accession.index(),
            });
        }
        self.invalidate_derived();
        self.link(peptide, accession, file);
        Ok(())
    }

    /// Connected components of the accession-peptide graph.
    ///
    /// Clusters are ordered by their smallest accession name, clusters of
    /// peptides without any accession come last ordered by their smallest
    /// sequence. Accessions without peptides are left out. Calling it again
    /// without new inserts returns the cached list.
    pub fn build_cluster_list(&mut self) -> &[Cluster] {
        if self.clusters.is_none() {
            let clusters = self.compute_clusters();
            info!(
                "Clustered {} accessions and {} peptides into {} clusters",
                self.accessions.len(),
                self.peptides.len(),
                clusters.len()
            );
            self.clusters = Some(clusters);
        }
        self.clusters.as_deref().unwrap_or_default()
    }

    fn compute_clusters(&self) -> Vec<Cluster> {
        let num_acc = self.accessions.len();
        let edges = self.accessions.iter().flat_map(|acc| {
            acc.peptides
                .iter()
                .map(move |pep| (acc.id.index(), num_acc + pep.index()))
        });
        let components = clustering::connected_components(num_acc + self.peptides.len(), edges);

        let mut clusters: Vec<Cluster> = components
            .into_iter()
            .filter_map(|nodes| {
                let (acc_nodes, pep_nodes): (Vec<usize>, Vec<usize>) =
                    nodes.into_iter().partition(|&n| n < num_acc);
                // an accession without any peptide is no evidence
                if pep_nodes.is_empty() {
                    return None;
                }
                Some(Cluster {
                    accessions: acc_nodes.into_iter().map(AccessionId::new).collect(),
                    peptides: pep_nodes
                        .into_iter()
                        .map(|n| PeptideId::new(n - num_acc))
                        .collect(),
                })
            })
            .collect();
        clusters.sort_by(|a, b| self.cluster_order(a, b));
        clusters
    }

    fn cluster_order(&self, a: &Cluster, b: &Cluster) -> Ordering {
        self.cluster_key(a).cmp(&self.cluster_key(b))
    }

    fn cluster_key<'a>(&'a self, c: &Cluster) -> (bool, Option<&'a str>, Option<&'a str>) {
        (
            c.accessions.is_empty(),
            c.accessions.iter().map(|&id| self.accession(id).name()).min(),
            c.peptides.iter().map(|&id| self.peptide(id).sequence()).min(),
        )
    }

    /// Materialises the protein-ambiguity groups and closes the compilation.
    pub fn build_groups(&mut self) -> Result<&[Group], CompilerError> {
        if self.groups.is_none() {
            let clusters = self.build_cluster_list().to_vec();
            let this = &*self;
            let groups: Vec<Group> = clusters
                .into_par_iter()
                .enumerate()
                .map(|(i, cluster)| this.materialize_group(GroupId::new(i), cluster))
                .collect();

            for group in groups.iter() {
                for &acc in group.accessions.iter() {
                    self.accessions[acc.index()].group = Some(group.id);
                }
                for &pep in group.peptides.iter() {
                    self.peptides[pep.index()].group = Some(group.id);
                }
            }
            self.verify_groups()?;

            let orphans = groups.iter().filter(|g| g.accessions.is_empty()).count();
            if orphans > 0 {
                warn!("{} peptides are not mapped to any accession", orphans);
            }
            info!("Built {} protein groups", groups.len());
            self.groups = Some(groups);
        }
        Ok(self.groups.as_deref().unwrap_or_default())
    }

    fn materialize_group(&self, id: GroupId, cluster: Cluster) -> Group {
        let mut by_peptides: BTreeMap<&[PeptideId], Vec<AccessionId>> = BTreeMap::new();
        for &acc in cluster.accessions.iter() {
            by_peptides
                .entry(self.accession(acc).peptides())
                .or_default()
                .push(acc);
        }
        let mut classes: Vec<EvidenceClass> = by_peptides
            .into_iter()
            .map(|(peptides, mut accessions)| {
                accessions.sort_by(|a, b| self.accession(*a).name().cmp(self.accession(*b).name()));
                EvidenceClass {
                    accessions,
                    peptides: peptides.to_vec(),
                }
            })
            .collect();
        classes.sort_by(|a, b| {
            self.accession(a.accessions[0])
                .name()
                .cmp(self.accession(b.accessions[0]).name())
        });

        Group {
            id,
            accessions: cluster.accessions,
            peptides: cluster.peptides,
            classes,
        }
    }

    fn verify_groups(&self) -> Result<(), CompilerError> {
        for acc in self.accessions.iter() {
            for &pep in acc.peptides.iter() {
                let peptide = self.peptide(pep);
                if acc.group.is_none() || peptide.group != acc.group {
                    return Err(CompilerError::InconsistentGroup {
                        accession: acc.name.clone(),
                        peptide: peptide.sequence.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.groups.is_some()
    }

    pub fn rejected_records(&self) -> usize {
        self.rejected
    }

    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &InputFile {
        &self.files[id.index()]
    }

    pub fn file_by_name(&self, name: &str) -> Option<&InputFile> {
        self.file_index.get(name).map(|&id| self.file(id))
    }

    pub fn accessions(&self) -> &[Accession] {
        &self.accessions
    }

    pub fn accession(&self, id: AccessionId) -> &Accession {
        &self.accessions[id.index()]
    }

    pub fn accession_by_name(&self, name: &str) -> Option<&Accession> {
        self.accession_index.get(name).map(|&id| self.accession(id))
    }

    pub fn peptides(&self) -> &[Peptide] {
        &self.peptides
    }

    pub fn peptide(&self, id: PeptideId) -> &Peptide {
        &self.peptides[id.index()]
    }

    pub fn peptide_by_sequence(&self, sequence: &str) -> Option<&Peptide> {
        self.peptide_index
            .get(&sequence.trim().to_ascii_uppercase())
            .map(|&id| self.peptide(id))
    }

    pub fn psms(&self) -> &[Psm] {
        &self.psms
    }

    pub fn psm(&self, id: PsmId) -> &Psm {
        &self.psms[id.index()]
    }

    pub(crate) fn psm_mut(&mut self, id: PsmId) -> &mut Psm {
        &mut self.psms[id.index()]
    }

    /// Empty until [`Compiler::build_psm_sets`] ran.
    pub fn psm_sets(&self) -> &[PsmSet] {
        &self.psm_sets
    }

    pub fn psm_set(&self, id: PsmSetId) -> &PsmSet {
        &self.psm_sets[id.index()]
    }

    pub(crate) fn psm_set_mut(&mut self, id: PsmSetId) -> &mut PsmSet {
        &mut self.psm_sets[id.index()]
    }

    /// Empty until [`Compiler::build_groups`] ran.
    pub fn groups(&self) -> &[Group] {
        self.groups.as_deref().unwrap_or_default()
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups()[id.index()]
    }

    /// Resolves a score on a PSM set.
    ///
    /// A value stored on the set wins. Otherwise PSM-level kinds fall back to
    /// the best value among the members, NaN counting as the worst value.
    /// Kinds that only exist for sets have no fallback.
    pub fn resolve_set_score(&self, set: PsmSetId, kind: &str) -> Option<&ScoreModel> {
        let set = self.psm_set(set);
        if let Some(score) = set.score(kind) {
            return Some(score);
        }
        if is_psm_set_only(kind) {
            return None;
        }
        set.psms
            .iter()
            .filter_map(|&psm| self.psm(psm).score(kind))
            .max_by(|a, b| match (a.value().is_nan(), b.value().is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a.direction().compare(a.value(), b.value()),
            })
    }

    /// Every score kind carried by at least one PSM or PSM set.
    pub fn score_kinds_present(&self) -> BTreeSet<String> {
        self.psms
            .iter()
            .flat_map(|p| p.scores.keys())
            .chain(self.psm_sets.iter().flat_map(|s| s.scores.keys()))
            .cloned()
            .collect()
    }

    /// Score kinds of the PSMs of one file, with the number of PSMs carrying each.
    pub fn score_kinds_in_file(&self, file: FileId) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for psm in self.psms.iter().filter(|p| p.file == file) {
            for kind in psm.scores.keys() {
                *out.entry(kind.clone()).or_insert(0) += 1;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: &str, spectrum: &str, accessions: &[&str]) -> PsmRecord {
        let mut rec =
            PsmRecord::new(seq, 2, 500.0, spectrum).with_score("mascot_score", 30.0, None);
        for acc in accessions {
            rec = rec.with_accession(*acc);
        }
        rec
    }

    #[test]
    fn test_insert_file_is_idempotent() {
        let mut compiler = Compiler::new();
        let a = compiler.insert_file("run1.mzid", "mzIdentML").unwrap();
        let b = compiler.insert_file("run1.mzid", "other").unwrap();
        assert_eq!(a, b);
        assert_eq!(compiler.files().len(), 1);
        assert_eq!(compiler.file(a).file_type(), "mzIdentML");
    }

    #[test]
    fn test_malformed_records_are_counted() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "mascot").unwrap();
        assert!(compiler.add_psm(file, record("", "s1", &["P1"])).is_err());
        assert!(compiler.add_psm(file, record("PEPTIDE", "s1", &["P1"])).is_ok());
        assert_eq!(compiler.rejected_records(), 1);
        assert_eq!(compiler.psms().len(), 1);
        assert!(compiler.accession_by_name("P1").is_some());
    }

    #[test]
    fn test_groups_and_closing() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "mascot").unwrap();
        compiler.add_psm(file, record("PEPTIDE", "s1", &["P1"])).unwrap();
        compiler.add_psm(file, record("PEPTIDEK", "s2", &["P1", "P2"])).unwrap();
        compiler.add_psm(file, record("OTHERK", "s3", &["P3"])).unwrap();
        compiler.add_psm(file, record("LONELY", "s4", &[])).unwrap();

        let groups = compiler.build_groups().unwrap().to_vec();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].accessions().len(), 2);
        assert_eq!(groups[0].peptides().len(), 2);
        assert_eq!(groups[1].accessions().len(), 1);
        assert!(groups[2].accessions().is_empty());

        // P1 and P2 have different peptide sets
        assert_eq!(groups[0].classes().len(), 2);
        let p1 = compiler.accession_by_name("P1").unwrap().id();
        assert_eq!(groups[0].classes()[0].accessions(), &[p1]);

        let again = compiler.build_groups().unwrap().to_vec();
        assert_eq!(again.len(), groups.len());
        assert!(matches!(
            compiler.add_psm(file, record("NEWONE", "s5", &["P9"])),
            Err(CompilerError::CompilationClosed { .. })
        ));
        assert!(compiler.insert_file("run2", "x").is_err());
    }

    #[test]
    fn test_same_set_accessions_share_a_class() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "mascot").unwrap();
        compiler.add_psm(file, record("PEPTIDE", "s1", &["B", "A"])).unwrap();
        compiler.build_groups().unwrap();
        let group = &compiler.groups()[0];
        assert_eq!(group.classes().len(), 1);
        let names: Vec<&str> = group.classes()[0]
            .accessions()
            .iter()
            .map(|&a| compiler.accession(a).name())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_link_peptide_to_accession() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "mascot").unwrap();
        let psm = compiler.add_psm(file, record("PEPTIDE", "s1", &["P1"])).unwrap();
        let p2 = compiler.add_accession("P2", Some("MPEPTIDEK")).unwrap();
        compiler.link_peptide_to_accession(psm, p2).unwrap();

        assert_eq!(compiler.accession(p2).sequence(), Some("MPEPTIDEK"));
        assert!(compiler.accession(p2).files().contains(&file));
        assert_eq!(compiler.build_cluster_list().len(), 1);
    }

    #[test]
    fn test_accession_without_peptides_has_no_group() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "mascot").unwrap();
        compiler.add_psm(file, record("PEPTIDE", "s1", &["P1"])).unwrap();
        let empty = compiler.add_accession("P0", None).unwrap();

        assert_eq!(compiler.build_cluster_list().len(), 1);
        let groups = compiler.build_groups().unwrap().to_vec();
        assert_eq!(groups.len(), 1);
        assert!(groups.iter().all(|g| !g.accessions().contains(&empty)));
        assert!(groups.iter().all(|g| !g.peptides().is_empty()));
        assert_eq!(compiler.accession(empty).group(), None);
    }

    #[test]
    fn test_resolve_set_score_falls_back_to_members() {
        let mut compiler = Compiler::new();
        let f1 = compiler.insert_file("run1", "mascot").unwrap();
        let f2 = compiler.insert_file("run2", "mascot").unwrap();
        compiler
            .add_psm(
                f1,
                PsmRecord::new("PEPTIDE", 2, 500.0, "s1").with_score("mascot_score", 20.0, None),
            )
            .unwrap();
        compiler
            .add_psm(
                f2,
                PsmRecord::new("PEPTIDE", 2, 500.0, "s1").with_score("mascot_score", 40.0, None),
            )
            .unwrap();
        compiler.build_psm_sets(true);

        assert_eq!(compiler.psm_sets().len(), 1);
        let set = compiler.psm_sets()[0].id();
        let best = compiler.resolve_set_score(set, "mascot_score").unwrap();
        assert_eq!(best.value(), 40.0);
        assert!(compiler
            .resolve_set_score(set, crate::models::score::PSM_COMBINED_FDR_SCORE)
            .is_none());
    }
}
