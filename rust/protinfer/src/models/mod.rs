mod accession;
mod group;
mod handles;
mod input_file;
mod modification;
mod peptide;
mod psm;
mod psm_set;
mod report_protein;
pub mod score;

pub use accession::Accession;
pub use group::{
    EvidenceClass,
    Group,
    GroupRelation,
};
pub use handles::{
    AccessionId,
    FileId,
    GroupId,
    PeptideId,
    PsmId,
    PsmSetId,
};
pub use input_file::InputFile;
pub use modification::Modification;
pub use peptide::{
    Peptide,
    PeptideForm,
    normalize_sequence,
};
pub use psm::Psm;
pub use psm_set::PsmSet;
pub use report_protein::ReportProtein;
pub use score::{
    ScoreDirection,
    ScoreModel,
    ScoreScope,
};
