use super::FileId;
use serde::Serialize;

/// One identification file, i.e. the output of one search engine run.
#[derive(Debug, Clone, Serialize)]
pub struct InputFile {
    pub(crate) id: FileId,
    pub(crate) name: String,
    pub(crate) file_type: String,
}

impl InputFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form engine/format tag, e.g. `mascot` or `idXML`.
    pub fn file_type(&self) -> &str {
        &self.file_type
    }
}
