//! Concurrent ingestion: one reader thread per input source, one writer.
//!
//! Readers validate their records and send them over a bounded channel, the
//! calling thread owns the [`Compiler`] and is the only one inserting.

use super::{
    Compiler,
    PsmRecord,
    ValidatedRecord,
};
use crate::errors::CompilerError;
use crate::models::FileId;
use std::sync::mpsc::sync_channel;
use std::thread;
use tracing::{
    debug,
    info,
};

const CHANNEL_CAPACITY: usize = 1024;

/// Records of one identification file, usually a lazily parsed reader.
pub struct InputSource<I> {
    pub name: String,
    pub file_type: String,
    pub records: I,
}

impl<I> InputSource<I> {
    pub fn new(name: impl Into<String>, file_type: impl Into<String>, records: I) -> Self {
        Self {
            name: name.into(),
            file_type: file_type.into(),
            records,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub accepted: usize,
    pub rejected: usize,
}

enum Message {
    Record(FileId, Box<ValidatedRecord>),
    Rejected(CompilerError),
}

/// Reads all sources concurrently into `compiler`.
///
/// Files are registered in the order given before any reader starts, so the
/// file ids do not depend on thread scheduling. Malformed records (including
/// ones the source itself failed to parse) are counted and skipped. A fatal
/// compiler error stops the ingestion.
pub fn ingest_sources<I>(
    compiler: &mut Compiler,
    sources: Vec<InputSource<I>>,
) -> Result<IngestSummary, CompilerError>
where
    I: IntoIterator<Item = Result<PsmRecord, CompilerError>> + Send,
{
    let mut registered = Vec::with_capacity(sources.len());
    for source in sources {
        let file = compiler.insert_file(&source.name, &source.file_type)?;
        registered.push((file, source));
    }

    let mut summary = IngestSummary::default();
    thread::scope(|scope| -> Result<(), CompilerError> {
        let (sender, receiver) = sync_channel::<Message>(CHANNEL_CAPACITY);
        for (file, source) in registered {
            let sender = sender.clone();
            scope.spawn(move || {
                let mut sent = 0usize;
                for record in source.records {
                    let msg = match record.and_then(PsmRecord::validate) {
                        Ok(valid) => Message::Record(file, Box::new(valid)),
                        Err(e) => Message::Rejected(e.append_to_context(&source.name)),
                    };
                    // The receiver only hangs up after a fatal error.
                    if sender.send(msg).is_err() {
                        break;
                    }
                    sent += 1;
                }
                debug!("Reader for {} finished after {} records", source.name, sent);
            });
        }
        drop(sender);

        for msg in receiver.iter() {
            match msg {
                Message::Record(file, valid) => {
                    compiler.add_validated_psm(file, *valid)?;
                    summary.accepted += 1;
                }
                Message::Rejected(e) => {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    compiler.note_rejected(&e);
                    summary.rejected += 1;
                }
            }
        }
        Ok(())
    })?;

    info!(
        "Ingested {} PSMs, rejected {} records",
        summary.accepted, summary.rejected
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(prefix: &str, n: usize) -> Vec<Result<PsmRecord, CompilerError>> {
        (0..n)
            .map(|i| {
                Ok(PsmRecord::new("PEPTIDEK", 2, 450.0, format!("{}_{}", prefix, i))
                    .with_score("mascot_score", 10.0 + i as f64, None)
                    .with_accession(format!("P{}", i % 3)))
            })
            .collect()
    }

    #[test]
    fn test_ingest_many_sources() {
        let mut compiler = Compiler::new();
        let mut bad = records("c", 5);
        bad.push(Ok(PsmRecord::new("", 2, 450.0, "c_bad")));
        bad.push(Err(CompilerError::MalformedRecord {
            reason: "unparsable line",
            context: "line 7".to_string(),
        }));
        let sources = vec![
            InputSource::new("a", "mascot", records("a", 100)),
            InputSource::new("b", "tandem", records("b", 50)),
            InputSource::new("c", "msgf", bad),
        ];

        let summary = ingest_sources(&mut compiler, sources).unwrap();
        assert_eq!(summary.accepted, 155);
        assert_eq!(summary.rejected, 2);
        assert_eq!(compiler.rejected_records(), 2);
        assert_eq!(compiler.psms().len(), 155);
        assert_eq!(compiler.files()[0].name(), "a");
        assert_eq!(compiler.files()[2].name(), "c");
        assert_eq!(compiler.accessions().len(), 3);
    }
}
