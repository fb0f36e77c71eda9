use super::evidence::{
    GroupEvidence,
    count_unique_peptides,
};
use super::{
    InferenceParams,
    InferenceStrategy,
    check_ready,
};
use crate::compiler::Compiler;
use crate::errors::InferenceError;
use crate::models::ReportProtein;
use rayon::prelude::*;

/// Reports every accession that has at least one surviving PSM set.
#[derive(Debug, Clone, Default)]
pub struct ReportAll;

impl InferenceStrategy for ReportAll {
    fn name(&self) -> &str {
        "report_all"
    }

    fn infer(
        &self,
        compiler: &Compiler,
        params: &InferenceParams<'_>,
    ) -> Result<Vec<ReportProtein>, InferenceError> {
        check_ready(compiler)?;
        let per_group: Vec<Vec<ReportProtein>> = compiler
            .groups()
            .par_iter()
            .map(|group| {
                let evidence = GroupEvidence::collect(compiler, group, params);
                let mut proteins: Vec<ReportProtein> = group
                    .accessions()
                    .iter()
                    .filter_map(|&acc| {
                        let forms = evidence.surviving_forms(compiler.accession(acc).peptides());
                        if forms.is_empty() {
                            return None;
                        }
                        Some(evidence.report_protein(vec![acc], forms, params))
                    })
                    .collect();
                count_unique_peptides(&mut proteins);
                proteins.sort_by(|a, b| a.representative().cmp(b.representative()));
                proteins
            })
            .collect();
        Ok(per_group.into_iter().flatten().collect())
    }
}
