//! Parsimonious inference: the smallest set of proteins, picked greedily,
//! that explains all surviving peptides of a group.

use super::evidence::{
    GroupEvidence,
    collapse_same_sets,
    count_unique_peptides,
};
use super::{
    InferenceParams,
    InferenceStrategy,
    check_ready,
};
use crate::compiler::Compiler;
use crate::errors::InferenceError;
use crate::models::{
    GroupRelation,
    PeptideForm,
    ReportProtein,
};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SpectrumExtractor;

/// Higher is better, unscored candidates lose against everything.
fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.total_cmp(&b),
    }
}

/// Candidates whose evidence is a strict subset of another candidate's.
/// They are never reported on their own, only as subsets.
fn sub_candidates(candidates: &[ReportProtein]) -> Vec<bool> {
    candidates
        .iter()
        .map(|c| {
            candidates
                .iter()
                .any(|other| GroupRelation::between(&c.forms, &other.forms) == GroupRelation::Sub)
        })
        .collect()
}

fn infer_group(evidence: &GroupEvidence<'_>, params: &InferenceParams<'_>) -> Vec<ReportProtein> {
    let candidates: Vec<ReportProtein> = collapse_same_sets(evidence)
        .into_iter()
        .map(|(accessions, forms)| evidence.report_protein(accessions, forms, params))
        .collect();
    let is_sub = sub_candidates(&candidates);

    let mut unexplained: BTreeSet<&PeptideForm> =
        candidates.iter().flat_map(|c| c.forms.iter()).collect();
    let mut chosen: Vec<usize> = Vec::new();
    let mut is_chosen = vec![false; candidates.len()];

    while !unexplained.is_empty() {
        let gain = |c: &ReportProtein| c.forms.iter().filter(|f| unexplained.contains(f)).count();
        let best = (0..candidates.len())
            .filter(|&i| !is_chosen[i] && !is_sub[i])
            .max_by(|&i, &j| {
                let (a, b) = (&candidates[i], &candidates[j]);
                gain(a)
                    .cmp(&gain(b))
                    .then_with(|| compare_scores(a.score, b.score))
                    // smaller accession wins, so it has to compare as greater
                    .then_with(|| b.representative().cmp(a.representative()))
            });
        let Some(best) = best else {
            break;
        };
        if gain(&candidates[best]) == 0 {
            break;
        }
        for form in candidates[best].forms.iter() {
            unexplained.remove(form);
        }
        is_chosen[best] = true;
        chosen.push(best);
    }

    // Every candidate not chosen is explained by the chosen ones, either by
    // one of them alone or by several together.
    let mut attached: Vec<Vec<usize>> = vec![Vec::new(); chosen.len()];
    for (i, candidate) in candidates.iter().enumerate().filter(|(i, _)| !is_chosen[*i]) {
        let covering = chosen.iter().position(|&c| {
            matches!(
                GroupRelation::between(&candidate.forms, &candidates[c].forms),
                GroupRelation::Sub | GroupRelation::Same
            )
        });
        let target = covering.unwrap_or_else(|| {
            let shared =
                |c: usize| GroupRelation::shared_count(&candidate.forms, &candidates[c].forms);
            let mut best = 0usize;
            for pos in 1..chosen.len() {
                if shared(chosen[pos]) > shared(chosen[best]) {
                    best = pos;
                }
            }
            best
        });
        if !chosen.is_empty() {
            attached[target].push(i);
        }
    }

    let mut slots: Vec<Option<ReportProtein>> = candidates.into_iter().map(Some).collect();
    let mut proteins: Vec<ReportProtein> = Vec::with_capacity(chosen.len());
    for (pos, &c) in chosen.iter().enumerate() {
        let Some(mut protein) = slots[c].take() else {
            continue;
        };
        protein.subsets = attached[pos].iter().filter_map(|&i| slots[i].take()).collect();
        protein
            .subsets
            .sort_by(|a, b| a.representative().cmp(b.representative()));
        proteins.push(protein);
    }
    count_unique_peptides(&mut proteins);
    proteins.sort_by(|a, b| a.representative().cmp(b.representative()));

    debug!(
        "Group {}: {} proteins explain {} peptide forms",
        evidence.group.id(),
        proteins.len(),
        evidence.sets_of_form.len()
    );
    proteins
}

impl InferenceStrategy for SpectrumExtractor {
    fn name(&self) -> &str {
        "spectrum_extractor"
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
                infer_group(&evidence, params)
            })
            .collect();
        Ok(per_group.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_scores() {
        assert_eq!(compare_scores(2.0, 1.0), Ordering::Greater);
        assert_eq!(compare_scores(f64::NAN, -100.0), Ordering::Less);
        assert_eq!(compare_scores(f64::NAN, f64::NAN), Ordering::Equal);
    }
}
