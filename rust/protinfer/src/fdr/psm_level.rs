//! PSM-level FDR per input file, and the combined FDR score of PSM sets.

use super::decoy_strategy::{
    DecoyMatcher,
    update_decoy_states,
};
use super::qvalues::{
    FdrStatus,
    FdrSummary,
    RankedItem,
    compute_fdr_at,
    interpolated_fdr_scores,
};
use crate::compiler::Compiler;
use crate::errors::ConfigError;
use crate::models::score::{
    LOWER_IS_BETTER_FLOOR,
    PSM_AVERAGE_FDR_SCORE,
    PSM_COMBINED_FDR_SCORE,
    PSM_FDR_SCORE,
    PSM_Q_VALUE,
};
use crate::models::{
    FileId,
    PsmId,
    PsmSetId,
    ScoreDirection,
    ScoreModel,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{
    info,
    warn,
};

/// Kinds written by the FDR estimation itself, never used to rank PSMs.
fn is_derived_kind(kind: &str) -> bool {
    matches!(
        kind,
        PSM_FDR_SCORE | PSM_Q_VALUE | PSM_AVERAGE_FDR_SCORE | PSM_COMBINED_FDR_SCORE
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFdrSummary {
    pub file: String,
    pub score_kind: String,
    #[serde(flatten)]
    pub summary: FdrSummary,
}

/// Score kind used to rank the PSMs of `file`: the configured one if any,
/// otherwise the kind most PSMs of the file carry (ties go to the smaller name).
pub fn preferred_score_kind(
    compiler: &Compiler,
    file: FileId,
    preferred: &BTreeMap<String, String>,
) -> Result<Option<String>, ConfigError> {
    let counts = compiler.score_kinds_in_file(file);
    let name = compiler.file(file).name();
    if let Some(kind) = preferred.get(name) {
        if !counts.contains_key(kind) {
            return Err(ConfigError::UnresolvableScoreKind {
                kind: kind.clone(),
                context: format!("preferred score of file {}", name),
            });
        }
        return Ok(Some(kind.clone()));
    }

    let mut best: Option<(&String, usize)> = None;
    for (kind, &count) in counts.iter().filter(|(k, _)| !is_derived_kind(k)) {
        match best {
            Some((_, c)) if count <= c => {}
            _ => best = Some((kind, count)),
        }
    }
    Ok(best.map(|(k, _)| k.clone()))
}

/// Ranking value where higher is better, NaN when the score is missing.
fn rank_value(score: Option<&ScoreModel>) -> f64 {
    match score {
        Some(s) => match s.direction() {
            ScoreDirection::HigherIsBetter => s.value(),
            ScoreDirection::LowerIsBetter => -s.value(),
        },
        None => f64::NAN,
    }
}

fn store(compiler: &mut Compiler, psm: PsmId, q_value: Option<f64>, fdr_score: Option<f64>) {
    let target = compiler.psm_mut(psm);
    if let Some(q) = q_value {
        target.set_score(ScoreModel::new(PSM_Q_VALUE, q, ScoreDirection::LowerIsBetter));
    }
    if let Some(fs) = fdr_score {
        target.set_score(ScoreModel::new(PSM_FDR_SCORE, fs, ScoreDirection::LowerIsBetter));
    }
}

/// Estimates FDR separately for the PSMs of every input file.
///
/// Updates the decoy state of all PSMs with `matcher`, then stores
/// `psm_q_value` and `psm_fdr_score` on every PSM that carries the ranking
/// score. Without decoys the stored values are NaN.
pub fn compute_psm_fdr(
    compiler: &mut Compiler,
    matcher: &DecoyMatcher,
    preferred: &BTreeMap<String, String>,
    threshold: f64,
) -> Result<Vec<FileFdrSummary>, ConfigError> {
    update_decoy_states(compiler, matcher);

    let files: Vec<FileId> = compiler.files().iter().map(|f| f.id()).collect();
    let mut summaries = Vec::with_capacity(files.len());
    for file in files {
        let file_name = compiler.file(file).name().to_string();
        let Some(kind) = preferred_score_kind(compiler, file, preferred)? else {
            warn!("No score to rank the PSMs of {} by, skipping its FDR estimation", file_name);
            continue;
        };

        let mut items: Vec<RankedItem<PsmId>> = compiler
            .psms()
            .iter()
            .filter(|p| p.file() == file)
            .map(|p| {
                let key = format!(
                    "{}|{}|{}",
                    p.spectrum_ref(),
                    compiler.peptide(p.peptide()).sequence(),
                    p.modification_key()
                );
                RankedItem::new(p.id(), rank_value(p.score(&kind)), p.is_decoy(), key)
            })
            .collect();

        let summary = compute_fdr_at(&mut items, threshold);
        let fdr_scores = interpolated_fdr_scores(&items);
        for (item, fdr_score) in items.iter().zip(fdr_scores) {
            store(compiler, item.item, item.q_value, fdr_score);
        }

        match summary.status {
            FdrStatus::NoDecoysPresent => warn!(
                "No decoys among the PSMs of {}, FDR values are NaN",
                file_name
            ),
            _ => info!(
                "PSM FDR of {} on {}: {} targets, {} decoys, {} targets at q <= {}",
                file_name, kind, summary.targets, summary.decoys, summary.passing, threshold
            ),
        }
        summaries.push(FileFdrSummary {
            file: file_name,
            score_kind: kind,
            summary,
        });
    }
    Ok(summaries)
}

/// Geometric mean of the member FDR scores of a set, NaN if no member has one.
fn average_fdr_score(compiler: &Compiler, set: PsmSetId) -> f64 {
    let logs: Vec<f64> = compiler
        .psm_set(set)
        .psms()
        .iter()
        .filter_map(|&p| compiler.psm(p).score(PSM_FDR_SCORE))
        .map(|s| s.value())
        .filter(|v| !v.is_nan())
        .map(|v| v.max(LOWER_IS_BETTER_FLOOR).ln())
        .collect();
    if logs.is_empty() {
        return f64::NAN;
    }
    (logs.iter().sum::<f64>() / logs.len() as f64).exp()
}

/// Combined FDR score over all PSM sets.
///
/// Sets are ranked by the geometric mean of their members' FDR scores and
/// run through the FDR estimation again. Every set gets
/// `psm_average_fdr_score`, `psm_combined_fdr_score`, `psm_q_value` and
/// `psm_fdr_score` (the combined score).
pub fn compute_combined_fdr(
    compiler: &mut Compiler,
    matcher: &DecoyMatcher,
    threshold: f64,
) -> FdrSummary {
    update_decoy_states(compiler, matcher);

    let mut items: Vec<RankedItem<PsmSetId>> = compiler
        .psm_sets()
        .iter()
        .map(|set| {
            let average = average_fdr_score(compiler, set.id());
            let key = format!(
                "{}|{}|{}|{}",
                set.spectrum_ref(),
                compiler.peptide(set.peptide()).sequence(),
                set.modification_key(),
                set.charge()
            );
            RankedItem::new(set.id(), -average, set.is_decoy(), key)
        })
        .collect();

    let summary = compute_fdr_at(&mut items, threshold);
    let fdr_scores = interpolated_fdr_scores(&items);
    for (item, combined) in items.iter().zip(fdr_scores) {
        let set = compiler.psm_set_mut(item.item);
        let lower = ScoreDirection::LowerIsBetter;
        set.set_score(ScoreModel::new(PSM_AVERAGE_FDR_SCORE, -item.score, lower));
        let combined = combined.unwrap_or(f64::NAN);
        set.set_score(ScoreModel::new(PSM_COMBINED_FDR_SCORE, combined, lower));
        set.set_score(ScoreModel::new(PSM_FDR_SCORE, combined, lower));
        set.set_score(ScoreModel::new(
            PSM_Q_VALUE,
            item.q_value.unwrap_or(f64::NAN),
            lower,
        ));
    }

    if summary.status == FdrStatus::NoDecoysPresent {
        warn!("No decoy PSM sets, the combined FDR scores are NaN");
    } else {
        info!(
            "Combined FDR over {} PSM sets: {} targets, {} decoys, {} targets at q <= {}",
            items.len(),
            summary.targets,
            summary.decoys,
            summary.passing,
            threshold
        );
    }
    summary
}
