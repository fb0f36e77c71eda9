use super::decoy_strategy::DecoyMatcher;
use super::qvalues::{
    FdrStatus,
    FdrSummary,
    RankedItem,
    compute_fdr_at,
};
use crate::compiler::Compiler;
use crate::models::ReportProtein;
use tracing::{
    info,
    warn,
};

/// Updates the decoy flags of the reported proteins and estimates their FDR.
///
/// Proteins are ranked by their score, unscored proteins keep no FDR. The
/// report keeps its order.
pub fn compute_protein_fdr(
    compiler: &Compiler,
    proteins: &mut [ReportProtein],
    matcher: &DecoyMatcher,
    threshold: f64,
) -> FdrSummary {
    for protein in proteins.iter_mut() {
        protein.decoy = matcher.protein_is_decoy(compiler, protein);
        for sub in protein.subsets.iter_mut() {
            sub.decoy = matcher.protein_is_decoy(compiler, sub);
        }
    }

    let mut items: Vec<RankedItem<usize>> = proteins
        .iter()
        .enumerate()
        .map(|(i, p)| RankedItem::new(i, p.score, p.decoy, p.accession_label()))
        .collect();
    let summary = compute_fdr_at(&mut items, threshold);
    for item in items {
        let protein = &mut proteins[item.item];
        protein.fdr = item.fdr;
        protein.q_value = item.q_value;
    }

    match summary.status {
        FdrStatus::NoDecoysPresent => warn!("No decoy proteins, protein FDR values are NaN"),
        FdrStatus::NothingScored => {
            warn!("No protein carries a score, protein FDR was not estimated")
        }
        FdrStatus::Ok => info!(
            "Protein FDR: {} targets, {} decoys, {} targets at q <= {}",
            summary.targets, summary.decoys, summary.passing, threshold
        ),
    }
    summary
}
