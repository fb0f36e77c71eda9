mod decoy_strategy;
mod protein_level;
mod psm_level;
mod qvalues;

pub use decoy_strategy::{
    DecoyMatcher,
    DecoyStrategy,
    update_decoy_states,
};
pub use protein_level::compute_protein_fdr;
pub use psm_level::{
    FileFdrSummary,
    compute_combined_fdr,
    compute_psm_fdr,
    preferred_score_kind,
};
pub use qvalues::{
    FdrStatus,
    FdrSummary,
    LabelledScore,
    RankedItem,
    TargetDecoy,
    compute_fdr,
    compute_fdr_at,
    interpolated_fdr_scores,
};
