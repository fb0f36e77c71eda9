use serde::Serialize;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDecoy {
    Target,
    Decoy,
}

impl From<bool> for TargetDecoy {
    fn from(is_decoy: bool) -> Self {
        if is_decoy {
            TargetDecoy::Decoy
        } else {
            TargetDecoy::Target
        }
    }
}

/// Something that can be ranked by a score and tagged as target or decoy.
pub trait LabelledScore {
    /// Higher is better. NaN marks an unscored item.
    fn get_score(&self) -> f64;
    fn get_label(&self) -> TargetDecoy;
    /// Breaks ties between targets (and between decoys) with the same score.
    fn secondary_key(&self) -> &str;
    fn assign_fdr(&mut self, fdr: f64);
    fn assign_qval(&mut self, q_value: f64);
    fn get_qval(&self) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FdrStatus {
    Ok,
    /// Nothing was tagged as decoy, FDR and q-values are NaN.
    NoDecoysPresent,
    NothingScored,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FdrSummary {
    pub targets: usize,
    pub decoys: usize,
    pub unscored: usize,
    pub status: FdrStatus,
    pub threshold: Option<f64>,
    /// Targets with a q-value at or below the threshold.
    pub passing: usize,
}

fn rank_order<T: LabelledScore>(a: &T, b: &T) -> Ordering {
    let (sa, sb) = (a.get_score(), b.get_score());
    match (sa.is_nan(), sb.is_nan()) {
        (true, true) => return a.secondary_key().cmp(b.secondary_key()),
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    sb.total_cmp(&sa)
        .then_with(|| {
            let rank = |x: &T| match x.get_label() {
                TargetDecoy::Target => 0u8,
                TargetDecoy::Decoy => 1u8,
            };
            rank(a).cmp(&rank(b))
        })
        .then_with(|| a.secondary_key().cmp(b.secondary_key()))
}

/// Sorts `scores` best first and assigns FDR and q-values in place.
///
/// The local FDR at a rank is the number of decoys divided by the number of
/// targets at or above it. The q-value is the minimum FDR at that rank or
/// any worse one, so q-values never decrease down the list. Unscored items
/// end up at the bottom and are left untouched.
///
/// Ranking follows the Sage implementation of qval (github.com/lazear/sage),
/// except that decoys are counted as they are, without a pseudo count.
pub fn compute_fdr<T: LabelledScore>(scores: &mut [T]) -> FdrSummary {
    scores.sort_by(rank_order);

    let total = scores.len();
    let scored = scores.iter().take_while(|s| !s.get_score().is_nan()).count();
    let ranked = &mut scores[..scored];
    let decoys = ranked
        .iter()
        .filter(|s| s.get_label() == TargetDecoy::Decoy)
        .count();
    let mut summary = FdrSummary {
        targets: scored - decoys,
        decoys,
        unscored: total - scored,
        status: FdrStatus::Ok,
        threshold: None,
        passing: 0,
    };

    if scored == 0 {
        summary.status = FdrStatus::NothingScored;
        return summary;
    }
    if decoys == 0 {
        for score in ranked.iter_mut() {
            score.assign_fdr(f64::NAN);
            score.assign_qval(f64::NAN);
        }
        summary.status = FdrStatus::NoDecoysPresent;
        return summary;
    }

    let mut decoy = 0usize;
    let mut target = 0usize;
    for score in ranked.iter_mut() {
        match score.get_label() {
            TargetDecoy::Decoy => decoy += 1,
            TargetDecoy::Target => target += 1,
        }
        let fdr = if target == 0 {
            0.0
        } else {
            decoy as f64 / target as f64
        };
        score.assign_fdr(fdr);
        score.assign_qval(fdr);
    }

    // Reverse slice, and calculate the cumulative minimum
    let mut q_min = f64::INFINITY;
    for score in ranked.iter_mut().rev() {
        if let Some(q) = score.get_qval() {
            q_min = q_min.min(q);
        }
        score.assign_qval(q_min);
    }
    summary
}

/// Like [`compute_fdr`], also counting the targets that pass `threshold`.
pub fn compute_fdr_at<T: LabelledScore>(scores: &mut [T], threshold: f64) -> FdrSummary {
    let mut summary = compute_fdr(scores);
    summary.threshold = Some(threshold);
    summary.passing = scores
        .iter()
        .filter(|s| s.get_label() == TargetDecoy::Target)
        .filter(|s| s.get_qval().is_some_and(|q| q <= threshold))
        .count();
    summary
}

/// A ranked item that only carries what the FDR estimation needs, pointing
/// back at the entity it was built from.
#[derive(Debug, Clone)]
pub struct RankedItem<K> {
    pub item: K,
    pub score: f64,
    pub label: TargetDecoy,
    pub key: String,
    pub fdr: Option<f64>,
    pub q_value: Option<f64>,
}

impl<K> RankedItem<K> {
    pub fn new(item: K, score: f64, decoy: bool, key: String) -> Self {
        Self {
            item,
            score,
            label: decoy.into(),
            key,
            fdr: None,
            q_value: None,
        }
    }
}

impl<K> LabelledScore for RankedItem<K> {
    fn get_score(&self) -> f64 {
        self.score
    }

    fn get_label(&self) -> TargetDecoy {
        self.label
    }

    fn secondary_key(&self) -> &str {
        &self.key
    }

    fn assign_fdr(&mut self, fdr: f64) {
        self.fdr = Some(fdr);
    }

    fn assign_qval(&mut self, q_value: f64) {
        self.q_value = Some(q_value);
    }

    fn get_qval(&self) -> Option<f64> {
        self.q_value
    }
}

/// FDR score by interpolation between the q-values at the decoys.
///
/// `ranked` must be sorted and carry q-values, as left by [`compute_fdr`].
/// The first anchor is the best score with an FDR score of 0, every decoy adds
/// an anchor at its own score and q-value. Items between two anchors are
/// interpolated linearly in score, items below the last decoy keep their q-value.
pub fn interpolated_fdr_scores<T: LabelledScore>(ranked: &[T]) -> Vec<Option<f64>> {
    let scored: Vec<&T> = ranked
        .iter()
        .take_while(|s| !s.get_score().is_nan())
        .collect();
    let mut out = vec![None; ranked.len()];
    if scored.is_empty() {
        return out;
    }

    let mut anchors: Vec<(f64, f64)> = vec![(scored[0].get_score(), 0.0)];
    for s in scored.iter() {
        if s.get_label() == TargetDecoy::Decoy {
            if let Some(q) = s.get_qval() {
                anchors.push((s.get_score(), q));
            }
        }
    }
    if anchors.len() == 1 {
        // no decoys, nothing to interpolate between
        for (slot, s) in out.iter_mut().zip(scored.iter()) {
            *slot = s.get_qval();
        }
        return out;
    }

    let mut next_anchor = 1usize;
    for (slot, s) in out.iter_mut().zip(scored.iter()) {
        let score = s.get_score();
        while next_anchor < anchors.len() && anchors[next_anchor].0 > score {
            next_anchor += 1;
        }
        if next_anchor >= anchors.len() {
            *slot = s.get_qval();
            continue;
        }
        let (sa, va) = anchors[next_anchor - 1];
        let (sb, vb) = anchors[next_anchor];
        *slot = if sa == sb {
            Some(vb)
        } else {
            Some(va + (vb - va) * (sa - score) / (sa - sb))
        };
    }
    out
}
