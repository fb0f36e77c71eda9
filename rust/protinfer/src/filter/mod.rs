//! Composable filters over PSMs, PSM sets and reported proteins.

mod registry;

pub use registry::{
    AnyFilter,
    FILTER_IDENTIFIERS,
    FilterKind,
    FilterSpec,
    FilterValue,
    PSM_SCORE_FILTER_PREFIX,
    build_filter,
    build_filters,
};

use crate::compiler::Compiler;
use crate::models::{
    PsmId,
    PsmSetId,
    ReportProtein,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterComparator {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
    NotEqual,
}

impl FilterComparator {
    /// `value <op> threshold`. Always false for NaN.
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        let Some(ord) = value.partial_cmp(&threshold) else {
            return false;
        };
        match self {
            FilterComparator::Less => ord == Ordering::Less,
            FilterComparator::LessEqual => ord != Ordering::Greater,
            FilterComparator::Equal => ord == Ordering::Equal,
            FilterComparator::GreaterEqual => ord != Ordering::Less,
            FilterComparator::Greater => ord == Ordering::Greater,
            FilterComparator::NotEqual => ord != Ordering::Equal,
        }
    }

    pub fn compare_bool(&self, value: bool, threshold: bool) -> Option<bool> {
        match self {
            FilterComparator::Equal => Some(value == threshold),
            FilterComparator::NotEqual => Some(value != threshold),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilterComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterComparator::Less => write!(f, "less"),
            FilterComparator::LessEqual => write!(f, "less_equal"),
            FilterComparator::Equal => write!(f, "equal"),
            FilterComparator::GreaterEqual => write!(f, "greater_equal"),
            FilterComparator::Greater => write!(f, "greater"),
            FilterComparator::NotEqual => write!(f, "not_equal"),
        }
    }
}

impl std::str::FromStr for FilterComparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "less" | "lt" | "<" => Ok(FilterComparator::Less),
            "less_equal" | "le" | "<=" => Ok(FilterComparator::LessEqual),
            "equal" | "eq" | "=" | "==" => Ok(FilterComparator::Equal),
            "greater_equal" | "ge" | ">=" => Ok(FilterComparator::GreaterEqual),
            "greater" | "gt" | ">" => Ok(FilterComparator::Greater),
            "not_equal" | "ne" | "!=" => Ok(FilterComparator::NotEqual),
            _ => Err(format!(
                "Invalid comparator: '{}'. Valid options: less, less_equal, equal, \
                 greater_equal, greater, not_equal",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Psm,
    PsmSet,
    Protein,
}

/// Something a filter can look at, borrowed together with the compilation it lives in.
#[derive(Debug, Clone, Copy)]
pub enum FilterItem<'a> {
    Psm(&'a Compiler, PsmId),
    PsmSet(&'a Compiler, PsmSetId),
    Protein(&'a Compiler, &'a ReportProtein),
}

impl FilterItem<'_> {
    pub fn kind(&self) -> ItemKind {
        match self {
            FilterItem::Psm(..) => ItemKind::Psm,
            FilterItem::PsmSet(..) => ItemKind::PsmSet,
            FilterItem::Protein(..) => ItemKind::Protein,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Pass,
    Fail,
    /// The filter cannot judge this item.
    Unsupported,
}

impl FilterOutcome {
    pub(crate) fn from_bool(pass: bool) -> Self {
        if pass {
            FilterOutcome::Pass
        } else {
            FilterOutcome::Fail
        }
    }

    /// Flips pass and fail, an unsupported item stays unsupported.
    pub fn negate(self) -> Self {
        match self {
            FilterOutcome::Pass => FilterOutcome::Fail,
            FilterOutcome::Fail => FilterOutcome::Pass,
            FilterOutcome::Unsupported => FilterOutcome::Unsupported,
        }
    }
}

pub trait Filter {
    fn name(&self) -> &str;
    fn supports(&self, kind: ItemKind) -> bool;
    fn evaluate(&self, item: &FilterItem<'_>) -> FilterOutcome;

    fn matches(&self, item: &FilterItem<'_>) -> bool {
        self.evaluate(item) == FilterOutcome::Pass
    }
}

/// True if every filter passes the item. Filters that do not support the
/// item filter it out.
pub fn satisfies_all<F: Filter>(filters: &[F], item: &FilterItem<'_>) -> bool {
    filters.iter().all(|f| f.matches(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparators() {
        assert!(FilterComparator::LessEqual.compare(0.01, 0.01));
        assert!(!FilterComparator::Less.compare(0.01, 0.01));
        assert!(FilterComparator::GreaterEqual.compare(2.0, 1.0));
        assert!(FilterComparator::NotEqual.compare(2.0, 1.0));
        assert!(!FilterComparator::Equal.compare(f64::NAN, f64::NAN));
        assert!(!FilterComparator::NotEqual.compare(f64::NAN, 1.0));
        assert_eq!(FilterComparator::Equal.compare_bool(true, true), Some(true));
        assert_eq!(FilterComparator::Less.compare_bool(true, false), None);
    }

    #[test]
    fn test_comparator_parsing() {
        assert_eq!("<=".parse::<FilterComparator>(), Ok(FilterComparator::LessEqual));
        assert_eq!(
            "greater_equal".parse::<FilterComparator>(),
            Ok(FilterComparator::GreaterEqual)
        );
        assert!("about".parse::<FilterComparator>().is_err());
        assert_eq!(FilterComparator::NotEqual.to_string(), "not_equal");
    }

    #[test]
    fn test_negate_keeps_unsupported() {
        assert_eq!(FilterOutcome::Pass.negate(), FilterOutcome::Fail);
        assert_eq!(FilterOutcome::Fail.negate(), FilterOutcome::Pass);
        assert_eq!(FilterOutcome::Unsupported.negate(), FilterOutcome::Unsupported);
    }
}
