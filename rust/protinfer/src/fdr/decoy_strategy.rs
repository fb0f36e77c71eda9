use crate::compiler::Compiler;
use crate::errors::ConfigError;
use crate::models::{
    PeptideId,
    Psm,
    PsmSet,
    ReportProtein,
};
use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

/// How decoys are told apart from targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum DecoyStrategy {
    /// Decoy if any accession matches the regular expression as a whole,
    /// e.g. `DECOY_.*` or `s.*`.
    AccessionPattern { pattern: String },

    /// Trust the decoy flag reported by the search engine (default)
    #[default]
    SearchEngineSpecific,
}

impl std::fmt::Display for DecoyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoyStrategy::AccessionPattern { pattern } => {
                write!(f, "accession-pattern:{}", pattern)
            }
            DecoyStrategy::SearchEngineSpecific => write!(f, "search-engine"),
        }
    }
}

impl std::str::FromStr for DecoyStrategy {
    type Err = String;

    /// `search-engine`, or `accession-pattern:<regex>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((head, pattern)) = s.split_once(':') {
            return match head.to_lowercase().as_str() {
                "accession-pattern" | "accession_pattern" | "pattern" => {
                    Ok(DecoyStrategy::AccessionPattern {
                        pattern: pattern.to_string(),
                    })
                }
                _ => Err(format!("Invalid decoy strategy: '{}'", s)),
            };
        }
        match s.to_lowercase().as_str() {
            "search-engine" | "search_engine" | "search_engine_specific" | "searchengine" => {
                Ok(DecoyStrategy::SearchEngineSpecific)
            }
            _ => Err(format!(
                "Invalid decoy strategy: '{}'. Valid options: search-engine, \
                 accession-pattern:<regex>",
                s
            )),
        }
    }
}

impl DecoyStrategy {
    pub fn compile(&self) -> Result<DecoyMatcher, ConfigError> {
        match self {
            DecoyStrategy::AccessionPattern { pattern } => Regex::new(&format!("^(?:{})$", pattern))
                .map(DecoyMatcher::Pattern)
                .map_err(|source| ConfigError::InvalidDecoyPattern {
                    pattern: pattern.clone(),
                    source,
                }),
            DecoyStrategy::SearchEngineSpecific => Ok(DecoyMatcher::SearchEngine),
        }
    }
}

/// A [`DecoyStrategy`] ready to be applied.
#[derive(Debug, Clone)]
pub enum DecoyMatcher {
    Pattern(Regex),
    SearchEngine,
}

impl DecoyMatcher {
    pub fn accession_is_decoy(&self, accession: &str) -> bool {
        match self {
            DecoyMatcher::Pattern(re) => re.is_match(accession),
            DecoyMatcher::SearchEngine => false,
        }
    }

    fn peptide_is_decoy(&self, compiler: &Compiler, peptide: PeptideId) -> bool {
        compiler
            .peptide(peptide)
            .accessions()
            .iter()
            .any(|&acc| self.accession_is_decoy(compiler.accession(acc).name()))
    }

    pub fn psm_is_decoy(&self, compiler: &Compiler, psm: &Psm) -> bool {
        match self {
            DecoyMatcher::Pattern(_) => self.peptide_is_decoy(compiler, psm.peptide()),
            DecoyMatcher::SearchEngine => psm.engine_decoy().unwrap_or(false),
        }
    }

    /// A set is a decoy as soon as one of its PSMs is.
    pub fn set_is_decoy(&self, compiler: &Compiler, set: &PsmSet) -> bool {
        match self {
            DecoyMatcher::Pattern(_) => self.peptide_is_decoy(compiler, set.peptide()),
            DecoyMatcher::SearchEngine => set
                .psms()
                .iter()
                .any(|&psm| compiler.psm(psm).engine_decoy().unwrap_or(false)),
        }
    }

    /// With engine flags a protein is a decoy only if all its PSM sets are.
    pub fn protein_is_decoy(&self, compiler: &Compiler, protein: &ReportProtein) -> bool {
        match self {
            DecoyMatcher::Pattern(_) => protein
                .accessions()
                .iter()
                .any(|acc| self.accession_is_decoy(acc)),
            DecoyMatcher::SearchEngine => {
                !protein.psm_sets().is_empty()
                    && protein
                        .psm_sets()
                        .iter()
                        .all(|&set| self.set_is_decoy(compiler, compiler.psm_set(set)))
            }
        }
    }
}

/// Writes the decoy state of `matcher` to every PSM and PSM set.
pub fn update_decoy_states(compiler: &mut Compiler, matcher: &DecoyMatcher) {
    let psm_states: Vec<bool> = compiler
        .psms()
        .iter()
        .map(|psm| matcher.psm_is_decoy(compiler, psm))
        .collect();
    for (i, decoy) in psm_states.into_iter().enumerate() {
        let id = compiler.psms()[i].id();
        compiler.psm_mut(id).decoy_state = Some(decoy);
    }

    let set_states: Vec<bool> = compiler
        .psm_sets()
        .iter()
        .map(|set| matcher.set_is_decoy(compiler, set))
        .collect();
    for (i, decoy) in set_states.into_iter().enumerate() {
        let id = compiler.psm_sets()[i].id();
        compiler.psm_set_mut(id).decoy = decoy;
    }
}
