use crate::errors::CompilerError;
use crate::models::score::known_score;
use crate::models::{
    Modification,
    ScoreDirection,
    ScoreModel,
    normalize_sequence,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// A PSM as handed over by a format parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsmRecord {
    pub sequence: String,
    pub charge: i32,
    pub precursor_mz: f64,
    #[serde(default)]
    pub calc_mz: Option<f64>,
    #[serde(default)]
    pub retention_time: Option<f64>,
    /// Spectrum title, native id or index, whatever identifies the spectrum
    /// across engines that searched the same run.
    pub spectrum_ref: String,
    /// Keyed by position, 0 is the N-terminus and `len + 1` the C-terminus.
    #[serde(default)]
    pub modifications: BTreeMap<usize, Modification>,
    #[serde(default)]
    pub decoy: Option<bool>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
    #[serde(default)]
    pub accessions: Vec<AccessionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub kind: String,
    pub value: f64,
    /// Can be left out for the registered score kinds.
    #[serde(default)]
    pub direction: Option<ScoreDirection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessionRecord {
    pub accession: String,
    #[serde(default)]
    pub sequence: Option<String>,
}

impl PsmRecord {
    pub fn new(
        sequence: impl Into<String>,
        charge: i32,
        precursor_mz: f64,
        spectrum_ref: impl Into<String>,
    ) -> Self {
        Self {
            sequence: sequence.into(),
            charge,
            precursor_mz,
            calc_mz: None,
            retention_time: None,
            spectrum_ref: spectrum_ref.into(),
            modifications: BTreeMap::new(),
            decoy: None,
            rank: None,
            scores: Vec::new(),
            accessions: Vec::new(),
        }
    }

    pub fn with_score(
        mut self,
        kind: impl Into<String>,
        value: f64,
        direction: Option<ScoreDirection>,
    ) -> Self {
        self.scores.push(ScoreRecord {
            kind: kind.into(),
            value,
            direction,
        });
        self
    }

    pub fn with_accession(mut self, accession: impl Into<String>) -> Self {
        self.accessions.push(AccessionRecord {
            accession: accession.into(),
            sequence: None,
        });
        self
    }

    pub fn with_modification(mut self, position: usize, modification: Modification) -> Self {
        self.modifications.insert(position, modification);
        self
    }

    pub fn with_decoy(mut self, decoy: bool) -> Self {
        self.decoy = Some(decoy);
        self
    }

    pub fn with_calc_mz(mut self, calc_mz: f64) -> Self {
        self.calc_mz = Some(calc_mz);
        self
    }

    pub fn with_retention_time(mut self, retention_time: f64) -> Self {
        self.retention_time = Some(retention_time);
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    /// Checks the record and resolves its score directions.
    ///
    /// This does not touch any shared state, so it can run on the producer side
    /// of a concurrent ingestion.
    pub fn validate(self) -> Result<ValidatedRecord, CompilerError> {
        let context = format!("spectrum '{}', sequence '{}'", self.spectrum_ref, self.sequence);
        let malformed = |reason: &'static str| CompilerError::MalformedRecord {
            reason,
            context: context.clone(),
        };

        let sequence = normalize_sequence(&self.sequence)
            .ok_or_else(|| malformed("missing or invalid sequence"))?;
        if self.charge == 0 {
            return Err(malformed("charge must not be zero"));
        }
        if !self.precursor_mz.is_finite() {
            return Err(malformed("precursor m/z is not finite"));
        }
        let spectrum_ref = self.spectrum_ref.trim().to_string();
        if spectrum_ref.is_empty() {
            return Err(malformed("missing spectrum reference"));
        }
        if self.modifications.keys().any(|&pos| pos > sequence.len() + 1) {
            return Err(malformed("modification position outside of the sequence"));
        }

        let mut scores = Vec::with_capacity(self.scores.len());
        for score in self.scores {
            if score.value.is_nan() {
                return Err(malformed("score value is NaN"));
            }
            let direction = match (score.direction, known_score(&score.kind)) {
                (Some(direction), _) => direction,
                (None, Some(known)) => known.direction,
                (None, None) => return Err(malformed("score of unknown kind without a direction")),
            };
            scores.push(ScoreModel::new(score.kind, score.value, direction));
        }

        let mut accessions = Vec::with_capacity(self.accessions.len());
        for acc in self.accessions {
            let name = acc.accession.trim().to_string();
            if name.is_empty() {
                return Err(malformed("empty accession"));
            }
            let protein_sequence = acc.sequence.filter(|s| !s.trim().is_empty());
            accessions.push((name, protein_sequence));
        }

        let delta_mass = self
            .calc_mz
            .filter(|x| x.is_finite())
            .map(|calc| (self.precursor_mz - calc) * self.charge as f64);

        Ok(ValidatedRecord {
            sequence,
            charge: self.charge,
            precursor_mz: self.precursor_mz,
            delta_mass,
            retention_time: self.retention_time.filter(|x| x.is_finite()),
            spectrum_ref,
            modifications: self.modifications,
            decoy: self.decoy,
            rank: self.rank,
            scores,
            accessions,
        })
    }
}

/// A [`PsmRecord`] that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
    pub(crate) sequence: String,
    pub(crate) charge: i32,
    pub(crate) precursor_mz: f64,
    pub(crate) delta_mass: Option<f64>,
    pub(crate) retention_time: Option<f64>,
    pub(crate) spectrum_ref: String,
    pub(crate) modifications: BTreeMap<usize, Modification>,
    pub(crate) decoy: Option<bool>,
    pub(crate) rank: Option<u32>,
    pub(crate) scores: Vec<ScoreModel>,
    pub(crate) accessions: Vec<(String, Option<String>)>,
}

impl ValidatedRecord {
    pub fn sequence(&self) -> &str {
        &self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ok() {
        let rec = PsmRecord::new("peptidek", 2, 500.25, "scan=10")
            .with_calc_mz(500.0)
            .with_score("mascot_score", 45.0, None)
            .with_score("my_score", 0.3, Some(ScoreDirection::LowerIsBetter))
            .with_accession("P1");
        let valid = rec.validate().unwrap();
        assert_eq!(valid.sequence(), "PEPTIDEK");
        assert!((valid.delta_mass.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(valid.scores.len(), 2);
        assert_eq!(valid.scores[0].direction(), ScoreDirection::HigherIsBetter);
        assert_eq!(valid.accessions, vec![("P1".to_string(), None)]);
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let no_seq = PsmRecord::new("  ", 2, 500.0, "scan=1");
        assert!(matches!(
            no_seq.validate(),
            Err(CompilerError::MalformedRecord { reason: "missing or invalid sequence", .. })
        ));

        let unknown_direction =
            PsmRecord::new("PEPTIDE", 2, 500.0, "scan=1").with_score("weird", 1.0, None);
        assert!(unknown_direction.validate().is_err());

        let no_spectrum = PsmRecord::new("PEPTIDE", 2, 500.0, "");
        assert!(no_spectrum.validate().is_err());

        let bad_mod = PsmRecord::new("PEP", 2, 500.0, "scan=1")
            .with_modification(7, Modification::new('M', 15.9949, None, None));
        assert!(bad_mod.validate().is_err());
    }
}
