use serde::{
    Deserialize,
    Serialize,
};
use std::hash::{
    Hash,
    Hasher,
};

/// A residue modification as reported by a search engine.
///
/// Equality and hashing use (accession, description, mass, residue).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modification {
    pub residue: char,
    /// Monoisotopic mass shift.
    pub mass: f64,
    #[serde(default)]
    pub description: Option<String>,
    /// Ontology accession, e.g. `UNIMOD:35`.
    #[serde(default)]
    pub accession: Option<String>,
}

impl Modification {
    pub fn new(
        residue: char,
        mass: f64,
        description: Option<String>,
        accession: Option<String>,
    ) -> Self {
        Self {
            residue,
            mass,
            description,
            accession,
        }
    }

    /// Mass shift with at most four decimals (`0.####`, half-up).
    ///
    /// Engines report the same modification with different precision, so this
    /// is what PSM-set keys compare on.
    pub fn mass_string(&self) -> String {
        let rounded = (self.mass * 1e4).round() / 1e4;
        let mut out = format!("{:.4}", rounded);
        while out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
        if out == "-0" {
            out = "0".to_string();
        }
        out
    }
}

impl PartialEq for Modification {
    fn eq(&self, other: &Self) -> bool {
        self.accession == other.accession
            && self.description == other.description
            && self.mass.to_bits() == other.mass.to_bits()
            && self.residue == other.residue
    }
}

impl Eq for Modification {}

impl Hash for Modification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.accession.hash(state);
        self.description.hash(state);
        self.mass.to_bits().hash(state);
        self.residue.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mass_string() {
        let ox = Modification::new('M', 15.994915, Some("Oxidation".into()), None);
        assert_eq!(ox.mass_string(), "15.9949");
        let carb = Modification::new('C', 57.021464, None, Some("UNIMOD:4".into()));
        assert_eq!(carb.mass_string(), "57.0215");
        let round = Modification::new('K', 8.0, None, None);
        assert_eq!(round.mass_string(), "8");
    }

    #[test]
    fn test_value_equality() {
        let a = Modification::new('M', 15.994915, Some("Oxidation".into()), None);
        let b = Modification::new('M', 15.994915, Some("Oxidation".into()), None);
        let c = Modification::new('M', 15.9949, Some("Oxidation".into()), None);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Modification> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
