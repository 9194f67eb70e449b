//! Weighted phenotype scoring of haplotype pairs.
//!
//! A cell's score is the sum of three parts, each optional per trait:
//!
//! * a genotype effect per marker, looked up by the canonical genotype the two
//!   haplotypes form at that marker (a miss contributes 0);
//! * a bias selected by the genotype of one anchor marker;
//! * an allele-activity term, where each allele counts by the slot it came
//!   from (upper-case letters are active, lower-case reduced).

use crate::error::{finite, HeatmapError, Result};
use crate::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Effect of each genotype at one marker.
pub type GenotypeEffects = BTreeMap<Genotype, f64>;

fn parse_effects(marker: &str, effects: &[(String, f64)]) -> Result<GenotypeEffects> {
    effects
        .iter()
        .map(|(key, effect)| -> Result<(Genotype, f64)> {
            let genotype = Genotype::parse_canonical(key).ok_or_else(|| HeatmapError::NonCanonicalGenotype {
                marker: marker.to_string(),
                genotype: key.clone(),
            })?;
            Ok((genotype, finite(&format!("effect of {} at {}", key, marker), *effect)?))
        })
        .collect()
}

/// Genotype effects keyed by `(gene, marker)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectTable {
    entries: HashMap<(String, String), GenotypeEffects>,
}

impl EffectTable {
    pub fn builder() -> EffectTableBuilder {
        EffectTableBuilder::new()
    }

    /// Effect of `genotype` at `(gene, marker)`, 0 when the table has none.
    pub fn effect(&self, gene: &str, marker: &str, genotype: &Genotype) -> f64 {
        self.entries
            .get(&(gene.to_string(), marker.to_string()))
            .and_then(|effects| effects.get(genotype))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn effects(&self, gene: &str, marker: &str) -> Option<&GenotypeEffects> {
        self.entries.get(&(gene.to_string(), marker.to_string()))
    }

    /// All `(gene, marker)` keys.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.keys().map(|(g, m)| (g.as_str(), m.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct EffectTableBuilder {
    entries: Vec<(String, String, Vec<(String, f64)>)>,
}

impl EffectTableBuilder {
    pub fn new() -> Self {
        Self { entries: vec![] }
    }

    /// Adds the effects of one marker. Genotype keys must be canonical
    /// (`"AG"`, not `"GA"`); that is checked in `build()`.
    pub fn marker(&mut self, gene: &str, marker: &str, effects: &[(&str, f64)]) -> &mut Self {
        self.entries.push((
            gene.to_owned(),
            marker.to_owned(),
            effects.iter().map(|(g, e)| ((*g).to_owned(), *e)).collect(),
        ));
        self
    }

    pub fn build(&self) -> Result<EffectTable> {
        let mut entries = HashMap::new();
        for (gene, marker, effects) in self.entries.iter() {
            let parsed = parse_effects(marker, effects)?;
            if entries
                .insert((gene.clone(), marker.clone()), parsed)
                .is_some()
            {
                return Err(HeatmapError::DuplicateMarker(marker.clone()));
            }
        }
        Ok(EffectTable { entries })
    }
}

impl Default for EffectTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A marker whose genotype also selects a baseline offset.
#[derive(Clone, Debug, PartialEq)]
pub struct Anchor {
    marker: String,
    default_genotype: Genotype,
    bias: GenotypeEffects,
}

impl Anchor {
    /// `default_genotype` stands in for the anchor when it is not among the
    /// shared markers.
    pub fn new(marker: &str, default_genotype: &str, bias: &[(&str, f64)]) -> Result<Self> {
        let default = Genotype::parse_canonical(default_genotype).ok_or_else(|| {
            HeatmapError::NonCanonicalGenotype {
                marker: marker.to_string(),
                genotype: default_genotype.to_string(),
            }
        })?;
        let bias: Vec<(String, f64)> = bias.iter().map(|(g, b)| ((*g).to_owned(), *b)).collect();
        Ok(Self {
            marker: marker.to_owned(),
            default_genotype: default,
            bias: parse_effects(marker, &bias)?,
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn default_genotype(&self) -> Genotype {
        self.default_genotype
    }

    pub fn bias(&self, genotype: &Genotype) -> f64 {
        self.bias.get(genotype).copied().unwrap_or(0.0)
    }
}

/// Contribution of one allele by the slot it came from.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ActivityLevels {
    pub active: f64,
    pub reduced: f64,
}

impl ActivityLevels {
    pub const fn new(active: f64, reduced: f64) -> Self {
        Self { active, reduced }
    }

    /// Fails if either level is not finite.
    pub fn validate(&self, what: &str) -> Result<()> {
        finite(&format!("{} active level", what), self.active)?;
        finite(&format!("{} reduced level", what), self.reduced)?;
        Ok(())
    }

    pub fn level(&self, allele: Allele) -> f64 {
        if allele == allele.to_ascii_uppercase() {
            self.active
        } else {
            self.reduced
        }
    }
}

/// Per-marker weights applied to the summed activity of the row and column
/// alleles. Row alleles come from parent A, column alleles from parent B.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityWeights {
    weights: HashMap<String, f64>,
    row: ActivityLevels,
    column: ActivityLevels,
}

impl ActivityWeights {
    /// Fails on a non-finite weight or activity level.
    pub fn new(weights: &[(&str, f64)], row: ActivityLevels, column: ActivityLevels) -> Result<Self> {
        row.validate("row")?;
        column.validate("column")?;
        let weights = weights
            .iter()
            .map(|(m, w)| -> Result<(String, f64)> {
                Ok(((*m).to_owned(), finite(&format!("activity weight of {}", m), *w)?))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { weights, row, column })
    }

    pub fn weight(&self, marker: &str) -> Option<f64> {
        self.weights.get(marker).copied()
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(|m| m.as_str())
    }

    pub fn row(&self) -> ActivityLevels {
        self.row
    }

    pub fn column(&self) -> ActivityLevels {
        self.column
    }

    /// Activity of the row and column alleles at one marker.
    pub fn pair_activity(&self, row: Allele, column: Allele) -> (f64, f64) {
        (self.row.level(row), self.column.level(column))
    }
}

/// Result of scoring one haplotype pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score {
    pub value: f64,
    /// The anchor marker's genotype in this cell, when the anchor is shared.
    pub anchor: Option<Genotype>,
}

/// The scoring model of a trait.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectScorer {
    table: EffectTable,
    anchor: Option<Anchor>,
    activity: Option<ActivityWeights>,
}

impl EffectScorer {
    pub fn new(table: EffectTable) -> Self {
        Self {
            table,
            anchor: None,
            activity: None,
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_activity(mut self, activity: ActivityWeights) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn table(&self) -> &EffectTable {
        &self.table
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    pub fn activity(&self) -> Option<&ActivityWeights> {
        self.activity.as_ref()
    }

    /// Scores a row/column haplotype pair built over `markers`.
    ///
    /// The result depends only on the inputs, and the sum runs in marker order,
    /// so equal inputs always give bit-identical scores.
    pub fn score(&self, markers: &[&Marker], row: &Haplotype, column: &Haplotype) -> Score {
        debug_assert_eq!(row.len(), markers.len());
        debug_assert_eq!(column.len(), markers.len());

        let mut value = 0.0;
        let mut anchor = None;
        for ((marker, r), c) in markers.iter().zip(row.alleles()).zip(column.alleles()) {
            let genotype = Genotype::from_pair(r, c);
            value += self.table.effect(&marker.gene, &marker.id, &genotype);

            if let Some(activity) = &self.activity {
                if let Some(weight) = activity.weight(&marker.id) {
                    let (ra, ca) = activity.pair_activity(r, c);
                    value += weight * (ra + ca);
                }
            }

            if self.anchor.as_ref().map(|a| a.marker()) == Some(marker.id.as_str()) {
                anchor = Some(genotype);
            }
        }

        if let Some(a) = &self.anchor {
            value += a.bias(&anchor.unwrap_or_else(|| a.default_genotype()));
        }

        Score { value, anchor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn markers() -> Vec<Marker> {
        vec![Marker::new("rs1", "G1"), Marker::new("rs2", "G2")]
    }

    fn haplotypes(a: &str, b: &str) -> (Haplotype, Haplotype) {
        let pairs = |raw: &str| {
            raw.split(',')
                .map(|g| AllelePair::parse(g).unwrap())
                .collect::<Vec<_>>()
        };
        (
            crate::haplotype::enumerate(&pairs(a), 1).remove(0),
            crate::haplotype::enumerate(&pairs(b), 1).remove(0),
        )
    }

    fn table() -> EffectTable {
        EffectTable::builder()
            .marker("G1", "rs1", &[("AA", 5.0), ("AG", 2.5), ("GG", -4.0)])
            .marker("G2", "rs2", &[("CC", 1.0), ("CT", 0.5)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_table_lookup_and_miss() {
        let table = table();
        let ag = Genotype::parse_canonical("AG").unwrap();
        let tt = Genotype::parse_canonical("TT").unwrap();
        assert_relative_eq!(table.effect("G1", "rs1", &ag), 2.5);
        assert_relative_eq!(table.effect("G2", "rs2", &tt), 0.0);
        assert_relative_eq!(table.effect("G9", "rs1", &ag), 0.0);
    }

    #[test]
    fn test_builder_rejects_non_canonical_keys() {
        let err = EffectTable::builder()
            .marker("G1", "rs1", &[("GA", 1.0)])
            .build()
            .unwrap_err();
        assert!(matches!(err, HeatmapError::NonCanonicalGenotype { .. }));
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let err = EffectTable::builder()
            .marker("G1", "rs1", &[("AA", 1.0)])
            .marker("G1", "rs1", &[("GG", 1.0)])
            .build()
            .unwrap_err();
        assert!(matches!(err, HeatmapError::DuplicateMarker(_)));
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        let err = EffectTable::builder()
            .marker("G1", "rs1", &[("AA", f64::NAN)])
            .build()
            .unwrap_err();
        assert!(matches!(err, HeatmapError::NonFinite { .. }));

        let err = Anchor::new("rs1", "GG", &[("AA", f64::INFINITY)]).unwrap_err();
        assert!(matches!(err, HeatmapError::NonFinite { .. }));

        let levels = ActivityLevels::new(1.0, 0.5);
        let err = ActivityWeights::new(&[("rs1", f64::NEG_INFINITY)], levels, levels).unwrap_err();
        assert!(matches!(err, HeatmapError::NonFinite { .. }));

        let err = ActivityWeights::new(&[("rs1", 1.0)], levels, ActivityLevels::new(f64::NAN, 0.0)).unwrap_err();
        assert!(matches!(err, HeatmapError::NonFinite { .. }));
    }

    #[test]
    fn test_sum_over_markers() {
        let markers = markers();
        let refs: Vec<&Marker> = markers.iter().collect();
        let (row, column) = haplotypes("AG,CT", "GA,CC");
        // rs1: A + G = AG (2.5), rs2: C + C = CC (1.0)
        let score = EffectScorer::new(table()).score(&refs, &row, &column);
        assert_relative_eq!(score.value, 3.5);
        assert_eq!(score.anchor, None);
    }

    #[test]
    fn test_anchor_bias_and_default() {
        let markers = markers();
        let refs: Vec<&Marker> = markers.iter().collect();
        let anchor = Anchor::new("rs1", "GG", &[("AA", 1.0), ("GG", -1.0)]).unwrap();
        let scorer = EffectScorer::new(table()).with_anchor(anchor);

        let (row, column) = haplotypes("AG,CT", "AG,CC");
        let score = scorer.score(&refs, &row, &column);
        assert_eq!(score.anchor, Genotype::parse_canonical("AA"));
        assert_relative_eq!(score.value, 5.0 + 1.0 + 1.0);

        // anchor not shared: the default genotype selects the bias
        let only_rs2 = vec![&markers[1]];
        let (row, column) = haplotypes("CT", "CC");
        let score = scorer.score(&only_rs2, &row, &column);
        assert_eq!(score.anchor, None);
        assert_relative_eq!(score.value, 1.0 - 1.0);
    }

    #[test]
    fn test_activity_counts_slots() {
        let markers = markers();
        let refs: Vec<&Marker> = markers.iter().collect();
        let activity = ActivityWeights::new(
            &[("rs1", 2.0)],
            ActivityLevels::new(1.0, 0.55),
            ActivityLevels::new(0.8, 0.45),
        )
        .unwrap();
        let scorer = EffectScorer::new(EffectTable::default()).with_activity(activity);
        let pairs: Vec<AllelePair> = vec![AllelePair::parse("AG").unwrap(), AllelePair::parse("CT").unwrap()];
        let all = crate::haplotype::enumerate(&pairs, 8);
        // row "AC" (active at rs1), column "gC" (reduced at rs1)
        let score = scorer.score(&refs, &all[0], &all[2]);
        assert_relative_eq!(score.value, 2.0 * (1.0 + 0.45));
    }

    #[test]
    fn test_scores_are_deterministic() {
        let markers = markers();
        let refs: Vec<&Marker> = markers.iter().collect();
        let scorer = EffectScorer::new(table());
        let (row, column) = haplotypes("AG,CT", "GA,TC");
        let first = scorer.score(&refs, &row, &column);
        let second = scorer.score(&refs, &row, &column);
        assert_eq!(first.value.to_bits(), second.value.to_bits());
    }
}
