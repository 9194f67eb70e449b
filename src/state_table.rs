//! Discrete multi-gene state coloring.
//!
//! Instead of mapping a score onto one gradient, each cell is reduced to a
//! tuple with one [`GeneState`] per gene. Every possible tuple is colored once
//! when the table is built: a base gradient is sampled by the fraction of
//! genes in the `CC` state, and an overlay gradient is blended in when the
//! overlay gene is in its trigger state. Cells then look their color up.

use crate::effect::ActivityLevels;
use crate::error::{finite, HeatmapError, Result};
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Upper bound on genes in one table; the table holds `2^genes` entries.
pub const MAX_STATE_GENES: usize = 12;

/// Color used for a tuple the table does not contain.
pub const FALLBACK_COLOR: Rgb = Rgb(0xCC, 0xCC, 0xCC);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeneState {
    /// Mean allele activity at or above the threshold, labelled `CC`.
    #[serde(rename = "CC")]
    Homozygous,
    /// Mean activity below the threshold, or no shared marker, labelled `Tt`.
    #[serde(rename = "Tt")]
    Heterozygous,
}

impl GeneState {
    pub const ALL: [GeneState; 2] = [GeneState::Homozygous, GeneState::Heterozygous];

    pub fn label(&self) -> &'static str {
        match self {
            GeneState::Homozygous => "CC",
            GeneState::Heterozygous => "Tt",
        }
    }
}

impl fmt::Display for GeneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Joins a tuple into its display label, e.g. `"Tt | CC | CC"`.
pub fn state_label(states: &[GeneState]) -> String {
    states
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// A second gradient blended in when one gene is in a given state.
///
/// The blend weight is `base_alpha - slope * t`, clamped to `[0, max_alpha]`,
/// where `t` is the remapped base-gradient position.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub gene: String,
    pub trigger: GeneState,
    pub gradient: Gradient,
    pub base_alpha: f64,
    pub slope: f64,
    pub max_alpha: f64,
}

#[derive(Clone, Debug)]
pub struct StateTable {
    genes: Vec<String>,
    base: Gradient,
    overlay: Option<(usize, Overlay)>,
    exponent: f64,
    threshold: f64,
    row: ActivityLevels,
    column: ActivityLevels,
    colors: HashMap<Vec<GeneState>, Rgb>,
}

impl StateTable {
    /// Validates the gene list and colors every state tuple.
    pub fn new(
        genes: Vec<String>,
        base: Gradient,
        overlay: Option<Overlay>,
        exponent: f64,
        threshold: f64,
        row: ActivityLevels,
        column: ActivityLevels,
    ) -> Result<Self> {
        if genes.is_empty() || genes.len() > MAX_STATE_GENES {
            return Err(HeatmapError::Trait(format!(
                "state table needs 1 to {} genes, got {}",
                MAX_STATE_GENES,
                genes.len()
            )));
        }
        if !(exponent.is_finite() && exponent > 0.0) {
            return Err(HeatmapError::InvalidExponent(exponent));
        }
        finite("state threshold", threshold)?;
        row.validate("row")?;
        column.validate("column")?;
        let overlay = match overlay {
            Some(o) => {
                finite("overlay base alpha", o.base_alpha)?;
                finite("overlay slope", o.slope)?;
                finite("overlay max alpha", o.max_alpha)?;
                let index = genes
                    .iter()
                    .position(|g| *g == o.gene)
                    .ok_or_else(|| HeatmapError::UnknownGene(o.gene.clone()))?;
                Some((index, o))
            }
            None => None,
        };

        let mut table = Self {
            genes,
            base,
            overlay,
            exponent,
            threshold,
            row,
            column,
            colors: HashMap::new(),
        };
        table.colors = table.enumerate_colors();
        debug!(
            genes = table.genes.len(),
            entries = table.colors.len(),
            "built gene state color table"
        );
        Ok(table)
    }

    fn enumerate_colors(&self) -> HashMap<Vec<GeneState>, Rgb> {
        let mut colors = HashMap::with_capacity(1 << self.genes.len());
        let mut states = vec![GeneState::Homozygous; self.genes.len()];
        loop {
            colors.insert(states.clone(), self.color_inline(&states));

            let mut position = states.len();
            loop {
                if position == 0 {
                    return colors;
                }
                position -= 1;
                if states[position] == GeneState::Homozygous {
                    states[position] = GeneState::Heterozygous;
                    break;
                }
                states[position] = GeneState::Homozygous;
            }
        }
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Computes the color of a tuple without the table.
    pub fn color_inline(&self, states: &[GeneState]) -> Rgb {
        let homozygous = states
            .iter()
            .filter(|s| **s == GeneState::Homozygous)
            .count();
        let linear = (homozygous as f64 / self.genes.len() as f64).max(0.0).min(1.0);
        let t = linear.powf(self.exponent);
        let base = self.base.sample(t);

        match &self.overlay {
            Some((index, overlay)) if states.get(*index) == Some(&overlay.trigger) => {
                let alpha = (overlay.base_alpha - overlay.slope * t)
                    .max(0.0)
                    .min(overlay.max_alpha);
                if alpha > 0.0 {
                    base.blend(overlay.gradient.sample(t), alpha)
                } else {
                    base
                }
            }
            _ => base,
        }
    }

    /// Looks a tuple up, falling back to [`FALLBACK_COLOR`].
    pub fn color(&self, states: &[GeneState]) -> Rgb {
        self.colors.get(states).copied().unwrap_or(FALLBACK_COLOR)
    }

    /// Reduces a haplotype pair to one state per gene.
    ///
    /// Each gene collects the activity of the row and column allele at every
    /// shared marker it owns; the gene is `CC` when their mean reaches the
    /// threshold.
    pub fn states_for_pair(&self, markers: &[&Marker], row: &Haplotype, column: &Haplotype) -> Vec<GeneState> {
        let mut sums = vec![(0.0f64, 0usize); self.genes.len()];
        for ((marker, r), c) in markers.iter().zip(row.alleles()).zip(column.alleles()) {
            if let Some(index) = self.genes.iter().position(|g| *g == marker.gene) {
                let entry = &mut sums[index];
                entry.0 += self.row.level(r) + self.column.level(c);
                entry.1 += 2;
            }
        }
        sums.into_iter()
            .map(|(sum, count)| {
                if count > 0 && sum / count as f64 >= self.threshold {
                    GeneState::Homozygous
                } else {
                    GeneState::Heterozygous
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StateTable {
        let base = Gradient::from_literals(&[(0.0, [0, 0, 0]), (1.0, [200, 200, 200])]).unwrap();
        let red = Gradient::from_literals(&[(0.0, [100, 0, 0]), (1.0, [255, 100, 100])]).unwrap();
        StateTable::new(
            vec!["R".into(), "X".into(), "Y".into()],
            base,
            Some(Overlay {
                gene: "R".into(),
                trigger: GeneState::Heterozygous,
                gradient: red,
                base_alpha: 0.35,
                slope: 0.1,
                max_alpha: 0.75,
            }),
            1.6,
            0.7,
            ActivityLevels::new(1.0, 0.55),
            ActivityLevels::new(0.8, 0.45),
        )
        .unwrap()
    }

    #[test]
    fn test_table_is_complete_and_matches_inline() {
        let table = table();
        assert_eq!(table.len(), 8);
        for a in GeneState::ALL.iter() {
            for b in GeneState::ALL.iter() {
                for c in GeneState::ALL.iter() {
                    let states = [*a, *b, *c];
                    assert_eq!(table.color(&states), table.color_inline(&states));
                }
            }
        }
    }

    #[test]
    fn test_all_homozygous_is_top_of_base() {
        let table = table();
        use GeneState::*;
        assert_eq!(table.color(&[Homozygous, Homozygous, Homozygous]), Rgb(200, 200, 200));
    }

    #[test]
    fn test_overlay_only_on_trigger() {
        let table = table();
        use GeneState::*;
        // one gene in CC either way, so t = (1/3)^1.6
        let plain = Gradient::from_literals(&[(0.0, [0, 0, 0]), (1.0, [200, 200, 200])])
            .unwrap()
            .sample((1.0f64 / 3.0).powf(1.6));
        assert_eq!(plain, Rgb(34, 34, 34));
        // R is CC: plain base
        assert_eq!(table.color(&[Homozygous, Heterozygous, Heterozygous]), plain);
        // R is Tt: about a third of the red gradient is blended in
        let tinted = table.color(&[Heterozygous, Homozygous, Heterozygous]);
        assert_ne!(tinted, plain);
        assert!(tinted.0 > plain.0);
    }

    #[test]
    fn test_unknown_tuple_falls_back() {
        let table = table();
        assert_eq!(table.color(&[GeneState::Homozygous]), FALLBACK_COLOR);
        assert_eq!(FALLBACK_COLOR.to_hex(), "#CCCCCC");
    }

    #[test]
    fn test_label() {
        use GeneState::*;
        assert_eq!(state_label(&[Heterozygous, Homozygous]), "Tt | CC");
    }

    #[test]
    fn test_overlay_gene_must_exist() {
        let base = Gradient::from_literals(&[(0.0, [0, 0, 0]), (1.0, [1, 1, 1])]).unwrap();
        let err = StateTable::new(
            vec!["X".into()],
            base.clone(),
            Some(Overlay {
                gene: "R".into(),
                trigger: GeneState::Heterozygous,
                gradient: base,
                base_alpha: 0.35,
                slope: 0.1,
                max_alpha: 0.75,
            }),
            1.6,
            0.7,
            ActivityLevels::new(1.0, 0.55),
            ActivityLevels::new(0.8, 0.45),
        )
        .unwrap_err();
        assert!(matches!(err, HeatmapError::UnknownGene(_)));
    }

    #[test]
    fn test_non_finite_parameters_are_rejected() {
        let base = Gradient::from_literals(&[(0.0, [0, 0, 0]), (1.0, [1, 1, 1])]).unwrap();
        let levels = ActivityLevels::new(1.0, 0.5);
        let build = |threshold: f64, slope: f64, row: ActivityLevels| {
            StateTable::new(
                vec!["R".into()],
                base.clone(),
                Some(Overlay {
                    gene: "R".into(),
                    trigger: GeneState::Heterozygous,
                    gradient: base.clone(),
                    base_alpha: 0.35,
                    slope,
                    max_alpha: 0.75,
                }),
                1.6,
                threshold,
                row,
                levels,
            )
        };
        assert!(build(0.7, 0.1, levels).is_ok());
        for err in vec![
            build(f64::NAN, 0.1, levels),
            build(0.7, f64::INFINITY, levels),
            build(0.7, 0.1, ActivityLevels::new(1.0, f64::NAN)),
        ] {
            assert!(matches!(err, Err(HeatmapError::NonFinite { .. })));
        }
    }

    #[test]
    fn test_states_for_pair() {
        let table = table();
        let markers = vec![
            Marker::new("m1", "R"),
            Marker::new("m2", "X"),
            Marker::new("m3", "X"),
        ];
        let refs: Vec<&Marker> = markers.iter().collect();
        let pairs: Vec<AllelePair> = ["AG", "CT", "CT"]
            .iter()
            .map(|g| AllelePair::parse(g).unwrap())
            .collect();
        let haplotypes = crate::haplotype::enumerate(&pairs, 8);
        // "ACC" x "ACC": R = (1.0 + 0.8) / 2 = 0.9, X = 0.9, Y has no marker
        let states = table.states_for_pair(&refs, &haplotypes[0], &haplotypes[0]);
        use GeneState::*;
        assert_eq!(states, vec![Homozygous, Homozygous, Heterozygous]);
        // "gtt" x "gtt": every allele reduced, (0.55 + 0.45) / 2 = 0.5
        let states = table.states_for_pair(&refs, &haplotypes[7], &haplotypes[7]);
        assert_eq!(states, vec![Heterozygous, Heterozygous, Heterozygous]);
    }
}
