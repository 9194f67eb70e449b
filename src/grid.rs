//! Scored haplotype grids.
//!
//! Rows are parent A's haplotypes and columns parent B's, both built over the
//! markers the two parents share. Every cell is scored with the trait's
//! [`EffectScorer`] and colored by its [`ColorStrategy`].

use crate::config::{ColorStrategy, TraitConfig};
use crate::haplotype;
use crate::prelude::*;
use crate::punnett::punnett_panel;
use crate::state_table::state_label;
use ndarray::{Array2, ArrayView1};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use tracing::debug;

/// One grid cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredCell {
    #[serde(skip)]
    pub row: Haplotype,
    #[serde(skip)]
    pub column: Haplotype,
    pub score: f64,
    pub color: Rgb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The anchor marker's genotype in this cell, when the trait has a shared
    /// anchor.
    #[serde(skip)]
    pub anchor: Option<Genotype>,
}

/// A fully scored and colored grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    trait_name: String,
    markers: Vec<String>,
    rows: Vec<Haplotype>,
    columns: Vec<Haplotype>,
    cells: Array2<ScoredCell>,
    min_score: f64,
    max_score: f64,
}

impl Grid {
    pub fn trait_name(&self) -> &str {
        &self.trait_name
    }

    /// The shared markers the haplotypes were built over, in order.
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn rows(&self) -> &[Haplotype] {
        &self.rows
    }

    pub fn columns(&self) -> &[Haplotype] {
        &self.columns
    }

    pub fn cells(&self) -> &Array2<ScoredCell> {
        &self.cells
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&ScoredCell> {
        self.cells.get((row, column))
    }

    pub fn dim(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn score_range(&self) -> (f64, f64) {
        (self.min_score, self.max_score)
    }
}

struct CellRow<'a>(ArrayView1<'a, ScoredCell>);

impl<'a> Serialize for CellRow<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let labels = |haplotypes: &[Haplotype]| -> Vec<String> {
            haplotypes.iter().map(|h| h.to_string()).collect()
        };
        let cells: Vec<CellRow<'_>> = self.cells.rows().into_iter().map(CellRow).collect();

        let mut state = serializer.serialize_struct("Grid", 5)?;
        state.serialize_field("trait", &self.trait_name)?;
        state.serialize_field("markers", &self.markers)?;
        state.serialize_field("rows", &labels(&self.rows))?;
        state.serialize_field("columns", &labels(&self.columns))?;
        state.serialize_field("cells", &cells)?;
        state.end()
    }
}

/// Divisor for min-max scaling; never below 1, so a grid whose cells all
/// score the same maps every cell to the bottom of the gradient.
pub fn min_max_denominator(min_score: f64, max_score: f64) -> f64 {
    (max_score - min_score).max(1.0)
}

/// Builds grids and Punnett views for one trait.
pub struct PhenotypeGridBuilder<'c> {
    config: &'c TraitConfig,
}

impl<'c> PhenotypeGridBuilder<'c> {
    pub fn new(config: &'c TraitConfig) -> Self {
        Self { config }
    }

    /// The configured markers both parents carry with a usable genotype.
    pub fn shared_markers(&self, parent_a: &GenotypeMap, parent_b: &GenotypeMap) -> Vec<&'c Marker> {
        let ids = haplotype::shared_markers(
            self.config.markers().iter().map(|m| m.id.as_str()),
            parent_a,
            parent_b,
        );
        ids.into_iter()
            .filter_map(|id| self.config.marker(id))
            .collect()
    }

    /// Builds the grid, or `None` if the parents share no usable marker.
    pub fn build(&self, parent_a: &GenotypeMap, parent_b: &GenotypeMap) -> Option<Grid> {
        let config = self.config;
        let markers = self.shared_markers(parent_a, parent_b);
        if markers.is_empty() {
            debug!(trait_name = config.name(), "no shared markers, grid omitted");
            return None;
        }
        let ids: Vec<&str> = markers.iter().map(|m| m.id.as_str()).collect();

        let rows = haplotype::enumerate(&haplotype::allele_pairs(&ids, parent_a)?, config.cap());
        let columns = haplotype::enumerate(&haplotype::allele_pairs(&ids, parent_b)?, config.cap());
        if rows.is_empty() || columns.is_empty() {
            return None;
        }

        let scorer = config.scorer();
        let scores = Array2::from_shape_fn((rows.len(), columns.len()), |(r, c)| {
            let score = scorer.score(&markers, &rows[r], &columns[c]);
            Score {
                value: config.round_score(score.value),
                anchor: score.anchor,
            }
        });
        let (min_score, max_score) = scores.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), s| (lo.min(s.value), hi.max(s.value)),
        );

        let cells = match config.coloring() {
            ColorStrategy::Continuous(gradient) => {
                let denominator = min_max_denominator(min_score, max_score);
                Array2::from_shape_fn(scores.dim(), |(r, c)| {
                    let score = scores[[r, c]];
                    let t = (score.value - min_score) / denominator;
                    ScoredCell {
                        row: rows[r].clone(),
                        column: columns[c].clone(),
                        score: score.value,
                        color: gradient.sample_remapped(t, config.exponent()),
                        label: None,
                        anchor: score.anchor,
                    }
                })
            }
            ColorStrategy::StateTable(table) => Array2::from_shape_fn(scores.dim(), |(r, c)| {
                let score = scores[[r, c]];
                let states = table.states_for_pair(&markers, &rows[r], &columns[c]);
                ScoredCell {
                    row: rows[r].clone(),
                    column: columns[c].clone(),
                    score: score.value,
                    color: table.color(&states),
                    label: Some(state_label(&states)),
                    anchor: score.anchor,
                }
            }),
        };

        debug!(
            trait_name = config.name(),
            markers = markers.len(),
            rows = rows.len(),
            columns = columns.len(),
            min_score,
            max_score,
            "built phenotype grid"
        );

        Some(Grid {
            trait_name: config.name().to_owned(),
            markers: ids.iter().map(|id| (*id).to_owned()).collect(),
            rows,
            columns,
            cells,
            min_score,
            max_score,
        })
    }

    /// Punnett result for one configured marker.
    pub fn punnett(&self, marker: &str, parent_a: &GenotypeMap, parent_b: &GenotypeMap) -> Option<PunnettResult> {
        self.config.marker(marker)?;
        PunnettResult::from_strings(parent_a.get(marker)?, parent_b.get(marker)?)
    }

    /// Punnett square for one configured marker.
    pub fn punnett_square(
        &self,
        marker: &str,
        parent_a: &GenotypeMap,
        parent_b: &GenotypeMap,
    ) -> Option<PunnettSquare> {
        self.config.marker(marker)?;
        PunnettSquare::from_strings(parent_a.get(marker)?, parent_b.get(marker)?)
    }

    /// Punnett results for the first shared markers, up to the configured limit.
    pub fn punnett_panel(&self, parent_a: &GenotypeMap, parent_b: &GenotypeMap) -> Vec<MarkerPunnett> {
        punnett_panel(
            self.config.markers().iter().map(|m| m.id.as_str()),
            parent_a,
            parent_b,
            self.config.punnett_limit(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn map(entries: &[(&str, &str)]) -> GenotypeMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn two_marker_trait() -> TraitConfig {
        let effects = EffectTable::builder()
            .marker("G1", "rs1", &[("AA", 2.0), ("AG", 1.0)])
            .marker("G2", "rs2", &[("CC", 0.5)])
            .build()
            .unwrap();
        TraitConfig::builder("test")
            .marker("rs1", "G1")
            .marker("rs2", "G2")
            .marker("rs3", "G3")
            .effects(effects)
            .continuous(Gradient::from_literals(&[(0.0, [0, 0, 0]), (1.0, [100, 200, 250])]).unwrap())
            .exponent(1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_grid_shape_and_labels() {
        let config = two_marker_trait();
        let a = map(&[("rs1", "AG"), ("rs2", "CT"), ("rs3", "--")]);
        let b = map(&[("rs1", "AA"), ("rs2", "CC")]);
        let grid = PhenotypeGridBuilder::new(&config).build(&a, &b).unwrap();

        assert_eq!(grid.markers(), &["rs1".to_string(), "rs2".to_string()]);
        assert_eq!(grid.dim(), (4, 4));
        let rows: Vec<&str> = grid.rows().iter().map(|h| h.as_str()).collect();
        assert_eq!(rows, vec!["AC", "At", "gC", "gt"]);
        let columns: Vec<&str> = grid.columns().iter().map(|h| h.as_str()).collect();
        assert_eq!(columns, vec!["AC", "Ac", "aC", "ac"]);
    }

    #[test]
    fn test_scores_and_min_max_colors() {
        let config = two_marker_trait();
        let a = map(&[("rs1", "AG"), ("rs2", "CT")]);
        let b = map(&[("rs1", "AA"), ("rs2", "CC")]);
        let grid = PhenotypeGridBuilder::new(&config).build(&a, &b).unwrap();

        // row "AC" x column "AC": AA (2.0) + CC (0.5)
        assert_relative_eq!(grid.cell(0, 0).unwrap().score, 2.5);
        // row "gt" x column "AC": AG (1.0) + CT (0.0)
        assert_relative_eq!(grid.cell(3, 0).unwrap().score, 1.0);
        assert_eq!(grid.score_range(), (1.0, 2.5));

        // top and bottom of the range hit the gradient ends exactly
        assert_eq!(grid.cell(0, 0).unwrap().color, Rgb(100, 200, 250));
        assert_eq!(grid.cell(3, 0).unwrap().color, Rgb(0, 0, 0));
        assert!(grid.cells().iter().all(|c| c.label.is_none()));
    }

    #[test]
    fn test_flat_grid_uses_unit_denominator() {
        let config = two_marker_trait();
        // only rs3 shared, which has no effects: every cell scores 0
        let a = map(&[("rs3", "AG")]);
        let b = map(&[("rs3", "CT")]);
        let grid = PhenotypeGridBuilder::new(&config).build(&a, &b).unwrap();
        assert_eq!(grid.score_range(), (0.0, 0.0));
        assert_eq!(min_max_denominator(0.0, 0.0), 1.0);
        assert!(grid.cells().iter().all(|c| c.color == Rgb(0, 0, 0)));
    }

    #[test]
    fn test_small_ranges_are_not_stretched() {
        assert_eq!(min_max_denominator(1.0, 1.4), 1.0);
        assert_eq!(min_max_denominator(-2.0, 3.0), 5.0);
    }

    #[test]
    fn test_no_shared_markers_is_absent() {
        let config = two_marker_trait();
        let a = map(&[("rs1", "AG")]);
        let b = map(&[("rs2", "CC"), ("rs1", "A")]);
        assert!(PhenotypeGridBuilder::new(&config).build(&a, &b).is_none());
        assert!(PhenotypeGridBuilder::new(&config).build(&a, &GenotypeMap::new()).is_none());
    }

    #[test]
    fn test_punnett_views() {
        let config = two_marker_trait();
        let a = map(&[("rs1", "AG"), ("rs2", "CT"), ("rs9", "AA")]);
        let b = map(&[("rs1", "AG"), ("rs2", "TT"), ("rs9", "AA")]);
        let builder = PhenotypeGridBuilder::new(&config);

        let result = builder.punnett("rs1", &a, &b).unwrap();
        assert_relative_eq!(result.probability(&Genotype::parse_canonical("AG").unwrap()), 0.5);
        assert!(builder.punnett("rs9", &a, &b).is_none());
        assert!(builder.punnett("rs3", &a, &b).is_none());
        assert!(builder.punnett_square("rs2", &a, &b).is_some());

        let panel = builder.punnett_panel(&a, &b);
        let markers: Vec<&str> = panel.iter().map(|p| p.marker.as_str()).collect();
        assert_eq!(markers, vec!["rs1", "rs2"]);
    }

    #[test]
    fn test_serialized_shape() -> Result<(), Box<dyn std::error::Error>> {
        let config = two_marker_trait();
        let a = map(&[("rs1", "AG")]);
        let b = map(&[("rs1", "AA")]);
        let grid = PhenotypeGridBuilder::new(&config).build(&a, &b).unwrap();
        let json = serde_json::to_value(&grid)?;
        assert_eq!(json["rows"], serde_json::json!(["A", "g"]));
        assert_eq!(json["columns"], serde_json::json!(["A", "a"]));
        assert_eq!(json["cells"][0][0], serde_json::json!({"score": 2.0, "color": "#64C8FA"}));
        assert_eq!(json["cells"][1][1], serde_json::json!({"score": 1.0, "color": "#000000"}));
        Ok(())
    }
}
