//! Single-marker Punnett tables.

use crate::prelude::*;
use ndarray::Array2;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::trace;

/// Offspring genotype probabilities at one marker, keyed by canonical genotype.
#[derive(Clone, Debug, PartialEq)]
pub struct PunnettResult {
    probabilities: BTreeMap<Genotype, f64>,
}

impl PunnettResult {
    /// Crosses two parents at one marker.
    ///
    /// Every allele of parent A is paired with every allele of parent B and the
    /// canonical genotypes are counted, so the probabilities are exact
    /// multiples of 1/4.
    pub fn cross(parent_a: &AllelePair, parent_b: &AllelePair) -> Self {
        let mut counts: BTreeMap<Genotype, u32> = BTreeMap::new();
        let mut total = 0u32;
        for &a in parent_a.alleles().iter() {
            for &b in parent_b.alleles().iter() {
                *counts.entry(Genotype::from_pair(a, b)).or_insert(0) += 1;
                total += 1;
            }
        }
        let probabilities = counts
            .into_iter()
            .map(|(genotype, count)| (genotype, f64::from(count) / f64::from(total)))
            .collect();
        Self { probabilities }
    }

    /// Crosses two raw genotype strings, or `None` if either does not
    /// normalize to a full allele pair.
    pub fn from_strings(parent_a: &str, parent_b: &str) -> Option<Self> {
        let a = AllelePair::parse(parent_a)?;
        let b = AllelePair::parse(parent_b)?;
        Some(Self::cross(&a, &b))
    }

    /// Probability of `genotype`; genotypes that cannot occur have probability 0.
    pub fn probability(&self, genotype: &Genotype) -> f64 {
        self.probabilities.get(genotype).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Genotype, &f64)> {
        self.probabilities.iter()
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// The most probable genotype. Ties go to the canonically smallest.
    pub fn most_likely(&self) -> Option<Genotype> {
        self.probabilities
            .iter()
            .fold(None, |best: Option<(Genotype, f64)>, (g, p)| match best {
                Some((_, bp)) if bp >= *p => best,
                _ => Some((*g, *p)),
            })
            .map(|(g, _)| g)
    }

    /// Collapses genotypes into phenotype classes.
    pub fn phenotypes<F>(&self, classify: F) -> BTreeMap<&'static str, f64>
    where
        F: Fn(&Genotype) -> &'static str,
    {
        let mut out = BTreeMap::new();
        for (genotype, p) in self.probabilities.iter() {
            *out.entry(classify(genotype)).or_insert(0.0) += p;
        }
        out
    }
}

impl Serialize for PunnettResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.probabilities.iter())
    }
}

/// One square of a rendered Punnett grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PunnettCell {
    pub row_allele: Allele,
    pub column_allele: Allele,
    pub genotype: Genotype,
    pub probability: f64,
}

/// The 2x2 view: rows are parent A's alleles, columns parent B's.
///
/// Each cell carries the total probability of its genotype, so the two
/// heterozygous cells of an `AG x AG` cross both show 0.5.
#[derive(Clone, Debug)]
pub struct PunnettSquare {
    parent_a: AllelePair,
    parent_b: AllelePair,
    result: PunnettResult,
    cells: Array2<PunnettCell>,
}

impl PunnettSquare {
    pub fn new(parent_a: AllelePair, parent_b: AllelePair) -> Self {
        let result = PunnettResult::cross(&parent_a, &parent_b);
        let rows = parent_a.alleles();
        let columns = parent_b.alleles();
        let cells = Array2::from_shape_fn((rows.len(), columns.len()), |(r, c)| {
            let genotype = Genotype::from_pair(rows[r], columns[c]);
            PunnettCell {
                row_allele: rows[r],
                column_allele: columns[c],
                genotype,
                probability: result.probability(&genotype),
            }
        });
        Self {
            parent_a,
            parent_b,
            result,
            cells,
        }
    }

    pub fn from_strings(parent_a: &str, parent_b: &str) -> Option<Self> {
        Some(Self::new(
            AllelePair::parse(parent_a)?,
            AllelePair::parse(parent_b)?,
        ))
    }

    pub fn parent_a(&self) -> &AllelePair {
        &self.parent_a
    }

    pub fn parent_b(&self) -> &AllelePair {
        &self.parent_b
    }

    pub fn result(&self) -> &PunnettResult {
        &self.result
    }

    pub fn cells(&self) -> &Array2<PunnettCell> {
        &self.cells
    }
}

/// A Punnett result for one named marker.
#[derive(Clone, Debug, Serialize)]
pub struct MarkerPunnett {
    pub marker: String,
    pub parent_a: String,
    pub parent_b: String,
    pub result: PunnettResult,
}

/// Punnett results for the first `limit` markers both parents carry, in the
/// order `markers` lists them.
///
/// Markers either parent lacks, or whose genotype does not normalize, are
/// skipped rather than reported as zero.
pub fn punnett_panel<'a, I>(
    markers: I,
    parent_a: &GenotypeMap,
    parent_b: &GenotypeMap,
    limit: usize,
) -> Vec<MarkerPunnett>
where
    I: IntoIterator<Item = &'a str>,
{
    markers
        .into_iter()
        .filter_map(|marker| {
            let a = parent_a.get(marker).and_then(|g| AllelePair::parse(g));
            let b = parent_b.get(marker).and_then(|g| AllelePair::parse(g));
            match (a, b) {
                (Some(a), Some(b)) => Some(MarkerPunnett {
                    marker: marker.to_string(),
                    parent_a: a.to_string(),
                    parent_b: b.to_string(),
                    result: PunnettResult::cross(&a, &b),
                }),
                _ => {
                    trace!(marker, "marker not usable in both parents, skipped");
                    None
                }
            }
        })
        .take(limit)
        .collect()
}
