//! Haplotype enumeration.
//!
//! Each parent contributes one allele per shared marker. Labels keep the
//! allele from the first slot of the source genotype in upper case and write
//! the second slot in lower case, so a reader can see which slot each letter
//! came from. The case is a display convention only.

use crate::prelude::*;
use std::fmt;
use tracing::trace;

/// Default number of haplotypes kept per parent.
pub const DEFAULT_HAPLOTYPE_CAP: usize = 8;

/// One allele per shared marker, in marker order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Haplotype {
    label: String,
}

impl Haplotype {
    /// The label, one character per marker.
    pub fn as_str(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.label.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }

    pub fn alleles(&self) -> impl Iterator<Item = Allele> + '_ {
        self.label.chars()
    }

    /// Whether the allele at `index` came from the first slot of the parent's
    /// genotype (the upper-case letter).
    pub fn is_first_slot(&self, index: usize) -> Option<bool> {
        self.label
            .chars()
            .nth(index)
            .map(|c| c == c.to_ascii_uppercase())
    }
}

impl fmt::Display for Haplotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Markers from `markers` that both parents carry with a usable genotype, in
/// the order given.
pub fn shared_markers<'a, I>(markers: I, parent_a: &GenotypeMap, parent_b: &GenotypeMap) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let usable = |map: &GenotypeMap, marker: &str| {
        map.get(marker)
            .and_then(|g| AllelePair::parse(g))
            .is_some()
    };
    markers
        .into_iter()
        .filter(|marker| usable(parent_a, *marker) && usable(parent_b, *marker))
        .collect()
}

/// Resolves a parent's allele pairs for `markers`, or `None` if any marker is
/// missing or unusable.
pub fn allele_pairs(markers: &[&str], parent: &GenotypeMap) -> Option<Vec<AllelePair>> {
    markers
        .iter()
        .map(|marker| parent.get(*marker).and_then(|g| AllelePair::parse(g)))
        .collect()
}

/// Enumerates the Cartesian product of allele choices, one per marker, in
/// generation order: the last marker varies fastest and slot 0 comes before
/// slot 1.
///
/// At most `cap` haplotypes are produced. The product is walked with an
/// odometer and stops as soon as the cap is reached, so the work is bounded by
/// `cap * pairs.len()` whatever the marker count. With no markers there is
/// nothing to enumerate and the result is empty.
pub fn enumerate(pairs: &[AllelePair], cap: usize) -> Vec<Haplotype> {
    if pairs.is_empty() || cap == 0 {
        return Vec::new();
    }

    let mut slots = vec![0usize; pairs.len()];
    let mut out = Vec::with_capacity(cap.min(1 << pairs.len().min(16)));
    loop {
        let label = pairs
            .iter()
            .zip(slots.iter())
            .map(|(pair, &slot)| {
                if slot == 0 {
                    pair.first()
                } else {
                    pair.second().to_ascii_lowercase()
                }
            })
            .collect();
        out.push(Haplotype { label });
        if out.len() == cap {
            break;
        }

        // Advance the odometer; a carry out of the first marker means the
        // product is exhausted.
        let mut position = slots.len();
        loop {
            if position == 0 {
                trace!(count = out.len(), "haplotype product exhausted");
                return out;
            }
            position -= 1;
            if slots[position] == 0 {
                slots[position] = 1;
                break;
            }
            slots[position] = 0;
        }
    }
    out
}
