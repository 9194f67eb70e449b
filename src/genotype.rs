//! Genotype normalization.
//!
//! Genotype strings arrive as typed by the upstream parser (`"AG"`, `"A/G"`,
//! `"a|g"`). An [`AllelePair`] keeps the order the alleles were written in,
//! which the haplotype labels depend on. A [`Genotype`] is the unordered,
//! canonical form used for every table lookup.

use serde::{Serialize, Serializer};
use std::fmt;

/// A single base call.
pub type Allele = char;

const SEPARATORS: [char; 2] = ['/', '|'];

fn is_base(allele: Allele) -> bool {
    matches!(allele, 'A' | 'C' | 'G' | 'T')
}

/// Two alleles at one marker, in source order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AllelePair {
    first: Allele,
    second: Allele,
}

impl AllelePair {
    /// Builds a pair from two alleles, upper-casing both.
    ///
    /// Returns `None` if either allele is not one of `A`, `C`, `G`, `T`.
    pub fn new(first: Allele, second: Allele) -> Option<Self> {
        let first = first.to_ascii_uppercase();
        let second = second.to_ascii_uppercase();
        if is_base(first) && is_base(second) {
            Some(Self { first, second })
        } else {
            None
        }
    }

    /// Parses a genotype string.
    ///
    /// Separator characters and surrounding whitespace are stripped and the
    /// alleles are upper-cased. Fewer than two remaining characters means there
    /// is nothing to compute with, and `None` is returned. Only the first two
    /// characters are used.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut alleles = raw
            .trim()
            .chars()
            .filter(|c| !SEPARATORS.contains(c) && !c.is_whitespace());
        let first = alleles.next()?;
        let second = alleles.next()?;
        Self::new(first, second)
    }

    pub fn first(&self) -> Allele {
        self.first
    }

    pub fn second(&self) -> Allele {
        self.second
    }

    pub fn alleles(&self) -> [Allele; 2] {
        [self.first, self.second]
    }

    /// The canonical genotype this pair represents.
    pub fn genotype(&self) -> Genotype {
        Genotype::ordered(self.first, self.second)
    }
}

impl fmt::Display for AllelePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.first, self.second)
    }
}

/// An unordered allele pair in canonical form: upper-case, sorted ascending.
///
/// Ordering and equality follow the canonical string, so `AG` sorts before
/// `GG` and `GA` never exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Genotype {
    low: Allele,
    high: Allele,
}

impl Genotype {
    fn ordered(a: Allele, b: Allele) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Canonical genotype of two alleles already known to be bases, such as
    /// the origin-tagged letters of a haplotype label.
    pub(crate) fn from_pair(a: Allele, b: Allele) -> Self {
        Self::ordered(a.to_ascii_uppercase(), b.to_ascii_uppercase())
    }

    /// Canonical genotype of two alleles in any order and any case.
    pub fn from_alleles(a: Allele, b: Allele) -> Option<Self> {
        AllelePair::new(a, b).map(|pair| pair.genotype())
    }

    /// Parses a genotype key that must already be canonical.
    ///
    /// Used when validating configuration tables, where `"GA"` or `"ag"` is
    /// a typo rather than input to normalize.
    pub fn parse_canonical(key: &str) -> Option<Self> {
        let mut chars = key.chars();
        let low = chars.next()?;
        let high = chars.next()?;
        if chars.next().is_some() || !is_base(low) || !is_base(high) || low > high {
            return None;
        }
        Some(Self { low, high })
    }

    pub fn is_homozygous(&self) -> bool {
        self.low == self.high
    }

    pub fn contains(&self, allele: Allele) -> bool {
        let allele = allele.to_ascii_uppercase();
        self.low == allele || self.high == allele
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.low, self.high)
    }
}

impl Serialize for Genotype {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
