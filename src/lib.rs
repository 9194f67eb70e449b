#![crate_name = "trait_heatmap"]
//! Offspring trait previews from two parents' SNP genotypes.
//!
//! Given each parent's genotypes as a `{marker: genotype}` map, the crate
//! computes exact single-marker Punnett probabilities and a scored, colored
//! grid of multi-marker haplotype combinations for a configured trait.
//!
//! ```ignore
//! use trait_heatmap::prelude::*;
//!
//! let eye = presets::eye_color()?;
//! if let Some(grid) = PhenotypeGridBuilder::new(&eye).build(&mother, &father) {
//!     for cell in grid.cells().iter() {
//!         println!("{} x {}: {} {}", cell.row, cell.column, cell.score, cell.color);
//!     }
//! }
//! ```
use std::collections::HashMap;

pub mod prelude;

pub mod config;
pub mod effect;
pub mod error;
pub mod genotype;
pub mod gradient;
pub mod grid;
pub mod haplotype;
pub mod observable;
pub mod presets;
pub mod punnett;
pub mod state_table;

/// One individual's genotypes, marker id to genotype string as typed upstream.
pub type GenotypeMap = HashMap<String, String>;
pub type MarkerId = String;
pub type GeneName = String;

/// A SNP position and the gene it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub gene: GeneName,
}

impl Marker {
    pub fn new(id: &str, gene: &str) -> Self {
        Self {
            id: id.into(),
            gene: gene.into(),
        }
    }
}
