pub use crate::config::{ColorStrategy, TraitConfig, TraitConfigBuilder, TraitSpec};
pub use crate::effect::{ActivityLevels, ActivityWeights, Anchor, EffectScorer, EffectTable, Score};
pub use crate::error::HeatmapError;
pub use crate::genotype::{Allele, AllelePair, Genotype};
pub use crate::gradient::{Gradient, GradientStop, Rgb};
pub use crate::grid::{Grid, PhenotypeGridBuilder, ScoredCell};
pub use crate::haplotype::Haplotype;
pub use crate::observable::{CsvBuilder, Observation, Panel};
pub use crate::presets;
pub use crate::punnett::{MarkerPunnett, PunnettResult, PunnettSquare};
pub use crate::state_table::{GeneState, StateTable};
pub use crate::{GenotypeMap, Marker};
