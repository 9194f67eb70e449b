//! Trait configuration.
//!
//! A [`TraitConfig`] bundles everything static about one trait: the ordered
//! marker list, the scoring model and the coloring strategy. It is validated
//! once when built and never changes afterwards, so one configuration can be
//! shared by any number of concurrent grid computations.

use crate::effect::{ActivityLevels, ActivityWeights, Anchor, EffectScorer, EffectTable};
use crate::error::{HeatmapError, Result};
use crate::gradient::{Gradient, GradientStop};
use crate::haplotype::DEFAULT_HAPLOTYPE_CAP;
use crate::state_table::{GeneState, Overlay, StateTable};
use crate::Marker;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

pub const DEFAULT_EXPONENT: f64 = 1.6;
pub const DEFAULT_PUNNETT_LIMIT: usize = 5;
/// Most decimals a score may be rounded to; beyond this `f64` has no digits left.
pub const MAX_SCORE_DECIMALS: i32 = 15;

/// How scores become colors.
#[derive(Clone, Debug)]
pub enum ColorStrategy {
    /// Min-max scale the grid's own scores into one gradient.
    Continuous(Gradient),
    /// Reduce each cell to gene states and look the color up.
    StateTable(Arc<StateTable>),
}

/// Inputs for the discrete state table, resolved against the marker list in
/// [`TraitConfigBuilder::build`].
#[derive(Clone, Debug)]
pub struct DiscreteStates {
    pub genes: Vec<String>,
    pub base: Gradient,
    pub overlay: Option<Overlay>,
    pub threshold: f64,
    pub row: ActivityLevels,
    pub column: ActivityLevels,
}

#[derive(Clone, Debug)]
enum Coloring {
    Continuous(Gradient),
    Discrete(DiscreteStates),
}

#[derive(Clone, Debug)]
pub struct TraitConfig {
    name: String,
    markers: Vec<Marker>,
    scorer: EffectScorer,
    coloring: ColorStrategy,
    exponent: f64,
    cap: usize,
    score_decimals: Option<i32>,
    punnett_limit: usize,
}

impl TraitConfig {
    pub fn builder(name: &str) -> TraitConfigBuilder {
        TraitConfigBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Markers in display order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn scorer(&self) -> &EffectScorer {
        &self.scorer
    }

    pub fn coloring(&self) -> &ColorStrategy {
        &self.coloring
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Maximum haplotypes per parent.
    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn score_decimals(&self) -> Option<i32> {
        self.score_decimals
    }

    pub fn punnett_limit(&self) -> usize {
        self.punnett_limit
    }

    /// Rounds a raw score to the configured number of decimals.
    pub fn round_score(&self, score: f64) -> f64 {
        match self.score_decimals {
            Some(decimals) => {
                let scale = 10f64.powi(decimals);
                (score * scale).round() / scale
            }
            None => score,
        }
    }

    /// Validates a deserialized [`TraitSpec`].
    pub fn from_spec(spec: TraitSpec) -> Result<Self> {
        let mut builder = TraitConfigBuilder::new(&spec.name);
        for marker in spec.markers.iter() {
            builder.marker(&marker.id, &marker.gene);
        }

        let mut effects = EffectTable::builder();
        for entry in spec.effects.iter() {
            let genotypes: Vec<(&str, f64)> = entry
                .genotypes
                .iter()
                .map(|(g, e)| (g.as_str(), *e))
                .collect();
            effects.marker(&entry.gene, &entry.marker, &genotypes);
        }
        builder.effects(effects.build()?);

        if let Some(anchor) = &spec.anchor {
            let bias: Vec<(&str, f64)> = anchor.bias.iter().map(|(g, b)| (g.as_str(), *b)).collect();
            builder.anchor(Anchor::new(&anchor.marker, &anchor.default_genotype, &bias)?);
        }

        if let Some(activity) = &spec.activity {
            let weights: Vec<(&str, f64)> = activity
                .weights
                .iter()
                .map(|(m, w)| (m.as_str(), *w))
                .collect();
            builder.activity(ActivityWeights::new(&weights, activity.row, activity.column)?);
        }

        match spec.coloring {
            ColoringSpec::Continuous { stops } => {
                builder.continuous(Gradient::new(stops)?);
            }
            ColoringSpec::StateTable {
                genes,
                base,
                overlay,
                threshold,
                row,
                column,
            } => {
                let overlay = match overlay {
                    Some(o) => Some(Overlay {
                        gene: o.gene,
                        trigger: o.trigger,
                        gradient: Gradient::new(o.stops)?,
                        base_alpha: o.base_alpha,
                        slope: o.slope,
                        max_alpha: o.max_alpha,
                    }),
                    None => None,
                };
                builder.discrete(DiscreteStates {
                    genes,
                    base: Gradient::new(base)?,
                    overlay,
                    threshold,
                    row,
                    column,
                });
            }
        }

        builder
            .exponent(spec.exponent)
            .cap(spec.cap)
            .punnett_limit(spec.punnett_limit);
        if let Some(decimals) = spec.score_decimals {
            builder.score_decimals(decimals);
        }
        builder.build()
    }
}

/// Builds a [`TraitConfig`].
pub struct TraitConfigBuilder {
    name: String,
    markers: Vec<Marker>,
    effects: EffectTable,
    anchor: Option<Anchor>,
    activity: Option<ActivityWeights>,
    coloring: Option<Coloring>,
    exponent: f64,
    cap: usize,
    score_decimals: Option<i32>,
    punnett_limit: usize,
}

impl TraitConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            markers: vec![],
            effects: EffectTable::default(),
            anchor: None,
            activity: None,
            coloring: None,
            exponent: DEFAULT_EXPONENT,
            cap: DEFAULT_HAPLOTYPE_CAP,
            score_decimals: None,
            punnett_limit: DEFAULT_PUNNETT_LIMIT,
        }
    }

    /// Appends a marker; the order of calls is the display order.
    pub fn marker(&mut self, id: &str, gene: &str) -> &mut Self {
        self.markers.push(Marker::new(id, gene));
        self
    }

    pub fn effects(&mut self, effects: EffectTable) -> &mut Self {
        self.effects = effects;
        self
    }

    pub fn anchor(&mut self, anchor: Anchor) -> &mut Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn activity(&mut self, activity: ActivityWeights) -> &mut Self {
        self.activity = Some(activity);
        self
    }

    pub fn continuous(&mut self, gradient: Gradient) -> &mut Self {
        self.coloring = Some(Coloring::Continuous(gradient));
        self
    }

    pub fn discrete(&mut self, states: DiscreteStates) -> &mut Self {
        self.coloring = Some(Coloring::Discrete(states));
        self
    }

    pub fn exponent(&mut self, exponent: f64) -> &mut Self {
        self.exponent = exponent;
        self
    }

    pub fn cap(&mut self, cap: usize) -> &mut Self {
        self.cap = cap;
        self
    }

    pub fn score_decimals(&mut self, decimals: i32) -> &mut Self {
        self.score_decimals = Some(decimals);
        self
    }

    pub fn punnett_limit(&mut self, limit: usize) -> &mut Self {
        self.punnett_limit = limit;
        self
    }

    /// Checks the configuration and builds the state table if there is one.
    ///
    /// Every effect, anchor and activity entry must name a configured marker,
    /// effect genes must match the marker's gene, and every state-table gene
    /// must own at least one marker.
    pub fn build(&self) -> Result<TraitConfig> {
        if self.markers.is_empty() {
            return Err(HeatmapError::Trait(format!("trait '{}' has no markers", self.name)));
        }
        let mut seen = HashSet::new();
        for marker in self.markers.iter() {
            if !seen.insert(marker.id.as_str()) {
                return Err(HeatmapError::DuplicateMarker(marker.id.clone()));
            }
        }
        let known = |id: &str| self.markers.iter().find(|m| m.id == id);

        for (gene, marker) in self.effects.keys() {
            match known(marker) {
                Some(m) if m.gene == gene => {}
                Some(_) => return Err(HeatmapError::UnknownGene(gene.to_string())),
                None => return Err(HeatmapError::UnknownMarker(marker.to_string())),
            }
        }
        if let Some(anchor) = &self.anchor {
            if known(anchor.marker()).is_none() {
                return Err(HeatmapError::UnknownMarker(anchor.marker().to_string()));
            }
        }
        if let Some(activity) = &self.activity {
            if let Some(missing) = activity.markers().find(|m| known(*m).is_none()) {
                return Err(HeatmapError::UnknownMarker(missing.to_string()));
            }
        }
        if !(self.exponent.is_finite() && self.exponent > 0.0) {
            return Err(HeatmapError::InvalidExponent(self.exponent));
        }
        if self.cap == 0 {
            return Err(HeatmapError::InvalidCap);
        }
        if let Some(decimals) = self.score_decimals {
            if !(0..=MAX_SCORE_DECIMALS).contains(&decimals) {
                return Err(HeatmapError::InvalidScoreDecimals {
                    decimals,
                    max: MAX_SCORE_DECIMALS,
                });
            }
        }

        let coloring = match &self.coloring {
            None => {
                return Err(HeatmapError::Trait(format!(
                    "trait '{}' has no coloring strategy",
                    self.name
                )))
            }
            Some(Coloring::Continuous(gradient)) => ColorStrategy::Continuous(gradient.clone()),
            Some(Coloring::Discrete(states)) => {
                if let Some(gene) = states
                    .genes
                    .iter()
                    .find(|g| !self.markers.iter().any(|m| m.gene == **g))
                {
                    return Err(HeatmapError::UnknownGene(gene.clone()));
                }
                ColorStrategy::StateTable(Arc::new(StateTable::new(
                    states.genes.clone(),
                    states.base.clone(),
                    states.overlay.clone(),
                    self.exponent,
                    states.threshold,
                    states.row,
                    states.column,
                )?))
            }
        };

        let mut scorer = EffectScorer::new(self.effects.clone());
        if let Some(anchor) = &self.anchor {
            scorer = scorer.with_anchor(anchor.clone());
        }
        if let Some(activity) = &self.activity {
            scorer = scorer.with_activity(activity.clone());
        }

        Ok(TraitConfig {
            name: self.name.clone(),
            markers: self.markers.clone(),
            scorer,
            coloring,
            exponent: self.exponent,
            cap: self.cap,
            score_decimals: self.score_decimals,
            punnett_limit: self.punnett_limit,
        })
    }
}

fn default_exponent() -> f64 {
    DEFAULT_EXPONENT
}

fn default_cap() -> usize {
    DEFAULT_HAPLOTYPE_CAP
}

fn default_punnett_limit() -> usize {
    DEFAULT_PUNNETT_LIMIT
}

fn default_threshold() -> f64 {
    0.7
}

/// Serialized form of a trait configuration, for hosts that keep trait
/// tables in JSON or TOML.
#[derive(Clone, Debug, Deserialize)]
pub struct TraitSpec {
    pub name: String,
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    #[serde(default)]
    pub anchor: Option<AnchorSpec>,
    #[serde(default)]
    pub activity: Option<ActivitySpec>,
    pub coloring: ColoringSpec,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    #[serde(default = "default_cap")]
    pub cap: usize,
    #[serde(default)]
    pub score_decimals: Option<i32>,
    #[serde(default = "default_punnett_limit")]
    pub punnett_limit: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EffectSpec {
    pub gene: String,
    pub marker: String,
    pub genotypes: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnchorSpec {
    pub marker: String,
    pub default_genotype: String,
    #[serde(default)]
    pub bias: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActivitySpec {
    pub weights: BTreeMap<String, f64>,
    pub row: ActivityLevels,
    pub column: ActivityLevels,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OverlaySpec {
    pub gene: String,
    pub trigger: GeneState,
    pub stops: Vec<GradientStop>,
    pub base_alpha: f64,
    pub slope: f64,
    pub max_alpha: f64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ColoringSpec {
    Continuous {
        stops: Vec<GradientStop>,
    },
    StateTable {
        genes: Vec<String>,
        base: Vec<GradientStop>,
        #[serde(default)]
        overlay: Option<OverlaySpec>,
        #[serde(default = "default_threshold")]
        threshold: f64,
        row: ActivityLevels,
        column: ActivityLevels,
    },
}
