//! Built-in pigmentation traits.
//!
//! Weights and palettes are reproduced as they are used for display; they make
//! no claim about the underlying biology.

use crate::config::{DiscreteStates, TraitConfig};
use crate::effect::{ActivityLevels, ActivityWeights, Anchor, EffectTable};
use crate::error::Result;
use crate::genotype::Genotype;
use crate::gradient::Gradient;
use crate::state_table::{GeneState, Overlay};

/// HERC2 marker that anchors eye color.
pub const EYE_ANCHOR: &str = "rs12913832";

/// Eye color, scored on a brownness axis (positive browner, negative bluer).
pub fn eye_color() -> Result<TraitConfig> {
    let effects = EffectTable::builder()
        .marker("HERC2", "rs12913832", &[("AA", 5.0), ("AG", 2.5), ("GG", -4.0)])
        .marker("OCA2", "rs1800407", &[("AA", 2.0), ("AG", 1.0), ("GG", 0.0)])
        .marker("TYR", "rs1126809", &[("AA", 1.0), ("AG", 0.6), ("GG", 0.0)])
        .marker("TYRP1", "rs1408799", &[("AA", 0.8), ("AG", 0.4), ("GG", 0.0)])
        .marker("IRF4", "rs12203592", &[("CC", 0.8), ("CT", 0.4), ("TT", 0.0)])
        .marker("SLC45A2", "rs16891982", &[("CC", -1.2), ("CG", -0.8), ("GG", 0.0)])
        .build()?;

    // Narrow hazel band between 0.40 and 0.52.
    let gradient = Gradient::from_literals(&[
        (0.0, [0x5A, 0x7F, 0xA6]),
        (0.20, [0x7A, 0x8C, 0x9A]),
        (0.40, [0x6E, 0x7B, 0x4E]),
        (0.52, [0x6B, 0x4A, 0x2D]),
        (0.70, [0x4A, 0x2E, 0x1F]),
        (1.0, [0x2B, 0x1B, 0x12]),
    ])?;

    TraitConfig::builder("eye_color")
        .marker("rs12913832", "HERC2")
        .marker("rs1800407", "OCA2")
        .marker("rs1126809", "TYR")
        .marker("rs16891982", "SLC45A2")
        .marker("rs12203592", "IRF4")
        .marker("rs1408799", "TYRP1")
        .effects(effects)
        .anchor(Anchor::new(EYE_ANCHOR, "GG", &[("AA", 0.0), ("AG", 0.0), ("GG", 0.0)])?)
        .continuous(gradient)
        .score_decimals(2)
        .build()
}

/// Coarse eye phenotype of an anchor genotype: any `A` allele reads brown.
pub fn eye_anchor_label(genotype: &Genotype) -> &'static str {
    if genotype.contains('A') {
        "Brown"
    } else {
        "Blue"
    }
}

/// Hair color. MC1R drives red, OCA2/HERC2 and KITLG lighten, SLC45A2 and
/// TYR darken.
pub fn hair_color() -> Result<TraitConfig> {
    let row = ActivityLevels::new(1.0, 0.55);
    let column = ActivityLevels::new(0.8, 0.45);

    let weights = [
        ("rs12913832", -2.2),
        ("rs12821256", -1.6),
        ("rs16891982", 2.0),
        ("rs1042602", 1.3),
        ("rs1805007", 1.0),
        ("rs1805008", 1.0),
        ("rs1805009", 1.0),
    ];

    let base = Gradient::from_literals(&[
        (0.0, [15, 12, 12]),
        (0.15, [45, 30, 24]),
        (0.3, [85, 55, 40]),
        (0.45, [125, 85, 55]),
        (0.6, [165, 120, 70]),
        (0.75, [205, 160, 95]),
        (0.9, [230, 200, 125]),
        (1.0, [238, 232, 215]),
    ])?;
    let red = Gradient::from_literals(&[
        (0.0, [45, 20, 15]),
        (0.25, [95, 45, 30]),
        (0.45, [145, 55, 35]),
        (0.6, [185, 80, 40]),
        (0.8, [215, 120, 60]),
        (1.0, [235, 175, 110]),
    ])?;

    TraitConfig::builder("hair_color")
        .marker("rs1805007", "MC1R")
        .marker("rs1805008", "MC1R")
        .marker("rs1805009", "MC1R")
        .marker("rs12821256", "KITLG")
        .marker("rs12913832", "OCA2/HERC2")
        .marker("rs16891982", "SLC45A2")
        .marker("rs1042602", "TYR")
        .activity(ActivityWeights::new(&weights, row, column)?)
        .discrete(DiscreteStates {
            genes: ["MC1R", "OCA2/HERC2", "KITLG", "SLC45A2", "TYR"]
                .iter()
                .map(|g| (*g).to_owned())
                .collect(),
            base,
            overlay: Some(Overlay {
                gene: "MC1R".to_owned(),
                trigger: GeneState::Heterozygous,
                gradient: red,
                base_alpha: 0.35,
                slope: 0.1,
                max_alpha: 0.75,
            }),
            threshold: 0.7,
            row,
            column,
        })
        .build()
}

/// Skin tone. A cell's score counts the alleles taken from the first slot of
/// each parent's genotype.
pub fn skin_tone() -> Result<TraitConfig> {
    let counted = ActivityLevels::new(1.0, 0.0);
    let markers = [
        ("rs1426654", "SLC24A5"),
        ("rs16891982", "SLC45A2"),
        ("rs1042602", "TYR"),
        ("rs1800407", "OCA2"),
        ("rs1805007", "MC1R"),
    ];
    let weights: Vec<(&str, f64)> = markers.iter().map(|(id, _)| (*id, 1.0)).collect();

    let gradient = Gradient::from_literals(&[
        (0.0, [246, 203, 150]),
        (0.5, [140, 78, 42]),
        (1.0, [47, 12, 5]),
    ])?;

    let mut builder = TraitConfig::builder("skin_tone");
    for (id, gene) in markers.iter() {
        builder.marker(id, gene);
    }
    builder
        .activity(ActivityWeights::new(&weights, counted, counted)?)
        .continuous(gradient)
        .build()
}

/// All built-in traits.
pub fn all() -> Result<Vec<TraitConfig>> {
    Ok(vec![eye_color()?, hair_color()?, skin_tone()?])
}
