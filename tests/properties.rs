//! Property-based checks of the combinatorial core.

use proptest::prelude::*;

use std::collections::HashSet;
use trait_heatmap::grid::min_max_denominator;
use trait_heatmap::haplotype::{enumerate, DEFAULT_HAPLOTYPE_CAP};
use trait_heatmap::prelude::*;

fn allele() -> impl Strategy<Value = char> {
    prop::sample::select(vec!['A', 'C', 'G', 'T', 'a', 'c', 'g', 't'])
}

fn allele_pair() -> impl Strategy<Value = AllelePair> {
    (allele(), allele()).prop_map(|(a, b)| AllelePair::new(a, b).unwrap())
}

fn gradient() -> impl Strategy<Value = Gradient> {
    (
        prop::collection::btree_set(1u32..1000, 0..6),
        prop::collection::vec(any::<[u8; 3]>(), 8),
    )
        .prop_map(|(inner, colors)| {
            let mut positions = vec![0.0];
            positions.extend(inner.into_iter().map(|p| f64::from(p) / 1000.0));
            positions.push(1.0);
            let stops: Vec<(f64, [u8; 3])> = positions.into_iter().zip(colors).collect();
            Gradient::from_literals(&stops).unwrap()
        })
}

proptest! {
    #[test]
    fn punnett_probabilities_sum_to_one(a in allele_pair(), b in allele_pair()) {
        let result = PunnettResult::cross(&a, &b);
        let total: f64 = result.iter().map(|(_, p)| *p).sum();
        prop_assert!((total - 1.0).abs() < 1e-12, "total={}", total);
        prop_assert!(result.len() >= 1 && result.len() <= 3);
        for (genotype, p) in result.iter() {
            prop_assert!(*p > 0.0);
            prop_assert_eq!(genotype.to_string(), genotype.to_string().to_uppercase());
        }
    }

    #[test]
    fn punnett_is_symmetric(a in allele_pair(), b in allele_pair()) {
        prop_assert_eq!(PunnettResult::cross(&a, &b), PunnettResult::cross(&b, &a));
    }

    #[test]
    fn haplotype_count_is_capped(pairs in prop::collection::vec(allele_pair(), 0..40), cap in 1usize..20) {
        let haplotypes = enumerate(&pairs, cap);
        let expected = if pairs.is_empty() {
            0
        } else if pairs.len() >= 32 {
            cap
        } else {
            cap.min(1usize << pairs.len())
        };
        prop_assert_eq!(haplotypes.len(), expected);
        for h in haplotypes.iter() {
            prop_assert_eq!(h.len(), pairs.len());
        }
    }

    #[test]
    fn uncapped_haplotypes_are_unique(pairs in prop::collection::vec(allele_pair(), 1..7)) {
        let haplotypes = enumerate(&pairs, usize::MAX);
        prop_assert_eq!(haplotypes.len(), 1 << pairs.len());
        let labels: HashSet<&str> = haplotypes.iter().map(|h| h.as_str()).collect();
        prop_assert_eq!(labels.len(), haplotypes.len());
    }

    #[test]
    fn samples_stay_between_neighbouring_stops(g in gradient(), t in -0.5f64..1.5) {
        let color = g.sample(t);
        let clamped = t.max(0.0).min(1.0);
        let pair = g
            .stops()
            .windows(2)
            .find(|w| clamped <= w[1].position)
            .unwrap();
        for channel in 0..3 {
            let (lo, hi) = {
                let a = pair[0].color.channels()[channel];
                let b = pair[1].color.channels()[channel];
                (a.min(b), a.max(b))
            };
            let c = color.channels()[channel];
            prop_assert!(c >= lo && c <= hi, "channel {} = {} outside [{}, {}]", channel, c, lo, hi);
        }
    }

    #[test]
    fn gradient_ends_are_exact(g in gradient(), exponent in 0.1f64..4.0) {
        prop_assert_eq!(g.sample(0.0), g.first());
        prop_assert_eq!(g.sample(1.0), g.last());
        prop_assert_eq!(g.sample_remapped(0.0, exponent), g.first());
        prop_assert_eq!(g.sample_remapped(1.0, exponent), g.last());
    }

    #[test]
    fn denominator_is_at_least_one(min in -50.0f64..50.0, span in 0.0f64..50.0) {
        let d = min_max_denominator(min, min + span);
        prop_assert!(d >= 1.0);
        prop_assert!((min + span - min) / d <= 1.0 + 1e-12);
    }
}

#[test]
fn default_cap_bounds_large_inputs() {
    let pairs: Vec<AllelePair> = (0..200).map(|_| AllelePair::new('A', 'G').unwrap()).collect();
    assert_eq!(enumerate(&pairs, DEFAULT_HAPLOTYPE_CAP).len(), DEFAULT_HAPLOTYPE_CAP);
}
