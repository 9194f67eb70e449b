//! Piecewise-linear color gradients.

use crate::error::{HeatmapError, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// An 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

fn channel(value: f64) -> u8 {
    value.round().max(0.0).min(255.0) as u8
}

impl Rgb {
    pub fn channels(&self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }

    /// `#RRGGBB` with upper-case hex digits.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Mixes `overlay` into `self`; `alpha` of 0 keeps `self`, 1 gives `overlay`.
    pub fn blend(&self, overlay: Rgb, alpha: f64) -> Rgb {
        let mix = |base: u8, over: u8| channel(f64::from(base) * (1.0 - alpha) + f64::from(over) * alpha);
        Rgb(
            mix(self.0, overlay.0),
            mix(self.1, overlay.1),
            mix(self.2, overlay.2),
        )
    }

    fn lerp(&self, to: Rgb, t: f64) -> Rgb {
        let step = |a: u8, b: u8| channel(f64::from(a) + (f64::from(b) - f64::from(a)) * t);
        Rgb(step(self.0, to.0), step(self.1, to.1), step(self.2, to.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Rgb,
}

impl GradientStop {
    pub fn new(position: f64, color: Rgb) -> Self {
        Self { position, color }
    }
}

/// An ordered list of stops covering `[0, 1]`.
///
/// Positions strictly increase, the first is 0.0 and the last 1.0. These are
/// checked once in [`Gradient::new`]; sampling never fails.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn new(stops: Vec<GradientStop>) -> Result<Self> {
        let (first, last) = match (stops.first(), stops.last()) {
            (Some(first), Some(last)) => (first.position, last.position),
            _ => return Err(HeatmapError::EmptyGradient),
        };
        if let Some(bad) = stops
            .iter()
            .map(|s| s.position)
            .find(|p| !(0.0..=1.0).contains(p))
        {
            return Err(HeatmapError::StopOutOfRange(bad));
        }
        if first != 0.0 || last != 1.0 {
            return Err(HeatmapError::MissingBoundaryStop { first, last });
        }
        if let Some(pair) = stops.windows(2).find(|w| w[1].position <= w[0].position) {
            return Err(HeatmapError::UnsortedStops {
                previous: pair[0].position,
                next: pair[1].position,
            });
        }
        Ok(Self { stops })
    }

    /// Builds a gradient from `(position, [r, g, b])` literals.
    pub fn from_literals(stops: &[(f64, [u8; 3])]) -> Result<Self> {
        Self::new(
            stops
                .iter()
                .map(|&(position, [r, g, b])| GradientStop::new(position, Rgb(r, g, b)))
                .collect(),
        )
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    pub fn first(&self) -> Rgb {
        self.stops[0].color
    }

    pub fn last(&self) -> Rgb {
        self.stops[self.stops.len() - 1].color
    }

    /// Color at `t`, clamped to `[0, 1]`.
    ///
    /// The first stop at or beyond `t` is interpolated against the stop before
    /// it. Both ends return their stop color exactly.
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.max(0.0).min(1.0) };
        for pair in self.stops.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if t <= next.position {
                let local = (t - prev.position) / (next.position - prev.position);
                return prev.color.lerp(next.color, local);
            }
        }
        self.last()
    }

    /// Clamps `t`, raises it to `exponent`, then samples.
    ///
    /// Exponents above 1 spend more of the range near the first stop.
    pub fn sample_remapped(&self, t: f64, exponent: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.max(0.0).min(1.0) };
        self.sample(t.powf(exponent))
    }
}
