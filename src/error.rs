use thiserror::Error;

/// Errors raised while building static trait configuration or reading
/// genotype tables.
///
/// Missing or unusable genotype data is not an error; the engine signals it by
/// returning `None`.
#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("Gradient has no stops")]
    EmptyGradient,

    #[error("Gradient must start at 0.0 and end at 1.0 (got {first} .. {last})")]
    MissingBoundaryStop { first: f64, last: f64 },

    #[error("Gradient stop positions must strictly increase ({previous} then {next})")]
    UnsortedStops { previous: f64, next: f64 },

    #[error("Gradient stop position {0} is outside [0, 1]")]
    StopOutOfRange(f64),

    #[error("'{genotype}' is not a canonical genotype (marker {marker})")]
    NonCanonicalGenotype { marker: String, genotype: String },

    #[error("Marker '{0}' is not part of the trait's marker list")]
    UnknownMarker(String),

    #[error("Gene '{0}' has no marker in the trait's marker list")]
    UnknownGene(String),

    #[error("Marker '{0}' is listed more than once")]
    DuplicateMarker(String),

    #[error("Nonlinear exponent must be finite and positive, got {0}")]
    InvalidExponent(f64),

    #[error("Haplotype cap must be at least 1")]
    InvalidCap,

    #[error("{what} must be a finite number, got {value}")]
    NonFinite { what: String, value: f64 },

    #[error("Score rounding must keep 0 to {max} decimals, got {decimals}")]
    InvalidScoreDecimals { decimals: i32, max: i32 },

    #[error("Trait configuration error: {0}")]
    Trait(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, HeatmapError>;

/// Passes `value` through if it is finite.
pub(crate) fn finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(HeatmapError::NonFinite {
            what: what.to_string(),
            value,
        })
    }
}
