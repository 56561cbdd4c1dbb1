use thiserror::Error;

/// Fatal errors for a period's computation.
///
/// Lookup misses and zero denominators are not represented here: they are
/// absorbed where they occur and reported through `tracing` and the
/// diagnostic structs returned next to the results.
#[derive(Debug, Error)]
pub enum EmissionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown capacity unit '{0}', expected one of kW, MW, GW")]
    UnknownCapacityUnit(String),

    #[error("Unknown fuel type: {0}")]
    UnknownFuel(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Unknown pollutant: {0}")]
    UnknownPollutant(String),

    #[error("Unknown calculation scale: {0}")]
    UnknownScale(String),

    #[error("Series '{key}' has {found} hourly values, expected {expected}")]
    SeriesLengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("Unknown flow corridor: {0}")]
    UnknownCorridor(String),

    #[error("Flow data does not match the {schema} schema: {reason}")]
    FlowSchema { schema: &'static str, reason: String },

    #[error("Invalid reading for unit '{unit}': {value}")]
    InvalidReading { unit: String, value: String },

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Time index has {index} hours but the period data has {data}")]
    IndexLengthMismatch { index: usize, data: usize },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, EmissionError>;
