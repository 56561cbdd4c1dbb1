// Module declarations for the regional emission-intensity model

// Pipeline stages
pub mod core {
    pub mod capacity_factor;
    pub mod capacity_percentage;
    pub mod target_generation;
    pub mod emission_factors;
    pub mod regional_emissions;
    pub mod intensity;
    pub mod power_flow;
    pub mod pipeline;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod const_funcs;
    pub mod fuel_type;
    pub mod run_config;
}

// Model definitions
pub mod models {
    pub mod region;
    pub mod generation;
    pub mod reference;
    pub mod table;
    pub mod emission_factor;
    pub mod flow;
}

// Data loaders
pub mod data {
    pub mod readings_loader;
    pub mod reference_loader;
    pub mod emission_sources;
    pub mod flow_loader;
}

// Summaries over computed tables
pub mod analysis {
    pub mod summary;
    pub mod reporting;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

pub mod error;

// Re-export commonly used types
pub use crate::error::{EmissionError, Result};
pub use crate::models::region::Region;
pub use crate::models::table::{RegionalTable, Scale};
pub use crate::models::emission_factor::Pollutant;
pub use crate::core::pipeline::{run_period, PeriodResult};
