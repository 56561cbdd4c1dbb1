// Region Labels (as they appear in the reference tables)
pub const NORTH_LABEL: &str = "北部";
pub const CENTRAL_LABEL: &str = "中部";
pub const SOUTH_LABEL: &str = "南部";
pub const EAST_LABEL: &str = "東部";
pub const ISLANDS_LABEL: &str = "離島";
pub const NATIONAL_LABEL: &str = "全台";

// Fuel Labels
pub const SOLAR_LABEL: &str = "太陽能";
pub const WIND_LABEL: &str = "風力";              // measured wind, onshore and offshore combined
pub const ONSHORE_WIND_LABEL: &str = "陸域風電";
pub const OFFSHORE_WIND_LABEL: &str = "離岸風電";

// Legacy emission-source fuel taxonomy
pub const LEGACY_FUEL_RENAMES: [(&str, &str); 3] = [
    ("燃煤", "COAL"),
    ("燃氣", "LNG"),
    ("燃油", "OIL"),
];

// Inter-region corridors: (corridor name, origin label, destination label)
pub const CORRIDOR_TABLE: [(&str, &str, &str); 12] = [
    ("北送中潮流", NORTH_LABEL, CENTRAL_LABEL),
    ("東送中潮流", EAST_LABEL, CENTRAL_LABEL),
    ("南送中潮流", SOUTH_LABEL, CENTRAL_LABEL),
    ("北送東潮流", NORTH_LABEL, EAST_LABEL),
    ("中送東潮流", CENTRAL_LABEL, EAST_LABEL),
    ("南送東潮流", SOUTH_LABEL, EAST_LABEL),
    ("北送南潮流", NORTH_LABEL, SOUTH_LABEL),
    ("中送南潮流", CENTRAL_LABEL, SOUTH_LABEL),
    ("東送南潮流", EAST_LABEL, SOUTH_LABEL),
    ("中送北潮流", CENTRAL_LABEL, NORTH_LABEL),
    ("東送北潮流", EAST_LABEL, NORTH_LABEL),
    ("南送北潮流", SOUTH_LABEL, NORTH_LABEL),
];

// Time Resolution
pub const SAMPLES_PER_HOUR: usize = 6;            // native readings every 10 minutes
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Unit Conversions
pub const KW_PER_MW: f64 = 1_000.0;
pub const KW_PER_GW: f64 = 1_000_000.0;
pub const GRAMS_PER_KG: f64 = 1_000.0;
pub const TJ_PER_KCAL: f64 = 4.1868e-9;

// Global Warming Potentials (100-year, AR4)
pub const GWP_CO2: f64 = 1.0;
pub const GWP_CH4: f64 = 25.0;
pub const GWP_N2O: f64 = 298.0;

// Stationary combustion emission factors (kg per TJ, IPCC 2006 defaults)
pub const COAL_CO2_KG_PER_TJ: f64 = 94_600.0;    // other bituminous coal
pub const COAL_CH4_KG_PER_TJ: f64 = 1.0;
pub const COAL_N2O_KG_PER_TJ: f64 = 1.5;
pub const GAS_CO2_KG_PER_TJ: f64 = 56_100.0;     // natural gas
pub const GAS_CH4_KG_PER_TJ: f64 = 1.0;
pub const GAS_N2O_KG_PER_TJ: f64 = 0.1;
pub const DIESEL_CO2_KG_PER_TJ: f64 = 74_100.0;  // gas/diesel oil
pub const DIESEL_CH4_KG_PER_TJ: f64 = 3.0;
pub const DIESEL_N2O_KG_PER_TJ: f64 = 0.6;
pub const OIL_CO2_KG_PER_TJ: f64 = 77_400.0;     // residual fuel oil
pub const OIL_CH4_KG_PER_TJ: f64 = 3.0;
pub const OIL_N2O_KG_PER_TJ: f64 = 0.6;

// Numerical tolerance for share checks
pub const SHARE_SUM_TOLERANCE: f64 = 1e-9;
