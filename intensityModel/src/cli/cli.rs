use std::path::{Path, PathBuf};

use clap::Parser;

use crate::models::table::Scale;

#[derive(Parser, Debug)]
#[command(author, version, about = "Regional emission intensity with inter-region power flow", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "JSON run configuration; built-in 2024 setup when omitted")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Directory holding the input files")]
    data_dir: Option<PathBuf>,

    #[arg(short, long, help = "Directory the timestamped result folder is created in")]
    result_dir: Option<PathBuf>,

    #[arg(short, long, help = "Calculation scale: regional or national")]
    scale: Option<Scale>,

    #[arg(short, long, default_value_t = false, help = "Compute pollutants concurrently")]
    parallel: bool,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,

    #[arg(long, default_value_t = false, help = "Skip writing CSV results")]
    no_export: bool,
}

impl Args {
    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn result_dir(&self) -> Option<&Path> {
        self.result_dir.as_deref()
    }

    pub fn scale(&self) -> Option<Scale> {
        self.scale
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn no_export(&self) -> bool {
        self.no_export
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let args = Args::parse_from([
            "gridintensity",
            "--config", "run.json",
            "--data-dir", "data/2025",
            "--scale", "national",
            "--parallel",
            "--no-export",
        ]);
        assert_eq!(args.config(), Some(Path::new("run.json")));
        assert_eq!(args.data_dir(), Some(Path::new("data/2025")));
        assert_eq!(args.result_dir(), None);
        assert_eq!(args.scale(), Some(Scale::National));
        assert!(args.parallel());
        assert!(args.no_export());
        assert!(!args.enable_timing());
    }

    #[test]
    fn rejects_unknown_scale() {
        assert!(Args::try_parse_from(["gridintensity", "--scale", "global"]).is_err());
    }
}
