use anyhow::Context;
use clap::Parser;
use tracing::info;

use gridintensity::analysis::reporting::{log_annual_summary, log_period_summary};
use gridintensity::analysis::summary::{annual_summary, summarize_period};
use gridintensity::cli::cli::Args;
use gridintensity::config::run_config::RunConfig;
use gridintensity::core::pipeline::{run_all, ReferenceData};
use gridintensity::utils::csv_export::CsvExporter;
use gridintensity::utils::logging::{self, FileIOType, OperationCategory};

fn load_config(args: &Args) -> anyhow::Result<RunConfig> {
    let _timing = logging::start_timing("load_config",
        OperationCategory::FileIO { subcategory: FileIOType::Other });

    let mut config = match args.config() {
        Some(path) => RunConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(dir) = args.data_dir() {
        config.data_dir = dir.to_path_buf();
    }
    if let Some(dir) = args.result_dir() {
        config.result_dir = dir.to_path_buf();
    }
    if let Some(scale) = args.scale() {
        config.scale = scale;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging())?;

    let config = load_config(&args)?;
    info!(
        data_dir = %config.data_dir.display(),
        periods = config.periods.len(),
        scale = %config.scale,
        parallel = args.parallel(),
        "Regional emission intensity run"
    );

    let reference = ReferenceData::load(&config)?;

    let exporter = if args.no_export() {
        None
    } else {
        Some(CsvExporter::new(&config.result_dir, args.debug_logging())
            .with_context(|| format!("creating result directory under {}", config.result_dir.display()))?)
    };

    let mut summaries = Vec::with_capacity(config.periods.len());
    run_all(&config, &reference, args.parallel(), |result| {
        let summary = summarize_period(result);
        log_period_summary(result, &summary);
        if let Some(exporter) = &exporter {
            exporter
                .export_period(result)
                .with_context(|| format!("exporting period {}", result.label))?;
        }
        summaries.push(summary);
        Ok(())
    })?;

    let annual = annual_summary(&summaries);
    log_annual_summary(&annual);
    if let Some(exporter) = &exporter {
        exporter.export_summary(&summaries, &annual).context("exporting summary")?;
        info!("Results written to {}", exporter.output_dir().display());
    }

    if logging::is_timing_enabled() {
        logging::print_timing_report();
    }
    Ok(())
}
