use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::analysis::summary::{diurnal_profile, AnnualSummary, PeriodSummary, HOURS_PER_DAY};
use crate::config::constants::{GRAMS_PER_KG, NATIONAL_LABEL, TIMESTAMP_FORMAT};
use crate::core::pipeline::PeriodResult;
use crate::error::Result;
use crate::models::emission_factor::Pollutant;
use crate::models::table::{HourIndex, IntensityTable, RegionalTable, ScaledSeries};
use crate::utils::logging::{self, FileIOType, OperationCategory};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const INDEX_HEADER: &str = "Time";

type Column = (String, Vec<f64>);

fn regional_columns(table: &RegionalTable, suffix: &str) -> Vec<Column> {
    table
        .iter()
        .map(|(region, values)| (format!("{}{}", region.label(), suffix), values.to_vec()))
        .collect()
}

fn intensity_columns(table: &IntensityTable, suffix: &str) -> Vec<Column> {
    let mut columns = regional_columns(&table.regional, suffix);
    columns.push((format!("{}{}", NATIONAL_LABEL, suffix), table.national.clone()));
    columns
}

fn scaled_columns(series: &ScaledSeries) -> Vec<Column> {
    match series {
        ScaledSeries::Regional(table) => regional_columns(table, ""),
        ScaledSeries::National(values) => vec![(NATIONAL_LABEL.to_string(), values.clone())],
    }
}

/// Writes result tables as BOM-prefixed UTF-8 CSV into a timestamped run
/// directory.
pub struct CsvExporter {
    output_dir: PathBuf,
    timestamp: String,
    verbose_logging: bool,
}

impl CsvExporter {
    /// Create `<output_dir>/<YYYYMMDD_HHMMSS>` and export into it.
    pub fn new(output_dir: impl AsRef<Path>, verbose_logging: bool) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let full_path = output_dir.as_ref().join(&timestamp);
        fs::create_dir_all(&full_path)?;

        Ok(Self {
            output_dir: full_path,
            timestamp,
            verbose_logging,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn create(&self, file_name: &str) -> Result<(PathBuf, csv::Writer<BufWriter<File>>)> {
        let path = self.output_dir.join(file_name);
        let mut file = BufWriter::new(File::create(&path)?);
        file.write_all(UTF8_BOM)?;
        Ok((path, csv::Writer::from_writer(file)))
    }

    /// One row per timestamp, one column per label.
    pub fn write_hourly(&self, file_name: &str, index: &HourIndex, columns: &[Column]) -> Result<PathBuf> {
        for (_, values) in columns {
            index.check_len(values.len())?;
        }

        let (path, mut writer) = self.create(file_name)?;
        let mut header = vec![INDEX_HEADER.to_string()];
        header.extend(columns.iter().map(|(label, _)| label.clone()));
        writer.write_record(&header)?;

        for (t, stamp) in index.iter().enumerate() {
            let mut row = vec![stamp.format(TIMESTAMP_FORMAT).to_string()];
            row.extend(columns.iter().map(|(_, values)| values[t].to_string()));
            writer.write_record(&row)?;
        }
        writer.flush()?;

        if self.verbose_logging {
            debug!(path = %path.display(), rows = index.len(), "Wrote hourly table");
        }
        Ok(path)
    }

    /// Capacity factors, diurnal profiles and pre-/post-flow intensities for
    /// one period.
    pub fn export_period(&self, result: &PeriodResult) -> Result<Vec<PathBuf>> {
        let _timing = logging::start_timing("export_period",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let label = &result.label;
        let mut written = Vec::new();

        for fuel in &result.fuels {
            let factor = &fuel.reported_factor;
            let mut columns = regional_columns(&factor.regional, "");
            columns.push((NATIONAL_LABEL.to_string(), factor.national.clone()));
            written.push(self.write_hourly(
                &format!("region_capacity_factor_{}_{}.csv", fuel.target.fuel, label),
                &result.index,
                &columns,
            )?);
            written.push(self.write_diurnal(
                &format!("region_capacity_factor_{}_{}_diurnal.csv", fuel.target.fuel, label),
                &factor.regional,
                &result.index,
            )?);
        }

        for pollutant in Pollutant::ALL {
            let Some(output) = result.pollutant(pollutant) else {
                continue;
            };
            written.push(self.write_hourly(
                &format!("{}_EI_{}.csv", pollutant, label),
                &result.index,
                &intensity_columns(&output.post_flow.intensity, ""),
            )?);
            written.push(self.write_hourly(
                &format!("{}_EI_{}_pre_flow.csv", pollutant, label),
                &result.index,
                &scaled_columns(&output.pre_flow_for(result.scale)),
            )?);
            if pollutant == Pollutant::CO2e {
                let kg = output.post_flow.intensity.map_values(|g| g / GRAMS_PER_KG);
                written.push(self.write_hourly(
                    &format!("{}_EI_{}_kg.csv", pollutant, label),
                    &result.index,
                    &intensity_columns(&kg, " (kgCO2e/kWh)"),
                )?);
            }
        }

        if self.verbose_logging {
            info!(period = %label, files = written.len(), dir = %self.output_dir.display(), "CSV export completed");
        }
        Ok(written)
    }

    fn write_diurnal(&self, file_name: &str, table: &RegionalTable, index: &HourIndex) -> Result<PathBuf> {
        let profiles = diurnal_profile(table, index)?;
        let (path, mut writer) = self.create(file_name)?;

        let mut header = vec!["Hour".to_string()];
        header.extend(profiles.keys().map(|region| region.label().to_string()));
        writer.write_record(&header)?;
        for hour in 0..HOURS_PER_DAY {
            let mut row = vec![hour.to_string()];
            row.extend(profiles.values().map(|profile| profile[hour].to_string()));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// Long-format table of period means, annual means and national
    /// averages.
    pub fn export_summary(&self, periods: &[PeriodSummary], annual: &AnnualSummary) -> Result<PathBuf> {
        let _timing = logging::start_timing("export_summary",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let (path, mut writer) = self.create("EI_summary.csv")?;
        writer.write_record(["Period", "Pollutant", "Column", "Mean (g/kWh)"])?;

        for period in periods {
            for (pollutant, columns) in &period.means {
                for (column, value) in columns {
                    let value = value.to_string();
                    writer.write_record([period.label.as_str(), pollutant.name(), column.as_str(), value.as_str()])?;
                }
            }
        }
        for (pollutant, columns) in &annual.means {
            for (column, value) in columns {
                let value = value.to_string();
                writer.write_record(["annual", pollutant.name(), column.as_str(), value.as_str()])?;
            }
        }
        for (pollutant, value) in &annual.national_average {
            let value = value.to_string();
            writer.write_record(["annual", pollutant.name(), "national average", value.as_str()])?;
        }
        writer.flush()?;

        if self.verbose_logging {
            info!(path = %path.display(), "Summary exported");
        }
        Ok(path)
    }
}
