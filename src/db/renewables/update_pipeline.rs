use std::fmt::{self, Display};
use std::path::Path;

use log::{error, info};

use crate::db::elia::client::MeasurementSource;
use crate::db::hf::forecast_file::ForecastSource;
use crate::db::renewables::commodity::{Commodity, RenewablesArchive};
use crate::db::series_store::SeriesFile;
use crate::error::FeedError;
use crate::interval::window::{last_day_window, next_day_window, UtcWindow};
use crate::timeseries::merge::{filter_to, merge};
use crate::timeseries::series::Series;

pub const FORECAST_SCHEMA: [&str; 3] = ["ci_lower", "forecast", "ci_upper"];
pub const ACTUAL_SCHEMA: [&str; 1] = ["value"];

/// Model forecast quantiles onto the forecast schema.
pub const MODEL_FORECAST_RENAME: [(&str, &str); 3] =
    [("q10", "ci_lower"), ("q50", "forecast"), ("q90", "ci_upper")];

/// Elia day-ahead forecast onto the forecast schema.
pub const BENCHMARK_RENAME: [(&str, &str); 3] = [
    ("dayahead11hconfidence10", "ci_lower"),
    ("dayahead11hforecast", "forecast"),
    ("dayahead11hconfidence90", "ci_upper"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UpdateMode {
    /// Model forecast, benchmark and yesterday's history.
    Forecast,
    /// Latest measurements.
    Realtime,
}

/// Keeps the forecast, benchmark and actual files of one commodity current.
pub struct UpdatePipeline<'a> {
    pub archive: RenewablesArchive,
    pub measurements: &'a dyn MeasurementSource,
    pub forecasts: &'a dyn ForecastSource,
    /// Timezone defining "next day" and "last day".
    pub tz: String,
}

impl<'a> UpdatePipeline<'a> {
    pub fn commodity(&self) -> Commodity {
        self.archive.commodity
    }

    pub fn run(&self, mode: UpdateMode) -> Result<(), FeedError> {
        match mode {
            UpdateMode::Forecast => {
                let next_day = next_day_window(&self.tz)?;
                self.update_forecast_file(&next_day)?;
                self.update_benchmark_file(&next_day)?;
                self.update_history_benchmark_file(None)?;
            }
            UpdateMode::Realtime => self.update_realtime_data()?,
        }
        Ok(())
    }

    /// Add the latest measurements to the actual file.
    pub fn update_realtime_data(&self) -> Result<(), FeedError> {
        let dataset = self.commodity().config().realtime_dataset;
        let realtime = self
            .measurements
            .load_realtime_measurements(dataset)?
            .select(&ACTUAL_SCHEMA)
            .drop_nulls();
        let path = self.archive.actual_file();
        let n = merge_into(&path, &ACTUAL_SCHEMA, realtime)?;
        info!("Realtime data successfully written to {} ({} records)", path.display(), n);
        Ok(())
    }

    /// Add the model forecast for `window` to the forecast file.
    pub fn update_forecast_file(&self, window: &UtcWindow) -> Result<(), FeedError> {
        let namespace = self.commodity().config().namespace;
        let forecast = self
            .forecasts
            .load_forecast(namespace)?
            .rename(&MODEL_FORECAST_RENAME);
        let next_day = filter_to(forecast, window).select(&FORECAST_SCHEMA);
        if next_day.is_empty() {
            info!("No {} model forecast for {}", namespace, window);
        }
        let path = self.archive.forecast_file();
        merge_into(&path, &FORECAST_SCHEMA, next_day)?;
        info!("Forecast data successfully written to {}.", path.display());
        Ok(())
    }

    /// Add Elia's day-ahead forecast for `window` to the benchmark file.
    pub fn update_benchmark_file(&self, window: &UtcWindow) -> Result<(), FeedError> {
        let dataset = self.commodity().config().realtime_dataset;
        let benchmark = self
            .measurements
            .load_realtime_measurements(dataset)?
            .rename(&BENCHMARK_RENAME);
        let next_day = filter_to(benchmark, window).select(&FORECAST_SCHEMA);
        let path = self.archive.benchmark_file();
        merge_into(&path, &FORECAST_SCHEMA, next_day)?;
        info!("Benchmark forecast data successfully written to {}.", path.display());
        Ok(())
    }

    /// Replace the benchmark and the actual values for a past window with the
    /// consolidated history.  Defaults to yesterday.
    pub fn update_history_benchmark_file(&self, window: Option<UtcWindow>) -> Result<(), FeedError> {
        let window = match window {
            Some(window) => window,
            None => last_day_window(&self.tz)?,
        };
        let dataset = self.commodity().config().history_dataset;
        let history = self
            .measurements
            .load_history_measurements(dataset, window.start, window.end)?
            .rename(&BENCHMARK_RENAME);
        let history = filter_to(history, &window);

        let benchmark = history.clone().select(&FORECAST_SCHEMA).drop_nulls();
        let path = self.archive.benchmark_file();
        merge_into(&path, &FORECAST_SCHEMA, benchmark)?;
        info!("Forecast data successfully written to {}.", path.display());

        let actual = history.select(&ACTUAL_SCHEMA).drop_nulls();
        let path = self.archive.actual_file();
        merge_into(&path, &ACTUAL_SCHEMA, actual)?;
        info!("Actual data successfully written to {}.", path.display());
        Ok(())
    }
}

/// Load the file at `path`, merge `incoming` into it and write it back.
/// Returns the number of records in the file.
pub fn merge_into(path: &Path, schema: &[&str], incoming: Series) -> Result<usize, FeedError> {
    let mut file = SeriesFile::load(path)?;
    let existing = std::mem::take(&mut file.data).select(schema);
    file.data = merge(existing, incoming.select(schema));
    file.save(path)?;
    Ok(file.data.len())
}

/// What happened to each commodity during a run.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub outcomes: Vec<(Commodity, Result<(), FeedError>)>,
}

impl UpdateReport {
    pub fn failures(&self) -> Vec<(Commodity, &FeedError)> {
        self.outcomes
            .iter()
            .filter_map(|(c, res)| res.as_ref().err().map(|e| (*c, e)))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }
}

impl Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (commodity, res) in &self.outcomes {
            match res {
                Ok(()) => writeln!(f, "{commodity}: ok")?,
                Err(e) => writeln!(f, "{commodity}: {e}")?,
            }
        }
        Ok(())
    }
}

/// Update each commodity in turn.  A failing commodity is logged and skipped,
/// only a configuration error stops the run.
pub fn run_update(mode: UpdateMode, pipelines: &[UpdatePipeline]) -> Result<UpdateReport, FeedError> {
    let mut report = UpdateReport::default();
    for pipeline in pipelines {
        let commodity = pipeline.commodity();
        match pipeline.run(mode) {
            Ok(()) => report.outcomes.push((commodity, Ok(()))),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("Error updating {} data: {}", commodity, e);
                report.outcomes.push((commodity, Err(e)));
            }
        }
    }
    info!("Update completed.");
    Ok(report)
}
