use std::error::Error;

use clap::Parser;
use forecast_feed::{
    config::Config,
    db::{
        prod_db::ProdDb,
        renewables::{
            commodity::Commodity,
            update_pipeline::{run_update, UpdateMode, UpdatePipeline},
        },
    },
};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Type of update
    #[arg(short, long, value_enum)]
    update: UpdateMode,

    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,
}

/// Run the forecast update once a day after the model forecast is published,
/// the realtime update every 15 min.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::load(&args.env)?;
    let elia = ProdDb::elia(&config)?;
    let hf = ProdDb::hf_forecasts(&config);

    let pipelines: Vec<UpdatePipeline> = Commodity::all()
        .into_iter()
        .map(|commodity| UpdatePipeline {
            archive: ProdDb::renewables(&config, commodity),
            measurements: &elia,
            forecasts: &hf,
            tz: config.forecast_tz.clone(),
        })
        .collect();

    let report = run_update(args.update, &pipelines)?;
    for (commodity, e) in report.failures() {
        error!("{} was not updated: {}", commodity, e);
    }
    info!("{:?} update done for {} commodities", args.update, report.outcomes.len());

    Ok(())
}
