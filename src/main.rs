use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use rental_cleaner::config::Config;
use rental_cleaner::logging;
use rental_cleaner::pipeline::processing::geocode::{BanGeocoder, Geocoder, NullGeocoder};
use rental_cleaner::pipeline::{load_stations, Pipeline, PipelineResult, SourcePaths};

#[derive(Parser)]
#[command(name = "rental_cleaner")]
#[command(about = "Normalize, geocode and filter scraped rental listings")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = rental_cleaner::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Raw Guy Hoquet table
    #[arg(long)]
    guy_hoquet: PathBuf,
    /// Raw Laforêt table
    #[arg(long)]
    laforet: PathBuf,
    /// Raw Orpi table
    #[arg(long)]
    orpi: PathBuf,
    /// Local station list, one name per line, instead of downloading it
    #[arg(long)]
    stations_file: Option<PathBuf>,
}

impl SourceArgs {
    fn paths(&self) -> SourcePaths {
        SourcePaths {
            guy_hoquet: self.guy_hoquet.clone(),
            laforet: self.laforet.clone(),
            orpi: self.orpi.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline and write the monthly clean table
    Clean {
        #[command(flatten)]
        sources: SourceArgs,
        /// Folder receiving locations_<year>_<month>_clean.csv
        #[arg(long)]
        data_folder: Option<PathBuf>,
        /// Skip geocoding; every row then lacks coordinates and is filtered out
        #[arg(long)]
        no_geocode: bool,
    },
    /// Normalize and infer addresses only, writing the intermediate table
    Normalize {
        #[command(flatten)]
        sources: SourceArgs,
        /// Output path for the addressed table
        #[arg(long)]
        output: PathBuf,
    },
}

fn print_result(result: &PipelineResult) {
    println!("\n📊 Pipeline Results:");
    for (source, summary) in &result.sources {
        println!(
            "   {}: {} read, {} kept, {} duplicates, {} dropped",
            source,
            summary.rows_in,
            summary.rows_kept,
            summary.duplicates_removed,
            summary.total_dropped()
        );
        for (reason, count) in &summary.dropped {
            println!("      - {}: {}", reason, count);
        }
    }
    println!("   Merged listings: {}", result.merged_rows);
    println!("   With an address: {}", result.addressed_rows);
    println!(
        "   Geocoded: {} found, {} no match, {} timeout, {} failed, {} skipped",
        result.geocode.found,
        result.geocode.no_match,
        result.geocode.timeout,
        result.geocode.failed,
        result.geocode.skipped
    );
    println!(
        "   Retained: {} ({} outside box, {} without coordinates)",
        result.outliers.retained, result.outliers.outside_box, result.outliers.missing_coords
    );
    if let Some(output_file) = &result.output_file {
        println!("   Output file: {}", output_file);
    }
}

fn build_pipeline(config: &Config, sources: &SourceArgs, geocoder: Box<dyn Geocoder>) -> anyhow::Result<Pipeline> {
    let mut stations_config = config.stations.clone();
    if let Some(file) = &sources.stations_file {
        stations_config.file = Some(file.clone());
    }
    let stations = load_stations(
        &stations_config,
        &config.geocoder.user_agent,
        Duration::from_secs(config.geocoder.timeout_seconds),
    )?;
    if stations.is_empty() {
        warn!("Station list is empty, metro inference disabled");
    } else {
        info!(stations = stations.len(), "Loaded station list");
    }
    Ok(Pipeline::from_config(config, &stations, geocoder)?)
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load_from(&cli.config)?;
    let _log_guard = logging::init_logging(&config.logging)?;

    let outcome = match cli.command {
        Commands::Clean {
            sources,
            data_folder,
            no_geocode,
        } => {
            println!("🧹 Running cleaning pipeline...");
            let geocoder: Box<dyn Geocoder> = if no_geocode {
                Box::new(NullGeocoder)
            } else {
                Box::new(BanGeocoder::new(&config.geocoder)?)
            };
            let pipeline = build_pipeline(&config, &sources, geocoder)?;
            let data_folder = data_folder.unwrap_or_else(|| config.output.data_folder.clone());
            pipeline.run_to_disk(&sources.paths(), &data_folder)
        }
        Commands::Normalize { sources, output } => {
            println!("🔨 Running normalization...");
            let pipeline = build_pipeline(&config, &sources, Box::new(NullGeocoder))?;
            pipeline.normalize_to_disk(&sources.paths(), &output)
        }
    };

    match outcome {
        Ok(result) => {
            info!("Pipeline finished");
            print_result(&result);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            println!("❌ Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}
