use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use museos_cli::{
    ai::AIExtractor,
    batch::Batch,
    categorize::categorize_table,
    config::{self, GeocodeConfig, ScrapeConfig},
    geocode::{enrich_coordinates, GoogleGeocoder},
    scraper::Scraper,
    utils,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "CDMX museum directory pipeline", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the directory and extract every museum page with the model
    Scrape {
        /// Only process the first N museums
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[arg(short, long, default_value = config::RAW_CSV)]
        output: PathBuf,
    },
    /// Add latitud/longitud columns using the geocoding service
    Coordinates {
        #[arg(short, long, default_value = config::RAW_CSV)]
        input: PathBuf,

        #[arg(short, long, default_value = config::COORDINATES_CSV)]
        output: PathBuf,
    },
    /// Add a categoria column from keyword scoring
    Categories {
        #[arg(short, long, default_value = config::COORDINATES_CSV)]
        input: PathBuf,

        #[arg(short, long, default_value = config::CATEGORIES_CSV)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    utils::init_logging();

    let args = Args::parse();

    match args.command {
        Command::Scrape { limit, output } => {
            let mut config = ScrapeConfig::from_env()?;
            config.output = output;

            let scraper = Scraper::new(config.page_timeout)?;
            let mut listings = scraper
                .fetch_listing(&config.base_url, &config.list_path)
                .await
                .context("no se pudo descargar el listado maestro")?;
            println!("-> Se encontraron {} museos únicos.", listings.len());
            if let Some(limit) = limit {
                listings.truncate(limit);
            }

            let extractor = AIExtractor::new(&config);
            let mut batch = Batch::new(
                &scraper,
                &extractor,
                config.request_delay,
                config.max_text_chars,
            );
            batch.run(&listings, &config.output).await?;
        }
        Command::Coordinates { input, output } => {
            let config = GeocodeConfig::from_env()?;
            let geocoder = GoogleGeocoder::new(&config);

            println!("📖 Leyendo archivo CSV...");
            let mut table = utils::read_table(&input)?;
            let report = enrich_coordinates(
                &mut table,
                &geocoder,
                &config.address_suffix,
                config.request_delay,
            )
            .await;
            utils::write_table(&table, &output)?;

            println!("📊 {} museos con coordenadas exitosas", report.found);
            println!("⚠️  {} museos sin coordenadas", report.missing);
        }
        Command::Categories { input, output } => {
            let mut table = utils::read_table(&input)?;
            let distribution = categorize_table(&mut table);
            utils::write_table(&table, &output)?;

            println!("\n📊 Distribución de categorías:");
            for (category, count) in distribution {
                println!("  {}: {} museos", category, count);
            }
        }
    }

    Ok(())
}
