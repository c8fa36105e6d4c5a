mod cache;
mod chains;
mod export;
mod geo;
mod pipeline;
mod places;
mod record;

use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::Parser;
use leadscout_crawler::{CrawlerConfig, OnError, Throttle};
use tokio::runtime;

use crate::cache::Cache;
use crate::record::{PlaceRecord, NOT_AVAILABLE};

/// Business lead discovery: places search, website crawl, contact email
/// ranking
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    /// Search an area for businesses, crawl their websites for contact
    /// emails and export a CSV
    Find(FindArgs),
    /// Crawl a single website and print its ranked contact addresses
    Emails(EmailsArgs),
    /// Re-export a cache file as CSV
    Export(ExportArgs),
}

#[derive(Debug, clap::Args)]
pub struct FindArgs {
    /// Center of the search (address or city)
    #[arg(long, short = 'c', default_value = "Oklahoma City, OK")]
    pub search_center: String,
    /// Radius of each batch search, in km
    #[arg(long, short = 'r', default_value_t = 5.0)]
    pub search_radius: f64,
    /// Distance to move the center between batches, in km
    #[arg(long, short = 'd', default_value_t = 2.5)]
    pub distance: f64,
    /// Bearing of center moves, in degrees from north
    #[arg(long, short = 'b', default_value_t = 180.0)]
    pub bearing: f64,
    /// Number of businesses to retrieve
    #[arg(long, short = 'n', default_value_t = 20)]
    pub number: usize,
    /// Type of business to search for
    #[arg(long, short = 't', default_value = "restaurant")]
    pub business_type: String,
    /// Output CSV file
    #[arg(long, short = 'o', default_value = "businesses.csv")]
    pub output: PathBuf,
    /// Google API key
    #[arg(long, short = 'a', env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: String,
    /// Directory holding the per-category cache files
    #[arg(long, default_value = ".")]
    pub cache_dir: PathBuf,
    #[command(flatten)]
    pub crawl: CrawlOpts,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, clap::Args)]
pub struct EmailsArgs {
    /// Website URL to crawl
    pub url: String,
    #[command(flatten)]
    pub crawl: CrawlOpts,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    /// Cache file to export
    pub cache_file: PathBuf,
    /// Output CSV file
    #[arg(long, short = 'o', default_value = "businesses.csv")]
    pub output: PathBuf,
}

/// Per-site crawler overrides.
#[derive(Debug, clap::Args)]
pub struct CrawlOpts {
    /// Override the maximum concurrent page downloads
    #[arg(long)]
    pub concurrent_downloads: Option<usize>,
    /// Override the number of page processing workers
    #[arg(long)]
    pub num_workers: Option<usize>,
    /// Cap requests per second against a crawled site (0 disables
    /// throttling)
    #[arg(long)]
    pub rps: Option<u32>,
    /// Override the maximum pages fetched per site
    #[arg(long)]
    pub max_pages: Option<usize>,
    /// Override the per-site crawl deadline, in seconds
    #[arg(long)]
    pub crawl_timeout: Option<f32>,
    /// Override the crawler user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Download error handling strategy
    #[arg(long, value_enum)]
    pub on_dl_error: Option<OnError>,
    /// Page processing error handling strategy
    #[arg(long, value_enum)]
    pub on_scrap_error: Option<OnError>,
}

impl From<&CrawlOpts> for CrawlerConfig {
    fn from(opts: &CrawlOpts) -> Self {
        let mut conf = CrawlerConfig::default();
        if let Some(concurrent_downloads) = opts.concurrent_downloads {
            conf.concurrent_downloads = concurrent_downloads;
        }
        if let Some(num_workers) = opts.num_workers {
            conf.num_workers = num_workers;
        }
        if let Some(rps) = opts.rps {
            conf.throttle = NonZeroU32::new(rps).map(Throttle::PerSecond);
        }
        if let Some(max_pages) = opts.max_pages {
            conf.max_pages = Some(max_pages);
        }
        if let Some(crawl_timeout) = opts.crawl_timeout {
            conf.crawl_timeout = Some(crawl_timeout);
        }
        if let Some(user_agent) = &opts.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(on_dl_error) = opts.on_dl_error {
            conf.on_dl_error = on_dl_error;
        }
        if let Some(on_scrap_error) = opts.on_scrap_error {
            conf.on_scrap_error = on_scrap_error;
        }
        conf
    }
}

pub fn find(args: FindArgs) -> anyhow::Result<()> {
    let crawler_conf = CrawlerConfig::from(&args.crawl);
    let client = places::PlacesClient::new(args.api_key.clone())?;
    let params = pipeline::SearchParams {
        center: args.search_center.clone(),
        radius_km: args.search_radius,
        step_km: args.distance,
        bearing_deg: args.bearing,
        target_count: args.number,
        business_type: args.business_type.clone(),
    };
    let cache_path = args.cache_dir.join(Cache::file_name(&args.business_type));

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(pipeline::run(
        &client,
        &params,
        &crawler_conf,
        &cache_path,
        &args.output,
    ))
}

pub fn emails(args: EmailsArgs) -> anyhow::Result<()> {
    let crawler_conf = CrawlerConfig::from(&args.crawl);
    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let found = rt.block_on(leadscout_extract::harvest_emails(&args.url, &crawler_conf))?;
    if found.is_empty() {
        println!("{NOT_AVAILABLE}");
    } else {
        for email in found {
            println!("{email}");
        }
    }
    Ok(())
}

pub fn export(args: ExportArgs) -> anyhow::Result<()> {
    let cache = Cache::load(&args.cache_file)?;
    let mut records: Vec<&PlaceRecord> = cache.records().map(|(_, record)| record).collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));
    export::export_csv(&args.output, records)?;
    println!("Wrote {} records to {}", cache.len(), args.output.display());
    Ok(())
}

fn init_logging(quiet: bool) {
    if quiet {
        return;
    }
    if env::var_os("RUST_LOG").is_none() {
        env::set_var(
            "RUST_LOG",
            "leadscout=info,leadscout_crawler=info,leadscout_extract=info",
        );
    }
    env_logger::init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Find(args) => {
            init_logging(args.quiet);
            find(args)
        }
        SubCommand::Emails(args) => {
            init_logging(args.quiet);
            emails(args)
        }
        SubCommand::Export(args) => {
            init_logging(false);
            export(args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> CrawlOpts {
        CrawlOpts {
            concurrent_downloads: None,
            num_workers: None,
            rps: None,
            max_pages: None,
            crawl_timeout: None,
            user_agent: None,
            on_dl_error: None,
            on_scrap_error: None,
        }
    }

    #[test]
    fn crawl_opts_override_defaults() {
        let opts = CrawlOpts {
            concurrent_downloads: Some(4),
            rps: Some(2),
            max_pages: Some(50),
            ..no_overrides()
        };
        let conf = CrawlerConfig::from(&opts);
        assert_eq!(conf.concurrent_downloads, 4);
        assert!(matches!(conf.throttle, Some(Throttle::PerSecond(n)) if n.get() == 2));
        assert_eq!(conf.max_pages, Some(50));
        assert_eq!(conf.num_workers, CrawlerConfig::default().num_workers);
    }

    #[test]
    fn zero_rps_disables_throttling() {
        let opts = CrawlOpts {
            rps: Some(0),
            ..no_overrides()
        };
        let conf = CrawlerConfig::from(&opts);
        assert!(conf.throttle.is_none());
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
