//! heliospec command line: release catalogs, file downloads, noise budgets.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::blocking::Client;

use heliospec::{
    metadata, noise_budget, parse_timestamp, Catalog, CatalogEntry, Downloader, FileCache,
    FileSource, Header, Release,
};

#[derive(Parser)]
#[command(
    name = "heliospec",
    about = "Release catalogs, file downloads, and noise budgets for SPICE data",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the latest data release tag.
    LatestRelease,

    /// List catalog entries of a release.
    List {
        /// Release tag (defaults to the latest release).
        #[arg(short, long)]
        release: Option<String>,

        /// Keep only entries of this level.
        #[arg(short, long)]
        level: Option<String>,

        /// Keep only entries observed at or after this date.
        #[arg(long)]
        after: Option<String>,

        /// Keep only entries observed at or before this date.
        #[arg(long)]
        before: Option<String>,

        /// Maximum number of entries to print.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Re-download the cached catalog.
        #[arg(long)]
        update_cache: bool,
    },

    /// Find the file observed closest to a date.
    FindFile {
        /// Target date (ISO 8601).
        #[arg(short, long)]
        date: String,

        /// Level to select.
        #[arg(short, long, default_value = "L2")]
        level: String,

        /// Release tag (defaults to the latest release).
        #[arg(short, long)]
        release: Option<String>,
    },

    /// Download one file, or every catalog entry matching the filters.
    Download {
        /// File name, as listed in the catalog.
        #[arg(short, long)]
        filename: Option<String>,

        /// Release tag (defaults to the latest release).
        #[arg(short, long)]
        release: Option<String>,

        /// Keep only entries of this level.
        #[arg(short, long)]
        level: Option<String>,

        /// Keep only entries observed at or after this date.
        #[arg(long)]
        after: Option<String>,

        /// Keep only entries observed at or before this date.
        #[arg(long)]
        before: Option<String>,

        /// Directory to download into.
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Do not recreate the level/yyyy/mm/dd archive tree.
        #[arg(long)]
        flat: bool,
    },

    /// Noise budget for a uniform level-2 signal.
    Noise {
        /// Path to a JSON dump of the file header.
        #[arg(long)]
        header: PathBuf,

        /// Signal value, W m⁻² sr⁻¹ nm⁻¹.
        #[arg(long)]
        value: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = Client::builder()
        .user_agent(concat!("heliospec/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let cache = FileCache::with_default_root();

    match cli.command {
        Commands::LatestRelease => {
            let release = Release::latest(&client)?;
            println!("{}", release.tag);
        }

        Commands::List {
            release,
            level,
            after,
            before,
            limit,
            update_cache,
        } => {
            let catalog = Catalog::from_release(&client, &cache, release.as_deref(), update_cache)?;
            let after = after.as_deref().map(parse_timestamp).transpose()?;
            let before = before.as_deref().map(parse_timestamp).transpose()?;
            let entries = catalog.select(|e| {
                level.as_deref().map_or(true, |l| e.level == l)
                    && after.map_or(true, |a| e.date_beg.is_some_and(|d| d >= a))
                    && before.map_or(true, |b| e.date_beg.is_some_and(|d| d <= b))
            });
            for entry in entries.iter().take(limit) {
                print_entry(entry);
            }
            eprintln!("{} of {} entries", entries.len().min(limit), entries.len());
        }

        Commands::FindFile {
            date,
            level,
            release,
        } => {
            let catalog = Catalog::from_release(&client, &cache, release.as_deref(), false)?;
            let date = parse_timestamp(&date)?;
            match catalog.find_file(date, &level) {
                Some(entry) => println!("{}", serde_json::to_string_pretty(entry)?),
                None => anyhow::bail!("no {level} file found near {date}"),
            }
        }

        Commands::Download {
            filename,
            release,
            level,
            after,
            before,
            dir,
            flat,
        } => {
            let tag = release.as_deref();
            let catalog = Catalog::from_release(&client, &cache, tag, false)?;
            let release = match tag {
                None | Some("latest") => Release::latest(&client)?,
                Some(tag) => Release::new(tag),
            };
            let source = FileSource::Release(release);
            if let Some(filename) = filename {
                let entry = catalog
                    .iter()
                    .find(|e| e.filename == filename)
                    .ok_or_else(|| anyhow::anyhow!("{filename} is not in the catalog"))?;
                let path = metadata::download_file(entry, &client, &dir, &source, !flat)?;
                println!("{}", path.display());
            } else {
                let after = after.as_deref().map(parse_timestamp).transpose()?;
                let before = before.as_deref().map(parse_timestamp).transpose()?;
                let entries = catalog.select(|e| {
                    level.as_deref().map_or(true, |l| e.level == l)
                        && after.map_or(true, |a| e.date_beg.is_some_and(|d| d >= a))
                        && before.map_or(true, |b| e.date_beg.is_some_and(|d| d <= b))
                });
                if entries.is_empty() {
                    anyhow::bail!("no catalog entries match the filters");
                }
                let mut downloader = Downloader::new(client.clone(), false);
                for entry in entries.iter().copied() {
                    metadata::enqueue_file(entry, &mut downloader, &dir, &source, !flat)?;
                }
                let outcome = downloader.download();
                for path in &outcome.done {
                    println!("{}", path.display());
                }
                if !outcome.is_success() {
                    anyhow::bail!(
                        "{} of {} downloads failed",
                        outcome.errors.len(),
                        entries.len()
                    );
                }
            }
        }

        Commands::Noise { header, value } => {
            let header = Header::from_json(&std::fs::read_to_string(header)?)?;
            let data = ndarray::arr1(&[value]).into_dyn();
            let estimate = noise_budget(&data, &header)?;
            println!("Noise contribution: {:.6e}", estimate.noise_contribution);
            println!("Sigma (W m⁻² sr⁻¹ nm⁻¹):");
            println!("  dark:       {:.6e}", estimate.sigma.dark);
            println!("  background: {:.6e}", estimate.sigma.background);
            println!("  read:       {:.6e}", estimate.sigma.read);
            println!("  signal:     {:.6e}", estimate.sigma.signal[[0]]);
            println!("  total:      {:.6e}", estimate.sigma.total[[0]]);
        }
    }

    Ok(())
}

fn print_entry(entry: &CatalogEntry) {
    let date = entry
        .date_beg
        .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("{}  {}  {}", date, entry.level, entry.filename);
}
