//! # relfetch CLI
//!
//! Lists the assets of a GitHub release in an interactive table and downloads
//! the selected one.

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use log::{error, info, LevelFilter};

use relfetch::config::{DEFAULT_API_URL, DEFAULT_REPO, LATEST_TAG};
use relfetch::progress::{create_progress_bar, progress_bar_fn};
use relfetch::table::{AssetTable, COLUMNS};
use relfetch::tui::{self, Outcome};
use relfetch::{
    Config, DownloadErrorPolicy, Downloader, Error, ReleaseFetcher, ReleaseRecord, Result,
    Session,
};

/// Command-line interface for relfetch
#[derive(Parser, Debug)]
#[command(name = "relfetch", version)]
#[command(about = "Browse and download the assets of a GitHub release")]
#[command(long_about = "Browse and download the assets of a GitHub release:
  relfetch                              # latest kubernetes-sigs/cluster-api release
  relfetch -R cli/cli -t v2.40.0        # a specific tag
  relfetch -R cli/cli --list            # print the asset table and exit
  relfetch -R cli/cli --asset gh.zip    # download one asset without the table

Keys: up/k down/j move, g/G first/last, esc toggles focus,
enter prints a curl command, d downloads, q quits.")]
struct Cli {
    /// GitHub repository name
    #[arg(short = 'R', long, default_value = DEFAULT_REPO)]
    repo: String,

    /// GitHub release tag, or "latest"
    #[arg(short, long, default_value = LATEST_TAG)]
    tag: String,

    /// GitHub API root
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// API token (defaults to GITHUB_TOKEN or GH_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Directory downloads are written into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Exit when a background download fails instead of showing the error
    #[arg(long)]
    exit_on_download_error: bool,

    /// Print the asset table and exit
    #[arg(long, conflicts_with = "asset")]
    list: bool,

    /// Download the named asset with a progress bar and exit
    #[arg(long)]
    asset: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn is_interactive(&self) -> bool {
        !self.list && self.asset.is_none()
    }

    fn config(&self) -> Config {
        let mut config = Config::new()
            .repo(&self.repo)
            .tag(&self.tag)
            .set_api_url(&self.api_url)
            .set_output_dir(&self.output_dir);
        if let Some(token) = &self.token {
            config = config.set_token(token);
        }
        if self.exit_on_download_error {
            config = config.on_download_error(DownloadErrorPolicy::Exit);
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("warning: cannot open log file: {e}");
    }

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            1
        }
    };
    std::process::exit(code);
}

/// The interactive table owns the screen, so it only logs when a file is
/// given. `RUST_LOG` overrides the level everywhere else.
fn init_logging(cli: &Cli) -> std::io::Result<()> {
    let mut builder = env_logger::Builder::new();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .filter_level(level)
                .parse_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        None if cli.is_interactive() => {
            builder.filter_level(LevelFilter::Off);
        }
        None => {
            builder
                .filter_level(level)
                .parse_default_env()
                .target(env_logger::Target::Stderr);
        }
    }
    builder.try_init().ok();
    Ok(())
}

fn run(cli: &Cli) -> Result<i32> {
    let config = cli.config();
    let runtime = tokio::runtime::Runtime::new()?;

    info!("fetching {} release of {}", config.tag, config.repo);
    let fetcher = ReleaseFetcher::new(&config)?;
    let release = runtime.block_on(fetcher.fetch(&config.repo, &config.tag))?;
    let downloader = Downloader::new(&config)?;

    if cli.list {
        print_assets(&release);
        return Ok(0);
    }

    if let Some(name) = &cli.asset {
        runtime.block_on(download_named(&downloader, &release, name))?;
        return Ok(0);
    }

    let session = Session::new(release, config.on_download_error);
    let outcome = tui::run(session, downloader, runtime.handle())?;

    // In-flight downloads are abandoned, not awaited.
    runtime.shutdown_background();
    match outcome {
        Outcome::Quit => Ok(0),
        Outcome::Failed(message) => {
            error!("{message}");
            eprintln!("error: {message}");
            Ok(1)
        }
    }
}

fn print_assets(release: &ReleaseRecord) {
    let [(name_title, name_width), (size_title, _)] = COLUMNS;
    let name_width = name_width as usize;

    println!("{} ({})", release.display_title(), release.tag_name);
    println!("{name_title:<name_width$} {size_title}");
    for row in AssetTable::build(release).rows() {
        println!("{:<name_width$} {}", row.name, row.size);
    }
}

async fn download_named(downloader: &Downloader, release: &ReleaseRecord, name: &str) -> Result<()> {
    let asset = release.asset(name).ok_or_else(|| {
        Error::NotFound(format!("asset {name} in release {}", release.tag_name))
    })?;

    let pb = create_progress_bar(name);
    match downloader
        .download(&asset.download_url, Some(progress_bar_fn(pb.clone())))
        .await
    {
        Ok(outcome) => {
            pb.finish();
            eprintln!("saved {}", outcome.path.display());
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(e)
        }
    }
}
