use byline::build::build_site;
use byline::config::Config;
use byline::pool;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::time::Instant;

/// Builds the static site for the blog rooted at PATH.
#[derive(Parser)]
#[command(name = "byline", version, about)]
struct Cli {
    /// The project root: the directory holding the `markdown/` source tree,
    /// the template, and the output `public/` directory.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// A fixed worker count. Defaults to one worker per CPU, capped at the
    /// number of source files.
    #[arg(short, long)]
    workers: Option<usize>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let start = Instant::now();
    info!("Building site in '{}'", cli.path.display());
    if let Err(err) = run(&cli) {
        error!("Can't build site: {}", err);
        std::process::exit(1);
    }
    info!("Done in {:.2?}", start.elapsed());
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::from_directory(&cli.path)?;
    if cli.workers.is_some() {
        config.workers = cli.workers;
    }
    match config.workers {
        Some(fixed) => build_site(&config, |_| fixed)?,
        None => build_site(&config, pool::default_workers)?,
    }
    Ok(())
}
