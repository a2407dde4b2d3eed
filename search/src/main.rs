use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use wikidex_core::SearchConfig;
use wikidex_search::{read_queries, search_batch, write_results_if_any};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Run boolean field queries against a built index", long_about = None)]
struct Cli {
    /// Index directory written by `index`
    index_dir: PathBuf,
    /// Query file, one query per line
    query_file: PathBuf,
    /// Output file for the matching titles
    output_file: PathBuf,
    /// Maximum titles written per query
    #[arg(long, default_value_t = 10)]
    max_results: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = parse_args();

    let queries = read_queries(&cli.query_file)?;
    let config = SearchConfig { max_results: cli.max_results };
    let results = search_batch(&cli.index_dir, &queries, config)?;
    if write_results_if_any(&cli.output_file, &results)? {
        tracing::info!(output = %cli.output_file.display(), queries = results.len(), "results written");
    } else {
        tracing::info!("no query results, output not written");
    }
    Ok(())
}

fn parse_args() -> Cli {
    Cli::try_parse().unwrap_or_else(|err| match arg_error_status(&err) {
        Some(status) => {
            let _ = err.print();
            std::process::exit(status);
        }
        None => err.exit(),
    })
}

/// Argument errors exit with status 1; `None` for help and version, which
/// clap prints and exits on normally.
fn arg_error_status(err: &clap::Error) -> Option<i32> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        _ => Some(1),
    }
}
