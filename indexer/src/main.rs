use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};
use wikidex_core::persist::{write_index, IndexPaths, IndexSummary};
use wikidex_core::{extract_fields, Normalizer, NormalizerConfig, PostingAccumulator};

mod dump;

use dump::{dump_files, DumpReader};

#[derive(Parser)]
#[command(name = "index")]
#[command(about = "Build the field-partitioned inverted index from a MediaWiki XML dump", long_about = None)]
struct Cli {
    /// Dump file, or a directory of *.xml dump files
    dump_path: PathBuf,
    /// Output index directory (created if absent, existing files overwritten)
    index_dir: PathBuf,
    /// Log progress every N documents (0 disables)
    #[arg(long, default_value_t = 10_000)]
    progress_every: u32,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = parse_args();
    build_index(&cli.dump_path, &cli.index_dir, cli.progress_every)?;
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

fn build_index(dump: &Path, output: &Path, progress_every: u32) -> Result<IndexSummary> {
    let start = Instant::now();
    let files = dump_files(dump)?;
    let normalizer = Normalizer::new(NormalizerConfig::default());
    let mut acc = PostingAccumulator::new();

    tracing::info!(files = files.len(), "starting dump parse");
    for file in &files {
        tracing::info!(file = %file.display(), "reading dump file");
        for page in DumpReader::open(file)? {
            let page = page?;
            let fields = extract_fields(page.title.as_deref(), page.text.as_deref());
            let doc_id = acc.add_document(&normalizer, &fields);
            if progress_every > 0 && doc_id % progress_every == 0 {
                tracing::info!(doc_id, "processed documents");
            }
        }
    }
    tracing::info!(
        num_docs = acc.num_docs(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "parsing complete"
    );

    let summary = write_index(&IndexPaths::new(output), &acc, normalizer.config())?;
    tracing::info!(
        output = %output.display(),
        num_docs = summary.num_docs,
        num_terms = summary.num_terms,
        elapsed_s = start.elapsed().as_secs_f64(),
        "index build complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikidex_core::persist::{load_pointer_catalog, load_title_catalog};
    use wikidex_core::Field;

    #[test]
    fn builds_index_from_dump_file() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump.xml");
        std::fs::write(
            &dump,
            "<mediawiki><page><title>Albert Einstein</title><revision><text>physicist \
             [[Category:Physics]]</text></revision></page><page><title>Isaac Newton</title>\
             <revision><text>physicist [[Category:Physics]]</text></revision></page></mediawiki>",
        )
        .unwrap();
        let out = dir.path().join("nested").join("index");

        let summary = build_index(&dump, &out, 1).unwrap();
        assert_eq!(summary.num_docs, 2);

        let paths = IndexPaths::new(&out);
        for field in Field::ALL {
            assert!(paths.field(field).is_file());
        }
        let titles = load_title_catalog(&paths).unwrap();
        assert_eq!(titles.get(1), Some("Isaac Newton"));
        let pointers = load_pointer_catalog(&paths).unwrap();
        assert!(pointers.offset("physic", Field::Category).is_some());
        assert!(pointers.offset("physicist", Field::Body).is_some());
        assert!(pointers.offset("physicist", Field::Infobox).is_none());
    }

    #[test]
    fn cli_takes_exactly_two_paths() {
        assert!(Cli::try_parse_from(["index", "dump.xml"]).is_err());
        assert!(Cli::try_parse_from(["index", "dump.xml", "out", "extra"]).is_err());
        let cli = Cli::try_parse_from(["index", "dump.xml", "out"]).unwrap();
        assert_eq!(cli.index_dir, PathBuf::from("out"));
        assert_eq!(cli.progress_every, 10_000);
    }

    #[test]
    fn argument_mismatch_exits_with_status_one() {
        let missing = Cli::try_parse_from(["index"]).err().unwrap();
        assert_eq!(arg_error_status(&missing), Some(1));
        let extra = Cli::try_parse_from(["index", "a.xml", "out", "more"]).err().unwrap();
        assert_eq!(arg_error_status(&extra), Some(1));
        let help = Cli::try_parse_from(["index", "-h"]).err().unwrap();
        assert_eq!(arg_error_status(&help), None);
    }
}
