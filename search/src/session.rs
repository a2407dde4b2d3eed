use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use wikidex_core::persist::{load_meta, load_pointer_catalog, load_title_catalog, IndexPaths, PostingReader};
use wikidex_core::{
    DocId, Field, IndexError, Normalizer, NormalizerConfig, PointerCatalog, Result, SearchConfig, TitleCatalog,
};

use crate::query::{Query, QueryLine};

/// An open index: one seekable handle per field file plus both catalogs.
/// Handles are released when the session is dropped.
pub struct SearchSession {
    readers: [PostingReader; 4],
    pointers: PointerCatalog,
    titles: TitleCatalog,
    normalizer: Normalizer,
    config: SearchConfig,
}

impl SearchSession {
    pub fn open<P: AsRef<Path>>(index_dir: P, config: SearchConfig) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);
        for file in paths.required() {
            if !file.is_file() {
                return Err(IndexError::MissingFile { path: file });
            }
        }
        let readers = [
            PostingReader::open(&paths, Field::Title)?,
            PostingReader::open(&paths, Field::Category)?,
            PostingReader::open(&paths, Field::Infobox)?,
            PostingReader::open(&paths, Field::Body)?,
        ];
        let pointers = load_pointer_catalog(&paths)?;
        let titles = load_title_catalog(&paths)?;

        let normalizer_config = match load_meta(&paths) {
            Ok(meta) => meta.normalizer,
            Err(IndexError::MissingFile { path }) => {
                tracing::warn!(file = %path.display(), "no index metadata, using default normalizer");
                NormalizerConfig::default()
            }
            Err(e) => return Err(e),
        };

        tracing::info!(terms = pointers.len(), docs = titles.len(), "index files loaded");
        Ok(Self { readers, pointers, titles, normalizer: Normalizer::new(normalizer_config), config })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Doc ids whose `field` posting list contains `term`.
    pub fn docs_for(&mut self, term: &str, field: Field) -> Result<BTreeSet<DocId>> {
        let Some(offset) = self.pointers.offset(term, field) else {
            return Ok(BTreeSet::new());
        };
        let postings = self.readers[field.index()].read_at(offset)?;
        Ok(postings.into_iter().map(|p| p.doc_id).collect())
    }

    /// Evaluate one query line. Returns `None` for the `quit` sentinel.
    pub fn run(&mut self, line: &str) -> Result<Option<Vec<String>>> {
        let query = match QueryLine::parse(line, &self.normalizer) {
            QueryLine::Quit => return Ok(None),
            QueryLine::Search(query) => query,
        };
        let start = Instant::now();
        let docs = self.evaluate(&query)?;
        let mut titles = self.resolve_titles(&docs);
        let total_hits = titles.len();
        titles.truncate(self.config.max_results);

        tracing::info!(
            query = line.trim(),
            total_hits,
            elapsed_s = start.elapsed().as_secs_f64(),
            "query evaluated"
        );
        Ok(Some(titles))
    }

    /// Run queries in order until the input ends or `quit` is reached.
    pub fn run_batch<I, S>(&mut self, queries: I) -> Result<Vec<Vec<String>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();
        for line in queries {
            match self.run(line.as_ref())? {
                Some(titles) => results.push(titles),
                None => break,
            }
        }
        Ok(results)
    }

    fn evaluate(&mut self, query: &Query) -> Result<BTreeSet<DocId>> {
        query.evaluate(|term, field| self.docs_for(term, field))
    }

    fn resolve_titles(&self, docs: &BTreeSet<DocId>) -> Vec<String> {
        let mut titles = Vec::with_capacity(docs.len());
        for doc_id in docs {
            match self.titles.get(*doc_id) {
                Some(title) => titles.push(title.to_string()),
                None => tracing::debug!(doc_id, "doc id missing from title catalog"),
            }
        }
        titles
    }
}

/// Open the index and run the batch. A missing index file is reported and
/// yields an empty result set instead of an error.
pub fn search_batch<P, I, S>(index_dir: P, queries: I, config: SearchConfig) -> Result<Vec<Vec<String>>>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut session = match SearchSession::open(&index_dir, config) {
        Ok(session) => session,
        Err(IndexError::MissingFile { path }) => {
            tracing::error!(
                index = %index_dir.as_ref().display(),
                missing = %path.display(),
                "could not load index files, run the indexer first"
            );
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };
    session.run_batch(queries)
}

pub fn read_queries<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut queries = Vec::new();
    for line in reader.lines() {
        queries.push(line?);
    }
    Ok(queries)
}

/// Write `results` unless no query produced an entry (missing index, or
/// `quit` on the first line). Returns whether the file was written.
pub fn write_results_if_any<P: AsRef<Path>>(path: P, results: &[Vec<String>]) -> Result<bool> {
    if results.is_empty() {
        return Ok(false);
    }
    write_results(path, results)?;
    Ok(true)
}

/// One title per line, and a blank line after each query's titles.
pub fn write_results<P: AsRef<Path>>(path: P, results: &[Vec<String>]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for titles in results {
        for title in titles {
            writeln!(out, "{}", title.trim())?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
