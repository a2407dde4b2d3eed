use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::accumulate::PostingAccumulator;
use crate::config::NormalizerConfig;
use crate::error::{IndexError, Result};
use crate::index::{Field, PointerCatalog, Posting, TitleCatalog};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub num_docs: u32,
    pub num_terms: usize,
    /// Bytes written per field file, in `Field::ALL` order.
    pub field_bytes: [u64; 4],
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn field(&self, field: Field) -> PathBuf { self.root.join(field.file_name()) }
    pub fn pointers(&self) -> PathBuf { self.root.join("word_position.bin") }
    pub fn titles(&self) -> PathBuf { self.root.join("title_doc_no.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// Files a query session cannot run without, in the order they are checked.
    pub fn required(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Field::ALL.iter().map(|f| self.field(*f)).collect();
        files.push(self.pointers());
        files.push(self.titles());
        files
    }
}

/// Write one field file: one line per term in sorted order, recording the
/// byte offset of each line in `pointers`. Returns the bytes written.
pub fn write_field(
    path: &Path,
    field: Field,
    acc: &PostingAccumulator,
    pointers: &mut PointerCatalog,
) -> Result<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut offset: u64 = 0;
    for term in acc.sorted_terms(field) {
        let postings = acc.postings(term, field).unwrap_or_default();
        let mut line = postings
            .iter()
            .map(Posting::to_string)
            .collect::<Vec<_>>()
            .join(",");
        line.push('\n');

        pointers.record(term, field, offset);
        out.write_all(line.as_bytes())?;
        offset += line.len() as u64;
    }
    out.flush()?;
    Ok(offset)
}

/// Persist the whole accumulated index under `paths.root`, overwriting any
/// previous index there.
pub fn write_index(
    paths: &IndexPaths,
    acc: &PostingAccumulator,
    normalizer: &NormalizerConfig,
) -> Result<IndexSummary> {
    create_dir_all(&paths.root)?;

    let mut pointers = PointerCatalog::new();
    let mut field_bytes = [0u64; 4];
    for field in Field::ALL {
        field_bytes[field.index()] = write_field(&paths.field(field), field, acc, &mut pointers)?;
        tracing::info!(
            field = %field,
            terms = acc.distinct_terms(field),
            bytes = field_bytes[field.index()],
            "wrote field file"
        );
    }

    save_pointer_catalog(paths, &pointers)?;
    save_title_catalog(paths, acc.titles())?;
    let meta = MetaFile {
        num_docs: acc.num_docs(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
        normalizer: normalizer.clone(),
    };
    save_meta(paths, &meta)?;

    Ok(IndexSummary { num_docs: acc.num_docs(), num_terms: pointers.len(), field_bytes })
}

fn open_existing(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IndexError::MissingFile { path: path.to_path_buf() },
        _ => IndexError::Io(e),
    })
}

fn read_all(path: &Path) -> Result<Vec<u8>> {
    let mut f = open_existing(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_pointer_catalog(paths: &IndexPaths, pointers: &PointerCatalog) -> Result<()> {
    let mut f = File::create(paths.pointers())?;
    let bytes = bincode::serialize(pointers)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_pointer_catalog(paths: &IndexPaths) -> Result<PointerCatalog> {
    let buf = read_all(&paths.pointers())?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_title_catalog(paths: &IndexPaths, titles: &TitleCatalog) -> Result<()> {
    let mut f = File::create(paths.titles())?;
    let bytes = bincode::serialize(titles)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_title_catalog(paths: &IndexPaths) -> Result<TitleCatalog> {
    let buf = read_all(&paths.titles())?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let buf = read_all(&paths.meta())?;
    Ok(serde_json::from_slice(&buf)?)
}

/// Owned seekable handle on one field file.
pub struct PostingReader {
    field: Field,
    reader: BufReader<File>,
    line: Vec<u8>,
}

impl PostingReader {
    pub fn open(paths: &IndexPaths, field: Field) -> Result<Self> {
        let file = open_existing(&paths.field(field))?;
        Ok(Self { field, reader: BufReader::new(file), line: Vec::new() })
    }

    /// Seek to `offset` and parse the single posting line that starts there.
    pub fn read_at(&mut self, offset: u64) -> Result<Vec<Posting>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.line.clear();
        let read = self.reader.read_until(b'\n', &mut self.line)?;
        if read == 0 {
            return Err(self.corrupt(offset, "offset past end of file".into()));
        }
        let line = std::str::from_utf8(&self.line)
            .map_err(|e| self.corrupt(offset, format!("invalid UTF-8: {e}")))?
            .trim_end_matches(|c: char| c == '\n' || c == '\r');
        if line.is_empty() {
            return Err(self.corrupt(offset, "empty posting line".into()));
        }
        line.split(',')
            .map(|p| p.parse::<Posting>().map_err(|reason| self.corrupt(offset, reason)))
            .collect()
    }

    fn corrupt(&self, offset: u64, reason: String) -> IndexError {
        IndexError::CorruptPosting { field: self.field, offset, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DocumentFields;
    use crate::normalizer::Normalizer;

    fn doc(title: &str, body: &str) -> DocumentFields {
        DocumentFields { title: title.into(), body: body.into(), ..Default::default() }
    }

    #[test]
    fn offsets_point_at_line_starts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let n = Normalizer::default();
        let mut acc = PostingAccumulator::new();
        acc.add_document(&n, &doc("", "zebra apple mango"));
        acc.add_document(&n, &doc("", "apple apple"));

        let mut pointers = PointerCatalog::new();
        let bytes = write_field(&paths.field(Field::Body), Field::Body, &acc, &mut pointers).unwrap();

        let text = std::fs::read_to_string(paths.field(Field::Body)).unwrap();
        assert_eq!(text, "0:1,1:2\n0:1\n0:1\n");
        assert_eq!(bytes, text.len() as u64);
        assert_eq!(pointers.offset("appl", Field::Body), Some(0));
        assert_eq!(pointers.offset("mango", Field::Body), Some(8));
        assert_eq!(pointers.offset("zebra", Field::Body), Some(12));
    }

    #[test]
    fn reader_rejects_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        std::fs::write(paths.field(Field::Title), "0:1,2:3\nbroken\n").unwrap();

        let mut reader = PostingReader::open(&paths, Field::Title).unwrap();
        assert_eq!(
            reader.read_at(0).unwrap(),
            vec![Posting { doc_id: 0, frequency: 1 }, Posting { doc_id: 2, frequency: 3 }]
        );
        assert!(matches!(reader.read_at(8), Err(IndexError::CorruptPosting { offset: 8, .. })));
        assert!(matches!(reader.read_at(500), Err(IndexError::CorruptPosting { .. })));
    }

    #[test]
    fn reader_reports_invalid_utf8_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        std::fs::write(paths.field(Field::Body), b"0:1,\xff\xfe:2\n").unwrap();

        let mut reader = PostingReader::open(&paths, Field::Body).unwrap();
        assert!(matches!(
            reader.read_at(0),
            Err(IndexError::CorruptPosting { field: Field::Body, offset: 0, .. })
        ));
    }

    #[test]
    fn meta_is_written_into_the_index_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("index"));
        let n = Normalizer::default();
        let mut acc = PostingAccumulator::new();
        acc.add_document(&n, &doc("Solo", "lonely page"));
        let summary = write_index(&paths, &acc, n.config()).unwrap();

        let meta = load_meta(&paths).unwrap();
        assert_eq!(meta.num_docs, summary.num_docs);
        assert_eq!(meta.version, FORMAT_VERSION);
        for file in paths.required() {
            assert!(file.is_file(), "{}", file.display());
        }
    }

    #[test]
    fn missing_files_are_reported_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let err = load_title_catalog(&paths).err().unwrap();
        assert_eq!(err.missing_file(), Some(paths.titles().as_path()));
        let err = PostingReader::open(&paths, Field::Infobox).err().unwrap();
        assert_eq!(err.missing_file(), Some(paths.field(Field::Infobox).as_path()));
    }
}
