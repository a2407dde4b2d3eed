use anyhow::{bail, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Title and raw wikitext of one `<page>`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub title: Option<String>,
    pub text: Option<String>,
}

#[derive(Clone, Copy)]
enum Capture {
    Title,
    Text,
}

/// Streams pages out of a MediaWiki XML export one at a time.
pub struct DumpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl DumpReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(inner: R) -> Self {
        Self { reader: Reader::from_reader(inner), buf: Vec::new(), done: false }
    }

    fn next_page(&mut self) -> Result<Option<RawPage>> {
        let mut page: Option<RawPage> = None;
        let mut capture: Option<Capture> = None;
        let mut text = String::new();

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"page" => page = Some(RawPage::default()),
                    b"title" if page.is_some() => {
                        capture = Some(Capture::Title);
                        text.clear();
                    }
                    b"text" if page.is_some() => {
                        capture = Some(Capture::Text);
                        text.clear();
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    if capture.is_some() {
                        text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if capture.is_some() {
                        text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"title" | b"text" => {
                        if let (Some(which), Some(p)) = (capture.take(), page.as_mut()) {
                            let value = std::mem::take(&mut text);
                            match which {
                                Capture::Title => p.title = Some(value),
                                Capture::Text => p.text = Some(value),
                            }
                        }
                    }
                    b"page" => {
                        if let Some(p) = page.take() {
                            return Ok(Some(p));
                        }
                    }
                    _ => {}
                },
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<RawPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// A dump path is either one XML file or a directory of them. Directory
/// entries come back in file-name order so doc ids are stable across runs.
pub fn dump_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("dump path {} does not exist", path.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        let p = entry.path();
        if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("xml") {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}
