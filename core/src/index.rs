use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type DocId = u32;

/// One of the four independently indexed text zones of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "t")]
    Title,
    #[serde(rename = "c")]
    Category,
    #[serde(rename = "i")]
    Infobox,
    #[serde(rename = "b")]
    Body,
}

impl Field {
    /// Canonical order; field files are written in this order.
    pub const ALL: [Field; 4] = [Field::Title, Field::Category, Field::Infobox, Field::Body];

    pub fn tag(self) -> char {
        match self {
            Field::Title => 't',
            Field::Category => 'c',
            Field::Infobox => 'i',
            Field::Body => 'b',
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Field::Title => "title.txt",
            Field::Category => "category.txt",
            Field::Infobox => "infobox.txt",
            Field::Body => "body_text.txt",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a query prefix such as `title` or `ref` to its field.
    pub fn from_alias(alias: &str) -> Option<Field> {
        match alias {
            "title" => Some(Field::Title),
            "category" => Some(Field::Category),
            "infobox" => Some(Field::Infobox),
            "body" | "ref" | "ext" => Some(Field::Body),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.doc_id, self.frequency)
    }
}

impl FromStr for Posting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (doc, freq) = s
            .split_once(':')
            .ok_or_else(|| format!("posting `{s}` has no `:` separator"))?;
        let doc_id = doc.parse().map_err(|_| format!("bad doc id in posting `{s}`"))?;
        let frequency = freq.parse().map_err(|_| format!("bad frequency in posting `{s}`"))?;
        Ok(Posting { doc_id, frequency })
    }
}

/// term -> field -> byte offset of the term's line in that field's file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointerCatalog {
    entries: BTreeMap<String, BTreeMap<Field, u64>>,
}

impl PointerCatalog {
    pub fn new() -> Self { Self::default() }

    pub fn record(&mut self, term: &str, field: Field, offset: u64) {
        self.entries.entry(term.to_string()).or_default().insert(field, offset);
    }

    pub fn offset(&self, term: &str, field: Field) -> Option<u64> {
        self.entries.get(term).and_then(|fields| fields.get(&field)).copied()
    }

    pub fn fields(&self, term: &str) -> impl Iterator<Item = (Field, u64)> + '_ {
        self.entries
            .get(term)
            .into_iter()
            .flat_map(|fields| fields.iter().map(|(f, o)| (*f, *o)))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// docId -> original (non-normalized) document title.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleCatalog {
    titles: BTreeMap<DocId, String>,
}

impl TitleCatalog {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, doc_id: DocId, title: String) {
        self.titles.insert(doc_id, title);
    }

    pub fn get(&self, doc_id: DocId) -> Option<&str> {
        self.titles.get(&doc_id).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.titles.len() }

    pub fn is_empty(&self) -> bool { self.titles.is_empty() }
}
