use std::collections::HashMap;

use crate::extract::DocumentFields;
use crate::index::{DocId, Field, Posting, TitleCatalog};
use crate::normalizer::Normalizer;

/// Postings of one field, keyed by term. Each list is in ascending doc id
/// order because documents are appended in arrival order.
pub type FieldPostings = HashMap<String, Vec<Posting>>;

/// In-memory accumulation of all four field indexes plus the title catalog.
#[derive(Default)]
pub struct PostingAccumulator {
    fields: [FieldPostings; 4],
    titles: TitleCatalog,
    next_doc_id: DocId,
}

impl PostingAccumulator {
    pub fn new() -> Self { Self::default() }

    /// Assign the next doc id to `doc` and append its postings.
    pub fn add_document(&mut self, normalizer: &Normalizer, doc: &DocumentFields) -> DocId {
        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;
        self.titles.insert(doc_id, doc.title.clone());

        for field in Field::ALL {
            let text = doc.text(field);
            if text.is_empty() {
                continue;
            }
            for (term, frequency) in normalizer.term_frequencies(text) {
                self.fields[field.index()]
                    .entry(term)
                    .or_default()
                    .push(Posting { doc_id, frequency });
            }
        }
        doc_id
    }

    pub fn field(&self, field: Field) -> &FieldPostings {
        &self.fields[field.index()]
    }

    pub fn postings(&self, term: &str, field: Field) -> Option<&[Posting]> {
        self.field(field).get(term).map(Vec::as_slice)
    }

    /// Terms of `field` in ascending byte order, the order lines are written in.
    pub fn sorted_terms(&self, field: Field) -> Vec<&str> {
        let mut terms: Vec<&str> = self.field(field).keys().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }

    pub fn distinct_terms(&self, field: Field) -> usize {
        self.field(field).len()
    }

    pub fn titles(&self) -> &TitleCatalog {
        &self.titles
    }

    pub fn num_docs(&self) -> u32 {
        self.next_doc_id
    }
}
