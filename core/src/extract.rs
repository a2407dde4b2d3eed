//! Default MediaWiki field extractor: splits a page into the four indexed
//! text zones before normalization.

use lazy_static::lazy_static;
use regex::Regex;

use crate::index::Field;

lazy_static! {
    static ref CATEGORY: Regex = Regex::new(r"(?s)\[\[Category:(.*?)\]\]").expect("valid regex");
    static ref INFOBOX: Regex = Regex::new(r"(?s)\{\{Infobox(.*?)\}\}").expect("valid regex");
    static ref TABLE: Regex = Regex::new(r"(?s)\{\|(.*?)\|\}").expect("valid regex");
    static ref LINK: Regex = Regex::new(
        r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+"
    )
    .expect("valid regex");
}

/// The separated text of one document, plus its original title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFields {
    pub title: String,
    pub category: String,
    pub infobox: String,
    pub body: String,
}

impl DocumentFields {
    /// Text that gets normalized for `field`. For the title this is the
    /// original title string.
    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Category => &self.category,
            Field::Infobox => &self.infobox,
            Field::Body => &self.body,
        }
    }
}

pub fn extract_fields(title: Option<&str>, text: Option<&str>) -> DocumentFields {
    let title = title.unwrap_or_default().to_string();
    let text = match text {
        Some(text) if !text.is_empty() => text,
        _ => return DocumentFields { title, ..Default::default() },
    };

    let category = join_captures(&CATEGORY, text);
    let infobox = join_captures(&INFOBOX, text);
    let without_links = LINK.replace_all(text, "");
    let body = TABLE.replace_all(&without_links, "").into_owned();

    DocumentFields { title, category, infobox, body }
}

fn join_captures(re: &Regex, text: &str) -> String {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
