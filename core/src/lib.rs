pub mod accumulate;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod normalizer;
pub mod persist;

pub use accumulate::PostingAccumulator;
pub use config::{NormalizerConfig, SearchConfig};
pub use error::{IndexError, Result};
pub use extract::{extract_fields, DocumentFields};
pub use index::{DocId, Field, PointerCatalog, Posting, TitleCatalog};
pub use normalizer::Normalizer;
