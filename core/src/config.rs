use serde::{Deserialize, Serialize};

/// Normalizer settings. Persisted in `meta.json` so the query side builds the
/// exact normalizer the index was written with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Apply NFKC compatibility folding before lowercasing.
    pub nfkc: bool,
    /// Tokens shorter than this are dropped.
    pub min_token_len: usize,
    pub remove_stopwords: bool,
    pub stem: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            nfkc: true,
            min_token_len: 3,
            remove_stopwords: true,
            stem: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 10 }
    }
}
