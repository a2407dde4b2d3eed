use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizerConfig;

lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[^a-z0-9]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "i","me","my","myself","we","our","ours","ourselves","you","you're","you've","you'll","you'd",
            "your","yours","yourself","yourselves","he","him","his","himself","she","she's","her","hers",
            "herself","it","it's","its","itself","they","them","their","theirs","themselves",
            "what","which","who","whom","this","that","that'll","these","those",
            "am","is","are","was","were","be","been","being","have","has","had","having","do","does","did","doing",
            "a","an","the","and","but","if","or","because","as","until","while","of","at","by","for","with",
            "about","against","between","into","through","during","before","after","above","below","to","from",
            "up","down","in","out","on","off","over","under","again","further","then","once",
            "here","there","when","where","why","how","all","any","both","each","few","more","most","other",
            "some","such","no","nor","not","only","own","same","so","than","too","very",
            "s","t","can","will","just","don","don't","should","should've","now","d","ll","m","o","re","ve","y",
            "ain","aren","aren't","couldn","couldn't","didn","didn't","doesn","doesn't","hadn","hadn't",
            "hasn","hasn't","haven","haven't","isn","isn't","ma","mightn","mightn't","mustn","mustn't",
            "needn","needn't","shan","shan't","shouldn","shouldn't","wasn","wasn't","weren","weren't",
            "won","won't","wouldn","wouldn't"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Text -> term sequence. The indexer and the query side must use a
/// normalizer built from the same [`NormalizerConfig`].
pub struct Normalizer {
    config: NormalizerConfig,
    stemmer: Option<Stemmer>,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let stemmer = config.stem.then(|| Stemmer::create(Algorithm::English));
        Self { config, stemmer }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Lowercase, split on anything outside `[a-z0-9]`, drop short tokens and
    /// stop words, then stem.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let folded: Cow<'_, str> = if self.config.nfkc {
            Cow::Owned(text.nfkc().collect())
        } else {
            Cow::Borrowed(text)
        };
        let lowered = folded.to_lowercase();

        let mut terms = Vec::new();
        for token in SEPARATORS.split(&lowered) {
            if token.len() < self.config.min_token_len {
                continue;
            }
            if self.config.remove_stopwords && is_stopword(token) {
                continue;
            }
            let term = match &self.stemmer {
                Some(stemmer) => stemmer.stem(token).into_owned(),
                None => token.to_string(),
            };
            terms.push(term);
        }
        terms
    }

    pub fn term_frequencies(&self, text: &str) -> HashMap<String, u32> {
        let mut freq = HashMap::new();
        for term in self.normalize(text) {
            *freq.entry(term).or_insert(0) += 1;
        }
        freq
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}
