use crate::HashMap;
use crate::HashSet;
use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};

/// Closed stopword list. Entries are already stemmed, which is why Snowball
/// artifacts like `becaus`, `veri`, `onli` appear alongside plain words.
#[rustfmt::skip]
const STOPWORD_LIST: &[&str] = &[
    "a", "about", "abov", "after", "again", "against", "ain", "all", "am",
    "an", "and", "ani", "are", "aren", "arent", "as", "at", "be", "becaus",
    "been", "befor", "below", "between", "both", "but", "by", "can", "couldn",
    "couldnt", "d", "did", "didn", "didnt", "do", "doe", "doesn", "doesnt",
    "don", "dont", "down", "dure", "each", "few", "for", "from", "further",
    "had", "hadn", "hadnt", "has", "hasn", "hasnt", "have", "haven", "havent",
    "he", "her", "here", "herself", "him", "himself", "his", "how", "i", "if",
    "in", "into", "is", "isn", "isnt", "it", "itself", "just", "ll", "m",
    "ma", "me", "mightn", "mightnt", "more", "most", "mustn", "mustnt", "my",
    "myself", "needn", "neednt", "no", "nor", "not", "now", "o", "of", "off",
    "on", "onc", "onli", "or", "other", "our", "ourselv", "out", "over",
    "own", "re", "s", "same", "shan", "shant", "she", "shes", "should",
    "shouldn", "shouldnt", "shouldv", "so", "some", "such", "t", "than",
    "that", "thatll", "the", "their", "them", "themselv", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "ve", "veri", "was", "wasn", "wasnt", "we", "were",
    "weren", "werent", "what", "when", "where", "which", "while", "whi",
    "who", "whom", "will", "with", "won", "wont", "wouldn", "wouldnt", "y",
    "you", "youd", "youll", "your", "yourself", "yourselv", "youv",
];

static STOPWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORD_LIST.iter().copied().collect());

/// HTML entities that survive XML unescaping inside wikitext.
const ENTITIES: &[&str] = &["&nbsp;", "&lt;", "&gt;", "&amp;", "&quot;", "&apos;"];

/// Byte-indexed split table: control/whitespace bytes plus the wikitext
/// punctuation set all end the current token.
static SPLIT_BYTES: Lazy<[bool; 256]> = Lazy::new(|| {
    fn is_punct_byte(b: u8) -> bool {
        match b {
            b'%' | b'$' | b'\'' | b'~' | b'|' | b'.' | b'*' | b'[' | b']' | b':' | b';'
            | b',' | b'{' | b'}' | b'(' | b')' | b'=' | b'+' | b'-' | b'_' | b'#' | b'!'
            | b'`' | b'"' | b'?' | b'/' | b'>' | b'<' | b'&' | b'\\' => true,
            _ => false,
        }
    }
    let mut table = [false; 256];
    for b in 0u8..=255 {
        table[b as usize] = b <= 32 || is_punct_byte(b);
    }
    table
});

/// Tokens longer than this are noise (URLs, smashed-together markup).
const MAX_TERM_LEN: usize = 15;
const MIN_TERM_LEN: usize = 3;
const MAX_NUMERIC_LEN: usize = 7;

/// A stemmed token is kept iff it is alphabetic, not a stopword, and of a
/// useful length, or it is a short run of digits (years, ids).
pub fn keep(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let bytes = token.as_bytes();
    if bytes.iter().all(|b| b.is_ascii_alphabetic()) {
        return token.len() > MIN_TERM_LEN
            && token.len() < MAX_TERM_LEN
            && !STOPWORDS.contains(token)
    }
    bytes.iter().all(|b| b.is_ascii_digit()) && token.len() <= MAX_NUMERIC_LEN
}

/// Text-to-terms pipeline shared by the indexer and the searcher. Owns the
/// Snowball stemmer and a memo of stemmed words; stemming dominates the
/// ingest profile without it.
pub struct Tokenizer {
    stemmer: Stemmer,
    stem_cache: HashMap<String, String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new()
    }
}

impl Tokenizer {
    pub fn new() -> Tokenizer {
        Tokenizer {
            stemmer: Stemmer::create(Algorithm::English),
            stem_cache: HashMap::default(),
        }
    }

    fn stem(&mut self, word: &str) -> String {
        if let Some(hit) = self.stem_cache.get(word) {
            return hit.clone();
        }
        let stemmed = self.stemmer.stem(word).to_string();
        self.stem_cache.insert(word.to_string(), stemmed.clone());
        stemmed
    }

    /// Case-fold, reduce to ASCII, split on the punctuation table, stem,
    /// and filter. Deterministic and order-preserving.
    pub fn tokenize(&mut self, text: &str) -> Vec<String> {
        let mut lower = text.to_lowercase();
        for entity in ENTITIES {
            if lower.contains(entity) {
                lower = lower.replace(entity, " ");
            }
        }

        let mut terms = Vec::new();
        let mut word = String::new();
        for &byte in lower.as_bytes() {
            if byte > 127 {
                // ASCII reduction: drop the byte entirely.
                continue;
            }
            if SPLIT_BYTES[byte as usize] {
                if !word.is_empty() {
                    let stemmed = self.stem(&word);
                    if keep(&stemmed) {
                        terms.push(stemmed);
                    }
                    word.clear();
                }
            } else {
                word.push(byte as char);
            }
        }
        if !word.is_empty() {
            let stemmed = self.stem(&word);
            if keep(&stemmed) {
                terms.push(stemmed);
            }
        }
        terms
    }
}
