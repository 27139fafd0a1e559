use super::Searcher;
use crate::encoding;
use crate::heap_collection::ResultHeap;
use crate::HashMap;
use crate::{Error, Field};
use once_cell::sync::Lazy;
use regex::Regex;

pub const NUM_RESULTS_PER_QUERY: usize = 10;

/// Per-field weights, in `t,b,i,c,l,r` order. Title, infobox, and
/// categories dominate in both tables; body counts for more in a generic
/// query, while references/external links only matter when the user names
/// them explicitly.
const WEIGHTS_FIELD_QUERY: [f32; 6] = [2500.0, 50.0, 2100.0, 2000.0, 1500.0, 1500.0];
const WEIGHTS_GENERIC_QUERY: [f32; 6] = [2500.0, 300.0, 2100.0, 2000.0, 10.0, 25.0];

/// Result titles in these namespaces are navigation noise.
const SKIPPED_RESULT_PREFIXES: &[&str] = &["Help:", "Module:"];

static QUERY_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[tbicrl]:").unwrap());
static FIELD_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)([tbicrl]):").unwrap());

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub enc_id: String,
    pub title: String,
    pub score: f32,
}

/// Split `t:apple pie b:crust` into `[(Title, "apple pie"), (Body, "crust")]`.
/// Each field's text runs up to the next marker or the end of the query.
fn split_field_query(query: &str) -> Vec<(Field, String)> {
    let mut markers: Vec<(Field, usize, usize)> = Vec::new();
    for cap in FIELD_MARKER.captures_iter(query) {
        let (tag, whole) = match (cap.get(1), cap.get(0)) {
            (Some(tag), Some(whole)) => (tag, whole),
            _ => continue,
        };
        let field = match tag.as_str().chars().next().and_then(Field::from_tag) {
            Some(field) => field,
            None => continue,
        };
        // Text begins after the `:`; the previous segment stops where
        // this marker (including its leading whitespace) starts.
        markers.push((field, tag.end() + 1, whole.start()));
    }

    let mut out = Vec::new();
    for (i, (field, text_start, _)) in markers.iter().enumerate() {
        let end = markers
            .get(i + 1)
            .map(|(_, _, next_start)| *next_start)
            .unwrap_or_else(|| query.len());
        out.push((*field, query[*text_start..end].trim().to_string()));
    }
    out
}

impl Searcher {
    /// Rank documents for one query and resolve the winners' titles.
    /// Generic queries score every field; `FIELD:` queries score only the
    /// fields named.
    pub fn search(&mut self, query: &str) -> Result<Vec<SearchResult>, Error> {
        let query = query.to_lowercase();
        let mut scores: HashMap<String, f32> = HashMap::default();

        if QUERY_PREFIX.is_match(&query) {
            for (field, text) in split_field_query(&query) {
                let terms = self.tokenize_query(&text);
                for term in terms {
                    self.score_term(field, &term, WEIGHTS_FIELD_QUERY[field.index()], &mut scores)?;
                }
            }
        } else {
            let terms = self.tokenize_query(&query);
            for field in Field::ALL.iter() {
                for term in terms.iter() {
                    self.score_term(
                        *field,
                        term,
                        WEIGHTS_GENERIC_QUERY[field.index()],
                        &mut scores,
                    )?;
                }
            }
        }

        let mut heap = ResultHeap::new();
        for (enc_id, score) in scores {
            heap.offer(score, enc_id);
        }

        let mut results = Vec::new();
        while results.len() < NUM_RESULTS_PER_QUERY {
            let best = match heap.pop_best() {
                Some(best) => best,
                None => break,
            };
            let title = self.title(&best.enc_id)?;
            if SKIPPED_RESULT_PREFIXES.iter().any(|p| title.starts_with(*p)) {
                continue;
            }
            results.push(SearchResult {
                enc_id: best.enc_id,
                title,
                score: best.score,
            });
        }
        Ok(results)
    }

    /// One (term, field) contribution: weight * tf * idf per posting.
    fn score_term(
        &mut self,
        field: Field,
        term: &str,
        weight: f32,
        scores: &mut HashMap<String, f32>,
    ) -> Result<(), Error> {
        let line = match self.postings(field, term)? {
            Some(line) => line,
            None => return Ok(()),
        };
        let idf = self.idf(term)?;
        if idf == 0.0 {
            return Ok(());
        }
        for posting in line.split(' ').skip(1) {
            let mut parts = posting.splitn(2, ':');
            let enc_id = parts
                .next()
                .ok_or_else(|| Error::BadRunLine(line.clone()))?;
            let enc_tf = parts
                .next()
                .ok_or_else(|| Error::BadRunLine(line.clone()))?;
            let tf = encoding::decode(enc_tf)? as f32;
            *scores.entry(enc_id.to_string()).or_default() += weight * tf * idf;
        }
        Ok(())
    }
}
