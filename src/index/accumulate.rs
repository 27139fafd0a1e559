use crate::segment::FieldTokens;
use crate::HashMap;
use crate::HashSet;
use crate::{DocId, Field};
use std::collections::BTreeMap;

/// In-memory posting maps for one run, plus the titles buffer. The driver
/// spills and clears this whenever its document budget is reached, so peak
/// memory is bounded by the spill thresholds rather than the dump size.
#[derive(Default)]
pub struct Accumulator {
    /// Per field: term -> `encID:encTF` entries, append-only, in docID order.
    pub(crate) postings: [BTreeMap<String, Vec<String>>; 6],
    /// Documents containing the term in any field, for this run.
    pub(crate) doc_frequency: BTreeMap<String, u64>,
    /// `encID SP title` lines awaiting the next titles block.
    pub(crate) titles: Vec<String>,
    next_id: u32,
    pub(crate) token_occurrences: u64,
}

impl Accumulator {
    pub fn new() -> Accumulator {
        Accumulator::default()
    }

    pub fn document_count(&self) -> u64 {
        self.next_id as u64
    }

    fn next_docid(&mut self) -> DocId {
        let n = DocId(self.next_id);
        self.next_id += 1;
        n
    }

    /// Record one document: count tf per field, append a posting for every
    /// (term, field) with tf >= 1, bump df once per distinct term, and
    /// buffer the title line.
    pub fn add_document(&mut self, title: &str, fields: &FieldTokens) -> DocId {
        let doc_id = self.next_docid();
        let enc_id = doc_id.encode();

        self.titles.push(format!("{} {}", enc_id, title));

        let mut counts: [HashMap<&str, u32>; 6] = Default::default();
        for field in Field::ALL.iter() {
            let terms = fields.get(*field);
            self.token_occurrences += terms.len() as u64;
            let counter = &mut counts[field.index()];
            for term in terms {
                *counter.entry(term.as_str()).or_default() += 1;
            }
        }

        let mut seen: HashSet<&str> = HashSet::default();
        for field in Field::ALL.iter() {
            for (term, tf) in counts[field.index()].iter() {
                let posting = format!("{}:{}", enc_id, crate::encoding::encode(*tf as u64));
                self.postings[field.index()]
                    .entry((*term).to_string())
                    .or_default()
                    .push(posting);
                seen.insert(*term);
            }
        }
        for term in seen {
            *self.doc_frequency.entry(term.to_string()).or_default() += 1;
        }

        doc_id
    }

    pub fn postings_for(&self, field: Field) -> &BTreeMap<String, Vec<String>> {
        &self.postings[field.index()]
    }

    pub fn clear_postings(&mut self) {
        for map in self.postings.iter_mut() {
            map.clear();
        }
        self.doc_frequency.clear();
    }
}
