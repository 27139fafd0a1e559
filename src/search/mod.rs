pub mod score;

use crate::encoding;
use crate::index::Manifest;
use crate::io_helper::{self, first_token};
use crate::tokenize::Tokenizer;
use crate::HashMap;
use crate::{Error, Field};
use std::path::{Path, PathBuf};

/// Read-only view over a finished index directory. The sparse pre-indexes
/// live in process memory for the lifetime of the searcher; block files are
/// opened per lookup and the OS page cache does the rest.
pub struct Searcher {
    dir: PathBuf,
    pub manifest: Manifest,
    tokenizer: Tokenizer,
    field_preindex: [Vec<String>; 6],
    idf_preindex: Vec<String>,
    /// First encoded id of each titles block, width-normalized.
    titles_preindex: Vec<String>,
    /// Misses are cached as 0.0 so repeated unknown terms stay cheap.
    idf_cache: HashMap<String, f32>,
}

impl Searcher {
    pub fn open(dir: &Path) -> Result<Searcher, Error> {
        let manifest = Manifest::open(dir)?;

        let mut field_preindex: [Vec<String>; 6] = Default::default();
        for field in Field::ALL.iter() {
            let path = dir.join(format!("pre_index_{}.txt", field.tag()));
            field_preindex[field.index()] = io_helper::read_lines(&path)?;
        }
        let idf_preindex = io_helper::read_lines(&dir.join("pre_index_idf.txt"))?;
        let titles_preindex = io_helper::read_lines(&dir.join("pre_index_titles.txt"))?
            .into_iter()
            .map(|id| encoding::pad(&id))
            .collect();

        Ok(Searcher {
            dir: dir.to_path_buf(),
            manifest,
            tokenizer: Tokenizer::new(),
            field_preindex,
            idf_preindex,
            titles_preindex,
            idf_cache: HashMap::default(),
        })
    }

    pub fn tokenize_query(&mut self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    /// Greatest block whose first key is <= `key`; `None` means the key
    /// sorts before everything in the index.
    fn block_for(preindex: &[String], key: &str) -> Option<usize> {
        let upper = preindex.partition_point(|first| first.as_str() <= key);
        if upper == 0 {
            None
        } else {
            Some(upper - 1)
        }
    }

    /// Two-level lookup: pre-index to pick the block, then binary search
    /// the block through its offset array. Unknown terms come back `None`.
    pub fn postings(&self, field: Field, term: &str) -> Result<Option<String>, Error> {
        let block = match Self::block_for(&self.field_preindex[field.index()], term) {
            Some(k) => k,
            None => return Ok(None),
        };
        let offsets_path = self
            .dir
            .join(format!("offsets_{}_{}.txt", field.tag(), block));
        let block_path = self.dir.join(format!("index_{}_{}.txt", field.tag(), block));
        let offsets = io_helper::read_offsets(&offsets_path)?;
        let data = io_helper::open_mmap_file(&block_path)?;

        let mut lower: isize = 0;
        let mut upper: isize = offsets.len() as isize - 1;
        while lower <= upper {
            let mid = (lower + upper) / 2;
            let line = io_helper::line_at(&data, offsets[mid as usize])?;
            let here = first_token(line);
            if here == term {
                return Ok(Some(line.to_string()));
            } else if here < term {
                lower = mid + 1;
            } else {
                upper = mid - 1;
            }
        }
        Ok(None)
    }

    /// `N/df` for a term; 0.0 for terms the index has never seen.
    pub fn idf(&mut self, term: &str) -> Result<f32, Error> {
        if let Some(hit) = self.idf_cache.get(term) {
            return Ok(*hit);
        }
        let value = self.idf_lookup(term)?;
        self.idf_cache.insert(term.to_string(), value);
        Ok(value)
    }

    fn idf_lookup(&self, term: &str) -> Result<f32, Error> {
        let block = match Self::block_for(&self.idf_preindex, term) {
            Some(k) => k,
            None => return Ok(0.0),
        };
        let lines = io_helper::read_lines(&self.dir.join(format!("idf_{}.txt", block)))?;
        let found = match lines.binary_search_by(|line| first_token(line).cmp(term)) {
            Ok(at) => &lines[at],
            Err(_) => return Ok(0.0),
        };
        let value = found
            .split(' ')
            .nth(1)
            .and_then(|v| v.parse::<f32>().ok())
            .ok_or_else(|| Error::BadRunLine(found.clone()))?;
        Ok(value)
    }

    /// Titles blocks hold contiguous docIDs, so the title line is found by
    /// arithmetic rather than search.
    pub fn title(&self, enc_id: &str) -> Result<String, Error> {
        let doc = encoding::decode(enc_id)?;
        let padded = encoding::pad(enc_id);
        let block = Self::block_for(&self.titles_preindex, &padded)
            .ok_or(Error::MissingTitle(doc))?;
        let lines =
            io_helper::read_lines(&self.dir.join(format!("article_titles_{}.txt", block)))?;
        let first_line = lines.first().ok_or(Error::MissingTitle(doc))?;
        let first = encoding::decode(first_token(first_line))?;
        if doc < first {
            return Err(Error::MissingTitle(doc));
        }
        let line = lines
            .get((doc - first) as usize)
            .ok_or(Error::MissingTitle(doc))?;
        match line.find(' ') {
            Some(at) => Ok(line[at + 1..].to_string()),
            None => Err(Error::MissingTitle(doc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{build_index, IndexConfig};
    use std::fs;
    use tempfile::TempDir;

    const DUMP: &str = r#"<mediawiki>
  <page><title>Apple</title><text>apple orchard autumn harvest</text></page>
  <page><title>Banana</title><text>banana plantation tropical</text></page>
  <page><title>Cherry</title><text>cherry orchard blossom</text></page>
  <page><title>Damson</title><text>damson plum orchard autumn</text></page>
  <page><title>Elder</title><text>elderberry cordial recipe</text></page>
  <page><title>Fig</title><text>ripen warm autumn weather</text></page>
  <page><title>Grape</title><text>grape vineyard harvest</text></page>
</mediawiki>
"#;

    fn small_index(tmp: &TempDir) -> Searcher {
        let dump = tmp.path().join("dump.xml");
        fs::write(&dump, DUMP).unwrap();
        let dir = tmp.path().join("index");
        let config = IndexConfig {
            pages_per_spill: 3,
            titles_per_file: 2,
            tokens_per_block: 4,
        };
        build_index(&dump, &dir, config).unwrap();
        Searcher::open(&dir).unwrap()
    }

    #[test]
    fn postings_found_across_blocks() {
        let tmp = TempDir::new().unwrap();
        let searcher = small_index(&tmp);

        let line = searcher.postings(Field::Body, "orchard").unwrap().unwrap();
        assert_eq!("orchard #:+ 0:+ 1:+", line);
        // Every body term of every doc must be findable.
        for term in &["appl", "autumn", "vineyard", "weather", "blossom"] {
            assert!(
                searcher.postings(Field::Body, term).unwrap().is_some(),
                "term {} lost",
                term
            );
        }
        // Unknown and out-of-range terms return empty, not errors.
        assert!(searcher.postings(Field::Body, "zzzz").unwrap().is_none());
        assert!(searcher.postings(Field::Body, "aaaa").unwrap().is_none());
        assert!(searcher.postings(Field::Infobox, "orchard").unwrap().is_none());
    }

    #[test]
    fn idf_values_and_caching() {
        let tmp = TempDir::new().unwrap();
        let mut searcher = small_index(&tmp);

        let orchard = searcher.idf("orchard").unwrap();
        assert!((orchard - 7.0 / 3.0).abs() < 1e-4);
        let unknown = searcher.idf("nosuchterm").unwrap();
        assert_eq!(0.0, unknown);
        // Second hit comes from the memo and stays identical.
        assert_eq!(orchard, searcher.idf("orchard").unwrap());
    }

    #[test]
    fn titles_resolve_across_blocks() {
        let tmp = TempDir::new().unwrap();
        let searcher = small_index(&tmp);

        let titles = ["Apple", "Banana", "Cherry", "Damson", "Elder", "Fig", "Grape"];
        for (doc, want) in titles.iter().enumerate() {
            let enc = crate::encoding::encode(doc as u64);
            assert_eq!(*want, searcher.title(&enc).unwrap());
        }
        assert!(searcher.title("zz").is_err());
    }

    #[test]
    fn preindex_agrees_with_block_files() {
        let tmp = TempDir::new().unwrap();
        let searcher = small_index(&tmp);
        for (k, first) in searcher.field_preindex[Field::Body.index()].iter().enumerate() {
            let block = fs::read_to_string(
                tmp.path().join("index").join(format!("index_b_{}.txt", k)),
            )
            .unwrap();
            assert_eq!(first, first_token(block.lines().next().unwrap()));
        }
    }
}
