pub mod accumulate;
mod flush;
pub mod ingest;
mod merge;

use crate::segment;
use crate::stats::IndexStats;
use crate::tokenize::Tokenizer;
use crate::{Error, Field};
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use accumulate::Accumulator;

/// Spill and block thresholds. The accumulator must fit in RAM, so these
/// bound peak memory; the defaults suit full English-Wikipedia dumps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Documents between run-file spills.
    pub pages_per_spill: usize,
    /// Documents per titles block.
    pub titles_per_file: usize,
    /// Distinct terms per final block file.
    pub tokens_per_block: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            pages_per_spill: 15_000,
            titles_per_file: 50_000,
            tokens_per_block: 50_000,
        }
    }
}

/// Written as `manifest.json` once the index is complete; the searcher
/// refuses directories without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub document_count: u64,
    pub run_count: u32,
    /// Block-file count per field, in `t,b,i,c,l,r` order.
    pub blocks_per_field: [u32; 6],
    pub idf_blocks: u32,
    pub titles_blocks: u32,
    pub config: IndexConfig,
}

impl Manifest {
    pub fn open(dir: &Path) -> Result<Manifest, Error> {
        let path = dir.join("manifest.json");
        if !path.is_file() {
            return Err(Error::MissingManifest);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write(&self, dir: &Path) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(dir.join("manifest.json"), text)?;
        Ok(())
    }
}

/// Owns everything the indexing pass mutates: the accumulator, the
/// tokenizer and its stem cache, and the run/titles counters.
pub struct IndexBuilder {
    dir: PathBuf,
    config: IndexConfig,
    acc: Accumulator,
    tokenizer: Tokenizer,
    run_count: u32,
    titles_blocks: u32,
    titles_preindex: Vec<String>,
}

impl IndexBuilder {
    /// Recreate `dir` (deleting any previous contents) and set up an empty
    /// builder. The indexer owns the directory exclusively from here on.
    pub fn create(dir: &Path, config: IndexConfig) -> Result<IndexBuilder, Error> {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        Ok(IndexBuilder {
            dir: dir.to_path_buf(),
            config,
            acc: Accumulator::new(),
            tokenizer: Tokenizer::new(),
            run_count: 0,
            titles_blocks: 0,
            titles_preindex: Vec::new(),
        })
    }

    pub fn document_count(&self) -> u64 {
        self.acc.document_count()
    }

    #[cfg(test)]
    pub(crate) fn title_lines(&self) -> Vec<String> {
        self.acc.titles.clone()
    }

    /// Segment, tokenize, and accumulate one article, spilling runs and
    /// titles blocks whenever their document budgets fill up.
    pub fn add_article(&mut self, title: &str, text: &str) -> Result<(), Error> {
        let fields = segment::segment(&mut self.tokenizer, title, text);
        self.acc.add_document(title, &fields);

        let done = self.acc.document_count();
        if done % self.config.titles_per_file as u64 == 0 {
            self.flush_titles()?;
        }
        if done % self.config.pages_per_spill as u64 == 0 {
            self.spill()?;
        }
        Ok(())
    }

    fn spill(&mut self) -> Result<(), Error> {
        flush::spill_runs(&self.dir, self.run_count, &mut self.acc)?;
        println!("spilled run {} ({} docs so far)", self.run_count, self.acc.document_count());
        self.run_count += 1;
        Ok(())
    }

    fn flush_titles(&mut self) -> Result<(), Error> {
        if let Some(first) = flush::flush_titles(&self.dir, self.titles_blocks, &mut self.acc)? {
            self.titles_preindex.push(first);
            self.titles_blocks += 1;
        }
        Ok(())
    }

    /// Trailing spill, all merges, pre-indexes, manifest, and stats.
    pub fn finish(mut self) -> Result<IndexStats, Error> {
        self.flush_titles()?;
        self.spill()?;

        let doc_count = self.acc.document_count();
        let mut blocks_per_field = [0u32; 6];
        for field in Field::ALL.iter() {
            let blocks =
                merge::merge_field_runs(&self.dir, *field, self.run_count, self.config.tokens_per_block)?;
            blocks_per_field[field.index()] = blocks;
            println!("merged field {}: {} blocks", field.tag(), blocks);
        }
        let (idf_blocks, distinct_terms) =
            merge::merge_idf_runs(&self.dir, self.run_count, doc_count, self.config.tokens_per_block)?;

        let titles_pre = self.dir.join("pre_index_titles.txt");
        fs::write(&titles_pre, join_lines(&self.titles_preindex))?;

        let manifest = Manifest {
            document_count: doc_count,
            run_count: self.run_count,
            blocks_per_field,
            idf_blocks,
            titles_blocks: self.titles_blocks,
            config: self.config.clone(),
        };
        manifest.write(&self.dir)?;

        let mut stats = IndexStats::default();
        stats.document_count = doc_count;
        stats.token_occurrences = self.acc.token_occurrences;
        stats.distinct_terms = distinct_terms;
        stats.measure_dir(&self.dir)?;
        Ok(stats)
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Open a dump (gzip-compressed or plain) and build a complete index from
/// it at `index_dir`.
pub fn build_index(dump: &Path, index_dir: &Path, config: IndexConfig) -> Result<IndexStats, Error> {
    let file = File::open(dump)
        .map_err(|e| Error::IO(e).with_context(format!("dump {}", dump.display())))?;
    let mut builder = IndexBuilder::create(index_dir, config)?;
    if dump.extension().map(|e| e == "gz").unwrap_or(false) {
        ingest::ingest_xml(BufReader::new(MultiGzDecoder::new(file)), &mut builder)?;
    } else {
        ingest::ingest_xml(BufReader::new(file), &mut builder)?;
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const SEVEN_DOC_DUMP: &str = r#"<mediawiki>
  <page><title>Apple</title><text>apple orchard autumn harvest</text></page>
  <page><title>Banana</title><text>banana plantation tropical</text></page>
  <page><title>Cherry</title><text>cherry orchard blossom</text></page>
  <page><title>Damson</title><text>damson plum orchard autumn</text></page>
  <page><title>Elder</title><text>elderberry cordial recipe</text></page>
  <page><title>Fig</title><text>ripen warm autumn weather</text></page>
  <page><title>Grape</title><text>grape vineyard harvest</text></page>
</mediawiki>
"#;

    fn tiny_config() -> IndexConfig {
        IndexConfig {
            pages_per_spill: 3,
            titles_per_file: 2,
            tokens_per_block: 4,
        }
    }

    #[test]
    fn spill_boundary_produces_three_runs() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        let mut builder = IndexBuilder::create(&dir, tiny_config()).unwrap();
        ingest::ingest_xml(Cursor::new(SEVEN_DOC_DUMP), &mut builder).unwrap();
        let stats = builder.finish().unwrap();

        assert_eq!(7, stats.document_count);
        let manifest = Manifest::open(&dir).unwrap();
        // Spills after docs 3 and 6, plus the trailing spill.
        assert_eq!(3, manifest.run_count);
        // 7 docs at 2 per titles block.
        assert_eq!(4, manifest.titles_blocks);
        // Run files are all gone.
        assert!(!dir.join("temp_index_b_0.txt").exists());
        assert!(!dir.join("temp_idf_0.txt").exists());
    }

    #[test]
    fn recreates_a_dirty_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index_b_0.txt"), "stale junk\n").unwrap();

        let builder = IndexBuilder::create(&dir, tiny_config()).unwrap();
        drop(builder);
        assert!(!dir.join("index_b_0.txt").exists());
    }

    #[test]
    fn build_index_from_a_dump_file() {
        let tmp = TempDir::new().unwrap();
        let dump = tmp.path().join("dump.xml");
        fs::write(&dump, SEVEN_DOC_DUMP).unwrap();
        let dir = tmp.path().join("index");

        let stats = build_index(&dump, &dir, tiny_config()).unwrap();
        assert_eq!(7, stats.document_count);
        assert!(stats.file_count > 0);
        assert!(stats.index_bytes > 0);

        let manifest = Manifest::open(&dir).unwrap();
        assert_eq!(7, manifest.document_count);
        assert!(manifest.blocks_per_field[crate::Field::Body.index()] > 1);
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let tmp = TempDir::new().unwrap();
        match Manifest::open(tmp.path()) {
            Err(Error::MissingManifest) => {}
            other => panic!("expected MissingManifest, got {:?}", other),
        }
    }
}
