use crate::io_helper::first_token;
use crate::{Error, Field};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sequential reader over one sorted run file. The file is deleted as soon
/// as it is exhausted so merge-time disk usage shrinks as we go.
struct RunCursor {
    reader: BufReader<File>,
    path: PathBuf,
}

impl RunCursor {
    fn open(path: PathBuf) -> Result<RunCursor, Error> {
        let file = File::open(&path)
            .map_err(|e| Error::IO(e).with_context(format!("run file {}", path.display())))?;
        Ok(RunCursor {
            reader: BufReader::new(file),
            path,
        })
    }

    fn next_line(&mut self) -> Result<Option<String>, Error> {
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line)?;
            if n == 0 {
                return Ok(None);
            }
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
    }

    fn remove(&mut self) -> Result<(), Error> {
        fs::remove_file(&self.path)?;
        Ok(())
    }
}

/// Rolls final lines across numbered block files of bounded term capacity,
/// tracking a parallel offsets file per block and the first term of every
/// block for the pre-index.
struct BlockWriter {
    dir: PathBuf,
    file_prefix: String,
    offsets_prefix: Option<String>,
    preindex_file: String,
    cap: usize,
    block_no: u32,
    lines_in_block: usize,
    lines_total: u64,
    writer: Option<BufWriter<File>>,
    offset: u64,
    offsets: Vec<u64>,
    first_keys: Vec<String>,
}

impl BlockWriter {
    fn for_field(dir: &Path, field: Field, cap: usize) -> BlockWriter {
        BlockWriter {
            dir: dir.to_path_buf(),
            file_prefix: format!("index_{}", field.tag()),
            offsets_prefix: Some(format!("offsets_{}", field.tag())),
            preindex_file: format!("pre_index_{}.txt", field.tag()),
            cap,
            block_no: 0,
            lines_in_block: 0,
            lines_total: 0,
            writer: None,
            offset: 0,
            offsets: Vec::new(),
            first_keys: Vec::new(),
        }
    }

    fn for_idf(dir: &Path, cap: usize) -> BlockWriter {
        BlockWriter {
            dir: dir.to_path_buf(),
            file_prefix: "idf".to_string(),
            offsets_prefix: None,
            preindex_file: "pre_index_idf.txt".to_string(),
            cap,
            block_no: 0,
            lines_in_block: 0,
            lines_total: 0,
            writer: None,
            offset: 0,
            offsets: Vec::new(),
            first_keys: Vec::new(),
        }
    }

    fn push(&mut self, key: &str, line: &str) -> Result<(), Error> {
        if self.lines_in_block == self.cap {
            self.close_block()?;
        }
        if self.writer.is_none() {
            let path = self
                .dir
                .join(format!("{}_{}.txt", self.file_prefix, self.block_no));
            // Truncate: a stale file from a reused directory must never
            // leak old postings into this block.
            self.writer = Some(BufWriter::new(File::create(&path)?));
            self.offset = 0;
            self.offsets.clear();
            self.first_keys.push(key.to_string());
        }
        let w = self.writer.as_mut().unwrap();
        self.offsets.push(self.offset);
        writeln!(w, "{}", line)?;
        self.offset += line.len() as u64 + 1;
        self.lines_in_block += 1;
        self.lines_total += 1;
        Ok(())
    }

    fn close_block(&mut self) -> Result<(), Error> {
        if let Some(mut w) = self.writer.take() {
            w.flush()?;
            if let Some(prefix) = &self.offsets_prefix {
                let path = self.dir.join(format!("{}_{}.txt", prefix, self.block_no));
                let mut ow = BufWriter::new(File::create(&path)?);
                for off in self.offsets.iter() {
                    writeln!(ow, "{}", off)?;
                }
                ow.flush()?;
            }
            self.block_no += 1;
            self.lines_in_block = 0;
        }
        Ok(())
    }

    /// Close the tail block and write the pre-index file; returns
    /// (block count, total lines emitted).
    fn finish(mut self) -> Result<(u32, u64), Error> {
        self.close_block()?;
        let path = self.dir.join(&self.preindex_file);
        let mut w = BufWriter::new(File::create(&path)?);
        for key in self.first_keys.iter() {
            writeln!(w, "{}", key)?;
        }
        w.flush()?;
        Ok((self.block_no, self.lines_total))
    }
}

/// Prime the k-way heap: read the head line of every run. Runs that are
/// already empty (a trailing spill with nothing buffered) are deleted here.
fn open_runs(
    paths: Vec<PathBuf>,
) -> Result<(Vec<RunCursor>, Vec<Option<String>>, BinaryHeap<Reverse<(String, usize)>>), Error> {
    let mut cursors = Vec::new();
    let mut heads: Vec<Option<String>> = Vec::new();
    let mut heap = BinaryHeap::new();
    for (run, path) in paths.into_iter().enumerate() {
        let mut cursor = RunCursor::open(path)?;
        match cursor.next_line()? {
            Some(line) => {
                heap.push(Reverse((first_token(&line).to_string(), run)));
                heads.push(Some(line));
            }
            None => {
                cursor.remove()?;
                heads.push(None);
            }
        }
        cursors.push(cursor);
    }
    Ok((cursors, heads, heap))
}

fn refill(
    cursors: &mut [RunCursor],
    heads: &mut [Option<String>],
    heap: &mut BinaryHeap<Reverse<(String, usize)>>,
    run: usize,
) -> Result<(), Error> {
    match cursors[run].next_line()? {
        Some(next) => {
            heap.push(Reverse((first_token(&next).to_string(), run)));
            heads[run] = Some(next);
        }
        None => cursors[run].remove()?,
    }
    Ok(())
}

/// K-way merge of one field's run files into its final block files.
/// Returns the number of blocks written.
pub(crate) fn merge_field_runs(
    dir: &Path,
    field: Field,
    runs: u32,
    tokens_per_block: usize,
) -> Result<u32, Error> {
    let paths = (0..runs)
        .map(|r| dir.join(format!("temp_index_{}_{}.txt", field.tag(), r)))
        .collect();
    let (mut cursors, mut heads, mut heap) = open_runs(paths)?;

    let mut writer = BlockWriter::for_field(dir, field, tokens_per_block);
    let mut acc_term: Option<String> = None;
    let mut acc_line = String::new();

    while let Some(Reverse((term, run))) = heap.pop() {
        let line = heads[run].take().ok_or_else(|| {
            Error::BadRunLine(format!("run {} surfaced without a line", run))
        })?;
        if acc_term.as_deref() == Some(term.as_str()) {
            // Same term from a later run: postings concatenate, older
            // runs first.
            acc_line.push_str(&line[term.len()..]);
        } else {
            if let Some(done) = acc_term.take() {
                writer.push(&done, &acc_line)?;
            }
            acc_line.clear();
            acc_line.push_str(&line);
            acc_term = Some(term);
        }
        refill(&mut cursors, &mut heads, &mut heap, run)?;
    }
    // Final drain: the last accumulated term is emitted exactly once.
    if let Some(done) = acc_term {
        writer.push(&done, &acc_line)?;
    }

    let (blocks, _lines) = writer.finish()?;
    Ok(blocks)
}

/// Merge the per-run df files, summing df per term, and write IDF blocks
/// holding `term SP N/df`. Returns (block count, distinct term count).
pub(crate) fn merge_idf_runs(
    dir: &Path,
    runs: u32,
    doc_count: u64,
    tokens_per_block: usize,
) -> Result<(u32, u64), Error> {
    let paths = (0..runs)
        .map(|r| dir.join(format!("temp_idf_{}.txt", r)))
        .collect();
    let (mut cursors, mut heads, mut heap) = open_runs(paths)?;

    let mut writer = BlockWriter::for_idf(dir, tokens_per_block);
    let mut acc: Option<(String, u64)> = None;

    while let Some(Reverse((term, run))) = heap.pop() {
        let line = heads[run].take().ok_or_else(|| {
            Error::BadRunLine(format!("idf run {} surfaced without a line", run))
        })?;
        let df: u64 = line[term.len()..]
            .trim()
            .parse()
            .map_err(|_| Error::BadRunLine(line.clone()))?;
        match &mut acc {
            Some((t, sum)) if *t == term => *sum += df,
            _ => {
                if let Some((t, sum)) = acc.take() {
                    emit_idf(&mut writer, &t, sum, doc_count)?;
                }
                acc = Some((term, df));
            }
        }
        refill(&mut cursors, &mut heads, &mut heap, run)?;
    }
    if let Some((t, sum)) = acc {
        emit_idf(&mut writer, &t, sum, doc_count)?;
    }

    writer.finish()
}

fn emit_idf(writer: &mut BlockWriter, term: &str, df: u64, doc_count: u64) -> Result<(), Error> {
    let ratio = doc_count as f64 / df as f64;
    let line = format!("{} {}", term, ratio);
    writer.push(term, &line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::accumulate::Accumulator;
    use crate::index::flush::spill_runs;
    use crate::io_helper::{line_at, read_offsets};
    use crate::segment;
    use crate::tokenize::Tokenizer;
    use tempfile::TempDir;

    fn spill_docs(dir: &Path, docs: &[(&str, &str)], per_run: usize) -> u32 {
        let mut acc = Accumulator::new();
        let mut tok = Tokenizer::new();
        let mut run = 0;
        for (i, (title, text)) in docs.iter().enumerate() {
            let fields = segment::segment(&mut tok, title, text);
            acc.add_document(title, &fields);
            if (i + 1) % per_run == 0 {
                spill_runs(dir, run, &mut acc).unwrap();
                run += 1;
            }
        }
        // Trailing spill, even when the buffers are partial or empty.
        spill_runs(dir, run, &mut acc).unwrap();
        run + 1
    }

    const DOCS: &[(&str, &str)] = &[
        ("Apple", "apple orchard autumn harvest"),
        ("Banana", "banana plantation tropical"),
        ("Cherry", "cherry orchard blossom"),
        ("Damson", "damson plum orchard autumn"),
        ("Elder", "elderberry cordial recipe"),
        ("Fig", "figs ripen in warm autumn weather"),
        ("Grape", "grape vineyard harvest"),
    ];

    #[test]
    fn seven_docs_three_runs_merge_clean() {
        let tmp = TempDir::new().unwrap();
        let runs = spill_docs(tmp.path(), DOCS, 3);
        assert_eq!(3, runs);

        let blocks = merge_field_runs(tmp.path(), Field::Body, runs, 50_000).unwrap();
        assert_eq!(1, blocks);

        // Run files were consumed and deleted.
        for r in 0..runs {
            assert!(!tmp.path().join(format!("temp_index_b_{}.txt", r)).exists());
        }

        let block = std::fs::read_to_string(tmp.path().join("index_b_0.txt")).unwrap();
        let terms: Vec<&str> = block.lines().map(first_token).collect();
        let mut sorted = terms.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, terms, "terms must be strictly increasing");

        // `orchard` appears in docs 0, 2, 3 across two runs; postings
        // concatenate older-run-first which is docID order here.
        let orchard = block
            .lines()
            .find(|l| first_token(l) == "orchard")
            .unwrap();
        assert_eq!("orchard #:+ 0:+ 1:+", orchard);

        // `autumn` spans runs 0, 1 and 2.
        let autumn = block.lines().find(|l| first_token(l) == "autumn").unwrap();
        assert_eq!("autumn #:+ 1:+ 3:+", autumn);
    }

    #[test]
    fn offsets_align_and_preindex_matches() {
        let tmp = TempDir::new().unwrap();
        let runs = spill_docs(tmp.path(), DOCS, 3);
        // Force tiny blocks so rolling and the pre-index get exercised.
        let blocks = merge_field_runs(tmp.path(), Field::Body, runs, 4).unwrap();
        assert!(blocks > 1);

        let preindex =
            crate::io_helper::read_lines(&tmp.path().join("pre_index_b.txt")).unwrap();
        assert_eq!(blocks as usize, preindex.len());

        let mut total_terms = 0;
        for k in 0..blocks {
            let data =
                std::fs::read(tmp.path().join(format!("index_b_{}.txt", k))).unwrap();
            let offsets =
                read_offsets(&tmp.path().join(format!("offsets_b_{}.txt", k))).unwrap();
            let lines: Vec<&str> =
                std::str::from_utf8(&data).unwrap().lines().collect();
            assert_eq!(lines.len(), offsets.len());
            assert!(lines.len() <= 4, "block exceeds its term budget");
            for (i, off) in offsets.iter().enumerate() {
                assert_eq!(lines[i], line_at(&data, *off).unwrap());
            }
            assert_eq!(preindex[k as usize], first_token(lines[0]));
            total_terms += lines.len();
        }

        // Merge is a bijection: every body term of every doc shows up once.
        let mut expected = std::collections::BTreeSet::new();
        let mut tok = Tokenizer::new();
        for (title, text) in DOCS {
            let fields = segment::segment(&mut tok, title, text);
            for t in fields.get(Field::Body) {
                expected.insert(t.clone());
            }
        }
        assert_eq!(expected.len(), total_terms);
    }

    #[test]
    fn idf_merge_sums_df_across_runs() {
        let tmp = TempDir::new().unwrap();
        let runs = spill_docs(tmp.path(), DOCS, 3);
        let (blocks, terms) =
            merge_idf_runs(tmp.path(), runs, DOCS.len() as u64, 50_000).unwrap();
        assert_eq!(1, blocks);
        assert!(terms > 0);
        for r in 0..runs {
            assert!(!tmp.path().join(format!("temp_idf_{}.txt", r)).exists());
        }

        let idf = std::fs::read_to_string(tmp.path().join("idf_0.txt")).unwrap();
        // `orchard` is in 3 of 7 docs, from two different runs.
        let line = idf.lines().find(|l| first_token(l) == "orchard").unwrap();
        let value: f64 = line.split(' ').nth(1).unwrap().parse().unwrap();
        assert!((value - 7.0 / 3.0).abs() < 1e-9);
        // `harvest` in docs 0 and 6: N/df = 3.5.
        let line = idf.lines().find(|l| first_token(l) == "harvest").unwrap();
        let value: f64 = line.split(' ').nth(1).unwrap().parse().unwrap();
        assert!((value - 3.5).abs() < 1e-9);

        let preindex =
            crate::io_helper::read_lines(&tmp.path().join("pre_index_idf.txt")).unwrap();
        assert_eq!(first_token(idf.lines().next().unwrap()), preindex[0]);
    }

    #[test]
    fn merging_empty_runs_yields_empty_preindex() {
        let tmp = TempDir::new().unwrap();
        let mut acc = Accumulator::new();
        spill_runs(tmp.path(), 0, &mut acc).unwrap();
        let blocks = merge_field_runs(tmp.path(), Field::Title, 1, 50_000).unwrap();
        assert_eq!(0, blocks);
        assert!(tmp.path().join("pre_index_t.txt").exists());
        assert!(!tmp.path().join("index_t_0.txt").exists());
    }
}
