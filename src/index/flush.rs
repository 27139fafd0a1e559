use super::accumulate::Accumulator;
use crate::{Error, Field};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the seven run files for the current spill (six field posting runs
/// plus the df run), then clear the maps. The BTreeMaps iterate in term
/// order, so every run file comes out sorted.
pub(crate) fn spill_runs(dir: &Path, run: u32, acc: &mut Accumulator) -> Result<(), Error> {
    for field in Field::ALL.iter() {
        let path = dir.join(format!("temp_index_{}_{}.txt", field.tag(), run));
        let mut w = BufWriter::new(File::create(&path)?);
        for (term, postings) in acc.postings_for(*field) {
            writeln!(w, "{} {}", term, postings.join(" "))?;
        }
        w.flush()?;
    }

    let path = dir.join(format!("temp_idf_{}.txt", run));
    let mut w = BufWriter::new(File::create(&path)?);
    for (term, df) in acc.doc_frequency.iter() {
        writeln!(w, "{} {}", term, df)?;
    }
    w.flush()?;

    acc.clear_postings();
    Ok(())
}

/// Flush the buffered `encID SP title` lines as one titles block and return
/// the first encoded id in the block (the titles pre-index entry). Nothing
/// is written for an empty buffer.
pub(crate) fn flush_titles(
    dir: &Path,
    file_no: u32,
    acc: &mut Accumulator,
) -> Result<Option<String>, Error> {
    if acc.titles.is_empty() {
        return Ok(None);
    }
    let path = dir.join(format!("article_titles_{}.txt", file_no));
    let mut w = BufWriter::new(File::create(&path)?);
    for line in acc.titles.iter() {
        writeln!(w, "{}", line)?;
    }
    w.flush()?;

    let first = acc.titles[0]
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string();
    acc.titles.clear();
    Ok(Some(first))
}
