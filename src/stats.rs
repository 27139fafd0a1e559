use crate::Error;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Counters gathered while building an index, written to the stats file
/// the indexer CLI takes as its third argument.
#[derive(Default, Debug, Clone)]
pub struct IndexStats {
    pub document_count: u64,
    /// Raw token occurrences streamed past the tokenizer.
    pub token_occurrences: u64,
    /// Distinct terms that made it into the inverted index.
    pub distinct_terms: u64,
    pub file_count: u64,
    pub index_bytes: u64,
}

impl IndexStats {
    /// Walk the finished index directory and fill in size and file count.
    pub fn measure_dir(&mut self, dir: &Path) -> Result<(), Error> {
        self.file_count = 0;
        self.index_bytes = 0;
        for entry in fs::read_dir(dir)? {
            let meta = entry?.metadata()?;
            if meta.is_file() {
                self.file_count += 1;
                self.index_bytes += meta.len();
            }
        }
        Ok(())
    }

    pub fn human_size(&self) -> String {
        let bytes = self.index_bytes as f64;
        if bytes >= 1024.0 * 1024.0 * 1024.0 {
            format!("{:.2} GiB", bytes / (1024.0 * 1024.0 * 1024.0))
        } else if bytes >= 1024.0 * 1024.0 {
            format!("{:.2} MiB", bytes / (1024.0 * 1024.0))
        } else if bytes >= 1024.0 {
            format!("{:.2} KiB", bytes / 1024.0)
        } else {
            format!("{} B", self.index_bytes)
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), Error> {
        let mut f = fs::File::create(path)?;
        writeln!(f, "Index size on disk : {}", self.human_size())?;
        writeln!(f, "Index files written : {}", self.file_count)?;
        writeln!(f, "Documents indexed : {}", self.document_count)?;
        writeln!(f, "Total tokens encountered in dump : {}", self.token_occurrences)?;
        writeln!(f, "Distinct terms in inverted index : {}", self.distinct_terms)?;
        Ok(())
    }
}
