use crate::Error;
use memmap::{Mmap, MmapOptions};
use std::fs;
use std::path::Path;
use std::str;
use std::sync::Arc;

pub fn open_mmap_file(path: &Path) -> Result<Arc<Mmap>, Error> {
    let file = fs::File::open(path)?;
    let opts = MmapOptions::new();
    let mmap: Mmap = unsafe { opts.map(&file)? };
    Ok(Arc::new(mmap))
}

/// One text line starting at `offset`, without its newline. The final line
/// of a file may not be newline-terminated.
pub fn line_at(data: &[u8], offset: u64) -> Result<&str, Error> {
    let start = offset as usize;
    if start >= data.len() {
        return Err(Error::BadOffset(format!(
            "offset {} beyond file of {} bytes",
            offset,
            data.len()
        )));
    }
    let rest = &data[start..];
    let end = rest
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or_else(|| rest.len());
    Ok(str::from_utf8(&rest[..end])?)
}

/// The term a posting line is keyed by.
pub fn first_token(line: &str) -> &str {
    match line.find(' ') {
        Some(at) => &line[..at],
        None => line,
    }
}

/// Parse an offsets file: one byte offset per line, parallel to the lines
/// of its block file.
pub fn read_offsets(path: &Path) -> Result<Vec<u64>, Error> {
    let raw = fs::read_to_string(path)?;
    let mut offsets = Vec::new();
    for line in raw.lines() {
        let value: u64 = line
            .parse()
            .map_err(|_| Error::BadOffset(format!("{}: {:?}", path.display(), line)))?;
        offsets.push(value);
    }
    Ok(offsets)
}

/// Non-empty lines of a small text file, in file order.
pub fn read_lines(path: &Path) -> Result<Vec<String>, Error> {
    let raw = fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn line_extraction() {
        let data = b"alpha one\nbeta two\ngamma three";
        assert_eq!("alpha one", line_at(data, 0).unwrap());
        assert_eq!("beta two", line_at(data, 10).unwrap());
        // Last line has no trailing newline.
        assert_eq!("gamma three", line_at(data, 19).unwrap());
        assert!(line_at(data, 500).is_err());
    }

    #[test]
    fn first_token_splits_on_space() {
        assert_eq!("term", first_token("term #:+ +:2"));
        assert_eq!("lonely", first_token("lonely"));
    }

    #[test]
    fn offsets_parse_and_reject_garbage() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("offsets.txt");
        std::fs::write(&good, "0\n14\n29\n").unwrap();
        assert_eq!(vec![0, 14, 29], read_offsets(&good).unwrap());

        let bad = tmp.path().join("bad.txt");
        std::fs::write(&bad, "0\nnot-a-number\n").unwrap();
        assert!(read_offsets(&bad).is_err());
    }

    #[test]
    fn mmap_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("block.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "apple #:+").unwrap();
        writeln!(f, "banana +:+").unwrap();
        drop(f);

        let map = open_mmap_file(&path).unwrap();
        assert_eq!("apple #:+", line_at(&map, 0).unwrap());
        assert_eq!("banana +:+", line_at(&map, 10).unwrap());
    }
}
