use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::exit;
use std::time::Instant;

use wikindex::search::Searcher;
use wikindex::Error;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("usage: searcher <queries_file> <index_dir> <output_file>");
        exit(1);
    }
    let queries_file = Path::new(&args[1]);
    let index_dir = Path::new(&args[2]);
    let output_file = Path::new(&args[3]);

    if !queries_file.exists() {
        eprintln!("searcher: queries file {} does not exist", queries_file.display());
        exit(1);
    }
    if !index_dir.is_dir() {
        eprintln!("searcher: index directory {} does not exist", index_dir.display());
        exit(1);
    }

    if let Err(e) = run(queries_file, index_dir, output_file) {
        eprintln!("searcher: {:?}", e);
        exit(1);
    }
}

fn run(queries_file: &Path, index_dir: &Path, output_file: &Path) -> Result<(), Error> {
    let mut searcher = Searcher::open(index_dir)?;
    let queries = BufReader::new(File::open(queries_file)?);
    let mut out = BufWriter::new(File::create(output_file)?);

    for line in queries.lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let started = Instant::now();
        let results = searcher.search(query)?;
        let elapsed = started.elapsed().as_secs_f64();

        for result in results {
            writeln!(out, "{}, {}", result.enc_id, result.title)?;
        }
        writeln!(out, "{}", elapsed)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
