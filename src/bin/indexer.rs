use std::env;
use std::path::Path;
use std::process::exit;

use wikindex::index::{build_index, IndexConfig};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("usage: indexer <dump_file> <index_dir> <stats_file>");
        exit(1);
    }
    let dump = Path::new(&args[1]);
    let index_dir = Path::new(&args[2]);
    let stats_file = Path::new(&args[3]);

    if !dump.exists() {
        eprintln!("indexer: dump file {} does not exist", dump.display());
        exit(1);
    }

    match build_index(dump, index_dir, IndexConfig::default()) {
        Ok(stats) => {
            if let Err(e) = stats.write_to(stats_file) {
                eprintln!("indexer: writing stats failed: {:?}", e);
                exit(1);
            }
            println!(
                "indexed {} documents into {} files ({})",
                stats.document_count,
                stats.file_count,
                stats.human_size()
            );
        }
        Err(e) => {
            eprintln!("indexer: {:?}", e);
            exit(1);
        }
    }
}
