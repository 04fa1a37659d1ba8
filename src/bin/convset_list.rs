//! Prints the convolution specs a catalog file describes.

use convbench::ConvCatalog;
use log::error;
use std::env;
use std::io::{self, Write};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        println!("Usage: convset_list <catalog.csv>");
        std::process::exit(1);
    }

    let catalog = match ConvCatalog::load(&args[1]) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to load catalog: {}", e);
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = catalog.describe(&mut out).and_then(|_| out.flush()) {
        error!("Failed to write catalog: {}", e);
        std::process::exit(1);
    }
}
