//! Interactive viewer binary for manipdraw.

use std::path::Path;

use manipdraw::{options::Options, Viewer};

fn main() {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => match Options::load(Path::new(&path)) {
            Ok(options) => {
                log::info!("loaded options from {path}");
                options
            }
            Err(e) => {
                log::error!("Failed to load options from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    let viewer = Viewer::builder()
        .with_options(options)
        .with_title("manipdraw")
        .build();
    if let Err(e) = viewer.run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
