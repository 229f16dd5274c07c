mod catalog;
mod cli;
mod coach;
mod config;
mod deviation;
mod extract;
mod model;
mod planner;
mod stats;
mod storage;
mod store;
mod suggest;
mod workflow;

use std::process;

use catalog::Catalog;
use coach::Coach;
use config::Config;
use extract::ShorthandExtractor;
use storage::Storage;

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

fn main() {
    setup_logging();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let home = Config::home().map_err(|e| e.to_string())?;
    let config = Config::load(&home).map_err(|e| e.to_string())?;
    let storage = Storage::new(&home, config.split.clone())
        .map_err(|e| format!("failed to initialize storage: {e}"))?;

    let catalog = Catalog::builtin();
    let extractor = ShorthandExtractor::new(&catalog);
    let coach = Coach::new(&storage, &storage, &extractor, &catalog, &config);

    cli::run(&coach, &storage)
}
